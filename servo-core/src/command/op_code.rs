/*
    Operation Codes
        One ASCII letter per command, following the host menu.
*/

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpCode {
    ReadCurrent,
    ReadAngle,
    ResetEncoder,
    SetManualDuty,
    SetCurrentGains,
    GetCurrentGains,
    SetPositionGains,
    GetPositionGains,
    RunCurrentTest,
    GoToAngle,
    LoadStepTrajectory,
    LoadCubicTrajectory,
    ExecuteTrajectory,
    Unpower,
    Quit,
    GetMode,
    ReadFault,
    ReadCurrentTestTelemetry,
    ReadTrajectoryTelemetry,
}

impl TryFrom<char> for OpCode {
    type Error = ();

    fn try_from(v: char) -> Result<Self, Self::Error> {
        match v {
            'b' => Ok(OpCode::ReadCurrent),
            'd' => Ok(OpCode::ReadAngle),
            'e' => Ok(OpCode::ResetEncoder),
            'f' => Ok(OpCode::SetManualDuty),
            'g' => Ok(OpCode::SetCurrentGains),
            'h' => Ok(OpCode::GetCurrentGains),
            'i' => Ok(OpCode::SetPositionGains),
            'j' => Ok(OpCode::GetPositionGains),
            'k' => Ok(OpCode::RunCurrentTest),
            'l' => Ok(OpCode::GoToAngle),
            'm' => Ok(OpCode::LoadStepTrajectory),
            'n' => Ok(OpCode::LoadCubicTrajectory),
            'o' => Ok(OpCode::ExecuteTrajectory),
            'p' => Ok(OpCode::Unpower),
            'q' => Ok(OpCode::Quit),
            'r' => Ok(OpCode::GetMode),
            's' => Ok(OpCode::ReadFault),
            't' => Ok(OpCode::ReadCurrentTestTelemetry),
            'u' => Ok(OpCode::ReadTrajectoryTelemetry),
            _ => Err(()),
        }
    }
}

impl OpCode {
    /// Decode a command line. `Ok(None)` for a blank line.
    pub fn parse_line(line: &str) -> Result<Option<Self>, ErrorCode> {
        let mut chars = line.trim().chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(None),
            (Some(letter), None) => OpCode::try_from(letter)
                .map(Some)
                .map_err(|_| ErrorCode::UnknownCommand),
            (Some(_), Some(_)) => Err(ErrorCode::UnknownCommand),
        }
    }
}
