/*
* Error Codes
    Reply Pattern
        ERR [CODE]
*/

use core::fmt;

/* --------------------------- Error Code -------------------------- */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ErrorCode {
    UnknownCommand = 1,
    NonFiniteFloat = 2,
    ReadValueError = 3,
    TrajectoryTooLong = 4,
    EmptyTrajectory = 5,
    NotReady = 6,
    Busy = 7,
    LineTooLong = 8,
    Faulted = 9,
    ReplyOverflow = 10,
}

impl ErrorCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCode::UnknownCommand => "unknown command",
            ErrorCode::NonFiniteFloat => "gain is not a finite number",
            ErrorCode::ReadValueError => "malformed payload",
            ErrorCode::TrajectoryTooLong => "trajectory exceeds buffer",
            ErrorCode::EmptyTrajectory => "trajectory is empty",
            ErrorCode::NotReady => "telemetry not ready",
            ErrorCode::Busy => "trajectory run in progress",
            ErrorCode::LineTooLong => "line exceeds buffer",
            ErrorCode::Faulted => "run aborted by a latched fault",
            ErrorCode::ReplyOverflow => "reply exceeds buffer",
        };
        f.write_str(text)
    }
}
