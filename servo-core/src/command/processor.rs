/*
    Command Processor
        Serves one host session over any `embedded_io_async` transport.
        Mutations go through `ServoHandler`, run-to-completion commands
        block on the run signal and then stream the telemetry back.
*/

use super::*;
use core::fmt::Write as _;

/* --------------------------- Errors -------------------------- */

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError<E> {
    Disconnected,
    Io(E),
}

/// A failed command either gets an `ERR` reply or ends the session.
enum CommandFault<E> {
    Reply(ErrorCode),
    Session(SessionError<E>),
}

impl<E> From<ErrorCode> for CommandFault<E> {
    fn from(code: ErrorCode) -> Self {
        CommandFault::Reply(code)
    }
}

impl<E> From<SessionError<E>> for CommandFault<E> {
    fn from(err: SessionError<E>) -> Self {
        CommandFault::Session(err)
    }
}

impl<E> From<LineError<E>> for CommandFault<E> {
    fn from(err: LineError<E>) -> Self {
        match err {
            LineError::TooLong => CommandFault::Reply(ErrorCode::LineTooLong),
            LineError::NotUtf8 => CommandFault::Reply(ErrorCode::ReadValueError),
            LineError::Disconnected => CommandFault::Session(SessionError::Disconnected),
            LineError::Io(e) => CommandFault::Session(SessionError::Io(e)),
        }
    }
}

#[derive(Clone, Copy)]
enum TelemetrySource {
    CurrentTest,
    Trajectory,
}

impl TelemetrySource {
    fn len(self, servo: &ServoHandler) -> Result<usize, ErrorCode> {
        match self {
            TelemetrySource::CurrentTest => servo.current_test_telemetry_len(),
            TelemetrySource::Trajectory => servo.trajectory_telemetry_len(),
        }
    }

    fn read(self, servo: &ServoHandler, start: usize, out: &mut [Sample]) -> Result<usize, ErrorCode> {
        match self {
            TelemetrySource::CurrentTest => servo.read_current_test_telemetry(start, out),
            TelemetrySource::Trajectory => servo.read_trajectory_telemetry(start, out),
        }
    }
}

/* --------------------------- Code -------------------------- */
pub struct CommandProcessor<'a, A: AngleSensor> {
    servo: &'a ServoHandler,
    encoder: &'a A,
    lines: LineReader<LINE_BUFFER_SIZE>,
    staging: Trajectory,
}

impl<'a, A: AngleSensor> CommandProcessor<'a, A> {
    pub fn new(servo: &'a ServoHandler, encoder: &'a A) -> Self {
        Self {
            servo,
            encoder,
            lines: LineReader::new(),
            staging: Trajectory::new(),
        }
    }

    /// Serve commands until the transport goes away. The motor is left in
    /// `Idle` however the session ends.
    pub async fn run<T: Read + Write>(&mut self, io: &mut T) -> SessionError<T::Error> {
        self.lines.clear();
        info!("host connected");

        let err = loop {
            if let Err(err) = self.process_command(io).await {
                break err;
            }
        };

        self.servo.stop();
        info!("host disconnected");
        err
    }

    /// Read and answer one command.
    pub async fn process_command<T: Read + Write>(&mut self, io: &mut T) -> Result<(), SessionError<T::Error>> {
        let op = match self.lines.read_line(io).await {
            Ok(line) => OpCode::parse_line(line),
            Err(LineError::TooLong) => Err(ErrorCode::LineTooLong),
            Err(LineError::NotUtf8) => Err(ErrorCode::UnknownCommand),
            Err(LineError::Disconnected) => return Err(SessionError::Disconnected),
            Err(LineError::Io(e)) => return Err(SessionError::Io(e)),
        };

        let result = match op {
            Ok(None) => return Ok(()),
            Ok(Some(op)) => self.execute(op, io).await.map_err(|fault| (Some(op), fault)),
            Err(code) => Err((None, CommandFault::Reply(code))),
        };

        match result {
            Ok(()) => {},
            Err((op, CommandFault::Reply(code))) => {
                warn!("command {:?} rejected: {}", op, code);
                match self.reply(io, format_args!("ERR {}", code.code())).await {
                    Ok(()) => {},
                    // `ERR n` always fits the reply buffer.
                    Err(CommandFault::Reply(_)) => {},
                    Err(CommandFault::Session(err)) => return Err(err),
                }
            },
            Err((_, CommandFault::Session(err))) => return Err(err),
        }

        io.flush().await.map_err(SessionError::Io)
    }

    async fn execute<T: Read + Write>(&mut self, op: OpCode, io: &mut T) -> Result<(), CommandFault<T::Error>> {
        match op {
            OpCode::ReadCurrent => {
                /* read_current
                    reply: milliamps
                */
                let milliamps = self.servo.sensed_current();
                self.reply(io, format_args!("{}", milliamps)).await?;
            },
            OpCode::ReadAngle => {
                /* read_angle
                    reply: degrees
                */
                let degrees = self.encoder.read_angle();
                self.reply(io, format_args!("{}", degrees)).await?;
            },
            OpCode::ResetEncoder => {
                /* reset_encoder */
                self.encoder.reset_angle_origin();
                self.ok(io).await?;
            },
            OpCode::SetManualDuty => {
                /* set_manual_duty
                    duty (i32 percent)
                */
                let line = self.lines.read_line(io).await?;
                let duty = parse_i32_line(line)?;

                self.servo.set_manual_duty(duty);
                self.servo.set_mode(Mode::ManualDrive);
                self.ok(io).await?;
            },
            OpCode::SetCurrentGains => {
                /* set_current_gains
                    kp (f32)
                    ki (f32)
                */
                let line = self.lines.read_line(io).await?;
                let mut args = ArgReader::new(line);
                let gains = CurrentGains {
                    kp: args.read_f32()?,
                    ki: args.read_f32()?,
                };
                args.finish()?;

                self.servo.set_current_gains(gains);
                self.ok(io).await?;
            },
            OpCode::GetCurrentGains => {
                /* get_current_gains
                    reply: kp ki
                */
                let gains = self.servo.get_current_gains();
                self.reply(io, format_args!("{} {}", gains.kp, gains.ki)).await?;
            },
            OpCode::SetPositionGains => {
                /* set_position_gains
                    kp (f32)
                    ki (f32)
                    kd (f32)
                */
                let line = self.lines.read_line(io).await?;
                let mut args = ArgReader::new(line);
                let gains = PositionGains {
                    kp: args.read_f32()?,
                    ki: args.read_f32()?,
                    kd: args.read_f32()?,
                };
                args.finish()?;

                self.servo.set_position_gains(gains);
                self.ok(io).await?;
            },
            OpCode::GetPositionGains => {
                /* get_position_gains
                    reply: kp ki kd
                */
                let gains = self.servo.get_position_gains();
                self.reply(io, format_args!("{} {} {}", gains.kp, gains.ki, gains.kd)).await?;
            },
            OpCode::RunCurrentTest => {
                /* run_current_test
                    reply: count, then count lines of "reference measured"
                */
                self.servo.begin_current_test();
                self.wait_for(RunEvent::CurrentTestDone).await?;
                self.stream_telemetry(io, TelemetrySource::CurrentTest).await?;
            },
            OpCode::GoToAngle => {
                /* go_to_angle
                    target (i32 degrees)
                */
                let line = self.lines.read_line(io).await?;
                let target = parse_i32_line(line)?;

                self.servo.begin_hold(target, self.encoder);
                self.ok(io).await?;
            },
            OpCode::LoadStepTrajectory | OpCode::LoadCubicTrajectory => {
                /* load_trajectory
                    count (i32)
                    sample (i32 degrees) x count
                */
                self.load_trajectory(io).await?;
                self.ok(io).await?;
            },
            OpCode::ExecuteTrajectory => {
                /* execute_trajectory
                    reply: count, then count lines of "reference measured"
                */
                self.servo.begin_trajectory(self.encoder)?;
                self.wait_for(RunEvent::TrajectoryDone { final_target: 0 }).await?;
                self.stream_telemetry(io, TelemetrySource::Trajectory).await?;
            },
            OpCode::Unpower | OpCode::Quit => {
                /* unpower / quit */
                self.servo.stop();
                self.ok(io).await?;
            },
            OpCode::GetMode => {
                /* get_mode
                    reply: numeric mode
                */
                let mode = self.servo.mode_raw();
                self.reply(io, format_args!("{}", mode)).await?;
            },
            OpCode::ReadFault => {
                /* read_fault
                    reply: 1 if a fault was latched since the last read, else 0
                */
                let latched = self.servo.clear_fault();
                self.reply(io, format_args!("{}", latched as u8)).await?;
            },
            OpCode::ReadCurrentTestTelemetry => {
                /* read_current_test_telemetry */
                self.stream_telemetry(io, TelemetrySource::CurrentTest).await?;
            },
            OpCode::ReadTrajectoryTelemetry => {
                /* read_trajectory_telemetry */
                self.stream_telemetry(io, TelemetrySource::Trajectory).await?;
            },
        }
        Ok(())
    }

    /// Read `count` then `count` sample lines. Every announced line is
    /// consumed even after a bad one so the stream stays in step, and
    /// nothing is committed unless all of them parsed.
    async fn load_trajectory<T: Read + Write>(&mut self, io: &mut T) -> Result<usize, CommandFault<T::Error>> {
        let line = self.lines.read_line(io).await?;
        let count = parse_i32_line(line)?;
        if count <= 0 {
            return Err(ErrorCode::EmptyTrajectory.into());
        }

        self.staging.clear();
        let mut fault: Option<ErrorCode> = None;

        for _ in 0..count {
            let sample = match self.lines.read_line(io).await {
                Ok(line) => parse_i32_line(line),
                Err(LineError::TooLong) => Err(ErrorCode::LineTooLong),
                Err(LineError::NotUtf8) => Err(ErrorCode::ReadValueError),
                Err(err) => return Err(err.into()),
            };

            match sample {
                Ok(deg) => {
                    if self.staging.push(deg).is_err() {
                        fault.get_or_insert(ErrorCode::TrajectoryTooLong);
                    }
                },
                Err(code) => {
                    fault.get_or_insert(code);
                },
            }
        }

        if let Some(code) = fault {
            return Err(code.into());
        }
        Ok(self.servo.load_trajectory(&self.staging)?)
    }

    /// Block until the run started by this command completes. A fault latched
    /// mid-run aborts it and leaves the motor in `Idle`.
    async fn wait_for(&self, expected: RunEvent) -> Result<RunEvent, ErrorCode> {
        loop {
            let event = self.servo.wait_run_complete().await;
            if event == RunEvent::Faulted {
                self.servo.stop();
                return Err(ErrorCode::Faulted);
            }
            if core::mem::discriminant(&event) == core::mem::discriminant(&expected) {
                debug!("run complete: {:?}", event);
                return Ok(event);
            }
        }
    }

    async fn stream_telemetry<T: Write>(&self, io: &mut T, source: TelemetrySource) -> Result<(), CommandFault<T::Error>> {
        let len = source.len(self.servo)?;
        self.reply(io, format_args!("{}", len)).await?;

        let mut chunk = [Sample::ZERO; TELEMETRY_CHUNK];
        let mut start = 0;
        while start < len {
            let n = source.read(self.servo, start, &mut chunk)?;
            if n == 0 {
                break;
            }
            for sample in &chunk[..n] {
                self.reply(io, format_args!("{} {}", sample.reference, sample.measured)).await?;
            }
            start += n;
        }
        Ok(())
    }

    async fn ok<T: Write>(&self, io: &mut T) -> Result<(), CommandFault<T::Error>> {
        self.reply(io, format_args!("OK")).await
    }

    /// Format one reply line. Nothing is sent if it does not fit.
    async fn reply<T: Write>(&self, io: &mut T, args: core::fmt::Arguments<'_>) -> Result<(), CommandFault<T::Error>> {
        let mut text: heapless::String<REPLY_BUFFER_SIZE> = heapless::String::new();
        text.write_fmt(args).map_err(|_| ErrorCode::ReplyOverflow)?;
        text.push_str("\r\n").map_err(|_| ErrorCode::ReplyOverflow)?;
        io.write_all(text.as_bytes()).await.map_err(SessionError::Io)?;
        Ok(())
    }
}
