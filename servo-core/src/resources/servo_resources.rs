/*
    Servo Resources
        Process-wide state shared by the current loop, the position loop and
        the command processor.

        Ownership per field
        - mode, gains, manual duty, trajectory: command processor
        - current setpoint, trajectory log, hold target on completion: position loop
        - sensed current, applied drive, current test log: current loop

        Scalars are lock-free. Anything the command processor changes as a
        group (run start) goes through `transaction`, which holds one critical
        section across every write, so neither loop sees a half-applied start.
        Loop-side writes carry the generation the loop snapshotted and are
        dropped once a run start has moved it.
*/

use super::*;

/* --------------------------- Types -------------------------- */
pub type Trajectory = heapless::Vec<i32, MAX_TRAJECTORY_SAMPLES>;
pub type CurrentTestLog = TelemetryBuffer<CURRENT_TEST_SAMPLES>;
pub type TrajectoryLog = TelemetryBuffer<MAX_TRAJECTORY_SAMPLES>;

/// Raised by a loop when a run-to-completion mode ends on its own, or can't.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunEvent {
    CurrentTestDone,
    TrajectoryDone { final_target: i32 },
    /// A loop latched a fault; the run in progress will not complete.
    Faulted,
}

/// Everything the current loop needs for one tick, read in one critical section.
#[derive(Clone, Copy, Debug)]
pub struct CurrentLoopInputs {
    pub mode: Result<Mode, InvalidMode>,
    pub generation: u32,
    pub gains: CurrentGains,
    pub manual_duty: i32,
    pub current_setpoint: i32,
}

/// Everything the position loop needs for one tick, read in one critical section.
#[derive(Clone, Copy, Debug)]
pub struct PositionLoopInputs {
    pub mode: Result<Mode, InvalidMode>,
    pub generation: u32,
    pub gains: PositionGains,
    pub hold_target: i32,
}

/* --------------------------- Servo Struct -------------------------- */
pub struct ServoHandler {
    pub(crate) mode: ModeRegister,
    generation: AtomicU32,
    manual_duty: AtomicI32,
    hold_target: AtomicI32,
    current_setpoint: AtomicI32,
    sensed_current: AtomicI32,
    applied_drive: AtomicI32,
    fault: AtomicBool,
    current_test_ready: AtomicBool,
    trajectory_ready: AtomicBool,
    current_gains: Mutex<Cell<CurrentGains>>,
    position_gains: Mutex<Cell<PositionGains>>,
    trajectory: Mutex<RefCell<Trajectory>>,
    current_test_log: Mutex<RefCell<CurrentTestLog>>,
    trajectory_log: Mutex<RefCell<TrajectoryLog>>,
    run_complete: Signal<CriticalSectionRawMutex, RunEvent>,
}

impl ServoHandler {
    pub const fn new() -> Self {
        Self::with_gains(DEFAULT_CURRENT_GAINS, DEFAULT_POSITION_GAINS)
    }

    pub const fn with_gains(current: CurrentGains, position: PositionGains) -> Self {
        Self {
            mode: ModeRegister::new(Mode::Idle),
            generation: AtomicU32::new(0),
            manual_duty: AtomicI32::new(0),
            hold_target: AtomicI32::new(0),
            current_setpoint: AtomicI32::new(0),
            sensed_current: AtomicI32::new(0),
            applied_drive: AtomicI32::new(0),
            fault: AtomicBool::new(false),
            current_test_ready: AtomicBool::new(false),
            trajectory_ready: AtomicBool::new(false),
            current_gains: Mutex::new(Cell::new(current)),
            position_gains: Mutex::new(Cell::new(position)),
            trajectory: Mutex::new(RefCell::new(heapless::Vec::new())),
            current_test_log: Mutex::new(RefCell::new(TelemetryBuffer::new())),
            trajectory_log: Mutex::new(RefCell::new(TelemetryBuffer::new())),
            run_complete: Signal::new(),
        }
    }

    /* ------------------------- Transactions ------------------------ */

    /// Run `f` with both loops excluded. Every grouped write of a run start
    /// happens through the [`RunSetup`] handed to `f`.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut RunSetup<'_>) -> R) -> R {
        critical_section::with(|cs| {
            let mut setup = RunSetup { servo: self, cs };
            f(&mut setup)
        })
    }

    /* ---------------------------- Mode ----------------------------- */

    pub fn get_mode(&self) -> Result<Mode, InvalidMode> {
        return self.mode.get();
    }

    pub fn mode_raw(&self) -> u8 {
        return self.mode.raw();
    }

    /// Switch mode and restart both loops' controller state.
    pub fn set_mode(&self, mode: Mode) {
        self.transaction(|setup| {
            setup.reset_controllers();
            setup.switch_mode(mode);
        });
        info!("mode -> {:?}", mode);
    }

    /// Force `Idle`. Safe to call at any time and from any mode.
    pub fn stop(&self) {
        self.set_mode(Mode::Idle);
    }

    /// Start the square-wave current test from any mode.
    pub fn begin_current_test(&self) {
        self.transaction(|setup| {
            setup.reset_controllers();
            setup.switch_mode(Mode::CurrentTest);
        });
        info!("current test started");
    }

    /// Zero the encoder and hold `target_deg`.
    pub fn begin_hold<A: AngleSensor + ?Sized>(&self, target_deg: i32, encoder: &A) {
        self.transaction(|setup| {
            encoder.reset_angle_origin();
            setup.reset_controllers();
            setup.set_hold_target(target_deg);
            setup.switch_mode(Mode::HoldPosition);
        });
        info!("holding {} deg", target_deg);
    }

    /// Zero the encoder and play back the loaded trajectory.
    pub fn begin_trajectory<A: AngleSensor + ?Sized>(&self, encoder: &A) -> Result<usize, ErrorCode> {
        let len = self.transaction(|setup| {
            let len = setup.trajectory_len();
            if len == 0 {
                return Err(ErrorCode::EmptyTrajectory);
            }
            encoder.reset_angle_origin();
            setup.reset_controllers();
            setup.switch_mode(Mode::TrackTrajectory);
            Ok(len)
        })?;
        info!("tracking {} samples", len);
        Ok(len)
    }

    /// Wait for the next auto-completion of a run-to-completion mode.
    pub async fn wait_run_complete(&self) -> RunEvent {
        self.run_complete.wait().await
    }

    /* ---------------------------- Gains ---------------------------- */

    pub fn set_current_gains(&self, gains: CurrentGains) {
        critical_section::with(|cs| self.current_gains.borrow(cs).set(gains));
    }

    pub fn get_current_gains(&self) -> CurrentGains {
        critical_section::with(|cs| self.current_gains.borrow(cs).get())
    }

    pub fn set_position_gains(&self, gains: PositionGains) {
        critical_section::with(|cs| self.position_gains.borrow(cs).set(gains));
    }

    pub fn get_position_gains(&self) -> PositionGains {
        critical_section::with(|cs| self.position_gains.borrow(cs).get())
    }

    /* -------------------------- Setpoints -------------------------- */

    pub fn set_manual_duty(&self, duty: i32) {
        self.manual_duty.store(duty, Ordering::Relaxed);
    }

    pub fn get_manual_duty(&self) -> i32 {
        return self.manual_duty.load(Ordering::Relaxed);
    }

    /// Replace the hold target without restarting the controllers.
    pub fn set_hold_target(&self, target_deg: i32) {
        self.hold_target.store(target_deg, Ordering::Relaxed);
    }

    pub fn get_hold_target(&self) -> i32 {
        return self.hold_target.load(Ordering::Relaxed);
    }

    /// Replace the trajectory wholesale. Refused while a trajectory is playing.
    pub fn load_trajectory(&self, samples: &[i32]) -> Result<usize, ErrorCode> {
        if samples.is_empty() {
            return Err(ErrorCode::EmptyTrajectory);
        }
        if samples.len() > MAX_TRAJECTORY_SAMPLES {
            return Err(ErrorCode::TrajectoryTooLong);
        }

        critical_section::with(|cs| {
            if self.mode.get() == Ok(Mode::TrackTrajectory) {
                return Err(ErrorCode::Busy);
            }
            let mut trajectory = self.trajectory.borrow_ref_mut(cs);
            trajectory.clear();
            trajectory
                .extend_from_slice(samples)
                .map_err(|_| ErrorCode::TrajectoryTooLong)?;
            self.trajectory_ready.store(false, Ordering::Relaxed);
            self.trajectory_log.borrow_ref_mut(cs).clear();
            Ok(samples.len())
        })
    }

    pub fn trajectory_len(&self) -> usize {
        critical_section::with(|cs| self.trajectory.borrow_ref(cs).len())
    }

    /* -------------------------- Telemetry -------------------------- */

    pub fn current_test_telemetry_len(&self) -> Result<usize, ErrorCode> {
        if !self.current_test_ready.load(Ordering::Acquire) {
            return Err(ErrorCode::NotReady);
        }
        Ok(critical_section::with(|cs| self.current_test_log.borrow_ref(cs).len()))
    }

    /// Copy the last completed current test, from `start`, into `out`.
    pub fn read_current_test_telemetry(&self, start: usize, out: &mut [Sample]) -> Result<usize, ErrorCode> {
        if !self.current_test_ready.load(Ordering::Acquire) {
            return Err(ErrorCode::NotReady);
        }
        Ok(critical_section::with(|cs| self.current_test_log.borrow_ref(cs).copy_into(start, out)))
    }

    pub fn trajectory_telemetry_len(&self) -> Result<usize, ErrorCode> {
        if !self.trajectory_ready.load(Ordering::Acquire) {
            return Err(ErrorCode::NotReady);
        }
        Ok(critical_section::with(|cs| self.trajectory_log.borrow_ref(cs).len()))
    }

    /// Copy the last completed trajectory run, from `start`, into `out`.
    pub fn read_trajectory_telemetry(&self, start: usize, out: &mut [Sample]) -> Result<usize, ErrorCode> {
        if !self.trajectory_ready.load(Ordering::Acquire) {
            return Err(ErrorCode::NotReady);
        }
        Ok(critical_section::with(|cs| self.trajectory_log.borrow_ref(cs).copy_into(start, out)))
    }

    pub fn sensed_current(&self) -> i32 {
        return self.sensed_current.load(Ordering::Relaxed);
    }

    pub fn applied_drive(&self) -> i32 {
        return self.applied_drive.load(Ordering::Relaxed);
    }

    pub fn current_setpoint(&self) -> i32 {
        return self.current_setpoint.load(Ordering::Relaxed);
    }

    /* ---------------------------- Fault ---------------------------- */

    pub fn fault_latched(&self) -> bool {
        return self.fault.load(Ordering::Relaxed);
    }

    /// Clear the fault latch, returning whether it was set.
    pub fn clear_fault(&self) -> bool {
        return self.fault.swap(false, Ordering::Relaxed);
    }

    /* ------------------------ Loop Interface ----------------------- */

    pub(crate) fn current_loop_inputs(&self) -> CurrentLoopInputs {
        critical_section::with(|cs| CurrentLoopInputs {
            mode: self.mode.get(),
            generation: self.generation.load(Ordering::Relaxed),
            gains: self.current_gains.borrow(cs).get(),
            manual_duty: self.manual_duty.load(Ordering::Relaxed),
            current_setpoint: self.current_setpoint.load(Ordering::Relaxed),
        })
    }

    pub(crate) fn position_loop_inputs(&self) -> PositionLoopInputs {
        critical_section::with(|cs| PositionLoopInputs {
            mode: self.mode.get(),
            generation: self.generation.load(Ordering::Relaxed),
            gains: self.position_gains.borrow(cs).get(),
            hold_target: self.hold_target.load(Ordering::Relaxed),
        })
    }

    pub(crate) fn publish_sensed_current(&self, milliamps: i32) {
        self.sensed_current.store(milliamps, Ordering::Relaxed);
    }

    pub(crate) fn publish_drive(&self, signed_percent: i32) {
        self.applied_drive.store(signed_percent, Ordering::Relaxed);
    }

    /// True while no run start has happened since the loop took its snapshot.
    fn is_current(&self, generation: u32) -> bool {
        self.generation.load(Ordering::Relaxed) == generation
    }

    /// Publish the position loop's output. Dropped when a run start moved the
    /// generation after the loop's snapshot.
    pub(crate) fn publish_current_setpoint(&self, generation: u32, milliamps: i32) -> bool {
        critical_section::with(|_| {
            if !self.is_current(generation) {
                return false;
            }
            self.current_setpoint.store(milliamps, Ordering::Relaxed);
            true
        })
    }

    pub(crate) fn record_current_test(&self, generation: u32, index: usize, sample: Sample) -> bool {
        critical_section::with(|cs| {
            self.is_current(generation) && self.current_test_log.borrow_ref_mut(cs).record(index, sample)
        })
    }

    pub(crate) fn record_trajectory(&self, generation: u32, index: usize, sample: Sample) -> bool {
        critical_section::with(|cs| {
            self.is_current(generation) && self.trajectory_log.borrow_ref_mut(cs).record(index, sample)
        })
    }

    /// Sample `index` of the loaded trajectory together with its length.
    pub(crate) fn trajectory_sample(&self, index: usize) -> (Option<i32>, usize) {
        critical_section::with(|cs| {
            let trajectory = self.trajectory.borrow_ref(cs);
            (trajectory.get(index).copied(), trajectory.len())
        })
    }

    /// `CurrentTest -> Idle`, unless the command processor left or restarted
    /// the run since the loop's snapshot.
    pub(crate) fn complete_current_test(&self, generation: u32) -> bool {
        let finished = critical_section::with(|_| {
            if !self.is_current(generation) || !self.mode.finish(Mode::CurrentTest, Mode::Idle) {
                return false;
            }
            self.current_test_ready.store(true, Ordering::Release);
            self.run_complete.signal(RunEvent::CurrentTestDone);
            true
        });
        if finished {
            info!("current test done");
        }
        finished
    }

    /// `TrackTrajectory -> HoldPosition` at `final_target`, unless the command
    /// processor left or restarted the run since the loop's snapshot.
    pub(crate) fn complete_trajectory(&self, generation: u32, final_target: i32) -> bool {
        let finished = critical_section::with(|_| {
            if !self.is_current(generation) || !self.mode.finish(Mode::TrackTrajectory, Mode::HoldPosition) {
                return false;
            }
            self.hold_target.store(final_target, Ordering::Relaxed);
            self.trajectory_ready.store(true, Ordering::Release);
            self.run_complete.signal(RunEvent::TrajectoryDone { final_target });
            true
        });
        if finished {
            info!("trajectory done, holding {} deg", final_target);
        }
        finished
    }

    /// Latch the fault and wake anyone waiting on a run, which can no longer
    /// complete.
    pub(crate) fn raise_fault(&self, invalid: InvalidMode) {
        if !self.fault.swap(true, Ordering::Relaxed) {
            error!("corrupt mode register: {}", invalid.0);
        }
        self.run_complete.signal(RunEvent::Faulted);
    }
}

impl Default for ServoHandler {
    fn default() -> Self {
        Self::new()
    }
}

/* --------------------------- Run Setup Guard -------------------------- */

/// Scoped access to the grouped run-start writes. Only obtainable inside
/// [`ServoHandler::transaction`], so it always holds the critical section.
pub struct RunSetup<'cs> {
    servo: &'cs ServoHandler,
    cs: CriticalSection<'cs>,
}

impl RunSetup<'_> {
    /// Both loops restart their integrators, previous error, test counter and
    /// sample index on their next tick. The live current setpoint drops to zero.
    pub fn reset_controllers(&mut self) {
        self.servo.generation.fetch_add(1, Ordering::Relaxed);
        self.servo.current_setpoint.store(0, Ordering::Relaxed);
    }

    pub fn set_hold_target(&mut self, target_deg: i32) {
        self.servo.hold_target.store(target_deg, Ordering::Relaxed);
    }

    pub fn trajectory_len(&self) -> usize {
        self.servo.trajectory.borrow_ref(self.cs).len()
    }

    /// Store the new mode. Entering a run-to-completion mode invalidates its
    /// previous telemetry and arms the completion signal.
    pub fn switch_mode(&mut self, mode: Mode) {
        match mode {
            Mode::CurrentTest => {
                self.servo.current_test_ready.store(false, Ordering::Relaxed);
                self.servo.current_test_log.borrow_ref_mut(self.cs).clear();
            },
            Mode::TrackTrajectory => {
                self.servo.trajectory_ready.store(false, Ordering::Relaxed);
                self.servo.trajectory_log.borrow_ref_mut(self.cs).clear();
            },
            Mode::Idle | Mode::ManualDrive | Mode::HoldPosition => {},
        }
        self.servo.run_complete.reset();
        self.servo.mode.set(mode);
    }
}
