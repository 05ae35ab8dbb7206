/*
    Current Control Loop
        Fixed fast rate (5 kHz by default). One call to `tick` per period.
        - Idle              : drive 0, integral cleared
        - ManualDrive       : commanded duty, no feedback
        - CurrentTest       : PI against a +/- square wave, logged, self-terminating
        - HoldPosition /
          TrackTrajectory   : PI against the position loop's current setpoint
*/

use super::*;

/* --------------------------- Code -------------------------- */
pub struct CurrentLoop<'a, S: CurrentSensor, A: Actuator> {
    sensor: S,
    actuator: A,
    servo: &'a ServoHandler,
    controller: PIcontrol,
    config: CurrentLoopConfig,
    counter: usize,
    generation: u32,
}

impl<'a, S: CurrentSensor, A: Actuator> CurrentLoop<'a, S, A> {
    pub fn new(sensor: S, actuator: A, servo: &'a ServoHandler) -> Self {
        Self::with_config(sensor, actuator, servo, CurrentLoopConfig::DEFAULT)
    }

    pub fn with_config(sensor: S, actuator: A, servo: &'a ServoHandler, config: CurrentLoopConfig) -> Self {
        Self {
            sensor,
            actuator,
            servo,
            controller: PIcontrol::new(config.integral_limit),
            config,
            counter: 0,
            generation: servo.current_loop_inputs().generation,
        }
    }

    pub fn integral(&self) -> f32 {
        self.controller.integral()
    }

    /// Position within the current test cycle.
    pub fn test_tick(&self) -> usize {
        self.counter
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Square-wave reference: `+amplitude` for a half period, then `-amplitude`.
    pub fn test_reference(&self, tick: usize) -> i32 {
        if (tick / CURRENT_TEST_HALF_PERIOD_TICKS) % 2 == 0 {
            self.config.test_amplitude_ma
        } else {
            -self.config.test_amplitude_ma
        }
    }

    fn restart(&mut self) {
        self.controller.reset();
        self.counter = 0;
    }

    fn clamp_duty(&self, duty: i32) -> i32 {
        let limit = self.config.max_duty_percent;
        duty.clamp(-limit, limit)
    }

    fn effort_to_drive(&self, effort: f32) -> i32 {
        let limit = self.config.max_duty_percent as f32;
        (effort * self.config.effort_to_duty).clamp(-limit, limit) as i32
    }

    fn regulate(&mut self, reference: i32, sensed: i32) -> i32 {
        let effort = self.controller.compute(reference as f32 - sensed as f32);
        self.effort_to_drive(effort)
    }

    fn current_test_step(&mut self, sensed: i32) -> i32 {
        let reference = self.test_reference(self.counter);
        let drive = self.regulate(reference, sensed);
        self.servo
            .record_current_test(self.generation, self.counter, Sample::new(reference, sensed));

        self.counter += 1;
        if self.counter >= CURRENT_TEST_SAMPLES {
            self.restart();
            self.servo.complete_current_test(self.generation);
        }
        drive
    }

    fn drive_for(&mut self, mode: Mode, setpoint: i32, manual_duty: i32, sensed: i32) -> i32 {
        match mode {
            Mode::Idle => {
                self.restart();
                0
            },
            Mode::ManualDrive => self.clamp_duty(manual_duty),
            Mode::CurrentTest => self.current_test_step(sensed),
            Mode::HoldPosition | Mode::TrackTrajectory => self.regulate(setpoint, sensed),
        }
    }

    fn fault(&mut self, invalid: InvalidMode) -> i32 {
        self.servo.raise_fault(invalid);
        self.restart();
        0
    }

    /// Run one period. Returns the signed duty applied to the actuator.
    pub fn tick(&mut self) -> i32 {
        let inputs = self.servo.current_loop_inputs();
        let sensed = self.sensor.read_current();
        self.servo.publish_sensed_current(sensed);

        if inputs.generation != self.generation {
            self.generation = inputs.generation;
            self.restart();
        }
        self.controller.update_pi_param(inputs.gains);

        let drive = match inputs.mode {
            Ok(mode) => self.drive_for(mode, inputs.current_setpoint, inputs.manual_duty, sensed),
            Err(invalid) => self.fault(invalid),
        };

        self.actuator.set_drive(drive);
        self.servo.publish_drive(drive);
        drive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::RunEvent;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FixedCurrent(Rc<Cell<i32>>);

    impl CurrentSensor for FixedCurrent {
        fn read_current(&mut self) -> i32 {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct Bridge {
        last: Option<i32>,
    }

    impl Actuator for Bridge {
        fn set_drive(&mut self, signed_percent: i32) {
            self.last = Some(signed_percent);
        }
    }

    /// Stand in for the position loop.
    fn publish_setpoint(servo: &ServoHandler, milliamps: i32) {
        let generation = servo.position_loop_inputs().generation;
        assert!(servo.publish_current_setpoint(generation, milliamps));
    }

    /// Restarts the current test from inside the loop's `restart_on`-th read,
    /// after the loop has taken its snapshot for that tick.
    struct RestartingSensor<'a> {
        servo: &'a ServoHandler,
        reads: usize,
        restart_on: usize,
    }

    impl CurrentSensor for RestartingSensor<'_> {
        fn read_current(&mut self) -> i32 {
            self.reads += 1;
            if self.reads == self.restart_on {
                self.servo.begin_current_test();
            }
            if self.reads > self.restart_on {
                11
            } else {
                7
            }
        }
    }

    fn setup(servo: &ServoHandler) -> (CurrentLoop<'_, FixedCurrent, Bridge>, Rc<Cell<i32>>) {
        let current = Rc::new(Cell::new(0));
        let control = CurrentLoop::new(FixedCurrent(current.clone()), Bridge::default(), servo);
        (control, current)
    }

    #[test]
    fn idle_drives_zero_every_tick() {
        let servo = ServoHandler::new();
        let (mut control, current) = setup(&servo);
        current.set(120);

        assert_eq!(control.tick(), 0);
        assert_eq!(control.actuator().last, Some(0));
        assert_eq!(servo.sensed_current(), 120);
    }

    #[test]
    fn manual_drive_is_clamped_both_ways() {
        let servo = ServoHandler::new();
        let (mut control, _) = setup(&servo);

        servo.set_manual_duty(250);
        servo.set_mode(Mode::ManualDrive);
        assert_eq!(control.tick(), 100);

        servo.set_manual_duty(-37);
        assert_eq!(control.tick(), -37);

        servo.set_manual_duty(i32::MIN);
        assert_eq!(control.tick(), -100);
        assert_eq!(servo.applied_drive(), -100);
    }

    #[test]
    fn stop_reaches_zero_drive_within_one_tick() {
        let servo = ServoHandler::new();
        let (mut control, _) = setup(&servo);
        servo.set_manual_duty(80);
        servo.set_mode(Mode::ManualDrive);
        assert_eq!(control.tick(), 80);

        servo.stop();
        assert_eq!(control.tick(), 0);

        servo.stop();
        servo.stop();
        assert_eq!(control.tick(), 0);
        assert_eq!(servo.get_mode(), Ok(Mode::Idle));
    }

    #[test]
    fn first_current_test_tick_saturates_forward() {
        let servo = ServoHandler::new();
        servo.set_current_gains(CurrentGains { kp: 0.75, ki: 0.05 });
        let (mut control, _) = setup(&servo);

        servo.begin_current_test();
        // 0.75 * 200 + 0.05 * 200 = 160 -> clamped to full forward duty
        assert_eq!(control.tick(), 100);
        assert_eq!(control.integral(), 200.0);
    }

    #[test]
    fn current_test_completes_after_exactly_one_cycle() {
        let servo = ServoHandler::new();
        let (mut control, _) = setup(&servo);
        servo.set_mode(Mode::HoldPosition);
        control.tick();

        servo.begin_current_test();
        for tick in 0..CURRENT_TEST_SAMPLES {
            assert_eq!(servo.get_mode(), Ok(Mode::CurrentTest), "tick {}", tick);
            assert_eq!(servo.current_test_telemetry_len(), Err(crate::ErrorCode::NotReady));
            control.tick();
        }

        assert_eq!(servo.get_mode(), Ok(Mode::Idle));
        assert_eq!(control.integral(), 0.0);
        assert_eq!(control.test_tick(), 0);
        assert_eq!(servo.current_test_telemetry_len(), Ok(CURRENT_TEST_SAMPLES));

        let mut log = [Sample::ZERO; CURRENT_TEST_SAMPLES];
        assert_eq!(servo.read_current_test_telemetry(0, &mut log), Ok(CURRENT_TEST_SAMPLES));
        assert_eq!(log[0].reference, 200);
        assert_eq!(log[24].reference, 200);
        assert_eq!(log[25].reference, -200);
        assert_eq!(log[50].reference, 200);
        assert_eq!(log[99].reference, -200);

        let event = embassy_futures::block_on(servo.wait_run_complete());
        assert_eq!(event, RunEvent::CurrentTestDone);
    }

    #[test]
    fn current_test_records_sensed_current() {
        let servo = ServoHandler::new();
        let (mut control, current) = setup(&servo);
        servo.begin_current_test();
        for tick in 0..CURRENT_TEST_SAMPLES {
            current.set(tick as i32);
            control.tick();
        }

        let mut log = [Sample::ZERO; CURRENT_TEST_SAMPLES];
        servo.read_current_test_telemetry(0, &mut log).unwrap();
        assert!(log.iter().enumerate().all(|(i, s)| s.measured == i as i32));
    }

    #[test]
    fn forced_stop_mid_test_cancels_the_run() {
        let servo = ServoHandler::new();
        let (mut control, _) = setup(&servo);
        servo.begin_current_test();
        for _ in 0..40 {
            control.tick();
        }

        servo.stop();
        assert_eq!(control.tick(), 0);
        assert_eq!(control.test_tick(), 0);
        assert_eq!(control.integral(), 0.0);
        assert_eq!(servo.current_test_telemetry_len(), Err(crate::ErrorCode::NotReady));
    }

    #[test]
    fn restarting_the_test_resets_counter_and_integral() {
        let servo = ServoHandler::new();
        let (mut control, _) = setup(&servo);
        servo.begin_current_test();
        for _ in 0..30 {
            control.tick();
        }

        servo.begin_current_test();
        control.tick();
        assert_eq!(control.test_tick(), 1);
        assert_eq!(control.integral(), 200.0);
    }

    #[test]
    fn restart_during_last_test_tick_is_not_completed_by_the_old_run() {
        let servo = ServoHandler::new();
        servo.begin_current_test();
        let sensor = RestartingSensor { servo: &servo, reads: 0, restart_on: CURRENT_TEST_SAMPLES };
        let mut control = CurrentLoop::new(sensor, Bridge::default(), &servo);

        for _ in 0..CURRENT_TEST_SAMPLES {
            control.tick();
        }
        assert_eq!(servo.get_mode(), Ok(Mode::CurrentTest));
        assert_eq!(servo.current_test_telemetry_len(), Err(crate::ErrorCode::NotReady));

        for _ in 0..CURRENT_TEST_SAMPLES {
            control.tick();
        }
        assert_eq!(servo.get_mode(), Ok(Mode::Idle));
        assert_eq!(servo.current_test_telemetry_len(), Ok(CURRENT_TEST_SAMPLES));

        let mut log = [Sample::ZERO; CURRENT_TEST_SAMPLES];
        servo.read_current_test_telemetry(0, &mut log).unwrap();
        assert!(log.iter().all(|s| s.measured == 11));
        assert_eq!(log[0], Sample::new(200, 11));
    }

    #[test]
    fn restart_mid_test_discards_the_old_samples() {
        let servo = ServoHandler::new();
        servo.begin_current_test();
        let sensor = RestartingSensor { servo: &servo, reads: 0, restart_on: 60 };
        let mut control = CurrentLoop::new(sensor, Bridge::default(), &servo);

        // 59 old samples, one overtaken tick, then the fresh run.
        for _ in 0..60 + CURRENT_TEST_SAMPLES {
            control.tick();
        }
        assert_eq!(servo.get_mode(), Ok(Mode::Idle));

        let mut log = [Sample::ZERO; CURRENT_TEST_SAMPLES];
        assert_eq!(servo.read_current_test_telemetry(0, &mut log), Ok(CURRENT_TEST_SAMPLES));
        assert!(log.iter().all(|s| s.measured == 11));
    }

    #[test]
    fn hold_mode_tracks_the_live_current_setpoint() {
        let servo = ServoHandler::with_gains(CurrentGains { kp: 0.1, ki: 0.0 }, Default::default());
        let (mut control, current) = setup(&servo);
        servo.set_mode(Mode::HoldPosition);

        publish_setpoint(&servo, 300);
        current.set(100);
        assert_eq!(control.tick(), 20);

        publish_setpoint(&servo, -300);
        assert_eq!(control.tick(), -40);
    }

    #[test]
    fn huge_error_still_yields_full_duty() {
        let servo = ServoHandler::with_gains(CurrentGains { kp: 1000.0, ki: 1000.0 }, Default::default());
        let (mut control, current) = setup(&servo);
        servo.set_mode(Mode::HoldPosition);
        publish_setpoint(&servo, 300);
        current.set(-5000);

        for _ in 0..50 {
            let drive = control.tick();
            assert!((-100..=100).contains(&drive));
            assert_eq!(drive, 100);
        }
    }

    #[test]
    fn corrupt_mode_latches_fault_and_zeroes_drive() {
        let servo = ServoHandler::new();
        let (mut control, _) = setup(&servo);
        servo.set_manual_duty(60);
        servo.set_mode(Mode::ManualDrive);
        assert_eq!(control.tick(), 60);

        servo.mode.store_raw(9);
        assert_eq!(control.tick(), 0);
        assert!(servo.fault_latched());
        assert!(servo.clear_fault());
        assert!(!servo.fault_latched());
    }
}
