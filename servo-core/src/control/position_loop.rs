/*
    Position Control Loop
        Fixed slow rate (200 Hz by default). One call to `tick` per period.
        - Idle / ManualDrive / CurrentTest : nothing to do
        - HoldPosition                     : PID to the hold target
        - TrackTrajectory                  : PID to the next trajectory sample,
                                             logged, then hold the last sample
        The output is the current setpoint consumed by the current loop.
*/

use super::*;

/* --------------------------- Code -------------------------- */
pub struct PositionLoop<'a, E: AngleSensor> {
    encoder: &'a E,
    servo: &'a ServoHandler,
    controller: PIDcontrol,
    sample_index: usize,
    generation: u32,
}

impl<'a, E: AngleSensor> PositionLoop<'a, E> {
    pub fn new(encoder: &'a E, servo: &'a ServoHandler) -> Self {
        Self::with_config(encoder, servo, PositionLoopConfig::DEFAULT)
    }

    pub fn with_config(encoder: &'a E, servo: &'a ServoHandler, config: PositionLoopConfig) -> Self {
        Self {
            encoder,
            servo,
            controller: PIDcontrol::new(config.setpoint_limit_ma, config.integral_limit),
            sample_index: 0,
            generation: servo.position_loop_inputs().generation,
        }
    }

    pub fn integral(&self) -> f32 {
        self.controller.integral()
    }

    pub fn prev_error(&self) -> f32 {
        self.controller.prev_error()
    }

    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    fn restart(&mut self) {
        self.controller.reset();
        self.sample_index = 0;
    }

    /// `None` when a run start overtook this tick and the setpoint was dropped.
    fn regulate(&mut self, reference: i32, measured: i32) -> Option<i32> {
        let setpoint = self.controller.compute(reference as f32 - measured as f32);
        self.servo
            .publish_current_setpoint(self.generation, setpoint)
            .then_some(setpoint)
    }

    fn track(&mut self) -> Option<i32> {
        let measured = self.encoder.read_angle();
        let (sample, len) = self.servo.trajectory_sample(self.sample_index);

        let Some(reference) = sample else {
            // Nothing loaded: hold where the shaft already is.
            self.sample_index = 0;
            self.servo.complete_trajectory(self.generation, measured);
            return None;
        };

        let setpoint = self.regulate(reference, measured)?;
        self.servo
            .record_trajectory(self.generation, self.sample_index, Sample::new(reference, measured));

        self.sample_index += 1;
        if self.sample_index >= len {
            self.sample_index = 0;
            self.servo.complete_trajectory(self.generation, reference);
        }
        Some(setpoint)
    }

    /// Run one period. Returns the current setpoint (mA) published this tick,
    /// or `None` when the mode does not use position feedback.
    pub fn tick(&mut self) -> Option<i32> {
        let inputs = self.servo.position_loop_inputs();

        if inputs.generation != self.generation {
            self.generation = inputs.generation;
            self.restart();
        }
        self.controller.update_pid_param(inputs.gains);

        match inputs.mode {
            Ok(Mode::Idle | Mode::ManualDrive | Mode::CurrentTest) => None,
            Ok(Mode::HoldPosition) => {
                let measured = self.encoder.read_angle();
                self.regulate(inputs.hold_target, measured)
            },
            Ok(Mode::TrackTrajectory) => self.track(),
            Err(invalid) => {
                self.servo.raise_fault(invalid);
                None
            },
        }
    }
}
