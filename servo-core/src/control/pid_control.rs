/*
    Position PID Law
        u = Kp * e + Ki * sum(e) + Kd * (e - e_prev), clamped to a symmetric range
*/

use super::*;

/* --------------------------- Code -------------------------- */
pub struct PIDcontrol {
    kp: f32,
    ki: f32,
    kd: f32,
    integral: f32,
    prev_error: f32,
    integral_limit: Option<f32>,
    max_threshold: i32,
}

impl PIDcontrol {
    pub const fn new(max_threshold: i32, integral_limit: Option<f32>) -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            integral_limit,
            max_threshold,
        }
    }

    pub fn update_pid_param(&mut self, gains: PositionGains) {
        self.kp = gains.kp;
        self.ki = gains.ki;
        self.kd = gains.kd;
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn prev_error(&self) -> f32 {
        self.prev_error
    }

    pub fn limit_output(&self, sig: f32) -> i32 {
        let limit = self.max_threshold as f32;
        sig.clamp(-limit, limit) as i32
    }

    pub fn compute(&mut self, error: f32) -> i32 {
        self.integral += error;
        if let Some(limit) = self.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }
        let derivative = error - self.prev_error;
        self.prev_error = error;

        let sig = self.kp*error + self.ki*self.integral + self.kd*derivative;
        return self.limit_output(sig);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(kp: f32, ki: f32, kd: f32) -> PIDcontrol {
        let mut pid = PIDcontrol::new(300, None);
        pid.update_pid_param(PositionGains { kp, ki, kd });
        pid
    }

    #[test]
    fn large_step_saturates_at_the_setpoint_limit() {
        // 150 * 90 + 5000 * 90 = 463_500 mA before the clamp
        let mut pid = pid(150.0, 0.0, 5000.0);
        assert_eq!(pid.compute(90.0), 300);
        assert_eq!(pid.prev_error(), 90.0);
    }

    #[test]
    fn negative_saturation_mirrors_positive() {
        let mut pid = pid(150.0, 0.0, 5000.0);
        assert_eq!(pid.compute(-90.0), -300);
    }

    #[test]
    fn derivative_uses_previous_error() {
        let mut pid = pid(0.0, 0.0, 2.0);
        assert_eq!(pid.compute(10.0), 20);
        assert_eq!(pid.compute(15.0), 10);
        assert_eq!(pid.compute(15.0), 0);
    }

    #[test]
    fn integral_accumulates_raw_error() {
        let mut pid = pid(0.0, 0.5, 0.0);
        pid.compute(4.0);
        pid.compute(4.0);
        assert_eq!(pid.integral(), 8.0);
        assert_eq!(pid.compute(0.0), 4);
    }

    #[test]
    fn reset_clears_integral_and_previous_error() {
        let mut pid = pid(1.0, 1.0, 1.0);
        pid.compute(5.0);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.prev_error(), 0.0);
    }
}
