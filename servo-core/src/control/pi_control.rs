/*
    Current PI Law
        u = Kp * e + Ki * sum(e)
*/

use super::*;

/* --------------------------- Code -------------------------- */
pub struct PIcontrol {
    kp: f32,
    ki: f32,
    integral: f32,
    integral_limit: Option<f32>,
}

impl PIcontrol {
    pub const fn new(integral_limit: Option<f32>) -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            integral: 0.0,
            integral_limit,
        }
    }

    pub fn update_pi_param(&mut self, gains: CurrentGains) {
        self.kp = gains.kp;
        self.ki = gains.ki;
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Accumulate `error` and return the unclamped effort.
    pub fn compute(&mut self, error: f32) -> f32 {
        self.integral += error;
        if let Some(limit) = self.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }

        return self.kp*error + self.ki*self.integral;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_of_square_wave_yields_proportional_plus_integral() {
        let mut pi = PIcontrol::new(None);
        pi.update_pi_param(CurrentGains { kp: 0.75, ki: 0.05 });

        let u = pi.compute(200.0);
        assert!((u - 160.0).abs() < 1e-3);
        assert_eq!(pi.integral(), 200.0);
    }

    #[test]
    fn integral_is_unbounded_by_default() {
        let mut pi = PIcontrol::new(None);
        pi.update_pi_param(CurrentGains { kp: 0.0, ki: 1.0 });
        for _ in 0..1000 {
            pi.compute(500.0);
        }
        assert_eq!(pi.integral(), 500_000.0);
    }

    #[test]
    fn optional_integral_limit_is_symmetric() {
        let mut pi = PIcontrol::new(Some(1000.0));
        pi.update_pi_param(CurrentGains { kp: 0.0, ki: 1.0 });
        for _ in 0..10 {
            pi.compute(-500.0);
        }
        assert_eq!(pi.integral(), -1000.0);
        assert_eq!(pi.compute(0.0), -1000.0);
    }

    #[test]
    fn reset_clears_the_accumulator() {
        let mut pi = PIcontrol::new(None);
        pi.update_pi_param(CurrentGains { kp: 1.0, ki: 1.0 });
        pi.compute(10.0);
        pi.reset();
        assert_eq!(pi.integral(), 0.0);
        assert_eq!(pi.compute(0.0), 0.0);
    }
}
