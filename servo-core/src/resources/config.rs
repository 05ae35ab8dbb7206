/*
*  Default Control Config
*
*  Loop Rates
*  - Current loop 5 kHz  (200 us)
*  - Position loop 200 Hz (5 ms)
*/

/* --------------------------- Loop Timing -------------------------- */
pub const CURRENT_LOOP_PERIOD_US: u64 = 200;
pub const POSITION_LOOP_PERIOD_US: u64 = 5000;

/* --------------------------- Actuation Limits -------------------------- */
pub const MAX_DUTY_PERCENT: i32 = 100;
pub const CURRENT_SETPOINT_LIMIT_MA: i32 = 300;
pub const EFFORT_TO_DUTY: f32 = 1.0; // PI output is already in duty percent

/* --------------------------- Current Test -------------------------- */
pub const CURRENT_TEST_AMPLITUDE_MA: i32 = 200;
pub const CURRENT_TEST_HALF_PERIOD_TICKS: usize = 25;
pub const CURRENT_TEST_SAMPLES: usize = 4 * CURRENT_TEST_HALF_PERIOD_TICKS;

/* --------------------------- Trajectory -------------------------- */
pub const MAX_TRAJECTORY_SAMPLES: usize = 2000;

/* --------------------------- Default Gains -------------------------- */
pub const DEFAULT_CURRENT_GAINS: CurrentGains = CurrentGains {
    kp: 0.75,
    ki: 0.05,
};

pub const DEFAULT_POSITION_GAINS: PositionGains = PositionGains {
    kp: 150.0,
    ki: 0.0,
    kd: 5000.0,
};

/* --------------------------- Integrator Bounds -------------------------- */
// None keeps the plain running sum
pub const CURRENT_INTEGRAL_LIMIT: Option<f32> = None;
pub const POSITION_INTEGRAL_LIMIT: Option<f32> = None;

/* --------------------------- Command Protocol -------------------------- */
pub const LINE_BUFFER_SIZE: usize = 64;
pub const REPLY_BUFFER_SIZE: usize = 128;
pub const TELEMETRY_CHUNK: usize = 16;

/* --------------------------- Gains -------------------------- */
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentGains {
    pub kp: f32,
    pub ki: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/* --------------------------- Loop Config -------------------------- */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurrentLoopConfig {
    pub max_duty_percent: i32,
    pub effort_to_duty: f32,
    pub integral_limit: Option<f32>,
    pub test_amplitude_ma: i32,
}

impl CurrentLoopConfig {
    pub const DEFAULT: Self = Self {
        max_duty_percent: MAX_DUTY_PERCENT,
        effort_to_duty: EFFORT_TO_DUTY,
        integral_limit: CURRENT_INTEGRAL_LIMIT,
        test_amplitude_ma: CURRENT_TEST_AMPLITUDE_MA,
    };
}

impl Default for CurrentLoopConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionLoopConfig {
    pub setpoint_limit_ma: i32,
    pub integral_limit: Option<f32>,
}

impl PositionLoopConfig {
    pub const DEFAULT: Self = Self {
        setpoint_limit_ma: CURRENT_SETPOINT_LIMIT_MA,
        integral_limit: POSITION_INTEGRAL_LIMIT,
    };
}

impl Default for PositionLoopConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
