/*
    Control Laws and Loops
*/

use crate::interface::Actuator;
use crate::interface::AngleSensor;
use crate::interface::CurrentSensor;
use crate::resources::CurrentGains;
use crate::resources::CurrentLoopConfig;
use crate::resources::InvalidMode;
use crate::resources::Mode;
use crate::resources::PositionGains;
use crate::resources::PositionLoopConfig;
use crate::resources::Sample;
use crate::resources::ServoHandler;
use crate::resources::CURRENT_TEST_HALF_PERIOD_TICKS;
use crate::resources::CURRENT_TEST_SAMPLES;

pub mod current_loop;
pub mod pi_control;
pub mod pid_control;
pub mod position_loop;

pub use current_loop::*;
pub use pi_control::*;
pub use pid_control::*;
pub use position_loop::*;
