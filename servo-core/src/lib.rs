/*
* Servo Core
*  Cascaded control engine for one brushed DC motor
*  - Current loop (PI) drives the H-bridge duty at the fast rate
*  - Position loop (PID) feeds the current loop a setpoint at the slow rate
*  - Command processor serves a line protocol to the host
*/
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod command;
pub mod control;
pub mod interface;
pub mod resources;

pub use command::CommandProcessor;
pub use command::SessionError;
pub use control::CurrentLoop;
pub use control::PositionLoop;
pub use interface::Actuator;
pub use interface::AngleSensor;
pub use interface::CurrentSensor;
pub use resources::ErrorCode;
pub use resources::Mode;
pub use resources::RunEvent;
pub use resources::ServoHandler;
