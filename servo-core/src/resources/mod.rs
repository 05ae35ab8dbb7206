/* 
* Resources Hub
*/

/* --------------------------- Library -------------------------- */
use core::cell::Cell;
use core::cell::RefCell;
use critical_section::CriticalSection;
use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;
use portable_atomic::AtomicI32;
use portable_atomic::AtomicU32;
use portable_atomic::AtomicU8;
use portable_atomic::Ordering;

use crate::interface::AngleSensor;

/* --------------------------- Declare Modules -------------------------- */
pub mod config;
pub mod error_code;
pub mod mode;
pub mod servo_resources;
pub mod telemetry;

pub use config::*;
pub use error_code::*;
pub use mode::*;
pub use servo_resources::*;
pub use telemetry::*;
