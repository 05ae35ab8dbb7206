/* 
* Resources Hub
*/

/* --------------------------- Library -------------------------- */
use assign_resources::assign_resources;
use portable_atomic::AtomicI32;
use portable_atomic::Ordering;
use static_cell::StaticCell;

use embassy_rp::bind_interrupts;
use embassy_rp::peripherals;
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_rp::usb::InterruptHandler as UsbInterruptHandler;
use embassy_rp::multicore::Stack;
use embassy_executor::Executor;
use embassy_executor::InterruptExecutor;
use embassy_usb::class::cdc_acm::State;

use servo_core::AngleSensor;
use servo_core::ServoHandler;

/* --------------------------- Declare Modules -------------------------- */
pub mod config;
pub mod encoder_resources;
pub mod gpio_list;

pub use config::*;
pub use encoder_resources::*;
pub use gpio_list::*;
