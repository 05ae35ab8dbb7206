/*
* Tasks Hub
*/

/* --------------------------- Library -------------------------- */
use defmt_rtt as _;
use panic_probe as _;

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::PIO0;
use embassy_rp::peripherals::USB;
use embassy_rp::pio::Instance;
use embassy_rp::usb::Driver;
use embassy_time::Duration;
use embassy_time::Ticker;
use embassy_time::Timer;

use servo_core::CurrentLoop;
use servo_core::PositionLoop;
use servo_core::resources::CURRENT_LOOP_PERIOD_US;
use servo_core::resources::POSITION_LOOP_PERIOD_US;

use crate::resources::EncoderCounter;
use crate::resources::ENCODER;
use crate::resources::SERVO;

/* --------------------------- Declare Modules -------------------------- */
pub mod current_loop;
pub mod encoder;
pub mod heartbeat;
pub mod position_loop;
pub mod usb_task;
