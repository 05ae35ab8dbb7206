/*
* Heartbeat Task
*  - Blinks while healthy, solid on a latched fault
*/

use super::*;

use crate::resources::HEARTBEAT_PERIOD_MS;

#[embassy_executor::task]
pub async fn heartbeat_task(mut led: Output<'static>) {
    loop {
        if SERVO.fault_latched() {
            led.set_high();
        }
        else {
            led.toggle();
        }
        Timer::after_millis(HEARTBEAT_PERIOD_MS).await;
    }
}
