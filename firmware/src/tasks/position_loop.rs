/*
* Position Loop Task
*  - 200 Hz, core 1
*  - Feeds the current loop its setpoint through SERVO
*/

use super::*;

#[embassy_executor::task]
pub async fn position_loop_task() {
    let mut control = PositionLoop::new(&ENCODER, &SERVO);
    let mut ticker = Ticker::every(Duration::from_micros(POSITION_LOOP_PERIOD_US));

    loop {
        control.tick();
        ticker.next().await;
    }
}
