/*
    Encoder Task
        High priority executor, counts every quadrature step into ENCODER.
*/

use super::*;

use embassy_rp::pio_programs::rotary_encoder::Direction;
use embassy_rp::pio_programs::rotary_encoder::PioEncoder;

pub struct RotaryEncoder<'d, T: Instance, const SM: usize> {
    encoder: PioEncoder<'d, T, SM>,
    counter: &'static EncoderCounter,
}

impl<'d, T: Instance, const SM: usize> RotaryEncoder<'d, T, SM> {
    pub fn new(encoder: PioEncoder<'d, T, SM>, counter: &'static EncoderCounter) -> Self {
        Self { encoder, counter }
    }

    pub async fn run_encoder_task(&mut self) {
        loop {
            match self.encoder.read().await {
                Direction::Clockwise => self.counter.step(1),
                Direction::CounterClockwise => self.counter.step(-1),
            }
        }
    }
}

#[embassy_executor::task]
pub async fn encoder_task(mut encoder: RotaryEncoder<'static, PIO0, 0>) {
    encoder.run_encoder_task().await;
}
