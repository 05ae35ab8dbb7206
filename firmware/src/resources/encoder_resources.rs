/*
    Encoder Resources
        Quadrature count written by the encoder task, read as degrees by the
        position loop and the command processor.
*/

use super::*;

/* --------------------------- Code -------------------------- */
pub struct EncoderCounter {
    count: AtomicI32,
    pulses_per_10_rev: i32,
}

impl EncoderCounter {
    pub const fn new(pulses_per_10_rev: i32) -> Self {
        Self {
            count: AtomicI32::new(0),
            pulses_per_10_rev,
        }
    }

    pub fn step(&self, delta: i32) {
        self.count.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get_count(&self) -> i32 {
        return self.count.load(Ordering::Relaxed);
    }
}

impl AngleSensor for EncoderCounter {
    fn read_angle(&self) -> i32 {
        let count = self.get_count() as i64;
        return (count * 3600 / self.pulses_per_10_rev as i64) as i32;
    }

    fn reset_angle_origin(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}
