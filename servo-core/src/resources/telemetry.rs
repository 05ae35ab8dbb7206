/*
    Telemetry Resources
        Fixed-capacity (reference, measured) logs. The writing loop owns the
        cursor; the command processor only reads after the run completes.
*/

/* --------------------------- Sample -------------------------- */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub reference: i32,
    pub measured: i32,
}

impl Sample {
    pub const ZERO: Sample = Sample {
        reference: 0,
        measured: 0,
    };

    pub const fn new(reference: i32, measured: i32) -> Self {
        Self { reference, measured }
    }
}

/* --------------------------- Buffer -------------------------- */
pub struct TelemetryBuffer<const N: usize> {
    samples: [Sample; N],
    len: usize,
}

impl<const N: usize> TelemetryBuffer<N> {
    pub const fn new() -> Self {
        Self {
            samples: [Sample::ZERO; N],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append `sample` as entry `index`. Anything but the next free slot is
    /// refused, so no slot from an earlier run ever becomes readable.
    pub fn record(&mut self, index: usize, sample: Sample) -> bool {
        if index != self.len {
            return false;
        }
        let Some(slot) = self.samples.get_mut(index) else {
            return false;
        };
        *slot = sample;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples[..self.len]
    }

    /// Copy samples starting at `start` into `out`, returning how many were copied.
    pub fn copy_into(&self, start: usize, out: &mut [Sample]) -> usize {
        let available = self.as_slice().get(start..).unwrap_or(&[]);
        let count = available.len().min(out.len());
        out[..count].copy_from_slice(&available[..count]);
        count
    }
}

impl<const N: usize> Default for TelemetryBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
