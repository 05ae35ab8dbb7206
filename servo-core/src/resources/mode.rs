/*
    Mode Register
        One byte, lock-free. Written by the command processor, read every tick
        by both loops. Run-to-completion modes are ended by the owning loop
        through a compare-exchange so a concurrent stop always wins.
*/

use super::*;

/* --------------------------- Mode -------------------------- */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    Idle = 0,
    ManualDrive = 1,
    CurrentTest = 2,
    HoldPosition = 3,
    TrackTrajectory = 4,
}

/// Raw register content that does not name a [`Mode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidMode(pub u8);

impl TryFrom<u8> for Mode {
    type Error = InvalidMode;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Mode::Idle),
            1 => Ok(Mode::ManualDrive),
            2 => Ok(Mode::CurrentTest),
            3 => Ok(Mode::HoldPosition),
            4 => Ok(Mode::TrackTrajectory),
            _ => Err(InvalidMode(v)),
        }
    }
}

impl Mode {
    /// Modes that end themselves once their run is over.
    pub fn is_run_to_completion(self) -> bool {
        matches!(self, Mode::CurrentTest | Mode::TrackTrajectory)
    }
}

/* --------------------------- Register -------------------------- */
pub struct ModeRegister {
    raw: AtomicU8,
}

impl ModeRegister {
    pub const fn new(mode: Mode) -> Self {
        Self {
            raw: AtomicU8::new(mode as u8),
        }
    }

    pub fn get(&self) -> Result<Mode, InvalidMode> {
        Mode::try_from(self.raw())
    }

    pub fn raw(&self) -> u8 {
        return self.raw.load(Ordering::Acquire);
    }

    pub fn set(&self, mode: Mode) {
        self.raw.store(mode as u8, Ordering::Release);
    }

    /// Move `from -> to` only if `from` is still live. Returns whether the
    /// transition happened.
    pub fn finish(&self, from: Mode, to: Mode) -> bool {
        self.raw
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn store_raw(&self, raw: u8) {
        self.raw.store(raw, Ordering::Release);
    }
}
