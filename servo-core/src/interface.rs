/*
    Collaborator Interfaces
        Implemented by the board: current sense, angle encoder, H-bridge.
*/

/// Motor current sense. Owned by the current loop and sampled once per tick.
pub trait CurrentSensor {
    /// Signed motor current in milliamps.
    fn read_current(&mut self) -> i32;
}

/// Output shaft angle. Shared by reference between the position loop and the
/// command processor, so both methods take `&self`.
pub trait AngleSensor {
    /// Signed angle in degrees relative to the last origin reset.
    fn read_angle(&self) -> i32;

    /// Make the present shaft angle read as zero.
    fn reset_angle_origin(&self);
}

/// H-bridge drive. The sign selects the direction, the magnitude is a duty
/// percentage already clamped to `[0, 100]` by the caller.
pub trait Actuator {
    fn set_drive(&mut self, signed_percent: i32);
}
