//! Driver lifecycle state

/// Instance lifecycle: `Uninitialized -> Initialized -> Enabled` and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Uninitialized,
    Initialized,
    Enabled,
}

#[cfg(feature = "defmt")]
impl defmt::Format for DriverState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DriverState::Uninitialized => defmt::write!(fmt, "Uninitialized"),
            DriverState::Initialized => defmt::write!(fmt, "Initialized"),
            DriverState::Enabled => defmt::write!(fmt, "Enabled"),
        }
    }
}
