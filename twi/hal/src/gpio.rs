//! GPIO abstraction used by bus recovery

/// GPIO pin modes relevant to a two-wire bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Input (floating)
    Input,
    /// Input with pull-up resistor, output buffer disconnected
    InputPullUp,
    /// Output (open-drain, standard-0 disconnect-1) with pull-up
    OutputOpenDrain,
    /// Input buffer and output driver disconnected
    Disconnected,
}

/// GPIO pin levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Low level (0V)
    Low,
    /// High level (VCC)
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

/// GPIO pin trait
pub trait GpioPin {
    /// Configure pin mode
    fn set_mode(&mut self, mode: PinMode);

    /// Read current level
    fn read(&self) -> Level;

    /// Write level (for output pins)
    fn write(&mut self, level: Level);

    fn set_high(&mut self) {
        self.write(Level::High)
    }

    fn set_low(&mut self) {
        self.write(Level::Low)
    }

    /// Get pin number, as programmed into the peripheral's PSEL registers
    fn pin_number(&self) -> u32;
}
