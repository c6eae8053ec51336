//! Instance configuration

/// Bus frequency, carrying the FREQUENCY register encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    /// 100 kbps
    #[default]
    K100,
    /// 250 kbps
    K250,
    /// 400 kbps
    K400,
}

impl Frequency {
    pub const fn register_value(self) -> u32 {
        match self {
            Frequency::K100 => 0x0198_0000,
            Frequency::K250 => 0x0400_0000,
            Frequency::K400 => 0x0640_0000,
        }
    }
}

/// Default interrupt priority for the instance interrupt line.
pub const DEFAULT_INTERRUPT_PRIORITY: u8 = 6;

/// Configuration applied by `initialize()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwiConfig {
    pub frequency: Frequency,
    /// Priority of the instance interrupt; only used when a handler is set.
    pub interrupt_priority: u8,
    /// Run bus recovery before configuring the peripheral.
    pub clear_bus_init: bool,
    /// Leave SCL/SDA configured after `uninitialize()`.
    pub hold_bus_uninit: bool,
}

impl Default for TwiConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::K100,
            interrupt_priority: DEFAULT_INTERRUPT_PRIORITY,
            clear_bus_init: true,
            hold_bus_uninit: false,
        }
    }
}

impl TwiConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TwiConfigBuilder {
        TwiConfigBuilder::default()
    }
}

/// Builder for [`TwiConfig`].
#[derive(Debug, Clone, Default)]
pub struct TwiConfigBuilder {
    config: TwiConfig,
}

impl TwiConfigBuilder {
    /// Sets the bus frequency.
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.config.frequency = frequency;
        self
    }

    /// Sets the interrupt priority.
    pub fn interrupt_priority(mut self, priority: u8) -> Self {
        self.config.interrupt_priority = priority;
        self
    }

    /// Enables or disables bus recovery during initialization.
    pub fn clear_bus_init(mut self, enabled: bool) -> Self {
        self.config.clear_bus_init = enabled;
        self
    }

    /// Keeps the bus pins configured after uninitialization.
    pub fn hold_bus_uninit(mut self, hold: bool) -> Self {
        self.config.hold_bus_uninit = hold;
        self
    }

    pub fn build(self) -> TwiConfig {
        self.config
    }
}
