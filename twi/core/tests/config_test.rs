//! Configuration tests for twi-core

use twi_core::{Frequency, TwiConfig, DEFAULT_INTERRUPT_PRIORITY};

#[test]
fn test_default_config() {
    let config = TwiConfig::default();
    assert_eq!(config.frequency, Frequency::K100);
    assert_eq!(config.interrupt_priority, DEFAULT_INTERRUPT_PRIORITY);
    assert!(config.clear_bus_init);
    assert!(!config.hold_bus_uninit);
}

#[test]
fn test_builder_overrides() {
    let config = TwiConfig::builder()
        .frequency(Frequency::K400)
        .interrupt_priority(2)
        .clear_bus_init(false)
        .hold_bus_uninit(true)
        .build();

    assert_eq!(config.frequency, Frequency::K400);
    assert_eq!(config.interrupt_priority, 2);
    assert!(!config.clear_bus_init);
    assert!(config.hold_bus_uninit);
}

#[test]
fn test_frequency_encodings() {
    assert_eq!(Frequency::K100.register_value(), 0x0198_0000);
    assert_eq!(Frequency::K250.register_value(), 0x0400_0000);
    assert_eq!(Frequency::K400.register_value(), 0x0640_0000);
}
