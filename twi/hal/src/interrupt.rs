//! Instance interrupt line abstraction

/// Interrupt priority (0 = highest on most platforms)
pub type InterruptPriority = u8;

/// The interrupt line of one peripheral instance.
pub trait InterruptLine {
    /// Clear any pending request, set the priority and unmask the line.
    fn enable(&mut self, priority: InterruptPriority);

    /// Mask the line.
    fn disable(&mut self);
}

/// Line that is never enabled, for purely synchronous instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterrupt;

impl InterruptLine for NoInterrupt {
    fn enable(&mut self, _priority: InterruptPriority) {}

    fn disable(&mut self) {}
}

#[cfg(feature = "cortex-m")]
pub use nvic::NvicLine;

#[cfg(feature = "cortex-m")]
mod nvic {
    use super::{InterruptLine, InterruptPriority};
    use cortex_m::interrupt::InterruptNumber;
    use cortex_m::peripheral::NVIC;

    /// Implemented priority bits on nRF52 parts.
    const NVIC_PRIO_BITS: u8 = 3;

    /// NVIC-backed interrupt line.
    #[derive(Debug, Clone, Copy)]
    pub struct NvicLine<I: InterruptNumber> {
        irq: I,
    }

    impl<I: InterruptNumber> NvicLine<I> {
        pub const fn new(irq: I) -> Self {
            Self { irq }
        }
    }

    impl<I: InterruptNumber> InterruptLine for NvicLine<I> {
        fn enable(&mut self, priority: InterruptPriority) {
            NVIC::unpend(self.irq);
            // SAFETY: the line belongs to this driver instance; the priority
            // and unmask writes touch no state shared with other owners.
            unsafe {
                let mut core = cortex_m::Peripherals::steal();
                core.NVIC.set_priority(self.irq, priority << (8 - NVIC_PRIO_BITS));
                NVIC::unmask(self.irq);
            }
        }

        fn disable(&mut self) {
            NVIC::mask(self.irq);
        }
    }
}
