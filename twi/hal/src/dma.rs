//! DMA reachability check

/// Decides whether the DMA engine can address a buffer.
pub trait DmaRegion {
    fn is_reachable(&self, buffer: &[u8]) -> bool;
}

/// Contiguous address window reachable by EasyDMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamRegion {
    pub start: usize,
    pub end: usize,
}

impl RamRegion {
    /// Data RAM on nRF52 parts.
    pub const NRF52: Self = Self {
        start: 0x2000_0000,
        end: 0x4000_0000,
    };

    /// Accepts every buffer; for targets without a DMA window and host tests.
    pub const fn unrestricted() -> Self {
        Self {
            start: 0,
            end: usize::MAX,
        }
    }
}

impl DmaRegion for RamRegion {
    fn is_reachable(&self, buffer: &[u8]) -> bool {
        let start = buffer.as_ptr() as usize;
        match start.checked_add(buffer.len()) {
            Some(end) => start >= self.start && end <= self.end,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_accepts_stack_buffers() {
        let data = [0u8; 4];
        assert!(RamRegion::unrestricted().is_reachable(&data));
    }

    #[test]
    fn window_rejects_outside_buffers() {
        let data = [0u8; 4];
        let start = data.as_ptr() as usize;
        let region = RamRegion {
            start: start + 1,
            end: start + 64,
        };
        assert!(!region.is_reachable(&data));
        let region = RamRegion {
            start,
            end: start + 2,
        };
        assert!(!region.is_reachable(&data));
    }
}
