//! Memory introspection: core memory regions and emulated address-space maps.

/// Memory descriptors, descriptor flags and address-space names.
pub mod descriptor;
/// Validated memory maps and address resolution.
pub mod map;

pub use descriptor::{AddressSpaceName, MemoryDescriptor, MemoryDescriptorFlags};
pub use map::{MemoryMap, MemoryMapError, ResolvedAddress};

/// Mask selecting the standard memory type from a raw id.
pub const MEMORY_MASK: u32 = 0xFF;

/// First id available to subsystem-specific memory types.
pub const SUBSYSTEM_MEMORY_BASE: u32 = 0x100;

/// Identifier of a core memory region exposed through memory queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryType(u32);

impl MemoryType {
    /// Battery-backed cartridge RAM, persisted by the frontend.
    pub const SAVE_RAM: Self = Self(0);
    /// Real-time clock state, persisted by the frontend.
    pub const RTC: Self = Self(1);
    /// Main system RAM.
    pub const SYSTEM_RAM: Self = Self(2);
    /// Video RAM.
    pub const VIDEO_RAM: Self = Self(3);

    /// Wraps a raw memory id.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw memory id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the standard memory type this id reduces to.
    #[must_use]
    pub const fn standard(self) -> Self {
        Self(self.0 & MEMORY_MASK)
    }

    /// Returns `true` for ids reserved for subsystem memory.
    #[must_use]
    pub const fn is_subsystem(self) -> bool {
        self.0 >= SUBSYSTEM_MEMORY_BASE
    }

    /// Returns `true` for regions the frontend persists across runs.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        matches!(self.0, 0 | 1)
    }
}
