//! Memory descriptors announced with `SET_MEMORY_MAPS`.

use super::{MemoryMapError, MemoryType};

/// Longest allowed address-space name.
pub const ADDRESS_SPACE_NAME_MAX: usize = 8;

bitflags::bitflags! {
    /// Properties of the memory behind a descriptor.
    ///
    /// The alignment and minimum-size fields are two-bit values; read them
    /// with [`MemoryDescriptorFlags::alignment`] and
    /// [`MemoryDescriptorFlags::min_access_size`] rather than `contains`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct MemoryDescriptorFlags: u64 {
        /// Never written by the frontend once content has loaded.
        const CONST = 1 << 0;
        /// Big-endian data.
        const BIGENDIAN = 1 << 1;
        /// Main system RAM.
        const SYSTEM_RAM = 1 << 2;
        /// Battery-backed save RAM.
        const SAVE_RAM = 1 << 3;
        /// Video RAM.
        const VIDEO_RAM = 1 << 4;
        /// Accesses aligned to their size or 2.
        const ALIGN_2 = 1 << 16;
        /// Accesses aligned to their size or 4.
        const ALIGN_4 = 2 << 16;
        /// Accesses aligned to their size or 8.
        const ALIGN_8 = 3 << 16;
        /// Accessed at least 2 bytes at a time.
        const MINSIZE_2 = 1 << 24;
        /// Accessed at least 4 bytes at a time.
        const MINSIZE_4 = 2 << 24;
        /// Accessed at least 8 bytes at a time.
        const MINSIZE_8 = 3 << 24;
    }
}

impl MemoryDescriptorFlags {
    /// Access alignment in bytes (1 when unspecified).
    #[must_use]
    pub const fn alignment(self) -> u8 {
        1 << ((self.bits() >> 16) & 0x3)
    }

    /// Minimum access size in bytes (1 when unspecified).
    #[must_use]
    pub const fn min_access_size(self) -> u8 {
        1 << ((self.bits() >> 24) & 0x3)
    }
}

/// Validated address-space name: up to eight of `[A-Za-z0-9_-]`.
///
/// The empty name is the default address space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AddressSpaceName(String);

impl AddressSpaceName {
    /// Validates and wraps a name.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryMapError::InvalidAddressSpaceName`] when the name is
    /// longer than eight bytes or uses characters outside `[A-Za-z0-9_-]`.
    pub fn new(name: &str) -> Result<Self, MemoryMapError> {
        let valid = name.len() <= ADDRESS_SPACE_NAME_MAX
            && name
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-');
        if valid {
            Ok(Self(name.to_owned()))
        } else {
            Err(MemoryMapError::InvalidAddressSpaceName {
                name: name.to_owned(),
            })
        }
    }

    /// The default (empty) address space.
    #[must_use]
    pub const fn default_space() -> Self {
        Self(String::new())
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when this name is `base` followed by one or more
    /// upper-case hex digits, which would make `<name><address>` ambiguous.
    #[must_use]
    pub fn extends_with_hex(&self, base: &Self) -> bool {
        self.0.strip_prefix(base.as_str()).is_some_and(|rest| {
            !rest.is_empty()
                && rest
                    .bytes()
                    .all(|byte| byte.is_ascii_digit() || (b'A'..=b'F').contains(&byte))
        })
    }
}

impl std::fmt::Display for AddressSpaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One mapping from an emulated address range onto core memory.
///
/// `backing` names the core memory region (see [`MemoryType`]) the range
/// lands in and `offset` is added after translation. `None` marks unbacked
/// ranges such as open bus or the address-space size sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryDescriptor {
    /// Memory properties.
    pub flags: MemoryDescriptorFlags,
    /// Backing region, `None` for unbacked ranges.
    pub backing: Option<MemoryType>,
    /// Byte offset into the backing region added after translation.
    pub offset: u64,
    /// First emulated address of the mapping.
    pub start: u64,
    /// Address bits that must equal `start` for the mapping to apply.
    /// Zero maps the range exactly once.
    pub select: u64,
    /// Address bits not wired to the memory chip.
    pub disconnect: u64,
    /// Size of the backing area; zero means unbounded.
    pub len: u64,
    /// Address space the mapping belongs to.
    pub addrspace: AddressSpaceName,
}

impl MemoryDescriptor {
    /// Descriptor for `len` bytes of `backing` mapped once at `start`.
    #[must_use]
    pub const fn linear(backing: MemoryType, start: u64, len: u64) -> Self {
        Self {
            flags: MemoryDescriptorFlags::empty(),
            backing: Some(backing),
            offset: 0,
            start,
            select: 0,
            disconnect: 0,
            len,
            addrspace: AddressSpaceName::default_space(),
        }
    }

    /// Unbacked descriptor declaring the size of an address space.
    #[must_use]
    pub const fn size_sentinel(select: u64, addrspace: AddressSpaceName) -> Self {
        Self {
            flags: MemoryDescriptorFlags::empty(),
            backing: None,
            offset: 0,
            start: 0,
            select,
            disconnect: 0,
            len: 0,
            addrspace,
        }
    }

    /// Select mask used for matching.
    ///
    /// A zero `select` with a power-of-two `len` claims the `len`-aligned
    /// block at `start`: every bit above `len - 1` must match.
    #[must_use]
    pub const fn effective_select(&self) -> u64 {
        if self.select != 0 || self.len == 0 {
            self.select
        } else {
            !(self.len - 1)
        }
    }

    /// Returns `true` when this descriptor claims `addr`.
    #[must_use]
    pub const fn claims(&self, addr: u64) -> bool {
        addr & self.effective_select() == self.start
    }
}
