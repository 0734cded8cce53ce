//! Validated memory maps and emulated-address resolution.

use thiserror::Error;

use super::{AddressSpaceName, MemoryDescriptor, MemoryType};

/// Reasons a descriptor list is refused as a memory map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum MemoryMapError {
    /// Name too long or outside `[A-Za-z0-9_-]`.
    #[error("address space name {name:?} is not 0-8 characters of [A-Za-z0-9_-]")]
    InvalidAddressSpaceName {
        /// Offending name.
        name: String,
    },
    /// One name is another plus trailing hex digits.
    #[error("address space {name:?} is {base:?} followed by hex digits")]
    AmbiguousAddressSpaces {
        /// Longer name.
        name: String,
        /// Name it extends.
        base: String,
    },
    /// `start` has bits that `select` does not cover.
    #[error("descriptor {index}: start {start:#x} has bits outside select {select:#x}")]
    StartOutsideSelect {
        /// Descriptor position.
        index: usize,
        /// Declared start.
        start: u64,
        /// Select mask used for matching.
        select: u64,
    },
    /// `select == 0` requires a power-of-two `len`.
    #[error("descriptor {index}: zero select needs a power-of-two length, got {len:#x}")]
    LengthNotPowerOfTwo {
        /// Descriptor position.
        index: usize,
        /// Declared length.
        len: u64,
    },
    /// Unbacked descriptors may not carry flags.
    #[error("descriptor {index}: unbacked descriptor sets flags")]
    FlagsOnUnbacked {
        /// Descriptor position.
        index: usize,
    },
}

/// Result of translating an emulated address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedAddress {
    /// Index of the descriptor that claimed the address.
    pub descriptor: usize,
    /// Backing region, `None` for unbacked ranges.
    pub backing: Option<MemoryType>,
    /// Byte offset inside the backing region.
    pub offset: u64,
}

/// Memory descriptors in announcement order, validated as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryMap {
    descriptors: Vec<MemoryDescriptor>,
}

impl MemoryMap {
    /// Validates a descriptor list.
    ///
    /// # Errors
    ///
    /// Returns the first [`MemoryMapError`] found, checking descriptors in
    /// order and then address-space name ambiguity.
    pub fn new(descriptors: Vec<MemoryDescriptor>) -> Result<Self, MemoryMapError> {
        for (index, descriptor) in descriptors.iter().enumerate() {
            validate_descriptor(index, descriptor)?;
        }
        check_name_ambiguity(&descriptors)?;
        Ok(Self { descriptors })
    }

    /// Descriptors in priority order.
    #[must_use]
    pub fn descriptors(&self) -> &[MemoryDescriptor] {
        &self.descriptors
    }

    /// Returns `true` when no descriptors were announced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Translates `addr` in address space `space`.
    ///
    /// The first descriptor claiming the address wins. Translation
    /// subtracts `start`, removes `disconnect` bits, clears the highest set
    /// bit while the result is not below `len`, and adds `offset`.
    ///
    /// The `len` step clears bits highest first, so non-power-of-two
    /// lengths mirror unevenly: with `len = 0x1800`, `0x1C00` lands on
    /// `0x0C00`.
    #[must_use]
    pub fn resolve(&self, space: &str, addr: u64) -> Option<ResolvedAddress> {
        self.descriptors
            .iter()
            .enumerate()
            .filter(|(_, descriptor)| descriptor.addrspace.as_str() == space)
            .find(|(_, descriptor)| descriptor.claims(addr))
            .map(|(index, descriptor)| ResolvedAddress {
                descriptor: index,
                backing: descriptor.backing,
                offset: translate(descriptor, addr),
            })
    }

    /// Size of address space `space`, inferred from the highest bits any of
    /// its descriptors can select.
    ///
    /// Returns `None` when the space has no descriptors or spans the full
    /// 64-bit range.
    #[must_use]
    pub fn address_space_size(&self, space: &str) -> Option<u64> {
        let mut seen = false;
        let mut top = 0_u64;
        for descriptor in self
            .descriptors
            .iter()
            .filter(|descriptor| descriptor.addrspace.as_str() == space)
        {
            seen = true;
            top |= if descriptor.select != 0 {
                descriptor.select
            } else {
                descriptor
                    .start
                    .wrapping_add(descriptor.len)
                    .wrapping_sub(1)
            };
        }
        if !seen {
            return None;
        }
        fill_bits_down(top).checked_add(1)
    }

    /// Distinct address-space names, in first-use order.
    #[must_use]
    pub fn address_spaces(&self) -> Vec<&AddressSpaceName> {
        let mut spaces: Vec<&AddressSpaceName> = Vec::new();
        for descriptor in &self.descriptors {
            if !spaces.contains(&&descriptor.addrspace) {
                spaces.push(&descriptor.addrspace);
            }
        }
        spaces
    }
}

fn validate_descriptor(index: usize, descriptor: &MemoryDescriptor) -> Result<(), MemoryMapError> {
    if descriptor.select == 0 && !descriptor.len.is_power_of_two() {
        return Err(MemoryMapError::LengthNotPowerOfTwo {
            index,
            len: descriptor.len,
        });
    }
    let select = descriptor.effective_select();
    if descriptor.start & !select != 0 {
        return Err(MemoryMapError::StartOutsideSelect {
            index,
            start: descriptor.start,
            select,
        });
    }
    if descriptor.backing.is_none() && !descriptor.flags.is_empty() {
        return Err(MemoryMapError::FlagsOnUnbacked { index });
    }
    Ok(())
}

fn check_name_ambiguity(descriptors: &[MemoryDescriptor]) -> Result<(), MemoryMapError> {
    for name in descriptors.iter().map(|descriptor| &descriptor.addrspace) {
        for base in descriptors.iter().map(|descriptor| &descriptor.addrspace) {
            if name.extends_with_hex(base) {
                return Err(MemoryMapError::AmbiguousAddressSpaces {
                    name: name.to_string(),
                    base: base.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn translate(descriptor: &MemoryDescriptor, addr: u64) -> u64 {
    let mut local = remove_bits(addr.wrapping_sub(descriptor.start), descriptor.disconnect);
    if descriptor.len != 0 {
        while local >= descriptor.len {
            local &= !highest_bit(local);
        }
    }
    local.wrapping_add(descriptor.offset)
}

/// Deletes the bits set in `mask` from `addr`, shifting higher bits down.
const fn remove_bits(mut addr: u64, mut mask: u64) -> u64 {
    while mask != 0 {
        let below = (mask - 1) & !mask;
        addr = (addr & below) | ((addr >> 1) & !below);
        mask = (mask & (mask - 1)) >> 1;
    }
    addr
}

const fn highest_bit(value: u64) -> u64 {
    if value == 0 {
        0
    } else {
        1 << (63 - value.leading_zeros())
    }
}

const fn fill_bits_down(value: u64) -> u64 {
    if value == 0 {
        0
    } else {
        u64::MAX >> value.leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::{fill_bits_down, highest_bit, remove_bits, MemoryMap, MemoryMapError};
    use crate::memory::{AddressSpaceName, MemoryDescriptor, MemoryDescriptorFlags, MemoryType};

    #[test]
    fn remove_bits_collapses_disconnected_lines() {
        assert_eq!(remove_bits(0b1011, 0b0100), 0b111);
        assert_eq!(remove_bits(0x80_1234, !0x1FFF), 0x1234);
        assert_eq!(remove_bits(0xFFFF, 0), 0xFFFF);
    }

    #[test]
    fn bit_helpers_handle_zero() {
        assert_eq!(highest_bit(0), 0);
        assert_eq!(highest_bit(0x1C00), 0x1000);
        assert_eq!(fill_bits_down(0), 0);
        assert_eq!(fill_bits_down(0xC0_E000), 0xFF_FFFF);
    }

    #[test]
    fn zero_select_requires_power_of_two_length() {
        let mut odd = MemoryDescriptor::linear(MemoryType::SYSTEM_RAM, 0, 0x1800);
        assert_eq!(
            MemoryMap::new(vec![odd.clone()]),
            Err(MemoryMapError::LengthNotPowerOfTwo { index: 0, len: 0x1800 })
        );
        odd.select = 0xFFFF_E000;
        assert!(MemoryMap::new(vec![odd]).is_ok());
    }

    #[test]
    fn start_must_be_covered_by_select() {
        let mut descriptor = MemoryDescriptor::linear(MemoryType::SAVE_RAM, 0x6000, 0x2000);
        descriptor.select = 0xE000;
        assert!(MemoryMap::new(vec![descriptor.clone()]).is_ok());

        descriptor.select = 0xC000;
        assert_eq!(
            MemoryMap::new(vec![descriptor]),
            Err(MemoryMapError::StartOutsideSelect {
                index: 0,
                start: 0x6000,
                select: 0xC000,
            })
        );

        let misaligned = MemoryDescriptor::linear(MemoryType::SAVE_RAM, 0x1000, 0x2000);
        assert!(matches!(
            MemoryMap::new(vec![misaligned]),
            Err(MemoryMapError::StartOutsideSelect { .. })
        ));
    }

    #[test]
    fn unbacked_descriptors_reject_flags() {
        let mut sentinel = MemoryDescriptor::size_sentinel(0xFF_FFFF, AddressSpaceName::default());
        sentinel.flags = MemoryDescriptorFlags::CONST;
        assert_eq!(
            MemoryMap::new(vec![sentinel]),
            Err(MemoryMapError::FlagsOnUnbacked { index: 0 })
        );
    }

    #[test]
    fn blank_and_hex_name_are_ambiguous() {
        let blank = MemoryDescriptor::linear(MemoryType::SYSTEM_RAM, 0, 0x100);
        let mut b_space = blank.clone();
        b_space.addrspace = AddressSpaceName::new("B").expect("valid name");
        assert_eq!(
            MemoryMap::new(vec![blank.clone(), b_space]),
            Err(MemoryMapError::AmbiguousAddressSpaces {
                name: "B".to_owned(),
                base: String::new(),
            })
        );

        let mut s_space = blank.clone();
        s_space.addrspace = AddressSpaceName::new("S").expect("valid name");
        assert!(MemoryMap::new(vec![blank, s_space]).is_ok());
    }

    #[test]
    fn non_power_of_two_len_clears_highest_bits_first() {
        let mut descriptor = MemoryDescriptor::linear(MemoryType::SYSTEM_RAM, 0, 0x1800);
        descriptor.select = 0xFFFF_C000;
        let map = MemoryMap::new(vec![descriptor]).expect("valid map");

        let offset = |addr| map.resolve("", addr).map(|resolved| resolved.offset);
        assert_eq!(offset(0x17FF), Some(0x17FF));
        assert_eq!(offset(0x1C00), Some(0x0C00));
        assert_eq!(offset(0x2000), Some(0x0000));
        assert_eq!(offset(0x3FFF), Some(0x0FFF));
        assert_eq!(offset(0x4000), None);
    }

    #[test]
    fn address_space_size_uses_sentinel_select() {
        let wram = MemoryDescriptor::linear(MemoryType::SYSTEM_RAM, 0x7E_0000, 0x2_0000);
        let sentinel = MemoryDescriptor::size_sentinel(0xFF_FFFF, AddressSpaceName::default());
        let map = MemoryMap::new(vec![wram.clone(), sentinel]).expect("valid map");
        assert_eq!(map.address_space_size(""), Some(0x100_0000));
        assert_eq!(map.address_space_size("S"), None);

        let bare = MemoryMap::new(vec![wram]).expect("valid map");
        assert_eq!(bare.address_space_size(""), Some(0x80_0000));
    }
}
