//! Save-state quirk negotiation and size bookkeeping.

use crate::ContractViolation;

bitflags::bitflags! {
    /// Limitations a core declares about its save states.
    ///
    /// The core announces the bits it needs; the frontend clears the ones
    /// it cannot honour and may add [`SerializationQuirks::FRONT_VARIABLE_SIZE`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct SerializationQuirks: u64 {
        /// States work for typical use but not for netplay or rerecording.
        const INCOMPLETE = 1 << 0;
        /// Serialization fails until the core has run for a while.
        const MUST_INITIALIZE = 1 << 1;
        /// The state size may change within a session.
        const CORE_VARIABLE_SIZE = 1 << 2;
        /// Set by the frontend: variable-size states are supported.
        const FRONT_VARIABLE_SIZE = 1 << 3;
        /// States only load within the session that produced them.
        const SINGLE_SESSION = 1 << 4;
        /// States do not load across byte orders.
        const ENDIAN_DEPENDENT = 1 << 5;
        /// States do not load across platforms.
        const PLATFORM_DEPENDENT = 1 << 6;
    }
}

impl SerializationQuirks {
    /// Frontend side of the negotiation.
    ///
    /// Keeps the requested bits `supported` covers and acknowledges
    /// variable-size support when the frontend has it.
    #[must_use]
    pub const fn negotiate(self, supported: Self) -> Self {
        self.intersection(supported)
            .union(supported.intersection(Self::FRONT_VARIABLE_SIZE))
    }

    /// Returns `true` when the state size may legitimately change.
    #[must_use]
    pub const fn allows_size_change(self) -> bool {
        self.intersects(Self::CORE_VARIABLE_SIZE.union(Self::FRONT_VARIABLE_SIZE))
    }

    /// Returns `true` when a failed load leaves the guarantee intact, because
    /// the core already declared states unreliable.
    #[must_use]
    pub const fn tolerates_failed_load(self) -> bool {
        self.intersects(Self::SINGLE_SESSION.union(Self::INCOMPLETE))
    }
}

/// Tracks save-state sizes and outcomes across one content session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaveStateBudget {
    quirks: SerializationQuirks,
    high_water: Option<usize>,
    serialized_once: bool,
    suspect: bool,
}

impl SaveStateBudget {
    /// Starts a budget for a freshly loaded content session.
    #[must_use]
    pub const fn new(quirks: SerializationQuirks) -> Self {
        Self {
            quirks,
            high_water: None,
            serialized_once: false,
            suspect: false,
        }
    }

    /// Replaces the quirks in effect; size history is kept.
    pub fn renegotiate(&mut self, quirks: SerializationQuirks) {
        self.quirks = quirks;
    }

    /// Negotiated quirks in effect.
    #[must_use]
    pub const fn quirks(&self) -> SerializationQuirks {
        self.quirks
    }

    /// Largest size reported so far.
    #[must_use]
    pub const fn high_water(&self) -> Option<usize> {
        self.high_water
    }

    /// Records a size query.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::SaveStateGrew`] when `size` exceeds an
    /// earlier answer and no variable-size quirk was negotiated. The
    /// high-water mark still moves so the violation is reported once.
    pub fn observe_size(&mut self, size: usize) -> Result<(), ContractViolation> {
        let previous = self.high_water;
        self.high_water = Some(previous.map_or(size, |seen| seen.max(size)));
        match previous {
            Some(previous) if size > previous && !self.quirks.allows_size_change() => {
                Err(ContractViolation::SaveStateGrew {
                    previous,
                    current: size,
                })
            }
            _ => Ok(()),
        }
    }

    /// Records the outcome of a serialize call.
    ///
    /// Returns `true` when a failure is excused by
    /// [`SerializationQuirks::MUST_INITIALIZE`] (no state taken yet).
    pub fn record_serialize(&mut self, succeeded: bool) -> bool {
        if succeeded {
            self.serialized_once = true;
            return false;
        }
        !self.serialized_once && self.quirks.contains(SerializationQuirks::MUST_INITIALIZE)
    }

    /// Records the outcome of an unserialize call.
    pub fn record_unserialize(&mut self, succeeded: bool) {
        if !succeeded && !self.quirks.tolerates_failed_load() {
            self.suspect = true;
        }
    }

    /// Returns `true` after a load failed that the quirks did not excuse.
    #[must_use]
    pub const fn is_suspect(&self) -> bool {
        self.suspect
    }
}
