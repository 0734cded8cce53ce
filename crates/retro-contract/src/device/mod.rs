//! Input device classes, subclass packing and per-class input identifiers.

/// Button, axis and pointer identifiers for each base device class.
pub mod ids;
/// Keyboard keycodes and modifier bits.
pub mod keyboard;

pub use ids::{
    AnalogAxis, AnalogIndex, JoypadButton, JoypadButtons, LegacyLightgunId, LightgunId,
    LightgunMeaning, MouseId, PointerId, JOYPAD_MASK,
};
pub use keyboard::{Key, KeyModifiers, KeyboardEvent};

/// Bit shift separating the subclass id from the base class in a device type.
pub const DEVICE_TYPE_SHIFT: u32 = 8;
/// Mask selecting the base class of a device type.
pub const DEVICE_MASK: u32 = (1 << DEVICE_TYPE_SHIFT) - 1;

/// Generic device abstraction a core polls input through.
///
/// The low eight bits carry the base class. Subclasses built with
/// [`DeviceType::subclass`] keep the base class in those bits and store
/// `id + 1` above them; the frontend only ever sees the base class when
/// answering input queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DeviceType(u32);

impl DeviceType {
    /// No input device.
    pub const NONE: Self = Self(0);
    /// Retro joypad with a D-pad, four face buttons, shoulders and sticks.
    pub const JOYPAD: Self = Self(1);
    /// Relative mouse with up to five buttons and two wheels.
    pub const MOUSE: Self = Self(2);
    /// Raw keyboard polled by [`Key`] code.
    pub const KEYBOARD: Self = Self(3);
    /// Screen-space light gun.
    pub const LIGHTGUN: Self = Self(4);
    /// Joypad extension with two analog sticks and analog buttons.
    pub const ANALOG: Self = Self(5);
    /// Absolute pointer or touch surface.
    pub const POINTER: Self = Self(6);

    /// Every base class, in numeric order.
    pub const BASE_CLASSES: [Self; 7] = [
        Self::NONE,
        Self::JOYPAD,
        Self::MOUSE,
        Self::KEYBOARD,
        Self::LIGHTGUN,
        Self::ANALOG,
        Self::POINTER,
    ];

    /// Wraps a raw device type value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Packs a core-specific subclass of `base`.
    ///
    /// `base` is reduced to its base class first, so subclassing a subclass
    /// derives from the same base. Ids that do not fit the remaining bits
    /// wrap, matching the packing arithmetic on the wire.
    #[must_use]
    pub const fn subclass(base: Self, id: u32) -> Self {
        Self((id.wrapping_add(1) << DEVICE_TYPE_SHIFT) | (base.0 & DEVICE_MASK))
    }

    /// Returns the base class this device reduces to.
    #[must_use]
    pub const fn base(self) -> Self {
        Self(self.0 & DEVICE_MASK)
    }

    /// Returns the subclass id, or `None` for a plain base class.
    #[must_use]
    pub const fn subclass_id(self) -> Option<u32> {
        match self.0 >> DEVICE_TYPE_SHIFT {
            0 => None,
            packed => Some(packed - 1),
        }
    }

    /// Returns `true` when the base class is one of the defined classes.
    #[must_use]
    pub const fn is_known_base(self) -> bool {
        self.base().0 <= Self::POINTER.0
    }

    /// Short name of the base class, used in logs and reports.
    #[must_use]
    pub const fn base_name(self) -> &'static str {
        match self.base().0 {
            0 => "none",
            1 => "joypad",
            2 => "mouse",
            3 => "keyboard",
            4 => "lightgun",
            5 => "analog",
            6 => "pointer",
            _ => "unknown",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.subclass_id() {
            Some(id) => write!(f, "{}#{id}", self.base_name()),
            None => f.write_str(self.base_name()),
        }
    }
}

bitflags::bitflags! {
    /// Set of base device classes a frontend can answer queries for.
    ///
    /// Bit `n` is set when base class `n` is supported.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct DeviceCapabilities: u64 {
        /// Joypad queries are answered.
        const JOYPAD = 1 << 1;
        /// Mouse queries are answered.
        const MOUSE = 1 << 2;
        /// Keyboard queries are answered.
        const KEYBOARD = 1 << 3;
        /// Light gun queries are answered.
        const LIGHTGUN = 1 << 4;
        /// Analog queries are answered.
        const ANALOG = 1 << 5;
        /// Pointer queries are answered.
        const POINTER = 1 << 6;
    }
}

impl DeviceCapabilities {
    /// Returns `true` when the base class of `device` is supported.
    #[must_use]
    pub const fn supports(self, device: DeviceType) -> bool {
        let base = device.base().raw();
        base < 64 && self.bits() & (1 << base) != 0
    }
}
