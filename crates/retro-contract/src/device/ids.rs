//! Stable input identifiers per device class.
//!
//! Values are part of the wire contract and never change.

/// Joypad id requesting every button at once as a bitmask.
///
/// Only valid after the frontend accepted `GET_INPUT_BITMASKS`.
pub const JOYPAD_MASK: u32 = 256;

/// Digital joypad buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum JoypadButton {
    /// Bottom face button (Nintendo layout).
    B = 0,
    /// Left face button.
    Y = 1,
    /// Select.
    Select = 2,
    /// Start.
    Start = 3,
    /// D-pad up.
    Up = 4,
    /// D-pad down.
    Down = 5,
    /// D-pad left.
    Left = 6,
    /// D-pad right.
    Right = 7,
    /// Right face button.
    A = 8,
    /// Top face button.
    X = 9,
    /// Left shoulder.
    L = 10,
    /// Right shoulder.
    R = 11,
    /// Left trigger.
    L2 = 12,
    /// Right trigger.
    R2 = 13,
    /// Left stick click.
    L3 = 14,
    /// Right stick click.
    R3 = 15,
}

impl JoypadButton {
    /// Every button in id order.
    pub const ALL: [Self; 16] = [
        Self::B,
        Self::Y,
        Self::Select,
        Self::Start,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::A,
        Self::X,
        Self::L,
        Self::R,
        Self::L2,
        Self::R2,
        Self::L3,
        Self::R3,
    ];

    /// Returns the wire id.
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Converts a wire id back into a button.
    #[must_use]
    pub const fn from_id(id: u32) -> Option<Self> {
        if id < 16 {
            Some(Self::ALL[id as usize])
        } else {
            None
        }
    }

    /// Bit this button occupies in a [`JOYPAD_MASK`] answer.
    #[must_use]
    pub const fn mask_bit(self) -> JoypadButtons {
        JoypadButtons::from_bits_retain(1 << (self as u32))
    }
}

bitflags::bitflags! {
    /// Joypad button state in the layout returned for [`JOYPAD_MASK`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct JoypadButtons: u16 {
        /// B pressed.
        const B = 1 << 0;
        /// Y pressed.
        const Y = 1 << 1;
        /// Select pressed.
        const SELECT = 1 << 2;
        /// Start pressed.
        const START = 1 << 3;
        /// D-pad up pressed.
        const UP = 1 << 4;
        /// D-pad down pressed.
        const DOWN = 1 << 5;
        /// D-pad left pressed.
        const LEFT = 1 << 6;
        /// D-pad right pressed.
        const RIGHT = 1 << 7;
        /// A pressed.
        const A = 1 << 8;
        /// X pressed.
        const X = 1 << 9;
        /// L pressed.
        const L = 1 << 10;
        /// R pressed.
        const R = 1 << 11;
        /// L2 pressed.
        const L2 = 1 << 12;
        /// R2 pressed.
        const R2 = 1 << 13;
        /// L3 pressed.
        const L3 = 1 << 14;
        /// R3 pressed.
        const R3 = 1 << 15;
    }
}

impl JoypadButtons {
    /// Returns `true` when `button` is held.
    #[must_use]
    pub const fn pressed(self, button: JoypadButton) -> bool {
        self.contains(button.mask_bit())
    }
}

/// Analog stick or button group selected by the `index` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum AnalogIndex {
    /// Left stick.
    Left = 0,
    /// Right stick.
    Right = 1,
    /// Analog buttons; `id` is then a [`JoypadButton`] id.
    Button = 2,
}

/// Analog stick axis selected by the `id` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum AnalogAxis {
    /// Horizontal axis, negative is left.
    X = 0,
    /// Vertical axis, negative is up.
    Y = 1,
}

/// Mouse axes and buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum MouseId {
    /// Relative X motion since last poll.
    X = 0,
    /// Relative Y motion since last poll.
    Y = 1,
    /// Left button.
    Left = 2,
    /// Right button.
    Right = 3,
    /// Wheel scrolled up.
    WheelUp = 4,
    /// Wheel scrolled down.
    WheelDown = 5,
    /// Middle button.
    Middle = 6,
    /// Horizontal wheel up.
    HorizWheelUp = 7,
    /// Horizontal wheel down.
    HorizWheelDown = 8,
    /// Fourth button.
    Button4 = 9,
    /// Fifth button.
    Button5 = 10,
}

/// Pointer (touch) ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum PointerId {
    /// X coordinate scaled to `[-0x7fff, 0x7fff]`.
    X = 0,
    /// Y coordinate scaled to `[-0x7fff, 0x7fff]`.
    Y = 1,
    /// Surface touched.
    Pressed = 2,
    /// Number of active touches.
    Count = 3,
}

/// Current light gun ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum LightgunId {
    /// Trigger.
    Trigger = 2,
    /// Auxiliary button A.
    AuxA = 3,
    /// Auxiliary button B.
    AuxB = 4,
    /// Start.
    Start = 6,
    /// Select.
    Select = 7,
    /// Auxiliary button C.
    AuxC = 8,
    /// D-pad up.
    DpadUp = 9,
    /// D-pad down.
    DpadDown = 10,
    /// D-pad left.
    DpadLeft = 11,
    /// D-pad right.
    DpadRight = 12,
    /// Absolute screen X.
    ScreenX = 13,
    /// Absolute screen Y.
    ScreenY = 14,
    /// Aim is outside the screen.
    IsOffscreen = 15,
    /// Forced off-screen shot.
    Reload = 16,
}

impl LightgunId {
    /// Converts a wire id into a current light gun id.
    #[must_use]
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            2 => Some(Self::Trigger),
            3 => Some(Self::AuxA),
            4 => Some(Self::AuxB),
            6 => Some(Self::Start),
            7 => Some(Self::Select),
            8 => Some(Self::AuxC),
            9 => Some(Self::DpadUp),
            10 => Some(Self::DpadDown),
            11 => Some(Self::DpadLeft),
            12 => Some(Self::DpadRight),
            13 => Some(Self::ScreenX),
            14 => Some(Self::ScreenY),
            15 => Some(Self::IsOffscreen),
            16 => Some(Self::Reload),
            _ => None,
        }
    }
}

/// Deprecated light gun ids still accepted on the wire.
///
/// `Cursor` and `Turbo` share their values with [`LightgunId::AuxA`] and
/// [`LightgunId::AuxB`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum LegacyLightgunId {
    /// Relative X motion.
    X = 0,
    /// Relative Y motion.
    Y = 1,
    /// Cursor button.
    Cursor = 3,
    /// Turbo button.
    Turbo = 4,
    /// Pause button.
    Pause = 5,
}

impl LegacyLightgunId {
    /// Converts a wire id into a deprecated light gun id.
    #[must_use]
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::X),
            1 => Some(Self::Y),
            3 => Some(Self::Cursor),
            4 => Some(Self::Turbo),
            5 => Some(Self::Pause),
            _ => None,
        }
    }
}

/// One reading of a raw light gun id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightgunMeaning {
    /// Id from the current table.
    Current(LightgunId),
    /// Id from the deprecated table.
    Legacy(LegacyLightgunId),
}

impl LightgunMeaning {
    /// Lists every meaning `id` has, current table first.
    ///
    /// Two entries come back for the aliased ids (3 and 4).
    #[must_use]
    pub fn of(id: u32) -> Vec<Self> {
        LightgunId::from_id(id)
            .map(Self::Current)
            .into_iter()
            .chain(LegacyLightgunId::from_id(id).map(Self::Legacy))
            .collect()
    }

    /// Returns `true` when `id` names a button in both tables.
    #[must_use]
    pub const fn is_ambiguous(id: u32) -> bool {
        LightgunId::from_id(id).is_some() && LegacyLightgunId::from_id(id).is_some()
    }
}
