//! Keyboard keycodes and modifiers.

macro_rules! keycodes {
    ($($(#[$doc:meta])* $name:ident = $value:literal,)+) => {
        /// Keyboard keycode, polled through the keyboard device or delivered
        /// by keyboard events.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
        #[repr(u32)]
        pub enum Key {
            $($(#[$doc])* $name = $value,)+
        }

        impl Key {
            /// Every defined keycode in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$name,)+];

            /// Converts a raw keycode into a key.
            #[must_use]
            pub const fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($value => Some(Self::$name),)+
                    _ => None,
                }
            }
        }
    };
}

keycodes! {
    /// Unmapped key.
    Unknown = 0,
    /// Backspace.
    Backspace = 8,
    /// Tab.
    Tab = 9,
    /// Clear.
    Clear = 12,
    /// Return.
    Return = 13,
    /// Pause.
    Pause = 19,
    /// Escape.
    Escape = 27,
    /// Space.
    Space = 32,
    /// `!`
    Exclaim = 33,
    /// `"`
    QuoteDbl = 34,
    /// `#`
    Hash = 35,
    /// `$`
    Dollar = 36,
    /// `&`
    Ampersand = 38,
    /// `'`
    Quote = 39,
    /// `(`
    LeftParen = 40,
    /// `)`
    RightParen = 41,
    /// `*`
    Asterisk = 42,
    /// `+`
    Plus = 43,
    /// `,`
    Comma = 44,
    /// `-`
    Minus = 45,
    /// `.`
    Period = 46,
    /// `/`
    Slash = 47,
    /// `0`
    Num0 = 48,
    /// `1`
    Num1 = 49,
    /// `2`
    Num2 = 50,
    /// `3`
    Num3 = 51,
    /// `4`
    Num4 = 52,
    /// `5`
    Num5 = 53,
    /// `6`
    Num6 = 54,
    /// `7`
    Num7 = 55,
    /// `8`
    Num8 = 56,
    /// `9`
    Num9 = 57,
    /// `:`
    Colon = 58,
    /// `;`
    Semicolon = 59,
    /// `<`
    Less = 60,
    /// `=`
    Equals = 61,
    /// `>`
    Greater = 62,
    /// `?`
    Question = 63,
    /// `@`
    At = 64,
    /// `[`
    LeftBracket = 91,
    /// `\`
    Backslash = 92,
    /// `]`
    RightBracket = 93,
    /// `^`
    Caret = 94,
    /// `_`
    Underscore = 95,
    /// `` ` ``
    Backquote = 96,
    /// `a`
    A = 97,
    /// `b`
    B = 98,
    /// `c`
    C = 99,
    /// `d`
    D = 100,
    /// `e`
    E = 101,
    /// `f`
    F = 102,
    /// `g`
    G = 103,
    /// `h`
    H = 104,
    /// `i`
    I = 105,
    /// `j`
    J = 106,
    /// `k`
    K = 107,
    /// `l`
    L = 108,
    /// `m`
    M = 109,
    /// `n`
    N = 110,
    /// `o`
    O = 111,
    /// `p`
    P = 112,
    /// `q`
    Q = 113,
    /// `r`
    R = 114,
    /// `s`
    S = 115,
    /// `t`
    T = 116,
    /// `u`
    U = 117,
    /// `v`
    V = 118,
    /// `w`
    W = 119,
    /// `x`
    X = 120,
    /// `y`
    Y = 121,
    /// `z`
    Z = 122,
    /// `{`
    LeftBrace = 123,
    /// `|`
    Bar = 124,
    /// `}`
    RightBrace = 125,
    /// `~`
    Tilde = 126,
    /// Delete.
    Delete = 127,
    /// Keypad 0.
    Kp0 = 256,
    /// Keypad 1.
    Kp1 = 257,
    /// Keypad 2.
    Kp2 = 258,
    /// Keypad 3.
    Kp3 = 259,
    /// Keypad 4.
    Kp4 = 260,
    /// Keypad 5.
    Kp5 = 261,
    /// Keypad 6.
    Kp6 = 262,
    /// Keypad 7.
    Kp7 = 263,
    /// Keypad 8.
    Kp8 = 264,
    /// Keypad 9.
    Kp9 = 265,
    /// Keypad `.`
    KpPeriod = 266,
    /// Keypad `/`
    KpDivide = 267,
    /// Keypad `*`
    KpMultiply = 268,
    /// Keypad `-`
    KpMinus = 269,
    /// Keypad `+`
    KpPlus = 270,
    /// Keypad enter.
    KpEnter = 271,
    /// Keypad `=`
    KpEquals = 272,
    /// Arrow up.
    Up = 273,
    /// Arrow down.
    Down = 274,
    /// Arrow right.
    Right = 275,
    /// Arrow left.
    Left = 276,
    /// Insert.
    Insert = 277,
    /// Home.
    Home = 278,
    /// End.
    End = 279,
    /// Page up.
    PageUp = 280,
    /// Page down.
    PageDown = 281,
    /// F1.
    F1 = 282,
    /// F2.
    F2 = 283,
    /// F3.
    F3 = 284,
    /// F4.
    F4 = 285,
    /// F5.
    F5 = 286,
    /// F6.
    F6 = 287,
    /// F7.
    F7 = 288,
    /// F8.
    F8 = 289,
    /// F9.
    F9 = 290,
    /// F10.
    F10 = 291,
    /// F11.
    F11 = 292,
    /// F12.
    F12 = 293,
    /// F13.
    F13 = 294,
    /// F14.
    F14 = 295,
    /// F15.
    F15 = 296,
    /// Num lock.
    NumLock = 300,
    /// Caps lock.
    CapsLock = 301,
    /// Scroll lock.
    ScrollLock = 302,
    /// Right shift.
    RShift = 303,
    /// Left shift.
    LShift = 304,
    /// Right control.
    RCtrl = 305,
    /// Left control.
    LCtrl = 306,
    /// Right alt.
    RAlt = 307,
    /// Left alt.
    LAlt = 308,
    /// Right meta.
    RMeta = 309,
    /// Left meta.
    LMeta = 310,
    /// Left super.
    LSuper = 311,
    /// Right super.
    RSuper = 312,
    /// Mode switch.
    Mode = 313,
    /// Compose.
    Compose = 314,
    /// Help.
    Help = 315,
    /// Print screen.
    Print = 316,
    /// System request.
    SysReq = 317,
    /// Break.
    Break = 318,
    /// Menu.
    Menu = 319,
    /// Power.
    Power = 320,
    /// Euro.
    Euro = 321,
    /// Undo.
    Undo = 322,
    /// Extra key on 102-key layouts.
    Oem102 = 323,
}

impl Key {
    /// Returns the raw keycode.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

bitflags::bitflags! {
    /// Modifier and lock state delivered with keyboard events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct KeyModifiers: u16 {
        /// Shift held.
        const SHIFT = 0x01;
        /// Control held.
        const CTRL = 0x02;
        /// Alt held.
        const ALT = 0x04;
        /// Meta held.
        const META = 0x08;
        /// Num lock active.
        const NUMLOCK = 0x10;
        /// Caps lock active.
        const CAPSLOCK = 0x20;
        /// Scroll lock active.
        const SCROLLOCK = 0x40;
    }
}

/// Keyboard event routed to a core that registered for keyboard input.
///
/// `keycode` stays raw because frontends may report codes outside the
/// defined table; [`KeyboardEvent::key`] decodes it when possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct KeyboardEvent {
    /// Key went down (`true`) or up.
    pub down: bool,
    /// Raw keycode, [`Key::Unknown`] when only `character` is meaningful.
    pub keycode: u32,
    /// UTF-32 character produced, or 0.
    pub character: u32,
    /// Modifier state at the time of the event.
    pub modifiers: KeyModifiers,
}

impl KeyboardEvent {
    /// Decodes the keycode.
    #[must_use]
    pub const fn key(&self) -> Option<Key> {
        Key::from_code(self.keycode)
    }

    /// Returns the produced character, if any.
    #[must_use]
    pub fn character(&self) -> Option<char> {
        match self.character {
            0 => None,
            code => char::from_u32(code),
        }
    }
}
