//! Plain data carried by environment commands.

use std::fmt;

use crate::device::DeviceType;
use crate::memory::MemoryType;

/// On-screen message (`SET_MESSAGE`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Message {
    /// Text to show.
    pub msg: String,
    /// How many frames to show it for.
    pub frames: u32,
}

/// Severity shared by the log interface and extended messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum LogLevel {
    /// Developer detail.
    Debug = 0,
    /// Normal operation.
    #[default]
    Info = 1,
    /// Recoverable problem.
    Warn = 2,
    /// Failure.
    Error = 3,
}

impl LogLevel {
    /// Converts a wire value.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Debug),
            1 => Some(Self::Info),
            2 => Some(Self::Warn),
            3 => Some(Self::Error),
            _ => None,
        }
    }

    /// Matching level of the `log` facade.
    #[must_use]
    pub const fn to_log(self) -> log::Level {
        match self {
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warn => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

/// Where an extended message should appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum MessageTarget {
    /// On screen and in the log.
    #[default]
    All = 0,
    /// On screen only.
    Osd = 1,
    /// Log only.
    Log = 2,
}

impl MessageTarget {
    /// Returns `true` when the message belongs in the log.
    #[must_use]
    pub const fn logs(self) -> bool {
        matches!(self, Self::All | Self::Log)
    }

    /// Returns `true` when the message belongs on screen.
    #[must_use]
    pub const fn displays(self) -> bool {
        matches!(self, Self::All | Self::Osd)
    }
}

/// Presentation style of an extended message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum MessageType {
    /// Standard notification.
    #[default]
    Notification = 0,
    /// Notification the frontend may style differently.
    NotificationAlt = 1,
    /// Persistent status line.
    Status = 2,
    /// Progress report.
    Progress = 3,
}

/// Extended message (`SET_MESSAGE_EXT`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MessageExt {
    /// Text to show.
    pub msg: String,
    /// Display time in milliseconds.
    pub duration_ms: u32,
    /// Higher values replace lower-priority messages.
    pub priority: u32,
    /// Severity when logged.
    pub level: LogLevel,
    /// Output target.
    pub target: MessageTarget,
    /// Presentation style.
    pub kind: MessageType,
    /// Progress in percent; `None` is indeterminate.
    pub progress: Option<u8>,
}

impl MessageExt {
    /// Plain notification shown for `duration_ms`.
    #[must_use]
    pub fn notification(msg: impl Into<String>, duration_ms: u32) -> Self {
        Self {
            msg: msg.into(),
            duration_ms,
            priority: 1,
            level: LogLevel::Info,
            target: MessageTarget::All,
            kind: MessageType::Notification,
            progress: None,
        }
    }

    /// Equivalent basic message for frontends without extended support.
    ///
    /// The duration converts at 60 frames per second.
    #[must_use]
    pub fn to_basic(&self) -> Message {
        Message {
            msg: self.msg.clone(),
            frames: self.duration_ms.saturating_mul(60) / 1000,
        }
    }
}

/// Binding description for one input (`SET_INPUT_DESCRIPTORS`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InputDescriptor {
    /// Port number.
    pub port: u32,
    /// Device class or subclass.
    pub device: DeviceType,
    /// Index, used by analog sticks.
    pub index: u32,
    /// Button or axis id.
    pub id: u32,
    /// Human-readable function.
    pub description: String,
}

/// One controller type a port accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ControllerDescription {
    /// Display name.
    pub desc: String,
    /// Device class or subclass to pass to `set_controller_port_device`.
    pub id: DeviceType,
}

/// Controller types accepted by one port (`SET_CONTROLLER_INFO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ControllerInfo {
    /// Accepted types.
    pub types: Vec<ControllerDescription>,
}

/// Memory type attached to one subsystem content entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SubsystemMemoryInfo {
    /// Save file extension.
    pub extension: String,
    /// Memory type; expected at or above [`crate::SUBSYSTEM_MEMORY_BASE`].
    pub memory_type: MemoryType,
}

/// One content entry of a subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SubsystemRomInfo {
    /// Display name, e.g. "Game Boy ROM".
    pub desc: String,
    /// `|`-separated extensions.
    pub valid_extensions: String,
    /// Content must be passed by path.
    pub need_fullpath: bool,
    /// Content must not be extracted from archives.
    pub block_extract: bool,
    /// Entry must be supplied.
    pub required: bool,
    /// Memory regions backed by save files.
    pub memory: Vec<SubsystemMemoryInfo>,
}

/// Special content type (`SET_SUBSYSTEM_INFO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SubsystemInfo {
    /// Display name.
    pub desc: String,
    /// Command-line identifier, lowercase ASCII letters only.
    pub ident: String,
    /// Content entries in load order.
    pub roms: Vec<SubsystemRomInfo>,
    /// Type id passed to `load_game_special`.
    pub id: u32,
}

impl SubsystemInfo {
    /// Returns `true` when `ident` is non-empty lowercase ASCII letters.
    #[must_use]
    pub fn has_valid_ident(&self) -> bool {
        !self.ident.is_empty() && self.ident.bytes().all(|byte| byte.is_ascii_lowercase())
    }

    /// Memory entries typed below the subsystem range.
    pub fn standard_memory(&self) -> impl Iterator<Item = &SubsystemMemoryInfo> {
        self.roms
            .iter()
            .flat_map(|rom| rom.memory.iter())
            .filter(|memory| !memory.memory_type.is_subsystem())
    }
}

/// Option lookup slot (`GET_VARIABLE`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Variable {
    /// Key to look up.
    pub key: String,
    /// Filled with the current value.
    pub value: Option<String>,
}

impl Variable {
    /// Lookup slot for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

/// Core options interface version (`GET_CORE_OPTIONS_VERSION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CoreOptionsVersion {
    /// Only `SET_VARIABLES`.
    #[default]
    Legacy,
    /// `SET_CORE_OPTIONS` and its translated form.
    V1,
}

impl CoreOptionsVersion {
    /// Converts a wire value; anything newer is treated as version 1.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Self {
        if raw == 0 {
            Self::Legacy
        } else {
            Self::V1
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Legacy => 0,
            Self::V1 => 1,
        }
    }
}

/// Message interface version (`GET_MESSAGE_INTERFACE_VERSION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MessageInterfaceVersion {
    /// Only `SET_MESSAGE`.
    #[default]
    V0,
    /// `SET_MESSAGE_EXT` as well.
    V1,
}

impl MessageInterfaceVersion {
    /// Converts a wire value; anything newer is treated as version 1.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Self {
        if raw == 0 {
            Self::V0
        } else {
            Self::V1
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::V0 => 0,
            Self::V1 => 1,
        }
    }
}

macro_rules! languages {
    ($($name:ident = $id:literal, $code:literal;)+) => {
        /// User interface language (`GET_LANGUAGE`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
        #[repr(u32)]
        pub enum Language {
            $(
                #[allow(missing_docs)]
                $name = $id,
            )+
        }

        impl Language {
            /// Converts a wire value.
            #[must_use]
            pub const fn from_u32(raw: u32) -> Option<Self> {
                match raw {
                    $($id => Some(Self::$name),)+
                    _ => None,
                }
            }

            /// Short language tag.
            #[must_use]
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$name => $code,)+
                }
            }
        }
    };
}

languages! {
    English = 0, "en";
    Japanese = 1, "ja";
    French = 2, "fr";
    Spanish = 3, "es";
    German = 4, "de";
    Italian = 5, "it";
    Dutch = 6, "nl";
    PortugueseBrazil = 7, "pt_BR";
    PortuguesePortugal = 8, "pt_PT";
    Russian = 9, "ru";
    Korean = 10, "ko";
    ChineseTraditional = 11, "zh_TW";
    ChineseSimplified = 12, "zh_CN";
    Esperanto = 13, "eo";
    Polish = 14, "pl";
    Vietnamese = 15, "vi";
    Arabic = 16, "ar";
    Greek = 17, "el";
    Turkish = 18, "tr";
    Slovak = 19, "sk";
    Persian = 20, "fa";
    Hebrew = 21, "he";
    Asturian = 22, "ast";
}

impl Default for Language {
    fn default() -> Self {
        Self::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
