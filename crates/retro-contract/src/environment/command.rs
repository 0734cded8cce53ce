//! Raw environment command ids, tiers and decoding.

use std::fmt;

use thiserror::Error;

/// Bit marking a command whose interface may still change.
pub const EXPERIMENTAL: u32 = 0x1_0000;
/// Bit reserved for frontend-private commands; never valid on the wire.
pub const PRIVATE: u32 = 0x2_0000;

/// Ids removed from the protocol; never reassigned.
pub const RETIRED_COMMAND_IDS: [u32; 3] = [4, 5, 20];

/// Stability tier of an environment command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CommandTier {
    /// Frozen interface.
    Stable,
    /// Interface may still change; frontends may opt out.
    Experimental,
}

/// Why a raw command id does not name a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CommandDecodeError {
    /// Id carries the private bit.
    #[error("command {raw:#x} is frontend-private")]
    Private {
        /// Raw id.
        raw: u32,
    },
    /// Id belonged to a command that was removed.
    #[error("command {raw} is retired")]
    Retired {
        /// Raw id.
        raw: u32,
    },
    /// Id was never assigned.
    #[error("command {raw:#x} is unknown")]
    Unknown {
        /// Raw id.
        raw: u32,
    },
}

macro_rules! environment_commands {
    ($($(#[$doc:meta])* $name:ident = $id:literal, $tier:ident, $wire:literal;)+) => {
        /// Every environment command, one variant per wire id.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
        pub enum EnvironmentCommand {
            $($(#[$doc])* $name,)+
        }

        impl EnvironmentCommand {
            /// Every command in id order.
            pub const ALL: &'static [Self] = &[$(Self::$name,)+];

            /// Command id without tier bits.
            #[must_use]
            pub const fn id(self) -> u32 {
                match self {
                    $(Self::$name => $id,)+
                }
            }

            /// Tier the command was published under.
            #[must_use]
            pub const fn tier(self) -> CommandTier {
                match self {
                    $(Self::$name => CommandTier::$tier,)+
                }
            }

            /// Canonical wire name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => $wire,)+
                }
            }
        }
    };
}

environment_commands! {
    /// Rotate the screen by 90-degree steps.
    SetRotation = 1, Stable, "SET_ROTATION";
    /// Ask whether overscan should be cropped.
    GetOverscan = 2, Stable, "GET_OVERSCAN";
    /// Ask whether duplicate frames may be signalled.
    GetCanDupe = 3, Stable, "GET_CAN_DUPE";
    /// Show a short message.
    SetMessage = 6, Stable, "SET_MESSAGE";
    /// Ask the frontend to shut down.
    Shutdown = 7, Stable, "SHUTDOWN";
    /// Hint at required host performance.
    SetPerformanceLevel = 8, Stable, "SET_PERFORMANCE_LEVEL";
    /// Ask for the system (BIOS) directory.
    GetSystemDirectory = 9, Stable, "GET_SYSTEM_DIRECTORY";
    /// Select the software pixel format.
    SetPixelFormat = 10, Stable, "SET_PIXEL_FORMAT";
    /// Describe input bindings.
    SetInputDescriptors = 11, Stable, "SET_INPUT_DESCRIPTORS";
    /// Register for keyboard events.
    SetKeyboardCallback = 12, Stable, "SET_KEYBOARD_CALLBACK";
    /// Register the disk-control interface.
    SetDiskControlInterface = 13, Stable, "SET_DISK_CONTROL_INTERFACE";
    /// Request a hardware rendering context.
    SetHwRender = 14, Stable, "SET_HW_RENDER";
    /// Read one option value.
    GetVariable = 15, Stable, "GET_VARIABLE";
    /// Announce options in the legacy string form.
    SetVariables = 16, Stable, "SET_VARIABLES";
    /// Ask whether option values changed.
    GetVariableUpdate = 17, Stable, "GET_VARIABLE_UPDATE";
    /// Declare that the core runs without content.
    SetSupportNoGame = 18, Stable, "SET_SUPPORT_NO_GAME";
    /// Ask for the path the core was loaded from.
    GetLibretroPath = 19, Stable, "GET_LIBRETRO_PATH";
    /// Register the frame-time callback.
    SetFrameTimeCallback = 21, Stable, "SET_FRAME_TIME_CALLBACK";
    /// Register the asynchronous audio callback.
    SetAudioCallback = 22, Stable, "SET_AUDIO_CALLBACK";
    /// Ask for the rumble interface.
    GetRumbleInterface = 23, Stable, "GET_RUMBLE_INTERFACE";
    /// Ask which device classes are supported.
    GetInputDeviceCapabilities = 24, Stable, "GET_INPUT_DEVICE_CAPABILITIES";
    /// Ask for the sensor interface.
    GetSensorInterface = 25, Experimental, "GET_SENSOR_INTERFACE";
    /// Ask for the camera interface.
    GetCameraInterface = 26, Experimental, "GET_CAMERA_INTERFACE";
    /// Ask for the log interface.
    GetLogInterface = 27, Stable, "GET_LOG_INTERFACE";
    /// Ask for the performance interface.
    GetPerfInterface = 28, Stable, "GET_PERF_INTERFACE";
    /// Ask for the location interface.
    GetLocationInterface = 29, Stable, "GET_LOCATION_INTERFACE";
    /// Ask for the core assets directory.
    GetCoreAssetsDirectory = 30, Stable, "GET_CORE_ASSETS_DIRECTORY";
    /// Ask for the save directory.
    GetSaveDirectory = 31, Stable, "GET_SAVE_DIRECTORY";
    /// Replace AV info mid-session.
    SetSystemAvInfo = 32, Stable, "SET_SYSTEM_AV_INFO";
    /// Register the extension symbol lookup.
    SetProcAddressCallback = 33, Stable, "SET_PROC_ADDRESS_CALLBACK";
    /// Announce subsystem content types.
    SetSubsystemInfo = 34, Stable, "SET_SUBSYSTEM_INFO";
    /// Announce controller types per port.
    SetControllerInfo = 35, Stable, "SET_CONTROLLER_INFO";
    /// Announce the emulated memory map.
    SetMemoryMaps = 36, Experimental, "SET_MEMORY_MAPS";
    /// Change base geometry mid-session.
    SetGeometry = 37, Stable, "SET_GEOMETRY";
    /// Ask for the user name.
    GetUsername = 38, Stable, "GET_USERNAME";
    /// Ask for the user language.
    GetLanguage = 39, Stable, "GET_LANGUAGE";
    /// Borrow a frontend framebuffer to render into.
    GetCurrentSoftwareFramebuffer = 40, Experimental, "GET_CURRENT_SOFTWARE_FRAMEBUFFER";
    /// Ask for the hardware render interface.
    GetHwRenderInterface = 41, Experimental, "GET_HW_RENDER_INTERFACE";
    /// Declare achievement support.
    SetSupportAchievements = 42, Experimental, "SET_SUPPORT_ACHIEVEMENTS";
    /// Register the context negotiation interface.
    SetHwRenderContextNegotiationInterface = 43, Experimental, "SET_HW_RENDER_CONTEXT_NEGOTIATION_INTERFACE";
    /// Negotiate save-state quirks.
    SetSerializationQuirks = 44, Stable, "SET_SERIALIZATION_QUIRKS";
    /// Request a context shared with the frontend.
    SetHwSharedContext = 44, Experimental, "SET_HW_SHARED_CONTEXT";
    /// Ask for the virtual file system.
    GetVfsInterface = 45, Experimental, "GET_VFS_INTERFACE";
    /// Ask for the LED interface.
    GetLedInterface = 46, Experimental, "GET_LED_INTERFACE";
    /// Ask which outputs are consumed.
    GetAudioVideoEnable = 47, Experimental, "GET_AUDIO_VIDEO_ENABLE";
    /// Ask for the MIDI interface.
    GetMidiInterface = 48, Experimental, "GET_MIDI_INTERFACE";
    /// Ask whether fast-forward is active.
    GetFastForwarding = 49, Experimental, "GET_FASTFORWARDING";
    /// Ask for the display refresh rate.
    GetTargetRefreshRate = 50, Experimental, "GET_TARGET_REFRESH_RATE";
    /// Ask whether joypad bitmask queries are supported.
    GetInputBitmasks = 51, Experimental, "GET_INPUT_BITMASKS";
    /// Ask for the core options interface version.
    GetCoreOptionsVersion = 52, Stable, "GET_CORE_OPTIONS_VERSION";
    /// Announce options with values and labels.
    SetCoreOptions = 53, Stable, "SET_CORE_OPTIONS";
    /// Announce options with translations.
    SetCoreOptionsIntl = 54, Stable, "SET_CORE_OPTIONS_INTL";
    /// Show or hide an option.
    SetCoreOptionsDisplay = 55, Stable, "SET_CORE_OPTIONS_DISPLAY";
    /// Ask which hardware context the user prefers.
    GetPreferredHwRender = 56, Stable, "GET_PREFERRED_HW_RENDER";
    /// Ask for the disk-control interface version.
    GetDiskControlInterfaceVersion = 57, Stable, "GET_DISK_CONTROL_INTERFACE_VERSION";
    /// Register the extended disk-control interface.
    SetDiskControlExtInterface = 58, Stable, "SET_DISK_CONTROL_EXT_INTERFACE";
    /// Ask for the message interface version.
    GetMessageInterfaceVersion = 59, Stable, "GET_MESSAGE_INTERFACE_VERSION";
    /// Show a message with target, priority and progress.
    SetMessageExt = 60, Stable, "SET_MESSAGE_EXT";
    /// Ask how many users the frontend drives.
    GetInputMaxUsers = 61, Stable, "GET_INPUT_MAX_USERS";
}

impl EnvironmentCommand {
    /// Wire value including the experimental bit when the tier has it.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self.tier() {
            CommandTier::Stable => self.id(),
            CommandTier::Experimental => self.id() | EXPERIMENTAL,
        }
    }

    /// Decodes a raw wire id.
    ///
    /// Exact wire values win, which keeps `44` and `44 | EXPERIMENTAL`
    /// apart. Otherwise the experimental bit is ignored, so a command sent
    /// with or without it still decodes.
    ///
    /// # Errors
    ///
    /// Returns [`CommandDecodeError`] for private, retired or unassigned ids.
    pub fn decode(raw: u32) -> Result<Self, CommandDecodeError> {
        if raw & PRIVATE != 0 {
            return Err(CommandDecodeError::Private { raw });
        }
        if let Some(command) = Self::ALL.iter().find(|command| command.raw() == raw) {
            return Ok(*command);
        }
        let id = raw & !EXPERIMENTAL;
        if RETIRED_COMMAND_IDS.contains(&id) {
            return Err(CommandDecodeError::Retired { raw });
        }
        Self::ALL
            .iter()
            .find(|command| command.id() == id)
            .copied()
            .ok_or(CommandDecodeError::Unknown { raw })
    }

    /// Returns `true` for commands the frontend answers by filling data.
    #[must_use]
    pub fn is_query(self) -> bool {
        self.name().starts_with("GET_")
    }
}

impl fmt::Display for EnvironmentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
