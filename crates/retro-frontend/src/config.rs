//! Host frontend configuration.
//!
//! Every answer [`crate::HostFrontend`] gives to a query command comes from
//! this struct, so a config fully describes the host a core sees.

use std::path::PathBuf;

use retro_contract::environment::{CoreOptionsVersion, Language, MessageInterfaceVersion};
use retro_contract::{
    AvEnableFlags, DeviceCapabilities, DiskControlVersion, HwContextType, SerializationQuirks,
    VfsVersion,
};
use thiserror::Error;

/// Most ports a host may report through `GET_INPUT_MAX_USERS`.
pub const MAX_PORTS: u32 = 16;

/// Why a [`FrontendConfig`] cannot be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `max_users` is zero or above [`MAX_PORTS`].
    #[error("max_users must be between 1 and {MAX_PORTS}, got {0}")]
    MaxUsers(u32),
    /// Target refresh rate is not a positive finite number.
    #[error("target refresh rate {0} is not a positive finite number")]
    RefreshRate(f32),
    /// A VFS revision is configured without a root directory, or the other
    /// way round.
    #[error("vfs_version and vfs_root must be set together")]
    VfsIncomplete,
    /// Username is empty; use `None` for no username.
    #[error("username is empty")]
    EmptyUsername,
}

/// Host configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrontendConfig {
    /// `GET_SYSTEM_DIRECTORY` answer (BIOS and firmware).
    pub system_directory: Option<PathBuf>,
    /// `GET_SAVE_DIRECTORY` answer.
    pub save_directory: Option<PathBuf>,
    /// `GET_CORE_ASSETS_DIRECTORY` answer.
    pub core_assets_directory: Option<PathBuf>,
    /// `GET_LIBRETRO_PATH` answer.
    pub libretro_path: Option<PathBuf>,
    /// `GET_USERNAME` answer.
    pub username: Option<String>,
    /// `GET_LANGUAGE` answer.
    pub language: Language,
    /// `GET_CAN_DUPE` answer.
    pub can_dupe: bool,
    /// `GET_OVERSCAN` answer.
    pub overscan: bool,
    /// Accept `GET_INPUT_BITMASKS`.
    pub input_bitmasks: bool,
    /// `GET_INPUT_MAX_USERS` answer.
    pub max_users: u32,
    /// Device classes reported by `GET_INPUT_DEVICE_CAPABILITIES`.
    pub device_capabilities: DeviceCapabilities,
    /// `GET_CORE_OPTIONS_VERSION` answer.
    pub core_options_version: CoreOptionsVersion,
    /// `GET_DISK_CONTROL_INTERFACE_VERSION` answer.
    pub disk_control_version: DiskControlVersion,
    /// `GET_MESSAGE_INTERFACE_VERSION` answer.
    pub message_version: MessageInterfaceVersion,
    /// Highest VFS revision offered; `None` declines `GET_VFS_INTERFACE`.
    pub vfs_version: Option<VfsVersion>,
    /// Directory VFS paths resolve under.
    pub vfs_root: Option<PathBuf>,
    /// Save-state quirks the host can honour.
    pub supported_quirks: SerializationQuirks,
    /// `GET_PREFERRED_HW_RENDER` answer; `None` accepts no hardware context.
    pub preferred_hw_render: HwContextType,
    /// `GET_TARGET_REFRESH_RATE` answer in Hz.
    pub target_refresh_rate: f32,
    /// `GET_FASTFORWARDING` answer.
    pub fast_forwarding: bool,
    /// `GET_AUDIO_VIDEO_ENABLE` answer.
    pub av_enable: AvEnableFlags,
    /// Answer experimental-tier commands; when `false` they are all declined.
    pub accept_experimental: bool,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            system_directory: None,
            save_directory: None,
            core_assets_directory: None,
            libretro_path: None,
            username: None,
            language: Language::English,
            can_dupe: true,
            overscan: false,
            input_bitmasks: true,
            max_users: 2,
            device_capabilities: DeviceCapabilities::JOYPAD
                | DeviceCapabilities::ANALOG
                | DeviceCapabilities::KEYBOARD
                | DeviceCapabilities::POINTER,
            core_options_version: CoreOptionsVersion::V1,
            disk_control_version: DiskControlVersion::V1,
            message_version: MessageInterfaceVersion::V1,
            vfs_version: None,
            vfs_root: None,
            supported_quirks: SerializationQuirks::all(),
            preferred_hw_render: HwContextType::None,
            target_refresh_rate: 60.0,
            fast_forwarding: false,
            av_enable: AvEnableFlags::default(),
            accept_experimental: true,
        }
    }
}

impl FrontendConfig {
    /// Host that answers only the oldest revision of every versioned
    /// interface and declines experimental commands.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            can_dupe: false,
            input_bitmasks: false,
            max_users: 1,
            device_capabilities: DeviceCapabilities::JOYPAD,
            core_options_version: CoreOptionsVersion::Legacy,
            disk_control_version: DiskControlVersion::V0,
            message_version: MessageInterfaceVersion::V0,
            supported_quirks: SerializationQuirks::empty(),
            accept_experimental: false,
            ..Self::default()
        }
    }

    /// Checks field combinations the host cannot serve.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_users == 0 || self.max_users > MAX_PORTS {
            return Err(ConfigError::MaxUsers(self.max_users));
        }
        if !self.target_refresh_rate.is_finite() || self.target_refresh_rate <= 0.0 {
            return Err(ConfigError::RefreshRate(self.target_refresh_rate));
        }
        if self.vfs_version.is_some() != self.vfs_root.is_some() {
            return Err(ConfigError::VfsIncomplete);
        }
        if self.username.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::EmptyUsername);
        }
        Ok(())
    }
}
