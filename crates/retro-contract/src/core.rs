//! The core side of the contract.

use std::path::{Path, PathBuf};

use crate::api::API_VERSION;
use crate::av::{Region, SystemAvInfo};
use crate::device::{DeviceType, KeyboardEvent};
use crate::disk::DiskControl;
use crate::environment::EnvironmentClient;
use crate::frame::FrameContext;
use crate::memory::MemoryType;

/// Extension function resolved through the proc-address hook.
pub type ProcAddress = fn();

/// Static description of a core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SystemInfo {
    /// Display name.
    pub library_name: String,
    /// Display version.
    pub library_version: String,
    /// `|`-separated file extensions, without dots.
    pub valid_extensions: String,
    /// Content must be passed as a path, never as loaded data.
    pub need_fullpath: bool,
    /// Frontend must not extract archives before loading.
    pub block_extract: bool,
}

impl SystemInfo {
    /// Returns `true` when `path` has one of the valid extensions.
    ///
    /// Matching ignores ASCII case. An empty extension list accepts nothing.
    #[must_use]
    pub fn accepts_extension(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        self.valid_extensions
            .split('|')
            .any(|valid| valid.eq_ignore_ascii_case(extension))
    }
}

/// Content handed to `load_game`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GameInfo {
    /// Host path of the content.
    pub path: Option<PathBuf>,
    /// Content bytes; absent when the core needs the full path.
    pub data: Option<Vec<u8>>,
    /// Implementation-specific metadata.
    pub meta: Option<String>,
}

impl GameInfo {
    /// Content known only by path.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            data: None,
            meta: None,
        }
    }

    /// Content already loaded into memory.
    #[must_use]
    pub fn from_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: None,
            data: Some(data.into()),
            meta: None,
        }
    }
}

/// An emulator or game core.
///
/// Every method is called by a [`Session`](crate::Session), which enforces
/// lifecycle order; a core never sees an out-of-order call. Methods with
/// default bodies are optional entry points or hooks that only run after
/// the core registered them through the environment.
pub trait Core {
    /// Interface version the core was built against.
    fn api_version(&self) -> u32 {
        API_VERSION
    }

    /// Static description; callable at any time.
    fn system_info(&self) -> SystemInfo;

    /// Receives the environment once, before `init`.
    fn set_environment(&mut self, env: &mut EnvironmentClient<'_>);

    /// One-time initialization.
    fn init(&mut self, env: &mut EnvironmentClient<'_>);

    /// Final teardown.
    fn deinit(&mut self);

    /// Loads content; `None` only when no-game support was announced.
    fn load_game(&mut self, game: Option<&GameInfo>, env: &mut EnvironmentClient<'_>) -> bool;

    /// Loads several pieces of content as one announced subsystem type.
    fn load_game_special(
        &mut self,
        game_type: u32,
        games: &[GameInfo],
        env: &mut EnvironmentClient<'_>,
    ) -> bool {
        let _ = (game_type, games, env);
        false
    }

    /// Unloads content.
    fn unload_game(&mut self, env: &mut EnvironmentClient<'_>);

    /// AV parameters of the loaded content.
    fn system_av_info(&self) -> SystemAvInfo;

    /// Assigns a device to a port; the core may re-announce input descriptors.
    fn set_controller_port_device(
        &mut self,
        port: u32,
        device: DeviceType,
        env: &mut EnvironmentClient<'_>,
    ) {
        let _ = (port, device, env);
    }

    /// Soft reset.
    fn reset(&mut self, env: &mut EnvironmentClient<'_>);

    /// Runs one video frame.
    fn run(&mut self, frame: &mut FrameContext<'_>);

    /// Bytes needed for a save state.
    fn serialize_size(&self) -> usize;

    /// Writes a save state into `buffer`.
    fn serialize(&mut self, buffer: &mut [u8]) -> bool;

    /// Restores a save state.
    fn unserialize(&mut self, buffer: &[u8]) -> bool;

    /// Clears every applied cheat.
    fn cheat_reset(&mut self) {}

    /// Applies cheat `index`.
    fn cheat_set(&mut self, index: u32, enabled: bool, code: &str) {
        let _ = (index, enabled, code);
    }

    /// Video standard of the loaded content.
    fn region(&self) -> Region {
        Region::Ntsc
    }

    /// Core memory region; its length is the region size.
    fn memory(&mut self, id: MemoryType) -> Option<&mut [u8]> {
        let _ = id;
        None
    }

    /// Keyboard hook, after `SET_KEYBOARD_CALLBACK`.
    fn keyboard_event(&mut self, event: KeyboardEvent) {
        let _ = event;
    }

    /// Frame-time hook, after `SET_FRAME_TIME_CALLBACK`; called before each
    /// frame with the time since the previous one.
    fn frame_time(&mut self, usec: i64) {
        let _ = usec;
    }

    /// Disk-control hook, after `SET_DISK_CONTROL_INTERFACE`.
    fn disk_control(&mut self) -> Option<&mut dyn DiskControl> {
        None
    }

    /// Hardware context (re)created, after `SET_HW_RENDER`.
    fn hw_context_reset(&mut self, env: &mut EnvironmentClient<'_>) {
        let _ = env;
    }

    /// Hardware context about to be destroyed.
    fn hw_context_destroy(&mut self) {}

    /// Extension symbol lookup, after `SET_PROC_ADDRESS_CALLBACK`.
    fn proc_address(&self, symbol: &str) -> Option<ProcAddress> {
        let _ = symbol;
        None
    }
}
