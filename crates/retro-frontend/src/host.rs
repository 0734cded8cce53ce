//! Reference frontend answering every environment command from a
//! [`FrontendConfig`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use retro_contract::environment::{
    AudioCallback, CommandTier, ControllerInfo, FramebufferRequest, InputDescriptor,
    LedInterface, LogInterface, LogLevel, MessageExt, PerfInterface, RumbleEffect,
    RumbleInterface, SimdFeatures, SubsystemInfo, CORE_LOG_TARGET,
};
use retro_contract::vfs::VfsInterfaceRequest;
use retro_contract::{
    ContextLease, DeviceType, Environment, EnvironmentCall, FrameCallbacks, GameGeometry,
    HwContext, HwContextType, HwRenderInterfaceKind, MemoryMap, OptionStore, PixelFormat,
    Rotation, SoftwareFramebuffer, SystemAvInfo, Vfs, VfsInterface, VideoFrame,
};

use crate::config::FrontendConfig;
use crate::input::InputTable;
use crate::vfs::HostVfs;

/// Log sink handed out through `GET_LOG_INTERFACE`.
///
/// Forwards to the `log` facade under [`CORE_LOG_TARGET`] and counts
/// messages per level.
#[derive(Debug, Default)]
pub struct HostLog {
    counts: [AtomicU64; 4],
}

impl HostLog {
    /// Messages logged at `level` so far.
    #[must_use]
    pub fn count(&self, level: LogLevel) -> u64 {
        self.counts[level as usize].load(Ordering::Relaxed)
    }
}

impl LogInterface for HostLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.counts[level as usize].fetch_add(1, Ordering::Relaxed);
        log::log!(target: CORE_LOG_TARGET, level.to_log(), "{}", message.trim_end());
    }
}

/// Wall clock and tick counter relative to host start.
#[derive(Debug)]
pub struct HostPerf {
    started: Instant,
}

impl Default for HostPerf {
    fn default() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl PerfInterface for HostPerf {
    fn time_usec(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX)
            })
    }

    fn cpu_features(&self) -> SimdFeatures {
        host_simd_features()
    }

    fn perf_counter(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

#[cfg(target_arch = "x86_64")]
fn host_simd_features() -> SimdFeatures {
    let mut features = SimdFeatures::SSE | SimdFeatures::SSE2 | SimdFeatures::MMX;
    let detected = [
        (std::arch::is_x86_feature_detected!("sse3"), SimdFeatures::SSE3),
        (std::arch::is_x86_feature_detected!("ssse3"), SimdFeatures::SSSE3),
        (std::arch::is_x86_feature_detected!("sse4.1"), SimdFeatures::SSE4),
        (std::arch::is_x86_feature_detected!("sse4.2"), SimdFeatures::SSE42),
        (std::arch::is_x86_feature_detected!("avx"), SimdFeatures::AVX),
        (std::arch::is_x86_feature_detected!("avx2"), SimdFeatures::AVX2),
        (std::arch::is_x86_feature_detected!("aes"), SimdFeatures::AES),
        (std::arch::is_x86_feature_detected!("popcnt"), SimdFeatures::POPCNT),
        (std::arch::is_x86_feature_detected!("movbe"), SimdFeatures::MOVBE),
    ];
    for (present, feature) in detected {
        if present {
            features |= feature;
        }
    }
    features | SimdFeatures::CMOV
}

#[cfg(target_arch = "aarch64")]
fn host_simd_features() -> SimdFeatures {
    SimdFeatures::NEON | SimdFeatures::ASIMD
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn host_simd_features() -> SimdFeatures {
    SimdFeatures::empty()
}

/// Last rumble strength per port and motor.
#[derive(Debug, Default)]
pub struct HostRumble {
    strengths: Mutex<HashMap<(u32, u32), u16>>,
}

impl HostRumble {
    /// Current strength of `effect` on `port`.
    #[must_use]
    pub fn strength(&self, port: u32, effect: RumbleEffect) -> u16 {
        self.strengths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(port, effect as u32))
            .copied()
            .unwrap_or(0)
    }
}

impl RumbleInterface for HostRumble {
    fn set_rumble_state(&self, port: u32, effect: RumbleEffect, strength: u16) -> bool {
        self.strengths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((port, effect as u32), strength);
        true
    }
}

/// LED states as last set by the core.
#[derive(Debug, Default)]
pub struct HostLeds {
    states: Mutex<HashMap<i32, i32>>,
}

impl HostLeds {
    /// State of `led`, `0` when never set.
    #[must_use]
    pub fn state(&self, led: i32) -> i32 {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&led)
            .copied()
            .unwrap_or(0)
    }
}

impl LedInterface for HostLeds {
    fn set_led_state(&self, led: i32, state: i32) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(led, state);
    }
}

/// Shape of the most recent video frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentedFrame {
    /// Pixels copied from core memory.
    Software {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Previous frame shown again.
    Duplicate,
    /// Frame left in the hardware context.
    Hardware {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Frame rendered into the lent software framebuffer.
    Framebuffer {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

/// What the core registered with the host.
#[derive(Default)]
pub struct HostRegistrations {
    /// Screen rotation.
    pub rotation: Rotation,
    /// Performance level hint.
    pub performance_level: u32,
    /// Pixel format of software frames.
    pub pixel_format: PixelFormat,
    /// Button labels per port.
    pub input_descriptors: Vec<InputDescriptor>,
    /// Keyboard callback requested.
    pub keyboard: bool,
    /// Extended disk control registered; `Some(false)` for the basic one.
    pub disk_control_ext: Option<bool>,
    /// Core runs without content.
    pub support_no_game: bool,
    /// Core supports achievements.
    pub support_achievements: bool,
    /// Reference frame time.
    pub frame_time_reference: Option<i64>,
    /// Asynchronous audio producer.
    pub audio_callback: Option<Arc<dyn AudioCallback>>,
    /// Timing announced for the loaded content.
    pub av_info: Option<SystemAvInfo>,
    /// Proc-address callback offered.
    pub proc_address: bool,
    /// Subsystem content types.
    pub subsystems: Vec<SubsystemInfo>,
    /// Controller types per port.
    pub controllers: Vec<ControllerInfo>,
    /// Memory map.
    pub memory_map: Option<MemoryMap>,
    /// Hardware context shared with the host.
    pub shared_context: bool,
}

impl fmt::Debug for HostRegistrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRegistrations")
            .field("pixel_format", &self.pixel_format)
            .field("keyboard", &self.keyboard)
            .field("disk_control_ext", &self.disk_control_ext)
            .field("support_no_game", &self.support_no_game)
            .field("audio_callback", &self.audio_callback.is_some())
            .field("av_info", &self.av_info)
            .finish_non_exhaustive()
    }
}

/// Frontend that serves a core from a [`FrontendConfig`] and keeps what the
/// core sends it.
pub struct HostFrontend {
    config: FrontendConfig,
    options: OptionStore,
    input: InputTable,
    registrations: HostRegistrations,
    hw: HwContext,
    vfs: Option<Arc<HostVfs>>,
    log: Arc<HostLog>,
    perf: Arc<HostPerf>,
    rumble: Arc<HostRumble>,
    leds: Arc<HostLeds>,
    framebuffer: Vec<u8>,
    video: Vec<u8>,
    presented: Option<PresentedFrame>,
    frames_presented: u64,
    audio: Vec<i16>,
    messages: Vec<String>,
    shutdown: bool,
    declined: Vec<retro_contract::EnvironmentCommand>,
}

impl fmt::Debug for HostFrontend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFrontend")
            .field("config", &self.config)
            .field("registrations", &self.registrations)
            .field("presented", &self.presented)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

impl Default for HostFrontend {
    fn default() -> Self {
        Self::new(FrontendConfig::default())
    }
}

impl HostFrontend {
    /// Host serving `config`.
    #[must_use]
    pub fn new(config: FrontendConfig) -> Self {
        let vfs = config
            .vfs_version
            .zip(config.vfs_root.clone())
            .map(|(version, root)| Arc::new(HostVfs::new(root, version)));
        let input = InputTable::new(config.max_users);
        Self {
            config,
            options: OptionStore::new(),
            input,
            registrations: HostRegistrations::default(),
            hw: HwContext::new(),
            vfs,
            log: Arc::new(HostLog::default()),
            perf: Arc::new(HostPerf::default()),
            rumble: Arc::new(HostRumble::default()),
            leds: Arc::new(HostLeds::default()),
            framebuffer: Vec::new(),
            video: Vec::new(),
            presented: None,
            frames_presented: 0,
            audio: Vec::new(),
            messages: Vec::new(),
            shutdown: false,
            declined: Vec::new(),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &FrontendConfig {
        &self.config
    }

    /// Core options as announced, with the user's selections.
    #[must_use]
    pub const fn options(&self) -> &OptionStore {
        &self.options
    }

    /// Selects an option value; the core sees the change through
    /// `GET_VARIABLE_UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns the store's error for unknown keys and values.
    pub fn set_option(
        &mut self,
        key: &str,
        value: &str,
    ) -> Result<(), retro_contract::OptionsError> {
        self.options.set(key, value)
    }

    /// Input answered to the core.
    pub fn input_mut(&mut self) -> &mut InputTable {
        &mut self.input
    }

    /// Input answered to the core.
    #[must_use]
    pub const fn input(&self) -> &InputTable {
        &self.input
    }

    /// What the core registered.
    #[must_use]
    pub const fn registrations(&self) -> &HostRegistrations {
        &self.registrations
    }

    /// Log sink shared with the core.
    #[must_use]
    pub fn log(&self) -> &HostLog {
        &self.log
    }

    /// Rumble state set by the core.
    #[must_use]
    pub fn rumble(&self) -> &HostRumble {
        &self.rumble
    }

    /// LED state set by the core.
    #[must_use]
    pub fn leds(&self) -> &HostLeds {
        &self.leds
    }

    /// `true` once the core asked to shut down.
    #[must_use]
    pub const fn shutdown_requested(&self) -> bool {
        self.shutdown
    }

    /// Messages shown on screen, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Shape of the last presented frame.
    #[must_use]
    pub const fn last_frame(&self) -> Option<PresentedFrame> {
        self.presented
    }

    /// Pixels of the last software or framebuffer frame, packed without
    /// row padding.
    #[must_use]
    pub fn video(&self) -> &[u8] {
        &self.video
    }

    /// Frames presented, duplicates included.
    #[must_use]
    pub const fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Interleaved stereo samples received since the last drain.
    #[must_use]
    pub fn audio(&self) -> &[i16] {
        &self.audio
    }

    /// Takes the buffered audio.
    pub fn drain_audio(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.audio)
    }

    /// Drives the registered audio callback from a dedicated audio thread.
    ///
    /// The thread enables the callback, requests `cycles` buffers and
    /// disables it again before it is joined. Returns `false` when no
    /// callback is registered or the callback panicked.
    #[must_use]
    pub fn drive_audio_callback(&self, cycles: u32) -> bool {
        let Some(callback) = self.registrations.audio_callback.as_ref().map(Arc::clone) else {
            return false;
        };
        let audio = std::thread::Builder::new()
            .name(String::from("audio"))
            .spawn(move || {
                callback.set_state(true);
                for _ in 0..cycles {
                    callback.callback();
                }
                callback.set_state(false);
            });
        match audio.map(std::thread::JoinHandle::join) {
            Ok(Ok(())) => {
                log::debug!("audio thread requested {cycles} buffer(s)");
                true
            }
            Ok(Err(_)) => {
                log::warn!("audio callback panicked");
                false
            }
            Err(err) => {
                log::warn!("failed to start the audio thread: {err}");
                false
            }
        }
    }

    /// Declines `command` from now on, as a host lacking it would.
    pub fn decline(&mut self, command: retro_contract::EnvironmentCommand) {
        if !self.declined.contains(&command) {
            self.declined.push(command);
        }
    }

    /// Records the geometry and timing the core reported after a load.
    pub fn set_av_info(&mut self, info: SystemAvInfo) {
        self.registrations.av_info = Some(info);
    }

    /// Hardware context state.
    #[must_use]
    pub const fn hw_context(&self) -> &HwContext {
        &self.hw
    }

    /// Brings up a new hardware context and returns its lease.
    ///
    /// Interfaces handed out for earlier contexts become stale.
    pub fn reset_hw_context(&mut self) -> ContextLease {
        self.hw.reset()
    }

    /// Tears the hardware context down.
    pub fn destroy_hw_context(&mut self) {
        self.hw.destroy();
    }

    fn accepts_hw_context(&self, context: HwContextType) -> bool {
        context != HwContextType::None
            && (self.config.preferred_hw_render == context
                || (self.config.preferred_hw_render.is_gl() && context.is_gl()))
    }

    fn lend_framebuffer(&mut self, request: FramebufferRequest<'_>) -> bool {
        let format = self.registrations.pixel_format;
        let geometry = self.registrations.av_info.map(|info| info.geometry);
        if geometry.is_some_and(|geometry| !geometry.fits(request.width, request.height)) {
            return false;
        }
        let pitch = request.width as usize * format.bytes_per_pixel();
        let len = pitch * request.height as usize;
        if self.framebuffer.len() < len {
            self.framebuffer.resize(len, 0);
        }
        let mut buffer = SoftwareFramebuffer {
            data: &mut self.framebuffer[..len],
            width: request.width,
            height: request.height,
            pitch,
            format,
            access: request.access,
        };
        (request.render)(&mut buffer);
        true
    }

    fn show_message(&mut self, message: &MessageExt) {
        if message.target.logs() {
            log::log!(target: CORE_LOG_TARGET, message.level.to_log(), "{}", message.msg);
        }
        if message.target.displays() {
            self.messages.push(message.msg.clone());
        }
    }

    fn offer_vfs(&self, request: &mut VfsInterfaceRequest) -> bool {
        let Some((vfs, offered)) = self.vfs.as_ref().zip(self.config.vfs_version) else {
            return false;
        };
        if offered < request.required_version {
            log::debug!(
                "core needs VFS {}, host offers {offered}",
                request.required_version
            );
            return false;
        }
        let vfs: Arc<dyn Vfs> = Arc::clone(vfs) as Arc<dyn Vfs>;
        request.interface = Some(VfsInterface::new(vfs, offered));
        true
    }

    fn set_geometry(&mut self, geometry: &GameGeometry) -> bool {
        match &mut self.registrations.av_info {
            Some(info) => {
                // The maximum is fixed until the next SET_SYSTEM_AV_INFO.
                info.geometry.base_width = geometry.base_width;
                info.geometry.base_height = geometry.base_height;
                info.geometry.aspect_ratio = geometry.aspect_ratio;
                true
            }
            None => false,
        }
    }

    /// Answers one command; the big dispatch behind [`Environment`].
    #[allow(clippy::too_many_lines)]
    fn answer(&mut self, call: EnvironmentCall<'_>) -> bool {
        match call {
            EnvironmentCall::SetRotation(rotation) => {
                self.registrations.rotation = rotation;
                true
            }
            EnvironmentCall::GetOverscan(slot) => {
                *slot = self.config.overscan;
                true
            }
            EnvironmentCall::GetCanDupe(slot) => {
                *slot = self.config.can_dupe;
                true
            }
            EnvironmentCall::SetMessage(message) => {
                log::info!(target: CORE_LOG_TARGET, "{}", message.msg);
                self.messages.push(message.msg.clone());
                true
            }
            EnvironmentCall::Shutdown => {
                log::info!("core requested shutdown");
                self.shutdown = true;
                true
            }
            EnvironmentCall::SetPerformanceLevel(level) => {
                self.registrations.performance_level = level;
                true
            }
            EnvironmentCall::GetSystemDirectory(slot) => {
                slot.clone_from(&self.config.system_directory);
                slot.is_some()
            }
            EnvironmentCall::GetSaveDirectory(slot) => {
                slot.clone_from(&self.config.save_directory);
                slot.is_some()
            }
            EnvironmentCall::GetCoreAssetsDirectory(slot) => {
                slot.clone_from(&self.config.core_assets_directory);
                slot.is_some()
            }
            EnvironmentCall::GetLibretroPath(slot) => {
                slot.clone_from(&self.config.libretro_path);
                slot.is_some()
            }
            EnvironmentCall::SetPixelFormat(format) => {
                self.registrations.pixel_format = format;
                true
            }
            EnvironmentCall::SetInputDescriptors(descriptors) => {
                self.registrations.input_descriptors = descriptors.to_vec();
                true
            }
            EnvironmentCall::SetKeyboardCallback => {
                self.registrations.keyboard = true;
                true
            }
            EnvironmentCall::SetDiskControlInterface => {
                self.registrations.disk_control_ext = Some(false);
                true
            }
            EnvironmentCall::SetDiskControlExtInterface => {
                self.registrations.disk_control_ext = Some(true);
                true
            }
            EnvironmentCall::GetDiskControlInterfaceVersion(slot) => {
                *slot = self.config.disk_control_version;
                true
            }
            EnvironmentCall::SetHwRender(request) => {
                if !self.accepts_hw_context(request.context_type) {
                    return false;
                }
                self.hw.accept(*request);
                true
            }
            EnvironmentCall::GetHwRenderInterface(slot) => {
                *slot = self.hw.interface();
                slot.is_some()
            }
            EnvironmentCall::SetHwRenderContextNegotiationInterface(negotiation) => {
                negotiation.kind == HwRenderInterfaceKind::Vulkan
                    && self.config.preferred_hw_render == HwContextType::Vulkan
            }
            EnvironmentCall::SetHwSharedContext => {
                self.registrations.shared_context = true;
                true
            }
            EnvironmentCall::GetPreferredHwRender(slot) => {
                *slot = self.config.preferred_hw_render;
                self.config.preferred_hw_render != HwContextType::None
            }
            EnvironmentCall::GetVariable(variable) => {
                variable.value = self.options.get(&variable.key).map(str::to_owned);
                variable.value.is_some()
            }
            EnvironmentCall::GetVariableUpdate(slot) => {
                *slot = self.options.take_update();
                true
            }
            EnvironmentCall::SetVariables(variables) => self
                .options
                .announce_legacy(variables)
                .map_err(|err| log::warn!("refused legacy variables: {err}"))
                .is_ok(),
            EnvironmentCall::GetCoreOptionsVersion(slot) => {
                *slot = self.config.core_options_version;
                true
            }
            EnvironmentCall::SetCoreOptions(definitions) => self
                .options
                .announce(definitions)
                .map_err(|err| log::warn!("refused core options: {err}"))
                .is_ok(),
            EnvironmentCall::SetCoreOptionsIntl(intl) => self
                .options
                .announce(&intl.resolve())
                .map_err(|err| log::warn!("refused translated core options: {err}"))
                .is_ok(),
            EnvironmentCall::SetCoreOptionsDisplay(display) => {
                self.options.set_visible(display);
                true
            }
            EnvironmentCall::SetSupportNoGame(supported) => {
                self.registrations.support_no_game = supported;
                true
            }
            EnvironmentCall::SetSupportAchievements(supported) => {
                self.registrations.support_achievements = supported;
                true
            }
            EnvironmentCall::SetFrameTimeCallback { reference_usec } => {
                self.registrations.frame_time_reference = Some(reference_usec);
                true
            }
            EnvironmentCall::SetAudioCallback(callback) => {
                self.registrations.audio_callback = Some(callback);
                true
            }
            EnvironmentCall::GetRumbleInterface(slot) => {
                *slot = Some(Arc::clone(&self.rumble) as Arc<dyn RumbleInterface>);
                true
            }
            EnvironmentCall::GetInputDeviceCapabilities(slot) => {
                *slot = self.config.device_capabilities;
                true
            }
            EnvironmentCall::GetLogInterface(slot) => {
                *slot = Some(Arc::clone(&self.log) as Arc<dyn LogInterface>);
                true
            }
            EnvironmentCall::GetPerfInterface(slot) => {
                *slot = Some(Arc::clone(&self.perf) as Arc<dyn PerfInterface>);
                true
            }
            EnvironmentCall::GetLedInterface(slot) => {
                *slot = Some(Arc::clone(&self.leds) as Arc<dyn LedInterface>);
                true
            }
            // No sensors, camera, location fix or MIDI ports on this host.
            EnvironmentCall::GetSensorInterface(_)
            | EnvironmentCall::GetCameraInterface(_)
            | EnvironmentCall::GetLocationInterface(_)
            | EnvironmentCall::GetMidiInterface(_) => false,
            EnvironmentCall::SetSystemAvInfo(info) => {
                self.registrations.av_info = Some(*info);
                true
            }
            EnvironmentCall::SetGeometry(geometry) => self.set_geometry(geometry),
            EnvironmentCall::SetProcAddressCallback => {
                self.registrations.proc_address = true;
                true
            }
            EnvironmentCall::SetSubsystemInfo(subsystems) => {
                self.registrations.subsystems = subsystems.to_vec();
                true
            }
            EnvironmentCall::SetControllerInfo(controllers) => {
                self.registrations.controllers = controllers.to_vec();
                true
            }
            EnvironmentCall::SetMemoryMaps(map) => {
                self.registrations.memory_map = Some(map.clone());
                true
            }
            EnvironmentCall::GetUsername(slot) => {
                slot.clone_from(&self.config.username);
                slot.is_some()
            }
            EnvironmentCall::GetLanguage(slot) => {
                *slot = self.config.language;
                true
            }
            EnvironmentCall::GetCurrentSoftwareFramebuffer(request) => {
                self.lend_framebuffer(request)
            }
            EnvironmentCall::SetSerializationQuirks(slot) => {
                *slot = slot.negotiate(self.config.supported_quirks);
                true
            }
            EnvironmentCall::GetVfsInterface(request) => self.offer_vfs(request),
            EnvironmentCall::GetAudioVideoEnable(slot) => {
                *slot = self.config.av_enable;
                true
            }
            EnvironmentCall::GetFastForwarding(slot) => {
                *slot = self.config.fast_forwarding;
                true
            }
            EnvironmentCall::GetTargetRefreshRate(slot) => {
                *slot = self.config.target_refresh_rate;
                true
            }
            EnvironmentCall::GetInputBitmasks => self.config.input_bitmasks,
            EnvironmentCall::GetMessageInterfaceVersion(slot) => {
                *slot = self.config.message_version;
                true
            }
            EnvironmentCall::SetMessageExt(message) => {
                self.show_message(message);
                true
            }
            EnvironmentCall::GetInputMaxUsers(slot) => {
                *slot = self.config.max_users;
                true
            }
        }
    }
}

impl Environment for HostFrontend {
    fn environment(&mut self, call: EnvironmentCall<'_>) -> bool {
        let command = call.command();
        if self.declined.contains(&command) {
            return false;
        }
        if command.tier() == CommandTier::Experimental && !self.config.accept_experimental {
            log::debug!("declined experimental {command}");
            return false;
        }
        let accepted = self.answer(call);
        log::trace!("{command} -> {accepted}");
        accepted
    }
}

impl FrameCallbacks for HostFrontend {
    fn input_poll(&mut self) {
        self.input.poll();
    }

    fn input_state(&mut self, port: u32, device: DeviceType, index: u32, id: u32) -> i16 {
        self.input.state(port, device, index, id)
    }

    fn video_refresh(&mut self, frame: &VideoFrame<'_>) {
        self.frames_presented = self.frames_presented.wrapping_add(1);
        let bytes_per_pixel = self.registrations.pixel_format.bytes_per_pixel();
        self.presented = Some(match *frame {
            VideoFrame::Software {
                data,
                width,
                height,
                pitch,
            } => {
                pack_rows(&mut self.video, data, width, height, pitch, bytes_per_pixel);
                PresentedFrame::Software { width, height }
            }
            VideoFrame::Duplicate { .. } => PresentedFrame::Duplicate,
            VideoFrame::Hardware { width, height } => PresentedFrame::Hardware { width, height },
            VideoFrame::Framebuffer {
                width,
                height,
                pitch,
            } => {
                let lent = std::mem::take(&mut self.framebuffer);
                pack_rows(&mut self.video, &lent, width, height, pitch, bytes_per_pixel);
                self.framebuffer = lent;
                PresentedFrame::Framebuffer { width, height }
            }
        });
    }

    fn audio_sample(&mut self, left: i16, right: i16) {
        self.audio.extend_from_slice(&[left, right]);
    }

    fn audio_sample_batch(&mut self, samples: &[i16]) -> usize {
        let frames = samples.len() / 2;
        self.audio.extend_from_slice(&samples[..frames * 2]);
        frames
    }
}

/// Copies `height` rows of `width` pixels out of a pitched buffer.
fn pack_rows(
    out: &mut Vec<u8>,
    data: &[u8],
    width: u32,
    height: u32,
    pitch: usize,
    bytes_per_pixel: usize,
) {
    let row = width as usize * bytes_per_pixel;
    out.clear();
    for y in 0..height as usize {
        let start = y * pitch;
        let Some(line) = data.get(start..start + row) else {
            log::warn!("video frame shorter than {height} rows of pitch {pitch}");
            break;
        };
        out.extend_from_slice(line);
    }
}
