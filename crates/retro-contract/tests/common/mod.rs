//! Scripted core and recording frontend shared by the integration suites.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use retro_contract::environment::{CoreOptionsVersion, MessageInterfaceVersion};
use retro_contract::{
    Core, DeviceType, DiskControl, DiskControlVersion, DiskImage, DiskImageList, Environment,
    EnvironmentCall, EnvironmentClient, EnvironmentCommand, FrameCallbacks, FrameContext,
    GameGeometry, GameInfo, JoypadButtons, KeyboardEvent, MemoryType, OptionStore,
    SerializationQuirks, SystemAvInfo, SystemInfo, SystemTiming, VideoFrame, JOYPAD_MASK,
};

pub type EnvScript = Box<dyn FnMut(&mut EnvironmentClient<'_>)>;
pub type FrameScript = Box<dyn FnMut(&mut FrameContext<'_>)>;

pub const WIDTH: u32 = 256;
pub const HEIGHT: u32 = 224;

pub fn snes_av_info() -> SystemAvInfo {
    SystemAvInfo {
        geometry: GameGeometry {
            base_width: WIDTH,
            base_height: HEIGHT,
            max_width: 512,
            max_height: 478,
            aspect_ratio: 4.0 / 3.0,
        },
        timing: SystemTiming {
            fps: 60.098_8,
            sample_rate: 32_040.5,
        },
    }
}

/// Polls once and presents one software frame.
pub fn well_behaved_frame() -> FrameScript {
    let pixels = vec![0u8; (WIDTH * HEIGHT * 2) as usize];
    Box::new(move |frame| {
        frame.poll_input();
        frame.video_refresh(VideoFrame::Software {
            data: &pixels,
            width: WIDTH,
            height: HEIGHT,
            pitch: WIDTH as usize * 2,
        });
    })
}

/// Core whose environment traffic and frame body are supplied by the test.
pub struct ScriptedCore {
    pub api_version: u32,
    pub on_set_environment: Option<EnvScript>,
    pub on_init: Option<EnvScript>,
    pub on_load: Option<EnvScript>,
    pub on_reset: Option<EnvScript>,
    pub on_frame: FrameScript,
    pub av_info: SystemAvInfo,
    pub load_result: bool,
    pub calls: Vec<&'static str>,
    pub state: Vec<u8>,
    pub state_size: Rc<Cell<usize>>,
    pub serialize_result: bool,
    pub unserialize_result: bool,
    pub frame_times: Vec<i64>,
    pub keys: Vec<KeyboardEvent>,
    pub ports: Vec<(u32, DeviceType)>,
    pub cheats: Vec<(u32, bool, String)>,
    pub save_ram: Vec<u8>,
    pub disks: Option<DiskImageList>,
    pub loaded: Vec<GameInfo>,
}

impl Default for ScriptedCore {
    fn default() -> Self {
        Self {
            api_version: retro_contract::API_VERSION,
            on_set_environment: None,
            on_init: None,
            on_load: None,
            on_reset: None,
            on_frame: well_behaved_frame(),
            av_info: snes_av_info(),
            load_result: true,
            calls: Vec::new(),
            state: vec![0; 16],
            state_size: Rc::new(Cell::new(16)),
            serialize_result: true,
            unserialize_result: true,
            frame_times: Vec::new(),
            keys: Vec::new(),
            ports: Vec::new(),
            cheats: Vec::new(),
            save_ram: vec![0; 0x2000],
            disks: None,
            loaded: Vec::new(),
        }
    }
}

impl ScriptedCore {
    pub fn with_set_environment(
        mut self,
        script: impl FnMut(&mut EnvironmentClient<'_>) + 'static,
    ) -> Self {
        self.on_set_environment = Some(Box::new(script));
        self
    }

    pub fn with_init(mut self, script: impl FnMut(&mut EnvironmentClient<'_>) + 'static) -> Self {
        self.on_init = Some(Box::new(script));
        self
    }

    pub fn with_load(mut self, script: impl FnMut(&mut EnvironmentClient<'_>) + 'static) -> Self {
        self.on_load = Some(Box::new(script));
        self
    }

    pub fn with_frame(mut self, script: impl FnMut(&mut FrameContext<'_>) + 'static) -> Self {
        self.on_frame = Box::new(script);
        self
    }

    pub fn with_disks(mut self, paths: &[&str]) -> Self {
        let mut list = DiskImageList::new();
        list.load(paths.iter().map(|path| DiskImage::from_path(*path)));
        self.disks = Some(list);
        self
    }
}

impl Core for ScriptedCore {
    fn api_version(&self) -> u32 {
        self.api_version
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            library_name: "scripted".to_owned(),
            library_version: "1.0".to_owned(),
            valid_extensions: "sfc|smc".to_owned(),
            need_fullpath: false,
            block_extract: false,
        }
    }

    fn set_environment(&mut self, env: &mut EnvironmentClient<'_>) {
        self.calls.push("set_environment");
        if let Some(script) = &mut self.on_set_environment {
            script(env);
        }
    }

    fn init(&mut self, env: &mut EnvironmentClient<'_>) {
        self.calls.push("init");
        if let Some(script) = &mut self.on_init {
            script(env);
        }
    }

    fn deinit(&mut self) {
        self.calls.push("deinit");
    }

    fn load_game(&mut self, game: Option<&GameInfo>, env: &mut EnvironmentClient<'_>) -> bool {
        self.calls.push("load_game");
        if let Some(game) = game {
            self.loaded.push(game.clone());
        }
        if let Some(script) = &mut self.on_load {
            script(env);
        }
        self.load_result
    }

    fn load_game_special(
        &mut self,
        _game_type: u32,
        games: &[GameInfo],
        env: &mut EnvironmentClient<'_>,
    ) -> bool {
        self.calls.push("load_game_special");
        self.loaded.extend_from_slice(games);
        if let Some(script) = &mut self.on_load {
            script(env);
        }
        self.load_result
    }

    fn unload_game(&mut self, _env: &mut EnvironmentClient<'_>) {
        self.calls.push("unload_game");
        self.loaded.clear();
    }

    fn system_av_info(&self) -> SystemAvInfo {
        self.av_info
    }

    fn set_controller_port_device(
        &mut self,
        port: u32,
        device: DeviceType,
        _env: &mut EnvironmentClient<'_>,
    ) {
        self.ports.push((port, device));
    }

    fn reset(&mut self, env: &mut EnvironmentClient<'_>) {
        self.calls.push("reset");
        if let Some(script) = &mut self.on_reset {
            script(env);
        }
    }

    fn run(&mut self, frame: &mut FrameContext<'_>) {
        self.calls.push("run");
        (self.on_frame)(frame);
    }

    fn serialize_size(&self) -> usize {
        self.state_size.get()
    }

    fn serialize(&mut self, buffer: &mut [u8]) -> bool {
        self.calls.push("serialize");
        if !self.serialize_result {
            return false;
        }
        let len = self.state.len().min(buffer.len());
        buffer[..len].copy_from_slice(&self.state[..len]);
        true
    }

    fn unserialize(&mut self, buffer: &[u8]) -> bool {
        self.calls.push("unserialize");
        if !self.unserialize_result {
            return false;
        }
        self.state = buffer.to_vec();
        true
    }

    fn cheat_reset(&mut self) {
        self.cheats.clear();
    }

    fn cheat_set(&mut self, index: u32, enabled: bool, code: &str) {
        self.cheats.push((index, enabled, code.to_owned()));
    }

    fn memory(&mut self, id: MemoryType) -> Option<&mut [u8]> {
        (id == MemoryType::SAVE_RAM).then_some(self.save_ram.as_mut_slice())
    }

    fn keyboard_event(&mut self, event: KeyboardEvent) {
        self.keys.push(event);
    }

    fn frame_time(&mut self, usec: i64) {
        self.frame_times.push(usec);
    }

    fn disk_control(&mut self) -> Option<&mut dyn DiskControl> {
        self.disks
            .as_mut()
            .map(|disks| disks as &mut dyn DiskControl)
    }
}

/// Kind of a presented frame, without its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    Software(u32, u32),
    Duplicate,
    Hardware,
    Framebuffer,
}

/// Frontend that answers from plain fields and records what it saw.
pub struct RecordingFrontend {
    pub seen: Vec<EnvironmentCommand>,
    pub declined: Vec<EnvironmentCommand>,
    pub can_dupe: bool,
    pub input_bitmasks: bool,
    pub buttons: [JoypadButtons; 2],
    pub input_queries: Vec<(u32, DeviceType, u32, u32)>,
    pub polls: u32,
    pub presented: Vec<Presented>,
    pub samples: usize,
    pub batches: usize,
    pub options: OptionStore,
    pub values: HashMap<String, String>,
    pub options_version: CoreOptionsVersion,
    pub message_version: MessageInterfaceVersion,
    pub disk_version: DiskControlVersion,
    pub supported_quirks: SerializationQuirks,
    pub messages: Vec<String>,
    pub framebuffer: Vec<u8>,
    pub shutdown: bool,
}

impl Default for RecordingFrontend {
    fn default() -> Self {
        Self {
            seen: Vec::new(),
            declined: Vec::new(),
            can_dupe: true,
            input_bitmasks: true,
            buttons: [JoypadButtons::empty(); 2],
            input_queries: Vec::new(),
            polls: 0,
            presented: Vec::new(),
            samples: 0,
            batches: 0,
            options: OptionStore::new(),
            values: HashMap::new(),
            options_version: CoreOptionsVersion::V1,
            message_version: MessageInterfaceVersion::V1,
            disk_version: DiskControlVersion::V1,
            supported_quirks: SerializationQuirks::all(),
            messages: Vec::new(),
            framebuffer: vec![0; (512 * 478 * 2) as usize],
            shutdown: false,
        }
    }
}

impl RecordingFrontend {
    pub fn declining(mut self, command: EnvironmentCommand) -> Self {
        self.declined.push(command);
        self
    }

    pub fn saw(&self, command: EnvironmentCommand) -> bool {
        self.seen.contains(&command)
    }
}

impl Environment for RecordingFrontend {
    fn environment(&mut self, call: EnvironmentCall<'_>) -> bool {
        let command = call.command();
        self.seen.push(command);
        if self.declined.contains(&command) {
            return false;
        }
        match call {
            EnvironmentCall::GetCanDupe(slot) => {
                *slot = self.can_dupe;
                true
            }
            EnvironmentCall::GetInputBitmasks => self.input_bitmasks,
            EnvironmentCall::GetCoreOptionsVersion(slot) => {
                *slot = self.options_version;
                true
            }
            EnvironmentCall::GetMessageInterfaceVersion(slot) => {
                *slot = self.message_version;
                true
            }
            EnvironmentCall::GetDiskControlInterfaceVersion(slot) => {
                *slot = self.disk_version;
                true
            }
            EnvironmentCall::SetSerializationQuirks(slot) => {
                *slot = slot.negotiate(self.supported_quirks);
                true
            }
            EnvironmentCall::SetCoreOptions(definitions) => {
                self.options.announce(definitions).is_ok()
            }
            EnvironmentCall::SetCoreOptionsIntl(intl) => {
                self.options.announce(&intl.resolve()).is_ok()
            }
            EnvironmentCall::SetVariables(variables) => {
                self.options.announce_legacy(variables).is_ok()
            }
            EnvironmentCall::SetCoreOptionsDisplay(display) => {
                self.options.set_visible(display);
                true
            }
            EnvironmentCall::GetVariable(variable) => {
                variable.value = self
                    .values
                    .get(&variable.key)
                    .cloned()
                    .or_else(|| self.options.get(&variable.key).map(str::to_owned));
                variable.value.is_some()
            }
            EnvironmentCall::GetVariableUpdate(slot) => {
                *slot = self.options.take_update();
                true
            }
            EnvironmentCall::SetMessage(message) => {
                self.messages.push(message.msg.clone());
                true
            }
            EnvironmentCall::SetMessageExt(message) => {
                self.messages.push(message.msg.clone());
                true
            }
            EnvironmentCall::Shutdown => {
                self.shutdown = true;
                true
            }
            EnvironmentCall::GetCurrentSoftwareFramebuffer(request) => {
                let pitch = request.width as usize * 2;
                let len = pitch * request.height as usize;
                if len > self.framebuffer.len() {
                    return false;
                }
                let mut buffer = retro_contract::SoftwareFramebuffer {
                    data: &mut self.framebuffer[..len],
                    width: request.width,
                    height: request.height,
                    pitch,
                    format: retro_contract::PixelFormat::Rgb565,
                    access: request.access,
                };
                (request.render)(&mut buffer);
                true
            }
            EnvironmentCall::SetSupportNoGame(_)
            | EnvironmentCall::SetSupportAchievements(_)
            | EnvironmentCall::SetSubsystemInfo(_)
            | EnvironmentCall::SetControllerInfo(_)
            | EnvironmentCall::SetProcAddressCallback
            | EnvironmentCall::SetKeyboardCallback
            | EnvironmentCall::SetDiskControlInterface
            | EnvironmentCall::SetDiskControlExtInterface
            | EnvironmentCall::SetFrameTimeCallback { .. }
            | EnvironmentCall::SetAudioCallback(_)
            | EnvironmentCall::SetPixelFormat(_)
            | EnvironmentCall::SetHwRender(_)
            | EnvironmentCall::SetMemoryMaps(_)
            | EnvironmentCall::SetSystemAvInfo(_)
            | EnvironmentCall::SetGeometry(_)
            | EnvironmentCall::SetInputDescriptors(_)
            | EnvironmentCall::SetRotation(_)
            | EnvironmentCall::SetPerformanceLevel(_) => true,
            _ => false,
        }
    }
}

impl FrameCallbacks for RecordingFrontend {
    fn input_poll(&mut self) {
        self.polls += 1;
    }

    fn input_state(&mut self, port: u32, device: DeviceType, index: u32, id: u32) -> i16 {
        self.input_queries.push((port, device, index, id));
        let Some(buttons) = self.buttons.get(port as usize) else {
            return 0;
        };
        if device != DeviceType::JOYPAD {
            return 0;
        }
        if id == JOYPAD_MASK {
            return buttons.bits() as i16;
        }
        i16::from(id < 16 && buttons.bits() & (1 << id) != 0)
    }

    fn video_refresh(&mut self, frame: &VideoFrame<'_>) {
        self.presented.push(match frame {
            VideoFrame::Software { width, height, .. } => Presented::Software(*width, *height),
            VideoFrame::Duplicate { .. } => Presented::Duplicate,
            VideoFrame::Hardware { .. } => Presented::Hardware,
            VideoFrame::Framebuffer { .. } => Presented::Framebuffer,
        });
    }

    fn audio_sample(&mut self, _left: i16, _right: i16) {
        self.samples += 1;
    }

    fn audio_sample_batch(&mut self, samples: &[i16]) -> usize {
        self.batches += 1;
        samples.len() / 2
    }
}
