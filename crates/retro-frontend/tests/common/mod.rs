//! Test-pattern core shared by the integration suites.

#![allow(dead_code)]

use retro_contract::{
    Core, CoreOptionDefinition, CoreOptionValue, DiskControl, DiskImage, DiskImageList,
    EnvironmentClient, FrameContext, GameGeometry, GameInfo, PixelFormat, SystemAvInfo,
    SystemInfo, SystemTiming, VideoFrame,
};

pub const WIDTH: u32 = 4;
pub const HEIGHT: u32 = 2;
const PITCH: usize = WIDTH as usize * 2;

/// Contract rules the core breaks on purpose.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub api_version: Option<u32>,
    pub skip_poll: bool,
    pub grow_state: bool,
    pub ignore_unserialize: bool,
    pub pixel_format_in_frame: bool,
}

/// Renders a counter-derived pattern and a short audio burst each frame.
pub struct PatternCore {
    pub faults: Faults,
    pub no_game: bool,
    pub disks: Option<Box<dyn DiskControl>>,
    pub palette: Option<String>,
    pub frame: u64,
    pub pixels: Vec<u8>,
    pub extra_state: usize,
}

impl Default for PatternCore {
    fn default() -> Self {
        Self {
            faults: Faults::default(),
            no_game: false,
            disks: None,
            palette: None,
            frame: 0,
            pixels: vec![0; PITCH * HEIGHT as usize],
            extra_state: 0,
        }
    }
}

impl PatternCore {
    pub fn with_faults(faults: Faults) -> Self {
        Self {
            faults,
            ..Self::default()
        }
    }

    pub fn with_disks(paths: &[&str]) -> Self {
        let mut list = DiskImageList::new();
        list.load(paths.iter().map(|path| DiskImage::from_path(*path)));
        Self {
            disks: Some(Box::new(list)),
            ..Self::default()
        }
    }

    pub fn with_loose_tray(images: u32) -> Self {
        Self {
            disks: Some(Box::new(LooseTray {
                images,
                index: 0,
                ejected: false,
            })),
            ..Self::default()
        }
    }

    pub const fn frames_run(&self) -> u64 {
        self.frame
    }
}

pub fn palette_option() -> CoreOptionDefinition {
    CoreOptionDefinition {
        key: String::from("pattern_palette"),
        desc: String::from("Palette"),
        info: None,
        values: vec![CoreOptionValue::new("mono"), CoreOptionValue::new("color")],
        default_value: None,
    }
}

pub fn pattern_game() -> GameInfo {
    GameInfo::from_data(vec![0x50, 0x41, 0x54])
}

impl Core for PatternCore {
    fn api_version(&self) -> u32 {
        self.faults
            .api_version
            .unwrap_or(retro_contract::API_VERSION)
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            library_name: String::from("Pattern"),
            library_version: String::from("1.0"),
            valid_extensions: String::from("pat"),
            need_fullpath: false,
            block_extract: false,
        }
    }

    fn set_environment(&mut self, env: &mut EnvironmentClient<'_>) {
        if self.no_game {
            env.set_support_no_game(true);
        }
        env.announce_options(&[palette_option()]);
    }

    fn init(&mut self, env: &mut EnvironmentClient<'_>) {
        if !self.faults.pixel_format_in_frame {
            env.set_pixel_format(PixelFormat::Rgb565);
        }
    }

    fn deinit(&mut self) {}

    fn load_game(&mut self, _game: Option<&GameInfo>, env: &mut EnvironmentClient<'_>) -> bool {
        self.palette = env.variable("pattern_palette");
        if self.disks.is_some() {
            env.register_disk_control();
        }
        true
    }

    fn unload_game(&mut self, _env: &mut EnvironmentClient<'_>) {}

    fn system_av_info(&self) -> SystemAvInfo {
        SystemAvInfo {
            geometry: GameGeometry {
                base_width: WIDTH,
                base_height: HEIGHT,
                max_width: WIDTH,
                max_height: HEIGHT,
                aspect_ratio: 2.0,
            },
            timing: SystemTiming {
                fps: 60.0,
                sample_rate: 48_000.0,
            },
        }
    }

    fn reset(&mut self, _env: &mut EnvironmentClient<'_>) {
        self.frame = 0;
    }

    fn run(&mut self, frame: &mut FrameContext<'_>) {
        if self.faults.pixel_format_in_frame {
            frame.environment().set_pixel_format(PixelFormat::Rgb565);
        }
        let buttons = if self.faults.skip_poll {
            0
        } else {
            frame.poll_input();
            frame.joypad_buttons(0).bits()
        };
        if frame.environment().variable_updated() {
            self.palette = frame.environment().variable("pattern_palette");
        }
        self.frame += 1;
        let seed = (self.frame as u8).wrapping_add(buttons as u8);
        for (offset, byte) in self.pixels.iter_mut().enumerate() {
            *byte = seed.wrapping_mul(31).wrapping_add(offset as u8);
        }
        frame.video_refresh(VideoFrame::Software {
            data: &self.pixels,
            width: WIDTH,
            height: HEIGHT,
            pitch: PITCH,
        });
        let level = (self.frame % 64) as i16 * 100;
        frame.audio_sample_batch(&[level, -level, level, -level]);
        if self.faults.grow_state {
            self.extra_state += 8;
        }
    }

    fn serialize_size(&self) -> usize {
        8 + self.extra_state
    }

    fn serialize(&mut self, buffer: &mut [u8]) -> bool {
        buffer[..8].copy_from_slice(&self.frame.to_le_bytes());
        true
    }

    fn unserialize(&mut self, buffer: &[u8]) -> bool {
        if self.faults.ignore_unserialize {
            return true;
        }
        let Some(bytes) = buffer.get(..8) else {
            return false;
        };
        let mut counter = [0; 8];
        counter.copy_from_slice(bytes);
        self.frame = u64::from_le_bytes(counter);
        true
    }

    fn disk_control(&mut self) -> Option<&mut dyn DiskControl> {
        let disks: &mut dyn DiskControl = self.disks.as_deref_mut()?;
        Some(disks)
    }
}

/// Disk drive that swaps images whether or not the tray is open.
struct LooseTray {
    images: u32,
    index: u32,
    ejected: bool,
}

impl DiskControl for LooseTray {
    fn set_eject_state(&mut self, ejected: bool) -> bool {
        self.ejected = ejected;
        true
    }

    fn eject_state(&self) -> bool {
        self.ejected
    }

    fn image_index(&self) -> u32 {
        self.index
    }

    fn set_image_index(&mut self, index: u32) -> bool {
        self.index = index;
        true
    }

    fn num_images(&self) -> u32 {
        self.images
    }

    fn replace_image_index(&mut self, _index: u32, _info: Option<&GameInfo>) -> bool {
        false
    }

    fn add_image_index(&mut self) -> bool {
        self.images += 1;
        true
    }
}
