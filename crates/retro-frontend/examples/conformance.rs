//! Runs the conformance checks against a built-in color-bar core.
//!
//! The host is described by an optional JSON config; content is optional
//! because the core supports starting without a game.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use log as _;
use proptest as _;
use retro_contract::{
    Core, EnvironmentClient, FrameContext, GameGeometry, GameInfo, PixelFormat, SystemAvInfo,
    SystemInfo, SystemTiming, VideoFrame,
};
use retro_frontend::{run_conformance, FrontendConfig};
use rstest as _;
use serde as _;
use tempfile as _;
use thiserror as _;

const USAGE_TEXT: &str = "\
Usage: conformance [options] [content]

Options:
  -c, --config <file>  Host config as JSON (default: built-in host)
  -f, --frames <n>     Frames to run per check (default: 60)
  -h, --help           Show this help message

Examples:
  conformance
  conformance --frames 600 --config host.json roms/bars.bin
";

const DEFAULT_FRAMES: u32 = 60;

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    frames: u32,
    content: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Run(Args),
    Help,
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut config = None;
    let mut frames = DEFAULT_FRAMES;
    let mut content = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "--config" || arg == "-c" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --config".to_string())?;
            config = Some(PathBuf::from(value));
            continue;
        }

        if arg == "--frames" || arg == "-f" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --frames".to_string())?;
            let text = value.to_string_lossy();
            frames = text
                .parse()
                .map_err(|_| format!("invalid frame count: {text}"))?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if content.is_some() {
            return Err("multiple content paths provided".to_string());
        }
        content = Some(PathBuf::from(arg));
    }

    Ok(ParseResult::Run(Args {
        config,
        frames,
        content,
    }))
}

fn load_config(path: Option<&PathBuf>) -> Result<FrontendConfig, String> {
    let Some(path) = path else {
        return Ok(FrontendConfig::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|error| format!("failed to read {}: {error}", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|error| format!("invalid config {}: {error}", path.display()))
}

fn load_content(path: Option<&PathBuf>) -> Result<Option<GameInfo>, String> {
    let Some(path) = path else {
        return Ok(None);
    };
    let data =
        fs::read(path).map_err(|error| format!("failed to read {}: {error}", path.display()))?;
    Ok(Some(GameInfo {
        path: Some(path.clone()),
        data: Some(data),
        meta: None,
    }))
}

fn run(args: &Args) -> Result<bool, String> {
    let config = load_config(args.config.as_ref())?;
    let content = load_content(args.content.as_ref())?;
    let report = run_conformance(ColorBars::default, &config, content.as_ref(), args.frames)
        .map_err(|error| format!("invalid config: {error}"))?;
    println!("{report}");
    Ok(report.all_passed())
}

fn main() -> ExitCode {
    env_logger::init();

    let parsed = match parse_args(env::args_os().skip(1)) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("error: {message}\n\n{USAGE_TEXT}");
            return ExitCode::from(2);
        }
    };

    let args = match parsed {
        ParseResult::Help => {
            print!("{USAGE_TEXT}");
            return ExitCode::SUCCESS;
        }
        ParseResult::Run(args) => args,
    };

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::from(2)
        }
    }
}

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const BARS: [u16; 8] = [
    0xFFFF, 0xFFE0, 0x07FF, 0x07E0, 0xF81F, 0xF800, 0x001F, 0x0000,
];

/// Scrolling RGB565 color bars with a quiet tone.
struct ColorBars {
    frame: u64,
    pixels: Vec<u8>,
}

impl Default for ColorBars {
    fn default() -> Self {
        Self {
            frame: 0,
            pixels: vec![0; (WIDTH * HEIGHT * 2) as usize],
        }
    }
}

impl Core for ColorBars {
    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            library_name: String::from("Color Bars"),
            library_version: String::from("0.1.0"),
            valid_extensions: String::from("bin"),
            need_fullpath: false,
            block_extract: false,
        }
    }

    fn set_environment(&mut self, env: &mut EnvironmentClient<'_>) {
        env.set_support_no_game(true);
    }

    fn init(&mut self, env: &mut EnvironmentClient<'_>) {
        env.set_pixel_format(PixelFormat::Rgb565);
    }

    fn deinit(&mut self) {}

    fn load_game(&mut self, _game: Option<&GameInfo>, _env: &mut EnvironmentClient<'_>) -> bool {
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
                aspect_ratio: 4.0 / 3.0,
            },
            timing: SystemTiming {
                fps: 60.0,
                sample_rate: 44_100.0,
            },
        }
    }

    fn reset(&mut self, _env: &mut EnvironmentClient<'_>) {
        self.frame = 0;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn run(&mut self, frame: &mut FrameContext<'_>) {
        frame.poll_input();
        let shift = frame.joypad_buttons(0).bits().count_ones() as usize;
        self.frame += 1;

        let bar_width = (WIDTH / BARS.len() as u32) as usize;
        let scroll = self.frame as usize + shift;
        for (index, pixel) in self.pixels.chunks_exact_mut(2).enumerate() {
            let column = (index % WIDTH as usize + scroll) % WIDTH as usize;
            pixel.copy_from_slice(&BARS[column / bar_width].to_le_bytes());
        }
        frame.video_refresh(VideoFrame::Software {
            data: &self.pixels,
            width: WIDTH,
            height: HEIGHT,
            pitch: WIDTH as usize * 2,
        });

        let level = if self.frame & 1 == 0 { 64 } else { -64 };
        frame.audio_sample_batch(&[level; 1470]);
    }

    fn serialize_size(&self) -> usize {
        8
    }

    fn serialize(&mut self, buffer: &mut [u8]) -> bool {
        let Some(slot) = buffer.get_mut(..8) else {
            return false;
        };
        slot.copy_from_slice(&self.frame.to_le_bytes());
        true
    }

    fn unserialize(&mut self, buffer: &[u8]) -> bool {
        let Some(bytes) = buffer.get(..8) else {
            return false;
        };
        let mut counter = [0; 8];
        counter.copy_from_slice(bytes);
        self.frame = u64::from_le_bytes(counter);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_args, ParseResult, DEFAULT_FRAMES};
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn args(list: &[&str]) -> impl Iterator<Item = OsString> + '_ {
        list.iter().map(OsString::from)
    }

    #[test]
    fn parses_options_and_content() {
        let Ok(ParseResult::Run(parsed)) =
            parse_args(args(&["-f", "10", "--config", "host.json", "bars.bin"]))
        else {
            panic!("expected run arguments");
        };
        assert_eq!(parsed.frames, 10);
        assert_eq!(parsed.config, Some(PathBuf::from("host.json")));
        assert_eq!(parsed.content, Some(PathBuf::from("bars.bin")));
    }

    #[test]
    fn defaults_apply_without_arguments() {
        let Ok(ParseResult::Run(parsed)) = parse_args(args(&[])) else {
            panic!("expected run arguments");
        };
        assert_eq!(parsed.frames, DEFAULT_FRAMES);
        assert!(parsed.config.is_none());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(args(&["--frames", "many"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["a.bin", "b.bin"])).is_err());
        assert!(matches!(parse_args(args(&["-h"])), Ok(ParseResult::Help)));
    }
}
