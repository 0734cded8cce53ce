//! Reference host: environment answers, option round trips, frame capture
//! and hardware context leases.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::too_many_lines
)]

mod common;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use env_logger as _;
use log as _;
use proptest::prelude::*;
use retro_contract::environment::{
    AudioCallback, FramebufferRequest, LogLevel, MessageExt, MessageTarget, RumbleEffect,
};
use retro_contract::{
    DeviceType, Environment, EnvironmentCall, EnvironmentCommand, FrameCallbacks,
    FramebufferAccess, GameGeometry, HwContextType, HwRenderError, HwRenderInterfaceKind,
    HwRenderRequest, JoypadButton, JoypadButtons, SerializationQuirks, Session, SessionConfig,
    SystemAvInfo, VideoFrame, JOYPAD_MASK,
};
use retro_frontend::{FrontendConfig, HostFrontend, InputTable, PresentedFrame};
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use tempfile as _;
use thiserror as _;

use common::{pattern_game, PatternCore, HEIGHT, WIDTH};

fn loaded(config: FrontendConfig) -> Session<PatternCore, HostFrontend> {
    let mut session = Session::new(
        PatternCore::default(),
        HostFrontend::new(config),
        SessionConfig::default(),
    )
    .expect("compatible core");
    session.init().expect("init");
    session.load_game(Some(&pattern_game())).expect("load");
    session
}

#[test]
fn option_changes_reach_the_core_on_the_next_frame() {
    let mut session = loaded(FrontendConfig::default());
    assert_eq!(session.core().palette.as_deref(), Some("mono"));
    assert_eq!(session.frontend().options().announced_count(), Some(1));

    session
        .frontend_mut()
        .set_option("pattern_palette", "color")
        .expect("known value");
    session.run().expect("frame");
    assert_eq!(session.core().palette.as_deref(), Some("color"));

    assert!(session
        .frontend_mut()
        .set_option("pattern_palette", "sepia")
        .is_err());
}

#[test]
fn legacy_hosts_receive_variables() {
    let session = loaded(FrontendConfig::minimal());
    let options = session.frontend().options();
    assert_eq!(options.announced_count(), Some(1));
    assert_eq!(options.get("pattern_palette"), Some("mono"));
}

#[test]
fn software_frames_and_audio_are_captured() {
    let mut session = loaded(FrontendConfig::default());
    session.run().expect("frame");
    session.run().expect("frame");

    let host = session.frontend();
    assert_eq!(
        host.last_frame(),
        Some(PresentedFrame::Software {
            width: WIDTH,
            height: HEIGHT
        })
    );
    assert_eq!(host.frames_presented(), 2);
    assert_eq!(host.video().len(), (WIDTH * HEIGHT * 2) as usize);
    // Two stereo frames per run.
    assert_eq!(host.audio().len(), 8);
    assert_eq!(host.input().polls(), 2);
}

#[test]
fn held_buttons_change_what_the_core_draws() {
    let mut idle = loaded(FrontendConfig::default());
    idle.run().expect("frame");

    let mut pressed = loaded(FrontendConfig::default());
    pressed
        .frontend_mut()
        .input_mut()
        .set_buttons(0, JoypadButton::Start.mask_bit());
    pressed.run().expect("frame");

    assert_ne!(idle.frontend().video(), pressed.frontend().video());
}

#[test]
fn directories_are_answered_only_when_configured() {
    let mut host = HostFrontend::new(FrontendConfig {
        system_directory: Some(PathBuf::from("/srv/retro/system")),
        username: Some(String::from("ada")),
        ..FrontendConfig::default()
    });
    let mut system = None;
    assert!(host.environment(EnvironmentCall::GetSystemDirectory(&mut system)));
    assert_eq!(system, Some(PathBuf::from("/srv/retro/system")));

    let mut saves = None;
    assert!(!host.environment(EnvironmentCall::GetSaveDirectory(&mut saves)));
    assert_eq!(saves, None);

    let mut user = None;
    assert!(host.environment(EnvironmentCall::GetUsername(&mut user)));
    assert_eq!(user.as_deref(), Some("ada"));
}

#[rstest]
#[case::full(SerializationQuirks::all(), SerializationQuirks::INCOMPLETE | SerializationQuirks::FRONT_VARIABLE_SIZE)]
#[case::none(SerializationQuirks::empty(), SerializationQuirks::empty())]
fn quirks_are_negotiated_against_the_config(
    #[case] supported: SerializationQuirks,
    #[case] expected: SerializationQuirks,
) {
    let mut host = HostFrontend::new(FrontendConfig {
        supported_quirks: supported,
        ..FrontendConfig::default()
    });
    let mut quirks = SerializationQuirks::INCOMPLETE;
    assert!(host.environment(EnvironmentCall::SetSerializationQuirks(&mut quirks)));
    assert_eq!(quirks, expected);
}

#[test]
fn messages_follow_their_target() {
    let mut host = HostFrontend::default();
    let mut log_only = MessageExt::notification("saved to slot 1", 2_000);
    log_only.target = MessageTarget::Log;
    let shown = MessageExt::notification("disc 2 inserted", 2_000);

    assert!(host.environment(EnvironmentCall::SetMessageExt(&log_only)));
    assert!(host.environment(EnvironmentCall::SetMessageExt(&shown)));
    assert_eq!(host.messages(), ["disc 2 inserted"]);
}

#[test]
fn service_interfaces_record_what_the_core_does() {
    let mut host = HostFrontend::default();

    let mut rumble = None;
    assert!(host.environment(EnvironmentCall::GetRumbleInterface(&mut rumble)));
    let rumble = rumble.expect("rumble interface");
    assert!(rumble.set_rumble_state(1, RumbleEffect::Weak, 0x8000));
    assert_eq!(host.rumble().strength(1, RumbleEffect::Weak), 0x8000);
    assert_eq!(host.rumble().strength(1, RumbleEffect::Strong), 0);

    let mut leds = None;
    assert!(host.environment(EnvironmentCall::GetLedInterface(&mut leds)));
    leds.expect("led interface").set_led_state(2, 1);
    assert_eq!(host.leds().state(2), 1);

    let mut log = None;
    assert!(host.environment(EnvironmentCall::GetLogInterface(&mut log)));
    log.expect("log interface")
        .log(LogLevel::Error, "bios checksum mismatch\n");
    assert_eq!(host.log().count(LogLevel::Error), 1);

    let mut perf = None;
    assert!(host.environment(EnvironmentCall::GetPerfInterface(&mut perf)));
    let perf = perf.expect("perf interface");
    assert!(perf.time_usec() > 0);

    let mut sensors = None;
    assert!(!host.environment(EnvironmentCall::GetSensorInterface(&mut sensors)));
    assert!(sensors.is_none());
}

#[test]
fn shutdown_requests_latch() {
    let mut host = HostFrontend::default();
    assert!(!host.shutdown_requested());
    assert!(host.environment(EnvironmentCall::Shutdown));
    assert!(host.shutdown_requested());
}

#[test]
fn declined_commands_never_reach_the_dispatch() {
    let mut host = HostFrontend::default();
    host.decline(EnvironmentCommand::SetMessageExt);
    let message = MessageExt::notification("hidden", 1_000);
    assert!(!host.environment(EnvironmentCall::SetMessageExt(&message)));
    assert!(host.messages().is_empty());
}

fn lend(host: &mut HostFrontend, width: u32, height: u32, fill: u8) -> bool {
    let mut render = |buffer: &mut retro_contract::SoftwareFramebuffer<'_>| {
        assert_eq!(buffer.pitch, width as usize * 2);
        buffer.data.fill(fill);
    };
    host.environment(EnvironmentCall::GetCurrentSoftwareFramebuffer(
        FramebufferRequest {
            width,
            height,
            access: FramebufferAccess::WRITE,
            render: &mut render,
        },
    ))
}

#[test]
fn lent_framebuffers_are_presented_and_bounded_by_geometry() {
    let mut host = HostFrontend::default();
    host.set_av_info(SystemAvInfo {
        geometry: GameGeometry {
            base_width: 4,
            base_height: 2,
            max_width: 8,
            max_height: 4,
            aspect_ratio: 0.0,
        },
        ..SystemAvInfo::default()
    });

    assert!(!lend(&mut host, 16, 4, 0xAA));
    assert!(lend(&mut host, 4, 2, 0x5A));
    host.video_refresh(&VideoFrame::Framebuffer {
        width: 4,
        height: 2,
        pitch: 8,
    });
    assert_eq!(
        host.last_frame(),
        Some(PresentedFrame::Framebuffer {
            width: 4,
            height: 2
        })
    );
    assert_eq!(host.video(), [0x5A; 16]);
}

#[test]
fn geometry_updates_need_announced_timing() {
    let mut host = HostFrontend::default();
    let geometry = GameGeometry {
        base_width: 320,
        base_height: 240,
        max_width: 320,
        max_height: 240,
        aspect_ratio: 4.0 / 3.0,
    };
    assert!(!host.environment(EnvironmentCall::SetGeometry(&geometry)));
    host.set_av_info(SystemAvInfo {
        geometry: GameGeometry {
            base_width: 256,
            base_height: 224,
            max_width: 640,
            max_height: 480,
            aspect_ratio: 0.0,
        },
        ..SystemAvInfo::default()
    });
    assert!(host.environment(EnvironmentCall::SetGeometry(&geometry)));
    assert_eq!(
        host.registrations().av_info.map(|info| info.geometry),
        Some(GameGeometry {
            max_width: 640,
            max_height: 480,
            ..geometry
        })
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioEvent {
    Enabled,
    Buffer,
    Disabled,
}

#[derive(Default)]
struct ThreadedAudio {
    events: Mutex<Vec<(ThreadId, AudioEvent)>>,
}

impl ThreadedAudio {
    fn push(&self, event: AudioEvent) {
        self.events
            .lock()
            .expect("events")
            .push((thread::current().id(), event));
    }
}

impl AudioCallback for ThreadedAudio {
    fn callback(&self) {
        self.push(AudioEvent::Buffer);
    }

    fn set_state(&self, enabled: bool) {
        self.push(if enabled {
            AudioEvent::Enabled
        } else {
            AudioEvent::Disabled
        });
    }
}

#[test]
fn audio_callbacks_run_on_their_own_thread() {
    let mut host = HostFrontend::default();
    assert!(!host.drive_audio_callback(2));

    let audio = Arc::new(ThreadedAudio::default());
    let registered: Arc<dyn AudioCallback> = Arc::clone(&audio) as Arc<dyn AudioCallback>;
    assert!(host.environment(EnvironmentCall::SetAudioCallback(registered)));
    assert!(host.drive_audio_callback(3));

    let events = audio.events.lock().expect("events").clone();
    assert_eq!(
        events.iter().map(|(_, event)| *event).collect::<Vec<_>>(),
        vec![
            AudioEvent::Enabled,
            AudioEvent::Buffer,
            AudioEvent::Buffer,
            AudioEvent::Buffer,
            AudioEvent::Disabled,
        ]
    );
    let caller = thread::current().id();
    assert!(events.iter().all(|(id, _)| *id != caller));
}

#[test]
fn vulkan_interfaces_follow_the_context_lifetime() {
    let mut host = HostFrontend::new(FrontendConfig {
        preferred_hw_render: HwContextType::Vulkan,
        ..FrontendConfig::default()
    });
    let request = HwRenderRequest {
        context_type: HwContextType::Vulkan,
        version_major: 1,
        version_minor: 3,
        ..HwRenderRequest::default()
    };
    assert!(host.environment(EnvironmentCall::SetHwRender(&request)));

    let mut interface = None;
    assert!(!host.environment(EnvironmentCall::GetHwRenderInterface(&mut interface)));

    let first = host.reset_hw_context();
    assert!(host.environment(EnvironmentCall::GetHwRenderInterface(&mut interface)));
    let issued = interface.expect("vulkan interface");
    assert_eq!(issued.kind, HwRenderInterfaceKind::Vulkan);
    assert_eq!(issued.lease, first);

    let second = host.reset_hw_context();
    assert!(matches!(
        host.hw_context().check_lease(issued.lease),
        Err(HwRenderError::StaleInterface { .. })
    ));
    assert_eq!(host.hw_context().check_lease(second), Ok(()));

    host.destroy_hw_context();
    assert_eq!(
        host.hw_context().check_lease(second),
        Err(HwRenderError::NoContext)
    );
}

#[test]
fn hardware_requests_outside_the_preferred_api_are_refused() {
    let mut host = HostFrontend::default();
    let request = HwRenderRequest {
        context_type: HwContextType::OpenGlCore,
        version_major: 3,
        version_minor: 3,
        ..HwRenderRequest::default()
    };
    assert!(!host.environment(EnvironmentCall::SetHwRender(&request)));

    let mut preferred = HwContextType::Vulkan;
    assert!(!host.environment(EnvironmentCall::GetPreferredHwRender(&mut preferred)));
    assert_eq!(preferred, HwContextType::None);
}

#[test]
fn batches_keep_whole_stereo_frames() {
    let mut host = HostFrontend::default();
    assert_eq!(host.audio_sample_batch(&[1, 2, 3, 4, 5]), 2);
    host.audio_sample(6, 7);
    assert_eq!(host.drain_audio(), [1, 2, 3, 4, 6, 7]);
    assert!(host.audio().is_empty());
}

proptest! {
    #[test]
    fn joypad_mask_matches_individual_reads(bits in any::<u16>()) {
        let mut table = InputTable::new(1);
        table.set_buttons(0, JoypadButtons::from_bits_truncate(bits));
        let mask = table.state(0, DeviceType::JOYPAD, 0, JOYPAD_MASK) as u16;
        let individual = JoypadButton::ALL
            .iter()
            .filter(|button| table.state(0, DeviceType::JOYPAD, 0, button.id()) != 0)
            .fold(0u16, |acc, button| acc | (1 << button.id()));
        prop_assert_eq!(mask, individual);
    }
}
