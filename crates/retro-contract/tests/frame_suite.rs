//! Frame loop: per-frame audit, video and audio rules, input reads and the
//! frame-time hook.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::too_many_lines
)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use bitflags as _;
use env_logger as _;
use log as _;
use proptest::prelude::*;
use retro_contract::environment::CallPhase;
use retro_contract::{
    AudioMode, ContractViolation, DeviceType, EnvironmentCommand, FramebufferAccess,
    GameGeometry, GameInfo, JoypadButtons, PixelFormat, Session, SessionConfig, SessionError,
    VideoFrame, ViolationPolicy, JOYPAD_MASK,
};
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use common::{Presented, RecordingFrontend, ScriptedCore, HEIGHT, WIDTH};

fn start(core: ScriptedCore, config: SessionConfig) -> Session<ScriptedCore, RecordingFrontend> {
    start_with(core, RecordingFrontend::default(), config)
}

fn start_with(
    core: ScriptedCore,
    frontend: RecordingFrontend,
    config: SessionConfig,
) -> Session<ScriptedCore, RecordingFrontend> {
    let mut session = Session::new(core, frontend, config).expect("compatible core");
    session.init().expect("init");
    session
        .load_game(Some(&GameInfo::from_path("/roms/game.sfc")))
        .expect("load");
    session
}

fn software(frame: &mut retro_contract::FrameContext<'_>) {
    frame.video_refresh(VideoFrame::Software {
        data: &[],
        width: WIDTH,
        height: HEIGHT,
        pitch: WIDTH as usize * 2,
    });
}

#[test]
fn well_behaved_frames_pass_the_audit() {
    let mut session = start(ScriptedCore::default(), SessionConfig::default());
    for _ in 0..3 {
        session.run().expect("frame");
    }
    assert_eq!(session.frontend().polls, 3);
    assert_eq!(
        session.frontend().presented,
        vec![Presented::Software(WIDTH, HEIGHT); 3]
    );
    assert_eq!(session.diagnostics().frames_run, 3);
    assert_eq!(session.diagnostics().total_violations(), 0);
}

#[test]
fn frame_without_input_poll_is_reported() {
    let core = ScriptedCore::default().with_frame(software);
    let mut session = start(core, SessionConfig::default());
    assert_eq!(
        session.run(),
        Err(SessionError::Violation(ContractViolation::MissingInputPoll))
    );
    assert_eq!(session.diagnostics().frame_violations, 1);
    // The frame itself still reached the frontend.
    assert_eq!(session.frontend().presented.len(), 1);
}

#[rstest]
#[case::none(0)]
#[case::twice(2)]
#[case::three_times(3)]
fn frame_must_present_exactly_once(#[case] count: u32) {
    let core = ScriptedCore::default().with_frame(move |frame| {
        frame.poll_input();
        for _ in 0..count {
            software(frame);
        }
    });
    let mut session = start(core, SessionConfig::default());
    assert_eq!(
        session.run(),
        Err(SessionError::Violation(ContractViolation::VideoRefreshCount {
            count
        }))
    );
}

#[test]
fn warn_policy_logs_frame_violations_and_continues() {
    let core = ScriptedCore::default().with_frame(|_frame| {});
    let mut session = start(core, SessionConfig::permissive());
    session.run().expect("warn policy");
    session.run().expect("warn policy");
    // Missing poll and missing video on each frame.
    assert_eq!(session.diagnostics().frame_violations, 4);
}

#[test]
fn disabled_audit_skips_poll_and_refresh_checks() {
    let core = ScriptedCore::default().with_frame(|frame| {
        software(frame);
        software(frame);
    });
    let config = SessionConfig {
        violation_policy: ViolationPolicy::Reject,
        audit_frames: false,
    };
    let mut session = start(core, config);
    session.run().expect("unaudited frame");
    assert_eq!(session.diagnostics().total_violations(), 0);
}

fn duplicate(frame: &mut retro_contract::FrameContext<'_>) {
    frame.poll_input();
    frame.video_refresh(VideoFrame::Duplicate {
        width: WIDTH,
        height: HEIGHT,
    });
}

#[test]
fn duplicate_frames_need_can_dupe() {
    let core = ScriptedCore::default().with_frame(duplicate);
    let mut session = start(core, SessionConfig::default());
    assert_eq!(
        session.run(),
        Err(SessionError::Violation(ContractViolation::DupeWithoutSupport))
    );
    assert!(session.frontend().presented.is_empty());

    let core = ScriptedCore::default()
        .with_load(|env| {
            assert!(env.can_dupe());
        })
        .with_frame(duplicate);
    let mut session = start(core, SessionConfig::default());
    session.run().expect("dupe allowed");
    assert_eq!(session.frontend().presented, vec![Presented::Duplicate]);
}

#[test]
fn frontend_refusing_dupe_keeps_duplicates_illegal() {
    let frontend = RecordingFrontend {
        can_dupe: false,
        ..RecordingFrontend::default()
    };
    let core = ScriptedCore::default()
        .with_load(|env| {
            assert!(!env.can_dupe());
        })
        .with_frame(duplicate);
    let mut session = start_with(core, frontend, SessionConfig::permissive());
    session.run().expect("warn policy");
    assert_eq!(session.diagnostics().frame_violations, 1);
    // Forwarded under the warn policy.
    assert_eq!(session.frontend().presented, vec![Presented::Duplicate]);
}

#[test]
fn framebuffer_frames_need_a_lent_buffer() {
    let core = ScriptedCore::default().with_frame(|frame| {
        frame.poll_input();
        frame.video_refresh(VideoFrame::Framebuffer {
            width: WIDTH,
            height: HEIGHT,
            pitch: WIDTH as usize * 2,
        });
    });
    let mut session = start(core, SessionConfig::default());
    assert_eq!(
        session.run(),
        Err(SessionError::Violation(ContractViolation::FramebufferNotLent))
    );

    let core = ScriptedCore::default().with_frame(|frame| {
        frame.poll_input();
        let lent = frame.environment().with_software_framebuffer(
            WIDTH,
            HEIGHT,
            FramebufferAccess::WRITE,
            |buffer| {
                assert_eq!(buffer.pitch, WIDTH as usize * 2);
                buffer.data[0] = 0xFF;
            },
        );
        assert!(lent);
        frame.video_refresh(VideoFrame::Framebuffer {
            width: WIDTH,
            height: HEIGHT,
            pitch: WIDTH as usize * 2,
        });
    });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("lent framebuffer");
    assert_eq!(session.frontend().presented, vec![Presented::Framebuffer]);
    assert_eq!(session.frontend().framebuffer[0], 0xFF);
}

#[test]
fn lent_buffer_does_not_outlive_its_frame() {
    let frames = Rc::new(RefCell::new(0u32));
    let counter = Rc::clone(&frames);
    let core = ScriptedCore::default().with_frame(move |frame| {
        frame.poll_input();
        let mut count = counter.borrow_mut();
        if *count == 0 {
            frame
                .environment()
                .with_software_framebuffer(WIDTH, HEIGHT, FramebufferAccess::WRITE, |_| {});
        }
        *count += 1;
        frame.video_refresh(VideoFrame::Framebuffer {
            width: WIDTH,
            height: HEIGHT,
            pitch: WIDTH as usize * 2,
        });
    });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("lent this frame");
    assert_eq!(
        session.run(),
        Err(SessionError::Violation(ContractViolation::FramebufferNotLent))
    );
    assert_eq!(*frames.borrow(), 2);
}

#[test]
fn audio_mode_is_fixed_by_the_first_samples() {
    let core = ScriptedCore::default().with_frame(|frame| {
        frame.poll_input();
        software(frame);
        frame.audio_sample(0, 0);
        assert_eq!(frame.audio_sample_batch(&[0; 8]), 0);
    });
    let mut session = start(core, SessionConfig::default());
    assert_eq!(
        session.run(),
        Err(SessionError::Violation(ContractViolation::MixedAudioModes {
            established: AudioMode::Single
        }))
    );
    assert_eq!(session.frontend().samples, 1);
    assert_eq!(session.frontend().batches, 0);
}

#[test]
fn batched_audio_passes_through_consistently() {
    let core = ScriptedCore::default().with_frame(|frame| {
        frame.poll_input();
        software(frame);
        assert_eq!(frame.audio_sample_batch(&[0; 1068]), 534);
    });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("frame");
    session.run().expect("frame");
    assert_eq!(session.frontend().batches, 2);
}

#[test]
fn frame_time_hook_runs_before_each_frame() {
    let core = ScriptedCore::default().with_init(|env| {
        assert!(env.register_frame_time(16_639));
    });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("frame");
    session.run_timed(33_278).expect("frame");
    assert_eq!(session.core().frame_times, vec![16_639, 33_278]);
}

#[test]
fn frames_without_frame_time_registration_skip_the_hook() {
    let mut session = start(ScriptedCore::default(), SessionConfig::default());
    session.run_timed(1_000).expect("frame");
    assert!(session.core().frame_times.is_empty());
}

#[test]
fn input_queries_see_only_the_base_class() {
    let core = ScriptedCore::default().with_frame(|frame| {
        frame.poll_input();
        let pad = DeviceType::subclass(DeviceType::JOYPAD, 3);
        frame.input_state(1, pad, 0, 8);
        software(frame);
    });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("frame");
    assert_eq!(
        session.frontend().input_queries,
        vec![(1, DeviceType::JOYPAD, 0, 8)]
    );
}

#[test]
fn frame_window_commands_are_accepted_during_run_only() {
    let geometry = GameGeometry {
        base_width: 512,
        base_height: 448,
        max_width: 512,
        max_height: 478,
        aspect_ratio: 0.0,
    };
    let core = ScriptedCore::default()
        .with_load(move |env| {
            assert!(!env.set_geometry(&geometry));
        })
        .with_frame(move |frame| {
            frame.poll_input();
            assert!(frame.environment().set_geometry(&geometry));
            assert!(!frame.environment().set_pixel_format(PixelFormat::Xrgb8888));
            software(frame);
        });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("frame");

    let diagnostics = session.diagnostics();
    assert_eq!(diagnostics.environment_violations, 2);
    assert_eq!(diagnostics.environment_rejected, 2);
    let av_info = session.registrations().av_info.expect("content loaded");
    assert_eq!(av_info.geometry.base_width, 512);
    assert_eq!(session.registrations().pixel_format, PixelFormat::Rgb1555);
    assert_eq!(
        session
            .frontend()
            .seen
            .iter()
            .filter(|command| **command == EnvironmentCommand::SetGeometry)
            .count(),
        1
    );
}

#[test]
fn geometry_changes_may_not_move_the_maximum() {
    let grown = GameGeometry {
        base_width: 640,
        base_height: 480,
        max_width: 640,
        max_height: 480,
        aspect_ratio: 0.0,
    };
    let outcome = Rc::new(RefCell::new(None));
    let seen = Rc::clone(&outcome);
    let core = ScriptedCore::default().with_frame(move |frame| {
        frame.poll_input();
        *seen.borrow_mut() = Some(frame.environment().set_geometry(&grown));
        software(frame);
    });
    let mut session = start(core, SessionConfig::default());
    // Environment violations do not fail the frame.
    session.run().expect("frame");
    assert_eq!(*outcome.borrow(), Some(false));
    assert_eq!(
        session.registrations().av_info.map(|info| info.geometry.max_width),
        Some(512)
    );
    assert_eq!(session.diagnostics().environment_violations, 1);
}

#[test]
fn forwarded_geometry_changes_keep_the_load_time_maximum() {
    let changed = GameGeometry {
        base_width: 320,
        base_height: 240,
        max_width: 1024,
        max_height: 1024,
        aspect_ratio: 16.0 / 9.0,
    };
    let core = ScriptedCore::default().with_frame(move |frame| {
        frame.poll_input();
        assert!(frame.environment().set_geometry(&changed));
        software(frame);
    });
    let mut session = start(core, SessionConfig::permissive());
    session.run().expect("frame");

    assert_eq!(session.diagnostics().environment_violations, 1);
    assert_eq!(
        session.registrations().av_info.map(|info| info.geometry),
        Some(GameGeometry {
            base_width: 320,
            base_height: 240,
            max_width: 512,
            max_height: 478,
            aspect_ratio: 16.0 / 9.0,
        })
    );
}

#[test]
fn pixel_format_negotiated_at_load_is_visible_to_frames() {
    let formats = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&formats);
    let core = ScriptedCore::default()
        .with_load(|env| {
            assert!(env.set_pixel_format(PixelFormat::Rgb565));
        })
        .with_frame(move |frame| {
            sink.borrow_mut().push(frame.pixel_format());
            frame.poll_input();
            software(frame);
        });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("frame");
    assert_eq!(*formats.borrow(), vec![PixelFormat::Rgb565]);
}

#[test]
fn environment_calls_inside_a_frame_use_the_run_phase() {
    let phases = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&phases);
    let core = ScriptedCore::default().with_frame(move |frame| {
        sink.borrow_mut().push(frame.environment().phase());
        frame.poll_input();
        software(frame);
    });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("frame");
    assert_eq!(*phases.borrow(), vec![CallPhase::Run]);
}

fn read_pad(bitmasks: bool, pressed: u16) -> (JoypadButtons, usize) {
    let read = Rc::new(RefCell::new(JoypadButtons::empty()));
    let sink = Rc::clone(&read);
    let core = ScriptedCore::default()
        .with_init(move |env| {
            assert_eq!(env.input_bitmasks(), bitmasks);
        })
        .with_frame(move |frame| {
            frame.poll_input();
            *sink.borrow_mut() = frame.joypad_buttons(0);
            software(frame);
        });
    let frontend = RecordingFrontend {
        input_bitmasks: bitmasks,
        ..RecordingFrontend::default()
    };
    let mut session = start_with(core, frontend, SessionConfig::default());
    session.frontend_mut().buttons[0] = JoypadButtons::from_bits_truncate(pressed);
    session.run().expect("frame");
    let queries = session.frontend().input_queries.len();
    let buttons = *read.borrow();
    (buttons, queries)
}

#[test]
fn bitmask_reads_issue_one_query() {
    let (buttons, queries) = read_pad(true, 0b1000_0001_0000_1001);
    assert_eq!(queries, 1);
    assert!(buttons.contains(JoypadButtons::B | JoypadButtons::START | JoypadButtons::A));

    let (_, queries) = read_pad(false, 0);
    assert_eq!(queries, 16);
}

#[test]
fn bitmask_query_uses_the_mask_id() {
    let core = ScriptedCore::default()
        .with_init(|env| {
            env.input_bitmasks();
        })
        .with_frame(|frame| {
            frame.poll_input();
            frame.joypad_buttons(1);
            software(frame);
        });
    let mut session = start(core, SessionConfig::default());
    session.run().expect("frame");
    assert_eq!(
        session.frontend().input_queries,
        vec![(1, DeviceType::JOYPAD, 0, JOYPAD_MASK)]
    );
}

proptest! {
    #[test]
    fn bitmask_and_per_button_reads_agree(pressed in any::<u16>()) {
        let (masked, _) = read_pad(true, pressed);
        let (single, _) = read_pad(false, pressed);
        prop_assert_eq!(masked, single);
        prop_assert_eq!(masked, JoypadButtons::from_bits_truncate(pressed));
    }
}
