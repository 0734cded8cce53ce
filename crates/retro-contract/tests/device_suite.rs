//! Input devices: subclass packing, light gun id aliasing, keyboard codes
//! and capability queries.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::too_many_lines
)]

mod common;

use std::cell::Cell;
use std::rc::Rc;

use bitflags as _;
use env_logger as _;
use log as _;
use proptest::prelude::*;
use retro_contract::device::{LegacyLightgunId, LightgunId};
use retro_contract::{
    CallPhase, ContractViolation, DeviceCapabilities, DeviceType, EnvironmentCommand, GameInfo,
    JoypadButton, JoypadButtons, Key, KeyModifiers, KeyboardEvent, LightgunMeaning, Session,
    SessionConfig, VideoFrame, DEVICE_MASK,
};
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use common::{RecordingFrontend, ScriptedCore};

#[rstest]
#[case::joypad(DeviceType::JOYPAD, "joypad")]
#[case::analog(DeviceType::ANALOG, "analog")]
#[case::pointer(DeviceType::POINTER, "pointer")]
#[case::unknown(DeviceType::from_raw(0x7F), "unknown")]
fn base_classes_have_names(#[case] device: DeviceType, #[case] name: &str) {
    assert_eq!(device.base_name(), name);
    assert_eq!(device.to_string(), name);
}

#[test]
fn subclasses_display_their_id() {
    let super_scope = DeviceType::subclass(DeviceType::LIGHTGUN, 0);
    let justifier = DeviceType::subclass(DeviceType::LIGHTGUN, 1);
    assert_eq!(super_scope.raw(), 0x104);
    assert_eq!(justifier.raw(), 0x204);
    assert_eq!(super_scope.to_string(), "lightgun#0");
    assert_ne!(super_scope, justifier);
    assert_eq!(super_scope.base(), justifier.base());
}

#[rstest]
#[case::aux_a(3, LightgunId::AuxA, LegacyLightgunId::Cursor)]
#[case::aux_b(4, LightgunId::AuxB, LegacyLightgunId::Turbo)]
fn aliased_lightgun_ids_have_two_meanings(
    #[case] id: u32,
    #[case] current: LightgunId,
    #[case] legacy: LegacyLightgunId,
) {
    assert!(LightgunMeaning::is_ambiguous(id));
    assert_eq!(
        LightgunMeaning::of(id),
        vec![
            LightgunMeaning::Current(current),
            LightgunMeaning::Legacy(legacy)
        ]
    );
}

#[rstest]
#[case::legacy_x(0, vec![LightgunMeaning::Legacy(LegacyLightgunId::X)])]
#[case::trigger(2, vec![LightgunMeaning::Current(LightgunId::Trigger)])]
#[case::pause(5, vec![LightgunMeaning::Legacy(LegacyLightgunId::Pause)])]
#[case::reload(16, vec![LightgunMeaning::Current(LightgunId::Reload)])]
#[case::unassigned(17, vec![])]
fn other_lightgun_ids_are_unambiguous(#[case] id: u32, #[case] meanings: Vec<LightgunMeaning>) {
    assert!(!LightgunMeaning::is_ambiguous(id));
    assert_eq!(LightgunMeaning::of(id), meanings);
}

#[test]
fn keyboard_events_decode_keys_and_characters() {
    let event = KeyboardEvent {
        down: true,
        keycode: Key::A.code(),
        character: u32::from('A'),
        modifiers: KeyModifiers::SHIFT,
    };
    assert_eq!(event.key(), Some(Key::A));
    assert_eq!(event.character(), Some('A'));

    let unmapped = KeyboardEvent {
        down: false,
        keycode: 0xFFFF,
        character: 0,
        modifiers: KeyModifiers::empty(),
    };
    assert_eq!(unmapped.key(), None);
    assert_eq!(unmapped.character(), None);
}

#[test]
fn joypad_buttons_map_to_mask_bits() {
    let pressed = JoypadButton::Start.mask_bit() | JoypadButton::A.mask_bit();
    assert_eq!(pressed.bits(), (1 << 3) | (1 << 8));
    assert!(pressed.pressed(JoypadButton::Start));
    assert!(!pressed.pressed(JoypadButton::B));
    for button in JoypadButton::ALL {
        assert_eq!(JoypadButton::from_id(button.id()), Some(button));
    }
    assert_eq!(JoypadButton::from_id(16), None);
}

#[test]
fn capability_queries_belong_to_frames() {
    let answered = Rc::new(Cell::new(None));
    let sink = Rc::clone(&answered);
    let core = ScriptedCore::default()
        .with_init(|env| {
            assert!(env.input_device_capabilities().is_empty());
        })
        .with_frame(move |frame| {
            sink.set(Some(frame.environment().input_device_capabilities()));
            frame.poll_input();
            frame.video_refresh(VideoFrame::Hardware {
                width: 256,
                height: 224,
            });
        });
    let mut session = Session::new(core, RecordingFrontend::default(), SessionConfig::default())
        .expect("compatible core");
    session.init().expect("init");
    assert_eq!(
        session.diagnostics().last_violation,
        Some(ContractViolation::CommandOutsideWindow {
            command: EnvironmentCommand::GetInputDeviceCapabilities,
            phase: CallPhase::Init,
        })
    );

    session
        .load_game(Some(&GameInfo::from_path("/roms/duck_hunt.nes")))
        .expect("load");
    session.run().expect("frame");
    // Unanswered, so nothing is supported; still not a violation.
    assert_eq!(answered.get(), Some(DeviceCapabilities::empty()));
    assert_eq!(session.diagnostics().environment_violations, 1);
}

#[test]
fn capabilities_answer_for_subclasses_by_base() {
    let caps = DeviceCapabilities::JOYPAD | DeviceCapabilities::LIGHTGUN;
    assert!(caps.supports(DeviceType::subclass(DeviceType::JOYPAD, 5)));
    assert!(caps.supports(DeviceType::subclass(DeviceType::LIGHTGUN, 0)));
    assert!(!caps.supports(DeviceType::MOUSE));
    assert!(!caps.supports(DeviceType::NONE));
}

proptest! {
    #[test]
    fn subclassing_preserves_the_base_class(base in 0u32..7, id in 0u32..0x00FF_FFFE) {
        let base = DeviceType::BASE_CLASSES[base as usize];
        let device = DeviceType::subclass(base, id);
        prop_assert_eq!(device.base(), base);
        prop_assert_eq!(device.subclass_id(), Some(id));
        prop_assert_eq!(device.raw() & DEVICE_MASK, base.raw());
        // Re-subclassing reduces to the base first.
        prop_assert_eq!(DeviceType::subclass(device, id), device);
    }

    #[test]
    fn button_sets_report_each_bit(bits in any::<u16>()) {
        let buttons = JoypadButtons::from_bits_truncate(bits);
        for button in JoypadButton::ALL {
            prop_assert_eq!(buttons.pressed(button), bits & (1 << button.id()) != 0);
        }
    }
}
