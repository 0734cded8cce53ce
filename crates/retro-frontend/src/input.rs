//! Input state the host answers `input_state` queries from.

use retro_contract::device::{AnalogAxis, AnalogIndex, MouseId, PointerId};
use retro_contract::{DeviceType, JoypadButton, JoypadButtons, Key, JOYPAD_MASK};

/// Held state of one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortState {
    /// Digital buttons.
    pub buttons: JoypadButtons,
    /// Left and right stick, `[x, y]` each.
    pub sticks: [[i16; 2]; 2],
    /// Analog button pressure per joypad button id.
    pub analog_buttons: [i16; 16],
    /// Mouse motion since the last poll and held buttons.
    pub mouse: MouseState,
    /// First touch point.
    pub pointer: Option<[i16; 2]>,
}

/// Relative mouse state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseState {
    /// Horizontal motion.
    pub dx: i16,
    /// Vertical motion.
    pub dy: i16,
    /// Left, right, middle, fourth and fifth button.
    pub buttons: [bool; 5],
}

/// Per-port input plus the shared keyboard.
#[derive(Debug, Clone, Default)]
pub struct InputTable {
    ports: Vec<PortState>,
    keys: Vec<Key>,
    polls: u64,
}

impl InputTable {
    /// Table with `ports` idle ports.
    #[must_use]
    pub fn new(ports: u32) -> Self {
        Self {
            ports: vec![PortState::default(); ports as usize],
            keys: Vec::new(),
            polls: 0,
        }
    }

    /// Number of ports.
    #[must_use]
    pub fn port_count(&self) -> u32 {
        u32::try_from(self.ports.len()).unwrap_or(u32::MAX)
    }

    /// Mutable state of `port`, `None` past the last port.
    pub fn port_mut(&mut self, port: u32) -> Option<&mut PortState> {
        self.ports.get_mut(port as usize)
    }

    /// State of `port`.
    #[must_use]
    pub fn port(&self, port: u32) -> Option<&PortState> {
        self.ports.get(port as usize)
    }

    /// Replaces the held buttons of `port`.
    pub fn set_buttons(&mut self, port: u32, buttons: JoypadButtons) {
        if let Some(state) = self.port_mut(port) {
            state.buttons = buttons;
        }
    }

    /// Presses or releases one key.
    pub fn set_key(&mut self, key: Key, down: bool) {
        let held = self.keys.contains(&key);
        if down && !held {
            self.keys.push(key);
        } else if !down && held {
            self.keys.retain(|candidate| *candidate != key);
        }
    }

    /// Counts a poll and clears per-poll mouse motion.
    pub fn poll(&mut self) {
        self.polls = self.polls.wrapping_add(1);
        for state in &mut self.ports {
            state.mouse.dx = 0;
            state.mouse.dy = 0;
        }
    }

    /// Polls seen so far.
    #[must_use]
    pub const fn polls(&self) -> u64 {
        self.polls
    }

    /// Answers one `input_state` query.
    ///
    /// Unknown ports, devices and ids read as zero.
    #[must_use]
    pub fn state(&self, port: u32, device: DeviceType, index: u32, id: u32) -> i16 {
        if device.base() == DeviceType::KEYBOARD {
            return self.key_state(id);
        }
        let Some(state) = self.port(port) else {
            return 0;
        };
        match device.base() {
            DeviceType::JOYPAD => joypad_state(state.buttons, id),
            DeviceType::ANALOG => analog_state(state, index, id),
            DeviceType::MOUSE => mouse_state(&state.mouse, id),
            DeviceType::POINTER => pointer_state(state.pointer, index, id),
            _ => 0,
        }
    }

    fn key_state(&self, id: u32) -> i16 {
        let held = Key::from_code(id).is_some_and(|key| self.keys.contains(&key));
        i16::from(held)
    }
}

fn joypad_state(buttons: JoypadButtons, id: u32) -> i16 {
    if id == JOYPAD_MASK {
        return i16::from_ne_bytes(buttons.bits().to_ne_bytes());
    }
    JoypadButton::from_id(id).map_or(0, |button| i16::from(buttons.pressed(button)))
}

fn analog_state(state: &PortState, index: u32, id: u32) -> i16 {
    let axis = match id {
        0 => Some(AnalogAxis::X),
        1 => Some(AnalogAxis::Y),
        _ => None,
    };
    match (index, axis) {
        (i, Some(axis)) if i == AnalogIndex::Left as u32 => state.sticks[0][axis as usize],
        (i, Some(axis)) if i == AnalogIndex::Right as u32 => state.sticks[1][axis as usize],
        (i, _) if i == AnalogIndex::Button as u32 => {
            JoypadButton::from_id(id).map_or(0, |button| {
                let pressure = state.analog_buttons[button.id() as usize];
                if pressure == 0 && state.buttons.pressed(button) {
                    i16::MAX
                } else {
                    pressure
                }
            })
        }
        _ => 0,
    }
}

fn mouse_state(mouse: &MouseState, id: u32) -> i16 {
    let button = |index: usize| i16::from(mouse.buttons[index]);
    match id {
        x if x == MouseId::X as u32 => mouse.dx,
        y if y == MouseId::Y as u32 => mouse.dy,
        left if left == MouseId::Left as u32 => button(0),
        right if right == MouseId::Right as u32 => button(1),
        middle if middle == MouseId::Middle as u32 => button(2),
        four if four == MouseId::Button4 as u32 => button(3),
        five if five == MouseId::Button5 as u32 => button(4),
        _ => 0,
    }
}

fn pointer_state(pointer: Option<[i16; 2]>, index: u32, id: u32) -> i16 {
    // Only one touch is tracked.
    if index != 0 {
        return 0;
    }
    match (pointer, id) {
        (Some([x, _]), id) if id == PointerId::X as u32 => x,
        (Some([_, y]), id) if id == PointerId::Y as u32 => y,
        (touch, id) if id == PointerId::Pressed as u32 || id == PointerId::Count as u32 => {
            i16::from(touch.is_some())
        }
        _ => 0,
    }
}
