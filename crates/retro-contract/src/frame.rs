//! Per-frame callbacks and the context a core runs one frame in.

use std::fmt;

use crate::av::PixelFormat;
use crate::device::{DeviceType, JoypadButton, JoypadButtons, JOYPAD_MASK};
use crate::environment::{CallPhase, Environment, EnvironmentClient, EnvironmentGate};
use crate::ContractViolation;

/// How a session delivers audio; fixed by the first samples sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AudioMode {
    /// One stereo frame per call.
    Single,
    /// Interleaved stereo frames in batches.
    Batch,
}

impl fmt::Display for AudioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single-sample audio",
            Self::Batch => "batched audio",
        })
    }
}

/// One video frame handed to the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrame<'a> {
    /// Pixels in the negotiated [`PixelFormat`]; `pitch` is in bytes.
    Software {
        /// Pixel rows, `pitch` bytes apart.
        data: &'a [u8],
        /// Visible width.
        width: u32,
        /// Visible height.
        height: u32,
        /// Bytes per row.
        pitch: usize,
    },
    /// Repeat the previous frame; needs `GET_CAN_DUPE`.
    Duplicate {
        /// Width of the repeated frame.
        width: u32,
        /// Height of the repeated frame.
        height: u32,
    },
    /// Frame was rendered into the hardware context.
    Hardware {
        /// Rendered width.
        width: u32,
        /// Rendered height.
        height: u32,
    },
    /// Frame was rendered into the buffer lent during this frame.
    Framebuffer {
        /// Rendered width.
        width: u32,
        /// Rendered height.
        height: u32,
        /// Bytes per row of the lent buffer.
        pitch: usize,
    },
}

impl VideoFrame<'_> {
    /// Frame dimensions.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        match *self {
            Self::Software { width, height, .. }
            | Self::Duplicate { width, height }
            | Self::Hardware { width, height }
            | Self::Framebuffer { width, height, .. } => (width, height),
        }
    }
}

bitflags::bitflags! {
    /// Intended use of a lent software framebuffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct FramebufferAccess: u32 {
        /// Core writes pixels.
        const WRITE = 1 << 0;
        /// Core reads back pixels.
        const READ = 1 << 1;
        /// Reads must be cheap, so the buffer must live in system RAM.
        const READ_RAM = 1 << 2;
    }
}

/// Frontend memory lent to the core for the duration of one closure call.
#[derive(Debug)]
pub struct SoftwareFramebuffer<'a> {
    /// Pixel rows.
    pub data: &'a mut [u8],
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per row.
    pub pitch: usize,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Granted access.
    pub access: FramebufferAccess,
}

/// Video, audio and input callbacks a frontend supplies.
pub trait FrameCallbacks {
    /// Latches input for the current frame.
    fn input_poll(&mut self);
    /// Reads one input; `device` is always a base class.
    fn input_state(&mut self, port: u32, device: DeviceType, index: u32, id: u32) -> i16;
    /// Presents a frame.
    fn video_refresh(&mut self, frame: &VideoFrame<'_>);
    /// Plays one stereo frame.
    fn audio_sample(&mut self, left: i16, right: i16);
    /// Plays interleaved stereo frames and returns how many frames it took.
    fn audio_sample_batch(&mut self, samples: &[i16]) -> usize;
}

/// Everything a session needs from a frontend.
pub trait Frontend: Environment + FrameCallbacks {
    /// The environment half, for handing to environment clients.
    fn as_environment(&mut self) -> &mut dyn Environment;
}

impl<T: Environment + FrameCallbacks> Frontend for T {
    fn as_environment(&mut self) -> &mut dyn Environment {
        self
    }
}

/// Frame-level counters reset at the start of every `run`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameAudit {
    /// `poll_input` calls.
    pub input_polls: u32,
    /// `video_refresh` calls.
    pub video_frames: u32,
    /// A software framebuffer was lent this frame.
    pub framebuffer_lent: bool,
    /// Violations raised during the frame.
    pub violations: Vec<ContractViolation>,
}

/// Callbacks and environment access for one `run`.
pub struct FrameContext<'a> {
    frontend: &'a mut dyn Frontend,
    gate: &'a mut EnvironmentGate,
}

impl fmt::Debug for FrameContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameContext")
            .field("audit", &self.gate)
            .finish_non_exhaustive()
    }
}

impl<'a> FrameContext<'a> {
    pub(crate) fn new(frontend: &'a mut dyn Frontend, gate: &'a mut EnvironmentGate) -> Self {
        Self { frontend, gate }
    }

    /// Polls input; required at least once per frame.
    pub fn poll_input(&mut self) {
        let audit = self.gate.frame_mut();
        audit.input_polls = audit.input_polls.saturating_add(1);
        self.frontend.input_poll();
    }

    /// Reads one input. Subclass bits of `device` are stripped first.
    pub fn input_state(&mut self, port: u32, device: DeviceType, index: u32, id: u32) -> i16 {
        self.frontend.input_state(port, device.base(), index, id)
    }

    /// Reads all sixteen joypad buttons of `port`.
    ///
    /// Uses one bitmask query when `GET_INPUT_BITMASKS` was accepted and
    /// sixteen single queries otherwise.
    #[allow(clippy::cast_sign_loss)]
    pub fn joypad_buttons(&mut self, port: u32) -> JoypadButtons {
        if self.gate.registrations().input_bitmasks {
            let mask = self
                .frontend
                .input_state(port, DeviceType::JOYPAD, 0, JOYPAD_MASK);
            return JoypadButtons::from_bits_truncate(mask as u16);
        }
        JoypadButton::ALL
            .iter()
            .filter(|button| {
                self.frontend
                    .input_state(port, DeviceType::JOYPAD, 0, button.id())
                    != 0
            })
            .fold(JoypadButtons::empty(), |pressed, button| {
                pressed | button.mask_bit()
            })
    }

    /// Presents the frame.
    ///
    /// Duplicates without `GET_CAN_DUPE` and framebuffer frames without a
    /// lent buffer are violations.
    pub fn video_refresh(&mut self, frame: VideoFrame<'_>) {
        let audit = self.gate.frame_mut();
        audit.video_frames = audit.video_frames.saturating_add(1);
        let lent = audit.framebuffer_lent;
        let violation = match frame {
            VideoFrame::Duplicate { .. } if !self.gate.registrations().can_dupe => {
                Some(ContractViolation::DupeWithoutSupport)
            }
            VideoFrame::Framebuffer { .. } if !lent => Some(ContractViolation::FramebufferNotLent),
            _ => None,
        };
        if let Some(violation) = violation {
            if !self.gate.report_frame(violation) {
                return;
            }
        }
        self.frontend.video_refresh(&frame);
    }

    /// Plays one stereo frame.
    pub fn audio_sample(&mut self, left: i16, right: i16) {
        if self.gate.audio_output(AudioMode::Single) {
            self.frontend.audio_sample(left, right);
        }
    }

    /// Plays interleaved stereo frames; returns frames consumed.
    pub fn audio_sample_batch(&mut self, samples: &[i16]) -> usize {
        if self.gate.audio_output(AudioMode::Batch) {
            self.frontend.audio_sample_batch(samples)
        } else {
            0
        }
    }

    /// Environment access inside the frame window.
    pub fn environment(&mut self) -> EnvironmentClient<'_> {
        EnvironmentClient::new(self.frontend.as_environment(), self.gate, CallPhase::Run)
    }

    /// Returns `true` when duplicate frames are allowed.
    #[must_use]
    pub fn can_dupe(&self) -> bool {
        self.gate.registrations().can_dupe
    }

    /// Pixel format in effect.
    #[must_use]
    pub fn pixel_format(&self) -> PixelFormat {
        self.gate.registrations().pixel_format
    }
}
