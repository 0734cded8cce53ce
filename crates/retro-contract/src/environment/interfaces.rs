//! Frontend services handed to the core through `GET_*_INTERFACE` commands.
//!
//! Every service is a `Send + Sync` trait object behind an [`Arc`]; the core
//! may keep it for the rest of the session.

use std::sync::Arc;

use crate::environment::payload::LogLevel;

/// Log sink (`GET_LOG_INTERFACE`).
pub trait LogInterface: Send + Sync {
    /// Emits one message.
    fn log(&self, level: LogLevel, message: &str);
}

/// Log sink used when the frontend offers none; forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackLog;

/// `log` target for core messages.
pub const CORE_LOG_TARGET: &str = "retro::core";

impl LogInterface for FallbackLog {
    fn log(&self, level: LogLevel, message: &str) {
        log::log!(target: CORE_LOG_TARGET, level.to_log(), "{}", message.trim_end());
    }
}

/// Rumble motor selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum RumbleEffect {
    /// Low-frequency motor.
    Strong = 0,
    /// High-frequency motor.
    Weak = 1,
}

/// Force feedback (`GET_RUMBLE_INTERFACE`).
pub trait RumbleInterface: Send + Sync {
    /// Sets motor strength for a port; returns `false` if unsupported.
    fn set_rumble_state(&self, port: u32, effect: RumbleEffect, strength: u16) -> bool;
}

/// Sensor enable/disable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum SensorAction {
    #[allow(missing_docs)]
    AccelerometerEnable = 0,
    #[allow(missing_docs)]
    AccelerometerDisable = 1,
    #[allow(missing_docs)]
    GyroscopeEnable = 2,
    #[allow(missing_docs)]
    GyroscopeDisable = 3,
    #[allow(missing_docs)]
    IlluminanceEnable = 4,
    #[allow(missing_docs)]
    IlluminanceDisable = 5,
}

/// Sensor reading selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum SensorId {
    #[allow(missing_docs)]
    AccelerometerX = 0,
    #[allow(missing_docs)]
    AccelerometerY = 1,
    #[allow(missing_docs)]
    AccelerometerZ = 2,
    #[allow(missing_docs)]
    GyroscopeX = 3,
    #[allow(missing_docs)]
    GyroscopeY = 4,
    #[allow(missing_docs)]
    GyroscopeZ = 5,
    /// Ambient light in lux.
    Illuminance = 6,
}

/// Motion and light sensors (`GET_SENSOR_INTERFACE`).
pub trait SensorInterface: Send + Sync {
    /// Enables or disables a sensor at `rate` events per second.
    fn set_sensor_state(&self, port: u32, action: SensorAction, rate: u32) -> bool;
    /// Latest reading.
    fn sensor_input(&self, port: u32, id: SensorId) -> f32;
}

bitflags::bitflags! {
    /// Frame delivery formats a camera consumer accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct CameraBufferCaps: u64 {
        /// Frames as GPU textures.
        const OPENGL_TEXTURE = 1 << 0;
        /// Frames as XRGB8888 memory buffers.
        const RAW_FRAMEBUFFER = 1 << 1;
    }
}

/// Core-side receiver of camera frames.
pub trait CameraSink: Send + Sync {
    /// Raw XRGB8888 frame; `pitch` is in bytes.
    fn frame_raw(&self, pixels: &[u32], width: u32, height: u32, pitch: usize);
    /// Camera driver came up.
    fn initialized(&self) {}
    /// Camera driver went down.
    fn deinitialized(&self) {}
}

/// Frontend-side camera controls.
pub trait CameraControl: Send + Sync {
    /// Starts capture; `false` when the device is unavailable.
    fn start(&self) -> bool;
    /// Stops capture.
    fn stop(&self);
}

/// Camera negotiation slot (`GET_CAMERA_INTERFACE`).
///
/// The core fills the request fields and the sink; the frontend fills
/// `control` when it accepts.
pub struct CameraRequest {
    /// Accepted delivery formats.
    pub caps: CameraBufferCaps,
    /// Desired width, `0` for no preference.
    pub width: u32,
    /// Desired height, `0` for no preference.
    pub height: u32,
    /// Frame receiver.
    pub sink: Arc<dyn CameraSink>,
    /// Filled by the frontend.
    pub control: Option<Arc<dyn CameraControl>>,
}

impl std::fmt::Debug for CameraRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraRequest")
            .field("caps", &self.caps)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("control", &self.control.is_some())
            .finish_non_exhaustive()
    }
}

/// Geographic fix reported by the location service.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Position {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Horizontal accuracy in metres.
    pub horizontal_accuracy: f64,
    /// Vertical accuracy in metres.
    pub vertical_accuracy: f64,
}

/// Location service (`GET_LOCATION_INTERFACE`).
pub trait LocationInterface: Send + Sync {
    /// Starts updates.
    fn start(&self) -> bool;
    /// Stops updates.
    fn stop(&self);
    /// Latest fix, if one is available.
    fn position(&self) -> Option<Position>;
    /// Sets the update interval and minimum distance.
    fn set_interval(&self, interval_ms: u32, interval_distance: u32);
}

/// Status LEDs (`GET_LED_INTERFACE`).
pub trait LedInterface: Send + Sync {
    /// Sets LED `led` to `state`.
    fn set_led_state(&self, led: i32, state: i32);
}

/// Raw MIDI byte stream (`GET_MIDI_INTERFACE`).
pub trait MidiInterface: Send + Sync {
    /// Input device is open.
    fn input_enabled(&self) -> bool;
    /// Output device is open.
    fn output_enabled(&self) -> bool;
    /// Next input byte.
    fn read(&self) -> Option<u8>;
    /// Queues an output byte `delta_time` microseconds after the previous one.
    fn write(&self, byte: u8, delta_time: u32) -> bool;
    /// Sends queued output.
    fn flush(&self) -> bool;
}

bitflags::bitflags! {
    /// Host CPU features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct SimdFeatures: u64 {
        #[allow(missing_docs)]
        const SSE = 1 << 0;
        #[allow(missing_docs)]
        const SSE2 = 1 << 1;
        #[allow(missing_docs)]
        const VMX = 1 << 2;
        #[allow(missing_docs)]
        const VMX128 = 1 << 3;
        #[allow(missing_docs)]
        const AVX = 1 << 4;
        #[allow(missing_docs)]
        const NEON = 1 << 5;
        #[allow(missing_docs)]
        const SSE3 = 1 << 6;
        #[allow(missing_docs)]
        const SSSE3 = 1 << 7;
        #[allow(missing_docs)]
        const MMX = 1 << 8;
        #[allow(missing_docs)]
        const MMXEXT = 1 << 9;
        #[allow(missing_docs)]
        const SSE4 = 1 << 10;
        #[allow(missing_docs)]
        const SSE42 = 1 << 11;
        #[allow(missing_docs)]
        const AVX2 = 1 << 12;
        #[allow(missing_docs)]
        const VFPU = 1 << 13;
        #[allow(missing_docs)]
        const PS = 1 << 14;
        #[allow(missing_docs)]
        const AES = 1 << 15;
        #[allow(missing_docs)]
        const VFPV3 = 1 << 16;
        #[allow(missing_docs)]
        const VFPV4 = 1 << 17;
        #[allow(missing_docs)]
        const POPCNT = 1 << 18;
        #[allow(missing_docs)]
        const MOVBE = 1 << 19;
        #[allow(missing_docs)]
        const CMOV = 1 << 20;
        #[allow(missing_docs)]
        const ASIMD = 1 << 21;
    }
}

/// Named profiling counter owned by the core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerfCounter {
    /// Counter name.
    pub ident: String,
    /// Tick value at the last start.
    pub start: u64,
    /// Ticks accumulated over all start/stop pairs.
    pub total: u64,
    /// Completed start/stop pairs.
    pub call_count: u64,
    /// Set once the frontend registered the counter.
    pub registered: bool,
}

impl PerfCounter {
    /// Unregistered counter.
    #[must_use]
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            ..Self::default()
        }
    }
}

/// Timing and profiling services (`GET_PERF_INTERFACE`).
pub trait PerfInterface: Send + Sync {
    /// Wall clock in microseconds.
    fn time_usec(&self) -> i64;
    /// Detected CPU features.
    fn cpu_features(&self) -> SimdFeatures;
    /// Raw tick counter.
    fn perf_counter(&self) -> u64;

    /// Registers a counter for [`PerfInterface::perf_log`].
    fn perf_register(&self, counter: &mut PerfCounter) {
        counter.registered = true;
    }

    /// Begins a timed section.
    fn perf_start(&self, counter: &mut PerfCounter) {
        if counter.registered {
            counter.start = self.perf_counter();
        }
    }

    /// Ends a timed section.
    fn perf_stop(&self, counter: &mut PerfCounter) {
        if counter.registered {
            let elapsed = self.perf_counter().wrapping_sub(counter.start);
            counter.total = counter.total.wrapping_add(elapsed);
            counter.call_count = counter.call_count.saturating_add(1);
        }
    }

    /// Reports registered counters.
    fn perf_log(&self) {}
}

/// Asynchronous audio producer (`SET_AUDIO_CALLBACK`).
///
/// The frontend may call this from its audio thread; the core synchronises.
pub trait AudioCallback: Send + Sync {
    /// Produce audio now.
    fn callback(&self);
    /// Audio output was started (`true`) or stopped.
    fn set_state(&self, enabled: bool);
}
