//! Audio/video negotiation data: pixel formats, geometry, timing, rotation.

/// Pixel layout of software-rendered frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum PixelFormat {
    /// 0RGB1555, native endian. Assumed until the core negotiates another.
    #[default]
    Rgb1555 = 0,
    /// XRGB8888, native endian, `X` ignored.
    Xrgb8888 = 1,
    /// RGB565, native endian.
    Rgb565 = 2,
}

impl PixelFormat {
    /// Converts a wire value back into a pixel format.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Rgb1555),
            1 => Some(Self::Xrgb8888),
            2 => Some(Self::Rgb565),
            _ => None,
        }
    }

    /// Bytes occupied by one pixel.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb1555 | Self::Rgb565 => 2,
            Self::Xrgb8888 => 4,
        }
    }
}

/// Screen rotation requested by the core, counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None = 0,
    /// 90 degrees.
    Deg90 = 1,
    /// 180 degrees.
    Deg180 = 2,
    /// 270 degrees.
    Deg270 = 3,
}

impl Rotation {
    /// Converts a wire value back into a rotation.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Deg90),
            2 => Some(Self::Deg180),
            3 => Some(Self::Deg270),
            _ => None,
        }
    }

    /// Rotation in degrees.
    #[must_use]
    pub const fn degrees(self) -> u32 {
        self as u32 * 90
    }
}

/// Video standard the loaded content runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum Region {
    /// NTSC timing.
    #[default]
    Ntsc = 0,
    /// PAL timing.
    Pal = 1,
}

/// Nominal and maximum video dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GameGeometry {
    /// Nominal video width.
    pub base_width: u32,
    /// Nominal video height.
    pub base_height: u32,
    /// Largest width the core will ever output.
    pub max_width: u32,
    /// Largest height the core will ever output.
    pub max_height: u32,
    /// Display aspect ratio; `<= 0.0` means square pixels.
    pub aspect_ratio: f32,
}

impl GameGeometry {
    /// Aspect ratio the frontend should display at.
    ///
    /// Non-positive ratios resolve to `base_width / base_height`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn effective_aspect_ratio(&self) -> f32 {
        if self.aspect_ratio > 0.0 {
            self.aspect_ratio
        } else if self.base_height == 0 {
            1.0
        } else {
            self.base_width as f32 / self.base_height as f32
        }
    }

    /// Returns `true` when `width x height` fits inside the maximum frame.
    #[must_use]
    pub const fn fits(&self, width: u32, height: u32) -> bool {
        width <= self.max_width && height <= self.max_height
    }

    /// Returns `true` when `other` keeps this geometry's maximum dimensions.
    #[must_use]
    pub const fn same_max(&self, other: &Self) -> bool {
        self.max_width == other.max_width && self.max_height == other.max_height
    }
}

/// Video and audio rates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SystemTiming {
    /// Frames per second of the video output.
    pub fps: f64,
    /// Audio sample rate in Hz.
    pub sample_rate: f64,
}

/// Geometry and timing reported after content loads.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SystemAvInfo {
    /// Video geometry.
    pub geometry: GameGeometry,
    /// Frame and sample rates.
    pub timing: SystemTiming,
}

bitflags::bitflags! {
    /// Which outputs the frontend currently consumes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct AvEnableFlags: u32 {
        /// Video frames are displayed.
        const VIDEO = 1 << 0;
        /// Audio samples are played.
        const AUDIO = 1 << 1;
        /// Save states are taken for runahead or rewind and must be fast.
        const FAST_SAVESTATES = 1 << 2;
        /// Audio must not be rendered at all, not even muted.
        const HARD_DISABLE_AUDIO = 1 << 3;
    }
}

impl Default for AvEnableFlags {
    fn default() -> Self {
        Self::VIDEO | Self::AUDIO
    }
}

#[cfg(test)]
mod tests {
    use super::{AvEnableFlags, GameGeometry, PixelFormat, Rotation};

    #[test]
    fn pixel_format_wire_values_are_stable() {
        assert_eq!(PixelFormat::from_u32(0), Some(PixelFormat::Rgb1555));
        assert_eq!(PixelFormat::from_u32(1), Some(PixelFormat::Xrgb8888));
        assert_eq!(PixelFormat::from_u32(2), Some(PixelFormat::Rgb565));
        assert_eq!(PixelFormat::from_u32(3), None);
        assert_eq!(PixelFormat::default(), PixelFormat::Rgb1555);
        assert_eq!(PixelFormat::Xrgb8888.bytes_per_pixel(), 4);
    }

    #[test]
    fn non_positive_aspect_ratio_falls_back_to_square_pixels() {
        let geometry = GameGeometry {
            base_width: 320,
            base_height: 240,
            max_width: 640,
            max_height: 480,
            aspect_ratio: 0.0,
        };
        assert!((geometry.effective_aspect_ratio() - 4.0 / 3.0).abs() < f32::EPSILON);

        let negative = GameGeometry {
            aspect_ratio: -1.0,
            base_width: 256,
            base_height: 224,
            ..geometry
        };
        assert!((negative.effective_aspect_ratio() - 256.0 / 224.0).abs() < f32::EPSILON);

        let explicit = GameGeometry {
            aspect_ratio: 16.0 / 9.0,
            ..geometry
        };
        assert!((explicit.effective_aspect_ratio() - 16.0 / 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rotation_degrees_are_counter_clockwise_quarters() {
        assert_eq!(Rotation::from_u32(3).map(Rotation::degrees), Some(270));
        assert_eq!(Rotation::from_u32(4), None);
    }

    #[test]
    fn av_enable_defaults_to_video_and_audio() {
        let flags = AvEnableFlags::default();
        assert!(flags.contains(AvEnableFlags::VIDEO | AvEnableFlags::AUDIO));
        assert!(!flags.contains(AvEnableFlags::FAST_SAVESTATES));
    }
}
