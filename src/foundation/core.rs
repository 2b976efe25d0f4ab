use crate::foundation::error::{FramecastError, FramecastResult};

/// Rational frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds); must be > 0 for a valid rate.
    pub den: u32,
}

impl Fps {
    /// Construct a validated frame rate.
    pub fn new(num: u32, den: u32) -> FramecastResult<Self> {
        if den == 0 {
            return Err(FramecastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(FramecastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}

/// Scanning mode of a video format.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, Hash,
)]
pub enum FieldMode {
    /// One full image per frame.
    #[default]
    Progressive,
    /// Two temporally distinct fields per frame.
    Interlaced,
}

/// Which field of a frame pair a consumer is asking for.
///
/// Progressive consumers only ever request [`VideoField::First`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VideoField {
    /// The first (or only) field.
    First,
    /// The second field of an interlaced frame.
    Second,
}

/// Describes the output signal of a channel: dimensions, rate, field mode.
///
/// The `Default` value is the *invalid* descriptor (zero dimensions, zero
/// rate). It is used as the "no source format tracked" marker on same-channel
/// routes; [`VideoFormat::is_valid`] distinguishes it from any real format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoFormat {
    /// Active picture width in pixels.
    pub width: u32,
    /// Active picture height in pixels.
    pub height: u32,
    /// Frame rate.
    pub fps: Fps,
    /// Progressive or interlaced scanning.
    pub field_mode: FieldMode,
}

impl Default for VideoFormat {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fps: Fps { num: 0, den: 1 },
            field_mode: FieldMode::Progressive,
        }
    }
}

impl VideoFormat {
    /// Construct a validated format descriptor.
    pub fn new(width: u32, height: u32, fps: Fps, field_mode: FieldMode) -> FramecastResult<Self> {
        if width == 0 || height == 0 {
            return Err(FramecastError::validation(
                "VideoFormat dimensions must be > 0",
            ));
        }
        Ok(Self {
            width,
            height,
            fps,
            field_mode,
        })
    }

    /// Whether this describes a real output signal (as opposed to the
    /// default/empty placeholder).
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0 && self.num_valid()
    }

    fn num_valid(self) -> bool {
        self.fps.num > 0 && self.fps.den > 0
    }

    /// Fields per frame: 1 progressive, 2 interlaced.
    pub fn field_count(self) -> u32 {
        match self.field_mode {
            FieldMode::Progressive => 1,
            FieldMode::Interlaced => 2,
        }
    }

    /// Duration of one frame in seconds, or 0.0 for the invalid descriptor.
    pub fn frame_interval_secs(self) -> f64 {
        if self.num_valid() {
            self.fps.frame_duration_secs()
        } else {
            0.0
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
