use crate::foundation::error::{MixError, MixResult};

/// Audio sample rate used by every built-in video format.
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 48_000;

/// Interleaved channel count used by every built-in video format.
pub const DEFAULT_AUDIO_CHANNELS: u16 = 2;

/// Rational frame rate (`num / den` frames per second).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> MixResult<Self> {
        if den == 0 {
            return Err(MixError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(MixError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}

/// Field dominance of an output format.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    #[default]
    Progressive,
    /// Interlaced, upper (top) field first.
    Upper,
    /// Interlaced, lower (bottom) field first.
    Lower,
}

/// Geometry, cadence and audio layout of the output that ticks are produced for.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoFormatDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    #[serde(default)]
    pub field_mode: FieldMode,
    #[serde(default = "default_sample_rate")]
    pub audio_sample_rate: u32,
    #[serde(default = "default_channels")]
    pub audio_channels: u16,
}

fn default_sample_rate() -> u32 {
    DEFAULT_AUDIO_SAMPLE_RATE
}

fn default_channels() -> u16 {
    DEFAULT_AUDIO_CHANNELS
}

const PRESETS: &[(&str, u32, u32, u32, u32, FieldMode)] = &[
    ("pal", 720, 576, 25, 1, FieldMode::Upper),
    ("ntsc", 720, 486, 30_000, 1001, FieldMode::Lower),
    ("576p2500", 720, 576, 25, 1, FieldMode::Progressive),
    ("720p2500", 1280, 720, 25, 1, FieldMode::Progressive),
    ("720p5000", 1280, 720, 50, 1, FieldMode::Progressive),
    ("720p5994", 1280, 720, 60_000, 1001, FieldMode::Progressive),
    ("720p6000", 1280, 720, 60, 1, FieldMode::Progressive),
    ("1080i5000", 1920, 1080, 25, 1, FieldMode::Upper),
    ("1080i5994", 1920, 1080, 30_000, 1001, FieldMode::Upper),
    ("1080i6000", 1920, 1080, 30, 1, FieldMode::Upper),
    ("1080p2398", 1920, 1080, 24_000, 1001, FieldMode::Progressive),
    ("1080p2400", 1920, 1080, 24, 1, FieldMode::Progressive),
    ("1080p2500", 1920, 1080, 25, 1, FieldMode::Progressive),
    ("1080p2997", 1920, 1080, 30_000, 1001, FieldMode::Progressive),
    ("1080p3000", 1920, 1080, 30, 1, FieldMode::Progressive),
    ("1080p5000", 1920, 1080, 50, 1, FieldMode::Progressive),
];

impl VideoFormatDesc {
    /// Build a custom progressive format with the default audio layout.
    pub fn new(name: impl Into<String>, width: u32, height: u32, fps: Fps) -> MixResult<Self> {
        let desc = Self {
            name: name.into(),
            width,
            height,
            fps,
            field_mode: FieldMode::Progressive,
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            audio_channels: DEFAULT_AUDIO_CHANNELS,
        };
        desc.validate()?;
        Ok(desc)
    }

    /// Look up one of the built-in broadcast formats by name (case-insensitive).
    pub fn preset(name: &str) -> MixResult<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        PRESETS
            .iter()
            .find(|(n, ..)| *n == wanted)
            .map(|&(n, width, height, num, den, field_mode)| Self {
                name: n.to_string(),
                width,
                height,
                fps: Fps { num, den },
                field_mode,
                audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
                audio_channels: DEFAULT_AUDIO_CHANNELS,
            })
            .ok_or_else(|| MixError::validation(format!("unknown video format '{name}'")))
    }

    /// Names accepted by [`VideoFormatDesc::preset`].
    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|(n, ..)| *n)
    }

    pub fn validate(&self) -> MixResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MixError::validation(format!(
                "video format '{}' must have non-zero width/height",
                self.name
            )));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.audio_sample_rate == 0 || self.audio_channels == 0 {
            return Err(MixError::validation(format!(
                "video format '{}' must have a non-zero audio sample rate and channel count",
                self.name
            )));
        }
        Ok(())
    }

    /// Seconds covered by one tick.
    pub fn frame_interval_secs(&self) -> f64 {
        self.fps.frame_duration_secs()
    }

    /// Nominal audio frames (per channel) of one tick, rounded to the nearest sample.
    ///
    /// Rates that do not divide evenly vary per tick; see [`Self::audio_samples_for_tick`].
    pub fn audio_samples_per_tick(&self) -> usize {
        self.audio_samples_for_tick(0)
    }

    /// Audio frames (per channel) covered by the first `tick` ticks, rounded to the nearest
    /// sample.
    pub fn audio_samples_before_tick(&self, tick: u64) -> u64 {
        let num =
            u128::from(self.audio_sample_rate) * u128::from(self.fps.den) * u128::from(tick);
        let den = u128::from(self.fps.num.max(1));
        u64::try_from((num + den / 2) / den).unwrap_or(u64::MAX)
    }

    /// Audio frames (per channel) of tick number `tick`.
    ///
    /// Fractional rates follow a repeating cadence, e.g. 1602, 1601, 1602, 1601, 1602 at
    /// 29.97 fps, so the audio clock never drifts from the video clock.
    pub fn audio_samples_for_tick(&self, tick: u64) -> usize {
        let start = self.audio_samples_before_tick(tick);
        let end = self.audio_samples_before_tick(tick.saturating_add(1));
        (end - start) as usize
    }

    /// Interleaved sample count of a nominal tick's audio buffer.
    pub fn audio_buffer_len(&self) -> usize {
        self.audio_samples_per_tick() * usize::from(self.audio_channels)
    }

    /// Interleaved sample count of tick number `tick`.
    pub fn audio_buffer_len_for_tick(&self, tick: u64) -> usize {
        self.audio_samples_for_tick(tick) * usize::from(self.audio_channels)
    }

    /// Byte length of one packed 4-byte-per-pixel image at this format's size.
    pub fn image_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
