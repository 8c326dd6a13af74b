use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use crate::{
    foundation::core::VideoFormatDesc,
    foundation::error::{MixError, MixResult},
    mixer::blend::BlendMode,
};

/// Output format of a settings document: a preset name or a full description.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FormatSetting {
    Preset(String),
    Custom(VideoFormatDesc),
}

impl Default for FormatSetting {
    fn default() -> Self {
        Self::Preset("1080p5000".to_string())
    }
}

/// JSON-facing mixer configuration.
///
/// ```json
/// { "format": "720p5000", "blend_modes": { "1": "screen", "2": "multiply" } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixerSettings {
    #[serde(default)]
    pub format: FormatSetting,
    /// Blend mode per layer index; unlisted layers use [`BlendMode::Normal`].
    #[serde(default)]
    pub blend_modes: BTreeMap<i32, BlendMode>,
}

impl MixerSettings {
    pub fn from_reader<R: std::io::Read>(r: R) -> MixResult<Self> {
        let settings: Self = serde_json::from_reader(r)
            .map_err(|e| MixError::validation(format!("parse mixer settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> MixResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MixError::validation(format!("open mixer settings '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> MixResult<()> {
        self.format_desc().map(|_| ())
    }

    /// Resolve the configured output format.
    pub fn format_desc(&self) -> MixResult<VideoFormatDesc> {
        match &self.format {
            FormatSetting::Preset(name) => VideoFormatDesc::preset(name),
            FormatSetting::Custom(desc) => {
                desc.validate()?;
                Ok(desc.clone())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/settings.rs"]
mod tests;
