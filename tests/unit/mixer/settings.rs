use super::*;
use crate::foundation::core::FieldMode;

#[test]
fn preset_and_blend_modes_parse() {
    let json = r#"{ "format": "720p5000", "blend_modes": { "1": "screen", "-2": "color_burn" } }"#;
    let settings = MixerSettings::from_reader(json.as_bytes()).unwrap();
    assert_eq!(settings.format_desc().unwrap().width, 1280);
    assert_eq!(settings.blend_modes[&1], BlendMode::Screen);
    assert_eq!(settings.blend_modes[&-2], BlendMode::ColorBurn);
}

#[test]
fn custom_format_uses_defaults_for_audio() {
    let json = r#"{ "format": { "name": "square", "width": 64, "height": 64,
                              "fps": { "num": 30, "den": 1 }, "field_mode": "lower" } }"#;
    let desc = MixerSettings::from_reader(json.as_bytes())
        .unwrap()
        .format_desc()
        .unwrap();
    assert_eq!(desc.field_mode, FieldMode::Lower);
    assert_eq!(desc.audio_sample_rate, 48_000);
    assert_eq!(desc.audio_channels, 2);
}

#[test]
fn empty_document_uses_defaults() {
    let settings = MixerSettings::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(settings.format_desc().unwrap().name, "1080p5000");
    assert!(settings.blend_modes.is_empty());
}

#[test]
fn bad_documents_are_validation_errors() {
    for json in [
        r#"{ "format": "999p1" }"#,
        r#"{ "blend_modes": { "1": "sparkle" } }"#,
        r#"{ "format": { "name": "x", "width": 0, "height": 4, "fps": { "num": 25, "den": 1 } } }"#,
        r#"{ "formatt": "pal" }"#,
    ] {
        assert!(
            matches!(
                MixerSettings::from_reader(json.as_bytes()),
                Err(MixError::Validation(_))
            ),
            "{json}"
        );
    }
}

#[test]
fn missing_file_is_reported_with_its_path() {
    let err = MixerSettings::from_path("/nonexistent/tickmix.json").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/tickmix.json"));
}
