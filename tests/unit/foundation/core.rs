use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(25, 0).is_err());
    assert!((Fps::new(50, 1).unwrap().frame_duration_secs() - 0.02).abs() < 1e-12);
}

#[test]
fn presets_are_case_insensitive() {
    let desc = VideoFormatDesc::preset("1080I5000").unwrap();
    assert_eq!(desc.width, 1920);
    assert_eq!(desc.height, 1080);
    assert_eq!(desc.field_mode, FieldMode::Upper);
    assert!(VideoFormatDesc::preset("4320p9000").is_err());
}

#[test]
fn audio_samples_per_tick_rounds_rational_rates() {
    let pal = VideoFormatDesc::preset("pal").unwrap();
    assert_eq!(pal.audio_samples_per_tick(), 1920);
    assert_eq!(pal.audio_buffer_len(), 3840);

    let ntsc = VideoFormatDesc::preset("ntsc").unwrap();
    assert_eq!(ntsc.audio_samples_per_tick(), 1602);
}

#[test]
fn fractional_rates_do_not_drift() {
    let ntsc = VideoFormatDesc::preset("ntsc").unwrap();
    let cadence: Vec<usize> = (0..5).map(|t| ntsc.audio_samples_for_tick(t)).collect();
    assert_eq!(cadence, vec![1602, 1601, 1602, 1601, 1602]);
    assert_eq!(ntsc.audio_buffer_len_for_tick(1), 1601 * 2);

    // One hour of ticks lands on the exact sample count.
    let ticks = 30_000 * 3600 / 1001 / 5 * 5;
    assert_eq!(ntsc.audio_samples_before_tick(ticks), ticks * 48_000 * 1001 / 30_000);

    let p5994 = VideoFormatDesc::preset("720p5994").unwrap();
    let total: usize = (0..5).map(|t| p5994.audio_samples_for_tick(t)).sum();
    assert_eq!(total, 4004);

    let pal = VideoFormatDesc::preset("pal").unwrap();
    assert!((0..50).all(|t| pal.audio_samples_for_tick(t) == 1920));
}

#[test]
fn every_preset_validates() {
    for name in VideoFormatDesc::preset_names() {
        VideoFormatDesc::preset(name).unwrap().validate().unwrap();
    }
}

#[test]
fn format_desc_deserializes_with_audio_defaults() {
    let desc: VideoFormatDesc = serde_json::from_str(
        r#"{"name":"tiny","width":4,"height":2,"fps":{"num":25,"den":1}}"#,
    )
    .unwrap();
    assert_eq!(desc.field_mode, FieldMode::Progressive);
    assert_eq!(desc.audio_sample_rate, DEFAULT_AUDIO_SAMPLE_RATE);
    assert_eq!(desc.audio_channels, DEFAULT_AUDIO_CHANNELS);
    assert_eq!(desc.image_len(), 32);
}
