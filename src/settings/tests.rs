use super::*;
use tempfile::TempDir;

fn sample_settings() -> VideoSettings {
    VideoSettings {
        resolution: Resolution::Hd720,
        frame_rate: FrameRate::Fps29_97,
        selected_device_id: Some("usb-cam-01".to_string()),
        zoom_level: 2.3,
        offset_x: -45,
        offset_y: 120,
        flip_mode: FlipMode::Auto,
        auto_flip_active: true,
        always_on_top: true,
        show_info_overlay: false,
    }
}

#[test]
fn test_settings_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let store = JsonSettingsStore::new(dir.path().join("settings.json"));

    let settings = sample_settings();
    store.save(&settings);
    let reloaded = store.load();
    assert_eq!(reloaded, settings);

    // Saving the reloaded value again must not change anything
    store.save(&reloaded);
    assert_eq!(store.load(), settings);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let store = JsonSettingsStore::new(dir.path().join("absent.json"));
    assert_eq!(store.load(), VideoSettings::default());
}

#[test]
fn test_corrupt_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonSettingsStore::new(&path);
    assert_eq!(store.load(), VideoSettings::default());
}

#[test]
fn test_persisted_key_names_and_shapes() {
    let json = serde_json::to_value(sample_settings()).unwrap();
    assert_eq!(json["resolution"], "1280x720");
    assert_eq!(json["frameRate"], 29.97);
    assert_eq!(json["selectedDeviceId"], "usb-cam-01");
    assert_eq!(json["flipMode"], "auto");
    assert_eq!(json["autoFlipActive"], true);
    assert_eq!(json["offsetX"], -45);

    let defaults = serde_json::to_value(VideoSettings::default()).unwrap();
    assert_eq!(defaults["resolution"], "default");
    assert_eq!(defaults["frameRate"], "default");
}

#[test]
fn test_out_of_range_values_are_clamped_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"zoomLevel": 9.75, "offsetX": -900, "offsetY": 250, "flipMode": "flipped"}"#,
    )
    .unwrap();

    let settings = JsonSettingsStore::new(&path).load();
    assert_eq!(settings.zoom_level, ZOOM_MAX);
    assert_eq!(settings.offset_x, -OFFSET_LIMIT);
    assert_eq!(settings.offset_y, OFFSET_LIMIT);
    assert_eq!(settings.flip_mode, FlipMode::Flipped);
    assert_eq!(settings.resolution, Resolution::Default);
}

#[test]
fn test_clamp_zoom_rounds_and_bounds() {
    assert_eq!(clamp_zoom(0.2), ZOOM_MIN);
    assert_eq!(clamp_zoom(5.04), 5.0);
    assert_eq!(clamp_zoom(1.2999999), 1.3);
    assert_eq!(clamp_zoom(f64::NAN), ZOOM_DEFAULT);
}

#[test]
fn test_frame_rate_parsing() {
    let rate: FrameRate = serde_json::from_str("59.94").unwrap();
    assert_eq!(rate, FrameRate::Fps59_94);
    let rate: FrameRate = serde_json::from_str("\"default\"").unwrap();
    assert_eq!(rate, FrameRate::Default);
    assert!(serde_json::from_str::<FrameRate>("12").is_err());
    assert_eq!(FrameRate::Fps24.next(), FrameRate::Default);
}

#[test]
fn test_resolution_dimensions() {
    assert_eq!(Resolution::Default.dimensions(), None);
    assert_eq!(Resolution::Nhd360.dimensions(), Some((640, 360)));
    assert_eq!("3840x2160".parse::<Resolution>(), Ok(Resolution::Uhd2160));
    assert!("800x600".parse::<Resolution>().is_err());
}

#[test]
fn test_memory_store_counts_writes() {
    let store = MemorySettingsStore::default();
    let mut settings = store.load();
    settings.set_zoom(3.0);
    store.save(&settings);

    assert_eq!(store.write_count(), 1);
    assert_eq!(store.snapshot().zoom_level, 3.0);
}
