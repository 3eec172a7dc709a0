use std::path::PathBuf;

use kpos_config::{
    load_layered_yaml, report_unused_keys, ConfigMode, EngineSettings, UnusedKeyPolicy,
};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

#[test]
fn shipped_kiosk_defaults_are_fully_consumed() {
    let path = repo_root().join("config/defaults/kiosk.yaml");
    let path_s = path.to_string_lossy().to_string();
    let loaded = load_layered_yaml(&[path_s.as_str()]).unwrap();

    report_unused_keys(ConfigMode::Kiosk, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();

    let settings = EngineSettings::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(settings.max_items, 20);
    assert_eq!(settings.tax_rate.ppm(), 82_500);
    assert!(settings.catalog_path.is_some());
}
