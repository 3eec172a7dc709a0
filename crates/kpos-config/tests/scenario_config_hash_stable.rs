use kpos_config::{load_layered_yaml, load_layered_yaml_from_strings, EngineSettings};

const BASE_YAML: &str = r#"
cart:
  max_items: 20
pricing:
  tax_rate: 0.0825
  premium_upcharge: 1.50
session:
  idle_timeout_secs: 900
"#;

const BASE_YAML_REORDERED: &str = r#"
session:
  idle_timeout_secs: 900
pricing:
  premium_upcharge: 1.50
  tax_rate: 0.0825
cart:
  max_items: 20
"#;

const STORE_OVERLAY_YAML: &str = r#"
pricing:
  tax_rate: 0.0725
catalog:
  path: "/srv/kiosk/catalog.json"
"#;

#[test]
fn same_input_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(
        a.config_hash, b.config_hash,
        "key order in the YAML source must not change the hash"
    );
}

#[test]
fn store_overlay_overrides_base_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, STORE_OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, merged.config_hash);

    let s = EngineSettings::from_config_json(&merged.config_json).unwrap();
    assert_eq!(s.tax_rate.ppm(), 72_500);
    assert_eq!(s.max_items, 20);
    assert_eq!(
        s.catalog_path.as_deref(),
        Some(std::path::Path::new("/srv/kiosk/catalog.json"))
    );
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn empty_layer_is_ignored() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, ""]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
}

#[test]
fn files_load_like_strings() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("store.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&overlay, STORE_OVERLAY_YAML).unwrap();

    let base_s = base.to_string_lossy().to_string();
    let overlay_s = overlay.to_string_lossy().to_string();
    let from_files = load_layered_yaml(&[base_s.as_str(), overlay_s.as_str()]).unwrap();
    let from_strings = load_layered_yaml_from_strings(&[BASE_YAML, STORE_OVERLAY_YAML]).unwrap();
    assert_eq!(from_files.config_hash, from_strings.config_hash);
}

#[test]
fn missing_file_names_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}

#[test]
fn origins_name_the_layer_that_set_each_leaf() {
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, STORE_OVERLAY_YAML]).unwrap();
    assert_eq!(merged.origin_of("/pricing/tax_rate"), Some(1));
    assert_eq!(merged.origin_of("/pricing/premium_upcharge"), Some(0));
    assert_eq!(merged.origin_of("/catalog/path"), Some(1));
    assert_eq!(merged.origin_of("/cart"), None);
}
