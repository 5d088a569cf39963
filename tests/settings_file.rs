use sdk_models::{ImageSpec, Settings};
use sdk_packaging::ProvisionPlan;
use std::path::Path;
use swagger_to_sdk::load_settings;

fn default_toml() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/default.toml")
}

#[test]
fn test_shipped_settings_match_defaults() {
    let settings = load_settings(Some(&default_toml())).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_shipped_settings_produce_a_valid_plan() {
    let settings = load_settings(Some(&default_toml())).unwrap();
    let plan = ProvisionPlan::from_spec(&ImageSpec::from(&settings.image)).unwrap();
    let dockerfile = plan.render_dockerfile();
    assert!(dockerfile.starts_with("# "));
    assert!(dockerfile.contains("FROM ubuntu:16.04"));
    assert!(dockerfile.contains(r#"ENTRYPOINT ["python3", "/SwaggerToSdk.py"]"#));
}
