// tests/config_loading.rs
// Env var / working-directory fallbacks for RadarConfig. Every test here touches
// process-wide state, so they all run serially.

use std::env;
use std::fs;
use std::path::Path;

use serial_test::serial;
use talent_radar::config::{ENV_CONFIG_PATH, MomentumPolicy};
use talent_radar::RadarConfig;

/// Run `f` with cwd set to a fresh temp dir and the env override cleared.
fn in_temp_dir(f: impl FnOnce(&Path)) {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    f(tmp.path());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}

#[test]
#[serial]
fn defaults_when_nothing_is_configured() {
    in_temp_dir(|_| {
        let cfg = RadarConfig::load_default().unwrap();
        assert_eq!(cfg, RadarConfig::default());
    });
}

#[test]
#[serial]
fn toml_fallback_is_preferred_over_json() {
    in_temp_dir(|dir| {
        fs::create_dir_all(dir.join("config")).unwrap();
        fs::write(
            dir.join("config/radar.toml"),
            "[momentum]\nlookback_periods = 8\n",
        )
        .unwrap();
        fs::write(
            dir.join("config/radar.json"),
            r#"{"momentum":{"lookback_periods":12}}"#,
        )
        .unwrap();

        let cfg = RadarConfig::load_default().unwrap();
        assert_eq!(cfg.momentum.lookback_periods, 8);

        fs::remove_file(dir.join("config/radar.toml")).unwrap();
        let cfg = RadarConfig::load_default().unwrap();
        assert_eq!(cfg.momentum.lookback_periods, 12);
    });
}

#[test]
#[serial]
fn env_path_wins_over_fallbacks() {
    in_temp_dir(|dir| {
        fs::create_dir_all(dir.join("config")).unwrap();
        fs::write(dir.join("config/radar.toml"), "[batch]\nchunk_size = 3\n").unwrap();
        let custom = dir.join("custom.json");
        fs::write(
            &custom,
            r#"{"batch":{"chunk_size":5},"breakout":{"strong_momentum_boost":1.5}}"#,
        )
        .unwrap();

        env::set_var(ENV_CONFIG_PATH, custom.display().to_string());
        let cfg = RadarConfig::load_default().unwrap();
        assert_eq!(cfg.batch.chunk_size, 5);
        assert_eq!(cfg.breakout.strong_momentum_boost, 1.5);
        assert_eq!(cfg.momentum, MomentumPolicy::default());
    });
}

#[test]
#[serial]
fn env_path_to_missing_file_is_an_error() {
    in_temp_dir(|dir| {
        env::set_var(ENV_CONFIG_PATH, dir.join("nope.toml").display().to_string());
        assert!(RadarConfig::load_default().is_err());
    });
}

#[test]
#[serial]
fn loaded_values_are_sanitized() {
    in_temp_dir(|dir| {
        let p = dir.join("radar.toml");
        fs::write(
            &p,
            "[breakout]\nweight_momentum = 3.0\n\n[shortlist]\nscene_limit = 0\n",
        )
        .unwrap();
        let cfg = RadarConfig::load_from(&p).unwrap();
        assert_eq!(cfg.breakout.weight_momentum, 0.35);
        assert_eq!(cfg.shortlist.scene_limit, 20);
    });
}

#[test]
#[serial]
fn malformed_file_is_an_error() {
    in_temp_dir(|dir| {
        let p = dir.join("radar.toml");
        fs::write(&p, "[momentum\nvelocity_threshold = ").unwrap();
        let err = RadarConfig::load_from(&p).unwrap_err();
        assert!(format!("{err:#}").contains("parsing radar config"));
    });
}
