//! Bootstrap against a real home directory and the real process environment.
//!
//! Only one test writes to the process environment; the others work on
//! snapshots.

use oh_common::EnvMap;
use oh_config::{env_keys, StateDirSource};
use oh_core::bootstrap;
use oh_core::cli::NormalizeRule;

fn raw(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|s| s.to_string()).collect()
}

#[test]
fn profile_export_reaches_process_environment() {
    let home = tempfile::tempdir().expect("tempdir");
    for key in [
        env_keys::PROFILE,
        env_keys::STATE_DIR,
        env_keys::CONFIG_PATH,
        env_keys::GATEWAY_PORT,
    ] {
        std::env::remove_var(key);
    }

    let args = raw(&["/usr/bin/node", "/opt/openhedgehog/entry.js", "--dev", "gateway", "run"]);
    let ctx = bootstrap(Some(&args), &EnvMap::new(), Some(home.path())).expect("bootstrap");
    assert_eq!(ctx.rule, NormalizeRule::Interpreter);

    let written = ctx.export_to_process();
    assert!(written.contains(&env_keys::PROFILE.to_string()));
    assert_eq!(std::env::var(env_keys::PROFILE).as_deref(), Ok("dev"));
    assert_eq!(std::env::var(env_keys::GATEWAY_PORT).as_deref(), Ok("19001"));
    assert_eq!(
        std::env::var(env_keys::STATE_DIR).ok().map(std::path::PathBuf::from),
        Some(home.path().join(".openhedgehog-dev"))
    );

    // A second export never overwrites what is already set.
    assert!(ctx.export_to_process().is_empty());
}

#[test]
fn context_serializes_without_environment_snapshot() {
    let home = tempfile::tempdir().expect("tempdir");
    let args = raw(&["openhedgehog", "--profile", "work", "status"]);
    let env = EnvMap::from([("SECRET_TOKEN", "hunter2")]);
    let ctx = bootstrap(Some(&args), &env, Some(home.path())).expect("bootstrap");

    let json = serde_json::to_value(&ctx).expect("serialize context");
    assert_eq!(json["profile"], "work");
    assert_eq!(json["rule"], "direct_invocation");
    assert!(json.get("env").is_none());
    assert!(!json.to_string().contains("hunter2"));
    assert_eq!(ctx.state_dir.source, StateDirSource::Profile);
    assert_eq!(json["state_dir"]["source"], "profile");
    assert!(ctx.state_dir.path.starts_with(home.path()));
}

#[test]
fn home_falls_back_to_environment_snapshot() {
    let home = tempfile::tempdir().expect("tempdir");
    let home_str = home.path().to_string_lossy().into_owned();
    let env = EnvMap::from([("HOME", home_str.as_str())]);
    let args = raw(&["openhedgehog", "--profile", "rescue", "doctor"]);

    let ctx = bootstrap(Some(&args), &env, None).expect("bootstrap");
    assert_eq!(ctx.state_dir.path, home.path().join(".openhedgehog-rescue"));
    assert_eq!(
        ctx.config_path,
        home.path().join(".openhedgehog-rescue").join("openhedgehog.json")
    );
    assert_eq!(ctx.gateway_port, 18789);
}
