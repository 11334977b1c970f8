//! Unit tests for config module

use std::collections::HashMap;
use std::time::Duration;

use vlmweave::config::env::apply_env_overrides;
use vlmweave::{Config, ProviderKind};

#[test]
fn default_config_has_expected_values() {
    let config = Config::default();
    assert_eq!(config.provider.kind, ProviderKind::OpenAi);
    assert!(config.provider.api_key.is_none());
    assert_eq!(config.provider.timeout_secs, 30);
    assert_eq!(config.provider.max_image_bytes, 20 * 1024 * 1024);
    assert!(!config.provider.insecure_tls_fallback);
    assert!(config.pool.threads.is_none());
    assert_eq!(config.pool.queue_capacity, 1024);
    assert_eq!(config.injection.reference_timeout_secs, 120);
    assert_eq!(config.injection.drain_timeout_secs, 60);
    assert!(config.injection.inline);
}

#[test]
fn config_serialization_roundtrip() {
    let mut config = Config::default();
    config.provider.kind = ProviderKind::Anthropic;
    config.pool.threads = Some(4);
    let toml_str = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn unset_options_are_not_serialized() {
    let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
    assert!(!toml_str.contains("api_key"));
    assert!(!toml_str.contains("threads"));
    assert!(toml_str.contains("kind = \"openai\""));
}

#[test]
fn provider_config_parses_from_toml() {
    let toml_str = r#"
[provider]
kind = "custom"
endpoint = "http://localhost:11434/v1/chat/completions"
model = "llava"
prompt = "Describe briefly."
insecure_tls_fallback = true
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let settings = config.provider_settings();
    assert_eq!(settings.kind, ProviderKind::Custom);
    assert_eq!(settings.model.as_deref(), Some("llava"));
    assert_eq!(settings.prompt, "Describe briefly.");
    assert!(settings.insecure_tls_fallback);
    assert_eq!(settings.timeout, Duration::from_secs(30));
}

#[test]
fn env_then_file_precedence() {
    let config: Config = toml::from_str("[provider]\nmodel = \"from-file\"\n").unwrap();
    let mut config = config;
    let env: HashMap<&str, &str> = [("VLMWEAVE_MODEL", "from-env")].into_iter().collect();
    apply_env_overrides(&mut config, |name| env.get(name).map(|v| v.to_string()));
    assert_eq!(config.provider.model.as_deref(), Some("from-env"));
}

#[test]
fn injection_settings_map_to_session_options() {
    let config: Config = toml::from_str(
        "[injection]\nreference_timeout_secs = 3\ndrain_timeout_secs = 4\ninline = false\n",
    )
    .unwrap();
    let options = config.session_options();
    assert_eq!(options.timeouts.reference, Duration::from_secs(3));
    assert_eq!(options.timeouts.drain, Duration::from_secs(4));
    assert!(!config.parser_options().inline);
}
