//! Settings loading with deep merge and environment overrides.
//!
//! Deep merge rules:
//! - Objects merge recursively, source wins per key
//! - Arrays and primitives are replaced by the source
//! - `null` in the source keeps the target value

use std::path::{Path, PathBuf};

use hooktap_core::logging::LogFormat;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::HooktapSettings;

/// Default settings file location (`~/.hooktap/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".hooktap").join("settings.json")
}

/// Load from the default path, then apply environment overrides.
pub fn load_settings() -> Result<HooktapSettings> {
    load_settings_from_path(&settings_path())
}

/// Load from `path`, then apply environment overrides.
///
/// A missing file yields the defaults. Invalid JSON or an out-of-range value
/// is an error.
pub fn load_settings_from_path(path: &Path) -> Result<HooktapSettings> {
    let mut settings = load_file(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn load_file(path: &Path) -> Result<HooktapSettings> {
    let defaults = serde_json::to_value(HooktapSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides from the process environment.
///
/// Invalid values are logged and ignored.
pub fn apply_env_overrides(settings: &mut HooktapSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
///
/// `HOOKTAP_PORT` takes precedence over the conventional `PORT`.
pub fn apply_overrides<F>(settings: &mut HooktapSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    if let Some(v) = env.u16("PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.u16("HOOKTAP_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.string("HOOKTAP_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.usize("HOOKTAP_MAILBOX_CAPACITY", 1, 1 << 20) {
        settings.server.mailbox_capacity = v;
    }
    if let Some(v) = env.usize("HOOKTAP_MAX_BODY_BYTES", 1024, 1 << 30) {
        settings.server.max_body_bytes = v;
    }
    if let Some(v) = env.u64("HOOKTAP_HEARTBEAT_INTERVAL_MS", 100, 3_600_000) {
        settings.server.heartbeat_interval_ms = v;
    }
    if let Some(v) = env.string("HOOKTAP_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.string("HOOKTAP_LOG_FORMAT") {
        if LogFormat::parse(&v).is_some() {
            settings.logging.format = v.trim().to_ascii_lowercase();
        } else {
            warn!(key = "HOOKTAP_LOG_FORMAT", value = %v, "invalid log format, ignoring");
        }
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u16` within an inclusive range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within an inclusive range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `usize` within an inclusive range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn parsed<T>(&self, name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let val = self.string(name)?;
        let result = parse(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        self.parsed(name, |v| parse_u16_range(v, min, max))
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        self.parsed(name, |v| parse_u64_range(v, min, max))
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        self.parsed(name, |v| parse_usize_range(v, min, max))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SettingsError;
    use assert_matches::assert_matches;
    use hooktap_core::logging::capture_logs;
    use serde_json::json;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let merged = deep_merge(
            json!({"server": {"port": 8080, "host": "0.0.0.0"}}),
            json!({"server": {"port": 9090}}),
        );
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "0.0.0.0");
    }

    #[test]
    fn merge_null_preserves_target() {
        let merged = deep_merge(json!({"a": 1}), json!({"a": null}));
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_array_replaces() {
        let merged = deep_merge(json!({"a": [1, 2, 3]}), json!({"a": [4]}));
        assert_eq!(merged["a"], json!([4]));
    }

    #[test]
    fn merge_adds_new_keys() {
        let merged = deep_merge(json!({"a": 1}), json!({"b": 2}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let merged = deep_merge(json!({"a": {"x": true}}), json!({"a": 5}));
        assert_eq!(merged["a"], 5);
    }

    // ── file loading ────────────────────────────────────────────────

    #[test]
    fn missing_file_gives_defaults() {
        let settings = load_file(Path::new("/nonexistent/hooktap/settings.json")).unwrap();
        assert_eq!(settings, HooktapSettings::default());
    }

    #[test]
    fn partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server": {"port": 9090, "mailboxCapacity": 8}, "logging": {"format": "json"}}"#,
        )
        .unwrap();

        let settings = load_file(&path).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.mailbox_capacity, 8);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.logging.format, "json");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert_matches!(load_file(&path), Err(SettingsError::Json(_)));
    }

    #[test]
    fn wrong_type_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"port": "eighty"}}"#).unwrap();
        assert_matches!(load_file(&path), Err(SettingsError::Json(_)));
    }

    #[test]
    fn out_of_range_file_value_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"mailboxCapacity": 0}}"#).unwrap();
        let settings = load_file(&path).unwrap();
        assert_matches!(settings.validate(), Err(SettingsError::InvalidValue(_)));
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn port_env_applies() {
        let mut s = HooktapSettings::default();
        apply_overrides(&mut s, vars(&[("PORT", "3000")]));
        assert_eq!(s.server.port, 3000);
    }

    #[test]
    fn hooktap_port_beats_port() {
        let mut s = HooktapSettings::default();
        apply_overrides(&mut s, vars(&[("PORT", "3000"), ("HOOKTAP_PORT", "4000")]));
        assert_eq!(s.server.port, 4000);
    }

    #[test]
    fn all_overrides_apply() {
        let mut s = HooktapSettings::default();
        apply_overrides(
            &mut s,
            vars(&[
                ("HOOKTAP_HOST", "127.0.0.1"),
                ("HOOKTAP_MAILBOX_CAPACITY", "16"),
                ("HOOKTAP_MAX_BODY_BYTES", "2048"),
                ("HOOKTAP_HEARTBEAT_INTERVAL_MS", "500"),
                ("HOOKTAP_LOG_LEVEL", "debug"),
                ("HOOKTAP_LOG_FORMAT", "JSON"),
            ]),
        );
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.server.mailbox_capacity, 16);
        assert_eq!(s.server.max_body_bytes, 2048);
        assert_eq!(s.server.heartbeat_interval_ms, 500);
        assert_eq!(s.logging.level, "debug");
        assert_eq!(s.logging.format, "json");
        s.validate().unwrap();
    }

    #[test]
    fn invalid_values_are_ignored_with_warning() {
        let (logs, _guard) = capture_logs();
        let mut s = HooktapSettings::default();
        apply_overrides(
            &mut s,
            vars(&[
                ("PORT", "0"),
                ("HOOKTAP_MAILBOX_CAPACITY", "lots"),
                ("HOOKTAP_LOG_FORMAT", "xml"),
            ]),
        );
        assert_eq!(s, HooktapSettings::default());
        assert_eq!(logs.count_at_level(tracing::Level::WARN), 3);
    }

    #[test]
    fn empty_values_are_unset() {
        let mut s = HooktapSettings::default();
        apply_overrides(&mut s, vars(&[("HOOKTAP_HOST", "  ")]));
        assert_eq!(s.server.host, "0.0.0.0");
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u16_range("8080", 1, 65535), Some(8080));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("99999", 1, 65535), None);
        assert_eq!(parse_u16_range(" 42 ", 1, 65535), Some(42));
        assert_eq!(parse_u64_range("50", 100, 1000), None);
        assert_eq!(parse_u64_range("100", 100, 1000), Some(100));
        assert_eq!(parse_usize_range("abc", 1, 10), None);
        assert_eq!(parse_usize_range("10", 1, 10), Some(10));
    }

    #[test]
    fn settings_path_ends_with_hooktap_dir() {
        let p = settings_path();
        assert!(p.ends_with(".hooktap/settings.json"));
    }
}
