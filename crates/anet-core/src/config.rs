use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::datetime::parse_timezone;

const CONFIG_FILE: &str = "anet-periods.toml";
const CONFIG_ENV_VAR: &str = "ANET_PERIODS_CONFIG";
const ISO8601_ENV_VAR: &str = "ANET_USE_ISO8601";
const TIMEZONE_ENV_VAR: &str = "ANET_TIMEZONE";

/// Process-wide settings, resolved once at startup and passed by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Monday-start ISO weeks when true, Sunday-start otherwise.
    pub use_iso8601: bool,
    /// Timezone whose wall clock defines "now" and day boundaries.
    pub timezone: Tz,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_iso8601: true,
            timezone: chrono_tz::UTC,
            color: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    use_iso8601: Option<bool>,
    timezone: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(flatten)]
    top: SettingsSection,
    periods: Option<SettingsSection>,
}

impl Settings {
    /// Defaults, then the config file, then `ANET_*` environment variables.
    #[tracing::instrument(skip(config_override))]
    pub fn load(config_override: Option<&Path>) -> anyhow::Result<Self> {
        Self::resolve(config_override, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an injectable environment lookup.
    pub fn resolve<F>(config_override: Option<&Path>, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        match config_path(config_override, &env) {
            Some((path, _)) if path.exists() => {
                info!(file = %path.display(), "loading settings file");
                settings.load_file(&path)?;
            }
            Some((path, true)) => {
                return Err(anyhow!("settings file not found: {}", path.display()));
            }
            Some((path, false)) => {
                debug!(file = %path.display(), "no settings file; using defaults");
            }
            None => {}
        }

        if let Some(raw) = env(ISO8601_ENV_VAR) {
            settings.apply(ISO8601_ENV_VAR, "use_iso8601", &raw)?;
        }
        if let Some(raw) = env(TIMEZONE_ENV_VAR) {
            settings.apply(TIMEZONE_ENV_VAR, "timezone", &raw)?;
        }

        Ok(settings)
    }

    /// Applies `key=value` overrides; an `rc.` prefix on the key is ignored.
    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (k, v) in overrides {
            let key = k.strip_prefix("rc.").unwrap_or(&k);
            self.apply("override", key, &v)?;
        }
        Ok(())
    }

    fn apply(&mut self, source: &str, key: &str, value: &str) -> anyhow::Result<()> {
        debug!(source, key, value, "applying setting");
        match key {
            "use_iso8601" => {
                self.use_iso8601 = parse_bool(value)
                    .ok_or_else(|| anyhow!("{source}: invalid boolean for {key}: {value}"))?;
            }
            "color" => {
                self.color = parse_bool(value)
                    .ok_or_else(|| anyhow!("{source}: invalid boolean for {key}: {value}"))?;
            }
            "timezone" => {
                self.timezone = parse_timezone(value, source)
                    .ok_or_else(|| anyhow!("{source}: invalid timezone: {value}"))?;
            }
            other => warn!(source, key = other, "unknown setting; ignoring"),
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed: SettingsFile = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let source = format!("file:{}", path.display());
        for section in std::iter::once(parsed.top).chain(parsed.periods) {
            if let Some(value) = section.use_iso8601 {
                self.use_iso8601 = value;
            }
            if let Some(value) = section.color {
                self.color = value;
            }
            if let Some(value) = section.timezone {
                self.apply(&source, "timezone", &value)?;
            }
        }
        Ok(())
    }
}

/// Settings file to read and whether the caller asked for it explicitly.
fn config_path<F>(config_override: Option<&Path>, env: &F) -> Option<(PathBuf, bool)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = config_override {
        return Some((path.to_path_buf(), true));
    }

    if let Some(raw) = env(CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some((PathBuf::from(trimmed), true));
        }
    }

    std::env::current_dir()
        .ok()
        .map(|dir| (dir.join(CONFIG_FILE), false))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Some(true),
        "0" | "n" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}
