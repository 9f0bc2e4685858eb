// src/config/validate.rs

use std::path::Path;
use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{EpitrackError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::EpitrackError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let poll_interval = validate_monitor(&raw)?;
        validate_pipeline(&raw)?;
        validate_defaults(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, poll_interval))
    }
}

fn validate_monitor(cfg: &RawConfigFile) -> Result<Duration> {
    let interval = parse_duration(&cfg.monitor.poll_interval).map_err(|e| {
        EpitrackError::ConfigError(format!("[monitor].poll_interval: {e}"))
    })?;
    if interval.is_zero() {
        return Err(EpitrackError::ConfigError(
            "[monitor].poll_interval must be greater than zero".to_string(),
        ));
    }
    ensure_bare_file_name("[monitor].exit_code_file", &cfg.monitor.exit_code_file)?;
    Ok(interval)
}

fn validate_pipeline(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.program.trim().is_empty() {
        return Err(EpitrackError::ConfigError(
            "[pipeline].program must not be empty".to_string(),
        ));
    }
    ensure_bare_file_name("[pipeline].log_file", &cfg.pipeline.log_file)
}

fn validate_defaults(cfg: &RawConfigFile) -> Result<()> {
    let d = &cfg.defaults;
    if d.min_length > d.max_length {
        return Err(EpitrackError::ConfigError(format!(
            "[defaults].min_length ({}) must be <= max_length ({})",
            d.min_length, d.max_length
        )));
    }
    for (name, value) in [("cover", d.cover), ("identity", d.identity)] {
        if value > 100 {
            return Err(EpitrackError::ConfigError(format!(
                "[defaults].{name} must be a percentage in 0..=100 (got {value})"
            )));
        }
    }
    if !(1..=100).contains(&d.word_size) {
        return Err(EpitrackError::ConfigError(format!(
            "[defaults].word_size must be in 1..=100 (got {})",
            d.word_size
        )));
    }
    Ok(())
}

fn ensure_bare_file_name(key: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let is_bare = matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    );
    if is_bare {
        Ok(())
    } else {
        Err(EpitrackError::ConfigError(format!(
            "{key} must be a plain file name (got '{name}')"
        )))
    }
}

/// Parse a duration such as `"500ms"`, `"60s"`, `"5m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
