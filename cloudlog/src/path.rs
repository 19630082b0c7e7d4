//! Upload target path derivation.
//!
//! The remote path for a batch is a pure function of the configured root
//! folder, the sanitized user composite, the app version and the current
//! day, so the same logical (user, day) pair always lands in the same
//! object and batches append to it.

use chrono::{DateTime, Utc};
use crate::config::ShipperConfig;

/// Reduce a path component to `[A-Za-z0-9._-]`.
///
/// Anything else becomes `_`, and runs of `_` collapse to one so
/// `"DESKTOP-7\\J. Doe"` and `"DESKTOP-7 J Doe"` derive comparable names.
#[must_use]
pub fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for ch in raw.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-') {
            last_was_sep = false;
            ch
        } else {
            if last_was_sep {
                continue;
            }
            last_was_sep = true;
            '_'
        };
        out.push(mapped);
    }
    out
}

/// Day-stamped file name for `when`, e.g. `2026-08-31.log`.
#[must_use]
pub fn log_file_name(when: DateTime<Utc>) -> String {
    format!("{}.log", when.format("%Y-%m-%d"))
}

/// Remote folder (below the strategy's namespace prefix) for `config`.
#[must_use]
pub fn remote_folder(config: &ShipperConfig) -> String {
    format!(
        "{}/{}/{}",
        sanitize_component(&config.root_folder),
        sanitize_component(&config.app_version),
        sanitize_component(&config.user_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_component("release-1.4.2"), "release-1.4.2");
        assert_eq!(sanitize_component("Analyst_07"), "Analyst_07");
    }

    #[test]
    fn test_sanitize_collapses_separators() {
        assert_eq!(sanitize_component("DESKTOP-7\\J. Doe"), "DESKTOP-7_J._Doe");
        assert_eq!(sanitize_component("a  //  b"), "a_b");
        assert_eq!(sanitize_component("héllo wörld"), "h_llo_w_rld");
    }

    #[test]
    fn test_log_file_name_is_day_stamped() {
        let when = Utc.with_ymd_and_hms(2026, 8, 31, 23, 59, 0).unwrap();
        assert_eq!(log_file_name(when), "2026-08-31.log");
    }

    #[test]
    fn test_remote_folder_is_deterministic() {
        let config = ShipperConfig::new("1.4.2", "DESKTOP-7\\J. Doe", "/tmp");
        assert_eq!(remote_folder(&config), "app_logs/1.4.2/DESKTOP-7_J._Doe");
        assert_eq!(remote_folder(&config), remote_folder(&config));
    }
}
