//! # Config - BTable tool settings
//!
//! Settings shared by the BTable tools, read from environment variables with
//! defaults for anything unset or unparsable.
//!
//! ```text
//! BTABLE_SYNC       fsync the table before closing   (default: "true")
//! BTABLE_STRICT     strict row/index validation      (default: "false")
//! BTABLE_DELIMITER  field delimiter for text rows    (default: ",", "tab" for \t)
//! BTABLE_LOG        log filter directive             (default: "warn")
//! ```
//!
//! Loading happens before any logger exists, so values that were set but
//! could not be parsed are handed back as [`IgnoredValue`]s for the caller
//! to report once logging is up.

use std::fmt;

pub const ENV_SYNC: &str = "BTABLE_SYNC";
pub const ENV_STRICT: &str = "BTABLE_STRICT";
pub const ENV_DELIMITER: &str = "BTABLE_DELIMITER";
pub const ENV_LOG: &str = "BTABLE_LOG";

/// Resolved tool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Call `sync_all()` on the destination before closing it.
    pub sync: bool,
    /// Reject rows whose length differs from the header, and unordered
    /// indices on read.
    pub strict: bool,
    /// Field delimiter for textual row input and output.
    pub delimiter: char,
    /// Log filter directive (e.g. `"info"`, `"btable=debug"`).
    pub log_filter: String,
}

/// An environment value that was set but unusable, so its default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredValue {
    pub key: &'static str,
    pub raw: String,
}

impl fmt::Display for IgnoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring {}={:?}, using default", self.key, self.raw)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync: true,
            strict: false,
            delimiter: ',',
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> (Self, Vec<IgnoredValue>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, returning it
    /// together with every value that fell back to its default.
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<IgnoredValue>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut ignored = Vec::new();
        let cfg = Self {
            sync: parse_or(&lookup, ENV_SYNC, defaults.sync, parse_bool, &mut ignored),
            strict: parse_or(&lookup, ENV_STRICT, defaults.strict, parse_bool, &mut ignored),
            delimiter: parse_or(
                &lookup,
                ENV_DELIMITER,
                defaults.delimiter,
                parse_delimiter,
                &mut ignored,
            ),
            log_filter: lookup(ENV_LOG)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.log_filter),
        };
        (cfg, ignored)
    }
}

fn parse_or<F, T, P>(
    lookup: &F,
    key: &'static str,
    default: T,
    parse: P,
    ignored: &mut Vec<IgnoredValue>,
) -> T
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match lookup(key) {
        None => default,
        Some(raw) => match parse(raw.trim()) {
            Some(v) => v,
            None => {
                ignored.push(IgnoredValue { key, raw });
                default
            }
        },
    }
}

/// Accepts `true/false`, `1/0`, `yes/no`, `on/off` (case-insensitive).
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Accepts a single character, or `tab` / `\t` for a tab.
pub fn parse_delimiter(s: &str) -> Option<char> {
    if s.eq_ignore_ascii_case("tab") || s == "\\t" {
        return Some('\t');
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
