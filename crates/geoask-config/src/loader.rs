// SPDX-FileCopyrightText: 2026 Geoask Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./geoask.toml` > `~/.config/geoask/geoask.toml` > `/etc/geoask/geoask.toml`
//! with environment variable overrides via `GEOASK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GeoaskConfig;

/// Sections whose keys may be overridden from the environment.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "prompt",
    "backend",
    "local",
    "remote",
    "store",
    "executor",
    "orchestrator",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/geoask/geoask.toml`
/// 3. `~/.config/geoask/geoask.toml`
/// 4. `./geoask.toml`
/// 5. `GEOASK_*` environment variables
pub fn load_config() -> Result<GeoaskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<GeoaskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GeoaskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GeoaskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GeoaskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GeoaskConfig::default()))
        .merge(Toml::file("/etc/geoask/geoask.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("geoask/geoask.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("geoask.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `GEOASK_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `GEOASK_REMOTE_API_KEY` must become `remote.api_key`.
fn env_provider() -> Env {
    Env::prefixed("GEOASK_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
