// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

/// Return the application data directory.
///
/// Nothing is created here; sinks and config saving create what they need.
pub fn data_dir() -> PathBuf {
    base_dir().join("foliant")
}

/// Where the config file lives unless `--config` says otherwise.
pub fn default_config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Where finished documents go when neither `-o` nor the config names a place.
pub fn default_output_dir() -> PathBuf {
    data_dir().join("output")
}

fn base_dir() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}
