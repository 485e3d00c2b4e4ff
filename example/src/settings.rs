// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fs, path::Path};

use anyhow::Context;
use platform::PlatformConfig;
use serde::{Deserialize, Serialize};

/// The settings file of the example.
///
/// Has enum variants for breaking changes in the format of the settings file,
/// but [`read`] always returns the newest variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "settings_file_version", rename_all = "snake_case")]
pub enum Settings {
    V1 {
        #[serde(default)]
        platform: PlatformConfig,
    },
}

impl Settings {
    pub fn into_platform_config(self) -> PlatformConfig {
        match self {
            Settings::V1 { platform } => platform,
        }
    }
}

pub fn read(settings: &Path) -> anyhow::Result<Settings> {
    let settings = if settings.exists() {
        let settings = fs::read_to_string(settings).context("Failed to open the settings file")?;
        parse(&settings)?
    } else {
        Settings::V1 {
            platform: PlatformConfig::default(),
        }
    };
    Ok(settings)
}

fn parse(settings: &str) -> anyhow::Result<Settings> {
    serde_json::from_str(settings).context("Failed to parse the settings file")
}

#[cfg(test)]
mod tests {
    use platform::{BackendKind, PlatformConfig};

    use super::{parse, Settings};

    #[test]
    fn versioned_settings_fill_in_defaults() {
        let settings = parse(r#"{ "settings_file_version": "v1" }"#).unwrap();
        assert_eq!(PlatformConfig::default(), settings.into_platform_config());

        let settings = parse(
            r#"{ "settings_file_version": "v1", "platform": { "backend": "sdl_renderer" } }"#,
        )
        .unwrap();
        assert_eq!(BackendKind::SdlRenderer, settings.into_platform_config().backend);
    }

    #[test]
    fn unversioned_settings_are_rejected() {
        assert!(parse(r#"{ "platform": {} }"#).is_err());
    }

    #[test]
    fn written_settings_read_back() {
        let settings = Settings::V1 {
            platform: PlatformConfig {
                fullscreen: true,
                ..PlatformConfig::default()
            },
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        assert_eq!(settings, parse(&json).unwrap());
    }
}
