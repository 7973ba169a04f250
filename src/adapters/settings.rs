use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Contents of `appsettings.json`. Every value may be overridden on the
/// command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    #[serde(rename = "AWS", default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub comprehend: ComprehendSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsSettings {
    pub profile: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComprehendSettings {
    pub service_role_arn: Option<String>,
    pub training_data_uri: Option<String>,
    pub test_data_uri: Option<String>,
    pub output_uri: Option<String>,
    pub classifier_arn: Option<String>,
    pub language_code: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub report_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    /// Reads settings from `path`. A missing file is only tolerated when the
    /// caller did not ask for it explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        if !path.exists() && !explicit {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        info!("Loading settings from {:?}", path);
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        Self::from_json(&json).with_context(|| format!("Invalid settings file: {:?}", path))
    }
}

/// Picks the command-line value over the settings value and fails with a
/// message naming both places when neither is set.
pub fn require(cli: Option<String>, file: &Option<String>, flag: &str, key: &str) -> Result<String> {
    cli.or_else(|| file.clone())
        .filter(|value| !value.trim().is_empty())
        .with_context(|| format!("Missing value: pass --{} or set Comprehend.{} in the settings file", flag, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pascal_case_settings() {
        let settings = Settings::from_json(
            r#"{
                "AWS": { "Profile": "ml", "Region": "eu-west-1" },
                "Comprehend": {
                    "ServiceRoleArn": "arn:aws:iam::000000000000:role/comprehend",
                    "TrainingDataUri": "s3://bucket/training-data.csv",
                    "PollIntervalMs": 2500
                }
            }"#,
        )
        .unwrap();

        assert_eq!(settings.aws.profile.as_deref(), Some("ml"));
        assert_eq!(settings.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.comprehend.training_data_uri.as_deref(), Some("s3://bucket/training-data.csv"));
        assert_eq!(settings.comprehend.poll_interval_ms, Some(2500));
        assert!(settings.comprehend.classifier_arn.is_none());
    }

    #[test]
    fn empty_object_is_all_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert!(settings.aws.region.is_none());
        assert!(settings.comprehend.service_role_arn.is_none());
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("comprehend-classifier-missing-settings.json");
        let settings = Settings::load(&path, false).unwrap();
        assert!(settings.comprehend.output_uri.is_none());
        assert!(Settings::load(&path, true).is_err());
    }

    #[test]
    fn command_line_value_wins() {
        let file = Some("from-file".to_string());
        assert_eq!(require(Some("from-cli".into()), &file, "role-arn", "ServiceRoleArn").unwrap(), "from-cli");
        assert_eq!(require(None, &file, "role-arn", "ServiceRoleArn").unwrap(), "from-file");
    }

    #[test]
    fn missing_value_names_flag_and_key() {
        let err = require(None, &None, "role-arn", "ServiceRoleArn").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--role-arn"));
        assert!(message.contains("Comprehend.ServiceRoleArn"));
    }
}
