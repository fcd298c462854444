//! Analysis configuration.
//!
//! Every field has a default, so a partial JSON file (or `{}`) is a valid
//! configuration. Thresholds apply to normalized samples in `[-1.0, 1.0]`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_trim_edges() -> bool {
    true
}

fn default_trim() -> usize {
    2
}

fn default_jump_threshold() -> f64 {
    0.1
}

fn default_highpass_cutoff_hz() -> f64 {
    8_000.0
}

fn default_fft_size() -> usize {
    8192
}

fn default_peak_min_distance() -> usize {
    10
}

fn default_pattern_packets() -> usize {
    50
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables of one analysis run.
///
/// # Examples
/// ```
/// use fireshark_core::AnalysisConfig;
///
/// let config: AnalysisConfig = serde_json::from_str(r#"{"channel": 3}"#)?;
/// assert_eq!(config.channel, Some(3));
/// assert_eq!(config.fft_size, 8192);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Restrict audio analyses to one isochronous channel.
    #[serde(default)]
    pub channel: Option<u32>,
    /// Drop packets at the capture edges before audio analysis.
    #[serde(default = "default_trim_edges")]
    pub trim_edges: bool,
    #[serde(default = "default_trim")]
    pub trim_start: usize,
    #[serde(default = "default_trim")]
    pub trim_end: usize,
    #[serde(default = "default_jump_threshold")]
    pub boundary_jump_threshold: f64,
    /// Shared by all three click detectors.
    #[serde(default = "default_jump_threshold")]
    pub click_threshold: f64,
    #[serde(default = "default_highpass_cutoff_hz")]
    pub highpass_cutoff_hz: f64,
    /// Maximum number of samples fed to the spectrum.
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Minimum bin separation between reported spectral peaks.
    #[serde(default = "default_peak_min_distance")]
    pub peak_min_distance: usize,
    /// Number of packets rendered in the data/no-data pattern.
    #[serde(default = "default_pattern_packets")]
    pub pattern_packets: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            channel: None,
            trim_edges: default_trim_edges(),
            trim_start: default_trim(),
            trim_end: default_trim(),
            boundary_jump_threshold: default_jump_threshold(),
            click_threshold: default_jump_threshold(),
            highpass_cutoff_hz: default_highpass_cutoff_hz(),
            fft_size: default_fft_size(),
            peak_min_distance: default_peak_min_distance(),
            pattern_packets: default_pattern_packets(),
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded analysis config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("boundary_jump_threshold", self.boundary_jump_threshold)?;
        positive("click_threshold", self.click_threshold)?;
        positive("highpass_cutoff_hz", self.highpass_cutoff_hz)?;
        if self.fft_size == 0 {
            return Err(ConfigError::Invalid {
                field: "fft_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.peak_min_distance == 0 {
            return Err(ConfigError::Invalid {
                field: "peak_min_distance",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Edge trim as `(start, end)`, or `None` when trimming is disabled.
    pub fn edge_trim(&self) -> Option<(usize, usize)> {
        self.trim_edges.then_some((self.trim_start, self.trim_end))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisConfig, ConfigError};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_json_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.edge_trim(), Some((2, 2)));
        assert_eq!(config.pattern_packets, 50);
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"trim_edges": false, "click_threshold": 0.25}"#).unwrap();
        assert_eq!(config.edge_trim(), None);
        assert_eq!(config.click_threshold, 0.25);
        assert_eq!(config.boundary_jump_threshold, 0.1);
    }

    #[test]
    fn validate_rejects_non_positive_thresholds() {
        let config = AnalysisConfig {
            click_threshold: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "click_threshold",
                ..
            })
        ));

        let config = AnalysisConfig {
            fft_size: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "fft_size",
                ..
            })
        ));
    }

    #[test]
    fn load_reads_and_validates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"channel": 1, "fft_size": 1024}"#).unwrap();
        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.channel, Some(1));
        assert_eq!(config.fft_size, 1024);

        fs::write(&path, r#"{"boundary_jump_threshold": -1.0}"#).unwrap();
        assert!(matches!(
            AnalysisConfig::load(&path),
            Err(ConfigError::Invalid { .. })
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AnalysisConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
