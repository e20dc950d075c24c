use crate::core::{
    AnchorId, AnchorTable, OutputRounding, SlotAlignment, WireFormat, AT_RANGE_SMOOTHING_ALPHA,
    DEFAULT_DETERMINANT_TOLERANCE, DEFAULT_FLUCTUATION_THRESHOLD_CM, JSON_SMOOTHING_ALPHA,
    MAX_FLUCTUATION_THRESHOLD_CM, MIN_ANCHORS,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Processing parameters of the positioning pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Range hysteresis and position dead-zone threshold (cm, 0-100)
    pub fluctuation_threshold_cm: f64,
    /// Smallest normal-matrix determinant accepted by the solver
    pub determinant_tolerance: f64,
    /// Known anchors required before solving (at least 3)
    pub min_anchors: usize,
    /// Settings for `AT+RANGE` lines
    pub at_range: FormatSettings,
    /// Settings for JSON lines
    pub json: FormatSettings,
}

/// Per wire format processing choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSettings {
    /// Weight of the new solve in the position blend (0 < alpha <= 1)
    pub smoothing_alpha: f64,
    /// Representation of reported coordinates
    pub rounding: OutputRounding,
    /// Run the per-slot range hysteresis before solving
    pub range_filter: bool,
}

/// Individual anchor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    pub id: AnchorId,
    /// Position in centimeters
    pub x: f64,
    pub y: f64,
}

/// On-disk configuration layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub anchors: Vec<AnchorConfig>,
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("I/O error: {message}")]
    IoError { message: String },
    #[error("serialization error: {message}")]
    SerializationError { message: String },
    #[error("anchor {anchor_id}: {reason}")]
    AnchorConflict { anchor_id: AnchorId, reason: String },
}

/// Validation outcome with non-fatal remarks
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn into_result(self) -> Result<Vec<String>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.warnings),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fluctuation_threshold_cm: DEFAULT_FLUCTUATION_THRESHOLD_CM,
            determinant_tolerance: DEFAULT_DETERMINANT_TOLERANCE,
            min_anchors: MIN_ANCHORS,
            at_range: FormatSettings::at_range(),
            json: FormatSettings::json(),
        }
    }
}

impl FormatSettings {
    /// Integer output, light smoothing, no range filter
    pub fn at_range() -> Self {
        Self {
            smoothing_alpha: AT_RANGE_SMOOTHING_ALPHA,
            rounding: OutputRounding::Integer,
            range_filter: false,
        }
    }

    /// Floating point output, stronger smoothing, range filter on
    pub fn json() -> Self {
        Self {
            smoothing_alpha: JSON_SMOOTHING_ALPHA,
            rounding: OutputRounding::Float,
            range_filter: true,
        }
    }
}

impl PipelineConfig {
    pub fn format(&self, format: WireFormat) -> &FormatSettings {
        match format {
            WireFormat::AtRange => &self.at_range,
            WireFormat::Json => &self.json,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Err(error) = validate_threshold(self.fluctuation_threshold_cm) {
            errors.push(error);
        } else if self.fluctuation_threshold_cm == 0.0 {
            warnings.push("Zero fluctuation threshold disables jitter suppression".to_string());
        }

        if !(self.determinant_tolerance > 0.0 && self.determinant_tolerance.is_finite()) {
            errors.push(ConfigError::InvalidParameter {
                parameter: "determinant_tolerance".to_string(),
                value: self.determinant_tolerance.to_string(),
                reason: "Determinant tolerance must be a positive number".to_string(),
            });
        }

        if self.min_anchors < MIN_ANCHORS {
            errors.push(ConfigError::InvalidParameter {
                parameter: "min_anchors".to_string(),
                value: self.min_anchors.to_string(),
                reason: format!("At least {} anchors are required for a 2-D fix", MIN_ANCHORS),
            });
        }

        for (name, format) in [("at_range", WireFormat::AtRange), ("json", WireFormat::Json)] {
            let settings = self.format(format);
            if settings.range_filter && format.alignment() == SlotAlignment::Prefiltered {
                warnings.push(format!(
                    "{}.range_filter has no effect: slots are compacted at decode time",
                    name
                ));
            }

            let alpha = settings.smoothing_alpha;
            if !(alpha > 0.0 && alpha <= 1.0) {
                errors.push(ConfigError::InvalidParameter {
                    parameter: format!("{}.smoothing_alpha", name),
                    value: alpha.to_string(),
                    reason: "Smoothing factor must be in (0, 1]".to_string(),
                });
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Check a fluctuation threshold against the accepted 0-100 cm range
pub fn validate_threshold(threshold_cm: f64) -> Result<f64, ConfigError> {
    if (0.0..=MAX_FLUCTUATION_THRESHOLD_CM).contains(&threshold_cm) {
        Ok(threshold_cm)
    } else {
        Err(ConfigError::InvalidParameter {
            parameter: "fluctuation_threshold_cm".to_string(),
            value: threshold_cm.to_string(),
            reason: format!("Threshold must be between 0 and {} cm", MAX_FLUCTUATION_THRESHOLD_CM),
        })
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            anchors: default_anchors(),
        }
    }
}

/// 130 cm square used when nothing has been configured yet
pub fn default_anchors() -> Vec<AnchorConfig> {
    [(0, 0.0, 0.0), (1, 130.0, 0.0), (2, 130.0, 130.0), (3, 0.0, 130.0)]
        .into_iter()
        .map(|(id, x, y)| AnchorConfig { id, x, y })
        .collect()
}

/// Owns the pipeline settings and the anchor layout
pub struct ConfigurationManager {
    pipeline_config: PipelineConfig,
    anchor_configs: BTreeMap<AnchorId, AnchorConfig>,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Default settings with the default anchor square
    pub fn new() -> Self {
        let defaults = ConfigFile::default();
        Self {
            pipeline_config: defaults.pipeline,
            anchor_configs: defaults.anchors.into_iter().map(|a| (a.id, a)).collect(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config_data: ConfigFile = serde_json::from_str(&content).map_err(|e| {
            ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            }
        })?;

        for warning in config_data.pipeline.validate().into_result()? {
            warn!(path = %path_str, "{}", warning);
        }

        let mut anchors = BTreeMap::new();
        for anchor in config_data.anchors {
            validate_anchor(&anchor)?;
            if anchors.contains_key(&anchor.id) {
                return Err(ConfigError::AnchorConflict {
                    anchor_id: anchor.id,
                    reason: "Duplicate anchor id".to_string(),
                });
            }
            anchors.insert(anchor.id, anchor);
        }
        if anchors.is_empty() {
            debug!(path = %path_str, "no anchors configured, using default layout");
            anchors = default_anchors().into_iter().map(|a| (a.id, a)).collect();
        }

        self.pipeline_config = config_data.pipeline;
        self.anchor_configs = anchors;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let config_data = ConfigFile {
            pipeline: self.pipeline_config.clone(),
            anchors: self.anchor_configs.values().cloned().collect(),
        };

        let content = serde_json::to_string_pretty(&config_data).map_err(|e| {
            ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            }
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.pipeline_config
    }

    /// Update the fluctuation threshold; returns the previous value
    pub fn set_fluctuation_threshold(&mut self, threshold_cm: f64) -> Result<f64, ConfigError> {
        let threshold_cm = validate_threshold(threshold_cm)?;
        let old = self.pipeline_config.fluctuation_threshold_cm;
        self.pipeline_config.fluctuation_threshold_cm = threshold_cm;
        self.is_modified = true;
        Ok(old)
    }

    /// Insert or move an anchor
    pub fn set_anchor(&mut self, anchor: AnchorConfig) -> Result<Option<AnchorConfig>, ConfigError> {
        validate_anchor(&anchor)?;
        self.is_modified = true;
        Ok(self.anchor_configs.insert(anchor.id, anchor))
    }

    pub fn remove_anchor(&mut self, id: AnchorId) -> Option<AnchorConfig> {
        let removed = self.anchor_configs.remove(&id);
        if removed.is_some() {
            self.is_modified = true;
        }
        removed
    }

    pub fn anchors(&self) -> impl Iterator<Item = &AnchorConfig> {
        self.anchor_configs.values()
    }

    /// Snapshot of the anchor layout for the pipeline
    pub fn anchor_table(&self) -> AnchorTable {
        self.anchor_configs.values().map(|a| (a.id, a.x, a.y)).collect()
    }
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_anchor(anchor: &AnchorConfig) -> Result<(), ConfigError> {
    if !(anchor.x.is_finite() && anchor.y.is_finite()) {
        return Err(ConfigError::AnchorConflict {
            anchor_id: anchor.id,
            reason: format!("Non-finite position ({}, {})", anchor.x, anchor.y),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let manager = ConfigurationManager::new();
        let config = manager.pipeline_config();

        assert_eq!(config.fluctuation_threshold_cm, 10.0);
        assert_eq!(config.format(WireFormat::AtRange).smoothing_alpha, 0.2);
        assert_eq!(config.format(WireFormat::Json).smoothing_alpha, 0.4);
        assert!(config.validate().is_valid);

        let table = manager.anchor_table();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(2).map(|p| (p.x, p.y)), Some((130.0, 130.0)));
    }

    #[test]
    fn test_threshold_bounds() {
        let mut manager = ConfigurationManager::new();
        assert_eq!(manager.set_fluctuation_threshold(25.0), Ok(10.0));
        assert!(manager.is_modified());
        assert!(manager.set_fluctuation_threshold(100.5).is_err());
        assert!(manager.set_fluctuation_threshold(-1.0).is_err());
        assert_eq!(manager.pipeline_config().fluctuation_threshold_cm, 25.0);
    }

    #[test]
    fn test_invalid_pipeline_config() {
        let mut config = PipelineConfig::default();
        config.json.smoothing_alpha = 0.0;
        config.min_anchors = 2;

        let result = config.validate();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_range_filter_on_prefiltered_format_warns() {
        let mut config = PipelineConfig::default();
        assert!(config.validate().warnings.is_empty());

        config.at_range.range_filter = true;
        let result = config.validate();
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("at_range.range_filter"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positioning.json");

        let mut manager = ConfigurationManager::new();
        manager.set_anchor(AnchorConfig { id: 7, x: 250.0, y: -40.5 }).unwrap();
        manager.remove_anchor(0);
        manager.set_fluctuation_threshold(15.0).unwrap();
        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.pipeline_config(), manager.pipeline_config());
        assert_eq!(loaded.anchor_table(), manager.anchor_table());
        assert!(!loaded.anchor_table().contains(0));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(
            &path,
            r#"{"pipeline":{"fluctuation_threshold_cm":5.0},"anchors":[]}"#,
        )
        .unwrap();

        let manager = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(manager.pipeline_config().fluctuation_threshold_cm, 5.0);
        assert_eq!(manager.pipeline_config().json, FormatSettings::json());
        assert_eq!(manager.anchor_table().len(), 4);
    }

    #[test]
    fn test_duplicate_anchor_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.json");
        fs::write(
            &path,
            r#"{"anchors":[{"id":1,"x":0,"y":0},{"id":1,"x":5,"y":5}]}"#,
        )
        .unwrap();

        assert!(matches!(
            ConfigurationManager::from_file(&path),
            Err(ConfigError::AnchorConflict { anchor_id: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ConfigurationManager::from_file("/nonexistent/positioning.json");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
