use serde::Deserialize;

use crate::blend::BlendParameters;
use crate::Result;

/// Id of the optional inline JSON block the page may carry.
pub const CONFIG_ELEMENT_ID: &str = "viewer-config";

/// Page-level settings. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub canvas_id: String,
    /// Initial slider positions.
    pub blend: BlendParameters,
    /// Delay between attempts to read source dimensions.
    pub metadata_retry_ms: f64,
    /// `facingMode` hint passed to `getUserMedia`.
    pub camera_facing: String,
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            canvas_id: "viewer".to_string(),
            blend: BlendParameters::default(),
            metadata_retry_ms: 100.0,
            camera_facing: "environment".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parsed `log_level`, `Info` when unrecognised.
    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ViewerConfig::default());
        assert_eq!(cfg.blend.decay, 0.93);
        assert_eq!(cfg.level(), log::Level::Info);
    }

    #[test]
    fn partial_override() {
        let cfg = ViewerConfig::from_json(
            r#"{ "blend": { "decay": 0.5 }, "metadata_retry_ms": 250, "log_level": "debug" }"#,
        )
        .unwrap();
        assert_eq!(cfg.blend.decay, 0.5);
        assert_eq!(cfg.blend.contrast, 1.0);
        assert_eq!(cfg.metadata_retry_ms, 250.0);
        assert_eq!(cfg.level(), log::Level::Debug);
        assert_eq!(cfg.canvas_id, "viewer");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = ViewerConfig::from_json("{ decay").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn unknown_level_falls_back() {
        let cfg = ViewerConfig {
            log_level: "chatty".into(),
            ..ViewerConfig::default()
        };
        assert_eq!(cfg.level(), log::Level::Info);
    }
}
