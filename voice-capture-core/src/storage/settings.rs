use std::fs;
use std::path::Path;

use crate::models::config::RecorderConfig;
use crate::models::error::CaptureError;

/// Load recorder settings from a JSON file.
///
/// A missing file yields the defaults. Fields absent from the file take
/// their default values; the result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<RecorderConfig, CaptureError> {
    if !path.exists() {
        log::debug!("No settings at {}, using defaults", path.display());
        return Ok(RecorderConfig::default());
    }

    let json = fs::read_to_string(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read settings: {}", e)))?;
    let config: RecorderConfig = serde_json::from_str(&json)
        .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to parse settings: {}", e)))?;
    config.validate().map_err(CaptureError::ConfigurationFailed)?;
    Ok(config)
}

/// Validate and write recorder settings as pretty-printed JSON.
pub fn save_config(config: &RecorderConfig, path: &Path) -> Result<(), CaptureError> {
    config.validate().map_err(CaptureError::ConfigurationFailed)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize settings: {}", e)))?;
    fs::write(path, json).map_err(|e| CaptureError::StorageError(format!("failed to write settings: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("voice_capture_settings_{}", uuid::Uuid::new_v4()))
            .join("recorder.json")
    }

    #[test]
    fn missing_file_loads_defaults() {
        assert_eq!(load_config(&settings_path()).unwrap(), RecorderConfig::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let path = settings_path();
        let config = RecorderConfig {
            timeslice_ms: 250,
            target_sample_rate: Some(16000.0),
            acquire_timeout_ms: Some(10_000),
            ..Default::default()
        };

        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);

        if let Some(dir) = path.parent() {
            fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn partial_file_fills_defaults() {
        let path = settings_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "timeslice_ms": 40, "analyser": { "smoothing": 0.5 } }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.timeslice_ms, 40);
        assert_eq!(config.analyser.smoothing, 0.5);
        assert_eq!(config.analyser.fft_size, 256);
        assert!(config.constraints.echo_cancellation);

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let path = settings_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "analyser": { "fft_size": 300 } }"#).unwrap();
        assert!(matches!(load_config(&path), Err(CaptureError::ConfigurationFailed(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_config(&path), Err(CaptureError::ConfigurationFailed(_))));

        let bad = RecorderConfig {
            timeslice_ms: 0,
            ..Default::default()
        };
        assert!(matches!(save_config(&bad, &path), Err(CaptureError::ConfigurationFailed(_))));

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
