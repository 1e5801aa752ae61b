use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::audio_object::{hex_encode, AudioObject, RecordingMetadata};
use crate::models::error::CaptureError;
use crate::processing::wav_format::WAV_HEADER_SIZE;

/// Files written by `save_recording`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRecording {
    pub audio_path: PathBuf,
    pub metadata_path: PathBuf,
    pub metadata: RecordingMetadata,
}

/// Export a finished recording into `dir`.
///
/// Linear PCM is written as `recording_<id>.wav`; any other encoding is
/// written as-is to `recording_<id>.bin`. A JSON sidecar describing the
/// payload is written next to it.
pub fn save_recording(audio: &AudioObject, dir: &Path) -> Result<SavedRecording, CaptureError> {
    fs::create_dir_all(dir)
        .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;

    let (extension, payload) = if audio.is_linear_pcm() {
        ("wav", audio.to_wav()?)
    } else {
        ("bin", audio.data.clone())
    };
    let audio_path = dir.join(format!("recording_{}.{}", audio.id, extension));
    fs::write(&audio_path, payload)
        .map_err(|e| CaptureError::StorageError(format!("failed to write recording: {}", e)))?;

    let metadata = audio.metadata(&audio_path.to_string_lossy());
    let metadata_path = write_metadata(&metadata, &audio_path)?;
    log::info!(
        "Saved recording {} ({} bytes) to {}",
        audio.id,
        audio.data.len(),
        audio_path.display()
    );

    Ok(SavedRecording {
        audio_path,
        metadata_path,
        metadata,
    })
}

/// Sidecar location for a recording: `recording_x.wav` → `recording_x.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json).map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))
}

/// Check a saved recording's payload against the checksum in its sidecar.
pub fn verify_recording(recording_path: &Path) -> Result<bool, CaptureError> {
    let metadata = read_metadata(recording_path)?;
    let bytes = fs::read(recording_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read recording: {}", e)))?;

    let payload = if recording_path.extension().is_some_and(|ext| ext == "wav") {
        bytes.get(WAV_HEADER_SIZE..).unwrap_or_default()
    } else {
        &bytes[..]
    };
    if payload.len() != metadata.byte_length {
        log::warn!(
            "Recording {} is {} bytes, metadata says {}",
            recording_path.display(),
            payload.len(),
            metadata.byte_length
        );
        return Ok(false);
    }
    Ok(hex_encode(&Sha256::digest(payload)) == metadata.checksum)
}
