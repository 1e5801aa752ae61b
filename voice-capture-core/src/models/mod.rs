pub mod audio;
pub mod audio_object;
pub mod config;
pub mod error;
pub mod state;
