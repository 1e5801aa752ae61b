pub mod capture_observer;
pub mod encoder;
pub mod microphone;
pub mod surface;
