pub mod analyser;
pub mod chunker;
pub mod level_analyzer;
pub mod pcm;
pub mod pcm_encoder;
pub mod ring_buffer;
pub mod wav_format;
