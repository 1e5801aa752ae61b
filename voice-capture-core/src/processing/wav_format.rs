//! RIFF/WAV framing for exported linear PCM, plus channel downmixing.

/// Size of the canonical PCM WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Build a canonical 44-byte PCM WAV header (format code 1, little-endian).
///
/// ```text
/// "RIFF" <36 + data_size> "WAVE"
/// "fmt " <16> <1> <channels> <sample_rate> <byte_rate> <block_align> <bit_depth>
/// "data" <data_size>
/// ```
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let block_align = channels * (bit_depth / 8);
    let byte_rate = sample_rate * block_align as u32;

    let mut header = [0u8; WAV_HEADER_SIZE];
    let fields: [&[u8]; 13] = [
        b"RIFF",
        &(36 + data_size).to_le_bytes(),
        b"WAVE",
        b"fmt ",
        &16u32.to_le_bytes(),
        &1u16.to_le_bytes(),
        &channels.to_le_bytes(),
        &sample_rate.to_le_bytes(),
        &byte_rate.to_le_bytes(),
        &block_align.to_le_bytes(),
        &bit_depth.to_le_bytes(),
        b"data",
        &data_size.to_le_bytes(),
    ];

    let mut offset = 0;
    for field in fields {
        header[offset..offset + field.len()].copy_from_slice(field);
        offset += field.len();
    }
    header
}

/// Average interleaved frames down to one channel.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}
