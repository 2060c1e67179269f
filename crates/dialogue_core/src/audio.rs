//! Audio - Captured microphone audio and its WAV encoding

use bytes::{BufMut, Bytes, BytesMut};

const WAV_HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;

/// Interleaved samples in [-1.0, 1.0].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl CapturedAudio {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * f32::from(self.channels))
    }
}

/// Encode as a 16-bit PCM RIFF/WAVE file.
pub fn encode_wav(audio: &CapturedAudio) -> Bytes {
    let data_len = (audio.samples.len() * 2) as u32;
    let block_align = audio.channels * BITS_PER_SAMPLE / 8;
    let byte_rate = audio.sample_rate * u32::from(block_align);

    let mut buf = BytesMut::with_capacity(WAV_HEADER_LEN + data_len as usize);
    buf.put_slice(b"RIFF");
    buf.put_u32_le(36 + data_len);
    buf.put_slice(b"WAVE");

    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(1); // PCM
    buf.put_u16_le(audio.channels);
    buf.put_u32_le(audio.sample_rate);
    buf.put_u32_le(byte_rate);
    buf.put_u16_le(block_align);
    buf.put_u16_le(BITS_PER_SAMPLE);

    buf.put_slice(b"data");
    buf.put_u32_le(data_len);
    for sample in &audio.samples {
        let s = sample.clamp(-1.0, 1.0);
        let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
        buf.put_i16_le(scaled as i16);
    }

    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_describes_pcm_stream() {
        let audio = CapturedAudio {
            samples: vec![0.0, 0.5, -0.5, 1.0],
            sample_rate: 48_000,
            channels: 2,
        };
        let wav = encode_wav(&audio);

        assert_eq!(wav.len(), 44 + 8);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 36 + 8);
        assert_eq!(u16::from_le_bytes(wav[22..24].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 48_000);
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 192_000);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 8);
    }

    #[test]
    fn samples_are_clamped_and_scaled() {
        let audio = CapturedAudio {
            samples: vec![2.0, -3.0, 0.0],
            sample_rate: 8_000,
            channels: 1,
        };
        let wav = encode_wav(&audio);
        let pcm: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(pcm, vec![i16::MAX, i16::MIN, 0]);
    }

    #[test]
    fn duration_uses_all_channels() {
        let audio = CapturedAudio {
            samples: vec![0.0; 16_000],
            sample_rate: 8_000,
            channels: 2,
        };
        assert!((audio.duration_secs() - 1.0).abs() < f32::EPSILON);
        assert_eq!(CapturedAudio::default().duration_secs(), 0.0);
    }
}
