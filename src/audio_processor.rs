use hound::{SampleFormat, WavReader};
use log::debug;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::{Result, VoiceQualityError};

/// Rate every decoded recording is resampled to before feature extraction.
pub const TARGET_SAMPLE_RATE: u32 = 22050;

/// Decoded mono signal, amplitudes normalized to [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    pub values: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSample {
    pub fn new(values: Vec<f32>, sample_rate: u32) -> Self {
        Self { values, sample_rate }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.values.len() as f32 / self.sample_rate as f32
    }

    /// Rejects signals the feature pipeline cannot produce a defined result for.
    pub fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(VoiceQualityError::invalid("sample sequence is empty"));
        }
        if self.sample_rate == 0 {
            return Err(VoiceQualityError::invalid("sample rate must be positive"));
        }
        if let Some(pos) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(VoiceQualityError::invalid(format!(
                "non-finite sample at index {}",
                pos
            )));
        }
        Ok(())
    }
}

pub struct AudioProcessor {
    target_sample_rate: u32,
}

impl Default for AudioProcessor {
    fn default() -> Self {
        Self::new(TARGET_SAMPLE_RATE)
    }
}

impl AudioProcessor {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    pub fn load_audio_file<P: AsRef<Path>>(&self, path: P) -> Result<AudioSample> {
        let reader = WavReader::open(path)?;
        self.decode(reader)
    }

    /// Decodes an in-memory `.wav` upload.
    pub fn load_audio_bytes(&self, bytes: &[u8]) -> Result<AudioSample> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        self.decode(reader)
    }

    fn decode<R: Read>(&self, mut reader: WavReader<R>) -> Result<AudioSample> {
        let spec = reader.spec();
        debug!(
            "WAV spec: {} Hz, {} channel(s), {} bits, {:?}",
            spec.sample_rate, spec.channels, spec.bits_per_sample, spec.sample_format
        );

        let interleaved = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|sample| sample as f32 / scale))
                    .collect::<std::result::Result<Vec<f32>, _>>()?
            }
        };

        if interleaved.is_empty() {
            return Err(VoiceQualityError::invalid("audio file contains no samples"));
        }

        let mut processed_audio = if spec.channels > 1 {
            self.downmix(&interleaved, spec.channels as usize)
        } else {
            interleaved
        };

        if spec.sample_rate != self.target_sample_rate {
            processed_audio =
                self.resample(&processed_audio, spec.sample_rate, self.target_sample_rate);
        }

        Ok(AudioSample::new(processed_audio, self.target_sample_rate))
    }

    fn downmix(&self, interleaved: &[f32], channels: usize) -> Vec<f32> {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    }

    /// Linear interpolation resampling.
    fn resample(&self, audio: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
        if audio.is_empty() || from_rate == 0 {
            return Vec::new();
        }
        let ratio = to_rate as f64 / from_rate as f64;
        let new_length = ((audio.len() as f64 * ratio) as usize).max(1);
        let last = audio.len() - 1;

        (0..new_length)
            .map(|i| {
                let src_index = i as f64 / ratio;
                let floor = (src_index.floor() as usize).min(last);
                let ceil = (floor + 1).min(last);
                let fraction = (src_index - floor as f64) as f32;
                audio[floor] * (1.0 - fraction) + audio[ceil] * fraction
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn wav_bytes_i16(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn normalizes_int_samples_by_bit_depth() {
        let bytes = wav_bytes_i16(&[16384, -32768, 0], 1, TARGET_SAMPLE_RATE);
        let audio = AudioProcessor::default().load_audio_bytes(&bytes).unwrap();
        assert_eq!(audio.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(audio.values, vec![0.5, -1.0, 0.0]);
    }

    #[test]
    fn downmixes_interleaved_channels() {
        let bytes = wav_bytes_i16(&[16384, 0, -16384, -16384], 2, TARGET_SAMPLE_RATE);
        let audio = AudioProcessor::default().load_audio_bytes(&bytes).unwrap();
        assert_eq!(audio.values, vec![0.25, -0.5]);
    }

    #[test]
    fn resamples_to_target_rate() {
        let samples = vec![8192i16; 11025];
        let bytes = wav_bytes_i16(&samples, 1, 11025);
        let audio = AudioProcessor::default().load_audio_bytes(&bytes).unwrap();
        assert_eq!(audio.sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(audio.values.len(), 22050);
        assert!(audio.values.iter().all(|&v| (v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn empty_wav_is_invalid_input() {
        let bytes = wav_bytes_i16(&[], 1, TARGET_SAMPLE_RATE);
        let err = AudioProcessor::default().load_audio_bytes(&bytes).unwrap_err();
        assert!(matches!(err, VoiceQualityError::InvalidInput(_)));
    }

    #[test]
    fn garbage_bytes_are_decode_errors() {
        let err = AudioProcessor::default()
            .load_audio_bytes(b"definitely not a wav file")
            .unwrap_err();
        assert!(matches!(err, VoiceQualityError::Decode(_)));
    }

    #[test]
    fn validate_rejects_bad_signals() {
        assert!(AudioSample::new(vec![], 22050).validate().is_err());
        assert!(AudioSample::new(vec![0.1], 0).validate().is_err());
        assert!(AudioSample::new(vec![0.1, f32::NAN], 22050).validate().is_err());
        assert!(AudioSample::new(vec![0.1], 22050).validate().is_ok());
    }
}
