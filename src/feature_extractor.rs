use log::debug;
use ndarray::{Array1, Array2, Axis};
use num_complex::Complex;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::config::FeatureConfig;
use crate::{AudioSample, Result, VoiceQualityError};

/// Floor applied to mel power before the dB conversion.
const AMIN: f64 = 1e-10;
/// Dynamic range kept below the loudest mel bin.
const TOP_DB: f64 = 80.0;

/// Scalar loudness plus the per-coefficient MFCC means of one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFeatures {
    /// Mean of the frame-wise RMS energy.
    pub energy: f64,
    /// Mean across frames of each cepstral coefficient, length `n_mfcc`.
    pub mfcc_mean: Array1<f64>,
}

/// Frame-wise RMS and MFCC extraction over a centered STFT.
///
/// Frames are `n_fft` samples long and advance by `hop_length`; the signal is
/// zero-padded by `n_fft / 2` on both sides so the first frame is centered on
/// sample zero. The mel filter bank uses the Slaney mel scale with area
/// normalization, log power is taken in dB with an 80 dB floor below the peak,
/// and cepstra come from an orthonormal DCT-II.
pub struct MfccExtractor {
    sample_rate: u32,
    n_mfcc: usize,
    n_fft: usize,
    hop_length: usize,
    n_mels: usize,
    window: Vec<f64>,
    mel_filters: Array2<f64>,
    dct: Array2<f64>,
}

impl MfccExtractor {
    pub fn new(sample_rate: u32, n_mfcc: usize) -> Result<Self> {
        let config = FeatureConfig {
            n_mfcc,
            ..FeatureConfig::default()
        };
        Self::with_config(sample_rate, &config)
    }

    pub fn with_config(sample_rate: u32, config: &FeatureConfig) -> Result<Self> {
        config.validate()?;
        if sample_rate == 0 {
            return Err(VoiceQualityError::invalid("sample rate must be positive"));
        }

        Ok(Self {
            sample_rate,
            n_mfcc: config.n_mfcc,
            n_fft: config.n_fft,
            hop_length: config.hop_length,
            n_mels: config.n_mels,
            window: hann_window(config.n_fft),
            mel_filters: mel_filter_bank(sample_rate, config.n_fft, config.n_mels),
            dct: dct_matrix(config.n_mfcc, config.n_mels),
        })
    }

    pub fn n_mfcc(&self) -> usize {
        self.n_mfcc
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of analysis frames produced for a signal of `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        1 + (len + 2 * (self.n_fft / 2) - self.n_fft) / self.hop_length
    }

    pub fn extract_features(&self, audio: &AudioSample) -> Result<AudioFeatures> {
        audio.validate()?;

        let padded = self.pad_center(&audio.values);
        let energy = self.mean_rms(&padded);

        let mfccs = if audio.sample_rate == self.sample_rate {
            self.compute_mfcc(&padded, &self.mel_filters)
        } else {
            debug!(
                "Building mel filter bank for {} Hz (configured for {} Hz)",
                audio.sample_rate, self.sample_rate
            );
            let filters = mel_filter_bank(audio.sample_rate, self.n_fft, self.n_mels);
            self.compute_mfcc(&padded, &filters)
        };

        let mfcc_mean = mfccs
            .mean_axis(Axis(1))
            .ok_or_else(|| VoiceQualityError::invalid("signal produced no analysis frames"))?;

        Ok(AudioFeatures { energy, mfcc_mean })
    }

    fn pad_center(&self, audio: &[f32]) -> Vec<f64> {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0; audio.len() + 2 * pad];
        for (dst, &src) in padded[pad..pad + audio.len()].iter_mut().zip(audio) {
            *dst = src as f64;
        }
        padded
    }

    fn frames<'a>(&self, padded: &'a [f64]) -> impl Iterator<Item = &'a [f64]> + 'a {        let n_fft = self.n_fft;
        let hop = self.hop_length;
        let n_frames = 1 + (padded.len() - n_fft) / hop;
        (0..n_frames).map(move |i| &padded[i * hop..i * hop + n_fft])
    }

    fn mean_rms(&self, padded: &[f64]) -> f64 {
        let (sum, count) = self.frames(padded).fold((0.0, 0usize), |(sum, count), frame| {
            let power = frame.iter().map(|x| x * x).sum::<f64>() / frame.len() as f64;
            (sum + power.sqrt(), count + 1)
        });
        sum / count as f64
    }

    fn compute_mfcc(&self, padded: &[f64], mel_filters: &Array2<f64>) -> Array2<f64> {
        let spectrogram = self.compute_power_spectrogram(padded);
        let mel_spectrogram = mel_filters.dot(&spectrogram);
        let log_mel = power_to_db(&mel_spectrogram);
        self.dct.dot(&log_mel)
    }

    fn compute_power_spectrogram(&self, padded: &[f64]) -> Array2<f64> {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(self.n_fft);

        let n_freqs = self.n_fft / 2 + 1;
        let n_frames = 1 + (padded.len() - self.n_fft) / self.hop_length;
        let mut spectrogram = Array2::zeros((n_freqs, n_frames));
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];

        for (frame_idx, frame) in self.frames(padded).enumerate() {
            for ((slot, &sample), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(sample * w, 0.0);
            }
            fft.process(&mut buffer);

            for (bin, value) in buffer.iter().take(n_freqs).enumerate() {
                spectrogram[[bin, frame_idx]] = value.norm_sqr();
            }
        }

        spectrogram
    }
}

/// Periodic Hann window.
fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

fn power_to_db(power: &Array2<f64>) -> Array2<f64> {
    let db = power.mapv(|x| 10.0 * x.max(AMIN).log10());
    let peak = db.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    let floor = peak - TOP_DB;
    db.mapv(|v| v.max(floor))
}

/// Orthonormal DCT-II basis, shape `(n_mfcc, n_mels)`.
fn dct_matrix(n_mfcc: usize, n_mels: usize) -> Array2<f64> {
    let n = n_mels as f64;
    Array2::from_shape_fn((n_mfcc, n_mels), |(k, j)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        scale * (PI * k as f64 * (2.0 * j as f64 + 1.0) / (2.0 * n)).cos()
    })
}

/// Triangular filters spaced evenly on the Slaney mel scale between 0 Hz and
/// Nyquist, each scaled to unit area. Shape `(n_mels, n_fft / 2 + 1)`.
fn mel_filter_bank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f64> {
    let sr = sample_rate as f64;
    let n_freqs = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_freqs).map(|k| k as f64 * sr / n_fft as f64).collect();

    let mel_low = hz_to_mel(0.0);
    let mel_high = hz_to_mel(sr / 2.0);
    let hz_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_low + (mel_high - mel_low) * i as f64 / (n_mels + 1) as f64)
        .map(mel_to_hz)
        .collect();

    let mut filters = Array2::zeros((n_mels, n_freqs));
    for m in 0..n_mels {
        let (left, center, right) = (hz_points[m], hz_points[m + 1], hz_points[m + 2]);
        let enorm = 2.0 / (right - left);
        for (k, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - left) / (center - left);
            let upper = (right - freq) / (right - center);
            filters[[m, k]] = lower.min(upper).max(0.0) * enorm;
        }
    }

    filters
}

const MEL_F_SP: f64 = 200.0 / 3.0;
const MEL_MIN_LOG_HZ: f64 = 1000.0;
const MEL_MIN_LOG_MEL: f64 = MEL_MIN_LOG_HZ / MEL_F_SP;

fn mel_log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MEL_MIN_LOG_HZ {
        MEL_MIN_LOG_MEL + (hz / MEL_MIN_LOG_HZ).ln() / mel_log_step()
    } else {
        hz / MEL_F_SP
    }
}

fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MEL_MIN_LOG_MEL {
        MEL_MIN_LOG_HZ * (mel_log_step() * (mel - MEL_MIN_LOG_MEL)).exp()
    } else {
        mel * MEL_F_SP
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TARGET_SAMPLE_RATE;

    fn extractor() -> MfccExtractor {
        MfccExtractor::new(TARGET_SAMPLE_RATE, 40).unwrap()
    }

    fn sine(freq: f64, amplitude: f64, len: usize) -> AudioSample {
        let values = (0..len)
            .map(|i| {
                (amplitude * (2.0 * PI * freq * i as f64 / TARGET_SAMPLE_RATE as f64).sin()) as f32
            })
            .collect();
        AudioSample::new(values, TARGET_SAMPLE_RATE)
    }

    #[test]
    fn mel_scale_round_trips() {
        for hz in [0.0, 440.0, 1000.0, 4000.0, 11025.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn filter_bank_is_non_negative_and_covers_every_band() {
        let filters = mel_filter_bank(TARGET_SAMPLE_RATE, 2048, 128);
        assert_eq!(filters.dim(), (128, 1025));
        assert!(filters.iter().all(|&w| w >= 0.0));
        for row in filters.rows() {
            assert!(row.iter().any(|&w| w > 0.0));
        }
    }

    #[test]
    fn dct_basis_is_orthonormal() {
        let dct = dct_matrix(128, 128);
        let gram = dct.dot(&dct.t());
        for i in 0..128 {
            for j in 0..128 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn frame_count_follows_centered_framing() {
        let ex = extractor();
        assert_eq!(ex.frame_count(1), 1);
        assert_eq!(ex.frame_count(512), 2);
        assert_eq!(ex.frame_count(22050), 44);
    }

    #[test]
    fn silence_has_zero_energy_and_flat_cepstrum() {
        let audio = AudioSample::new(vec![0.0; 22050], TARGET_SAMPLE_RATE);
        let features = extractor().extract_features(&audio).unwrap();

        assert_eq!(features.energy, 0.0);
        assert_eq!(features.mfcc_mean.len(), 40);
        // Every mel bin sits at the -100 dB floor; only the DC cepstral term survives.
        let expected_c0 = -100.0 * 128f64.sqrt();
        assert!((features.mfcc_mean[0] - expected_c0).abs() < 1e-6);
        assert!(features.mfcc_mean.iter().skip(1).all(|c| c.abs() < 1e-6));
    }

    #[test]
    fn sine_energy_tracks_rms_amplitude() {
        let audio = sine(440.0, 0.1, 22050 * 2);
        let features = extractor().extract_features(&audio).unwrap();
        let rms = 0.1 / 2f64.sqrt();
        // Edge frames overlap the zero padding and pull the mean slightly down.
        assert!(features.energy < rms);
        assert!(features.energy > rms * 0.95, "energy {}", features.energy);
    }

    #[test]
    fn very_short_signals_still_produce_features() {
        let audio = AudioSample::new(vec![0.2; 10], TARGET_SAMPLE_RATE);
        let features = extractor().extract_features(&audio).unwrap();
        assert!(features.energy > 0.0);
        assert!(features.mfcc_mean.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn other_sample_rates_use_their_own_filter_bank() {
        let values: Vec<f32> = (0..16000).map(|i| ((i % 40) as f32 / 40.0) - 0.5).collect();
        let audio = AudioSample::new(values, 16000);
        let features = extractor().extract_features(&audio).unwrap();
        assert_eq!(features.mfcc_mean.len(), 40);
        assert!(features.mfcc_mean.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn rejects_empty_signal() {
        let audio = AudioSample::new(Vec::new(), TARGET_SAMPLE_RATE);
        assert!(matches!(
            extractor().extract_features(&audio),
            Err(VoiceQualityError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_more_coefficients_than_mel_bands() {
        assert!(MfccExtractor::new(TARGET_SAMPLE_RATE, 129).is_err());
    }
}
