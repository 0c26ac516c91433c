//! Runtime configuration loaded from an optional JSON file.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.
//! Quality thresholds are fixed constants in the crate root, not settings.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::classifier::TOP_COEFFICIENTS;
use crate::{Result, VoiceQualityError, TARGET_SAMPLE_RATE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub region: RegionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Rate decoded audio is resampled to before analysis.
    pub target_sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: TARGET_SAMPLE_RATE,
        }
    }
}

/// STFT and cepstrum parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// FFT size and RMS frame length in samples
    pub n_fft: usize,
    /// Frame advance in samples
    pub hop_length: usize,
    /// Number of mel filters
    pub n_mels: usize,
    /// Cepstral coefficients kept per frame
    pub n_mfcc: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            n_mfcc: 40,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_fft < 2 || self.n_fft % 2 != 0 {
            return Err(VoiceQualityError::Config(format!(
                "n_fft must be an even number of at least 2, got {}",
                self.n_fft
            )));
        }
        if self.hop_length == 0 {
            return Err(VoiceQualityError::Config("hop_length must be positive".into()));
        }
        if self.n_mels == 0 {
            return Err(VoiceQualityError::Config("n_mels must be positive".into()));
        }
        if self.n_mfcc < TOP_COEFFICIENTS {
            return Err(VoiceQualityError::Config(format!(
                "n_mfcc must be at least {}, got {}",
                TOP_COEFFICIENTS, self.n_mfcc
            )));
        }
        if self.n_mfcc > self.n_mels {
            return Err(VoiceQualityError::Config(format!(
                "n_mfcc ({}) cannot exceed n_mels ({})",
                self.n_mfcc, self.n_mels
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Field separator of the regional CSV, both for reading and export.
    pub delimiter: char,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self { delimiter: ';' }
    }
}

impl RegionConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            return Err(VoiceQualityError::Config(format!(
                "delimiter {:?} is not ASCII",
                self.delimiter
            )));
        }
        Ok(self.delimiter as u8)
    }
}

impl AppConfig {
    /// Loads `path` when it exists, defaults otherwise.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let config = match path {
            Some(path) if path.as_ref().exists() => {
                let path = path.as_ref();
                info!("Loading configuration from {}", path.display());
                let content = fs::read_to_string(path)?;
                serde_json::from_str(&content)?
            }
            _ => AppConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.audio.target_sample_rate == 0 {
            return Err(VoiceQualityError::Config(
                "target_sample_rate must be positive".into(),
            ));
        }
        self.features.validate()?;
        self.region.delimiter_byte()?;
        Ok(())
    }
}
