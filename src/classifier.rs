use log::{debug, info};
use serde::Serialize;

use crate::config::FeatureConfig;
use crate::{AudioSample, MfccExtractor, QualityLabel, Result, VoiceQualityError};

/// Leading coefficients reported with an interpretation.
pub const TOP_COEFFICIENTS: usize = 10;
/// Leading coefficients shown on the chart.
pub const CHART_COEFFICIENTS: usize = 20;
pub const ENERGY_DECIMALS: i32 = 5;
pub const COEFFICIENT_DECIMALS: i32 = 3;

/// Plain-language reading of MFCC[0]..MFCC[9], each with a practice hint.
pub const MFCC_INTERPRETATIONS: [&str; TOP_COEFFICIENTS] = [
    "Voice strength: a low value means a quiet voice. Practice: speak louder.",
    "Thick or thin voice. Practice: say the vowels 'O' and 'U' fully.",
    "Intonation. Practice: say sentences as if singing them.",
    "Voice stability. Practice: speak slowly and steadily.",
    "Clarity of middle sounds. Practice: say 'kata', 'satu', 'kita'.",
    "Hiss or interference. Practice: speak in a quiet room.",
    "Voice pitched too high. Practice: relax and let the mouth open naturally.",
    "Word clarity. Practice: speak in front of a mirror.",
    "Fine voice detail. Practice: speak slowly and clearly.",
    "Shaky or distorted voice. Practice: speak with long breaths.",
];

/// Rounds half to even on the scaled value, so `0.125` at two decimals
/// becomes `0.12` and `0.375` becomes `0.38`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientInsight {
    pub index: usize,
    /// Mean coefficient rounded to [`COEFFICIENT_DECIMALS`].
    pub value: f64,
    pub interpretation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityResult {
    pub label: QualityLabel,
    pub description: String,
    /// Mean RMS energy rounded to [`ENERGY_DECIMALS`].
    pub energy: f64,
    pub top_coefficients: Vec<CoefficientInsight>,
    /// Full-precision mean of every extracted coefficient.
    pub mfcc_mean: Vec<f64>,
}

impl QualityResult {
    /// Unrounded leading coefficients for plotting.
    pub fn chart_values(&self) -> &[f64] {
        let n = self.mfcc_mean.len().min(CHART_COEFFICIENTS);
        &self.mfcc_mean[..n]
    }
}

/// Rates a recording from its mean RMS energy and reports its leading MFCCs.
pub struct VoiceQualityClassifier {
    extractor: MfccExtractor,
}

impl VoiceQualityClassifier {
    pub fn new(sample_rate: u32) -> Result<Self> {
        Self::with_config(sample_rate, &FeatureConfig::default())
    }

    pub fn with_config(sample_rate: u32, config: &FeatureConfig) -> Result<Self> {
        Self::from_extractor(MfccExtractor::with_config(sample_rate, config)?)
    }

    pub fn from_extractor(extractor: MfccExtractor) -> Result<Self> {
        if extractor.n_mfcc() < TOP_COEFFICIENTS {
            return Err(VoiceQualityError::Config(format!(
                "classifier needs at least {} coefficients, extractor yields {}",
                TOP_COEFFICIENTS,
                extractor.n_mfcc()
            )));
        }
        Ok(Self { extractor })
    }

    pub fn classify(&self, audio: &AudioSample) -> Result<QualityResult> {
        let features = self.extractor.extract_features(audio)?;
        let label = QualityLabel::from_energy(features.energy);

        debug!(
            "{} samples at {} Hz: energy {:.6}",
            audio.values.len(),
            audio.sample_rate,
            features.energy
        );
        info!("Classified recording as {}", label);

        let top_coefficients = features
            .mfcc_mean
            .iter()
            .zip(MFCC_INTERPRETATIONS)
            .enumerate()
            .map(|(index, (&value, interpretation))| CoefficientInsight {
                index,
                value: round_to(value, COEFFICIENT_DECIMALS),
                interpretation,
            })
            .collect();

        Ok(QualityResult {
            label,
            description: label.description().to_string(),
            energy: round_to(features.energy, ENERGY_DECIMALS),
            top_coefficients,
            mfcc_mean: features.mfcc_mean.to_vec(),
        })
    }
}
