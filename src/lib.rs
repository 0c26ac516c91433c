pub mod audio_processor;
pub mod classifier;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod region;
pub mod report;

pub use audio_processor::{AudioProcessor, AudioSample, TARGET_SAMPLE_RATE};
pub use classifier::{CoefficientInsight, QualityResult, VoiceQualityClassifier};
pub use config::AppConfig;
pub use error::{Result, VoiceQualityError};
pub use feature_extractor::{AudioFeatures, MfccExtractor};
pub use region::{AdminLevel, RegionFilter, RegionTable};

use serde::{Deserialize, Serialize};

/// Mean RMS energy below which a recording is rated [`QualityLabel::Poor`].
pub const POOR_ENERGY_THRESHOLD: f64 = 0.01;

/// Mean RMS energy from which a recording is rated [`QualityLabel::Good`].
pub const GOOD_ENERGY_THRESHOLD: f64 = 0.03;

/// Three-tier voice quality rating keyed by mean RMS energy.
///
/// | Label  | Energy range        |
/// |--------|---------------------|
/// | Poor   | `< 0.01`            |
/// | Medium | `0.01 <= e < 0.03`  |
/// | Good   | `>= 0.03`           |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityLabel {
    Good,
    Medium,
    Poor,
}

impl QualityLabel {
    /// Both interval bounds are closed on the lower side. NaN rates as Poor.
    pub fn from_energy(energy: f64) -> Self {
        if energy >= GOOD_ENERGY_THRESHOLD {
            QualityLabel::Good
        } else if energy >= POOR_ENERGY_THRESHOLD {
            QualityLabel::Medium
        } else {
            QualityLabel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::Good => "Good",
            QualityLabel::Medium => "Medium",
            QualityLabel::Poor => "Poor",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            QualityLabel::Good => "🟩",
            QualityLabel::Medium => "🟨",
            QualityLabel::Poor => "🟥",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            QualityLabel::Good => "Clear and stable voice.",
            QualityLabel::Medium => "Fairly clear voice with some interference.",
            QualityLabel::Poor => "Very quiet or noisy signal.",
        }
    }
}

impl std::fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_have_closed_lower_bounds() {
        assert_eq!(QualityLabel::from_energy(0.01), QualityLabel::Medium);
        assert_eq!(QualityLabel::from_energy(0.03), QualityLabel::Good);
        assert_eq!(QualityLabel::from_energy(0.0099), QualityLabel::Poor);
        assert_eq!(QualityLabel::from_energy(0.0299), QualityLabel::Medium);
    }

    #[test]
    fn extremes() {
        assert_eq!(QualityLabel::from_energy(0.0), QualityLabel::Poor);
        assert_eq!(QualityLabel::from_energy(1.0), QualityLabel::Good);
        assert_eq!(QualityLabel::from_energy(f64::NAN), QualityLabel::Poor);
    }

    #[test]
    fn poor_description_mentions_quiet_signal() {
        assert!(QualityLabel::Poor.description().contains("quiet"));
        assert_eq!(QualityLabel::Medium.to_string(), "Medium");
    }
}
