//! Text, chart and export renderings of a [`QualityResult`].

use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

use crate::classifier::COEFFICIENT_DECIMALS;
use crate::{QualityResult, Result};

const CHART_WIDTH: usize = 40;

pub const COACHING_TEXT: &str = "\
MFCC values show which parts of the voice need practice. They are not right or wrong, only a guide.

Tips for practice:
- Practice in a quiet place.
- Watch your mouth in a mirror while speaking.
- Record and listen to your own voice.
- Regular practice makes the voice better.

Your voice is unique and can keep improving. Keep going!";

/// One exported row. Column names match the download format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRecord {
    #[serde(rename = "FileName")]
    pub file_name: String,
    #[serde(rename = "Quality")]
    pub quality: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Energy")]
    pub energy: f64,
    #[serde(rename = "MFCC[0]")]
    pub mfcc_0: f64,
    #[serde(rename = "MFCC[1]")]
    pub mfcc_1: f64,
    #[serde(rename = "MFCC[2]")]
    pub mfcc_2: f64,
    #[serde(rename = "MFCC[3]")]
    pub mfcc_3: f64,
    #[serde(rename = "MFCC[4]")]
    pub mfcc_4: f64,
    #[serde(rename = "MFCC[5]")]
    pub mfcc_5: f64,
    #[serde(rename = "MFCC[6]")]
    pub mfcc_6: f64,
    #[serde(rename = "MFCC[7]")]
    pub mfcc_7: f64,
    #[serde(rename = "MFCC[8]")]
    pub mfcc_8: f64,
    #[serde(rename = "MFCC[9]")]
    pub mfcc_9: f64,
}

impl QualityRecord {
    pub fn new(file_name: &str, result: &QualityResult) -> Self {
        let c = |i: usize| result.top_coefficients.get(i).map_or(0.0, |c| c.value);
        Self {
            file_name: file_name.to_string(),
            quality: result.label.as_str().to_string(),
            description: result.description.clone(),
            energy: result.energy,
            mfcc_0: c(0),
            mfcc_1: c(1),
            mfcc_2: c(2),
            mfcc_3: c(3),
            mfcc_4: c(4),
            mfcc_5: c(5),
            mfcc_6: c(6),
            mfcc_7: c(7),
            mfcc_8: c(8),
            mfcc_9: c(9),
        }
    }
}

/// Writes a header row and exactly one data row.
pub fn write_quality_csv<W: Write>(writer: W, record: &QualityRecord) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

pub fn to_json(result: &QualityResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn render_summary(file_name: &str, result: &QualityResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Voice quality: {} {}",
        result.label.symbol(),
        result.label
    );
    let _ = writeln!(out, "Description:   {}", result.description);
    let _ = writeln!(out, "Mean energy:   {}", result.energy);
    let _ = writeln!(out);
    let _ = writeln!(out, "MFCC[0-9] interpretation:");
    for insight in &result.top_coefficients {
        let _ = writeln!(
            out,
            "- MFCC[{}] = {:.prec$}  {}",
            insight.index,
            insight.value,
            insight.interpretation,
            prec = COEFFICIENT_DECIMALS as usize
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", COACHING_TEXT);
    let _ = writeln!(out);
    let _ = write!(
        out,
        "File {} is classified as: {} {}",
        file_name,
        result.label.symbol(),
        result.label
    );
    out
}

/// Plots each value as a marker on its own row, scaled between the minimum
/// and maximum of `values`, followed by the value itself.
pub fn render_coefficient_chart(values: &[f64]) -> String {
    let mut out = String::new();
    if values.is_empty() {
        return out;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let _ = writeln!(out, "Mean MFCC (first {})", values.len());
    for (i, &value) in values.iter().enumerate() {
        let pos = if span > 0.0 {
            (((value - min) / span) * (CHART_WIDTH - 1) as f64).round() as usize
        } else {
            0
        };
        let mut row = vec![' '; CHART_WIDTH];
        row[pos] = 'o';
        let _ = writeln!(
            out,
            "MFCC[{:>2}] |{}| {:>10.prec$}",
            i,
            row.into_iter().collect::<String>(),
            value,
            prec = COEFFICIENT_DECIMALS as usize
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{CoefficientInsight, MFCC_INTERPRETATIONS};
    use crate::QualityLabel;

    fn sample_result() -> QualityResult {
        QualityResult {
            label: QualityLabel::Good,
            description: QualityLabel::Good.description().to_string(),
            energy: 0.04321,
            top_coefficients: (0..10)
                .map(|i| CoefficientInsight {
                    index: i,
                    value: i as f64 * 1.5,
                    interpretation: MFCC_INTERPRETATIONS[i],
                })
                .collect(),
            mfcc_mean: (0..40).map(|i| i as f64 * 1.5).collect(),
        }
    }

    #[test]
    fn csv_export_has_header_and_one_row() {
        let record = QualityRecord::new("voice.wav", &sample_result());
        let mut buf = Vec::new();
        write_quality_csv(&mut buf, &record).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "FileName,Quality,Description,Energy,MFCC[0],MFCC[1],MFCC[2],MFCC[3],MFCC[4],\
             MFCC[5],MFCC[6],MFCC[7],MFCC[8],MFCC[9]"
        );
        assert!(lines[1].starts_with("voice.wav,Good,Clear and stable voice.,0.04321,"));
        assert!(lines[1].ends_with(",13.5"));
    }

    #[test]
    fn summary_lists_every_interpretation() {
        let text = render_summary("voice.wav", &sample_result());
        assert!(text.contains("Voice quality: 🟩 Good"));
        for line in MFCC_INTERPRETATIONS {
            assert!(text.contains(line));
        }
        assert!(text.ends_with("File voice.wav is classified as: 🟩 Good"));
    }

    #[test]
    fn chart_has_one_row_per_value() {
        let result = sample_result();
        let chart = render_coefficient_chart(result.chart_values());
        assert_eq!(chart.lines().count(), 21);
        assert!(chart.lines().nth(1).unwrap().starts_with("MFCC[ 0] |o"));
    }

    #[test]
    fn chart_of_flat_values_does_not_divide_by_zero() {
        let chart = render_coefficient_chart(&[1.0, 1.0]);
        assert_eq!(chart.lines().count(), 3);
    }

    #[test]
    fn json_carries_label_and_coefficients() {
        let json = to_json(&sample_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["label"], "Good");
        assert_eq!(value["top_coefficients"].as_array().unwrap().len(), 10);
    }
}
