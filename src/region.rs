//! Regional hearing-impairment counts loaded from a delimited CSV.
//!
//! Columns are addressed by position: 1 province, 3 regency, 5 district,
//! 7 village and 9 the impairment count. Other columns are carried through
//! filtering and export untouched.

use log::{debug, info};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::{Result, VoiceQualityError};

pub const COUNT_COLUMN: usize = 9;
const MIN_COLUMNS: usize = COUNT_COLUMN + 1;
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminLevel {
    Province,
    Regency,
    District,
    Village,
}

impl AdminLevel {
    pub const ALL: [AdminLevel; 4] = [
        AdminLevel::Province,
        AdminLevel::Regency,
        AdminLevel::District,
        AdminLevel::Village,
    ];

    pub fn column(&self) -> usize {
        match self {
            AdminLevel::Province => 1,
            AdminLevel::Regency => 3,
            AdminLevel::District => 5,
            AdminLevel::Village => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminLevel::Province => "province",
            AdminLevel::Regency => "regency",
            AdminLevel::District => "district",
            AdminLevel::Village => "village",
        }
    }
}

impl FromStr for AdminLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AdminLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown level '{}', expected province, regency, district or village", s)
            })
    }
}

/// Conjunctive exact-match filter; `None` selects every value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionFilter {
    pub province: Option<String>,
    pub regency: Option<String>,
    pub district: Option<String>,
    pub village: Option<String>,
}

impl RegionFilter {
    fn get(&self, level: AdminLevel) -> Option<&str> {
        match level {
            AdminLevel::Province => self.province.as_deref(),
            AdminLevel::Regency => self.regency.as_deref(),
            AdminLevel::District => self.district.as_deref(),
            AdminLevel::Village => self.village.as_deref(),
        }
    }

    fn matches(&self, row: &RegionRow) -> bool {
        AdminLevel::ALL.into_iter().all(|level| match self.get(level) {
            Some(wanted) => row.value(level) == wanted,
            None => true,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    fields: Vec<String>,
    count: i64,
}

impl RegionRow {
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn value(&self, level: AdminLevel) -> &str {
        &self.fields[level.column()]
    }

    pub fn count(&self) -> i64 {
        self.count
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    headers: Vec<String>,
    rows: Vec<RegionRow>,
}

impl RegionTable {
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading regional data from {}", path.display());
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, delimiter)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.len() < MIN_COLUMNS {
            return Err(VoiceQualityError::invalid(format!(
                "header has {} columns, expected at least {}",
                headers.len(),
                MIN_COLUMNS
            )));
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            if record.len() < MIN_COLUMNS {
                return Err(VoiceQualityError::invalid(format!(
                    "row at line {} has {} columns, expected at least {}",
                    line,
                    record.len(),
                    MIN_COLUMNS
                )));
            }
            let raw_count = record[COUNT_COLUMN].trim();
            let count = raw_count.parse::<i64>().map_err(|_| {
                VoiceQualityError::invalid(format!(
                    "row at line {} has non-integer count '{}'",
                    line, raw_count
                ))
            })?;
            rows.push(RegionRow {
                fields: record.iter().map(str::to_string).collect(),
                count,
            });
        }

        debug!("Loaded {} regional rows", rows.len());
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RegionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sorted distinct values present at `level`.
    pub fn options(&self, level: AdminLevel) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.value(level).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn filter(&self, filter: &RegionFilter) -> RegionTable {
        let rows: Vec<RegionRow> = self
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        debug!("Filter kept {} of {} rows", rows.len(), self.rows.len());
        RegionTable {
            headers: self.headers.clone(),
            rows,
        }
    }

    pub fn total_count(&self) -> i64 {
        self.rows.iter().map(RegionRow::count).sum()
    }

    /// `(village, count)` pairs in row order.
    pub fn bar_chart(&self) -> Vec<(String, i64)> {
        self.rows
            .iter()
            .map(|row| (row.value(AdminLevel::Village).to_string(), row.count))
            .collect()
    }

    pub fn render_bar_chart(&self) -> String {
        let bars = self.bar_chart();
        let mut out = String::new();
        let label_width = bars.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0);
        let peak = bars.iter().map(|(_, count)| *count).max().unwrap_or(0);

        for (name, count) in &bars {
            let len = if peak > 0 {
                ((*count).max(0) as f64 / peak as f64 * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let _ = writeln!(
                out,
                "{:<width$} | {} {}",
                name,
                "#".repeat(len),
                count,
                width = label_width
            );
        }
        out
    }

    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(&row.fields)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
