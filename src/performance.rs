//! Offline accuracy evaluation over recorded classification sessions.
//!
//! The classifier writes one row per touch into a comma-separated log with
//! a header line naming the columns. This module parses that log into a
//! `true class -> inferred class -> count` table and derives per-class and
//! overall accuracy scores, which is how classifier changes get validated
//! against recorded sessions before shipping.
//!
//! Parsing is deliberately forgiving: a malformed or truncated trailing
//! row ends the scan with partial results rather than failing, because
//! logs cut off mid-write when a session is killed.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::types::TouchType;

const INFERRED_COLUMN: &str = "INFERRED_CLASS";
const TRUE_COLUMN: &str = "TRUE_CLASS";

/// Report construction failures.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report text has no header line")]
    MissingHeader,
}

/// Confusion-matrix style accuracy report for one recorded session.
#[derive(Debug, Clone)]
pub struct PerformanceReport {
    /// true class -> (inferred class -> count)
    counts: BTreeMap<TouchType, BTreeMap<TouchType, u64>>,

    /// True class of each row, in row order.
    true_classes: Vec<TouchType>,

    /// The raw text this report was built from.
    csv_report: String,
}

/// Serializable per-class summary, for tuning sweeps and dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_touches: u64,
    pub overall_score: f32,
    pub per_class: Vec<ClassScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassScore {
    pub class: TouchType,
    pub true_count: u64,
    pub correct_count: u64,
    pub score: f32,
}

impl PerformanceReport {
    /// Build a report trusting the log's own TRUE_CLASS column.
    pub fn from_csv(csv_report: &str) -> Result<Self, ReportError> {
        Self::build(csv_report, &[])
    }

    /// Build a report with the TRUE_CLASS column overridden row-by-row by
    /// `true_classes`. Used when replaying recorded sessions against newly
    /// hand-labeled ground truth.
    pub fn from_csv_with_true_classes(
        csv_report: &str,
        true_classes: &[TouchType],
    ) -> Result<Self, ReportError> {
        Self::build(csv_report, true_classes)
    }

    fn build(csv_report: &str, override_classes: &[TouchType]) -> Result<Self, ReportError> {
        let mut lines = csv_report.lines();

        let header = lines.next().ok_or(ReportError::MissingHeader)?;
        let headers: Vec<&str> = header.split(',').map(str::trim).collect();

        // An unseen column name maps to index 0. This is a loose contract
        // inherited from the log format: the test suite flags it rather
        // than trusting it.
        let index_inferred = index_of_column(&headers, INFERRED_COLUMN);
        let index_true = index_of_column(&headers, TRUE_COLUMN);

        let mut counts: BTreeMap<TouchType, BTreeMap<TouchType, u64>> = BTreeMap::new();
        let mut true_classes = Vec::new();

        for (row_index, line) in lines.enumerate() {
            let row: Vec<&str> = line.split(',').map(str::trim).collect();

            // A blank or single-token row means the log was cut off;
            // return what we have.
            if row.len() <= 1 {
                break;
            }

            let parsed_true = parse_class(&row, index_true);
            let parsed_inferred = parse_class(&row, index_inferred);
            let (mut true_class, inferred_class) = match (parsed_true, parsed_inferred) {
                (Some(t), Some(i)) => (t, i),
                _ => {
                    warn!(row_index, "stopping report parse at malformed row");
                    break;
                }
            };

            if let Some(&label) = override_classes.get(row_index) {
                true_class = label;
            }

            true_classes.push(true_class);
            *counts
                .entry(true_class)
                .or_default()
                .entry(inferred_class)
                .or_insert(0) += 1;
        }

        Ok(Self {
            counts,
            true_classes,
            csv_report: csv_report.to_string(),
        })
    }

    /// Number of rows whose true class is `probe`.
    pub fn true_count_for_type(&self, probe: TouchType) -> u64 {
        self.counts
            .get(&probe)
            .map(|row| row.values().sum())
            .unwrap_or(0)
    }

    /// Number of rows with true class `probe` that were also inferred as
    /// `probe` (the diagonal of the confusion matrix).
    pub fn inferred_count_for_type(&self, probe: TouchType) -> u64 {
        self.counts
            .get(&probe)
            .and_then(|row| row.get(&probe))
            .copied()
            .unwrap_or(0)
    }

    /// Fraction of `probe`-class touches classified correctly.
    pub fn score_for_type(&self, probe: TouchType) -> f32 {
        let true_count = self.true_count_for_type(probe);
        if true_count == 0 {
            return 0.0;
        }
        self.inferred_count_for_type(probe) as f32 / true_count as f32
    }

    /// Total number of parsed rows.
    pub fn total_touch_count(&self) -> u64 {
        self.counts
            .keys()
            .map(|&class| self.true_count_for_type(class))
            .sum()
    }

    /// Count-weighted mean of per-class scores across observed classes.
    pub fn overall_score(&self) -> f32 {
        let total = self.total_touch_count();
        if total == 0 {
            return 0.0;
        }

        self.counts
            .keys()
            .map(|&class| {
                let weight = self.true_count_for_type(class) as f32 / total as f32;
                self.score_for_type(class) * weight
            })
            .sum()
    }

    /// Inferred-class counts for rows whose true class is `probe`.
    pub fn counts_for_touch_type(&self, probe: TouchType) -> Option<&BTreeMap<TouchType, u64>> {
        self.counts.get(&probe)
    }

    /// True class of each parsed row, in row order.
    pub fn true_classes(&self) -> &[TouchType] {
        &self.true_classes
    }

    /// The raw text this report was built from.
    pub fn csv_report(&self) -> &str {
        &self.csv_report
    }

    /// Serializable summary over all observed classes.
    pub fn summary(&self) -> ReportSummary {
        let per_class: Vec<ClassScore> = self
            .counts
            .keys()
            .map(|&class| ClassScore {
                class,
                true_count: self.true_count_for_type(class),
                correct_count: self.inferred_count_for_type(class),
                score: self.score_for_type(class),
            })
            .collect();

        ReportSummary {
            total_touches: self.total_touch_count(),
            overall_score: self.overall_score(),
            per_class,
        }
    }
}

fn index_of_column(headers: &[&str], probe: &str) -> usize {
    headers.iter().position(|&h| h == probe).unwrap_or(0)
}

fn parse_class(row: &[&str], index: usize) -> Option<TouchType> {
    let field = row.get(index)?;
    field.parse::<i32>().ok().map(TouchType::from_code)
}
