use crate::record::{AttendanceRecord, StudentRow};
use serde::Serialize;
use std::fmt;

/// Minimum attendance percentage (inclusive) for exam eligibility.
pub const ELIGIBILITY_THRESHOLD: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NotEligible,
}

impl Eligibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Eligibility::Eligible => "Eligible",
            Eligibility::NotEligible => "Not Eligible",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Eligibility {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttendanceSummary {
    pub percentage: f64,
    pub status: Eligibility,
}

/// Half-away-from-zero rounding to 2 decimals.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Attendance percentage and eligibility for one student.
///
/// The status is decided on the rounded percentage, so a displayed `75.0` is
/// always Eligible. `attended > total_classes` is not an error and yields a
/// percentage above 100.
pub fn compute(attended: u32, total_classes: u32) -> AttendanceSummary {
    let percentage = if total_classes == 0 {
        0.0
    } else {
        round_2_decimals(f64::from(attended) / f64::from(total_classes) * 100.0)
    };
    let status = if percentage >= ELIGIBILITY_THRESHOLD {
        Eligibility::Eligible
    } else {
        Eligibility::NotEligible
    };
    AttendanceSummary { percentage, status }
}

pub fn compute_record(record: &AttendanceRecord) -> AttendanceSummary {
    compute(record.attended, record.total_classes)
}

/// Percentage text as shown to parents: `75.0`, `66.67`, `100.0`. With no
/// classes held the percentage is shown as a bare `0`.
pub fn display_percentage(total_classes: u32, p: f64) -> String {
    if total_classes == 0 {
        "0".to_string()
    } else if p.fract() == 0.0 {
        format!("{p:.1}")
    } else {
        format!("{p}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub total_students: usize,
    pub eligible_count: usize,
    pub not_eligible_count: usize,
    pub skipped_rows: usize,
}

/// Header counts for the attendance listing. Eligibility depends on the two
/// count cells only; a row missing either is not eligible. Rows that cannot
/// be fully typed are reported as skipped but still count toward
/// `total_students`.
pub fn summarize(rows: &[StudentRow]) -> TableSummary {
    let mut eligible_count = 0usize;
    let mut skipped_rows = 0usize;
    for (idx, row) in rows.iter().enumerate() {
        if let Some((attended, total_classes)) = row.counts() {
            if compute(attended, total_classes).status == Eligibility::Eligible {
                eligible_count += 1;
            }
        }
        if AttendanceRecord::from_row(idx, row).is_none() {
            skipped_rows += 1;
        }
    }
    TableSummary {
        total_students: rows.len(),
        eligible_count,
        not_eligible_count: rows.len() - eligible_count,
        skipped_rows,
    }
}
