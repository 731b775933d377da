use serde::Serialize;

pub const COL_NAME: &str = "Name";
pub const COL_ATTENDED: &str = "Attended";
pub const COL_TOTAL_CLASSES: &str = "Total Classes";
pub const COL_PARENT_MOBILE: &str = "ParentMobile";

/// Canonical column order of the stored table.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_NAME, COL_ATTENDED, COL_TOTAL_CLASSES, COL_PARENT_MOBILE];

/// One stored row of the attendance table.
///
/// Numeric cells are `None` when an uploaded sheet had something unparseable
/// there. Rows written through the validated path always carry whole numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub name: String,
    pub attended: Option<f64>,
    pub total_classes: Option<f64>,
    pub parent_mobile: Option<f64>,
}

impl StudentRow {
    pub fn new(name: impl Into<String>, attended: u32, total_classes: u32, parent_mobile: u64) -> Self {
        Self {
            name: name.into(),
            attended: Some(f64::from(attended)),
            total_classes: Some(f64::from(total_classes)),
            parent_mobile: Some(parent_mobile as f64),
        }
    }

    /// `(attended, total_classes)` when both count cells are usable,
    /// whatever the mobile cell holds.
    pub fn counts(&self) -> Option<(u32, u32)> {
        Some((whole_u32(self.attended?)?, whole_u32(self.total_classes?)?))
    }
}

/// A row that could be read as a complete, typed student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: usize,
    pub name: String,
    pub attended: u32,
    pub total_classes: u32,
    pub parent_mobile: u64,
}

impl AttendanceRecord {
    /// Types the row at position `id`, or `None` when a numeric cell is
    /// missing, negative or not finite. Fractions truncate toward zero.
    pub fn from_row(id: usize, row: &StudentRow) -> Option<Self> {
        Some(Self {
            id,
            name: row.name.clone(),
            attended: whole_u32(row.attended?)?,
            total_classes: whole_u32(row.total_classes?)?,
            parent_mobile: whole_u64(row.parent_mobile?)?,
        })
    }

    pub fn parent_mobile_str(&self) -> String {
        self.parent_mobile.to_string()
    }
}

fn whole_u32(v: f64) -> Option<u32> {
    if !v.is_finite() || v < 0.0 || v.trunc() > f64::from(u32::MAX) {
        return None;
    }
    Some(v.trunc() as u32)
}

fn whole_u64(v: f64) -> Option<u64> {
    if !v.is_finite() || v < 0.0 || v.trunc() >= u64::MAX as f64 {
        return None;
    }
    Some(v.trunc() as u64)
}

/// Renders a numeric cell for the spreadsheet: whole numbers without a
/// fractional part, everything else in shortest round-trip form.
pub fn format_cell(v: Option<f64>) -> String {
    match v {
        None => String::new(),
        Some(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => format!("{}", x as i64),
        Some(x) => format!("{x}"),
    }
}
