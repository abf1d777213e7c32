use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Daily attendance mark. `None` in an `Option<AttendanceStatus>` means the day is unmarked.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": 1,
        "day": "2024-02-15",
        "status": "Present"
    })
)]
pub struct AttendanceEntry {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2024-02-15", value_type = String, format = "date")]
    pub day: NaiveDate,
    pub status: AttendanceStatus,
}

/// Raw `attendance` row; `status` is validated into [`AttendanceStatus`] on the way out.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub employee_id: u64,
    pub day: NaiveDate,
    pub status: String,
}

impl TryFrom<AttendanceRow> for AttendanceEntry {
    type Error = String;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|_| format!("unknown attendance status '{}' on row {}", row.status, row.id))?;

        Ok(AttendanceEntry {
            id: row.id,
            employee_id: row.employee_id,
            day: row.day,
            status,
        })
    }
}
