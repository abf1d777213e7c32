//! Report and backup rendering. Payloads are rendered fully in memory and then
//! handed to an [`ExportSink`] in one call.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::info;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceEntry;
use crate::model::employee::Employee;
use crate::service::aggregator::employee_breakdown;

pub const BACKUP_FORMAT: &str = "attendance-backup";
pub const BACKUP_VERSION: u32 = 1;

const DATE_FORMAT: &str = "%Y-%m-%d";
const UNKNOWN_EMPLOYEE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportKind {
    Employees,
    Attendance,
    Summary,
    Backup,
}

impl ExportKind {
    fn extension(&self) -> &'static str {
        match self {
            ExportKind::Backup => "json",
            _ => "csv",
        }
    }
}

/// A rendered payload ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub file_name: String,
    pub content: String,
}

/// Versioned, re-importable snapshot of the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub format: String,
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub employees: Vec<Employee>,
    pub attendance: Vec<AttendanceEntry>,
}

/// Destination for rendered exports. Returns a locator for the written payload.
pub trait ExportSink: Send + Sync {
    fn write(&self, name: &str, payload: &[u8]) -> io::Result<String>;
}

/// Writes exports into a directory, replacing the target file atomically.
#[derive(Debug, Clone)]
pub struct FileExportSink {
    dir: PathBuf,
}

impl FileExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for FileExportSink {
    fn write(&self, name: &str, payload: &[u8]) -> io::Result<String> {
        fs::create_dir_all(&self.dir)?;

        let target = self.dir.join(name);
        let staging = self.dir.join(format!(".{name}.tmp"));
        fs::write(&staging, payload)?;
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        Ok(target.display().to_string())
    }
}

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::ExportFailed(format!("failed to render report: {e}"))
}

/// Builds one delimited section. Free text is quoted only when it holds the
/// delimiter, a quote or a line break.
fn render_rows(header: &[&str], rows: impl IntoIterator<Item = Vec<String>>) -> AppResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header).map_err(csv_error)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}

/// Spreadsheet apps evaluate cells starting with these characters as formulas.
/// A signed number such as a phone number is left alone.
fn text_cell(value: &str) -> String {
    let trimmed = value.trim_start();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some('=') | Some('@') => format!("'{value}"),
        Some('+') | Some('-') if !is_phone_like(chars.as_str()) => format!("'{value}"),
        _ => value.to_string(),
    }
}

fn is_phone_like(rest: &str) -> bool {
    rest.starts_with(|c: char| c.is_ascii_digit() || c == '(')
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'))
}

fn optional_cell(value: &Option<String>) -> String {
    value.as_deref().map(text_cell).unwrap_or_default()
}

pub fn render_employees(employees: &[Employee]) -> AppResult<String> {
    render_rows(
        &["ID", "Name", "Job Title", "Email", "Phone", "Address", "Created At"],
        employees.iter().map(|employee| {
            vec![
                employee.id.to_string(),
                text_cell(&employee.name),
                text_cell(&employee.job_title),
                optional_cell(&employee.email),
                optional_cell(&employee.phone),
                optional_cell(&employee.address),
                employee.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ]
        }),
    )
}

/// Index from employee id to display name, as used by [`render_attendance`].
pub fn employee_index(employees: &[Employee]) -> HashMap<u64, String> {
    employees
        .iter()
        .map(|employee| (employee.id, employee.name.clone()))
        .collect()
}

pub fn render_attendance(entries: &[AttendanceEntry], employee_index: &HashMap<u64, String>) -> AppResult<String> {
    render_rows(
        &["Entry ID", "Employee ID", "Employee Name", "Date", "Status"],
        entries.iter().map(|entry| {
            let name = employee_index
                .get(&entry.employee_id)
                .map(String::as_str)
                .unwrap_or(UNKNOWN_EMPLOYEE);
            vec![
                entry.id.to_string(),
                entry.employee_id.to_string(),
                text_cell(name),
                entry.day.format(DATE_FORMAT).to_string(),
                entry.status.to_string(),
            ]
        }),
    )
}

/// Per-employee attendance rates over all of `entries`, a blank line, then the
/// detailed entry listing.
pub fn render_summary_report(employees: &[Employee], entries: &[AttendanceEntry]) -> AppResult<String> {
    let rates = render_rows(
        &["Employee ID", "Name", "Present", "Absent", "Leave", "Total", "Attendance Rate (%)"],
        employee_breakdown(employees, entries).into_iter().map(|row| {
            vec![
                row.employee_id.to_string(),
                text_cell(&row.name),
                row.present.to_string(),
                row.absent.to_string(),
                row.leave.to_string(),
                row.total.to_string(),
                row.rate.to_string(),
            ]
        }),
    )?;
    let details = render_attendance(entries, &employee_index(employees))?;

    Ok(format!("{rates}\n{details}"))
}

pub fn render_backup_snapshot(
    employees: &[Employee],
    entries: &[AttendanceEntry],
    generated_at: DateTime<Utc>,
) -> AppResult<String> {
    let snapshot = BackupSnapshot {
        format: BACKUP_FORMAT.to_string(),
        version: BACKUP_VERSION,
        generated_at,
        employees: employees.to_vec(),
        attendance: entries.to_vec(),
    };

    serde_json::to_string_pretty(&snapshot)
        .map_err(|e| AppError::ExportFailed(format!("failed to serialize backup: {e}")))
}

/// Renders `kind` and names it `<kind>_<YYYYmmdd_HHMMSS>.<ext>`.
pub fn render(
    kind: ExportKind,
    employees: &[Employee],
    entries: &[AttendanceEntry],
    now: DateTime<Utc>,
) -> AppResult<Rendered> {
    let content = match kind {
        ExportKind::Employees => render_employees(employees)?,
        ExportKind::Attendance => render_attendance(entries, &employee_index(employees))?,
        ExportKind::Summary => render_summary_report(employees, entries)?,
        ExportKind::Backup => render_backup_snapshot(employees, entries, now)?,
    };

    Ok(Rendered {
        file_name: format!("{kind}_{}.{}", now.format("%Y%m%d_%H%M%S"), kind.extension()),
        content,
    })
}

/// Hands a rendered payload to the sink in a single write.
pub fn export(sink: &dyn ExportSink, rendered: &Rendered) -> AppResult<String> {
    let locator = sink
        .write(&rendered.file_name, rendered.content.as_bytes())
        .map_err(|e| AppError::ExportFailed(format!("{}: {e}", rendered.file_name)))?;

    info!(file = %rendered.file_name, %locator, bytes = rendered.content.len(), "Export written");
    Ok(locator)
}
