// src/services/export_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{Attendance, ClassroomSelection},
        classroom::{Classroom, UNKNOWN_CLASSROOM},
    },
    services::history_service::parse_calendar_date,
};
use chrono::NaiveDate;

pub const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8";
pub const CSV_HEADERS: [&str; 6] = ["Date", "Classroom", "Student Name", "Roll Number", "Email", "Status"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

// Aspas à volta de cada campo, sem escapar aspas internas: um nome com `"`
// ou uma quebra de linha estraga a linha exportada.
fn quote(field: &str) -> String {
    format!("\"{}\"", field)
}

fn csv_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields.into_iter().map(quote).collect::<Vec<_>>().join(",")
}

/// Data no formato `YYYY-MM-DD`. Se não for possível interpretar, sai como veio.
pub fn format_export_date(raw: &str) -> String {
    match parse_calendar_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => {
            tracing::warn!("Data de presença não reconhecida na exportação: '{}'", raw);
            raw.to_string()
        }
    }
}

/// Uma linha por registo (não por sessão), com cabeçalho fixo.
pub fn records_to_csv(records: &[Attendance], classrooms: &[Classroom]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(csv_line(CSV_HEADERS));
    for record in records {
        let classroom_name = classrooms
            .iter()
            .find(|c| c.id == record.classroom_id)
            .map_or(UNKNOWN_CLASSROOM, |c| c.name.as_str());
        let date = format_export_date(&record.date);
        lines.push(csv_line([
            date.as_str(),
            classroom_name,
            record.student_name.as_str(),
            record.student_roll.as_str(),
            record.student_email.as_deref().unwrap_or(""),
            record.status.as_str(),
        ]));
    }
    lines.join("\n")
}

pub fn export_filename(selection: &ClassroomSelection, today: NaiveDate) -> String {
    format!(
        "attendance_history_{}_{}.csv",
        selection.as_param(),
        today.format("%Y-%m-%d")
    )
}

/// Gera o CSV dos registos filtrados. Sem registos não há ficheiro.
pub fn export_csv(
    records: &[Attendance],
    classrooms: &[Classroom],
    selection: &ClassroomSelection,
    today: NaiveDate,
) -> AppResult<CsvExport> {
    if records.is_empty() {
        tracing::warn!("Exportação recusada: nenhum registo para {:?}", selection);
        return Err(AppError::NothingToExport);
    }
    let export = CsvExport {
        filename: export_filename(selection, today),
        content: records_to_csv(records, classrooms),
    };
    tracing::info!("Exportação {}: {} registos", export.filename, records.len());
    Ok(export)
}
