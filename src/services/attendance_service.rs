// src/services/attendance_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{Attendance, AttendanceStatus, NewAttendance},
        classroom::Classroom,
        student::Student,
        user::User,
    },
    services::student_service,
    store::{Criteria, Entities, SharedStore},
};
use chrono::{Local, NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};

/// Prefixo dos campos do formulário de marcação: `status_<roll>`.
pub const STATUS_FIELD_PREFIX: &str = "status_";

/// Data (`YYYY-MM-DD`) e hora (`HH:MM`, 24h) de uma sessão de chamada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSlot {
    pub date: String,
    pub time: String,
}

impl SessionSlot {
    /// Valida e normaliza a data e a hora escolhidas. A hora fica sempre com
    /// dois dígitos para que a ordenação por texto no histórico funcione.
    pub fn parse(date: &str, time: &str) -> AppResult<Self> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD.", date)))?;
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .map_err(|_| AppError::Validation(format!("Invalid time '{}', expected HH:MM.", time)))?;
        Ok(Self {
            date: date.format("%Y-%m-%d").to_string(),
            time: time.format("%H:%M").to_string(),
        })
    }

    /// Sugestão para o formulário: hoje, à hora atual.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M").to_string(),
        }
    }
}

/// Lê os campos `status_<roll>` do formulário. Campos vazios (sem escolha)
/// são ignorados; qualquer outro valor desconhecido é recusado.
pub fn parse_marks(form: &HashMap<String, String>) -> AppResult<HashMap<String, AttendanceStatus>> {
    let mut marks = HashMap::new();
    for (field, value) in form {
        let Some(roll) = field.strip_prefix(STATUS_FIELD_PREFIX) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let status = value.parse::<AttendanceStatus>().map_err(|e| {
            tracing::warn!("Marcação inválida para roll {}: {}", roll, e);
            AppError::Validation(format!("Invalid status for roll {}.", roll))
        })?;
        marks.insert(roll.to_string(), status);
    }
    Ok(marks)
}

/// Registos já existentes para a sessão (turma + data + hora).
pub async fn session_records(
    store: &SharedStore,
    classroom: &Classroom,
    slot: &SessionSlot,
) -> AppResult<Vec<Attendance>> {
    Entities::<Attendance>::new(store.clone())
        .filter(
            &Criteria::new()
                .eq("classroom", classroom.id.as_str())
                .eq("date", slot.date.as_str())
                .eq("time", slot.time.as_str()),
            None,
        )
        .await
}

/// Constrói as linhas da sessão a partir da lista de alunos, pela ordem
/// da lista. Cada roll entra no máximo uma vez; alunos sem marcação ficam de fora.
pub fn build_session_rows(
    teacher: &User,
    classroom: &Classroom,
    slot: &SessionSlot,
    roster: &[Student],
    marks: &HashMap<String, AttendanceStatus>,
) -> Vec<NewAttendance> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut rows = Vec::new();
    for student in roster {
        let Some(status) = marks.get(&student.roll) else {
            continue;
        };
        if !seen.insert(student.roll.as_str()) {
            tracing::warn!(
                "Roll {} repetido na turma {}: '{}' ignorado nesta sessão",
                student.roll,
                classroom.id,
                student.name
            );
            continue;
        }
        rows.push(NewAttendance {
            classroom_id: classroom.id.clone(),
            date: slot.date.clone(),
            time: slot.time.clone(),
            teacher_email: teacher.email.clone(),
            student_name: student.name.clone(),
            student_roll: student.roll.clone(),
            student_email: student.email.clone(),
            status: status.as_str().to_string(),
        });
    }
    rows
}

/// Grava a chamada de uma sessão.
///
/// Recusa sessões que já têm registos (os registos não são alterados depois
/// de criados) e submissões sem nenhuma marcação. As linhas são criadas uma a
/// uma; o store não oferece transação, por isso uma falha a meio deixa a
/// sessão parcial.
pub async fn submit_session(
    store: &SharedStore,
    teacher: &User,
    classroom: &Classroom,
    slot: &SessionSlot,
    marks: &HashMap<String, AttendanceStatus>,
) -> AppResult<Vec<Attendance>> {
    if !session_records(store, classroom, slot).await?.is_empty() {
        tracing::warn!(
            "Sessão {} {} da turma {} já registada",
            slot.date,
            slot.time,
            classroom.id
        );
        return Err(AppError::SessionAlreadyRecorded(format!(
            "{} {} {}",
            classroom.id, slot.date, slot.time
        )));
    }

    let roster = student_service::list_for_classroom(store, classroom).await?;
    let rows = build_session_rows(teacher, classroom, slot, &roster, marks);
    if rows.is_empty() {
        return Err(AppError::Validation("Mark at least one student before submitting.".into()));
    }

    let attendance = Entities::<Attendance>::new(store.clone());
    let mut created = Vec::with_capacity(rows.len());
    for row in &rows {
        created.push(attendance.create(row).await?);
    }
    tracing::info!(
        "✅ Chamada gravada: turma {} em {} {} ({} alunos)",
        classroom.id,
        slot.date,
        slot.time,
        created.len()
    );
    Ok(created)
}
