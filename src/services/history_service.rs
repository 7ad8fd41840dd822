// src/services/history_service.rs
use crate::{
    error::AppResult,
    models::{
        attendance::{Attendance, AttendanceStats, AttendanceStatus, ClassroomSelection, SessionSummary},
        classroom::Classroom,
        user::User,
    },
    services::classroom_service,
    store::{Criteria, Entities, SharedStore},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::{cmp::Ordering, collections::HashMap};

/// Interpreta uma data de calendário: `YYYY-MM-DD`, RFC 3339 ou data-hora ISO sem fuso.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Algo que pertence a uma turma (registo ou sessão).
pub trait BelongsToClassroom {
    fn classroom_id(&self) -> &str;
}

impl BelongsToClassroom for Attendance {
    fn classroom_id(&self) -> &str {
        &self.classroom_id
    }
}

impl BelongsToClassroom for SessionSummary {
    fn classroom_id(&self) -> &str {
        &self.classroom_id
    }
}

/// Filtro por turma. `All` devolve a entrada inteira; a ordem nunca muda.
pub fn filter_by_classroom<T>(items: &[T], selection: &ClassroomSelection) -> Vec<T>
where
    T: BelongsToClassroom + Clone,
{
    match selection {
        ClassroomSelection::All => items.to_vec(),
        ClassroomSelection::Classroom(id) => items
            .iter()
            .filter(|item| item.classroom_id() == id)
            .cloned()
            .collect(),
    }
}

/// Contagens de presença. O total é o número de registos, por isso um status
/// desconhecido conta no total sem contar como presente nem ausente.
pub fn attendance_stats(records: &[Attendance]) -> AttendanceStats {
    let mut stats = AttendanceStats {
        total: records.len(),
        ..AttendanceStats::default()
    };
    for record in records {
        match record.status() {
            Some(AttendanceStatus::Present) => stats.present += 1,
            Some(AttendanceStatus::Absent) => stats.absent += 1,
            None => {}
        }
    }
    stats
}

impl SessionSummary {
    pub fn stats(&self) -> AttendanceStats {
        attendance_stats(&self.records)
    }
}

// Data mais recente primeiro, depois hora mais tardia (comparação de texto).
// As datas que não se conseguem interpretar ficam no fim.
fn compare_sessions(a: &SessionSummary, b: &SessionSummary) -> Ordering {
    let da = parse_calendar_date(&a.date);
    let db = parse_calendar_date(&b.date);
    db.cmp(&da)
        .then_with(|| b.time.cmp(&a.time))
        .then_with(|| b.date.cmp(&a.date))
}

/// Agrupa registos por (data, hora, turma).
///
/// Cada grupo guarda os registos pela ordem em que apareceram; a chave é
/// comparada tal como está, sem normalizar formatos de data ou hora.
pub fn group_into_sessions(records: &[Attendance], classrooms: &[Classroom]) -> Vec<SessionSummary> {
    let mut index: HashMap<(&str, &str, &str), usize> = HashMap::new();
    let mut sessions: Vec<SessionSummary> = Vec::new();

    for record in records {
        let key = (
            record.date.as_str(),
            record.time.as_str(),
            record.classroom_id.as_str(),
        );
        let slot = *index.entry(key).or_insert_with(|| {
            sessions.push(SessionSummary {
                date: record.date.clone(),
                time: record.time.clone(),
                classroom_id: record.classroom_id.clone(),
                classroom: classrooms.iter().find(|c| c.id == record.classroom_id).cloned(),
                records: Vec::new(),
            });
            sessions.len() - 1
        });
        sessions[slot].records.push(record.clone());
    }

    sessions.sort_by(compare_sessions);
    sessions
}

/// Tudo o que a página de histórico mostra.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub classrooms: Vec<Classroom>,
    pub selection: ClassroomSelection,
    /// Registos já filtrados pela turma escolhida (é isto que se exporta).
    pub records: Vec<Attendance>,
    pub sessions: Vec<SessionSummary>,
    pub stats: AttendanceStats,
}

/// Registos de presença do professor, mais recentes primeiro.
pub async fn list_records(store: &SharedStore, teacher: &User) -> AppResult<Vec<Attendance>> {
    Entities::<Attendance>::new(store.clone())
        .filter(
            &Criteria::new().eq("teacher_email", teacher.email.as_str()),
            Some("-date"),
        )
        .await
}

pub async fn load_history(
    store: &SharedStore,
    teacher: &User,
    selection: ClassroomSelection,
) -> AppResult<HistoryView> {
    let classrooms = classroom_service::list_for_teacher(store, teacher).await?;
    let all_records = list_records(store, teacher).await?;
    let records = filter_by_classroom(&all_records, &selection);
    let sessions = group_into_sessions(&records, &classrooms);
    let stats = attendance_stats(&records);
    tracing::debug!(
        "Histórico de {} ({:?}): {} registos em {} sessões",
        teacher.email,
        selection,
        records.len(),
        sessions.len()
    );
    Ok(HistoryView {
        classrooms,
        selection,
        records,
        sessions,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, classroom: &str, date: &str, time: &str, roll: &str, status: &str) -> Attendance {
        Attendance {
            id: id.into(),
            classroom_id: classroom.into(),
            date: date.into(),
            time: time.into(),
            teacher_email: "t@x.com".into(),
            student_name: format!("Aluno {}", roll),
            student_roll: roll.into(),
            student_email: None,
            status: status.into(),
        }
    }

    fn classroom(id: &str, name: &str) -> Classroom {
        Classroom {
            id: id.into(),
            name: name.into(),
            subject: "Math".into(),
            description: None,
            teacher_email: "t@x.com".into(),
        }
    }

    fn sample() -> Vec<Attendance> {
        vec![
            record("1", "c1", "2024-03-01", "09:00", "1", "present"),
            record("2", "c2", "2024-03-02", "10:00", "1", "absent"),
            record("3", "c1", "2024-03-01", "09:00", "2", "absent"),
            record("4", "c1", "2024-03-01", "14:00", "1", "present"),
            record("5", "c2", "2024-03-02", "10:00", "2", "late"),
            record("6", "c9", "2024-02-28", "08:00", "1", "present"),
        ]
    }

    #[test]
    fn grouping_is_a_lossless_partition() {
        let records = sample();
        let sessions = group_into_sessions(&records, &[]);
        let mut flattened: Vec<String> = sessions
            .iter()
            .flat_map(|s| s.records.iter().map(|r| r.id.clone()))
            .collect();
        flattened.sort();
        let mut original: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        original.sort();
        assert_eq!(flattened, original);

        for session in &sessions {
            assert!(session.records.iter().all(|r| r.date == session.date
                && r.time == session.time
                && r.classroom_id == session.classroom_id));
        }
    }

    #[test]
    fn sessions_are_ordered_by_date_then_time_descending() {
        let sessions = group_into_sessions(&sample(), &[]);
        let keys: Vec<(&str, &str, &str)> = sessions
            .iter()
            .map(|s| (s.date.as_str(), s.time.as_str(), s.classroom_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("2024-03-02", "10:00", "c2"),
                ("2024-03-01", "14:00", "c1"),
                ("2024-03-01", "09:00", "c1"),
                ("2024-02-28", "08:00", "c9"),
            ]
        );
    }

    #[test]
    fn members_keep_encounter_order() {
        let sessions = group_into_sessions(&sample(), &[]);
        let morning = sessions
            .iter()
            .find(|s| s.date == "2024-03-01" && s.time == "09:00")
            .unwrap();
        let ids: Vec<&str> = morning.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn classroom_lookup_falls_back_to_none() {
        let sessions = group_into_sessions(&sample(), &[classroom("c1", "Math A")]);
        let c1 = sessions.iter().find(|s| s.classroom_id == "c1").unwrap();
        assert_eq!(c1.classroom.as_ref().map(|c| c.name.as_str()), Some("Math A"));
        let c9 = sessions.iter().find(|s| s.classroom_id == "c9").unwrap();
        assert!(c9.classroom.is_none());
    }

    #[test]
    fn unknown_status_counts_only_in_total() {
        let sessions = group_into_sessions(&sample(), &[]);
        let c2 = sessions.iter().find(|s| s.classroom_id == "c2").unwrap();
        let stats = c2.stats();
        assert_eq!(stats, AttendanceStats { present: 0, absent: 1, total: 2 });
        assert!(stats.present + stats.absent < stats.total);

        let c1 = sessions
            .iter()
            .find(|s| s.classroom_id == "c1" && s.time == "09:00")
            .unwrap();
        let stats = c1.stats();
        assert_eq!(stats.present + stats.absent, stats.total);
    }

    #[test]
    fn time_ties_use_plain_string_comparison() {
        // "9:00" > "10:00" como texto: comportamento conhecido para horas sem zero à esquerda
        let records = vec![
            record("1", "c1", "2024-03-01", "10:00", "1", "present"),
            record("2", "c1", "2024-03-01", "9:00", "1", "present"),
        ];
        let sessions = group_into_sessions(&records, &[]);
        assert_eq!(sessions[0].time, "9:00");
    }

    #[test]
    fn dates_are_compared_as_dates_when_possible() {
        let records = vec![
            record("1", "c1", "2024-03-01", "09:00", "1", "present"),
            record("2", "c1", "2024-03-10T00:00:00Z", "09:00", "1", "present"),
            record("3", "c1", "sem data", "09:00", "1", "present"),
        ];
        let sessions = group_into_sessions(&records, &[]);
        let dates: Vec<&str> = sessions.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-10T00:00:00Z", "2024-03-01", "sem data"]);
    }

    #[test]
    fn classroom_filter_is_idempotent_and_all_returns_everything() {
        let records = sample();
        assert_eq!(filter_by_classroom(&records, &ClassroomSelection::All), records);

        let selection = ClassroomSelection::Classroom("c1".into());
        let once = filter_by_classroom(&records, &selection);
        assert!(once.iter().all(|r| r.classroom_id == "c1"));
        assert_eq!(once.len(), 3);
        assert_eq!(filter_by_classroom(&once, &selection), once);

        let sessions = group_into_sessions(&records, &[]);
        let filtered = filter_by_classroom(&sessions, &selection);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_calendar_date("2024-03-01"), expected);
        assert_eq!(parse_calendar_date("2024-03-01T10:30:00+00:00"), expected);
        assert_eq!(parse_calendar_date("2024-03-01T10:30"), expected);
        assert_eq!(parse_calendar_date("01/03/2024"), None);
    }
}
