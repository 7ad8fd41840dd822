// src/models/attendance.rs
use crate::models::classroom::Classroom;
use crate::store::{Entity, EntityKind};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Uma linha por aluno numa sessão de chamada.
///
/// `status` fica como veio do store: valores fora de `present`/`absent` não
/// entram nas contagens mas contam no total da sessão.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: String,
    #[serde(rename = "classroom")]
    pub classroom_id: String,
    pub date: String,
    pub time: String,
    pub teacher_email: String,
    pub student_name: String,
    pub student_roll: String,
    pub student_email: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAttendance {
    #[serde(rename = "classroom")]
    pub classroom_id: String,
    pub date: String,
    pub time: String,
    pub teacher_email: String,
    pub student_name: String,
    pub student_roll: String,
    pub student_email: Option<String>,
    pub status: String,
}

impl Entity for Attendance {
    const KIND: EntityKind = EntityKind::Attendance;
    type Draft = NewAttendance;
}

impl Attendance {
    pub fn status(&self) -> Option<AttendanceStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status desconhecido: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

// Comparação exata: "Present" não é "present"
impl FromStr for AttendanceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Contagens de uma sessão (ou de um conjunto de registos).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceStats {
    pub present: usize,
    pub absent: usize,
    pub total: usize,
}

/// Registos agrupados por (data, hora, turma).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub date: String,
    pub time: String,
    pub classroom_id: String,
    pub classroom: Option<Classroom>,
    pub records: Vec<Attendance>,
}

/// Turma escolhida no filtro do histórico.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClassroomSelection {
    #[default]
    All,
    Classroom(String),
}

impl ClassroomSelection {
    pub const ALL: &'static str = "all";

    /// Vazio, ausente ou "all" significam todas as turmas.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") | Some(Self::ALL) => ClassroomSelection::All,
            Some(id) => ClassroomSelection::Classroom(id.to_string()),
        }
    }

    /// Valor usado na query string e no nome do ficheiro exportado.
    pub fn as_param(&self) -> &str {
        match self {
            ClassroomSelection::All => Self::ALL,
            ClassroomSelection::Classroom(id) => id,
        }
    }

    pub fn is_selected(&self, classroom_id: &str) -> bool {
        matches!(self, ClassroomSelection::Classroom(id) if id == classroom_id)
    }
}

/// Data e hora da sessão escolhidas antes da marcação.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}
