// src/models/classroom.rs
use crate::store::{Entity, EntityKind};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_CLASSROOM: &str = "Unknown Classroom";
pub const UNKNOWN_SUBJECT: &str = "Unknown Subject";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub description: Option<String>,
    pub teacher_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewClassroom {
    pub name: String,
    pub subject: String,
    pub description: Option<String>,
    pub teacher_email: String,
}

impl Entity for Classroom {
    const KIND: EntityKind = EntityKind::Classroom;
    type Draft = NewClassroom;
}

/// Turma com a contagem de alunos, para o dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomSummary {
    pub classroom: Classroom,
    pub student_count: usize,
}

/// Totais mostrados no topo do dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardTotals {
    pub classrooms: usize,
    pub students: usize,
    pub subjects: usize,
}

#[derive(Debug, Deserialize)]
pub struct ClassroomForm {
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
}
