// src/models/student.rs
use crate::store::{Entity, EntityKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub classroom_id: String,
    pub name: String,
    pub roll: String, // chave natural dentro da turma
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStudent {
    pub classroom_id: String,
    pub name: String,
    pub roll: String,
    pub email: Option<String>,
}

impl Entity for Student {
    const KIND: EntityKind = EntityKind::Student;
    type Draft = NewStudent;
}

#[derive(Debug, Deserialize)]
pub struct StudentForm {
    pub name: String,
    pub roll: String,
    #[serde(default)]
    pub email: Option<String>,
}
