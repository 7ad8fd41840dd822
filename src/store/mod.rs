// src/store/mod.rs
//! Acesso às entidades.
//!
//! O `RecordStore` trabalha com registos sem tipo (mapas JSON) identificados por
//! `EntityKind`; o `Entities<E>` por cima dele dá a cada entidade um cliente CRUD
//! tipado e valida o formato dos registos à entrada.

pub mod memory;
pub mod sqlite;

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{fmt, marker::PhantomData, sync::Arc};

/// Registo tal como circula no store: nome do campo -> valor (string ou null).
pub type Record = serde_json::Map<String, Value>;

pub type SharedStore = Arc<dyn RecordStore>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Credential,
    Classroom,
    Student,
    Attendance,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Credential => "Credential",
            EntityKind::Classroom => "Classroom",
            EntityKind::Student => "Student",
            EntityKind::Attendance => "Attendance",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Credential => "credentials",
            EntityKind::Classroom => "classrooms",
            EntityKind::Student => "students",
            EntityKind::Attendance => "attendance",
        }
    }

    /// Colunas conhecidas, incluindo `id`. Critérios, ordenação e escritas
    /// só aceitam estes nomes.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &["id", "email", "full_name"],
            EntityKind::Credential => &["id", "email", "password_hash"],
            EntityKind::Classroom => &["id", "name", "subject", "description", "teacher_email"],
            EntityKind::Student => &["id", "classroom_id", "name", "roll", "email"],
            EntityKind::Attendance => &[
                "id",
                "classroom",
                "date",
                "time",
                "teacher_email",
                "student_name",
                "student_roll",
                "student_email",
                "status",
            ],
        }
    }

    /// Registos dependentes apagados junto com esta entidade: (entidade, campo que aponta para o id).
    pub fn cascades(&self) -> &'static [(EntityKind, &'static str)] {
        match self {
            EntityKind::Classroom => &[
                (EntityKind::Student, "classroom_id"),
                (EntityKind::Attendance, "classroom"),
            ],
            _ => &[],
        }
    }

    pub fn check_field(&self, field: &str) -> AppResult<()> {
        if self.fields().contains(&field) {
            Ok(())
        } else {
            Err(AppError::UnknownField {
                entity: self.name(),
                field: field.to_string(),
            })
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filtro por igualdade exata, campo a campo (todos têm de coincidir).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria(Vec<(String, String)>);

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<String>) -> Self {
        self.0.push((field.to_string(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.iter()
            .all(|(field, value)| record.get(field).and_then(value_as_str) == Some(value))
    }
}

/// Ordenação no formato `campo` (ascendente) ou `-campo` (descendente).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: raw.to_string(),
                descending: false,
            },
        }
    }
}

pub(crate) fn value_as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Converte um valor JSON para o que é guardado numa coluna TEXT.
pub(crate) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// O store externo: filtro, criação, atualização e remoção de registos.
///
/// Falhas não têm códigos distintos além de "sucesso" ou "falha"; as
/// implementações não fazem retries.
#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    async fn filter(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
        sort: Option<&SortSpec>,
    ) -> AppResult<Vec<Record>>;

    /// Cria um registo. O store atribui o `id`; um `id` nos dados é ignorado.
    async fn create(&self, kind: EntityKind, data: Record) -> AppResult<Record>;

    /// Atualiza só os campos presentes em `data`.
    async fn update(&self, kind: EntityKind, id: &str, data: Record) -> AppResult<Record>;

    /// Remove o registo e, para `Classroom`, os seus dependentes.
    async fn delete(&self, kind: EntityKind, id: &str) -> AppResult<()>;
}

/// Uma entidade com formato fixo guardada no store.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;
    /// Dados usados para criar ou atualizar (tudo menos o `id`).
    type Draft: Serialize + Send + Sync;
}

/// Cliente CRUD tipado para uma entidade.
pub struct Entities<E> {
    store: SharedStore,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Entities<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Entities<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entities").field("store", &self.store).finish()
    }
}

impl<E: Entity> Entities<E> {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// `sort` segue o formato `campo` / `-campo`.
    pub async fn filter(&self, criteria: &Criteria, sort: Option<&str>) -> AppResult<Vec<E>> {
        let sort = sort.map(SortSpec::parse);
        let records = self.store.filter(E::KIND, criteria, sort.as_ref()).await?;
        records.into_iter().map(decode::<E>).collect()
    }

    pub async fn list(&self) -> AppResult<Vec<E>> {
        self.filter(&Criteria::new(), None).await
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<E>> {
        let mut found = self.filter(&Criteria::new().eq("id", id), None).await?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    pub async fn create(&self, draft: &E::Draft) -> AppResult<E> {
        let record = encode::<E>(draft)?;
        decode(self.store.create(E::KIND, record).await?)
    }

    pub async fn update(&self, id: &str, draft: &E::Draft) -> AppResult<E> {
        let record = encode::<E>(draft)?;
        decode(self.store.update(E::KIND, id, record).await?)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.store.delete(E::KIND, id).await
    }
}

fn decode<E: Entity>(record: Record) -> AppResult<E> {
    serde_json::from_value(Value::Object(record)).map_err(|source| AppError::MalformedRecord {
        entity: E::KIND.name(),
        source,
    })
}

fn encode<E: Entity>(draft: &E::Draft) -> AppResult<Record> {
    match serde_json::to_value(draft) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::StoreError(format!(
            "{} serializou para {} em vez de um objeto",
            E::KIND,
            other
        ))),
        Err(source) => Err(AppError::MalformedRecord {
            entity: E::KIND.name(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_spec_reads_leading_minus_as_descending() {
        assert_eq!(
            SortSpec::parse("-date"),
            SortSpec {
                field: "date".into(),
                descending: true
            }
        );
        assert!(!SortSpec::parse("roll").descending);
    }

    #[test]
    fn criteria_match_requires_every_field() {
        let record = json!({"teacher_email": "t@x.com", "subject": "Math"});
        let record = record.as_object().unwrap();
        assert!(Criteria::new().matches(record));
        assert!(Criteria::new().eq("subject", "Math").matches(record));
        assert!(!Criteria::new()
            .eq("subject", "Math")
            .eq("teacher_email", "other@x.com")
            .matches(record));
        // igualdade exata, sensível a maiúsculas
        assert!(!Criteria::new().eq("subject", "math").matches(record));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(EntityKind::Student.check_field("roll").is_ok());
        assert!(matches!(
            EntityKind::Student.check_field("roll; DROP TABLE students"),
            Err(AppError::UnknownField { .. })
        ));
    }
}
