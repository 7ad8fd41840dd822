// src/store/memory.rs
//! Store em memória. Usado nos testes: regista cada chamada recebida e pode
//! ser configurado para falhar numa operação específica.

use super::{value_as_str, Criteria, EntityKind, Record, RecordStore, SortSpec};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Filter,
    Create,
    Update,
    Delete,
}

/// Uma chamada recebida pelo store, pela ordem de chegada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub kind: EntityKind,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<EntityKind, Vec<Record>>,
    calls: Vec<StoreCall>,
    failing: HashSet<(StoreOp, EntityKind)>,
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A partir de agora, `op` sobre `kind` falha (a chamada continua a ser registada).
    pub async fn fail_on(&self, op: StoreOp, kind: EntityKind) {
        self.inner.lock().await.failing.insert((op, kind));
    }

    pub async fn clear_failures(&self) {
        self.inner.lock().await.failing.clear();
    }

    pub async fn count_calls(&self, op: StoreOp, kind: EntityKind) -> usize {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.op == op && c.kind == kind)
            .count()
    }

    pub async fn reset_calls(&self) {
        self.inner.lock().await.calls.clear();
    }

    /// Número de registos guardados para `kind`, sem contar como chamada.
    pub async fn len(&self, kind: EntityKind) -> usize {
        self.inner
            .lock()
            .await
            .tables
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl Inner {
    fn record_call(&mut self, op: StoreOp, kind: EntityKind, id: Option<&str>) -> AppResult<()> {
        self.calls.push(StoreCall {
            op,
            kind,
            id: id.map(str::to_string),
        });
        if self.failing.contains(&(op, kind)) {
            tracing::debug!("Store em memória: falha simulada em {:?} {}", op, kind);
            return Err(AppError::StoreError(format!("falha simulada: {:?} {}", op, kind)));
        }
        Ok(())
    }

    fn remove_where(&mut self, kind: EntityKind, field: &str, value: &str) -> usize {
        let rows = self.tables.entry(kind).or_default();
        let before = rows.len();
        rows.retain(|r| r.get(field).and_then(value_as_str) != Some(value));
        before - rows.len()
    }
}

fn check_data(kind: EntityKind, data: &Record) -> AppResult<()> {
    data.keys().try_for_each(|field| kind.check_field(field))
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn filter(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
        sort: Option<&SortSpec>,
    ) -> AppResult<Vec<Record>> {
        let mut inner = self.inner.lock().await;
        inner.record_call(StoreOp::Filter, kind, None)?;
        for (field, _) in criteria.iter() {
            kind.check_field(field)?;
        }
        if let Some(sort) = sort {
            kind.check_field(&sort.field)?;
        }

        let mut rows: Vec<Record> = inner
            .tables
            .get(&kind)
            .map(|rows| rows.iter().filter(|r| criteria.matches(r)).cloned().collect())
            .unwrap_or_default();

        // sort_by é estável: empates mantêm a ordem de inserção
        if let Some(sort) = sort {
            rows.sort_by(|a, b| {
                let ka = a.get(&sort.field).and_then(value_as_str);
                let kb = b.get(&sort.field).and_then(value_as_str);
                if sort.descending {
                    kb.cmp(&ka)
                } else {
                    ka.cmp(&kb)
                }
            });
        }
        Ok(rows)
    }

    async fn create(&self, kind: EntityKind, mut data: Record) -> AppResult<Record> {
        let mut inner = self.inner.lock().await;
        inner.record_call(StoreOp::Create, kind, None)?;
        data.remove("id");
        check_data(kind, &data)?;

        let id = Uuid::new_v4().to_string();
        let mut record = Record::new();
        for field in kind.fields() {
            let value = if *field == "id" {
                Value::String(id.clone())
            } else {
                data.remove(*field).unwrap_or(Value::Null)
            };
            record.insert((*field).to_string(), value);
        }
        inner.tables.entry(kind).or_default().push(record.clone());
        Ok(record)
    }

    async fn update(&self, kind: EntityKind, id: &str, mut data: Record) -> AppResult<Record> {
        let mut inner = self.inner.lock().await;
        inner.record_call(StoreOp::Update, kind, Some(id))?;
        data.remove("id");
        check_data(kind, &data)?;

        let row = inner
            .tables
            .get_mut(&kind)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.get("id").and_then(value_as_str) == Some(id))
            })
            .ok_or_else(|| AppError::NotFound(format!("{} {}", kind, id)))?;
        for (field, value) in data {
            row.insert(field, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.record_call(StoreOp::Delete, kind, Some(id))?;
        if inner.remove_where(kind, "id", id) == 0 {
            return Err(AppError::NotFound(format!("{} {}", kind, id)));
        }
        for (dependent, field) in kind.cascades() {
            let removed = inner.remove_where(*dependent, field, id);
            tracing::debug!("Cascata: {} {} removidos com {} {}", removed, dependent, kind, id);
        }
        Ok(())
    }
}
