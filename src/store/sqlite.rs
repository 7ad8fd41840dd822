// src/store/sqlite.rs
use super::{value_to_text, Criteria, EntityKind, Record, RecordStore, SortSpec};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

/// Store sobre SQLite. Todas as colunas são TEXT; a cascata de `classrooms`
/// fica a cargo das foreign keys (ver migrações).
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_id(&self, kind: EntityKind, id: &str) -> AppResult<Record> {
        self.filter(kind, &Criteria::new().eq("id", id), None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} {}", kind, id)))
    }
}

fn row_to_record(kind: EntityKind, row: &SqliteRow) -> AppResult<Record> {
    let mut record = Record::new();
    for field in kind.fields() {
        let value: Option<String> = row.try_get(*field)?;
        record.insert(
            (*field).to_string(),
            value.map(Value::String).unwrap_or(Value::Null),
        );
    }
    Ok(record)
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn filter(
        &self,
        kind: EntityKind,
        criteria: &Criteria,
        sort: Option<&SortSpec>,
    ) -> AppResult<Vec<Record>> {
        // Nomes de colunas só entram na query depois de validados
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            kind.fields().join(", "),
            kind.table()
        ));
        for (i, (field, value)) in criteria.iter().enumerate() {
            kind.check_field(field)?;
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(field);
            qb.push(" = ");
            qb.push_bind(value.to_string());
        }
        qb.push(" ORDER BY ");
        if let Some(sort) = sort {
            kind.check_field(&sort.field)?;
            qb.push(&sort.field);
            qb.push(if sort.descending { " DESC, " } else { " ASC, " });
        }
        // rowid desempata pela ordem de inserção
        qb.push("rowid ASC");

        tracing::debug!("Store SQLite: filtro em {} ({:?}, {:?})", kind.table(), criteria, sort);
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(|row| row_to_record(kind, row)).collect()
    }

    async fn create(&self, kind: EntityKind, mut data: Record) -> AppResult<Record> {
        data.remove("id");
        for field in data.keys() {
            kind.check_field(field)?;
        }
        let id = Uuid::new_v4().to_string();

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("INSERT INTO {} (id", kind.table()));
        for field in data.keys() {
            qb.push(", ");
            qb.push(field);
        }
        qb.push(") VALUES (");
        qb.push_bind(id.clone());
        for value in data.values() {
            qb.push(", ");
            qb.push_bind(value_to_text(value));
        }
        qb.push(")");
        qb.build().execute(&self.pool).await?;

        tracing::debug!("Store SQLite: {} {} criado", kind, id);
        self.fetch_by_id(kind, &id).await
    }

    async fn update(&self, kind: EntityKind, id: &str, mut data: Record) -> AppResult<Record> {
        data.remove("id");
        for field in data.keys() {
            kind.check_field(field)?;
        }
        if data.is_empty() {
            return self.fetch_by_id(kind, id).await;
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("UPDATE {} SET ", kind.table()));
        {
            let mut set = qb.separated(", ");
            for (field, value) in &data {
                set.push(format!("{} = ", field));
                set.push_bind_unseparated(value_to_text(value));
            }
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());

        let rows_affected = qb.build().execute(&self.pool).await?.rows_affected();
        if rows_affected == 0 {
            tracing::warn!("Store SQLite: update sem efeito, {} {} não existe", kind, id);
            return Err(AppError::NotFound(format!("{} {}", kind, id)));
        }
        self.fetch_by_id(kind, id).await
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
        let rows_affected = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("{} {}", kind, id)));
        }
        tracing::debug!("Store SQLite: {} {} removido", kind, id);
        Ok(())
    }
}
