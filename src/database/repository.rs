use serde::Serialize;
use sqlx::{self, postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::types::ContentStatus;

/// Generic table-scoped reader shared by the catalog services. Writes stay
/// in the individual services; table and column names come from code, never
/// from request input.
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self { table_name, pool, _phantom: std::marker::PhantomData }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", self.table_name);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    pub async fn find_by_id_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{}: {} not found", self.table_name, id)))
    }

    /// List rows ordered by sequence_order then creation time; archived rows
    /// are filtered out unless explicitly requested.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
        include_archived: bool,
    ) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} {} ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            self.table_name,
            self.archived_clause(include_archived),
        );
        let rows =
            sqlx::query_as::<_, T>(&sql).bind(limit).bind(offset).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// List rows belonging to a parent row (e.g. courses of a program),
    /// ordered by their sequence_order.
    pub async fn list_by_parent(
        &self,
        parent_column: &'static str,
        parent_id: Uuid,
        include_archived: bool,
    ) -> Result<Vec<T>, DatabaseError> {
        let archived = if include_archived {
            String::new()
        } else {
            format!("AND status <> '{}'", ContentStatus::Archived)
        };
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1 {} ORDER BY sequence_order, created_at",
            self.table_name, parent_column, archived,
        );
        let rows = sqlx::query_as::<_, T>(&sql).bind(parent_id).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn count(&self, include_archived: bool) -> Result<i64, DatabaseError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} {}",
            self.table_name,
            self.archived_clause(include_archived),
        );
        let count: (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    fn archived_clause(&self, include_archived: bool) -> String {
        if include_archived {
            String::new()
        } else {
            format!("WHERE status <> '{}'", ContentStatus::Archived)
        }
    }
}
