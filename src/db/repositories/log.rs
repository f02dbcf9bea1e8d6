use crate::constants::{now_str, status};
use crate::entities::{logs, prelude::*, users};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::Ordering;

/// Fields of a new audit entry. The expiry date and identifiers are
/// filled in on insert.
pub struct NewLog {
    pub user_unique_id: String,
    pub r#type: String,
    pub action: String,
    pub details: Option<String>,
}

/// Narrowing for audit listings, either by category or by actor.
#[derive(Clone, Copy, Default)]
pub struct LogFilter<'a> {
    pub r#type: Option<&'a str>,
    pub user_unique_id: Option<&'a str>,
    pub created_range: Option<(&'a str, &'a str)>,
}

pub struct LogRepository {
    conn: DatabaseConnection,
}

fn order_column(name: &str) -> logs::Column {
    match name {
        "type" => logs::Column::Type,
        "expiry_date" => logs::Column::ExpiryDate,
        "updatedAt" => logs::Column::UpdatedAt,
        _ => logs::Column::CreatedAt,
    }
}

fn filtered(filter: LogFilter<'_>) -> sea_orm::Select<Logs> {
    let mut query = Logs::find();
    if let Some(log_type) = filter.r#type {
        query = query.filter(logs::Column::Type.eq(log_type));
    }
    if let Some(user) = filter.user_unique_id {
        query = query.filter(logs::Column::UserUniqueId.eq(user));
    }
    if let Some((from, to)) = filter.created_range {
        query = query
            .filter(logs::Column::CreatedAt.gte(from))
            .filter(logs::Column::CreatedAt.lte(to));
    }
    query
}

impl LogRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, new_log: NewLog, expiry_date: String) -> Result<logs::Model> {
        let now = now_str();
        let model = logs::ActiveModel {
            unique_id: Set(Uuid::new_v4().to_string()),
            user_unique_id: Set(Some(new_log.user_unique_id)),
            r#type: Set(new_log.r#type),
            action: Set(new_log.action),
            details: Set(new_log.details),
            expiry_date: Set(expiry_date),
            status: Set(status::ACTIVE),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(&self.conn).await?)
    }

    pub async fn count(&self, filter: LogFilter<'_>) -> Result<u64> {
        Ok(filtered(filter).count(&self.conn).await?)
    }

    pub async fn list(
        &self,
        filter: LogFilter<'_>,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<(logs::Model, Option<users::Model>)>> {
        let col = order_column(&ordering.order_by);
        let query = if ordering.descending {
            filtered(filter).order_by_desc(col)
        } else {
            filtered(filter).order_by_asc(col)
        };
        Ok(query
            .find_also_related(Users)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }

    /// Removes entries created inside the given bounds. Purges are hard
    /// deletes, audit rows do not get a soft-deleted afterlife.
    pub async fn purge_created_between(&self, from: &str, to: &str) -> Result<u64> {
        let result = Logs::delete_many()
            .filter(logs::Column::CreatedAt.gte(from))
            .filter(logs::Column::CreatedAt.lte(to))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Removes entries whose expiry date falls inside the given bounds.
    pub async fn purge_expiring_between(&self, from: &str, to: &str) -> Result<u64> {
        let result = Logs::delete_many()
            .filter(logs::Column::ExpiryDate.gte(from))
            .filter(logs::Column::ExpiryDate.lte(to))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
