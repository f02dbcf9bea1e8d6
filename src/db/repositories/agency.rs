use crate::constants::{now_str, status};
use crate::entities::{agencies, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::Ordering;

pub struct AgencyRepository {
    conn: DatabaseConnection,
}

fn order_column(name: &str) -> agencies::Column {
    match name {
        "name" => agencies::Column::Name,
        "verifications" => agencies::Column::Verifications,
        "updatedAt" => agencies::Column::UpdatedAt,
        _ => agencies::Column::CreatedAt,
    }
}

fn visible() -> sea_orm::Select<Agencies> {
    Agencies::find().filter(agencies::Column::Status.ne(status::DELETED))
}

impl AgencyRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(visible().count(&self.conn).await?)
    }

    pub async fn count_created_between(&self, from: &str, to: &str) -> Result<u64> {
        Ok(visible()
            .filter(agencies::Column::CreatedAt.gte(from))
            .filter(agencies::Column::CreatedAt.lte(to))
            .count(&self.conn)
            .await?)
    }

    pub async fn list(
        &self,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<agencies::Model>> {
        let col = order_column(&ordering.order_by);
        let query = if ordering.descending {
            visible().order_by_desc(col)
        } else {
            visible().order_by_asc(col)
        };
        Ok(query.offset(offset).limit(limit).all(&self.conn).await?)
    }

    pub async fn list_all(&self, ordering: &Ordering) -> Result<Vec<agencies::Model>> {
        let col = order_column(&ordering.order_by);
        let query = if ordering.descending {
            visible().order_by_desc(col)
        } else {
            visible().order_by_asc(col)
        };
        Ok(query.all(&self.conn).await?)
    }

    pub async fn count_matching(&self, search: &str) -> Result<u64> {
        Ok(visible()
            .filter(agencies::Column::Name.contains(search))
            .count(&self.conn)
            .await?)
    }

    pub async fn search(
        &self,
        search: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<agencies::Model>> {
        Ok(visible()
            .filter(agencies::Column::Name.contains(search))
            .order_by_desc(agencies::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }

    pub async fn search_all(&self, search: &str) -> Result<Vec<agencies::Model>> {
        Ok(visible()
            .filter(agencies::Column::Name.contains(search))
            .order_by_desc(agencies::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }

    pub async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<agencies::Model>> {
        Ok(visible()
            .filter(agencies::Column::UniqueId.eq(unique_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let count = visible()
            .filter(agencies::Column::Name.eq(name))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, name: &str) -> Result<agencies::Model> {
        let txn = self.conn.begin().await?;
        let now = now_str();

        let agency = agencies::ActiveModel {
            unique_id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            sync_timestamp: Set(None),
            verifications: Set(0),
            status: Set(status::ACTIVE),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(agency)
    }

    pub async fn update_details(&self, unique_id: &str, name: &str) -> Result<u64> {
        let result = Agencies::update_many()
            .col_expr(agencies::Column::Name, Expr::value(name))
            .col_expr(agencies::Column::UpdatedAt, Expr::value(now_str()))
            .filter(agencies::Column::UniqueId.eq(unique_id))
            .filter(agencies::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn soft_delete(&self, unique_id: &str) -> Result<u64> {
        let result = Agencies::update_many()
            .col_expr(agencies::Column::Status, Expr::value(status::DELETED))
            .col_expr(agencies::Column::UpdatedAt, Expr::value(now_str()))
            .filter(agencies::Column::UniqueId.eq(unique_id))
            .filter(agencies::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Records an attributed lookup: stamps the sync time and bumps the
    /// verification counter by one.
    pub async fn record_sync(&self, unique_id: &str) -> Result<()> {
        Agencies::update_many()
            .col_expr(agencies::Column::SyncTimestamp, Expr::value(now_str()))
            .col_expr(
                agencies::Column::Verifications,
                Expr::col(agencies::Column::Verifications).add(1),
            )
            .col_expr(agencies::Column::UpdatedAt, Expr::value(now_str()))
            .filter(agencies::Column::UniqueId.eq(unique_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn sum_verifications(&self, range: Option<(&str, &str)>) -> Result<i64> {
        let mut query = visible().select_only().column_as(
            agencies::Column::Verifications.sum(),
            "total_verifications",
        );
        if let Some((from, to)) = range {
            query = query
                .filter(agencies::Column::CreatedAt.gte(from))
                .filter(agencies::Column::CreatedAt.lte(to));
        }
        let total: Option<Option<i64>> = query.into_tuple().one(&self.conn).await?;
        Ok(total.flatten().unwrap_or(0))
    }

    pub async fn sum_verifications_for(&self, unique_id: &str) -> Result<i64> {
        let total: Option<Option<i64>> = visible()
            .select_only()
            .column_as(
                agencies::Column::Verifications.sum(),
                "total_verifications",
            )
            .filter(agencies::Column::UniqueId.eq(unique_id))
            .into_tuple()
            .one(&self.conn)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }
}
