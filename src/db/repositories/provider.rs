use crate::constants::{now_str, status};
use crate::entities::{prelude::*, providers};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::Ordering;

pub struct ProviderRepository {
    conn: DatabaseConnection,
}

fn order_column(name: &str) -> providers::Column {
    match name {
        "name" => providers::Column::Name,
        "type" => providers::Column::Type,
        "usage" => providers::Column::Usage,
        "updatedAt" => providers::Column::UpdatedAt,
        _ => providers::Column::CreatedAt,
    }
}

fn visible() -> sea_orm::Select<Providers> {
    Providers::find().filter(providers::Column::Status.ne(status::DELETED))
}

impl ProviderRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(visible().count(&self.conn).await?)
    }

    pub async fn count_created_between(&self, from: &str, to: &str) -> Result<u64> {
        Ok(visible()
            .filter(providers::Column::CreatedAt.gte(from))
            .filter(providers::Column::CreatedAt.lte(to))
            .count(&self.conn)
            .await?)
    }

    pub async fn list(
        &self,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<providers::Model>> {
        let col = order_column(&ordering.order_by);
        let query = if ordering.descending {
            visible().order_by_desc(col)
        } else {
            visible().order_by_asc(col)
        };
        Ok(query.offset(offset).limit(limit).all(&self.conn).await?)
    }

    pub async fn list_all(&self, ordering: &Ordering) -> Result<Vec<providers::Model>> {
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
            .filter(providers::Column::Name.contains(search))
            .count(&self.conn)
            .await?)
    }

    pub async fn search(
        &self,
        search: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<providers::Model>> {
        Ok(visible()
            .filter(providers::Column::Name.contains(search))
            .order_by_desc(providers::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }

    pub async fn search_all(&self, search: &str) -> Result<Vec<providers::Model>> {
        Ok(visible()
            .filter(providers::Column::Name.contains(search))
            .order_by_desc(providers::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }

    pub async fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<providers::Model>> {
        Ok(visible()
            .filter(providers::Column::UniqueId.eq(unique_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let count = visible()
            .filter(providers::Column::Name.eq(name))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, name: &str, provider_type: &str) -> Result<providers::Model> {
        let txn = self.conn.begin().await?;
        let now = now_str();

        let provider = providers::ActiveModel {
            unique_id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            r#type: Set(provider_type.to_string()),
            access_timestamp: Set(None),
            usage: Set(0),
            status: Set(status::ACTIVE),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(provider)
    }

    pub async fn update_details(
        &self,
        unique_id: &str,
        name: &str,
        provider_type: &str,
    ) -> Result<u64> {
        let result = Providers::update_many()
            .col_expr(providers::Column::Name, Expr::value(name))
            .col_expr(providers::Column::Type, Expr::value(provider_type))
            .col_expr(providers::Column::UpdatedAt, Expr::value(now_str()))
            .filter(providers::Column::UniqueId.eq(unique_id))
            .filter(providers::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn soft_delete(&self, unique_id: &str) -> Result<u64> {
        let result = Providers::update_many()
            .col_expr(providers::Column::Status, Expr::value(status::DELETED))
            .col_expr(providers::Column::UpdatedAt, Expr::value(now_str()))
            .filter(providers::Column::UniqueId.eq(unique_id))
            .filter(providers::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Records a billed upstream call: stamps the access time and bumps
    /// the usage counter by one.
    pub async fn record_usage(&self, unique_id: &str) -> Result<()> {
        Providers::update_many()
            .col_expr(providers::Column::AccessTimestamp, Expr::value(now_str()))
            .col_expr(
                providers::Column::Usage,
                Expr::col(providers::Column::Usage).add(1),
            )
            .col_expr(providers::Column::UpdatedAt, Expr::value(now_str()))
            .filter(providers::Column::UniqueId.eq(unique_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn sum_usage(&self, range: Option<(&str, &str)>) -> Result<i64> {
        let mut query = visible()
            .select_only()
            .column_as(providers::Column::Usage.sum(), "total_usage");
        if let Some((from, to)) = range {
            query = query
                .filter(providers::Column::CreatedAt.gte(from))
                .filter(providers::Column::CreatedAt.lte(to));
        }
        let total: Option<Option<i64>> = query.into_tuple().one(&self.conn).await?;
        Ok(total.flatten().unwrap_or(0))
    }

    pub async fn sum_usage_for(&self, unique_id: &str) -> Result<i64> {
        let total: Option<Option<i64>> = visible()
            .select_only()
            .column_as(providers::Column::Usage.sum(), "total_usage")
            .filter(providers::Column::UniqueId.eq(unique_id))
            .into_tuple()
            .one(&self.conn)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }
}
