use crate::constants::now_str;
use crate::entities::{app_defaults, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

pub struct AppDefaultRepository {
    conn: DatabaseConnection,
}

impl AppDefaultRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, criteria: &str) -> Result<Option<app_defaults::Model>> {
        Ok(AppDefaults::find()
            .filter(app_defaults::Column::Criteria.eq(criteria))
            .one(&self.conn)
            .await?)
    }

    pub async fn set_value(&self, criteria: &str, value: Option<&str>) -> Result<u64> {
        let result = AppDefaults::update_many()
            .col_expr(app_defaults::Column::Value, Expr::value(value))
            .col_expr(app_defaults::Column::UpdatedAt, Expr::value(now_str()))
            .filter(app_defaults::Column::Criteria.eq(criteria))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
