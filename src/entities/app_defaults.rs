use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Runtime settings keyed by criteria, editable without a redeploy.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "app_defaults")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i64,

    #[sea_orm(unique)]
    pub unique_id: String,

    #[sea_orm(unique)]
    pub criteria: String,

    /// Declared shape of the value, e.g. STRING, BOOLEAN, ARRAY.
    pub data_type: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub value: Option<String>,

    pub status: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
