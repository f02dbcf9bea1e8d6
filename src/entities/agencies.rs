use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "agencies")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i64,

    #[sea_orm(unique)]
    pub unique_id: String,

    pub name: String,

    /// Last time a verification was attributed to this agency.
    pub sync_timestamp: Option<String>,

    /// Running count of attributed verifications.
    pub verifications: i64,

    pub status: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
