use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Append-only audit entry. Never updated; removed only by bulk purges.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i64,

    #[sea_orm(unique)]
    pub unique_id: String,

    pub user_unique_id: Option<String>,

    pub r#type: String,

    pub action: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,

    /// Creation time plus one month.
    pub expiry_date: String,

    pub status: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserUniqueId",
        to = "super::users::Column::UniqueId"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
