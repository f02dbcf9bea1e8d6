use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i64,

    #[sea_orm(unique)]
    pub unique_id: String,

    /// ADMIN, AGENCY, PROVIDER or CITIZEN.
    pub r#type: String,

    pub agency_unique_id: Option<String>,

    pub provider_unique_id: Option<String>,

    pub fullname: String,

    #[sea_orm(unique)]
    pub email: String,

    pub role: Option<String>,

    pub login_timestamp: Option<String>,

    /// Argon2id password hash.
    #[serde(skip)]
    pub privates: String,

    /// 1 granted, 2 suspended, 3 revoked.
    pub access: i32,

    pub status: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::agencies::Entity",
        from = "Column::AgencyUniqueId",
        to = "super::agencies::Column::UniqueId"
    )]
    Agency,
    #[sea_orm(
        belongs_to = "super::providers::Entity",
        from = "Column::ProviderUniqueId",
        to = "super::providers::Column::UniqueId"
    )]
    Provider,
}

impl Related<super::agencies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agency.def()
    }
}

impl Related<super::providers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
