use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A point-in-time identity check. Immutable after creation except for the
/// lifecycle status flag; every demographic field is independently nullable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "verifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip)]
    pub id: i64,

    #[sea_orm(unique)]
    pub unique_id: String,

    pub agency_unique_id: Option<String>,

    pub provider_unique_id: Option<String>,

    /// Requested check type, e.g. NIN or BVN.
    pub r#type: String,

    pub identification_id: Option<String>,

    pub title: Option<String>,
    pub firstname: Option<String>,
    pub middlename: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub alt_phone_number: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub nationality: Option<String>,
    pub state_of_origin: Option<String>,
    pub state_of_residence: Option<String>,
    pub nin: Option<String>,
    pub bvn: Option<String>,
    pub vnin: Option<String>,
    pub enrollment_bank: Option<String>,
    pub enrollment_branch: Option<String>,
    pub level_of_account: Option<String>,
    pub lga_of_origin: Option<String>,
    pub lga_of_residence: Option<String>,
    pub marital_status: Option<String>,
    pub name_on_card: Option<String>,
    pub registration_date: Option<String>,
    pub religion: Option<String>,
    pub height: Option<String>,
    pub educational_level: Option<String>,
    pub employment_status: Option<String>,
    pub nok_firstname: Option<String>,
    pub nok_middlename: Option<String>,
    pub nok_surname: Option<String>,
    pub nok_state: Option<String>,
    pub nok_lga: Option<String>,
    pub nok_town: Option<String>,
    pub nok_postalcode: Option<String>,
    pub nok_address_1: Option<String>,
    pub nok_address_2: Option<String>,
    pub native_spoken_lang: Option<String>,
    pub other_spoken_lang: Option<String>,
    pub profession: Option<String>,
    pub watch_listed: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub photo: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub base_64_image: Option<String>,

    pub verification_reference: Option<String>,
    pub verification_status: Option<String>,
    pub verification_endpoint: Option<String>,

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
