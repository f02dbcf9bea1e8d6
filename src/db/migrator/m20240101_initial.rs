use crate::constants::{access, app_defaults, now_str, status, user_types};
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Seed credentials for the default administrator account.
const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_ADMIN_PASSWORD: &[u8] = b"Abcd-1234";

/// Hash the default admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(DEFAULT_ADMIN_PASSWORD, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Parents first so the foreign keys on users and verifications resolve
        manager
            .create_table(
                schema
                    .create_table_from_entity(Agencies)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Providers)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Verifications)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Logs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AppDefaults)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = now_str();

        // Seed runtime settings
        let defaults: [(&str, &str, Option<&str>); 8] = [
            (app_defaults::MAINTENANCE, "BOOLEAN", Some("false")),
            (app_defaults::PAYSTACK_SECRET_KEY, "STRING", None),
            (app_defaults::PAYSTACK_PUBLIC_KEY, "STRING", None),
            (app_defaults::PASSCODER_TEST_KEY, "STRING", None),
            (app_defaults::PASSCODER_LIVE_KEY, "STRING", None),
            (app_defaults::USERS_EMAILS, "ARRAY", None),
            (app_defaults::USERS_PHONE_NUMBERS, "ARRAY", None),
            (app_defaults::API_WHITELIST, "ARRAY", None),
        ];

        for (criteria, data_type, value) in defaults {
            let insert = sea_orm_migration::sea_query::Query::insert()
                .into_table(AppDefaults)
                .columns([
                    crate::entities::app_defaults::Column::UniqueId,
                    crate::entities::app_defaults::Column::Criteria,
                    crate::entities::app_defaults::Column::DataType,
                    crate::entities::app_defaults::Column::Value,
                    crate::entities::app_defaults::Column::Status,
                    crate::entities::app_defaults::Column::CreatedAt,
                    crate::entities::app_defaults::Column::UpdatedAt,
                ])
                .values_panic([
                    Uuid::new_v4().to_string().into(),
                    criteria.into(),
                    data_type.into(),
                    value.into(),
                    status::ACTIVE.into(),
                    now.clone().into(),
                    now.clone().into(),
                ])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        // Seed default admin user with hashed password
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::UniqueId,
                crate::entities::users::Column::Type,
                crate::entities::users::Column::Fullname,
                crate::entities::users::Column::Email,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::Privates,
                crate::entities::users::Column::Access,
                crate::entities::users::Column::Status,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                Uuid::new_v4().to_string().into(),
                user_types::ADMIN.into(),
                "Default User".into(),
                DEFAULT_ADMIN_EMAIL.into(),
                "Super Admin".into(),
                password_hash.into(),
                access::GRANTED.into(),
                status::ACTIVE.into(),
                now.clone().into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AppDefaults).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Logs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Verifications).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Providers).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Agencies).to_owned())
            .await?;

        Ok(())
    }
}
