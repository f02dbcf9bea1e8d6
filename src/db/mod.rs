use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{agencies, app_defaults, logs, providers, users, verifications};

pub mod migrator;
pub mod repositories;

pub use repositories::log::{LogFilter, NewLog};
pub use repositories::user::{NewUser, verify_password};
pub use repositories::verification::VerificationScope;
pub use repositories::{Ordering, day_range};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") && !db_url.contains("mode=memory") {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn agency_repo(&self) -> repositories::agency::AgencyRepository {
        repositories::agency::AgencyRepository::new(self.conn.clone())
    }

    fn provider_repo(&self) -> repositories::provider::ProviderRepository {
        repositories::provider::ProviderRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn verification_repo(&self) -> repositories::verification::VerificationRepository {
        repositories::verification::VerificationRepository::new(self.conn.clone())
    }

    fn log_repo(&self) -> repositories::log::LogRepository {
        repositories::log::LogRepository::new(self.conn.clone())
    }

    fn app_default_repo(&self) -> repositories::app_default::AppDefaultRepository {
        repositories::app_default::AppDefaultRepository::new(self.conn.clone())
    }

    // ========== Agencies ==========

    pub async fn count_agencies(&self) -> Result<u64> {
        self.agency_repo().count().await
    }

    pub async fn count_agencies_created_between(&self, from: &str, to: &str) -> Result<u64> {
        self.agency_repo().count_created_between(from, to).await
    }

    pub async fn list_agencies(
        &self,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<agencies::Model>> {
        self.agency_repo().list(ordering, offset, limit).await
    }

    pub async fn list_all_agencies(&self, ordering: &Ordering) -> Result<Vec<agencies::Model>> {
        self.agency_repo().list_all(ordering).await
    }

    pub async fn count_matching_agencies(&self, search: &str) -> Result<u64> {
        self.agency_repo().count_matching(search).await
    }

    pub async fn search_agencies(
        &self,
        search: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<agencies::Model>> {
        self.agency_repo().search(search, offset, limit).await
    }

    pub async fn search_all_agencies(&self, search: &str) -> Result<Vec<agencies::Model>> {
        self.agency_repo().search_all(search).await
    }

    pub async fn get_agency(&self, unique_id: &str) -> Result<Option<agencies::Model>> {
        self.agency_repo().find_by_unique_id(unique_id).await
    }

    pub async fn agency_name_exists(&self, name: &str) -> Result<bool> {
        self.agency_repo().exists_by_name(name).await
    }

    pub async fn add_agency(&self, name: &str) -> Result<agencies::Model> {
        self.agency_repo().create(name).await
    }

    pub async fn update_agency_details(&self, unique_id: &str, name: &str) -> Result<u64> {
        self.agency_repo().update_details(unique_id, name).await
    }

    pub async fn delete_agency(&self, unique_id: &str) -> Result<u64> {
        self.agency_repo().soft_delete(unique_id).await
    }

    pub async fn record_agency_sync(&self, unique_id: &str) -> Result<()> {
        self.agency_repo().record_sync(unique_id).await
    }

    pub async fn sum_agency_verifications(&self, range: Option<(&str, &str)>) -> Result<i64> {
        self.agency_repo().sum_verifications(range).await
    }

    pub async fn sum_agency_verifications_for(&self, unique_id: &str) -> Result<i64> {
        self.agency_repo().sum_verifications_for(unique_id).await
    }

    // ========== Providers ==========

    pub async fn count_providers(&self) -> Result<u64> {
        self.provider_repo().count().await
    }

    pub async fn count_providers_created_between(&self, from: &str, to: &str) -> Result<u64> {
        self.provider_repo().count_created_between(from, to).await
    }

    pub async fn list_providers(
        &self,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<providers::Model>> {
        self.provider_repo().list(ordering, offset, limit).await
    }

    pub async fn list_all_providers(&self, ordering: &Ordering) -> Result<Vec<providers::Model>> {
        self.provider_repo().list_all(ordering).await
    }

    pub async fn count_matching_providers(&self, search: &str) -> Result<u64> {
        self.provider_repo().count_matching(search).await
    }

    pub async fn search_providers(
        &self,
        search: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<providers::Model>> {
        self.provider_repo().search(search, offset, limit).await
    }

    pub async fn search_all_providers(&self, search: &str) -> Result<Vec<providers::Model>> {
        self.provider_repo().search_all(search).await
    }

    pub async fn get_provider(&self, unique_id: &str) -> Result<Option<providers::Model>> {
        self.provider_repo().find_by_unique_id(unique_id).await
    }

    pub async fn provider_name_exists(&self, name: &str) -> Result<bool> {
        self.provider_repo().exists_by_name(name).await
    }

    pub async fn add_provider(&self, name: &str, provider_type: &str) -> Result<providers::Model> {
        self.provider_repo().create(name, provider_type).await
    }

    pub async fn update_provider_details(
        &self,
        unique_id: &str,
        name: &str,
        provider_type: &str,
    ) -> Result<u64> {
        self.provider_repo()
            .update_details(unique_id, name, provider_type)
            .await
    }

    pub async fn delete_provider(&self, unique_id: &str) -> Result<u64> {
        self.provider_repo().soft_delete(unique_id).await
    }

    pub async fn record_provider_usage(&self, unique_id: &str) -> Result<()> {
        self.provider_repo().record_usage(unique_id).await
    }

    pub async fn sum_provider_usage(&self, range: Option<(&str, &str)>) -> Result<i64> {
        self.provider_repo().sum_usage(range).await
    }

    pub async fn sum_provider_usage_for(&self, unique_id: &str) -> Result<i64> {
        self.provider_repo().sum_usage_for(unique_id).await
    }

    // ========== Users ==========

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn count_users_created_between(&self, from: &str, to: &str) -> Result<u64> {
        self.user_repo().count_created_between(from, to).await
    }

    pub async fn list_users(
        &self,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<(users::Model, Option<agencies::Model>, Option<providers::Model>)>> {
        self.user_repo().list(ordering, offset, limit).await
    }

    pub async fn count_matching_users(&self, search: &str) -> Result<u64> {
        self.user_repo().count_matching(search).await
    }

    pub async fn search_users(
        &self,
        search: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<(users::Model, Option<agencies::Model>, Option<providers::Model>)>> {
        self.user_repo().search(search, offset, limit).await
    }

    pub async fn get_user(
        &self,
        unique_id: &str,
    ) -> Result<Option<(users::Model, Option<agencies::Model>, Option<providers::Model>)>> {
        self.user_repo().find_by_unique_id(unique_id).await
    }

    pub async fn get_user_any_status(&self, unique_id: &str) -> Result<Option<users::Model>> {
        self.user_repo()
            .find_by_unique_id_any_status(unique_id)
            .await
    }

    pub async fn get_active_user(&self, unique_id: &str) -> Result<Option<users::Model>> {
        self.user_repo().find_active_by_unique_id(unique_id).await
    }

    pub async fn get_active_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().find_active_by_email(email).await
    }

    pub async fn get_active_agency_user(
        &self,
        email: &str,
        agency_unique_id: &str,
    ) -> Result<Option<(users::Model, Option<agencies::Model>)>> {
        self.user_repo()
            .find_active_agency_user(email, agency_unique_id)
            .await
    }

    pub async fn get_active_provider_user(
        &self,
        email: &str,
    ) -> Result<Option<(users::Model, Option<providers::Model>)>> {
        self.user_repo().find_active_provider_user(email).await
    }

    pub async fn user_email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn add_user(&self, new_user: NewUser) -> Result<users::Model> {
        self.user_repo().create(new_user).await
    }

    pub async fn update_user_details(
        &self,
        unique_id: &str,
        fullname: &str,
        role: &str,
    ) -> Result<u64> {
        self.user_repo()
            .update_details(unique_id, fullname, role)
            .await
    }

    pub async fn update_user_agency(&self, unique_id: &str, agency_unique_id: &str) -> Result<u64> {
        self.user_repo()
            .update_agency(unique_id, agency_unique_id)
            .await
    }

    pub async fn update_user_provider(
        &self,
        unique_id: &str,
        provider_unique_id: &str,
    ) -> Result<u64> {
        self.user_repo()
            .update_provider(unique_id, provider_unique_id)
            .await
    }

    pub async fn update_user_password(&self, unique_id: &str, password: String) -> Result<u64> {
        self.user_repo().update_password(unique_id, password).await
    }

    pub async fn update_user_access(&self, unique_id: &str, new_access: i32) -> Result<u64> {
        self.user_repo().update_access(unique_id, new_access).await
    }

    pub async fn update_user_login_timestamp(&self, unique_id: &str) -> Result<()> {
        self.user_repo().update_login_timestamp(unique_id).await
    }

    pub async fn delete_user(&self, unique_id: &str) -> Result<u64> {
        self.user_repo().soft_delete(unique_id).await
    }

    // ========== Verifications ==========

    pub async fn count_verifications(&self, scope: VerificationScope<'_>) -> Result<u64> {
        self.verification_repo().count(scope).await
    }

    pub async fn count_verifications_created_between(&self, from: &str, to: &str) -> Result<u64> {
        self.verification_repo()
            .count_created_between(from, to)
            .await
    }

    pub async fn list_verifications(
        &self,
        scope: VerificationScope<'_>,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<
        Vec<(
            verifications::Model,
            Option<agencies::Model>,
            Option<providers::Model>,
        )>,
    > {
        self.verification_repo()
            .list(scope, ordering, offset, limit)
            .await
    }

    pub async fn count_matching_verifications(
        &self,
        scope: VerificationScope<'_>,
        search: &str,
    ) -> Result<u64> {
        self.verification_repo().count_matching(scope, search).await
    }

    pub async fn search_verifications(
        &self,
        scope: VerificationScope<'_>,
        search: &str,
        offset: u64,
        limit: u64,
    ) -> Result<
        Vec<(
            verifications::Model,
            Option<agencies::Model>,
            Option<providers::Model>,
        )>,
    > {
        self.verification_repo()
            .search(scope, search, offset, limit)
            .await
    }

    pub async fn get_verification(
        &self,
        unique_id: &str,
        scope: VerificationScope<'_>,
    ) -> Result<
        Option<(
            verifications::Model,
            Option<agencies::Model>,
            Option<providers::Model>,
        )>,
    > {
        self.verification_repo().find_one(unique_id, scope).await
    }

    pub async fn verification_email_exists(&self, email: &str) -> Result<bool> {
        self.verification_repo().email_exists(email).await
    }

    pub async fn verification_phone_number_exists(&self, phone_number: &str) -> Result<bool> {
        self.verification_repo().phone_number_exists(phone_number).await
    }

    pub async fn get_cached_verification(
        &self,
        record_type: &str,
        identification_id: &str,
        agency_unique_id: Option<&str>,
        provider_unique_id: Option<&str>,
    ) -> Result<Option<verifications::Model>> {
        self.verification_repo()
            .find_cached(
                record_type,
                identification_id,
                agency_unique_id,
                provider_unique_id,
            )
            .await
    }

    pub async fn add_verification(
        &self,
        model: verifications::ActiveModel,
    ) -> Result<verifications::Model> {
        self.verification_repo().create(model).await
    }

    pub async fn delete_verification(&self, unique_id: &str) -> Result<u64> {
        self.verification_repo().soft_delete(unique_id).await
    }

    pub async fn count_verifications_by_type(
        &self,
        scope: VerificationScope<'_>,
        range: Option<(&str, &str)>,
    ) -> Result<Vec<(String, i64)>> {
        self.verification_repo().count_by_type(scope, range).await
    }

    pub async fn count_verifications_by_agency(
        &self,
        agency_unique_id: Option<&str>,
        range: Option<(&str, &str)>,
    ) -> Result<Vec<(String, i64)>> {
        self.verification_repo()
            .count_by_agency(agency_unique_id, range)
            .await
    }

    pub async fn count_verifications_by_provider(
        &self,
        provider_unique_id: Option<&str>,
        range: Option<(&str, &str)>,
    ) -> Result<Vec<(String, i64)>> {
        self.verification_repo()
            .count_by_provider(provider_unique_id, range)
            .await
    }

    // ========== Logs ==========

    pub async fn add_log(&self, new_log: NewLog, expiry_date: String) -> Result<logs::Model> {
        self.log_repo().add(new_log, expiry_date).await
    }

    pub async fn count_logs(&self, filter: LogFilter<'_>) -> Result<u64> {
        self.log_repo().count(filter).await
    }

    pub async fn list_logs(
        &self,
        filter: LogFilter<'_>,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<(logs::Model, Option<users::Model>)>> {
        self.log_repo().list(filter, ordering, offset, limit).await
    }

    pub async fn purge_logs_created_between(&self, from: &str, to: &str) -> Result<u64> {
        self.log_repo().purge_created_between(from, to).await
    }

    pub async fn purge_logs_expiring_between(&self, from: &str, to: &str) -> Result<u64> {
        self.log_repo().purge_expiring_between(from, to).await
    }

    pub async fn count_logs_created_between(&self, from: &str, to: &str) -> Result<u64> {
        self.log_repo()
            .count(LogFilter {
                created_range: Some((from, to)),
                ..LogFilter::default()
            })
            .await
    }

    // ========== App defaults ==========

    pub async fn get_app_default(&self, criteria: &str) -> Result<Option<app_defaults::Model>> {
        self.app_default_repo().get(criteria).await
    }

    pub async fn set_app_default_value(&self, criteria: &str, value: Option<&str>) -> Result<u64> {
        self.app_default_repo().set_value(criteria, value).await
    }
}
