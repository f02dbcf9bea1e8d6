use crate::constants::{access, now_str, status};
use crate::entities::{agencies, prelude::*, providers, users};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::Ordering;

/// Fields taken when registering an account. Links to an agency or a
/// provider are only set for staff accounts created by an admin.
pub struct NewUser {
    pub r#type: String,
    pub agency_unique_id: Option<String>,
    pub provider_unique_id: Option<String>,
    pub fullname: String,
    pub email: String,
    pub role: String,
    pub password: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

fn order_column(name: &str) -> users::Column {
    match name {
        "fullname" => users::Column::Fullname,
        "email" => users::Column::Email,
        "role" => users::Column::Role,
        "updatedAt" => users::Column::UpdatedAt,
        _ => users::Column::CreatedAt,
    }
}

fn visible() -> sea_orm::Select<Users> {
    Users::find().filter(users::Column::Status.ne(status::DELETED))
}

fn active() -> sea_orm::Select<Users> {
    Users::find().filter(users::Column::Status.eq(status::ACTIVE))
}

/// Hashes a password with Argon2id off the async runtime.
pub async fn hash_password(password: String) -> Result<String> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))
    })
    .await?
}

/// Checks a candidate password against a stored Argon2 hash off the
/// async runtime.
pub async fn verify_password(hash: String, password: String) -> Result<bool> {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| anyhow::anyhow!("stored password hash is invalid: {e}"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await?
}

impl UserRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(visible().count(&self.conn).await?)
    }

    pub async fn count_created_between(&self, from: &str, to: &str) -> Result<u64> {
        Ok(visible()
            .filter(users::Column::CreatedAt.gte(from))
            .filter(users::Column::CreatedAt.lte(to))
            .count(&self.conn)
            .await?)
    }

    pub async fn list(
        &self,
        ordering: &Ordering,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<(users::Model, Option<agencies::Model>, Option<providers::Model>)>> {
        let col = order_column(&ordering.order_by);
        let query = if ordering.descending {
            visible().order_by_desc(col)
        } else {
            visible().order_by_asc(col)
        };
        let rows = query
            .find_also_related(Agencies)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;
        self.attach_providers(rows).await
    }

    pub async fn count_matching(&self, search: &str) -> Result<u64> {
        Ok(visible()
            .filter(Self::search_condition(search))
            .count(&self.conn)
            .await?)
    }

    pub async fn search(
        &self,
        search: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<(users::Model, Option<agencies::Model>, Option<providers::Model>)>> {
        let rows = visible()
            .filter(Self::search_condition(search))
            .order_by_asc(users::Column::Fullname)
            .order_by_desc(users::Column::CreatedAt)
            .find_also_related(Agencies)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;
        self.attach_providers(rows).await
    }

    fn search_condition(search: &str) -> Condition {
        Condition::any()
            .add(users::Column::Fullname.contains(search))
            .add(users::Column::Email.contains(search))
            .add(users::Column::Role.contains(search))
    }

    async fn attach_providers(
        &self,
        rows: Vec<(users::Model, Option<agencies::Model>)>,
    ) -> Result<Vec<(users::Model, Option<agencies::Model>, Option<providers::Model>)>> {
        let mut out = Vec::with_capacity(rows.len());
        for (user, agency) in rows {
            let provider = match &user.provider_unique_id {
                Some(provider_id) => {
                    Providers::find()
                        .filter(providers::Column::UniqueId.eq(provider_id))
                        .one(&self.conn)
                        .await?
                }
                None => None,
            };
            out.push((user, agency, provider));
        }
        Ok(out)
    }

    pub async fn find_by_unique_id(
        &self,
        unique_id: &str,
    ) -> Result<Option<(users::Model, Option<agencies::Model>, Option<providers::Model>)>> {
        let row = visible()
            .filter(users::Column::UniqueId.eq(unique_id))
            .find_also_related(Agencies)
            .one(&self.conn)
            .await?;
        match row {
            Some(pair) => Ok(self.attach_providers(vec![pair]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Unfiltered lookup for the auth gates, which must tell a deleted
    /// account apart from a missing one.
    pub async fn find_by_unique_id_any_status(
        &self,
        unique_id: &str,
    ) -> Result<Option<users::Model>> {
        Ok(Users::find()
            .filter(users::Column::UniqueId.eq(unique_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn find_active_by_unique_id(&self, unique_id: &str) -> Result<Option<users::Model>> {
        Ok(active()
            .filter(users::Column::UniqueId.eq(unique_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        Ok(active()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await?)
    }

    pub async fn find_active_agency_user(
        &self,
        email: &str,
        agency_unique_id: &str,
    ) -> Result<Option<(users::Model, Option<agencies::Model>)>> {
        Ok(active()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::AgencyUniqueId.eq(agency_unique_id))
            .find_also_related(Agencies)
            .one(&self.conn)
            .await?)
    }

    pub async fn find_active_provider_user(
        &self,
        email: &str,
    ) -> Result<Option<(users::Model, Option<providers::Model>)>> {
        Ok(active()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::ProviderUniqueId.is_not_null())
            .find_also_related(Providers)
            .one(&self.conn)
            .await?)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<users::Model> {
        let privates = hash_password(new_user.password).await?;

        let txn = self.conn.begin().await?;
        let now = now_str();

        let user = users::ActiveModel {
            unique_id: Set(Uuid::new_v4().to_string()),
            r#type: Set(new_user.r#type),
            agency_unique_id: Set(new_user.agency_unique_id),
            provider_unique_id: Set(new_user.provider_unique_id),
            fullname: Set(new_user.fullname),
            email: Set(new_user.email.to_lowercase()),
            role: Set(Some(new_user.role)),
            login_timestamp: Set(None),
            privates: Set(privates),
            access: Set(access::GRANTED),
            status: Set(status::ACTIVE),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(user)
    }

    pub async fn update_details(&self, unique_id: &str, fullname: &str, role: &str) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::Fullname, Expr::value(fullname))
            .col_expr(users::Column::Role, Expr::value(role))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_str()))
            .filter(users::Column::UniqueId.eq(unique_id))
            .filter(users::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn update_agency(&self, unique_id: &str, agency_unique_id: &str) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(
                users::Column::AgencyUniqueId,
                Expr::value(agency_unique_id),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now_str()))
            .filter(users::Column::UniqueId.eq(unique_id))
            .filter(users::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn update_provider(&self, unique_id: &str, provider_unique_id: &str) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(
                users::Column::ProviderUniqueId,
                Expr::value(provider_unique_id),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(now_str()))
            .filter(users::Column::UniqueId.eq(unique_id))
            .filter(users::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn update_password(&self, unique_id: &str, password: String) -> Result<u64> {
        let privates = hash_password(password).await?;
        let result = Users::update_many()
            .col_expr(users::Column::Privates, Expr::value(privates))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_str()))
            .filter(users::Column::UniqueId.eq(unique_id))
            .filter(users::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Moves an account to the given access level. Returns zero when the
    /// account is already at that level, so no-op transitions surface.
    pub async fn update_access(&self, unique_id: &str, new_access: i32) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::Access, Expr::value(new_access))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_str()))
            .filter(users::Column::UniqueId.eq(unique_id))
            .filter(users::Column::Access.ne(new_access))
            .filter(users::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn update_login_timestamp(&self, unique_id: &str) -> Result<()> {
        Users::update_many()
            .col_expr(users::Column::LoginTimestamp, Expr::value(now_str()))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_str()))
            .filter(users::Column::UniqueId.eq(unique_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn soft_delete(&self, unique_id: &str) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::Status, Expr::value(status::DELETED))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_str()))
            .filter(users::Column::UniqueId.eq(unique_id))
            .filter(users::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
