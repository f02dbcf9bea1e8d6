use crate::constants::status;
use crate::entities::{agencies, prelude::*, providers, verifications};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
};

use super::Ordering;

/// Optional narrowing applied to record listings. Agency and provider
/// staff only ever see rows attributed to them.
#[derive(Clone, Copy, Default)]
pub struct VerificationScope<'a> {
    pub agency_unique_id: Option<&'a str>,
    pub provider_unique_id: Option<&'a str>,
    pub r#type: Option<&'a str>,
}

pub struct VerificationRepository {
    conn: DatabaseConnection,
}

fn order_column(name: &str) -> verifications::Column {
    match name {
        "type" => verifications::Column::Type,
        "lastname" => verifications::Column::Lastname,
        "identification_id" => verifications::Column::IdentificationId,
        "updatedAt" => verifications::Column::UpdatedAt,
        _ => verifications::Column::CreatedAt,
    }
}

fn visible() -> sea_orm::Select<Verifications> {
    Verifications::find().filter(verifications::Column::Status.ne(status::DELETED))
}

fn scoped(scope: VerificationScope<'_>) -> sea_orm::Select<Verifications> {
    let mut query = visible();
    if let Some(agency) = scope.agency_unique_id {
        query = query.filter(verifications::Column::AgencyUniqueId.eq(agency));
    }
    if let Some(provider) = scope.provider_unique_id {
        query = query.filter(verifications::Column::ProviderUniqueId.eq(provider));
    }
    if let Some(record_type) = scope.r#type {
        query = query.filter(verifications::Column::Type.eq(record_type));
    }
    query
}

fn search_condition(search: &str) -> Condition {
    Condition::any()
        .add(verifications::Column::IdentificationId.contains(search))
        .add(verifications::Column::Type.contains(search))
        .add(verifications::Column::Email.contains(search))
        .add(verifications::Column::PhoneNumber.contains(search))
        .add(verifications::Column::AltPhoneNumber.contains(search))
}

impl VerificationRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&self, scope: VerificationScope<'_>) -> Result<u64> {
        Ok(scoped(scope).count(&self.conn).await?)
    }

    pub async fn count_created_between(&self, from: &str, to: &str) -> Result<u64> {
        Ok(visible()
            .filter(verifications::Column::CreatedAt.gte(from))
            .filter(verifications::Column::CreatedAt.lte(to))
            .count(&self.conn)
            .await?)
    }

    pub async fn list(
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
        let col = order_column(&ordering.order_by);
        let query = if ordering.descending {
            scoped(scope).order_by_desc(col)
        } else {
            scoped(scope).order_by_asc(col)
        };
        let rows = query
            .find_also_related(Agencies)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;
        self.attach_providers(rows).await
    }

    pub async fn count_matching(
        &self,
        scope: VerificationScope<'_>,
        search: &str,
    ) -> Result<u64> {
        Ok(scoped(scope)
            .filter(search_condition(search))
            .count(&self.conn)
            .await?)
    }

    pub async fn search(
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
        let rows = scoped(scope)
            .filter(search_condition(search))
            .order_by_desc(verifications::Column::CreatedAt)
            .find_also_related(Agencies)
            .offset(offset)
            .limit(limit)
            .all(&self.conn)
            .await?;
        self.attach_providers(rows).await
    }

    async fn attach_providers(
        &self,
        rows: Vec<(verifications::Model, Option<agencies::Model>)>,
    ) -> Result<
        Vec<(
            verifications::Model,
            Option<agencies::Model>,
            Option<providers::Model>,
        )>,
    > {
        let mut out = Vec::with_capacity(rows.len());
        for (record, agency) in rows {
            let provider = match &record.provider_unique_id {
                Some(provider_id) => {
                    Providers::find()
                        .filter(providers::Column::UniqueId.eq(provider_id))
                        .one(&self.conn)
                        .await?
                }
                None => None,
            };
            out.push((record, agency, provider));
        }
        Ok(out)
    }

    pub async fn find_one(
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
        let row = scoped(scope)
            .filter(verifications::Column::UniqueId.eq(unique_id))
            .find_also_related(Agencies)
            .one(&self.conn)
            .await?;
        match row {
            Some(pair) => Ok(self.attach_providers(vec![pair]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = Verifications::find()
            .filter(verifications::Column::Email.eq(email))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn phone_number_exists(&self, phone_number: &str) -> Result<bool> {
        let count = Verifications::find()
            .filter(verifications::Column::PhoneNumber.eq(phone_number))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Cache probe for a prior lookup of the same document. Deliberately
    /// has no status filter so a removed row still short-circuits a
    /// repeat upstream call when it survives as data.
    pub async fn find_cached(
        &self,
        record_type: &str,
        identification_id: &str,
        agency_unique_id: Option<&str>,
        provider_unique_id: Option<&str>,
    ) -> Result<Option<verifications::Model>> {
        let mut query = Verifications::find()
            .filter(verifications::Column::Type.eq(record_type))
            .filter(verifications::Column::IdentificationId.eq(identification_id));
        if let Some(agency) = agency_unique_id {
            query = query.filter(verifications::Column::AgencyUniqueId.eq(agency));
        }
        if let Some(provider) = provider_unique_id {
            query = query.filter(verifications::Column::ProviderUniqueId.eq(provider));
        }
        Ok(query.one(&self.conn).await?)
    }

    pub async fn create(
        &self,
        model: verifications::ActiveModel,
    ) -> Result<verifications::Model> {
        let txn = self.conn.begin().await?;
        let record = model.insert(&txn).await?;
        txn.commit().await?;
        Ok(record)
    }

    pub async fn soft_delete(&self, unique_id: &str) -> Result<u64> {
        use sea_orm::sea_query::Expr;

        let result = Verifications::update_many()
            .col_expr(verifications::Column::Status, Expr::value(status::DELETED))
            .col_expr(
                verifications::Column::UpdatedAt,
                Expr::value(crate::constants::now_str()),
            )
            .filter(verifications::Column::UniqueId.eq(unique_id))
            .filter(verifications::Column::Status.eq(status::ACTIVE))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_by_type(
        &self,
        scope: VerificationScope<'_>,
        range: Option<(&str, &str)>,
    ) -> Result<Vec<(String, i64)>> {
        let mut query = scoped(scope)
            .select_only()
            .column(verifications::Column::Type)
            .column_as(verifications::Column::Id.count(), "total_count")
            .group_by(verifications::Column::Type);
        if let Some((from, to)) = range {
            query = query
                .filter(verifications::Column::CreatedAt.gte(from))
                .filter(verifications::Column::CreatedAt.lte(to));
        }
        Ok(query.into_tuple().all(&self.conn).await?)
    }

    pub async fn count_by_agency(
        &self,
        agency_unique_id: Option<&str>,
        range: Option<(&str, &str)>,
    ) -> Result<Vec<(String, i64)>> {
        let mut query = visible()
            .join(JoinType::InnerJoin, verifications::Relation::Agency.def())
            .select_only()
            .column_as(agencies::Column::Name, "name")
            .column_as(verifications::Column::AgencyUniqueId.count(), "total_count")
            .group_by(agencies::Column::Name);
        if let Some(agency) = agency_unique_id {
            query = query.filter(verifications::Column::AgencyUniqueId.eq(agency));
        }
        if let Some((from, to)) = range {
            query = query
                .filter(verifications::Column::CreatedAt.gte(from))
                .filter(verifications::Column::CreatedAt.lte(to));
        }
        Ok(query.into_tuple().all(&self.conn).await?)
    }

    pub async fn count_by_provider(
        &self,
        provider_unique_id: Option<&str>,
        range: Option<(&str, &str)>,
    ) -> Result<Vec<(String, i64)>> {
        let mut query = visible()
            .join(JoinType::InnerJoin, verifications::Relation::Provider.def())
            .select_only()
            .column_as(providers::Column::Name, "name")
            .column_as(
                verifications::Column::ProviderUniqueId.count(),
                "total_count",
            )
            .group_by(providers::Column::Name);
        if let Some(provider) = provider_unique_id {
            query = query.filter(verifications::Column::ProviderUniqueId.eq(provider));
        }
        if let Some((from, to)) = range {
            query = query
                .filter(verifications::Column::CreatedAt.gte(from))
                .filter(verifications::Column::CreatedAt.lte(to));
        }
        Ok(query.into_tuple().all(&self.conn).await?)
    }
}
