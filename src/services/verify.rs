use crate::clients::passcoder::{BvnData, NinData, PasscoderClient, VerificationMeta};
use crate::constants::{app_defaults, now_str, status};
use crate::db::Store;
use crate::entities::verifications;
use sea_orm::Set;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Identity lookup request after validation. The agency and provider
/// are the parties the lookup is billed to, when given.
#[derive(Clone, Debug)]
pub struct LookupRequest {
    pub r#type: String,
    pub identification_id: String,
    pub agency_unique_id: Option<String>,
    pub provider_unique_id: Option<String>,
}

pub enum LookupOutcome {
    /// A prior record for the same document satisfied the lookup.
    Cached(verifications::Model),
    /// The upstream provider was consulted and a record was stored.
    Created(verifications::Model),
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("App Default for Verification not found!")]
    MissingApiKey,
    #[error("{0}")]
    Provider(String),
    #[error("No data found")]
    NoData,
    #[error("Verification unavailable!")]
    Unsupported,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct VerificationService {
    store: Store,
    client: PasscoderClient,
}

impl VerificationService {
    pub fn new(store: Store, client: PasscoderClient) -> Self {
        Self { store, client }
    }

    pub async fn lookup(&self, request: LookupRequest) -> Result<LookupOutcome, LookupError> {
        let cached = self
            .store
            .get_cached_verification(
                &request.r#type,
                &request.identification_id,
                request.agency_unique_id.as_deref(),
                request.provider_unique_id.as_deref(),
            )
            .await?;

        if let Some(record) = cached {
            // A cache hit credits the parties on the stored record, not
            // the ones on the request.
            self.credit(
                record.agency_unique_id.as_deref(),
                record.provider_unique_id.as_deref(),
            )
            .await?;
            return Ok(LookupOutcome::Cached(record));
        }

        let model = match request.r#type.as_str() {
            "NIN" => self.fetch_nin(&request).await?,
            "BVN" => self.fetch_bvn(&request).await?,
            other => {
                warn!("Unsupported verification type requested: {other}");
                return Err(LookupError::Unsupported);
            }
        };

        self.credit(
            request.agency_unique_id.as_deref(),
            request.provider_unique_id.as_deref(),
        )
        .await?;

        let record = self.store.add_verification(model).await?;
        Ok(LookupOutcome::Created(record))
    }

    async fn api_key(&self) -> Result<String, LookupError> {
        let row = self
            .store
            .get_app_default(app_defaults::PASSCODER_LIVE_KEY)
            .await?;
        row.and_then(|d| d.value).ok_or(LookupError::MissingApiKey)
    }

    async fn fetch_nin(
        &self,
        request: &LookupRequest,
    ) -> Result<verifications::ActiveModel, LookupError> {
        let api_key = self.api_key().await?;
        let envelope = self
            .client
            .verify_nin(&api_key, &request.identification_id)
            .await
            .map_err(|err| LookupError::Provider(err.to_string()))?;

        if !envelope.success {
            return Err(LookupError::Provider(
                envelope
                    .message
                    .unwrap_or_else(|| "Verification failed".to_string()),
            ));
        }
        let payload = envelope.data.ok_or(LookupError::NoData)?;
        let data = payload.data.clone().ok_or(LookupError::NoData)?;

        Ok(map_nin(
            request,
            data,
            payload.verification,
            payload.endpoint_name,
        ))
    }

    async fn fetch_bvn(
        &self,
        request: &LookupRequest,
    ) -> Result<verifications::ActiveModel, LookupError> {
        let api_key = self.api_key().await?;
        let envelope = self
            .client
            .verify_bvn(&api_key, &request.identification_id)
            .await
            .map_err(|err| LookupError::Provider(err.to_string()))?;

        if !envelope.success {
            return Err(LookupError::Provider(
                envelope
                    .message
                    .unwrap_or_else(|| "Verification failed".to_string()),
            ));
        }
        let payload = envelope.data.ok_or(LookupError::NoData)?;
        let data = payload.data.clone().ok_or(LookupError::NoData)?;

        Ok(map_bvn(
            request,
            data,
            payload.verification,
            payload.endpoint_name,
        ))
    }

    async fn credit(
        &self,
        agency_unique_id: Option<&str>,
        provider_unique_id: Option<&str>,
    ) -> Result<(), LookupError> {
        if let Some(agency) = agency_unique_id {
            self.store.record_agency_sync(agency).await?;
        }
        if let Some(provider) = provider_unique_id {
            self.store.record_provider_usage(provider).await?;
        }
        Ok(())
    }
}

/// Treats an absent or empty upstream field as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn non_empty_lower(value: Option<String>) -> Option<String> {
    non_empty(value).map(|v| v.to_lowercase())
}

fn base_model(request: &LookupRequest) -> verifications::ActiveModel {
    let now = now_str();
    verifications::ActiveModel {
        unique_id: Set(Uuid::new_v4().to_string()),
        r#type: Set(request.r#type.clone()),
        agency_unique_id: Set(request.agency_unique_id.clone()),
        provider_unique_id: Set(None),
        identification_id: Set(Some(request.identification_id.clone())),
        status: Set(status::ACTIVE),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
}

fn set_meta(
    model: &mut verifications::ActiveModel,
    meta: Option<VerificationMeta>,
    endpoint_name: Option<String>,
) {
    let meta = meta.unwrap_or(VerificationMeta {
        reference: None,
        status: None,
    });
    model.verification_reference = Set(non_empty(meta.reference));
    model.verification_status = Set(non_empty(meta.status));
    model.verification_endpoint = Set(non_empty(endpoint_name));
}

fn map_nin(
    request: &LookupRequest,
    data: NinData,
    meta: Option<VerificationMeta>,
    endpoint_name: Option<String>,
) -> verifications::ActiveModel {
    let mut model = base_model(request);

    model.firstname = Set(non_empty(data.firstname));
    model.middlename = Set(None);
    model.lastname = Set(non_empty(data.surname));
    model.email = Set(non_empty_lower(data.email));
    model.phone_number = Set(non_empty(data.telephoneno));
    model.alt_phone_number = Set(None);
    model.gender = Set(non_empty(data.gender));
    model.date_of_birth = Set(non_empty(data.birthdate));
    model.address = Set(non_empty(data.residence_address_line_1));
    model.title = Set(non_empty(data.title));
    model.religion = Set(non_empty(data.religion));
    model.nationality = Set(non_empty(data.birthcountry));
    model.state_of_origin = Set(non_empty(data.self_origin_state));
    model.state_of_residence = Set(non_empty(data.residence_state));
    model.nin = Set(non_empty(data.nin));
    model.bvn = Set(None);
    model.vnin = Set(non_empty(data.vnin));
    model.lga_of_origin = Set(non_empty(data.self_origin_lga));
    model.lga_of_residence = Set(non_empty(data.residence_lga));
    model.marital_status = Set(non_empty(data.maritalstatus));
    model.photo = Set(non_empty(data.photo));
    model.height = Set(non_empty(data.heigth));
    model.educational_level = Set(non_empty(data.educationallevel));
    model.employment_status = Set(non_empty(data.emplymentstatus));
    model.nok_firstname = Set(non_empty(data.nok_firstname));
    model.nok_middlename = Set(non_empty(data.nok_middlename));
    model.nok_surname = Set(non_empty(data.nok_surname));
    model.nok_state = Set(non_empty(data.nok_state));
    model.nok_lga = Set(non_empty(data.nok_lga));
    model.nok_town = Set(non_empty(data.nok_town));
    model.nok_postalcode = Set(non_empty(data.nok_postalcode));
    model.nok_address_1 = Set(non_empty(data.nok_address1));
    model.nok_address_2 = Set(non_empty(data.nok_address2));
    model.native_spoken_lang = Set(non_empty(data.nspokenlang));
    model.other_spoken_lang = Set(non_empty(data.ospokenlang));
    model.profession = Set(non_empty(data.profession));

    set_meta(&mut model, meta, endpoint_name);
    model
}

fn map_bvn(
    request: &LookupRequest,
    data: BvnData,
    meta: Option<VerificationMeta>,
    endpoint_name: Option<String>,
) -> verifications::ActiveModel {
    let mut model = base_model(request);

    model.firstname = Set(non_empty(data.first_name));
    model.middlename = Set(non_empty(data.middle_name));
    model.lastname = Set(non_empty(data.last_name));
    model.email = Set(non_empty_lower(data.email));
    model.phone_number = Set(non_empty(data.phone_number_1));
    model.alt_phone_number = Set(non_empty(data.phone_number_2));
    model.gender = Set(non_empty(data.gender));
    model.date_of_birth = Set(non_empty(data.date_of_birth));
    model.address = Set(non_empty(data.residential_address));
    model.title = Set(non_empty(data.title));
    model.nationality = Set(non_empty(data.nationality));
    model.state_of_origin = Set(non_empty(data.state_of_origin));
    model.state_of_residence = Set(non_empty(data.state_of_residence));
    model.nin = Set(non_empty(data.nin));
    model.bvn = Set(non_empty(data.bvn));
    model.vnin = Set(non_empty(data.vnin));
    model.enrollment_bank = Set(non_empty(data.enrollment_bank));
    model.enrollment_branch = Set(non_empty(data.enrollment_branch));
    model.level_of_account = Set(non_empty(data.level_of_account));
    model.lga_of_origin = Set(non_empty(data.lga_of_origin));
    model.lga_of_residence = Set(non_empty(data.lga_of_residence));
    model.marital_status = Set(non_empty(data.marital_status));
    model.name_on_card = Set(non_empty(data.name_on_card));
    model.registration_date = Set(non_empty(data.registration_date));
    model.watch_listed = Set(non_empty(data.watch_listed));
    model.base_64_image = Set(non_empty(data.base_64_image));

    set_meta(&mut model, meta, endpoint_name);
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;

    fn request() -> LookupRequest {
        LookupRequest {
            r#type: "NIN".to_string(),
            identification_id: "12345678901".to_string(),
            agency_unique_id: Some("agency-1".to_string()),
            provider_unique_id: Some("provider-1".to_string()),
        }
    }

    fn set_value(value: &ActiveValue<Option<String>>) -> Option<String> {
        match value {
            ActiveValue::Set(v) => v.clone(),
            _ => panic!("field was not set"),
        }
    }

    #[test]
    fn test_non_empty_drops_empty_strings() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_nin_mapping_renames_and_lowercases() {
        let data = NinData {
            firstname: Some("Ada".to_string()),
            surname: Some("Obi".to_string()),
            email: Some("Ada.OBI@Example.COM".to_string()),
            telephoneno: Some("08030000000".to_string()),
            birthcountry: Some("Nigeria".to_string()),
            heigth: Some("170".to_string()),
            ..NinData::default()
        };

        let model = map_nin(&request(), data, None, Some("verify_nin".to_string()));

        assert_eq!(set_value(&model.lastname), Some("Obi".to_string()));
        assert_eq!(
            set_value(&model.email),
            Some("ada.obi@example.com".to_string())
        );
        assert_eq!(
            set_value(&model.phone_number),
            Some("08030000000".to_string())
        );
        assert_eq!(set_value(&model.nationality), Some("Nigeria".to_string()));
        assert_eq!(set_value(&model.height), Some("170".to_string()));
        assert_eq!(
            set_value(&model.verification_endpoint),
            Some("verify_nin".to_string())
        );
    }

    #[test]
    fn test_nin_mapping_forces_unmapped_fields_null() {
        let data = NinData {
            firstname: Some("Ada".to_string()),
            ..NinData::default()
        };
        let model = map_nin(&request(), data, None, None);

        assert_eq!(set_value(&model.middlename), None);
        assert_eq!(set_value(&model.alt_phone_number), None);
        assert_eq!(set_value(&model.bvn), None);
    }

    #[test]
    fn test_nin_mapping_empty_string_becomes_null() {
        let data = NinData {
            firstname: Some(String::new()),
            ..NinData::default()
        };
        let model = map_nin(&request(), data, None, None);
        assert_eq!(set_value(&model.firstname), None);
    }

    #[test]
    fn test_mapping_never_stores_provider_attribution() {
        let model = map_nin(&request(), NinData::default(), None, None);
        match &model.provider_unique_id {
            ActiveValue::Set(v) => assert_eq!(v, &None),
            _ => panic!("provider_unique_id was not set"),
        }
        match &model.agency_unique_id {
            ActiveValue::Set(v) => assert_eq!(v.as_deref(), Some("agency-1")),
            _ => panic!("agency_unique_id was not set"),
        }
    }

    #[test]
    fn test_bvn_mapping_camel_case_fields() {
        let data = BvnData {
            first_name: Some("Chinedu".to_string()),
            phone_number_2: Some("08120000000".to_string()),
            level_of_account: Some("Tier 3".to_string()),
            watch_listed: Some("NO".to_string()),
            ..BvnData::default()
        };
        let mut req = request();
        req.r#type = "BVN".to_string();

        let model = map_bvn(&req, data, None, None);

        assert_eq!(set_value(&model.firstname), Some("Chinedu".to_string()));
        assert_eq!(
            set_value(&model.alt_phone_number),
            Some("08120000000".to_string())
        );
        assert_eq!(
            set_value(&model.level_of_account),
            Some("Tier 3".to_string())
        );
        assert_eq!(set_value(&model.watch_listed), Some("NO".to_string()));
    }
}
