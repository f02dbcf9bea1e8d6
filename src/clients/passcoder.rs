use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Wire envelope returned by every Passcoder data endpoint, success or
/// not. Failures carry the reason in `message`.
#[derive(Debug, Deserialize)]
pub struct PasscoderEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<PasscoderPayload<T>>,
}

#[derive(Debug, Deserialize)]
pub struct PasscoderPayload<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub verification: Option<VerificationMeta>,
    #[serde(default)]
    pub endpoint_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationMeta {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// National Identification Number record as Passcoder returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NinData {
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telephoneno: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
    #[serde(default, rename = "residence_AdressLine1")]
    pub residence_address_line_1: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub birthcountry: Option<String>,
    #[serde(default)]
    pub self_origin_state: Option<String>,
    #[serde(default)]
    pub residence_state: Option<String>,
    #[serde(default)]
    pub nin: Option<String>,
    #[serde(default)]
    pub vnin: Option<String>,
    #[serde(default)]
    pub self_origin_lga: Option<String>,
    #[serde(default)]
    pub residence_lga: Option<String>,
    #[serde(default)]
    pub maritalstatus: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub heigth: Option<String>,
    #[serde(default)]
    pub educationallevel: Option<String>,
    #[serde(default)]
    pub emplymentstatus: Option<String>,
    #[serde(default)]
    pub nok_firstname: Option<String>,
    #[serde(default)]
    pub nok_middlename: Option<String>,
    #[serde(default)]
    pub nok_surname: Option<String>,
    #[serde(default)]
    pub nok_state: Option<String>,
    #[serde(default)]
    pub nok_lga: Option<String>,
    #[serde(default)]
    pub nok_town: Option<String>,
    #[serde(default)]
    pub nok_postalcode: Option<String>,
    #[serde(default)]
    pub nok_address1: Option<String>,
    #[serde(default)]
    pub nok_address2: Option<String>,
    #[serde(default)]
    pub nspokenlang: Option<String>,
    #[serde(default)]
    pub ospokenlang: Option<String>,
    #[serde(default)]
    pub profession: Option<String>,
}

/// Bank Verification Number record as Passcoder returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BvnData {
    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, rename = "middleName")]
    pub middle_name: Option<String>,
    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "phoneNumber1")]
    pub phone_number_1: Option<String>,
    #[serde(default, rename = "phoneNumber2")]
    pub phone_number_2: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, rename = "dateOfbirth")]
    pub date_of_birth: Option<String>,
    #[serde(default, rename = "residentialAddress")]
    pub residential_address: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default, rename = "stateOfOrigin")]
    pub state_of_origin: Option<String>,
    #[serde(default, rename = "stateOfResidence")]
    pub state_of_residence: Option<String>,
    #[serde(default)]
    pub nin: Option<String>,
    #[serde(default)]
    pub bvn: Option<String>,
    #[serde(default)]
    pub vnin: Option<String>,
    #[serde(default, rename = "enrollmentBank")]
    pub enrollment_bank: Option<String>,
    #[serde(default, rename = "enrollmentBranch")]
    pub enrollment_branch: Option<String>,
    #[serde(default, rename = "levelOfAccount")]
    pub level_of_account: Option<String>,
    #[serde(default, rename = "lgaOfOrigin")]
    pub lga_of_origin: Option<String>,
    #[serde(default, rename = "lgaOfResidence")]
    pub lga_of_residence: Option<String>,
    #[serde(default, rename = "maritalStatus")]
    pub marital_status: Option<String>,
    #[serde(default, rename = "nameOnCard")]
    pub name_on_card: Option<String>,
    #[serde(default, rename = "registrationDate")]
    pub registration_date: Option<String>,
    #[serde(default, rename = "watchListed")]
    pub watch_listed: Option<String>,
    #[serde(default, rename = "base64Image")]
    pub base_64_image: Option<String>,
}

#[derive(Clone)]
pub struct PasscoderClient {
    client: Client,
    base_url: String,
}

impl PasscoderClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Ninvs/1.0")
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn verify_nin(
        &self,
        api_key: &str,
        nin: &str,
    ) -> Result<PasscoderEnvelope<NinData>> {
        self.post("nin", api_key, json!({ "nin": nin })).await
    }

    pub async fn verify_bvn(
        &self,
        api_key: &str,
        bvn: &str,
    ) -> Result<PasscoderEnvelope<BvnData>> {
        self.post("bvn", api_key, json!({ "bvn": bvn })).await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        api_key: &str,
        body: serde_json::Value,
    ) -> Result<PasscoderEnvelope<T>> {
        let url = format!("{}/extended/data/verification/{endpoint}", self.base_url);
        debug!("Passcoder lookup via {url}");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("Passcoder request failed")?;

        // Rejections come back as the same envelope with success=false,
        // so the status code is not consulted here.
        response
            .json::<PasscoderEnvelope<T>>()
            .await
            .context("Passcoder returned an unreadable response")
    }
}
