use super::models::{
    MobileDeviceDetail, MobileDeviceEnvelope, MobileDeviceList, MobileDeviceSummary,
};
use crate::config::JssPrefs;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum JssError {
    #[error("invalid JSS URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unable to set up JSS client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("JSS rejected our credentials ({status}) for {url}")]
    Unauthorized { url: Url, status: StatusCode },
    #[error("JSS responded with {status} for {url}")]
    Status { url: Url, status: StatusCode },
    #[error("request to JSS failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// A client for the JSS Classic API.
#[derive(Clone)]
pub struct JssClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl JssClient {
    /// Creates a client from python-jss style preferences.
    /// No requests are made until devices are asked for.
    pub fn new(prefs: &JssPrefs) -> Result<Self, JssError> {
        // Our endpoints are appended to the base URL,
        // so it must end in a slash to keep any existing path.
        let mut base = prefs.jss_url.trim_end_matches('/').to_owned();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|source| JssError::InvalidUrl {
            url: prefs.jss_url.clone(),
            source,
        })?;

        let client = Client::builder()
            .danger_accept_invalid_certs(!prefs.verify)
            .build()
            .map_err(JssError::Client)?;

        Ok(JssClient {
            client,
            base_url,
            username: prefs.jss_user.clone(),
            password: prefs.jss_pass.clone(),
        })
    }

    /// Lists every mobile device known to the JSS.
    pub async fn list_mobile_devices(&self) -> Result<Vec<MobileDeviceSummary>, JssError> {
        let list: MobileDeviceList = self.get("JSSResource/mobiledevices").await?;
        Ok(list.mobile_devices)
    }

    /// Fetches the full record of a single device.
    pub async fn mobile_device(&self, id: i32) -> Result<MobileDeviceDetail, JssError> {
        let envelope: MobileDeviceEnvelope = self
            .get(&format!("JSSResource/mobiledevices/id/{id}"))
            .await?;
        Ok(envelope.mobile_device)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, JssError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|source| JssError::InvalidUrl {
                url: format!("{}{endpoint}", self.base_url),
                source,
            })?;
        debug!(%url, "requesting from JSS");

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(JssError::Unauthorized { url, status });
        }
        if !status.is_success() {
            return Err(JssError::Status { url, status });
        }

        Ok(response.json().await?)
    }
}
