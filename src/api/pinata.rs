use async_trait::async_trait;
use log::{error, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::PinataConfig;
use crate::error::{Error, Result};
use crate::validation::{decode_data_url, require_field};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub token_logo: String,
    #[serde(default)]
    pub token_name: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mint: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
}

impl UploadRequest {
    /// Checks required fields and returns the decoded logo bytes.
    pub fn validate(&self) -> Result<Vec<u8>> {
        for (name, value) in [
            ("tokenLogo", &self.token_logo),
            ("tokenName", &self.token_name),
            ("tokenSymbol", &self.token_symbol),
            ("mint", &self.mint),
        ] {
            require_field(name, value)?;
        }
        decode_data_url(&self.token_logo)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub image_url: String,
    pub metadata_url: String,
}

/// Off-chain metadata document referenced by the token's on-chain URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    pub platform: String,
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl TokenMetadata {
    pub fn from_request(request: &UploadRequest, image_url: String, platform: &str) -> Self {
        Self {
            name: request.token_name.clone(),
            symbol: request.token_symbol.clone(),
            description: present(&request.description),
            image: image_url,
            website: present(&request.website),
            twitter: present(&request.twitter),
            telegram: present(&request.telegram),
            platform: platform.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// IPFS pinning client.
#[derive(Debug, Clone)]
pub struct PinataClient {
    client: Client,
    config: PinataConfig,
}

impl PinataClient {
    pub fn new(config: PinataConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        if let Some(jwt) = self.config.jwt.as_ref().filter(|j| !j.is_empty()) {
            return Ok(request.bearer_auth(jwt));
        }
        match (&self.config.api_key, &self.config.api_secret) {
            (Some(key), Some(secret)) => Ok(request
                .header("pinata_api_key", key)
                .header("pinata_secret_api_key", secret)),
            _ => Err(Error::ConfigError("Pinata credentials are not configured".to_string())),
        }
    }

    pub fn gateway_url(&self, hash: &str) -> String {
        format!("{}/{}", self.config.gateway_url.trim_end_matches('/'), hash)
    }

    async fn pin(&self, request: RequestBuilder, what: &str) -> Result<String> {
        let response = self.authorize(request)?.send().await?;
        if !response.status().is_success() {
            return Err(Error::UploadError(format!(
                "Failed to upload {} to Pinata: {}",
                what,
                response.status()
            )));
        }
        let pinned: PinResponse = response.json().await?;
        Ok(self.gateway_url(&pinned.ipfs_hash))
    }

    pub async fn pin_file(&self, bytes: Vec<u8>, file_name: &str, mime: &str) -> Result<String> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part("file", part);
        let url = format!("{}/pinning/pinFileToIPFS", self.config.api_url);
        self.pin(self.client.post(url).multipart(form), "file").await
    }

    pub async fn pin_json<T: Serialize>(&self, body: &T) -> Result<String> {
        let url = format!("{}/pinning/pinJSONToIPFS", self.config.api_url);
        self.pin(self.client.post(url).json(body), "JSON").await
    }

    /// Pins the logo, then the metadata document pointing at it.
    pub async fn upload_token_metadata(&self, request: &UploadRequest) -> Result<UploadResponse> {
        let logo = request.validate()?;

        let image_url = self
            .pin_file(logo, &format!("{}-logo.png", request.mint), "image/png")
            .await
            .map_err(|e| {
                error!("Logo upload failed for {}: {}", request.mint, e);
                e
            })?;

        let metadata = TokenMetadata::from_request(request, image_url.clone(), &self.config.platform);
        let metadata_url = self.pin_json(&metadata).await?;
        info!("Pinned metadata for {} at {}", request.mint, metadata_url);

        Ok(UploadResponse {
            success: true,
            image_url,
            metadata_url,
        })
    }
}

#[async_trait]
pub trait MetadataUploader: Send + Sync {
    async fn upload_token_metadata(&self, request: &UploadRequest) -> Result<UploadResponse>;
}

#[async_trait]
impl MetadataUploader for PinataClient {
    async fn upload_token_metadata(&self, request: &UploadRequest) -> Result<UploadResponse> {
        PinataClient::upload_token_metadata(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UploadRequest {
        UploadRequest {
            token_logo: "data:image/png;base64,aGk=".to_string(),
            token_name: "Fairly".to_string(),
            token_symbol: "FAIR".to_string(),
            description: Some(String::new()),
            mint: "Mint1111".to_string(),
            website: Some("https://fairly.best".to_string()),
            twitter: None,
            telegram: None,
        }
    }

    #[test]
    fn test_validate_request() {
        assert_eq!(request().validate().unwrap(), b"hi".to_vec());

        let mut missing = request();
        missing.mint.clear();
        assert!(matches!(missing.validate(), Err(Error::ValidationError(_))));

        let mut bad_logo = request();
        bad_logo.token_logo = "data:image/png;base64".to_string();
        assert!(matches!(bad_logo.validate(), Err(Error::ValidationError(_))));
    }

    #[test]
    fn test_metadata_omits_empty_fields() {
        let metadata = TokenMetadata::from_request(
            &request(),
            "https://ipfs.io/ipfs/Qm1".to_string(),
            "https://fairly.best",
        );
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["image"], "https://ipfs.io/ipfs/Qm1");
        assert_eq!(json["website"], "https://fairly.best");
        assert!(json.get("description").is_none());
        assert!(json.get("twitter").is_none());
        assert_eq!(json["platform"], "https://fairly.best");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let client = PinataClient::new(PinataConfig::default()).unwrap();
        let request = client.client.post("http://localhost/");
        assert!(matches!(client.authorize(request), Err(Error::ConfigError(_))));
        assert_eq!(client.gateway_url("Qm1"), "https://ipfs.io/ipfs/Qm1");
    }
}
