use crate::error::{FigmintError, Result};
use crate::figma::{
    from_json_str, DesignSource, ExportFormat, FileResponse, ImageExportResponse, ImageFillsResponse,
};
#[cfg(test)]
use reqwest::header::HeaderMap;
use reqwest::{header::RETRY_AFTER, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.figma.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variables holding a personal access token, in lookup order.
const TOKEN_VARS: [&str; 2] = ["FIGMA_TOKEN", "FIGMA_API_TOKEN"];
const OAUTH_TOKEN_VAR: &str = "FIGMA_OAUTH_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigmaAuth {
    PersonalAccessToken(String),
    OAuthToken(String),
}

impl FigmaAuth {
    pub fn from_env() -> Option<Self> {
        for var in TOKEN_VARS {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    return Some(Self::PersonalAccessToken(token));
                }
            }
        }

        if let Ok(token) = std::env::var(OAUTH_TOKEN_VAR) {
            if !token.is_empty() {
                return Some(Self::OAuthToken(token));
            }
        }

        None
    }

    /// A configured token wins over the environment.
    pub fn resolve(configured: Option<&str>) -> Result<Self> {
        configured
            .filter(|token| !token.trim().is_empty())
            .map(|token| Self::PersonalAccessToken(token.to_string()))
            .or_else(Self::from_env)
            .ok_or_else(|| {
                FigmintError::Config(
                    "Figma token missing; set FIGMA_TOKEN or FIGMA_OAUTH_TOKEN".to_string(),
                )
            })
    }

    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            FigmaAuth::PersonalAccessToken(token) => builder.header("X-FIGMA-TOKEN", token),
            FigmaAuth::OAuthToken(token) => builder.bearer_auth(token),
        }
    }

    #[cfg(test)]
    fn apply_to_header_map(&self, headers: &mut HeaderMap) {
        match self {
            FigmaAuth::PersonalAccessToken(token) => {
                headers.insert("X-FIGMA-TOKEN", token.parse().unwrap());
            }
            FigmaAuth::OAuthToken(token) => {
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    format!("Bearer {token}").parse().unwrap(),
                );
            }
        }
    }
}

/// Figma REST API client.
#[derive(Debug, Clone)]
pub struct FigmaClient {
    http: Client,
    auth: FigmaAuth,
    base_url: Url,
}

impl FigmaClient {
    pub fn new(auth: FigmaAuth) -> Result<Self> {
        Self::with_base_url_and_timeout(auth, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url_and_timeout(
        auth: FigmaAuth,
        base_url: impl AsRef<str>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FigmintError::Network)?;

        Ok(Self {
            http,
            auth,
            base_url,
        })
    }

    pub async fn fetch_file(&self, file_key: &str) -> Result<FileResponse> {
        validate_file_key(file_key)?;
        let url = self.endpoint(&format!("/v1/files/{file_key}"))?;
        self.send_json(self.authed(self.http.get(url))).await
    }

    pub async fn fetch_image_fills(&self, file_key: &str) -> Result<ImageFillsResponse> {
        validate_file_key(file_key)?;
        let url = self.endpoint(&format!("/v1/files/{file_key}/images"))?;
        let resp: ImageFillsResponse = self.send_json(self.authed(self.http.get(url))).await?;
        if resp.error {
            return Err(FigmintError::figma_api(
                resp.status.and_then(|s| StatusCode::from_u16(s).ok()),
                "image fills request reported an error",
            ));
        }
        Ok(resp)
    }

    pub async fn export_images(
        &self,
        file_key: &str,
        node_ids: &[String],
        format: ExportFormat,
        scale: Option<f64>,
    ) -> Result<ImageExportResponse> {
        validate_file_key(file_key)?;
        validate_node_ids(node_ids)?;
        if let Some(scale) = scale {
            validate_scale(scale)?;
        }

        let mut url = self.endpoint(&format!("/v1/images/{file_key}"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("ids", &node_ids.join(","));
            query.append_pair("format", format.as_str());
            if let Some(scale) = scale {
                query.append_pair("scale", &scale.to_string());
            }
        }

        let resp: ImageExportResponse = self.send_json(self.authed(self.http.get(url))).await?;
        if let Some(err) = resp.err.as_deref().filter(|e| !e.is_empty()) {
            return Err(FigmintError::figma_api(None, err));
        }
        Ok(resp)
    }

    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await.map_err(FigmintError::Network)?;

        let status = response.status();

        if status.is_success() {
            return response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(FigmintError::Network);
        }

        let body = response.text().await.unwrap_or_default();
        Err(FigmintError::figma_api(
            Some(status),
            format!(
                "failed to download image (status {}): {}",
                status.as_u16(),
                body
            ),
        ))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        self.auth.apply(builder)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(FigmintError::InvalidUrl)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(FigmintError::Network)?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "figma response");
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return from_json_str(&body).map_err(FigmintError::Serialization);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(retry_after = retry_after.as_deref().unwrap_or("-"), "rate limited by Figma");
        }
        Err(FigmintError::figma_api(
            Some(status),
            error_message(status, &body, retry_after.as_deref()),
        ))
    }
}

impl DesignSource for FigmaClient {
    async fn fetch_document(&self, file_key: &str) -> Result<FileResponse> {
        self.fetch_file(file_key).await
    }

    async fn fetch_image_fills(&self, file_key: &str) -> Result<HashMap<String, String>> {
        FigmaClient::fetch_image_fills(self, file_key)
            .await
            .map(|resp| resp.meta.images)
    }

    async fn export_urls(
        &self,
        file_key: &str,
        ids: &[String],
        format: ExportFormat,
        scale: Option<f64>,
    ) -> Result<HashMap<String, Option<String>>> {
        self.export_images(file_key, ids, format, scale)
            .await
            .map(|resp| resp.images)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.download_image(url).await
    }
}

fn validate_file_key(file_key: &str) -> Result<()> {
    if file_key.trim().is_empty() {
        return Err(FigmintError::Config("Figma file key is required".into()));
    }
    Ok(())
}

fn validate_node_ids(node_ids: &[String]) -> Result<()> {
    if node_ids.is_empty() {
        return Err(FigmintError::Config(
            "node_ids cannot be empty when exporting Figma images".into(),
        ));
    }
    Ok(())
}

fn validate_scale(scale: f64) -> Result<()> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(FigmintError::Config(
            "scale must be greater than zero for Figma exports".into(),
        ));
    }
    Ok(())
}

fn error_message(status: StatusCode, body: &str, retry_after: Option<&str>) -> String {
    let fallback = format!("Figma API returned status {}", status.as_u16());
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_body = parsed
        .as_ref()
        .and_then(|value| value.get("err").or_else(|| value.get("message")))
        .and_then(Value::as_str)
        .map(str::to_owned);

    match (status, retry_after, from_body) {
        (StatusCode::TOO_MANY_REQUESTS, Some(retry), Some(msg)) => {
            format!("{msg} (rate limited, retry after {retry}s)")
        }
        (StatusCode::TOO_MANY_REQUESTS, Some(retry), None) => {
            format!("rate limited by Figma API, retry after {retry}s")
        }
        (_, _, Some(msg)) => msg,
        _ => fallback,
    }
}
