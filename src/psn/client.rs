//! reqwest-backed PSN client

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Instant;
use url::Url;

use super::models::*;
use super::{PsnApi, PsnError};

/// OAuth client registered for the PlayStation mobile app
const CLIENT_ID: &str = "09515159-7237-4370-9b40-3806e67c0891";
const REDIRECT_URI: &str = "com.scee.psxandroid.scecompcall://redirect";
const SCOPE: &str = "psn:mobile.v2.core psn:clientapp";
/// base64("{CLIENT_ID}:{client secret}")
const BASIC_AUTHORIZATION: &str =
    "Basic MDk1MTUxNTktNzIzNy00MzcwLTliNDAtMzgwNmU2N2MwODkxOnVjUGprYTV0bnRCMktxc1A=";

const TITLES_PAGE_SIZE: u32 = 800;
const METRIC_SERVICE: &str = "psn";

/// PSN client over HTTP
///
/// The inner `reqwest::Client` must not follow redirects: the authorize
/// endpoint hands back the code in a `Location` header.
pub struct HttpPsnClient {
    http: reqwest::Client,
    auth_base: Url,
    api_base: Url,
}

impl HttpPsnClient {
    pub fn new(http: reqwest::Client, auth_base_url: &str, api_base_url: &str) -> Result<Self, PsnError> {
        let parse = |value: &str| {
            Url::parse(value).map_err(|e| PsnError::Decode(format!("invalid base URL {value}: {e}")))
        };

        Ok(Self {
            http,
            auth_base: parse(auth_base_url)?,
            api_base: parse(api_base_url)?,
        })
    }

    fn auth_url(&self, path: &str) -> Result<Url, PsnError> {
        self.auth_base
            .join(path)
            .map_err(|e| PsnError::Decode(e.to_string()))
    }

    fn api_url(&self, path: &str) -> Result<Url, PsnError> {
        self.api_base
            .join(path)
            .map_err(|e| PsnError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        access_token: &str,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, PsnError> {
        let started = Instant::now();
        let result = self
            .http
            .get(url.clone())
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await;
        observe(&result, started);

        tracing::debug!(path = %url.path(), "PSN request");
        decode(result?).await
    }

    async fn request_tokens(&self, form: &[(&str, &str)]) -> Result<AuthTokens, PsnError> {
        let started = Instant::now();
        let result = self
            .http
            .post(self.auth_url("/api/authz/v3/oauth/token")?)
            .header(reqwest::header::AUTHORIZATION, BASIC_AUTHORIZATION)
            .form(form)
            .send()
            .await;
        observe(&result, started);

        decode(result?).await
    }
}

#[async_trait]
impl PsnApi for HttpPsnClient {
    async fn exchange_npsso_for_code(&self, npsso: &str) -> Result<String, PsnError> {
        let started = Instant::now();
        let result = self
            .http
            .get(self.auth_url("/api/authz/v3/oauth/authorize")?)
            .header(reqwest::header::COOKIE, format!("npsso={npsso}"))
            .query(&[
                ("access_type", "offline"),
                ("client_id", CLIENT_ID),
                ("redirect_uri", REDIRECT_URI),
                ("response_type", "code"),
                ("scope", SCOPE),
            ])
            .send()
            .await;
        observe(&result, started);

        let response = result?;
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        extract_code(location).ok_or_else(|| {
            PsnError::Authentication(
                "There was a problem retrieving your PSN access code. Is your NPSSO code valid?"
                    .to_string(),
            )
        })
    }

    async fn exchange_code_for_tokens(&self, code: &str) -> Result<AuthTokens, PsnError> {
        self.request_tokens(&[
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
            ("token_format", "jwt"),
        ])
        .await
        .map_err(|error| match error {
            PsnError::Api { message, .. } => PsnError::Authentication(message),
            other => other,
        })
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthTokens, PsnError> {
        self.request_tokens(&[
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
            ("token_format", "jwt"),
            ("scope", SCOPE),
        ])
        .await
    }

    async fn trophy_summary(
        &self,
        access_token: &str,
        account_id: &str,
    ) -> Result<TrophyProfileSummary, PsnError> {
        let url = self.api_url(&format!("/api/trophy/v1/users/{account_id}/trophySummary"))?;
        self.get_json(access_token, url, &[]).await
    }

    async fn user_titles(
        &self,
        access_token: &str,
        account_id: &str,
        offset: u32,
    ) -> Result<UserTitlesResponse, PsnError> {
        let url = self.api_url(&format!("/api/trophy/v1/users/{account_id}/trophyTitles"))?;
        let query = [
            ("limit", TITLES_PAGE_SIZE.to_string()),
            ("offset", offset.to_string()),
        ];
        self.get_json(access_token, url, &query).await
    }

    async fn title_trophies(
        &self,
        access_token: &str,
        np_communication_id: &str,
        service: NpServiceName,
    ) -> Result<TrophiesResponse, PsnError> {
        let url = self.api_url(&format!(
            "/api/trophy/v1/npCommunicationIds/{np_communication_id}/trophyGroups/all/trophies"
        ))?;
        let query = [("npServiceName", service.as_str().to_string())];
        self.get_json(access_token, url, &query).await
    }

    async fn user_earned_trophies(
        &self,
        access_token: &str,
        account_id: &str,
        np_communication_id: &str,
        service: NpServiceName,
    ) -> Result<TrophiesResponse, PsnError> {
        let url = self.api_url(&format!(
            "/api/trophy/v1/users/{account_id}/npCommunicationIds/{np_communication_id}/trophyGroups/all/trophies"
        ))?;
        let query = [("npServiceName", service.as_str().to_string())];
        self.get_json(access_token, url, &query).await
    }

    async fn profile(&self, access_token: &str, account_id: &str) -> Result<Profile, PsnError> {
        let url = self.api_url(&format!(
            "/api/userProfile/v1/internal/users/{account_id}/profiles"
        ))?;
        self.get_json(access_token, url, &[]).await
    }

    async fn search_accounts(
        &self,
        access_token: &str,
        term: &str,
    ) -> Result<UniversalSearchResponse, PsnError> {
        let body = serde_json::json!({
            "searchTerm": term,
            "domainRequests": [{ "domain": SEARCH_DOMAIN_ACCOUNTS }],
        });

        let started = Instant::now();
        let result = self
            .http
            .post(self.api_url("/api/search/v1/universalSearch")?)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await;
        observe(&result, started);

        decode(result?).await
    }
}

/// Pull the `code` query parameter out of the authorize redirect
fn extract_code(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}

fn observe(result: &Result<reqwest::Response, reqwest::Error>, started: Instant) {
    let status = match result {
        Ok(response) => response.status().as_u16().to_string(),
        Err(_) => "error".to_string(),
    };
    crate::metrics::observe_upstream(METRIC_SERVICE, &status, started.elapsed());
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PsnError> {
    let status = response.status();
    let body = response.text().await?;

    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => {
            return Err(PsnError::Api {
                status: status.as_u16(),
                code: None,
                message: body,
            });
        }
        Err(e) => return Err(PsnError::Decode(e.to_string())),
    };

    if !status.is_success() || value.get("error").is_some() {
        return Err(api_error(status.as_u16(), value));
    }

    serde_json::from_value(value).map_err(|e| PsnError::Decode(e.to_string()))
}

/// Error bodies come in two shapes:
/// `{"error":{"code":..,"message":..}}` from the API hosts and
/// `{"error":"invalid_grant","error_description":..}` from the token endpoint.
fn api_error(status: u16, value: serde_json::Value) -> PsnError {
    #[derive(Deserialize)]
    struct ErrorBody {
        code: Option<i64>,
        message: Option<String>,
    }

    match value.get("error") {
        Some(serde_json::Value::Object(_)) => {
            let body = value
                .get("error")
                .cloned()
                .and_then(|error| serde_json::from_value::<ErrorBody>(error).ok());
            PsnError::Api {
                status,
                code: body.as_ref().and_then(|b| b.code),
                message: body
                    .and_then(|b| b.message)
                    .unwrap_or_else(|| "Unknown PSN error".to_string()),
            }
        }
        Some(serde_json::Value::String(error)) => PsnError::Api {
            status,
            code: None,
            message: value
                .get("error_description")
                .and_then(|d| d.as_str())
                .unwrap_or(error.as_str())
                .to_string(),
        },
        _ => PsnError::Api {
            status,
            code: None,
            message: format!("HTTP {status}"),
        },
    }
}
