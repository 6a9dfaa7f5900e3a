//! PlayStation Network client
//!
//! Handles:
//! - NPSSO → authorization code → token exchange
//! - Token refresh
//! - Trophy, profile and search endpoints

mod client;
mod models;

use async_trait::async_trait;
use thiserror::Error;

pub use client::HttpPsnClient;
pub use models::*;

/// Errors returned by PSN calls
#[derive(Debug, Error)]
pub enum PsnError {
    /// Transport-level failure (DNS, TLS, timeout)
    #[error("PSN request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// PSN answered with an error body
    #[error("PSN returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// The NPSSO token or authorization code was rejected
    #[error("{0}")]
    Authentication(String),

    /// The response body did not match the expected shape
    #[error("Unexpected PSN response: {0}")]
    Decode(String),
}

/// The subset of the PSN API this application consumes
///
/// `account_id` accepts either a numeric account id or `"me"`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PsnApi: Send + Sync {
    /// Exchange an NPSSO cookie value for a one-time authorization code
    async fn exchange_npsso_for_code(&self, npsso: &str) -> Result<String, PsnError>;

    /// Exchange an authorization code for an access/refresh token pair
    async fn exchange_code_for_tokens(&self, code: &str) -> Result<AuthTokens, PsnError>;

    /// Obtain a fresh token pair from a refresh token
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthTokens, PsnError>;

    async fn trophy_summary(
        &self,
        access_token: &str,
        account_id: &str,
    ) -> Result<TrophyProfileSummary, PsnError>;

    /// One page of the account's trophy titles starting at `offset`
    async fn user_titles(
        &self,
        access_token: &str,
        account_id: &str,
        offset: u32,
    ) -> Result<UserTitlesResponse, PsnError>;

    /// Every trophy defined for a title (all groups)
    async fn title_trophies(
        &self,
        access_token: &str,
        np_communication_id: &str,
        service: NpServiceName,
    ) -> Result<TrophiesResponse, PsnError>;

    /// The account's earned state for every trophy of a title (all groups)
    async fn user_earned_trophies(
        &self,
        access_token: &str,
        account_id: &str,
        np_communication_id: &str,
        service: NpServiceName,
    ) -> Result<TrophiesResponse, PsnError>;

    async fn profile(&self, access_token: &str, account_id: &str) -> Result<Profile, PsnError>;

    /// Universal search restricted to the account domain
    async fn search_accounts(
        &self,
        access_token: &str,
        term: &str,
    ) -> Result<UniversalSearchResponse, PsnError>;
}
