//! REST client for the profile generation endpoint.

use async_trait::async_trait;
use paddock_core::profile::{GeneratedProfile, ProfileGenError, ProfileGenerator, ProfileRequest};
use serde::Deserialize;

use crate::config::ProfileGenConfig;

/// HTTP client for the profile generation service.
pub struct ProfileGenApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Errors from the profile service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ProfileGenApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Profile API error ({status}): {body}")]
    ApiError {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl From<ProfileGenApiError> for ProfileGenError {
    fn from(err: ProfileGenApiError) -> Self {
        match err {
            ProfileGenApiError::Request(e) if e.is_decode() => Self::InvalidResponse(e.to_string()),
            ProfileGenApiError::Request(e) => Self::Request(e.to_string()),
            ProfileGenApiError::ApiError { status, body } => Self::Rejected { status, body },
        }
    }
}

/// The service answers either with the profile itself or wrapped in a
/// `profile` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileResponse {
    Wrapped { profile: GeneratedProfile },
    Bare(GeneratedProfile),
}

impl ProfileResponse {
    fn into_profile(self) -> GeneratedProfile {
        match self {
            Self::Wrapped { profile } | Self::Bare(profile) => profile,
        }
    }
}

impl ProfileGenApi {
    /// Build a client with the configured timeout.
    pub fn new(config: &ProfileGenConfig) -> Result<Self, ProfileGenApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ProfileGenConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Request a drafted profile.
    ///
    /// Sends `POST /generate-horse-profile` with the request as JSON.
    pub async fn generate_profile(
        &self,
        request: &ProfileRequest,
    ) -> Result<GeneratedProfile, ProfileGenApiError> {
        let mut builder = self
            .client
            .post(format!("{}/generate-horse-profile", self.base_url))
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = Self::ensure_success(builder.send().await?).await?;
        let parsed: ProfileResponse = response.json().await?;
        Ok(parsed.into_profile())
    }

    /// Return the response unchanged on success, or an
    /// [`ProfileGenApiError::ApiError`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProfileGenApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProfileGenApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ProfileGenerator for ProfileGenApi {
    async fn generate(&self, request: &ProfileRequest) -> Result<GeneratedProfile, ProfileGenError> {
        tracing::debug!(
            horse_name = ?request.horse_name,
            answers = request.answers.len(),
            "Requesting generated profile"
        );
        self.generate_profile(request).await.map_err(|e| {
            tracing::warn!(error = %e, "Profile generation request failed");
            ProfileGenError::from(e)
        })
    }
}
