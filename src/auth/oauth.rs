//! Third-party OAuth login
//!
//! One authorization-code flow, parameterized per provider: redirect,
//! code-for-token exchange, profile fetch, account linking, local
//! token issuance. GitHub is the enabled provider; Microsoft and
//! Google share the same shape and only differ in endpoint URLs and
//! profile field names.
//!
//! The redirect carries no `state` parameter and no PKCE challenge;
//! callers terminate the flow at `/auth/{provider}/callback` with the
//! bare authorization code. Outbound provider calls use the shared
//! HTTP client's timeout and are never retried.

use std::collections::HashMap;

use serde::Deserialize;

use crate::auth::token::TokenService;
use crate::config::{OauthConfig, ProviderConfig};
use crate::data::{NewUser, User, UserStore};
use crate::error::{AppError, OAuthError};
use crate::metrics::TOKENS_ISSUED_TOTAL;

/// Supported identity providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OauthProvider {
    GitHub,
    Microsoft,
    Google,
}

impl OauthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Microsoft => "microsoft",
            Self::Google => "google",
        }
    }

    /// Parse a provider name from a URL path segment.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "github" => Some(Self::GitHub),
            "microsoft" => Some(Self::Microsoft),
            "google" => Some(Self::Google),
            _ => None,
        }
    }

    fn default_endpoints(&self) -> ProviderEndpoints {
        match self {
            Self::GitHub => ProviderEndpoints {
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: "https://github.com/login/oauth/access_token".to_string(),
                profile_url: "https://api.github.com/user".to_string(),
            },
            Self::Microsoft => ProviderEndpoints {
                authorize_url:
                    "https://login.microsoftonline.com/common/oauth2/v2.0/authorize".to_string(),
                token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token"
                    .to_string(),
                profile_url: "https://graph.microsoft.com/v1.0/me".to_string(),
            },
            Self::Google => ProviderEndpoints {
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                profile_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            },
        }
    }

    /// Profile response field names for this provider.
    fn profile_fields(&self) -> ProfileFields {
        match self {
            Self::GitHub => ProfileFields {
                id: "id",
                username: "login",
                email: "email",
            },
            Self::Microsoft => ProfileFields {
                id: "id",
                username: "userPrincipalName",
                email: "mail",
            },
            Self::Google => ProfileFields {
                id: "id",
                username: "name",
                email: "email",
            },
        }
    }
}

/// Provider endpoint URLs
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
}

/// Field mapping for the provider's profile response
#[derive(Debug, Clone, Copy)]
struct ProfileFields {
    id: &'static str,
    username: &'static str,
    email: &'static str,
}

/// Everything needed to drive one provider's exchange
struct ProviderSettings {
    client_id: String,
    client_secret: String,
    endpoints: ProviderEndpoints,
    fields: ProfileFields,
}

/// Normalized provider profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub external_id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: Option<String>,
}

fn apply_overrides(mut endpoints: ProviderEndpoints, config: &ProviderConfig) -> ProviderEndpoints {
    if let Some(url) = &config.authorize_url {
        endpoints.authorize_url = url.clone();
    }
    if let Some(url) = &config.token_url {
        endpoints.token_url = url.clone();
    }
    if let Some(url) = &config.profile_url {
        endpoints.profile_url = url.clone();
    }
    endpoints
}

fn parse_profile(
    fields: ProfileFields,
    body: &serde_json::Value,
) -> Result<ProviderProfile, OAuthError> {
    let external_id = match &body[fields.id] {
        serde_json::Value::Number(id) => id.to_string(),
        serde_json::Value::String(id) if !id.is_empty() => id.clone(),
        _ => {
            return Err(OAuthError::ProfileInvalid(format!(
                "missing {} field",
                fields.id
            )));
        }
    };

    let username = body[fields.username]
        .as_str()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| OAuthError::ProfileInvalid(format!("missing {} field", fields.username)))?
        .to_string();

    let email = body[fields.email]
        .as_str()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| OAuthError::ProfileInvalid(format!("missing {} field", fields.email)))?
        .to_string();

    Ok(ProviderProfile {
        external_id,
        username,
        email,
    })
}

/// Drives the authorization-code exchange for all enabled providers.
pub struct OauthService {
    http: reqwest::Client,
    providers: HashMap<OauthProvider, ProviderSettings>,
}

impl OauthService {
    /// Build the service from startup configuration.
    ///
    /// Disabled providers are simply absent; requests naming them are
    /// rejected with a not-found error.
    pub fn from_config(config: &OauthConfig, http: reqwest::Client) -> Self {
        let mut providers = HashMap::new();

        for (provider, section) in [
            (OauthProvider::GitHub, &config.github),
            (OauthProvider::Microsoft, &config.microsoft),
            (OauthProvider::Google, &config.google),
        ] {
            if !section.enabled {
                continue;
            }
            providers.insert(
                provider,
                ProviderSettings {
                    client_id: section.client_id.clone(),
                    client_secret: section.client_secret.clone(),
                    endpoints: apply_overrides(provider.default_endpoints(), section),
                    fields: provider.profile_fields(),
                },
            );
        }

        Self { http, providers }
    }

    fn settings(&self, provider: OauthProvider) -> Result<&ProviderSettings, AppError> {
        self.providers.get(&provider).ok_or(AppError::NotFound)
    }

    /// Whether this provider is enabled.
    pub fn is_enabled(&self, provider: OauthProvider) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Build the provider authorization URL to redirect the caller to.
    pub fn authorize_redirect_url(&self, provider: OauthProvider) -> Result<String, AppError> {
        let settings = self.settings(provider)?;

        let mut url = url::Url::parse(&settings.endpoints.authorize_url)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid authorize URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &settings.client_id);

        Ok(url.into())
    }

    /// Exchange an authorization code for the provider's access token.
    async fn exchange_code(
        &self,
        settings: &ProviderSettings,
        code: &str,
    ) -> Result<String, AppError> {
        let response = self
            .http
            .post(&settings.endpoints.token_url)
            .header("Accept", "application/json")
            .query(&[
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        let body: TokenExchangeResponse = response.json().await?;

        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or(AppError::OAuth(OAuthError::TokenExchangeFailed))
    }

    /// Fetch the provider profile with the obtained access token.
    async fn fetch_profile(
        &self,
        settings: &ProviderSettings,
        access_token: &str,
    ) -> Result<ProviderProfile, AppError> {
        let body: serde_json::Value = self
            .http
            .get(&settings.endpoints.profile_url)
            .header("Accept", "application/json")
            .bearer_auth(access_token)
            .send()
            .await?
            .json()
            .await?;

        parse_profile(settings.fields, &body).map_err(AppError::OAuth)
    }

    /// Run the full callback flow: exchange, profile fetch, account
    /// resolution, local token issuance.
    ///
    /// A previously unseen external id creates exactly one local user
    /// with no password hash; later callbacks with the same id reuse
    /// that record.
    pub async fn login(
        &self,
        provider: OauthProvider,
        code: &str,
        store: &dyn UserStore,
        tokens: &TokenService,
    ) -> Result<(String, User), AppError> {
        let settings = self.settings(provider)?;

        let access_token = self.exchange_code(settings, code).await?;
        let profile = self.fetch_profile(settings, &access_token).await?;

        let user = match store.find_by_external_id(&profile.external_id).await? {
            Some(user) => user,
            None => {
                let created = store
                    .create(NewUser::external(
                        profile.username,
                        profile.email,
                        profile.external_id,
                    ))
                    .await?;
                tracing::info!(
                    username = %created.username,
                    provider = provider.as_str(),
                    "Created local account from OAuth login"
                );
                created
            }
        };

        let token = tokens.issue(&user.username)?;
        TOKENS_ISSUED_TOTAL
            .with_label_values(&[provider.as_str()])
            .inc();

        Ok((token, user))
    }
}
