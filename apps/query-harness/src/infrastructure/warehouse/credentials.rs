//! Google credentials: locating them, and trading them for access tokens.
//!
//! Lookup order:
//! 1. the explicit value (`--credentials` or `GCP_SA_KEY`), either a path or
//!    the key JSON itself
//! 2. `GOOGLE_APPLICATION_CREDENTIALS`
//! 3. the gcloud application-default file under the home directory
//!
//! Service-account keys are exchanged through a signed JWT-bearer grant,
//! gcloud user credentials through their refresh token.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::WarehouseError;
use crate::utilities::constants::{
    BIGQUERY_SCOPE, ENV_GOOGLE_APPLICATION_CREDENTIALS, ENV_GOOGLE_CLOUD_PROJECT,
    GCLOUD_ADC_RELATIVE_PATH, GOOGLE_TOKEN_URI, JWT_BEARER_GRANT,
};

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub quota_project_id: Option<String>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl Credentials {
    /// Parses either inline key JSON or the path of a key file.
    pub fn load(value: &str) -> Result<Self, WarehouseError> {
        let trimmed = value.trim_start();
        if trimmed.starts_with('{') {
            return Self::parse(trimmed);
        }

        let path = PathBuf::from(value);
        let contents = std::fs::read_to_string(&path)
            .map_err(|source| WarehouseError::CredentialsIo { path, source })?;
        Self::parse(&contents)
    }

    pub fn parse(json: &str) -> Result<Self, WarehouseError> {
        serde_json::from_str(json).map_err(|e| WarehouseError::InvalidCredentials(e.to_string()))
    }

    fn token_uri(&self) -> &str {
        match self {
            Credentials::ServiceAccount(key) => &key.token_uri,
            Credentials::AuthorizedUser(_) => GOOGLE_TOKEN_URI,
        }
    }

    fn project_id(&self) -> Option<&str> {
        match self {
            Credentials::ServiceAccount(key) => key.project_id.as_deref(),
            Credentials::AuthorizedUser(user) => user.quota_project_id.as_deref(),
        }
    }

    pub fn principal(&self) -> &str {
        match self {
            Credentials::ServiceAccount(key) => &key.client_email,
            Credentials::AuthorizedUser(user) => &user.client_id,
        }
    }
}

pub struct ResolvedCredentials {
    pub credentials: Credentials,
    pub project_id: String,
}

/// Picks the first credentials candidate that is set. The home directory is
/// only consulted when its well-known file exists.
fn locate(
    explicit: Option<&str>,
    application_credentials: Option<String>,
    home_dir: Option<&Path>,
) -> Option<String> {
    explicit
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .or(application_credentials.filter(|value| !value.trim().is_empty()))
        .or_else(|| {
            home_dir
                .map(|home| home.join(GCLOUD_ADC_RELATIVE_PATH))
                .filter(|path| path.is_file())
                .map(|path| path.display().to_string())
        })
}

fn resolve_project(credentials: &Credentials, env_project: Option<String>) -> Option<String> {
    credentials
        .project_id()
        .map(str::to_string)
        .or(env_project)
        .filter(|project| !project.is_empty())
}

pub fn resolve_credentials(explicit: Option<&str>) -> Result<ResolvedCredentials, WarehouseError> {
    let value = locate(
        explicit,
        std::env::var(ENV_GOOGLE_APPLICATION_CREDENTIALS).ok(),
        home::home_dir().as_deref(),
    )
    .ok_or(WarehouseError::NoCredentials)?;

    let credentials = Credentials::load(&value)?;
    let project_id = resolve_project(&credentials, std::env::var(ENV_GOOGLE_CLOUD_PROJECT).ok())
        .ok_or_else(|| {
            WarehouseError::InvalidCredentials(format!(
                "no project id in credentials, set {ENV_GOOGLE_CLOUD_PROJECT}"
            ))
        })?;

    debug!("Resolved credentials for {}", credentials.principal());
    Ok(ResolvedCredentials {
        credentials,
        project_id,
    })
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

fn sign_assertion(key: &ServiceAccountKey, audience: &str) -> Result<String, WarehouseError> {
    let now = chrono::Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: BIGQUERY_SCOPE,
        aud: audience,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

/// Hands out bearer tokens, fetching a new one when the cached token is
/// about to expire.
pub struct TokenProvider {
    http: reqwest::Client,
    credentials: Credentials,
    token_uri: String,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, credentials: Credentials, token_uri: Option<String>) -> Self {
        let token_uri = token_uri.unwrap_or_else(|| credentials.token_uri().to_string());
        Self {
            http,
            credentials,
            token_uri,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, WarehouseError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch(&self) -> Result<AccessToken, WarehouseError> {
        info!("Requesting access token from {}", self.token_uri);

        let request = match &self.credentials {
            Credentials::ServiceAccount(key) => {
                let assertion = sign_assertion(key, &self.token_uri)?;
                self.http.post(&self.token_uri).form(&[
                    ("grant_type", JWT_BEARER_GRANT),
                    ("assertion", assertion.as_str()),
                ])
            }
            Credentials::AuthorizedUser(user) => self.http.post(&self.token_uri).form(&[
                ("grant_type", "refresh_token"),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", user.refresh_token.as_str()),
            ]),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(TokenErrorResponse {
                    error,
                    error_description: Some(description),
                }) => format!("{error}: {description}"),
                Ok(TokenErrorResponse { error, .. }) => error,
                Err(_) => body,
            };
            return Err(WarehouseError::Auth(format!("{status} {detail}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in.unwrap_or(3600)),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) const SERVICE_ACCOUNT_JSON: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/service_account.json"
    ));

    const AUTHORIZED_USER_JSON: &str = r#"{
        "type": "authorized_user",
        "client_id": "client-123.apps.googleusercontent.com",
        "client_secret": "shh",
        "refresh_token": "1//refresh",
        "quota_project_id": "quota-project"
    }"#;

    #[test]
    fn test_parse_service_account() {
        let credentials = Credentials::parse(SERVICE_ACCOUNT_JSON).unwrap();
        assert_eq!(credentials.project_id(), Some("harness-test-project"));
        assert_eq!(credentials.token_uri(), GOOGLE_TOKEN_URI);
        assert!(credentials.principal().ends_with(".iam.gserviceaccount.com"));
    }

    #[test]
    fn test_parse_authorized_user() {
        let credentials = Credentials::parse(AUTHORIZED_USER_JSON).unwrap();
        assert_eq!(credentials.project_id(), Some("quota-project"));
        assert_eq!(credentials.token_uri(), GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_unsupported_credentials_type() {
        let result = Credentials::parse(r#"{"type": "external_account"}"#);
        assert!(matches!(result, Err(WarehouseError::InvalidCredentials(_))));
    }

    #[test]
    fn test_load_inline_and_from_file() {
        assert!(Credentials::load(SERVICE_ACCOUNT_JSON).is_ok());

        let dir = TempDir::new().unwrap();
        let key_path = dir.path().join("key.json");
        std::fs::write(&key_path, SERVICE_ACCOUNT_JSON).unwrap();
        assert!(Credentials::load(key_path.to_str().unwrap()).is_ok());

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            Credentials::load(missing.to_str().unwrap()),
            Err(WarehouseError::CredentialsIo { .. })
        ));
    }

    #[test]
    fn test_locate_order() {
        let home = TempDir::new().unwrap();
        assert_eq!(
            locate(Some("explicit.json"), Some("adc.json".to_string()), Some(home.path())),
            Some("explicit.json".to_string())
        );
        assert_eq!(
            locate(None, Some("adc.json".to_string()), Some(home.path())),
            Some("adc.json".to_string())
        );
        assert_eq!(locate(Some("  "), None, Some(home.path())), None);

        let well_known = home.path().join(GCLOUD_ADC_RELATIVE_PATH);
        std::fs::create_dir_all(well_known.parent().unwrap()).unwrap();
        std::fs::write(&well_known, AUTHORIZED_USER_JSON).unwrap();
        assert_eq!(
            locate(None, None, Some(home.path())),
            Some(well_known.display().to_string())
        );
    }

    #[test]
    fn test_project_falls_back_to_environment_value() {
        let mut credentials = Credentials::parse(AUTHORIZED_USER_JSON).unwrap();
        if let Credentials::AuthorizedUser(user) = &mut credentials {
            user.quota_project_id = None;
        }
        assert_eq!(resolve_project(&credentials, None), None);
        assert_eq!(
            resolve_project(&credentials, Some("env-project".to_string())),
            Some("env-project".to_string())
        );
    }

    #[test]
    fn test_sign_assertion_rejects_bad_key() {
        let key = ServiceAccountKey {
            project_id: None,
            client_email: "x@y".to_string(),
            private_key: "not a pem".to_string(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
        };
        assert!(matches!(
            sign_assertion(&key, GOOGLE_TOKEN_URI),
            Err(WarehouseError::Signing(_))
        ));
    }

    #[tokio::test]
    async fn test_service_account_token_is_fetched_once_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn"))
            .and(body_string_contains("assertion="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.service",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = TokenProvider::new(
            reqwest::Client::new(),
            Credentials::parse(SERVICE_ACCOUNT_JSON).unwrap(),
            Some(format!("{}/token", server.uri())),
        );

        assert_eq!(provider.access_token().await.unwrap(), "ya29.service");
        assert_eq!(provider.access_token().await.unwrap(), "ya29.service");
    }

    #[tokio::test]
    async fn test_authorized_user_uses_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.user",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;

        let provider = TokenProvider::new(
            reqwest::Client::new(),
            Credentials::parse(AUTHORIZED_USER_JSON).unwrap(),
            Some(format!("{}/token", server.uri())),
        );

        assert_eq!(provider.access_token().await.unwrap(), "ya29.user");
    }

    #[tokio::test]
    async fn test_rejected_grant_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid JWT Signature."
            })))
            .mount(&server)
            .await;

        let provider = TokenProvider::new(
            reqwest::Client::new(),
            Credentials::parse(SERVICE_ACCOUNT_JSON).unwrap(),
            Some(format!("{}/token", server.uri())),
        );

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, WarehouseError::Auth(_)));
        assert!(err.to_string().contains("invalid_grant: Invalid JWT Signature."));
    }
}
