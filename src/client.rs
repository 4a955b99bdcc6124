//! sts:AssumeRoleWithWebIdentity API client

use serde::Deserialize;

/// Environment variable to override the STS endpoint, as recognized by AWS SDKs
pub const ENV_ENDPOINT_URL_STS: &str = "AWS_ENDPOINT_URL_STS";

/// Global endpoint; AssumeRoleWithWebIdentity is an unsigned call so no region is needed
pub const DEFAULT_ENDPOINT: &str = "https://sts.amazonaws.com/";

const API_VERSION: &str = "2011-06-15";

pub struct AwsSecretAccessKey(secrecy::SecretString);

impl AwsSecretAccessKey {
    pub fn new(value: String) -> Self {
        Self(secrecy::SecretString::new(value))
    }
}

impl Clone for AwsSecretAccessKey {
    fn clone(&self) -> Self {
        use secrecy::ExposeSecret;
        Self::new(self.0.expose_secret().clone())
    }
}

impl secrecy::ExposeSecret<String> for AwsSecretAccessKey {
    fn expose_secret(&self) -> &String {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AwsSecretAccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str("AwsSecretAccessKey([REDACTED])")
    }
}

impl serde::Serialize for AwsSecretAccessKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use secrecy::ExposeSecret;
        serializer.serialize_str(self.0.expose_secret())
    }
}

impl<'de> serde::Deserialize<'de> for AwsSecretAccessKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::new(String::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: AwsSecretAccessKey,
    pub session_token: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub expiration: chrono::DateTime<chrono::Utc>,
}

// With `Accept: application/json`, STS renders timestamps as epoch seconds; accept RFC 3339 as well.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<chrono::DateTime<chrono::Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Timestamp {
        Epoch(f64),
        Rfc3339(chrono::DateTime<chrono::Utc>),
    }

    match Timestamp::deserialize(deserializer)? {
        Timestamp::Rfc3339(t) => Ok(t),
        Timestamp::Epoch(secs) => {
            use chrono::TimeZone;
            chrono::Utc
                .timestamp_opt(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
                .single()
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {secs}")))
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleWithWebIdentityEnvelope {
    assume_role_with_web_identity_response: AssumeRoleWithWebIdentityResponse,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleWithWebIdentityResponse {
    assume_role_with_web_identity_result: AssumeRoleWithWebIdentityResult,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumeRoleWithWebIdentityResult {
    pub credentials: Credentials,
    pub assumed_role_user: Option<AssumedRoleUser>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedRoleUser {
    pub arn: String,
    pub assumed_role_id: String,
}

/// Exchanges a web identity token for temporary credentials.
#[async_trait::async_trait]
pub trait ExchangeToken {
    async fn assume_role_with_web_identity(
        &self,
        request: &crate::request::FederationRequest,
    ) -> Result<Credentials, crate::error::Error>;
}

pub struct Client {
    http_client: reqwest::Client,
    endpoint: url::Url,
}

impl Client {
    pub fn new(endpoint: url::Url) -> Result<Self, crate::error::Error> {
        let http_client = reqwest::ClientBuilder::new()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn from_env(env: &crate::environment::Environment) -> Result<Self, crate::error::Error> {
        Self::new(endpoint_from_env(env)?)
    }
}

pub fn endpoint_from_env(
    env: &crate::environment::Environment,
) -> Result<url::Url, crate::error::Error> {
    let Some(value) = env.get(ENV_ENDPOINT_URL_STS) else {
        return Ok(url::Url::parse(DEFAULT_ENDPOINT).unwrap());
    };
    let malformed = || {
        crate::error::Error::ConfigError(format!(
            "{ENV_ENDPOINT_URL_STS} is malformed; an absolute http(s) URL is expected"
        ))
    };
    let url = url::Url::parse(value).map_err(|_| malformed())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(malformed()),
    }
}

#[async_trait::async_trait]
impl ExchangeToken for Client {
    async fn assume_role_with_web_identity(
        &self,
        request: &crate::request::FederationRequest,
    ) -> Result<Credentials, crate::error::Error> {
        use secrecy::ExposeSecret;

        let duration_seconds = request.duration_seconds().to_string();
        let params = [
            ("Action", "AssumeRoleWithWebIdentity"),
            ("Version", API_VERSION),
            ("RoleArn", request.role_arn()),
            ("RoleSessionName", request.role_session_name()),
            (
                "WebIdentityToken",
                request.web_identity_token().expose_secret().as_str(),
            ),
            ("DurationSeconds", duration_seconds.as_str()),
        ];

        tracing::debug!(message = "Requesting credentials", endpoint = %self.endpoint, role_arn = %request.role_arn(), role_session_name = %request.role_session_name());

        let resp = self
            .http_client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let envelope: AssumeRoleWithWebIdentityEnvelope =
                serde_json::from_slice(&resp.bytes().await?)?;
            let result = envelope
                .assume_role_with_web_identity_response
                .assume_role_with_web_identity_result;
            tracing::info!(message = "Obtained credentials", access_key_id = ?result.credentials.access_key_id, expiration = ?result.credentials.expiration, assumed_role_user_arn = ?result.assumed_role_user.as_ref().map(|u| &u.arn));
            Ok(result.credentials)
        } else {
            let body = resp.text().await?;
            Err(crate::error::Error::ApiError(status, body))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::environment::Environment;

    #[test]
    fn test_endpoint_default() {
        let url = endpoint_from_env(&Environment::default()).unwrap();
        assert_eq!(url.as_str(), "https://sts.amazonaws.com/");
    }

    #[test]
    fn test_endpoint_override() {
        let env = Environment::from_iter([(ENV_ENDPOINT_URL_STS, "http://127.0.0.1:4566")]);
        let url = endpoint_from_env(&env).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4566/");
    }

    #[test]
    fn test_endpoint_malformed() {
        for value in ["sts.amazonaws.com", "ftp://example.com", "data:text/plain,x"] {
            let env = Environment::from_iter([(ENV_ENDPOINT_URL_STS, value)]);
            let err = endpoint_from_env(&env).unwrap_err();
            assert!(err.is_config_error(), "{value}: {err:?}");
        }
    }

    #[test]
    fn test_credentials_epoch_expiration() {
        let creds: Credentials = serde_json::from_str(
            r#"{"AccessKeyId":"ASIA","SecretAccessKey":"secret","SessionToken":"token","Expiration":1.7040672E9}"#,
        )
        .unwrap();
        assert_eq!(creds.access_key_id, "ASIA");
        assert_eq!(creds.expiration.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_credentials_rfc3339_expiration() {
        let creds: Credentials = serde_json::from_str(
            r#"{"AccessKeyId":"ASIA","SecretAccessKey":"secret","SessionToken":"token","Expiration":"2024-01-01T01:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(creds.expiration.to_rfc3339(), "2024-01-01T01:00:00+00:00");
    }

    #[test]
    fn test_secret_access_key_redacted() {
        let key = AwsSecretAccessKey::new("himitsu".to_string());
        assert!(!format!("{key:?}").contains("himitsu"));
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"himitsu\"");
    }

    #[test]
    fn test_secret_access_key_deserialize() {
        use secrecy::ExposeSecret;
        let key: AwsSecretAccessKey = serde_json::from_str("\"himitsu\"").unwrap();
        assert_eq!(key.expose_secret(), "himitsu");
        assert!(serde_json::from_str::<AwsSecretAccessKey>("42").is_err());
    }
}
