//! Resolve a federation request from environment variables and command line overrides.

pub const ENV_PIPELINE_ID: &str = "CI_PIPELINE_ID";
pub const ENV_PROJECT_PATH_SLUG: &str = "CI_PROJECT_PATH_SLUG";
pub const ENV_AWS_ACCOUNT_ID: &str = "GITLAB_AWS_ACCOUNT_ID";
pub const ENV_DURATION_SECONDS: &str = "GITLAB_AWS_DURATION_SECONDS";
pub const ENV_IDENTITY_TOKEN_NAME: &str = "GITLAB_AWS_IDENTITY_TOKEN_NAME";

pub const DEFAULT_IDENTITY_TOKEN_NAME: &str = "GITLAB_AWS_IDENTITY_TOKEN";
pub const DEFAULT_DURATION_SECONDS: i64 = 3600;

const ROLE_NAME_PREFIX: &str = "gitlab-";
// 64 (maximum role name length) - "gitlab-".len()
const MAX_SLUG_LENGTH: usize = 57;

/// Values given explicitly on the command line. Any `Some` takes precedence over the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub role_name: Option<String>,
    pub role_session_name: Option<String>,
    pub aws_account_id: Option<String>,
    pub duration_seconds: Option<i64>,
    pub web_identity_token_name: Option<String>,
}

/// A request with all defaults applied, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub role_name: String,
    /// Empty when it should be derived from role name and pipeline id
    pub role_session_name: String,
    pub aws_account_id: String,
    pub duration_seconds: i64,
    pub web_identity_token_name: String,
    pub pipeline_id: String,
}

pub fn resolve(
    env: &crate::environment::Environment,
    overrides: Overrides,
) -> Result<ResolvedRequest, crate::error::Error> {
    let role_name = match overrides.role_name {
        Some(v) => v,
        None => env
            .get(ENV_PROJECT_PATH_SLUG)
            .map(default_role_name)
            .unwrap_or_default(),
    };

    let aws_account_id = match overrides.aws_account_id {
        Some(v) => v,
        None => env.get(ENV_AWS_ACCOUNT_ID).unwrap_or_default().to_owned(),
    };

    let duration_seconds = match overrides.duration_seconds {
        Some(v) => v,
        None => match env.get(ENV_DURATION_SECONDS) {
            Some(v) => parse_duration_seconds(v)?,
            None => DEFAULT_DURATION_SECONDS,
        },
    };

    let web_identity_token_name = match overrides.web_identity_token_name {
        Some(v) => v,
        None => env
            .get(ENV_IDENTITY_TOKEN_NAME)
            .unwrap_or(DEFAULT_IDENTITY_TOKEN_NAME)
            .to_owned(),
    };

    let resolved = ResolvedRequest {
        role_name,
        role_session_name: overrides.role_session_name.unwrap_or_default(),
        aws_account_id,
        duration_seconds,
        web_identity_token_name,
        pipeline_id: env.get(ENV_PIPELINE_ID).unwrap_or_default().to_owned(),
    };
    tracing::debug!(resolved = ?resolved);
    Ok(resolved)
}

fn default_role_name(slug: &str) -> String {
    format!(
        "{ROLE_NAME_PREFIX}{}",
        crate::session_name::truncate_chars(slug, MAX_SLUG_LENGTH)
    )
}

fn parse_duration_seconds(value: &str) -> Result<i64, crate::error::Error> {
    match value.parse::<i64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(crate::error::Error::ConfigError(format!(
            "the environment variable {ENV_DURATION_SECONDS} is not a positive integer"
        ))),
    }
}
