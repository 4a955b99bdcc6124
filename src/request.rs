//! Validated sts:AssumeRoleWithWebIdentity request

/// Maximum length of an IAM role name
pub const MAX_ROLE_NAME_LENGTH: usize = 64;

/// A complete request ready to be sent to STS. Only obtainable through [`ResolvedRequest::validate`].
///
/// [`ResolvedRequest::validate`]: crate::config::ResolvedRequest::validate
#[derive(Debug)]
pub struct FederationRequest {
    role_arn: String,
    role_name: String,
    role_session_name: String,
    aws_account_id: String,
    duration_seconds: i64,
    web_identity_token: secrecy::SecretString,
}

impl FederationRequest {
    pub fn role_arn(&self) -> &str {
        &self.role_arn
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    pub fn role_session_name(&self) -> &str {
        &self.role_session_name
    }

    pub fn aws_account_id(&self) -> &str {
        &self.aws_account_id
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration_seconds
    }

    pub fn web_identity_token(&self) -> &secrecy::SecretString {
        &self.web_identity_token
    }
}

pub fn role_arn(aws_account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{aws_account_id}:role/{role_name}")
}

impl crate::config::ResolvedRequest {
    /// Check the request for completeness, read the identity token and fill derived fields.
    ///
    /// Checks are applied in order and the first failure is returned.
    pub fn validate(
        self,
        env: &crate::environment::Environment,
    ) -> Result<FederationRequest, crate::error::Error> {
        use crate::error::Error;

        if self.role_name.is_empty() {
            return Err(Error::ConfigError(format!(
                "the role name is not set. Use --role-name or set the environment variable {}",
                crate::config::ENV_PROJECT_PATH_SLUG
            )));
        }
        if self.role_name.chars().count() > MAX_ROLE_NAME_LENGTH {
            return Err(Error::ConfigError(format!(
                "the role name exceeds the maximum of {MAX_ROLE_NAME_LENGTH} characters allowed by AWS"
            )));
        }
        if self.aws_account_id.is_empty() {
            return Err(Error::ConfigError(format!(
                "the AWS account is not set. Use --aws-account or set the environment variable {}",
                crate::config::ENV_AWS_ACCOUNT_ID
            )));
        }

        let web_identity_token = env
            .get(&self.web_identity_token_name)
            .map(|v| secrecy::SecretString::new(v.to_owned()))
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "the identity token environment variable {} is not set",
                    self.web_identity_token_name
                ))
            })?;

        let role_session_name = if self.role_session_name.is_empty() {
            crate::session_name::derive_session_name(&self.role_name, &self.pipeline_id)
        } else if crate::session_name::is_valid_session_name(&self.role_session_name) {
            self.role_session_name
        } else {
            return Err(Error::ConfigError(format!(
                "the role session name {:?} is invalid; it must be 2 to {} characters of [A-Za-z0-9_+=,.@-]",
                self.role_session_name,
                crate::session_name::MAX_LENGTH
            )));
        };

        let req = FederationRequest {
            role_arn: role_arn(&self.aws_account_id, &self.role_name),
            role_name: self.role_name,
            role_session_name,
            aws_account_id: self.aws_account_id,
            duration_seconds: self.duration_seconds,
            web_identity_token,
        };
        tracing::debug!(request = ?req);
        Ok(req)
    }
}
