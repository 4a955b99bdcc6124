pub mod aws_profile;
pub mod dotenv;
pub mod env;
pub mod process;

/// Flags shared by every subcommand to build the AssumeRoleWithWebIdentity request
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FederationArgs {
    /// Name of the role to assume
    ///
    /// Default to gitlab-$CI_PROJECT_PATH_SLUG (slug truncated to 57 characters).
    #[clap(long, short = 'r')]
    role_name: Option<String>,
    /// Role session name to use
    ///
    /// Default to <role name>-$CI_PIPELINE_ID, sanitized and shortened to 64 characters.
    #[clap(long, short = 'n')]
    role_session_name: Option<String>,
    /// AWS account id to assume the role in; default to $GITLAB_AWS_ACCOUNT_ID
    #[clap(long = "aws-account", short = 'A')]
    aws_account_id: Option<String>,
    /// Session duration in seconds; default to $GITLAB_AWS_DURATION_SECONDS or 3600
    #[clap(long, short = 'd', value_parser = clap::value_parser!(i64).range(1..))]
    duration_seconds: Option<i64>,
    /// Name of the environment variable holding the GitLab ID token
    ///
    /// Default to $GITLAB_AWS_IDENTITY_TOKEN_NAME or GITLAB_AWS_IDENTITY_TOKEN.
    #[clap(long, short = 'j')]
    web_identity_token_name: Option<String>,
}

impl FederationArgs {
    pub fn overrides(&self) -> crate::config::Overrides {
        crate::config::Overrides {
            role_name: self.role_name.clone(),
            role_session_name: self.role_session_name.clone(),
            aws_account_id: self.aws_account_id.clone(),
            duration_seconds: self.duration_seconds,
            web_identity_token_name: self.web_identity_token_name.clone(),
        }
    }
}

/// Resolve, validate and exchange the identity token for credentials.
///
/// Nothing is sent to STS unless the request is completely valid.
pub async fn obtain_credentials<C>(
    client: &C,
    env: &crate::environment::Environment,
    overrides: crate::config::Overrides,
) -> Result<crate::client::Credentials, crate::error::Error>
where
    C: crate::client::ExchangeToken + ?Sized,
{
    let request = crate::config::resolve(env, overrides)?.validate(env)?;
    tracing::info!(message = "Assuming role", role_arn = %request.role_arn(), role_session_name = %request.role_session_name(), duration_seconds = request.duration_seconds());
    client.assume_role_with_web_identity(&request).await
}

/// [`obtain_credentials`] with the STS client configured from the environment.
pub async fn obtain_credentials_from_env(
    env: &crate::environment::Environment,
    args: &FederationArgs,
) -> Result<crate::client::Credentials, crate::error::Error> {
    let client = crate::client::Client::from_env(env)?;
    obtain_credentials(&client, env, args.overrides()).await
}

/// Write a file readable only by its owner, replacing existing contents.
pub(crate) async fn write_private_file(
    path: &std::path::Path,
    contents: &[u8],
) -> Result<(), crate::error::Error> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    file.flush().await?;
    if let Err(e) = file.sync_all().await {
        tracing::warn!(message = "failed to sync file", path = ?path, error = ?e);
    }
    Ok(())
}
