pub const DEFAULT_FILENAME: &str = ".gitlab-aws-credentials.env";

/// Store the credentials as a dotenv file, to share them between GitLab jobs through
/// `artifacts:reports:dotenv`.
#[derive(clap::Args)]
pub struct DotenvArgs {
    #[clap(flatten)]
    federation: super::FederationArgs,
    /// Path of the dotenv file to write
    #[clap(long, short = 'f', env = "GITLAB_AWS_DOTENV_FILE", default_value = DEFAULT_FILENAME)]
    filename: String,
}

#[tokio::main(flavor = "current_thread")]
pub async fn run(
    env: &crate::environment::Environment,
    args: &DotenvArgs,
) -> Result<(), anyhow::Error> {
    let _span = tracing::info_span!("dotenv").entered();

    if args.filename.is_empty() {
        return Err(crate::error::Error::ConfigError(
            "no --filename was specified or GITLAB_AWS_DOTENV_FILE was empty".to_string(),
        )
        .into());
    }

    let credentials = super::obtain_credentials_from_env(env, &args.federation).await?;
    write_dotenv(std::path::Path::new(&args.filename), &credentials).await?;
    tracing::info!(message = "Wrote credentials to a dotenv file", filename = %args.filename, expiration = ?credentials.expiration);
    Ok(())
}

pub async fn write_dotenv(
    path: &std::path::Path,
    credentials: &crate::client::Credentials,
) -> Result<(), crate::error::Error> {
    let contents = crate::environment::EnvironmentList::from_credentials(credentials)
        .render(crate::environment::LineStyle::Quoted);
    super::write_private_file(path, contents.as_bytes()).await
}
