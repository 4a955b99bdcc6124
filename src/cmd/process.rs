/// Return the credentials on stdout in the format of AWS credential_process
#[derive(clap::Args)]
pub struct ProcessArgs {
    #[clap(flatten)]
    federation: super::FederationArgs,
}

/// https://docs.aws.amazon.com/sdkref/latest/guide/feature-process-credentials.html
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialProcessResponse {
    pub version: i64,
    pub access_key_id: String,
    pub secret_access_key: crate::client::AwsSecretAccessKey,
    pub session_token: String,
    pub expiration: chrono::DateTime<chrono::Utc>,
}

impl From<crate::client::Credentials> for CredentialProcessResponse {
    fn from(credentials: crate::client::Credentials) -> Self {
        Self {
            version: 1,
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: credentials.session_token,
            expiration: credentials.expiration,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
pub async fn run(
    env: &crate::environment::Environment,
    args: &ProcessArgs,
) -> Result<(), anyhow::Error> {
    let _span = tracing::info_span!("process").entered();

    let credentials = super::obtain_credentials_from_env(env, &args.federation).await?;
    let result = CredentialProcessResponse::from(credentials);

    {
        use std::io::Write;
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer(&mut stdout, &result)?;
        stdout.flush()?;
    }
    Ok(())
}
