pub const ENV_SHARED_CREDENTIALS_FILE: &str = "AWS_SHARED_CREDENTIALS_FILE";
pub const DEFAULT_PROFILE: &str = "default";

// Keys appearing before any section header are kept under this name, so that `[default]` stays
// an ordinary section when the file is written back.
const NO_SECTION: &str = "gitlab-aws-credential-helper:no-section";

/// Store the credentials in the AWS shared credentials file
#[derive(clap::Args)]
pub struct AwsProfileArgs {
    #[clap(flatten)]
    federation: super::FederationArgs,
    /// Name of the AWS profile to write
    #[clap(long, short = 'p', env = "GITLAB_AWS_PROFILE", default_value = DEFAULT_PROFILE)]
    aws_profile: String,
}

#[tokio::main(flavor = "current_thread")]
pub async fn run(
    env: &crate::environment::Environment,
    args: &AwsProfileArgs,
) -> Result<(), anyhow::Error> {
    let _span = tracing::info_span!("aws_profile").entered();

    if args.aws_profile.is_empty() {
        return Err(crate::error::Error::ConfigError(
            "no --aws-profile was specified or GITLAB_AWS_PROFILE was empty".to_string(),
        )
        .into());
    }
    let path = shared_credentials_file(env)?;

    let credentials = super::obtain_credentials_from_env(env, &args.federation).await?;
    write_profile(&path, &args.aws_profile, &credentials).await?;
    tracing::info!(message = "Wrote credentials to the shared credentials file", path = ?path, profile = %args.aws_profile, expiration = ?credentials.expiration);
    Ok(())
}

/// `$AWS_SHARED_CREDENTIALS_FILE`, or `$HOME/.aws/credentials`
pub fn shared_credentials_file(
    env: &crate::environment::Environment,
) -> Result<std::path::PathBuf, crate::error::Error> {
    if let Some(path) = env.get(ENV_SHARED_CREDENTIALS_FILE) {
        return Ok(path.into());
    }
    let home = env.get("HOME").ok_or_else(|| {
        crate::error::Error::ConfigError(format!(
            "cannot locate the shared credentials file; set {ENV_SHARED_CREDENTIALS_FILE} or $HOME"
        ))
    })?;
    Ok(std::path::Path::new(home).join(".aws").join("credentials"))
}

/// Set credentials of `profile` in INI formatted `existing` contents, keeping everything else.
pub fn update_profile(
    existing: &str,
    profile: &str,
    credentials: &crate::client::Credentials,
) -> Result<String, crate::error::Error> {
    use secrecy::ExposeSecret;

    let mut ini = configparser::ini::Ini::new_cs();
    ini.set_default_section(NO_SECTION);
    ini.read(existing.to_owned())
        .map_err(crate::error::Error::CredentialsFileError)?;

    let values = [
        ("aws_access_key_id", credentials.access_key_id.clone()),
        (
            "aws_secret_access_key",
            credentials.secret_access_key.expose_secret().clone(),
        ),
        ("aws_session_token", credentials.session_token.clone()),
        (
            "expiration",
            credentials
                .expiration
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ),
    ];
    for (key, value) in values {
        ini.set(profile, key, Some(value));
    }
    Ok(ini.writes())
}

pub async fn write_profile(
    path: &std::path::Path,
    profile: &str,
    credentials: &crate::client::Credentials,
) -> Result<(), crate::error::Error> {
    let existing = match tokio::fs::read_to_string(path).await {
        Ok(v) => v,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let contents = update_profile(&existing, profile, credentials)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if tokio::fs::metadata(parent).await.is_err() {
            tokio::fs::DirBuilder::new()
                .recursive(true)
                .mode(0o750)
                .create(parent)
                .await?;
        }
    }

    super::write_private_file(path, contents.as_bytes()).await
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::environment::Environment;
    use std::os::unix::prelude::PermissionsExt;

    fn parse(contents: &str) -> configparser::ini::Ini {
        let mut ini = configparser::ini::Ini::new_cs();
        ini.set_default_section(NO_SECTION);
        ini.read(contents.to_owned()).unwrap();
        ini
    }

    fn assert_profile(ini: &configparser::ini::Ini, profile: &str) {
        assert_eq!(
            ini.get(profile, "aws_access_key_id").as_deref(),
            Some("ASIAEXAMPLE")
        );
        assert_eq!(
            ini.get(profile, "aws_secret_access_key").as_deref(),
            Some("secret/key+value")
        );
        assert_eq!(
            ini.get(profile, "aws_session_token").as_deref(),
            Some("session/token==")
        );
        assert_eq!(
            ini.get(profile, "expiration").as_deref(),
            Some("2024-01-01T01:00:00Z")
        );
    }

    #[test]
    fn test_shared_credentials_file() {
        let env = Environment::from_iter([
            ("HOME", "/home/gitlab"),
            (ENV_SHARED_CREDENTIALS_FILE, "/tmp/credentials"),
        ]);
        assert_eq!(
            shared_credentials_file(&env).unwrap(),
            std::path::PathBuf::from("/tmp/credentials")
        );

        let env = Environment::from_iter([("HOME", "/home/gitlab")]);
        assert_eq!(
            shared_credentials_file(&env).unwrap(),
            std::path::PathBuf::from("/home/gitlab/.aws/credentials")
        );

        assert!(shared_credentials_file(&Environment::default())
            .unwrap_err()
            .is_config_error());
    }

    #[test]
    fn test_update_profile_empty() {
        let contents = update_profile("", "default", &crate::dev::test_credentials()).unwrap();
        assert!(contents.contains("[default]"), "{contents}");
        let ini = parse(&contents);
        assert_profile(&ini, "default");
    }

    #[test]
    fn test_update_profile_keeps_others() {
        let existing = indoc::indoc! {"
            [default]
            aws_access_key_id=AKIAOLD
            aws_secret_access_key=old
            region=eu-west-1

            [Production]
            aws_access_key_id=AKIAPROD
            aws_secret_access_key=prod
        "};
        let contents =
            update_profile(existing, "default", &crate::dev::test_credentials()).unwrap();
        let ini = parse(&contents);

        assert_profile(&ini, "default");
        assert_eq!(ini.get("default", "region").as_deref(), Some("eu-west-1"));
        assert_eq!(
            ini.get("Production", "aws_access_key_id").as_deref(),
            Some("AKIAPROD")
        );
        assert_eq!(
            ini.get("Production", "aws_secret_access_key").as_deref(),
            Some("prod")
        );
    }

    #[test]
    fn test_update_profile_new_section() {
        let existing = indoc::indoc! {"
            [default]
            aws_access_key_id=AKIAOLD
        "};
        let contents = update_profile(existing, "gitlab", &crate::dev::test_credentials()).unwrap();
        let ini = parse(&contents);

        assert_profile(&ini, "gitlab");
        assert_eq!(
            ini.get("default", "aws_access_key_id").as_deref(),
            Some("AKIAOLD")
        );
        assert_eq!(ini.get("default", "aws_session_token"), None);
    }

    #[tokio::test]
    async fn test_write_profile() {
        let dir = crate::dev::TestDir::new();
        let path = dir.path(".aws").join("credentials");

        write_profile(&path, "default", &crate::dev::test_credentials())
            .await
            .unwrap();
        write_profile(&path, "other", &crate::dev::test_credentials())
            .await
            .unwrap();

        let ini = parse(&std::fs::read_to_string(&path).unwrap());
        assert_profile(&ini, "default");
        assert_profile(&ini, "other");

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode(), 0o100600);
        let dir_meta = std::fs::metadata(path.parent().unwrap()).unwrap();
        assert!(dir_meta.is_dir());
    }
}
