pub fn test_credentials() -> crate::client::Credentials {
    use chrono::TimeZone;
    crate::client::Credentials {
        access_key_id: "ASIAEXAMPLE".to_string(),
        secret_access_key: crate::client::AwsSecretAccessKey::new("secret/key+value".to_string()),
        session_token: "session/token==".to_string(),
        expiration: chrono::Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
    }
}

pub struct TestDir {
    pub tmpdir: temp_dir::TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let tmpdir = temp_dir::TempDir::with_prefix("gitlab-aws-credential-helper-dev").unwrap();
        Self { tmpdir }
    }

    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.tmpdir.path().join(name)
    }
}
