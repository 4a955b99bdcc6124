//! Point-in-time snapshot of environment variables.

/// Environment variables captured once per invocation.
///
/// Everything reading configuration from the environment goes through this type instead of
/// `std::env`, so tests can feed arbitrary variables without touching the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    inner: std::collections::BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment. Variables whose name or value is not valid
    /// UTF-8 are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Returns a value of a variable; set-but-empty variables are treated as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

type EnvironmentListInner = Vec<(&'static str, String)>;

/// Variables to hand temporary credentials over to AWS SDKs and CLI.
pub struct EnvironmentList {
    inner: EnvironmentListInner,
}

/// How [`EnvironmentList::render`] writes each line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStyle {
    /// `KEY=value`
    Plain,
    /// `export KEY=value`
    Export,
    /// `KEY="value"`
    Quoted,
}

impl EnvironmentList {
    pub fn from_credentials(credentials: &crate::client::Credentials) -> Self {
        use secrecy::ExposeSecret;
        vec![
            (AWS_ACCESS_KEY_ID, credentials.access_key_id.clone()),
            (
                AWS_SECRET_ACCESS_KEY,
                credentials.secret_access_key.expose_secret().clone(),
            ),
            (AWS_SESSION_TOKEN, credentials.session_token.clone()),
        ]
        .into()
    }

    pub fn render(&self, style: LineStyle) -> String {
        let mut out = String::new();
        for (k, v) in self.inner.iter() {
            match style {
                LineStyle::Plain => out.push_str(&format!("{k}={v}\n")),
                LineStyle::Export => out.push_str(&format!("export {k}={v}\n")),
                LineStyle::Quoted => out.push_str(&format!("{k}=\"{v}\"\n")),
            }
        }
        out
    }

    /// Merge into an existing environment: variables of the same name are dropped from `base`
    /// and the list is appended at the end.
    pub fn apply_to<I, K, V>(&self, base: I) -> Vec<(std::ffi::OsString, std::ffi::OsString)>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<std::ffi::OsString>,
        V: Into<std::ffi::OsString>,
    {
        let mut result: Vec<(std::ffi::OsString, std::ffi::OsString)> = base
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !self.inner.iter().any(|(name, _)| k == name))
            .collect();
        result.extend(
            self.inner
                .iter()
                .map(|(k, v)| (std::ffi::OsString::from(k), std::ffi::OsString::from(v))),
        );
        result
    }
}

impl std::fmt::Display for EnvironmentList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str(&self.render(LineStyle::Plain))
    }
}

impl From<EnvironmentListInner> for EnvironmentList {
    fn from(mut inner: EnvironmentListInner) -> Self {
        inner.sort_by_key(|k| k.0);
        Self { inner }
    }
}
