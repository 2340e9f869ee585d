//! Credential loading from the environment and `.env` files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;

/// Runtime credentials loaded from the process environment or a `.env` file.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns a required credential or an error when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the key does not exist in loaded credentials.
    pub fn require(&self, key: &str) -> anyhow::Result<String> {
        self.vars
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing required credential: {key}"))
    }
}

/// Load credentials from a specific `.env` path.
///
/// # Errors
///
/// Returns an error if the file does not exist, permissions are too broad,
/// or parsing fails.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "credentials file does not exist: {}",
            path.display()
        ));
    }

    validate_private_permissions(path)?;

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read credentials at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in credentials file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    Ok(Credentials { vars })
}

/// Load credentials from the process environment, falling back to `./.env`
/// when present.
///
/// # Errors
///
/// Returns an error when a `.env` file exists but cannot be loaded.
pub fn load_env_credentials() -> anyhow::Result<Credentials> {
    let mut vars: BTreeMap<String, String> = std::env::vars().collect();

    let dotenv = Path::new(".env");
    if dotenv.exists() {
        // Process environment wins over file entries.
        for (key, value) in load_credentials(dotenv)?.vars {
            vars.entry(key).or_insert(value);
        }
    }

    Ok(Credentials { vars })
}

/// Basic-auth credentials for the Jira Cloud REST API.
#[derive(Clone, PartialEq, Eq)]
pub struct JiraAuth {
    /// Account email sent as the basic-auth username.
    pub email: String,
    /// API token sent as the basic-auth password.
    pub api_token: String,
}

impl std::fmt::Debug for JiraAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraAuth")
            .field("email", &self.email)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

/// Resolve Jira authentication from loaded credentials.
///
/// Expects `JIRA_EMAIL` and `JIRA_API_TOKEN`.
///
/// # Errors
///
/// Returns an error naming the first missing key.
pub fn resolve_jira_auth(credentials: &Credentials) -> anyhow::Result<JiraAuth> {
    Ok(JiraAuth {
        email: credentials.require("JIRA_EMAIL")?,
        api_token: credentials.require("JIRA_API_TOKEN")?,
    })
}

#[cfg(unix)]
fn validate_private_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)
        .with_context(|| format!("failed to inspect credentials file {}", path.display()))?;
    let mode = metadata.permissions().mode() & 0o777;

    if mode & 0o077 != 0 {
        return Err(anyhow::anyhow!(
            "credentials file {} must be 0600, found {:o}",
            path.display(),
            mode
        ));
    }

    Ok(())
}

#[cfg(not(unix))]
fn validate_private_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
