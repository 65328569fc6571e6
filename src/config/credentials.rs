//! Credential resolution for the two transports (OS shell over ssh, BMC over ipmitool).
//! Per-host config wins; environment variables fill in whatever is missing.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ENV_OS_USER: &str = "HUSH_OS_USER";
pub const ENV_OS_PASS: &str = "HUSH_OS_PASS";
pub const ENV_OOB_USER: &str = "HUSH_OOB_USER";
pub const ENV_OOB_PASS: &str = "HUSH_OOB_PASS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Credentials as they appear in a host entry of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Credentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oob: Option<Credentials>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScope {
    /// Operating-system login used for ssh.
    Os,
    /// Out-of-band login used for the BMC.
    Oob,
}

impl CredentialScope {
    fn env_keys(self) -> (&'static str, &'static str) {
        match self {
            CredentialScope::Os => (ENV_OS_USER, ENV_OS_PASS),
            CredentialScope::Oob => (ENV_OOB_USER, ENV_OOB_PASS),
        }
    }
}

/// Resolve credentials for `hostname` using the configured entry and the given
/// environment lookup.
pub fn resolve_with<F>(
    hostname: &str,
    configured: Option<&HostCredentials>,
    scope: CredentialScope,
    env: F,
) -> Credentials
where
    F: Fn(&str) -> Option<String>,
{
    let entry = configured.and_then(|c| match scope {
        CredentialScope::Os => c.os.clone(),
        CredentialScope::Oob => c.oob.clone(),
    });
    let (user_key, pass_key) = scope.env_keys();

    let mut creds = entry.unwrap_or_default();
    if creds.username.is_none() {
        creds.username = env(user_key);
    }
    if creds.password.is_none() {
        creds.password = env(pass_key);
    }

    debug!(
        "{} credentials for {}: user={:?}, password {}",
        match scope {
            CredentialScope::Os => "OS",
            CredentialScope::Oob => "OOB",
        },
        hostname,
        creds.username,
        if creds.password.is_some() { "set" } else { "unset" },
    );
    creds
}

/// Resolve credentials from config and the process environment.
pub fn resolve(
    hostname: &str,
    configured: Option<&HostCredentials>,
    scope: CredentialScope,
) -> Credentials {
    resolve_with(hostname, configured, scope, |key| std::env::var(key).ok())
}
