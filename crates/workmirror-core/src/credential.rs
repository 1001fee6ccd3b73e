//! Per-source credential.

use std::fmt;

/// A personal access token for the remote work-item API.
///
/// Never shown in Debug output. Treat as opaque.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// Organization, project and token for one tracked upstream source.
///
/// Loaded once at startup and never persisted next to mirrored data.
///
/// # Example
///
/// ```
/// use workmirror_core::{AccessToken, Credential};
///
/// let cred = Credential::new("contoso", "Fabrikam", AccessToken::new("s3cret"));
/// assert_eq!(cred.organization(), "contoso");
/// assert!(!format!("{:?}", cred).contains("s3cret"));
/// ```
#[derive(Clone)]
pub struct Credential {
    organization: String,
    project: String,
    access_token: AccessToken,
}

impl Credential {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        access_token: AccessToken,
    ) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            access_token,
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Returns the access token.
    ///
    /// Use only when building the authorization header.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("access_token", &self.access_token)
            .finish()
    }
}
