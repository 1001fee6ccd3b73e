//! Remote API base URL type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// REST API version requested on every call.
pub const API_VERSION: &str = "7.1";

/// A validated base URL for the remote work-item API.
///
/// Must use HTTPS (or HTTP for localhost). Organization and project are
/// appended per request, so the same base serves every tracked source.
///
/// # Example
///
/// ```
/// use workmirror_core::ApiBase;
///
/// let base = ApiBase::new("https://dev.azure.com").unwrap();
/// assert_eq!(
///     base.wit_url("contoso", "Fabrikam", "wiql").as_str(),
///     "https://dev.azure.com/contoso/Fabrikam/_apis/wit/wiql"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiBase(Url);

impl ApiBase {
    /// The public Azure DevOps service.
    pub const DEFAULT: &'static str = "https://dev.azure.com";

    /// Create a new API base from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or doesn't meet requirements.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ApiBase {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        Ok(Self(url))
    }

    /// Returns the URL of a work-item-tracking resource.
    ///
    /// Organization and project are percent-encoded as path segments, so
    /// project names with spaces are safe.
    pub fn wit_url(&self, organization: &str, project: &str, resource: &str) -> Url {
        let mut url = self.0.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([organization, project, "_apis", "wit", resource]);
        }
        url
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        if url.cannot_be_a_base() {
            return Err(InvalidInputError::ApiBase {
                value: original.to_string(),
                reason: "must be an absolute URL".to_string(),
            }
            .into());
        }

        let is_localhost = url
            .host_str()
            .is_some_and(|h| h == "localhost" || h == "127.0.0.1" || h == "[::1]");

        let scheme = url.scheme();
        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(InvalidInputError::ApiBase {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::ApiBase {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        if url.query().is_some() {
            return Err(InvalidInputError::ApiBase {
                value: original.to_string(),
                reason: "must not carry a query string".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl Default for ApiBase {
    fn default() -> Self {
        Self(Url::parse(Self::DEFAULT).expect("default API base is a valid URL"))
    }
}

impl fmt::Display for ApiBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ApiBase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiBase {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiBase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiBase::new(&s).map_err(serde::de::Error::custom)
    }
}
