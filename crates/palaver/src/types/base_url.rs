//! Backend base URL type.

use std::fmt;
use std::str::FromStr;

use url::{Host, Url};

use crate::error::{Error, InvalidInputError};

/// Origin (plus optional path prefix) that every endpoint path is joined onto.
///
/// Plain HTTP is only accepted for loopback hosts, so credentials never leave
/// the machine unencrypted.
///
/// # Example
///
/// ```
/// use palaver::BaseUrl;
///
/// let base = BaseUrl::new("https://chat.example.com").unwrap();
/// assert_eq!(base.endpoint_url("/api/auth/me/"),
///            "https://chat.example.com/api/auth/me/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl {
    url: Url,
    // `url` without the trailing slash, ready for joining.
    prefix: String,
}

impl BaseUrl {
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let raw = s.as_ref();
        let reject = |reason: String| InvalidInputError::BaseUrl {
            value: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| reject(e.to_string()))?;
        let loopback = match url.host() {
            None => return Err(reject("missing host".to_string()).into()),
            Some(Host::Domain(name)) => name == "localhost",
            Some(Host::Ipv4(ip)) => ip.is_loopback(),
            Some(Host::Ipv6(ip)) => ip.is_loopback(),
        };
        match url.scheme() {
            "https" => {}
            "http" if loopback => {}
            "http" => {
                return Err(reject("plain HTTP is only allowed for loopback hosts".to_string()).into());
            }
            other => return Err(reject(format!("unsupported scheme '{other}'")).into()),
        }

        let prefix = url.as_str().trim_end_matches('/').to_string();
        Ok(Self { url, prefix })
    }

    /// Join an endpoint path such as `/api/auth/me/` onto the base.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.prefix, endpoint.trim_start_matches('/'))
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
