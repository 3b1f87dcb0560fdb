//! Parsing of resource identifiers (`scheme://route?query`).

use crate::errors::ControlError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use url::Url;

/// Scheme of the identifiers produced by the browsing and search UI.
pub const SCHEME: &str = "cloudmusic";

/// A parsed identifier. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    raw: String,
    scheme: String,
    route: String,
    query: HashMap<String, String>,
}

impl Identifier {
    /// Parses an identifier.
    ///
    /// The route is the authority followed by the path, without leading or
    /// trailing slashes: `cloudmusic://163/album/playlist?id=3` has route
    /// `163/album/playlist`. Query values are percent-decoded.
    pub fn parse(raw: &str) -> Result<Self, ControlError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|_| ControlError::unsupported_identifier(trimmed))?;

        let mut route = String::new();
        if let Some(host) = url.host_str() {
            route.push_str(host);
        }
        let path = url.path().trim_matches('/');
        if !path.is_empty() {
            if !route.is_empty() {
                route.push('/');
            }
            route.push_str(path);
        }

        // Dernière valeur gagnante pour un paramètre répété
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self {
            raw: trimmed.to_string(),
            scheme: url.scheme().to_string(),
            route,
            query,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn is_direct_url(&self) -> bool {
        matches!(self.scheme.as_str(), "http" | "https")
    }

    /// Returns a non-empty query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns a query parameter or an `InvalidIdentifier` error.
    pub fn require(&self, name: &str) -> Result<&str, ControlError> {
        self.param(name).ok_or_else(|| {
            ControlError::invalid_identifier(&self.raw, &format!("missing '{}' parameter", name))
        })
    }

    /// Parses a query parameter, falling back to `default` when it is
    /// absent or malformed.
    pub fn param_or<T>(&self, name: &str, default: T) -> T
    where
        T: FromStr + fmt::Display,
    {
        match self.param(name) {
            None => default,
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!(identifier = %self.raw, "Invalid '{}' value '{}', using {}", name, value, default);
                default
            }),
        }
    }
}

impl FromStr for Identifier {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
