use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{QueryError, Result, quote_literal};

const REMOTE_SCHEMES: [&str; 7] = ["s3", "s3a", "gs", "gcs", "az", "http", "https"];

/// Validated location of a columnar overlay file.
///
/// Accepts `scheme://bucket/key` for object storage and HTTP, or an absolute local path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceLocator {
    raw: String,
    scheme: Option<String>,
}

impl ResourceLocator {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryError::invalid_locator(raw, "locator is empty"));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(QueryError::invalid_locator(
                raw,
                "locator contains control characters",
            ));
        }

        let scheme = match trimmed.split_once("://") {
            Some((scheme, rest)) => {
                let scheme = scheme.to_ascii_lowercase();
                if !REMOTE_SCHEMES.contains(&scheme.as_str()) {
                    return Err(QueryError::invalid_locator(
                        raw,
                        format!("unsupported scheme `{scheme}`"),
                    ));
                }
                let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(QueryError::invalid_locator(raw, "missing bucket or host"));
                }
                if key.is_empty() || key.ends_with('/') {
                    return Err(QueryError::invalid_locator(raw, "missing object key"));
                }
                Some(scheme)
            }
            None => {
                if !trimmed.starts_with('/') {
                    return Err(QueryError::invalid_locator(
                        raw,
                        "local paths must be absolute",
                    ));
                }
                if trimmed.ends_with('/') {
                    return Err(QueryError::invalid_locator(raw, "locator names a directory"));
                }
                None
            }
        };

        Ok(Self {
            raw: trimmed.to_string(),
            scheme,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn is_remote(&self) -> bool {
        self.scheme.is_some()
    }

    /// Table function reading this resource, picked from the file extension.
    pub fn table_function(&self) -> String {
        let lower = self.raw.to_ascii_lowercase();
        let reader = if lower.ends_with(".csv") || lower.ends_with(".csv.gz") {
            "read_csv_auto"
        } else {
            "read_parquet"
        };
        format!("{reader}({})", quote_literal(&self.raw))
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.raw)
    }
}

impl FromStr for ResourceLocator {
    type Err = QueryError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for ResourceLocator {
    type Error = QueryError;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<ResourceLocator> for String {
    fn from(value: ResourceLocator) -> Self {
        value.raw
    }
}
