//! File reference resolution.
//!
//! The marketplace stores CAD uploads in different shapes depending on
//! which screen saved them: a bare bucket key (`u1/123.dwg`), a prefixed
//! API path (`/storage/v1/object/public/project-files/u1/123.dwg`), or a
//! full public URL. All of them resolve to the same bucket-relative key.

use std::fmt;

use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::error::ConversionError;

/// Filename used for the upload when the key has no final segment.
const FALLBACK_FILE_NAME: &str = "file.dwg";

/// A bucket-relative object key. Never carries a scheme, host, or bucket
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalStoragePath(String);

impl CanonicalStoragePath {
    /// Borrow the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last `/`-separated segment, used as the upload filename.
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILE_NAME)
    }
}

impl fmt::Display for CanonicalStoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed source file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReference {
    /// An `http(s)` URL addressing a public object of the bucket.
    PublicUrl {
        /// The URL as received.
        url: String,
        /// Key extracted from the URL path.
        key: CanonicalStoragePath,
    },
    /// A path that embeds the public-object prefix without a scheme.
    StoragePath {
        /// Key following the prefix.
        key: CanonicalStoragePath,
    },
    /// Already a bucket key; used unchanged.
    BarePath(CanonicalStoragePath),
}

impl FileReference {
    /// Classify `raw` against `marker` (`/object/public/{bucket}/`).
    ///
    /// First match wins: a reference containing the marker yields the text
    /// after its first occurrence; an `http(s)` reference without it must
    /// carry the marker in its parsed path; anything else is a bare key.
    /// Keys taken from URLs are percent-decoded.
    pub fn parse(raw: &str, marker: &str) -> Result<Self, ConversionError> {
        let unrecognized = || ConversionError::UnrecognizedFileReference {
            reference: raw.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(unrecognized());
        }

        let is_url = has_http_scheme(trimmed);

        if let Some((_, suffix)) = trimmed.split_once(marker) {
            let suffix = if is_url {
                strip_query_and_fragment(suffix)
            } else {
                suffix
            };
            let key = if is_url {
                decoded_key(suffix)
            } else {
                non_empty_key(suffix)
            }
            .ok_or_else(unrecognized)?;
            return Ok(if is_url {
                Self::PublicUrl {
                    url: trimmed.to_string(),
                    key,
                }
            } else {
                Self::StoragePath { key }
            });
        }

        if is_url {
            let url = Url::parse(trimmed).map_err(|_| unrecognized())?;
            let key = url
                .path()
                .split_once(marker)
                .and_then(|(_, suffix)| decoded_key(suffix))
                .ok_or_else(unrecognized)?;
            return Ok(Self::PublicUrl {
                url: trimmed.to_string(),
                key,
            });
        }

        Ok(Self::BarePath(CanonicalStoragePath(raw.to_string())))
    }

    /// The resolved bucket-relative key.
    pub fn storage_path(&self) -> &CanonicalStoragePath {
        match self {
            Self::PublicUrl { key, .. } | Self::StoragePath { key } | Self::BarePath(key) => key,
        }
    }

    /// Consume the reference, keeping only the key.
    pub fn into_storage_path(self) -> CanonicalStoragePath {
        match self {
            Self::PublicUrl { key, .. } | Self::StoragePath { key } | Self::BarePath(key) => key,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PublicUrl { .. } => "public_url",
            Self::StoragePath { .. } => "storage_path",
            Self::BarePath(_) => "bare_path",
        }
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn strip_query_and_fragment(s: &str) -> &str {
    s.split(['?', '#']).next().unwrap_or(s)
}

fn non_empty_key(suffix: &str) -> Option<CanonicalStoragePath> {
    let key = suffix.trim_start_matches('/');
    (!key.is_empty()).then(|| CanonicalStoragePath(key.to_string()))
}

fn decoded_key(suffix: &str) -> Option<CanonicalStoragePath> {
    let decoded = percent_decode_str(suffix).decode_utf8().ok()?;
    non_empty_key(&decoded)
}
