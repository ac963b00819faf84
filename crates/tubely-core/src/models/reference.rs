//! Stored media references
//!
//! A record never stores a signed URL. Remote objects are persisted as the
//! text `bucket,key` and turned back into a [`RemoteObject`] right after
//! loading; signed URLs are minted from it at read time.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("reference {0:?} is not in bucket,key format")]
    MissingSeparator(String),

    #[error("reference {0:?} has an empty bucket or key")]
    EmptyComponent(String),
}

/// A `(bucket, key)` pair addressing one object in an object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    pub bucket: String,
    pub key: String,
}

impl RemoteObject {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse the persisted `bucket,key` form. Only the first comma separates
    /// the bucket; keys may contain commas.
    pub fn parse(wire: &str) -> Result<Self, ReferenceError> {
        let (bucket, key) = wire
            .split_once(',')
            .ok_or_else(|| ReferenceError::MissingSeparator(wire.to_string()))?;

        if bucket.is_empty() || key.is_empty() {
            return Err(ReferenceError::EmptyComponent(wire.to_string()));
        }

        Ok(Self::new(bucket, key))
    }

    pub fn to_wire(&self) -> String {
        format!("{},{}", self.bucket, self.key)
    }
}

impl Display for RemoteObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

/// Where a record's media lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaReference {
    /// A file served by the static asset server; `url` is already public.
    LocalFile { url: String },
    /// An object store object; needs a signed URL to be read.
    RemoteObject(RemoteObject),
    /// Bytes kept on the record itself.
    Inline { data: Vec<u8>, media_type: String },
}

/// Whether `url` reads back as a [`MediaReference::LocalFile`]: an absolute
/// path or anything with a scheme. Base URLs for locally served files must
/// satisfy this or their references would be parsed as `bucket,key`.
pub fn is_local_url(url: &str) -> bool {
    url.starts_with('/') || url.contains("://")
}

impl MediaReference {
    /// Decode a persisted text reference.
    ///
    /// Absolute paths and URLs are local files; everything else must be a
    /// `bucket,key` pair. Inline references are not stored as text.
    pub fn from_wire(wire: &str) -> Result<Self, ReferenceError> {
        if is_local_url(wire) {
            return Ok(MediaReference::LocalFile {
                url: wire.to_string(),
            });
        }
        RemoteObject::parse(wire).map(MediaReference::RemoteObject)
    }

    /// Text form persisted in the record, `None` for inline data.
    pub fn to_wire(&self) -> Option<String> {
        match self {
            MediaReference::LocalFile { url } => Some(url.clone()),
            MediaReference::RemoteObject(object) => Some(object.to_wire()),
            MediaReference::Inline { .. } => None,
        }
    }

    pub fn as_remote(&self) -> Option<&RemoteObject> {
        match self {
            MediaReference::RemoteObject(object) => Some(object),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_comma() {
        let object = RemoteObject::parse("tubely-videos,landscape/a,b,c.mp4").unwrap();
        assert_eq!(object.bucket, "tubely-videos");
        assert_eq!(object.key, "landscape/a,b,c.mp4");
        assert_eq!(object.to_wire(), "tubely-videos,landscape/a,b,c.mp4");
    }

    #[test]
    fn test_parse_without_comma_is_malformed() {
        let err = RemoteObject::parse("landscape/abc.mp4").unwrap_err();
        assert!(matches!(err, ReferenceError::MissingSeparator(_)));
    }

    #[test]
    fn test_parse_empty_components() {
        assert!(matches!(
            RemoteObject::parse(",key.mp4"),
            Err(ReferenceError::EmptyComponent(_))
        ));
        assert!(matches!(
            RemoteObject::parse("bucket,"),
            Err(ReferenceError::EmptyComponent(_))
        ));
        assert!(RemoteObject::parse("").is_err());
    }

    #[test]
    fn test_from_wire_detects_local_urls() {
        let reference =
            MediaReference::from_wire("http://localhost:8091/assets/abc.png").unwrap();
        assert_eq!(
            reference,
            MediaReference::LocalFile {
                url: "http://localhost:8091/assets/abc.png".to_string()
            }
        );

        let reference = MediaReference::from_wire("/assets/abc.png").unwrap();
        assert!(matches!(reference, MediaReference::LocalFile { .. }));
    }

    #[test]
    fn test_scheme_less_host_is_not_local() {
        assert!(is_local_url("/assets"));
        assert!(is_local_url("https://cdn.example.com/assets"));
        assert!(!is_local_url("cdn.example.com/assets"));
        assert!(MediaReference::from_wire("cdn.example.com/assets/abc.png").is_err());
    }

    #[test]
    fn test_from_wire_remote_object() {
        let reference = MediaReference::from_wire("bucket,portrait/ff.mp4").unwrap();
        let remote = reference.as_remote().unwrap();
        assert_eq!(remote.bucket, "bucket");
        assert_eq!(remote.key, "portrait/ff.mp4");
    }

    #[test]
    fn test_inline_has_no_wire_form() {
        let reference = MediaReference::Inline {
            data: vec![1, 2, 3],
            media_type: "image/png".to_string(),
        };
        assert_eq!(reference.to_wire(), None);
    }
}
