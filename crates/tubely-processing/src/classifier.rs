//! Media Classifier
//!
//! Two pure functions: one turns a declared content type into a file
//! extension, the other turns an ffprobe JSON report into an orientation.

use crate::error::{ProcessingError, ProcessingResult};
use crate::toolchain::MediaToolchain;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tubely_core::models::AspectClassification;

/// Top-level media kind an upload endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_token(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
}

/// Classify a declared content type and return the extension to store it under.
///
/// Parameters after `;` are ignored. The remainder must be exactly one
/// `kind/subtype` pair; the subtype becomes the extension, so it is limited
/// to characters that are safe inside an object key.
pub fn classify_media_type(
    declared_content_type: &str,
    expected_kind: MediaKind,
) -> ProcessingResult<String> {
    let essence = declared_content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let mut parts = essence.split('/');
    let (kind, subtype) = match (parts.next(), parts.next(), parts.next()) {
        (Some(kind), Some(subtype), None) if is_token(kind) && is_token(subtype) => {
            (kind, subtype)
        }
        _ => {
            return Err(ProcessingError::InvalidMediaType(
                declared_content_type.to_string(),
            ))
        }
    };

    if subtype.starts_with('.') || subtype.ends_with('.') {
        return Err(ProcessingError::InvalidMediaType(
            declared_content_type.to_string(),
        ));
    }

    if kind != expected_kind.as_str() {
        return Err(ProcessingError::WrongMediaKind {
            expected: expected_kind.to_string(),
            actual: kind.to_string(),
        });
    }

    Ok(subtype.to_string())
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    display_aspect_ratio: Option<String>,
}

/// Classify the first stream of an ffprobe JSON report by display aspect ratio.
///
/// An unknown or missing ratio is `Other`. A report without streams is an
/// error because there is nothing to classify.
pub fn classify_aspect_ratio(probe_output: &[u8]) -> ProcessingResult<AspectClassification> {
    let report: ProbeReport = serde_json::from_slice(probe_output)
        .map_err(|e| ProcessingError::MalformedProbeOutput(e.to_string()))?;

    let first = report
        .streams
        .first()
        .ok_or(ProcessingError::NoStreamsFound)?;

    Ok(AspectClassification::from_display_aspect_ratio(
        first.display_aspect_ratio.as_deref().unwrap_or_default(),
    ))
}

/// Probe a file with the toolchain and classify its orientation.
#[tracing::instrument(skip(toolchain, path), fields(path = %path.display()))]
pub async fn probe_orientation(
    toolchain: &dyn MediaToolchain,
    path: &Path,
) -> ProcessingResult<AspectClassification> {
    let report = toolchain.probe(path).await?;
    let orientation = classify_aspect_ratio(&report)?;
    tracing::debug!(orientation = %orientation, "Classified video orientation");
    Ok(orientation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_subtypes_become_extensions() {
        for subtype in ["png", "jpeg", "webp", "svg+xml", "vnd.microsoft.icon"] {
            let content_type = format!("image/{}", subtype);
            assert_eq!(
                classify_media_type(&content_type, MediaKind::Image).unwrap(),
                subtype
            );
        }
    }

    #[test]
    fn test_parameters_and_case_are_normalized() {
        assert_eq!(
            classify_media_type("video/MP4; codecs=\"avc1\"", MediaKind::Video).unwrap(),
            "mp4"
        );
        assert_eq!(
            classify_media_type("  image/png ", MediaKind::Image).unwrap(),
            "png"
        );
    }

    #[test]
    fn test_malformed_types_are_invalid() {
        for content_type in [
            "",
            "png",
            "image/",
            "/png",
            "image/png/extra",
            "image//png",
            "image/../../etc",
            "image/png\\x",
            "image/.hidden",
        ] {
            let err = classify_media_type(content_type, MediaKind::Image).unwrap_err();
            assert!(
                matches!(err, ProcessingError::InvalidMediaType(_)),
                "{:?} gave {:?}",
                content_type,
                err
            );
        }
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let err = classify_media_type("application/pdf", MediaKind::Image).unwrap_err();
        match err {
            ProcessingError::WrongMediaKind { expected, actual } => {
                assert_eq!(expected, "image");
                assert_eq!(actual, "application");
            }
            other => panic!("Expected WrongMediaKind, got {:?}", other),
        }

        let err = classify_media_type("image/png", MediaKind::Video).unwrap_err();
        assert!(matches!(err, ProcessingError::WrongMediaKind { .. }));
    }

    fn report(ratio: &str) -> Vec<u8> {
        format!(
            r#"{{"streams":[{{"index":0,"display_aspect_ratio":"{}"}},{{"index":1}}]}}"#,
            ratio
        )
        .into_bytes()
    }

    #[test]
    fn test_aspect_ratio_mapping() {
        let cases = [
            ("16:9", AspectClassification::Landscape),
            ("9:16", AspectClassification::Portrait),
            ("4:3", AspectClassification::Other),
            ("", AspectClassification::Other),
            ("sixteen by nine", AspectClassification::Other),
        ];
        for (ratio, expected) in cases {
            assert_eq!(classify_aspect_ratio(&report(ratio)).unwrap(), expected);
        }
    }

    #[test]
    fn test_only_first_stream_counts() {
        let output = br#"{"streams":[{"codec_type":"audio"},{"display_aspect_ratio":"16:9"}]}"#;
        assert_eq!(
            classify_aspect_ratio(output).unwrap(),
            AspectClassification::Other
        );
    }

    #[test]
    fn test_zero_streams_is_an_error() {
        for output in [&br#"{"streams":[]}"#[..], &br#"{}"#[..]] {
            let err = classify_aspect_ratio(output).unwrap_err();
            assert!(matches!(err, ProcessingError::NoStreamsFound));
        }
    }

    #[test]
    fn test_unparseable_report() {
        let err = classify_aspect_ratio(b"not json").unwrap_err();
        assert!(matches!(err, ProcessingError::MalformedProbeOutput(_)));
    }
}
