use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Orientation category derived from a video's display aspect ratio.
///
/// Used to namespace stored video objects (`landscape/…`, `portrait/…`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AspectClassification {
    Landscape,
    Portrait,
    Other,
}

impl AspectClassification {
    /// Maps a probed display aspect ratio. Only exact `16:9` and `9:16`
    /// are recognised; everything else, including an empty string, is `Other`.
    pub fn from_display_aspect_ratio(ratio: &str) -> Self {
        match ratio {
            "16:9" => AspectClassification::Landscape,
            "9:16" => AspectClassification::Portrait,
            _ => AspectClassification::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClassification::Landscape => "landscape",
            AspectClassification::Portrait => "portrait",
            AspectClassification::Other => "other",
        }
    }
}

impl Display for AspectClassification {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
