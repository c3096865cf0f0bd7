//! Choice of the WADO-RS request media type from instance metadata

use std::fmt;

use tracing::debug;

use crate::metadata::Metadata;
use crate::transfer_syntax as ts;

/// Media types requested from the store for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jp2,
    Jpeg,
    OctetStream,
}

impl MediaType {
    /// Value sent in the `Accept` header
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jp2 => r#"multipart/related; type="image/jp2""#,
            MediaType::Jpeg => r#"multipart/related; type="image/jpeg""#,
            MediaType::OctetStream => r#"multipart/related; type="application/octet-stream""#,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered transfer syntax to media type table; first match wins.
/// Anything not listed is requested as `application/octet-stream`.
pub const MEDIA_TYPE_TABLE: &[(&str, MediaType)] = &[
    (ts::JPEG_2000_LOSSLESS, MediaType::Jp2),
    (ts::JPEG_2000, MediaType::Jp2),
    (ts::JPEG_BASELINE, MediaType::Jpeg),
    (ts::JPEG_EXTENDED, MediaType::Jpeg),
    (ts::JPEG_LOSSLESS, MediaType::Jpeg),
    (ts::JPEG_LS_LOSSLESS, MediaType::Jpeg),
    (ts::JPEG_LS_NEAR_LOSSLESS, MediaType::Jpeg),
];

/// Outcome of media type selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSelection {
    pub media_type: MediaType,
    /// Transfer syntax known from metadata. `None` means it has to be read
    /// from the response `Content-Type`.
    pub transfer_syntax: Option<String>,
}

/// Pick the media type to request for an image
pub fn select_media_type(metadata: &Metadata) -> MediaSelection {
    let uid = metadata.transfer_syntax_uid();

    let selection = uid
        .and_then(|uid| {
            MEDIA_TYPE_TABLE
                .iter()
                .find(|(known, _)| *known == uid)
                .map(|(known, media_type)| MediaSelection {
                    media_type: *media_type,
                    transfer_syntax: Some((*known).to_string()),
                })
        })
        .unwrap_or(MediaSelection {
            media_type: MediaType::OctetStream,
            transfer_syntax: None,
        });

    debug!(
        "Metadata transfer syntax {:?} -> requesting {}",
        uid, selection.media_type
    );
    selection
}
