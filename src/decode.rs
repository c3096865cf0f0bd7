//! Turning fetched frame bytes into an image

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::transfer_syntax as ts;

/// Options handed through to the decoder untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodeOptions(pub Map<String, Value>);

impl DecodeOptions {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Builds an image from one frame of pixel data
#[async_trait]
pub trait ImageDecoder: Send + Sync {
    type Image: Send + 'static;

    async fn decode(
        &self,
        image_id: &str,
        pixel_data: Bytes,
        transfer_syntax: &str,
        options: &DecodeOptions,
    ) -> Result<Self::Image, DecodeError>;
}

/// Frame as delivered by the store, tagged with its transfer syntax
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameImage {
    pub image_id: String,
    pub transfer_syntax: String,
    pub compressed: bool,
    #[serde(skip)]
    pub pixel_data: Bytes,
    pub size_in_bytes: usize,
    pub options: DecodeOptions,
}

/// Decoder that keeps the frame bytes as they arrived.
///
/// No codec runs here; consumers needing rendered pixels decode
/// `FrameImage::pixel_data` according to `transfer_syntax`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFrameDecoder {
    /// Reject transfer syntaxes not listed in the known table
    pub known_only: bool,
}

#[async_trait]
impl ImageDecoder for RawFrameDecoder {
    type Image = FrameImage;

    async fn decode(
        &self,
        image_id: &str,
        pixel_data: Bytes,
        transfer_syntax: &str,
        options: &DecodeOptions,
    ) -> Result<FrameImage, DecodeError> {
        if pixel_data.is_empty() {
            return Err(DecodeError::EmptyFrame(image_id.to_string()));
        }
        if self.known_only && ts::lookup(transfer_syntax).is_none() {
            return Err(DecodeError::UnsupportedTransferSyntax(transfer_syntax.to_string()));
        }

        Ok(FrameImage {
            image_id: image_id.to_string(),
            transfer_syntax: transfer_syntax.to_string(),
            compressed: ts::is_compressed(transfer_syntax),
            size_in_bytes: pixel_data.len(),
            pixel_data,
            options: options.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn raw_frame_keeps_bytes_and_syntax() {
        let options: DecodeOptions = serde_json::from_value(json!({ "useRGBA": true })).unwrap();
        let image = RawFrameDecoder::default()
            .decode(
                "wadors:x",
                Bytes::from_static(&[0, 1, 2]),
                ts::JPEG_BASELINE,
                &options,
            )
            .await
            .expect("decoded");

        assert_eq!(image.size_in_bytes, 3);
        assert!(image.compressed);
        assert!(image.options.flag("useRGBA"));
        assert_eq!(image.transfer_syntax, ts::JPEG_BASELINE);
    }

    #[tokio::test]
    async fn empty_frame_is_rejected() {
        let err = RawFrameDecoder::default()
            .decode("wadors:x", Bytes::new(), "1.2.840.10008.1.2", &DecodeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::EmptyFrame(_)));
    }

    #[tokio::test]
    async fn unknown_syntax_rejected_when_restricted() {
        let decoder = RawFrameDecoder { known_only: true };
        let err = decoder
            .decode("wadors:x", Bytes::from_static(&[1]), "1.2.3", &DecodeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedTransferSyntax(ref uid) if uid == "1.2.3"));
    }
}
