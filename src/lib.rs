//! WADO-RS image frame loading.
//!
//! Resolves which media type to request for an image from its cached DICOM
//! JSON metadata, fetches the frame from the store, works out the frame's
//! transfer syntax and hands the bytes to a decoder, timing the whole load.
//!
//! Metadata, fetching and decoding sit behind the [`MetadataStore`],
//! [`PixelDataFetcher`] and [`ImageDecoder`] traits.

pub mod clock;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod logging;
pub mod media_type;
pub mod metadata;
pub mod transfer_syntax;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decode::{DecodeOptions, FrameImage, ImageDecoder, RawFrameDecoder};
pub use error::{DecodeError, FetchError, LoadError};
pub use fetch::{HttpPixelDataFetcher, ImageFrame, PixelDataFetcher, PixelDataResult};
pub use loader::{LoadHandle, LoadedImage, WadoImageLoader, DEFAULT_SCHEME_PREFIX};
pub use media_type::{select_media_type, MediaSelection, MediaType};
pub use metadata::{InMemoryMetadataStore, Metadata, MetadataStore};
pub use transfer_syntax::transfer_syntax_for_content_type;
