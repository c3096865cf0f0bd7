//! WADO-RS image load orchestration.
//!
//! A load runs metadata lookup, media type selection, fetch and decode in
//! sequence and times the whole pipeline. Any stage failure ends the load with
//! that stage's error; nothing is retried and there is no timeout.

use std::future::IntoFuture;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::LoaderSettings;
use crate::decode::{DecodeOptions, ImageDecoder};
use crate::error::LoadError;
use crate::fetch::PixelDataFetcher;
use crate::media_type::{select_media_type, MediaSelection};
use crate::metadata::MetadataStore;
use crate::transfer_syntax::transfer_syntax_for_content_type;

/// Scheme prefix of WADO-RS image identifiers
pub const DEFAULT_SCHEME_PREFIX: &str = "wadors:";

/// A decoded image together with how long the load took
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage<I> {
    pub image: I,
    /// Milliseconds between the start of the load and decode completion
    pub load_time_in_ms: u64,
}

impl<I> LoadedImage<I> {
    pub fn into_image(self) -> I {
        self.image
    }
}

/// Loads images by identifier through the configured collaborators
pub struct WadoImageLoader<F, D> {
    store: Arc<dyn MetadataStore>,
    fetcher: Arc<F>,
    decoder: Arc<D>,
    clock: Arc<dyn Clock>,
    scheme_prefix: Arc<str>,
}

impl<F, D> Clone for WadoImageLoader<F, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            fetcher: Arc::clone(&self.fetcher),
            decoder: Arc::clone(&self.decoder),
            clock: Arc::clone(&self.clock),
            scheme_prefix: Arc::clone(&self.scheme_prefix),
        }
    }
}

impl<F, D> WadoImageLoader<F, D>
where
    F: PixelDataFetcher + 'static,
    D: ImageDecoder + 'static,
{
    pub fn new(store: Arc<dyn MetadataStore>, fetcher: Arc<F>, decoder: Arc<D>) -> Self {
        Self {
            store,
            fetcher,
            decoder,
            clock: Arc::new(SystemClock),
            scheme_prefix: Arc::from(DEFAULT_SCHEME_PREFIX),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_scheme_prefix(mut self, prefix: &str) -> Self {
        self.scheme_prefix = Arc::from(prefix);
        self
    }

    pub fn with_settings(self, settings: &LoaderSettings) -> Self {
        self.with_scheme_prefix(&settings.scheme_prefix)
    }

    /// Drop the scheme prefix from an image identifier.
    ///
    /// Only the prefix length matters; the leading characters are not checked.
    pub fn retrieval_uri<'a>(&self, image_id: &'a str) -> Result<&'a str, LoadError> {
        image_id
            .get(self.scheme_prefix.len()..)
            .ok_or_else(|| LoadError::InvalidImageId {
                image_id: image_id.to_string(),
                prefix: self.scheme_prefix.to_string(),
            })
    }

    /// Run the load pipeline on the current task
    pub async fn load_image(
        &self,
        image_id: &str,
        options: &DecodeOptions,
    ) -> Result<LoadedImage<D::Image>, LoadError> {
        let start = self.clock.now_ms();

        let metadata = self
            .store
            .get(image_id)
            .ok_or_else(|| LoadError::MetadataMissing(image_id.to_string()))?;
        let uri = self.retrieval_uri(image_id)?;

        let MediaSelection {
            media_type,
            transfer_syntax,
        } = select_media_type(&metadata);

        let result = self
            .fetcher
            .fetch(uri, image_id, media_type)
            .await
            .map_err(|e| {
                warn!("Fetch failed for {}: {}", image_id, e);
                LoadError::Fetch(e)
            })?;

        let transfer_syntax = match transfer_syntax {
            Some(uid) => uid,
            None => {
                let uid = transfer_syntax_for_content_type(result.content_type.as_deref());
                debug!(
                    "Transfer syntax for {} taken from content type {:?}: {}",
                    image_id, result.content_type, uid
                );
                uid
            }
        };

        let image = self
            .decoder
            .decode(image_id, result.image_frame.pixel_data, &transfer_syntax, options)
            .await
            .map_err(|e| {
                warn!("Decode failed for {}: {}", image_id, e);
                LoadError::Decode(e)
            })?;

        let elapsed = self.clock.now_ms().saturating_sub(start);
        let load_time_in_ms = u64::try_from(elapsed).unwrap_or(0);
        info!(
            "Loaded {} in {} ms (transfer syntax {})",
            image_id, load_time_in_ms, transfer_syntax
        );

        Ok(LoadedImage {
            image,
            load_time_in_ms,
        })
    }

    /// Start a load on the tokio runtime and return immediately.
    ///
    /// Must be called from within a runtime.
    pub fn load(&self, image_id: impl Into<String>, options: DecodeOptions) -> LoadHandle<D::Image> {
        let image_id = image_id.into();
        let cancel = CancellationToken::new();

        let loader = self.clone();
        let task_id = image_id.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Load of {} cancelled", task_id);
                    Err(LoadError::Cancelled(task_id.clone()))
                }
                result = loader.load_image(&task_id, &options) => result,
            }
        });

        LoadHandle {
            image_id,
            task,
            cancel,
        }
    }
}

/// Pending result of [`WadoImageLoader::load`].
///
/// Await the handle (or call [`LoadHandle::result`]) for the outcome.
/// Dropping it detaches the load without cancelling it.
#[derive(Debug)]
pub struct LoadHandle<I> {
    image_id: String,
    task: JoinHandle<Result<LoadedImage<I>, LoadError>>,
    cancel: CancellationToken,
}

impl<I> LoadHandle<I> {
    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    /// Abort the in-flight fetch or decode. A load that already finished
    /// keeps its result.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn result(self) -> Result<LoadedImage<I>, LoadError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(LoadError::Cancelled(self.image_id)),
            Err(e) => Err(LoadError::Aborted(e.to_string())),
        }
    }
}

impl<I: Send + 'static> IntoFuture for LoadHandle<I> {
    type Output = Result<LoadedImage<I>, LoadError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::RawFrameDecoder;
    use crate::error::FetchError;
    use crate::fetch::{ImageFrame, PixelDataResult};
    use crate::media_type::MediaType;
    use crate::metadata::{InMemoryMetadataStore, Metadata};
    use async_trait::async_trait;
    use bytes::Bytes;

    struct StaticFetcher;

    #[async_trait]
    impl PixelDataFetcher for StaticFetcher {
        async fn fetch(
            &self,
            _uri: &str,
            _image_id: &str,
            _media_type: MediaType,
        ) -> Result<PixelDataResult, FetchError> {
            Ok(PixelDataResult {
                content_type: None,
                image_frame: ImageFrame {
                    pixel_data: Bytes::from_static(&[7; 16]),
                },
            })
        }
    }

    fn loader() -> WadoImageLoader<StaticFetcher, RawFrameDecoder> {
        let store = InMemoryMetadataStore::new();
        store.add("wadors:http://pacs/frames/1", Metadata::default());
        WadoImageLoader::new(
            Arc::new(store),
            Arc::new(StaticFetcher),
            Arc::new(RawFrameDecoder::default()),
        )
    }

    #[test]
    fn strips_scheme_prefix() {
        let loader = loader();
        assert_eq!(
            loader.retrieval_uri("wadors:http://pacs/frames/1").unwrap(),
            "http://pacs/frames/1"
        );
        // fixed length, whatever the scheme
        assert_eq!(
            loader.retrieval_uri("wadouri:http://pacs").unwrap(),
            ":http://pacs"
        );
        assert_eq!(loader.retrieval_uri("wadors:").unwrap(), "");
        assert!(matches!(
            loader.retrieval_uri("wado"),
            Err(LoadError::InvalidImageId { .. })
        ));
    }

    #[test]
    fn custom_scheme_prefix() {
        let loader = loader().with_scheme_prefix("dicomweb:");
        assert_eq!(loader.retrieval_uri("dicomweb:http://x").unwrap(), "http://x");
    }

    #[tokio::test]
    async fn header_fallback_defaults_to_implicit_little_endian() {
        let loaded = loader()
            .load_image("wadors:http://pacs/frames/1", &DecodeOptions::default())
            .await
            .expect("loaded");
        assert_eq!(loaded.image.transfer_syntax, "1.2.840.10008.1.2");
        assert_eq!(loaded.image.size_in_bytes, 16);
    }

    #[tokio::test]
    async fn handle_is_awaitable() {
        let handle = loader().load("wadors:http://pacs/frames/1", DecodeOptions::default());
        assert_eq!(handle.image_id(), "wadors:http://pacs/frames/1");
        let loaded = handle.await.expect("loaded");
        assert_eq!(loaded.into_image().image_id, "wadors:http://pacs/frames/1");
    }
}
