//! The horn sound: fetched and decoded once, then shared by every session.

use std::cell::RefCell;
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture, Shared};
use tracing::{debug, warn};

use super::error::LoadError;

/// Retrieves the raw bytes of an asset.
pub trait AssetFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, LoadError>>;
}

/// Turns encoded bytes into whatever the playback graph plays from.
pub trait AudioDecoder {
    type Buffer: Clone + 'static;

    fn decode(&self, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<Self::Buffer, LoadError>>;
}

pub type SharedLoad<B> = Shared<LocalBoxFuture<'static, Result<B, LoadError>>>;

pub struct AudioAsset<B: Clone + 'static> {
    url: String,
    fetcher: Rc<dyn AssetFetcher>,
    decoder: Rc<dyn AudioDecoder<Buffer = B>>,
    load: RefCell<Option<SharedLoad<B>>>,
}

impl<B: Clone + 'static> AudioAsset<B> {
    pub fn new(
        url: impl Into<String>,
        fetcher: Rc<dyn AssetFetcher>,
        decoder: Rc<dyn AudioDecoder<Buffer = B>>,
    ) -> Self {
        Self {
            url: url.into(),
            fetcher,
            decoder,
            load: RefCell::new(None),
        }
    }

    /// Returns the one load of this asset. The first call creates it; every
    /// later call gets a handle to the same in-flight or finished result, so
    /// a failure is never retried.
    pub fn load(&self) -> SharedLoad<B> {
        self.load
            .borrow_mut()
            .get_or_insert_with(|| {
                let url = self.url.clone();
                let fetch = self.fetcher.fetch(&url);
                let decoder = self.decoder.clone();
                async move {
                    let bytes = fetch.await.inspect_err(|err| warn!("{err}"))?;
                    debug!(url = %url, bytes = bytes.len(), "horn asset fetched");
                    decoder
                        .decode(bytes)
                        .await
                        .inspect_err(|err| warn!(url = %url, "{err}"))
                }
                .boxed_local()
                .shared()
            })
            .clone()
    }

    /// The decoded buffer, once the load has completed successfully.
    pub fn buffer(&self) -> Option<B> {
        let load = self.load.borrow();
        load.as_ref()?.peek()?.as_ref().ok().cloned()
    }
}
