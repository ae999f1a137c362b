use std::cell::RefCell;
use std::rc::Rc;

use futures_util::future::{FutureExt, LocalBoxFuture};
use futures_util::task::{LocalFutureObj, LocalSpawn, SpawnError};
use gloo_net::http::Request;
use tracing::warn;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioBufferSourceNode, AudioContext, HtmlAudioElement};

use super::describe_js;
use crate::horn::asset::{AssetFetcher, AudioDecoder};
use crate::horn::backend::{
    select_backend, AudioBackend, AudioGraph, LoopWindow, MediaElement, SourceNode,
};
use crate::horn::error::{LoadError, PlaybackError};
use crate::settings::HornSettings;

/// Runs spawned horn tasks on the page's microtask queue.
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

pub struct HttpFetcher;

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, LoadError>> {
        let url = url.to_string();
        async move {
            let response = Request::get(&url)
                .send()
                .await
                .map_err(|err| LoadError::Fetch {
                    url: url.clone(),
                    reason: err.to_string(),
                })?;
            if !response.ok() {
                return Err(LoadError::Status {
                    url,
                    status: response.status(),
                });
            }
            response.binary().await.map_err(|err| LoadError::Fetch {
                url,
                reason: err.to_string(),
            })
        }
        .boxed_local()
    }
}

pub struct WebAudioGraph {
    context: AudioContext,
}

impl WebAudioGraph {
    /// `None` when the browser has no Web Audio support.
    pub fn detect() -> Option<Self> {
        AudioContext::new().ok().map(|context| Self { context })
    }
}

impl AudioDecoder for WebAudioGraph {
    type Buffer = AudioBuffer;

    fn decode(&self, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<AudioBuffer, LoadError>> {
        let array = js_sys::Uint8Array::from(bytes.as_slice()).buffer();
        let decoding = self.context.decode_audio_data(&array);
        async move {
            let promise = decoding.map_err(|err| LoadError::Decode(describe_js(&err)))?;
            let decoded = JsFuture::from(promise)
                .await
                .map_err(|err| LoadError::Decode(describe_js(&err)))?;
            decoded
                .dyn_into::<AudioBuffer>()
                .map_err(|value| LoadError::Decode(describe_js(&value)))
        }
        .boxed_local()
    }
}

impl AudioGraph for WebAudioGraph {
    type Source = WebSourceNode;

    fn resume(&self) {
        if let Ok(promise) = self.context.resume() {
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    warn!("audio context did not resume: {}", describe_js(&err));
                }
            });
        }
    }

    fn create_source(&self, buffer: &AudioBuffer) -> Result<WebSourceNode, PlaybackError> {
        let graph_error = |err: wasm_bindgen::JsValue| PlaybackError::Graph(describe_js(&err));
        let node = self.context.create_buffer_source().map_err(graph_error)?;
        node.set_buffer(Some(buffer));
        node.connect_with_audio_node(&self.context.destination())
            .map_err(graph_error)?;
        Ok(WebSourceNode {
            node,
            ended: RefCell::new(None),
        })
    }
}

pub struct WebSourceNode {
    node: AudioBufferSourceNode,
    ended: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl SourceNode for WebSourceNode {
    fn set_loop(&self, looping: bool) {
        self.node.set_loop(looping);
    }

    fn set_loop_window(&self, window: LoopWindow) {
        self.node.set_loop_start(window.start);
        self.node.set_loop_end(window.end);
    }

    fn on_ended(&self, callback: Box<dyn FnMut()>) {
        let closure = Closure::wrap(callback);
        self.node
            .set_onended(Some(closure.as_ref().unchecked_ref()));
        self.ended.replace(Some(closure));
    }

    fn start(&self) -> Result<(), PlaybackError> {
        self.node
            .start()
            .map_err(|err| PlaybackError::Graph(describe_js(&err)))
    }

    fn halt(&self) {
        let _ = self.node.stop();
    }
}

impl Drop for WebSourceNode {
    fn drop(&mut self) {
        // The closure dies with us; the browser must not call it afterwards.
        self.node.set_onended(None);
    }
}

pub struct WebMediaElement {
    audio: HtmlAudioElement,
    ended: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl WebMediaElement {
    pub fn create() -> Option<Self> {
        let audio = HtmlAudioElement::new().ok()?;
        audio.set_preload("auto");
        Some(Self {
            audio,
            ended: RefCell::new(None),
        })
    }
}

impl MediaElement for WebMediaElement {
    fn set_source(&self, url: &str) {
        self.audio.set_src(url);
    }

    fn set_loop(&self, looping: bool) {
        self.audio.set_loop(looping);
    }

    fn rewind(&self) {
        self.audio.set_current_time(0.0);
    }

    fn play(&self) -> Result<(), PlaybackError> {
        let promise = self
            .audio
            .play()
            .map_err(|err| PlaybackError::Media(describe_js(&err)))?;
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                warn!("horn playback was blocked: {}", describe_js(&err));
            }
        });
        Ok(())
    }

    fn pause(&self) {
        let _ = self.audio.pause();
    }

    fn on_ended(&self, callback: Box<dyn FnMut()>) {
        let closure = Closure::wrap(callback);
        self.audio
            .set_onended(Some(closure.as_ref().unchecked_ref()));
        self.ended.replace(Some(closure));
    }
}

/// Fallback when even `<audio>` cannot be created: the horn stays silent.
struct SilentElement;

impl MediaElement for SilentElement {
    fn set_source(&self, _url: &str) {}
    fn set_loop(&self, _looping: bool) {}
    fn rewind(&self) {}
    fn play(&self) -> Result<(), PlaybackError> {
        Err(PlaybackError::Media("no audio element available".into()))
    }
    fn pause(&self) {}
    fn on_ended(&self, _callback: Box<dyn FnMut()>) {}
}

enum BrowserElement {
    Audio(WebMediaElement),
    Silent(SilentElement),
}

impl BrowserElement {
    fn media(&self) -> &dyn MediaElement {
        match self {
            BrowserElement::Audio(audio) => audio,
            BrowserElement::Silent(silent) => silent,
        }
    }
}

impl MediaElement for BrowserElement {
    fn set_source(&self, url: &str) {
        self.media().set_source(url)
    }
    fn set_loop(&self, looping: bool) {
        self.media().set_loop(looping)
    }
    fn rewind(&self) {
        self.media().rewind()
    }
    fn play(&self) -> Result<(), PlaybackError> {
        self.media().play()
    }
    fn pause(&self) {
        self.media().pause()
    }
    fn on_ended(&self, callback: Box<dyn FnMut()>) {
        self.media().on_ended(callback)
    }
}

pub fn select_browser_backend(settings: &HornSettings) -> Box<dyn AudioBackend> {
    select_backend(
        WebAudioGraph::detect(),
        || match WebMediaElement::create() {
            Some(audio) => BrowserElement::Audio(audio),
            None => {
                warn!("browser has neither Web Audio nor <audio>");
                BrowserElement::Silent(SilentElement)
            }
        },
        Rc::new(HttpFetcher),
        &settings.sound_url,
        settings.loop_window,
        Rc::new(BrowserSpawner),
    )
}
