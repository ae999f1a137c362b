//! The two ways the horn can make noise.
//!
//! `NativeBackend` drives a low-latency audio graph and plays a fresh source
//! node per session, looping inside a short window of the sample.
//! `FallbackBackend` drives one reusable media element. Which one an engine
//! gets is decided once, by [`select_backend`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures_util::task::{LocalSpawn, LocalSpawnExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::asset::{AssetFetcher, AudioAsset, AudioDecoder};
use super::error::PlaybackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// Asynchronous session progress reported back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    Ended,
    Failed(PlaybackError),
}

pub type SessionNotifier = Rc<dyn Fn(SessionId, SessionEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Native,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Sound is playing now.
    Sounding,
    /// Sound will begin once the asset is ready; a `Started` event follows.
    Pending,
}

/// Repeat boundaries inside the decoded sample, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopWindow {
    pub start: f64,
    pub end: f64,
}

impl Default for LoopWindow {
    fn default() -> Self {
        Self {
            start: 0.24,
            end: 0.34,
        }
    }
}

/// One playback source on the audio graph, already connected to the output.
pub trait SourceNode {
    fn set_loop(&self, looping: bool);
    fn set_loop_window(&self, window: LoopWindow);
    fn on_ended(&self, callback: Box<dyn FnMut()>);
    fn start(&self) -> Result<(), PlaybackError>;
    /// Silence the node immediately.
    fn halt(&self);
}

pub trait AudioGraph: AudioDecoder {
    type Source: SourceNode + 'static;

    /// Browsers suspend the graph until a user gesture resumes it.
    fn resume(&self);
    fn create_source(&self, buffer: &Self::Buffer) -> Result<Self::Source, PlaybackError>;
}

pub trait MediaElement {
    fn set_source(&self, url: &str);
    fn set_loop(&self, looping: bool);
    fn rewind(&self);
    fn play(&self) -> Result<(), PlaybackError>;
    fn pause(&self);
    fn on_ended(&self, callback: Box<dyn FnMut()>);
}

pub trait AudioBackend {
    fn mode(&self) -> BackendMode;
    /// Called once by the owning engine before the first `start`.
    fn bind(&mut self, notifier: SessionNotifier);
    /// Begin `session`, releasing whatever the previous session left playing.
    fn start(&mut self, session: SessionId, looping: bool) -> Result<StartOutcome, PlaybackError>;
    fn stop(&mut self);
}

fn detached_notifier() -> SessionNotifier {
    Rc::new(|_, _| {})
}

struct NativeState<S> {
    /// Bumped by every start and stop; a load continuation carrying an older
    /// value is discarded.
    generation: u64,
    current: Option<(SessionId, S)>,
    /// A stopped node playing out its tail.
    releasing: Option<S>,
}

impl<S: SourceNode> NativeState<S> {
    fn halt_all(&mut self) {
        if let Some((_, node)) = self.current.take() {
            node.halt();
        }
        if let Some(node) = self.releasing.take() {
            node.halt();
        }
    }
}

pub struct NativeBackend<G: AudioGraph> {
    graph: Rc<G>,
    asset: Rc<AudioAsset<G::Buffer>>,
    spawner: Rc<dyn LocalSpawn>,
    loop_window: LoopWindow,
    state: Rc<RefCell<NativeState<G::Source>>>,
    notifier: SessionNotifier,
}

impl<G: AudioGraph + 'static> NativeBackend<G> {
    /// Builds the backend and starts warming the asset right away.
    pub fn new(
        graph: G,
        fetcher: Rc<dyn AssetFetcher>,
        sound_url: &str,
        loop_window: LoopWindow,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        let graph = Rc::new(graph);
        let decoder: Rc<dyn AudioDecoder<Buffer = G::Buffer>> = graph.clone();
        let asset = Rc::new(AudioAsset::new(sound_url, fetcher, decoder));

        let warm = asset.load();
        if let Err(err) = spawner.spawn_local(async move {
            let _ = warm.await;
        }) {
            warn!("could not schedule horn preload: {err}");
        }

        Self {
            graph,
            asset,
            spawner,
            loop_window,
            state: Rc::new(RefCell::new(NativeState {
                generation: 0,
                current: None,
                releasing: None,
            })),
            notifier: detached_notifier(),
        }
    }
}

fn begin_node<G: AudioGraph>(
    graph: &G,
    buffer: &G::Buffer,
    session: SessionId,
    looping: bool,
    window: LoopWindow,
    notifier: SessionNotifier,
) -> Result<G::Source, PlaybackError> {
    let node = graph.create_source(buffer)?;
    node.on_ended(Box::new(move || notifier(session, SessionEvent::Ended)));
    node.set_loop(looping);
    if looping {
        node.set_loop_window(window);
    }
    node.start()?;
    Ok(node)
}

impl<G: AudioGraph + 'static> AudioBackend for NativeBackend<G> {
    fn mode(&self) -> BackendMode {
        BackendMode::Native
    }

    fn bind(&mut self, notifier: SessionNotifier) {
        self.notifier = notifier;
    }

    fn start(&mut self, session: SessionId, looping: bool) -> Result<StartOutcome, PlaybackError> {
        self.graph.resume();

        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.halt_all();
            state.generation
        };

        if let Some(buffer) = self.asset.buffer() {
            let node = begin_node(
                &*self.graph,
                &buffer,
                session,
                looping,
                self.loop_window,
                self.notifier.clone(),
            )?;
            self.state.borrow_mut().current = Some((session, node));
            return Ok(StartOutcome::Sounding);
        }

        let load = self.asset.load();
        let graph = self.graph.clone();
        let state = self.state.clone();
        let notifier = self.notifier.clone();
        let window = self.loop_window;
        self.spawner
            .spawn_local(async move {
                let loaded = load.await;
                if state.borrow().generation != generation {
                    debug!(session = session.0, "horn load finished after stop, discarding");
                    return;
                }
                let begun = loaded.map_err(PlaybackError::from).and_then(|buffer| {
                    begin_node(&*graph, &buffer, session, looping, window, notifier.clone())
                });
                match begun {
                    Ok(node) => {
                        state.borrow_mut().current = Some((session, node));
                        notifier(session, SessionEvent::Started);
                    }
                    Err(err) => notifier(session, SessionEvent::Failed(err)),
                }
            })
            .map_err(|err| PlaybackError::Graph(err.to_string()))?;

        Ok(StartOutcome::Pending)
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        if let Some((_, node)) = state.current.take() {
            // Let the current pass finish instead of cutting off mid-blast.
            node.set_loop(false);
            if let Some(previous) = state.releasing.replace(node) {
                previous.halt();
            }
        }
    }
}

pub struct FallbackBackend<M: MediaElement> {
    element: Rc<M>,
    current: Rc<Cell<Option<SessionId>>>,
}

impl<M: MediaElement + 'static> FallbackBackend<M> {
    pub fn new(element: M, sound_url: &str) -> Self {
        element.set_source(sound_url);
        Self {
            element: Rc::new(element),
            current: Rc::new(Cell::new(None)),
        }
    }
}

impl<M: MediaElement + 'static> AudioBackend for FallbackBackend<M> {
    fn mode(&self) -> BackendMode {
        BackendMode::Fallback
    }

    fn bind(&mut self, notifier: SessionNotifier) {
        let current = self.current.clone();
        self.element.on_ended(Box::new(move || {
            if let Some(session) = current.take() {
                notifier(session, SessionEvent::Ended);
            }
        }));
    }

    fn start(&mut self, session: SessionId, looping: bool) -> Result<StartOutcome, PlaybackError> {
        self.current.set(Some(session));
        self.element.set_loop(looping);
        self.element.rewind();
        if let Err(err) = self.element.play() {
            self.current.set(None);
            return Err(err);
        }
        Ok(StartOutcome::Sounding)
    }

    fn stop(&mut self) {
        self.current.set(None);
        self.element.set_loop(false);
        self.element.pause();
    }
}

/// Picks the backend for the lifetime of an engine: the audio graph when the
/// platform has one, otherwise a media element built on demand.
pub fn select_backend<G, M>(
    graph: Option<G>,
    element: impl FnOnce() -> M,
    fetcher: Rc<dyn AssetFetcher>,
    sound_url: &str,
    loop_window: LoopWindow,
    spawner: Rc<dyn LocalSpawn>,
) -> Box<dyn AudioBackend>
where
    G: AudioGraph + 'static,
    M: MediaElement + 'static,
{
    match graph {
        Some(graph) => Box::new(NativeBackend::new(
            graph,
            fetcher,
            sound_url,
            loop_window,
            spawner,
        )),
        None => {
            debug!("no audio graph available, using media element playback");
            Box::new(FallbackBackend::new(element(), sound_url))
        }
    }
}
