//! In-memory stand-ins for the browser pieces the horn talks to.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures_util::future::{self, FutureExt, LocalBoxFuture};

use super::ambient::LightSensor;
use super::analytics::{AnalyticsEvent, AnalyticsSink};
use super::asset::{AssetFetcher, AudioDecoder};
use super::backend::{AudioGraph, LoopWindow, MediaElement, SourceNode};
use super::error::{InstallError, LoadError, PlaybackError, SensorError};
use super::install::{InstallOutcome, InstallPromptEvent};

type Callback = Rc<RefCell<Option<Box<dyn FnMut()>>>>;

fn fire(callback: &Callback) {
    let taken = callback.borrow_mut().take();
    if let Some(mut cb) = taken {
        cb();
        let mut slot = callback.borrow_mut();
        if slot.is_none() {
            *slot = Some(cb);
        }
    }
}

/// Fetcher whose responses are released by the test.
#[derive(Default)]
pub struct GatedFetcher {
    ready: Option<Vec<u8>>,
    calls: Cell<usize>,
    waiting: RefCell<Vec<oneshot::Sender<Result<Vec<u8>, LoadError>>>>,
}

impl GatedFetcher {
    pub fn ready(bytes: Vec<u8>) -> Self {
        Self {
            ready: Some(bytes),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn complete(&self, result: Result<Vec<u8>, LoadError>) {
        for tx in self.waiting.borrow_mut().drain(..) {
            let _ = tx.send(result.clone());
        }
    }

    pub fn fail(&self, reason: &str) {
        self.complete(Err(LoadError::Fetch {
            url: "/sounds/airhorn.mp3".into(),
            reason: reason.into(),
        }));
    }
}

impl AssetFetcher for GatedFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, LoadError>> {
        self.calls.set(self.calls.get() + 1);
        if let Some(bytes) = &self.ready {
            return future::ready(Ok(bytes.clone())).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        self.waiting.borrow_mut().push(tx);
        let url = url.to_string();
        rx.map(move |received| {
            received.unwrap_or_else(|_| {
                Err(LoadError::Fetch {
                    url,
                    reason: "gate dropped".into(),
                })
            })
        })
        .boxed_local()
    }
}

#[derive(Default)]
pub struct FakeDecoder {
    failure: Option<String>,
    calls: Cell<usize>,
}

impl FakeDecoder {
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl AudioDecoder for FakeDecoder {
    type Buffer = Rc<Vec<u8>>;

    fn decode(&self, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<Self::Buffer, LoadError>> {
        self.calls.set(self.calls.get() + 1);
        let result = match &self.failure {
            Some(reason) => Err(LoadError::Decode(reason.clone())),
            None => Ok(Rc::new(bytes)),
        };
        future::ready(result).boxed_local()
    }
}

#[derive(Default)]
struct NodeState {
    looping: bool,
    window: Option<LoopWindow>,
    started: bool,
    halted: bool,
    ended: bool,
}

#[derive(Clone, Default)]
pub struct FakeSource {
    state: Rc<RefCell<NodeState>>,
    ended: Callback,
}

impl FakeSource {
    pub fn looping(&self) -> bool {
        self.state.borrow().looping
    }

    pub fn loop_window(&self) -> Option<LoopWindow> {
        self.state.borrow().window
    }

    pub fn is_sounding(&self) -> bool {
        let state = self.state.borrow();
        state.started && !state.halted && !state.ended
    }

    /// Simulates the node reaching the end of its buffer.
    pub fn fire_ended(&self) {
        self.state.borrow_mut().ended = true;
        fire(&self.ended);
    }
}

impl SourceNode for FakeSource {
    fn set_loop(&self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }

    fn set_loop_window(&self, window: LoopWindow) {
        self.state.borrow_mut().window = Some(window);
    }

    fn on_ended(&self, callback: Box<dyn FnMut()>) {
        *self.ended.borrow_mut() = Some(callback);
    }

    fn start(&self) -> Result<(), PlaybackError> {
        self.state.borrow_mut().started = true;
        Ok(())
    }

    fn halt(&self) {
        self.state.borrow_mut().halted = true;
    }
}

#[derive(Default)]
struct GraphState {
    resumes: usize,
    nodes: Vec<FakeSource>,
}

#[derive(Clone, Default)]
pub struct GraphMonitor(Rc<RefCell<GraphState>>);

impl GraphMonitor {
    pub fn resumes(&self) -> usize {
        self.0.borrow().resumes
    }

    pub fn created(&self) -> usize {
        self.0.borrow().nodes.len()
    }

    pub fn sounding(&self) -> usize {
        self.0.borrow().nodes.iter().filter(|n| n.is_sounding()).count()
    }

    pub fn node(&self, index: usize) -> FakeSource {
        self.0.borrow().nodes[index].clone()
    }
}

#[derive(Default)]
pub struct FakeGraph {
    monitor: GraphMonitor,
}

impl FakeGraph {
    pub fn monitor(&self) -> GraphMonitor {
        self.monitor.clone()
    }
}

impl AudioDecoder for FakeGraph {
    type Buffer = Rc<Vec<u8>>;

    fn decode(&self, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<Self::Buffer, LoadError>> {
        future::ready(Ok(Rc::new(bytes))).boxed_local()
    }
}

impl AudioGraph for FakeGraph {
    type Source = FakeSource;

    fn resume(&self) {
        self.monitor.0.borrow_mut().resumes += 1;
    }

    fn create_source(&self, _buffer: &Self::Buffer) -> Result<FakeSource, PlaybackError> {
        let node = FakeSource::default();
        self.monitor.0.borrow_mut().nodes.push(node.clone());
        Ok(node)
    }
}

#[derive(Default)]
struct MediaState {
    source: Option<String>,
    sources_assigned: usize,
    looping: bool,
    rewinds: usize,
    playing: bool,
    refuse: Option<String>,
}

#[derive(Clone, Default)]
pub struct MediaMonitor {
    state: Rc<RefCell<MediaState>>,
    ended: Callback,
}

impl MediaMonitor {
    pub fn source(&self) -> Option<String> {
        self.state.borrow().source.clone()
    }

    pub fn sources_assigned(&self) -> usize {
        self.state.borrow().sources_assigned
    }

    pub fn looping(&self) -> bool {
        self.state.borrow().looping
    }

    pub fn rewinds(&self) -> usize {
        self.state.borrow().rewinds
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn refuse_play(&self, reason: &str) {
        self.state.borrow_mut().refuse = Some(reason.into());
    }

    pub fn fire_ended(&self) {
        self.state.borrow_mut().playing = false;
        fire(&self.ended);
    }
}

#[derive(Default)]
pub struct FakeMedia {
    monitor: MediaMonitor,
}

impl FakeMedia {
    pub fn monitor(&self) -> MediaMonitor {
        self.monitor.clone()
    }
}

impl MediaElement for FakeMedia {
    fn set_source(&self, url: &str) {
        let mut state = self.monitor.state.borrow_mut();
        state.source = Some(url.into());
        state.sources_assigned += 1;
    }

    fn set_loop(&self, looping: bool) {
        self.monitor.state.borrow_mut().looping = looping;
    }

    fn rewind(&self) {
        self.monitor.state.borrow_mut().rewinds += 1;
    }

    fn play(&self) -> Result<(), PlaybackError> {
        let mut state = self.monitor.state.borrow_mut();
        if let Some(reason) = &state.refuse {
            return Err(PlaybackError::Media(reason.clone()));
        }
        state.playing = true;
        Ok(())
    }

    fn pause(&self) {
        self.monitor.state.borrow_mut().playing = false;
    }

    fn on_ended(&self, callback: Box<dyn FnMut()>) {
        *self.monitor.ended.borrow_mut() = Some(callback);
    }
}

#[derive(Default)]
struct SensorState {
    running: bool,
    starts: usize,
    refuse: Option<String>,
    reading: Option<Box<dyn FnMut(f64)>>,
}

#[derive(Clone, Default)]
pub struct FakeSensor(Rc<RefCell<SensorState>>);

impl FakeSensor {
    pub fn refusing(reason: &str) -> Self {
        let sensor = Self::default();
        sensor.0.borrow_mut().refuse = Some(reason.into());
        sensor
    }

    pub fn is_running(&self) -> bool {
        self.0.borrow().running
    }

    pub fn starts(&self) -> usize {
        self.0.borrow().starts
    }

    /// Delivers a reading if the sensor is running.
    pub fn read(&self, illuminance: f64) {
        let taken = {
            let mut state = self.0.borrow_mut();
            if !state.running {
                return;
            }
            state.reading.take()
        };
        if let Some(mut callback) = taken {
            callback(illuminance);
            let mut state = self.0.borrow_mut();
            if state.running && state.reading.is_none() {
                state.reading = Some(callback);
            }
        }
    }
}

impl LightSensor for FakeSensor {
    fn start(&self, on_reading: Box<dyn FnMut(f64)>) -> Result<(), SensorError> {
        let mut state = self.0.borrow_mut();
        state.starts += 1;
        if let Some(reason) = &state.refuse {
            return Err(SensorError::Start(reason.clone()));
        }
        state.running = true;
        state.reading = Some(on_reading);
        Ok(())
    }

    fn stop(&self) {
        let mut state = self.0.borrow_mut();
        state.running = false;
        state.reading = None;
    }
}

#[derive(Clone, Default)]
pub struct RecordingAnalytics(Rc<RefCell<Vec<AnalyticsEvent>>>);

impl RecordingAnalytics {
    pub fn actions(&self, category: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.action.clone())
            .collect()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn send(&self, event: AnalyticsEvent) {
        self.0.borrow_mut().push(event);
    }
}

#[derive(Default)]
struct InstallEventState {
    default_prevented: bool,
    prompts: usize,
    pending: Vec<oneshot::Sender<Result<InstallOutcome, InstallError>>>,
}

/// A captured install event whose user choice is decided by the test.
#[derive(Clone, Default)]
pub struct FakeInstallEvent(Rc<RefCell<InstallEventState>>);

impl FakeInstallEvent {
    pub fn default_prevented(&self) -> bool {
        self.0.borrow().default_prevented
    }

    pub fn prompts(&self) -> usize {
        self.0.borrow().prompts
    }

    pub fn choose(&self, result: Result<InstallOutcome, InstallError>) {
        for tx in self.0.borrow_mut().pending.drain(..) {
            let _ = tx.send(result.clone());
        }
    }
}

impl InstallPromptEvent for FakeInstallEvent {
    fn prevent_default(&self) {
        self.0.borrow_mut().default_prevented = true;
    }

    fn prompt(&self) -> LocalBoxFuture<'static, Result<InstallOutcome, InstallError>> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.0.borrow_mut();
        state.prompts += 1;
        state.pending.push(tx);
        rx.map(|choice| {
            choice.unwrap_or_else(|_| Err(InstallError::Rejected("prompt abandoned".into())))
        })
        .boxed_local()
    }
}
