//! "Add to home screen" negotiation.
//!
//! The browser offers installation at most once per page, through an event
//! that has to be intercepted before it shows its own UI. The negotiator
//! keeps that event as a single-use capability and lets the page ask, at any
//! time, whether (and when) it may offer install itself.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures_util::future::{self, FutureExt, LocalBoxFuture};
use tracing::{debug, info, warn};

use super::analytics::{AnalyticsEvent, AnalyticsSink};
use super::error::InstallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
}

impl InstallOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallOutcome::Accepted => "accepted",
            InstallOutcome::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The deferred platform install event.
pub trait InstallPromptEvent {
    /// Keeps the browser from showing its own install affordance.
    fn prevent_default(&self);
    /// Shows the choice UI and resolves with what the user picked.
    fn prompt(&self) -> LocalBoxFuture<'static, Result<InstallOutcome, InstallError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    NotOfferable,
    Offerable,
}

struct NegotiatorState {
    offered: bool,
    deferred: Option<Box<dyn InstallPromptEvent>>,
    waiters: Vec<Waker>,
}

#[derive(Clone)]
pub struct InstallNegotiator {
    state: Rc<RefCell<NegotiatorState>>,
    analytics: Rc<dyn AnalyticsSink>,
}

impl InstallNegotiator {
    pub fn new(analytics: Rc<dyn AnalyticsSink>) -> Self {
        Self {
            state: Rc::new(RefCell::new(NegotiatorState {
                offered: false,
                deferred: None,
                waiters: Vec::new(),
            })),
            analytics,
        }
    }

    pub fn state(&self) -> InstallState {
        if self.state.borrow().offered {
            InstallState::Offerable
        } else {
            InstallState::NotOfferable
        }
    }

    pub fn is_available(&self) -> bool {
        self.state() == InstallState::Offerable
    }

    /// Intercepts the platform's install signal. Only the first one counts.
    pub fn capture(&self, event: Box<dyn InstallPromptEvent>) {
        event.prevent_default();
        let waiters = {
            let mut state = self.state.borrow_mut();
            if state.offered {
                debug!("ignoring repeated install offer");
                return;
            }
            state.offered = true;
            state.deferred = Some(event);
            std::mem::take(&mut state.waiters)
        };
        info!("install prompt available");
        self.analytics.send(AnalyticsEvent::new("install", "prompted"));
        for waker in waiters {
            waker.wake();
        }
    }

    /// Resolves once the page may offer install; immediately if it already can.
    pub fn can_prompt(&self) -> CanPrompt {
        CanPrompt {
            state: self.state.clone(),
        }
    }

    /// Shows the captured install prompt. The capability is spent by the
    /// first call; later calls fail with [`InstallError::AlreadyPrompted`].
    pub fn prompt(&self) -> LocalBoxFuture<'static, Result<InstallOutcome, InstallError>> {
        let taken = {
            let mut state = self.state.borrow_mut();
            if !state.offered {
                Err(InstallError::NotOfferable)
            } else {
                state.deferred.take().ok_or(InstallError::AlreadyPrompted)
            }
        };
        let analytics = self.analytics.clone();
        let event = match taken {
            Ok(event) => event,
            Err(err) => {
                warn!("{err}");
                analytics.send(AnalyticsEvent::new("install", "errored"));
                return future::ready(Err(err)).boxed_local();
            }
        };

        let choice = event.prompt();
        async move {
            let result = choice.await;
            match &result {
                Ok(outcome) => {
                    info!(%outcome, "install prompt answered");
                    analytics.send(AnalyticsEvent::new("install", outcome.as_str()));
                }
                Err(err) => {
                    warn!("{err}");
                    analytics.send(AnalyticsEvent::new("install", "errored"));
                }
            }
            // Keep the platform event alive until the choice settles.
            drop(event);
            result
        }
        .boxed_local()
    }
}

/// Future returned by [`InstallNegotiator::can_prompt`].
pub struct CanPrompt {
    state: Rc<RefCell<NegotiatorState>>,
}

impl Future for CanPrompt {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.state.borrow_mut();
        if state.offered {
            return Poll::Ready(());
        }
        if !state.waiters.iter().any(|w| w.will_wake(cx.waker())) {
            state.waiters.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
