//! Remote control surface: another window drives the horn over a message
//! channel using small JSON commands.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::controller::{AirHorn, HornTrigger};
use super::engine::StartOptions;
use super::error::RemoteError;

/// The stable surface exposed to remote callers.
pub trait HornRemote {
    fn start(&self, options: StartOptions);
    fn stop(&self);
}

impl HornRemote for AirHorn {
    fn start(&self, options: StartOptions) {
        self.start_with(HornTrigger::Remote, options);
    }

    fn stop(&self) {
        AirHorn::stop(self);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum RemoteCommand {
    Start {
        #[serde(rename = "loop", default)]
        looping: bool,
    },
    Stop,
}

/// Sent to the opener once the channel is wired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "cmd", rename_all = "UPPERCASE")]
pub enum RemoteAnnouncement {
    Ready,
}

/// Parses one message and applies it to `remote`.
pub fn dispatch(remote: &dyn HornRemote, raw: &str) -> Result<RemoteCommand, RemoteError> {
    let command: RemoteCommand = serde_json::from_str(raw)?;
    debug!(?command, "remote command");
    match command {
        RemoteCommand::Start { looping } => remote.start(StartOptions { looping }),
        RemoteCommand::Stop => remote.stop(),
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Option<StartOptions>>>);

    impl HornRemote for Recorder {
        fn start(&self, options: StartOptions) {
            self.0.borrow_mut().push(Some(options));
        }

        fn stop(&self) {
            self.0.borrow_mut().push(None);
        }
    }

    #[test]
    fn start_and_stop_messages_reach_the_horn() {
        let remote = Recorder::default();

        dispatch(&remote, r#"{"cmd":"start","loop":true}"#).unwrap();
        dispatch(&remote, r#"{"cmd":"start"}"#).unwrap();
        dispatch(&remote, r#"{"cmd":"stop"}"#).unwrap();

        assert_eq!(
            *remote.0.borrow(),
            vec![Some(StartOptions::LOOPING), Some(StartOptions::ONCE), None]
        );
    }

    #[test]
    fn unknown_commands_are_rejected_untouched() {
        let remote = Recorder::default();
        assert!(dispatch(&remote, r#"{"cmd":"explode"}"#).is_err());
        assert!(dispatch(&remote, "not json").is_err());
        assert!(remote.0.borrow().is_empty());
    }

    #[test]
    fn ready_announcement_matches_opener_protocol() {
        assert_eq!(
            serde_json::to_string(&RemoteAnnouncement::Ready).unwrap(),
            r#"{"cmd":"READY"}"#
        );
    }
}
