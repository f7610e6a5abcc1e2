//! Signal handling for the render loop.
//!
//! A helper thread waits on signal-hook's iterator and forwards what it sees
//! to the render loop over a channel. Termination signals also clear the
//! shared `running` flag so the loop stops even between channel reads.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender, TryRecvError},
    thread,
};

/// What the render loop should do in response to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Reload the configuration file (SIGHUP, SIGUSR2)
    Reload,
    /// Restore the terminal and exit (SIGINT, SIGTERM)
    Shutdown,
}

impl SignalMessage {
    /// Message for a raw signal number, if the clock reacts to it.
    pub fn from_signal(signal: i32) -> Option<Self> {
        match signal {
            SIGINT | SIGTERM => Some(SignalMessage::Shutdown),
            SIGHUP | SIGUSR2 => Some(SignalMessage::Reload),
            _ => None,
        }
    }
}

/// Signal handling state shared between the handler thread and the loop.
pub struct SignalState {
    /// Cleared once a shutdown signal arrives
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
}

impl SignalState {
    /// State with no handler thread attached, fed through the returned sender.
    pub fn detached() -> (Self, Sender<SignalMessage>) {
        let (sender, receiver) = std::sync::mpsc::channel();
        (
            Self {
                running: Arc::new(AtomicBool::new(true)),
                signal_receiver: receiver,
            },
            sender,
        )
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Next pending message without blocking.
    ///
    /// A shutdown message also clears `running` here, so a detached state
    /// behaves like one fed by the real handler.
    pub fn poll(&self) -> Option<SignalMessage> {
        match self.signal_receiver.try_recv() {
            Ok(message) => {
                if message == SignalMessage::Shutdown {
                    self.running.store(false, Ordering::SeqCst);
                }
                Some(message)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Install handlers for termination and reload signals.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let (state, sender) = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = state.running.clone();
    thread::spawn(move || {
        for sig in signals.forever() {
            let Some(message) = SignalMessage::from_signal(sig) else {
                continue;
            };

            if debug_enabled {
                log_pipe!();
                log_debug!("Received signal {sig}: {message:?}");
            }

            if message == SignalMessage::Shutdown {
                running.store(false, Ordering::SeqCst);
            }

            if sender.send(message).is_err() {
                // Render loop is gone
                break;
            }
        }
    });

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_mapping() {
        assert_eq!(SignalMessage::from_signal(SIGINT), Some(SignalMessage::Shutdown));
        assert_eq!(SignalMessage::from_signal(SIGTERM), Some(SignalMessage::Shutdown));
        assert_eq!(SignalMessage::from_signal(SIGHUP), Some(SignalMessage::Reload));
        assert_eq!(SignalMessage::from_signal(SIGUSR2), Some(SignalMessage::Reload));
        assert_eq!(
            SignalMessage::from_signal(signal_hook::consts::signal::SIGUSR1),
            None
        );
    }

    #[test]
    fn test_detached_state_shutdown_clears_running() {
        let (state, sender) = SignalState::detached();
        assert!(state.is_running());
        assert_eq!(state.poll(), None);

        sender.send(SignalMessage::Reload).unwrap();
        assert_eq!(state.poll(), Some(SignalMessage::Reload));
        assert!(state.is_running());

        sender.send(SignalMessage::Shutdown).unwrap();
        assert_eq!(state.poll(), Some(SignalMessage::Shutdown));
        assert!(!state.is_running());
    }
}
