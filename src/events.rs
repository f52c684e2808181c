//! Keyboard input while the dashboard owns the terminal.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// How long a single input poll blocks before re-checking for shutdown.
const INPUT_POLL: Duration = Duration::from_millis(100);

/// What the user asked the poll loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Poll now instead of waiting for the next tick.
    Refresh,
}

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Map a key press to a command
pub fn command_for(key: KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Refresh),
        _ => None,
    }
}

/// Read the keyboard on a dedicated thread and forward commands to `tx`.
///
/// The thread exits after forwarding `Quit`, on an input error, or once the
/// receiving side has been dropped.
pub fn spawn_input_listener(tx: UnboundedSender<Command>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !tx.is_closed() {
            let event = match poll_event(INPUT_POLL) {
                Ok(event) => event,
                Err(e) => {
                    debug!(error = %e, "keyboard input unavailable");
                    let _ = tx.send(Command::Quit);
                    return;
                }
            };
            if let Some(Event::Key(key)) = event {
                if let Some(command) = command_for(key) {
                    if tx.send(command).is_err() || command == Command::Quit {
                        return;
                    }
                }
            }
        }
    })
}

/// Wait for the listener thread to finish. A panic on that thread is logged
/// and reported as `false`.
pub fn join_input_listener(listener: JoinHandle<()>) -> bool {
    match listener.join() {
        Ok(()) => true,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(panic = %message, "keyboard input thread panicked");
            false
        }
    }
}
