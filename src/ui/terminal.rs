//! Exclusive ownership of the real terminal.

use std::io;
use std::sync::Once;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};

static PANIC_HOOK: Once = Once::new();

/// Raw mode, alternate screen and hidden cursor for as long as the session
/// is active.
///
/// [`release`](Self::release) restores cooked mode, echo and the cursor. It
/// runs at most once; dropping an unreleased session releases it, and a
/// panic hook restores the terminal before the panic message is printed.
#[derive(Debug)]
pub struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    pub fn acquire() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        install_panic_hook();
        Ok(Self { active: true })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn release(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        restore()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

fn restore() -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(io::stdout(), LeaveAlternateScreen, Show);
    raw.and(screen)
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic| {
            let _ = restore();
            original_hook(panic);
        }));
    });
}
