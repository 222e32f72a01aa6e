//! Terminal setup and teardown.

use std::io::{self, stdout};
use std::panic;

use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::{error, trace};

/// Owns the terminal while the table runs. Raw mode, the alternate screen
/// and mouse capture are undone when the guard is dropped or on panic.
pub struct TerminalGuard {
    terminal: DefaultTerminal,
}

impl TerminalGuard {
    pub fn new() -> io::Result<Self> {
        // ratatui::init installs a hook that restores the screen, this one adds the mouse.
        let terminal = ratatui::init();
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = execute!(stdout(), DisableMouseCapture);
            original_hook(panic_info);
        }));

        execute!(stdout(), EnableMouseCapture)?;
        trace!("Terminal initialized with mouse capture");
        Ok(Self { terminal })
    }

    pub fn terminal(&mut self) -> &mut DefaultTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = execute!(stdout(), DisableMouseCapture) {
            error!("Could not disable mouse capture: {e}");
        }
        ratatui::restore();
        trace!("Terminal restored");
    }
}
