//! Macro runner
//!
//! Runs a stored favorite line by line through the ordinary dispatch path.
//! While a macro runs the queue mode is forced to `on`, so motion lines
//! queue up instead of cancelling each other.

use pantilt_hal::FlashStorage;
use pantilt_protocol::reply::QueueMode;
use pantilt_protocol::text::script_lines;

use super::dispatch::{Invocation, Request};
use super::Controller;
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::traits::{LineSink, ServoOutput};

/// Most executable lines a macro may contain
pub const MAX_MACRO_LINES: usize = 50;

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    /// Run every non-blank line of `script`
    ///
    /// The line count is checked before anything runs. The previous queue
    /// mode is restored whether or not the macro ran.
    pub(super) fn run_macro(&mut self, req: &Request<'_>, script: &str) -> CommandResult {
        if self.macro_running {
            return Err(CommandError::new(
                ErrorCode::MacroBusy,
                "A macro is already running",
            ));
        }
        if script_lines(script).count() > MAX_MACRO_LINES {
            return Err(CommandError::new(
                ErrorCode::MacroTooLong,
                "Macro step limit exceeded (50)",
            ));
        }

        let saved_mode = self.queue_mode;
        self.queue_mode = QueueMode::On;
        self.macro_running = true;

        for line in script_lines(script) {
            self.dispatch(line, req.origin, Invocation::MacroLine, req.now_ms);
        }

        self.macro_running = false;
        self.queue_mode = saved_mode;
        Ok(())
    }
}
