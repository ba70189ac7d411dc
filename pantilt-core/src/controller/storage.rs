//! `persist` and `factoryReset`

use pantilt_hal::FlashStorage;

use super::dispatch::Request;
use super::Controller;
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::persist::SaveOutcome;
use crate::traits::{LineSink, ServoOutput};

impl<O, K, S> Controller<O, K, S>
where
    O: ServoOutput,
    K: LineSink,
    S: FlashStorage,
{
    pub(super) fn cmd_persist(&mut self, req: &Request<'_>) -> CommandResult {
        let outcome = self
            .persistence
            .save(&mut self.settings)
            .map_err(|_| CommandError::new(ErrorCode::WriteFailed, "Writing settings to flash failed"))?;
        let msg = match outcome {
            SaveOutcome::NoChanges => "no_changes",
            SaveOutcome::Persisted => "persisted",
        };
        self.ack_done(req, msg);
        Ok(())
    }

    /// Erase storage and restore defaults
    ///
    /// Defaults are applied even if the erase fails; only a successful erase
    /// also recenters and aborts motion.
    pub(super) fn cmd_factory_reset(&mut self, req: &Request<'_>) -> CommandResult {
        self.persistence
            .factory_reset(&mut self.settings)
            .map_err(|_| CommandError::new(ErrorCode::ClearFailed, "Erasing flash failed"))?;
        self.scheduler.abort_all();
        self.scheduler.reset_angles(0.0, 0.0);
        self.apply_outputs();
        self.ack_done(req, "factory_reset");
        Ok(())
    }
}
