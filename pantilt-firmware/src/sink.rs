//! Reply sink over the transmit pipes

use defmt::*;

use pantilt_core::traits::LineSink;
use pantilt_protocol::Transport;

use crate::channels::tx_pipe;

/// Writes whole lines into the per-transport transmit pipes
///
/// The control task is the only writer, so a capacity check followed by
/// the write never splits a line. A line that does not fit is dropped.
pub struct PipeSink;

impl LineSink for PipeSink {
    fn send_line(&mut self, dest: Transport, line: &str) {
        let pipe = tx_pipe(dest);
        if pipe.free_capacity() < line.len() + 1 {
            warn!("{} TX full, dropping {} byte line", dest.name(), line.len());
            return;
        }
        let _ = pipe.try_write(line.as_bytes());
        let _ = pipe.try_write(b"\n");
    }
}
