//! Outgoing line sink

use pantilt_protocol::Transport;

/// Destination for reply and event lines
///
/// Implementations append the line terminator themselves. A sink must not
/// block; a line that cannot be buffered is dropped.
pub trait LineSink {
    /// Write one line to one transport
    fn send_line(&mut self, dest: Transport, line: &str);
}
