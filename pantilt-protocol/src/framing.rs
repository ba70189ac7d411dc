//! Byte-stream line framing for the serial transports
//!
//! Bytes are fed one at a time. A line ends at `\n`; a `\r` directly before
//! it is dropped. Lines that outgrow the buffer are discarded up to the next
//! `\n`, and complete lines beyond the flood limit are dropped.

use heapless::{String, Vec};

/// Length of the flood-limit window in milliseconds
pub const FLOOD_WINDOW_MS: u32 = 1000;

/// Default number of lines accepted per flood window
pub const DEFAULT_FLOOD_MAX_LINES: u32 = 60;

/// Reasons a line was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Line exceeded the buffer; the rest of it will be skipped
    Overlong,
    /// More lines than the flood limit arrived within one window
    Flooded,
    /// Line was not valid UTF-8
    InvalidUtf8,
}

/// Framer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramerStats {
    pub rx_bytes: u32,
    pub lines: u32,
    pub overlong: u32,
    pub flood_drops: u32,
    pub invalid_utf8: u32,
}

/// Fixed-window line rate limiter
#[derive(Debug, Clone)]
struct FloodGate {
    max_lines: u32,
    window_start: Option<u32>,
    count: u32,
}

impl FloodGate {
    fn allow(&mut self, now_ms: u32) -> bool {
        match self.window_start {
            Some(start) if now_ms.wrapping_sub(start) < FLOOD_WINDOW_MS => {}
            _ => {
                self.window_start = Some(now_ms);
                self.count = 0;
            }
        }
        if self.count >= self.max_lines {
            return false;
        }
        self.count += 1;
        true
    }
}

/// Line framer with a fixed `N`-byte line buffer
#[derive(Debug, Clone)]
pub struct LineFramer<const N: usize> {
    buffer: Vec<u8, N>,
    discarding: bool,
    gate: FloodGate,
    stats: FramerStats,
}

impl<const N: usize> Default for LineFramer<N> {
    fn default() -> Self {
        Self::new(DEFAULT_FLOOD_MAX_LINES)
    }
}

impl<const N: usize> LineFramer<N> {
    /// Create a framer accepting at most `flood_max_lines` lines per second
    pub fn new(flood_max_lines: u32) -> Self {
        Self {
            buffer: Vec::new(),
            discarding: false,
            gate: FloodGate {
                max_lines: flood_max_lines,
                window_start: None,
                count: 0,
            },
            stats: FramerStats::default(),
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Counters since creation
    pub fn stats(&self) -> FramerStats {
        self.stats
    }

    /// Feed a single byte received at `now_ms`
    ///
    /// Returns `Ok(Some(line))` when a line completes, `Ok(None)` when more
    /// bytes are needed, or `Err` when a line was dropped.
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> Result<Option<String<N>>, FrameError> {
        self.stats.rx_bytes = self.stats.rx_bytes.wrapping_add(1);

        if byte != b'\n' {
            if self.discarding {
                return Ok(None);
            }
            if self.buffer.push(byte).is_err() {
                self.buffer.clear();
                self.discarding = true;
                self.stats.overlong += 1;
                return Err(FrameError::Overlong);
            }
            return Ok(None);
        }

        if self.discarding {
            self.discarding = false;
            return Ok(None);
        }

        let mut bytes = core::mem::take(&mut self.buffer);
        if !self.gate.allow(now_ms) {
            self.stats.flood_drops += 1;
            return Err(FrameError::Flooded);
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        match String::from_utf8(bytes) {
            Ok(line) => {
                self.stats.lines += 1;
                Ok(Some(line))
            }
            Err(_) => {
                self.stats.invalid_utf8 += 1;
                Err(FrameError::InvalidUtf8)
            }
        }
    }
}
