//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pipe::Pipe;
use heapless::String;

use pantilt_core::TransportEvent;
use pantilt_protocol::Transport;

/// Receive line buffer per transport
///
/// Longer than the protocol limit so slightly long lines reach the
/// interpreter (which truncates them) instead of being discarded.
pub const RX_LINE_LEN: usize = 4096;

/// Outgoing byte buffer per transport
pub const TX_PIPE_LEN: usize = 8192;

/// Channel capacity for framed lines
const LINE_CHANNEL_SIZE: usize = 2;

/// Channel capacity for link events
const LINK_CHANNEL_SIZE: usize = 4;

/// A complete line and the transport it arrived on
pub struct InboundLine {
    pub origin: Transport,
    pub line: String<RX_LINE_LEN>,
}

pub type TxPipe = Pipe<CriticalSectionRawMutex, TX_PIPE_LEN>;

/// Framed lines from both receive tasks
pub static LINE_CHANNEL: Channel<CriticalSectionRawMutex, InboundLine, LINE_CHANNEL_SIZE> =
    Channel::new();

/// Transport connection changes
pub static LINK_EVENTS: Channel<
    CriticalSectionRawMutex,
    (Transport, TransportEvent),
    LINK_CHANNEL_SIZE,
> = Channel::new();

/// Reply bytes waiting for the USB-serial UART
pub static USB_TX_PIPE: TxPipe = Pipe::new();

/// Reply bytes waiting for the BLE UART module
pub static BLE_TX_PIPE: TxPipe = Pipe::new();

/// Outgoing pipe for a transport
pub fn tx_pipe(transport: Transport) -> &'static TxPipe {
    match transport {
        Transport::Usb => &USB_TX_PIPE,
        Transport::Ble => &BLE_TX_PIPE,
    }
}
