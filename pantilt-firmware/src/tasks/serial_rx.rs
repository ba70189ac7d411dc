//! Serial receive task
//!
//! One instance per transport. Frames bytes into lines and hands complete
//! lines to the control task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use pantilt_protocol::{FrameError, LineFramer, Transport};

use super::tick::now_ms;
use crate::channels::{InboundLine, LINE_CHANNEL, RX_LINE_LEN};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task(pool_size = 2)]
pub async fn serial_rx_task(transport: Transport, mut rx: BufferedUartRx, flood_max_lines: u32) {
    info!("{} RX task started", transport.name());

    let mut framer: LineFramer<RX_LINE_LEN> = LineFramer::new(flood_max_lines);
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("{} UART read error: {:?}", transport.name(), e);
                framer.reset();
                continue;
            }
        };
        trace!("{} RX: {} bytes", transport.name(), n);

        for &byte in &buf[..n] {
            match framer.feed(byte, now_ms()) {
                Ok(Some(line)) => {
                    LINE_CHANNEL
                        .send(InboundLine {
                            origin: transport,
                            line,
                        })
                        .await;
                }
                Ok(None) => {}
                Err(FrameError::Flooded) => {
                    let stats = framer.stats();
                    warn!(
                        "{} flood limit hit, {} lines dropped so far",
                        transport.name(),
                        stats.flood_drops
                    );
                }
                Err(e) => warn!("{} dropped line: {:?}", transport.name(), e),
            }
        }
    }
}
