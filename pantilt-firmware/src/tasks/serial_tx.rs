//! Serial transmit task
//!
//! Drains one transmit pipe into its UART.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use pantilt_protocol::Transport;

use crate::channels::tx_pipe;

/// Chunk copied from the pipe per UART write
const TX_CHUNK: usize = 128;

#[embassy_executor::task(pool_size = 2)]
pub async fn serial_tx_task(transport: Transport, mut tx: BufferedUartTx) {
    info!("{} TX task started", transport.name());

    let pipe = tx_pipe(transport);
    let mut buf = [0u8; TX_CHUNK];

    loop {
        let n = pipe.read(&mut buf).await;
        if let Err(e) = tx.write_all(&buf[..n]).await {
            warn!("{} UART write error: {:?}", transport.name(), e);
        }
    }
}
