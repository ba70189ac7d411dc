//! BLE link monitor
//!
//! The BLE UART module drives its STATE pin high while a central is
//! connected. Edges become transport events for the control task.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use pantilt_core::TransportEvent;
use pantilt_protocol::Transport;

use crate::channels::LINK_EVENTS;

/// STATE pin must hold its level this long before a change is reported
const DEBOUNCE_MS: u64 = 20;

#[embassy_executor::task]
pub async fn ble_link_task(mut state: Input<'static>) {
    info!("BLE link task started");

    LINK_EVENTS.send((Transport::Ble, TransportEvent::Ready)).await;

    let mut connected = false;
    loop {
        let level = state.is_high();
        if level != connected {
            connected = level;
            let event = if connected {
                TransportEvent::Connected
            } else {
                TransportEvent::Disconnected
            };
            LINK_EVENTS.send((Transport::Ble, event)).await;
        }

        state.wait_for_any_edge().await;
        Timer::after_millis(DEBOUNCE_MS).await;
    }
}
