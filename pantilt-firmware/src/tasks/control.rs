//! Control task
//!
//! Owns the [`Controller`]. Framed lines, motion ticks and link events are
//! handled one at a time, so the interpreter never runs concurrently with
//! itself.

use defmt::*;
use embassy_futures::select::{select3, Either3};

use pantilt_core::traits::PulseOutput;
use pantilt_core::Controller;
use pantilt_hal_rp2040::flash::Rp2040FlashStorage;
use pantilt_hal_rp2040::servo::Rp2040ServoPwm;

use super::tick::{now_ms, TICK_SIGNAL};
use crate::channels::{LINE_CHANNEL, LINK_EVENTS};
use crate::sink::PipeSink;

pub type ServoOutput = PulseOutput<Rp2040ServoPwm<'static>>;

#[embassy_executor::task]
pub async fn control_task(output: ServoOutput, storage: Rp2040FlashStorage<'static>) {
    info!("Control task started");

    let mut controller = Controller::new(output, PipeSink, storage);
    match controller.begin() {
        Ok(()) => info!("Settings loaded from flash"),
        Err(e) => warn!("No stored settings, using defaults: {:?}", e),
    }

    loop {
        match select3(
            LINE_CHANNEL.receive(),
            TICK_SIGNAL.wait(),
            LINK_EVENTS.receive(),
        )
        .await
        {
            Either3::First(inbound) => {
                debug!("{} <- {}", inbound.origin.name(), inbound.line.as_str());
                controller.handle(&inbound.line, inbound.origin, now_ms());
            }
            Either3::Second(now) => controller.tick(now),
            Either3::Third((transport, event)) => {
                info!("{} link: {:?}", transport.name(), event);
                controller.on_transport_event(event, transport);
            }
        }
    }
}
