//! Pan/Tilt - Two-axis servo head firmware
//!
//! Main firmware binary for RP2040 boards. Commands arrive as JSON lines on
//! a USB-serial bridge (UART0) and a BLE UART module (UART1); the core
//! interprets them and drives two hobby servos from one PWM slice.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pantilt_core::traits::PulseOutput;
use pantilt_hal_rp2040::flash::Rp2040FlashStorage;
use pantilt_hal_rp2040::servo::Rp2040ServoPwm;
use pantilt_protocol::Transport;

mod channels;
mod config;
mod sink;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

// Static cells for UART buffers (must live forever)
static USB_TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static USB_RX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();
static BLE_TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static BLE_RX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pan/tilt firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let hw = config::load_hardware_config();

    let uart_config = || {
        let mut cfg = UartConfig::default();
        cfg.baudrate = hw.baud;
        cfg
    };

    // USB-serial bridge: GPIO0 TX, GPIO1 RX
    let usb_uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config()).into_buffered(
        Irqs,
        USB_TX_BUF.init([0u8; 256]),
        USB_RX_BUF.init([0u8; 1024]),
    );
    let (usb_tx, usb_rx) = usb_uart.split();

    // BLE UART module: GPIO4 TX, GPIO5 RX, STATE on GPIO6
    let ble_uart = Uart::new_blocking(p.UART1, p.PIN_4, p.PIN_5, uart_config()).into_buffered(
        Irqs,
        BLE_TX_BUF.init([0u8; 256]),
        BLE_RX_BUF.init([0u8; 1024]),
    );
    let (ble_tx, ble_rx) = ble_uart.split();
    let ble_state = Input::new(p.PIN_6, Pull::Down);

    info!("UARTs initialized at {} baud", hw.baud);

    // Servos on PWM slice 1: GPIO2 pan (A), GPIO3 tilt (B)
    let pwm = Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_2, p.PIN_3, PwmConfig::default());
    let center = (hw.pan.pulse_for(0.0), hw.tilt.pulse_for(0.0));
    // frame_us is validated to fit the 16-bit counter
    let servos = Rp2040ServoPwm::new(pwm, hw.frame_us as u16, center);
    let output = PulseOutput::new(servos, hw.pan, hw.tilt);

    info!("Servo PWM initialized");

    let storage = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);

    // Spawn tasks
    spawner.spawn(tasks::tick_task(hw.tick_ms)).unwrap();
    spawner
        .spawn(tasks::serial_rx_task(Transport::Usb, usb_rx, hw.flood_max_lines))
        .unwrap();
    spawner
        .spawn(tasks::serial_rx_task(Transport::Ble, ble_rx, hw.flood_max_lines))
        .unwrap();
    spawner.spawn(tasks::serial_tx_task(Transport::Usb, usb_tx)).unwrap();
    spawner.spawn(tasks::serial_tx_task(Transport::Ble, ble_tx)).unwrap();
    spawner.spawn(tasks::ble_link_task(ble_state)).unwrap();
    spawner.spawn(tasks::control_task(output, storage)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
