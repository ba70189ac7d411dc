//! Reply routing: origin transports, destination sets and echo tags

use heapless::String;

/// Capacity of a `subsystem` or `route` tag
pub const ROUTE_TAG_LEN: usize = 48;

/// Opaque caller-supplied routing tag, echoed back in replies
pub type RouteTag = String<ROUTE_TAG_LEN>;

/// Transport a command arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transport {
    /// Wired serial link
    Usb,
    /// BLE UART-emulation link
    Ble,
}

impl Transport {
    /// Default subsystem name for commands from this transport
    pub fn name(self) -> &'static str {
        match self {
            Transport::Usb => "usb",
            Transport::Ble => "ble",
        }
    }
}

/// Set of transports a line is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Destinations {
    usb: bool,
    ble: bool,
}

impl Destinations {
    /// USB only
    pub const USB: Self = Self {
        usb: true,
        ble: false,
    };

    /// USB plus a BLE mirror
    pub const MIRRORED: Self = Self {
        usb: true,
        ble: true,
    };

    /// Destinations for traffic caused by a command from `origin`
    ///
    /// USB always sees everything; BLE-originated traffic is mirrored back
    /// to BLE.
    pub fn for_origin(origin: Transport) -> Self {
        match origin {
            Transport::Usb => Self::USB,
            Transport::Ble => Self::MIRRORED,
        }
    }

    /// Whether `transport` is in the set
    pub fn contains(self, transport: Transport) -> bool {
        match transport {
            Transport::Usb => self.usb,
            Transport::Ble => self.ble,
        }
    }

    /// Transports in the set, USB first
    pub fn iter(self) -> impl Iterator<Item = Transport> {
        [Transport::Usb, Transport::Ble]
            .into_iter()
            .filter(move |t| self.contains(*t))
    }
}

/// `subsystem`/`route` tags echoed in replies
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteTags {
    pub subsystem: RouteTag,
    pub route: RouteTag,
}

impl RouteTags {
    /// Tags with only a subsystem
    pub fn subsystem(name: &str) -> Self {
        let mut tags = Self::default();
        let _ = tags.subsystem.push_str(name);
        tags
    }
}

/// Where replies and events for one command go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    pub tags: RouteTags,
    pub dests: Destinations,
}

impl Routing {
    /// Routing for a transport with no tags beyond its own name
    pub fn for_origin(origin: Transport) -> Self {
        Self {
            tags: RouteTags::subsystem(origin.name()),
            dests: Destinations::for_origin(origin),
        }
    }
}
