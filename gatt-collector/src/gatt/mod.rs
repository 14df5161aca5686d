//! Client side of the Generic Attribute Profile (GATT).
//!
//! GATT describes a service framework that uses the Attribute Protocol for discovery and
//! interaction. The collector consumes it through two seams:
//!
//! * [`GattClient`], implemented by the platform, issues discovery, read and write procedures.
//! * [`GattEvent`], produced by the platform, reports what the peer answered.
//!
//! [`GattClient`]: trait.GattClient.html
//! [`GattEvent`]: enum.GattEvent.html

pub mod characteristic;

use {
    crate::{
        att::{AttHandle, AttUuid, ErrorCode, HandleRange},
        utils::HexSlice,
        Error,
    },
    core::fmt,
    heapless::Vec,
};

pub use self::characteristic::{ClientConfig, Properties, ServerConfig};

/// Maximum number of characteristics reported for one service instance.
pub const MAX_DISCOVERED_CHARACTERISTICS: usize = 16;

/// Maximum number of descriptors reported for one service instance.
pub const MAX_DISCOVERED_DESCRIPTORS: usize = 24;

/// Identifies a link-layer connection to a peer.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ConnHandle(u16);

impl ConnHandle {
    pub const fn from_raw(raw: u16) -> Self {
        ConnHandle(raw)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Debug for ConnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// How a value is written to the peer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteKind {
    /// *Write Request*, acknowledged by the peer with a response.
    Request,
    /// *Write Command*, not acknowledged.
    Command,
}

/// Reasons the transport can refuse to start a procedure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The link to the peer no longer exists.
    Disconnected,
    /// No buffer or queue slot was available to send the request.
    NoResources,
}

/// Client-side GATT procedures, provided by the platform.
///
/// Every method only *starts* a procedure. Its outcome is reported back through
/// [`Collector::process_gatt`] as a [`GattEvent`], except for [`WriteKind::Command`] writes, which
/// have no outcome.
///
/// [`Collector::process_gatt`]: ../collector/struct.Collector.html#method.process_gatt
/// [`GattEvent`]: enum.GattEvent.html
/// [`WriteKind::Command`]: enum.WriteKind.html#variant.Command
pub trait GattClient {
    /// Discovers all instances of the primary service `uuid`, together with their
    /// characteristics and descriptors.
    ///
    /// Each instance found is reported as [`GattEvent::ServiceFound`], followed by a single
    /// [`GattEvent::DiscoveryComplete`].
    fn discover_service(&mut self, conn: ConnHandle, uuid: AttUuid) -> Result<(), TransportError>;

    /// Reads the attribute at `handle`, answered by [`GattEvent::ReadResponse`].
    fn read(&mut self, conn: ConnHandle, handle: AttHandle) -> Result<(), TransportError>;

    /// Writes `value` to the attribute at `handle`.
    ///
    /// Requests are answered by [`GattEvent::WriteResponse`].
    fn write(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        value: &[u8],
        kind: WriteKind,
    ) -> Result<(), TransportError>;
}

/// A characteristic declaration found during discovery.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DiscoveredCharacteristic {
    pub uuid: AttUuid,
    /// Handle of the characteristic declaration.
    pub declaration: AttHandle,
    /// Handle of the characteristic value.
    pub value: AttHandle,
    pub properties: Properties,
}

/// A characteristic descriptor found during discovery.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DiscoveredDescriptor {
    pub uuid: AttUuid,
    pub handle: AttHandle,
}

/// One service instance, as reported by the transport.
///
/// Characteristics are listed in ascending handle order.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredService {
    pub range: HandleRange,
    pub uuid: AttUuid,
    pub characteristics: Vec<DiscoveredCharacteristic, MAX_DISCOVERED_CHARACTERISTICS>,
    pub descriptors: Vec<DiscoveredDescriptor, MAX_DISCOVERED_DESCRIPTORS>,
}

impl DiscoveredService {
    pub fn new(range: HandleRange, uuid: impl Into<AttUuid>) -> Self {
        Self {
            range,
            uuid: uuid.into(),
            characteristics: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    /// Records a characteristic of this service.
    ///
    /// Returns `Error::Eof` when no room is left.
    pub fn push_characteristic(
        &mut self,
        uuid: impl Into<AttUuid>,
        declaration: AttHandle,
        value: AttHandle,
        properties: Properties,
    ) -> Result<(), Error> {
        self.characteristics
            .push(DiscoveredCharacteristic {
                uuid: uuid.into(),
                declaration,
                value,
                properties,
            })
            .map_err(|_| Error::Eof)
    }

    /// Records a descriptor of this service.
    ///
    /// Returns `Error::Eof` when no room is left.
    pub fn push_descriptor(&mut self, uuid: impl Into<AttUuid>, handle: AttHandle) -> Result<(), Error> {
        self.descriptors
            .push(DiscoveredDescriptor {
                uuid: uuid.into(),
                handle,
            })
            .map_err(|_| Error::Eof)
    }
}

/// Outcome of a GATT procedure, or an unsolicited value pushed by the peer.
#[derive(Clone)]
pub enum GattEvent<'a> {
    ServiceFound {
        conn: ConnHandle,
        service: &'a DiscoveredService,
    },
    DiscoveryComplete {
        conn: ConnHandle,
        status: Result<(), ErrorCode>,
    },
    ReadResponse {
        conn: ConnHandle,
        handle: AttHandle,
        result: Result<&'a [u8], ErrorCode>,
    },
    WriteResponse {
        conn: ConnHandle,
        handle: AttHandle,
        status: Result<(), ErrorCode>,
    },
    Notification {
        conn: ConnHandle,
        handle: AttHandle,
        value: &'a [u8],
    },
    /// The transport confirms indications to the peer on its own.
    Indication {
        conn: ConnHandle,
        handle: AttHandle,
        value: &'a [u8],
    },
    Disconnected {
        conn: ConnHandle,
    },
}

impl GattEvent<'_> {
    /// Returns the connection this event happened on.
    pub fn conn(&self) -> ConnHandle {
        match self {
            GattEvent::ServiceFound { conn, .. }
            | GattEvent::DiscoveryComplete { conn, .. }
            | GattEvent::ReadResponse { conn, .. }
            | GattEvent::WriteResponse { conn, .. }
            | GattEvent::Notification { conn, .. }
            | GattEvent::Indication { conn, .. }
            | GattEvent::Disconnected { conn } => *conn,
        }
    }
}

impl fmt::Debug for GattEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GattEvent::ServiceFound { conn, service } => f
                .debug_struct("ServiceFound")
                .field("conn", conn)
                .field("range", &service.range)
                .finish(),
            GattEvent::DiscoveryComplete { conn, status } => f
                .debug_struct("DiscoveryComplete")
                .field("conn", conn)
                .field("status", status)
                .finish(),
            GattEvent::ReadResponse {
                conn,
                handle,
                result,
            } => f
                .debug_struct("ReadResponse")
                .field("conn", conn)
                .field("handle", handle)
                .field("result", &result.map(HexSlice))
                .finish(),
            GattEvent::WriteResponse {
                conn,
                handle,
                status,
            } => f
                .debug_struct("WriteResponse")
                .field("conn", conn)
                .field("handle", handle)
                .field("status", status)
                .finish(),
            GattEvent::Notification {
                conn,
                handle,
                value,
            } => f
                .debug_struct("Notification")
                .field("conn", conn)
                .field("handle", handle)
                .field("value", &HexSlice(value))
                .finish(),
            GattEvent::Indication {
                conn,
                handle,
                value,
            } => f
                .debug_struct("Indication")
                .field("conn", conn)
                .field("handle", handle)
                .field("value", &HexSlice(value))
                .finish(),
            GattEvent::Disconnected { conn } => {
                f.debug_struct("Disconnected").field("conn", conn).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuid::Uuid16;

    #[test]
    fn discovered_service_capacity() {
        let range =
            HandleRange::new(AttHandle::from_raw(1), AttHandle::from_raw(0xFFFF)).unwrap();
        let mut svc = DiscoveredService::new(range, Uuid16(0x1818));
        for i in 0..MAX_DISCOVERED_CHARACTERISTICS as u16 {
            svc.push_characteristic(
                Uuid16(0x2A00 + i),
                AttHandle::from_raw(2 + 2 * i),
                AttHandle::from_raw(3 + 2 * i),
                Properties::READ,
            )
            .unwrap();
        }
        assert_eq!(
            svc.push_characteristic(
                Uuid16(0x2AFF),
                AttHandle::from_raw(0x100),
                AttHandle::from_raw(0x101),
                Properties::READ,
            ),
            Err(Error::Eof)
        );
    }

    #[test]
    fn event_debug() {
        let event = GattEvent::Notification {
            conn: ConnHandle::from_raw(1),
            handle: AttHandle::from_raw(0x10),
            value: &[0xAB, 0x01],
        };
        assert_eq!(event.conn(), ConnHandle::from_raw(1));
        assert_eq!(
            format!("{:?}", event),
            "Notification { conn: conn#1, handle: 0x0010, value: [ab, 01] }"
        );
    }
}
