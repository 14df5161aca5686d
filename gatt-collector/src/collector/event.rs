//! Commands accepted from and events delivered to application tasks.

use {
    super::{ProfileError, ServiceContent},
    crate::{
        bytes::ToBytes,
        gatt::ConnHandle,
        profile::{Attribute, AttributeOf, Profile},
        Error, MAX_WRITE_LEN,
    },
    core::fmt,
    heapless::Vec,
};

/// Identifies the application task a command came from, or an event is addressed to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub u16);

/// How the collector learns the layout of the peer's service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnableMode {
    /// Run service discovery on the peer.
    Discover,
    /// Reuse a layout stored from an earlier connection to the same (bonded) peer.
    UseSupplied(ServiceContent),
}

/// A request from an application task.
pub enum Command<P: Profile> {
    Enable {
        conn: ConnHandle,
        src: TaskId,
        mode: EnableMode,
    },
    Read {
        conn: ConnHandle,
        src: TaskId,
        attribute: AttributeOf<P>,
    },
    Write {
        conn: ConnHandle,
        src: TaskId,
        characteristic: P::Characteristic,
        value: Vec<u8, MAX_WRITE_LEN>,
    },
    /// Writes a client or server configuration descriptor.
    Configure {
        conn: ConnHandle,
        src: TaskId,
        descriptor: P::Descriptor,
        value: u16,
    },
    Disable {
        conn: ConnHandle,
        src: TaskId,
    },
}

impl<P: Profile> Command<P> {
    /// Builds a write command from an encodable value.
    pub fn write(
        conn: ConnHandle,
        src: TaskId,
        characteristic: P::Characteristic,
        value: &impl ToBytes,
    ) -> Result<Self, Error> {
        Ok(Command::Write {
            conn,
            src,
            characteristic,
            value: value.encode()?,
        })
    }

    /// Returns the connection this command targets.
    pub fn conn(&self) -> ConnHandle {
        match self {
            Command::Enable { conn, .. }
            | Command::Read { conn, .. }
            | Command::Write { conn, .. }
            | Command::Configure { conn, .. }
            | Command::Disable { conn, .. } => *conn,
        }
    }

    /// Returns the task that sent this command.
    pub fn src(&self) -> TaskId {
        match self {
            Command::Enable { src, .. }
            | Command::Read { src, .. }
            | Command::Write { src, .. }
            | Command::Configure { src, .. }
            | Command::Disable { src, .. } => *src,
        }
    }

    pub(crate) fn operation(&self) -> OperationOf<P> {
        match self {
            Command::Enable { .. } => Operation::Enable,
            Command::Read { attribute, .. } => Operation::Read(*attribute),
            Command::Write { characteristic, .. } => Operation::Write(*characteristic),
            Command::Configure { descriptor, .. } => Operation::Configure(*descriptor),
            Command::Disable { .. } => Operation::Disable,
        }
    }
}

impl<P: Profile> fmt::Debug for Command<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Enable { conn, src, mode } => f
                .debug_struct("Enable")
                .field("conn", conn)
                .field("src", src)
                .field("discover", &(*mode == EnableMode::Discover))
                .finish(),
            Command::Write {
                conn,
                src,
                characteristic,
                value,
            } => f
                .debug_struct("Write")
                .field("conn", conn)
                .field("src", src)
                .field("characteristic", characteristic)
                .field("value", &crate::utils::HexSlice(&value[..]))
                .finish(),
            _ => f
                .debug_struct("Command")
                .field("conn", &self.conn())
                .field("src", &self.src())
                .field("operation", &self.operation())
                .finish(),
        }
    }
}

/// The operation a [`Event::Completion`] reports on.
///
/// [`Event::Completion`]: enum.Event.html#variant.Completion
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operation<C, D> {
    Enable,
    Read(Attribute<C, D>),
    Write(C),
    Configure(D),
    Disable,
}

/// The [`Operation`] type of a profile.
///
/// [`Operation`]: enum.Operation.html
pub type OperationOf<P> = Operation<<P as Profile>::Characteristic, <P as Profile>::Descriptor>;

/// Something the collector reports to an application task.
pub enum Event<P: Profile> {
    /// Result of an `Enable` command. On success, carries the service layout in use.
    EnableConfirm {
        conn: ConnHandle,
        result: Result<ServiceContent, ProfileError>,
    },
    /// Result of a `Read`, `Write`, `Configure` or a refused `Disable`.
    Completion {
        conn: ConnHandle,
        operation: OperationOf<P>,
        status: Result<(), ProfileError>,
    },
    /// A decoded value, read on request or pushed by the peer.
    ValueIndication {
        conn: ConnHandle,
        attribute: AttributeOf<P>,
        value: P::Value,
    },
    /// The context of `conn` was released, either on request or because the link dropped.
    DisableIndication { conn: ConnHandle },
    /// The peer pushed a value that could not be decoded.
    ErrorIndication {
        conn: ConnHandle,
        status: ProfileError,
    },
}

impl<P: Profile> Event<P> {
    pub fn conn(&self) -> ConnHandle {
        match self {
            Event::EnableConfirm { conn, .. }
            | Event::Completion { conn, .. }
            | Event::ValueIndication { conn, .. }
            | Event::DisableIndication { conn }
            | Event::ErrorIndication { conn, .. } => *conn,
        }
    }
}

impl<P: Profile> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::EnableConfirm { conn, result } => f
                .debug_struct("EnableConfirm")
                .field("conn", conn)
                .field("result", &result.as_ref().map(|_| ()))
                .finish(),
            Event::Completion {
                conn,
                operation,
                status,
            } => f
                .debug_struct("Completion")
                .field("conn", conn)
                .field("operation", operation)
                .field("status", status)
                .finish(),
            Event::ValueIndication {
                conn,
                attribute,
                value,
            } => f
                .debug_struct("ValueIndication")
                .field("conn", conn)
                .field("attribute", attribute)
                .field("value", value)
                .finish(),
            Event::DisableIndication { conn } => f
                .debug_struct("DisableIndication")
                .field("conn", conn)
                .finish(),
            Event::ErrorIndication { conn, status } => f
                .debug_struct("ErrorIndication")
                .field("conn", conn)
                .field("status", status)
                .finish(),
        }
    }
}

impl<P: Profile> Clone for Event<P> {
    fn clone(&self) -> Self {
        match self {
            Event::EnableConfirm { conn, result } => Event::EnableConfirm {
                conn: *conn,
                result: result.clone(),
            },
            Event::Completion {
                conn,
                operation,
                status,
            } => Event::Completion {
                conn: *conn,
                operation: *operation,
                status: *status,
            },
            Event::ValueIndication {
                conn,
                attribute,
                value,
            } => Event::ValueIndication {
                conn: *conn,
                attribute: *attribute,
                value: value.clone(),
            },
            Event::DisableIndication { conn } => Event::DisableIndication { conn: *conn },
            Event::ErrorIndication { conn, status } => Event::ErrorIndication {
                conn: *conn,
                status: *status,
            },
        }
    }
}

impl<P: Profile> PartialEq for Event<P> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Event::EnableConfirm { conn: a, result: x },
                Event::EnableConfirm { conn: b, result: y },
            ) => a == b && x == y,
            (
                Event::Completion {
                    conn: a,
                    operation: op_a,
                    status: x,
                },
                Event::Completion {
                    conn: b,
                    operation: op_b,
                    status: y,
                },
            ) => a == b && op_a == op_b && x == y,
            (
                Event::ValueIndication {
                    conn: a,
                    attribute: attr_a,
                    value: x,
                },
                Event::ValueIndication {
                    conn: b,
                    attribute: attr_b,
                    value: y,
                },
            ) => a == b && attr_a == attr_b && x == y,
            (Event::DisableIndication { conn: a }, Event::DisableIndication { conn: b }) => a == b,
            (
                Event::ErrorIndication { conn: a, status: x },
                Event::ErrorIndication { conn: b, status: y },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

/// Delivers collector events to application tasks.
///
/// Implemented by the platform's messaging layer. Delivery must not fail; a sink that can run out
/// of space has to drop or overwrite on its own.
pub trait EventSink<P: Profile> {
    fn send(&mut self, dest: TaskId, event: Event<P>);
}
