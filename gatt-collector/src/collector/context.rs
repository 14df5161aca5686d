//! Per-connection collector state.

use {
    super::{event::OperationOf, ServiceContent, TaskId},
    crate::{
        att::AttHandle,
        gatt::ConnHandle,
        profile::{AttributeOf, Profile},
        time::Instant,
        MAX_WRITE_LEN,
    },
    heapless::Vec,
};

/// Externally visible state of a connection context.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// The service layout is not known yet, discovery may be running.
    Idle,
    /// The service layout is known and no request is outstanding.
    Connected,
    /// A request is outstanding.
    Busy,
}

/// Where a control point procedure currently stands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlPointPhase {
    AwaitingWriteResponse,
    AwaitingIndication,
}

/// The outstanding procedure of a context.
#[derive(Debug)]
pub enum PendingRequest<P: Profile> {
    Read(AttributeOf<P>),
    Write(P::Characteristic),
    Configure(P::Descriptor),
    /// Write to a control point, completed by the peer's indicated response.
    ControlPoint {
        characteristic: P::Characteristic,
        request: Vec<u8, MAX_WRITE_LEN>,
        phase: ControlPointPhase,
    },
}

impl<P: Profile> PendingRequest<P> {
    /// The operation a completion for this request reports on.
    pub fn operation(&self) -> OperationOf<P> {
        use super::Operation;

        match self {
            PendingRequest::Read(attribute) => Operation::Read(*attribute),
            PendingRequest::Write(c) => Operation::Write(*c),
            PendingRequest::ControlPoint { characteristic, .. } => Operation::Write(*characteristic),
            PendingRequest::Configure(d) => Operation::Configure(*d),
        }
    }
}

/// A procedure started on the peer that has not completed yet.
#[derive(Debug)]
pub struct PendingOp<P: Profile> {
    pub request: PendingRequest<P>,
    /// Handle the response is expected on.
    pub handle: AttHandle,
    /// When the procedure was started, or last made progress.
    pub armed: Instant,
}

/// Collector state for one connection.
#[derive(Debug)]
pub struct ConnectionContext<P: Profile> {
    conn: ConnHandle,
    owner: TaskId,
    /// Number of service instances reported by the ongoing discovery.
    pub(crate) nb_svc: u8,
    /// When discovery was started, while it is running.
    pub(crate) discovery: Option<Instant>,
    pub(crate) content: ServiceContent,
    /// Set once the service layout is known.
    pub(crate) ready: bool,
    pub(crate) pending: Option<PendingOp<P>>,
}

impl<P: Profile> ConnectionContext<P> {
    pub(crate) fn new(conn: ConnHandle, owner: TaskId) -> Self {
        Self {
            conn,
            owner,
            nb_svc: 0,
            discovery: None,
            content: ServiceContent::new::<P>(),
            ready: false,
            pending: None,
        }
    }

    pub fn conn(&self) -> ConnHandle {
        self.conn
    }

    /// The task that enabled the profile, and receives confirmations and values.
    pub fn owner(&self) -> TaskId {
        self.owner
    }

    pub fn content(&self) -> &ServiceContent {
        &self.content
    }

    pub fn state(&self) -> State {
        match (&self.pending, self.ready) {
            (Some(_), _) => State::Busy,
            (None, true) => State::Connected,
            (None, false) => State::Idle,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_discovering(&self) -> bool {
        self.discovery.is_some()
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<&PendingOp<P>> {
        self.pending.as_ref()
    }

    /// When the running discovery or request was armed.
    pub(crate) fn armed(&self) -> Option<Instant> {
        self.discovery
            .or_else(|| self.pending.as_ref().map(|op| op.armed))
    }
}
