//! The generic collector engine.
//!
//! A [`Collector`] keeps one [`ConnectionContext`] per connected peer that has the profile
//! enabled. Each context runs the same small state machine:
//!
//! ```notrust
//!           Enable          discovery ok
//! (none) ----------> Idle ----------------> Connected <---------+
//!                     |                        |                |
//!                     | discovery failed       | Read / Write / | response, timeout
//!                     v                        v  Configure     |
//!                  (none)                     Busy -------------+
//! ```
//!
//! Disabling the profile or losing the connection removes the context from any state.
//!
//! At most one request is outstanding per connection. Responses from the transport are matched
//! against it by attribute handle; anything that does not match is logged and dropped.
//!
//! [`Collector`]: struct.Collector.html
//! [`ConnectionContext`]: struct.ConnectionContext.html

mod content;
mod context;
mod error;
mod event;
mod pool;

#[cfg(test)]
mod tests;

pub use self::content::{CharSlot, DescSlot, ServiceContent, MAX_CHARACTERISTICS, MAX_DESCRIPTORS};
pub use self::context::{ConnectionContext, ControlPointPhase, PendingOp, PendingRequest, State};
pub use self::error::ProfileError;
pub use self::event::{
    Command, EnableMode, Event, EventSink, Operation, OperationOf, TaskId,
};
pub use self::pool::Pool;

use {
    crate::{
        att::{AttHandle, ErrorCode},
        config::Config,
        gatt::{ConnHandle, DiscoveredService, GattClient, GattEvent, Properties, WriteKind},
        profile::{Attribute, AttributeOf, Profile, Slot},
        time::{Duration, Instant, Timer},
        utils::HexSlice,
        MAX_CONNECTIONS, MAX_WRITE_LEN,
    },
    heapless::Vec,
};

/// Returns the context of `conn` if it can accept a new request.
fn ready_context<P: Profile, const N: usize>(
    pool: &mut Pool<P, N>,
    conn: ConnHandle,
) -> Result<&mut ConnectionContext<P>, ProfileError> {
    let ctx = pool
        .lookup_mut(conn)
        .ok_or(ProfileError::RequestDisallowed)?;
    if !ctx.ready {
        return Err(ProfileError::RequestDisallowed);
    }
    if ctx.pending.is_some() {
        return Err(ProfileError::Busy);
    }
    Ok(ctx)
}

/// Collector engine tracking up to `N` connections.
pub struct Collector<C: Config, const N: usize = MAX_CONNECTIONS> {
    pool: Pool<C::Profile, N>,
    transport: C::Transport,
    sink: C::Sink,
    timer: C::Timer,
}

impl<C: Config, const N: usize> Collector<C, N> {
    /// Creates a collector with no connection contexts.
    pub fn new(transport: C::Transport, sink: C::Sink, timer: C::Timer) -> Self {
        Self {
            pool: Pool::new(),
            transport,
            sink,
            timer,
        }
    }

    /// Drops all connection contexts and their outstanding requests without notifying anyone.
    pub fn reset(&mut self) {
        info!("{}: reset, dropping {} contexts", C::Profile::NAME, self.pool.len());
        self.pool.reset_all();
    }

    /// Returns the context of `conn`, if the profile is enabled on it.
    pub fn context(&self, conn: ConnHandle) -> Option<&ConnectionContext<C::Profile>> {
        self.pool.lookup(conn)
    }

    pub fn pool(&self) -> &Pool<C::Profile, N> {
        &self.pool
    }

    pub fn transport(&self) -> &C::Transport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut C::Transport {
        &mut self.transport
    }

    pub fn sink(&self) -> &C::Sink {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut C::Sink {
        &mut self.sink
    }

    pub fn timer(&self) -> &C::Timer {
        &self.timer
    }

    /// Handles a request from an application task.
    pub fn process_command(&mut self, cmd: Command<C::Profile>) {
        trace!("{}: {:?}", C::Profile::NAME, cmd);

        let conn = cmd.conn();
        let src = cmd.src();
        let operation = cmd.operation();
        let result = match cmd {
            Command::Enable { mode, .. } => {
                self.enable(conn, src, mode);
                return;
            }
            Command::Disable { .. } => {
                self.disable(conn, src);
                return;
            }
            Command::Read { attribute, .. } => self.start_read(conn, attribute),
            Command::Write {
                characteristic,
                value,
                ..
            } => self.start_write(conn, characteristic, value),
            Command::Configure {
                descriptor, value, ..
            } => self.start_configure(conn, descriptor, value),
        };

        if let Err(status) = result {
            debug!(
                "{}: {:?} on {:?} rejected: {}",
                C::Profile::NAME,
                operation,
                conn,
                status
            );
            self.sink.send(
                src,
                Event::Completion {
                    conn,
                    operation,
                    status: Err(status),
                },
            );
        }
    }

    /// Handles the outcome of a GATT procedure, or a value pushed by the peer.
    pub fn process_gatt(&mut self, event: GattEvent<'_>) {
        trace!("{}: {:?}", C::Profile::NAME, event);

        match event {
            GattEvent::ServiceFound { conn, service } => self.service_found(conn, service),
            GattEvent::DiscoveryComplete { conn, status } => self.discovery_complete(conn, status),
            GattEvent::ReadResponse {
                conn,
                handle,
                result,
            } => self.read_response(conn, handle, result),
            GattEvent::WriteResponse {
                conn,
                handle,
                status,
            } => self.write_response(conn, handle, status),
            GattEvent::Notification {
                conn,
                handle,
                value,
            } => self.value_received(conn, handle, value, false),
            GattEvent::Indication {
                conn,
                handle,
                value,
            } => self.value_received(conn, handle, value, true),
            GattEvent::Disconnected { conn } => self.disconnected(conn),
        }
    }

    /// Forces completion of whatever is outstanding on `conn` with a timeout.
    ///
    /// A timed out request completes with `ProfileError::Timeout` and leaves the context
    /// connected. A timed out discovery fails the enable and removes the context. Does nothing if
    /// nothing is outstanding.
    pub fn timeout(&mut self, conn: ConnHandle) {
        let ctx = match self.pool.lookup_mut(conn) {
            Some(ctx) => ctx,
            None => return,
        };
        let owner = ctx.owner();

        if ctx.discovery.take().is_some() {
            warn!("{}: discovery on {:?} timed out", C::Profile::NAME, conn);
            self.pool.destroy(conn);
            self.sink.send(
                owner,
                Event::EnableConfirm {
                    conn,
                    result: Err(ProfileError::Timeout),
                },
            );
        } else if let Some(op) = ctx.pending.take() {
            warn!(
                "{}: {:?} on {:?} timed out",
                C::Profile::NAME,
                op.request,
                conn
            );
            self.sink.send(
                owner,
                Event::Completion {
                    conn,
                    operation: op.request.operation(),
                    status: Err(ProfileError::Timeout),
                },
            );
        }
    }

    /// Times out every procedure that has been outstanding for longer than
    /// `Config::PROCEDURE_TIMEOUT`.
    ///
    /// Elapsed time is measured with wrapping 32-bit [`Instant`]s, so the platform must call this
    /// at least once per wraparound of its timer (about 71 minutes) while anything is
    /// outstanding. A procedure that is not scanned within one wraparound of being armed looks
    /// freshly armed again. Calling it at [`Collector::next_deadline`] satisfies this.
    pub fn check_timeouts(&mut self) {
        let limit = match C::PROCEDURE_TIMEOUT {
            Some(limit) => limit,
            None => return,
        };
        let now = self.timer.now();

        let expired: Vec<ConnHandle, N> = self
            .pool
            .iter()
            .filter(|ctx| {
                ctx.armed()
                    .map_or(false, |armed| now.duration_since(armed) >= limit)
            })
            .map(|ctx| ctx.conn())
            .collect();

        for conn in expired {
            self.timeout(conn);
        }
    }

    /// Returns the earliest instant at which `check_timeouts` has something to do.
    ///
    /// Returns `None` when nothing is outstanding or timeouts are disabled. The returned instant
    /// is only meaningful if it is acted on within one wraparound of the timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        let limit = C::PROCEDURE_TIMEOUT?;
        let now = self.timer.now();

        self.pool
            .iter()
            .filter_map(|ctx| ctx.armed())
            .map(|armed| {
                let elapsed = now.duration_since(armed).as_micros();
                Duration::from_micros(limit.as_micros().saturating_sub(elapsed))
            })
            .min()
            .map(|remaining| now + remaining)
    }

    fn enable(&mut self, conn: ConnHandle, src: TaskId, mode: EnableMode) {
        let now = self.timer.now();
        let ctx = match self.pool.create(conn, src) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("{}: enable on {:?} refused: {}", C::Profile::NAME, conn, e);
                self.sink
                    .send(src, Event::EnableConfirm { conn, result: Err(e) });
                return;
            }
        };

        let result = match mode {
            EnableMode::UseSupplied(content) => match content.check_shape::<C::Profile>() {
                Ok(()) => {
                    ctx.content = content.clone();
                    ctx.ready = true;
                    info!(
                        "{}: enabled on {:?} with stored content",
                        C::Profile::NAME,
                        conn
                    );
                    Ok(content)
                }
                Err(e) => Err(e),
            },
            EnableMode::Discover => {
                let uuid = C::Profile::SERVICE.into();
                match self.transport.discover_service(conn, uuid) {
                    Ok(()) => {
                        debug!("{}: discovering on {:?}", C::Profile::NAME, conn);
                        ctx.discovery = Some(now);
                        return;
                    }
                    Err(e) => {
                        error!(
                            "{}: could not start discovery on {:?}: {:?}",
                            C::Profile::NAME,
                            conn,
                            e
                        );
                        Err(ProfileError::DiscoveryFailed)
                    }
                }
            }
        };

        if result.is_err() {
            self.pool.destroy(conn);
        }
        self.sink.send(src, Event::EnableConfirm { conn, result });
    }

    fn disable(&mut self, conn: ConnHandle, src: TaskId) {
        match self.pool.destroy(conn) {
            Some(ctx) => {
                if let Some(op) = ctx.pending() {
                    debug!("{}: dropping {:?}", C::Profile::NAME, op.request);
                }
                info!("{}: disabled on {:?}", C::Profile::NAME, conn);
                self.sink
                    .send(ctx.owner(), Event::DisableIndication { conn });
            }
            None => self.sink.send(
                src,
                Event::Completion {
                    conn,
                    operation: Operation::Disable,
                    status: Err(ProfileError::NoConnection),
                },
            ),
        }
    }

    fn disconnected(&mut self, conn: ConnHandle) {
        match self.pool.destroy(conn) {
            Some(ctx) => {
                info!(
                    "{}: {:?} disconnected, busy={}",
                    C::Profile::NAME,
                    conn,
                    ctx.is_busy()
                );
                self.sink
                    .send(ctx.owner(), Event::DisableIndication { conn });
            }
            None => trace!("{}: ignoring disconnect of {:?}", C::Profile::NAME, conn),
        }
    }

    fn start_read(
        &mut self,
        conn: ConnHandle,
        attribute: AttributeOf<C::Profile>,
    ) -> Result<(), ProfileError> {
        let ctx = ready_context(&mut self.pool, conn)?;
        let handle = ctx
            .content
            .handle_of::<C::Profile>(attribute)
            .ok_or(ProfileError::InexistentHandle)?;

        self.transport.read(conn, handle)?;
        ctx.pending = Some(PendingOp {
            request: PendingRequest::Read(attribute),
            handle,
            armed: self.timer.now(),
        });
        Ok(())
    }

    fn start_write(
        &mut self,
        conn: ConnHandle,
        characteristic: <C::Profile as Profile>::Characteristic,
        value: Vec<u8, MAX_WRITE_LEN>,
    ) -> Result<(), ProfileError> {
        let ctx = ready_context(&mut self.pool, conn)?;
        let slot = *ctx
            .content
            .characteristic(characteristic)
            .ok_or(ProfileError::InexistentHandle)?;

        C::Profile::check_write(characteristic, &value).map_err(|e| {
            debug!("{}: invalid write {:?}: {}", C::Profile::NAME, HexSlice(&value[..]), e);
            ProfileError::InvalidParameter
        })?;

        let kind = if slot.properties.contains(Properties::WRITE) {
            WriteKind::Request
        } else if slot.properties.contains(Properties::WRITE_NO_RSP) {
            WriteKind::Command
        } else {
            return Err(ProfileError::NotPermitted);
        };

        self.transport.write(conn, slot.value, &value, kind)?;

        match kind {
            WriteKind::Command => {
                let owner = ctx.owner();
                self.sink.send(
                    owner,
                    Event::Completion {
                        conn,
                        operation: Operation::Write(characteristic),
                        status: Ok(()),
                    },
                );
            }
            WriteKind::Request => {
                let control_point = C::Profile::CHARACTERISTICS
                    .get(characteristic.index())
                    .map_or(false, |def| def.control_point);
                let request = if control_point {
                    PendingRequest::ControlPoint {
                        characteristic,
                        request: value,
                        phase: ControlPointPhase::AwaitingWriteResponse,
                    }
                } else {
                    PendingRequest::Write(characteristic)
                };
                ctx.pending = Some(PendingOp {
                    request,
                    handle: slot.value,
                    armed: self.timer.now(),
                });
            }
        }
        Ok(())
    }

    fn start_configure(
        &mut self,
        conn: ConnHandle,
        descriptor: <C::Profile as Profile>::Descriptor,
        value: u16,
    ) -> Result<(), ProfileError> {
        let ctx = ready_context(&mut self.pool, conn)?;
        let handle = ctx
            .content
            .descriptor(descriptor)
            .ok_or(ProfileError::InexistentHandle)?;

        let allowed = C::Profile::DESCRIPTORS
            .get(descriptor.index())
            .map_or(0, |def| def.allowed);
        if value & !allowed != 0 {
            return Err(ProfileError::InvalidParameter);
        }

        self.transport
            .write(conn, handle, &value.to_le_bytes(), WriteKind::Request)?;
        ctx.pending = Some(PendingOp {
            request: PendingRequest::Configure(descriptor),
            handle,
            armed: self.timer.now(),
        });
        Ok(())
    }

    fn service_found(&mut self, conn: ConnHandle, service: &DiscoveredService) {
        let ctx = match self.pool.lookup_mut(conn) {
            Some(ctx) if ctx.is_discovering() => ctx,
            _ => {
                warn!("{}: unexpected service on {:?}", C::Profile::NAME, conn);
                return;
            }
        };
        if service.uuid != C::Profile::SERVICE {
            warn!(
                "{}: ignoring foreign service {:?} on {:?}",
                C::Profile::NAME,
                service.uuid,
                conn
            );
            return;
        }

        ctx.nb_svc = ctx.nb_svc.saturating_add(1);
        if ctx.nb_svc == 1 {
            ctx.content = ServiceContent::extract::<C::Profile>(service);
        }
        debug!(
            "{}: service #{} at {:?} on {:?}",
            C::Profile::NAME,
            ctx.nb_svc,
            service.range,
            conn
        );
    }

    fn discovery_complete(&mut self, conn: ConnHandle, status: Result<(), ErrorCode>) {
        let ctx = match self.pool.lookup_mut(conn) {
            Some(ctx) if ctx.is_discovering() => ctx,
            _ => {
                warn!(
                    "{}: unexpected end of discovery on {:?}",
                    C::Profile::NAME,
                    conn
                );
                return;
            }
        };
        ctx.discovery = None;
        let owner = ctx.owner();

        let result = match status {
            Ok(()) | Err(ErrorCode::AttributeNotFound) => match ctx.nb_svc {
                0 => Err(ProfileError::ServiceNotFound),
                1 => ctx.content.validate::<C::Profile>(),
                _ => Err(ProfileError::ServiceDuplicated),
            },
            Err(code) => {
                warn!(
                    "{}: discovery on {:?} failed: {:?}",
                    C::Profile::NAME,
                    conn,
                    code
                );
                Err(ProfileError::DiscoveryFailed)
            }
        };

        match result {
            Ok(()) => {
                ctx.ready = true;
                let content = ctx.content.clone();
                info!("{}: enabled on {:?}", C::Profile::NAME, conn);
                self.sink.send(
                    owner,
                    Event::EnableConfirm {
                        conn,
                        result: Ok(content),
                    },
                );
            }
            Err(e) => {
                warn!("{}: enable on {:?} failed: {}", C::Profile::NAME, conn, e);
                self.pool.destroy(conn);
                self.sink
                    .send(owner, Event::EnableConfirm { conn, result: Err(e) });
            }
        }
    }

    fn read_response(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        result: Result<&[u8], ErrorCode>,
    ) {
        let ctx = match self.pool.lookup_mut(conn) {
            Some(ctx) => ctx,
            None => {
                warn!("{}: read response for unknown {:?}", C::Profile::NAME, conn);
                return;
            }
        };
        let attribute = match &ctx.pending {
            Some(PendingOp {
                request: PendingRequest::Read(attribute),
                handle: expected,
                ..
            }) if *expected == handle => *attribute,
            _ => {
                warn!(
                    "{}: dropping stale read response on {:?} {:?}",
                    C::Profile::NAME,
                    conn,
                    handle
                );
                return;
            }
        };
        ctx.pending = None;
        let owner = ctx.owner();

        let status = match result {
            Ok(value) => match C::Profile::decode(attribute, value) {
                Ok(decoded) => {
                    self.sink.send(
                        owner,
                        Event::ValueIndication {
                            conn,
                            attribute,
                            value: decoded,
                        },
                    );
                    Ok(())
                }
                Err(e) => {
                    warn!(
                        "{}: cannot decode {:?} from {:?}: {}",
                        C::Profile::NAME,
                        attribute,
                        HexSlice(value),
                        e
                    );
                    Err(ProfileError::InvalidValue)
                }
            },
            Err(code) => Err(ProfileError::Att(code)),
        };

        self.sink.send(
            owner,
            Event::Completion {
                conn,
                operation: Operation::Read(attribute),
                status,
            },
        );
    }

    fn write_response(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        status: Result<(), ErrorCode>,
    ) {
        let now = self.timer.now();
        let ctx = match self.pool.lookup_mut(conn) {
            Some(ctx) => ctx,
            None => {
                warn!("{}: write response for unknown {:?}", C::Profile::NAME, conn);
                return;
            }
        };
        let op = match ctx.pending.as_mut() {
            Some(op) if op.handle == handle => op,
            _ => {
                warn!(
                    "{}: dropping stale write response on {:?} {:?}",
                    C::Profile::NAME,
                    conn,
                    handle
                );
                return;
            }
        };

        match &mut op.request {
            PendingRequest::Read(_) => {
                warn!("{}: write response to a read on {:?}", C::Profile::NAME, conn);
                return;
            }
            PendingRequest::ControlPoint { phase, .. } => match (*phase, status) {
                (ControlPointPhase::AwaitingWriteResponse, Ok(())) => {
                    // The procedure result arrives in an indication, restart the clock for it.
                    *phase = ControlPointPhase::AwaitingIndication;
                    op.armed = now;
                    return;
                }
                (ControlPointPhase::AwaitingIndication, _) => {
                    warn!(
                        "{}: duplicate control point write response on {:?}",
                        C::Profile::NAME,
                        conn
                    );
                    return;
                }
                (ControlPointPhase::AwaitingWriteResponse, Err(_)) => {}
            },
            PendingRequest::Write(_) | PendingRequest::Configure(_) => {}
        }

        let operation = op.request.operation();
        ctx.pending = None;
        let owner = ctx.owner();
        self.sink.send(
            owner,
            Event::Completion {
                conn,
                operation,
                status: status.map_err(ProfileError::Att),
            },
        );
    }

    fn value_received(&mut self, conn: ConnHandle, handle: AttHandle, value: &[u8], indication: bool) {
        let ctx = match self.pool.lookup_mut(conn) {
            Some(ctx) if ctx.ready => ctx,
            _ => {
                trace!("{}: dropping value on {:?}", C::Profile::NAME, conn);
                return;
            }
        };
        let characteristic = match ctx.content.characteristic_at::<C::Profile>(handle) {
            Some(c) => c,
            None => {
                warn!(
                    "{}: value on unknown handle {:?} of {:?}",
                    C::Profile::NAME,
                    handle,
                    conn
                );
                return;
            }
        };
        let attribute = Attribute::Characteristic(characteristic);
        let owner = ctx.owner();
        let decoded = C::Profile::decode(attribute, value);

        let answers_control_point = indication
            && match &ctx.pending {
                Some(PendingOp {
                    request:
                        PendingRequest::ControlPoint {
                            request,
                            phase: ControlPointPhase::AwaitingIndication,
                            ..
                        },
                    handle: expected,
                    ..
                }) => *expected == handle && C::Profile::is_control_point_response(request, value),
                _ => false,
            };

        if answers_control_point {
            ctx.pending = None;
            let status = match decoded {
                Ok(decoded) => {
                    self.sink.send(
                        owner,
                        Event::ValueIndication {
                            conn,
                            attribute,
                            value: decoded,
                        },
                    );
                    Ok(())
                }
                Err(e) => {
                    warn!(
                        "{}: malformed control point response {:?}: {}",
                        C::Profile::NAME,
                        HexSlice(value),
                        e
                    );
                    Err(ProfileError::InvalidValue)
                }
            };
            self.sink.send(
                owner,
                Event::Completion {
                    conn,
                    operation: Operation::Write(characteristic),
                    status,
                },
            );
            return;
        }

        match decoded {
            Ok(decoded) => self.sink.send(
                owner,
                Event::ValueIndication {
                    conn,
                    attribute,
                    value: decoded,
                },
            ),
            Err(e) => {
                warn!(
                    "{}: cannot decode {:?} from {:?}: {}",
                    C::Profile::NAME,
                    attribute,
                    HexSlice(value),
                    e
                );
                self.sink.send(
                    owner,
                    Event::ErrorIndication {
                        conn,
                        status: ProfileError::InvalidValue,
                    },
                );
            }
        }
    }
}
