//! Engine tests against a scripted transport.

use super::*;
use crate::{
    att::{AttUuid, HandleRange},
    bytes::ToBytes,
    gatt::{ClientConfig, TransportError},
    profile::{
        cpp::{self, CyclingPower},
        findme::{self, AlertLevel, FindMe},
    },
    uuid::Uuid16,
};
use std::{cell::Cell, rc::Rc};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Discover(ConnHandle, AttUuid),
    Read(ConnHandle, AttHandle),
    Write(ConnHandle, AttHandle, std::vec::Vec<u8>, WriteKind),
}

/// Records every procedure it is asked to start, or refuses them all when `refuse` is set.
#[derive(Default)]
struct MockTransport {
    calls: std::vec::Vec<Call>,
    refuse: Option<TransportError>,
}

impl MockTransport {
    fn accept(&mut self, call: Call) -> Result<(), TransportError> {
        match self.refuse {
            Some(e) => Err(e),
            None => {
                self.calls.push(call);
                Ok(())
            }
        }
    }
}

impl GattClient for MockTransport {
    fn discover_service(&mut self, conn: ConnHandle, uuid: AttUuid) -> Result<(), TransportError> {
        self.accept(Call::Discover(conn, uuid))
    }

    fn read(&mut self, conn: ConnHandle, handle: AttHandle) -> Result<(), TransportError> {
        self.accept(Call::Read(conn, handle))
    }

    fn write(
        &mut self,
        conn: ConnHandle,
        handle: AttHandle,
        value: &[u8],
        kind: WriteKind,
    ) -> Result<(), TransportError> {
        self.accept(Call::Write(conn, handle, value.to_vec(), kind))
    }
}

struct MockSink<P: Profile> {
    events: std::vec::Vec<(TaskId, Event<P>)>,
}

/// Lets generic helpers drain whatever a sink received.
trait Recorded<P: Profile> {
    fn take(&mut self) -> std::vec::Vec<(TaskId, Event<P>)>;
}

impl<P: Profile> Recorded<P> for MockSink<P> {
    fn take(&mut self) -> std::vec::Vec<(TaskId, Event<P>)> {
        std::mem::take(&mut self.events)
    }
}

impl<P: Profile> Default for MockSink<P> {
    fn default() -> Self {
        Self {
            events: std::vec::Vec::new(),
        }
    }
}

impl<P: Profile> EventSink<P> for MockSink<P> {
    fn send(&mut self, dest: TaskId, event: Event<P>) {
        self.events.push((dest, event));
    }
}

/// A clock the test moves forward by hand.
#[derive(Clone, Default)]
struct MockTimer(Rc<Cell<u32>>);

impl MockTimer {
    fn advance(&self, d: Duration) {
        self.0.set(self.0.get().wrapping_add(d.as_micros()));
    }
}

impl Timer for MockTimer {
    fn now(&self) -> Instant {
        Instant::from_raw_micros(self.0.get())
    }
}

enum PowerConfig {}

impl Config for PowerConfig {
    type Profile = CyclingPower;
    type Transport = MockTransport;
    type Sink = MockSink<CyclingPower>;
    type Timer = MockTimer;
}

enum FindMeConfig {}

impl Config for FindMeConfig {
    type Profile = FindMe;
    type Transport = MockTransport;
    type Sink = MockSink<FindMe>;
    type Timer = MockTimer;
    const PROCEDURE_TIMEOUT: Option<Duration> = None;
}

const CONN: ConnHandle = ConnHandle::from_raw(1);
const APP: TaskId = TaskId(1);
const OTHER: TaskId = TaskId(2);

const MEASUREMENT: AttHandle = AttHandle::from_raw(0x12);
const MEASUREMENT_CCC: AttHandle = AttHandle::from_raw(0x13);
const FEATURE: AttHandle = AttHandle::from_raw(0x16);
const CONTROL_POINT: AttHandle = AttHandle::from_raw(0x1A);
const ALERT_LEVEL: AttHandle = AttHandle::from_raw(0x22);

fn h(raw: u16) -> AttHandle {
    AttHandle::from_raw(raw)
}

fn cycling_power_service() -> DiscoveredService {
    let range = HandleRange::new(h(0x10), h(0x1F)).unwrap();
    let mut svc = DiscoveredService::new(range, Uuid16(0x1818));
    svc.push_characteristic(Uuid16(0x2A63), h(0x11), MEASUREMENT, Properties::NOTIFY)
        .unwrap();
    svc.push_descriptor(Uuid16(0x2902), MEASUREMENT_CCC).unwrap();
    svc.push_characteristic(Uuid16(0x2A65), h(0x15), FEATURE, Properties::READ)
        .unwrap();
    svc.push_characteristic(Uuid16(0x2A5D), h(0x17), h(0x18), Properties::READ)
        .unwrap();
    svc.push_characteristic(
        Uuid16(0x2A66),
        h(0x19),
        CONTROL_POINT,
        Properties::WRITE | Properties::INDICATE,
    )
    .unwrap();
    svc.push_descriptor(Uuid16(0x2902), h(0x1B)).unwrap();
    svc
}

fn immediate_alert_service() -> DiscoveredService {
    let range = HandleRange::new(h(0x20), h(0x22)).unwrap();
    let mut svc = DiscoveredService::new(range, Uuid16(0x1802));
    svc.push_characteristic(Uuid16(0x2A06), h(0x21), ALERT_LEVEL, Properties::WRITE_NO_RSP)
        .unwrap();
    svc
}

fn collector<C>() -> (Collector<C, 2>, MockTimer)
where
    C: Config<Transport = MockTransport, Timer = MockTimer>,
    C::Sink: Default,
{
    let timer = MockTimer::default();
    let collector = Collector::new(MockTransport::default(), C::Sink::default(), timer.clone());
    (collector, timer)
}

/// Runs discovery against `svc` and returns the confirmation sent to the application.
fn discover<C>(collector: &mut Collector<C, 2>, svc: &DiscoveredService) -> Event<C::Profile>
where
    C: Config,
    C::Sink: Recorded<C::Profile>,
{
    collector.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::Discover,
    });
    collector.process_gatt(GattEvent::ServiceFound {
        conn: CONN,
        service: svc,
    });
    collector.process_gatt(GattEvent::DiscoveryComplete {
        conn: CONN,
        status: Err(ErrorCode::AttributeNotFound),
    });

    let mut events = collector.sink_mut().take();
    assert_eq!(events.len(), 1);
    let (dest, event) = events.remove(0);
    assert_eq!(dest, APP);
    event
}

fn power_collector() -> (Collector<PowerConfig, 2>, MockTimer) {
    let (mut c, timer) = collector::<PowerConfig>();
    discover(&mut c, &cycling_power_service());
    c.transport_mut().calls.clear();
    (c, timer)
}

fn state<C: Config>(c: &Collector<C, 2>) -> Option<State> {
    c.context(CONN).map(|ctx| ctx.state())
}

fn read(attribute: AttributeOf<CyclingPower>) -> Command<CyclingPower> {
    Command::Read {
        conn: CONN,
        src: APP,
        attribute,
    }
}

fn completion<P: Profile>(operation: OperationOf<P>, status: Result<(), ProfileError>) -> Event<P> {
    Event::Completion {
        conn: CONN,
        operation,
        status,
    }
}

const READ_FEATURE: AttributeOf<CyclingPower> =
    Attribute::Characteristic(cpp::Characteristic::Feature);

#[test]
fn enable_discovers_service() {
    let (mut c, _) = collector::<PowerConfig>();
    let svc = cycling_power_service();

    c.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::Discover,
    });
    assert_eq!(
        c.transport().calls,
        [Call::Discover(CONN, Uuid16(0x1818).into())]
    );
    assert_eq!(state(&c), Some(State::Idle));

    c.process_gatt(GattEvent::ServiceFound {
        conn: CONN,
        service: &svc,
    });
    c.process_gatt(GattEvent::DiscoveryComplete {
        conn: CONN,
        status: Ok(()),
    });

    let content = ServiceContent::extract::<CyclingPower>(&svc);
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn: CONN,
                result: Ok(content),
            }
        )]
    );
    assert_eq!(state(&c), Some(State::Connected));
}

#[test]
fn enable_fails_without_service() {
    let (mut c, _) = collector::<PowerConfig>();
    c.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::Discover,
    });
    c.process_gatt(GattEvent::DiscoveryComplete {
        conn: CONN,
        status: Err(ErrorCode::AttributeNotFound),
    });

    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn: CONN,
                result: Err(ProfileError::ServiceNotFound),
            }
        )]
    );
    assert!(c.context(CONN).is_none());
}

#[test]
fn enable_fails_on_duplicate_service() {
    let (mut c, _) = collector::<PowerConfig>();
    let svc = cycling_power_service();
    c.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::Discover,
    });
    c.process_gatt(GattEvent::ServiceFound {
        conn: CONN,
        service: &svc,
    });
    c.process_gatt(GattEvent::ServiceFound {
        conn: CONN,
        service: &svc,
    });
    c.process_gatt(GattEvent::DiscoveryComplete {
        conn: CONN,
        status: Ok(()),
    });

    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn: CONN,
                result: Err(ProfileError::ServiceDuplicated),
            }
        )]
    );
    assert!(c.context(CONN).is_none());
}

#[test]
fn enable_validates_characteristics() {
    let (mut c, _) = collector::<PowerConfig>();
    let mut svc = cycling_power_service();
    svc.characteristics.retain(|ch| ch.uuid != Uuid16(0x2A65));
    assert_eq!(
        discover(&mut c, &svc),
        Event::EnableConfirm {
            conn: CONN,
            result: Err(ProfileError::CharacteristicMissing),
        }
    );
    assert!(c.context(CONN).is_none());

    let mut svc = cycling_power_service();
    svc.characteristics[0].properties = Properties::READ;
    assert_eq!(
        discover(&mut c, &svc),
        Event::EnableConfirm {
            conn: CONN,
            result: Err(ProfileError::WrongProperties),
        }
    );
    assert!(c.context(CONN).is_none());
}

#[test]
fn enable_discovery_failures() {
    let (mut c, _) = collector::<PowerConfig>();
    c.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::Discover,
    });
    c.process_gatt(GattEvent::DiscoveryComplete {
        conn: CONN,
        status: Err(ErrorCode::InsufficientResources),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn: CONN,
                result: Err(ProfileError::DiscoveryFailed),
            }
        )]
    );

    c.transport_mut().refuse = Some(TransportError::Disconnected);
    c.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::Discover,
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn: CONN,
                result: Err(ProfileError::DiscoveryFailed),
            }
        )]
    );
    assert!(c.pool().is_empty());
}

#[test]
fn enable_twice_keeps_first_context() {
    let (mut c, _) = power_collector();
    c.process_command(Command::Enable {
        conn: CONN,
        src: OTHER,
        mode: EnableMode::Discover,
    });

    assert_eq!(
        c.sink_mut().take(),
        [(
            OTHER,
            Event::EnableConfirm {
                conn: CONN,
                result: Err(ProfileError::AllocationExhausted),
            }
        )]
    );
    assert!(c.transport().calls.is_empty());
    assert_eq!(state(&c), Some(State::Connected));
    assert_eq!(c.context(CONN).map(|ctx| ctx.owner()), Some(APP));
}

#[test]
fn pool_exhaustion() {
    let (mut c, _) = collector::<PowerConfig>();
    for raw in 1..=3 {
        c.process_command(Command::Enable {
            conn: ConnHandle::from_raw(raw),
            src: APP,
            mode: EnableMode::Discover,
        });
    }

    assert_eq!(c.pool().len(), 2);
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn: ConnHandle::from_raw(3),
                result: Err(ProfileError::AllocationExhausted),
            }
        )]
    );
}

#[test]
fn requests_need_enabled_context() {
    let (mut c, _) = collector::<PowerConfig>();
    c.process_command(Command::Read {
        conn: CONN,
        src: OTHER,
        attribute: READ_FEATURE,
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            OTHER,
            completion(
                Operation::Read(READ_FEATURE),
                Err(ProfileError::RequestDisallowed)
            )
        )]
    );
    assert!(c.pool().is_empty());

    // Still discovering.
    c.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::Discover,
    });
    c.process_command(read(READ_FEATURE));
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(
                Operation::Read(READ_FEATURE),
                Err(ProfileError::RequestDisallowed)
            )
        )]
    );
    assert_eq!(c.transport().calls.len(), 1);
}

#[test]
fn read_delivers_value_then_completion() {
    let (mut c, _) = power_collector();
    c.process_command(read(READ_FEATURE));
    assert_eq!(c.transport().calls, [Call::Read(CONN, FEATURE)]);
    assert_eq!(state(&c), Some(State::Busy));

    c.process_gatt(GattEvent::ReadResponse {
        conn: CONN,
        handle: FEATURE,
        result: Ok(&[0x0F, 0x00, 0x00, 0x00]),
    });

    assert_eq!(
        c.sink_mut().take(),
        [
            (
                APP,
                Event::ValueIndication {
                    conn: CONN,
                    attribute: READ_FEATURE,
                    value: cpp::Value::Feature(cpp::Feature::from_bits_truncate(0x0F)),
                }
            ),
            (APP, completion(Operation::Read(READ_FEATURE), Ok(()))),
        ]
    );
    assert_eq!(state(&c), Some(State::Connected));
}

#[test]
fn read_errors() {
    let (mut c, _) = power_collector();

    c.process_command(read(READ_FEATURE));
    c.process_gatt(GattEvent::ReadResponse {
        conn: CONN,
        handle: FEATURE,
        result: Err(ErrorCode::InsufficientEncryption),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(
                Operation::Read(READ_FEATURE),
                Err(ProfileError::Att(ErrorCode::InsufficientEncryption))
            )
        )]
    );

    c.process_command(read(READ_FEATURE));
    c.process_gatt(GattEvent::ReadResponse {
        conn: CONN,
        handle: FEATURE,
        result: Ok(&[0x0F, 0x00]),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(Operation::Read(READ_FEATURE), Err(ProfileError::InvalidValue))
        )]
    );

    let vector = Attribute::Characteristic(cpp::Characteristic::Vector);
    c.process_command(read(vector));
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(Operation::Read(vector), Err(ProfileError::InexistentHandle))
        )]
    );
    assert_eq!(c.transport().calls.len(), 2);
}

#[test]
fn second_request_is_busy() {
    let (mut c, _) = power_collector();
    c.process_command(read(READ_FEATURE));

    let location = Attribute::Characteristic(cpp::Characteristic::SensorLocation);
    c.process_command(Command::Read {
        conn: CONN,
        src: OTHER,
        attribute: location,
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            OTHER,
            completion(Operation::Read(location), Err(ProfileError::Busy))
        )]
    );

    // The first read is undisturbed.
    c.process_gatt(GattEvent::ReadResponse {
        conn: CONN,
        handle: FEATURE,
        result: Ok(&[0x00, 0x00, 0x00, 0x00]),
    });
    let events = c.sink_mut().take();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].1, completion(Operation::Read(READ_FEATURE), Ok(())));
}

#[test]
fn stale_responses_are_dropped() {
    let (mut c, _) = power_collector();
    c.process_command(read(READ_FEATURE));

    c.process_gatt(GattEvent::ReadResponse {
        conn: CONN,
        handle: h(0x18),
        result: Ok(&[0x01]),
    });
    c.process_gatt(GattEvent::WriteResponse {
        conn: CONN,
        handle: FEATURE,
        status: Ok(()),
    });
    c.process_gatt(GattEvent::ReadResponse {
        conn: ConnHandle::from_raw(9),
        handle: FEATURE,
        result: Ok(&[0x00, 0x00, 0x00, 0x00]),
    });

    assert!(c.sink_mut().take().is_empty());
    assert_eq!(state(&c), Some(State::Busy));
}

#[test]
fn timeout_completes_once() {
    let (mut c, timer) = power_collector();
    c.process_command(read(READ_FEATURE));

    timer.advance(Duration::from_secs(10));
    assert_eq!(
        c.next_deadline(),
        Some(Instant::from_raw_micros(30_000_000))
    );
    c.check_timeouts();
    assert!(c.sink_mut().take().is_empty());

    timer.advance(Duration::from_secs(20));
    c.check_timeouts();
    c.check_timeouts();
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(Operation::Read(READ_FEATURE), Err(ProfileError::Timeout))
        )]
    );
    assert_eq!(state(&c), Some(State::Connected));
    assert_eq!(c.next_deadline(), None);

    // The late answer is stale now.
    c.process_gatt(GattEvent::ReadResponse {
        conn: CONN,
        handle: FEATURE,
        result: Ok(&[0x00, 0x00, 0x00, 0x00]),
    });
    c.timeout(CONN);
    assert!(c.sink_mut().take().is_empty());
}

#[test]
fn timeout_across_timer_wraparound() {
    let (mut c, timer) = power_collector();
    timer.advance(Duration::from_micros(u32::max_value() - 10_000_000));
    c.process_command(read(READ_FEATURE));
    assert_eq!(
        c.next_deadline(),
        Some(Instant::from_raw_micros(19_999_999))
    );

    // Scanned late, but well within one wraparound of the timer.
    timer.advance(Duration::from_secs(60));
    assert_eq!(c.next_deadline(), Some(timer.now()));
    c.check_timeouts();
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(Operation::Read(READ_FEATURE), Err(ProfileError::Timeout))
        )]
    );
    assert_eq!(state(&c), Some(State::Connected));
}

#[test]
fn discovery_times_out() {
    let (mut c, timer) = collector::<PowerConfig>();
    c.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::Discover,
    });
    timer.advance(Duration::ATT_TRANSACTION);
    c.check_timeouts();

    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn: CONN,
                result: Err(ProfileError::Timeout),
            }
        )]
    );
    assert!(c.pool().is_empty());
}

#[test]
fn transport_refusal_releases_request() {
    let (mut c, _) = power_collector();
    c.transport_mut().refuse = Some(TransportError::NoResources);
    c.process_command(read(READ_FEATURE));

    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(
                Operation::Read(READ_FEATURE),
                Err(ProfileError::Transport(TransportError::NoResources))
            )
        )]
    );
    assert_eq!(state(&c), Some(State::Connected));
}

#[test]
fn configure_descriptor() {
    let (mut c, _) = power_collector();
    let ccc = cpp::Descriptor::MeasurementClientConfig;

    c.process_command(Command::Configure {
        conn: CONN,
        src: APP,
        descriptor: ccc,
        value: ClientConfig::INDICATION.bits(),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(Operation::Configure(ccc), Err(ProfileError::InvalidParameter))
        )]
    );

    c.process_command(Command::Configure {
        conn: CONN,
        src: APP,
        descriptor: ccc,
        value: ClientConfig::NOTIFICATION.bits(),
    });
    assert_eq!(
        c.transport().calls,
        [Call::Write(CONN, MEASUREMENT_CCC, vec![0x01, 0x00], WriteKind::Request)]
    );
    c.process_gatt(GattEvent::WriteResponse {
        conn: CONN,
        handle: MEASUREMENT_CCC,
        status: Ok(()),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(APP, completion(Operation::Configure(ccc), Ok(())))]
    );

    let vector_ccc = cpp::Descriptor::VectorClientConfig;
    c.process_command(Command::Configure {
        conn: CONN,
        src: APP,
        descriptor: vector_ccc,
        value: ClientConfig::NOTIFICATION.bits(),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(
                Operation::Configure(vector_ccc),
                Err(ProfileError::InexistentHandle)
            )
        )]
    );
}

#[test]
fn write_to_read_only_characteristic() {
    let (mut c, _) = power_collector();
    let feature = cpp::Characteristic::Feature;
    c.process_command(Command::Write {
        conn: CONN,
        src: APP,
        characteristic: feature,
        value: Vec::from_slice(&[0x01]).unwrap(),
    });

    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(Operation::Write(feature), Err(ProfileError::NotPermitted))
        )]
    );
    assert!(c.transport().calls.is_empty());
}

#[test]
fn control_point_procedure() {
    let (mut c, timer) = power_collector();
    let cp = cpp::Characteristic::ControlPoint;

    c.process_command(
        Command::write(CONN, APP, cp, &cpp::Request::RequestCrankLength).unwrap(),
    );
    assert_eq!(
        c.transport().calls,
        [Call::Write(CONN, CONTROL_POINT, vec![0x05], WriteKind::Request)]
    );

    timer.advance(Duration::from_secs(20));
    c.process_gatt(GattEvent::WriteResponse {
        conn: CONN,
        handle: CONTROL_POINT,
        status: Ok(()),
    });
    assert!(c.sink_mut().take().is_empty());
    assert_eq!(state(&c), Some(State::Busy));

    // The write response restarted the clock.
    timer.advance(Duration::from_secs(15));
    c.check_timeouts();
    assert!(c.sink_mut().take().is_empty());

    // Measurements keep flowing while the procedure runs.
    c.process_gatt(GattEvent::Notification {
        conn: CONN,
        handle: MEASUREMENT,
        value: &[0x00, 0x00, 0x64, 0x00],
    });
    let events = c.sink_mut().take();
    match &events[..] {
        [(APP, Event::ValueIndication {
            value: cpp::Value::Measurement(m),
            ..
        })] => assert_eq!(m.power, 100),
        other => panic!("unexpected events {:?}", other),
    }

    // An answer to some other request does not complete this one.
    c.process_gatt(GattEvent::Indication {
        conn: CONN,
        handle: CONTROL_POINT,
        value: &[0x20, 0x07, 0x01],
    });
    assert_eq!(c.sink_mut().take().len(), 1);
    assert_eq!(state(&c), Some(State::Busy));

    c.process_gatt(GattEvent::Indication {
        conn: CONN,
        handle: CONTROL_POINT,
        value: &[0x20, 0x05, 0x01, 0x5E, 0x01],
    });
    let events = c.sink_mut().take();
    assert_eq!(events.len(), 2);
    match &events[0] {
        (APP, Event::ValueIndication {
            value: cpp::Value::ControlPoint(response),
            ..
        }) => {
            assert_eq!(response.request, 0x05);
            assert!(response.is_success());
            assert_eq!(&response.parameter[..], &[0x5E, 0x01]);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(events[1], (APP, completion(Operation::Write(cp), Ok(()))));
    assert_eq!(state(&c), Some(State::Connected));
}

#[test]
fn control_point_unanswered() {
    let (mut c, timer) = power_collector();
    let cp = cpp::Characteristic::ControlPoint;

    c.process_command(Command::write(CONN, APP, cp, &cpp::Request::StartOffsetCompensation).unwrap());
    c.process_gatt(GattEvent::WriteResponse {
        conn: CONN,
        handle: CONTROL_POINT,
        status: Ok(()),
    });
    timer.advance(Duration::ATT_TRANSACTION);
    c.check_timeouts();

    assert_eq!(
        c.sink_mut().take(),
        [(APP, completion(Operation::Write(cp), Err(ProfileError::Timeout)))]
    );
}

#[test]
fn control_point_opcode_checked() {
    let (mut c, _) = power_collector();
    let cp = cpp::Characteristic::ControlPoint;
    c.process_command(Command::Write {
        conn: CONN,
        src: APP,
        characteristic: cp,
        value: Vec::from_slice(&[0x42]).unwrap(),
    });

    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(Operation::Write(cp), Err(ProfileError::InvalidParameter))
        )]
    );
}

#[test]
fn unsolicited_values() {
    let (mut c, _) = power_collector();

    c.process_gatt(GattEvent::Notification {
        conn: CONN,
        handle: MEASUREMENT,
        value: &[0x00],
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::ErrorIndication {
                conn: CONN,
                status: ProfileError::InvalidValue,
            }
        )]
    );

    c.process_gatt(GattEvent::Notification {
        conn: CONN,
        handle: h(0x1E),
        value: &[0x00],
    });
    c.process_gatt(GattEvent::Notification {
        conn: ConnHandle::from_raw(5),
        handle: MEASUREMENT,
        value: &[0x00, 0x00, 0x64, 0x00],
    });
    assert!(c.sink_mut().take().is_empty());
}

#[test]
fn disable_is_idempotent() {
    let (mut c, _) = power_collector();
    c.process_command(read(READ_FEATURE));

    c.process_command(Command::Disable {
        conn: CONN,
        src: OTHER,
    });
    assert_eq!(
        c.sink_mut().take(),
        [(APP, Event::DisableIndication { conn: CONN })]
    );
    assert!(c.context(CONN).is_none());

    c.process_command(Command::Disable {
        conn: CONN,
        src: OTHER,
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            OTHER,
            completion(Operation::Disable, Err(ProfileError::NoConnection))
        )]
    );
}

#[test]
fn disconnect_releases_pending_request() {
    let (mut c, _) = power_collector();
    c.process_command(read(READ_FEATURE));

    c.process_gatt(GattEvent::Disconnected { conn: CONN });
    assert_eq!(
        c.sink_mut().take(),
        [(APP, Event::DisableIndication { conn: CONN })]
    );

    c.process_gatt(GattEvent::ReadResponse {
        conn: CONN,
        handle: FEATURE,
        result: Ok(&[0x00, 0x00, 0x00, 0x00]),
    });
    c.process_gatt(GattEvent::Disconnected { conn: CONN });
    assert!(c.sink_mut().take().is_empty());
    assert_eq!(c.next_deadline(), None);
}

#[test]
fn find_me_alert() {
    let (mut c, _) = collector::<FindMeConfig>();
    let svc = immediate_alert_service();
    match discover(&mut c, &svc) {
        Event::EnableConfirm { result: Ok(_), .. } => {}
        other => panic!("unexpected event {:?}", other),
    }

    let alert = findme::Characteristic::AlertLevel;
    c.process_command(Command::write(CONN, APP, alert, &AlertLevel::High).unwrap());
    assert_eq!(
        c.transport().calls[1..],
        [Call::Write(CONN, ALERT_LEVEL, vec![0x02], WriteKind::Command)]
    );
    assert_eq!(
        c.sink_mut().take(),
        [(APP, completion(Operation::Write(alert), Ok(())))]
    );
    assert_eq!(state(&c), Some(State::Connected));
    assert_eq!(c.next_deadline(), None);

    c.process_command(Command::Write {
        conn: CONN,
        src: APP,
        characteristic: alert,
        value: Vec::from_slice(&[0x03]).unwrap(),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            completion(Operation::Write(alert), Err(ProfileError::InvalidParameter))
        )]
    );
}

#[test]
fn enable_with_stored_content() {
    let (mut c, _) = collector::<FindMeConfig>();
    let content = ServiceContent::extract::<FindMe>(&immediate_alert_service());

    c.process_command(Command::Enable {
        conn: CONN,
        src: APP,
        mode: EnableMode::UseSupplied(content.clone()),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn: CONN,
                result: Ok(content),
            }
        )]
    );
    assert!(c.transport().calls.is_empty());
    assert_eq!(state(&c), Some(State::Connected));

    let conn = ConnHandle::from_raw(2);
    c.process_command(Command::Enable {
        conn,
        src: APP,
        mode: EnableMode::UseSupplied(ServiceContent::new::<CyclingPower>()),
    });
    assert_eq!(
        c.sink_mut().take(),
        [(
            APP,
            Event::EnableConfirm {
                conn,
                result: Err(ProfileError::InvalidParameter),
            }
        )]
    );
    assert!(c.context(conn).is_none());
}

#[test]
fn reset_drops_contexts() {
    let (mut c, _) = power_collector();
    c.process_command(read(READ_FEATURE));
    c.reset();

    assert!(c.pool().is_empty());
    assert_eq!(c.next_deadline(), None);
    assert!(c.sink_mut().take().is_empty());
}

#[test]
fn command_helper_encodes() {
    let cmd = Command::<CyclingPower>::write(
        CONN,
        APP,
        cpp::Characteristic::ControlPoint,
        &cpp::Request::SetCrankLength(350),
    )
    .unwrap();
    match cmd {
        Command::Write { value, .. } => assert_eq!(&value[..], &[0x04, 0x5E, 0x01]),
        other => panic!("unexpected command {:?}", other),
    }
    assert_eq!(&cpp::Request::SetCrankLength(350).encode().unwrap()[..], &[0x04, 0x5E, 0x01]);
}
