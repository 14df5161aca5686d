//! Collector configuration trait.

use crate::{
    collector::EventSink,
    gatt::GattClient,
    profile::Profile,
    time::{Duration, Timer},
};

/// Trait for collector configurations.
///
/// This trait bundles the profile the collector runs together with the platform services it
/// needs: the GATT client transport, the sink events are delivered to, and a time source.
///
/// Every application must define a type implementing this trait and supply it to the
/// [`Collector`].
///
/// [`Collector`]: ../collector/struct.Collector.html
pub trait Config {
    /// The profile specialisation.
    type Profile: Profile;

    /// Performs GATT procedures on the peer.
    type Transport: GattClient;

    /// Receives confirmations, completions and values addressed to application tasks.
    type Sink: EventSink<Self::Profile>;

    /// A timesource with microsecond resolution.
    type Timer: Timer;

    /// How long a request may stay outstanding before it is completed with a timeout.
    ///
    /// `None` disables the guard, leaving it to the platform to call [`Collector::timeout`].
    ///
    /// [`Collector::timeout`]: ../collector/struct.Collector.html#method.timeout
    const PROCEDURE_TIMEOUT: Option<Duration> = Some(Duration::ATT_TRANSACTION);
}
