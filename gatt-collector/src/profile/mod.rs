//! Profile specialisations of the collector engine.
//!
//! A [`Profile`] tells the generic engine which service to look for, which characteristics and
//! descriptors make up that service, and how to turn their raw values into typed ones. Everything
//! else (discovery, the request state machine, timeouts) is shared.
//!
//! The order of the [`Profile::CHARACTERISTICS`] and [`Profile::DESCRIPTORS`] tables defines the
//! slot layout of the [`ServiceContent`] cache, and must match the [`Slot`] indices of the
//! profile's characteristic and descriptor enums.
//!
//! [`Profile`]: trait.Profile.html
//! [`Profile::CHARACTERISTICS`]: trait.Profile.html#associatedconstant.CHARACTERISTICS
//! [`Profile::DESCRIPTORS`]: trait.Profile.html#associatedconstant.DESCRIPTORS
//! [`ServiceContent`]: ../collector/struct.ServiceContent.html
//! [`Slot`]: trait.Slot.html

pub mod control_point;
pub mod cpp;
pub mod cscp;
pub mod findme;
pub mod lanp;
pub mod pasp;
pub mod rscp;

use {
    crate::{
        bytes::{ByteReader, FromBytes},
        gatt::{ClientConfig, Properties, ServerConfig},
        uuid::Uuid16,
        Error,
    },
    core::fmt,
};

/// UUID of the *Sensor Location* characteristic, shared by several sports profiles.
pub const SENSOR_LOCATION: Uuid16 = Uuid16(0x2A5D);

/// A characteristic or descriptor kind of a profile, identified by its position in the
/// profile's table.
pub trait Slot: Copy + fmt::Debug + PartialEq + 'static {
    fn index(self) -> usize;

    fn from_index(index: usize) -> Option<Self>;
}

/// Whether a characteristic or descriptor must be present on the peer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Requirement {
    Mandatory,
    Optional,
}

/// Static description of a characteristic a profile expects.
#[derive(Debug, Copy, Clone)]
pub struct CharacteristicDef {
    pub uuid: Uuid16,
    pub requirement: Requirement,
    /// Properties the peer must declare if it exposes the characteristic at all.
    pub properties: Properties,
    /// Writes complete only when the peer indicates the procedure result on this characteristic.
    pub control_point: bool,
}

impl CharacteristicDef {
    pub const fn mandatory(uuid: u16, properties: Properties) -> Self {
        Self {
            uuid: Uuid16(uuid),
            requirement: Requirement::Mandatory,
            properties,
            control_point: false,
        }
    }

    pub const fn optional(uuid: u16, properties: Properties) -> Self {
        Self {
            uuid: Uuid16(uuid),
            requirement: Requirement::Optional,
            properties,
            control_point: false,
        }
    }

    pub const fn control_point(uuid: u16, requirement: Requirement) -> Self {
        Self {
            uuid: Uuid16(uuid),
            requirement,
            properties: Properties::from_bits_truncate(
                Properties::WRITE.bits() | Properties::INDICATE.bits(),
            ),
            control_point: true,
        }
    }
}

/// Static description of a characteristic descriptor a profile expects.
#[derive(Debug, Copy, Clone)]
pub struct DescriptorDef {
    pub uuid: Uuid16,
    /// Index of the owning characteristic in the profile's characteristic table.
    pub characteristic: usize,
    /// Mandatory descriptors are only required when their characteristic is present.
    pub requirement: Requirement,
    /// Configuration bits the collector may write to this descriptor.
    pub allowed: u16,
}

impl DescriptorDef {
    /// A *Client Characteristic Configuration* descriptor enabling `allowed`.
    pub const fn client_config(
        characteristic: usize,
        requirement: Requirement,
        allowed: ClientConfig,
    ) -> Self {
        Self {
            uuid: crate::gatt::characteristic::CLIENT_CONFIGURATION,
            characteristic,
            requirement,
            allowed: allowed.bits(),
        }
    }

    /// A *Server Characteristic Configuration* descriptor.
    pub const fn server_config(characteristic: usize, requirement: Requirement) -> Self {
        Self {
            uuid: crate::gatt::characteristic::SERVER_CONFIGURATION,
            characteristic,
            requirement,
            allowed: ServerConfig::BROADCAST.bits(),
        }
    }
}

/// Names either a characteristic or a descriptor of profile `P`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Attribute<C, D> {
    Characteristic(C),
    Descriptor(D),
}

/// The [`Attribute`] type of a profile.
///
/// [`Attribute`]: enum.Attribute.html
pub type AttributeOf<P> = Attribute<<P as Profile>::Characteristic, <P as Profile>::Descriptor>;

/// A GATT-based profile the collector can run.
pub trait Profile: fmt::Debug + Sized + 'static {
    /// Short name used in log messages.
    const NAME: &'static str;

    /// UUID of the primary service to discover.
    const SERVICE: Uuid16;

    /// Characteristics of the service, indexed by `Self::Characteristic`.
    const CHARACTERISTICS: &'static [CharacteristicDef];

    /// Descriptors of the service, indexed by `Self::Descriptor`.
    const DESCRIPTORS: &'static [DescriptorDef];

    /// Opcode the peer puts in front of control point responses.
    const CONTROL_POINT_RESPONSE: u8 = control_point::RESPONSE_CODE;

    type Characteristic: Slot;
    type Descriptor: Slot;

    /// Decoded value of any characteristic or descriptor of the profile.
    type Value: fmt::Debug + Clone + PartialEq;

    /// Decodes a value read from, or pushed by, the peer.
    fn decode(attribute: AttributeOf<Self>, value: &[u8]) -> Result<Self::Value, Error>;

    /// Checks a value before it is written to `characteristic`.
    fn check_write(characteristic: Self::Characteristic, value: &[u8]) -> Result<(), Error> {
        let _ = (characteristic, value);
        Ok(())
    }

    /// Returns whether `response`, indicated on a control point, answers `request`.
    fn is_control_point_response(request: &[u8], response: &[u8]) -> bool {
        match (request.first(), response) {
            (Some(op), [code, req, ..]) => *code == Self::CONTROL_POINT_RESPONSE && req == op,
            _ => false,
        }
    }
}

/// Decodes a *Client Characteristic Configuration* value.
pub fn decode_client_config(value: &[u8]) -> Result<ClientConfig, Error> {
    let raw = u16::from_le_bytes(match value {
        [a, b] => [*a, *b],
        _ => return Err(Error::InvalidLength),
    });
    ClientConfig::from_bits(raw).ok_or(Error::InvalidValue)
}

/// Decodes a *Server Characteristic Configuration* value.
pub fn decode_server_config(value: &[u8]) -> Result<ServerConfig, Error> {
    let mut bytes = ByteReader::new(value);
    let raw = bytes.read_u16_le()?;
    if !bytes.is_empty() {
        return Err(Error::IncompleteParse);
    }
    ServerConfig::from_bits(raw).ok_or(Error::InvalidValue)
}

enum_with_unknown! {
    /// Location of a sensor on the body or the bicycle.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum SensorLocation(u8) {
        Other = 0,
        TopOfShoe = 1,
        InShoe = 2,
        Hip = 3,
        FrontWheel = 4,
        LeftCrank = 5,
        RightCrank = 6,
        LeftPedal = 7,
        RightPedal = 8,
        FrontHub = 9,
        RearDropout = 10,
        Chainstay = 11,
        RearWheel = 12,
        RearHub = 13,
        Chest = 14,
        Spider = 15,
        ChainRing = 16,
    }
}

impl FromBytes<'_> for SensorLocation {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        Ok(bytes.read_u8()?.into())
    }
}

/// Cumulative wheel revolutions and the time of the last wheel event.
///
/// The event time unit is 1/1024 s for speed and cadence sensors and 1/2048 s for cycling power
/// sensors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WheelRevolutions {
    pub cumulative: u32,
    pub last_event_time: u16,
}

impl FromBytes<'_> for WheelRevolutions {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        Ok(Self {
            cumulative: bytes.read_u32_le()?,
            last_event_time: bytes.read_u16_le()?,
        })
    }
}

/// Cumulative crank revolutions and the time of the last crank event, in 1/1024 s.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CrankRevolutions {
    pub cumulative: u16,
    pub last_event_time: u16,
}

impl FromBytes<'_> for CrankRevolutions {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        Ok(Self {
            cumulative: bytes.read_u16_le()?,
            last_event_time: bytes.read_u16_le()?,
        })
    }
}

/// Checks that the characteristic and descriptor enums of `P` line up with its tables.
#[cfg(test)]
pub(crate) fn check_tables<P: Profile>() {
    for i in 0..P::CHARACTERISTICS.len() {
        let slot = P::Characteristic::from_index(i).expect("characteristic slot missing");
        assert_eq!(slot.index(), i);
    }
    assert!(P::Characteristic::from_index(P::CHARACTERISTICS.len()).is_none());

    for (i, desc) in P::DESCRIPTORS.iter().enumerate() {
        let slot = P::Descriptor::from_index(i).expect("descriptor slot missing");
        assert_eq!(slot.index(), i);
        assert!(desc.characteristic < P::CHARACTERISTICS.len());
    }
    assert!(P::Descriptor::from_index(P::DESCRIPTORS.len()).is_none());
}
