//! Cycling Power Profile, collector role.
//!
//! Reads power, torque and pedalling data from a *Cycling Power Service* (`0x1818`) sensor.

use {
    super::{
        control_point::{self, Response},
        decode_client_config, decode_server_config, Attribute, AttributeOf, CharacteristicDef,
        CrankRevolutions, DescriptorDef, Profile, Requirement, SensorLocation, WheelRevolutions,
    },
    crate::{
        bytes::{ByteReader, ByteWriter, FromBytes, ToBytes},
        gatt::{ClientConfig, Properties, ServerConfig},
        uuid::Uuid16,
        Error,
    },
    bitflags::bitflags,
    heapless::Vec,
};

/// Maximum number of magnitudes in a single vector notification.
pub const MAX_MAGNITUDES: usize = 9;

/// The Cycling Power collector profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CyclingPower {}

slots! {
    pub enum Characteristic {
        Measurement = 0,
        Vector = 1,
        Feature = 2,
        SensorLocation = 3,
        ControlPoint = 4,
    }
}

slots! {
    pub enum Descriptor {
        MeasurementClientConfig = 0,
        MeasurementServerConfig = 1,
        VectorClientConfig = 2,
        ControlPointClientConfig = 3,
    }
}

const CHARACTERISTICS: &[CharacteristicDef] = &[
    CharacteristicDef::mandatory(0x2A63, Properties::NOTIFY),
    CharacteristicDef::optional(0x2A64, Properties::NOTIFY),
    CharacteristicDef::mandatory(0x2A65, Properties::READ),
    CharacteristicDef::mandatory(0x2A5D, Properties::READ),
    CharacteristicDef::control_point(0x2A66, Requirement::Optional),
];

const DESCRIPTORS: &[DescriptorDef] = &[
    DescriptorDef::client_config(0, Requirement::Mandatory, ClientConfig::NOTIFICATION),
    DescriptorDef::server_config(0, Requirement::Optional),
    DescriptorDef::client_config(1, Requirement::Mandatory, ClientConfig::NOTIFICATION),
    DescriptorDef::client_config(4, Requirement::Mandatory, ClientConfig::INDICATION),
];

bitflags! {
    /// Presence flags of a Cycling Power Measurement.
    pub struct MeasurementFlags: u16 {
        const PEDAL_POWER_BALANCE           = 1 << 0;
        const PEDAL_POWER_BALANCE_LEFT      = 1 << 1;
        const ACCUMULATED_TORQUE            = 1 << 2;
        const ACCUMULATED_TORQUE_CRANK      = 1 << 3;
        const WHEEL_REVOLUTIONS             = 1 << 4;
        const CRANK_REVOLUTIONS             = 1 << 5;
        const EXTREME_FORCE_MAGNITUDES      = 1 << 6;
        const EXTREME_TORQUE_MAGNITUDES     = 1 << 7;
        const EXTREME_ANGLES                = 1 << 8;
        const TOP_DEAD_SPOT_ANGLE           = 1 << 9;
        const BOTTOM_DEAD_SPOT_ANGLE        = 1 << 10;
        const ACCUMULATED_ENERGY            = 1 << 11;
        const OFFSET_COMPENSATION_INDICATOR = 1 << 12;
    }
}

bitflags! {
    /// Presence flags of a Cycling Power Vector.
    pub struct VectorFlags: u8 {
        const CRANK_REVOLUTIONS         = 1 << 0;
        const FIRST_CRANK_ANGLE         = 1 << 1;
        const FORCE_MAGNITUDES          = 1 << 2;
        const TORQUE_MAGNITUDES         = 1 << 3;
        const DIRECTION_TANGENTIAL      = 1 << 4;
        const DIRECTION_RADIAL          = 1 << 5;
    }
}

bitflags! {
    /// Cycling Power Feature bits.
    pub struct Feature: u32 {
        const PEDAL_POWER_BALANCE                 = 1 << 0;
        const ACCUMULATED_TORQUE                  = 1 << 1;
        const WHEEL_REVOLUTION_DATA               = 1 << 2;
        const CRANK_REVOLUTION_DATA               = 1 << 3;
        const EXTREME_MAGNITUDES                  = 1 << 4;
        const EXTREME_ANGLES                      = 1 << 5;
        const DEAD_SPOT_ANGLES                    = 1 << 6;
        const ACCUMULATED_ENERGY                  = 1 << 7;
        const OFFSET_COMPENSATION_INDICATOR       = 1 << 8;
        const OFFSET_COMPENSATION                 = 1 << 9;
        const MEASUREMENT_CONTENT_MASKING         = 1 << 10;
        const MULTIPLE_SENSOR_LOCATIONS           = 1 << 11;
        const CRANK_LENGTH_ADJUSTMENT             = 1 << 12;
        const CHAIN_LENGTH_ADJUSTMENT             = 1 << 13;
        const CHAIN_WEIGHT_ADJUSTMENT             = 1 << 14;
        const SPAN_LENGTH_ADJUSTMENT              = 1 << 15;
        const SENSOR_MEASUREMENT_CONTEXT_TORQUE   = 1 << 16;
        const INSTANTANEOUS_MEASUREMENT_DIRECTION = 1 << 17;
        const FACTORY_CALIBRATION_DATE            = 1 << 18;
        const ENHANCED_OFFSET_COMPENSATION        = 1 << 19;
    }
}

/// Maximum and minimum of a magnitude over the last crank revolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Extremes {
    pub max: i16,
    pub min: i16,
}

/// Crank angles (in degrees, 12 bits each) at which the extreme force or torque was measured.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtremeAngles {
    pub max: u16,
    pub min: u16,
}

/// A Cycling Power Measurement notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub flags: MeasurementFlags,
    /// Instantaneous power in watts.
    pub power: i16,
    /// Pedal power balance, in 1/2 percent.
    pub pedal_power_balance: Option<u8>,
    /// Accumulated torque, in 1/32 Nm.
    pub accumulated_torque: Option<u16>,
    pub wheel_revolutions: Option<WheelRevolutions>,
    pub crank_revolutions: Option<CrankRevolutions>,
    pub extreme_force: Option<Extremes>,
    pub extreme_torque: Option<Extremes>,
    pub extreme_angles: Option<ExtremeAngles>,
    pub top_dead_spot_angle: Option<u16>,
    pub bottom_dead_spot_angle: Option<u16>,
    /// Accumulated energy, in kJ.
    pub accumulated_energy: Option<u16>,
}

impl FromBytes<'_> for Measurement {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let flags = MeasurementFlags::from_bits_truncate(bytes.read_u16_le()?);
        let power = bytes.read_i16_le()?;
        let has = |flag| flags.contains(flag);

        let pedal_power_balance = if has(MeasurementFlags::PEDAL_POWER_BALANCE) {
            Some(bytes.read_u8()?)
        } else {
            None
        };
        let accumulated_torque = if has(MeasurementFlags::ACCUMULATED_TORQUE) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };
        let wheel_revolutions = if has(MeasurementFlags::WHEEL_REVOLUTIONS) {
            Some(WheelRevolutions::from_bytes(bytes)?)
        } else {
            None
        };
        let crank_revolutions = if has(MeasurementFlags::CRANK_REVOLUTIONS) {
            Some(CrankRevolutions::from_bytes(bytes)?)
        } else {
            None
        };
        let extreme_force = if has(MeasurementFlags::EXTREME_FORCE_MAGNITUDES) {
            Some(Extremes {
                max: bytes.read_i16_le()?,
                min: bytes.read_i16_le()?,
            })
        } else {
            None
        };
        let extreme_torque = if has(MeasurementFlags::EXTREME_TORQUE_MAGNITUDES) {
            Some(Extremes {
                max: bytes.read_i16_le()?,
                min: bytes.read_i16_le()?,
            })
        } else {
            None
        };
        let extreme_angles = if has(MeasurementFlags::EXTREME_ANGLES) {
            let packed = bytes.read_u24_le()?;
            Some(ExtremeAngles {
                max: (packed & 0x0FFF) as u16,
                min: (packed >> 12) as u16,
            })
        } else {
            None
        };
        let top_dead_spot_angle = if has(MeasurementFlags::TOP_DEAD_SPOT_ANGLE) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };
        let bottom_dead_spot_angle = if has(MeasurementFlags::BOTTOM_DEAD_SPOT_ANGLE) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };
        let accumulated_energy = if has(MeasurementFlags::ACCUMULATED_ENERGY) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };

        Ok(Self {
            flags,
            power,
            pedal_power_balance,
            accumulated_torque,
            wheel_revolutions,
            crank_revolutions,
            extreme_force,
            extreme_torque,
            extreme_angles,
            top_dead_spot_angle,
            bottom_dead_spot_angle,
            accumulated_energy,
        })
    }
}

/// A Cycling Power Vector notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vector {
    pub flags: VectorFlags,
    pub crank_revolutions: Option<CrankRevolutions>,
    /// Angle of the first magnitude, in degrees.
    pub first_crank_angle: Option<u16>,
    /// Force magnitudes in newtons, or torque magnitudes in 1/32 Nm, depending on `flags`.
    pub magnitudes: Vec<i16, MAX_MAGNITUDES>,
}

impl FromBytes<'_> for Vector {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let flags = VectorFlags::from_bits_truncate(bytes.read_u8()?);
        if flags.contains(VectorFlags::FORCE_MAGNITUDES | VectorFlags::TORQUE_MAGNITUDES) {
            return Err(Error::InvalidValue);
        }

        let crank_revolutions = if flags.contains(VectorFlags::CRANK_REVOLUTIONS) {
            Some(CrankRevolutions::from_bytes(bytes)?)
        } else {
            None
        };
        let first_crank_angle = if flags.contains(VectorFlags::FIRST_CRANK_ANGLE) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };

        let mut magnitudes = Vec::new();
        if flags.intersects(VectorFlags::FORCE_MAGNITUDES | VectorFlags::TORQUE_MAGNITUDES) {
            if bytes.bytes_left() % 2 != 0 {
                return Err(Error::InvalidLength);
            }
            while !bytes.is_empty() {
                magnitudes
                    .push(bytes.read_i16_le()?)
                    .map_err(|_| Error::InvalidLength)?;
            }
        }

        Ok(Self {
            flags,
            crank_revolutions,
            first_crank_angle,
            magnitudes,
        })
    }
}

/// Requests written to the Cycling Power Control Point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Request {
    SetCumulativeValue(u32),
    UpdateSensorLocation(SensorLocation),
    RequestSupportedSensorLocations,
    /// Crank length in 1/2 mm.
    SetCrankLength(u16),
    RequestCrankLength,
    /// Chain length in mm.
    SetChainLength(u16),
    RequestChainLength,
    /// Chain weight in g.
    SetChainWeight(u16),
    RequestChainWeight,
    /// Span length in mm.
    SetSpanLength(u16),
    RequestSpanLength,
    StartOffsetCompensation,
    MaskMeasurementContent(MeasurementFlags),
    RequestSamplingRate,
    RequestFactoryCalibrationDate,
    StartEnhancedOffsetCompensation,
}

/// Highest opcode defined for the control point.
const MAX_OPCODE: u8 = 0x10;

impl Request {
    pub fn opcode(&self) -> u8 {
        match self {
            Request::SetCumulativeValue(_) => 0x01,
            Request::UpdateSensorLocation(_) => 0x02,
            Request::RequestSupportedSensorLocations => 0x03,
            Request::SetCrankLength(_) => 0x04,
            Request::RequestCrankLength => 0x05,
            Request::SetChainLength(_) => 0x06,
            Request::RequestChainLength => 0x07,
            Request::SetChainWeight(_) => 0x08,
            Request::RequestChainWeight => 0x09,
            Request::SetSpanLength(_) => 0x0A,
            Request::RequestSpanLength => 0x0B,
            Request::StartOffsetCompensation => 0x0C,
            Request::MaskMeasurementContent(_) => 0x0D,
            Request::RequestSamplingRate => 0x0E,
            Request::RequestFactoryCalibrationDate => 0x0F,
            Request::StartEnhancedOffsetCompensation => 0x10,
        }
    }
}

impl ToBytes for Request {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u8(self.opcode())?;
        match *self {
            Request::SetCumulativeValue(value) => writer.write_u32_le(value),
            Request::UpdateSensorLocation(location) => writer.write_u8(location.into()),
            Request::SetCrankLength(value)
            | Request::SetChainLength(value)
            | Request::SetChainWeight(value)
            | Request::SetSpanLength(value) => writer.write_u16_le(value),
            Request::MaskMeasurementContent(mask) => writer.write_u16_le(mask.bits()),
            _ => Ok(()),
        }
    }
}

/// Decoded Cycling Power values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Measurement(Measurement),
    Vector(Vector),
    Feature(Feature),
    SensorLocation(SensorLocation),
    ControlPoint(Response),
    ClientConfig(ClientConfig),
    ServerConfig(ServerConfig),
}

impl Profile for CyclingPower {
    const NAME: &'static str = "CPP";
    const SERVICE: Uuid16 = Uuid16(0x1818);
    const CHARACTERISTICS: &'static [CharacteristicDef] = CHARACTERISTICS;
    const DESCRIPTORS: &'static [DescriptorDef] = DESCRIPTORS;

    type Characteristic = Characteristic;
    type Descriptor = Descriptor;
    type Value = Value;

    fn decode(attribute: AttributeOf<Self>, value: &[u8]) -> Result<Value, Error> {
        Ok(match attribute {
            Attribute::Characteristic(Characteristic::Measurement) => {
                Value::Measurement(Measurement::from_slice(value)?)
            }
            Attribute::Characteristic(Characteristic::Vector) => {
                Value::Vector(Vector::from_slice(value)?)
            }
            Attribute::Characteristic(Characteristic::Feature) => {
                let mut bytes = ByteReader::new(value);
                Value::Feature(Feature::from_bits_truncate(bytes.read_u32_le()?))
            }
            Attribute::Characteristic(Characteristic::SensorLocation) => {
                Value::SensorLocation(SensorLocation::from_slice(value)?)
            }
            Attribute::Characteristic(Characteristic::ControlPoint) => Value::ControlPoint(
                Response::decode(control_point::RESPONSE_CODE, value)?,
            ),
            Attribute::Descriptor(Descriptor::MeasurementServerConfig) => {
                Value::ServerConfig(decode_server_config(value)?)
            }
            Attribute::Descriptor(_) => Value::ClientConfig(decode_client_config(value)?),
        })
    }

    fn check_write(characteristic: Characteristic, value: &[u8]) -> Result<(), Error> {
        match (characteristic, value.first()) {
            (Characteristic::ControlPoint, Some(op)) if (1..=MAX_OPCODE).contains(op) => Ok(()),
            (Characteristic::ControlPoint, _) => Err(Error::InvalidValue),
            _ => Ok(()),
        }
    }
}
