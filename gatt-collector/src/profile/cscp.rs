//! Cycling Speed and Cadence Profile, collector role.

use {
    super::{
        control_point::{self, Response},
        decode_client_config, Attribute, AttributeOf, CharacteristicDef, CrankRevolutions,
        DescriptorDef, Profile, Requirement, SensorLocation, WheelRevolutions,
    },
    crate::{
        bytes::{ByteReader, ByteWriter, FromBytes, ToBytes},
        gatt::{ClientConfig, Properties},
        uuid::Uuid16,
        Error,
    },
    bitflags::bitflags,
};

/// The Cycling Speed and Cadence collector profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CyclingSpeedCadence {}

slots! {
    pub enum Characteristic {
        Measurement = 0,
        Feature = 1,
        SensorLocation = 2,
        ControlPoint = 3,
    }
}

slots! {
    pub enum Descriptor {
        MeasurementClientConfig = 0,
        ControlPointClientConfig = 1,
    }
}

const CHARACTERISTICS: &[CharacteristicDef] = &[
    CharacteristicDef::mandatory(0x2A5B, Properties::NOTIFY),
    CharacteristicDef::mandatory(0x2A5C, Properties::READ),
    CharacteristicDef::optional(0x2A5D, Properties::READ),
    CharacteristicDef::control_point(0x2A55, Requirement::Optional),
];

const DESCRIPTORS: &[DescriptorDef] = &[
    DescriptorDef::client_config(0, Requirement::Mandatory, ClientConfig::NOTIFICATION),
    DescriptorDef::client_config(3, Requirement::Mandatory, ClientConfig::INDICATION),
];

bitflags! {
    pub struct MeasurementFlags: u8 {
        const WHEEL_REVOLUTIONS = 1 << 0;
        const CRANK_REVOLUTIONS = 1 << 1;
    }
}

bitflags! {
    pub struct Feature: u16 {
        const WHEEL_REVOLUTION_DATA     = 1 << 0;
        const CRANK_REVOLUTION_DATA     = 1 << 1;
        const MULTIPLE_SENSOR_LOCATIONS = 1 << 2;
    }
}

/// A CSC Measurement notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Wheel event time unit is 1/1024 s.
    pub wheel_revolutions: Option<WheelRevolutions>,
    pub crank_revolutions: Option<CrankRevolutions>,
}

impl FromBytes<'_> for Measurement {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let flags = MeasurementFlags::from_bits_truncate(bytes.read_u8()?);
        let wheel_revolutions = if flags.contains(MeasurementFlags::WHEEL_REVOLUTIONS) {
            Some(WheelRevolutions::from_bytes(bytes)?)
        } else {
            None
        };
        let crank_revolutions = if flags.contains(MeasurementFlags::CRANK_REVOLUTIONS) {
            Some(CrankRevolutions::from_bytes(bytes)?)
        } else {
            None
        };
        Ok(Self {
            wheel_revolutions,
            crank_revolutions,
        })
    }
}

/// Requests written to the SC Control Point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Request {
    SetCumulativeValue(u32),
    StartSensorCalibration,
    UpdateSensorLocation(SensorLocation),
    RequestSupportedSensorLocations,
}

impl Request {
    pub fn opcode(&self) -> u8 {
        match self {
            Request::SetCumulativeValue(_) => 0x01,
            Request::StartSensorCalibration => 0x02,
            Request::UpdateSensorLocation(_) => 0x03,
            Request::RequestSupportedSensorLocations => 0x04,
        }
    }
}

impl ToBytes for Request {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u8(self.opcode())?;
        match *self {
            Request::SetCumulativeValue(value) => writer.write_u32_le(value),
            Request::UpdateSensorLocation(location) => writer.write_u8(location.into()),
            Request::StartSensorCalibration | Request::RequestSupportedSensorLocations => Ok(()),
        }
    }
}

/// Checks that `value` is a well-formed SC Control Point request.
///
/// Shared with the Running Speed and Cadence profile, which uses the same control point.
pub(crate) fn check_sc_request(value: &[u8]) -> Result<(), Error> {
    match value {
        [0x01, _, _, _, _] | [0x03, _] | [0x02] | [0x04] => Ok(()),
        [0x01..=0x04, ..] => Err(Error::InvalidLength),
        _ => Err(Error::InvalidValue),
    }
}

/// Decoded CSC values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Measurement(Measurement),
    Feature(Feature),
    SensorLocation(SensorLocation),
    ControlPoint(Response),
    ClientConfig(ClientConfig),
}

impl Profile for CyclingSpeedCadence {
    const NAME: &'static str = "CSCP";
    const SERVICE: Uuid16 = Uuid16(0x1816);
    const CHARACTERISTICS: &'static [CharacteristicDef] = CHARACTERISTICS;
    const DESCRIPTORS: &'static [DescriptorDef] = DESCRIPTORS;
    const CONTROL_POINT_RESPONSE: u8 = control_point::SC_RESPONSE_CODE;

    type Characteristic = Characteristic;
    type Descriptor = Descriptor;
    type Value = Value;

    fn decode(attribute: AttributeOf<Self>, value: &[u8]) -> Result<Value, Error> {
        Ok(match attribute {
            Attribute::Characteristic(Characteristic::Measurement) => {
                Value::Measurement(Measurement::from_slice(value)?)
            }
            Attribute::Characteristic(Characteristic::Feature) => {
                let mut bytes = ByteReader::new(value);
                Value::Feature(Feature::from_bits_truncate(bytes.read_u16_le()?))
            }
            Attribute::Characteristic(Characteristic::SensorLocation) => {
                Value::SensorLocation(SensorLocation::from_slice(value)?)
            }
            Attribute::Characteristic(Characteristic::ControlPoint) => Value::ControlPoint(
                Response::decode(control_point::SC_RESPONSE_CODE, value)?,
            ),
            Attribute::Descriptor(_) => Value::ClientConfig(decode_client_config(value)?),
        })
    }

    fn check_write(characteristic: Characteristic, value: &[u8]) -> Result<(), Error> {
        match characteristic {
            Characteristic::ControlPoint => check_sc_request(value),
            _ => Ok(()),
        }
    }
}
