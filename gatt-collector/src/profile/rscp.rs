//! Running Speed and Cadence Profile, collector role.
//!
//! The SC Control Point is shared with the [speed and cadence profile](../cscp/index.html).

use {
    super::{
        control_point::{self, Response},
        cscp::{check_sc_request, Request},
        decode_client_config, Attribute, AttributeOf, CharacteristicDef, DescriptorDef, Profile,
        Requirement, SensorLocation,
    },
    crate::{
        bytes::{ByteReader, FromBytes},
        gatt::{ClientConfig, Properties},
        uuid::Uuid16,
        Error,
    },
    bitflags::bitflags,
};

/// The Running Speed and Cadence collector profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunningSpeedCadence {}

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
    CharacteristicDef::mandatory(0x2A53, Properties::NOTIFY),
    CharacteristicDef::mandatory(0x2A54, Properties::READ),
    CharacteristicDef::optional(0x2A5D, Properties::READ),
    CharacteristicDef::control_point(0x2A55, Requirement::Optional),
];

const DESCRIPTORS: &[DescriptorDef] = &[
    DescriptorDef::client_config(0, Requirement::Mandatory, ClientConfig::NOTIFICATION),
    DescriptorDef::client_config(3, Requirement::Mandatory, ClientConfig::INDICATION),
];

bitflags! {
    pub struct MeasurementFlags: u8 {
        const STRIDE_LENGTH  = 1 << 0;
        const TOTAL_DISTANCE = 1 << 1;
        const RUNNING        = 1 << 2;
    }
}

bitflags! {
    pub struct Feature: u16 {
        const STRIDE_LENGTH             = 1 << 0;
        const TOTAL_DISTANCE            = 1 << 1;
        const WALKING_OR_RUNNING_STATUS = 1 << 2;
        const CALIBRATION_PROCEDURE     = 1 << 3;
        const MULTIPLE_SENSOR_LOCATIONS = 1 << 4;
    }
}

/// An RSC Measurement notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Instantaneous speed, in 1/256 m/s.
    pub speed: u16,
    /// Instantaneous cadence, in steps per minute.
    pub cadence: u8,
    /// Stride length, in cm.
    pub stride_length: Option<u16>,
    /// Total distance, in dm.
    pub total_distance: Option<u32>,
    /// `false` while walking.
    pub running: bool,
}

impl FromBytes<'_> for Measurement {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let flags = MeasurementFlags::from_bits_truncate(bytes.read_u8()?);
        let speed = bytes.read_u16_le()?;
        let cadence = bytes.read_u8()?;
        let stride_length = if flags.contains(MeasurementFlags::STRIDE_LENGTH) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };
        let total_distance = if flags.contains(MeasurementFlags::TOTAL_DISTANCE) {
            Some(bytes.read_u32_le()?)
        } else {
            None
        };
        Ok(Self {
            speed,
            cadence,
            stride_length,
            total_distance,
            running: flags.contains(MeasurementFlags::RUNNING),
        })
    }
}

/// Decoded RSC values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Measurement(Measurement),
    Feature(Feature),
    SensorLocation(SensorLocation),
    ControlPoint(Response),
    ClientConfig(ClientConfig),
}

/// Control point requests, identical to the CSC ones.
pub type ControlPointRequest = Request;

impl Profile for RunningSpeedCadence {
    const NAME: &'static str = "RSCP";
    const SERVICE: Uuid16 = Uuid16(0x1814);
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
