//! Location and Navigation Profile, collector role.
//!
//! Tracks position and navigation data published by a *Location and Navigation Service*
//! (`0x1819`) sensor and drives its routes through the LN Control Point.

use {
    super::{
        control_point::{self, Response},
        decode_client_config, Attribute, AttributeOf, CharacteristicDef, DescriptorDef, Profile,
        Requirement,
    },
    crate::{
        bytes::{ByteReader, ByteWriter, FromBytes, ToBytes},
        gatt::{ClientConfig, Properties},
        uuid::Uuid16,
        Error,
    },
    bitflags::bitflags,
};

/// The Location and Navigation collector profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LocationNavigation {}

slots! {
    pub enum Characteristic {
        Feature = 0,
        LocationSpeed = 1,
        PositionQuality = 2,
        ControlPoint = 3,
        Navigation = 4,
    }
}

slots! {
    pub enum Descriptor {
        LocationSpeedClientConfig = 0,
        ControlPointClientConfig = 1,
        NavigationClientConfig = 2,
    }
}

const CHARACTERISTICS: &[CharacteristicDef] = &[
    CharacteristicDef::mandatory(0x2A6A, Properties::READ),
    CharacteristicDef::mandatory(0x2A67, Properties::NOTIFY),
    CharacteristicDef::optional(0x2A69, Properties::READ),
    CharacteristicDef::control_point(0x2A6B, Requirement::Optional),
    CharacteristicDef::optional(0x2A68, Properties::NOTIFY),
];

const DESCRIPTORS: &[DescriptorDef] = &[
    DescriptorDef::client_config(1, Requirement::Mandatory, ClientConfig::NOTIFICATION),
    DescriptorDef::client_config(3, Requirement::Mandatory, ClientConfig::INDICATION),
    DescriptorDef::client_config(4, Requirement::Mandatory, ClientConfig::NOTIFICATION),
];

bitflags! {
    pub struct Feature: u32 {
        const INSTANTANEOUS_SPEED           = 1 << 0;
        const TOTAL_DISTANCE                = 1 << 1;
        const LOCATION                      = 1 << 2;
        const ELEVATION                     = 1 << 3;
        const HEADING                       = 1 << 4;
        const ROLLING_TIME                  = 1 << 5;
        const UTC_TIME                      = 1 << 6;
        const REMAINING_DISTANCE            = 1 << 7;
        const REMAINING_VERTICAL_DISTANCE   = 1 << 8;
        const ESTIMATED_TIME_OF_ARRIVAL     = 1 << 9;
        const NUMBER_OF_BEACONS_IN_SOLUTION = 1 << 10;
        const NUMBER_OF_BEACONS_IN_VIEW     = 1 << 11;
        const TIME_TO_FIRST_FIX             = 1 << 12;
        const ESTIMATED_HORIZONTAL_ERROR    = 1 << 13;
        const ESTIMATED_VERTICAL_ERROR      = 1 << 14;
        const HORIZONTAL_DILUTION           = 1 << 15;
        const VERTICAL_DILUTION             = 1 << 16;
        const CONTENT_MASKING               = 1 << 17;
        const FIX_RATE_SETTING              = 1 << 18;
        const ELEVATION_SETTING             = 1 << 19;
        const POSITION_STATUS               = 1 << 20;
    }
}

bitflags! {
    pub struct LocationSpeedFlags: u16 {
        const INSTANTANEOUS_SPEED = 1 << 0;
        const TOTAL_DISTANCE      = 1 << 1;
        const LOCATION            = 1 << 2;
        const ELEVATION           = 1 << 3;
        const HEADING             = 1 << 4;
        const ROLLING_TIME        = 1 << 5;
        const UTC_TIME            = 1 << 6;
        const POSITION_STATUS     = 0b11 << 7;
        const SPEED_3D            = 1 << 9;
        const ELEVATION_SOURCE    = 0b11 << 10;
        const HEADING_FROM_COMPASS = 1 << 12;
    }
}

bitflags! {
    pub struct NavigationFlags: u16 {
        const REMAINING_DISTANCE          = 1 << 0;
        const REMAINING_VERTICAL_DISTANCE = 1 << 1;
        const ESTIMATED_TIME_OF_ARRIVAL   = 1 << 2;
        const POSITION_STATUS             = 0b11 << 3;
        const HEADING_FROM_COMPASS        = 1 << 5;
        const TO_DESTINATION              = 1 << 6;
        const WAYPOINT_REACHED            = 1 << 7;
        const DESTINATION_REACHED         = 1 << 8;
    }
}

bitflags! {
    pub struct PositionQualityFlags: u16 {
        const BEACONS_IN_SOLUTION        = 1 << 0;
        const BEACONS_IN_VIEW            = 1 << 1;
        const TIME_TO_FIRST_FIX          = 1 << 2;
        const ESTIMATED_HORIZONTAL_ERROR = 1 << 3;
        const ESTIMATED_VERTICAL_ERROR   = 1 << 4;
        const HORIZONTAL_DILUTION        = 1 << 5;
        const VERTICAL_DILUTION          = 1 << 6;
        const POSITION_STATUS            = 0b11 << 7;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PositionStatus {
    NoPosition,
    Ok,
    Estimated,
    LastKnown,
}

impl PositionStatus {
    /// Extracts the 2-bit status field starting at bit `shift` of `flags`.
    fn from_flags(flags: u16, shift: u32) -> Self {
        match (flags >> shift) & 0b11 {
            0 => PositionStatus::NoPosition,
            1 => PositionStatus::Ok,
            2 => PositionStatus::Estimated,
            _ => PositionStatus::LastKnown,
        }
    }
}

/// A *Date Time* field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl FromBytes<'_> for DateTime {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        Ok(Self {
            year: bytes.read_u16_le()?,
            month: bytes.read_u8()?,
            day: bytes.read_u8()?,
            hours: bytes.read_u8()?,
            minutes: bytes.read_u8()?,
            seconds: bytes.read_u8()?,
        })
    }
}

/// Latitude and longitude, in 1e-7 degrees.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Location {
    pub latitude: i32,
    pub longitude: i32,
}

/// A Location and Speed notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LocationSpeed {
    pub flags: LocationSpeedFlags,
    /// In 1/100 m/s.
    pub speed: Option<u16>,
    /// In 1/10 m.
    pub total_distance: Option<u32>,
    pub location: Option<Location>,
    /// In 1/100 m.
    pub elevation: Option<i32>,
    /// In 1/100 degrees.
    pub heading: Option<u16>,
    /// In seconds.
    pub rolling_time: Option<u8>,
    pub utc_time: Option<DateTime>,
    pub position_status: PositionStatus,
}

impl FromBytes<'_> for LocationSpeed {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let raw = bytes.read_u16_le()?;
        let flags = LocationSpeedFlags::from_bits_truncate(raw);

        let speed = if flags.contains(LocationSpeedFlags::INSTANTANEOUS_SPEED) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };
        let total_distance = if flags.contains(LocationSpeedFlags::TOTAL_DISTANCE) {
            Some(bytes.read_u24_le()?)
        } else {
            None
        };
        let location = if flags.contains(LocationSpeedFlags::LOCATION) {
            Some(Location {
                latitude: bytes.read_i32_le()?,
                longitude: bytes.read_i32_le()?,
            })
        } else {
            None
        };
        let elevation = if flags.contains(LocationSpeedFlags::ELEVATION) {
            Some(bytes.read_i24_le()?)
        } else {
            None
        };
        let heading = if flags.contains(LocationSpeedFlags::HEADING) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };
        let rolling_time = if flags.contains(LocationSpeedFlags::ROLLING_TIME) {
            Some(bytes.read_u8()?)
        } else {
            None
        };
        let utc_time = if flags.contains(LocationSpeedFlags::UTC_TIME) {
            Some(DateTime::from_bytes(bytes)?)
        } else {
            None
        };

        Ok(Self {
            flags,
            speed,
            total_distance,
            location,
            elevation,
            heading,
            rolling_time,
            utc_time,
            position_status: PositionStatus::from_flags(raw, 7),
        })
    }
}

/// A Navigation notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub flags: NavigationFlags,
    /// Bearing towards the next waypoint, in 1/100 degrees.
    pub bearing: u16,
    /// In 1/100 degrees.
    pub heading: u16,
    /// In 1/10 m.
    pub remaining_distance: Option<u32>,
    /// In 1/100 m.
    pub remaining_vertical_distance: Option<i32>,
    pub estimated_arrival: Option<DateTime>,
    pub position_status: PositionStatus,
}

impl FromBytes<'_> for Navigation {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let raw = bytes.read_u16_le()?;
        let flags = NavigationFlags::from_bits_truncate(raw);
        let bearing = bytes.read_u16_le()?;
        let heading = bytes.read_u16_le()?;

        let remaining_distance = if flags.contains(NavigationFlags::REMAINING_DISTANCE) {
            Some(bytes.read_u24_le()?)
        } else {
            None
        };
        let remaining_vertical_distance =
            if flags.contains(NavigationFlags::REMAINING_VERTICAL_DISTANCE) {
                Some(bytes.read_i24_le()?)
            } else {
                None
            };
        let estimated_arrival = if flags.contains(NavigationFlags::ESTIMATED_TIME_OF_ARRIVAL) {
            Some(DateTime::from_bytes(bytes)?)
        } else {
            None
        };

        Ok(Self {
            flags,
            bearing,
            heading,
            remaining_distance,
            remaining_vertical_distance,
            estimated_arrival,
            position_status: PositionStatus::from_flags(raw, 3),
        })
    }
}

/// The Position Quality characteristic.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PositionQuality {
    pub flags: PositionQualityFlags,
    pub beacons_in_solution: Option<u8>,
    pub beacons_in_view: Option<u8>,
    /// In 1/10 s.
    pub time_to_first_fix: Option<u16>,
    /// Estimated horizontal position error, in 1/100 m.
    pub ehpe: Option<u32>,
    /// Estimated vertical position error, in 1/100 m.
    pub evpe: Option<u32>,
    /// Horizontal dilution of precision, in 1/5.
    pub hdop: Option<u8>,
    /// Vertical dilution of precision, in 1/5.
    pub vdop: Option<u8>,
    pub position_status: PositionStatus,
}

impl FromBytes<'_> for PositionQuality {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        let raw = bytes.read_u16_le()?;
        let flags = PositionQualityFlags::from_bits_truncate(raw);
        let beacons_in_solution =
            read_u8_if(bytes, flags, PositionQualityFlags::BEACONS_IN_SOLUTION)?;
        let beacons_in_view = read_u8_if(bytes, flags, PositionQualityFlags::BEACONS_IN_VIEW)?;
        let time_to_first_fix = if flags.contains(PositionQualityFlags::TIME_TO_FIRST_FIX) {
            Some(bytes.read_u16_le()?)
        } else {
            None
        };
        let ehpe = if flags.contains(PositionQualityFlags::ESTIMATED_HORIZONTAL_ERROR) {
            Some(bytes.read_u32_le()?)
        } else {
            None
        };
        let evpe = if flags.contains(PositionQualityFlags::ESTIMATED_VERTICAL_ERROR) {
            Some(bytes.read_u32_le()?)
        } else {
            None
        };
        let hdop = read_u8_if(bytes, flags, PositionQualityFlags::HORIZONTAL_DILUTION)?;
        let vdop = read_u8_if(bytes, flags, PositionQualityFlags::VERTICAL_DILUTION)?;

        Ok(Self {
            flags,
            beacons_in_solution,
            beacons_in_view,
            time_to_first_fix,
            ehpe,
            evpe,
            hdop,
            vdop,
            position_status: PositionStatus::from_flags(raw, 7),
        })
    }
}

fn read_u8_if(
    bytes: &mut ByteReader<'_>,
    flags: PositionQualityFlags,
    flag: PositionQualityFlags,
) -> Result<Option<u8>, Error> {
    if flags.contains(flag) {
        bytes.read_u8().map(Some)
    } else {
        Ok(None)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NavigationControl {
    Stop = 0,
    Start = 1,
    Pause = 2,
    Resume = 3,
    SkipWaypoint = 4,
    StartFromNearest = 5,
}

/// Requests written to the LN Control Point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Request {
    /// Total distance, 24 bits, in 1/10 m.
    SetCumulativeValue(u32),
    MaskLocationSpeedContent(LocationSpeedFlags),
    NavigationControl(NavigationControl),
    RequestNumberOfRoutes,
    RequestNameOfRoute(u16),
    SelectRoute(u16),
    /// Fix rate in seconds.
    SetFixRate(u8),
    /// Elevation, 24 bits, in 1/100 m.
    SetElevation(i32),
}

impl Request {
    pub fn opcode(&self) -> u8 {
        match self {
            Request::SetCumulativeValue(_) => 0x01,
            Request::MaskLocationSpeedContent(_) => 0x02,
            Request::NavigationControl(_) => 0x03,
            Request::RequestNumberOfRoutes => 0x04,
            Request::RequestNameOfRoute(_) => 0x05,
            Request::SelectRoute(_) => 0x06,
            Request::SetFixRate(_) => 0x07,
            Request::SetElevation(_) => 0x08,
        }
    }
}

impl ToBytes for Request {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u8(self.opcode())?;
        match *self {
            Request::SetCumulativeValue(value) => writer.write_u24_le(value),
            Request::MaskLocationSpeedContent(mask) => writer.write_u16_le(mask.bits()),
            Request::NavigationControl(control) => writer.write_u8(control as u8),
            Request::RequestNumberOfRoutes => Ok(()),
            Request::RequestNameOfRoute(route) | Request::SelectRoute(route) => {
                writer.write_u16_le(route)
            }
            Request::SetFixRate(rate) => writer.write_u8(rate),
            Request::SetElevation(elevation) => writer.write_i24_le(elevation),
        }
    }
}

/// Decoded LN values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Feature(Feature),
    LocationSpeed(LocationSpeed),
    PositionQuality(PositionQuality),
    ControlPoint(Response),
    Navigation(Navigation),
    ClientConfig(ClientConfig),
}

impl Profile for LocationNavigation {
    const NAME: &'static str = "LANP";
    const SERVICE: Uuid16 = Uuid16(0x1819);
    const CHARACTERISTICS: &'static [CharacteristicDef] = CHARACTERISTICS;
    const DESCRIPTORS: &'static [DescriptorDef] = DESCRIPTORS;

    type Characteristic = Characteristic;
    type Descriptor = Descriptor;
    type Value = Value;

    fn decode(attribute: AttributeOf<Self>, value: &[u8]) -> Result<Value, Error> {
        Ok(match attribute {
            Attribute::Characteristic(Characteristic::Feature) => {
                let mut bytes = ByteReader::new(value);
                Value::Feature(Feature::from_bits_truncate(bytes.read_u32_le()?))
            }
            Attribute::Characteristic(Characteristic::LocationSpeed) => {
                Value::LocationSpeed(LocationSpeed::from_slice(value)?)
            }
            Attribute::Characteristic(Characteristic::PositionQuality) => {
                Value::PositionQuality(PositionQuality::from_slice(value)?)
            }
            Attribute::Characteristic(Characteristic::ControlPoint) => Value::ControlPoint(
                Response::decode(control_point::RESPONSE_CODE, value)?,
            ),
            Attribute::Characteristic(Characteristic::Navigation) => {
                Value::Navigation(Navigation::from_slice(value)?)
            }
            Attribute::Descriptor(_) => Value::ClientConfig(decode_client_config(value)?),
        })
    }

    fn check_write(characteristic: Characteristic, value: &[u8]) -> Result<(), Error> {
        match (characteristic, value.first()) {
            (Characteristic::ControlPoint, Some(0x01..=0x08)) => Ok(()),
            (Characteristic::ControlPoint, _) => Err(Error::InvalidValue),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::check_tables;

    #[test]
    fn tables() {
        check_tables::<LocationNavigation>();
    }

    #[test]
    fn location_and_speed() {
        let raw = [
            0x8F, 0x00, // speed, distance, location, elevation, position ok
            0xF4, 0x01, // 5 m/s
            0x10, 0x27, 0x00, // 1 km
            0x80, 0x96, 0x98, 0x00, // lat 1.0
            0x80, 0x69, 0x67, 0xFF, // lon -1.0
            0x18, 0xFC, 0xFF, // elevation -10 m
        ];
        let ls = LocationSpeed::from_slice(&raw).unwrap();
        assert_eq!(ls.speed, Some(500));
        assert_eq!(ls.total_distance, Some(10_000));
        assert_eq!(
            ls.location,
            Some(Location {
                latitude: 10_000_000,
                longitude: -10_000_000,
            })
        );
        assert_eq!(ls.elevation, Some(-1000));
        assert_eq!(ls.heading, None);
        assert_eq!(ls.position_status, PositionStatus::Ok);
    }

    #[test]
    fn location_and_speed_with_time() {
        let raw = [0x40, 0x01, 0xE4, 0x07, 0x0C, 0x1F, 0x17, 0x3B, 0x3B];
        let ls = LocationSpeed::from_slice(&raw).unwrap();
        assert_eq!(
            ls.utc_time,
            Some(DateTime {
                year: 2020,
                month: 12,
                day: 31,
                hours: 23,
                minutes: 59,
                seconds: 59,
            })
        );
        assert_eq!(ls.position_status, PositionStatus::Estimated);
        assert_eq!(LocationSpeed::from_slice(&raw[..8]), Err(Error::Eof));
    }

    #[test]
    fn navigation() {
        let raw = [
            0x83, 0x01, // remaining distance + vertical, waypoint + destination reached
            0x10, 0x27, // bearing 100.00
            0x20, 0x4E, // heading 200.00
            0xE8, 0x03, 0x00, // 100 m
            0x9C, 0xFF, 0xFF, // -1 m
        ];
        let nav = Navigation::from_slice(&raw).unwrap();
        assert_eq!(nav.bearing, 10_000);
        assert_eq!(nav.heading, 20_000);
        assert_eq!(nav.remaining_distance, Some(1000));
        assert_eq!(nav.remaining_vertical_distance, Some(-100));
        assert!(nav
            .flags
            .contains(NavigationFlags::WAYPOINT_REACHED | NavigationFlags::DESTINATION_REACHED));
        assert_eq!(nav.position_status, PositionStatus::NoPosition);
    }

    #[test]
    fn position_quality() {
        let raw = [0x63, 0x00, 0x07, 0x0C, 0x05, 0x09];
        let pq = PositionQuality::from_slice(&raw).unwrap();
        assert_eq!(pq.beacons_in_solution, Some(7));
        assert_eq!(pq.beacons_in_view, Some(12));
        assert_eq!(pq.time_to_first_fix, None);
        assert_eq!(pq.hdop, Some(5));
        assert_eq!(pq.vdop, Some(9));
    }

    #[test]
    fn control_point() {
        assert_eq!(
            &Request::SetElevation(-100).encode().unwrap()[..],
            &[0x08, 0x9C, 0xFF, 0xFF]
        );
        assert_eq!(
            &Request::NavigationControl(NavigationControl::Start)
                .encode()
                .unwrap()[..],
            &[0x03, 0x01]
        );
        assert_eq!(Request::SetCumulativeValue(0x0100_0000).encode(), Err(Error::InvalidValue));
        assert_eq!(
            LocationNavigation::check_write(Characteristic::ControlPoint, &[0x09]),
            Err(Error::InvalidValue)
        );
        assert_eq!(
            LocationNavigation::check_write(Characteristic::ControlPoint, &[0x04]),
            Ok(())
        );
    }
}
