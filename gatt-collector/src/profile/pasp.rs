//! Phone Alert Status Profile, client role.
//!
//! Monitors the ringer and alert state of a phone through its *Phone Alert Status Service*
//! (`0x180E`) and silences the ringer through the Ringer Control Point.

use {
    super::{
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

/// The Phone Alert Status client profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PhoneAlertStatus {}

slots! {
    pub enum Characteristic {
        AlertStatus = 0,
        RingerSetting = 1,
        RingerControlPoint = 2,
    }
}

slots! {
    pub enum Descriptor {
        AlertStatusClientConfig = 0,
        RingerSettingClientConfig = 1,
    }
}

const READ_NOTIFY: Properties =
    Properties::from_bits_truncate(Properties::READ.bits() | Properties::NOTIFY.bits());

const CHARACTERISTICS: &[CharacteristicDef] = &[
    CharacteristicDef::mandatory(0x2A3F, READ_NOTIFY),
    CharacteristicDef::mandatory(0x2A41, READ_NOTIFY),
    CharacteristicDef::mandatory(0x2A40, Properties::WRITE_NO_RSP),
];

const DESCRIPTORS: &[DescriptorDef] = &[
    DescriptorDef::client_config(0, Requirement::Mandatory, ClientConfig::NOTIFICATION),
    DescriptorDef::client_config(1, Requirement::Mandatory, ClientConfig::NOTIFICATION),
];

bitflags! {
    pub struct AlertStatus: u8 {
        const RINGER_ACTIVE  = 1 << 0;
        const VIBRATE_ACTIVE = 1 << 1;
        const DISPLAY_ALERT  = 1 << 2;
    }
}

enum_with_unknown! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum RingerSetting(u8) {
        Silent = 0,
        Normal = 1,
    }
}

enum_with_unknown! {
    /// Commands accepted by the Ringer Control Point.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum RingerCommand(u8) {
        SilentMode = 1,
        MuteOnce = 2,
        CancelSilentMode = 3,
    }
}

impl ToBytes for RingerCommand {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u8((*self).into())
    }
}

/// Decoded Phone Alert Status values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    AlertStatus(AlertStatus),
    RingerSetting(RingerSetting),
    ClientConfig(ClientConfig),
}

impl Profile for PhoneAlertStatus {
    const NAME: &'static str = "PASP";
    const SERVICE: Uuid16 = Uuid16(0x180E);
    const CHARACTERISTICS: &'static [CharacteristicDef] = CHARACTERISTICS;
    const DESCRIPTORS: &'static [DescriptorDef] = DESCRIPTORS;

    type Characteristic = Characteristic;
    type Descriptor = Descriptor;
    type Value = Value;

    fn decode(attribute: AttributeOf<Self>, value: &[u8]) -> Result<Value, Error> {
        Ok(match attribute {
            Attribute::Characteristic(Characteristic::AlertStatus) => {
                Value::AlertStatus(AlertStatus::from_bits_truncate(u8::from_slice(value)?))
            }
            Attribute::Characteristic(Characteristic::RingerSetting) => {
                Value::RingerSetting(u8::from_slice(value)?.into())
            }
            // Write-only on the peer.
            Attribute::Characteristic(Characteristic::RingerControlPoint) => {
                return Err(Error::InvalidValue)
            }
            Attribute::Descriptor(_) => Value::ClientConfig(decode_client_config(value)?),
        })
    }

    fn check_write(characteristic: Characteristic, value: &[u8]) -> Result<(), Error> {
        match characteristic {
            Characteristic::RingerControlPoint => {
                match RingerCommand::from(ByteReader::new(value).read_u8()?) {
                    RingerCommand::Unknown(_) => Err(Error::InvalidValue),
                    _ if value.len() != 1 => Err(Error::InvalidLength),
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}
