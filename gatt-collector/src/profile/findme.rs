//! Find Me Profile, locator role.
//!
//! Makes a target alert by writing its *Immediate Alert Service* (`0x1802`) Alert Level.

use {
    super::{AttributeOf, CharacteristicDef, DescriptorDef, Profile},
    crate::{
        bytes::{ByteReader, ByteWriter, FromBytes, ToBytes},
        gatt::Properties,
        uuid::Uuid16,
        Error,
    },
};

/// The Find Me locator profile.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FindMe {}

slots! {
    pub enum Characteristic {
        AlertLevel = 0,
    }
}

slots! {
    /// The Immediate Alert Service has no descriptors.
    pub enum Descriptor {}
}

const CHARACTERISTICS: &[CharacteristicDef] =
    &[CharacteristicDef::mandatory(0x2A06, Properties::WRITE_NO_RSP)];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlertLevel {
    None = 0,
    Mild = 1,
    High = 2,
}

impl FromBytes<'_> for AlertLevel {
    fn from_bytes(bytes: &mut ByteReader<'_>) -> Result<Self, Error> {
        Ok(match bytes.read_u8()? {
            0 => AlertLevel::None,
            1 => AlertLevel::Mild,
            2 => AlertLevel::High,
            _ => return Err(Error::InvalidValue),
        })
    }
}

impl ToBytes for AlertLevel {
    fn to_bytes(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u8(*self as u8)
    }
}

impl Profile for FindMe {
    const NAME: &'static str = "FMPL";
    const SERVICE: Uuid16 = Uuid16(0x1802);
    const CHARACTERISTICS: &'static [CharacteristicDef] = CHARACTERISTICS;
    const DESCRIPTORS: &'static [DescriptorDef] = &[];

    type Characteristic = Characteristic;
    type Descriptor = Descriptor;
    type Value = AlertLevel;

    fn decode(attribute: AttributeOf<Self>, value: &[u8]) -> Result<AlertLevel, Error> {
        let _ = attribute;
        AlertLevel::from_slice(value)
    }

    fn check_write(_: Characteristic, value: &[u8]) -> Result<(), Error> {
        AlertLevel::from_slice(value).map(|_| ())
    }
}
