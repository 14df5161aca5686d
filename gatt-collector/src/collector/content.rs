//! Cached layout of the profile's service on a peer.

use {
    super::ProfileError,
    crate::{
        att::{AttHandle, HandleRange},
        gatt::{DiscoveredService, Properties},
        profile::{Attribute, AttributeOf, Profile, Requirement, Slot},
    },
    heapless::Vec,
};

/// Maximum number of characteristic kinds a profile may define.
pub const MAX_CHARACTERISTICS: usize = 8;

/// Maximum number of descriptor kinds a profile may define.
pub const MAX_DESCRIPTORS: usize = 8;

/// Handles and properties of one characteristic on the peer.
///
/// A slot whose `value` handle is `AttHandle::NULL` marks a characteristic the peer does not have.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CharSlot {
    pub declaration: AttHandle,
    pub value: AttHandle,
    pub properties: Properties,
}

impl CharSlot {
    pub const ABSENT: Self = CharSlot {
        declaration: AttHandle::NULL,
        value: AttHandle::NULL,
        properties: Properties::empty(),
    };

    pub fn is_present(&self) -> bool {
        !self.value.is_null()
    }
}

/// Handle of one descriptor on the peer, `AttHandle::NULL` if absent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DescSlot {
    pub handle: AttHandle,
}

impl DescSlot {
    pub const ABSENT: Self = DescSlot {
        handle: AttHandle::NULL,
    };

    pub fn is_present(&self) -> bool {
        !self.handle.is_null()
    }
}

/// Where the profile's characteristics and descriptors live on the peer.
///
/// Holds exactly one slot per characteristic and descriptor kind of the profile, in table order.
/// The application can store the content reported after discovery and hand it back on the next
/// connection to the same peer to skip discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContent {
    pub service: Option<HandleRange>,
    pub characteristics: Vec<CharSlot, MAX_CHARACTERISTICS>,
    pub descriptors: Vec<DescSlot, MAX_DESCRIPTORS>,
}

impl ServiceContent {
    /// Creates a content with every slot of `P` marked absent.
    pub fn new<P: Profile>() -> Self {
        let mut characteristics = Vec::new();
        let mut descriptors = Vec::new();
        // Tables larger than the capacities are caught by `check_shape`.
        for _ in P::CHARACTERISTICS.iter().take(MAX_CHARACTERISTICS) {
            characteristics.push(CharSlot::ABSENT).ok();
        }
        for _ in P::DESCRIPTORS.iter().take(MAX_DESCRIPTORS) {
            descriptors.push(DescSlot::ABSENT).ok();
        }
        Self {
            service: None,
            characteristics,
            descriptors,
        }
    }

    /// Maps the first discovered instance of the service onto the slots of `P`.
    ///
    /// Characteristics are matched by UUID. Descriptors are matched by UUID within the handle
    /// range of their characteristic, which ends right before the next characteristic
    /// declaration, or at the end of the service.
    pub fn extract<P: Profile>(svc: &DiscoveredService) -> Self {
        let mut content = Self::new::<P>();
        content.service = Some(svc.range);

        for (def, slot) in P::CHARACTERISTICS.iter().zip(content.characteristics.iter_mut()) {
            if let Some(found) = svc.characteristics.iter().find(|c| c.uuid == def.uuid) {
                *slot = CharSlot {
                    declaration: found.declaration,
                    value: found.value,
                    properties: found.properties,
                };
            }
        }

        for (def, slot) in P::DESCRIPTORS.iter().zip(content.descriptors.iter_mut()) {
            let owner = match content.characteristics.get(def.characteristic) {
                Some(owner) if owner.is_present() => *owner,
                _ => continue,
            };
            let next_declaration = svc
                .characteristics
                .iter()
                .map(|c| c.declaration)
                .filter(|decl| *decl > owner.declaration)
                .min();
            let in_range = |handle: AttHandle| {
                handle > owner.value
                    && match next_declaration {
                        Some(next) => handle < next,
                        None => svc.range.contains(handle),
                    }
            };

            if let Some(found) = svc
                .descriptors
                .iter()
                .find(|d| d.uuid == def.uuid && in_range(d.handle))
            {
                slot.handle = found.handle;
            }
        }

        content
    }

    /// Checks that the slot counts match the tables of `P`.
    pub fn check_shape<P: Profile>(&self) -> Result<(), ProfileError> {
        if self.characteristics.len() == P::CHARACTERISTICS.len()
            && self.descriptors.len() == P::DESCRIPTORS.len()
        {
            Ok(())
        } else {
            Err(ProfileError::InvalidParameter)
        }
    }

    /// Checks that everything `P` requires was found, with the required properties.
    pub fn validate<P: Profile>(&self) -> Result<(), ProfileError> {
        self.check_shape::<P>()?;

        for (def, slot) in P::CHARACTERISTICS.iter().zip(&self.characteristics) {
            if !slot.is_present() {
                if def.requirement == Requirement::Mandatory {
                    return Err(ProfileError::CharacteristicMissing);
                }
            } else if !slot.properties.contains(def.properties) {
                return Err(ProfileError::WrongProperties);
            }
        }

        for (def, slot) in P::DESCRIPTORS.iter().zip(&self.descriptors) {
            let owner_present = self
                .characteristics
                .get(def.characteristic)
                .map_or(false, CharSlot::is_present);
            if owner_present && def.requirement == Requirement::Mandatory && !slot.is_present() {
                return Err(ProfileError::CharacteristicMissing);
            }
        }

        Ok(())
    }

    /// Returns the slot of `characteristic`, or `None` if the peer does not have it.
    pub fn characteristic(&self, characteristic: impl Slot) -> Option<&CharSlot> {
        self.characteristics
            .get(characteristic.index())
            .filter(|slot| slot.is_present())
    }

    /// Returns the handle of `descriptor`, or `None` if the peer does not have it.
    pub fn descriptor(&self, descriptor: impl Slot) -> Option<AttHandle> {
        self.descriptors
            .get(descriptor.index())
            .filter(|slot| slot.is_present())
            .map(|slot| slot.handle)
    }

    /// Returns the handle an attribute of `P` is accessed through.
    pub fn handle_of<P: Profile>(&self, attribute: AttributeOf<P>) -> Option<AttHandle> {
        match attribute {
            Attribute::Characteristic(c) => self.characteristic(c).map(|slot| slot.value),
            Attribute::Descriptor(d) => self.descriptor(d),
        }
    }

    /// Finds the characteristic whose value lives at `handle`.
    pub fn characteristic_at<P: Profile>(&self, handle: AttHandle) -> Option<P::Characteristic> {
        if handle.is_null() {
            return None;
        }
        self.characteristics
            .iter()
            .position(|slot| slot.value == handle)
            .and_then(P::Characteristic::from_index)
    }
}
