//! Attribute handles.

use {crate::Error, core::fmt};

/// A 16-bit handle uniquely identifying an attribute on an ATT server.
///
/// The `0x0000` handle (`NULL`) is invalid and never assigned to an attribute. The collector uses
/// it to mark characteristics and descriptors that were not found on the peer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttHandle(u16);

impl AttHandle {
    /// The `0x0000` handle is not used for actual attributes, but as a special placeholder when no
    /// attribute handle is valid.
    pub const NULL: Self = AttHandle(0x0000);

    /// Returns the raw 16-bit integer representing this handle.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Create an attribute handle from a raw u16
    pub const fn from_raw(raw: u16) -> Self {
        AttHandle(raw)
    }

    /// Returns whether `self` refers to an actual attribute.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl Default for AttHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for AttHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}

/// An inclusive range of attribute handles, checked for validity.
///
/// Describes the extent of a service instance on the peer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HandleRange {
    start: AttHandle,
    end: AttHandle,
}

impl HandleRange {
    /// Creates a handle range covering `start..=end`.
    ///
    /// Returns `Error::InvalidValue` if `start` is the `NULL` handle or lies past `end`.
    pub fn new(start: AttHandle, end: AttHandle) -> Result<Self, Error> {
        if start.0 > end.0 || start.0 == 0 {
            Err(Error::InvalidValue)
        } else {
            Ok(Self { start, end })
        }
    }

    /// Checks if an AttHandle is in a HandleRange
    pub fn contains(&self, handle: AttHandle) -> bool {
        self.start.0 <= handle.as_u16() && self.end.0 >= handle.as_u16()
    }

    pub fn start(&self) -> AttHandle {
        self.start
    }

    pub fn end(&self) -> AttHandle {
        self.end
    }
}
