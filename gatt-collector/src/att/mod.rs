//! Attribute Protocol (ATT) vocabulary used by the collector.
//!
//! The collector never encodes ATT PDUs itself, that is the job of the [`GattClient`] transport.
//! It does however need to talk about the things those PDUs carry:
//!
//! * A 16-bit *Attribute Handle* ([`AttHandle`]) uniquely identifying an attribute on the peer.
//! * A 16- or 128-bit UUID ([`AttUuid`]) identifying the attribute type.
//! * The [`ErrorCode`] a peer answers with when it rejects a request.
//!
//! [`GattClient`]: ../gatt/trait.GattClient.html
//! [`AttHandle`]: struct.AttHandle.html
//! [`AttUuid`]: enum.AttUuid.html
//! [`ErrorCode`]: enum.ErrorCode.html

mod handle;
mod uuid;

pub use self::handle::{AttHandle, HandleRange};
pub use self::uuid::AttUuid;

enum_with_unknown! {
    /// Error codes that can be sent from the ATT server to the client in response to a request.
    ///
    /// Used as the payload of `ProfileError::Att` when a peer rejects a request.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum ErrorCode(u8) {
        /// Attempted to use an `AttHandle` that isn't valid on this server.
        InvalidHandle = 0x01,
        /// Attribute isn't readable.
        ReadNotPermitted = 0x02,
        /// Attribute isn't writable.
        WriteNotPermitted = 0x03,
        /// Attribute PDU is invalid.
        InvalidPdu = 0x04,
        /// Authentication needed before attribute can be read/written.
        InsufficientAuthentication = 0x05,
        /// Server doesn't support this operation.
        RequestNotSupported = 0x06,
        /// Offset was past the end of the attribute.
        InvalidOffset = 0x07,
        /// Authorization needed before attribute can be read/written.
        InsufficientAuthorization = 0x08,
        /// Too many "prepare write" requests have been queued.
        PrepareQueueFull = 0x09,
        /// No attribute found within the specified attribute handle range.
        AttributeNotFound = 0x0A,
        /// Attribute can't be read/written using *Read Key Blob* request.
        AttributeNotLong = 0x0B,
        /// The encryption key in use is too weak to access an attribute.
        InsufficientEncryptionKeySize = 0x0C,
        /// Attribute value has an incorrect length for the operation.
        InvalidAttributeValueLength = 0x0D,
        /// Request has encountered an "unlikely" error and could not be completed.
        UnlikelyError = 0x0E,
        /// Attribute cannot be read/written without an encrypted connection.
        InsufficientEncryption = 0x0F,
        /// Attribute type is an invalid grouping attribute according to a higher-layer spec.
        UnsupportedGroupType = 0x10,
        /// Server didn't have enough resources to complete a request.
        InsufficientResources = 0x11,
        /// A Client Characteristic Configuration Descriptor was not configured as required.
        CccdImproperlyConfigured = 0xFD,
        /// A procedure is already running on the server.
        ProcedureAlreadyInProgress = 0xFE,
        /// An attribute value is outside of the range the server accepts.
        OutOfRange = 0xFF,
    }
}
