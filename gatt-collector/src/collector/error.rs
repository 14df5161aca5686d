use {
    crate::{att::ErrorCode, gatt::TransportError},
    core::fmt,
};

/// Status reported for a failed collector operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// No collector context exists for the connection.
    NoConnection,
    /// The context exists but has not finished enabling.
    RequestDisallowed,
    /// Another request is still outstanding on the connection.
    Busy,
    /// The peer does not expose the profile's service.
    ServiceNotFound,
    /// The peer exposes more than one instance of the service.
    ServiceDuplicated,
    /// A mandatory characteristic or descriptor is missing.
    CharacteristicMissing,
    /// A characteristic lacks properties the profile relies on.
    WrongProperties,
    /// The discovery procedure failed.
    DiscoveryFailed,
    /// The targeted characteristic or descriptor was not found on the peer.
    InexistentHandle,
    /// A request parameter is out of range.
    InvalidParameter,
    /// The peer does not allow the requested access.
    NotPermitted,
    /// The peer sent a value that could not be decoded.
    InvalidValue,
    /// The peer answered with an ATT error.
    Att(ErrorCode),
    /// The transport could not start the procedure.
    Transport(TransportError),
    /// The peer did not answer in time.
    Timeout,
    /// No free connection context is left.
    AllocationExhausted,
}

impl From<ErrorCode> for ProfileError {
    fn from(code: ErrorCode) -> Self {
        ProfileError::Att(code)
    }
}

impl From<TransportError> for ProfileError {
    fn from(e: TransportError) -> Self {
        ProfileError::Transport(e)
    }
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::NoConnection => f.write_str("no collector context for connection"),
            ProfileError::RequestDisallowed => f.write_str("request not allowed in current state"),
            ProfileError::Busy => f.write_str("another request is in progress"),
            ProfileError::ServiceNotFound => f.write_str("service not found"),
            ProfileError::ServiceDuplicated => f.write_str("service found more than once"),
            ProfileError::CharacteristicMissing => f.write_str("mandatory attribute missing"),
            ProfileError::WrongProperties => f.write_str("characteristic has wrong properties"),
            ProfileError::DiscoveryFailed => f.write_str("discovery failed"),
            ProfileError::InexistentHandle => f.write_str("attribute not present on peer"),
            ProfileError::InvalidParameter => f.write_str("invalid parameter"),
            ProfileError::NotPermitted => f.write_str("access not permitted"),
            ProfileError::InvalidValue => f.write_str("peer sent an invalid value"),
            ProfileError::Att(code) => write!(f, "ATT error {:?}", code),
            ProfileError::Transport(e) => write!(f, "transport error {:?}", e),
            ProfileError::Timeout => f.write_str("procedure timed out"),
            ProfileError::AllocationExhausted => f.write_str("no free connection context"),
        }
    }
}
