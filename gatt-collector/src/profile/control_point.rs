//! Control point responses.
//!
//! Cycling Power, Location and Navigation and the SC Control Point of the speed and cadence
//! profiles all answer a written request with an indication of the form
//!
//! ```notrust
//! +---------------+----------------+-------------+--------------------+
//! | Response Code | Request OpCode | Result Code | Response Parameter |
//! |    1 Byte     |     1 Byte     |   1 Byte    |     0-17 Bytes     |
//! +---------------+----------------+-------------+--------------------+
//! ```
//!
//! The response code differs between profiles and is given by `Profile::CONTROL_POINT_RESPONSE`.

use {
    crate::{
        bytes::ByteReader,
        utils::HexSlice,
        Error, MAX_WRITE_LEN,
    },
    core::fmt,
    heapless::Vec,
};

/// Response code used by the Cycling Power and LN control points.
pub const RESPONSE_CODE: u8 = 0x20;

/// Response code used by the SC Control Point (speed and cadence profiles).
pub const SC_RESPONSE_CODE: u8 = 0x10;

/// Maximum size of the response parameter.
pub const MAX_PARAMETER_LEN: usize = MAX_WRITE_LEN - 3;

enum_with_unknown! {
    /// Outcome of a control point procedure.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum ResultCode(u8) {
        Success = 0x01,
        OpCodeNotSupported = 0x02,
        InvalidParameter = 0x03,
        OperationFailed = 0x04,
    }
}

/// A decoded control point response indication.
#[derive(Clone, PartialEq)]
pub struct Response {
    pub request: u8,
    pub result: ResultCode,
    pub parameter: Vec<u8, MAX_PARAMETER_LEN>,
}

impl Response {
    /// Decodes a response that starts with `response_code`.
    pub fn decode(response_code: u8, value: &[u8]) -> Result<Self, Error> {
        let mut bytes = ByteReader::new(value);
        if bytes.read_u8()? != response_code {
            return Err(Error::InvalidValue);
        }
        let request = bytes.read_u8()?;
        let result = bytes.read_u8()?.into();
        let parameter = Vec::from_slice(bytes.read_rest()).map_err(|_| Error::InvalidLength)?;
        Ok(Self {
            request,
            result,
            parameter,
        })
    }

    pub fn is_success(&self) -> bool {
        self.result == ResultCode::Success
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("request", &self.request)
            .field("result", &self.result)
            .field("parameter", &HexSlice(&self.parameter[..]))
            .finish()
    }
}
