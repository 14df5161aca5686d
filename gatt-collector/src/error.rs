use core::fmt;

/// Errors returned while decoding or encoding attribute values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Value specified an invalid length or was too short for the fields its flags announce.
    InvalidLength,

    /// Invalid value supplied for field.
    InvalidValue,

    /// Unexpectedly reached EOF while reading or writing data.
    ///
    /// This is returned when the application tries to fit too much data into a
    /// request buffer, and also when reaching EOF prematurely while reading a
    /// characteristic value.
    Eof,

    /// Parsing didn't consume the entire buffer.
    IncompleteParse,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::InvalidLength => "invalid length value specified",
            Error::InvalidValue => "invalid value for field",
            Error::Eof => "end of buffer",
            Error::IncompleteParse => "excess data in buffer",
        })
    }
}
