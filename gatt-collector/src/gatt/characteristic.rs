use {crate::uuid::Uuid16, bitflags::bitflags};

/// UUID of the *Client Characteristic Configuration* descriptor.
pub const CLIENT_CONFIGURATION: Uuid16 = Uuid16(0x2902);

/// UUID of the *Server Characteristic Configuration* descriptor.
pub const SERVER_CONFIGURATION: Uuid16 = Uuid16(0x2903);

bitflags! {
    /// Characteristic properties, as found in the characteristic declaration.
    pub struct Properties: u8 {
        const BROADCAST    = 0x01;
        const READ         = 0x02;
        const WRITE_NO_RSP = 0x04;
        const WRITE        = 0x08;
        const NOTIFY       = 0x10;
        const INDICATE     = 0x20;
        const AUTH_WRITES  = 0x40;
        const EXTENDED     = 0x80;
    }
}

bitflags! {
    /// Value of a *Client Characteristic Configuration* descriptor.
    pub struct ClientConfig: u16 {
        const NOTIFICATION = 0x0001;
        const INDICATION   = 0x0002;
    }
}

bitflags! {
    /// Value of a *Server Characteristic Configuration* descriptor.
    pub struct ServerConfig: u16 {
        const BROADCAST = 0x0001;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_point_properties() {
        let props = Properties::from_bits_truncate(0x28);
        assert!(props.contains(Properties::WRITE | Properties::INDICATE));
        assert!(!props.contains(Properties::WRITE_NO_RSP));
    }

    #[test]
    fn client_config_bits() {
        assert_eq!(ClientConfig::empty().bits(), 0);
        assert_eq!(ClientConfig::from_bits(0x0003), Some(ClientConfig::all()));
        assert_eq!(ClientConfig::from_bits(0x0004), None);
    }
}
