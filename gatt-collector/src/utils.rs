use core::fmt;

/// Creates an enum that can be converted from and to a primitive type, with invalid values becoming
/// a catch-all `Unknown` variant.
///
/// This is copied almost verbatim from [smoltcp].
///
/// [smoltcp]: https://github.com/m-labs/smoltcp/blob/cd893e6ab60f094d684b37be7bc013bf79f0459d/src/macros.rs
macro_rules! enum_with_unknown {
    (
        $( #[$enum_attr:meta] )*
        $v:vis enum $name:ident($ty:ty) {
            $(
              $( #[$variant_attr:meta] )*
              $variant:ident = $value:expr $(,)*
            ),*
        }
    ) => {
        $( #[$enum_attr] )*
        $v enum $name {
            $(
              $( #[$variant_attr] )*
              $variant,
            )*
            Unknown($ty)
        }

        impl ::core::convert::From<$ty> for $name {
            fn from(value: $ty) -> Self {
                match value {
                    $( $value => $name::$variant, )*
                    other => $name::Unknown(other)
                }
            }
        }

        impl ::core::convert::From<$name> for $ty {
            fn from(value: $name) -> Self {
                match value {
                    $( $name::$variant => $value, )*
                    $name::Unknown(other) => other
                }
            }
        }
    }
}

/// Creates a fieldless enum naming the characteristic or descriptor slots of a profile, and
/// implements [`Slot`] for it.
///
/// The index assigned to each variant is its position in the profile's characteristic or
/// descriptor table.
///
/// [`Slot`]: profile/trait.Slot.html
macro_rules! slots {
    (
        $( #[$enum_attr:meta] )*
        $v:vis enum $name:ident {
            $(
              $( #[$variant_attr:meta] )*
              $variant:ident = $index:literal
            ),* $(,)*
        }
    ) => {
        $( #[$enum_attr] )*
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        $v enum $name {
            $(
              $( #[$variant_attr] )*
              $variant,
            )*
        }

        impl $crate::profile::Slot for $name {
            fn index(self) -> usize {
                match self {
                    $( $name::$variant => $index, )*
                }
            }

            fn from_index(index: usize) -> Option<Self> {
                match index {
                    $( $index => Some($name::$variant), )*
                    _ => None,
                }
            }
        }
    }
}

/// `Debug`-formats its contents as a hexadecimal byte slice.
#[derive(Copy, Clone)]
pub struct HexSlice<T>(pub T)
where
    T: AsRef<[u8]>;

impl<T: AsRef<[u8]>> fmt::Debug for HexSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, byte) in self.0.as_ref().iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_slice() {
        assert_eq!(format!("{:?}", HexSlice(&[0x01, 0xab, 0x20][..])), "[01, ab, 20]");
        assert_eq!(format!("{:?}", HexSlice(&[0u8; 0][..])), "[]");
    }
}
