//! Fixed-width byte values.
//!
//! Addresses, content identifiers and attestation reports are opaque to the
//! exchange. They are stored as plain byte arrays and rendered as `0x`-prefixed
//! lowercase hex wherever they cross a text boundary.

macro_rules! hex_bytes {
    ($struct:ident, $len:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $struct(pub [u8; $len]);

        impl $struct {
            /// Width of the value in bytes
            pub const LEN: usize = $len;

            /// Borrow the raw bytes
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $struct {
            fn from(value: [u8; $len]) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $struct {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl std::str::FromStr for $struct {
            type Err = hex::FromHexError;

            /// Parse hex, with or without the `0x` prefix. The input must
            /// encode exactly `LEN` bytes.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(digits, &mut bytes)?;
                Ok(Self(bytes))
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $struct {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $struct {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <std::borrow::Cow<'de, str> as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        #[cfg(feature = "schemars")]
        impl schemars::JsonSchema for $struct {
            fn schema_name() -> std::borrow::Cow<'static, str> {
                stringify!($struct).into()
            }

            fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
                schemars::json_schema!({
                    "type": "string",
                    "description": $doc,
                    "pattern": format!("^(0[xX])?[0-9a-fA-F]{{{}}}$", $len * 2),
                })
            }
        }
    };
}

hex_bytes!(
    Address,
    20,
    "An account or wallet address on the token ledger."
);
hex_bytes!(
    ContentId,
    32,
    "An opaque content identifier (e.g. an IPFS digest) describing an item."
);
hex_bytes!(
    Report,
    32,
    "An opaque attestation value supplied by one party of a bid."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_prefixed_lowercase_hex() {
        let address = Address([0xAB; 20]);
        assert_eq!(address.to_string(), format!("0x{}", "ab".repeat(20)));
    }

    #[test]
    fn test_parse_accepts_optional_prefix() {
        let digits = "48".to_owned() + &"00".repeat(31);
        let with: ContentId = format!("0x{digits}").parse().unwrap();
        let without: ContentId = digits.parse().unwrap();
        assert_eq!(with, without);
        assert_eq!(with.0[0], 0x48);
    }

    #[test]
    fn test_parse_accepts_uppercase_prefix() {
        let upper: Address = format!("0X{}", "AB".repeat(20)).parse().unwrap();
        assert_eq!(upper, Address([0xab; 20]));
    }

    #[cfg(feature = "schemars")]
    #[test]
    fn test_schema_pattern_admits_every_parsed_form() {
        let schema = schemars::schema_for!(Address);
        assert_eq!(
            schema.get("pattern").and_then(|pattern| pattern.as_str()),
            Some("^(0[xX])?[0-9a-fA-F]{40}$")
        );
    }

    #[test]
    fn test_parse_rejects_wrong_width() {
        assert_eq!(
            "0x1234".parse::<Address>().unwrap_err(),
            hex::FromHexError::InvalidStringLength
        );
        assert!("0xzz".parse::<Report>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let report = Report([0x34; 32]);
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "34".repeat(32)));
        assert_eq!(serde_json::from_str::<Report>(&json).unwrap(), report);
    }
}
