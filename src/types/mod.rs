//! Data model shared by the aggregator, builder, signer, and tracker.

pub mod balance;
pub mod intent;
pub mod operation;

pub use balance::*;
pub use intent::*;
pub use operation::*;

/// Serde adapter that carries `U256` as a base-10 string on the wire.
///
/// Amounts are arbitrary-precision integers; JSON numbers would lose precision.
pub mod u256_dec {
    use ethereum_types::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_string().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        U256::from_dec_str(s.trim()).map_err(|e| D::Error::custom(format!("invalid amount {:?}: {:?}", s, e)))
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
