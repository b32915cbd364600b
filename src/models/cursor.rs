//! # Read position in the message stream.
//!
//! A [`Cursor`] is the `{timetoken, region}` pair returned by every subscribe
//! response. On the wire the timetoken is a decimal string (`"17000000000000000"`)
//! and the region a small integer; both forms of the timetoken are accepted
//! when decoding.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// `{timetoken, region}` pair marking the client's read position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    /// 17-digit publish timetoken (10ns resolution).
    #[serde(rename = "t", deserialize_with = "timetoken_from_wire")]
    pub timetoken: u64,
    /// Region the timetoken was issued in.
    #[serde(rename = "r", default)]
    pub region: u32,
}

impl Cursor {
    /// Creates a cursor.
    #[inline]
    pub fn new(timetoken: u64, region: u32) -> Self {
        Self { timetoken, region }
    }

    /// `true` for the `{0, 0}` cursor used by handshakes.
    #[inline]
    pub fn is_initial(&self) -> bool {
        self.timetoken == 0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.timetoken, self.region)
    }
}

/// Accepts the timetoken as a decimal string or as a JSON number.
fn timetoken_from_wire<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct TimetokenVisitor;

    impl Visitor<'_> for TimetokenVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a timetoken as decimal string or unsigned integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative timetoken {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            v.parse::<u64>()
                .map_err(|_| E::custom(format!("invalid timetoken {v:?}")))
        }
    }

    deserializer.deserialize_any(TimetokenVisitor)
}
