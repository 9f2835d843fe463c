use ahash::RandomState;
use common::NUM_PC_BITMAPS;
use datafusion_common::ScalarValue;
use lazy_static::lazy_static;

use crate::error::AggregateError;
use crate::error::Result;

const SEED_K1: u64 = 0x243f_6a88_85a3_08d3;
const SEED_K2: u64 = 0x1319_8a2e_0370_7344;
const SEED_K3: u64 = 0xa409_3822_299f_31d0;

lazy_static! {
    // One independent hash function per bitmap row, simulated by seeding the
    // same hasher with the row index.
    static ref ROW_HASHERS: Vec<RandomState> = (0..NUM_PC_BITMAPS)
        .map(|seed| RandomState::with_seeds(seed as u64, SEED_K1, SEED_K2, SEED_K3))
        .collect();
}

/// Hashable view of one non-null input value of a supported domain.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum HashKey<'a> {
    Boolean(bool),
    Int(i64),
    Float32(u32),
    Float64(u64),
    Bytes(&'a [u8]),
    Timestamp(i64),
}

impl<'a> HashKey<'a> {
    /// Returns `None` for null inputs.
    pub fn try_from_scalar(v: &'a ScalarValue) -> Result<Option<Self>> {
        let key = match v {
            ScalarValue::Null => None,
            ScalarValue::Boolean(v) => v.map(HashKey::Boolean),
            ScalarValue::Int8(v) => v.map(|v| HashKey::Int(v as i64)),
            ScalarValue::Int16(v) => v.map(|v| HashKey::Int(v as i64)),
            ScalarValue::Int32(v) => v.map(|v| HashKey::Int(v as i64)),
            ScalarValue::Int64(v) => v.map(HashKey::Int),
            ScalarValue::Float32(v) => v.map(|v| HashKey::Float32(v.to_bits())),
            ScalarValue::Float64(v) => v.map(|v| HashKey::Float64(v.to_bits())),
            ScalarValue::Utf8(v) | ScalarValue::LargeUtf8(v) => {
                v.as_ref().map(|v| HashKey::Bytes(v.as_bytes()))
            }
            ScalarValue::Binary(v) | ScalarValue::LargeBinary(v) => {
                v.as_ref().map(|v| HashKey::Bytes(v.as_slice()))
            }
            ScalarValue::TimestampSecond(v, _)
            | ScalarValue::TimestampMillisecond(v, _)
            | ScalarValue::TimestampMicrosecond(v, _)
            | ScalarValue::TimestampNanosecond(v, _) => v.map(HashKey::Timestamp),
            other => {
                return Err(AggregateError::ContractViolation(format!(
                    "value of type {} can't be hashed for distinct estimate",
                    other.data_type()
                )));
            }
        };

        Ok(key)
    }

    /// 32-bit hash of the value for the given bitmap row, `seed < NUM_PC_BITMAPS`.
    pub fn hash_seeded(&self, seed: usize) -> u32 {
        ROW_HASHERS[seed].hash_one(self) as u32
    }
}

#[cfg(test)]
mod tests {
    use datafusion_common::ScalarValue;

    use crate::error::AggregateError;
    use crate::sketch::hash::HashKey;

    #[test]
    fn keys() {
        assert_eq!(
            HashKey::try_from_scalar(&ScalarValue::Int8(Some(-3))).unwrap(),
            Some(HashKey::Int(-3))
        );
        assert_eq!(
            HashKey::try_from_scalar(&ScalarValue::Utf8(Some("ab".to_string()))).unwrap(),
            Some(HashKey::Bytes(b"ab"))
        );
        assert_eq!(
            HashKey::try_from_scalar(&ScalarValue::Float64(Some(1.5))).unwrap(),
            Some(HashKey::Float64(1.5f64.to_bits()))
        );
        assert_eq!(
            HashKey::try_from_scalar(&ScalarValue::Int64(None)).unwrap(),
            None
        );
        assert_eq!(HashKey::try_from_scalar(&ScalarValue::Null).unwrap(), None);
    }

    #[test]
    fn unsupported_type() {
        assert!(matches!(
            HashKey::try_from_scalar(&ScalarValue::UInt64(Some(1))),
            Err(AggregateError::ContractViolation(_))
        ));
    }

    #[test]
    fn deterministic_per_seed() {
        let key = HashKey::Bytes(b"hello");
        assert_eq!(key.hash_seeded(0), key.hash_seeded(0));
        assert_eq!(key.hash_seeded(63), HashKey::Bytes(b"hello").hash_seeded(63));

        let distinct = (0..64).map(|seed| key.hash_seeded(seed)).collect::<Vec<_>>();
        let mut dedup = distinct.clone();
        dedup.sort();
        dedup.dedup();
        assert!(dedup.len() > 60);
    }
}
