//! Bit-vector (fingerprint) text codec.
//!
//! A fingerprint is a fixed-length sequence of 0/1 values. It is stored in a single SD
//! property as the base64 encoding of its bits packed eight to a byte, most significant
//! bit first, with the final byte zero-padded.

use crate::error::Error;
use base64::prelude::*;

/// Element type that can carry one fingerprint bit.
pub trait Bit: Sized {
    fn is_set(&self) -> bool;

    fn from_bit(bit: bool) -> Self;
}

impl Bit for bool {
    fn is_set(&self) -> bool {
        *self
    }

    fn from_bit(bit: bool) -> Self {
        bit
    }
}

macro_rules! impl_bit_for_integer {
    ($($ty:ty),*) => {
        $(
            impl Bit for $ty {
                fn is_set(&self) -> bool {
                    *self != 0
                }

                fn from_bit(bit: bool) -> Self {
                    <$ty>::from(bit)
                }
            }
        )*
    };
}

impl_bit_for_integer!(u8, u16, u32, u64, i32, i64);

impl Bit for f32 {
    fn is_set(&self) -> bool {
        *self != 0.0
    }

    fn from_bit(bit: bool) -> Self {
        if bit { 1.0 } else { 0.0 }
    }
}

impl Bit for f64 {
    fn is_set(&self) -> bool {
        *self != 0.0
    }

    fn from_bit(bit: bool) -> Self {
        if bit { 1.0 } else { 0.0 }
    }
}

/// Packs `bits` MSB-first into bytes and base64-encodes them.
pub fn encode<T: Bit>(bits: &[T]) -> String {
    let packed: Vec<u8> = bits
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .filter(|(_, bit)| bit.is_set())
                .fold(0u8, |byte, (i, _)| byte | (0x80 >> i))
        })
        .collect();
    BASE64_STANDARD.encode(packed)
}

/// Decodes base64 text into one element per bit; the length is always a multiple of 8.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidFingerprint`] when the text is not valid base64.
pub fn decode<T: Bit>(text: &str) -> Result<Vec<T>, Error> {
    let packed = BASE64_STANDARD
        .decode(text.trim())
        .map_err(|e| Error::InvalidFingerprint {
            details: e.to_string(),
        })?;
    Ok(packed
        .iter()
        .flat_map(|byte| (0..8).map(move |i| T::from_bit(byte & (0x80 >> i) != 0)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITS: [f32; 32] = [
        0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, //
        1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, //
        0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, //
        1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0,
    ];

    #[test]
    fn encode_matches_reference_vector() {
        assert_eq!(encode(&BITS), "UY5lpg==");
    }

    #[test]
    fn decode_matches_reference_vector() {
        let bits: Vec<f32> = decode("UY5lpg==\n").unwrap();
        assert_eq!(bits, BITS.to_vec());
    }

    #[test]
    fn partial_bytes_are_zero_padded() {
        let encoded = encode(&[true, true, true]);
        assert_eq!(encoded, BASE64_STANDARD.encode([0xE0]));
        let bits: Vec<u8> = decode(&encoded).unwrap();
        assert_eq!(bits, vec![1, 1, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err = decode::<u8>("not base64!").expect_err("invalid characters");
        assert!(matches!(err, Error::InvalidFingerprint { .. }));
    }

    #[test]
    fn empty_text_is_an_empty_fingerprint() {
        assert_eq!(encode::<bool>(&[]), "");
        assert!(decode::<bool>("").unwrap().is_empty());
    }
}
