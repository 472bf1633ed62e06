//! Fixed-width binary serialization contract.
//!
//! Every key element and every cached value implements [`FixedWidth`]: a
//! byte width known at compile time plus an explicit little-endian
//! encode/decode pair. There is no raw-memory reinterpretation anywhere,
//! so the on-disk layout carries no padding, alignment, or host-endianness
//! ambiguity.
//!
//! # Binary format
//!
//! - Multi-byte scalars encode as their `to_le_bytes()` representation.
//! - `bool` is a single byte, `0` or `1`; any other byte is rejected.
//! - `[u8; N]` and `Uuid` encode verbatim.
//! - Tuples concatenate their elements in declared order; the total width
//!   is the sum of the element widths.
//!
//! Decoding a slice whose length differs from the type's width is a
//! [`CodecError::SizeMismatch`], never an out-of-bounds read. A type
//! without a `FixedWidth` implementation simply cannot be used as a key
//! element or cached value - the contract is enforced at compile time.

use uuid::Uuid;

use crate::error::CodecError;

/// A value with a fixed-size binary representation.
///
/// # Implementation Requirements
///
/// - `WIDTH` must equal the number of bytes written by `encode_into` and
///   consumed by `decode` for every value of the type.
/// - `decode(encode(v))` must return `v` for every representable `v`.
/// - Distinct values must encode to distinct bytes when the type is used
///   as a key element; the cache relies on key equality mirroring the
///   serialized form.
pub trait FixedWidth: Sized {
    /// Fixed byte width of the encoded form.
    const WIDTH: usize;

    /// Append the type-name tokens used for cache file naming.
    ///
    /// Scalars push a single token; tuples push one token per element in
    /// declared order.
    fn push_tokens(out: &mut Vec<&'static str>);

    /// Encode into `out`, which must be exactly `Self::WIDTH` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != Self::WIDTH`.
    fn encode_into(&self, out: &mut [u8]);

    /// Decode from a buffer of exactly `Self::WIDTH` bytes.
    ///
    /// A buffer of any other length is a
    /// [`CodecError::SizeMismatch`]; a buffer that holds no valid value
    /// of the type is a [`CodecError::InvalidEncoding`].
    fn decode(bytes: &[u8]) -> Result<Self, CodecError>;

    /// Encode into a freshly allocated buffer.
    fn encode_vec(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::WIDTH];
        self.encode_into(&mut out);
        out
    }

    /// The full token list for this type.
    fn tokens() -> Vec<&'static str> {
        let mut out = Vec::new();
        Self::push_tokens(&mut out);
        out
    }
}

/// Implement `FixedWidth` for scalars with `to_le_bytes`/`from_le_bytes`.
macro_rules! impl_fixed_width_scalar {
    ($($ty:ty => $token:literal),* $(,)?) => {$(
        impl FixedWidth for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn push_tokens(out: &mut Vec<&'static str>) {
                out.push($token);
            }

            fn encode_into(&self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }

            fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
                let arr: [u8; std::mem::size_of::<$ty>()] =
                    bytes.try_into().map_err(|_| CodecError::SizeMismatch {
                        type_token: $token,
                        expected: Self::WIDTH,
                        actual: bytes.len(),
                    })?;
                Ok(<$ty>::from_le_bytes(arr))
            }
        }
    )*};
}

// No `usize`/`isize`: their width varies by platform, which would break
// the fixed-layout contract across builds.
impl_fixed_width_scalar! {
    u8 => "u8",
    i8 => "i8",
    u16 => "u16",
    i16 => "i16",
    u32 => "u32",
    i32 => "i32",
    u64 => "u64",
    i64 => "i64",
    u128 => "u128",
    i128 => "i128",
    f32 => "f32",
    f64 => "f64",
}

impl FixedWidth for bool {
    const WIDTH: usize = 1;

    fn push_tokens(out: &mut Vec<&'static str>) {
        out.push("bool");
    }

    fn encode_into(&self, out: &mut [u8]) {
        out.copy_from_slice(&[*self as u8]);
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != Self::WIDTH {
            return Err(CodecError::SizeMismatch {
                type_token: "bool",
                expected: Self::WIDTH,
                actual: bytes.len(),
            });
        }
        match bytes[0] {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(CodecError::InvalidEncoding {
                type_token: "bool",
                reason: format!("byte {byte:#04x} is not 0 or 1"),
            }),
        }
    }
}

/// Implement `FixedWidth` for byte arrays of common sizes.
///
/// Each size carries its own token so that caches over differently sized
/// arrays never share a file name.
macro_rules! impl_fixed_width_bytes {
    ($($len:literal => $token:literal),* $(,)?) => {$(
        impl FixedWidth for [u8; $len] {
            const WIDTH: usize = $len;

            fn push_tokens(out: &mut Vec<&'static str>) {
                out.push($token);
            }

            fn encode_into(&self, out: &mut [u8]) {
                out.copy_from_slice(self);
            }

            fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
                bytes.try_into().map_err(|_| CodecError::SizeMismatch {
                    type_token: $token,
                    expected: Self::WIDTH,
                    actual: bytes.len(),
                })
            }
        }
    )*};
}

impl_fixed_width_bytes! {
    4 => "b4",
    8 => "b8",
    16 => "b16",
    20 => "b20",
    32 => "b32",
    64 => "b64",
}

impl FixedWidth for Uuid {
    const WIDTH: usize = 16;

    fn push_tokens(out: &mut Vec<&'static str>) {
        out.push("uuid");
    }

    fn encode_into(&self, out: &mut [u8]) {
        out.copy_from_slice(self.as_bytes());
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| CodecError::SizeMismatch {
            type_token: "uuid",
            expected: Self::WIDTH,
            actual: bytes.len(),
        })?;
        Ok(Uuid::from_bytes(arr))
    }
}

/// Implement `FixedWidth` for tuples by concatenating element encodings
/// in declared order.
macro_rules! impl_fixed_width_tuple {
    ($($elem:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($elem: FixedWidth),+> FixedWidth for ($($elem,)+) {
            const WIDTH: usize = 0 $(+ $elem::WIDTH)+;

            fn push_tokens(out: &mut Vec<&'static str>) {
                $($elem::push_tokens(out);)+
            }

            fn encode_into(&self, out: &mut [u8]) {
                let ($($elem,)+) = self;
                let mut offset = 0;
                $(
                    $elem.encode_into(&mut out[offset..offset + <$elem as FixedWidth>::WIDTH]);
                    offset += <$elem as FixedWidth>::WIDTH;
                )+
                debug_assert_eq!(offset, Self::WIDTH);
            }

            fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
                if bytes.len() != Self::WIDTH {
                    return Err(CodecError::SizeMismatch {
                        type_token: "tuple",
                        expected: Self::WIDTH,
                        actual: bytes.len(),
                    });
                }
                let mut offset = 0;
                $(
                    let $elem =
                        <$elem as FixedWidth>::decode(&bytes[offset..offset + <$elem as FixedWidth>::WIDTH])?;
                    offset += <$elem as FixedWidth>::WIDTH;
                )+
                debug_assert_eq!(offset, Self::WIDTH);
                Ok(($($elem,)+))
            }
        }
    };
}

impl_fixed_width_tuple!(A);
impl_fixed_width_tuple!(A, B);
impl_fixed_width_tuple!(A, B, C);
impl_fixed_width_tuple!(A, B, C, D);
impl_fixed_width_tuple!(A, B, C, D, E);
impl_fixed_width_tuple!(A, B, C, D, E, F);
impl_fixed_width_tuple!(A, B, C, D, E, F, G);
impl_fixed_width_tuple!(A, B, C, D, E, F, G, H);


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Property: encode/decode roundtrip preserves scalar values.
        #[test]
        fn prop_u64_roundtrip(value in any::<u64>()) {
            let bytes = value.encode_vec();
            prop_assert_eq!(u64::decode(&bytes).expect("decode should succeed"), value);
        }

        #[test]
        fn prop_i128_roundtrip(value in any::<i128>()) {
            let bytes = value.encode_vec();
            prop_assert_eq!(i128::decode(&bytes).expect("decode should succeed"), value);
        }

        /// Property: floats roundtrip bit-exactly, including NaN payloads.
        #[test]
        fn prop_f64_roundtrip_bitexact(bits in any::<u64>()) {
            let value = f64::from_bits(bits);
            let bytes = value.encode_vec();
            let decoded = f64::decode(&bytes).expect("decode should succeed");
            prop_assert_eq!(decoded.to_bits(), bits);
        }

        /// Property: tuple encoding is injective for integer elements.
        ///
        /// Key equality must exactly mirror byte-for-byte serialization.
        #[test]
        fn prop_tuple_encoding_is_injective(
            a in any::<(i32, u64)>(),
            b in any::<(i32, u64)>(),
        ) {
            if a == b {
                prop_assert_eq!(a.encode_vec(), b.encode_vec());
            } else {
                prop_assert_ne!(a.encode_vec(), b.encode_vec());
            }
        }

        /// Property: tuple roundtrip over a mixed schema.
        #[test]
        fn prop_tuple_roundtrip(value in any::<(u8, i64, bool)>()) {
            let bytes = value.encode_vec();
            prop_assert_eq!(bytes.len(), <(u8, i64, bool)>::WIDTH);
            let decoded = <(u8, i64, bool)>::decode(&bytes).expect("decode should succeed");
            prop_assert_eq!(decoded, value);
        }

        /// Property: decode never reads past a short buffer; it errors.
        #[test]
        fn prop_short_buffers_rejected(len in 0usize..8) {
            let buf = vec![0u8; len];
            prop_assert!(u64::decode(&buf).is_err());
        }
    }
}
