use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Error returned when parsing an [`IntType`] from a string like `"u16"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid integer type string {0:?}, expected e.g. \"u8\" or \"s32\"")]
pub struct ParseIntTypeError(pub String);

/// The value domain of a single column: signedness plus a bit width of
/// 8, 16, 32 or 64.
///
/// Every decoded value is carried as an `i128` so that the full `u64` and
/// `s64` domains are representable exactly; `IntType` supplies the range
/// operations (clamp, wraparound, bit-pattern conversion) the predictors
/// need to mirror the encoder's fixed-width arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntType {
    signed: bool,
    bitsize: u32,
}

impl IntType {
    /// Creates a new `IntType`.
    ///
    /// # Panics
    /// Panics if `bitsize` is not one of 8, 16, 32, 64.
    pub fn new(signed: bool, bitsize: u32) -> Self {
        assert!(
            matches!(bitsize, 8 | 16 | 32 | 64),
            "bit size must be one of 8, 16, 32, 64"
        );
        Self { signed, bitsize }
    }

    #[inline]
    pub fn signed(&self) -> bool {
        self.signed
    }

    #[inline]
    pub fn bitsize(&self) -> u32 {
        self.bitsize
    }

    /// Width of the type in bytes.
    #[inline]
    pub fn bytesize(&self) -> u32 {
        self.bitsize / 8
    }

    /// Smallest representable value.
    pub fn min(&self) -> i128 {
        if self.signed {
            -(1i128 << (self.bitsize - 1))
        } else {
            0
        }
    }

    /// Largest representable value.
    pub fn max(&self) -> i128 {
        if self.signed {
            (1i128 << (self.bitsize - 1)) - 1
        } else {
            (1i128 << self.bitsize) - 1
        }
    }

    /// Half-open range of representable values.
    pub fn range(&self) -> Range<i128> {
        self.min()..self.max() + 1
    }

    /// Returns `value` limited to the representable range.
    pub fn clamp(&self, value: i128) -> i128 {
        value.clamp(self.min(), self.max())
    }

    /// Reduces `value` modulo the full range width, the fixed-width
    /// wraparound the encoder gets from unsigned overflow.
    pub fn wrap(&self, value: i128) -> i128 {
        let width = 1i128 << self.bitsize;
        let min = self.min();
        min + (value - min).rem_euclid(width)
    }

    /// Interprets an unsigned bit pattern of this type's width as a value,
    /// two's complement for signed types.
    pub fn from_bits(&self, bits: u64) -> i128 {
        let bits = bits as i128 & ((1i128 << self.bitsize) - 1);
        if self.signed && bits > self.max() {
            bits - (1i128 << self.bitsize)
        } else {
            bits
        }
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", if self.signed { 's' } else { 'u' }, self.bitsize)
    }
}

impl FromStr for IntType {
    type Err = ParseIntTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let signed = match s.chars().next() {
            Some('s') => true,
            Some('u') => false,
            _ => return Err(ParseIntTypeError(s.to_owned())),
        };
        match s[1..].parse() {
            Ok(bitsize @ (8 | 16 | 32 | 64)) => Ok(Self { signed, bitsize }),
            _ => Err(ParseIntTypeError(s.to_owned())),
        }
    }
}

/// A named column of a stream, at a stable position in each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: IntType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: IntType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax() {
        assert_eq!(IntType::new(false, 8).min(), 0);
        assert_eq!(IntType::new(false, 8).max(), 255);
        assert_eq!(IntType::new(true, 8).min(), -128);
        assert_eq!(IntType::new(true, 8).max(), 127);
        assert_eq!(IntType::new(false, 64).max(), u64::MAX as i128);
        assert_eq!(IntType::new(true, 64).min(), i64::MIN as i128);
        assert_eq!(IntType::new(true, 64).max(), i64::MAX as i128);
    }

    #[test]
    fn test_range_is_half_open() {
        let ty = IntType::new(true, 16);
        let r = ty.range();
        assert_eq!(r.start, -32768);
        assert_eq!(r.end, 32768);
        assert!(r.contains(&32767));
        assert!(!r.contains(&32768));
    }

    #[test]
    fn test_clamp() {
        let ty = IntType::new(false, 8);
        assert_eq!(ty.clamp(-1), 0);
        assert_eq!(ty.clamp(0), 0);
        assert_eq!(ty.clamp(200), 200);
        assert_eq!(ty.clamp(256), 255);
    }

    #[test]
    fn test_wrap() {
        let u8t = IntType::new(false, 8);
        assert_eq!(u8t.wrap(400), 144);
        assert_eq!(u8t.wrap(-1), 255);
        assert_eq!(u8t.wrap(37), 37);
        let s8t = IntType::new(true, 8);
        assert_eq!(s8t.wrap(200), -56);
        assert_eq!(s8t.wrap(-200), 56);
        assert_eq!(s8t.wrap(-128), -128);
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(IntType::new(false, 8).from_bits(0xff), 255);
        assert_eq!(IntType::new(true, 8).from_bits(0xff), -1);
        assert_eq!(IntType::new(true, 8).from_bits(0x7f), 127);
        assert_eq!(IntType::new(true, 64).from_bits(u64::MAX), -1);
        assert_eq!(IntType::new(false, 64).from_bits(u64::MAX), u64::MAX as i128);
    }

    #[test]
    fn test_display_and_parse() {
        for s in ["u8", "s8", "u16", "s16", "u32", "s32", "u64", "s64"] {
            let ty: IntType = s.parse().unwrap();
            assert_eq!(ty.to_string(), s);
        }
        assert!("x8".parse::<IntType>().is_err());
        assert!("u12".parse::<IntType>().is_err());
        assert!("u".parse::<IntType>().is_err());
    }

    #[test]
    #[should_panic]
    fn test_invalid_bitsize_panics() {
        IntType::new(false, 12);
    }
}
