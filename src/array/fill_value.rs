//! The fill value of an array: the logical value of any element not backed
//! by a stored chunk.

/// A fill value, stored as the byte representation of a single element.
///
/// For fixed-size data types this holds exactly one element in native byte
/// order. For the variable-length string data type it holds the UTF-8 bytes
/// of the fill string (possibly empty).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl FillValue {
    /// Create a new fill value from its byte representation.
    #[must_use]
    pub fn new(fill_value: Vec<u8>) -> Self {
        Self(fill_value)
    }

    /// Return the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return true if every element of `bytes` is the fill value.
    ///
    /// Returns false if `bytes` is not a whole number of elements.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        if self.0.is_empty() {
            return bytes.is_empty();
        }
        if bytes.len() % self.0.len() != 0 {
            return false;
        }
        bytes
            .chunks_exact(self.0.len())
            .all(|element| element == self.0.as_slice())
    }
}

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        Self(vec![u8::from(value)])
    }
}

impl From<u8> for FillValue {
    fn from(value: u8) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<u16> for FillValue {
    fn from(value: u16) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<u32> for FillValue {
    fn from(value: u32) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<u64> for FillValue {
    fn from(value: u64) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<i8> for FillValue {
    fn from(value: i8) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<i16> for FillValue {
    fn from(value: i16) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<i32> for FillValue {
    fn from(value: i32) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<i64> for FillValue {
    fn from(value: i64) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<f32> for FillValue {
    fn from(value: f32) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<f64> for FillValue {
    fn from(value: f64) -> Self {
        Self(value.to_ne_bytes().to_vec())
    }
}

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for FillValue {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value_bytes() {
        assert_eq!(FillValue::from(1.0f32).as_ne_bytes(), 1.0f32.to_ne_bytes());
        assert_eq!(FillValue::from(-5i64).as_ne_bytes(), (-5i64).to_ne_bytes());
        assert_eq!(FillValue::from(true).as_ne_bytes(), &[1]);
        assert_eq!(FillValue::from("ab").as_ne_bytes(), "ab".as_bytes());
    }

    #[test]
    fn fill_value_equals_all() {
        let fill_value = FillValue::from(0x1234_5678u32);
        let mut bytes = 0x1234_5678u32.to_ne_bytes().repeat(5);
        assert!(fill_value.equals_all(&bytes));
        bytes[9] = 0;
        assert!(!fill_value.equals_all(&bytes));
        assert!(!fill_value.equals_all(&bytes[..7]));
    }

    #[test]
    fn fill_value_equals_all_empty() {
        let fill_value = FillValue::from("");
        assert!(fill_value.equals_all(&[]));
        assert!(!fill_value.equals_all(&[0]));
    }
}
