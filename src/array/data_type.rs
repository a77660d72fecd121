//! The closed set of element data types an array can hold.
//!
//! The set is part of the on-disk contract, so it is a plain enum rather
//! than an extension point; every operation that depends on the data type
//! selects its code path once per call from this enum.

use derive_more::Display;
use thiserror::Error;

use super::endianness::Endianness;
use super::fill_value::FillValue;

/// A data type.
#[derive(Clone, Eq, PartialEq, Debug, Display)]
#[non_exhaustive]
pub enum DataType {
    /// `bool` Boolean, stored as one byte (0 or 1).
    #[display("bool")]
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    #[display("int8")]
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    #[display("int16")]
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    #[display("int32")]
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    #[display("int64")]
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[display("uint8")]
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    #[display("uint16")]
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    #[display("uint32")]
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    #[display("uint64")]
    UInt64,
    /// `float32` IEEE 754 single-precision floating point.
    #[display("float32")]
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    #[display("float64")]
    Float64,
    /// `char` A single UTF-16 code unit, stored as two bytes.
    #[display("char")]
    Char,
    /// `string` A variable-length UTF-8 string.
    #[display("string")]
    String,
}

/// The size of an element of a data type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DataTypeSize {
    /// Every element has the same size in bytes.
    Fixed(usize),
    /// Elements have a variable size (the string data type).
    Variable,
}

impl DataType {
    /// Return the identifier of the data type, as written in metadata.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Char => "char",
            Self::String => "string",
        }
    }

    /// Create a data type from its metadata identifier.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if the identifier is not
    /// recognised.
    pub fn from_metadata(identifier: &str) -> Result<Self, UnsupportedDataTypeError> {
        match identifier {
            "bool" => Ok(Self::Bool),
            "int8" => Ok(Self::Int8),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "uint8" => Ok(Self::UInt8),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "uint64" => Ok(Self::UInt64),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            "char" => Ok(Self::Char),
            "string" => Ok(Self::String),
            _ => Err(UnsupportedDataTypeError(identifier.to_string())),
        }
    }

    /// Return the size of an element of the data type.
    #[must_use]
    pub const fn size(&self) -> DataTypeSize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => DataTypeSize::Fixed(1),
            Self::Int16 | Self::UInt16 | Self::Char => DataTypeSize::Fixed(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => DataTypeSize::Fixed(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => DataTypeSize::Fixed(8),
            Self::String => DataTypeSize::Variable,
        }
    }

    /// Return the fixed size in bytes of an element, or [`None`] for
    /// variable-sized data types.
    #[must_use]
    pub const fn fixed_size(&self) -> Option<usize> {
        match self.size() {
            DataTypeSize::Fixed(size) => Some(size),
            DataTypeSize::Variable => None,
        }
    }

    /// Return the default fill value of the data type: zero for the numeric
    /// types, false for booleans, NUL for chars, and the empty string.
    #[must_use]
    pub fn default_fill_value(&self) -> FillValue {
        match self.size() {
            DataTypeSize::Fixed(size) => FillValue::new(vec![0; size]),
            DataTypeSize::Variable => FillValue::new(vec![]),
        }
    }

    /// Create a fill value from its JSON metadata representation.
    ///
    /// Booleans use a JSON boolean, integers a JSON number, floats a JSON
    /// number or one of `"NaN"`, `"Infinity"`, `"-Infinity"`, chars a one
    /// code unit JSON string, and strings a JSON string.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the JSON value is
    /// incompatible with the data type.
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &serde_json::Value,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        let err = || IncompatibleFillValueMetadataError(self.identifier(), fill_value.clone());
        match self {
            Self::Bool => Ok(FillValue::from(fill_value.as_bool().ok_or_else(err)?)),
            Self::Int8 => {
                let int = fill_value.as_i64().ok_or_else(err)?;
                Ok(FillValue::from(i8::try_from(int).map_err(|_| err())?))
            }
            Self::Int16 => {
                let int = fill_value.as_i64().ok_or_else(err)?;
                Ok(FillValue::from(i16::try_from(int).map_err(|_| err())?))
            }
            Self::Int32 => {
                let int = fill_value.as_i64().ok_or_else(err)?;
                Ok(FillValue::from(i32::try_from(int).map_err(|_| err())?))
            }
            Self::Int64 => Ok(FillValue::from(fill_value.as_i64().ok_or_else(err)?)),
            Self::UInt8 => {
                let uint = fill_value.as_u64().ok_or_else(err)?;
                Ok(FillValue::from(u8::try_from(uint).map_err(|_| err())?))
            }
            Self::UInt16 => {
                let uint = fill_value.as_u64().ok_or_else(err)?;
                Ok(FillValue::from(u16::try_from(uint).map_err(|_| err())?))
            }
            Self::UInt32 => {
                let uint = fill_value.as_u64().ok_or_else(err)?;
                Ok(FillValue::from(u32::try_from(uint).map_err(|_| err())?))
            }
            Self::UInt64 => Ok(FillValue::from(fill_value.as_u64().ok_or_else(err)?)),
            Self::Float32 => Ok(FillValue::from(
                float_from_metadata(fill_value).ok_or_else(err)? as f32,
            )),
            Self::Float64 => Ok(FillValue::from(
                float_from_metadata(fill_value).ok_or_else(err)?,
            )),
            Self::Char => {
                let string = fill_value.as_str().ok_or_else(err)?;
                let mut code_units = string.encode_utf16();
                match (code_units.next(), code_units.next()) {
                    (Some(code_unit), None) => Ok(FillValue::from(code_unit)),
                    _ => Err(err()),
                }
            }
            Self::String => Ok(FillValue::from(fill_value.as_str().ok_or_else(err)?)),
        }
    }

    /// Return the JSON metadata representation of a fill value.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the size or content of the
    /// fill value is incompatible with the data type.
    pub fn metadata_fill_value(
        &self,
        fill_value: &FillValue,
    ) -> Result<serde_json::Value, IncompatibleFillValueError> {
        use serde_json::Value;
        let err = || IncompatibleFillValueError(self.identifier(), fill_value.clone());
        let bytes = fill_value.as_ne_bytes();
        if let Some(size) = self.fixed_size() {
            if bytes.len() != size {
                return Err(err());
            }
        }
        match self {
            Self::Bool => Ok(Value::Bool(bytes[0] != 0)),
            Self::Int8 => Ok(i8::from_ne_bytes([bytes[0]]).into()),
            Self::Int16 => Ok(i16::from_ne_bytes(bytes.try_into().map_err(|_| err())?).into()),
            Self::Int32 => Ok(i32::from_ne_bytes(bytes.try_into().map_err(|_| err())?).into()),
            Self::Int64 => Ok(i64::from_ne_bytes(bytes.try_into().map_err(|_| err())?).into()),
            Self::UInt8 => Ok(bytes[0].into()),
            Self::UInt16 => Ok(u16::from_ne_bytes(bytes.try_into().map_err(|_| err())?).into()),
            Self::UInt32 => Ok(u32::from_ne_bytes(bytes.try_into().map_err(|_| err())?).into()),
            Self::UInt64 => Ok(u64::from_ne_bytes(bytes.try_into().map_err(|_| err())?).into()),
            Self::Float32 => {
                let float = f32::from_ne_bytes(bytes.try_into().map_err(|_| err())?);
                Ok(float_to_metadata(f64::from(float)))
            }
            Self::Float64 => {
                let float = f64::from_ne_bytes(bytes.try_into().map_err(|_| err())?);
                Ok(float_to_metadata(float))
            }
            Self::Char => {
                let code_unit = u16::from_ne_bytes(bytes.try_into().map_err(|_| err())?);
                let string = String::from_utf16(&[code_unit]).map_err(|_| err())?;
                Ok(Value::String(string))
            }
            Self::String => {
                let string = core::str::from_utf8(bytes).map_err(|_| err())?;
                Ok(Value::String(string.to_string()))
            }
        }
    }
}

fn float_from_metadata(fill_value: &serde_json::Value) -> Option<f64> {
    match fill_value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(string) => match string.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

fn float_to_metadata(float: f64) -> serde_json::Value {
    if float.is_nan() {
        serde_json::Value::String("NaN".to_string())
    } else if float.is_infinite() {
        if float > 0.0 {
            serde_json::Value::String("Infinity".to_string())
        } else {
            serde_json::Value::String("-Infinity".to_string())
        }
    } else {
        serde_json::Number::from_f64(float).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

/// Reverse the byte order of every element of `bytes`, interpreted as
/// elements of `data_type`.
///
/// # Panics
/// Panics if `data_type` is variable-sized or `bytes` is not a whole number
/// of elements.
pub fn reverse_endianness(bytes: &mut [u8], data_type: &DataType) {
    let element_size = data_type
        .fixed_size()
        .expect("endianness only applies to fixed-size data types");
    assert_eq!(bytes.len() % element_size, 0);
    if element_size > 1 {
        bytes
            .chunks_exact_mut(element_size)
            .for_each(<[u8]>::reverse);
    }
}

/// Convert `bytes` from `endianness` to native byte order (or back; the
/// transform is its own inverse).
pub(crate) fn convert_endianness(bytes: &mut [u8], data_type: &DataType, endianness: Endianness) {
    if !endianness.is_native() {
        reverse_endianness(bytes, data_type);
    }
}

/// An unsupported data type error.
#[derive(Clone, Debug, Error)]
#[error("unsupported data type {0}")]
pub struct UnsupportedDataTypeError(String);

/// The fill value metadata in an array description is incompatible with the
/// data type.
#[derive(Clone, Debug, Error)]
#[error("incompatible fill value metadata for data type {0}: {1}")]
pub struct IncompatibleFillValueMetadataError(&'static str, serde_json::Value);

/// A fill value is incompatible with the data type.
#[derive(Clone, Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(&'static str, FillValue);

impl IncompatibleFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub const fn new(data_type_identifier: &'static str, fill_value: FillValue) -> Self {
        Self(data_type_identifier, fill_value)
    }
}
