use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Element type of a tensor.
///
/// [`Dynamic`](ElementType::Dynamic) is used when the type is not known
/// until runtime. It merges with any other type.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    #[default]
    #[serde(rename = "?")]
    Dynamic,
    Boolean,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl ElementType {
    pub fn is_dynamic(self) -> bool {
        self == ElementType::Dynamic
    }

    pub fn is_static(self) -> bool {
        !self.is_dynamic()
    }

    /// Return true for floating point types.
    pub fn is_real(self) -> bool {
        matches!(self, ElementType::F32 | ElementType::F64)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            ElementType::I8
                | ElementType::I16
                | ElementType::I32
                | ElementType::I64
                | ElementType::U8
                | ElementType::U16
                | ElementType::U32
                | ElementType::U64
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ElementType::F32
                | ElementType::F64
                | ElementType::I8
                | ElementType::I16
                | ElementType::I32
                | ElementType::I64
        )
    }

    /// Return true for types which can hold the output of a quantize
    /// operation.
    pub fn is_quantized(self) -> bool {
        matches!(self, ElementType::I8 | ElementType::U8 | ElementType::I32)
    }

    /// Return the size of an element in bits, or `None` for a dynamic type.
    pub fn bitwidth(self) -> Option<u32> {
        let bits = match self {
            ElementType::Dynamic => return None,
            ElementType::Boolean | ElementType::I8 | ElementType::U8 => 8,
            ElementType::I16 | ElementType::U16 => 16,
            ElementType::F32 | ElementType::I32 | ElementType::U32 => 32,
            ElementType::F64 | ElementType::I64 | ElementType::U64 => 64,
        };
        Some(bits)
    }

    /// Return the most specific type consistent with `a` and `b`, or `None`
    /// if they are different static types.
    pub fn merge(a: ElementType, b: ElementType) -> Option<ElementType> {
        match (a, b) {
            (ElementType::Dynamic, other) | (other, ElementType::Dynamic) => Some(other),
            (a, b) => (a == b).then_some(a),
        }
    }
}

impl fmt::Display for ElementType {
    /// Format this type in the style of the corresponding Rust type (eg. "i32"
    /// for `ElementType::I32`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Dynamic => "?",
            ElementType::Boolean => "boolean",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::U32 => "u32",
            ElementType::U64 => "u64",
        };
        f.write_str(name)
    }
}

/// Error when parsing an unrecognized [`ElementType`] name.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseElementTypeError(String);

impl fmt::Display for ParseElementTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown element type \"{}\"", self.0)
    }
}

impl Error for ParseElementTypeError {}

impl FromStr for ElementType {
    type Err = ParseElementTypeError;

    /// Parse a type name in the format produced by `Display`.
    fn from_str(s: &str) -> Result<ElementType, ParseElementTypeError> {
        let ty = match s {
            "?" => ElementType::Dynamic,
            "boolean" => ElementType::Boolean,
            "f32" => ElementType::F32,
            "f64" => ElementType::F64,
            "i8" => ElementType::I8,
            "i16" => ElementType::I16,
            "i32" => ElementType::I32,
            "i64" => ElementType::I64,
            "u8" => ElementType::U8,
            "u16" => ElementType::U16,
            "u32" => ElementType::U32,
            "u64" => ElementType::U64,
            _ => return Err(ParseElementTypeError(s.to_string())),
        };
        Ok(ty)
    }
}
