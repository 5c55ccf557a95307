use std::fmt;
use std::io::{BufRead, Write};

use crate::de::DeserializeOwned;
use crate::error::{LoadError, SaveError};
use crate::math::{
    AABBox2, AABBox3, Color, Matrix2, Matrix3, Matrix4, Quaternion, Rect, Transform, Vector2,
    Vector3, Vector4,
};
use crate::registry::Registry;
use crate::ser::Serialize;
use crate::KeyedArchive;

/// A single tagged value stored in a [`KeyedArchive`].
///
/// Exactly one payload is live at a time. Heap payloads (strings, byte
/// arrays, nested archives, vectors) are owned by the variant and dropped
/// when it is reassigned or goes away, so cloning a variant always clones
/// deeply.
///
/// The `as_*` accessors are strict: they return `None` unless the variant
/// holds exactly the requested type. No numeric widening is performed.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    None,
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Float64(f64),
    String(String),
    /// Text stored as UTF-16 on the wire.
    WideString(String),
    /// Interned identifier; stored like a string.
    FastName(String),
    FilePath(String),
    ByteArray(Vec<u8>),
    Vector2(Vector2),
    Vector3(Vector3),
    Vector4(Vector4),
    Matrix2(Matrix2),
    Matrix3(Matrix3),
    Matrix4(Matrix4),
    Color(Color),
    Rect(Rect),
    Quaternion(Quaternion),
    Transform(Transform),
    AABBox2(AABBox2),
    AABBox3(AABBox3),
    KeyedArchive(KeyedArchive),
    VariantVector(Vec<Variant>),
}

/// The tag of a [`Variant`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantType {
    None,
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Float64,
    String,
    WideString,
    FastName,
    FilePath,
    ByteArray,
    Vector2,
    Vector3,
    Vector4,
    Matrix2,
    Matrix3,
    Matrix4,
    Color,
    Rect,
    Quaternion,
    Transform,
    AABBox2,
    AABBox3,
    KeyedArchive,
    VariantVector,
}

// (type, wire code, yaml type name)
const TYPE_TABLE: &[(VariantType, u8, &str)] = &[
    (VariantType::None, 0, "none"),
    (VariantType::Bool, 1, "bool"),
    (VariantType::Int32, 2, "int32"),
    (VariantType::Float, 3, "float"),
    (VariantType::String, 4, "string"),
    (VariantType::WideString, 5, "wideString"),
    (VariantType::ByteArray, 6, "byteArray"),
    (VariantType::UInt32, 7, "uint32"),
    (VariantType::KeyedArchive, 8, "keyedArchive"),
    (VariantType::Int64, 9, "int64"),
    (VariantType::UInt64, 10, "uint64"),
    (VariantType::Vector2, 11, "Vector2"),
    (VariantType::Vector3, 12, "Vector3"),
    (VariantType::Vector4, 13, "Vector4"),
    (VariantType::Matrix2, 14, "Matrix2"),
    (VariantType::Matrix3, 15, "Matrix3"),
    (VariantType::Matrix4, 16, "Matrix4"),
    (VariantType::Color, 17, "Color"),
    (VariantType::FastName, 18, "FastName"),
    (VariantType::AABBox3, 19, "AABBox3"),
    (VariantType::FilePath, 20, "FilePath"),
    (VariantType::Float64, 21, "float64"),
    (VariantType::Int8, 22, "int8"),
    (VariantType::UInt8, 23, "uint8"),
    (VariantType::Int16, 24, "int16"),
    (VariantType::UInt16, 25, "uint16"),
    (VariantType::Rect, 26, "Rect"),
    (VariantType::VariantVector, 27, "variantVector"),
    (VariantType::Quaternion, 28, "Quaternion"),
    (VariantType::Transform, 29, "Transform"),
    (VariantType::AABBox2, 30, "AABBox2"),
];

impl VariantType {
    /// The one-byte code written in front of every variant payload.
    pub fn code(self) -> u8 {
        TYPE_TABLE
            .iter()
            .find(|(ty, _, _)| *ty == self)
            .map(|(_, code, _)| *code)
            .unwrap_or(0)
    }

    pub fn from_code(code: u8) -> Option<VariantType> {
        TYPE_TABLE
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(ty, _, _)| *ty)
    }

    /// Name used as the single key of a typed YAML variant node.
    pub fn type_name(self) -> &'static str {
        TYPE_TABLE
            .iter()
            .find(|(ty, _, _)| *ty == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("none")
    }

    pub fn from_type_name(name: &str) -> Option<VariantType> {
        TYPE_TABLE
            .iter()
            .find(|(_, _, n)| *n == name)
            .map(|(ty, _, _)| *ty)
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::None
    }
}

macro_rules! copy_accessor {
    ($fn:ident, $variant:ident, $ty:ty) => {
        pub fn $fn(&self) -> Option<$ty> {
            match self {
                Variant::$variant(v) => Some(*v),
                _ => None,
            }
        }
    };
}

macro_rules! str_accessor {
    ($fn:ident, $variant:ident) => {
        pub fn $fn(&self) -> Option<&str> {
            match self {
                Variant::$variant(v) => Some(v.as_str()),
                _ => None,
            }
        }
    };
}

impl Variant {
    pub fn variant_type(&self) -> VariantType {
        match self {
            Variant::None => VariantType::None,
            Variant::Bool(_) => VariantType::Bool,
            Variant::Int8(_) => VariantType::Int8,
            Variant::UInt8(_) => VariantType::UInt8,
            Variant::Int16(_) => VariantType::Int16,
            Variant::UInt16(_) => VariantType::UInt16,
            Variant::Int32(_) => VariantType::Int32,
            Variant::UInt32(_) => VariantType::UInt32,
            Variant::Int64(_) => VariantType::Int64,
            Variant::UInt64(_) => VariantType::UInt64,
            Variant::Float(_) => VariantType::Float,
            Variant::Float64(_) => VariantType::Float64,
            Variant::String(_) => VariantType::String,
            Variant::WideString(_) => VariantType::WideString,
            Variant::FastName(_) => VariantType::FastName,
            Variant::FilePath(_) => VariantType::FilePath,
            Variant::ByteArray(_) => VariantType::ByteArray,
            Variant::Vector2(_) => VariantType::Vector2,
            Variant::Vector3(_) => VariantType::Vector3,
            Variant::Vector4(_) => VariantType::Vector4,
            Variant::Matrix2(_) => VariantType::Matrix2,
            Variant::Matrix3(_) => VariantType::Matrix3,
            Variant::Matrix4(_) => VariantType::Matrix4,
            Variant::Color(_) => VariantType::Color,
            Variant::Rect(_) => VariantType::Rect,
            Variant::Quaternion(_) => VariantType::Quaternion,
            Variant::Transform(_) => VariantType::Transform,
            Variant::AABBox2(_) => VariantType::AABBox2,
            Variant::AABBox3(_) => VariantType::AABBox3,
            Variant::KeyedArchive(_) => VariantType::KeyedArchive,
            Variant::VariantVector(_) => VariantType::VariantVector,
        }
    }

    /// Decodes one variant. Nested archives resolve their keys through
    /// `registry` when they are RegisterMap sub-archives.
    pub fn read<R: BufRead>(
        reader: &mut R,
        registry: Option<&Registry>,
    ) -> Result<Variant, LoadError> {
        Variant::deserialize_owned(reader, registry, 0)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        Serialize::write(self, writer)
    }

    #[inline(always)]
    pub fn is_none(&self) -> bool {
        matches!(self, Variant::None)
    }

    copy_accessor!(as_bool, Bool, bool);
    copy_accessor!(as_i8, Int8, i8);
    copy_accessor!(as_u8, UInt8, u8);
    copy_accessor!(as_i16, Int16, i16);
    copy_accessor!(as_u16, UInt16, u16);
    copy_accessor!(as_i32, Int32, i32);
    copy_accessor!(as_u32, UInt32, u32);
    copy_accessor!(as_i64, Int64, i64);
    copy_accessor!(as_u64, UInt64, u64);
    copy_accessor!(as_f32, Float, f32);
    copy_accessor!(as_f64, Float64, f64);
    copy_accessor!(as_vector2, Vector2, Vector2);
    copy_accessor!(as_vector3, Vector3, Vector3);
    copy_accessor!(as_vector4, Vector4, Vector4);
    copy_accessor!(as_matrix2, Matrix2, Matrix2);
    copy_accessor!(as_matrix3, Matrix3, Matrix3);
    copy_accessor!(as_matrix4, Matrix4, Matrix4);
    copy_accessor!(as_color, Color, Color);
    copy_accessor!(as_rect, Rect, Rect);
    copy_accessor!(as_quaternion, Quaternion, Quaternion);
    copy_accessor!(as_transform, Transform, Transform);
    copy_accessor!(as_aabbox2, AABBox2, AABBox2);
    copy_accessor!(as_aabbox3, AABBox3, AABBox3);

    str_accessor!(as_str, String);
    str_accessor!(as_wide_str, WideString);
    str_accessor!(as_fast_name, FastName);
    str_accessor!(as_file_path, FilePath);

    pub fn as_byte_array(&self) -> Option<&[u8]> {
        match self {
            Variant::ByteArray(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_archive(&self) -> Option<&KeyedArchive> {
        match self {
            Variant::KeyedArchive(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_archive_mut(&mut self) -> Option<&mut KeyedArchive> {
        match self {
            Variant::KeyedArchive(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_variant_vector(&self) -> Option<&[Variant]> {
        match self {
            Variant::VariantVector(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

macro_rules! from_payload {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Variant {
            fn from(v: $ty) -> Self {
                Variant::$variant(v)
            }
        }
    };
}

from_payload!(Bool, bool);
from_payload!(Int8, i8);
from_payload!(UInt8, u8);
from_payload!(Int16, i16);
from_payload!(UInt16, u16);
from_payload!(Int32, i32);
from_payload!(UInt32, u32);
from_payload!(Int64, i64);
from_payload!(UInt64, u64);
from_payload!(Float, f32);
from_payload!(Float64, f64);
from_payload!(String, String);
from_payload!(ByteArray, Vec<u8>);
from_payload!(Vector2, Vector2);
from_payload!(Vector3, Vector3);
from_payload!(Vector4, Vector4);
from_payload!(Matrix2, Matrix2);
from_payload!(Matrix3, Matrix3);
from_payload!(Matrix4, Matrix4);
from_payload!(Color, Color);
from_payload!(Rect, Rect);
from_payload!(Quaternion, Quaternion);
from_payload!(Transform, Transform);
from_payload!(AABBox2, AABBox2);
from_payload!(AABBox3, AABBox3);
from_payload!(KeyedArchive, KeyedArchive);
from_payload!(VariantVector, Vec<Variant>);

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<&[u8]> for Variant {
    fn from(v: &[u8]) -> Self {
        Variant::ByteArray(v.to_vec())
    }
}

fn write_floats(f: &mut fmt::Formatter<'_>, floats: &[f32]) -> fmt::Result {
    f.write_str("(")?;
    for (i, v) in floats.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", v)?;
    }
    f.write_str(")")
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::math::Floats;

        match self {
            Variant::None => f.write_str("none"),
            Variant::Bool(v) => write!(f, "{}", v),
            Variant::Int8(v) => write!(f, "{}", v),
            Variant::UInt8(v) => write!(f, "{}", v),
            Variant::Int16(v) => write!(f, "{}", v),
            Variant::UInt16(v) => write!(f, "{}", v),
            Variant::Int32(v) => write!(f, "{}", v),
            Variant::UInt32(v) => write!(f, "{}", v),
            Variant::Int64(v) => write!(f, "{}", v),
            Variant::UInt64(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{:.6}", v),
            Variant::Float64(v) => write!(f, "{:.6}", v),
            Variant::String(v) | Variant::WideString(v) => f.write_str(v),
            Variant::FastName(v) => write!(f, "#{}", v),
            Variant::FilePath(v) => write!(f, "path:{}", v),
            Variant::ByteArray(v) => write!(f, "<{} bytes>", v.len()),
            Variant::Vector2(v) => write_floats(f, &v.to_floats()),
            Variant::Vector3(v) => write_floats(f, &v.to_floats()),
            Variant::Vector4(v) => write_floats(f, &v.to_floats()),
            Variant::Matrix2(v) => write_floats(f, &v.to_floats()),
            Variant::Matrix3(v) => write_floats(f, &v.to_floats()),
            Variant::Matrix4(v) => write_floats(f, &v.to_floats()),
            Variant::Color(v) => write_floats(f, &v.to_floats()),
            Variant::Rect(v) => write_floats(f, &v.to_floats()),
            Variant::Quaternion(v) => write_floats(f, &v.to_floats()),
            Variant::Transform(v) => write_floats(f, &v.to_floats()),
            Variant::AABBox2(v) => write_floats(f, &v.to_floats()),
            Variant::AABBox3(v) => write_floats(f, &v.to_floats()),
            Variant::KeyedArchive(v) => write!(f, "<archive, {} keys>", v.len()),
            Variant::VariantVector(v) => write!(f, "<{} variants>", v.len()),
        }
    }
}
