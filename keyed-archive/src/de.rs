use std::collections::HashMap;
use std::io::{BufRead, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::LoadError;
use crate::header::{ArchiveHeader, MapTag, SIGNATURE, VERSION_REGISTER_MAP, VERSION_STRING_MAP};
use crate::math::Floats;
use crate::registry::Registry;
use crate::variant::{Variant, VariantType};
use crate::KeyedArchive;

pub(crate) type Entries = HashMap<String, Variant>;

// Counts come from untrusted input; never reserve more than this up front.
const PREALLOC_LIMIT: usize = 1024;

/// Deepest chain of nested archives and variant vectors a decode accepts.
pub(crate) const MAX_DEPTH: u32 = 64;

pub(crate) trait DeserializeOwned: Sized {
    /// `registry` is the key table inherited from an enclosing RegisterMap
    /// top archive, if any. `depth` counts the containers already entered.
    fn deserialize_owned<R: BufRead>(
        reader: &mut R,
        registry: Option<&Registry>,
        depth: u32,
    ) -> Result<Self, LoadError>;
}

#[inline(always)]
fn capacity(count: u32) -> usize {
    (count as usize).min(PREALLOC_LIMIT)
}

fn logged<T>(result: std::io::Result<T>, what: &str) -> Result<T, LoadError> {
    result.map_err(|e| {
        tracing::error!(error = %e, "failed to read {}", what);
        LoadError::Io(e)
    })
}

/// Read exactly `len` bytes without trusting `len` for the allocation.
fn read_bytes<R: Read>(reader: &mut R, len: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", len, buf.len()),
        ));
    }
    Ok(buf)
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, LoadError> {
    let len = reader.read_u32::<LittleEndian>()?;
    let buf = read_bytes(reader, len as usize)?;
    Ok(String::from_utf8(buf)?)
}

fn read_wide_string<R: Read>(reader: &mut R) -> Result<String, LoadError> {
    let len = reader.read_u32::<LittleEndian>()?;
    let mut units = Vec::with_capacity(capacity(len));
    for _ in 0..len {
        units.push(reader.read_u16::<LittleEndian>()?);
    }
    Ok(String::from_utf16(&units)?)
}

/// One level deeper, or `TooDeep` past [`MAX_DEPTH`].
fn enter(depth: u32) -> Result<u32, LoadError> {
    if depth >= MAX_DEPTH {
        tracing::error!(depth, "nesting exceeds the decode depth limit");
        return Err(LoadError::TooDeep(MAX_DEPTH));
    }
    Ok(depth + 1)
}

fn read_floats<T: Floats, R: Read>(reader: &mut R) -> std::io::Result<T> {
    let mut floats = vec![0f32; T::LEN];
    reader.read_f32_into::<LittleEndian>(&mut floats)?;
    Ok(T::from_floats(&floats))
}

impl DeserializeOwned for ArchiveHeader {
    fn deserialize_owned<R: BufRead>(
        reader: &mut R,
        _registry: Option<&Registry>,
        _depth: u32,
    ) -> Result<Self, LoadError> {
        let mut signature = [0u8; 2];
        logged(reader.read_exact(&mut signature), "archive signature")?;
        if &signature != SIGNATURE {
            tracing::error!(?signature, "invalid keyed archive signature");
            return Err(LoadError::InvalidSignature(signature));
        }

        let version = logged(reader.read_u8(), "archive version")?;
        let tag = logged(reader.read_u8(), "registered map tag")?;

        if version != VERSION_STRING_MAP && version != VERSION_REGISTER_MAP {
            tracing::error!(version, "unsupported keyed archive version");
            return Err(LoadError::UnsupportedVersion(version));
        }

        Ok(ArchiveHeader { version, tag })
    }
}

fn deserialize_string_map<R: BufRead>(
    reader: &mut R,
    depth: u32,
) -> Result<Entries, LoadError> {
    let count = logged(
        reader.read_u32::<LittleEndian>(),
        "StringMap number of items",
    )?;
    let mut entries = Entries::with_capacity(capacity(count));

    for item in 0..count {
        // Archives from old writers may stop short of their declared count.
        // Only this format tolerates it.
        if reader.fill_buf()?.is_empty() {
            tracing::warn!(item, count, "StringMap archive ended before its declared item count");
            break;
        }

        let key = match Variant::deserialize_owned(reader, None, depth) {
            Ok(Variant::String(key)) | Ok(Variant::FastName(key)) => key,
            Ok(other) => {
                tracing::error!(ty = %other.variant_type(), "StringMap key is not a string");
                return Err(LoadError::InvalidKey(other.variant_type()));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read a StringMap key");
                return Err(e);
            }
        };

        let value = Variant::deserialize_owned(reader, None, depth).map_err(|e| {
            tracing::error!(error = %e, %key, "failed to read a StringMap value");
            e
        })?;

        entries.insert(key, value);
    }

    Ok(entries)
}

fn deserialize_hashed_items<R: BufRead>(
    reader: &mut R,
    registry: &Registry,
    depth: u32,
) -> Result<Entries, LoadError> {
    let count = logged(
        reader.read_u32::<LittleEndian>(),
        "RegisterMap number of items",
    )?;
    let mut entries = Entries::with_capacity(capacity(count));

    for _ in 0..count {
        let hash = logged(reader.read_u32::<LittleEndian>(), "item key hash")?;
        let key = match registry.resolve(hash) {
            Some(key) => key.to_string(),
            None => {
                tracing::error!(hash, "key hash missing from registry");
                return Err(LoadError::UnknownKeyHash(hash));
            }
        };

        let value = Variant::deserialize_owned(reader, Some(registry), depth).map_err(|e| {
            tracing::error!(error = %e, %key, "failed to read a RegisterMap value");
            e
        })?;

        entries.insert(key, value);
    }

    Ok(entries)
}

fn deserialize_registry<R: BufRead>(reader: &mut R) -> Result<Registry, LoadError> {
    let count = logged(reader.read_u32::<LittleEndian>(), "number of keys")?;

    let mut keys = Vec::with_capacity(capacity(count));
    for _ in 0..count {
        let len = logged(reader.read_u16::<LittleEndian>(), "key size")?;
        let bytes = logged(read_bytes(reader, len as usize), "key characters")?;
        keys.push(String::from_utf8(bytes)?);
    }

    let mut hashes = Vec::with_capacity(capacity(count));
    for _ in 0..count {
        hashes.push(logged(reader.read_u32::<LittleEndian>(), "key hash")?);
    }

    let registry = Registry::from_tables(keys, &hashes);
    tracing::debug!(keys = count, "deserialized key registry");
    Ok(registry)
}

fn deserialize_register_map<R: BufRead>(
    reader: &mut R,
    tag: u8,
    registry: Option<&Registry>,
    depth: u32,
) -> Result<Entries, LoadError> {
    match MapTag::from_id(tag) {
        Some(MapTag::Empty) => Ok(Entries::new()),
        Some(MapTag::Top) => {
            let registry = deserialize_registry(reader)?;
            deserialize_hashed_items(reader, &registry, depth)
        }
        Some(MapTag::Sub) => match registry {
            Some(registry) => deserialize_hashed_items(reader, registry, depth),
            None => {
                tracing::error!("sub-archive without an enclosing key registry");
                Err(LoadError::MissingRegistry)
            }
        },
        None => {
            tracing::error!(tag, "unknown registered map tag");
            Err(LoadError::UnknownMapTag(tag))
        }
    }
}

impl DeserializeOwned for KeyedArchive {
    fn deserialize_owned<R: BufRead>(
        reader: &mut R,
        registry: Option<&Registry>,
        depth: u32,
    ) -> Result<Self, LoadError> {
        let header = ArchiveHeader::deserialize_owned(reader, None, depth)?;

        let entries = if header.version == VERSION_STRING_MAP {
            deserialize_string_map(reader, depth)?
        } else {
            deserialize_register_map(reader, header.tag, registry, depth)?
        };

        tracing::debug!(
            version = header.version,
            tag = header.tag,
            count = entries.len(),
            "deserialized KeyedArchive"
        );

        Ok(KeyedArchive { entries })
    }
}

impl DeserializeOwned for Variant {
    fn deserialize_owned<R: BufRead>(
        reader: &mut R,
        registry: Option<&Registry>,
        depth: u32,
    ) -> Result<Self, LoadError> {
        let code = reader.read_u8()?;
        let ty = VariantType::from_code(code).ok_or_else(|| {
            tracing::error!(code, "unknown variant type code");
            LoadError::UnknownVariantType(code)
        })?;

        let value = match ty {
            VariantType::None => Variant::None,
            VariantType::Bool => Variant::Bool(reader.read_u8()? != 0),
            VariantType::Int8 => Variant::Int8(reader.read_i8()?),
            VariantType::UInt8 => Variant::UInt8(reader.read_u8()?),
            VariantType::Int16 => Variant::Int16(reader.read_i16::<LittleEndian>()?),
            VariantType::UInt16 => Variant::UInt16(reader.read_u16::<LittleEndian>()?),
            VariantType::Int32 => Variant::Int32(reader.read_i32::<LittleEndian>()?),
            VariantType::UInt32 => Variant::UInt32(reader.read_u32::<LittleEndian>()?),
            VariantType::Int64 => Variant::Int64(reader.read_i64::<LittleEndian>()?),
            VariantType::UInt64 => Variant::UInt64(reader.read_u64::<LittleEndian>()?),
            VariantType::Float => Variant::Float(reader.read_f32::<LittleEndian>()?),
            VariantType::Float64 => Variant::Float64(reader.read_f64::<LittleEndian>()?),
            VariantType::String => Variant::String(read_string(reader)?),
            VariantType::WideString => Variant::WideString(read_wide_string(reader)?),
            VariantType::FastName => Variant::FastName(read_string(reader)?),
            VariantType::FilePath => Variant::FilePath(read_string(reader)?),
            VariantType::ByteArray => {
                let len = reader.read_u32::<LittleEndian>()?;
                Variant::ByteArray(read_bytes(reader, len as usize)?)
            }
            VariantType::Vector2 => Variant::Vector2(read_floats(reader)?),
            VariantType::Vector3 => Variant::Vector3(read_floats(reader)?),
            VariantType::Vector4 => Variant::Vector4(read_floats(reader)?),
            VariantType::Matrix2 => Variant::Matrix2(read_floats(reader)?),
            VariantType::Matrix3 => Variant::Matrix3(read_floats(reader)?),
            VariantType::Matrix4 => Variant::Matrix4(read_floats(reader)?),
            VariantType::Color => Variant::Color(read_floats(reader)?),
            VariantType::Rect => Variant::Rect(read_floats(reader)?),
            VariantType::Quaternion => Variant::Quaternion(read_floats(reader)?),
            VariantType::Transform => Variant::Transform(read_floats(reader)?),
            VariantType::AABBox2 => Variant::AABBox2(read_floats(reader)?),
            VariantType::AABBox3 => Variant::AABBox3(read_floats(reader)?),
            VariantType::KeyedArchive => {
                let depth = enter(depth)?;
                let len = reader.read_u32::<LittleEndian>()?;
                let bytes = read_bytes(reader, len as usize)?;
                let mut slice = bytes.as_slice();
                Variant::KeyedArchive(KeyedArchive::deserialize_owned(
                    &mut slice, registry, depth,
                )?)
            }
            VariantType::VariantVector => {
                let depth = enter(depth)?;
                let count = reader.read_u32::<LittleEndian>()?;
                let mut items = Vec::with_capacity(capacity(count));
                for _ in 0..count {
                    items.push(Variant::deserialize_owned(reader, registry, depth)?);
                }
                Variant::VariantVector(items)
            }
        };

        Ok(value)
    }
}
