use std::convert::TryFrom;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::SaveError;
use crate::header::{ArchiveHeader, SIGNATURE};
use crate::math::Floats;
use crate::variant::{Variant, VariantType};
use crate::KeyedArchive;

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), SaveError>;
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> Result<(), SaveError> {
    let len = u32::try_from(len).map_err(|_| SaveError::TooLarge(len))?;
    writer.write_u32::<LittleEndian>(len)?;
    Ok(())
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<(), SaveError> {
    write_len(writer, value.len())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn write_floats<T: Floats, W: Write>(writer: &mut W, value: &T) -> Result<(), SaveError> {
    for v in value.to_floats() {
        writer.write_f32::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Keys go on the wire as string variants.
pub(crate) fn write_key<W: Write>(writer: &mut W, key: &str) -> Result<(), SaveError> {
    writer.write_u8(VariantType::String.code())?;
    write_string(writer, key)
}

impl Serialize for ArchiveHeader {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        writer.write_all(SIGNATURE)?;
        writer.write_u8(self.version)?;
        writer.write_u8(self.tag)?;
        Ok(())
    }
}

impl Serialize for KeyedArchive {
    /// Always the StringMap layout, keys in sorted order so identical
    /// archives produce identical bytes.
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        let mut keys = self.entries.keys().collect::<Vec<_>>();
        keys.sort();

        ArchiveHeader::string_map().write(writer)?;
        write_len(writer, keys.len())?;

        for key in keys {
            write_key(writer, key)?;
            self.entries[key].write(writer)?;
        }

        Ok(())
    }
}

impl Serialize for Variant {
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        writer.write_u8(self.variant_type().code())?;

        match self {
            Variant::None => {}
            Variant::Bool(v) => writer.write_u8(*v as u8)?,
            Variant::Int8(v) => writer.write_i8(*v)?,
            Variant::UInt8(v) => writer.write_u8(*v)?,
            Variant::Int16(v) => writer.write_i16::<LittleEndian>(*v)?,
            Variant::UInt16(v) => writer.write_u16::<LittleEndian>(*v)?,
            Variant::Int32(v) => writer.write_i32::<LittleEndian>(*v)?,
            Variant::UInt32(v) => writer.write_u32::<LittleEndian>(*v)?,
            Variant::Int64(v) => writer.write_i64::<LittleEndian>(*v)?,
            Variant::UInt64(v) => writer.write_u64::<LittleEndian>(*v)?,
            Variant::Float(v) => writer.write_f32::<LittleEndian>(*v)?,
            Variant::Float64(v) => writer.write_f64::<LittleEndian>(*v)?,
            Variant::String(v) | Variant::FastName(v) | Variant::FilePath(v) => {
                write_string(writer, v)?
            }
            Variant::WideString(v) => {
                let units = v.encode_utf16().collect::<Vec<_>>();
                write_len(writer, units.len())?;
                for unit in units {
                    writer.write_u16::<LittleEndian>(unit)?;
                }
            }
            Variant::ByteArray(v) => {
                write_len(writer, v.len())?;
                writer.write_all(v)?;
            }
            Variant::Vector2(v) => write_floats(writer, v)?,
            Variant::Vector3(v) => write_floats(writer, v)?,
            Variant::Vector4(v) => write_floats(writer, v)?,
            Variant::Matrix2(v) => write_floats(writer, v)?,
            Variant::Matrix3(v) => write_floats(writer, v)?,
            Variant::Matrix4(v) => write_floats(writer, v)?,
            Variant::Color(v) => write_floats(writer, v)?,
            Variant::Rect(v) => write_floats(writer, v)?,
            Variant::Quaternion(v) => write_floats(writer, v)?,
            Variant::Transform(v) => write_floats(writer, v)?,
            Variant::AABBox2(v) => write_floats(writer, v)?,
            Variant::AABBox3(v) => write_floats(writer, v)?,
            Variant::KeyedArchive(archive) => {
                let mut buf = Vec::new();
                archive.write(&mut buf)?;
                write_len(writer, buf.len())?;
                writer.write_all(&buf)?;
            }
            Variant::VariantVector(items) => {
                write_len(writer, items.len())?;
                for item in items {
                    item.write(writer)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn encode<T: Serialize>(value: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        value.write(&mut buf).unwrap();
        buf
    }

    #[test]
    fn empty_archive_layout() {
        // Version 1 followed by a zero tag byte, as a u16 writer would produce.
        assert_eq!(
            encode(&KeyedArchive::new()),
            b"KA\x01\x00\x00\x00\x00\x00".to_vec()
        );
    }

    #[test]
    fn scalar_layouts() {
        assert_eq!(encode(&Variant::Bool(true)), vec![1, 1]);
        assert_eq!(encode(&Variant::Int32(-2)), vec![2, 0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(encode(&Variant::from("ab")), vec![4, 2, 0, 0, 0, b'a', b'b']);
        assert_eq!(encode(&Variant::UInt16(0x0102)), vec![25, 0x02, 0x01]);
        assert_eq!(encode(&Variant::Vector3(Vector3::new(1.0, 0.0, 0.0))).len(), 13);
    }

    #[test]
    fn keys_are_sorted() {
        let mut archive = KeyedArchive::new();
        archive.set_bool("zeta", true);
        archive.set_bool("alpha", false);

        let bytes = encode(&archive);
        let alpha = bytes.windows(5).position(|w| w == b"alpha").unwrap();
        let zeta = bytes.windows(4).position(|w| w == b"zeta").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn nested_archive_is_length_prefixed() {
        let mut inner = KeyedArchive::new();
        inner.set_i32("gold", 50);
        let inner_bytes = encode(&inner);

        let bytes = encode(&Variant::KeyedArchive(inner));
        assert_eq!(bytes[0], VariantType::KeyedArchive.code());
        assert_eq!(&bytes[1..5], &(inner_bytes.len() as u32).to_le_bytes());
        assert_eq!(&bytes[5..], inner_bytes.as_slice());
    }
}
