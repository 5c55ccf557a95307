use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::iter::FromIterator;
use std::path::Path;

use crate::de::DeserializeOwned;
use crate::error::{LoadError, SaveError};
use crate::math::{
    AABBox2, AABBox3, Color, Matrix2, Matrix3, Matrix4, Quaternion, Rect, Transform, Vector2,
    Vector3, Vector4,
};
use crate::registry::Registry;
use crate::ser::Serialize;
use crate::variant::Variant;

/// A string-keyed map of [`Variant`]s that can be saved to and loaded from
/// the binary keyed archive format or YAML.
///
/// The archive owns every value it holds. Cloning is deep, so a clone never
/// shares nested archives or buffers with its source.
///
/// Typed getters take a default that is returned both when the key is
/// missing and when it holds a different type. Use
/// [`get_variant`](KeyedArchive::get_variant) to tell the two apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedArchive {
    pub(crate) entries: HashMap<String, Variant>,
}

macro_rules! typed_accessors {
    ($($set:ident, $get:ident, $as:ident, $ty:ty;)*) => {
        $(
            pub fn $set<K: Into<String>>(&mut self, key: K, value: $ty) {
                self.set_variant(key, Variant::from(value));
            }

            pub fn $get(&self, key: &str, default: $ty) -> $ty {
                self.entries.get(key).and_then(Variant::$as).unwrap_or(default)
            }
        )*
    };
}

macro_rules! text_accessors {
    ($($set:ident, $get:ident, $variant:ident, $as:ident;)*) => {
        $(
            pub fn $set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
                self.set_variant(key, Variant::$variant(value.into()));
            }

            pub fn $get(&self, key: &str, default: &str) -> String {
                self.entries
                    .get(key)
                    .and_then(Variant::$as)
                    .unwrap_or(default)
                    .to_string()
            }
        )*
    };
}

impl KeyedArchive {
    pub fn new() -> KeyedArchive {
        KeyedArchive::default()
    }

    typed_accessors! {
        set_bool, get_bool, as_bool, bool;
        set_i8, get_i8, as_i8, i8;
        set_u8, get_u8, as_u8, u8;
        set_i16, get_i16, as_i16, i16;
        set_u16, get_u16, as_u16, u16;
        set_i32, get_i32, as_i32, i32;
        set_u32, get_u32, as_u32, u32;
        set_i64, get_i64, as_i64, i64;
        set_u64, get_u64, as_u64, u64;
        set_f32, get_f32, as_f32, f32;
        set_f64, get_f64, as_f64, f64;
        set_vector2, get_vector2, as_vector2, Vector2;
        set_vector3, get_vector3, as_vector3, Vector3;
        set_vector4, get_vector4, as_vector4, Vector4;
        set_matrix2, get_matrix2, as_matrix2, Matrix2;
        set_matrix3, get_matrix3, as_matrix3, Matrix3;
        set_matrix4, get_matrix4, as_matrix4, Matrix4;
        set_color, get_color, as_color, Color;
        set_rect, get_rect, as_rect, Rect;
        set_quaternion, get_quaternion, as_quaternion, Quaternion;
        set_transform, get_transform, as_transform, Transform;
        set_aabbox2, get_aabbox2, as_aabbox2, AABBox2;
        set_aabbox3, get_aabbox3, as_aabbox3, AABBox3;
    }

    text_accessors! {
        set_string, get_string, String, as_str;
        set_wide_string, get_wide_string, WideString, as_wide_str;
        set_fast_name, get_fast_name, FastName, as_fast_name;
        set_file_path, get_file_path, FilePath, as_file_path;
    }

    /// Borrowing variant of [`get_string`](KeyedArchive::get_string).
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Variant::as_str)
    }

    pub fn set_byte_array<K: Into<String>, V: Into<Vec<u8>>>(&mut self, key: K, value: V) {
        self.set_variant(key, Variant::ByteArray(value.into()));
    }

    pub fn get_byte_array(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).and_then(Variant::as_byte_array)
    }

    pub fn get_byte_array_size(&self, key: &str, default: usize) -> usize {
        self.get_byte_array(key).map_or(default, <[u8]>::len)
    }

    pub fn set_variant_vector<K: Into<String>>(&mut self, key: K, value: Vec<Variant>) {
        self.set_variant(key, Variant::VariantVector(value));
    }

    pub fn get_variant_vector(&self, key: &str) -> Option<&[Variant]> {
        self.entries.get(key).and_then(Variant::as_variant_vector)
    }

    /// Stores `archive` as a nested archive. Pass a clone to keep using the
    /// original.
    pub fn set_archive<K: Into<String>>(&mut self, key: K, archive: KeyedArchive) {
        self.set_variant(key, Variant::KeyedArchive(archive));
    }

    /// Borrows a nested archive. The borrow ends before the entry can be
    /// deleted or overwritten.
    pub fn get_archive(&self, key: &str) -> Option<&KeyedArchive> {
        self.entries.get(key).and_then(Variant::as_archive)
    }

    pub fn get_archive_mut(&mut self, key: &str) -> Option<&mut KeyedArchive> {
        self.entries.get_mut(key).and_then(Variant::as_archive_mut)
    }

    /// Embeds the StringMap encoding of `archive` as a byte array.
    ///
    /// Older files store nested archives this way; prefer
    /// [`set_archive`](KeyedArchive::set_archive) for new data.
    pub fn set_byte_array_from_archive<K: Into<String>>(
        &mut self,
        key: K,
        archive: &KeyedArchive,
    ) -> Result<(), SaveError> {
        let bytes = archive.to_bytes()?;
        self.set_byte_array(key, bytes);
        Ok(())
    }

    /// Decodes an archive embedded by
    /// [`set_byte_array_from_archive`](KeyedArchive::set_byte_array_from_archive).
    pub fn get_archive_from_byte_array(&self, key: &str) -> Option<KeyedArchive> {
        let bytes = self.get_byte_array(key).filter(|b| !b.is_empty())?;
        let mut archive = KeyedArchive::new();
        match archive.load_from_bytes(bytes) {
            Ok(()) => Some(archive),
            Err(e) => {
                tracing::error!(error = %e, %key, "byte array does not hold a keyed archive");
                None
            }
        }
    }

    pub fn get_variant(&self, key: &str) -> Option<&Variant> {
        self.entries.get(key)
    }

    pub fn get_variant_mut(&mut self, key: &str) -> Option<&mut Variant> {
        self.entries.get_mut(key)
    }

    /// Inserts or overwrites. The previous value, if any, is dropped.
    pub fn set_variant<K: Into<String>>(&mut self, key: K, value: Variant) {
        self.entries.insert(key.into(), value);
    }

    pub fn is_key_exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn delete_key(&mut self, key: &str) -> Option<Variant> {
        self.entries.remove(key)
    }

    pub fn delete_all_keys(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, or with a key, whether that key is present (0 or 1).
    pub fn count(&self, key: Option<&str>) -> u32 {
        match key {
            Some(key) => self.entries.contains_key(key) as u32,
            None => self.entries.len() as u32,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variant)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries sorted by key.
    pub fn sorted(&self) -> Vec<(&str, &Variant)> {
        let mut entries = self.iter().collect::<Vec<_>>();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Zero-padded key used by archives that store lists, e.g. `"0007"`.
    pub fn gen_key_from_index(index: u32) -> String {
        format!("{:04}", index)
    }

    /// Decodes an archive from `reader` and merges its entries into `self`.
    ///
    /// Either every decoded entry is applied or, on error, none is.
    pub fn load<R: BufRead>(&mut self, reader: &mut R) -> Result<(), LoadError> {
        let archive = KeyedArchive::read(reader, None)?;
        self.entries.extend(archive.entries);
        Ok(())
    }

    /// Decodes a complete archive. `registry` is the key table of an
    /// enclosing RegisterMap archive and is only needed for sub-archives.
    pub fn read<R: BufRead>(
        reader: &mut R,
        registry: Option<&Registry>,
    ) -> Result<KeyedArchive, LoadError> {
        KeyedArchive::deserialize_owned(reader, registry, 0)
    }

    pub fn load_from_bytes(&mut self, data: &[u8]) -> Result<(), LoadError> {
        if data.is_empty() {
            return Err(LoadError::EmptyBuffer);
        }
        tracing::debug!(bytes = data.len(), "loading keyed archive from buffer");
        let mut slice = data;
        self.load(&mut slice)
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "failed to open keyed archive");
            LoadError::OpenFailed(e, path.to_path_buf())
        })?;
        let mut reader = BufReader::new(file);
        self.load(&mut reader).map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "failed to load keyed archive");
            e
        })
    }

    /// Writes the StringMap encoding and flushes `writer`.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), SaveError> {
        Serialize::write(self, writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveError> {
        let path = path.as_ref();
        let file =
            File::create(path).map_err(|e| SaveError::CreateFailed(e, path.to_path_buf()))?;
        let mut writer = BufWriter::new(file);
        self.save(&mut writer)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveError> {
        let mut buf = Vec::new();
        self.save(&mut buf)?;
        tracing::debug!(count = self.len(), bytes = buf.len(), "encoded keyed archive");
        Ok(buf)
    }

    /// Returns the encoded size, copying the encoding into `data` only when
    /// it is provided and large enough. Call with `None` to size a buffer.
    pub fn save_to_buffer(&self, data: Option<&mut [u8]>) -> u32 {
        let bytes = match self.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode keyed archive");
                return 0;
            }
        };

        if let Some(data) = data {
            if data.len() >= bytes.len() {
                data[..bytes.len()].copy_from_slice(&bytes);
            }
        }

        bytes.len() as u32
    }

    /// Human readable listing of the entries. Not a stable format.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "archive contains {} keys", self.len());
        for (key, value) in self.sorted() {
            let _ = writeln!(out, "{} [{}] : {}", key, value.variant_type(), value);
        }
        let _ = writeln!(out, "{}", "=".repeat(60));
        out
    }

    /// Emits [`dump`](KeyedArchive::dump) at debug level.
    pub fn log_dump(&self) {
        for line in self.dump().lines() {
            tracing::debug!("{}", line);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Variant)> for KeyedArchive {
    fn from_iter<I: IntoIterator<Item = (K, Variant)>>(iter: I) -> Self {
        let mut archive = KeyedArchive::new();
        archive.extend(iter);
        archive
    }
}

impl<K: Into<String>> Extend<(K, Variant)> for KeyedArchive {
    fn extend<I: IntoIterator<Item = (K, Variant)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set_variant(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_mistyped_keys_fall_back() {
        let mut archive = KeyedArchive::new();
        archive.set_string("stringKey", "text");
        assert_eq!(archive.get_i32("missingKey", 42), 42);
        assert_eq!(archive.get_i32("stringKey", 42), 42);
        assert_eq!(archive.get_string("stringKey", ""), "text");
        assert!(archive.get_variant("stringKey").is_some());
    }

    #[test]
    fn set_overwrites_with_new_type() {
        let mut archive = KeyedArchive::new();
        archive.set_byte_array("k", vec![1, 2, 3]);
        archive.set_f32("k", 1.5);
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.get_byte_array("k"), None);
        assert_eq!(archive.get_f32("k", 0.0), 1.5);
    }

    #[test]
    fn delete_all_keys_is_idempotent() {
        let mut archive = KeyedArchive::new();
        archive.delete_all_keys();
        assert!(archive.is_empty());

        archive.set_bool("a", true);
        archive.set_bool("b", false);
        archive.delete_all_keys();
        let once = archive.clone();
        archive.delete_all_keys();
        assert_eq!(archive, once);
        assert_eq!(archive.count(None), 0);
    }

    #[test]
    fn count_with_and_without_key() {
        let mut archive = KeyedArchive::new();
        archive.set_u8("a", 1);
        archive.set_u16("b", 2);
        assert_eq!(archive.count(None), 2);
        assert_eq!(archive.count(Some("a")), 1);
        assert_eq!(archive.count(Some("c")), 0);
        assert_eq!(archive.delete_key("a"), Some(Variant::UInt8(1)));
        assert!(!archive.is_key_exists("a"));
        assert_eq!(archive.delete_key("a"), None);
    }

    #[test]
    fn clone_is_deep() {
        let mut inner = KeyedArchive::new();
        inner.set_i32("gold", 50);
        let mut a = KeyedArchive::new();
        a.set_archive("inventory", inner);

        let mut b = a.clone();
        b.get_archive_mut("inventory").unwrap().set_i32("gold", 0);

        assert_eq!(a.get_archive("inventory").unwrap().get_i32("gold", -1), 50);
        assert_eq!(b.get_archive("inventory").unwrap().get_i32("gold", -1), 0);
    }

    #[test]
    fn size_probe() {
        let mut archive = KeyedArchive::new();
        archive.set_string("name", "hero");

        let size = archive.save_to_buffer(None);
        assert_eq!(size as usize, archive.to_bytes().unwrap().len());

        let mut small = vec![0u8; size as usize - 1];
        assert_eq!(archive.save_to_buffer(Some(&mut small)), size);
        assert!(small.iter().all(|b| *b == 0));

        let mut exact = vec![0u8; size as usize];
        assert_eq!(archive.save_to_buffer(Some(&mut exact)), size);
        assert_eq!(&exact[..2], b"KA");
    }

    #[test]
    fn failed_load_leaves_archive_untouched() {
        let mut source = KeyedArchive::new();
        source.set_i32("a", 1);
        source.set_i32("b", 2);
        let mut bytes = source.to_bytes().unwrap();
        bytes.truncate(bytes.len() - 2);

        let mut target = KeyedArchive::new();
        target.set_bool("existing", true);
        assert!(target.load_from_bytes(&bytes).is_err());
        assert_eq!(target.len(), 1);
        assert!(target.get_bool("existing", false));
    }

    #[test]
    fn load_merges_into_existing() {
        let mut source = KeyedArchive::new();
        source.set_i32("a", 1);

        let mut target = KeyedArchive::new();
        target.set_i32("a", 0);
        target.set_i32("b", 2);
        target.load_from_bytes(&source.to_bytes().unwrap()).unwrap();
        assert_eq!(target.get_i32("a", -1), 1);
        assert_eq!(target.get_i32("b", -1), 2);
    }

    #[test]
    fn empty_buffer_is_rejected() {
        let mut archive = KeyedArchive::new();
        assert!(matches!(
            archive.load_from_bytes(&[]),
            Err(LoadError::EmptyBuffer)
        ));
    }

    #[test]
    fn legacy_byte_array_embedding() {
        let mut inner = KeyedArchive::new();
        inner.set_string("shader", "~res:/Materials/Shaders/Default");

        let mut outer = KeyedArchive::new();
        outer.set_byte_array_from_archive("material", &inner).unwrap();
        assert!(outer.get_archive("material").is_none());
        assert_eq!(outer.get_archive_from_byte_array("material"), Some(inner));

        outer.set_byte_array("garbage", vec![1, 2, 3]);
        assert_eq!(outer.get_archive_from_byte_array("garbage"), None);
        assert_eq!(outer.get_archive_from_byte_array("missing"), None);
    }

    #[test]
    fn gen_key_from_index_pads() {
        assert_eq!(KeyedArchive::gen_key_from_index(7), "0007");
        assert_eq!(KeyedArchive::gen_key_from_index(12345), "12345");
    }

    #[test]
    fn dump_lists_sorted_entries() {
        let archive = vec![("b", Variant::Int32(2)), ("a", Variant::Bool(true))]
            .into_iter()
            .collect::<KeyedArchive>();
        let dump = archive.dump();
        let a = dump.find("a [bool] : true").unwrap();
        let b = dump.find("b [int32] : 2").unwrap();
        assert!(a < b);
    }
}
