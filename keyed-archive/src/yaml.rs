//! YAML representation of keyed archives.
//!
//! A document holds a single `keyedArchive` mapping. Each value is written as
//! a one-entry mapping from a type name to its payload, so every variant type
//! survives a round trip:
//!
//! ```yaml
//! keyedArchive:
//!   hp:
//!     int32: 100
//!   pos:
//!     Vector3: [1.0, 2.0, 3.0]
//!   blob:
//!     byteArray: AQID
//! ```
//!
//! Byte arrays are base64 (standard alphabet, padded). Matrices are lists of
//! rows; bounding boxes are `[min, max]`; transforms are
//! `[translation, scale, rotation]`.
//!
//! Plain YAML values are accepted on load and mapped to the closest variant.
//! Nodes that do not convert (nulls, malformed payloads) are skipped.

use std::convert::TryFrom;
use std::path::Path;

use base64::Engine;
use serde_yaml::{Mapping, Number, Value};

use crate::error::YamlError;
use crate::math::{
    AABBox2, AABBox3, Color, Floats, Matrix2, Matrix3, Matrix4, Quaternion, Rect, Transform,
    Vector2, Vector3, Vector4,
};
use crate::variant::{Variant, VariantType};
use crate::KeyedArchive;

/// Root key identifying a keyed archive document.
pub const ARCHIVE_NODE: &str = "keyedArchive";

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

impl KeyedArchive {
    pub fn load_from_yaml_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), YamlError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "failed to read yaml file");
            YamlError::Io(e, path.to_path_buf())
        })?;
        self.load_from_yaml_str(&text)
    }

    pub fn load_from_yaml_str(&mut self, text: &str) -> Result<(), YamlError> {
        let root: Value = serde_yaml::from_str(text).map_err(|e| {
            tracing::error!(error = %e, "failed to parse yaml");
            YamlError::Parse(e)
        })?;
        self.load_from_yaml_value(&root)
    }

    /// Merges the entries under the document's `keyedArchive` node.
    pub fn load_from_yaml_value(&mut self, root: &Value) -> Result<(), YamlError> {
        let node = root
            .as_mapping()
            .and_then(|m| m.get(ARCHIVE_NODE))
            .ok_or(YamlError::MissingArchiveNode)?;

        let archive = match node {
            Value::Null => KeyedArchive::new(),
            Value::Mapping(map) => archive_from_mapping(map),
            _ => return Err(YamlError::MissingArchiveNode),
        };

        tracing::debug!(count = archive.len(), "loaded keyed archive from yaml");
        self.entries.extend(archive.entries);
        Ok(())
    }

    pub fn to_yaml_value(&self) -> Value {
        let mut root = Mapping::new();
        root.insert(
            Value::String(ARCHIVE_NODE.to_string()),
            Value::Mapping(archive_to_mapping(self)),
        );
        Value::Mapping(root)
    }

    pub fn save_to_yaml_string(&self) -> Result<String, YamlError> {
        serde_yaml::to_string(&self.to_yaml_value()).map_err(|e| {
            tracing::error!(error = %e, "failed to emit yaml");
            YamlError::Emit(e)
        })
    }

    pub fn save_to_yaml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), YamlError> {
        let path = path.as_ref();
        let text = self.save_to_yaml_string()?;
        std::fs::write(path, text).map_err(|e| YamlError::Io(e, path.to_path_buf()))
    }
}

fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn archive_from_mapping(map: &Mapping) -> KeyedArchive {
    let mut archive = KeyedArchive::new();
    for (key, node) in map {
        let key = match key_string(key) {
            Some(key) => key,
            None => {
                tracing::warn!(?key, "skipping yaml entry with a non-scalar key");
                continue;
            }
        };

        let value = variant_from_yaml(node);
        if value.is_none() {
            continue;
        }
        archive.set_variant(key, value);
    }
    archive
}

/// Converts a YAML node to a variant, `Variant::None` when it does not map
/// to one.
pub fn variant_from_yaml(node: &Value) -> Variant {
    match node {
        Value::Null => Variant::None,
        Value::Bool(b) => Variant::Bool(*b),
        Value::Number(n) => number_variant(n),
        Value::String(s) => Variant::String(s.clone()),
        Value::Sequence(items) => {
            Variant::VariantVector(items.iter().map(variant_from_yaml).collect())
        }
        Value::Mapping(map) => {
            if map.len() == 1 {
                if let Some((Value::String(name), payload)) = map.iter().next() {
                    if let Some(ty) = VariantType::from_type_name(name) {
                        return typed_variant(ty, payload).unwrap_or_else(|| {
                            tracing::warn!(%ty, "malformed yaml payload");
                            Variant::None
                        });
                    }
                }
            }
            Variant::KeyedArchive(archive_from_mapping(map))
        }
        Value::Tagged(tagged) => variant_from_yaml(&tagged.value),
    }
}

fn number_variant(n: &Number) -> Variant {
    if let Some(v) = n.as_i64() {
        match i32::try_from(v) {
            Ok(v) => Variant::Int32(v),
            Err(_) => Variant::Int64(v),
        }
    } else if let Some(v) = n.as_u64() {
        Variant::UInt64(v)
    } else {
        n.as_f64().map(Variant::Float64).unwrap_or(Variant::None)
    }
}

fn flatten_floats(node: &Value, out: &mut Vec<f32>) -> Option<()> {
    match node {
        Value::Number(n) => out.push(n.as_f64()? as f32),
        Value::Sequence(items) => {
            for item in items {
                flatten_floats(item, out)?;
            }
        }
        _ => return None,
    }
    Some(())
}

fn floats<T: Floats>(node: &Value) -> Option<T> {
    let mut out = Vec::with_capacity(T::LEN);
    flatten_floats(node, &mut out)?;
    if out.len() != T::LEN {
        return None;
    }
    Some(T::from_floats(&out))
}

fn int<T: TryFrom<i64>>(node: &Value) -> Option<T> {
    node.as_i64().and_then(|v| T::try_from(v).ok())
}

fn typed_variant(ty: VariantType, payload: &Value) -> Option<Variant> {
    let text = || payload.as_str().map(str::to_string);

    let value = match ty {
        VariantType::None => Variant::None,
        VariantType::Bool => Variant::Bool(payload.as_bool()?),
        VariantType::Int8 => Variant::Int8(int(payload)?),
        VariantType::UInt8 => Variant::UInt8(int(payload)?),
        VariantType::Int16 => Variant::Int16(int(payload)?),
        VariantType::UInt16 => Variant::UInt16(int(payload)?),
        VariantType::Int32 => Variant::Int32(int(payload)?),
        VariantType::UInt32 => Variant::UInt32(int(payload)?),
        VariantType::Int64 => Variant::Int64(payload.as_i64()?),
        VariantType::UInt64 => Variant::UInt64(payload.as_u64()?),
        VariantType::Float => Variant::Float(payload.as_f64()? as f32),
        VariantType::Float64 => Variant::Float64(payload.as_f64()?),
        VariantType::String => Variant::String(text()?),
        VariantType::WideString => Variant::WideString(text()?),
        VariantType::FastName => Variant::FastName(text()?),
        VariantType::FilePath => Variant::FilePath(text()?),
        VariantType::ByteArray => Variant::ByteArray(BASE64.decode(payload.as_str()?).ok()?),
        VariantType::Vector2 => Variant::Vector2(floats::<Vector2>(payload)?),
        VariantType::Vector3 => Variant::Vector3(floats::<Vector3>(payload)?),
        VariantType::Vector4 => Variant::Vector4(floats::<Vector4>(payload)?),
        VariantType::Matrix2 => Variant::Matrix2(floats::<Matrix2>(payload)?),
        VariantType::Matrix3 => Variant::Matrix3(floats::<Matrix3>(payload)?),
        VariantType::Matrix4 => Variant::Matrix4(floats::<Matrix4>(payload)?),
        VariantType::Color => Variant::Color(floats::<Color>(payload)?),
        VariantType::Rect => Variant::Rect(floats::<Rect>(payload)?),
        VariantType::Quaternion => Variant::Quaternion(floats::<Quaternion>(payload)?),
        VariantType::Transform => Variant::Transform(floats::<Transform>(payload)?),
        VariantType::AABBox2 => Variant::AABBox2(floats::<AABBox2>(payload)?),
        VariantType::AABBox3 => Variant::AABBox3(floats::<AABBox3>(payload)?),
        VariantType::KeyedArchive => match payload {
            Value::Null => Variant::KeyedArchive(KeyedArchive::new()),
            Value::Mapping(map) => Variant::KeyedArchive(archive_from_mapping(map)),
            _ => return None,
        },
        VariantType::VariantVector => match payload {
            Value::Null => Variant::VariantVector(Vec::new()),
            Value::Sequence(items) => {
                Variant::VariantVector(items.iter().map(variant_from_yaml).collect())
            }
            _ => return None,
        },
    };

    Some(value)
}

fn archive_to_mapping(archive: &KeyedArchive) -> Mapping {
    let mut map = Mapping::new();
    for (key, value) in archive.sorted() {
        map.insert(Value::String(key.to_string()), variant_to_yaml(value));
    }
    map
}

fn float_seq(floats: &[f32]) -> Value {
    Value::Sequence(
        floats
            .iter()
            .map(|v| Value::Number(Number::from(f64::from(*v))))
            .collect(),
    )
}

/// Splits `floats` into rows of the given lengths.
fn float_rows(floats: &[f32], rows: &[usize]) -> Value {
    let mut start = 0;
    let mut out = Vec::with_capacity(rows.len());
    for len in rows {
        out.push(float_seq(&floats[start..start + len]));
        start += len;
    }
    Value::Sequence(out)
}

/// Converts a variant to its typed YAML node.
pub fn variant_to_yaml(value: &Variant) -> Value {
    let payload = match value {
        Variant::None => Value::Null,
        Variant::Bool(v) => Value::Bool(*v),
        Variant::Int8(v) => Value::Number(Number::from(i64::from(*v))),
        Variant::UInt8(v) => Value::Number(Number::from(u64::from(*v))),
        Variant::Int16(v) => Value::Number(Number::from(i64::from(*v))),
        Variant::UInt16(v) => Value::Number(Number::from(u64::from(*v))),
        Variant::Int32(v) => Value::Number(Number::from(i64::from(*v))),
        Variant::UInt32(v) => Value::Number(Number::from(u64::from(*v))),
        Variant::Int64(v) => Value::Number(Number::from(*v)),
        Variant::UInt64(v) => Value::Number(Number::from(*v)),
        Variant::Float(v) => Value::Number(Number::from(f64::from(*v))),
        Variant::Float64(v) => Value::Number(Number::from(*v)),
        Variant::String(v) | Variant::WideString(v) | Variant::FastName(v) | Variant::FilePath(v) => {
            Value::String(v.clone())
        }
        Variant::ByteArray(v) => Value::String(BASE64.encode(v)),
        Variant::Vector2(v) => float_seq(&v.to_floats()),
        Variant::Vector3(v) => float_seq(&v.to_floats()),
        Variant::Vector4(v) => float_seq(&v.to_floats()),
        Variant::Color(v) => float_seq(&v.to_floats()),
        Variant::Rect(v) => float_seq(&v.to_floats()),
        Variant::Quaternion(v) => float_seq(&v.to_floats()),
        Variant::Matrix2(v) => float_rows(&v.to_floats(), &[2, 2]),
        Variant::Matrix3(v) => float_rows(&v.to_floats(), &[3, 3, 3]),
        Variant::Matrix4(v) => float_rows(&v.to_floats(), &[4, 4, 4, 4]),
        Variant::AABBox2(v) => float_rows(&v.to_floats(), &[2, 2]),
        Variant::AABBox3(v) => float_rows(&v.to_floats(), &[3, 3]),
        Variant::Transform(v) => float_rows(&v.to_floats(), &[3, 3, 4]),
        Variant::KeyedArchive(v) => Value::Mapping(archive_to_mapping(v)),
        Variant::VariantVector(v) => Value::Sequence(v.iter().map(variant_to_yaml).collect()),
    };

    let mut node = Mapping::new();
    node.insert(
        Value::String(value.variant_type().type_name().to_string()),
        payload,
    );
    Value::Mapping(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_round_trip() {
        let mut inner = KeyedArchive::new();
        inner.set_i32("gold", 50);

        let mut archive = KeyedArchive::new();
        archive.set_string("name", "hero");
        archive.set_wide_string("title", "Рыцарь");
        archive.set_u16("level", 12);
        archive.set_i64("xp", 1 << 40);
        archive.set_f32("speed", 1.25);
        archive.set_byte_array("blob", vec![0, 1, 2, 255]);
        archive.set_matrix2("m", Matrix2([[1.0, 2.0], [3.0, 4.0]]));
        archive.set_transform("t", Transform::default());
        archive.set_aabbox3(
            "bounds",
            AABBox3 {
                min: Vector3::new(-1.0, -1.0, -1.0),
                max: Vector3::new(1.0, 1.0, 1.0),
            },
        );
        archive.set_variant_vector("list", vec![Variant::Bool(true), Variant::UInt8(3)]);
        archive.set_archive("inventory", inner);

        let text = archive.save_to_yaml_string().unwrap();
        let mut loaded = KeyedArchive::new();
        loaded.load_from_yaml_str(&text).unwrap();
        assert_eq!(loaded, archive);
    }

    #[test]
    fn byte_arrays_are_base64() {
        let mut archive = KeyedArchive::new();
        archive.set_byte_array("blob", vec![1, 2, 3]);
        let text = archive.save_to_yaml_string().unwrap();
        assert!(text.contains("byteArray: AQID"), "{}", text);
    }

    #[test]
    fn untyped_values_are_inferred() {
        let text = r#"
keyedArchive:
  flag: true
  small: 7
  big: 10000000000
  ratio: 0.5
  label: hello
  items: [1, two]
  nested:
    a: 1
    b: 2
  nothing: ~
"#;
        let mut archive = KeyedArchive::new();
        archive.load_from_yaml_str(text).unwrap();

        assert!(archive.get_bool("flag", false));
        assert_eq!(archive.get_i32("small", 0), 7);
        assert_eq!(archive.get_i64("big", 0), 10_000_000_000);
        assert_eq!(archive.get_f64("ratio", 0.0), 0.5);
        assert_eq!(archive.get_string("label", ""), "hello");
        assert_eq!(
            archive.get_variant_vector("items"),
            Some(&[Variant::Int32(1), Variant::from("two")][..])
        );
        assert_eq!(archive.get_archive("nested").unwrap().get_i32("b", 0), 2);
        assert!(!archive.is_key_exists("nothing"));
    }

    #[test]
    fn malformed_typed_entries_are_skipped() {
        let text = r#"
keyedArchive:
  good:
    int32: 5
  overflow:
    uint8: 300
  short:
    Vector3: [1, 2]
"#;
        let mut archive = KeyedArchive::new();
        archive.load_from_yaml_str(text).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.get_i32("good", 0), 5);
    }

    #[test]
    fn missing_archive_node() {
        let mut archive = KeyedArchive::new();
        let err = archive.load_from_yaml_str("other: 1").unwrap_err();
        assert!(matches!(err, YamlError::MissingArchiveNode));

        let err = archive.load_from_yaml_str("- 1\n- 2\n").unwrap_err();
        assert!(matches!(err, YamlError::MissingArchiveNode));
    }

    #[test]
    fn invalid_yaml() {
        let mut archive = KeyedArchive::new();
        let err = archive.load_from_yaml_str("keyedArchive: [unclosed").unwrap_err();
        assert!(matches!(err, YamlError::Parse(_)));
    }

    #[test]
    fn empty_archive() {
        let archive = KeyedArchive::new();
        let text = archive.save_to_yaml_string().unwrap();
        let mut loaded = KeyedArchive::new();
        loaded.load_from_yaml_str(&text).unwrap();
        assert!(loaded.is_empty());
    }
}
