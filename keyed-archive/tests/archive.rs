//! End-to-end tests for the binary keyed archive format.

use keyed_archive::{
    AABBox2, Color, KeyedArchive, LoadError, Matrix4, Quaternion, Rect, Variant, Vector2, Vector3,
    Vector4,
};
use tempfile::TempDir;

const HASH_NAME: u32 = 0x1234_5678;
const HASH_GOLD: u32 = 0x0bad_f00d;
const HASH_INVENTORY: u32 = 42;
const HASH_POUCH: u32 = 7;

fn hero() -> KeyedArchive {
    let mut inventory = KeyedArchive::new();
    inventory.set_i32("gold", 50);

    let mut hero = KeyedArchive::new();
    hero.set_string("name", "hero");
    hero.set_i32("hp", 100);
    hero.set_vector3("pos", Vector3::new(1.0, 2.0, 3.0));
    hero.set_archive("inventory", inventory);
    hero
}

fn everything() -> KeyedArchive {
    let mut nested = KeyedArchive::new();
    nested.set_fast_name("shader", "Textured");
    nested.set_archive("empty", KeyedArchive::new());

    let mut archive = KeyedArchive::new();
    archive.set_bool("bool", true);
    archive.set_i8("i8", -8);
    archive.set_u8("u8", 8);
    archive.set_i16("i16", -16);
    archive.set_u16("u16", 16);
    archive.set_i32("i32", -32);
    archive.set_u32("u32", 32);
    archive.set_i64("i64", -64);
    archive.set_u64("u64", u64::MAX);
    archive.set_f32("f32", 0.25);
    archive.set_f64("f64", std::f64::consts::PI);
    archive.set_string("string", "plain");
    archive.set_wide_string("wide", "ширина ✓");
    archive.set_file_path("path", "~res:/Data/level.sc2");
    archive.set_byte_array("bytes", vec![0u8, 1, 2, 3, 254, 255]);
    archive.set_vector2("v2", Vector2::new(1.0, 2.0));
    archive.set_vector4("v4", Vector4::new(1.0, 2.0, 3.0, 4.0));
    archive.set_matrix4("m4", Matrix4::default());
    archive.set_color("color", Color::new(1.0, 0.5, 0.25, 1.0));
    archive.set_rect("rect", Rect::new(0.0, 0.0, 640.0, 480.0));
    archive.set_quaternion("rot", Quaternion::new(0.0, 0.7071, 0.0, 0.7071));
    archive.set_aabbox2(
        "box",
        AABBox2 {
            min: Vector2::new(-1.0, -1.0),
            max: Vector2::new(1.0, 1.0),
        },
    );
    archive.set_variant_vector(
        "list",
        vec![
            Variant::Int32(1),
            Variant::from("two"),
            Variant::KeyedArchive(nested.clone()),
        ],
    );
    archive.set_variant("none", Variant::None);
    archive.set_archive("nested", nested);
    archive
}

fn round_trip(archive: &KeyedArchive) -> KeyedArchive {
    let bytes = archive.to_bytes().unwrap();
    let mut loaded = KeyedArchive::new();
    loaded.load_from_bytes(&bytes).unwrap();
    loaded
}

#[test]
fn hero_scenario() {
    let loaded = round_trip(&hero());

    assert_eq!(loaded.get_string("name", ""), "hero");
    assert_eq!(loaded.get_i32("hp", 0), 100);
    assert_eq!(loaded.get_vector3("pos", Vector3::default()), Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(
        loaded
            .get_archive("inventory")
            .map(|inv| inv.get_i32("gold", 0)),
        Some(50)
    );
}

#[test]
fn string_map_round_trip_of_every_type() {
    let archive = everything();
    assert_eq!(round_trip(&archive), archive);
}

#[test]
fn save_is_deterministic() {
    let a = everything();
    let b = a.clone();
    assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
}

#[test]
fn file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hero.ka");

    hero().save_to_file(&path).unwrap();

    let mut loaded = KeyedArchive::new();
    loaded.load_from_file(&path).unwrap();
    assert_eq!(loaded, hero());
}

#[test]
fn missing_file() {
    let dir = TempDir::new().unwrap();
    let mut archive = KeyedArchive::new();
    let err = archive.load_from_file(dir.path().join("nope.ka")).unwrap_err();
    assert!(matches!(err, LoadError::OpenFailed(..)));
}

#[test]
fn signature_only_is_rejected() {
    let mut archive = KeyedArchive::new();
    assert!(archive.load_from_bytes(b"KA").is_err());
    assert!(archive.is_empty());
}

#[test]
fn every_truncation_is_rejected_or_lenient() {
    // Cutting the stream anywhere must never panic. Cuts on an item
    // boundary succeed with fewer entries, everything else fails.
    let bytes = hero().to_bytes().unwrap();
    for len in 1..bytes.len() {
        let mut archive = KeyedArchive::new();
        match archive.load_from_bytes(&bytes[..len]) {
            Ok(()) => assert!(archive.len() < 4),
            Err(_) => assert!(archive.is_empty()),
        }
    }
}

#[test]
fn size_probe_matches_written_size() {
    let archive = everything();
    let size = archive.save_to_buffer(None);

    let mut buf = vec![0u8; size as usize];
    assert_eq!(archive.save_to_buffer(Some(&mut buf)), size);

    let mut loaded = KeyedArchive::new();
    loaded.load_from_bytes(&buf).unwrap();
    assert_eq!(loaded, archive);
}

#[test]
fn deep_copy_isolation() {
    let a = hero();
    let mut b = a.clone();

    b.get_archive_mut("inventory").unwrap().set_i32("gold", 0);
    b.set_string("name", "villain");

    assert_eq!(a.get_archive("inventory").unwrap().get_i32("gold", 0), 50);
    assert_eq!(a.get_string("name", ""), "hero");
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_string_variant(buf: &mut Vec<u8>, s: &str) {
    buf.push(4);
    push_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

fn push_archive_variant(buf: &mut Vec<u8>, archive: &[u8]) {
    buf.push(8);
    push_u32(buf, archive.len() as u32);
    buf.extend_from_slice(archive);
}

/// `{ gold: i32 }` keyed through the inherited registry.
fn sub_archive(gold: i32) -> Vec<u8> {
    let mut buf = b"KA\x02\x02".to_vec();
    push_u32(&mut buf, 1);
    push_u32(&mut buf, HASH_GOLD);
    buf.push(2);
    buf.extend_from_slice(&gold.to_le_bytes());
    buf
}

fn register_map_fixture() -> Vec<u8> {
    let keys = [
        ("name", HASH_NAME),
        ("gold", HASH_GOLD),
        ("inventory", HASH_INVENTORY),
        ("pouch", HASH_POUCH),
    ];

    let mut buf = b"KA\x02\x01".to_vec();
    push_u32(&mut buf, keys.len() as u32);
    for (key, _) in keys.iter() {
        buf.extend_from_slice(&(key.len() as u16).to_le_bytes());
        buf.extend_from_slice(key.as_bytes());
    }
    for (_, hash) in keys.iter() {
        push_u32(&mut buf, *hash);
    }

    // Inventory is a sub archive that itself nests another sub archive.
    let mut inventory = b"KA\x02\x02".to_vec();
    push_u32(&mut inventory, 2);
    push_u32(&mut inventory, HASH_GOLD);
    inventory.push(2);
    inventory.extend_from_slice(&50i32.to_le_bytes());
    push_u32(&mut inventory, HASH_POUCH);
    push_archive_variant(&mut inventory, &sub_archive(3));

    push_u32(&mut buf, 3);
    push_u32(&mut buf, HASH_NAME);
    push_string_variant(&mut buf, "hero");
    push_u32(&mut buf, HASH_GOLD);
    buf.push(2);
    buf.extend_from_slice(&7i32.to_le_bytes());
    push_u32(&mut buf, HASH_INVENTORY);
    push_archive_variant(&mut buf, &inventory);
    buf
}

#[test]
fn register_map_top_and_sub_archives() {
    let mut archive = KeyedArchive::new();
    archive.load_from_bytes(&register_map_fixture()).unwrap();

    assert_eq!(archive.len(), 3);
    assert_eq!(archive.get_string("name", ""), "hero");
    assert_eq!(archive.get_i32("gold", 0), 7);

    let inventory = archive.get_archive("inventory").unwrap();
    assert_eq!(inventory.get_i32("gold", 0), 50);
    assert_eq!(
        inventory.get_archive("pouch").map(|p| p.get_i32("gold", 0)),
        Some(3)
    );
}

#[test]
fn register_map_resaves_as_string_map() {
    let mut archive = KeyedArchive::new();
    archive.load_from_bytes(&register_map_fixture()).unwrap();

    let bytes = archive.to_bytes().unwrap();
    assert_eq!(&bytes[..4], b"KA\x01\x00");
    assert_eq!(round_trip(&archive), archive);
}

#[test]
fn register_map_unknown_hash() {
    let mut bytes = b"KA\x02\x01".to_vec();
    push_u32(&mut bytes, 0);
    push_u32(&mut bytes, 1);
    push_u32(&mut bytes, 99);
    bytes.push(1);
    bytes.push(1);

    let mut archive = KeyedArchive::new();
    let err = archive.load_from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, LoadError::UnknownKeyHash(99)));
}

#[test]
fn register_map_truncation_is_not_lenient() {
    let bytes = register_map_fixture();
    let mut archive = KeyedArchive::new();
    assert!(archive.load_from_bytes(&bytes[..bytes.len() - 1]).is_err());
    assert!(archive.is_empty());
}

#[test]
fn sub_archive_inside_string_map_has_no_registry() {
    let mut bytes = b"KA\x01\x00".to_vec();
    push_u32(&mut bytes, 1);
    push_string_variant(&mut bytes, "inventory");
    push_archive_variant(&mut bytes, &sub_archive(1));

    let mut archive = KeyedArchive::new();
    let err = archive.load_from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, LoadError::MissingRegistry));
}

#[test]
fn yaml_and_binary_agree() {
    let archive = everything();
    let text = archive.save_to_yaml_string().unwrap();

    let mut from_yaml = KeyedArchive::new();
    from_yaml.load_from_yaml_str(&text).unwrap();

    // None entries are not carried through YAML.
    let mut expected = archive;
    expected.delete_key("none");
    assert_eq!(from_yaml, expected);
    assert_eq!(from_yaml.to_bytes().unwrap(), expected.to_bytes().unwrap());
}

#[test]
fn yaml_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hero.yaml");

    hero().save_to_yaml_file(&path).unwrap();

    let mut loaded = KeyedArchive::new();
    loaded.load_from_yaml_file(&path).unwrap();
    assert_eq!(loaded, hero());
}
