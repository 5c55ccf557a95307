//! Herein lies the `KeyedArchive` format: a self-describing, versioned map
//! from string keys to typed [`Variant`] values, nestable to any depth.
//!
//! Archives are written in the StringMap binary layout and can be read from
//! both StringMap and RegisterMap (key-hash deduplicated) files. A YAML form
//! is available through [`KeyedArchive::save_to_yaml_string`] and friends.
//!
//! ```
//! use keyed_archive::{KeyedArchive, Vector3};
//!
//! let mut inventory = KeyedArchive::new();
//! inventory.set_i32("gold", 50);
//!
//! let mut hero = KeyedArchive::new();
//! hero.set_string("name", "hero");
//! hero.set_vector3("pos", Vector3::new(1.0, 2.0, 3.0));
//! hero.set_archive("inventory", inventory);
//!
//! let bytes = hero.to_bytes().unwrap();
//! let mut loaded = KeyedArchive::new();
//! loaded.load_from_bytes(&bytes).unwrap();
//! assert_eq!(loaded.get_archive("inventory").unwrap().get_i32("gold", 0), 50);
//! ```

mod archive;
mod de;
mod error;
pub mod header;
pub mod math;
mod registry;
mod ser;
mod variant;
pub mod yaml;

pub use archive::KeyedArchive;
pub use error::{LoadError, SaveError, YamlError};
pub use math::{
    AABBox2, AABBox3, Color, Matrix2, Matrix3, Matrix4, Quaternion, Rect, Transform, Vector2,
    Vector3, Vector4,
};
pub use registry::Registry;
pub use variant::{Variant, VariantType};
