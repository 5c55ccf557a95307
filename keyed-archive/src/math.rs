//! Fixed-size math payloads a [`Variant`](crate::Variant) can carry.
//!
//! These are plain data holders. The archive only stores and transports them;
//! no arithmetic is provided.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vector2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }
}

impl Vector4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Vector4 { x, y, z, w }
    }
}

/// Row-major 2x2 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix2(pub [[f32; 2]; 2]);

/// Row-major 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3(pub [[f32; 3]; 3]);

/// Row-major 4x4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4(pub [[f32; 4]; 4]);

impl Default for Matrix2 {
    fn default() -> Self {
        Matrix2([[1.0, 0.0], [0.0, 1.0]])
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Matrix3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Matrix4([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }
}

/// Origin plus extent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, dx: f32, dy: f32) -> Self {
        Rect { x, y, dx, dy }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Quaternion { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3,
    pub scale: Vector3,
    pub rotation: Quaternion,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            translation: Vector3::default(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            rotation: Quaternion::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AABBox2 {
    pub min: Vector2,
    pub max: Vector2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AABBox3 {
    pub min: Vector3,
    pub max: Vector3,
}

/// Flat `f32` view used by the binary and YAML codecs.
///
/// `from_floats` is only ever handed a slice of exactly `LEN` values.
pub(crate) trait Floats: Sized {
    const LEN: usize;

    fn to_floats(&self) -> Vec<f32>;
    fn from_floats(v: &[f32]) -> Self;
}

impl Floats for Vector2 {
    const LEN: usize = 2;

    fn to_floats(&self) -> Vec<f32> {
        vec![self.x, self.y]
    }

    fn from_floats(v: &[f32]) -> Self {
        Vector2::new(v[0], v[1])
    }
}

impl Floats for Vector3 {
    const LEN: usize = 3;

    fn to_floats(&self) -> Vec<f32> {
        vec![self.x, self.y, self.z]
    }

    fn from_floats(v: &[f32]) -> Self {
        Vector3::new(v[0], v[1], v[2])
    }
}

impl Floats for Vector4 {
    const LEN: usize = 4;

    fn to_floats(&self) -> Vec<f32> {
        vec![self.x, self.y, self.z, self.w]
    }

    fn from_floats(v: &[f32]) -> Self {
        Vector4::new(v[0], v[1], v[2], v[3])
    }
}

impl Floats for Color {
    const LEN: usize = 4;

    fn to_floats(&self) -> Vec<f32> {
        vec![self.r, self.g, self.b, self.a]
    }

    fn from_floats(v: &[f32]) -> Self {
        Color::new(v[0], v[1], v[2], v[3])
    }
}

impl Floats for Rect {
    const LEN: usize = 4;

    fn to_floats(&self) -> Vec<f32> {
        vec![self.x, self.y, self.dx, self.dy]
    }

    fn from_floats(v: &[f32]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

impl Floats for Quaternion {
    const LEN: usize = 4;

    fn to_floats(&self) -> Vec<f32> {
        vec![self.x, self.y, self.z, self.w]
    }

    fn from_floats(v: &[f32]) -> Self {
        Quaternion::new(v[0], v[1], v[2], v[3])
    }
}

impl Floats for AABBox2 {
    const LEN: usize = 4;

    fn to_floats(&self) -> Vec<f32> {
        vec![self.min.x, self.min.y, self.max.x, self.max.y]
    }

    fn from_floats(v: &[f32]) -> Self {
        AABBox2 {
            min: Vector2::from_floats(&v[0..2]),
            max: Vector2::from_floats(&v[2..4]),
        }
    }
}

impl Floats for AABBox3 {
    const LEN: usize = 6;

    fn to_floats(&self) -> Vec<f32> {
        let mut out = self.min.to_floats();
        out.extend(self.max.to_floats());
        out
    }

    fn from_floats(v: &[f32]) -> Self {
        AABBox3 {
            min: Vector3::from_floats(&v[0..3]),
            max: Vector3::from_floats(&v[3..6]),
        }
    }
}

impl Floats for Transform {
    const LEN: usize = 10;

    fn to_floats(&self) -> Vec<f32> {
        let mut out = self.translation.to_floats();
        out.extend(self.scale.to_floats());
        out.extend(self.rotation.to_floats());
        out
    }

    fn from_floats(v: &[f32]) -> Self {
        Transform {
            translation: Vector3::from_floats(&v[0..3]),
            scale: Vector3::from_floats(&v[3..6]),
            rotation: Quaternion::from_floats(&v[6..10]),
        }
    }
}

macro_rules! square_matrix_floats {
    ($ty:ident, $n:expr) => {
        impl Floats for $ty {
            const LEN: usize = $n * $n;

            fn to_floats(&self) -> Vec<f32> {
                self.0.iter().flat_map(|row| row.iter().copied()).collect()
            }

            fn from_floats(v: &[f32]) -> Self {
                let mut rows = [[0.0f32; $n]; $n];
                for (i, row) in rows.iter_mut().enumerate() {
                    row.copy_from_slice(&v[i * $n..(i + 1) * $n]);
                }
                $ty(rows)
            }
        }
    };
}

square_matrix_floats!(Matrix2, 2);
square_matrix_floats!(Matrix3, 3);
square_matrix_floats!(Matrix4, 4);
