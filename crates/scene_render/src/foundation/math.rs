//! Math utilities and types
//!
//! Light payloads and bone matrices use the same `nalgebra` types as the
//! scene graph that owns them.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Column-major float slice of a matrix, the layout uniform blocks expect
pub fn mat4_to_floats(matrix: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(matrix.as_slice());
    out
}
