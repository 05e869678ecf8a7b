//! Uniform semantic types and the upload dispatch table.
//!
//! A program's reflection pass records one [`UniformKind`] per active
//! uniform, taken from the shading-language type GL reports. Setting a value
//! then selects exactly one [`UploadOp`] from the table below; the mapping is
//! fixed by the kind, never guessed from the value's shape. The only
//! shape-dependent choice is the scalar-vs-array overload for the kinds that
//! have one (float, int, bool, samplerCube), mirroring GLSL array uniforms.
//!
//! Sampler2D uniforms are deliberately absent from the generic path: the
//! frame loop binds them as texture units, and uploading them here as plain
//! ints would fight that binding.

use std::borrow::Cow;

use crate::mat4::Mat4;

/// Semantic type of an active uniform, as reported by program introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    Int,
    IntVec2,
    IntVec3,
    IntVec4,
    Bool,
    BoolVec2,
    BoolVec3,
    BoolVec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    SamplerCube,
}

impl UniformKind {
    /// Maps a GL shading-language type enum to its kind. Returns `None` for
    /// types outside the supported set (e.g. WebGL2-only sampler arrays).
    pub fn from_gl_type(gl_type: u32) -> Option<Self> {
        Some(match gl_type {
            0x1406 => UniformKind::Float,
            0x8B50 => UniformKind::FloatVec2,
            0x8B51 => UniformKind::FloatVec3,
            0x8B52 => UniformKind::FloatVec4,
            0x1404 => UniformKind::Int,
            0x8B53 => UniformKind::IntVec2,
            0x8B54 => UniformKind::IntVec3,
            0x8B55 => UniformKind::IntVec4,
            0x8B56 => UniformKind::Bool,
            0x8B57 => UniformKind::BoolVec2,
            0x8B58 => UniformKind::BoolVec3,
            0x8B59 => UniformKind::BoolVec4,
            0x8B5A => UniformKind::Mat2,
            0x8B5B => UniformKind::Mat3,
            0x8B5C => UniformKind::Mat4,
            0x8B5E => UniformKind::Sampler2D,
            0x8B60 => UniformKind::SamplerCube,
            _ => return None,
        })
    }

    /// Selects the upload operation for a value of this kind.
    pub fn upload_op(self, value: &UniformValue) -> UploadOp {
        match self {
            UniformKind::Float => {
                if value.is_sequence() {
                    UploadOp::Float1v
                } else {
                    UploadOp::Float1
                }
            }
            UniformKind::FloatVec2 => UploadOp::Float2v,
            UniformKind::FloatVec3 => UploadOp::Float3v,
            UniformKind::FloatVec4 => UploadOp::Float4v,
            UniformKind::Int | UniformKind::Bool | UniformKind::SamplerCube => {
                if value.is_sequence() {
                    UploadOp::Int1v
                } else {
                    UploadOp::Int1
                }
            }
            UniformKind::IntVec2 | UniformKind::BoolVec2 => UploadOp::Int2v,
            UniformKind::IntVec3 | UniformKind::BoolVec3 => UploadOp::Int3v,
            UniformKind::IntVec4 | UniformKind::BoolVec4 => UploadOp::Int4v,
            UniformKind::Mat2 => UploadOp::Matrix2,
            UniformKind::Mat3 => UploadOp::Matrix3,
            UniformKind::Mat4 => UploadOp::Matrix4,
            UniformKind::Sampler2D => UploadOp::Skip,
        }
    }
}

/// The upload half of the dispatch table: each variant corresponds to one
/// `uniform*` entry point on the rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOp {
    Float1,
    Float1v,
    Float2v,
    Float3v,
    Float4v,
    Int1,
    Int1v,
    Int2v,
    Int3v,
    Int4v,
    Matrix2,
    Matrix3,
    Matrix4,
    /// Bound as a texture unit by the frame loop, not uploaded here.
    Skip,
}

/// An owned uniform value as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    Bool(bool),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4(Mat4),
    /// Uniform float array (`float foo[N]`).
    FloatArray(Vec<f32>),
    /// Uniform int array (`int foo[N]`).
    IntArray(Vec<i32>),
}

impl UniformValue {
    /// Whether the value is a sequence for overload purposes.
    pub fn is_sequence(&self) -> bool {
        matches!(self, UniformValue::FloatArray(_) | UniformValue::IntArray(_))
    }

    /// View of the value as floats, converting where the payload is integral.
    pub fn as_floats(&self) -> Cow<'_, [f32]> {
        match self {
            UniformValue::Float(v) => Cow::Owned(vec![*v]),
            UniformValue::Vec2(v) => Cow::Borrowed(&v[..]),
            UniformValue::Vec3(v) => Cow::Borrowed(&v[..]),
            UniformValue::Vec4(v) => Cow::Borrowed(&v[..]),
            UniformValue::Mat2(v) => Cow::Borrowed(&v[..]),
            UniformValue::Mat3(v) => Cow::Borrowed(&v[..]),
            UniformValue::Mat4(m) => Cow::Borrowed(m.as_slice()),
            UniformValue::FloatArray(v) => Cow::Borrowed(&v[..]),
            UniformValue::Int(v) => Cow::Owned(vec![*v as f32]),
            UniformValue::IVec2(v) => Cow::Owned(v.iter().map(|&i| i as f32).collect()),
            UniformValue::IVec3(v) => Cow::Owned(v.iter().map(|&i| i as f32).collect()),
            UniformValue::IVec4(v) => Cow::Owned(v.iter().map(|&i| i as f32).collect()),
            UniformValue::IntArray(v) => Cow::Owned(v.iter().map(|&i| i as f32).collect()),
            UniformValue::Bool(v) => Cow::Owned(vec![if *v { 1.0 } else { 0.0 }]),
        }
    }

    /// View of the value as ints, truncating where the payload is float.
    pub fn as_ints(&self) -> Cow<'_, [i32]> {
        match self {
            UniformValue::Int(v) => Cow::Owned(vec![*v]),
            UniformValue::IVec2(v) => Cow::Borrowed(&v[..]),
            UniformValue::IVec3(v) => Cow::Borrowed(&v[..]),
            UniformValue::IVec4(v) => Cow::Borrowed(&v[..]),
            UniformValue::IntArray(v) => Cow::Borrowed(&v[..]),
            UniformValue::Bool(v) => Cow::Owned(vec![i32::from(*v)]),
            UniformValue::Float(v) => Cow::Owned(vec![*v as i32]),
            UniformValue::Vec2(v) => Cow::Owned(v.iter().map(|&f| f as i32).collect()),
            UniformValue::Vec3(v) => Cow::Owned(v.iter().map(|&f| f as i32).collect()),
            UniformValue::Vec4(v) => Cow::Owned(v.iter().map(|&f| f as i32).collect()),
            UniformValue::FloatArray(v) => Cow::Owned(v.iter().map(|&f| f as i32).collect()),
            UniformValue::Mat2(v) => Cow::Owned(v.iter().map(|&f| f as i32).collect()),
            UniformValue::Mat3(v) => Cow::Owned(v.iter().map(|&f| f as i32).collect()),
            UniformValue::Mat4(m) => Cow::Owned(m.as_slice().iter().map(|&f| f as i32).collect()),
        }
    }

    /// Scalar float view for the non-array overloads.
    pub fn as_float(&self) -> f32 {
        self.as_floats().first().copied().unwrap_or(0.0)
    }

    /// Scalar int view for the non-array overloads.
    pub fn as_int(&self) -> i32 {
        self.as_ints().first().copied().unwrap_or(0)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m)
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(v: Vec<f32>) -> Self {
        UniformValue::FloatArray(v)
    }
}

impl From<Vec<i32>> for UniformValue {
    fn from(v: Vec<i32>) -> Self {
        UniformValue::IntArray(v)
    }
}
