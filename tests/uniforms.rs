use kilim::mat4::Mat4;
use kilim::uniform::{UniformKind, UniformValue, UploadOp};

const GL_TYPE_TABLE: &[(u32, UniformKind)] = &[
    (0x1406, UniformKind::Float),
    (0x8B50, UniformKind::FloatVec2),
    (0x8B51, UniformKind::FloatVec3),
    (0x8B52, UniformKind::FloatVec4),
    (0x1404, UniformKind::Int),
    (0x8B53, UniformKind::IntVec2),
    (0x8B54, UniformKind::IntVec3),
    (0x8B55, UniformKind::IntVec4),
    (0x8B56, UniformKind::Bool),
    (0x8B57, UniformKind::BoolVec2),
    (0x8B58, UniformKind::BoolVec3),
    (0x8B59, UniformKind::BoolVec4),
    (0x8B5A, UniformKind::Mat2),
    (0x8B5B, UniformKind::Mat3),
    (0x8B5C, UniformKind::Mat4),
    (0x8B5E, UniformKind::Sampler2D),
    (0x8B60, UniformKind::SamplerCube),
];

#[test]
fn every_gl_type_maps_to_its_kind() {
    for &(gl_type, kind) in GL_TYPE_TABLE {
        assert_eq!(UniformKind::from_gl_type(gl_type), Some(kind));
    }
}

#[test]
fn unsupported_gl_types_are_rejected() {
    // SAMPLER_3D and a few arbitrary values outside the supported set.
    for gl_type in [0x8B5F, 0x0, 0x1405, 0x8DC1] {
        assert_eq!(UniformKind::from_gl_type(gl_type), None);
    }
}

#[test]
fn each_kind_selects_exactly_its_upload_path() {
    let f = UniformValue::Float(1.0);
    let v2 = UniformValue::Vec2([1.0, 2.0]);
    let i = UniformValue::Int(3);

    assert_eq!(UniformKind::Float.upload_op(&f), UploadOp::Float1);
    assert_eq!(UniformKind::FloatVec2.upload_op(&v2), UploadOp::Float2v);
    assert_eq!(
        UniformKind::FloatVec3.upload_op(&UniformValue::Vec3([0.0; 3])),
        UploadOp::Float3v
    );
    assert_eq!(
        UniformKind::FloatVec4.upload_op(&UniformValue::Vec4([0.0; 4])),
        UploadOp::Float4v
    );
    assert_eq!(UniformKind::Int.upload_op(&i), UploadOp::Int1);
    assert_eq!(
        UniformKind::IntVec2.upload_op(&UniformValue::IVec2([0; 2])),
        UploadOp::Int2v
    );
    assert_eq!(
        UniformKind::IntVec3.upload_op(&UniformValue::IVec3([0; 3])),
        UploadOp::Int3v
    );
    assert_eq!(
        UniformKind::IntVec4.upload_op(&UniformValue::IVec4([0; 4])),
        UploadOp::Int4v
    );
    assert_eq!(
        UniformKind::Bool.upload_op(&UniformValue::Bool(true)),
        UploadOp::Int1
    );
    assert_eq!(UniformKind::BoolVec2.upload_op(&v2), UploadOp::Int2v);
    assert_eq!(UniformKind::BoolVec3.upload_op(&v2), UploadOp::Int3v);
    assert_eq!(UniformKind::BoolVec4.upload_op(&v2), UploadOp::Int4v);
    assert_eq!(
        UniformKind::Mat2.upload_op(&UniformValue::Mat2([0.0; 4])),
        UploadOp::Matrix2
    );
    assert_eq!(
        UniformKind::Mat3.upload_op(&UniformValue::Mat3([0.0; 9])),
        UploadOp::Matrix3
    );
    assert_eq!(
        UniformKind::Mat4.upload_op(&UniformValue::Mat4(Mat4::identity())),
        UploadOp::Matrix4
    );
}

#[test]
fn kind_fixes_the_path_regardless_of_value_shape() {
    // A vec3-typed uniform fed a vec2 value still goes down the vec3 path;
    // the shading-language type decides, not the payload.
    let v2 = UniformValue::Vec2([1.0, 2.0]);
    assert_eq!(UniformKind::FloatVec3.upload_op(&v2), UploadOp::Float3v);
    assert_eq!(UniformKind::Mat4.upload_op(&v2), UploadOp::Matrix4);
}

#[test]
fn scalar_kinds_pick_the_array_overload_for_sequences() {
    let scalar = UniformValue::Float(1.0);
    let floats = UniformValue::FloatArray(vec![1.0, 2.0, 3.0]);
    let ints = UniformValue::IntArray(vec![1, 2]);

    assert_eq!(UniformKind::Float.upload_op(&scalar), UploadOp::Float1);
    assert_eq!(UniformKind::Float.upload_op(&floats), UploadOp::Float1v);
    assert_eq!(UniformKind::Int.upload_op(&ints), UploadOp::Int1v);
    assert_eq!(
        UniformKind::SamplerCube.upload_op(&UniformValue::Int(0)),
        UploadOp::Int1
    );
    assert_eq!(UniformKind::SamplerCube.upload_op(&ints), UploadOp::Int1v);
}

#[test]
fn sampler_2d_skips_the_generic_path() {
    assert_eq!(
        UniformKind::Sampler2D.upload_op(&UniformValue::Int(0)),
        UploadOp::Skip
    );
}

#[test]
fn values_convert_between_numeric_views() {
    assert_eq!(UniformValue::Bool(true).as_ints().as_ref(), &[1]);
    assert_eq!(UniformValue::Bool(false).as_float(), 0.0);
    assert_eq!(UniformValue::Int(7).as_float(), 7.0);
    assert_eq!(
        UniformValue::Vec3([1.5, 2.5, 3.5]).as_floats().as_ref(),
        &[1.5, 2.5, 3.5]
    );
    assert_eq!(
        UniformValue::IVec2([4, 5]).as_floats().as_ref(),
        &[4.0, 5.0]
    );

    let m = Mat4::identity();
    assert_eq!(UniformValue::Mat4(m).as_floats().len(), 16);
}
