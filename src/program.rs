//! Compiled, introspected shader pair.
//!
//! A program is compiled once, then reflected: every active uniform and
//! attribute gets an entry in a name-keyed table recording its semantic kind
//! and storage location. Uniform writes go through that table, so a name the
//! shader never declared (or that the compiler stripped) is silently ignored
//! rather than an error.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use web_sys::{WebGl2RenderingContext, WebGlProgram, WebGlShader, WebGlUniformLocation};

use crate::error::Error;
use crate::texture::Texture;
use crate::uniform::{UniformKind, UniformValue, UploadOp};

type Gl = WebGl2RenderingContext;

static NEXT_PROGRAM_ID: AtomicU32 = AtomicU32::new(1);

pub const DEFAULT_VERTEX: &str = r#"
attribute vec2 position;
attribute vec2 uv;

uniform mat4 projection;
uniform vec2 size;
uniform float time;

void main() {
  vec4 p = vec4(position, 0.0, 1.0);
  gl_Position = projection * p;
}
"#;

pub const DEFAULT_FRAGMENT: &str = r#"
precision highp float;

void main() {
  gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0);
}
"#;

/// Construction arguments for [`Program`]. Omitted sources fall back to the
/// minimal defaults above.
#[derive(Default)]
pub struct ProgramDesc {
    pub vertex: Option<String>,
    pub fragment: Option<String>,
    /// Uniforms shared by every surface drawn with this program.
    pub uniforms: HashMap<String, UniformValue>,
    /// Sampler bindings shared by every surface drawn with this program.
    pub textures: HashMap<String, Texture>,
}

struct UniformInfo {
    kind: UniformKind,
    location: WebGlUniformLocation,
}

struct ProgramData {
    gl: Gl,
    id: u32,
    raw: WebGlProgram,
    uniforms_info: HashMap<String, UniformInfo>,
    /// Sampler2D uniform names in introspection order; drives texture-unit
    /// assignment.
    samplers: Vec<String>,
    attributes: HashMap<String, u32>,
    /// Live program-level uniform values, uploaded once per frame.
    uniforms: RefCell<HashMap<String, UniformValue>>,
    textures: RefCell<HashMap<String, Texture>>,
}

/// Cheap-to-clone handle; all surfaces sharing a program share this data.
#[derive(Clone)]
pub struct Program {
    data: Rc<ProgramData>,
}

impl Program {
    pub(crate) fn compile(gl: &Gl, desc: ProgramDesc) -> Result<Program, Error> {
        let vertex_src = desc.vertex.as_deref().unwrap_or(DEFAULT_VERTEX);
        let fragment_src = desc.fragment.as_deref().unwrap_or(DEFAULT_FRAGMENT);

        let vertex = compile_shader(gl, Gl::VERTEX_SHADER, "vertex", vertex_src)?;
        let fragment = compile_shader(gl, Gl::FRAGMENT_SHADER, "fragment", fragment_src)?;

        let raw = gl.create_program().ok_or(Error::ContextUnavailable)?;
        gl.attach_shader(&raw, &vertex);
        gl.attach_shader(&raw, &fragment);
        gl.link_program(&raw);

        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));

        let linked = gl
            .get_program_parameter(&raw, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);

        if !linked {
            let log = gl
                .get_program_info_log(&raw)
                .unwrap_or_else(|| "unknown link failure".into());
            gl.delete_program(Some(&raw));
            log::error!("program link failed: {log}");
            return Err(Error::ProgramLink(log));
        }

        let mut data = ProgramData {
            gl: gl.clone(),
            id: NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed),
            raw,
            uniforms_info: HashMap::new(),
            samplers: Vec::new(),
            attributes: HashMap::new(),
            uniforms: RefCell::new(desc.uniforms),
            textures: RefCell::new(desc.textures),
        };
        introspect(&mut data);

        Ok(Program { data: Rc::new(data) })
    }

    pub(crate) fn id(&self) -> u32 {
        self.data.id
    }

    pub(crate) fn raw(&self) -> &WebGlProgram {
        &self.data.raw
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.data.attributes.get(name).copied()
    }

    pub(crate) fn uniform_location(&self, name: &str) -> Option<&WebGlUniformLocation> {
        self.data.uniforms_info.get(name).map(|info| &info.location)
    }

    /// Sets a program-level uniform value (uploaded on the next frame).
    pub fn insert_uniform(&self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.data.uniforms.borrow_mut().insert(name.into(), value.into());
    }

    /// Sets a program-level sampler binding shared by all its surfaces.
    pub fn insert_texture(&self, name: impl Into<String>, texture: Texture) {
        self.data.textures.borrow_mut().insert(name.into(), texture);
    }

    pub(crate) fn own_textures(&self) -> Ref<'_, HashMap<String, Texture>> {
        self.data.textures.borrow()
    }

    /// Uploads the program-level uniform map.
    pub(crate) fn upload_own_uniforms(&self) {
        let uniforms = self.data.uniforms.borrow();
        for (name, value) in uniforms.iter() {
            self.set_uniform(name, value);
        }
    }

    pub(crate) fn set_uniforms(&self, uniforms: &HashMap<String, UniformValue>) {
        for (name, value) in uniforms {
            self.set_uniform(name, value);
        }
    }

    /// Uploads one uniform through the dispatch table. Unknown names and
    /// sampler-2D uniforms are no-ops.
    pub fn set_uniform(&self, name: &str, value: &UniformValue) {
        let Some(info) = self.data.uniforms_info.get(name) else {
            return;
        };

        let gl = &self.data.gl;
        let loc = Some(&info.location);

        match info.kind.upload_op(value) {
            UploadOp::Float1 => gl.uniform1f(loc, value.as_float()),
            UploadOp::Float1v => gl.uniform1fv_with_f32_array(loc, &value.as_floats()),
            UploadOp::Float2v => gl.uniform2fv_with_f32_array(loc, &value.as_floats()),
            UploadOp::Float3v => gl.uniform3fv_with_f32_array(loc, &value.as_floats()),
            UploadOp::Float4v => gl.uniform4fv_with_f32_array(loc, &value.as_floats()),
            UploadOp::Int1 => gl.uniform1i(loc, value.as_int()),
            UploadOp::Int1v => gl.uniform1iv_with_i32_array(loc, &value.as_ints()),
            UploadOp::Int2v => gl.uniform2iv_with_i32_array(loc, &value.as_ints()),
            UploadOp::Int3v => gl.uniform3iv_with_i32_array(loc, &value.as_ints()),
            UploadOp::Int4v => gl.uniform4iv_with_i32_array(loc, &value.as_ints()),
            UploadOp::Matrix2 => {
                gl.uniform_matrix2fv_with_f32_array(loc, false, &value.as_floats())
            }
            UploadOp::Matrix3 => {
                gl.uniform_matrix3fv_with_f32_array(loc, false, &value.as_floats())
            }
            UploadOp::Matrix4 => {
                gl.uniform_matrix4fv_with_f32_array(loc, false, &value.as_floats())
            }
            UploadOp::Skip => {}
        }
    }

    /// Binds the given textures to the program's sampler uniforms, assigning
    /// texture units in introspection order. A sampler with no entry in the
    /// map keeps whatever is bound (the surface renders without it until the
    /// caller provides one). Each bound sampler also refreshes a companion
    /// `size<Name>` uniform carrying the image's pixel dimensions.
    pub(crate) fn bind_textures(&self, list: &HashMap<String, Texture>) {
        let gl = &self.data.gl;
        let mut unit: u32 = 0;

        for name in &self.data.samplers {
            let Some(texture) = list.get(name) else {
                continue;
            };

            gl.active_texture(Gl::TEXTURE0 + unit);
            gl.bind_texture(Gl::TEXTURE_2D, Some(texture.raw()));
            if let Some(location) = self.uniform_location(name) {
                gl.uniform1i(Some(location), unit as i32);
            }

            let (width, height) = texture.image_size();
            self.set_uniform(
                &size_uniform_name(name),
                &UniformValue::Vec2([width as f32, height as f32]),
            );

            unit += 1;
        }
    }
}

impl Drop for ProgramData {
    fn drop(&mut self) {
        self.gl.delete_program(Some(&self.raw));
    }
}

/// `image` -> `sizeImage`, the conventional per-texture size uniform.
fn size_uniform_name(sampler: &str) -> String {
    let mut chars = sampler.chars();
    match chars.next() {
        Some(first) => format!("size{}{}", first.to_uppercase(), chars.as_str()),
        None => String::from("size"),
    }
}

fn compile_shader(
    gl: &Gl,
    shader_type: u32,
    stage: &'static str,
    source: &str,
) -> Result<WebGlShader, Error> {
    let shader = gl.create_shader(shader_type).ok_or(Error::ContextUnavailable)?;

    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);

    if compiled {
        Ok(shader)
    } else {
        let log = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown compile failure".into());
        gl.delete_shader(Some(&shader));
        log::error!("{stage} shader compile failed: {log}");
        Err(Error::ShaderCompile { stage, log })
    }
}

/// Populates the reflection tables from the linked program.
fn introspect(data: &mut ProgramData) {
    let gl = &data.gl;

    let uniform_count = gl
        .get_program_parameter(&data.raw, Gl::ACTIVE_UNIFORMS)
        .as_f64()
        .unwrap_or(0.0) as u32;

    for i in 0..uniform_count {
        let Some(info) = gl.get_active_uniform(&data.raw, i) else {
            continue;
        };
        let name = info.name();
        let Some(kind) = UniformKind::from_gl_type(info.type_()) else {
            log::warn!("uniform {name} has unsupported type {:#x}", info.type_());
            continue;
        };
        let Some(location) = gl.get_uniform_location(&data.raw, &name) else {
            continue;
        };
        if kind == UniformKind::Sampler2D {
            data.samplers.push(name.clone());
        }
        data.uniforms_info.insert(name, UniformInfo { kind, location });
    }

    let attribute_count = gl
        .get_program_parameter(&data.raw, Gl::ACTIVE_ATTRIBUTES)
        .as_f64()
        .unwrap_or(0.0) as u32;

    for i in 0..attribute_count {
        let Some(info) = gl.get_active_attrib(&data.raw, i) else {
            continue;
        };
        let name = info.name();
        let location = gl.get_attrib_location(&data.raw, &name);
        if location >= 0 {
            data.attributes.insert(name, location as u32);
        }
    }
}
