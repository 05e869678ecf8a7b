//! A surface ("carpet"): one DOM element tracked for rendering.
//!
//! Each surface owns a vertex-array object binding the shared plane buffers
//! to its program's attributes, a private uniform/texture map, and the
//! projection matrix derived from the element's most recent measured bounds.
//! Bounds and projection are only ever derived from the DOM rectangle, never
//! hand-set. Once a surface goes inactive (explicit destroy, or its element
//! left the document) it stays inactive and its VAO is released.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use web_sys::{HtmlElement, WebGl2RenderingContext, WebGlVertexArrayObject};

use crate::error::Error;
use crate::instance::PlaneBuffers;
use crate::mat4::Mat4;
use crate::program::Program;
use crate::projection::{surface_projection, Bounds, View};
use crate::texture::Texture;
use crate::uniform::UniformValue;

type Gl = WebGl2RenderingContext;

/// Construction arguments for a surface. The program is the one required
/// piece; everything else has the conventional defaults.
pub struct SurfaceDesc {
    pub program: Program,
    pub wireframe: bool,
    pub uniforms: HashMap<String, UniformValue>,
    pub textures: HashMap<String, Texture>,
    /// Screen-space offset subtracted from the scroll position, in CSS pixels.
    pub position: [f32; 2],
    /// Multiplier on top of the element-footprint scale.
    pub scale: [f32; 2],
    /// Simulated camera distance; layers surfaces in depth without changing
    /// their on-screen size.
    pub order: f32,
}

impl SurfaceDesc {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            wireframe: false,
            uniforms: HashMap::new(),
            textures: HashMap::new(),
            position: [0.0, 0.0],
            scale: [1.0, 1.0],
            order: 10.0,
        }
    }
}

pub(crate) struct SurfaceState {
    gl: Gl,
    element: HtmlElement,
    view: Rc<Cell<View>>,
    pub(crate) program: Program,
    pub(crate) vao: Option<WebGlVertexArrayObject>,
    index_count: i32,
    index_type: u32,
    pub(crate) wireframe: bool,
    pub(crate) uniforms: HashMap<String, UniformValue>,
    pub(crate) textures: HashMap<String, Texture>,
    position: [f32; 2],
    scale: [f32; 2],
    order: f32,
    bounds: Bounds,
    projection: Mat4,
    pub(crate) active: bool,
}

#[derive(Clone)]
pub struct Surface {
    pub(crate) state: Rc<RefCell<SurfaceState>>,
}

impl Surface {
    pub(crate) fn new(
        gl: &Gl,
        plane: &PlaneBuffers,
        element: HtmlElement,
        desc: SurfaceDesc,
        view: Rc<Cell<View>>,
    ) -> Result<Surface, Error> {
        let vao = gl.create_vertex_array().ok_or(Error::ContextUnavailable)?;
        gl.bind_vertex_array(Some(&vao));

        // Bind only the attributes the program actually declares; a shader
        // without `uv` still works against the shared plane.
        if let Some(location) = desc.program.attribute_location("position") {
            gl.enable_vertex_attrib_array(location);
            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&plane.position));
            gl.vertex_attrib_pointer_with_i32(location, 2, Gl::FLOAT, false, 0, 0);
        }

        if let Some(location) = desc.program.attribute_location("uv") {
            gl.enable_vertex_attrib_array(location);
            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&plane.uv));
            gl.vertex_attrib_pointer_with_i32(location, 2, Gl::FLOAT, false, 0, 0);
        }

        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&plane.index));
        gl.bind_vertex_array(None);

        // The rendered quad replaces the element visually; hide the DOM
        // content and tag the element so page CSS can hook it.
        let _ = element.class_list().add_1("kilim");
        let _ = element.style().set_property("opacity", "0");

        let state = SurfaceState {
            gl: gl.clone(),
            element,
            view,
            program: desc.program,
            vao: Some(vao),
            index_count: plane.index_count,
            index_type: plane.index_type,
            wireframe: desc.wireframe,
            uniforms: desc.uniforms,
            textures: desc.textures,
            position: desc.position,
            scale: desc.scale,
            order: desc.order,
            bounds: Bounds::default(),
            projection: Mat4::identity(),
            active: true,
        };

        let surface = Surface {
            state: Rc::new(RefCell::new(state)),
        };
        surface.state.borrow_mut().resize();
        Ok(surface)
    }

    /// Re-measures the tracked element. The instance calls this for every
    /// surface on window resize and wires it to a `ResizeObserver` where the
    /// host supports one; embedders with their own observation can call it
    /// directly.
    pub fn notify_bounds_changed(&self) {
        self.state.borrow_mut().resize();
    }

    pub fn set_uniform(&self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.state
            .borrow_mut()
            .uniforms
            .insert(name.into(), value.into());
    }

    pub fn set_texture(&self, name: impl Into<String>, texture: Texture) {
        self.state
            .borrow_mut()
            .textures
            .insert(name.into(), texture);
    }

    pub fn set_position(&self, position: [f32; 2]) {
        self.state.borrow_mut().position = position;
    }

    pub fn set_scale(&self, scale: [f32; 2]) {
        self.state.borrow_mut().scale = scale;
    }

    pub fn set_order(&self, order: f32) {
        self.state.borrow_mut().order = order;
    }

    pub fn set_wireframe(&self, wireframe: bool) {
        self.state.borrow_mut().wireframe = wireframe;
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    /// Last measured page-space bounds.
    pub fn bounds(&self) -> Bounds {
        self.state.borrow().bounds
    }

    /// Flags the surface inactive and releases its GPU vertex-array state.
    /// Terminal: the frame loop skips it from here on.
    pub fn destroy(&self) {
        self.state.borrow_mut().deactivate();
    }
}

impl SurfaceState {
    pub(crate) fn resize(&mut self) {
        if !self.active {
            return;
        }

        // A surface whose element left the document stops rendering instead
        // of failing the frame.
        if !self.element.is_connected() {
            log::debug!("surface element removed from document; deactivating");
            self.deactivate();
            return;
        }

        let view = self.view.get();
        let rect = self.element.get_bounding_client_rect();

        self.bounds = Bounds {
            top: rect.top() as f32 + view.scroll_y,
            left: rect.left() as f32 + view.scroll_x,
            width: rect.width() as f32,
            height: rect.height() as f32,
        };

        self.uniforms.insert(
            "size".into(),
            UniformValue::Vec2([self.bounds.width, self.bounds.height]),
        );

        self.update_projection(&view);
    }

    fn update_projection(&mut self, view: &View) {
        self.projection =
            surface_projection(&self.bounds, view, self.position, self.scale, self.order);
    }

    /// Recomputes the projection (scroll and per-frame parameter changes must
    /// land without waiting for a resize), uploads it, and issues the indexed
    /// draw over the shared plane.
    pub(crate) fn draw(&mut self) {
        let view = self.view.get();
        self.update_projection(&view);

        self.program
            .set_uniform("projection", &UniformValue::Mat4(self.projection));

        let mode = if self.wireframe { Gl::LINES } else { Gl::TRIANGLES };
        self.gl
            .draw_elements_with_i32(mode, self.index_count, self.index_type, 0);
    }

    fn deactivate(&mut self) {
        self.active = false;
        if let Some(vao) = self.vao.take() {
            self.gl.delete_vertex_array(Some(&vao));
        }
    }
}
