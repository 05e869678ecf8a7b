//! The rendering session: context acquisition, the shared plane buffers,
//! scroll/resize observation, the frame loop, and the optional post pass.
//!
//! One [`Kilim`] owns one full-window canvas. Surfaces register against it
//! and are drawn back-to-front in registration order once per animation
//! frame, with program and VAO binds elided whenever consecutive surfaces
//! share a program.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, HtmlElement, ResizeObserver, WebGl2RenderingContext, WebGlBuffer,
    WebGlFramebuffer, WebGlTexture, WebGlVertexArrayObject,
};

use crate::error::Error;
use crate::geometry::{self, Indices, Mesh};
use crate::pass::{BindState, FrameCursor};
use crate::program::{Program, ProgramDesc};
use crate::projection::View;
use crate::surface::{Surface, SurfaceDesc};
use crate::texture::{Texture, TextureOptions};
use crate::uniform::UniformValue;

type Gl = WebGl2RenderingContext;

type RafHandle = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

const POST_VERTEX: &str = r#"
attribute vec2 position;

void main() {
  gl_Position = vec4(position, 0.0, 1.0);
}
"#;

const POST_FRAGMENT: &str = r#"
precision highp float;

uniform vec2 viewport;
uniform sampler2D image;

void main() {
  vec2 uv = gl_FragCoord.xy / viewport;
  vec4 color = texture2D(image, uv);
  gl_FragColor = color;
}
"#;

/// Session construction options.
pub struct KilimOptions {
    /// Target canvas; a detached one is created when omitted (the caller is
    /// then responsible for inserting [`Kilim::canvas`] into the document).
    pub canvas: Option<HtmlCanvasElement>,
    /// Device pixel ratio override; defaults to the window's, capped at 2.
    pub dpr: Option<f64>,
    /// Plane subdivision count shared by every surface.
    pub density: u32,
    /// Track page scroll automatically.
    pub auto_scroll: bool,
    /// Start the frame loop at construction.
    pub auto_tick: bool,
    pub antialias: bool,
    pub post: Option<PostOptions>,
}

impl Default for KilimOptions {
    fn default() -> Self {
        Self {
            canvas: None,
            dpr: None,
            density: 1,
            auto_scroll: true,
            auto_tick: true,
            antialias: true,
            post: None,
        }
    }
}

/// Post-processing pass configuration.
#[derive(Default)]
pub struct PostOptions {
    /// Fragment shader sampling the offscreen target; a passthrough is used
    /// when omitted.
    pub fragment: Option<String>,
    pub uniforms: HashMap<String, UniformValue>,
}

/// GPU-side copy of the shared plane mesh.
pub(crate) struct PlaneBuffers {
    pub(crate) position: WebGlBuffer,
    pub(crate) uv: WebGlBuffer,
    pub(crate) index: WebGlBuffer,
    pub(crate) index_count: i32,
    pub(crate) index_type: u32,
}

impl PlaneBuffers {
    fn new(gl: &Gl, mesh: &Mesh) -> Result<Self, Error> {
        let position = gl.create_buffer().ok_or(Error::ContextUnavailable)?;
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&position));
        // Safety: the view does not outlive this call and no allocation
        // happens while it is alive.
        unsafe {
            let view = js_sys::Float32Array::view(&mesh.positions);
            gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &view, Gl::STATIC_DRAW);
        }

        let uv = gl.create_buffer().ok_or(Error::ContextUnavailable)?;
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&uv));
        unsafe {
            let view = js_sys::Float32Array::view(&mesh.uvs);
            gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &view, Gl::STATIC_DRAW);
        }

        let index = gl.create_buffer().ok_or(Error::ContextUnavailable)?;
        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&index));
        match &mesh.indices {
            Indices::U16(data) => unsafe {
                let view = js_sys::Uint16Array::view(data);
                gl.buffer_data_with_array_buffer_view(
                    Gl::ELEMENT_ARRAY_BUFFER,
                    &view,
                    Gl::STATIC_DRAW,
                );
            },
            Indices::U32(data) => unsafe {
                let view = js_sys::Uint32Array::view(data);
                gl.buffer_data_with_array_buffer_view(
                    Gl::ELEMENT_ARRAY_BUFFER,
                    &view,
                    Gl::STATIC_DRAW,
                );
            },
        }

        Ok(Self {
            position,
            uv,
            index,
            index_count: mesh.index_count() as i32,
            index_type: mesh.indices.gl_type(),
        })
    }
}

struct PostPass {
    texture: WebGlTexture,
    framebuffer: WebGlFramebuffer,
    program: Program,
    _triangle: WebGlBuffer,
    vao: WebGlVertexArrayObject,
}

struct Inner {
    canvas: HtmlCanvasElement,
    gl: Gl,
    dpr: f64,
    /// Viewport metrics + scroll offset shared with every surface.
    view: Rc<Cell<View>>,
    plane: PlaneBuffers,
    carpets: Vec<Surface>,
    textures: HashMap<String, Texture>,
    bind: BindState,
    post: Option<PostPass>,
    anisotropy: bool,
    running: bool,
    raf_id: Option<i32>,
    raf_handle: Option<RafHandle>,
    resize_closure: Option<Closure<dyn FnMut()>>,
    scroll_closure: Option<Closure<dyn FnMut()>>,
    observers: Vec<ResizeObserver>,
}

/// Handle to a rendering session.
#[derive(Clone)]
pub struct Kilim {
    inner: Rc<RefCell<Inner>>,
}

impl Kilim {
    pub fn new(options: KilimOptions) -> Result<Kilim, Error> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let window = web_sys::window().ok_or(Error::NoWindow)?;
        let document = window.document().ok_or(Error::NoWindow)?;

        let canvas = match options.canvas {
            Some(canvas) => canvas,
            None => document
                .create_element("canvas")?
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| Error::Dom("created element is not a canvas".into()))?,
        };

        let dpr = options
            .dpr
            .unwrap_or_else(|| window.device_pixel_ratio().min(2.0));

        // Antialias fights the offscreen blit, so post-processing forces it
        // off.
        let antialias = options.antialias && options.post.is_none();

        let gl = acquire_context(&canvas, antialias).map_err(|err| {
            log::error!("{err}");
            err
        })?;

        let anisotropy = [
            "EXT_texture_filter_anisotropic",
            "MOZ_EXT_texture_filter_anisotropic",
            "WEBKIT_EXT_texture_filter_anisotropic",
        ]
        .iter()
        .any(|name| matches!(gl.get_extension(name), Ok(Some(_))));

        gl.enable(Gl::DEPTH_TEST);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);

        let plane = PlaneBuffers::new(&gl, &geometry::build(options.density))?;

        let view = Rc::new(Cell::new(View {
            width: 1.0,
            height: 1.0,
            aspect: 1.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }));

        let kilim = Kilim {
            inner: Rc::new(RefCell::new(Inner {
                canvas,
                gl,
                dpr,
                view,
                plane,
                carpets: Vec::new(),
                textures: HashMap::new(),
                bind: BindState::new(),
                post: None,
                anisotropy,
                running: false,
                raf_id: None,
                raf_handle: None,
                resize_closure: None,
                scroll_closure: None,
                observers: Vec::new(),
            })),
        };

        {
            let weak = Rc::downgrade(&kilim.inner);
            let closure = Closure::wrap(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    if let Err(err) = inner.borrow_mut().resize() {
                        log::warn!("resize failed: {err}");
                    }
                }
            }) as Box<dyn FnMut()>);
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
            kilim.inner.borrow_mut().resize_closure = Some(closure);
        }

        if options.auto_scroll {
            let weak = Rc::downgrade(&kilim.inner);
            let closure = Closure::wrap(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().scroll();
                }
            }) as Box<dyn FnMut()>);
            window.add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref())?;
            kilim.inner.borrow_mut().scroll_closure = Some(closure);
            kilim.inner.borrow_mut().scroll();
        }

        kilim.inner.borrow_mut().resize()?;

        if let Some(post) = options.post {
            kilim.inner.borrow_mut().setup_post(post)?;
        }

        if options.auto_tick {
            kilim.start();
        }

        Ok(kilim)
    }

    /// The canvas this session renders into.
    pub fn canvas(&self) -> HtmlCanvasElement {
        self.inner.borrow().canvas.clone()
    }

    /// Compiles and introspects a shader program for use by surfaces.
    pub fn program(&self, desc: ProgramDesc) -> Result<Program, Error> {
        Program::compile(&self.inner.borrow().gl, desc)
    }

    /// Registers a DOM element for rendering.
    pub fn surface(&self, element: HtmlElement, desc: SurfaceDesc) -> Result<Surface, Error> {
        let surface = {
            let inner = self.inner.borrow();
            Surface::new(
                &inner.gl,
                &inner.plane,
                element.clone(),
                desc,
                inner.view.clone(),
            )?
        };

        {
            let mut inner = self.inner.borrow_mut();
            inner.carpets.push(surface.clone());
            inner.bind.invalidate();
        }

        self.observe(&element, &surface);
        Ok(surface)
    }

    /// Loads (or reuses) a texture for `url`. One GPU texture per URL for
    /// the lifetime of the session.
    pub fn texture(&self, url: &str, options: TextureOptions) -> Result<Texture, Error> {
        let mut inner = self.inner.borrow_mut();
        if let Some(texture) = inner.textures.get(url) {
            return Ok(texture.clone());
        }
        let texture = Texture::new(&inner.gl, url, options, inner.anisotropy)?;
        inner.textures.insert(url.to_owned(), texture.clone());
        Ok(texture)
    }

    /// Re-measures the window and every surface. Wired to the window resize
    /// event automatically; public for embedders that drive layout manually.
    pub fn resize(&self) -> Result<(), Error> {
        self.inner.borrow_mut().resize()
    }

    /// Starts the frame loop. Idempotent.
    pub fn start(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.running {
            return;
        }
        inner.running = true;

        // Self-referential closure so each tick can schedule the next; the
        // handle lets `stop` break the cycle.
        let handle: RafHandle = Rc::new(RefCell::new(None));
        let weak = Rc::downgrade(&self.inner);
        let reschedule = handle.clone();
        *handle.borrow_mut() = Some(Closure::wrap(Box::new(move |time: f64| {
            let Some(rc) = weak.upgrade() else {
                return;
            };
            let mut inner = rc.borrow_mut();
            if !inner.running {
                return;
            }
            inner.schedule(&reschedule);
            inner.render(time as f32);
        }) as Box<dyn FnMut(f64)>));

        inner.raf_handle = Some(handle.clone());
        inner.schedule(&handle);
    }

    /// Stops the frame loop; already-issued GPU work is not recalled.
    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.running = false;
        if let Some(id) = inner.raf_id.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        if let Some(handle) = inner.raf_handle.take() {
            handle.borrow_mut().take();
        }
    }

    /// Stops rendering and detaches the window listeners and element
    /// observers.
    pub fn destroy(&self) {
        self.stop();
        let mut inner = self.inner.borrow_mut();
        if let Some(window) = web_sys::window() {
            if let Some(closure) = inner.resize_closure.take() {
                let _ = window.remove_event_listener_with_callback(
                    "resize",
                    closure.as_ref().unchecked_ref(),
                );
            }
            if let Some(closure) = inner.scroll_closure.take() {
                let _ = window.remove_event_listener_with_callback(
                    "scroll",
                    closure.as_ref().unchecked_ref(),
                );
            }
        }
        for observer in inner.observers.drain(..) {
            observer.disconnect();
        }
    }

    /// Wires a `ResizeObserver` to the surface when the host supports one;
    /// otherwise only window resizes re-measure the element.
    fn observe(&self, element: &HtmlElement, surface: &Surface) {
        let target = surface.clone();
        let callback = Closure::wrap(Box::new(
            move |_entries: js_sys::Array, _observer: ResizeObserver| {
                target.notify_bounds_changed();
            },
        )
            as Box<dyn FnMut(js_sys::Array, ResizeObserver)>);

        match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => {
                observer.observe(element);
                self.inner.borrow_mut().observers.push(observer);
                callback.forget();
            }
            Err(_) => {
                log::debug!("ResizeObserver unavailable; relying on window resize");
            }
        }
    }
}

impl Inner {
    fn resize(&mut self) -> Result<(), Error> {
        let window = web_sys::window().ok_or(Error::NoWindow)?;

        // Guaranteed non-zero so aspect and the projection scale factors
        // stay finite.
        let width = window.inner_width()?.as_f64().unwrap_or(0.0).max(1.0);
        let height = window.inner_height()?.as_f64().unwrap_or(0.0).max(1.0);

        let pixel_width = (width * self.dpr) as i32;
        let pixel_height = (height * self.dpr) as i32;

        self.canvas.set_width(pixel_width as u32);
        self.canvas.set_height(pixel_height as u32);

        let style = self.canvas.style();
        style.set_property("position", "fixed")?;
        style.set_property("top", "0")?;
        style.set_property("right", "0")?;
        style.set_property("bottom", "0")?;
        style.set_property("left", "0")?;
        style.set_property("width", &format!("{width}px"))?;
        style.set_property("height", &format!("{height}px"))?;
        style.set_property("pointer-events", "none")?;

        let old = self.view.get();
        self.view.set(View {
            width: width as f32,
            height: height as f32,
            aspect: (width / height) as f32,
            scroll_x: old.scroll_x,
            scroll_y: old.scroll_y,
        });

        for surface in &self.carpets {
            surface.notify_bounds_changed();
        }

        self.gl.viewport(0, 0, pixel_width, pixel_height);

        if let Some(post) = &self.post {
            allocate_post_target(&self.gl, &post.texture, pixel_width, pixel_height)?;
        }

        self.bind.invalidate();
        Ok(())
    }

    fn scroll(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let x = window.page_x_offset().unwrap_or(0.0);
        let y = window.page_y_offset().unwrap_or(0.0);

        let mut view = self.view.get();
        view.scroll_x = x as f32;
        view.scroll_y = y as f32;
        self.view.set(view);
    }

    fn schedule(&mut self, handle: &RafHandle) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(callback) = handle.borrow().as_ref() {
            match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                Ok(id) => self.raf_id = Some(id),
                Err(err) => log::error!("requestAnimationFrame failed: {err:?}"),
            }
        }
    }

    fn setup_post(&mut self, options: PostOptions) -> Result<(), Error> {
        let gl = &self.gl;

        let texture = gl.create_texture().ok_or(Error::ContextUnavailable)?;
        gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        allocate_post_target(
            gl,
            &texture,
            self.canvas.width() as i32,
            self.canvas.height() as i32,
        )?;
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);

        let framebuffer = gl.create_framebuffer().ok_or(Error::ContextUnavailable)?;
        gl.bind_framebuffer(Gl::FRAMEBUFFER, Some(&framebuffer));
        gl.framebuffer_texture_2d(
            Gl::FRAMEBUFFER,
            Gl::COLOR_ATTACHMENT0,
            Gl::TEXTURE_2D,
            Some(&texture),
            0,
        );
        gl.bind_framebuffer(Gl::FRAMEBUFFER, None);

        let program = Program::compile(
            gl,
            ProgramDesc {
                vertex: Some(POST_VERTEX.to_owned()),
                fragment: Some(
                    options
                        .fragment
                        .unwrap_or_else(|| POST_FRAGMENT.to_owned()),
                ),
                uniforms: options.uniforms,
                textures: HashMap::new(),
            },
        )?;

        // One oversized triangle covers the screen without a seam down the
        // middle.
        let triangle = gl.create_buffer().ok_or(Error::ContextUnavailable)?;
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&triangle));
        let corners: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];
        unsafe {
            let view = js_sys::Float32Array::view(&corners);
            gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &view, Gl::STATIC_DRAW);
        }

        let vao = gl.create_vertex_array().ok_or(Error::ContextUnavailable)?;
        gl.bind_vertex_array(Some(&vao));
        if let Some(location) = program.attribute_location("position") {
            gl.enable_vertex_attrib_array(location);
            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&triangle));
            gl.vertex_attrib_pointer_with_i32(location, 2, Gl::FLOAT, false, 0, 0);
        }
        gl.bind_vertex_array(None);

        self.post = Some(PostPass {
            texture,
            framebuffer,
            program,
            _triangle: triangle,
            vao,
        });
        Ok(())
    }

    fn render(&mut self, time: f32) {
        let gl = self.gl.clone();
        let width = self.canvas.width() as f32;
        let height = self.canvas.height() as f32;

        if let Some(post) = &self.post {
            gl.bind_framebuffer(Gl::FRAMEBUFFER, Some(&post.framebuffer));
        }

        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);

        let mut cursor = FrameCursor::new();

        for surface in &self.carpets {
            let mut state = surface.state.borrow_mut();
            if !state.active {
                continue;
            }

            let program = state.program.clone();

            if self.bind.begin_surface(program.id()) {
                gl.use_program(Some(program.raw()));
                gl.bind_vertex_array(state.vao.as_ref());
                let shared = program.own_textures();
                program.bind_textures(&shared);
            }

            if cursor.enter(program.id()) {
                program.insert_uniform("time", time);
                program.insert_uniform("viewport", [width, height]);
                program.upload_own_uniforms();
            }

            program.bind_textures(&state.textures);
            program.set_uniforms(&state.uniforms);
            state.draw();
        }

        if let Some(post) = &self.post {
            gl.bind_framebuffer(Gl::FRAMEBUFFER, None);
            gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
            gl.use_program(Some(post.program.raw()));

            post.program.insert_uniform("time", time);
            post.program.insert_uniform("viewport", [width, height]);
            post.program.upload_own_uniforms();

            gl.active_texture(Gl::TEXTURE0);
            gl.bind_texture(Gl::TEXTURE_2D, Some(&post.texture));
            if let Some(location) = post.program.uniform_location("image") {
                gl.uniform1i(Some(location), 0);
            }

            gl.bind_vertex_array(Some(&post.vao));
            gl.draw_arrays(Gl::TRIANGLES, 0, 3);

            // The blit left foreign program/VAO state bound.
            self.bind.invalidate();
        }
    }
}

fn acquire_context(canvas: &HtmlCanvasElement, antialias: bool) -> Result<Gl, Error> {
    let attrs = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &attrs,
        &"antialias".into(),
        &wasm_bindgen::JsValue::from_bool(antialias),
    );

    canvas
        .get_context_with_context_options("webgl2", &attrs)
        .map_err(|_| Error::ContextUnavailable)?
        .ok_or(Error::ContextUnavailable)?
        .dyn_into::<Gl>()
        .map_err(|_| Error::ContextUnavailable)
}

fn allocate_post_target(
    gl: &Gl,
    texture: &WebGlTexture,
    width: i32,
    height: i32,
) -> Result<(), Error> {
    gl.bind_texture(Gl::TEXTURE_2D, Some(texture));
    gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
        Gl::TEXTURE_2D,
        0,
        Gl::RGBA as i32,
        width,
        height,
        0,
        Gl::RGBA,
        Gl::UNSIGNED_BYTE,
        None,
    )?;
    Ok(())
}
