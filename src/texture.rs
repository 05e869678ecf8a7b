//! Image-backed textures.
//!
//! Loading is the one asynchronous operation in the crate: a 1×1 transparent
//! placeholder is uploaded immediately so surfaces can draw right away, and
//! the real image replaces it whenever the browser finishes decoding. The
//! instance deduplicates textures by URL, so handles are cheap clones of
//! shared GPU state.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{HtmlImageElement, WebGl2RenderingContext, WebGlTexture};

use crate::error::Error;

type Gl = WebGl2RenderingContext;

// EXT_texture_filter_anisotropic constants; web-sys has no typed binding.
const TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FE;
const MAX_TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FF;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextureOptions {
    pub anisotropy: bool,
}

struct TextureData {
    gl: Gl,
    url: String,
    raw: WebGlTexture,
    image: HtmlImageElement,
    loaded: Cell<bool>,
    anisotropy: bool,
    anisotropy_supported: bool,
}

#[derive(Clone)]
pub struct Texture {
    data: Rc<TextureData>,
}

impl Texture {
    pub(crate) fn new(
        gl: &Gl,
        url: &str,
        options: TextureOptions,
        anisotropy_supported: bool,
    ) -> Result<Texture, Error> {
        let raw = gl.create_texture().ok_or(Error::ContextUnavailable)?;

        gl.active_texture(Gl::TEXTURE0);
        gl.bind_texture(Gl::TEXTURE_2D, Some(&raw));
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            1,
            1,
            0,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            Some(&[0, 0, 0, 0]),
        )?;

        let image = HtmlImageElement::new()?;
        image.set_cross_origin(Some("anonymous"));

        let texture = Texture {
            data: Rc::new(TextureData {
                gl: gl.clone(),
                url: url.to_owned(),
                raw,
                image: image.clone(),
                loaded: Cell::new(false),
                anisotropy: options.anisotropy,
                anisotropy_supported,
            }),
        };

        let loaded = texture.clone();
        let onload = Closure::wrap(Box::new(move || {
            loaded.finish_load();
        }) as Box<dyn FnMut()>);
        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        // The closure must outlive the load; the texture cache keeps the
        // handle for the session anyway.
        onload.forget();

        image.set_src(url);

        Ok(texture)
    }

    pub fn url(&self) -> &str {
        &self.data.url
    }

    pub fn is_loaded(&self) -> bool {
        self.data.loaded.get()
    }

    pub(crate) fn raw(&self) -> &WebGlTexture {
        &self.data.raw
    }

    /// Pixel dimensions of the backing image; zero until loaded.
    pub fn image_size(&self) -> (u32, u32) {
        if self.data.loaded.get() {
            (
                self.data.image.natural_width(),
                self.data.image.natural_height(),
            )
        } else {
            (0, 0)
        }
    }

    fn finish_load(&self) {
        let data = &self.data;
        let gl = &data.gl;

        gl.active_texture(Gl::TEXTURE0);
        gl.bind_texture(Gl::TEXTURE_2D, Some(&data.raw));
        gl.pixel_storei(Gl::UNPACK_FLIP_Y_WEBGL, 1);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MAG_FILTER, Gl::LINEAR as i32);

        if data.anisotropy && data.anisotropy_supported {
            let max = gl
                .get_parameter(MAX_TEXTURE_MAX_ANISOTROPY_EXT)
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0);
            gl.tex_parameterf(Gl::TEXTURE_2D, TEXTURE_MAX_ANISOTROPY_EXT, max as f32);
        }

        if let Err(err) = gl.tex_image_2d_with_u32_and_u32_and_html_image_element(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            &data.image,
        ) {
            log::error!("texture upload failed for {}: {err:?}", data.url);
            return;
        }

        data.loaded.set(true);
        log::debug!("texture loaded: {}", data.url);
    }
}
