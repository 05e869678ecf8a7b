//! Shader-driven surfaces kept pixel-aligned to DOM elements.
//!
//! Register any element as a [`Surface`] and the crate renders a tessellated
//! quad exactly over its screen rectangle through WebGL2, re-deriving the
//! projection every frame so scrolling and layout changes never cause drift.
//! Surfaces share one plane mesh and may share shader [`Program`]s; the
//! frame loop elides redundant program and vertex-array binds.
//!
//! The projection math, geometry generation, uniform dispatch table and
//! frame-pass bookkeeping are plain Rust with no browser dependency, so they
//! compile and test on the host; everything that touches WebGL or the DOM is
//! gated to `wasm32`.

pub mod geometry;
pub mod mat4;
pub mod pass;
pub mod projection;
pub mod uniform;

mod error;
pub use error::Error;

#[cfg(target_arch = "wasm32")]
mod instance;
#[cfg(target_arch = "wasm32")]
mod program;
#[cfg(target_arch = "wasm32")]
mod surface;
#[cfg(target_arch = "wasm32")]
mod texture;

#[cfg(target_arch = "wasm32")]
pub use instance::{Kilim, KilimOptions, PostOptions};
#[cfg(target_arch = "wasm32")]
pub use program::{Program, ProgramDesc, DEFAULT_FRAGMENT, DEFAULT_VERTEX};
#[cfg(target_arch = "wasm32")]
pub use surface::{Surface, SurfaceDesc};
#[cfg(target_arch = "wasm32")]
pub use texture::{Texture, TextureOptions};
