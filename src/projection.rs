//! Per-surface projection derivation.
//!
//! A surface renders the shared unit quad; this module derives the matrix
//! that lands that quad exactly on the tracked element's screen rectangle
//! under a 45° perspective camera. The camera sits at the surface's `order`
//! distance, and the scale factors below cancel the apparent-size change
//! that distance would otherwise cause, so `order` layers surfaces in depth
//! without altering their screen footprint.

use crate::mat4::Mat4;

/// Fixed camera policy: callers cannot vary these per surface.
pub const FOV: f32 = 45.0 * (std::f32::consts::PI / 180.0);
pub const NEAR: f32 = 0.01;
pub const FAR: f32 = 100.0;

/// Element rectangle in page space: the viewport rectangle offset by the
/// scroll position at measurement time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

/// Viewport metrics owned by the instance. `width`/`height` are CSS pixels
/// and are kept non-zero by the instance's resize handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub width: f32,
    pub height: f32,
    pub aspect: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
}

/// Builds the projection that maps the unit quad onto `bounds`.
///
/// Composition, right-to-left against a vertex: scale the quad to the
/// element's footprint in camera units, move it to the element's position,
/// anchor at the camera's top-left corner, push to the focal plane, project.
pub fn surface_projection(
    bounds: &Bounds,
    view: &View,
    position: [f32; 2],
    scale: [f32; 2],
    order: f32,
) -> Mat4 {
    let distance = order;

    let cam_height = 2.0 * (FOV / 2.0).tan() * distance;
    let cam_width = cam_height * view.aspect;

    let scale_x = bounds.width / view.width * cam_width;
    let scale_y = bounds.height / view.height * cam_height;

    let mut m = Mat4::perspective(FOV, view.aspect, NEAR, FAR);

    m.translate([0.0, 0.0, -distance]);

    // Anchor the quad's center at the camera frustum's top-left corner.
    m.translate([-cam_width / 2.0 + scale_x / 2.0, cam_height / 2.0 - scale_y / 2.0, 0.0]);

    // Page-space bounds back to viewport space, in camera units.
    let offset_x = view.scroll_x - position[0];
    let offset_y = view.scroll_y - position[1];

    m.translate([
        (bounds.left - offset_x) / view.width * cam_width,
        -((bounds.top - offset_y) / view.height * cam_height),
        0.0,
    ]);

    m.scale([scale_x * scale[0], scale_y * scale[1], 1.0]);

    m
}
