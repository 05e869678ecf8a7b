#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

use kilim::uniform::UniformValue;
use kilim::{Kilim, KilimOptions, ProgramDesc, SurfaceDesc};

wasm_bindgen_test_configure!(run_in_browser);

fn instance() -> Option<Kilim> {
    // Headless environments without WebGL2 can't exercise this path.
    Kilim::new(KilimOptions {
        auto_tick: false,
        ..Default::default()
    })
    .ok()
}

fn element_with_size(width: &str, height: &str) -> web_sys::HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let element = document
        .create_element("div")
        .unwrap()
        .dyn_into::<web_sys::HtmlElement>()
        .unwrap();
    element.style().set_property("width", width).unwrap();
    element.style().set_property("height", height).unwrap();
    document.body().unwrap().append_child(&element).unwrap();
    element
}

#[wasm_bindgen_test]
fn surface_tracks_a_dom_element() {
    let Some(kilim) = instance() else { return };

    let program = kilim.program(ProgramDesc::default()).expect("default program");
    let element = element_with_size("200px", "100px");
    let surface = kilim
        .surface(element, SurfaceDesc::new(program))
        .expect("surface");

    assert!(surface.is_active());
    let bounds = surface.bounds();
    assert!((bounds.width - 200.0).abs() < 1.0, "width {}", bounds.width);
    assert!((bounds.height - 100.0).abs() < 1.0, "height {}", bounds.height);
}

#[wasm_bindgen_test]
fn destroyed_surface_stays_inactive() {
    let Some(kilim) = instance() else { return };

    let program = kilim.program(ProgramDesc::default()).unwrap();
    let element = element_with_size("50px", "50px");
    let surface = kilim.surface(element, SurfaceDesc::new(program)).unwrap();

    surface.destroy();
    assert!(!surface.is_active());

    surface.notify_bounds_changed();
    assert!(!surface.is_active());
}

#[wasm_bindgen_test]
fn unknown_uniform_names_are_ignored() {
    let Some(kilim) = instance() else { return };

    let program = kilim.program(ProgramDesc::default()).unwrap();
    // Not declared by the shader: must be a silent no-op, not an error.
    program.set_uniform("definitely_not_declared", &UniformValue::Float(1.0));
}

#[wasm_bindgen_test]
fn broken_shader_reports_instead_of_linking() {
    let Some(kilim) = instance() else { return };

    let result = kilim.program(ProgramDesc {
        fragment: Some("this is not glsl".into()),
        ..Default::default()
    });
    assert!(result.is_err());
}
