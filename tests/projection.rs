use kilim::mat4::Mat4;
use kilim::projection::{surface_projection, Bounds, View};

/// Projects a model-space point through `m` with a standard perspective
/// divide and viewport transform (Y down, origin top-left).
fn to_screen(m: &Mat4, x: f32, y: f32, view: &View) -> (f32, f32) {
    let clip = m.transform([x, y, 0.0, 1.0]);
    let ndc_x = clip[0] / clip[3];
    let ndc_y = clip[1] / clip[3];
    (
        (ndc_x + 1.0) / 2.0 * view.width,
        (1.0 - ndc_y) / 2.0 * view.height,
    )
}

fn view_1000x800() -> View {
    View {
        width: 1000.0,
        height: 800.0,
        aspect: 1.25,
        scroll_x: 0.0,
        scroll_y: 0.0,
    }
}

#[test]
fn translate_then_scale_composes_right_to_left() {
    let mut m = Mat4::identity();
    m.translate([1.0, 2.0, 0.0]);
    m.scale([3.0, 3.0, 1.0]);

    // Scale applies to the vertex first, translation second.
    let out = m.transform([1.0, 1.0, 0.0, 1.0]);
    assert_eq!(out[0], 4.0);
    assert_eq!(out[1], 5.0);
}

#[test]
fn quad_corners_land_on_element_pixels() {
    let view = view_1000x800();
    let bounds = Bounds {
        top: 0.0,
        left: 0.0,
        width: 100.0,
        height: 50.0,
    };

    let m = surface_projection(&bounds, &view, [0.0, 0.0], [1.0, 1.0], 10.0);

    let (x0, y0) = to_screen(&m, -0.5, -0.5, &view);
    let (x1, y1) = to_screen(&m, 0.5, 0.5, &view);

    // Model-space Y is up, screen Y is down: the bottom-left corner lands at
    // the element's bottom edge.
    assert!((x0 - 0.0).abs() < 0.05, "x0 = {x0}");
    assert!((y0 - 50.0).abs() < 0.05, "y0 = {y0}");
    assert!((x1 - 100.0).abs() < 0.05, "x1 = {x1}");
    assert!((y1 - 0.0).abs() < 0.05, "y1 = {y1}");
}

#[test]
fn offset_element_tracks_its_rectangle() {
    let view = view_1000x800();
    let bounds = Bounds {
        top: 120.0,
        left: 340.0,
        width: 250.0,
        height: 90.0,
    };

    let m = surface_projection(&bounds, &view, [0.0, 0.0], [1.0, 1.0], 10.0);

    let (left, bottom) = to_screen(&m, -0.5, -0.5, &view);
    let (right, top) = to_screen(&m, 0.5, 0.5, &view);

    assert!((left - 340.0).abs() < 0.05);
    assert!((right - 590.0).abs() < 0.05);
    assert!((top - 120.0).abs() < 0.05);
    assert!((bottom - 210.0).abs() < 0.05);
}

#[test]
fn simultaneous_scroll_and_bounds_shift_is_invariant() {
    let base_view = view_1000x800();
    let bounds = Bounds {
        top: 40.0,
        left: 80.0,
        width: 300.0,
        height: 200.0,
    };

    let reference = surface_projection(&bounds, &base_view, [5.0, -3.0], [1.0, 1.0], 10.0);

    for (dx, dy) in [(0.0, 250.0), (120.0, 0.0), (-60.0, 90.0)] {
        let shifted_view = View {
            scroll_x: base_view.scroll_x + dx,
            scroll_y: base_view.scroll_y + dy,
            ..base_view
        };
        let shifted_bounds = Bounds {
            top: bounds.top + dy,
            left: bounds.left + dx,
            ..bounds
        };

        let shifted =
            surface_projection(&shifted_bounds, &shifted_view, [5.0, -3.0], [1.0, 1.0], 10.0);

        for (a, b) in reference.as_slice().iter().zip(shifted.as_slice()) {
            assert!((a - b).abs() < 1e-4, "{reference:?} vs {shifted:?}");
        }
    }
}

#[test]
fn order_changes_depth_but_not_screen_footprint() {
    let view = view_1000x800();
    let bounds = Bounds {
        top: 64.0,
        left: 128.0,
        width: 400.0,
        height: 220.0,
    };

    for order in [1.0f32, 5.0, 10.0, 50.0] {
        let m = surface_projection(&bounds, &view, [0.0, 0.0], [1.0, 1.0], order);

        let (left, bottom) = to_screen(&m, -0.5, -0.5, &view);
        let (right, top) = to_screen(&m, 0.5, 0.5, &view);

        assert!((left - 128.0).abs() < 0.05, "order {order}: left {left}");
        assert!((right - 528.0).abs() < 0.05, "order {order}: right {right}");
        assert!((top - 64.0).abs() < 0.05, "order {order}: top {top}");
        assert!((bottom - 284.0).abs() < 0.05, "order {order}: bottom {bottom}");
    }
}

#[test]
fn user_scale_grows_around_element_center() {
    let view = view_1000x800();
    let bounds = Bounds {
        top: 100.0,
        left: 100.0,
        width: 200.0,
        height: 100.0,
    };

    let m = surface_projection(&bounds, &view, [0.0, 0.0], [2.0, 2.0], 10.0);

    let (left, _) = to_screen(&m, -0.5, -0.5, &view);
    let (right, _) = to_screen(&m, 0.5, 0.5, &view);

    // Doubling the scale doubles the footprint while the center stays put.
    assert!(((right - left) - 400.0).abs() < 0.1);
    assert!(((right + left) / 2.0 - 200.0).abs() < 0.1);
}
