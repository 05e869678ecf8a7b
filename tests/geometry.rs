use kilim::geometry::{build, Indices};

#[test]
fn vertex_and_index_counts_follow_density() {
    for n in 1u32..=8 {
        let mesh = build(n);
        let expected_vertices = ((n + 1) * (n + 1)) as usize;
        assert_eq!(mesh.vertex_count(), expected_vertices);
        assert_eq!(mesh.positions.len(), expected_vertices * 2);
        assert_eq!(mesh.uvs.len(), expected_vertices * 2);
        assert_eq!(mesh.index_count(), (6 * n * n) as usize);
    }
}

#[test]
fn all_indices_address_valid_vertices() {
    let mesh = build(7);
    let count = mesh.vertex_count() as u32;
    match &mesh.indices {
        Indices::U16(indices) => {
            assert!(indices.iter().all(|&i| (i as u32) < count));
        }
        Indices::U32(indices) => {
            assert!(indices.iter().all(|&i| i < count));
        }
    }
}

#[test]
fn index_width_switches_above_65536_vertices() {
    // density 255 -> 256*256 = 65536 vertices, still addressable by u16
    let narrow = build(255);
    assert_eq!(narrow.vertex_count(), 65536);
    assert!(matches!(narrow.indices, Indices::U16(_)));

    // density 256 -> 257*257 = 66049 vertices, needs u32
    let wide = build(256);
    assert_eq!(wide.vertex_count(), 66049);
    assert!(matches!(wide.indices, Indices::U32(_)));
}

#[test]
fn build_is_deterministic() {
    assert_eq!(build(4), build(4));
}

#[test]
fn uv_origin_is_bottom_left() {
    let mesh = build(1);

    // First vertex: top-left in position space, but V = 1 there.
    assert_eq!(&mesh.positions[0..2], &[-0.5, 0.5]);
    assert_eq!(&mesh.uvs[0..2], &[0.0, 1.0]);

    // Third vertex (row 1, column 0): bottom-left, V = 0.
    assert_eq!(&mesh.positions[4..6], &[-0.5, -0.5]);
    assert_eq!(&mesh.uvs[4..6], &[0.0, 0.0]);

    // Last vertex: bottom-right, UV (1, 0).
    let n = mesh.vertex_count();
    assert_eq!(&mesh.positions[n * 2 - 2..], &[0.5, -0.5]);
    assert_eq!(&mesh.uvs[n * 2 - 2..], &[1.0, 0.0]);
}

#[test]
fn triangles_wind_counter_clockwise() {
    let mesh = build(3);
    let indices: Vec<u32> = match &mesh.indices {
        Indices::U16(v) => v.iter().map(|&i| i as u32).collect(),
        Indices::U32(v) => v.clone(),
    };

    for triangle in indices.chunks(3) {
        let p = |i: u32| {
            let i = i as usize;
            (mesh.positions[i * 2], mesh.positions[i * 2 + 1])
        };
        let (ax, ay) = p(triangle[0]);
        let (bx, by) = p(triangle[1]);
        let (cx, cy) = p(triangle[2]);

        let signed_area = (bx - ax) * (cy - ay) - (by - ay) * (cx - ax);
        assert!(signed_area > 0.0, "clockwise triangle {triangle:?}");
    }
}
