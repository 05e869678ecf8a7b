//! Shared unit-quad geometry.
//!
//! Every surface renders the same tessellated plane: a `(density+1)²` grid of
//! vertices over the unit square centered at the origin. The projection matrix
//! does all of the positioning work, so one mesh instance (and one set of GPU
//! buffers) serves the whole session.

/// Index data in the narrowest width that can address the vertex count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    pub fn len(&self) -> usize {
        match self {
            Indices::U16(v) => v.len(),
            Indices::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// GL element type matching the index width
    /// (`UNSIGNED_SHORT` / `UNSIGNED_INT`).
    pub fn gl_type(&self) -> u32 {
        match self {
            Indices::U16(_) => 0x1403,
            Indices::U32(_) => 0x1405,
        }
    }
}

/// Immutable tessellated plane: interleaved-nothing, three tightly packed
/// arrays ready for `bufferData`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// 2D vertex positions, x then y per vertex.
    pub positions: Vec<f32>,
    /// Texture coordinates, u then v per vertex.
    pub uvs: Vec<f32>,
    pub indices: Indices,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 2
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// Builds the unit plane for a given subdivision density.
///
/// Positions span `[-0.5, 0.5]` on both axes with +Y up. UVs put `(0, 0)` at
/// the bottom-left and `(1, 1)` at the top-right, so V runs opposite to
/// position Y, matching image coordinates. Each grid cell emits two
/// counter-clockwise triangles sharing a diagonal.
pub fn build(density: u32) -> Mesh {
    let segs = density.max(1) as usize;

    let vertex_count = (segs + 1) * (segs + 1);
    let index_count = segs * segs * 6;

    let mut positions = vec![0.0f32; vertex_count * 2];
    let mut uvs = vec![0.0f32; vertex_count * 2];
    let mut raw_indices = vec![0u32; index_count];

    let seg = 1.0 / segs as f32;

    let mut i = 0usize;
    let mut cell = 0usize;

    for iy in 0..=segs {
        // V inverted relative to Y so (0,0) in UV space is the bottom-left.
        let y = iy as f32 * seg - 0.5;

        for ix in 0..=segs {
            let x = ix as f32 * seg - 0.5;

            positions[i * 2] = x;
            positions[i * 2 + 1] = -y;

            uvs[i * 2] = ix as f32 / segs as f32;
            uvs[i * 2 + 1] = 1.0 - iy as f32 / segs as f32;

            i += 1;

            if iy == segs || ix == segs {
                continue;
            }

            let a = (ix + iy * (segs + 1)) as u32;
            let b = (ix + (iy + 1) * (segs + 1)) as u32;
            let c = (ix + (iy + 1) * (segs + 1) + 1) as u32;
            let d = (ix + iy * (segs + 1) + 1) as u32;

            raw_indices[cell * 6] = a;
            raw_indices[cell * 6 + 1] = b;
            raw_indices[cell * 6 + 2] = d;
            raw_indices[cell * 6 + 3] = b;
            raw_indices[cell * 6 + 4] = c;
            raw_indices[cell * 6 + 5] = d;
            cell += 1;
        }
    }

    // 16-bit indices address up to 65536 vertices; switch to 32-bit beyond.
    let indices = if vertex_count > 65536 {
        Indices::U32(raw_indices)
    } else {
        Indices::U16(raw_indices.into_iter().map(|v| v as u16).collect())
    };

    Mesh {
        positions,
        uvs,
        indices,
    }
}
