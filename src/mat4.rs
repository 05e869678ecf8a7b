//! Minimal column-major 4×4 matrix, just enough for the camera model:
//! perspective construction plus translate/scale composition. Operations
//! post-multiply, so a chain of calls composes right-to-left against a
//! position vector, the same convention as gl-matrix.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4(pub [f32; 16]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub fn identity() -> Self {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Mat4(m)
    }

    /// Perspective projection with OpenGL clip-space conventions
    /// (`fov` is the vertical field of view in radians).
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov / 2.0).tan();
        let nf = 1.0 / (near - far);

        let mut m = [0.0; 16];
        m[0] = f / aspect;
        m[5] = f;
        m[10] = (far + near) * nf;
        m[11] = -1.0;
        m[14] = 2.0 * far * near * nf;
        Mat4(m)
    }

    /// `self = self * T(v)`.
    pub fn translate(&mut self, v: [f32; 3]) {
        let [x, y, z] = v;
        let m = &mut self.0;
        for row in 0..4 {
            m[12 + row] += m[row] * x + m[4 + row] * y + m[8 + row] * z;
        }
    }

    /// `self = self * S(v)`.
    pub fn scale(&mut self, v: [f32; 3]) {
        let m = &mut self.0;
        for row in 0..4 {
            m[row] *= v[0];
            m[4 + row] *= v[1];
            m[8 + row] *= v[2];
        }
    }

    pub fn mul(&self, rhs: &Mat4) -> Mat4 {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += a[k * 4 + row] * b[col * 4 + k];
                }
                out[col * 4 + row] = acc;
            }
        }
        Mat4(out)
    }

    /// Transforms a homogeneous column vector.
    pub fn transform(&self, v: [f32; 4]) -> [f32; 4] {
        let m = &self.0;
        let mut out = [0.0; 4];
        for row in 0..4 {
            out[row] = m[row] * v[0] + m[4 + row] * v[1] + m[8 + row] * v[2] + m[12 + row] * v[3];
        }
        out
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}
