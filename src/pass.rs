//! Frame-pass bookkeeping: which binds can be elided this surface, this
//! frame. One [`BindState`] lives on each instance (sessions are
//! independent); a fresh [`FrameCursor`] is made per frame.

/// Tracks the program bound on the context across frames plus the dirty flag
/// that forces a full rebind after structural changes (resize, surface
/// registration, post-pass boundary).
#[derive(Debug, Default)]
pub struct BindState {
    last_program: Option<u32>,
    dirty: bool,
}

impl BindState {
    pub fn new() -> Self {
        Self {
            last_program: None,
            dirty: true,
        }
    }

    /// Force a full rebind on the next surface drawn.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Called per surface with its program id; returns whether the program,
    /// VAO and program-level textures must be rebound. Clears the dirty flag
    /// and records the program as bound.
    pub fn begin_surface(&mut self, program: u32) -> bool {
        let rebind = self.dirty || self.last_program != Some(program);
        self.dirty = false;
        self.last_program = Some(program);
        rebind
    }
}

/// Tracks the programs already seen within one frame iteration, so uniforms
/// shared by every surface of a program (time, viewport) are uploaded at
/// most once per program per frame.
#[derive(Debug, Default)]
pub struct FrameCursor {
    current: Option<u32>,
}

impl FrameCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `program` is entered since the previous
    /// distinct program, i.e. whenever the frame switches programs.
    pub fn enter(&mut self, program: u32) -> bool {
        let switched = self.current != Some(program);
        self.current = Some(program);
        switched
    }
}
