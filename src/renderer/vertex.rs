pub type Position = [f32; 2];
pub type Color = [f32; 4];

pub const R: Color = [1.0, 0.0, 0.0, 1.0];
pub const G: Color = [0.0, 1.0, 0.0, 1.0];
pub const B: Color = [0.0, 0.0, 1.0, 1.0];

/// Y-up clip space; the vertex shader flips Y for the backend.
pub const POSITIONS: [Position; 3] = [[0.0, 0.5], [0.4, -0.25], [-0.4, -0.25]];

pub const COLORS: [Color; 3] = [R, G, B];
