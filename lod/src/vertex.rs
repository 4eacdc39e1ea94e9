use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::heightmap::HeightField;

/// Vertex layout uploaded to the GPU for the baked terrain mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl TerrainVertex {
    pub const STRIDE: u32 = std::mem::size_of::<TerrainVertex>() as u32;
}

/// Surface normal at grid sample `(x, y)` from the four neighbouring heights.
///
/// Neighbours past the grid edge reuse the boundary sample. The tangent run is
/// always two grid units, including at the edges.
pub fn central_difference_normal(field: &HeightField, x: u32, y: u32) -> [f32; 3] {
    let (x, y) = (x as i64, y as i64);
    let h_l = field.get_clamped(x - 1, y);
    let h_r = field.get_clamped(x + 1, y);
    let h_d = field.get_clamped(x, y - 1);
    let h_u = field.get_clamped(x, y + 1);

    let dx = Vec3::new(2.0, h_r - h_l, 0.0);
    let dz = Vec3::new(0.0, h_u - h_d, 2.0);
    dz.cross(dx).normalize().to_array()
}

/// Build one vertex per height sample, row-major like the field itself.
pub(crate) fn fill_vertices(field: &HeightField, out: &mut Vec<TerrainVertex>) {
    let (w, h) = (field.width(), field.height());
    let u_denom = w.saturating_sub(1).max(1) as f32;
    let v_denom = h.saturating_sub(1).max(1) as f32;
    // both axes tile by the grid width
    let tile = w as f32;
    for y in 0..h {
        for x in 0..w {
            out.push(TerrainVertex {
                position: [x as f32, field.get(x, y), y as f32],
                uv: [x as f32 / u_denom * tile, y as f32 / v_denom * tile],
                normal: central_difference_normal(field, x, y),
            });
        }
    }
}
