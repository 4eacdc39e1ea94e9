//! Camera centred clipmap rings.
//!
//! Every ring reuses one `n x n` grid of vertices. Ring `i` samples the terrain
//! at stride `2^i`, so each ring covers twice the area of the previous one at
//! half the resolution. Ring 0 draws the full grid; outer rings draw the grid
//! with its centre removed so the finer ring shows through. Each finer ring is
//! placed inside the hole of the next coarser one, so nested rings never leave
//! a gap.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Quad range `[start, end)` along one side left empty by a hollow ring.
pub fn hole_span(n: u32) -> (u32, u32) {
    let quads = n.saturating_sub(1);
    let inner = (n / 2).saturating_sub(1);
    let start = (quads - inner) / 2;
    (start, start + inner)
}

/// Indices for an `n x n` vertex grid, two triangles per quad.
///
/// With `fill_hole` set every quad is emitted. Without it, a centred square of
/// `n / 2 - 1` quads per side is left empty.
pub fn generate_ring(n: u32, fill_hole: bool) -> Vec<u32> {
    assert!(n >= 2, "a ring needs at least 2x2 vertices, got {n}");
    let quads = n - 1;
    let (hole_start, hole_end) = if fill_hole { (0, 0) } else { hole_span(n) };
    let in_hole = |q: u32| q >= hole_start && q < hole_end;

    let mut indices = Vec::with_capacity((quads * quads * 6) as usize);
    for y in 0..quads {
        for x in 0..quads {
            if in_hole(x) && in_hole(y) {
                continue;
            }
            let i = x + y * n;
            indices.extend_from_slice(&[i, i + n, i + n + 1, i, i + n + 1, i + 1]);
        }
    }
    indices
}

/// Local `(x, z)` grid positions shared by every ring.
pub fn ring_grid_vertices(n: u32) -> Vec<[f32; 2]> {
    let mut vertices = Vec::with_capacity((n * n) as usize);
    for y in 0..n {
        for x in 0..n {
            vertices.push([x as f32, y as f32]);
        }
    }
    vertices
}

/// Per-ring constant data uploaded before drawing the ring.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ClipmapRingConstants {
    /// World `(x, z)` of the ring's grid origin.
    pub world_offset: [f32; 2],
    pub stride: f32,
    pub ring: u32,
}

pub struct ClipmapRings {
    grid_verts: u32,
    rings: Vec<ClipmapRingConstants>,
}

impl ClipmapRings {
    pub fn new(grid_verts: u32, active_rings: u32) -> Self {
        let rings = (0..active_rings)
            .map(|ring| ClipmapRingConstants {
                world_offset: [0.0; 2],
                stride: (1u32 << ring) as f32,
                ring,
            })
            .collect();
        Self { grid_verts, rings }
    }

    pub fn grid_verts(&self) -> u32 {
        self.grid_verts
    }

    pub fn rings(&self) -> &[ClipmapRingConstants] {
        &self.rings
    }

    /// World size of one side of `ring`.
    pub fn world_extent(&self, ring: u32) -> f32 {
        (self.grid_verts - 1) as f32 * (1u32 << ring) as f32
    }

    /// Re-centre every ring on the camera.
    ///
    /// The coarsest ring snaps its centre to the nearest multiple of its
    /// stride. Every finer ring then takes the stride aligned origin closest
    /// to centring it on the camera, limited to the origins where it still
    /// covers the hole of the ring outside it. Offsets only move in whole
    /// strides, so vertices never slide across the terrain between frames.
    pub fn update(&mut self, camera_pos: Vec3) {
        let n = self.grid_verts;
        let quads = n.saturating_sub(1) as i64;
        let half = quads / 2;
        let (hole_start, hole_end) = hole_span(n);
        // Finer origin relative to the coarser one, in finer strides.
        let min_rel = 2 * hole_end as i64 - quads;
        let max_rel = 2 * hole_start as i64;

        let camera = [camera_pos.x, camera_pos.z];
        let mut outer: Option<[i64; 2]> = None;
        for ring in self.rings.iter_mut().rev() {
            let stride = ring.stride;
            let mut origin = [0i64; 2];
            for axis in 0..2 {
                origin[axis] = match outer {
                    None => (camera[axis] / stride).round() as i64 - half,
                    Some(coarse) => {
                        let base = coarse[axis] * 2;
                        let centred = (camera[axis] / stride - half as f32).round() as i64;
                        centred.clamp(base + min_rel, base + max_rel)
                    }
                };
            }
            ring.world_offset = [origin[0] as f32 * stride, origin[1] as f32 * stride];
            outer = Some(origin);
        }
    }
}
