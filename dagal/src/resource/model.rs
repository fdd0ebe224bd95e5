use super::Buffer;
use glam::{Vec2, Vec3};

/// A single GPU-resident vertex, uploaded as-is into the vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// One submesh worth of CPU-side geometry, not yet uploaded. Used only for
/// the procedurally generated fallback cube; real mesh sources are parsed
/// entirely inside `GfxContext::create_model`.
#[derive(Debug, Clone, Default)]
pub struct ParsedGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// The full CPU-side parse of a mesh source file — potentially multiple
/// submeshes, matching OBJ/glTF's own grouping.
#[derive(Debug, Clone, Default)]
pub struct ParsedModel {
    pub submeshes: Vec<ParsedGeometry>,
}

/// One drawable, GPU-resident piece of a [`Model`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub index_count: u32,
}

/// The resident GPU form of a mesh asset. Installed into the Manager's mesh
/// slot table by `Manager::install_mesh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub meshes: Vec<Mesh>,
}

fn cube_geometry() -> ParsedGeometry {
    let positions: [Vec3; 8] = [
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ];
    let vertices = positions
        .iter()
        .map(|&position| Vertex {
            position,
            normal: position.normalize(),
            uv: Vec2::ZERO,
        })
        .collect();
    let indices = vec![
        0, 1, 2, 2, 3, 0, // back
        4, 5, 6, 6, 7, 4, // front
        0, 4, 7, 7, 3, 0, // left
        1, 5, 6, 6, 2, 1, // right
        3, 2, 6, 6, 7, 3, // top
        0, 1, 5, 5, 4, 0, // bottom
    ];
    ParsedGeometry { vertices, indices }
}

impl ParsedModel {
    /// The procedurally constructed cube used for all fallback-mesh roles.
    pub fn cube() -> Self {
        Self {
            submeshes: vec![cube_geometry()],
        }
    }
}
