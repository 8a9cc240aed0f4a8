//! Mesh assembly: quads from the greedy mesher, flattened into
//! renderer-ready vertex and index buffers.
//!
//! No graphics API is involved. A [`ChunkMesh`] is plain data; the host
//! uploads [`ChunkMesh::vertex_bytes`] and [`ChunkMesh::index_bytes`]
//! however it likes.

use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

// =============================================================================
// FACE DIRECTIONS
// =============================================================================

/// Outward direction of a quad. Discriminants match texture slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FaceDir {
    /// +X
    PosX = 0,
    /// -X
    NegX = 1,
    /// +Y
    PosY = 2,
    /// -Y
    NegY = 3,
    /// +Z
    PosZ = 4,
    /// -Z
    NegZ = 5,
}

impl FaceDir {
    /// All six directions in texture slot order.
    pub const ALL: [Self; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Direction along `axis` (0 = x, 1 = y, 2 = z) with the given sign.
    ///
    /// # Panics
    ///
    /// Panics if `axis > 2`.
    #[inline]
    #[must_use]
    pub const fn from_axis(axis: usize, positive: bool) -> Self {
        match (axis, positive) {
            (0, true) => Self::PosX,
            (0, false) => Self::NegX,
            (1, true) => Self::PosY,
            (1, false) => Self::NegY,
            (2, true) => Self::PosZ,
            (2, false) => Self::NegZ,
            _ => panic!("axis out of range"),
        }
    }

    /// Texture slot index (0..6).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Axis this face is perpendicular to.
    #[inline]
    #[must_use]
    pub const fn axis(self) -> usize {
        self.index() / 2
    }

    /// True for +X, +Y, +Z.
    #[inline]
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.index() % 2 == 0
    }

    /// Unit normal as an integer vector.
    #[must_use]
    pub fn normal(self) -> IVec3 {
        let mut n = IVec3::ZERO;
        n[self.axis()] = if self.is_positive() { 1 } else { -1 };
        n
    }
}

// =============================================================================
// QUADS
// =============================================================================

/// One merged rectangle of faces, as produced by the mesher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// World-space corners, counter-clockwise seen from outside.
    pub corners: [Vec3; 4],
    /// Outward face direction.
    pub face: FaceDir,
    /// Block id of every merged face.
    pub block: u8,
    /// Texture array layer for this block and face.
    pub texture: u16,
    /// Extent along the first in-plane axis, in voxels.
    pub width: u32,
    /// Extent along the second in-plane axis, in voxels.
    pub height: u32,
}

impl Quad {
    /// Builds the quad whose minimum corner sits at `origin` on the plane
    /// perpendicular to `face`, spanning `width` voxels along the in-plane
    /// axis `(d + 1) % 3` and `height` along `(d + 2) % 3`.
    #[must_use]
    pub fn new(origin: IVec3, face: FaceDir, block: u8, texture: u16, width: u32, height: u32) -> Self {
        let d = face.axis();
        let mut du = Vec3::ZERO;
        let mut dv = Vec3::ZERO;
        du[(d + 1) % 3] = width as f32;
        dv[(d + 2) % 3] = height as f32;

        let p0 = origin.as_vec3();
        let corners = if face.is_positive() {
            [p0, p0 + du, p0 + du + dv, p0 + dv]
        } else {
            [p0, p0 + dv, p0 + du + dv, p0 + du]
        };

        Self {
            corners,
            face,
            block,
            texture,
            width,
            height,
        }
    }

    /// Tiling texture coordinates matching `corners`.
    ///
    /// Side faces keep `t` along world +Y: on X faces the in-plane axes are
    /// (y, z), so `s`/`t` are swapped there.
    #[must_use]
    pub fn uvs(&self) -> [[f32; 2]; 4] {
        let w = self.width as f32;
        let h = self.height as f32;
        // Texture coords at the (origin, +u, +u+v, +v) corners
        let along_u = if self.face.axis() == 0 {
            [[0.0, 0.0], [0.0, w], [h, w], [h, 0.0]]
        } else {
            [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]]
        };

        if self.face.is_positive() {
            along_u
        } else {
            [along_u[0], along_u[3], along_u[2], along_u[1]]
        }
    }

    /// Surface area in voxel faces.
    #[inline]
    #[must_use]
    pub const fn area(&self) -> u32 {
        self.width * self.height
    }
}

// =============================================================================
// VERTEX FORMAT
// =============================================================================

/// Vertex layout handed to the renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// World position.
    pub position: [f32; 3],
    /// Texture coords: tiling `s`, `t` and the texture array layer.
    pub uvw: [f32; 3],
    /// Face normal.
    pub normal: [f32; 3],
}

/// Index value that restarts a triangle fan.
pub const PRIMITIVE_RESTART: u32 = u32::MAX;

/// How quads are encoded in the index buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// Two triangles per quad, six indices.
    #[default]
    TriangleList,
    /// One four-vertex fan per quad followed by [`PRIMITIVE_RESTART`].
    TriangleFan,
}

impl IndexMode {
    /// Indices emitted per quad.
    #[inline]
    #[must_use]
    pub const fn indices_per_quad(self) -> usize {
        match self {
            Self::TriangleList => 6,
            Self::TriangleFan => 5,
        }
    }
}

// =============================================================================
// CHUNK MESH
// =============================================================================

/// A chunk's meshed surface: the quads plus their flattened buffers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    quads: Vec<Quad>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    mode: IndexMode,
}

impl ChunkMesh {
    /// Flattens `quads` into vertex and index buffers.
    #[must_use]
    pub fn from_quads(quads: Vec<Quad>, mode: IndexMode) -> Self {
        let mut vertices = Vec::with_capacity(quads.len() * 4);
        let mut indices = Vec::with_capacity(quads.len() * mode.indices_per_quad());

        for quad in &quads {
            append_quad(&mut vertices, &mut indices, quad, mode);
        }

        Self {
            quads,
            vertices,
            indices,
            mode,
        }
    }

    /// The merged quads.
    #[must_use]
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Vertex buffer contents.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index buffer contents.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex buffer as raw bytes.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices.as_slice())
    }

    /// Index buffer as raw bytes.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices.as_slice())
    }

    /// Index encoding of this mesh.
    #[must_use]
    pub const fn index_mode(&self) -> IndexMode {
        self.mode
    }

    /// Check if mesh has no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Number of quads.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Triangles the renderer will rasterize.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.quads.len() * 2
    }
}

fn append_quad(vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>, quad: &Quad, mode: IndexMode) {
    let base = vertices.len() as u32;
    let normal = quad.face.normal().as_vec3().to_array();
    let layer = f32::from(quad.texture);

    for (corner, [s, t]) in quad.corners.iter().zip(quad.uvs()) {
        vertices.push(Vertex {
            position: corner.to_array(),
            uvw: [s, t, layer],
            normal,
        });
    }

    match mode {
        IndexMode::TriangleList => {
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        IndexMode::TriangleFan => {
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 3, PRIMITIVE_RESTART]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winding_normal(quad: &Quad) -> Vec3 {
        let [a, b, c, _] = quad.corners;
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn test_face_dir_roundtrip() {
        for (i, face) in FaceDir::ALL.into_iter().enumerate() {
            assert_eq!(face.index(), i);
            assert_eq!(FaceDir::from_axis(face.axis(), face.is_positive()), face);
        }
        assert_eq!(FaceDir::NegY.normal(), IVec3::NEG_Y);
        assert_eq!(FaceDir::PosZ.normal(), IVec3::Z);
    }

    #[test]
    fn test_corners_wind_outward() {
        for face in FaceDir::ALL {
            let quad = Quad::new(IVec3::new(1, 2, 3), face, 1, 0, 2, 3);
            let n = winding_normal(&quad);
            assert!(
                n.abs_diff_eq(face.normal().as_vec3(), 1e-6),
                "{face:?} winds towards {n}"
            );
        }
    }

    #[test]
    fn test_quad_spans_width_and_height() {
        // X faces: width along y, height along z
        let quad = Quad::new(IVec3::ZERO, FaceDir::PosX, 1, 0, 3, 2);
        assert_eq!(quad.corners[2], Vec3::new(0.0, 3.0, 2.0));
        assert_eq!(quad.area(), 6);
    }

    #[test]
    fn test_side_faces_tile_t_along_world_y() {
        for face in [FaceDir::PosX, FaceDir::NegX, FaceDir::PosZ, FaceDir::NegZ] {
            let quad = Quad::new(IVec3::ZERO, face, 1, 0, 3, 4);
            for (corner, [_, t]) in quad.corners.iter().zip(quad.uvs()) {
                assert!((corner.y - t).abs() < 1e-6, "{face:?}: t={t} at y={}", corner.y);
            }
        }
    }

    #[test]
    fn test_triangle_list_indices() {
        let quads = vec![
            Quad::new(IVec3::ZERO, FaceDir::PosY, 1, 7, 1, 1),
            Quad::new(IVec3::ZERO, FaceDir::NegY, 1, 7, 1, 1),
        ];
        let mesh = ChunkMesh::from_quads(quads, IndexMode::TriangleList);

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.triangle_count(), 4);
        assert!(mesh.vertices().iter().all(|v| (v.uvw[2] - 7.0).abs() < f32::EPSILON));
    }

    #[test]
    fn test_triangle_fan_indices() {
        let quads = vec![Quad::new(IVec3::ZERO, FaceDir::PosX, 2, 0, 1, 1); 2];
        let mesh = ChunkMesh::from_quads(quads, IndexMode::TriangleFan);

        assert_eq!(mesh.indices(), &[0, 1, 2, 3, PRIMITIVE_RESTART, 4, 5, 6, 7, PRIMITIVE_RESTART]);
        assert_eq!(mesh.index_bytes().len(), 10 * 4);
    }

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
        let mesh = ChunkMesh::from_quads(vec![Quad::new(IVec3::ZERO, FaceDir::PosX, 1, 0, 1, 1)], IndexMode::default());
        assert_eq!(mesh.vertex_bytes().len(), 4 * 36);
    }

    #[test]
    fn test_index_mode_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: IndexMode,
        }
        let w: Wrapper = toml::from_str("mode = \"triangle_fan\"").unwrap();
        assert_eq!(w.mode, IndexMode::TriangleFan);
    }
}
