//! Limits applied while partitioning a mesh into submeshes.

/// Limits and switches used by a [`MeshBuilder`](crate::MeshBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuilderConfig {
    /// Maximum number of distinct joints a skinned submesh may reference.
    pub max_bones_per_sub_mesh: usize,
    /// Maximum number of distinct vertices in one submesh (one draw call).
    pub max_sub_mesh_vertices: usize,
    /// Reuse an existing duplicate when all attribute layers match. When off every polygon
    /// vertex becomes a new duplicate.
    pub optimize_duplicates: bool,
}

impl Default for MeshBuilderConfig {
    fn default() -> Self {
        Self {
            max_bones_per_sub_mesh: 512,
            max_sub_mesh_vertices: 65535,
            optimize_duplicates: true,
        }
    }
}

impl MeshBuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_max_bones_per_sub_mesh(mut self, max_bones: usize) -> Self {
        self.max_bones_per_sub_mesh = max_bones;
        self
    }

    pub const fn with_max_sub_mesh_vertices(mut self, max_vertices: usize) -> Self {
        self.max_sub_mesh_vertices = max_vertices;
        self
    }

    pub const fn with_optimize_duplicates(mut self, optimize: bool) -> Self {
        self.optimize_duplicates = optimize;
        self
    }
}
