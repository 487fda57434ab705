//! A draw-call sized piece of a mesh: one material, bounded vertex and joint counts.

use crate::builder::SubMeshVertexRecord;
use crate::config::MeshBuilderConfig;
use crate::errors::{MeshBuilderError, Result};
use crate::vertex_lookup::VertexLookup;
use hashbrown::HashMap;

/// Polygons sharing one material whose distinct vertices and joints stay within the
/// configured limits.
///
/// Vertices are numbered locally ("real" vertex numbers) in the order they are first
/// added. The index buffer keeps one [`VertexLookup`] per submitted polygon vertex, so
/// polygon winding is preserved.
#[derive(Debug, Clone)]
pub struct SubMesh {
    index: usize,
    material: usize,
    joints: Vec<usize>,
    joint_slots: HashMap<usize, usize>,
    indices: Vec<VertexLookup>,
    local_indices: Vec<usize>,
    polygon_vertex_counts: Vec<usize>,
    num_vertices: usize,
    vertex_order: Option<Vec<VertexLookup>>,
}

impl SubMesh {
    pub(crate) fn new(index: usize, material: usize) -> Self {
        Self {
            index,
            material,
            joints: Vec::new(),
            joint_slots: HashMap::new(),
            indices: Vec::new(),
            local_indices: Vec::new(),
            polygon_vertex_counts: Vec::new(),
            num_vertices: 0,
            vertex_order: None,
        }
    }

    /// Position of this submesh in its builder.
    pub const fn index(&self) -> usize {
        self.index
    }

    pub const fn material_index(&self) -> usize {
        self.material
    }

    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len()
    }

    pub fn num_polygons(&self) -> usize {
        self.polygon_vertex_counts.len()
    }

    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Joints used by this submesh, in the order they were first needed. The position of a
    /// joint in this list is its slot in the submesh bone palette.
    pub fn joints(&self) -> &[usize] {
        &self.joints
    }

    pub fn joint(&self, slot: usize) -> Option<usize> {
        self.joints.get(slot).copied()
    }

    /// Slot of a global joint in this submesh's bone palette.
    pub fn local_joint_index(&self, joint: usize) -> Option<usize> {
        self.joint_slots.get(&joint).copied()
    }

    pub fn index_lookup(&self, index: usize) -> Option<VertexLookup> {
        self.indices.get(index).copied()
    }

    /// One lookup per submitted polygon vertex.
    pub fn indices(&self) -> &[VertexLookup] {
        &self.indices
    }

    /// The index buffer expressed in local vertex numbers.
    pub fn local_indices(&self) -> &[usize] {
        &self.local_indices
    }

    pub fn polygon_vertex_counts(&self) -> &[usize] {
        &self.polygon_vertex_counts
    }

    pub const fn is_vertex_order_generated(&self) -> bool {
        self.vertex_order.is_some()
    }

    /// Local vertex number -> lookup table, available after
    /// [`MeshBuilder::generate_sub_mesh_vertex_orders`](crate::MeshBuilder::generate_sub_mesh_vertex_orders).
    pub fn vertex_order(&self) -> Result<&[VertexLookup]> {
        self.vertex_order
            .as_deref()
            .ok_or(MeshBuilderError::VertexOrderNotGenerated {
                sub_mesh: self.index,
            })
    }

    /// The lookup stored at local vertex number `vertex`.
    pub fn vertex(&self, vertex: usize) -> Result<VertexLookup> {
        self.vertex_order()?
            .get(vertex)
            .copied()
            .ok_or(MeshBuilderError::LocalVertexOutOfRange {
                sub_mesh: self.index,
                vertex,
                num_vertices: self.num_vertices,
            })
    }

    /// How many of `joints` this submesh already uses.
    pub fn calc_num_similar_joints(&self, joints: &[usize]) -> usize {
        joints
            .iter()
            .filter(|joint| self.joint_slots.contains_key(*joint))
            .count()
    }

    /// Can a polygon with `num_polygon_vertices` vertices, `material` and the given joints be
    /// added without breaking the limits?
    ///
    /// The vertex test assumes every polygon vertex is new to this submesh. The joint test
    /// first tries the same worst case and only counts the genuinely new joints when that
    /// fails.
    pub fn can_handle_polygon(
        &self,
        num_polygon_vertices: usize,
        material: usize,
        joints: &[usize],
        skinned: bool,
        config: &MeshBuilderConfig,
    ) -> bool {
        if self.material != material {
            return false;
        }

        if self.num_vertices + num_polygon_vertices > config.max_sub_mesh_vertices {
            return false;
        }

        if skinned && self.joints.len() + joints.len() > config.max_bones_per_sub_mesh {
            let num_new_joints = joints.len() - self.calc_num_similar_joints(joints);
            if self.joints.len() + num_new_joints > config.max_bones_per_sub_mesh {
                return false;
            }
        }

        true
    }

    pub(crate) fn add_joints(&mut self, joints: &[usize]) {
        for &joint in joints {
            if !self.joint_slots.contains_key(&joint) {
                self.joint_slots.insert(joint, self.joints.len());
                self.joints.push(joint);
            }
        }
    }

    /// Reserve the next local vertex number.
    pub(crate) fn allocate_vertex(&mut self) -> usize {
        let vertex = self.num_vertices;
        self.num_vertices += 1;
        vertex
    }

    pub(crate) fn push_polygon(&mut self, lookups: &[VertexLookup], local_indices: &[usize]) {
        self.indices.extend_from_slice(lookups);
        self.local_indices.extend_from_slice(local_indices);
        self.polygon_vertex_counts.push(lookups.len());
        self.vertex_order = None;
    }

    /// Build the local vertex number -> lookup table from the mesh wide vertex records.
    /// Only reads `records` and only writes this submesh.
    pub(crate) fn generate_vertex_order(&mut self, records: &[Vec<SubMeshVertexRecord>]) {
        let mut order = vec![VertexLookup::INVALID; self.num_vertices];
        for (org_vertex, vertex_records) in records.iter().enumerate() {
            for record in vertex_records.iter().filter(|r| r.sub_mesh == self.index) {
                debug_assert!(
                    record.real_vertex < self.num_vertices,
                    "submesh {} has {} vertices, record for original vertex {} points at {}",
                    self.index,
                    self.num_vertices,
                    org_vertex,
                    record.real_vertex
                );
                if let Some(slot) = order.get_mut(record.real_vertex) {
                    *slot = VertexLookup::new(org_vertex, record.dupe);
                }
            }
        }
        self.vertex_order = Some(order);
    }
}
