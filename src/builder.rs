//! `MeshBuilder`: deduplicates polygon vertices across attribute layers and partitions
//! polygons into submeshes.

use crate::config::MeshBuilderConfig;
use crate::errors::{MeshBuilderError, Result};
use crate::layer::{AttributeLayer, LayerHandle, LayerKind, VertexAttribute, VertexAttributeLayer};
use crate::skinning::{Influence, SkinningInfo};
use crate::sub_mesh::SubMesh;
use crate::vertex_lookup::VertexLookup;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where one duplicate of an original vertex ended up: which submesh, and at which local
/// ("real") vertex number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubMeshVertexRecord {
    pub real_vertex: usize,
    pub dupe: usize,
    pub sub_mesh: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PolygonState {
    Idle,
    Open { material: usize },
}

/// Builds GPU ready submeshes from polygons of a source mesh.
///
/// Usage is write once, then read:
///
/// 1. register attribute layers ([`add_layer`](Self::add_layer)) and optionally the
///    [`SkinningInfo`]
/// 2. for every polygon call [`begin_polygon`](Self::begin_polygon), then for every corner
///    stage each layer's value and call [`add_polygon_vertex`](Self::add_polygon_vertex),
///    then [`end_polygon`](Self::end_polygon)
/// 3. call [`generate_sub_mesh_vertex_orders`](Self::generate_sub_mesh_vertex_orders) and
///    read the submeshes back
///
/// ```rust
/// # use meshbuilder::{MeshBuilder, layer::LayerKind, float_types::Real};
/// # use nalgebra::Point3;
/// let mut builder = MeshBuilder::new(3);
/// let positions = builder.add_layer::<Point3<Real>>("position", LayerKind::Position)?;
///
/// builder.begin_polygon(0)?;
/// for (i, p) in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]].iter().enumerate() {
///     builder.set_current_vertex_value(positions, Point3::new(p[0], p[1], p[2]))?;
///     builder.add_polygon_vertex(i)?;
/// }
/// builder.end_polygon()?;
/// builder.generate_sub_mesh_vertex_orders()?;
///
/// assert_eq!(builder.num_sub_meshes(), 1);
/// assert_eq!(builder.sub_mesh(0)?.num_vertices(), 3);
/// # Ok::<(), meshbuilder::errors::MeshBuilderError>(())
/// ```
#[derive(Debug)]
pub struct MeshBuilder {
    config: MeshBuilderConfig,
    num_org_verts: usize,
    layers: Vec<Box<dyn VertexAttributeLayer>>,
    skinning: Option<SkinningInfo>,
    sub_meshes: Vec<SubMesh>,
    /// original vertex -> every place it was emitted to
    vertex_records: Vec<Vec<SubMeshVertexRecord>>,
    num_duplicates: Vec<usize>,
    state: PolygonState,
    submission_started: bool,
    polygon_lookups: Vec<VertexLookup>,
    polygon_org_vertices: Vec<usize>,
    polygon_joints: Vec<usize>,
}

impl MeshBuilder {
    /// Builder for a source mesh with `num_org_verts` original vertices and default limits.
    pub fn new(num_org_verts: usize) -> Self {
        Self::with_config(num_org_verts, MeshBuilderConfig::default())
    }

    pub fn with_config(num_org_verts: usize, config: MeshBuilderConfig) -> Self {
        Self {
            config,
            num_org_verts,
            layers: Vec::new(),
            skinning: None,
            sub_meshes: Vec::new(),
            vertex_records: vec![Vec::new(); num_org_verts],
            num_duplicates: vec![0; num_org_verts],
            state: PolygonState::Idle,
            submission_started: false,
            polygon_lookups: Vec::new(),
            polygon_org_vertices: Vec::new(),
            polygon_joints: Vec::new(),
        }
    }

    pub const fn config(&self) -> &MeshBuilderConfig {
        &self.config
    }

    pub const fn num_org_verts(&self) -> usize {
        self.num_org_verts
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
    // Layers and skinning
    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

    /// Register a new attribute layer. Must happen before the first polygon.
    pub fn add_layer<T: VertexAttribute>(
        &mut self,
        name: impl Into<String>,
        kind: LayerKind,
    ) -> Result<LayerHandle<T>> {
        if self.submission_started {
            return Err(MeshBuilderError::SubmissionStarted);
        }
        let handle = LayerHandle::new(self.layers.len());
        self.layers
            .push(Box::new(AttributeLayer::<T>::new(self.num_org_verts, name, kind)));
        Ok(handle)
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_name(&self, layer: usize) -> Option<&str> {
        self.layers.get(layer).map(|l| l.name())
    }

    pub fn layer_kind(&self, layer: usize) -> Option<LayerKind> {
        self.layers.get(layer).map(|l| l.kind())
    }

    pub fn layer<T: VertexAttribute>(&self, handle: LayerHandle<T>) -> Result<&AttributeLayer<T>> {
        let layer = handle.index();
        self.layers
            .get(layer)
            .ok_or(MeshBuilderError::InvalidLayer { layer })?
            .as_any()
            .downcast_ref::<AttributeLayer<T>>()
            .ok_or(MeshBuilderError::LayerTypeMismatch { layer })
    }

    pub fn layer_mut<T: VertexAttribute>(
        &mut self,
        handle: LayerHandle<T>,
    ) -> Result<&mut AttributeLayer<T>> {
        let layer = handle.index();
        self.layers
            .get_mut(layer)
            .ok_or(MeshBuilderError::InvalidLayer { layer })?
            .as_any_mut()
            .downcast_mut::<AttributeLayer<T>>()
            .ok_or(MeshBuilderError::LayerTypeMismatch { layer })
    }

    /// Stage the value of one layer for the next [`add_polygon_vertex`](Self::add_polygon_vertex).
    /// Staged values stay until they are replaced.
    pub fn set_current_vertex_value<T: VertexAttribute>(
        &mut self,
        handle: LayerHandle<T>,
        value: T,
    ) -> Result<()> {
        self.layer_mut(handle)?.set_current_vertex_value(value);
        Ok(())
    }

    /// Attach joint influences. Must happen before the first polygon.
    pub fn set_skinning_info(&mut self, skinning: SkinningInfo) -> Result<()> {
        if self.submission_started {
            return Err(MeshBuilderError::SubmissionStarted);
        }
        if skinning.num_org_verts() != self.num_org_verts {
            return Err(MeshBuilderError::SkinningVertexCountMismatch {
                expected: self.num_org_verts,
                actual: skinning.num_org_verts(),
            });
        }
        self.skinning = Some(skinning);
        Ok(())
    }

    pub const fn skinning_info(&self) -> Option<&SkinningInfo> {
        self.skinning.as_ref()
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
    // Polygon submission
    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

    pub fn begin_polygon(&mut self, material: usize) -> Result<()> {
        if let PolygonState::Open { .. } = self.state {
            return Err(MeshBuilderError::PolygonAlreadyOpen);
        }
        self.submission_started = true;
        self.polygon_lookups.clear();
        self.polygon_org_vertices.clear();
        self.state = PolygonState::Open { material };
        Ok(())
    }

    /// Add a corner to the open polygon using the values currently staged on every layer.
    /// Returns the duplicate the corner was matched or added to.
    pub fn add_polygon_vertex(&mut self, org_vertex: usize) -> Result<VertexLookup> {
        if self.state == PolygonState::Idle {
            return Err(MeshBuilderError::NoOpenPolygon);
        }
        if org_vertex >= self.num_org_verts {
            return Err(MeshBuilderError::VertexOutOfRange {
                org_vertex,
                num_org_verts: self.num_org_verts,
            });
        }
        if let Some(layer) = self.layers.iter().find(|l| !l.has_current_value()) {
            return Err(MeshBuilderError::MissingLayerValue {
                layer: layer.name().to_string(),
            });
        }

        let lookup = self.add_vertex(org_vertex)?;
        self.polygon_lookups.push(lookup);
        self.polygon_org_vertices.push(org_vertex);
        Ok(lookup)
    }

    /// Reuse the first duplicate of `org_vertex` every layer agrees with, or append a new one.
    fn add_vertex(&mut self, org_vertex: usize) -> Result<VertexLookup> {
        let num_duplicates = self.num_duplicates[org_vertex];

        if self.config.optimize_duplicates {
            for dupe in 0..num_duplicates {
                if self
                    .layers
                    .iter()
                    .all(|l| l.check_if_is_vertex_equal(org_vertex, dupe))
                {
                    return Ok(VertexLookup::new(org_vertex, dupe));
                }
            }
        }

        for layer in &mut self.layers {
            layer.add_vertex(org_vertex)?;
        }
        self.num_duplicates[org_vertex] = num_duplicates + 1;
        Ok(VertexLookup::new(org_vertex, num_duplicates))
    }

    /// Close the open polygon and place it into a submesh, creating one when no existing
    /// submesh can take it. Returns the index of the submesh.
    pub fn end_polygon(&mut self) -> Result<usize> {
        let PolygonState::Open { material } = self.state else {
            return Err(MeshBuilderError::NoOpenPolygon);
        };
        self.state = PolygonState::Idle;

        let num_vertices = self.polygon_lookups.len();
        if num_vertices < 3 {
            return Err(MeshBuilderError::DegeneratePolygon { num_vertices });
        }

        self.polygon_joints.clear();
        if let Some(skinning) = &self.skinning {
            skinning.collect_joints(&self.polygon_org_vertices, &mut self.polygon_joints);
        }

        let skinned = self.skinning.is_some();
        if num_vertices > self.config.max_sub_mesh_vertices
            || (skinned && self.polygon_joints.len() > self.config.max_bones_per_sub_mesh)
        {
            return Err(MeshBuilderError::PolygonExceedsLimits {
                num_vertices,
                num_joints: self.polygon_joints.len(),
                max_vertices: self.config.max_sub_mesh_vertices,
                max_bones: self.config.max_bones_per_sub_mesh,
            });
        }

        let sub_mesh = match self.find_sub_mesh_for_polygon(material, num_vertices) {
            Some(sub_mesh) => sub_mesh,
            None => {
                let sub_mesh = self.sub_meshes.len();
                self.sub_meshes.push(SubMesh::new(sub_mesh, material));
                log::debug!(
                    "created submesh {} for material {} ({} joints needed)",
                    sub_mesh,
                    material,
                    self.polygon_joints.len()
                );
                sub_mesh
            },
        };

        self.add_polygon_to_sub_mesh(sub_mesh);
        Ok(sub_mesh)
    }

    /// Pick the submesh that takes the open polygon.
    ///
    /// Candidates sharing the most joints with the polygon are tried first (ties go to the
    /// older submesh); a candidate that cannot take the polygon is dropped and the search
    /// repeats. When no candidate shares any joint, or all sharing candidates are full,
    /// the first submesh in creation order that can take the polygon wins.
    fn find_sub_mesh_for_polygon(&self, material: usize, num_vertices: usize) -> Option<usize> {
        let skinned = self.skinning.is_some();
        let joints = &self.polygon_joints;
        let admits = |sub_mesh: &SubMesh| {
            sub_mesh.can_handle_polygon(num_vertices, material, joints, skinned, &self.config)
        };

        let mut candidates: Vec<usize> = (0..self.sub_meshes.len()).collect();
        while !candidates.is_empty() {
            let mut best: Option<(usize, usize)> = None;
            for (position, &candidate) in candidates.iter().enumerate() {
                let num_similar = self.sub_meshes[candidate].calc_num_similar_joints(joints);
                if num_similar > best.map_or(0, |(_, most)| most) {
                    best = Some((position, num_similar));
                }
            }

            let Some((position, num_similar)) = best else {
                break;
            };
            let candidate = candidates[position];
            if admits(&self.sub_meshes[candidate]) {
                log::trace!(
                    "polygon goes to submesh {} ({} of {} joints shared)",
                    candidate,
                    num_similar,
                    joints.len()
                );
                return Some(candidate);
            }
            candidates.remove(position);
        }

        let fallback = self.sub_meshes.iter().position(admits);
        if let Some(sub_mesh) = fallback {
            log::trace!("polygon goes to first admitting submesh {}", sub_mesh);
        }
        fallback
    }

    fn add_polygon_to_sub_mesh(&mut self, sub_mesh_index: usize) {
        let sub_mesh = &mut self.sub_meshes[sub_mesh_index];
        sub_mesh.add_joints(&self.polygon_joints);

        let mut local_indices = Vec::with_capacity(self.polygon_lookups.len());
        for lookup in &self.polygon_lookups {
            let records = &mut self.vertex_records[lookup.org_vertex];
            let real_vertex = match find_real_vertex(records, sub_mesh_index, lookup.dupe) {
                Some(real_vertex) => real_vertex,
                None => {
                    let real_vertex = sub_mesh.allocate_vertex();
                    records.push(SubMeshVertexRecord {
                        real_vertex,
                        dupe: lookup.dupe,
                        sub_mesh: sub_mesh_index,
                    });
                    real_vertex
                },
            };
            local_indices.push(real_vertex);
        }

        sub_mesh.push_polygon(&self.polygon_lookups, &local_indices);
    }

    /// Fill the vertex order table of every submesh. Runs one task per submesh when the
    /// `parallel` feature is enabled.
    pub fn generate_sub_mesh_vertex_orders(&mut self) -> Result<()> {
        if let PolygonState::Open { .. } = self.state {
            return Err(MeshBuilderError::PolygonAlreadyOpen);
        }

        let records = &self.vertex_records;

        #[cfg(feature = "parallel")]
        self.sub_meshes
            .par_iter_mut()
            .for_each(|sub_mesh| sub_mesh.generate_vertex_order(records));

        #[cfg(not(feature = "parallel"))]
        self.sub_meshes
            .iter_mut()
            .for_each(|sub_mesh| sub_mesh.generate_vertex_order(records));

        log::debug!(
            "generated vertex orders for {} submeshes",
            self.sub_meshes.len()
        );
        Ok(())
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
    // Queries
    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

    pub fn num_sub_meshes(&self) -> usize {
        self.sub_meshes.len()
    }

    pub fn sub_mesh(&self, sub_mesh: usize) -> Result<&SubMesh> {
        self.sub_meshes
            .get(sub_mesh)
            .ok_or(MeshBuilderError::InvalidSubMesh { sub_mesh })
    }

    pub fn sub_meshes(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    /// Total vertices over all submeshes. A vertex used by two submeshes counts twice.
    pub fn calc_num_vertices(&self) -> usize {
        self.sub_meshes.iter().map(SubMesh::num_vertices).sum()
    }

    pub fn calc_num_indices(&self) -> usize {
        self.sub_meshes.iter().map(SubMesh::num_indices).sum()
    }

    pub fn calc_num_polygons(&self) -> usize {
        self.sub_meshes.iter().map(SubMesh::num_polygons).sum()
    }

    /// Number of duplicates created so far for an original vertex.
    pub fn num_duplicates(&self, org_vertex: usize) -> usize {
        self.num_duplicates.get(org_vertex).copied().unwrap_or(0)
    }

    /// Every (submesh, duplicate, local vertex) an original vertex was emitted as.
    pub fn sub_mesh_vertex_records(&self, org_vertex: usize) -> &[SubMeshVertexRecord] {
        self.vertex_records
            .get(org_vertex)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn num_sub_mesh_vertices_for_org_vertex(&self, org_vertex: usize) -> usize {
        self.sub_mesh_vertex_records(org_vertex).len()
    }

    /// Local vertex number of `lookup` inside `sub_mesh`, if it was emitted there.
    pub fn find_real_vertex_nr(&self, sub_mesh: usize, lookup: VertexLookup) -> Option<usize> {
        find_real_vertex(
            self.vertex_records.get(lookup.org_vertex)?,
            sub_mesh,
            lookup.dupe,
        )
    }

    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
    // Output
    // ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

    /// The values of one layer in the local vertex order of a submesh, ready to be
    /// uploaded as a vertex stream.
    pub fn sub_mesh_layer_values<T: VertexAttribute>(
        &self,
        handle: LayerHandle<T>,
        sub_mesh: usize,
    ) -> Result<Vec<T>> {
        let layer = self.layer(handle)?;
        self.sub_mesh(sub_mesh)?
            .vertex_order()?
            .iter()
            .map(|lookup| {
                layer
                    .vertex_value(lookup.org_vertex, lookup.dupe)
                    .cloned()
                    .ok_or_else(|| MeshBuilderError::MissingLayerValue {
                        layer: VertexAttributeLayer::name(layer).to_string(),
                    })
            })
            .collect()
    }

    /// Influences of every local vertex of a submesh, with joints replaced by their slot in
    /// the submesh bone palette. Empty when the mesh is not skinned.
    pub fn sub_mesh_influences(&self, sub_mesh: usize) -> Result<Vec<Vec<Influence>>> {
        let sub_mesh = self.sub_mesh(sub_mesh)?;
        let order = sub_mesh.vertex_order()?;
        let Some(skinning) = &self.skinning else {
            return Ok(Vec::new());
        };

        Ok(order
            .iter()
            .map(|lookup| {
                skinning
                    .influences(lookup.org_vertex)
                    .iter()
                    .filter_map(|influence| {
                        sub_mesh
                            .local_joint_index(influence.joint)
                            .map(|slot| Influence::new(slot, influence.weight))
                    })
                    .collect()
            })
            .collect())
    }

    /// Log a summary of the built submeshes.
    pub fn log_contents(&self) {
        log::info!(
            "mesh builder: {} original vertices, {} layers, {} submeshes, skinned: {}",
            self.num_org_verts,
            self.layers.len(),
            self.sub_meshes.len(),
            self.skinning.is_some()
        );
        for layer in &self.layers {
            log::info!("  layer '{}' ({:?})", layer.name(), layer.kind());
        }
        for sub_mesh in &self.sub_meshes {
            log::info!(
                "  submesh {}: material {}, {} vertices, {} indices, {} polygons, {} joints",
                sub_mesh.index(),
                sub_mesh.material_index(),
                sub_mesh.num_vertices(),
                sub_mesh.num_indices(),
                sub_mesh.num_polygons(),
                sub_mesh.num_joints()
            );
        }
    }
}

fn find_real_vertex(records: &[SubMeshVertexRecord], sub_mesh: usize, dupe: usize) -> Option<usize> {
    records
        .iter()
        .find(|r| r.sub_mesh == sub_mesh && r.dupe == dupe)
        .map(|r| r.real_vertex)
}
