//! Per-vertex joint influences and their optimization.

use crate::errors::{MeshBuilderError, Result};
use crate::float_types::Real;

/// A single joint influencing a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    pub joint: usize,
    pub weight: Real,
}

impl Influence {
    pub const fn new(joint: usize, weight: Real) -> Self {
        Self { joint, weight }
    }
}

/// Joint influences for every original vertex of a mesh.
#[derive(Debug, Clone, Default)]
pub struct SkinningInfo {
    influences: Vec<Vec<Influence>>,
}

impl SkinningInfo {
    pub fn new(num_org_verts: usize) -> Self {
        Self {
            influences: vec![Vec::new(); num_org_verts],
        }
    }

    pub fn num_org_verts(&self) -> usize {
        self.influences.len()
    }

    fn vertex(&self, org_vertex: usize) -> Result<&Vec<Influence>> {
        self.influences
            .get(org_vertex)
            .ok_or(MeshBuilderError::VertexOutOfRange {
                org_vertex,
                num_org_verts: self.influences.len(),
            })
    }

    fn vertex_mut(&mut self, org_vertex: usize) -> Result<&mut Vec<Influence>> {
        let num_org_verts = self.influences.len();
        self.influences
            .get_mut(org_vertex)
            .ok_or(MeshBuilderError::VertexOutOfRange {
                org_vertex,
                num_org_verts,
            })
    }

    pub fn add_influence(&mut self, org_vertex: usize, influence: Influence) -> Result<()> {
        self.vertex_mut(org_vertex)?.push(influence);
        Ok(())
    }

    /// Remove the influence at position `index` of a vertex, keeping the order of the rest.
    pub fn remove_influence(&mut self, org_vertex: usize, index: usize) -> Result<Influence> {
        let influences = self.vertex_mut(org_vertex)?;
        if index >= influences.len() {
            return Err(MeshBuilderError::InfluenceOutOfRange {
                org_vertex,
                influence: index,
            });
        }
        Ok(influences.remove(index))
    }

    /// Number of influences of a vertex, 0 for out of range vertices.
    pub fn num_influences(&self, org_vertex: usize) -> usize {
        self.influences.get(org_vertex).map_or(0, Vec::len)
    }

    pub fn influence(&self, org_vertex: usize, index: usize) -> Option<&Influence> {
        self.influences.get(org_vertex)?.get(index)
    }

    pub fn influences(&self, org_vertex: usize) -> &[Influence] {
        self.influences
            .get(org_vertex)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn calc_total_weight(&self, org_vertex: usize) -> Real {
        self.influences(org_vertex).iter().map(|i| i.weight).sum()
    }

    /// The largest number of influences any single vertex has.
    pub fn max_num_influences(&self) -> usize {
        self.influences.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Append the joints influencing `org_vertices` to `joints`, skipping joints already in it.
    /// Joints keep the order they are first met in.
    pub fn collect_joints(&self, org_vertices: &[usize], joints: &mut Vec<usize>) {
        for &org_vertex in org_vertices {
            for influence in self.influences(org_vertex) {
                if !joints.contains(&influence.joint) {
                    joints.push(influence.joint);
                }
            }
        }
    }

    /// Optimize the influences of every vertex, see [`optimize_vertex`](Self::optimize_vertex).
    pub fn optimize(&mut self, max_num_weights_per_vertex: usize, weight_threshold: Real) {
        for org_vertex in 0..self.influences.len() {
            self.optimize_influences(org_vertex, max_num_weights_per_vertex, weight_threshold);
        }
    }

    /// Optimize the influences of one vertex:
    ///
    /// 1. normalize so the weights add up to one
    /// 2. drop influences lighter than `weight_threshold`, but always keep at least one
    /// 3. drop the lightest influence until at most `max_num_weights_per_vertex` remain
    /// 4. renormalize the remaining weights
    /// 5. sort by weight, heaviest first
    ///
    /// The threshold applies to normalized weights, so running this twice with the same
    /// parameters changes nothing. A vertex whose weights add up to zero keeps its weights
    /// unnormalized.
    pub fn optimize_vertex(
        &mut self,
        org_vertex: usize,
        max_num_weights_per_vertex: usize,
        weight_threshold: Real,
    ) -> Result<()> {
        self.vertex(org_vertex)?;
        self.optimize_influences(org_vertex, max_num_weights_per_vertex, weight_threshold);
        Ok(())
    }

    fn optimize_influences(
        &mut self,
        org_vertex: usize,
        max_num_weights_per_vertex: usize,
        weight_threshold: Real,
    ) {
        let influences = &mut self.influences[org_vertex];
        if influences.is_empty() {
            return;
        }

        normalize(influences);

        let mut i = 0;
        while i < influences.len() {
            if influences[i].weight < weight_threshold && influences.len() > 1 {
                influences.remove(i);
            } else {
                i += 1;
            }
        }

        let max_count = max_num_weights_per_vertex.max(1);
        while influences.len() > max_count {
            let mut smallest = 0;
            for (index, influence) in influences.iter().enumerate().skip(1) {
                if influence.weight < influences[smallest].weight {
                    smallest = index;
                }
            }
            influences.remove(smallest);
        }

        if !normalize(influences) {
            log::warn!(
                "vertex {} has a total skinning weight of zero, leaving its weights unnormalized",
                org_vertex
            );
        }

        influences.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    }
}

/// Scale the weights so they add up to one. Returns false, leaving the weights untouched,
/// when they add up to zero.
fn normalize(influences: &mut [Influence]) -> bool {
    let total: Real = influences.iter().map(|i| i.weight).sum();
    if total <= 0.0 {
        return false;
    }
    for influence in influences.iter_mut() {
        influence.weight /= total;
    }
    true
}
