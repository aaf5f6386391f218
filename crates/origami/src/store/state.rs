use std::collections::BTreeMap;

use nalgebra::Vector2;

use crate::adjacency::{AdjacencyGraph, EdgeGeometry, ProblemEdge};
use crate::cfg::FoldCfg;
use crate::error::{FoldError, Result};
use crate::face::FaceTwin;
use crate::ids::{EdgeId, FaceId};
use crate::lug::Lug;

/// Every registry of the paper, owned in one place.
///
/// Cloned whole for copy-then-swap commits; nothing in here holds references.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaperState {
    pub(crate) faces: BTreeMap<FaceId, FaceTwin>,
    pub(crate) adjacency: AdjacencyGraph,
    pub(crate) lug: Lug,
    /// Dead face -> the faces that replaced it.
    pub(crate) lineage: BTreeMap<FaceId, Vec<FaceId>>,
    next_face: usize,
}

impl PaperState {
    pub fn face(&self, id: FaceId) -> Result<&FaceTwin> {
        self.faces
            .get(&id)
            .ok_or_else(|| FoldError::not_found(format!("{id} does not exist")))
    }

    pub(crate) fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceTwin> {
        self.faces
            .get_mut(&id)
            .ok_or_else(|| FoldError::not_found(format!("{id} does not exist")))
    }

    pub fn faces(&self) -> &BTreeMap<FaceId, FaceTwin> {
        &self.faces
    }

    pub fn adjacency(&self) -> &AdjacencyGraph {
        &self.adjacency
    }

    pub fn lug(&self) -> &Lug {
        &self.lug
    }

    pub fn lineage(&self) -> &BTreeMap<FaceId, Vec<FaceId>> {
        &self.lineage
    }

    pub(crate) fn fresh_face_id(&mut self) -> FaceId {
        let id = FaceId(self.next_face);
        self.next_face += 1;
        id
    }

    /// Register a new face in all three structures.
    pub(crate) fn insert_face(&mut self, twin: FaceTwin) -> Result<FaceId> {
        let id = self.fresh_face_id();
        self.faces.insert(id, twin);
        self.adjacency.add_face(id);
        self.lug.add_face(id, true)?;
        Ok(id)
    }

    /// Phase 2 of the adjacency rewrite; returns the joints nothing matched.
    pub(crate) fn resolve_pending(
        &mut self,
        problems: Vec<ProblemEdge>,
        cfg: &FoldCfg,
    ) -> Result<Vec<ProblemEdge>> {
        if problems.is_empty() {
            return Ok(problems);
        }
        self.adjacency
            .resolve_problem_edges(problems, &self.lineage, &self.faces, cfg.coplanar_eps)
    }

    /// Cross-structure consistency: twins agree, adjacency is symmetric and
    /// grouped, layer components are compressed, and all three registries list
    /// the same live faces.
    pub fn check_invariants(&self) -> Result<()> {
        for (id, twin) in &self.faces {
            twin.validate()
                .map_err(|e| FoldError::invariant(format!("{id}: {}", e.message())))?;
        }
        self.adjacency.check_symmetry()?;
        self.lug.validate()?;
        let live: Vec<FaceId> = self.faces.keys().copied().collect();
        let graphed: Vec<FaceId> = self.adjacency.faces().collect();
        let layered: Vec<FaceId> = self.lug.faces().collect();
        if live != graphed {
            return Err(FoldError::invariant(format!(
                "adjacency lists {graphed:?}, live faces are {live:?}"
            )));
        }
        if live != layered {
            return Err(FoldError::invariant(format!(
                "layer stack lists {layered:?}, live faces are {live:?}"
            )));
        }
        Ok(())
    }
}

impl EdgeGeometry for BTreeMap<FaceId, FaceTwin> {
    fn is_live(&self, face: FaceId) -> bool {
        self.contains_key(&face)
    }

    fn edge_count(&self, face: FaceId) -> Option<usize> {
        self.get(&face).map(FaceTwin::vertex_count)
    }

    fn edge_segment(&self, face: FaceId, edge: EdgeId) -> Option<(Vector2<f64>, Vector2<f64>)> {
        self.get(&face)?.planar.edge(edge)
    }
}
