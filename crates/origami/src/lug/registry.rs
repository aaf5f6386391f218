//! The LUG registry: every live face maps to exactly one live component.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::component::PaperComponent;
use crate::cfg::FoldCfg;
use crate::error::{FoldError, Result};
use crate::face::FaceTwin;
use crate::geom::{Basis3, FoldAxis};
use crate::ids::{ComponentId, FaceId};

/// Folded-placement access for stacking.
pub trait FaceGeometry {
    fn folded_polygon(&self, face: FaceId) -> Option<Vec<Vector3<f64>>>;
    /// Rigidly rotate the folded placement of `face`; false if the face is unknown.
    fn rotate_face(&mut self, face: FaceId, axis: &FoldAxis, angle_rad: f64) -> bool;
    fn principal_normal(&self, face: FaceId) -> Option<Vector3<f64>> {
        crate::geom::newell_normal(&self.folded_polygon(face)?)
    }
}

impl FaceGeometry for BTreeMap<FaceId, FaceTwin> {
    fn folded_polygon(&self, face: FaceId) -> Option<Vec<Vector3<f64>>> {
        self.get(&face).map(|t| t.folded.vertex_coords())
    }

    fn rotate_face(&mut self, face: FaceId, axis: &FoldAxis, angle_rad: f64) -> bool {
        match self.get_mut(&face) {
            Some(t) => {
                t.rotate(axis, angle_rad);
                true
            }
            None => false,
        }
    }
}

/// Rotate the folded twins of `faces` by `delta_deg` about `axis`.
pub fn rotate_faces(
    faces: impl IntoIterator<Item = FaceId>,
    axis: &FoldAxis,
    delta_deg: f64,
    geometry: &mut impl FaceGeometry,
) -> Result<()> {
    let rad = delta_deg.to_radians();
    for f in faces {
        if !geometry.rotate_face(f, axis, rad) {
            return Err(FoldError::not_found(format!("{f} has no folded placement")));
        }
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lug {
    components: BTreeMap<ComponentId, PaperComponent>,
    face_component: BTreeMap<FaceId, ComponentId>,
    next: usize,
}

impl Lug {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `face` in a fresh single-layer component.
    pub fn add_face(&mut self, face: FaceId, orientation: bool) -> Result<ComponentId> {
        if self.face_component.contains_key(&face) {
            return Err(FoldError::conflict(format!("{face} already has a layer")));
        }
        Ok(self.insert(PaperComponent::single(face, orientation)))
    }

    pub fn component_of(&self, face: FaceId) -> Result<ComponentId> {
        self.face_component
            .get(&face)
            .copied()
            .ok_or_else(|| FoldError::not_found(format!("{face} is in no layer component")))
    }

    pub fn component(&self, id: ComponentId) -> Option<&PaperComponent> {
        self.components.get(&id)
    }

    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &PaperComponent)> {
        self.components.iter().map(|(id, c)| (*id, c))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.face_component.keys().copied()
    }

    /// Orientation bit of `face` in its component.
    pub fn orientation(&self, face: FaceId) -> Result<bool> {
        let cid = self.component_of(face)?;
        self.components
            .get(&cid)
            .and_then(|c| c.node(face))
            .map(|n| n.orientation)
            .ok_or_else(|| FoldError::invariant(format!("{face} is indexed but has no node")))
    }

    fn insert(&mut self, component: PaperComponent) -> ComponentId {
        let id = ComponentId(self.next);
        self.next += 1;
        for f in component.faces() {
            self.face_component.insert(f, id);
        }
        self.components.insert(id, component);
        id
    }

    fn take(&mut self, id: ComponentId) -> Result<PaperComponent> {
        let c = self
            .components
            .remove(&id)
            .ok_or_else(|| FoldError::not_found(format!("{id}")))?;
        for f in c.faces() {
            self.face_component.remove(&f);
        }
        Ok(c)
    }

    /// Split a component into `(stationary, mobile)` parts.
    pub fn split(
        &mut self,
        id: ComponentId,
        descendants: &BTreeMap<FaceId, Vec<FaceId>>,
        stationary: &BTreeSet<FaceId>,
    ) -> Result<(Option<ComponentId>, Option<ComponentId>)> {
        let (s, m) = self.take(id)?.split(descendants, stationary);
        let ids = (s.map(|c| self.insert(c)), m.map(|c| self.insert(c)));
        tracing::debug!(%id, stationary = ?ids.0, mobile = ?ids.1, "split component");
        Ok(ids)
    }

    /// Split without fan-out; the mobile part is inverted.
    pub fn partition(
        &mut self,
        id: ComponentId,
        stationary: &BTreeSet<FaceId>,
    ) -> Result<(Option<ComponentId>, Option<ComponentId>)> {
        let (s, m) = self.take(id)?.partition(stationary);
        let ids = (s.map(|c| self.insert(c)), m.map(|c| self.insert(c)));
        tracing::debug!(%id, stationary = ?ids.0, mobile = ?ids.1, "partitioned component");
        Ok(ids)
    }

    pub fn invert(&mut self, id: ComponentId) -> Result<()> {
        self.components
            .get_mut(&id)
            .ok_or_else(|| FoldError::not_found(format!("{id}")))?
            .invert();
        Ok(())
    }

    /// Rotate `top` about `axis` by `delta_deg`, then stack it on `bottom`.
    ///
    /// Overlap is tested in the plane of `anchor`'s folded polygon.
    #[allow(clippy::too_many_arguments)]
    pub fn stack(
        &mut self,
        bottom: ComponentId,
        top: ComponentId,
        anchor: FaceId,
        axis: &FoldAxis,
        delta_deg: f64,
        geometry: &mut impl FaceGeometry,
        eps: f64,
    ) -> Result<ComponentId> {
        if bottom == top {
            return Err(FoldError::invalid(format!("cannot stack {bottom} on itself")));
        }
        if self.component_of(anchor)? != bottom {
            return Err(FoldError::invalid(format!("{anchor} is not in {bottom}")));
        }
        let top_faces: Vec<FaceId> = self
            .components
            .get(&top)
            .ok_or_else(|| FoldError::not_found(format!("{top}")))?
            .faces()
            .collect();
        rotate_faces(top_faces, axis, delta_deg, geometry)?;

        let basis = geometry
            .folded_polygon(anchor)
            .and_then(|p| Basis3::of_polygon(&p))
            .ok_or_else(|| FoldError::invalid(format!("{anchor} has a degenerate folded polygon")))?;
        let lower = self.take(bottom)?;
        let upper = self.take(top)?;
        let projected = lower
            .faces()
            .chain(upper.faces())
            .filter_map(|f| {
                let poly = geometry.folded_polygon(f)?;
                Some((f, poly.iter().map(|p| basis.project(p)).collect()))
            })
            .collect();
        let combined = PaperComponent::stack(lower, upper, &projected, eps);
        let layers = combined.layer_count();
        let id = self.insert(combined);
        tracing::debug!(%bottom, %top, %id, layers, "stacked components");
        Ok(id)
    }

    /// Union two components through merge descendants (`a == b` relabels in place).
    pub fn merge(
        &mut self,
        a: ComponentId,
        b: ComponentId,
        descendants: &BTreeMap<FaceId, Vec<FaceId>>,
    ) -> Result<ComponentId> {
        let merged = if a == b {
            self.take(a)?.relabel(descendants)
        } else {
            let (ca, cb) = (
                self.components
                    .get(&a)
                    .ok_or_else(|| FoldError::not_found(format!("{a}")))?,
                self.components
                    .get(&b)
                    .ok_or_else(|| FoldError::not_found(format!("{b}")))?,
            );
            let merged = PaperComponent::merge(ca, cb, descendants)?;
            self.take(a)?;
            self.take(b)?;
            merged
        };
        let id = self.insert(merged);
        tracing::debug!(%a, %b, %id, "merged components");
        Ok(id)
    }

    /// Per-face signed normal offset across all components.
    pub fn normal_offsets(&self, cfg: &FoldCfg) -> BTreeMap<FaceId, f64> {
        self.components
            .values()
            .flat_map(|c| c.normal_offsets(cfg.layer_gap))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let mut indexed = 0usize;
        for (id, c) in &self.components {
            if c.is_empty() {
                return Err(FoldError::invariant(format!("{id} is empty")));
            }
            c.validate()?;
            for f in c.faces() {
                indexed += 1;
                if self.face_component.get(&f) != Some(id) {
                    return Err(FoldError::invariant(format!("{f} is not indexed to {id}")));
                }
            }
        }
        if indexed != self.face_component.len() {
            return Err(FoldError::invariant("face index lists faces in no component"));
        }
        Ok(())
    }
}
