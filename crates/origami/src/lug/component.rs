//! One layered component: an ordered stack of layers of face nodes.
//!
//! Invariants (after `clean`)
//! - The first and last layer are non-empty.
//! - Each face sits in exactly one layer; `layer_of` mirrors the layers.
//! - `a.up` contains `b` iff `b.down` contains `a`, and up links point to a
//!   strictly higher layer.
//! - `orientation == true` means the face's principal normal points toward
//!   increasing layer index.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{FoldError, Result};
use crate::geom::polygons_overlap;
use crate::ids::FaceId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceNode {
    pub face: FaceId,
    pub up: BTreeSet<FaceId>,
    pub down: BTreeSet<FaceId>,
    pub orientation: bool,
}

impl FaceNode {
    pub fn new(face: FaceId, orientation: bool) -> Self {
        Self {
            face,
            up: BTreeSet::new(),
            down: BTreeSet::new(),
            orientation,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperComponent {
    layers: Vec<BTreeMap<FaceId, FaceNode>>,
    layer_of: BTreeMap<FaceId, usize>,
}

impl PaperComponent {
    pub fn single(face: FaceId, orientation: bool) -> Self {
        let mut c = Self::default();
        c.place(0, FaceNode::new(face, orientation));
        c
    }

    pub fn layers(&self) -> &[BTreeMap<FaceId, FaceNode>] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_of(&self, face: FaceId) -> Option<usize> {
        self.layer_of.get(&face).copied()
    }

    pub fn node(&self, face: FaceId) -> Option<&FaceNode> {
        self.layers.get(self.layer_of(face)?)?.get(&face)
    }

    pub fn contains(&self, face: FaceId) -> bool {
        self.layer_of.contains_key(&face)
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.layer_of.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.layer_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layer_of.is_empty()
    }

    fn place(&mut self, layer: usize, node: FaceNode) {
        if self.layers.len() <= layer {
            self.layers.resize_with(layer + 1, BTreeMap::new);
        }
        self.layer_of.insert(node.face, layer);
        self.layers[layer].insert(node.face, node);
    }

    fn node_mut(&mut self, face: FaceId) -> Option<&mut FaceNode> {
        let l = *self.layer_of.get(&face)?;
        self.layers.get_mut(l)?.get_mut(&face)
    }

    fn link(&mut self, lower: FaceId, upper: FaceId) {
        if let Some(n) = self.node_mut(lower) {
            n.up.insert(upper);
        }
        if let Some(n) = self.node_mut(upper) {
            n.down.insert(lower);
        }
    }

    /// Trim empty layers at the top and bottom, then rebuild the layer index.
    pub fn clean(&mut self) {
        while self.layers.last().is_some_and(|l| l.is_empty()) {
            self.layers.pop();
        }
        let lead = self.layers.iter().take_while(|l| l.is_empty()).count();
        self.layers.drain(..lead);
        self.set_layer_map();
    }

    pub fn set_layer_map(&mut self) {
        self.layer_of = self
            .layers
            .iter()
            .enumerate()
            .flat_map(|(i, l)| l.keys().map(move |f| (*f, i)))
            .collect();
    }

    /// Reverse layer order, swap link directions and flip every orientation bit.
    pub fn invert(&mut self) {
        self.layers.reverse();
        for node in self.layers.iter_mut().flat_map(|l| l.values_mut()) {
            std::mem::swap(&mut node.up, &mut node.down);
            node.orientation = !node.orientation;
        }
        self.set_layer_map();
    }

    /// Split into `(stationary, mobile)`, fanning each face out to its descendants.
    pub fn split(
        &self,
        descendants: &BTreeMap<FaceId, Vec<FaceId>>,
        stationary: &BTreeSet<FaceId>,
    ) -> (Option<Self>, Option<Self>) {
        let kids = |f: FaceId| descendants.get(&f).cloned().unwrap_or_else(|| vec![f]);
        let part = |f: FaceId| usize::from(!stationary.contains(&f));
        let mut out = [Self::default(), Self::default()];
        for (li, layer) in self.layers.iter().enumerate() {
            for node in layer.values() {
                for k in kids(node.face) {
                    out[part(k)].place(li, FaceNode::new(k, node.orientation));
                }
            }
        }
        for node in self.layers.iter().flat_map(|l| l.values()) {
            for upper in &node.up {
                for k in kids(node.face) {
                    for ku in kids(*upper) {
                        if part(k) == part(ku) {
                            out[part(k)].link(k, ku);
                        }
                    }
                }
            }
        }
        let [mut s, mut m] = out;
        s.clean();
        m.clean();
        (
            (!s.is_empty()).then_some(s),
            (!m.is_empty()).then_some(m),
        )
    }

    /// `split` without fan-out; the mobile part comes back inverted.
    pub fn partition(&self, stationary: &BTreeSet<FaceId>) -> (Option<Self>, Option<Self>) {
        let (s, m) = self.split(&BTreeMap::new(), stationary);
        (
            s,
            m.map(|mut m| {
                m.invert();
                m
            }),
        )
    }

    /// Place `top` above `bottom` as low as overlaps allow, linking each top
    /// face to the highest overlapping bottom faces beneath it.
    ///
    /// `projected` holds every face of both components in one shared 2D basis.
    pub fn stack(
        mut bottom: Self,
        top: Self,
        projected: &BTreeMap<FaceId, Vec<Vector2<f64>>>,
        eps: f64,
    ) -> Self {
        let overlap = |a: FaceId, b: FaceId| match (projected.get(&a), projected.get(&b)) {
            (Some(pa), Some(pb)) => polygons_overlap(pa, pb, eps),
            _ => false,
        };
        let bottom_faces: Vec<(FaceId, usize)> = bottom.layer_of.iter().map(|(f, l)| (*f, *l)).collect();
        let mut pairs = Vec::new();
        let mut base: Option<usize> = None;
        for (tf, j) in top.layer_of.iter() {
            for (bf, i) in &bottom_faces {
                if overlap(*bf, *tf) {
                    pairs.push((*bf, *i, *tf, *j));
                    let need = (i + 1).saturating_sub(*j);
                    base = Some(base.map_or(need, |b| b.max(need)));
                }
            }
        }
        let base = base.unwrap_or(bottom.layers.len());
        for (j, layer) in top.layers.into_iter().enumerate() {
            for (_, node) in layer {
                bottom.place(base + j, node);
            }
        }
        let mut support: BTreeMap<FaceId, (usize, Vec<FaceId>)> = BTreeMap::new();
        for (bf, i, tf, _) in pairs {
            let slot = support.entry(tf).or_insert((i, Vec::new()));
            if i > slot.0 {
                *slot = (i, Vec::new());
            }
            if i == slot.0 {
                slot.1.push(bf);
            }
        }
        for (tf, (_, below)) in support {
            for bf in below {
                bottom.link(bf, tf);
            }
        }
        bottom.clean();
        bottom
    }

    /// Union `a` and `b` through their merge descendants.
    ///
    /// The two stacks are aligned on the first face pair that merges into one
    /// descendant. Duplicate descendants keep their first placement.
    pub fn merge(a: &Self, b: &Self, descendants: &BTreeMap<FaceId, Vec<FaceId>>) -> Result<Self> {
        let desc = |f: FaceId| descendants.get(&f).and_then(|v| v.first().copied());
        let anchor = a
            .layer_of
            .iter()
            .filter_map(|(fa, la)| Some((desc(*fa)?, *la)))
            .find_map(|(d, la)| {
                b.layer_of
                    .iter()
                    .find(|(fb, _)| desc(**fb) == Some(d))
                    .map(|(_, lb)| (la, *lb))
            })
            .ok_or_else(|| FoldError::invariant("merged components share no descendant"))?;
        let (sa, sb) = if anchor.0 >= anchor.1 {
            (0, anchor.0 - anchor.1)
        } else {
            (anchor.1 - anchor.0, 0)
        };
        let mut out = Self::default();
        out.absorb(a, sa, descendants);
        out.absorb(b, sb, descendants);
        out.absorb_links(a, descendants);
        out.absorb_links(b, descendants);
        out.clean();
        Ok(out)
    }

    /// Rename faces to their merge descendants within one component.
    pub fn relabel(&self, descendants: &BTreeMap<FaceId, Vec<FaceId>>) -> Self {
        let mut out = Self::default();
        out.absorb(self, 0, descendants);
        out.absorb_links(self, descendants);
        out.clean();
        out
    }

    fn absorb(&mut self, src: &Self, shift: usize, descendants: &BTreeMap<FaceId, Vec<FaceId>>) {
        for (li, layer) in src.layers.iter().enumerate() {
            for node in layer.values() {
                let f = merged_name(node.face, descendants);
                match self.layer_of(f) {
                    Some(existing) if existing != li + shift => {
                        tracing::debug!(face = %f, existing, dropped = li + shift, "duplicate merge descendant");
                    }
                    Some(_) => {}
                    None => self.place(li + shift, FaceNode::new(f, node.orientation)),
                }
            }
        }
    }

    fn absorb_links(&mut self, src: &Self, descendants: &BTreeMap<FaceId, Vec<FaceId>>) {
        for node in src.layers.iter().flat_map(|l| l.values()) {
            let x = merged_name(node.face, descendants);
            for upper in &node.up {
                let y = merged_name(*upper, descendants);
                match (self.layer_of(x), self.layer_of(y)) {
                    (Some(lx), Some(ly)) if x != y && lx < ly => self.link(x, y),
                    _ => {}
                }
            }
        }
    }

    /// Signed offset of every face along its own normal, centred on the stack.
    pub fn normal_offsets(&self, layer_gap: f64) -> BTreeMap<FaceId, f64> {
        let center = self.layers.len().saturating_sub(1) as f64 / 2.0;
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(i, l)| {
                l.values().map(move |n| {
                    let sign = if n.orientation { 1.0 } else { -1.0 };
                    (n.face, (i as f64 - center) * layer_gap * sign)
                })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(first), Some(last)) = (self.layers.first(), self.layers.last()) {
            if first.is_empty() || last.is_empty() {
                return Err(FoldError::invariant("component has an empty boundary layer"));
            }
        }
        let mut seen = BTreeSet::new();
        for (i, layer) in self.layers.iter().enumerate() {
            for (f, node) in layer {
                if node.face != *f || !seen.insert(*f) || self.layer_of(*f) != Some(i) {
                    return Err(FoldError::invariant(format!("{f} is misplaced in its component")));
                }
                for u in &node.up {
                    let ok = self.layer_of(*u).is_some_and(|lu| lu > i)
                        && self.node(*u).is_some_and(|n| n.down.contains(f));
                    if !ok {
                        return Err(FoldError::invariant(format!("{f} -> {u} up link is broken")));
                    }
                }
                for d in &node.down {
                    if !self.node(*d).is_some_and(|n| n.up.contains(f)) {
                        return Err(FoldError::invariant(format!("{f} -> {d} down link is broken")));
                    }
                }
            }
        }
        if seen.len() != self.layer_of.len() {
            return Err(FoldError::invariant("layer index lists faces not in any layer"));
        }
        Ok(())
    }
}

fn merged_name(face: FaceId, descendants: &BTreeMap<FaceId, Vec<FaceId>>) -> FaceId {
    descendants
        .get(&face)
        .and_then(|v| v.first().copied())
        .unwrap_or(face)
}
