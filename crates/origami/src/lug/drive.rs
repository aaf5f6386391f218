//! Fold drivers: run one classified fold end to end over the paper state.
//!
//! Flow per request
//! 1. Resolve the crease: cut new faces (split cases) or look up the joint.
//! 2. Phase 2 of adjacency rewrites, once every face of the fold exists.
//! 3. Mobile set = faces reachable from the mobile side without crossing the
//!    crease group.
//! 4. Separate mixed layer components (split with fan-out, or partition).
//! 5. Rotate the mobile faces; stack or merge components per the case table.
//! 6. Set the crease angle and report normal-offset deltas.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::cases::FoldCase;
use super::registry::{rotate_faces, FaceGeometry};
use crate::adjacency::{AdjacencyGraph, ProblemEdge};
use crate::cfg::FoldCfg;
use crate::error::{FoldError, Result};
use crate::fold::{create_split_face, merge_faces, MergeReport, Side, SplitReport};
use crate::geom::FoldAxis;
use crate::ids::{ComponentId, FaceId, FacePair, GroupId, PointId};
use crate::store::PaperState;

/// One face crossed by a new crease, from boundary point `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldCut {
    pub face: FaceId,
    pub from: PointId,
    pub to: PointId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Crease {
    /// A new crease through `cuts`. `stationary` names the side of the first
    /// cut, relative to its `from -> to` direction, that stays in place.
    Cut { cuts: Vec<FoldCut>, stationary: Side },
    /// The existing joint between `anchor` and `mobile`, with its whole group.
    Existing { anchor: FaceId, mobile: FaceId },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoldRequest {
    pub crease: Crease,
    /// Dihedral angles in degrees (180 = flat).
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoldOutcome {
    pub case: FoldCase,
    pub anchor: FaceId,
    pub mobile: BTreeSet<FaceId>,
    pub splits: Vec<SplitReport>,
    pub merges: Vec<MergeReport>,
    pub unresolved: Vec<ProblemEdge>,
    /// Face -> change in signed normal offset.
    pub offsets: BTreeMap<FaceId, f64>,
}

/// Split and merge cases.
pub fn face_mutating_fold(
    state: &mut PaperState,
    req: &FoldRequest,
    case: FoldCase,
    cfg: &FoldCfg,
) -> Result<FoldOutcome> {
    if case.is_split() {
        split_fold(state, req, case, cfg)
    } else if case.is_merge() {
        merge_fold(state, req, case, cfg)
    } else {
        Err(FoldError::invalid(format!("{case:?} does not create or remove faces")))
    }
}

/// Align cases: partition, rotate and stack without touching the face set.
pub fn align_fold(
    state: &mut PaperState,
    req: &FoldRequest,
    case: FoldCase,
    cfg: &FoldCfg,
) -> Result<FoldOutcome> {
    if case.mutates_faces() {
        return Err(FoldError::invalid(format!("{case:?} is not an align fold")));
    }
    let (anchor, mobile) = existing_crease(state, req, cfg)?;
    let group = state.adjacency.groups().lookup_group(FacePair::new(anchor, mobile))?;
    let crease = group_pairs(&state.adjacency, group)?;
    let moving = mobile_set(&state.adjacency, anchor, mobile, &crease)?;
    let before = state.lug.normal_offsets(cfg);

    if case != FoldCase::AdjustedAlign {
        separate(state, &moving, &BTreeMap::new(), false)?;
    }
    move_and_stack(state, anchor, mobile, &moving, &crease, req, case.stacks(), cfg)?;
    set_crease_angle(&mut state.adjacency, &crease, req.end)?;

    let offsets = offset_deltas(&before, &state.lug.normal_offsets(cfg), &BTreeMap::new());
    tracing::info!(?case, %anchor, moved = moving.len(), "align fold");
    Ok(FoldOutcome {
        case,
        anchor,
        mobile: moving,
        splits: Vec::new(),
        merges: Vec::new(),
        unresolved: Vec::new(),
        offsets,
    })
}

fn split_fold(
    state: &mut PaperState,
    req: &FoldRequest,
    case: FoldCase,
    cfg: &FoldCfg,
) -> Result<FoldOutcome> {
    let before = state.lug.normal_offsets(cfg);
    let mut splits: Vec<SplitReport> = Vec::new();
    let (anchor, mobile, group) = match &req.crease {
        Crease::Cut { cuts, stationary } => {
            let first = cuts
                .first()
                .ok_or_else(|| FoldError::invalid("a new crease needs at least one cut"))?;
            let mut group: Option<GroupId> = None;
            for cut in cuts {
                let report =
                    create_split_face(state, cut.face, cut.from, cut.to, req.start, group, cfg)?;
                group = Some(report.group);
                splits.push(report);
            }
            let lead = &splits[0];
            let anchor = lead.child_on(first.from, *stationary);
            let mobile = lead.child_on(first.from, stationary.flip());
            (anchor, mobile, lead.group)
        }
        Crease::Existing { .. } => {
            let (anchor, mobile) = existing_crease(state, req, cfg)?;
            let group = state.adjacency.groups().lookup_group(FacePair::new(anchor, mobile))?;
            (anchor, mobile, group)
        }
    };

    let problems: Vec<ProblemEdge> = splits.iter().flat_map(|s| s.problems.clone()).collect();
    let unresolved = state.resolve_pending(problems, cfg)?;

    let crease = group_pairs(&state.adjacency, group)?;
    let moving = mobile_set(&state.adjacency, anchor, mobile, &crease)?;
    for s in &splits {
        if moving.contains(&s.left) == moving.contains(&s.right) {
            return Err(FoldError::invalid(format!(
                "the crease through {} does not separate the paper",
                s.old
            )));
        }
    }
    let descendants: BTreeMap<FaceId, Vec<FaceId>> = splits
        .iter()
        .map(|s| (s.old, vec![s.left, s.right]))
        .collect();
    let ancestors: BTreeMap<FaceId, FaceId> = splits
        .iter()
        .flat_map(|s| [(s.left, s.old), (s.right, s.old)])
        .collect();

    separate(state, &moving, &descendants, true)?;
    move_and_stack(state, anchor, mobile, &moving, &crease, req, case.stacks(), cfg)?;
    set_crease_angle(&mut state.adjacency, &crease, req.end)?;

    let offsets = offset_deltas(&before, &state.lug.normal_offsets(cfg), &ancestors);
    tracing::info!(?case, %anchor, cuts = splits.len(), moved = moving.len(), "split fold");
    Ok(FoldOutcome {
        case,
        anchor,
        mobile: moving,
        splits,
        merges: Vec::new(),
        unresolved,
        offsets,
    })
}

/// Complete and resolved merges: unfold the mobile side flat, then merge
/// every pair of the crease group and union their layer components.
fn merge_fold(
    state: &mut PaperState,
    req: &FoldRequest,
    case: FoldCase,
    cfg: &FoldCfg,
) -> Result<FoldOutcome> {
    let (anchor, mobile) = existing_crease(state, req, cfg)?;
    let group = state.adjacency.groups().lookup_group(FacePair::new(anchor, mobile))?;
    let crease = group_pairs(&state.adjacency, group)?;
    let moving = mobile_set(&state.adjacency, anchor, mobile, &crease)?;
    let before = state.lug.normal_offsets(cfg);

    let mut pairs: Vec<(FaceId, FaceId)> = Vec::with_capacity(crease.len());
    for p in &crease {
        let (x, y) = (p.first(), p.second());
        match (moving.contains(&x), moving.contains(&y)) {
            (false, true) => pairs.push((x, y)),
            (true, false) => pairs.push((y, x)),
            _ => {
                return Err(FoldError::invalid(format!("{p} does not straddle the crease")));
            }
        }
    }

    separate(state, &moving, &BTreeMap::new(), false)?;
    let axis = crease_axis(state, anchor, mobile)?;
    rotate_faces(moving.iter().copied(), &axis, req.start - req.end, &mut state.faces)?;

    // Frame agreement is decided on the unfolded normals, before the faces go away.
    let mut same_side = Vec::with_capacity(pairs.len());
    for (x, y) in &pairs {
        let (nx, ny) = (normal(state, *x)?, normal(state, *y)?);
        same_side.push(nx.dot(&ny) > 0.0);
    }

    let excluded: BTreeSet<FaceId> = pairs.iter().flat_map(|(x, y)| [*x, *y]).collect();
    let mut merges = Vec::with_capacity(pairs.len());
    for (x, y) in &pairs {
        merges.push(merge_faces(state, *x, *y, &excluded, cfg)?);
    }
    let problems: Vec<ProblemEdge> = merges.iter().flat_map(|m| m.problems.clone()).collect();
    let unresolved = state.resolve_pending(problems, cfg)?;

    let descendants: BTreeMap<FaceId, Vec<FaceId>> = merges
        .iter()
        .flat_map(|m| [(m.a, vec![m.merged]), (m.b, vec![m.merged])])
        .collect();
    let ancestors: BTreeMap<FaceId, FaceId> = merges.iter().map(|m| (m.merged, m.a)).collect();
    for (m, want_equal) in merges.iter().zip(same_side) {
        let cx = component_holding(state, &[m.a, m.merged])?;
        let cy = component_holding(state, &[m.b, m.merged])?;
        if cx != cy {
            let bx = node_orientation(state, cx, m.a)?;
            let by = node_orientation(state, cy, m.b)?;
            if (bx == by) != want_equal {
                state.lug.invert(cy)?;
            }
        }
        state.lug.merge(cx, cy, &descendants)?;
    }

    let offsets = offset_deltas(&before, &state.lug.normal_offsets(cfg), &ancestors);
    tracing::info!(?case, %anchor, merged = merges.len(), moved = moving.len(), "merge fold");
    Ok(FoldOutcome {
        case,
        anchor,
        mobile: moving,
        splits: Vec::new(),
        merges,
        unresolved,
        offsets,
    })
}

fn existing_crease(state: &PaperState, req: &FoldRequest, cfg: &FoldCfg) -> Result<(FaceId, FaceId)> {
    let &Crease::Existing { anchor, mobile } = &req.crease else {
        return Err(FoldError::invalid("this fold needs an existing crease"));
    };
    let entry = state.adjacency.entry(anchor, mobile).ok_or_else(|| {
        FoldError::not_found(format!("{anchor} and {mobile} share no crease"))
    })?;
    if (entry.angle - req.start).abs() > cfg.stable_angle_eps.max(1e-9) {
        return Err(FoldError::invalid(format!(
            "crease {anchor}-{mobile} is at {}, not {}",
            entry.angle, req.start
        )));
    }
    Ok((anchor, mobile))
}

fn group_pairs(adjacency: &AdjacencyGraph, group: GroupId) -> Result<BTreeSet<FacePair>> {
    adjacency
        .groups()
        .pairs(group)
        .cloned()
        .ok_or_else(|| FoldError::invariant(format!("crease {group} vanished")))
}

/// Faces reachable from `mobile` without crossing a `crease` joint.
pub fn mobile_set(
    adjacency: &AdjacencyGraph,
    anchor: FaceId,
    mobile: FaceId,
    crease: &BTreeSet<FacePair>,
) -> Result<BTreeSet<FaceId>> {
    let mut seen = BTreeSet::from([mobile]);
    let mut queue = VecDeque::from([mobile]);
    while let Some(f) = queue.pop_front() {
        for e in adjacency.neighbors(f)? {
            if crease.contains(&FacePair::new(f, e.other)) {
                continue;
            }
            if e.other == anchor {
                return Err(FoldError::invalid(format!(
                    "the crease does not separate {anchor} from {mobile}"
                )));
            }
            if seen.insert(e.other) {
                queue.push_back(e.other);
            }
        }
    }
    Ok(seen)
}

/// Split (with fan-out) or partition every component that mixes mobile and
/// stationary faces, or that holds a face being replaced.
fn separate(
    state: &mut PaperState,
    moving: &BTreeSet<FaceId>,
    descendants: &BTreeMap<FaceId, Vec<FaceId>>,
    fan_out: bool,
) -> Result<()> {
    let kids = |f: FaceId| descendants.get(&f).cloned().unwrap_or_else(|| vec![f]);
    let affected: Vec<ComponentId> = state
        .lug
        .components()
        .filter(|(_, c)| {
            let faces: Vec<FaceId> = c.faces().flat_map(&kids).collect();
            let has_mobile = faces.iter().any(|f| moving.contains(f));
            let has_stationary = faces.iter().any(|f| !moving.contains(f));
            (has_mobile && has_stationary) || c.faces().any(|f| descendants.contains_key(&f))
        })
        .map(|(id, _)| id)
        .collect();
    let stationary: BTreeSet<FaceId> = state
        .faces
        .keys()
        .copied()
        .filter(|f| !moving.contains(f))
        .collect();
    for id in affected {
        if fan_out {
            state.lug.split(id, descendants, &stationary)?;
        } else {
            state.lug.partition(id, &stationary)?;
        }
    }
    Ok(())
}

fn crease_axis(state: &PaperState, anchor: FaceId, mobile: FaceId) -> Result<FoldAxis> {
    let (edge, _) = state
        .adjacency
        .shared_edge(anchor, mobile)
        .ok_or_else(|| FoldError::not_found(format!("{anchor} and {mobile} share no crease")))?;
    let poly = state.face(anchor)?.folded.vertex_coords();
    FoldAxis::across_edge(&poly, edge.0)
        .ok_or_else(|| FoldError::invalid(format!("{anchor} has a degenerate crease edge")))
}

fn normal(state: &PaperState, face: FaceId) -> Result<nalgebra::Vector3<f64>> {
    state
        .faces
        .principal_normal(face)
        .ok_or_else(|| FoldError::invalid(format!("{face} has a degenerate folded polygon")))
}

/// Rotate the mobile side and, for stacking cases, land each mobile component
/// on the component across the crease from it, lead pair first.
#[allow(clippy::too_many_arguments)]
fn move_and_stack(
    state: &mut PaperState,
    anchor: FaceId,
    mobile: FaceId,
    moving: &BTreeSet<FaceId>,
    crease: &BTreeSet<FacePair>,
    req: &FoldRequest,
    stacks: bool,
    cfg: &FoldCfg,
) -> Result<()> {
    let axis = crease_axis(state, anchor, mobile)?;
    rotate_faces(moving.iter().copied(), &axis, req.start - req.end, &mut state.faces)?;
    if !stacks {
        return Ok(());
    }
    if state.lug.component_of(anchor)? == state.lug.component_of(mobile)? {
        return Err(FoldError::invariant(format!(
            "{anchor} and {mobile} still share a component after separation"
        )));
    }
    let mut pairs = vec![(anchor, mobile)];
    for p in crease {
        let (x, y) = (p.first(), p.second());
        let pair = match (moving.contains(&x), moving.contains(&y)) {
            (false, true) => (x, y),
            (true, false) => (y, x),
            _ => continue,
        };
        if pair != (anchor, mobile) {
            pairs.push(pair);
        }
    }
    for (x, y) in pairs {
        let s = state.lug.component_of(x)?;
        let m = state.lug.component_of(y)?;
        if s != m {
            land(state, x, y, s, m, &axis, req.end, cfg)?;
        }
    }
    Ok(())
}

/// Stack the already rotated component `m` onto `s` across the joint `x`-`y`.
///
/// The mobile side goes toward increasing layer index; the mobile frame is
/// flipped when the normals disagree with the current bits.
#[allow(clippy::too_many_arguments)]
fn land(
    state: &mut PaperState,
    x: FaceId,
    y: FaceId,
    s: ComponentId,
    m: ComponentId,
    axis: &FoldAxis,
    end: f64,
    cfg: &FoldCfg,
) -> Result<()> {
    let toward_increasing = (end.abs() <= cfg.stable_angle_eps) == state.lug.orientation(x)?;
    if !toward_increasing {
        state.lug.invert(s)?;
    }
    let want_equal = normal(state, y)?.dot(&normal(state, x)?) > 0.0;
    let equal = state.lug.orientation(x)? == state.lug.orientation(y)?;
    if equal != want_equal {
        state.lug.invert(m)?;
    }
    state
        .lug
        .stack(s, m, x, axis, 0.0, &mut state.faces, cfg.coplanar_eps)?;
    Ok(())
}

fn set_crease_angle(adjacency: &mut AdjacencyGraph, crease: &BTreeSet<FacePair>, angle: f64) -> Result<()> {
    for p in crease {
        adjacency.set_angle(p.first(), p.second(), angle)?;
    }
    Ok(())
}

fn component_holding(state: &PaperState, candidates: &[FaceId]) -> Result<ComponentId> {
    candidates
        .iter()
        .find_map(|f| state.lug.component_of(*f).ok())
        .ok_or_else(|| FoldError::invariant(format!("none of {candidates:?} has a layer")))
}

fn node_orientation(state: &PaperState, component: ComponentId, face: FaceId) -> Result<bool> {
    state
        .lug
        .component(component)
        .and_then(|c| c.node(face))
        .map(|n| n.orientation)
        .ok_or_else(|| FoldError::invariant(format!("{face} is not in {component}")))
}

/// New offset minus the offset the face (or its ancestor) had before.
pub(crate) fn offset_deltas(
    before: &BTreeMap<FaceId, f64>,
    after: &BTreeMap<FaceId, f64>,
    ancestors: &BTreeMap<FaceId, FaceId>,
) -> BTreeMap<FaceId, f64> {
    after
        .iter()
        .filter_map(|(f, v)| {
            let old = before
                .get(f)
                .or_else(|| ancestors.get(f).and_then(|a| before.get(a)));
            let d = v - old.copied().unwrap_or(0.0);
            (old.is_none() || d.abs() > 1e-12).then_some((*f, d))
        })
        .collect()
}
