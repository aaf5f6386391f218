//! Correlated-edge groups: face pairs whose joints were created by one fold.
//!
//! Invariant: a pair belongs to at most one group, and no group is empty.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{FoldError, Result};
use crate::ids::{FacePair, GroupId};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelatedEdges {
    groups: BTreeMap<GroupId, BTreeSet<FacePair>>,
    owner: BTreeMap<FacePair, GroupId>,
    next: usize,
}

impl CorrelatedEdges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &BTreeSet<FacePair>)> {
        self.groups.iter().map(|(id, pairs)| (*id, pairs))
    }

    pub fn pairs(&self, group: GroupId) -> Option<&BTreeSet<FacePair>> {
        self.groups.get(&group)
    }

    pub fn contains(&self, pair: FacePair) -> bool {
        self.owner.contains_key(&pair)
    }

    /// Open a new group holding `pairs`; pairs already grouped elsewhere are a conflict.
    pub fn create_group(&mut self, pairs: impl IntoIterator<Item = FacePair>) -> Result<GroupId> {
        let pairs: BTreeSet<FacePair> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return Err(FoldError::invalid("a correlated-edge group needs at least one pair"));
        }
        if let Some(p) = pairs.iter().find(|p| self.owner.contains_key(p)) {
            return Err(FoldError::conflict(format!("{p} already belongs to a group")));
        }
        let id = GroupId(self.next);
        self.next += 1;
        for p in &pairs {
            self.owner.insert(*p, id);
        }
        self.groups.insert(id, pairs);
        Ok(id)
    }

    pub fn extend_group(&mut self, group: GroupId, pair: FacePair) -> Result<()> {
        if let Some(owner) = self.owner.get(&pair) {
            return Err(FoldError::conflict(format!("{pair} already belongs to {owner}")));
        }
        let set = self
            .groups
            .get_mut(&group)
            .ok_or_else(|| FoldError::not_found(format!("{group}")))?;
        set.insert(pair);
        self.owner.insert(pair, group);
        Ok(())
    }

    pub fn lookup_group(&self, pair: FacePair) -> Result<GroupId> {
        self.owner
            .get(&pair)
            .copied()
            .ok_or_else(|| FoldError::not_found(format!("no correlated-edge group holds {pair}")))
    }

    /// Drop `pair` from its group (and the group itself once empty).
    pub fn remove_connection(&mut self, pair: FacePair) -> Result<GroupId> {
        let group = self
            .owner
            .remove(&pair)
            .ok_or_else(|| FoldError::not_found(format!("no correlated-edge group holds {pair}")))?;
        if let Some(set) = self.groups.get_mut(&group) {
            set.remove(&pair);
            if set.is_empty() {
                self.groups.remove(&group);
            }
        }
        Ok(group)
    }

    /// Swap `old` for `new_pairs` inside the group that holds `old`.
    ///
    /// Pairs that are already grouped (the rewrite reached them from another
    /// side) are left where they are. A missing group is a bookkeeping bug.
    pub fn replace_connection(&mut self, old: FacePair, new_pairs: &[FacePair]) -> Result<GroupId> {
        let group = self.owner.get(&old).copied().ok_or_else(|| {
            FoldError::invariant(format!("no correlated-edge group holds {old}"))
        })?;
        let set = self.groups.entry(group).or_default();
        set.remove(&old);
        self.owner.remove(&old);
        for p in new_pairs {
            if !self.owner.contains_key(p) {
                set.insert(*p);
                self.owner.insert(*p, group);
            }
        }
        if set.is_empty() {
            self.groups.remove(&group);
        }
        Ok(group)
    }
}
