//! Integer handles for faces, points, lines, edges, components and groups.
//!
//! Faces, annotations and layer nodes never hold references to each other;
//! every cross-reference is one of these ids looked up in an owning table.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Global face id; fresh for every face created by a split or merge.
    FaceId,
    "face"
);
id_type!(
    /// Face-local point id. `0..N` are the polygon vertices, annotations start at `N`.
    PointId,
    "point"
);
id_type!(
    /// Face-local annotation line id.
    LineId,
    "line"
);
id_type!(
    /// Polygon edge index: edge `i` runs from vertex `i` to vertex `(i + 1) % N`.
    EdgeId,
    "edge"
);
id_type!(
    /// Layer-stack component id.
    ComponentId,
    "component"
);
id_type!(
    /// Correlated-edge group id.
    GroupId,
    "group"
);

/// Unordered face pair; stored normalized so `(a, b)` and `(b, a)` compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FacePair(FaceId, FaceId);

impl FacePair {
    #[inline]
    pub fn new(a: FaceId, b: FaceId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
    #[inline]
    pub fn first(&self) -> FaceId {
        self.0
    }
    #[inline]
    pub fn second(&self) -> FaceId {
        self.1
    }
    #[inline]
    pub fn contains(&self, face: FaceId) -> bool {
        self.0 == face || self.1 == face
    }
    /// The partner of `face`, if `face` is one of the two.
    #[inline]
    pub fn other(&self, face: FaceId) -> Option<FaceId> {
        if self.0 == face {
            Some(self.1)
        } else if self.1 == face {
            Some(self.0)
        } else {
            None
        }
    }
}

impl fmt::Display for FacePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.0, self.1)
    }
}

/// A face together with one of its edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceEdge {
    pub face: FaceId,
    pub edge: EdgeId,
}

impl FaceEdge {
    #[inline]
    pub fn new(face: FaceId, edge: EdgeId) -> Self {
        Self { face, edge }
    }
}

impl fmt::Display for FaceEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.face, self.edge)
    }
}
