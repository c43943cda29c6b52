//! Endpoint marks of the mixed-mark candidate graph.

use serde::{Deserialize, Serialize};
use super::VarId;

/// Mark at one end of a link.
///
/// A link `a — b` carries two independent marks, one at each end. The
/// notation `a o-> b` reads: circle at `a`, arrowhead at `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mark {
    /// Plain line end (no arrowhead).
    Tail,
    /// Arrowhead pointing into this end.
    Arrow,
    /// Undetermined.
    Circle,
}

impl Mark {
    /// Glyph used when the mark sits at the left end of a rendered link.
    pub fn left_glyph(self) -> char {
        match self {
            Mark::Tail => '-',
            Mark::Arrow => '<',
            Mark::Circle => 'o',
        }
    }

    /// Glyph used when the mark sits at the right end of a rendered link.
    pub fn right_glyph(self) -> char {
        match self {
            Mark::Tail => '-',
            Mark::Arrow => '>',
            Mark::Circle => 'o',
        }
    }

    /// Three-character connector for a link with `left` and `right` end
    /// marks (`o->`, `---`, ...).
    pub fn connector(left: Mark, right: Mark) -> String {
        format!("{}-{}", left.left_glyph(), right.right_glyph())
    }

    /// Graphviz arrow shape for this mark.
    pub fn dot_shape(self) -> &'static str {
        match self {
            Mark::Tail => "none",
            Mark::Arrow => "normal",
            Mark::Circle => "odot",
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::Tail => write!(f, "tail"),
            Mark::Arrow => write!(f, "arrow"),
            Mark::Circle => write!(f, "circle"),
        }
    }
}

/// A surviving link with its endpoint marks, normalized so that `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub a: VarId,
    pub b: VarId,
    /// Mark at the `a` end.
    pub mark_a: Mark,
    /// Mark at the `b` end.
    pub mark_b: Mark,
}

impl Link {
    pub fn pair(&self) -> (VarId, VarId) {
        (self.a, self.b)
    }

    /// Both ends are plain tails.
    pub fn is_undirected(&self) -> bool {
        self.mark_a == Mark::Tail && self.mark_b == Mark::Tail
    }

    pub fn connector(&self) -> String {
        Mark::connector(self.mark_a, self.mark_b)
    }
}

/// Normalize an unordered pair so that the smaller index comes first.
#[inline]
pub fn ordered_pair(i: VarId, j: VarId) -> (VarId, VarId) {
    if i <= j { (i, j) } else { (j, i) }
}
