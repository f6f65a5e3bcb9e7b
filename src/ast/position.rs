use std::fmt;
use std::ops::Add;

/// Byte offset into the original source text.
///
/// Offsets are zero-based and always refer to the unmodified input; nodes
/// produced by a replacer carry the anchor offset they were generated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pos(pub usize);

impl Pos {
    pub fn offset(self) -> usize {
        self.0
    }
}

impl Add<usize> for Pos {
    type Output = Pos;

    fn add(self, rhs: usize) -> Pos {
        Pos(self.0 + rhs)
    }
}

impl From<usize> for Pos {
    fn from(offset: usize) -> Self {
        Pos(offset)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A half-open byte range `[pos, end)` over the original source.
///
/// A region with `pos > end` is degenerate: it does not describe any span of
/// text and is rejected by the change ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub pos: Pos,
    pub end: Pos,
}

impl Region {
    pub fn new(pos: Pos, end: Pos) -> Self {
        Region { pos, end }
    }

    /// Empty region located at `pos`.
    pub fn at(pos: Pos) -> Self {
        Region { pos, end: pos }
    }

    pub fn is_degenerate(&self) -> bool {
        self.pos > self.end
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.0.saturating_sub(self.pos.0)
    }

    /// Whether the two regions share at least one byte.
    pub fn overlaps(&self, other: &Region) -> bool {
        !self.is_empty() && !other.is_empty() && self.pos < other.end && other.pos < self.end
    }

    /// Whether `other` lies entirely inside this region.
    pub fn contains(&self, other: &Region) -> bool {
        self.pos <= other.pos && other.end <= self.end
    }

    /// Smallest region covering both inputs.
    pub fn join(&self, other: &Region) -> Region {
        Region {
            pos: self.pos.min(other.pos),
            end: self.end.max(other.end),
        }
    }

    /// The source text covered by this region, if it lies within `source`.
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        if self.is_degenerate() {
            return None;
        }
        source.get(self.pos.0..self.end.0)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.pos.0, self.end.0)
    }
}
