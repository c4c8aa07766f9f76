//! Ways of addressing a node while a tree is being edited.
//!
//! Path-ordered edits address nodes by [PathRev] and [TxnPath], independent
//! edits address them by [ElementId].
use std::fmt::{self, Display};

use crate::{RelPath, ValidateNodeError};

/// The number of a committed revision.
pub type RevNum = u64;

/// Either a committed revision, or the transaction currently being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Revision {
    Committed(RevNum),
    /// The final state of the transaction being edited.
    InTxn,
}

impl Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Committed(rev) => write!(f, "{}", rev),
            Revision::InTxn => f.write_str("txn"),
        }
    }
}

/// A peg location: a path within a specific, immutable revision, or within
/// the final state of the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathRev {
    revision: Revision,
    relpath: RelPath,
}

impl PathRev {
    pub fn new(revision: Revision, relpath: RelPath) -> Self {
        Self { revision, relpath }
    }

    /// A path in a committed revision, parsing `relpath`.
    pub fn committed(rev: RevNum, relpath: &str) -> Result<Self, ValidateNodeError> {
        Ok(Self::new(Revision::Committed(rev), relpath.parse()?))
    }

    /// A path in the transaction, parsing `relpath`.
    pub fn in_txn(relpath: &str) -> Result<Self, ValidateNodeError> {
        Ok(Self::new(Revision::InTxn, relpath.parse()?))
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn relpath(&self) -> &RelPath {
        &self.relpath
    }

    /// Returns the committed revision, or [None] if this points into the
    /// transaction.
    pub fn committed_rev(&self) -> Option<RevNum> {
        match self.revision {
            Revision::Committed(rev) => Some(rev),
            Revision::InTxn => None,
        }
    }
}

impl Display for PathRev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "^/{}@{}", self.relpath, self.revision)
    }
}

/// A location in the transaction being edited.
///
/// It is found by tracing the node at `peg` forward through the edits made
/// so far (it might have been moved), then descending `relpath` from there.
/// The root of the transaction is `TxnPath::root()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxnPath {
    peg: PathRev,
    relpath: RelPath,
}

impl TxnPath {
    pub fn new(peg: PathRev, relpath: RelPath) -> Self {
        Self { peg, relpath }
    }

    /// The root of the transaction.
    pub fn root() -> Self {
        Self::new(PathRev::new(Revision::InTxn, RelPath::root()), RelPath::root())
    }

    /// The node-branch at `peg` itself, wherever it is now.
    pub fn at(peg: PathRev) -> Self {
        Self::new(peg, RelPath::root())
    }

    /// A path in the final state of the transaction, parsing `relpath`.
    pub fn in_txn(relpath: &str) -> Result<Self, ValidateNodeError> {
        Ok(Self::at(PathRev::in_txn(relpath)?))
    }

    pub fn peg(&self) -> &PathRev {
        &self.peg
    }

    pub fn relpath(&self) -> &RelPath {
        &self.relpath
    }
}

impl Display for TxnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relpath.is_root() {
            write!(f, "{}", self.peg)
        } else {
            write!(f, "{}//{}", self.peg, self.relpath)
        }
    }
}

/// Identifies a node-branch within one edit session, stable across moves
/// and renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// The root directory of every tree.
    pub const ROOT: ElementId = ElementId(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// An element in a committed revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElRev {
    pub revision: RevNum,
    pub eid: ElementId,
}

impl ElRev {
    pub fn new(revision: RevNum, eid: ElementId) -> Self {
        Self { revision, eid }
    }
}

impl Display for ElRev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.eid, self.revision)
    }
}
