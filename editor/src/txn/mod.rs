//! An in-memory versioned tree, receiving edits of both flavours.
//!
//! A [MemoryRepository] holds a list of immutable revisions. Revision 0
//! contains an empty root directory. Each edit is applied to a private
//! [MemoryTxn], which is turned into a new revision when the edit
//! completes.
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::editor::CancelHook;
use crate::{
    Editor, EditorConfig, ElRev, ElementEditor, ElementId, Error, NodeContent, NodeKind,
    PathComponent, PathRev, RevNum, Revision, TracingReceiver, ValidateNodeError,
};

mod commit;
mod element;
mod incremental;
mod tree;

pub use tree::{Element, Tree};

struct Inner {
    revisions: Vec<Arc<Tree>>,
    /// The first eid not used in any revision.
    next_eid: u64,
}

/// A repository of committed revisions, kept in memory.
///
/// Cloning is cheap, clones share the same revisions.
#[derive(Clone)]
pub struct MemoryRepository {
    inner: Arc<RwLock<Inner>>,
    config: EditorConfig,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl MemoryRepository {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                revisions: vec![Arc::new(Tree::with_root(0))],
                next_eid: ElementId::ROOT.as_u64() + 1,
            })),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The number of the most recent revision.
    pub fn youngest(&self) -> RevNum {
        // there's always revision 0.
        self.inner.read().revisions.len() as RevNum - 1
    }

    pub fn tree(&self, rev: RevNum) -> Result<Arc<Tree>, Error> {
        usize::try_from(rev)
            .ok()
            .and_then(|rev| self.inner.read().revisions.get(rev).cloned())
            .ok_or_else(|| Error::NotFound(format!("no such revision: r{}", rev)))
    }

    /// Starts a transaction based on the youngest revision.
    pub fn begin_txn(&self) -> MemoryTxn {
        let (base_rev, base, next_eid) = {
            let inner = self.inner.read();
            let base_rev = inner.revisions.len() as RevNum - 1;
            let base = inner.revisions[inner.revisions.len() - 1].clone();
            (base_rev, base, inner.next_eid)
        };
        debug!(base_rev, first_local_eid = next_eid, "beginning txn");

        MemoryTxn {
            repo: self.clone(),
            base_rev,
            working: (*base).clone(),
            base,
            first_local: next_eid,
            next_local: next_eid,
            changes: BTreeMap::new(),
            pending_copies: Vec::new(),
            closed: false,
        }
    }

    /// Starts a path-ordered edit of a new transaction.
    pub fn begin_edit(&self, cancel: Option<CancelHook>) -> Editor {
        let txn = self.begin_txn();
        if self.config.trace {
            Editor::new(Box::new(TracingReceiver::new(txn)), cancel)
        } else {
            Editor::new(Box::new(txn), cancel)
        }
    }

    /// Starts an element-addressed edit of a new transaction.
    pub fn begin_element_edit(&self, cancel: Option<CancelHook>) -> ElementEditor {
        let txn = self.begin_txn();
        let first_local_eid = txn.first_local_eid();
        if self.config.trace {
            ElementEditor::new(Box::new(TracingReceiver::new(txn)), cancel, first_local_eid)
        } else {
            ElementEditor::new(Box::new(txn), cancel, first_local_eid)
        }
    }
}

struct PendingCopy {
    src_el_rev: ElRev,
    parent: ElementId,
    name: PathComponent,
}

/// The state of a single edit of a [MemoryRepository].
///
/// Operations are applied to a private working copy of the base revision.
/// Every changed element is remembered together with the revision the change
/// is based on, so changes can be checked against revisions committed in
/// the meantime.
pub struct MemoryTxn {
    repo: MemoryRepository,
    base_rev: RevNum,
    base: Arc<Tree>,
    first_local: u64,
    next_local: u64,
    working: Tree,
    /// Changed elements, and the revision each change is based on. Elements
    /// missing from the working tree were deleted.
    changes: BTreeMap<ElementId, RevNum>,
    pending_copies: Vec<PendingCopy>,
    closed: bool,
}

impl MemoryTxn {
    pub fn base_rev(&self) -> RevNum {
        self.base_rev
    }

    /// The eids this transaction creates start here.
    pub fn first_local_eid(&self) -> ElementId {
        ElementId::new(self.first_local)
    }

    /// The tree as edited so far.
    pub fn working(&self) -> &Tree {
        &self.working
    }

    fn is_local(&self, eid: ElementId) -> bool {
        eid.as_u64() >= self.first_local
    }

    fn check_open(&self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::StorageError("txn already closed".into()));
        }
        Ok(())
    }

    fn alloc_eid(&mut self) -> ElementId {
        let eid = self.next_local;
        self.next_local += 1;
        ElementId::new(eid)
    }

    /// Records `eid` as changed, based on `since`. Only the first change of
    /// an element counts.
    fn mark_changed(&mut self, eid: ElementId, since: RevNum) {
        self.changes.entry(eid).or_insert(since);
    }

    fn working_element(&self, eid: ElementId) -> Result<&Element, Error> {
        self.working
            .get(eid)
            .ok_or_else(|| Error::NotFound(format!("{} is not present in the txn", eid)))
    }

    /// Looks up the element at `loc` in its committed revision.
    fn committed_element(&self, loc: &PathRev) -> Result<(Arc<Tree>, ElementId), Error> {
        let rev = loc.committed_rev().ok_or_else(|| {
            Error::InvalidArgument(format!("{} is not a committed location", loc))
        })?;
        let tree = self.repo.tree(rev)?;
        let eid = tree
            .lookup(loc.relpath())
            .ok_or_else(|| Error::NotFound(loc.to_string()))?;

        Ok((tree, eid))
    }

    /// Checks `name` can be placed in `parent` in the working tree.
    fn check_new_child(&self, parent: ElementId, name: &PathComponent) -> Result<(), Error> {
        let parent_el = self.working_element(parent)?;
        if parent_el.kind() != NodeKind::Dir {
            return Err(Error::InvalidArgument(format!(
                "{} is not a directory",
                parent
            )));
        }
        if self.working.child_by_name(parent, name).is_some() {
            return Err(Error::AlreadyExists(format!("{} in {}", name, parent)));
        }
        Ok(())
    }

    /// Turns content into what is stored: references are resolved against
    /// the committed node they point to.
    fn materialize(&self, content: &NodeContent) -> Result<NodeContent, Error> {
        let resolved = match content.reference_loc() {
            None => content.clone(),
            Some(loc) => {
                let (tree, eid) = self.committed_element(loc)?;
                let referenced = tree
                    .get(eid)
                    .ok_or_else(|| Error::NotFound(loc.to_string()))?;

                content.resolve(referenced.content())?
            }
        };
        if !resolved.kind().is_known() {
            return Err(ValidateNodeError::UnknownKind.into());
        }

        Ok(resolved)
    }

    /// The location a committed element of `tree` had, in revision `rev`.
    fn location_of(tree: &Tree, rev: RevNum, eid: ElementId) -> Result<PathRev, Error> {
        let relpath = tree
            .path_of(eid)
            .ok_or_else(|| Error::NotFound(format!("{}", ElRev::new(rev, eid))))?;
        Ok(PathRev::new(Revision::Committed(rev), relpath))
    }

    /// Discards all changes.
    #[instrument(level = "trace", skip_all, fields(base_rev = self.base_rev))]
    fn discard(&mut self) {
        self.closed = true;
        self.changes.clear();
        self.pending_copies.clear();
        self.working = (*self.base).clone();
        debug!("txn aborted");
    }
}
