use tracing::debug;

use crate::{
    ElRev, ElementId, ElementReceiver, Error, NodeContent, NodeKind, PathComponent, PathRev,
    RevNum, TreeReceiver, TxnPath,
};

/// Logs every operation at debug level, under the `editor::trace` target,
/// then forwards it to the wrapped receiver.
///
/// Results are passed through unchanged.
pub struct TracingReceiver<R> {
    inner: R,
}

impl<R> TracingReceiver<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

fn opt_content(content: Option<&NodeContent>) -> String {
    match content {
        Some(content) => content.to_string(),
        None => "(unchanged)".to_string(),
    }
}

impl<R: TreeReceiver> TreeReceiver for TracingReceiver<R> {
    fn mk(
        &mut self,
        kind: NodeKind,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        debug!(target: "editor::trace", "mk({}, {}, {})", kind, parent_loc, new_name);
        self.inner.mk(kind, parent_loc, new_name)
    }

    fn cp(
        &mut self,
        from_loc: &PathRev,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        debug!(target: "editor::trace", "cp({}, {}, {})", from_loc, parent_loc, new_name);
        self.inner.cp(from_loc, parent_loc, new_name)
    }

    fn mv(
        &mut self,
        from_loc: &PathRev,
        new_parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        debug!(target: "editor::trace", "mv({}, {}, {})", from_loc, new_parent_loc, new_name);
        self.inner.mv(from_loc, new_parent_loc, new_name)
    }

    fn res(
        &mut self,
        from_loc: &PathRev,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        debug!(target: "editor::trace", "res({}, {}, {})", from_loc, parent_loc, new_name);
        self.inner.res(from_loc, parent_loc, new_name)
    }

    fn rm(&mut self, loc: &TxnPath) -> Result<(), Error> {
        debug!(target: "editor::trace", "rm({})", loc);
        self.inner.rm(loc)
    }

    fn put(&mut self, loc: &TxnPath, content: &NodeContent) -> Result<(), Error> {
        debug!(target: "editor::trace", "put({}, {})", loc, content);
        self.inner.put(loc, content)
    }

    fn complete(&mut self) -> Result<(), Error> {
        debug!(target: "editor::trace", "complete()");
        TreeReceiver::complete(&mut self.inner)
    }

    fn abort(&mut self) -> Result<(), Error> {
        debug!(target: "editor::trace", "abort()");
        TreeReceiver::abort(&mut self.inner)
    }
}

impl<R: ElementReceiver> ElementReceiver for TracingReceiver<R> {
    fn add(
        &mut self,
        eid: ElementId,
        new_kind: NodeKind,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: &NodeContent,
    ) -> Result<(), Error> {
        debug!(
            target: "editor::trace",
            "add({}, {}, {}, {}, {})", eid, new_kind, new_parent_eid, new_name, new_content
        );
        self.inner
            .add(eid, new_kind, new_parent_eid, new_name, new_content)
    }

    fn instantiate(
        &mut self,
        local_eid: ElementId,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: &NodeContent,
    ) -> Result<(), Error> {
        debug!(
            target: "editor::trace",
            "instantiate({}, {}, {}, {})", local_eid, new_parent_eid, new_name, new_content
        );
        self.inner
            .instantiate(local_eid, new_parent_eid, new_name, new_content)
    }

    fn copy_one(
        &mut self,
        local_eid: ElementId,
        src_el_rev: &ElRev,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        debug!(
            target: "editor::trace",
            "copy_one({}, {}, {}, {}, {})",
            local_eid,
            src_el_rev,
            new_parent_eid,
            new_name,
            opt_content(new_content)
        );
        self.inner
            .copy_one(local_eid, src_el_rev, new_parent_eid, new_name, new_content)
    }

    fn copy_tree(
        &mut self,
        src_el_rev: &ElRev,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        debug!(
            target: "editor::trace",
            "copy_tree({}, {}, {})", src_el_rev, new_parent_eid, new_name
        );
        self.inner.copy_tree(src_el_rev, new_parent_eid, new_name)
    }

    fn delete(&mut self, since_rev: RevNum, eid: ElementId) -> Result<(), Error> {
        debug!(target: "editor::trace", "delete(r{}, {})", since_rev, eid);
        self.inner.delete(since_rev, eid)
    }

    fn alter(
        &mut self,
        since_rev: RevNum,
        eid: ElementId,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        debug!(
            target: "editor::trace",
            "alter(r{}, {}, {}, {}, {})",
            since_rev,
            eid,
            new_parent_eid,
            new_name,
            opt_content(new_content)
        );
        self.inner
            .alter(since_rev, eid, new_parent_eid, new_name, new_content)
    }

    fn complete(&mut self) -> Result<(), Error> {
        debug!(target: "editor::trace", "complete()");
        ElementReceiver::complete(&mut self.inner)
    }

    fn abort(&mut self) -> Result<(), Error> {
        debug!(target: "editor::trace", "abort()");
        ElementReceiver::abort(&mut self.inner)
    }
}
