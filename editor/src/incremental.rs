//! Path-ordered edits.
//!
//! The sender mutates one evolving transaction tree step by step. Every
//! operation is applied in the order it is sent, and is preconditioned on
//! the shape the tree has at that point.
use tracing::instrument;

use crate::editor::{CancelHook, Dispatcher, State};
use crate::{Error, NodeContent, NodeKind, PathComponent, PathRev, TxnPath};

/// The receiving side of a path-ordered edit.
///
/// Every method has a default implementation accepting the call and doing
/// nothing, so a receiver only implements what it cares about.
pub trait TreeReceiver {
    /// Create a new, empty node-branch of `kind`, unrelated to any other
    /// node, as `new_name` in `parent_loc`. Non-recursive.
    fn mk(
        &mut self,
        _kind: NodeKind,
        _parent_loc: &TxnPath,
        _new_name: &PathComponent,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Copy the subtree at `from_loc` to `new_name` in `parent_loc`. Each node
    /// of the new subtree is copied from the corresponding source node, and
    /// has its content by default.
    fn cp(
        &mut self,
        _from_loc: &PathRev,
        _parent_loc: &TxnPath,
        _new_name: &PathComponent,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Move the node-branch committed at `from_loc`, wherever it currently is
    /// in the transaction, to `new_name` in `new_parent_loc`, together with
    /// everything currently below it.
    fn mv(
        &mut self,
        _from_loc: &PathRev,
        _new_parent_loc: &TxnPath,
        _new_name: &PathComponent,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Resurrect the node-branch committed at `from_loc`, which is not
    /// present in the transaction, as `new_name` in `parent_loc`, with its
    /// content at `from_loc`.
    fn res(
        &mut self,
        _from_loc: &PathRev,
        _parent_loc: &TxnPath,
        _new_name: &PathComponent,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Remove the node-branch at `loc`, and everything currently below it in
    /// the transaction. Nodes moved away from below it are left alone.
    fn rm(&mut self, _loc: &TxnPath) -> Result<(), Error> {
        Ok(())
    }

    /// Replace the content of the node at `loc`. Non-recursive.
    fn put(&mut self, _loc: &TxnPath, _content: &NodeContent) -> Result<(), Error> {
        Ok(())
    }

    fn complete(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn abort(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl<R: TreeReceiver + ?Sized> TreeReceiver for Box<R> {
    fn mk(
        &mut self,
        kind: NodeKind,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        (**self).mk(kind, parent_loc, new_name)
    }

    fn cp(
        &mut self,
        from_loc: &PathRev,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        (**self).cp(from_loc, parent_loc, new_name)
    }

    fn mv(
        &mut self,
        from_loc: &PathRev,
        new_parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        (**self).mv(from_loc, new_parent_loc, new_name)
    }

    fn res(
        &mut self,
        from_loc: &PathRev,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        (**self).res(from_loc, parent_loc, new_name)
    }

    fn rm(&mut self, loc: &TxnPath) -> Result<(), Error> {
        (**self).rm(loc)
    }

    fn put(&mut self, loc: &TxnPath, content: &NodeContent) -> Result<(), Error> {
        (**self).put(loc, content)
    }

    fn complete(&mut self) -> Result<(), Error> {
        (**self).complete()
    }

    fn abort(&mut self) -> Result<(), Error> {
        (**self).abort()
    }
}

/// Drives a [TreeReceiver] through a path-ordered edit.
///
/// Arguments are validated once the call is known to be legal, before
/// anything reaches the receiver; invalid ones are reported as
/// [Error::InvalidArgument]. Exactly one of
/// [Editor::complete] and [Editor::abort] has to be called to end the edit.
pub struct Editor {
    dispatcher: Dispatcher<dyn TreeReceiver>,
}

fn parse_name(new_name: &str) -> Result<PathComponent, Error> {
    Ok(PathComponent::try_from(new_name)?)
}

fn require_committed(op: &str, loc: &PathRev) -> Result<(), Error> {
    if loc.committed_rev().is_none() {
        return Err(Error::InvalidArgument(format!(
            "{} source must be a committed location, got {}",
            op, loc
        )));
    }
    Ok(())
}

impl Editor {
    pub fn new(receiver: Box<dyn TreeReceiver>, cancel: Option<CancelHook>) -> Self {
        Self {
            dispatcher: Dispatcher::new(receiver, cancel),
        }
    }

    pub fn state(&self) -> State {
        self.dispatcher.state()
    }

    pub fn is_finished(&self) -> bool {
        self.dispatcher.is_finished()
    }

    /// Consumes the editor, returning the receiver.
    pub fn into_receiver(self) -> Box<dyn TreeReceiver> {
        self.dispatcher.into_receiver()
    }

    #[instrument(level = "trace", skip_all, fields(%kind, %parent_loc, %new_name), err)]
    pub fn mk(&self, kind: NodeKind, parent_loc: &TxnPath, new_name: &str) -> Result<(), Error> {
        self.dispatcher.dispatch("mk", |r| {
            if !kind.is_known() {
                return Err(Error::InvalidArgument(format!("can not create {} node", kind)));
            }
            let new_name = parse_name(new_name)?;
            r.mk(kind, parent_loc, &new_name)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%from_loc, %parent_loc, %new_name), err)]
    pub fn cp(
        &self,
        from_loc: &PathRev,
        parent_loc: &TxnPath,
        new_name: &str,
    ) -> Result<(), Error> {
        self.dispatcher.dispatch("cp", |r| {
            let new_name = parse_name(new_name)?;
            r.cp(from_loc, parent_loc, &new_name)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%from_loc, %new_parent_loc, %new_name), err)]
    pub fn mv(
        &self,
        from_loc: &PathRev,
        new_parent_loc: &TxnPath,
        new_name: &str,
    ) -> Result<(), Error> {
        self.dispatcher.dispatch("mv", |r| {
            require_committed("mv", from_loc)?;
            let new_name = parse_name(new_name)?;
            r.mv(from_loc, new_parent_loc, &new_name)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%from_loc, %parent_loc, %new_name), err)]
    pub fn res(
        &self,
        from_loc: &PathRev,
        parent_loc: &TxnPath,
        new_name: &str,
    ) -> Result<(), Error> {
        self.dispatcher.dispatch("res", |r| {
            require_committed("res", from_loc)?;
            let new_name = parse_name(new_name)?;
            r.res(from_loc, parent_loc, &new_name)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%loc), err)]
    pub fn rm(&self, loc: &TxnPath) -> Result<(), Error> {
        self.dispatcher.dispatch("rm", |r| r.rm(loc))
    }

    /// Senders should send content at most once per node-branch, and avoid
    /// sending content that doesn't change anything. Receivers accept both.
    #[instrument(level = "trace", skip_all, fields(%loc, %content), err)]
    pub fn put(&self, loc: &TxnPath, content: &NodeContent) -> Result<(), Error> {
        self.dispatcher.dispatch("put", |r| {
            content.validate()?;
            r.put(loc, content)
        })
    }

    /// Finishes the edit successfully. The editor can't be used afterwards,
    /// even if this returns an error.
    pub fn complete(&self) -> Result<(), Error> {
        self.dispatcher.finish("complete", |r| r.complete())
    }

    /// Discards the edit. The editor can't be used afterwards, even if this
    /// returns an error.
    pub fn abort(&self) -> Result<(), Error> {
        self.dispatcher.finish("abort", |r| r.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::{Editor, TreeReceiver};
    use crate::fixtures::{DIR_CONTENT, TRUNK_R1};
    use crate::{Error, NodeKind, PathRev, TxnPath};

    struct Nothing;
    impl TreeReceiver for Nothing {}

    #[test]
    fn no_op_receiver_accepts_everything() {
        let editor = Editor::new(Box::new(Nothing), None);
        let root = TxnPath::root();

        editor.mk(NodeKind::Dir, &root, "trunk").unwrap();
        editor.cp(&TRUNK_R1, &root, "branch").unwrap();
        editor.mv(&TRUNK_R1, &root, "moved").unwrap();
        editor.res(&TRUNK_R1, &root, "back").unwrap();
        editor.rm(&TxnPath::at(TRUNK_R1.clone())).unwrap();
        editor.put(&root, &DIR_CONTENT).unwrap();
        editor.complete().unwrap();

        assert!(editor.is_finished());
    }

    #[test]
    fn no_op_receiver_accepts_abort() {
        let editor = Editor::new(Box::new(Nothing), None);
        editor.abort().unwrap();
        assert!(editor.is_finished());
    }

    #[test]
    fn reject_unknown_kind() {
        let editor = Editor::new(Box::new(Nothing), None);
        assert!(matches!(
            editor.mk(NodeKind::Unknown, &TxnPath::root(), "x"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn reject_invalid_name() {
        let editor = Editor::new(Box::new(Nothing), None);
        assert!(matches!(
            editor.mk(NodeKind::Dir, &TxnPath::root(), "a/b"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            editor.cp(&TRUNK_R1, &TxnPath::root(), ".."),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn reject_move_from_txn() {
        let editor = Editor::new(Box::new(Nothing), None);
        let from = PathRev::in_txn("trunk").unwrap();

        assert!(matches!(
            editor.mv(&from, &TxnPath::root(), "x"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            editor.res(&from, &TxnPath::root(), "x"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
