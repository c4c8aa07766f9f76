//! Independent, element-addressed edits.
//!
//! Every operation names the node-branches it touches by [ElementId], so
//! changes don't depend on each other and may be sent in any order. The
//! structure of the final tree is only checked when the edit completes.
use std::cell::Cell;

use tracing::instrument;

use crate::editor::{CancelHook, Dispatcher, State};
use crate::{ElRev, ElementId, Error, NodeContent, NodeKind, PathComponent, RevNum};

/// The receiving side of an element-addressed edit.
///
/// Every method has a default implementation accepting the call and doing
/// nothing. Eids below the first local eid of the edit name node-branches
/// in the base revision, the others were minted during the edit.
pub trait ElementReceiver {
    /// Create a new node-branch `eid`, unrelated to any other, as `new_name`
    /// in `new_parent_eid`.
    fn add(
        &mut self,
        _eid: ElementId,
        _new_kind: NodeKind,
        _new_parent_eid: ElementId,
        _new_name: &PathComponent,
        _new_content: &NodeContent,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Like [ElementReceiver::add], for an eid reserved earlier.
    fn instantiate(
        &mut self,
        _local_eid: ElementId,
        _new_parent_eid: ElementId,
        _new_name: &PathComponent,
        _new_content: &NodeContent,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Create `local_eid` as a copy of the single element `src_el_rev`.
    /// Without `new_content`, the content of the source is kept.
    fn copy_one(
        &mut self,
        _local_eid: ElementId,
        _src_el_rev: &ElRev,
        _new_parent_eid: ElementId,
        _new_name: &PathComponent,
        _new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Copy the subtree at `src_el_rev`. The new elements get eids when the
    /// edit completes, and can't be addressed during the edit.
    fn copy_tree(
        &mut self,
        _src_el_rev: &ElRev,
        _new_parent_eid: ElementId,
        _new_name: &PathComponent,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Delete the node-branch `eid`, as it was in `since_rev`.
    fn delete(&mut self, _since_rev: RevNum, _eid: ElementId) -> Result<(), Error> {
        Ok(())
    }

    /// Set the position and, with `new_content`, the content of `eid`.
    /// Sending the current state is accepted.
    fn alter(
        &mut self,
        _since_rev: RevNum,
        _eid: ElementId,
        _new_parent_eid: ElementId,
        _new_name: &PathComponent,
        _new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn complete(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn abort(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl<R: ElementReceiver + ?Sized> ElementReceiver for Box<R> {
    fn add(
        &mut self,
        eid: ElementId,
        new_kind: NodeKind,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: &NodeContent,
    ) -> Result<(), Error> {
        (**self).add(eid, new_kind, new_parent_eid, new_name, new_content)
    }

    fn instantiate(
        &mut self,
        local_eid: ElementId,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: &NodeContent,
    ) -> Result<(), Error> {
        (**self).instantiate(local_eid, new_parent_eid, new_name, new_content)
    }

    fn copy_one(
        &mut self,
        local_eid: ElementId,
        src_el_rev: &ElRev,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        (**self).copy_one(local_eid, src_el_rev, new_parent_eid, new_name, new_content)
    }

    fn copy_tree(
        &mut self,
        src_el_rev: &ElRev,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        (**self).copy_tree(src_el_rev, new_parent_eid, new_name)
    }

    fn delete(&mut self, since_rev: RevNum, eid: ElementId) -> Result<(), Error> {
        (**self).delete(since_rev, eid)
    }

    fn alter(
        &mut self,
        since_rev: RevNum,
        eid: ElementId,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        (**self).alter(since_rev, eid, new_parent_eid, new_name, new_content)
    }

    fn complete(&mut self) -> Result<(), Error> {
        (**self).complete()
    }

    fn abort(&mut self) -> Result<(), Error> {
        (**self).abort()
    }
}

/// Drives an [ElementReceiver] through an element-addressed edit, and
/// allocates the local eids of the edit.
///
/// Local eids are handed out in increasing order, starting at the first local
/// eid passed on construction. An eid is valid in this edit if it is below
/// the next eid to be allocated.
pub struct ElementEditor {
    dispatcher: Dispatcher<dyn ElementReceiver>,
    first_local: ElementId,
    next_eid: Cell<u64>,
}

impl ElementEditor {
    pub fn new(
        receiver: Box<dyn ElementReceiver>,
        cancel: Option<CancelHook>,
        first_local_eid: ElementId,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(receiver, cancel),
            first_local: first_local_eid,
            next_eid: Cell::new(first_local_eid.as_u64()),
        }
    }

    pub fn state(&self) -> State {
        self.dispatcher.state()
    }

    pub fn is_finished(&self) -> bool {
        self.dispatcher.is_finished()
    }

    /// Consumes the editor, returning the receiver.
    pub fn into_receiver(self) -> Box<dyn ElementReceiver> {
        self.dispatcher.into_receiver()
    }

    /// Allocates a local eid without creating anything, for later use with
    /// [ElementEditor::instantiate] or [ElementEditor::copy_one].
    pub fn reserve_eid(&self) -> ElementId {
        let eid = self.next_eid.get();
        self.next_eid.set(eid + 1);
        ElementId::new(eid)
    }

    fn check_eid(&self, eid: ElementId) -> Result<(), Error> {
        if eid.as_u64() >= self.next_eid.get() {
            return Err(Error::InvalidArgument(format!("unknown element {}", eid)));
        }
        Ok(())
    }

    fn check_local_eid(&self, eid: ElementId) -> Result<(), Error> {
        self.check_eid(eid)?;
        if eid < self.first_local {
            return Err(Error::InvalidArgument(format!(
                "{} is not a local element of this edit",
                eid
            )));
        }
        Ok(())
    }

    /// Mints a fresh eid and creates a node-branch of `new_kind` with it.
    #[instrument(level = "trace", skip_all, fields(%new_kind, %new_parent_eid, %new_name), err)]
    pub fn add(
        &self,
        new_kind: NodeKind,
        new_parent_eid: ElementId,
        new_name: &str,
        new_content: &NodeContent,
    ) -> Result<ElementId, Error> {
        self.dispatcher.dispatch("add", |r| {
            if !new_kind.is_known() {
                return Err(Error::InvalidArgument(format!(
                    "can not add {} element",
                    new_kind
                )));
            }
            self.check_eid(new_parent_eid)?;
            let new_name = PathComponent::try_from(new_name)?;
            new_content.validate()?;
            new_content.check_kind(new_kind)?;

            // only taken once the receiver accepted the element.
            let eid = ElementId::new(self.next_eid.get());
            r.add(eid, new_kind, new_parent_eid, &new_name, new_content)?;
            self.next_eid.set(eid.as_u64() + 1);

            Ok(eid)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%local_eid, %new_parent_eid, %new_name), err)]
    pub fn instantiate(
        &self,
        local_eid: ElementId,
        new_parent_eid: ElementId,
        new_name: &str,
        new_content: &NodeContent,
    ) -> Result<(), Error> {
        self.dispatcher.dispatch("instantiate", |r| {
            self.check_local_eid(local_eid)?;
            self.check_eid(new_parent_eid)?;
            let new_name = PathComponent::try_from(new_name)?;
            new_content.validate()?;

            r.instantiate(local_eid, new_parent_eid, &new_name, new_content)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%local_eid, %src_el_rev, %new_parent_eid, %new_name), err)]
    pub fn copy_one(
        &self,
        local_eid: ElementId,
        src_el_rev: &ElRev,
        new_parent_eid: ElementId,
        new_name: &str,
        new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        self.dispatcher.dispatch("copy_one", |r| {
            self.check_local_eid(local_eid)?;
            self.check_eid(new_parent_eid)?;
            let new_name = PathComponent::try_from(new_name)?;
            if let Some(content) = new_content {
                content.validate()?;
            }

            r.copy_one(local_eid, src_el_rev, new_parent_eid, &new_name, new_content)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%src_el_rev, %new_parent_eid, %new_name), err)]
    pub fn copy_tree(
        &self,
        src_el_rev: &ElRev,
        new_parent_eid: ElementId,
        new_name: &str,
    ) -> Result<(), Error> {
        self.dispatcher.dispatch("copy_tree", |r| {
            self.check_eid(new_parent_eid)?;
            let new_name = PathComponent::try_from(new_name)?;

            r.copy_tree(src_el_rev, new_parent_eid, &new_name)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%since_rev, %eid), err)]
    pub fn delete(&self, since_rev: RevNum, eid: ElementId) -> Result<(), Error> {
        self.dispatcher.dispatch("delete", |r| {
            self.check_eid(eid)?;
            if eid == ElementId::ROOT {
                return Err(Error::InvalidArgument("can not delete the root".into()));
            }

            r.delete(since_rev, eid)
        })
    }

    #[instrument(level = "trace", skip_all, fields(%since_rev, %eid, %new_parent_eid, %new_name), err)]
    pub fn alter(
        &self,
        since_rev: RevNum,
        eid: ElementId,
        new_parent_eid: ElementId,
        new_name: &str,
        new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        self.dispatcher.dispatch("alter", |r| {
            self.check_eid(eid)?;
            if eid == ElementId::ROOT {
                return Err(Error::InvalidArgument("can not alter the root".into()));
            }
            self.check_eid(new_parent_eid)?;
            let new_name = PathComponent::try_from(new_name)?;
            if let Some(content) = new_content {
                content.validate()?;
            }

            r.alter(since_rev, eid, new_parent_eid, &new_name, new_content)
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
