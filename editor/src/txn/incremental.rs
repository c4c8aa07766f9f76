use std::collections::BTreeMap;

use tracing::{instrument, warn};

use super::{Element, MemoryTxn};
use crate::{
    ElementId, Error, NodeContent, NodeKind, PathComponent, PathRev, ResurrectPolicy, Revision,
    TreeReceiver, TxnPath, ValidateNodeError,
};

impl MemoryTxn {
    /// Finds the element at `loc` in the working tree: the element committed
    /// at the peg, wherever it is now, then `relpath` below it.
    fn resolve(&self, loc: &TxnPath) -> Result<ElementId, Error> {
        let peg = loc.peg();
        let peg_eid = match peg.revision() {
            Revision::Committed(_) => {
                let (_, eid) = self.committed_element(peg)?;
                self.working_element(eid)?;
                eid
            }
            Revision::InTxn => self
                .working
                .lookup(peg.relpath())
                .ok_or_else(|| Error::NotFound(peg.to_string()))?,
        };

        self.working
            .lookup_from(peg_eid, loc.relpath())
            .ok_or_else(|| Error::NotFound(loc.to_string()))
    }

    /// Places the existing element `eid` as `name` in `parent`.
    fn relocate(
        &mut self,
        eid: ElementId,
        parent: ElementId,
        name: &PathComponent,
    ) -> Result<(), Error> {
        if eid == ElementId::ROOT {
            return Err(Error::InvalidArgument("can not move the root".into()));
        }
        if self.working.is_within(parent, eid) {
            return Err(Error::InvalidArgument(format!(
                "can not move {} into itself",
                eid
            )));
        }

        let placement = Some((parent, name.clone()));
        if self.working_element(eid)?.placement == placement {
            return Ok(());
        }
        self.check_new_child(parent, name)?;

        if let Some(el) = self.working.get_mut(eid) {
            el.placement = placement;
        }
        self.mark_changed(eid, self.base_rev);

        Ok(())
    }
}

impl TreeReceiver for MemoryTxn {
    #[instrument(level = "trace", skip_all, fields(%kind, %parent_loc, %new_name), err)]
    fn mk(
        &mut self,
        kind: NodeKind,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        self.check_open()?;
        if !kind.is_known() {
            return Err(ValidateNodeError::UnknownKind.into());
        }
        let parent = self.resolve(parent_loc)?;
        self.check_new_child(parent, new_name)?;

        let eid = self.alloc_eid();
        self.working.insert(
            eid,
            Element {
                placement: Some((parent, new_name.clone())),
                content: NodeContent::empty(kind),
                copied_from: None,
                last_changed: self.base_rev,
            },
        );
        self.mark_changed(eid, self.base_rev);

        Ok(())
    }

    #[instrument(level = "trace", skip_all, fields(%from_loc, %parent_loc, %new_name), err)]
    fn cp(
        &mut self,
        from_loc: &PathRev,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        self.check_open()?;
        let Some(rev) = from_loc.committed_rev() else {
            return Err(Error::InvalidArgument(format!(
                "copying from the txn is not supported: {}",
                from_loc
            )));
        };
        let (src_tree, src_eid) = self.committed_element(from_loc)?;
        let parent = self.resolve(parent_loc)?;
        self.check_new_child(parent, new_name)?;

        // Every copied element is placed below the copy of its source parent.
        let mut copies = BTreeMap::new();
        let sources = std::iter::once(src_eid).chain(src_tree.descendants(src_eid));
        for src in sources {
            let src_el = src_tree
                .get(src)
                .ok_or_else(|| Error::StorageError(format!("{} vanished from r{}", src, rev)))?;
            let placement = if src == src_eid {
                (parent, new_name.clone())
            } else {
                let (src_parent, name) = src_el
                    .placement
                    .as_ref()
                    .ok_or_else(|| Error::StorageError(format!("{} is not placed", src)))?;
                let parent = copies.get(src_parent).copied().ok_or_else(|| {
                    Error::StorageError(format!("parent of {} was not copied", src))
                })?;
                (parent, name.clone())
            };

            let eid = self.alloc_eid();
            copies.insert(src, eid);
            self.working.insert(
                eid,
                Element {
                    placement: Some(placement),
                    content: src_el.content.clone(),
                    copied_from: Some(Self::location_of(&src_tree, rev, src)?),
                    last_changed: self.base_rev,
                },
            );
            self.mark_changed(eid, self.base_rev);
        }

        Ok(())
    }

    #[instrument(level = "trace", skip_all, fields(%from_loc, %new_parent_loc, %new_name), err)]
    fn mv(
        &mut self,
        from_loc: &PathRev,
        new_parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        self.check_open()?;
        let (_, eid) = self.committed_element(from_loc)?;
        self.working_element(eid)?;
        let parent = self.resolve(new_parent_loc)?;

        self.relocate(eid, parent, new_name)
    }

    #[instrument(level = "trace", skip_all, fields(%from_loc, %parent_loc, %new_name), err)]
    fn res(
        &mut self,
        from_loc: &PathRev,
        parent_loc: &TxnPath,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        self.check_open()?;
        let (src_tree, eid) = self.committed_element(from_loc)?;
        let content = src_tree
            .get(eid)
            .ok_or_else(|| Error::NotFound(from_loc.to_string()))?
            .content
            .clone();
        let parent = self.resolve(parent_loc)?;

        if self.working.contains(eid) {
            return match self.repo.config().resurrect {
                ResurrectPolicy::Reject => {
                    warn!(%from_loc, %eid, "node-branch to resurrect is present");
                    Err(Error::AlreadyExists(format!(
                        "{} is present in the txn",
                        from_loc
                    )))
                }
                ResurrectPolicy::Alter => {
                    self.relocate(eid, parent, new_name)?;
                    if let Some(el) = self.working.get_mut(eid) {
                        el.content = content;
                    }
                    self.mark_changed(eid, self.base_rev);
                    Ok(())
                }
            };
        }

        self.check_new_child(parent, new_name)?;
        self.working.insert(
            eid,
            Element {
                placement: Some((parent, new_name.clone())),
                content,
                copied_from: None,
                last_changed: self.base_rev,
            },
        );
        self.mark_changed(eid, self.base_rev);

        Ok(())
    }

    #[instrument(level = "trace", skip_all, fields(%loc), err)]
    fn rm(&mut self, loc: &TxnPath) -> Result<(), Error> {
        self.check_open()?;
        let eid = self.resolve(loc)?;
        if eid == ElementId::ROOT {
            return Err(Error::InvalidArgument("can not remove the root".into()));
        }

        // What was moved away from below is not a descendant anymore.
        let doomed: Vec<_> = std::iter::once(eid)
            .chain(self.working.descendants(eid))
            .collect();
        for eid in doomed {
            self.working.remove(eid);
            self.mark_changed(eid, self.base_rev);
        }

        Ok(())
    }

    #[instrument(level = "trace", skip_all, fields(%loc, %content), err)]
    fn put(&mut self, loc: &TxnPath, content: &NodeContent) -> Result<(), Error> {
        self.check_open()?;
        let eid = self.resolve(loc)?;
        let content = self.materialize(content)?;

        let el = self.working_element(eid)?;
        content.check_kind(el.kind())?;
        if el.content == content {
            return Ok(());
        }

        if let Some(el) = self.working.get_mut(eid) {
            el.content = content;
        }
        self.mark_changed(eid, self.base_rev);

        Ok(())
    }

    fn complete(&mut self) -> Result<(), Error> {
        self.check_open()?;
        self.commit().map(|_| ())
    }

    fn abort(&mut self) -> Result<(), Error> {
        self.check_open()?;
        self.discard();
        Ok(())
    }
}
