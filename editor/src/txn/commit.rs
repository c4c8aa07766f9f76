use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::{Element, MemoryTxn, Tree};
use crate::{ElementId, Error, RevNum};

impl MemoryTxn {
    /// Checks the change of `eid`, based on `since`, can be applied on top of
    /// `youngest`.
    fn check_up_to_date(
        &self,
        youngest: &Tree,
        eid: ElementId,
        since: RevNum,
    ) -> Result<(), Error> {
        let in_base = self.base.contains(eid);
        match youngest.get(eid) {
            Some(el) if el.last_changed() > since => {
                warn!(%eid, since, changed = el.last_changed(), "element is out of date");
                Err(Error::OutOfDate {
                    eid,
                    since,
                    changed: el.last_changed(),
                })
            }
            Some(_) if !in_base => {
                warn!(%eid, "element was resurrected concurrently");
                Err(Error::Conflict(format!("{} was resurrected concurrently", eid)))
            }
            None if in_base => {
                warn!(%eid, "element was deleted concurrently");
                Err(Error::Conflict(format!("{} was deleted concurrently", eid)))
            }
            _ => Ok(()),
        }
    }

    /// Applies the changes onto the youngest revision and commits the result
    /// as a new revision.
    ///
    /// Local eids are renumbered, as other transactions may have used them
    /// in the meantime. Nothing is committed if any check fails.
    #[instrument(level = "trace", skip_all, fields(base_rev = self.base_rev, changes = self.changes.len()), err)]
    pub(super) fn commit(&mut self) -> Result<RevNum, Error> {
        self.closed = true;

        let mut inner = self.repo.inner.write();
        let youngest = inner
            .revisions
            .last()
            .cloned()
            .ok_or_else(|| Error::StorageError("repository has no revisions".into()))?;
        let new_rev = inner.revisions.len() as RevNum;
        let mut next_eid = inner.next_eid;

        let mut renumbered = BTreeMap::new();
        for eid in self.changes.keys() {
            if self.is_local(*eid) && self.working.contains(*eid) {
                renumbered.insert(*eid, ElementId::new(next_eid));
                next_eid += 1;
            }
        }
        // A local eid without a new number was deleted, or never placed, so
        // nothing may end up underneath it.
        let map = |eid: ElementId| -> Result<ElementId, Error> {
            if !self.is_local(eid) {
                return Ok(eid);
            }
            renumbered.get(&eid).copied().ok_or_else(|| {
                warn!(%eid, "parent is not present in the txn");
                Error::Conflict(format!("parent {} is not present in the txn", eid))
            })
        };

        let mut tree = (*youngest).clone();
        for (&eid, &since) in &self.changes {
            let local = self.is_local(eid);
            if !local {
                self.check_up_to_date(&youngest, eid, since)?;
            }

            match self.working.get(eid) {
                Some(el) => {
                    let mut el = el.clone();
                    el.placement = match el.placement {
                        Some((parent, name)) => Some((map(parent)?, name)),
                        None => None,
                    };
                    el.last_changed = new_rev;
                    tree.insert(map(eid)?, el);
                }
                // created and deleted again.
                None if local => {}
                None => {
                    tree.remove(eid);
                }
            }
        }

        for copy in &self.pending_copies {
            let src_rev = copy.src_el_rev.revision;
            let src_tree = usize::try_from(src_rev)
                .ok()
                .and_then(|rev| inner.revisions.get(rev).cloned())
                .ok_or_else(|| Error::NotFound(format!("no such revision: r{}", src_rev)))?;
            let src_eid = copy.src_el_rev.eid;

            let mut copies = BTreeMap::new();
            for src in std::iter::once(src_eid).chain(src_tree.descendants(src_eid)) {
                let src_el = src_tree
                    .get(src)
                    .ok_or_else(|| Error::NotFound(copy.src_el_rev.to_string()))?;
                let placement = if src == src_eid {
                    (map(copy.parent)?, copy.name.clone())
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

                let eid = ElementId::new(next_eid);
                next_eid += 1;
                copies.insert(src, eid);
                tree.insert(
                    eid,
                    Element {
                        placement: Some(placement),
                        content: src_el.content.clone(),
                        copied_from: Some(Self::location_of(&src_tree, src_rev, src)?),
                        last_changed: new_rev,
                    },
                );
            }
        }

        // Elements only reachable through deleted ones go away with them,
        // unless they were changed after the base revision.
        let reachable = tree.reachable();
        let unreachable: Vec<_> = tree
            .iter()
            .map(|(eid, _)| eid)
            .filter(|eid| !reachable.contains(eid))
            .collect();
        for eid in unreachable {
            let last_changed = tree.get(eid).map(Element::last_changed).unwrap_or_default();
            if last_changed > self.base_rev {
                warn!(%eid, "changed element is orphaned");
                return Err(Error::Conflict(format!(
                    "{} is not reachable from the root",
                    eid
                )));
            }
            tree.remove(eid);
        }

        tree.validate()?;

        inner.revisions.push(Arc::new(tree));
        inner.next_eid = next_eid;
        debug!(rev = new_rev, "committed revision");

        Ok(new_rev)
    }
}
