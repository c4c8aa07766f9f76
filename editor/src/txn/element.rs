use tracing::instrument;

use super::{Element, MemoryTxn, PendingCopy};
use crate::{
    ElRev, ElementId, ElementReceiver, Error, NodeContent, NodeKind, PathComponent, PathRev,
    RevNum,
};

impl MemoryTxn {
    /// Creates the local element `eid`. Structure is only checked on commit.
    fn place_new(
        &mut self,
        eid: ElementId,
        parent: ElementId,
        name: &PathComponent,
        content: NodeContent,
        copied_from: Option<PathRev>,
    ) -> Result<(), Error> {
        if !self.is_local(eid) {
            return Err(Error::InvalidArgument(format!(
                "{} is not a local element of this txn",
                eid
            )));
        }
        if self.changes.contains_key(&eid) {
            return Err(Error::AlreadyExists(format!("{} was already used", eid)));
        }

        self.working.insert(
            eid,
            Element {
                placement: Some((parent, name.clone())),
                content,
                copied_from,
                last_changed: self.base_rev,
            },
        );
        self.next_local = self.next_local.max(eid.as_u64() + 1);
        self.mark_changed(eid, self.base_rev);

        Ok(())
    }
}

impl ElementReceiver for MemoryTxn {
    #[instrument(level = "trace", skip_all, fields(%eid, %new_kind, %new_parent_eid, %new_name), err)]
    fn add(
        &mut self,
        eid: ElementId,
        new_kind: NodeKind,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: &NodeContent,
    ) -> Result<(), Error> {
        self.check_open()?;
        let content = self.materialize(new_content)?;
        content.check_kind(new_kind)?;

        self.place_new(eid, new_parent_eid, new_name, content, None)
    }

    #[instrument(level = "trace", skip_all, fields(%local_eid, %new_parent_eid, %new_name), err)]
    fn instantiate(
        &mut self,
        local_eid: ElementId,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: &NodeContent,
    ) -> Result<(), Error> {
        self.check_open()?;
        let content = self.materialize(new_content)?;

        self.place_new(local_eid, new_parent_eid, new_name, content, None)
    }

    #[instrument(level = "trace", skip_all, fields(%local_eid, %src_el_rev, %new_parent_eid, %new_name), err)]
    fn copy_one(
        &mut self,
        local_eid: ElementId,
        src_el_rev: &ElRev,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        self.check_open()?;
        let src_tree = self.repo.tree(src_el_rev.revision)?;
        let src_el = src_tree
            .get(src_el_rev.eid)
            .ok_or_else(|| Error::NotFound(src_el_rev.to_string()))?;

        let content = match new_content {
            Some(new_content) => {
                let content = self.materialize(new_content)?;
                content.check_kind(src_el.kind())?;
                content
            }
            None => src_el.content.clone(),
        };
        let copied_from = Self::location_of(&src_tree, src_el_rev.revision, src_el_rev.eid)?;

        self.place_new(
            local_eid,
            new_parent_eid,
            new_name,
            content,
            Some(copied_from),
        )
    }

    #[instrument(level = "trace", skip_all, fields(%src_el_rev, %new_parent_eid, %new_name), err)]
    fn copy_tree(
        &mut self,
        src_el_rev: &ElRev,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
    ) -> Result<(), Error> {
        self.check_open()?;
        if !self.repo.tree(src_el_rev.revision)?.contains(src_el_rev.eid) {
            return Err(Error::NotFound(src_el_rev.to_string()));
        }

        self.pending_copies.push(PendingCopy {
            src_el_rev: *src_el_rev,
            parent: new_parent_eid,
            name: new_name.clone(),
        });

        Ok(())
    }

    #[instrument(level = "trace", skip_all, fields(%since_rev, %eid), err)]
    fn delete(&mut self, since_rev: RevNum, eid: ElementId) -> Result<(), Error> {
        self.check_open()?;
        if eid == ElementId::ROOT {
            return Err(Error::InvalidArgument("can not delete the root".into()));
        }
        self.working_element(eid)?;

        // Children are left in place, unchanged ones get purged on commit.
        self.working.remove(eid);
        self.mark_changed(eid, since_rev);

        Ok(())
    }

    #[instrument(level = "trace", skip_all, fields(%since_rev, %eid, %new_parent_eid, %new_name), err)]
    fn alter(
        &mut self,
        since_rev: RevNum,
        eid: ElementId,
        new_parent_eid: ElementId,
        new_name: &PathComponent,
        new_content: Option<&NodeContent>,
    ) -> Result<(), Error> {
        self.check_open()?;
        if eid == ElementId::ROOT {
            return Err(Error::InvalidArgument("can not alter the root".into()));
        }
        let el = self.working_element(eid)?;

        let content = match new_content {
            Some(new_content) => {
                let content = self.materialize(new_content)?;
                content.check_kind(el.kind())?;
                content
            }
            None => el.content.clone(),
        };
        let placement = Some((new_parent_eid, new_name.clone()));
        if el.placement == placement && el.content == content {
            return Ok(());
        }

        if let Some(el) = self.working.get_mut(eid) {
            el.placement = placement;
            el.content = content;
        }
        self.mark_changed(eid, since_rev);

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

#[cfg(test)]
mod tests {
    use crate::fixtures::{DIR_CONTENT, FILE_CONTENT_V1, FILE_CONTENT_V2};
    use crate::{
        ElRev, ElementId, ElementReceiver, Error, MemoryRepository, NodeKind, PathComponent,
        PathRev,
    };

    fn name(s: &str) -> PathComponent {
        PathComponent::try_from(s).unwrap()
    }

    /// r1: /trunk (e1), /trunk/a (e2)
    fn repo_r1() -> MemoryRepository {
        let repo = MemoryRepository::default();
        let mut txn = repo.begin_txn();
        txn.add(
            ElementId::new(1),
            NodeKind::Dir,
            ElementId::ROOT,
            &name("trunk"),
            &DIR_CONTENT,
        )
        .unwrap();
        txn.add(
            ElementId::new(2),
            NodeKind::File,
            ElementId::new(1),
            &name("a"),
            &FILE_CONTENT_V1,
        )
        .unwrap();
        txn.complete().unwrap();

        repo
    }

    #[test]
    fn add_commits_with_given_eids() {
        let repo = repo_r1();
        let r1 = repo.tree(1).unwrap();

        assert_eq!(
            Some(ElementId::new(2)),
            r1.lookup(&"trunk/a".parse().unwrap())
        );
        assert_eq!(*FILE_CONTENT_V1, *r1.get(ElementId::new(2)).unwrap().content());
        assert_eq!(1, r1.get(ElementId::new(2)).unwrap().last_changed());
    }

    #[test]
    fn eids_can_not_be_reused() {
        let repo = repo_r1();
        let mut txn = repo.begin_txn();
        let eid = txn.first_local_eid();

        txn.add(eid, NodeKind::Dir, ElementId::ROOT, &name("x"), &DIR_CONTENT)
            .unwrap();
        txn.delete(1, eid).unwrap();
        assert!(matches!(
            txn.add(eid, NodeKind::Dir, ElementId::ROOT, &name("y"), &DIR_CONTENT),
            Err(Error::AlreadyExists(_))
        ));
        assert!(matches!(
            txn.add(
                ElementId::new(1),
                NodeKind::Dir,
                ElementId::ROOT,
                &name("z"),
                &DIR_CONTENT
            ),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn copy_one_keeps_source_content() {
        let repo = repo_r1();
        let mut txn = repo.begin_txn();
        let eid = txn.first_local_eid();

        txn.copy_one(
            eid,
            &ElRev::new(1, ElementId::new(2)),
            ElementId::ROOT,
            &name("b"),
            None,
        )
        .unwrap();

        let el = txn.working().get(eid).unwrap();
        assert_eq!(*FILE_CONTENT_V1, *el.content());
        assert_eq!(
            Some(&PathRev::committed(1, "trunk/a").unwrap()),
            el.copied_from()
        );
    }

    #[test]
    fn copy_of_missing_element() {
        let repo = repo_r1();
        let mut txn = repo.begin_txn();

        assert!(matches!(
            txn.copy_tree(&ElRev::new(1, ElementId::new(9)), ElementId::ROOT, &name("x")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            txn.copy_tree(&ElRev::new(7, ElementId::new(1)), ElementId::ROOT, &name("x")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn alter_without_change_is_accepted() {
        let repo = repo_r1();
        let mut txn = repo.begin_txn();

        txn.alter(1, ElementId::new(2), ElementId::new(1), &name("a"), None)
            .unwrap();
        txn.alter(
            1,
            ElementId::new(2),
            ElementId::new(1),
            &name("a"),
            Some(&FILE_CONTENT_V1),
        )
        .unwrap();

        assert_eq!(*repo.tree(1).unwrap(), *txn.working());
    }

    #[test]
    fn alter_changes_content_and_position() {
        let repo = repo_r1();
        let mut txn = repo.begin_txn();

        txn.alter(
            1,
            ElementId::new(2),
            ElementId::ROOT,
            &name("a2"),
            Some(&FILE_CONTENT_V2),
        )
        .unwrap();
        txn.complete().unwrap();

        let r2 = repo.tree(2).unwrap();
        assert_eq!(
            Some(ElementId::new(2)),
            r2.lookup(&"a2".parse().unwrap())
        );
        assert_eq!(*FILE_CONTENT_V2, *r2.get(ElementId::new(2)).unwrap().content());
        assert_eq!(2, r2.get(ElementId::new(2)).unwrap().last_changed());
        assert_eq!(1, r2.get(ElementId::new(1)).unwrap().last_changed());
    }

    #[test]
    fn alter_rejects_kind_change() {
        let repo = repo_r1();
        let mut txn = repo.begin_txn();

        assert!(matches!(
            txn.alter(
                1,
                ElementId::new(1),
                ElementId::ROOT,
                &name("trunk"),
                Some(&FILE_CONTENT_V2)
            ),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn delete_missing_element() {
        let repo = repo_r1();
        let mut txn = repo.begin_txn();

        assert!(matches!(
            txn.delete(1, ElementId::new(9)),
            Err(Error::NotFound(_))
        ));
    }
}
