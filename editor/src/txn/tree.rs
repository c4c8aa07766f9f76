use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::warn;

use crate::{ElementId, Error, NodeContent, NodeKind, PathComponent, PathRev, RelPath, RevNum};

/// A node-branch in a tree: where it is placed, and what it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Parent and name. [None] only for the root.
    pub(crate) placement: Option<(ElementId, PathComponent)>,
    /// Always of a known kind, and never carrying a reference.
    pub(crate) content: NodeContent,
    pub(crate) copied_from: Option<PathRev>,
    pub(crate) last_changed: RevNum,
}

impl Element {
    pub fn parent(&self) -> Option<ElementId> {
        self.placement.as_ref().map(|(parent, _)| *parent)
    }

    pub fn name(&self) -> Option<&PathComponent> {
        self.placement.as_ref().map(|(_, name)| name)
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn kind(&self) -> NodeKind {
        self.content.kind()
    }

    /// Where this node-branch was copied from, if it was created by a copy.
    pub fn copied_from(&self) -> Option<&PathRev> {
        self.copied_from.as_ref()
    }

    /// The revision this node-branch was last changed in.
    pub fn last_changed(&self) -> RevNum {
        self.last_changed
    }
}

/// A tree of elements, stored as an arena keyed by [ElementId].
///
/// Parent-child edges are only stored on the child. Committed trees are
/// kept consistent: every element except the root is reachable from the
/// root, names are unique per directory, and only directories have
/// children. Trees under construction may violate this until
/// [Tree::validate] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    elements: BTreeMap<ElementId, Element>,
}

impl Tree {
    /// A tree containing only an empty root directory.
    pub fn with_root(rev: RevNum) -> Self {
        let mut tree = Self::default();
        tree.elements.insert(
            ElementId::ROOT,
            Element {
                placement: None,
                content: NodeContent::empty(NodeKind::Dir),
                copied_from: None,
                last_changed: rev,
            },
        );
        tree
    }

    pub fn get(&self, eid: ElementId) -> Option<&Element> {
        self.elements.get(&eid)
    }

    pub(crate) fn get_mut(&mut self, eid: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&eid)
    }

    pub fn contains(&self, eid: ElementId) -> bool {
        self.elements.contains_key(&eid)
    }

    pub(crate) fn insert(&mut self, eid: ElementId, element: Element) {
        self.elements.insert(eid, element);
    }

    pub(crate) fn remove(&mut self, eid: ElementId) -> Option<Element> {
        self.elements.remove(&eid)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter().map(|(eid, el)| (*eid, el))
    }

    /// Returns the elements placed directly in `parent`.
    pub fn children(&self, parent: ElementId) -> impl Iterator<Item = (ElementId, &Element)> {
        self.iter()
            .filter(move |(_, el)| el.parent() == Some(parent))
    }

    pub fn child_by_name(&self, parent: ElementId, name: &PathComponent) -> Option<ElementId> {
        self.children(parent)
            .find(|(_, el)| el.name() == Some(name))
            .map(|(eid, _)| eid)
    }

    /// Descends `relpath` from `from`.
    pub fn lookup_from(&self, from: ElementId, relpath: &RelPath) -> Option<ElementId> {
        if !self.contains(from) {
            return None;
        }
        relpath
            .components()
            .try_fold(from, |eid, name| self.child_by_name(eid, name))
    }

    /// Descends `relpath` from the root.
    pub fn lookup(&self, relpath: &RelPath) -> Option<ElementId> {
        self.lookup_from(ElementId::ROOT, relpath)
    }

    /// Returns the path of `eid` from the root, or [None] if it is not
    /// reachable from the root.
    pub fn path_of(&self, eid: ElementId) -> Option<RelPath> {
        let mut names = Vec::new();
        let mut current = eid;
        while current != ElementId::ROOT {
            // a longer chain than there are elements is a cycle.
            if names.len() > self.elements.len() {
                return None;
            }
            let (parent, name) = self.get(current)?.placement.as_ref()?;
            names.push(name.clone());
            current = *parent;
        }
        if !self.contains(ElementId::ROOT) {
            return None;
        }

        Some(names.into_iter().rev().collect())
    }

    /// Returns everything placed below `eid`, parents before their children.
    /// `eid` itself is not included.
    pub fn descendants(&self, eid: ElementId) -> Vec<ElementId> {
        let children = self.children_index();
        let mut out = Vec::new();
        let mut seen = HashSet::from([eid]);
        let mut stack = vec![eid];

        while let Some(current) = stack.pop() {
            let Some(kids) = children.get(&current) else {
                continue;
            };
            for child in kids.iter().rev() {
                if seen.insert(*child) {
                    out.push(*child);
                    stack.push(*child);
                }
            }
        }

        out
    }

    /// Whether `eid` is `ancestor` or placed somewhere below it.
    pub fn is_within(&self, eid: ElementId, ancestor: ElementId) -> bool {
        let mut current = Some(eid);
        let mut steps = 0;
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.elements.len() {
                return false;
            }
            current = self.get(c).and_then(Element::parent);
        }
        false
    }

    fn children_index(&self) -> BTreeMap<ElementId, Vec<ElementId>> {
        let mut index: BTreeMap<ElementId, Vec<ElementId>> = BTreeMap::new();
        for (eid, el) in self.iter() {
            if let Some(parent) = el.parent() {
                index.entry(parent).or_default().push(eid);
            }
        }
        index
    }

    /// Returns all elements reachable from the root, including the root.
    pub fn reachable(&self) -> BTreeSet<ElementId> {
        let mut reachable = BTreeSet::new();
        if self.contains(ElementId::ROOT) {
            reachable.insert(ElementId::ROOT);
            reachable.extend(self.descendants(ElementId::ROOT));
        }
        reachable
    }

    /// Checks the tree is consistent enough to be committed.
    pub fn validate(&self) -> Result<(), Error> {
        match self.get(ElementId::ROOT) {
            Some(root) if root.kind() == NodeKind::Dir && root.placement.is_none() => {}
            _ => return Err(Error::Conflict("the root must be a directory".into())),
        }

        let reachable = self.reachable();
        let mut names = HashSet::new();

        for (eid, el) in self.iter() {
            if !reachable.contains(&eid) {
                warn!(%eid, "element not reachable from the root");
                return Err(Error::Conflict(format!(
                    "{} is not reachable from the root",
                    eid
                )));
            }

            if !el.kind().is_known() || el.content.reference_loc().is_some() {
                return Err(Error::Conflict(format!("{} has unresolved content", eid)));
            }
            if el.kind() == NodeKind::Symlink && el.content.symlink_target().is_none() {
                return Err(Error::Conflict(format!("symlink {} has no target", eid)));
            }

            if let Some((parent, name)) = &el.placement {
                // reachable parents are present.
                if self.get(*parent).map(Element::kind) != Some(NodeKind::Dir) {
                    return Err(Error::Conflict(format!(
                        "parent {} of {} is not a directory",
                        parent, eid
                    )));
                }
                if !names.insert((*parent, name.clone())) {
                    return Err(Error::Conflict(format!(
                        "name {} used twice in {}",
                        name, parent
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Element, Tree};
    use crate::fixtures::{FILE_CONTENT_V1, SYMLINK_CONTENT};
    use crate::{ElementId, Error, NodeContent, NodeKind, PathComponent, RelPath};

    fn place(tree: &mut Tree, eid: u64, parent: u64, name: &str, content: NodeContent) {
        tree.insert(
            ElementId::new(eid),
            Element {
                placement: Some((
                    ElementId::new(parent),
                    PathComponent::try_from(name).unwrap(),
                )),
                content,
                copied_from: None,
                last_changed: 1,
            },
        );
    }

    /// /trunk (1), /trunk/a (2), /trunk/sub (3), /trunk/sub/l (4)
    fn sample() -> Tree {
        let mut tree = Tree::with_root(0);
        place(&mut tree, 1, 0, "trunk", NodeContent::empty(NodeKind::Dir));
        place(&mut tree, 2, 1, "a", FILE_CONTENT_V1.clone());
        place(&mut tree, 3, 1, "sub", NodeContent::empty(NodeKind::Dir));
        place(&mut tree, 4, 3, "l", SYMLINK_CONTENT.clone());
        tree
    }

    #[test]
    fn lookup_and_path_of() {
        let tree = sample();
        let path: RelPath = "trunk/sub/l".parse().unwrap();

        assert_eq!(Some(ElementId::new(4)), tree.lookup(&path));
        assert_eq!(Some(path), tree.path_of(ElementId::new(4)));
        assert_eq!(Some(RelPath::root()), tree.path_of(ElementId::ROOT));
        assert_eq!(None, tree.lookup(&"trunk/nope".parse().unwrap()));
    }

    #[test]
    fn descendants_parents_first() {
        let tree = sample();
        let descendants = tree.descendants(ElementId::new(1));

        assert_eq!(3, descendants.len());
        let pos = |eid| descendants.iter().position(|d| *d == ElementId::new(eid));
        assert!(pos(3) < pos(4));
        assert!(tree.is_within(ElementId::new(4), ElementId::new(1)));
        assert!(!tree.is_within(ElementId::new(1), ElementId::new(4)));
    }

    #[test]
    fn validate_sample() {
        sample().validate().expect("must validate");
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let mut tree = sample();
        place(&mut tree, 5, 1, "a", FILE_CONTENT_V1.clone());
        assert!(matches!(tree.validate(), Err(Error::Conflict(_))));
    }

    #[test]
    fn validate_rejects_file_parent() {
        let mut tree = sample();
        place(&mut tree, 5, 2, "x", FILE_CONTENT_V1.clone());
        assert!(matches!(tree.validate(), Err(Error::Conflict(_))));
    }

    #[test]
    fn validate_rejects_cycles() {
        let mut tree = sample();
        tree.get_mut(ElementId::new(1)).unwrap().placement =
            Some((ElementId::new(3), PathComponent::try_from("loop").unwrap()));

        assert_eq!(None, tree.path_of(ElementId::new(4)));
        assert!(matches!(tree.validate(), Err(Error::Conflict(_))));
    }
}
