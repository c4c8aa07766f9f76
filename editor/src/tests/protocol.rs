//! The calling conventions every edit session enforces, independent of the
//! receiver.
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rstest::rstest;

use super::Recorder;
use crate::fixtures::{DIR_CONTENT, FILE_CONTENT_V1, TRUNK_R1};
use crate::{
    cancel_on, ElRev, Editor, ElementEditor, ElementId, Error, NodeContent, NodeKind, State,
    TreeReceiver, TxnPath,
};

fn editor(recorder: &Recorder) -> Editor {
    Editor::new(Box::new(recorder.clone()), None)
}

fn element_editor(recorder: &Recorder) -> ElementEditor {
    ElementEditor::new(Box::new(recorder.clone()), None, ElementId::new(100))
}

#[test]
fn mk_put_complete() {
    let recorder = Recorder::default();
    let editor = editor(&recorder);

    editor.mk(NodeKind::File, &TxnPath::root(), "a").unwrap();
    editor
        .put(&TxnPath::in_txn("a").unwrap(), &FILE_CONTENT_V1)
        .unwrap();
    editor.complete().unwrap();

    assert_eq!(vec!["mk", "put", "complete"], recorder.calls());
    assert!(editor.is_finished());
}

#[test]
#[should_panic(expected = "after the edit finished")]
fn mk_after_complete_panics() {
    let recorder = Recorder::default();
    let editor = editor(&recorder);

    editor.complete().unwrap();
    let _ = editor.mk(NodeKind::Dir, &TxnPath::root(), "late");
}

#[test]
#[should_panic(expected = "after the edit finished")]
fn complete_after_abort_panics() {
    let recorder = Recorder::default();
    let editor = editor(&recorder);

    editor.abort().unwrap();
    let _ = editor.complete();
}

#[test]
#[should_panic(expected = "after the edit finished")]
fn add_after_abort_panics() {
    let recorder = Recorder::default();
    let editor = element_editor(&recorder);

    editor.abort().unwrap();
    let _ = editor.add(NodeKind::Dir, ElementId::ROOT, "late", &DIR_CONTENT);
}

#[test]
#[should_panic(expected = "after the edit finished")]
fn invalid_mk_after_complete_panics() {
    let recorder = Recorder::default();
    let editor = editor(&recorder);

    editor.complete().unwrap();
    let _ = editor.mk(NodeKind::Dir, &TxnPath::root(), "a/b");
}

#[test]
#[should_panic(expected = "after the edit finished")]
fn add_of_unknown_kind_after_abort_panics() {
    let recorder = Recorder::default();
    let editor = element_editor(&recorder);

    editor.abort().unwrap();
    let _ = editor.add(NodeKind::Unknown, ElementId::new(500), "", &DIR_CONTENT);
}

#[test]
fn complete_finishes_even_if_refused() {
    let recorder = Recorder::refusing("complete");
    let editor = editor(&recorder);

    assert_eq!(
        Err(Error::Conflict("complete refused".into())),
        editor.complete()
    );
    assert_eq!(State::Finished, editor.state());
}

#[test]
fn receiver_errors_pass_through() {
    let recorder = Recorder::refusing("put");
    let editor = editor(&recorder);

    assert_eq!(
        Err(Error::Conflict("put refused".into())),
        editor.put(&TxnPath::root(), &DIR_CONTENT)
    );
    assert_eq!(State::Active, editor.state());

    // the session goes on.
    editor.rm(&TxnPath::in_txn("x").unwrap()).unwrap();
    assert_eq!(vec!["put", "rm"], recorder.calls());
}

#[test]
fn cancellation_comes_first() {
    let recorder = Recorder::default();
    let flag = Arc::new(AtomicBool::new(false));
    let editor = Editor::new(Box::new(recorder.clone()), Some(cancel_on(flag.clone())));

    editor.mk(NodeKind::Dir, &TxnPath::root(), "trunk").unwrap();
    flag.store(true, Ordering::Relaxed);

    assert_eq!(
        Err(Error::Cancelled),
        editor.mk(NodeKind::Dir, &TxnPath::root(), "tags")
    );
    assert_eq!(Err(Error::Cancelled), editor.complete());
    assert!(editor.is_finished());
    assert_eq!(vec!["mk"], recorder.calls());
}

#[test]
fn cancellation_of_element_edits() {
    let recorder = Recorder::default();
    let editor = ElementEditor::new(
        Box::new(recorder.clone()),
        Some(Box::new(|| -> Result<(), Error> { Err(Error::Cancelled) })),
        ElementId::new(1),
    );

    assert_eq!(
        Err(Error::Cancelled),
        editor.copy_tree(&ElRev::new(0, ElementId::ROOT), ElementId::ROOT, "x")
    );
    assert_eq!(
        Err(Error::Cancelled),
        editor.add(NodeKind::Dir, ElementId::ROOT, "x", &DIR_CONTENT)
    );
    assert_eq!(Err(Error::Cancelled), editor.abort());
    assert!(recorder.calls().is_empty());
}

#[rstest]
#[case::unknown_kind(NodeKind::Unknown, "a")]
#[case::empty_name(NodeKind::Dir, "")]
#[case::slash(NodeKind::Dir, "a/b")]
#[case::dotdot(NodeKind::File, "..")]
fn invalid_arguments_never_reach_the_receiver(#[case] kind: NodeKind, #[case] name: &str) {
    let recorder = Recorder::default();
    let editor = editor(&recorder);

    assert!(matches!(
        editor.mk(kind, &TxnPath::root(), name),
        Err(Error::InvalidArgument(_))
    ));
    assert!(recorder.calls().is_empty());
    assert_eq!(State::Active, editor.state());
}

#[test]
fn symlink_without_target_never_reaches_the_receiver() {
    let recorder = Recorder::default();
    let content = NodeContent::empty(NodeKind::Symlink);

    let editor = editor(&recorder);
    assert!(matches!(
        editor.put(&TxnPath::in_txn("link").unwrap(), &content),
        Err(Error::InvalidArgument(_))
    ));

    let element_editor = element_editor(&recorder);
    assert!(matches!(
        element_editor.add(NodeKind::Symlink, ElementId::ROOT, "link", &content),
        Err(Error::InvalidArgument(_))
    ));
    assert!(recorder.calls().is_empty());
}

#[test]
fn element_edit_forwards_in_order() {
    let recorder = Recorder::default();
    let editor = element_editor(&recorder);
    let src = ElRev::new(1, ElementId::new(2));

    let dir = editor
        .add(NodeKind::Dir, ElementId::ROOT, "trunk", &DIR_CONTENT)
        .unwrap();
    let file = editor.reserve_eid();
    editor.instantiate(file, dir, "a", &FILE_CONTENT_V1).unwrap();
    let copy = editor.reserve_eid();
    editor.copy_one(copy, &src, dir, "b", None).unwrap();
    editor.copy_tree(&src, dir, "c").unwrap();
    editor
        .alter(1, ElementId::new(2), dir, "moved", None)
        .unwrap();
    editor.delete(1, ElementId::new(3)).unwrap();
    editor.complete().unwrap();

    assert_eq!(
        vec![
            "add",
            "instantiate",
            "copy_one",
            "copy_tree",
            "alter",
            "delete",
            "complete"
        ],
        recorder.calls()
    );
}

/// Calls back into the editor driving it.
struct Reentrant {
    editor: Rc<RefCell<Weak<Editor>>>,
}

impl TreeReceiver for Reentrant {
    fn rm(&mut self, loc: &TxnPath) -> Result<(), Error> {
        if let Some(editor) = self.editor.borrow().upgrade() {
            editor.rm(loc)?;
        }
        Ok(())
    }
}

#[test]
#[should_panic(expected = "while a callback is running")]
fn reentrancy_panics() {
    let slot = Rc::new(RefCell::new(Weak::new()));
    let editor = Rc::new(Editor::new(
        Box::new(Reentrant {
            editor: slot.clone(),
        }),
        None,
    ));
    *slot.borrow_mut() = Rc::downgrade(&editor);

    let _ = editor.rm(&TxnPath::at(TRUNK_R1.clone()));
}
