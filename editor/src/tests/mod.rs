//! Scenarios driving both editor flavours end to end.
use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    ElRev, ElementId, ElementReceiver, Error, NodeContent, NodeKind, PathComponent, PathRev,
    RevNum, TreeReceiver, TxnPath,
};

mod protocol;

/// Records the name of every operation it receives, optionally refusing one
/// of them.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<&'static str>>>,
    refuse: Option<&'static str>,
}

impl Recorder {
    pub fn refusing(op: &'static str) -> Self {
        Self {
            refuse: Some(op),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn record(&self, op: &'static str) -> Result<(), Error> {
        self.calls.borrow_mut().push(op);
        if self.refuse == Some(op) {
            return Err(Error::Conflict(format!("{} refused", op)));
        }
        Ok(())
    }
}

impl TreeReceiver for Recorder {
    fn mk(&mut self, _: NodeKind, _: &TxnPath, _: &PathComponent) -> Result<(), Error> {
        self.record("mk")
    }

    fn cp(&mut self, _: &PathRev, _: &TxnPath, _: &PathComponent) -> Result<(), Error> {
        self.record("cp")
    }

    fn mv(&mut self, _: &PathRev, _: &TxnPath, _: &PathComponent) -> Result<(), Error> {
        self.record("mv")
    }

    fn res(&mut self, _: &PathRev, _: &TxnPath, _: &PathComponent) -> Result<(), Error> {
        self.record("res")
    }

    fn rm(&mut self, _: &TxnPath) -> Result<(), Error> {
        self.record("rm")
    }

    fn put(&mut self, _: &TxnPath, _: &NodeContent) -> Result<(), Error> {
        self.record("put")
    }

    fn complete(&mut self) -> Result<(), Error> {
        self.record("complete")
    }

    fn abort(&mut self) -> Result<(), Error> {
        self.record("abort")
    }
}

impl ElementReceiver for Recorder {
    fn add(
        &mut self,
        _: ElementId,
        _: NodeKind,
        _: ElementId,
        _: &PathComponent,
        _: &NodeContent,
    ) -> Result<(), Error> {
        self.record("add")
    }

    fn instantiate(
        &mut self,
        _: ElementId,
        _: ElementId,
        _: &PathComponent,
        _: &NodeContent,
    ) -> Result<(), Error> {
        self.record("instantiate")
    }

    fn copy_one(
        &mut self,
        _: ElementId,
        _: &ElRev,
        _: ElementId,
        _: &PathComponent,
        _: Option<&NodeContent>,
    ) -> Result<(), Error> {
        self.record("copy_one")
    }

    fn copy_tree(&mut self, _: &ElRev, _: ElementId, _: &PathComponent) -> Result<(), Error> {
        self.record("copy_tree")
    }

    fn delete(&mut self, _: RevNum, _: ElementId) -> Result<(), Error> {
        self.record("delete")
    }

    fn alter(
        &mut self,
        _: RevNum,
        _: ElementId,
        _: ElementId,
        _: &PathComponent,
        _: Option<&NodeContent>,
    ) -> Result<(), Error> {
        self.record("alter")
    }

    fn complete(&mut self) -> Result<(), Error> {
        self.record("complete")
    }

    fn abort(&mut self) -> Result<(), Error> {
        self.record("abort")
    }
}
