#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
};

use api_types::{criteria::Criteria, page::Page};
use engine::{EngineError, Entity, Notifier, Resource, ResultEngine};
use uuid::Uuid;

/// In-memory collection answering with queued pages.
pub struct FakeResource<T: Entity> {
    pub pages: RefCell<VecDeque<Result<Page<T>, String>>>,
    pub all: RefCell<Vec<T>>,
    pub requested: RefCell<Vec<Criteria>>,
    pub upserts: RefCell<Vec<T::Upsert>>,
    pub deletes: RefCell<Vec<Uuid>>,
    pub fail_writes: Cell<bool>,
}

impl<T: Entity> Default for FakeResource<T> {
    fn default() -> Self {
        Self {
            pages: RefCell::new(VecDeque::new()),
            all: RefCell::new(Vec::new()),
            requested: RefCell::new(Vec::new()),
            upserts: RefCell::new(Vec::new()),
            deletes: RefCell::new(Vec::new()),
            fail_writes: Cell::new(false),
        }
    }
}

impl<T: Entity> FakeResource<T> {
    pub fn push_page(&self, content: Vec<T>, last: bool) {
        self.pages
            .borrow_mut()
            .push_back(Ok(Page { content, last }));
    }

    pub fn push_failure(&self, message: &str) {
        self.pages.borrow_mut().push_back(Err(message.to_string()));
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.borrow().iter().map(|c| c.page).collect()
    }

    pub fn write_calls(&self) -> usize {
        self.upserts.borrow().len() + self.deletes.borrow().len()
    }
}

impl<T> Resource for FakeResource<T>
where
    T: Entity,
    T::Upsert: Clone,
{
    type Item = T;

    async fn fetch_page(&self, criteria: &Criteria) -> ResultEngine<Page<T>> {
        self.requested.borrow_mut().push(criteria.clone());
        match self.pages.borrow_mut().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(EngineError::request_failed(message)),
            None => Ok(Page {
                content: Vec::new(),
                last: true,
            }),
        }
    }

    async fn fetch_all(&self, criteria: &Criteria) -> ResultEngine<Vec<T>> {
        self.requested.borrow_mut().push(criteria.clone());
        Ok(self.all.borrow().clone())
    }

    async fn upsert(&self, body: &T::Upsert) -> ResultEngine<Option<T>> {
        self.upserts.borrow_mut().push(body.clone());
        if self.fail_writes.get() {
            return Err(EngineError::request_failed("500 Internal Server Error"));
        }
        Ok(None)
    }

    async fn delete_by_id(&self, id: Uuid) -> ResultEngine<()> {
        self.deletes.borrow_mut().push(id);
        if self.fail_writes.get() {
            return Err(EngineError::request_failed("connection reset"));
        }
        Ok(())
    }
}

/// Notifier that remembers every message.
#[derive(Debug, Default)]
pub struct Recorder {
    pub successes: Vec<String>,
    pub errors: Vec<String>,
}

impl Notifier for Recorder {
    fn success(&mut self, message: &str) {
        self.successes.push(message.to_string());
    }

    fn error(&mut self, message: &str, cause: &EngineError) {
        self.errors.push(format!("{message}: {cause}"));
    }
}
