//! Client core of the budget application.
//!
//! Everything here is independent of the terminal and of the HTTP stack: the
//! remote API is reached through the [`Resource`] trait, user feedback goes
//! through [`Notifier`], and time is always passed in by the caller so that
//! debouncing stays deterministic.

pub use auth::{Authenticator, Route, guard};
pub use debounce::Debouncer;
pub use editor::{
    CategoryForm, Choice, DismissOutcome, Editor, EditorState, ExpenseForm, FieldError, Form,
};
pub use error::{BoxError, EngineError};
pub use grouping::{ExpenseGroup, ExpenseGroups};
pub use list::{ListAccumulator, Listing, PageSink};
pub use notify::Notifier;
pub use resource::{Entity, Resource, fetch_every_page};
pub use search::{SearchState, SEARCH_DEBOUNCE};

pub mod auth;
mod debounce;
pub mod editor;
mod error;
mod grouping;
mod list;
mod notify;
mod resource;
mod search;

pub type ResultEngine<T> = Result<T, EngineError>;
