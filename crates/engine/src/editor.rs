//! Single-entity editor behind the category and expense modals.
//!
//! An [`Editor`] starts as a blank draft or seeded from an existing entity,
//! validates locally, and talks to the remote side only on save or on a
//! confirmed delete. Once dismissed it reports a [`DismissOutcome`] that the
//! list screen uses to decide whether to reload.

use api_types::{
    NAME_MAX_LEN, Sort,
    category::{Category, CategoryUpsert},
    criteria::Criteria,
    expense::{Expense, ExpenseUpsert},
};
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::{EngineError, Entity, Notifier, Resource, ResultEngine};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How an editor was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissOutcome {
    /// Closed without touching the remote side.
    Cancelled,
    /// Something was saved or deleted; lists showing the entity are stale.
    Refreshed,
}

/// Answer of the confirmation prompt for destructive actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorState {
    /// New entity, untouched form.
    Draft,
    Editing,
    /// Waiting for the user to confirm a delete.
    Confirming,
    /// A save or delete is in flight; the form is locked.
    Submitting,
    Dismissed(DismissOutcome),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),
    #[error("{0} must be a number")]
    NotANumber(&'static str),
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("{0} must be a date (YYYY-MM-DD)")]
    NotADate(&'static str),
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required(field)
            | Self::TooLong(field, _)
            | Self::NotANumber(field)
            | Self::Negative(field)
            | Self::NotADate(field) => field,
        }
    }
}

/// Form fields of one entity kind.
pub trait Form {
    type Entity: Entity;

    /// Copies the entity's values into the form.
    fn populate(&mut self, entity: &Self::Entity);

    /// Builds the upsert body, or lists every invalid field.
    fn validate(
        &self,
        id: Option<Uuid>,
    ) -> Result<<Self::Entity as Entity>::Upsert, Vec<FieldError>>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryForm {
    pub name: String,
}

impl Form for CategoryForm {
    type Entity = Category;

    fn populate(&mut self, entity: &Category) {
        self.name = entity.name.clone();
    }

    fn validate(&self, id: Option<Uuid>) -> Result<CategoryUpsert, Vec<FieldError>> {
        let name = validate_name(&self.name);
        match name {
            Ok(name) => Ok(CategoryUpsert { id, name }),
            Err(err) => Err(vec![err]),
        }
    }
}

/// Expense form. Text inputs are kept as typed and parsed on validation.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseForm {
    pub name: String,
    pub amount: String,
    pub date: String,
    category_id: Option<Uuid>,
    categories: Vec<Category>,
}

impl Default for ExpenseForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            amount: String::new(),
            date: chrono::Local::now()
                .date_naive()
                .format(DATE_FORMAT)
                .to_string(),
            category_id: None,
            categories: Vec::new(),
        }
    }
}

impl ExpenseForm {
    /// Selectable categories.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    pub fn selected_category(&self) -> Option<&Category> {
        let id = self.category_id?;
        self.categories.iter().find(|c| c.id == Some(id))
    }

    /// Replaces the selection list, keeping the current choice available.
    pub fn set_categories(&mut self, categories: Vec<Category>) {
        let selected = self.selected_category().cloned();
        self.categories = categories;
        if let Some(category) = selected {
            self.resolve_category(category);
        }
    }

    pub fn select_category(&mut self, id: Option<Uuid>) {
        self.category_id = id;
    }

    /// Cycles through "no category" followed by every listed category.
    pub fn cycle_category(&mut self, forward: bool) {
        let ids: Vec<Option<Uuid>> = std::iter::once(None)
            .chain(self.categories.iter().filter_map(|c| c.id).map(Some))
            .collect();
        let current = ids
            .iter()
            .position(|id| *id == self.category_id)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % ids.len()
        } else {
            (current + ids.len() - 1) % ids.len()
        };
        self.category_id = ids[next];
    }

    fn resolve_category(&mut self, category: Category) {
        if category.id.is_some() && !self.categories.iter().any(|c| c.id == category.id) {
            self.categories.push(category);
        }
    }
}

impl Form for ExpenseForm {
    type Entity = Expense;

    fn populate(&mut self, entity: &Expense) {
        self.name = entity.name.clone();
        self.amount = entity.amount.to_string();
        self.date = entity.date.format(DATE_FORMAT).to_string();
        self.category_id = entity.category_ref();
        if let Some(category) = &entity.category {
            self.resolve_category(category.clone());
        }
    }

    fn validate(&self, id: Option<Uuid>) -> Result<ExpenseUpsert, Vec<FieldError>> {
        let name = validate_name(&self.name);
        let amount = validate_amount(&self.amount);
        let date = validate_date(&self.date);

        match (name, amount, date) {
            (Ok(name), Ok(amount), Ok(date)) => Ok(ExpenseUpsert {
                id,
                name,
                amount,
                date,
                category_id: self.category_id,
            }),
            (name, amount, date) => Err([name.err(), amount.err(), date.err()]
                .into_iter()
                .flatten()
                .collect()),
        }
    }
}

fn validate_name(raw: &str) -> Result<String, FieldError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(FieldError::Required("name"));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(FieldError::TooLong("name", NAME_MAX_LEN));
    }
    Ok(name.to_string())
}

// Accepts `,` as decimal separator as well.
fn validate_amount(raw: &str) -> Result<f64, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::Required("amount"));
    }
    let amount: f64 = raw
        .replace(',', ".")
        .parse()
        .map_err(|_| FieldError::NotANumber("amount"))?;
    if !amount.is_finite() {
        return Err(FieldError::NotANumber("amount"));
    }
    if amount < 0.0 {
        return Err(FieldError::Negative("amount"));
    }
    Ok(amount)
}

fn validate_date(raw: &str) -> Result<NaiveDate, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::Required("date"));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| FieldError::NotADate("date"))
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug)]
pub struct Editor<F: Form> {
    form: F,
    id: Option<Uuid>,
    state: EditorState,
    errors: Vec<FieldError>,
}

impl<F: Form + Default> Editor<F> {
    /// Opens a blank draft, or an editor seeded from `entity`.
    pub fn open(entity: Option<&F::Entity>) -> Self {
        Self::with_form(F::default(), entity)
    }
}

impl<F: Form> Editor<F> {
    /// Like [`open`](Editor::open) with a prepared form (e.g. one that
    /// already carries its selection lists).
    pub fn with_form(mut form: F, entity: Option<&F::Entity>) -> Self {
        let (id, state) = match entity {
            Some(entity) => {
                form.populate(entity);
                (entity.id(), EditorState::Editing)
            }
            None => (None, EditorState::Draft),
        };
        Self {
            form,
            id,
            state,
            errors: Vec::new(),
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    /// Mutable access to the fields; `None` while the form is locked.
    pub fn form_mut(&mut self) -> Option<&mut F> {
        match self.state {
            EditorState::Draft | EditorState::Editing => {
                self.state = EditorState::Editing;
                Some(&mut self.form)
            }
            _ => None,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// `true` for drafts that were never stored.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn submitting(&self) -> bool {
        self.state == EditorState::Submitting
    }

    pub fn outcome(&self) -> Option<DismissOutcome> {
        match self.state {
            EditorState::Dismissed(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Field errors of the last rejected save.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether save would pass local validation.
    pub fn can_submit(&self) -> bool {
        self.editable() && self.form.validate(self.id).is_ok()
    }

    pub fn cancel(&mut self) -> ResultEngine<DismissOutcome> {
        if self.state == EditorState::Submitting {
            return Err(EngineError::InvalidState("submitting"));
        }
        self.dismiss(DismissOutcome::Cancelled);
        Ok(DismissOutcome::Cancelled)
    }

    /// Validates and sends the upsert.
    ///
    /// Returns `Ok(Some(Refreshed))` once stored. Invalid fields and remote
    /// failures return `Ok(None)` and leave the editor open: the former are
    /// in [`errors`](Editor::errors), the latter were notified.
    pub async fn save<R>(
        &mut self,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) -> ResultEngine<Option<DismissOutcome>>
    where
        R: Resource<Item = F::Entity>,
    {
        self.ensure_editable()?;
        let body = match self.form.validate(self.id) {
            Ok(body) => body,
            Err(errors) => {
                tracing::debug!(count = errors.len(), "form rejected");
                self.errors = errors;
                return Ok(None);
            }
        };
        self.errors.clear();

        self.state = EditorState::Submitting;
        let result = resource.upsert(&body).await;
        self.state = EditorState::Editing;

        let label = F::Entity::SINGULAR;
        match result {
            Ok(stored) => {
                tracing::debug!(what = label, echoed = stored.is_some(), "saved");
                notifier.success(&format!("{} saved", capitalized(label)));
                self.dismiss(DismissOutcome::Refreshed);
                Ok(Some(DismissOutcome::Refreshed))
            }
            Err(err) => {
                tracing::warn!("failed to save {label}: {err}");
                notifier.error(&format!("Could not save {label}"), &err);
                Ok(None)
            }
        }
    }

    /// Opens the delete confirmation. Returns the prompt to show.
    pub fn request_delete(&mut self) -> ResultEngine<String> {
        self.ensure_editable()?;
        if self.id.is_none() {
            return Err(EngineError::MissingId(F::Entity::SINGULAR));
        }
        self.state = EditorState::Confirming;
        Ok(format!(
            "Are you sure you want to delete this {}?",
            F::Entity::SINGULAR
        ))
    }

    /// Acts on the answer to [`request_delete`](Editor::request_delete).
    /// Only [`Choice::Yes`] reaches the remote side.
    pub async fn resolve_delete<R>(
        &mut self,
        choice: Choice,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) -> ResultEngine<Option<DismissOutcome>>
    where
        R: Resource<Item = F::Entity>,
    {
        if self.state != EditorState::Confirming {
            return Err(EngineError::InvalidState("no delete is awaiting confirmation"));
        }
        let Some(id) = self.id else {
            return Err(EngineError::MissingId(F::Entity::SINGULAR));
        };
        if choice == Choice::No {
            self.state = EditorState::Editing;
            return Ok(None);
        }

        self.state = EditorState::Submitting;
        let result = resource.delete_by_id(id).await;
        self.state = EditorState::Editing;

        let label = F::Entity::SINGULAR;
        match result {
            Ok(()) => {
                tracing::debug!(what = label, %id, "deleted");
                notifier.success(&format!("{} deleted", capitalized(label)));
                self.dismiss(DismissOutcome::Refreshed);
                Ok(Some(DismissOutcome::Refreshed))
            }
            Err(err) => {
                tracing::warn!("failed to delete {label}: {err}");
                notifier.error(&format!("Could not delete {label}"), &err);
                Ok(None)
            }
        }
    }

    fn editable(&self) -> bool {
        matches!(self.state, EditorState::Draft | EditorState::Editing)
    }

    fn ensure_editable(&self) -> ResultEngine<()> {
        match self.state {
            EditorState::Draft | EditorState::Editing => Ok(()),
            EditorState::Confirming => Err(EngineError::InvalidState("confirming")),
            EditorState::Submitting => Err(EngineError::InvalidState("submitting")),
            EditorState::Dismissed(_) => Err(EngineError::InvalidState("dismissed")),
        }
    }

    fn dismiss(&mut self, outcome: DismissOutcome) {
        self.state = EditorState::Dismissed(outcome);
    }
}

impl Editor<ExpenseForm> {
    /// (Re)loads the category selection list, sorted by name. Entered values
    /// and the current selection are kept.
    pub async fn load_categories<R>(&mut self, resource: &R, notifier: &mut dyn Notifier) -> bool
    where
        R: Resource<Item = Category>,
    {
        let criteria = Criteria {
            sort: Sort::asc("name"),
            ..Criteria::default()
        };
        match resource.fetch_all(&criteria).await {
            Ok(categories) => {
                self.form.set_categories(categories);
                true
            }
            Err(err) => {
                tracing::warn!("failed to load categories: {err}");
                notifier.error("Could not load categories", &err);
                false
            }
        }
    }
}
