//! Editor overlays. The expense editor can stack a category editor on top.

use engine::{
    CategoryForm, Choice, DismissOutcome, Editor, Entity, ExpenseForm, Form, Notifier, Resource,
    ResultEngine,
};

use crate::ui::keymap::AppAction;

/// Field layout of a form as shown in the overlay.
pub trait FormFields {
    const LABELS: &'static [&'static str];

    /// The text input behind `field`, if it is one.
    fn text_mut(&mut self, field: usize) -> Option<&mut String>;

    fn display(&self, field: usize) -> String;

    /// Left/Right on a selection field.
    fn cycle_choice(&mut self, _field: usize, _forward: bool) {}
}

impl FormFields for CategoryForm {
    const LABELS: &'static [&'static str] = &["Name"];

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        (field == 0).then_some(&mut self.name)
    }

    fn display(&self, _field: usize) -> String {
        self.name.clone()
    }
}

impl FormFields for ExpenseForm {
    const LABELS: &'static [&'static str] = &["Name", "Amount", "Date", "Category"];

    fn text_mut(&mut self, field: usize) -> Option<&mut String> {
        match field {
            0 => Some(&mut self.name),
            1 => Some(&mut self.amount),
            2 => Some(&mut self.date),
            _ => None,
        }
    }

    fn display(&self, field: usize) -> String {
        match field {
            0 => self.name.clone(),
            1 => self.amount.clone(),
            2 => self.date.clone(),
            _ => self
                .selected_category()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "(none)".to_string()),
        }
    }

    // The category is the only selection, so Left/Right work from any field.
    fn cycle_choice(&mut self, _field: usize, forward: bool) {
        self.cycle_category(forward);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalStep {
    Stay,
    Dismissed(DismissOutcome),
}

#[derive(Debug)]
pub struct EditorModal<F: Form> {
    pub editor: Editor<F>,
    pub focus: usize,
    /// Delete prompt awaiting y/n.
    pub confirm: Option<String>,
}

impl<F> EditorModal<F>
where
    F: Form + FormFields,
{
    pub fn new(editor: Editor<F>) -> Self {
        Self {
            editor,
            focus: 0,
            confirm: None,
        }
    }

    pub fn title(&self) -> String {
        let verb = if self.editor.is_new() { "New" } else { "Edit" };
        format!(" {verb} {} ", F::Entity::SINGULAR)
    }

    pub async fn handle<R>(
        &mut self,
        action: AppAction,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) -> ModalStep
    where
        R: Resource<Item = F::Entity>,
    {
        if self.confirm.is_some() {
            let choice = match action {
                AppAction::Input('y' | 'Y') => Choice::Yes,
                AppAction::Input('n' | 'N') | AppAction::Cancel => Choice::No,
                _ => return ModalStep::Stay,
            };
            self.confirm = None;
            return step(self.editor.resolve_delete(choice, resource, notifier).await);
        }

        match action {
            AppAction::Cancel => match self.editor.cancel() {
                Ok(outcome) => return ModalStep::Dismissed(outcome),
                Err(err) => tracing::debug!("cancel ignored: {err}"),
            },
            AppAction::Submit => return step(self.editor.save(resource, notifier).await),
            AppAction::Delete => match self.editor.request_delete() {
                Ok(prompt) => self.confirm = Some(prompt),
                Err(err) => notifier.error("Cannot delete", &err),
            },
            AppAction::NextField => self.focus = (self.focus + 1) % F::LABELS.len(),
            AppAction::Left | AppAction::Right => {
                let focus = self.focus;
                if let Some(form) = self.editor.form_mut() {
                    form.cycle_choice(focus, action == AppAction::Right);
                }
            }
            AppAction::Backspace => {
                if let Some(text) = self.focused_text() {
                    text.pop();
                }
            }
            AppAction::Input(ch) => {
                if let Some(text) = self.focused_text() {
                    text.push(ch);
                }
            }
            _ => {}
        }
        ModalStep::Stay
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        let focus = self.focus;
        self.editor.form_mut()?.text_mut(focus)
    }
}

fn step(result: ResultEngine<Option<DismissOutcome>>) -> ModalStep {
    match result {
        Ok(Some(outcome)) => ModalStep::Dismissed(outcome),
        Ok(None) => ModalStep::Stay,
        Err(err) => {
            tracing::warn!("editor action rejected: {err}");
            ModalStep::Stay
        }
    }
}

#[derive(Debug)]
pub enum Modal {
    Category(EditorModal<CategoryForm>),
    Expense(EditorModal<ExpenseForm>),
}

impl Modal {
    /// Whether Ctrl+N may stack a category editor on top.
    pub fn accepts_nested_category(&self) -> bool {
        matches!(self, Self::Expense(modal) if modal.confirm.is_none() && !modal.editor.submitting())
    }

    /// Whether Enter would send the form.
    pub fn can_submit(&self) -> bool {
        match self {
            Self::Category(modal) => modal.editor.can_submit(),
            Self::Expense(modal) => modal.editor.can_submit(),
        }
    }

    /// Whether a delete prompt is showing.
    pub fn confirming(&self) -> bool {
        match self {
            Self::Category(modal) => modal.confirm.is_some(),
            Self::Expense(modal) => modal.confirm.is_some(),
        }
    }
}
