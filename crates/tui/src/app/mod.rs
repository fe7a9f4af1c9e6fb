mod modal;
mod toast;

use std::time::{Duration, Instant};

use api_types::{
    Direction, Sort, YearMonth, category::Category, criteria::Criteria, expense::Expense,
};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use engine::{
    Authenticator, DismissOutcome, Editor, Entity, ExpenseForm, ExpenseGroups, ListAccumulator,
    Listing, Notifier, PageSink, Resource, Route, SearchState, fetch_every_page, guard,
};
use reqwest::StatusCode;

use crate::{
    client::{Client, ClientError, Credentials},
    config::AppConfig,
    error::{AppError, Result},
    session::Session,
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

pub use modal::{EditorModal, FormFields, Modal, ModalStep};
pub use toast::{ToastLevel, ToastState, Toasts};

const TICK_RATE: Duration = Duration::from_millis(200);

type SortOption = (&'static str, Direction);

const CATEGORY_SORTS: &[SortOption] = &[
    ("name", Direction::Asc),
    ("name", Direction::Desc),
    ("createdAt", Direction::Desc),
    ("createdAt", Direction::Asc),
];

const EXPENSE_SORTS: &[SortOption] = &[
    ("name", Direction::Asc),
    ("name", Direction::Desc),
    ("createdAt", Direction::Desc),
    ("createdAt", Direction::Asc),
    ("date", Direction::Desc),
    ("date", Direction::Asc),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug)]
pub struct LoginState {
    pub username: String,
    pub password: String,
    pub focus: LoginField,
    pub message: Option<String>,
}

impl LoginState {
    fn active_field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }
}

/// What a list screen shows, row-wise.
pub trait Rows {
    fn row_count(&self) -> usize;

    fn is_loaded(&self) -> bool;
}

impl<T> Rows for ListAccumulator<T> {
    fn row_count(&self) -> usize {
        self.items().len()
    }

    fn is_loaded(&self) -> bool {
        ListAccumulator::is_loaded(self)
    }
}

impl Rows for ExpenseGroups {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn is_loaded(&self) -> bool {
        ExpenseGroups::is_loaded(self)
    }
}

/// A list session plus the cursor and filter-input state of its screen.
#[derive(Debug)]
pub struct ListScreen<T, S = ListAccumulator<T>> {
    pub listing: Listing<T, S>,
    pub selected: usize,
    /// `/` was pressed: characters go to the name filter.
    pub filtering: bool,
    sorts: &'static [SortOption],
}

impl<T, S> ListScreen<T, S>
where
    T: Entity,
    S: PageSink<T> + Rows,
{
    fn new(listing: Listing<T, S>, sorts: &'static [SortOption]) -> Self {
        Self {
            listing,
            selected: 0,
            filtering: false,
            sorts,
        }
    }

    pub fn rows(&self) -> usize {
        self.listing.content().row_count()
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.rows().saturating_sub(1));
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Moves the cursor down; past the last row the next page is loaded.
    async fn select_next<R>(&mut self, resource: &R, notifier: &mut dyn Notifier)
    where
        R: Resource<Item = T>,
    {
        if self.selected + 1 >= self.rows() {
            if !self.listing.load_next_page(resource, notifier).await {
                return;
            }
            // A retried first page replaces the rows instead of extending them.
            if self.listing.search().is_first_page() {
                self.selected = 0;
                return;
            }
        }
        if self.selected + 1 < self.rows() {
            self.selected += 1;
        }
    }

    async fn ensure_loaded<R>(&mut self, resource: &R, notifier: &mut dyn Notifier)
    where
        R: Resource<Item = T>,
    {
        if !self.listing.content().is_loaded() && !self.listing.loading() {
            self.listing.load(resource, notifier).await;
        }
    }

    async fn edit_filter<R>(
        &mut self,
        edit: Option<char>,
        now: Instant,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) where
        R: Resource<Item = T>,
    {
        let mut name = self.listing.search().name_input().to_string();
        match edit {
            Some(ch) => name.push(ch),
            None => {
                name.pop();
            }
        }
        if self.listing.set_name(&name, now, resource, notifier).await {
            self.selected = 0;
        }
    }

    async fn cycle_sort<R>(&mut self, now: Instant, resource: &R, notifier: &mut dyn Notifier)
    where
        R: Resource<Item = T>,
    {
        let current = self.listing.search().sort();
        let next = self
            .sorts
            .iter()
            .position(|(field, dir)| current.field == *field && current.direction == *dir)
            .map_or(0, |pos| (pos + 1) % self.sorts.len());
        let (field, direction) = self.sorts[next];
        let sort = Sort {
            field: field.to_string(),
            direction,
        };
        if self.listing.set_sort(sort, now, resource, notifier).await {
            self.selected = 0;
        }
    }

    async fn poll<R>(&mut self, now: Instant, resource: &R, notifier: &mut dyn Notifier)
    where
        R: Resource<Item = T>,
    {
        if self.listing.poll(now, resource, notifier).await {
            self.selected = 0;
        }
    }

    async fn reload<R>(&mut self, resource: &R, notifier: &mut dyn Notifier)
    where
        R: Resource<Item = T>,
    {
        if self.listing.reload(resource, notifier).await {
            self.selected = 0;
        }
    }

    async fn editor_dismissed<R>(
        &mut self,
        outcome: DismissOutcome,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) where
        R: Resource<Item = T>,
    {
        if self
            .listing
            .on_editor_dismissed(outcome, resource, notifier)
            .await
        {
            self.clamp_selection();
        }
    }

    fn teardown(&mut self) {
        self.filtering = false;
        self.listing.teardown();
    }
}

impl ListScreen<Category> {
    fn categories(config: &AppConfig) -> Self {
        let search = SearchState::new(
            Criteria::with_size(config.page_size),
            config.search_debounce(),
        );
        Self::new(Listing::new(search, ListAccumulator::new()), CATEGORY_SORTS)
    }

    pub fn selected_item(&self) -> Option<&Category> {
        self.listing.content().items().get(self.selected)
    }
}

#[derive(Debug)]
pub struct ExpensesState {
    pub list: ListScreen<Expense, ExpenseGroups>,
    /// Choices of the category filter, sorted by name.
    pub categories: Vec<Category>,
    /// Index into `categories`; `None` shows every category.
    pub category_filter: Option<usize>,
    page_size: u32,
}

impl ExpensesState {
    fn new(config: &AppConfig) -> Self {
        let criteria = Criteria {
            year_month: Some(current_month()),
            ..Criteria::with_size(config.page_size)
        };
        let search = SearchState::new(criteria, config.search_debounce());
        Self {
            list: ListScreen::new(Listing::new(search, ExpenseGroups::new()), EXPENSE_SORTS),
            categories: Vec::new(),
            category_filter: None,
            page_size: config.page_size,
        }
    }

    pub fn selected_item(&self) -> Option<&Expense> {
        self.list.listing.content().iter().nth(self.list.selected)
    }

    pub fn period(&self) -> YearMonth {
        self.list
            .listing
            .search()
            .period()
            .unwrap_or_else(current_month)
    }

    pub fn category_filter_label(&self) -> &str {
        self.category_filter
            .and_then(|i| self.categories.get(i))
            .map_or("All", |c| c.name.as_str())
    }

    /// Refreshes the filter choices, keeping the active filter when the
    /// category still exists.
    async fn load_choices<R>(&mut self, resource: &R, notifier: &mut dyn Notifier)
    where
        R: Resource<Item = Category>,
    {
        let criteria = Criteria {
            sort: Sort::asc("name"),
            ..Criteria::with_size(self.page_size)
        };
        match fetch_every_page(resource, &criteria).await {
            Ok(categories) => {
                let active = self
                    .category_filter
                    .and_then(|i| self.categories.get(i))
                    .and_then(|c| c.id);
                self.category_filter =
                    active.and_then(|id| categories.iter().position(|c| c.id == Some(id)));
                self.categories = categories;
            }
            Err(err) => {
                tracing::warn!("failed to load category filter: {err}");
                notifier.error("Could not load categories", &err);
            }
        }
    }

    /// All → first category → ... → last category → All.
    async fn cycle_category_filter<R>(
        &mut self,
        now: Instant,
        resource: &R,
        notifier: &mut dyn Notifier,
    ) where
        R: Resource<Item = Expense>,
    {
        self.category_filter = match self.category_filter {
            None if !self.categories.is_empty() => Some(0),
            Some(i) if i + 1 < self.categories.len() => Some(i + 1),
            _ => None,
        };
        let ids = self
            .category_filter
            .and_then(|i| self.categories.get(i))
            .and_then(|c| c.id)
            .into_iter()
            .collect();
        if self
            .list
            .listing
            .set_category_ids(ids, now, resource, notifier)
            .await
        {
            self.list.selected = 0;
        }
    }

    async fn shift_month<R>(&mut self, months: i32, resource: &R, notifier: &mut dyn Notifier)
    where
        R: Resource<Item = Expense>,
    {
        let period = self.period().add_months(months);
        self.list.selected = 0;
        self.list.listing.set_period(period, resource, notifier).await;
    }
}

fn current_month() -> YearMonth {
    YearMonth::from_date(chrono::Local::now().date_naive())
}

#[derive(Debug)]
pub struct AppState {
    pub route: Route,
    pub user: Option<String>,
    pub base_url: String,
    pub login: LoginState,
    pub categories: ListScreen<Category>,
    pub expenses: ExpensesState,
    /// Open editors, innermost last.
    pub modals: Vec<Modal>,
    pub toasts: Toasts,
}

pub struct App {
    config: AppConfig,
    client: Client,
    session: Session,
    pub state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::new(&config.base_url)?;
        let session = Session::default();
        let state = AppState {
            route: guard(Route::default(), &session),
            user: None,
            base_url: client.base_url().to_string(),
            login: LoginState {
                username: config.username.clone(),
                password: String::new(),
                focus: if config.username.is_empty() {
                    LoginField::Username
                } else {
                    LoginField::Password
                },
                message: None,
            },
            categories: ListScreen::categories(&config),
            expenses: ExpensesState::new(&config),
            modals: Vec::new(),
            toasts: Toasts::default(),
        };

        Ok(Self {
            config,
            client,
            session,
            state,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        while !self.should_quit {
            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(self.poll_timeout())?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key).await;
            }
            self.tick(Instant::now()).await;
        }

        Ok(())
    }

    /// Wakes up early when a debounced filter change is due.
    fn poll_timeout(&self) -> Duration {
        let deadline = match self.state.route {
            Route::Categories => self.state.categories.listing.search().deadline(),
            Route::Expenses => self.state.expenses.list.listing.search().deadline(),
            Route::Login => None,
        };
        deadline.map_or(TICK_RATE, |at| {
            at.saturating_duration_since(Instant::now()).min(TICK_RATE)
        })
    }

    async fn tick(&mut self, now: Instant) {
        let client = &self.client;
        let AppState {
            route,
            categories,
            expenses,
            toasts,
            ..
        } = &mut self.state;

        toasts.expire(now);
        match route {
            Route::Categories => categories.poll(now, &client.categories(), toasts).await,
            Route::Expenses => expenses.list.poll(now, &client.expenses(), toasts).await,
            Route::Login => {}
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        let action = map_key(key);
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }
        if !self.state.modals.is_empty() {
            self.handle_modal_key(action).await;
            return;
        }
        match self.state.route {
            Route::Login => self.handle_login_key(action).await,
            Route::Categories | Route::Expenses => self.handle_list_key(action).await,
        }
    }

    async fn handle_login_key(&mut self, action: AppAction) {
        let login = &mut self.state.login;
        match action {
            AppAction::NextField | AppAction::Up | AppAction::Down => {
                login.focus = match login.focus {
                    LoginField::Username => LoginField::Password,
                    LoginField::Password => LoginField::Username,
                };
            }
            AppAction::Submit => self.attempt_login().await,
            AppAction::Backspace => {
                login.active_field_mut().pop();
            }
            AppAction::Input(ch) => login.active_field_mut().push(ch),
            AppAction::Cancel => login.message = None,
            _ => {}
        }
    }

    async fn attempt_login(&mut self) {
        let username = self.state.login.username.trim().to_string();
        let password = self.state.login.password.clone();
        if username.is_empty() || password.is_empty() {
            self.state.login.message = Some("Username and password are required".to_string());
            return;
        }

        let credentials = Credentials {
            username: username.clone(),
            password,
        };
        let client = self.client.with_credentials(credentials.clone());
        match client.categories().get_page(&Criteria::with_size(1)).await {
            Ok(_) => {
                self.session.login(credentials);
                self.client = client;
                self.state.login.password.clear();
                self.state.login.message = None;
                self.navigate(Route::default()).await;
            }
            Err(err) => {
                tracing::warn!(%username, "login failed: {err}");
                self.state.login.message = Some(login_message(&err));
            }
        }
    }

    /// Shows `route`, or the login screen when the session does not allow it.
    async fn navigate(&mut self, route: Route) {
        let route = guard(route, &self.session);
        let previous = self.state.route;
        if previous != route {
            tracing::debug!(from = previous.label(), to = route.label(), "navigate");
            match previous {
                Route::Categories => self.state.categories.teardown(),
                Route::Expenses => self.state.expenses.list.teardown(),
                Route::Login => {}
            }
        }
        self.state.route = route;
        self.state.user = self.session.identity().map(str::to_string);

        let client = &self.client;
        let AppState {
            categories,
            expenses,
            toasts,
            ..
        } = &mut self.state;
        match route {
            Route::Categories => {
                categories
                    .ensure_loaded(&client.categories(), toasts)
                    .await;
            }
            Route::Expenses => {
                if expenses.categories.is_empty() {
                    expenses.load_choices(&client.categories(), toasts).await;
                }
                expenses
                    .list
                    .ensure_loaded(&client.expenses(), toasts)
                    .await;
            }
            Route::Login => {}
        }
    }

    /// Drops the session together with everything loaded under it.
    async fn logout(&mut self) {
        self.state.categories.teardown();
        self.state.expenses.list.teardown();
        self.session.logout();
        self.client.clear_credentials();

        self.state.categories = ListScreen::categories(&self.config);
        self.state.expenses = ExpensesState::new(&self.config);
        self.state.modals.clear();
        self.state.login.focus = LoginField::Password;
        self.navigate(Route::default()).await;
        self.state.toasts.info("Logged out");
    }

    async fn handle_list_key(&mut self, action: AppAction) {
        let filtering = match self.state.route {
            Route::Categories => self.state.categories.filtering,
            Route::Expenses => self.state.expenses.list.filtering,
            Route::Login => false,
        };
        if filtering {
            self.handle_filter_key(action).await;
            return;
        }

        match action {
            AppAction::NextField => {
                let next = match self.state.route {
                    Route::Categories => Route::Expenses,
                    _ => Route::Categories,
                };
                self.navigate(next).await;
            }
            AppAction::Input('q') => self.should_quit = true,
            AppAction::Input('o') => self.logout().await,
            AppAction::Input('a') => self.open_editor(false).await,
            AppAction::Submit => self.open_editor(true).await,
            _ => match self.state.route {
                Route::Categories => self.handle_categories_key(action).await,
                Route::Expenses => self.handle_expenses_key(action).await,
                Route::Login => {}
            },
        }
    }

    async fn handle_filter_key(&mut self, action: AppAction) {
        let now = Instant::now();
        let edit = match action {
            AppAction::Input(ch) => Some(ch),
            AppAction::Backspace => None,
            AppAction::Submit | AppAction::Cancel => {
                self.state.categories.filtering = false;
                self.state.expenses.list.filtering = false;
                return;
            }
            _ => return,
        };

        let client = &self.client;
        let AppState {
            route,
            categories,
            expenses,
            toasts,
            ..
        } = &mut self.state;
        match route {
            Route::Categories => {
                categories
                    .edit_filter(edit, now, &client.categories(), toasts)
                    .await;
            }
            Route::Expenses => {
                expenses
                    .list
                    .edit_filter(edit, now, &client.expenses(), toasts)
                    .await;
            }
            Route::Login => {}
        }
    }

    async fn handle_categories_key(&mut self, action: AppAction) {
        let now = Instant::now();
        let resource = self.client.categories();
        let AppState {
            categories: screen,
            toasts,
            ..
        } = &mut self.state;

        match action {
            AppAction::Up => screen.select_prev(),
            AppAction::Down => screen.select_next(&resource, toasts).await,
            AppAction::Input('/') => screen.filtering = true,
            AppAction::Input('s') => screen.cycle_sort(now, &resource, toasts).await,
            AppAction::Input('n') => {
                screen.listing.load_next_page(&resource, toasts).await;
            }
            AppAction::Input('r') => screen.reload(&resource, toasts).await,
            _ => {}
        }
    }

    async fn handle_expenses_key(&mut self, action: AppAction) {
        let now = Instant::now();
        let client = &self.client;
        let resource = client.expenses();
        let AppState {
            expenses: screen,
            toasts,
            ..
        } = &mut self.state;

        match action {
            AppAction::Up => screen.list.select_prev(),
            AppAction::Down => screen.list.select_next(&resource, toasts).await,
            AppAction::Input('/') => screen.list.filtering = true,
            AppAction::Input('s') => screen.list.cycle_sort(now, &resource, toasts).await,
            AppAction::Input('c') => {
                screen
                    .cycle_category_filter(now, &resource, toasts)
                    .await;
            }
            AppAction::Input('[') => screen.shift_month(-1, &resource, toasts).await,
            AppAction::Input(']') => screen.shift_month(1, &resource, toasts).await,
            AppAction::Input('n') => {
                screen.list.listing.load_next_page(&resource, toasts).await;
            }
            AppAction::Input('r') => {
                screen.load_choices(&client.categories(), toasts).await;
                screen.list.reload(&resource, toasts).await;
            }
            _ => {}
        }
    }

    /// Opens the editor of the current screen, on the selected row when
    /// `selected` is set (nothing happens on an empty list).
    async fn open_editor(&mut self, selected: bool) {
        let modal = match self.state.route {
            Route::Categories => {
                let category = if selected {
                    let Some(category) = self.state.categories.selected_item() else {
                        return;
                    };
                    Some(category.clone())
                } else {
                    None
                };
                Modal::Category(EditorModal::new(Editor::open(category.as_ref())))
            }
            Route::Expenses => {
                let expense = if selected {
                    let Some(expense) = self.state.expenses.selected_item() else {
                        return;
                    };
                    Some(expense.clone())
                } else {
                    None
                };
                let mut editor: Editor<ExpenseForm> = Editor::open(expense.as_ref());
                editor
                    .load_categories(&self.client.categories(), &mut self.state.toasts)
                    .await;
                Modal::Expense(EditorModal::new(editor))
            }
            Route::Login => return,
        };
        self.state.modals.push(modal);
    }

    async fn handle_modal_key(&mut self, action: AppAction) {
        let client = &self.client;
        let AppState { modals, toasts, .. } = &mut self.state;

        if action == AppAction::NewCategory
            && modals.last().is_some_and(Modal::accepts_nested_category)
        {
            modals.push(Modal::Category(EditorModal::new(Editor::open(None))));
            return;
        }

        let step = match modals.last_mut() {
            Some(Modal::Category(modal)) => {
                modal.handle(action, &client.categories(), toasts).await
            }
            Some(Modal::Expense(modal)) => modal.handle(action, &client.expenses(), toasts).await,
            None => return,
        };
        let ModalStep::Dismissed(outcome) = step else {
            return;
        };

        modals.pop();
        match modals.last_mut() {
            Some(Modal::Expense(parent)) => {
                if outcome == DismissOutcome::Refreshed {
                    parent
                        .editor
                        .load_categories(&client.categories(), toasts)
                        .await;
                }
            }
            Some(Modal::Category(_)) => {}
            None => self.editor_dismissed(outcome).await,
        }
    }

    /// The outermost editor closed: the list behind it decides whether to
    /// reload.
    async fn editor_dismissed(&mut self, outcome: DismissOutcome) {
        let client = &self.client;
        let AppState {
            route,
            categories,
            expenses,
            toasts,
            ..
        } = &mut self.state;

        match route {
            Route::Categories => {
                categories
                    .editor_dismissed(outcome, &client.categories(), toasts)
                    .await;
            }
            Route::Expenses => {
                // A category may have been created from the expense editor.
                if outcome == DismissOutcome::Refreshed {
                    expenses.load_choices(&client.categories(), toasts).await;
                }
                expenses
                    .list
                    .editor_dismissed(outcome, &client.expenses(), toasts)
                    .await;
            }
            Route::Login => {}
        }
    }
}

fn login_message(err: &ClientError) -> String {
    match err {
        ClientError::Status { status, .. }
            if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN =>
        {
            "Invalid username or password".to_string()
        }
        ClientError::Transport(_) => "Server unreachable".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            page_size: 10,
            ..AppConfig::default()
        }
    }

    #[test]
    fn app_starts_on_login() {
        let app = App::new(AppConfig {
            username: "alice".to_string(),
            ..config()
        })
        .unwrap();

        assert_eq!(app.state.route, Route::Login);
        assert_eq!(app.state.login.username, "alice");
        assert_eq!(app.state.login.focus, LoginField::Password);
        assert!(app.state.user.is_none());
    }

    #[test]
    fn expenses_start_on_current_month() {
        let expenses = ExpensesState::new(&config());
        let criteria = expenses.list.listing.search().criteria();

        assert_eq!(criteria.size, 10);
        assert_eq!(criteria.year_month, Some(current_month()));
        assert_eq!(expenses.category_filter_label(), "All");
    }

    #[test]
    fn unauthorized_login_has_friendly_message() {
        let err = ClientError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "Bad credentials".to_string(),
        };
        assert_eq!(login_message(&err), "Invalid username or password");

        let err = ClientError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: "proxy".to_string(),
        };
        assert_eq!(login_message(&err), "502 Bad Gateway: proxy");
    }

    #[tokio::test]
    async fn protected_navigation_without_session_stays_on_login() {
        let mut app = App::new(config()).unwrap();
        app.navigate(Route::Categories).await;

        assert_eq!(app.state.route, Route::Login);
        assert!(!app.state.categories.listing.content().is_loaded());
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected_locally() {
        let mut app = App::new(config()).unwrap();
        app.handle_login_key(AppAction::Submit).await;

        assert_eq!(
            app.state.login.message.as_deref(),
            Some("Username and password are required")
        );
        assert_eq!(app.state.route, Route::Login);
    }
}
