//! Route gating on the login state.

/// Who is logged in, if anyone.
pub trait Authenticator {
    fn is_authenticated(&self) -> bool;

    /// Name of the logged in user.
    fn identity(&self) -> Option<&str>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    Login,
    Categories,
    #[default]
    Expenses,
}

impl Route {
    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Categories => "Categories",
            Self::Expenses => "Expenses",
        }
    }

    /// Whether the route needs a logged in user.
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login)
    }
}

/// Returns the route to actually show: protected routes fall back to
/// [`Route::Login`] when nobody is logged in.
pub fn guard(route: Route, auth: &dyn Authenticator) -> Route {
    if route.is_protected() && !auth.is_authenticated() {
        tracing::debug!(requested = route.label(), "redirecting to login");
        return Route::Login;
    }
    route
}
