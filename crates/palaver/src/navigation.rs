//! Routing hook invoked when a session is terminated.

/// Route of the login surface.
pub const LOGIN_PATH: &str = "/login";

/// Routes reachable without a session. Terminating a session while on one of
/// these does not navigate, which avoids redirect loops for anonymous users.
pub const PUBLIC_PATHS: [&str; 3] = ["/", "/login", "/signup"];

/// The caller's routing layer.
pub trait Navigator: Send + Sync {
    /// The route currently shown, if the caller has such a notion.
    fn current_path(&self) -> Option<String>;

    /// Move to another route.
    fn navigate(&self, path: &str);
}

/// A navigator for callers without routes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> Option<String> {
        None
    }

    fn navigate(&self, _path: &str) {}
}

/// Send the caller to the login surface unless already on a public route.
pub(crate) fn redirect_to_login(navigator: &dyn Navigator) -> bool {
    let on_public = navigator
        .current_path()
        .is_some_and(|path| PUBLIC_PATHS.contains(&path.as_str()));
    if on_public {
        return false;
    }
    navigator.navigate(LOGIN_PATH);
    true
}
