use std::sync::RwLock;

use tracing::info;

use super::LogoutAction;

/// The hosting view's routing surface: the logout policy reads the current
/// path and hands back an action to carry out.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate_to(&self, path: &str);
    fn reload(&self);

    fn apply(&self, action: &LogoutAction) {
        match action {
            LogoutAction::None => {}
            LogoutAction::NavigateTo(path) => self.navigate_to(path),
            LogoutAction::ReloadPage => self.reload(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Navigated(String),
    Reloaded(String),
}

/// Navigator that tracks a path in memory and records every navigation.
#[derive(Debug)]
pub struct PathNavigator {
    path: RwLock<String>,
    history: RwLock<Vec<NavigationEvent>>,
}

impl PathNavigator {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: RwLock::new(path.into()),
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn set_path(&self, path: impl Into<String>) {
        if let Ok(mut current) = self.path.write() {
            *current = path.into();
        }
    }

    pub fn history(&self) -> Vec<NavigationEvent> {
        self.history.read().map(|h| h.clone()).unwrap_or_default()
    }

    fn record(&self, event: NavigationEvent) {
        if let Ok(mut history) = self.history.write() {
            history.push(event);
        }
    }
}

impl Navigator for PathNavigator {
    fn current_path(&self) -> String {
        self.path.read().map(|p| p.clone()).unwrap_or_default()
    }

    fn navigate_to(&self, path: &str) {
        info!(from = %self.current_path(), to = path, "Navigating after logout");
        self.set_path(path);
        self.record(NavigationEvent::Navigated(path.to_string()));
    }

    fn reload(&self) {
        let path = self.current_path();
        info!(path = %path, "Reloading page after logout");
        self.record(NavigationEvent::Reloaded(path));
    }
}
