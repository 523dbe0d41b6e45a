//! Periodic liveness checks for the lifetime of a view.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace};

use crate::api::AuthApi;

use super::{SessionCheck, SessionController};

/// Runs a liveness check immediately and then once per period until stopped.
///
/// While the session is live every tick starts a refresh, so the auth
/// authority sees roughly one refresh per period. Refreshes run as their own
/// tasks: a slow exchange never delays the next tick, and one still in flight
/// when the watcher stops is left to finish.
///
/// Dropping the watcher stops it.
pub struct SessionWatcher {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    _guard: DropGuard,
}

impl SessionWatcher {
    pub fn spawn<A: AuthApi>(controller: Arc<SessionController<A>>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::run(controller, period, cancel.clone()));

        Self {
            _guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    async fn run<A: AuthApi>(
        controller: Arc<SessionController<A>>,
        period: Duration,
        cancel: CancellationToken,
    ) {
        // The first tick completes immediately.
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(period_ms = period.as_millis() as u64, "Session watcher started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let check = controller.check_session();
                    trace!(?check, "Liveness check");
                    if let SessionCheck::Live { .. } = check {
                        let controller = controller.clone();
                        tokio::spawn(async move { controller.refresh().await });
                    }
                }
            }
        }
        debug!("Session watcher stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop ticking and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::auth::NavigationEvent;
    use crate::tests::mocks::{controller, make_token, now_secs, StubApi};

    const PERIOD: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_every_tick() {
        let api = StubApi::issuing(&make_token("u", "ADMIN", now_secs() + 3600));
        let calls = api.refresh_counter();
        let (ctrl, nav) = controller(Some(make_token("u", "ADMIN", now_secs() + 3600)), api, "/admin/dashboard");

        let watcher = SessionWatcher::spawn(Arc::new(ctrl), PERIOD);
        // Ticks at 0s, 5s and 10s.
        tokio::time::sleep(Duration::from_secs(12)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(nav.history().is_empty());
        watcher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_token_on_admin_page_returns_to_admin_root() {
        let api = StubApi::issuing("unused");
        let calls = api.refresh_counter();
        let (ctrl, nav) = controller(Some(make_token("u", "ADMIN", now_secs() - 10)), api, "/admin/dashboard");
        let ctrl = Arc::new(ctrl);

        let watcher = SessionWatcher::spawn(ctrl.clone(), PERIOD);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(ctrl.token(), None);
        assert_eq!(nav.history(), vec![NavigationEvent::Navigated("/admin".to_string())]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Later ticks find no token at the admin root and leave it alone.
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(nav.history().len(), 1);
        watcher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_refresh_reloads_rewards_page() {
        let (ctrl, nav) = controller(
            Some(make_token("u", "MEMBER", now_secs() + 3600)),
            StubApi::rejecting(),
            "/rewards/offers",
        );
        let ctrl = Arc::new(ctrl);

        let watcher = SessionWatcher::spawn(ctrl.clone(), PERIOD);
        tokio::time::sleep(Duration::from_secs(7)).await;

        assert_eq!(ctrl.token(), None);
        // The second tick finds no token under /rewards and does nothing.
        assert_eq!(
            nav.history(),
            vec![NavigationEvent::Reloaded("/rewards/offers".to_string())]
        );
        watcher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_watcher_stops_ticks() {
        let api = StubApi::issuing(&make_token("u", "ADMIN", now_secs() + 3600));
        let calls = api.refresh_counter();
        let (ctrl, _nav) = controller(Some(make_token("u", "ADMIN", now_secs() + 3600)), api, "/");

        let watcher = SessionWatcher::spawn(Arc::new(ctrl), PERIOD);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(watcher.is_running());
        drop(watcher);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
