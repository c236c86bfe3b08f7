//! Dashboard controller
//!
//! Drives sign-in, repository selection and refreshes for one session.
//!
//! A refresh fetches deployments and environments for every selected
//! repository concurrently and commits the result only once all of them
//! succeeded. The first failure fails the whole batch and leaves the
//! displayed state untouched.
//!
//! Each refresh takes a generation number when it starts. When a refresh
//! finishes after a newer one has started, its result is discarded, so a slow
//! request for an old selection never overwrites a newer one.
//!
//! A forced refresh reloads the most recently requested selection, which may
//! still be in flight and not yet displayed.

use crate::state::{DashboardState, RepositoryDashboard};
use futures::future::try_join_all;
use gh_client::{CacheMode, ClientError, DashboardService, RepoOption, SessionId};
use gh_deploy_config::SessionPersistence;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

type Result<T> = std::result::Result<T, ClientError>;

/// What happened to the result of a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The result replaced the dashboard state
    Applied { generation: u64 },
    /// A newer refresh started meanwhile; the result was dropped
    Superseded { generation: u64, latest: u64 },
}

/// Controller for one dashboard session
pub struct DashboardController<P: SessionPersistence> {
    service: DashboardService,
    session: SessionId,
    persistence: Mutex<P>,
    state: Mutex<DashboardState>,
    /// Selection of the latest refresh request, committed or not
    requested: Mutex<Vec<String>>,
    generation: AtomicU64,
}

impl<P: SessionPersistence> DashboardController<P> {
    pub fn new(service: DashboardService, session: SessionId, persistence: P) -> Self {
        Self {
            service,
            session,
            persistence: Mutex::new(persistence),
            state: Mutex::new(DashboardState::default()),
            requested: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Snapshot of the current dashboard state
    pub fn state(&self) -> DashboardState {
        self.lock_state().clone()
    }

    /// Token persisted for this session, if any
    pub fn stored_token(&self) -> Option<String> {
        self.lock_persistence().token(self.session.as_str())
    }

    /// Sign in with a bearer token and load the dashboard
    ///
    /// Creates the session's client, persists the token and then opens the
    /// dashboard with [`start`](Self::start).
    pub async fn sign_in(&self, token: &str) -> Result<RefreshOutcome> {
        self.service.registry().initialize(&self.session, token)?;
        info!("Signed in session {}", self.session);

        if let Err(e) = self
            .lock_persistence()
            .store_token(self.session.as_str(), token)
        {
            warn!("Failed to persist token for {}: {}", self.session, e);
        }
        self.lock_state().auth_required = false;

        self.start().await
    }

    /// List repositories, then restore and refresh the persisted selection
    pub async fn start(&self) -> Result<RefreshOutcome> {
        self.load_repositories().await?;
        self.resume_selection().await
    }

    /// Refresh the persisted selection, skipping repositories no longer listed
    pub async fn resume_selection(&self) -> Result<RefreshOutcome> {
        let persisted = self
            .lock_persistence()
            .selected_repositories(self.session.as_str());
        let selection: Vec<String> = {
            let state = self.lock_state();
            persisted
                .into_iter()
                .filter(|name| state.knows_repository(name))
                .collect()
        };
        debug!("Restored selection for {}: {:?}", self.session, selection);

        self.refresh(&selection).await
    }

    /// Fetch the repository list into the state
    pub async fn load_repositories(&self) -> Result<Vec<RepoOption>> {
        let repositories = self
            .service
            .list_repositories(&self.session)
            .await
            .inspect_err(|e| self.on_error(e))?;

        self.lock_state().repositories = repositories.clone();
        Ok(repositories)
    }

    /// Change the selection, persist it and refresh
    pub async fn select(&self, selection: Vec<String>) -> Result<RefreshOutcome> {
        if let Err(e) = self
            .lock_persistence()
            .store_selected_repositories(self.session.as_str(), &selection)
        {
            warn!("Failed to persist selection for {}: {}", self.session, e);
        }
        self.refresh(&selection).await
    }

    /// Refresh the given selection using cached data where still fresh
    pub async fn refresh(&self, selection: &[String]) -> Result<RefreshOutcome> {
        *self.lock_requested() = selection.to_vec();
        self.refresh_with(&self.service, selection).await
    }

    /// Refresh the latest requested selection bypassing cache reads
    pub async fn force_refresh(&self) -> Result<RefreshOutcome> {
        let selection = self.lock_requested().clone();
        let service = self.service.with_mode(CacheMode::WriteOnly);
        self.refresh_with(&service, &selection).await
    }

    /// Drop the client, cached data, persisted token and displayed state
    pub fn sign_out(&self) {
        self.service.sign_out(&self.session);
        if let Err(e) = self.lock_persistence().clear_token(self.session.as_str()) {
            warn!("Failed to clear token for {}: {}", self.session, e);
        }
        *self.lock_state() = DashboardState::default();
        self.lock_requested().clear();
        info!("Signed out session {}", self.session);
    }

    async fn refresh_with(
        &self,
        service: &DashboardService,
        selection: &[String],
    ) -> Result<RefreshOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Refresh #{} for {}: {} repositories",
            generation,
            self.session,
            selection.len()
        );

        let dashboards = fetch_dashboards(service, &self.session, selection)
            .await
            .inspect_err(|e| self.on_error(e))?;

        let mut state = self.lock_state();
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            warn!(
                "Discarding refresh #{} for {}, #{} is newer",
                generation, self.session, latest
            );
            return Ok(RefreshOutcome::Superseded { generation, latest });
        }

        state.selected = selection.to_vec();
        state.dashboards = dashboards;
        state.generation = generation;
        info!(
            "Applied refresh #{} for {} ({} repositories)",
            generation,
            self.session,
            state.dashboards.len()
        );
        Ok(RefreshOutcome::Applied { generation })
    }

    fn on_error(&self, err: &ClientError) {
        match err {
            ClientError::AuthRequired => {
                warn!("Session {} must re-authenticate", self.session);
                if let Err(e) = self.lock_persistence().clear_token(self.session.as_str()) {
                    warn!("Failed to clear token for {}: {}", self.session, e);
                }
                self.lock_state().auth_required = true;
            }
            other => debug!("Dashboard request failed for {}: {}", self.session, other),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_requested(&self) -> MutexGuard<'_, Vec<String>> {
        self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_persistence(&self) -> MutexGuard<'_, P> {
        self.persistence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fetch deployments and environments of every repository concurrently
async fn fetch_dashboards(
    service: &DashboardService,
    session: &SessionId,
    selection: &[String],
) -> Result<Vec<RepositoryDashboard>> {
    try_join_all(selection.iter().map(|full_name| async move {
        let (deployments, environments) = tokio::try_join!(
            service.list_deployments(session, full_name),
            service.list_environments(session, full_name),
        )?;
        Ok::<_, ClientError>(RepositoryDashboard {
            full_name: full_name.clone(),
            deployments,
            environments,
        })
    }))
    .await
}
