//! Session context.
//!
//! Process-wide authentication state: the current auth header, the user's
//! profile, and the features they can reach. A [`Session`] is constructed
//! once per application and passed to whatever needs it; clones share state.
//!
//! # State machine
//!
//! - `Anonymous`: no credentials, no user, no features.
//! - `Authenticated`: credentials stored; user and features may still be
//!   loading.
//!
//! [`Session::set_auth`] is the only transition. Entering (or re-entering)
//! `Authenticated` persists the credentials first, then spawns a background
//! refresh of features and profile. Refresh failures are logged and never
//! end the session; only `set_auth(None, None)` does.

use std::fmt;
use std::sync::Arc;

use icycon_core::{Feature, Identifier, Profile, ProfileUpdate};
use parking_lot::{Mutex, RwLock};
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::api::SignupResponse;
use crate::credentials::{CredentialRecord, Credentials};
use crate::error::ApiError;
use crate::executor::ApiClient;

/// Whether the session currently holds credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
}

#[derive(Default)]
struct SessionState {
    auth_header: Option<SecretString>,
    user: Option<Profile>,
    features: Option<Vec<Feature>>,
    /// Bumped on every transition; refreshes from older generations are dropped.
    generation: u64,
    /// Bumped whenever an explicit edit sets the profile; a refresh fetch
    /// that started before the edit is dropped.
    profile_version: u64,
}

/// Authentication state shared across the application.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    /// Lock order: `state` before the credential store's internal lock.
    state: RwLock<SessionState>,
    refresh: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status())
            .field("user", &self.user().map(|u| u.username))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build the session from whatever the credential store holds.
    ///
    /// With a stored record the session starts `Authenticated`, showing the
    /// cached profile until the background refresh replaces it. The refresh
    /// is only spawned when called inside a Tokio runtime.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let record = client.credentials().load();

        let state = record.map_or_else(SessionState::default, |record| SessionState {
            auth_header: Some(record.credentials.basic_auth_header()),
            user: record.cached_profile,
            features: None,
            generation: 0,
            profile_version: 0,
        });
        let restored = state.auth_header.is_some();

        let session = Self {
            inner: Arc::new(SessionInner {
                client,
                state: RwLock::new(state),
                refresh: Mutex::new(None),
            }),
        };

        if restored {
            tracing::info!("Restored session from stored credentials");
            session.spawn_refresh(0);
        }

        session
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The API client this session drives.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.inner.state.read().auth_header.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Current `Authorization` header value, if authenticated.
    #[must_use]
    pub fn auth_header(&self) -> Option<SecretString> {
        self.inner.state.read().auth_header.clone()
    }

    /// Current user, possibly the cached snapshot awaiting refresh.
    #[must_use]
    pub fn user(&self) -> Option<Profile> {
        self.inner.state.read().user.clone()
    }

    /// Available features, or `None` while anonymous or not yet fetched.
    #[must_use]
    pub fn features(&self) -> Option<Vec<Feature>> {
        self.inner.state.read().features.clone()
    }

    // =========================================================================
    // Transition
    // =========================================================================

    /// Set or clear the session's credentials.
    ///
    /// With credentials: the record (with `user` as its cached profile) is
    /// persisted before this returns, the in-memory user becomes `user`, and
    /// a refresh of features and profile is spawned.
    ///
    /// With `None`: the stored record is removed and user and features are
    /// cleared. `user` is ignored.
    pub fn set_auth(&self, credentials: Option<Credentials>, user: Option<Profile>) {
        let store = self.inner.client.credentials();

        let Some(credentials) = credentials else {
            {
                let mut state = self.inner.state.write();
                store.clear();
                state.generation += 1;
                state.auth_header = None;
                state.user = None;
                state.features = None;
            }
            if let Some(task) = self.inner.refresh.lock().take() {
                task.abort();
            }
            tracing::info!("Session cleared");
            return;
        };

        let generation = {
            let mut state = self.inner.state.write();
            let auth_header = credentials.basic_auth_header();
            store.save(&CredentialRecord::new(credentials, user.clone()));
            state.generation += 1;
            state.auth_header = Some(auth_header);
            state.user = user;
            state.features = None;
            state.generation
        };

        tracing::info!("Session authenticated");
        self.spawn_refresh(generation);
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Log in and make the returned profile current.
    ///
    /// # Errors
    ///
    /// Returns the backend's error when the credentials are rejected; the
    /// session is left unchanged in that case.
    #[instrument(skip(self, password), fields(identifier = %identifier))]
    pub async fn login(
        &self,
        identifier: Identifier,
        password: SecretString,
    ) -> Result<Profile, ApiError> {
        let response = self.inner.client.login(&identifier, &password).await?;
        self.set_auth(
            Some(Credentials::new(identifier, password)),
            Some(response.user.clone()),
        );
        Ok(response.user)
    }

    /// Create an account and log in with it.
    ///
    /// The signup response has no profile, so the user stays `None` until
    /// the background refresh fetches it.
    ///
    /// # Errors
    ///
    /// Returns the backend's error when the signup is rejected; the session
    /// is left unchanged in that case.
    #[instrument(skip(self, password), fields(email = %email, username = %username))]
    pub async fn signup(
        &self,
        email: Identifier,
        username: &str,
        password: SecretString,
    ) -> Result<SignupResponse, ApiError> {
        let response = self
            .inner
            .client
            .signup(&email, username, &password)
            .await?;
        self.set_auth(Some(Credentials::new(email, password)), None);
        Ok(response)
    }

    /// End the session.
    pub fn logout(&self) {
        self.set_auth(None, None);
    }

    /// Update the profile and make the result current.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; local state is untouched on failure.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let profile = self.inner.client.update_profile(update).await?;
        self.remember_profile(&profile);
        Ok(profile)
    }

    /// Upload an avatar and make the resulting profile current.
    ///
    /// # Errors
    ///
    /// Returns the backend's error; local state is untouched on failure.
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Profile, ApiError> {
        let profile = self.inner.client.upload_avatar(file_name, bytes).await?;
        self.remember_profile(&profile);
        Ok(profile)
    }

    /// Wait for the in-flight background refresh, if any, to finish.
    pub async fn wait_for_refresh(&self) {
        let task = self.inner.refresh.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            tracing::warn!(error = %e, "Background refresh task failed");
        }
    }

    // =========================================================================
    // Background refresh
    // =========================================================================

    fn spawn_refresh(&self, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No Tokio runtime, skipping background refresh");
            return;
        };

        let session = self.clone();
        let task = runtime.spawn(async move { session.refresh(generation).await });

        if let Some(previous) = self.inner.refresh.lock().replace(task) {
            previous.abort();
        }
    }

    /// Fetch features then profile. Each failure is logged and leaves the
    /// previous value in place.
    #[instrument(skip(self))]
    async fn refresh(&self, generation: u64) {
        match self.inner.client.fetch_features().await {
            Ok(list) => {
                let mut state = self.inner.state.write();
                if state.generation == generation {
                    state.features = Some(list.features);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to refresh features"),
        }

        let profile_version = self.inner.state.read().profile_version;
        match self.inner.client.fetch_profile().await {
            Ok(profile) => {
                let mut state = self.inner.state.write();
                if state.generation == generation && state.profile_version == profile_version {
                    self.inner.client.credentials().save_profile(&profile);
                    state.user = Some(profile);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to refresh profile"),
        }
    }

    fn remember_profile(&self, profile: &Profile) {
        let mut state = self.inner.state.write();
        if state.auth_header.is_some() {
            self.inner.client.credentials().save_profile(profile);
            state.profile_version += 1;
            state.user = Some(profile.clone());
        }
    }
}
