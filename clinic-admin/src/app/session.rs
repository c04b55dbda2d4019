use clinic_api::{ApiError, ClinicApi, Credentials, NewUser, ProfileData, Session, UserId};

use super::status::{failure_message, OperationStatus};
use crate::storage::SessionStorage;

/// The signed-in identity, its profile, and the status of the last auth call.
///
/// A token exists exactly when `session` is `Some`.
#[derive(Debug)]
pub struct SessionStore {
    session: Option<Session>,
    profile: Option<ProfileData>,
    status: OperationStatus,
    storage: SessionStorage,
}

impl SessionStore {
    /// Start signed out, ignoring whatever `storage` holds.
    pub fn signed_out(storage: SessionStorage) -> Self {
        Self {
            session: None,
            profile: None,
            status: OperationStatus::Idle,
            storage,
        }
    }

    /// Restore the persisted session, if any. An unreadable record counts as
    /// signed out.
    pub fn restore(storage: SessionStorage) -> Self {
        let session = match storage.load() {
            Ok(session) => session.filter(Session::has_token),
            Err(e) => {
                tracing::warn!("ignoring stored session: {:#}", e);
                None
            }
        };
        if let Some(session) = &session {
            tracing::debug!(
                "restored session for user {} from {}",
                session.user_id,
                storage.path().display()
            );
        }

        Self {
            session,
            ..Self::signed_out(storage)
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn profile(&self) -> Option<&ProfileData> {
        self.profile.as_ref()
    }

    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.status.error()
    }

    pub async fn login(
        &mut self,
        api: &dyn ClinicApi,
        credentials: &Credentials,
    ) -> Option<Session> {
        self.status.begin();
        let result = api.login(credentials).await;
        self.accept_session(result, "Login failed")
    }

    pub async fn register(&mut self, api: &dyn ClinicApi, new_user: &NewUser) -> Option<Session> {
        self.status.begin();
        let result = api.register(new_user).await;
        self.accept_session(result, "Registration failed")
    }

    /// Tell the server, then clear local state whatever it answered.
    pub async fn logout(&mut self, api: &dyn ClinicApi) {
        self.status.begin();

        let remote = match self.session.as_ref() {
            Some(session) => Some(api.logout(&session.token).await),
            None => None,
        };

        self.session = None;
        self.profile = None;
        if let Err(e) = self.storage.clear() {
            tracing::warn!("failed to clear stored session: {:#}", e);
        }

        match remote {
            Some(Err(e)) => {
                tracing::warn!("logout request failed, session cleared locally: {}", e);
                self.status.fail(failure_message(&e, "Logout failed"));
            }
            _ => self.status.succeed(),
        }
    }

    pub async fn fetch_profile(
        &mut self,
        api: &dyn ClinicApi,
        user_id: &UserId,
    ) -> Option<ProfileData> {
        self.status.begin();

        let Some(session) = self.session.as_ref() else {
            self.status.fail("Not logged in");
            return None;
        };
        if &session.user_id != user_id {
            tracing::warn!(
                "profile requested for {} but signed in as {}",
                user_id,
                session.user_id
            );
            self.status
                .fail(format!("Profile of {} is not available to this session", user_id));
            return None;
        }

        match api.profile(&session.token).await {
            Ok(profile) => {
                self.profile = Some(profile.clone());
                self.status.succeed();
                Some(profile)
            }
            Err(e) => {
                tracing::warn!("profile fetch failed: {}", e);
                self.status
                    .fail(failure_message(&e, "Get user profile data failed"));
                None
            }
        }
    }

    fn accept_session(
        &mut self,
        result: Result<Session, ApiError>,
        generic: &str,
    ) -> Option<Session> {
        match result {
            Ok(session) if !session.has_token() => {
                tracing::warn!("server returned a session without a token");
                self.status
                    .fail(format!("{}: server returned no token", generic));
                None
            }
            Ok(session) => {
                if let Err(e) = self.storage.save(&session) {
                    tracing::warn!("session will not survive a restart: {:#}", e);
                }
                tracing::info!("signed in as {}", session.user_id);
                self.session = Some(session.clone());
                self.profile = None;
                self.status.succeed();
                Some(session)
            }
            Err(e) => {
                tracing::warn!("{}: {}", generic, e);
                self.status.fail(failure_message(&e, generic));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DevBackend;
    use tempfile::TempDir;

    fn store() -> (SessionStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::restore(SessionStorage::in_dir(dir.path()));
        (store, dir)
    }

    #[tokio::test]
    async fn login_stores_session_in_memory_and_on_disk() {
        let api = DevBackend::seeded();
        let (mut store, dir) = store();

        let session = store
            .login(&api, &Credentials::new("alice", "pw"))
            .await
            .unwrap();

        assert!(!session.token.is_empty());
        assert_eq!(store.token(), Some(session.token.as_str()));
        assert_eq!(store.status(), &OperationStatus::Idle);

        let restored = SessionStore::restore(SessionStorage::in_dir(dir.path()));
        assert_eq!(restored.session(), Some(&session));
    }

    #[tokio::test]
    async fn profile_fetch_sends_session_token() {
        let api = DevBackend::seeded();
        let (mut store, _dir) = store();

        let session = store
            .login(&api, &Credentials::new("alice", "pw"))
            .await
            .unwrap();
        let profile = store.fetch_profile(&api, &session.user_id).await.unwrap();

        assert_eq!(profile.last_name, "Moreau");
        assert_eq!(store.profile(), Some(&profile));
        assert_eq!(store.token(), Some(session.token.as_str()));
        let calls = api.requests_to("GET /auth/profile");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].token.as_deref(), Some(session.token.as_str()));
    }

    #[tokio::test]
    async fn failed_login_records_server_message() {
        let api = DevBackend::seeded();
        let (mut store, dir) = store();

        let session = store.login(&api, &Credentials::new("alice", "nope")).await;

        assert!(session.is_none());
        assert!(!store.is_authenticated());
        assert_eq!(store.last_error(), Some("Bad credentials"));
        assert!(!SessionStorage::in_dir(dir.path()).path().exists());
    }

    #[tokio::test]
    async fn network_failure_uses_generic_message() {
        let api = DevBackend::seeded();
        api.set_offline(true);
        let (mut store, _dir) = store();

        store.login(&api, &Credentials::new("alice", "pw")).await;
        assert_eq!(store.last_error(), Some("Login failed"));
    }

    #[tokio::test]
    async fn failed_login_keeps_existing_session() {
        let api = DevBackend::seeded();
        let (mut store, _dir) = store();
        store.login(&api, &Credentials::new("alice", "pw")).await;

        store.login(&api, &Credentials::new("alice", "bad")).await;
        assert!(store.is_authenticated());
        assert!(store.status().error().is_some());
    }

    #[tokio::test]
    async fn register_signs_in_new_user() {
        let api = DevBackend::seeded();
        let (mut store, _dir) = store();

        let session = store
            .register(
                &api,
                &NewUser {
                    username: "bob".into(),
                    password: "pw".into(),
                    first_name: "Bob".into(),
                    last_name: "Stone".into(),
                    email: "bob@clinic.test".into(),
                    role: "USER".into(),
                },
            )
            .await
            .unwrap();

        assert_eq!(session.email, "bob@clinic.test");
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn failed_register_uses_generic_message_without_server_text() {
        let api = DevBackend::seeded();
        api.set_offline(true);
        let (mut store, _dir) = store();

        let user = NewUser {
            username: "bob".into(),
            password: "pw".into(),
            first_name: "Bob".into(),
            last_name: "Stone".into(),
            email: "bob@clinic.test".into(),
            role: "USER".into(),
        };
        assert!(store.register(&api, &user).await.is_none());
        assert_eq!(store.last_error(), Some("Registration failed"));
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_server_fails() {
        let api = DevBackend::seeded();
        let (mut store, dir) = store();
        store.login(&api, &Credentials::new("alice", "pw")).await;

        api.fail_logout();
        store.logout(&api).await;

        assert!(!store.is_authenticated());
        assert_eq!(store.token(), None);
        assert_eq!(store.last_error(), Some("Logout failed"));
        assert!(SessionStore::restore(SessionStorage::in_dir(dir.path()))
            .session()
            .is_none());
    }

    #[tokio::test]
    async fn logout_clears_session_when_offline() {
        let api = DevBackend::seeded();
        let (mut store, _dir) = store();
        store.login(&api, &Credentials::new("alice", "pw")).await;

        api.set_offline(true);
        store.logout(&api).await;
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn logout_without_session_skips_server() {
        let api = DevBackend::seeded();
        let (mut store, _dir) = store();

        store.logout(&api).await;
        assert!(api.requests_to("POST /auth/logout").is_empty());
        assert_eq!(store.status(), &OperationStatus::Idle);
    }

    #[tokio::test]
    async fn profile_requires_session() {
        let api = DevBackend::seeded();
        let (mut store, _dir) = store();

        assert!(store.fetch_profile(&api, &UserId::new("u-1")).await.is_none());
        assert_eq!(store.last_error(), Some("Not logged in"));
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn profile_for_other_user_is_rejected() {
        let api = DevBackend::seeded();
        let (mut store, _dir) = store();
        store.login(&api, &Credentials::new("alice", "pw")).await;

        assert!(store.fetch_profile(&api, &UserId::new("u-9")).await.is_none());
        assert!(store.status().error().is_some());
        assert!(api.requests_to("GET /auth/profile").is_empty());
    }

    #[test]
    fn corrupt_storage_restores_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SessionStorage::in_dir(dir.path());
        std::fs::write(storage.path(), "garbage").unwrap();

        assert!(!SessionStore::restore(storage).is_authenticated());
    }
}
