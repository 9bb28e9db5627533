use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::db::KeyValueStore;
use crate::errors::SessionError;
use crate::models::{seed_interviews, ApplicationStatus, Interview, JobApplication, UserProfile};

pub const PROFILE_KEY: &str = "hirebot_profile";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub shortlisted: usize,
    pub in_review: usize,
    pub rejected: usize,
    pub interviews: usize,
}

pub struct Session {
    // `onboarded` is derived from this, so the two can never disagree.
    profile: Option<UserProfile>,
    applications: Vec<JobApplication>,
    interviews: Vec<Interview>,
    is_auto_applying: bool,
    storage: Box<dyn KeyValueStore + Send>,
}

impl Session {
    pub fn new(storage: Box<dyn KeyValueStore + Send>) -> Self {
        Self {
            profile: None,
            applications: Vec::new(),
            interviews: seed_interviews(),
            is_auto_applying: false,
            storage,
        }
    }

    pub fn onboarded(&self) -> bool {
        self.profile.is_some()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn applications(&self) -> &[JobApplication] {
        &self.applications
    }

    pub fn recent(&self, limit: usize) -> &[JobApplication] {
        &self.applications[..limit.min(self.applications.len())]
    }

    pub fn interviews(&self) -> &[Interview] {
        &self.interviews
    }

    pub fn is_auto_applying(&self) -> bool {
        self.is_auto_applying
    }

    pub fn target_role(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .map(|p| p.role.as_str())
            .filter(|role| !role.is_empty())
    }

    pub fn stats(&self) -> DashboardStats {
        let count = |status: ApplicationStatus| {
            self.applications.iter().filter(|a| a.status == status).count()
        };
        DashboardStats {
            total: self.applications.len(),
            shortlisted: count(ApplicationStatus::Shortlisted),
            in_review: count(ApplicationStatus::InReview),
            rejected: count(ApplicationStatus::Rejected),
            interviews: self.interviews.len(),
        }
    }

    /// The in-memory state is updated even when the write fails.
    pub fn complete_onboarding(&mut self, profile: UserProfile) -> Result<(), SessionError> {
        let persisted = serde_json::to_string(&profile)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.set(PROFILE_KEY, &json));

        info!(name = %profile.name, role = %profile.role, "onboarding complete");
        self.profile = Some(profile);

        persisted.map_err(|e| {
            warn!("failed to persist profile: {e:#}");
            SessionError::Persist(e)
        })
    }

    pub fn set_auto_applying(&mut self, active: bool) {
        if self.is_auto_applying != active {
            debug!(active, "auto-apply toggled");
        }
        self.is_auto_applying = active;
    }

    // Duplicate ids are accepted, only logged.
    pub fn add_application(&mut self, app: JobApplication) {
        if self.applications.iter().any(|a| a.id == app.id) {
            warn!(id = %app.id, "duplicate application id");
        }
        debug!(id = %app.id, company = %app.company_name, "application added");
        self.applications.insert(0, app);
    }

    pub fn reset_session(&mut self) -> Result<(), SessionError> {
        let cleared = self.storage.remove(PROFILE_KEY);

        self.profile = None;
        self.applications.clear();
        self.interviews = seed_interviews();
        self.is_auto_applying = false;
        info!("session reset");

        cleared.map_err(|e| {
            warn!("failed to clear persisted profile: {e:#}");
            SessionError::Clear(e)
        })
    }

    pub fn load_persisted_profile(&mut self) {
        let raw = match self.storage.get(PROFILE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                error!("failed to read saved profile: {e:#}");
                return;
            }
        };

        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => {
                debug!(name = %profile.name, "loaded saved profile");
                self.profile = Some(profile);
            }
            Err(e) => {
                error!("failed to load saved profile, discarding it: {e}");
                if let Err(e) = self.storage.remove(PROFILE_KEY) {
                    warn!("failed to discard malformed profile: {e:#}");
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
    changes: Arc<watch::Sender<u64>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(session)),
            changes: Arc::new(changes),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        let session = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let result = {
            let mut session = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut session)
        };
        self.changes.send_modify(|version| *version += 1);
        result
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::tests::sample_profile;
    use crate::models::Platform;
    use anyhow::anyhow;

    pub(crate) fn memory_session() -> Session {
        Session::new(Box::new(Database::open_in_memory().unwrap()))
    }

    pub(crate) fn application(id: &str) -> JobApplication {
        JobApplication {
            id: id.to_string(),
            company_name: "Vercel".to_string(),
            role: "Fullstack".to_string(),
            platform: Platform::Indeed,
            status: ApplicationStatus::Applied,
            applied_date: "Just now".to_string(),
            match_score: 80,
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow!("disk on fire"))
        }
        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk on fire"))
        }
        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    #[test]
    fn test_initial_state() {
        let session = memory_session();
        assert!(!session.onboarded());
        assert!(session.profile().is_none());
        assert!(session.applications().is_empty());
        assert_eq!(session.interviews().len(), 1);
        assert!(!session.is_auto_applying());
    }

    #[test]
    fn test_add_application_is_lifo() {
        let mut session = memory_session();
        for i in 0..10 {
            session.add_application(application(&format!("app{i}")));
            assert_eq!(session.applications().len(), i + 1);
            assert_eq!(session.applications()[0].id, format!("app{i}"));
        }
        assert_eq!(session.applications().last().unwrap().id, "app0");
        assert_eq!(session.recent(5).len(), 5);
        assert_eq!(session.recent(5)[0].id, "app9");
    }

    #[test]
    fn test_duplicate_ids_are_accepted() {
        let mut session = memory_session();
        session.add_application(application("same"));
        session.add_application(application("same"));
        assert_eq!(session.applications().len(), 2);
    }

    #[test]
    fn test_profile_round_trips_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hirebot.db");

        let mut first = Session::new(Box::new(Database::open(&path).unwrap()));
        first.complete_onboarding(sample_profile()).unwrap();
        assert!(first.onboarded());
        drop(first);

        let mut second = Session::new(Box::new(Database::open(&path).unwrap()));
        assert!(!second.onboarded());
        second.load_persisted_profile();
        assert!(second.onboarded());
        assert_eq!(second.profile(), Some(&sample_profile()));
    }

    #[test]
    fn test_malformed_profile_is_discarded() {
        let db = Database::open_in_memory().unwrap();
        db.set(PROFILE_KEY, "{not json").unwrap();
        let mut session = Session::new(Box::new(db));

        session.load_persisted_profile();
        assert!(!session.onboarded());
        assert!(session.profile().is_none());

        // the bad value is gone, so a second load is a clean no-op
        session.load_persisted_profile();
        assert!(!session.onboarded());
    }

    #[test]
    fn test_storage_failures_do_not_block_state() {
        let mut session = Session::new(Box::new(BrokenStore));

        session.load_persisted_profile();
        assert!(!session.onboarded());

        let result = session.complete_onboarding(sample_profile());
        assert!(matches!(result, Err(SessionError::Persist(_))));
        assert!(session.onboarded());
        assert_eq!(session.target_role(), Some("Backend Engineer"));

        let result = session.reset_session();
        assert!(matches!(result, Err(SessionError::Clear(_))));
        assert!(!session.onboarded());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = memory_session();
        session.complete_onboarding(sample_profile()).unwrap();
        session.add_application(application("a"));
        session.set_auto_applying(true);

        session.reset_session().unwrap();
        assert!(!session.onboarded());
        assert!(session.profile().is_none());
        assert!(session.applications().is_empty());
        assert!(!session.is_auto_applying());

        session.load_persisted_profile();
        assert!(!session.onboarded());
    }

    #[test]
    fn test_set_auto_applying_is_idempotent() {
        let mut session = memory_session();
        session.set_auto_applying(true);
        session.set_auto_applying(true);
        assert!(session.is_auto_applying());
        session.set_auto_applying(false);
        assert!(!session.is_auto_applying());
    }

    #[test]
    fn test_target_role_ignores_empty_role() {
        let mut session = memory_session();
        assert_eq!(session.target_role(), None);
        let mut profile = sample_profile();
        profile.role = String::new();
        session.complete_onboarding(profile.clone()).unwrap();
        assert_eq!(session.target_role(), None);

        // only the empty string counts as absent
        profile.role = "  ".to_string();
        session.complete_onboarding(profile).unwrap();
        assert_eq!(session.target_role(), Some("  "));
    }

    #[test]
    fn test_stats_count_by_status() {
        let mut session = memory_session();
        let statuses = [
            ApplicationStatus::Applied,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::InReview,
            ApplicationStatus::Rejected,
            ApplicationStatus::InterviewScheduled,
        ];
        for (i, status) in statuses.iter().enumerate() {
            let mut app = application(&i.to_string());
            app.status = *status;
            session.add_application(app);
        }

        assert_eq!(
            session.stats(),
            DashboardStats {
                total: 6,
                shortlisted: 2,
                in_review: 1,
                rejected: 1,
                interviews: 1,
            }
        );
    }

    #[test]
    fn test_handle_announces_updates() {
        let handle = SessionHandle::new(memory_session());
        let mut changes = handle.subscribe();
        assert!(!changes.has_changed().unwrap());

        handle.update(|s| s.add_application(application("x")));
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), 1);
        assert_eq!(handle.read(|s| s.applications().len()), 1);
    }
}
