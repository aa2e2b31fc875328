use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};

use crate::config;
use crate::contexts::Db;
use crate::error::Result;
use crate::users::roles::{is_admin_fail_closed, RoleChecker};
use crate::users::session::{SessionId, UserInfo, UserSession};
use crate::users::user::UserCredentials;
use crate::users::userdb::{SessionChange, UserDb};

const DEFAULT_LOOKUP_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolverPhase {
    Unresolved,
    ResolvingRole,
    ResolvedAdmin,
    ResolvedNonAdmin,
    ResolvedAnonymous,
}

/// The process-wide view of (session, identity, admin flag). There is exactly
/// one writer, the resolver task; readers receive it through a watch channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub phase: ResolverPhase,
    pub user: Option<UserInfo>,
    pub session: Option<UserSession>,
    pub is_admin: bool,
    /// `true` until the first resolution settles and while a role lookup for
    /// a fresh session is in flight. Readers render a waiting indicator and
    /// take no gating decision while this is set.
    pub loading: bool,
}

impl AuthState {
    fn unresolved() -> Self {
        Self {
            phase: ResolverPhase::Unresolved,
            user: None,
            session: None,
            is_admin: false,
            loading: true,
        }
    }

    fn resolving(session: UserSession) -> Self {
        Self {
            phase: ResolverPhase::ResolvingRole,
            user: Some(session.user.clone()),
            session: Some(session),
            is_admin: false,
            loading: true,
        }
    }

    fn anonymous() -> Self {
        Self {
            phase: ResolverPhase::ResolvedAnonymous,
            user: None,
            session: None,
            is_admin: false,
            loading: false,
        }
    }

    fn resolved(session: UserSession, is_admin: bool) -> Self {
        Self {
            phase: if is_admin {
                ResolverPhase::ResolvedAdmin
            } else {
                ResolverPhase::ResolvedNonAdmin
            },
            user: Some(session.user.clone()),
            session: Some(session),
            is_admin,
            loading: false,
        }
    }
}

enum ResolverEvent {
    SessionChanged(SessionChange),
    RoleResolved { generation: u64, is_admin: bool },
}

/// Maintains the authoritative (session, identity, admin flag) tuple for the
/// lifetime of the running client and keeps it synchronized with the identity
/// provider.
///
/// Two entry points race to perform the first resolution: the one-shot
/// restore query issued at startup and the provider's change-notification
/// stream. Both are funneled into one coordinating task, so state updates are
/// applied strictly sequentially; a generation counter ties every role lookup
/// to the session change that triggered it and stale completions are dropped.
pub struct SessionResolver<U> {
    user_db: Db<U>,
    state: watch::Receiver<AuthState>,
    events: mpsc::UnboundedSender<ResolverEvent>,
}

impl<U> SessionResolver<U>
where
    U: UserDb + 'static,
{
    /// Spawns the resolver task. `restore` is the persisted session id of a
    /// previous run, if any; it is validated against the provider
    /// concurrently with the change stream.
    pub async fn start(
        user_db: Db<U>,
        roles: Arc<dyn RoleChecker>,
        restore: Option<SessionId>,
    ) -> Self {
        let lookup_timeout = config::get_config_element::<config::RoleLookup>()
            .map(|roles| Duration::from_secs(roles.timeout_seconds))
            .unwrap_or(Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECONDS));

        let (state_tx, state_rx) = watch::channel(AuthState::unresolved());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let changes = user_db.read().await.session_changes();

        let task = ResolverTask {
            state: state_tx,
            events: events_rx,
            events_tx: events_tx.clone(),
            roles,
            lookup_timeout,
            generation: 0,
            current: None,
        };
        tokio::spawn(task.run(changes));

        match restore {
            Some(session_id) => {
                let user_db = user_db.clone();
                let events = events_tx.clone();
                tokio::spawn(async move {
                    let restored = user_db.read().await.session(session_id).await.ok();
                    let _ = events.send(ResolverEvent::SessionChanged(restored));
                });
            }
            None => {
                let _ = events_tx.send(ResolverEvent::SessionChanged(None));
            }
        }

        Self {
            user_db,
            state: state_rx,
            events: events_tx,
        }
    }

    pub fn current_state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Readers gate on the received state; they never mutate it directly.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Delegates credential verification to the provider. On success the
    /// state update arrives through the provider's change stream rather than
    /// this call mutating state itself. A rejection is surfaced to the caller
    /// and not retried.
    pub async fn sign_in(&self, credentials: UserCredentials) -> Result<()> {
        self.user_db
            .write()
            .await
            .login(credentials)
            .await
            .map(|_session| ())
    }

    /// Requests session termination from the provider, then unconditionally
    /// drops identity and admin flag. The anonymous state is reached even
    /// when the provider rejects the call; callers send the user back to the
    /// sign-in entry point once the state settles.
    pub async fn sign_out(&self) {
        let session_id = self.state.borrow().session.as_ref().map(|s| s.id);
        if let Some(id) = session_id {
            if let Err(error) = self.user_db.write().await.logout(id).await {
                tracing::warn!(%error, "sign-out rejected by the identity provider");
            }
        }

        let _ = self.events.send(ResolverEvent::SessionChanged(None));
    }
}

struct ResolverTask {
    state: watch::Sender<AuthState>,
    events: mpsc::UnboundedReceiver<ResolverEvent>,
    events_tx: mpsc::UnboundedSender<ResolverEvent>,
    roles: Arc<dyn RoleChecker>,
    lookup_timeout: Duration,
    generation: u64,
    current: Option<UserSession>,
}

impl ResolverTask {
    async fn run(
        mut self,
        mut changes: tokio::sync::broadcast::Receiver<SessionChange>,
    ) {
        let mut changes_closed = false;

        loop {
            tokio::select! {
                change = changes.recv(), if !changes_closed => match change {
                    Ok(change) => self.handle_session_change(change),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "session change stream lagged");
                    }
                    Err(RecvError::Closed) => changes_closed = true,
                },
                event = self.events.recv() => match event {
                    Some(ResolverEvent::SessionChanged(change)) => {
                        self.handle_session_change(change);
                    }
                    Some(ResolverEvent::RoleResolved { generation, is_admin }) => {
                        self.handle_role_resolved(generation, is_admin);
                    }
                    None => break,
                },
            }
        }
    }

    fn handle_session_change(&mut self, change: SessionChange) {
        // every session change supersedes any in-flight role lookup
        self.generation += 1;

        match change {
            None => {
                self.current = None;
                let _ = self.state.send(AuthState::anonymous());
            }
            Some(session) => {
                self.current = Some(session.clone());
                let _ = self.state.send(AuthState::resolving(session.clone()));

                let generation = self.generation;
                let roles = self.roles.clone();
                let events = self.events_tx.clone();
                let timeout = self.lookup_timeout;
                tokio::spawn(async move {
                    let is_admin =
                        is_admin_fail_closed(roles.as_ref(), session.user.id, timeout).await;
                    let _ = events.send(ResolverEvent::RoleResolved {
                        generation,
                        is_admin,
                    });
                });
            }
        }
    }

    fn handle_role_resolved(&mut self, generation: u64, is_admin: bool) {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding role lookup result for superseded session"
            );
            return;
        }

        let Some(session) = self.current.clone() else {
            return;
        };
        let _ = self.state.send(AuthState::resolved(session, is_admin));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::users::hashmap_userdb::HashMapUserDb;
    use crate::users::roles::{HashMapRoleDb, Role, RoleDb};
    use crate::users::user::{UserId, UserRegistration};
    use crate::users::userdb::UserDb;
    use crate::util::user_input::UserInput;
    use crate::util::Identifier;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    const EMAIL: &str = "foo@agency.example";
    const PASSWORD: &str = "secret123";

    async fn user_db_with_user() -> (Db<HashMapUserDb>, UserId) {
        let user_db: Db<HashMapUserDb> = Arc::new(RwLock::new(HashMapUserDb::default()));
        let user_id = user_db
            .write()
            .await
            .register(
                UserRegistration {
                    email: EMAIL.into(),
                    password: PASSWORD.into(),
                }
                .validated()
                .unwrap(),
            )
            .await
            .unwrap();
        (user_db, user_id)
    }

    async fn admin_checker(user_id: UserId) -> Arc<dyn RoleChecker> {
        let role_db: Db<HashMapRoleDb> = Arc::new(RwLock::new(HashMapRoleDb::default()));
        role_db
            .write()
            .await
            .assign_role(user_id, Role::admin_role_id())
            .await
            .unwrap();
        Arc::new(role_db)
    }

    fn non_admin_checker() -> Arc<dyn RoleChecker> {
        let role_db: Db<HashMapRoleDb> = Arc::new(RwLock::new(HashMapRoleDb::default()));
        Arc::new(role_db)
    }

    fn credentials() -> UserCredentials {
        UserCredentials {
            email: EMAIL.into(),
            password: PASSWORD.into(),
        }
    }

    /// Waits for a state matching `pred`, checking the admin/identity
    /// invariant on every observed state along the way.
    async fn wait_for(
        rx: &mut watch::Receiver<AuthState>,
        pred: impl Fn(&AuthState) -> bool,
    ) -> AuthState {
        let waiter = async {
            loop {
                let state = rx.borrow().clone();
                assert!(
                    !(state.is_admin && state.user.is_none()),
                    "admin flag without identity"
                );
                if pred(&state) {
                    return state;
                }
                rx.changed().await.expect("resolver task should be alive");
            }
        };
        tokio::time::timeout(Duration::from_secs(30), waiter)
            .await
            .expect("state should settle")
    }

    fn settled(state: &AuthState) -> bool {
        !state.loading
    }

    #[tokio::test]
    async fn starts_unresolved_and_loading() {
        let (user_db, _user_id) = user_db_with_user().await;
        let resolver = SessionResolver::start(user_db, non_admin_checker(), None).await;

        // the initial state is visible before the first resolution completes
        let state = resolver.current_state();
        if state.phase == ResolverPhase::Unresolved {
            assert!(state.loading);
            assert!(!state.is_admin);
        }
    }

    #[tokio::test]
    async fn no_restore_resolves_anonymous() {
        let (user_db, _user_id) = user_db_with_user().await;
        let resolver = SessionResolver::start(user_db, non_admin_checker(), None).await;

        let mut states = resolver.subscribe();
        let state = wait_for(&mut states, settled).await;

        assert_eq!(state.phase, ResolverPhase::ResolvedAnonymous);
        assert!(state.user.is_none());
        assert!(!state.is_admin);
    }

    #[tokio::test]
    async fn restore_resolves_admin() {
        let (user_db, user_id) = user_db_with_user().await;
        let session = user_db.write().await.login(credentials()).await.unwrap();

        let resolver = SessionResolver::start(
            user_db,
            admin_checker(user_id).await,
            Some(session.id),
        )
        .await;

        let mut states = resolver.subscribe();
        let state = wait_for(&mut states, settled).await;

        assert_eq!(state.phase, ResolverPhase::ResolvedAdmin);
        assert!(state.is_admin);
        assert_eq!(state.user.unwrap().id, user_id);
    }

    #[tokio::test]
    async fn restore_of_unknown_session_resolves_anonymous() {
        let (user_db, user_id) = user_db_with_user().await;

        let resolver = SessionResolver::start(
            user_db,
            admin_checker(user_id).await,
            Some(SessionId::new()),
        )
        .await;

        let mut states = resolver.subscribe();
        let state = wait_for(&mut states, settled).await;

        assert_eq!(state.phase, ResolverPhase::ResolvedAnonymous);
        assert!(!state.is_admin);
    }

    #[tokio::test]
    async fn sign_in_resolves_non_admin() {
        let (user_db, _user_id) = user_db_with_user().await;
        let resolver = SessionResolver::start(user_db, non_admin_checker(), None).await;

        let mut states = resolver.subscribe();
        wait_for(&mut states, settled).await;

        resolver.sign_in(credentials()).await.unwrap();

        let state = wait_for(&mut states, |state| {
            settled(state) && state.user.is_some()
        })
        .await;

        assert_eq!(state.phase, ResolverPhase::ResolvedNonAdmin);
        assert!(!state.is_admin);
    }

    #[tokio::test]
    async fn sign_in_with_bad_credentials_is_surfaced() {
        let (user_db, _user_id) = user_db_with_user().await;
        let resolver = SessionResolver::start(user_db, non_admin_checker(), None).await;

        let mut states = resolver.subscribe();
        wait_for(&mut states, settled).await;

        let result = resolver
            .sign_in(UserCredentials {
                email: EMAIL.into(),
                password: "wrong password".into(),
            })
            .await;

        assert!(matches!(result, Err(Error::LoginFailed)));
        assert_eq!(
            resolver.current_state().phase,
            ResolverPhase::ResolvedAnonymous
        );
    }

    #[tokio::test]
    async fn sign_out_always_ends_anonymous() {
        let (user_db, user_id) = user_db_with_user().await;
        let resolver =
            SessionResolver::start(user_db.clone(), admin_checker(user_id).await, None).await;

        let mut states = resolver.subscribe();
        wait_for(&mut states, settled).await;

        resolver.sign_in(credentials()).await.unwrap();
        let state = wait_for(&mut states, |state| settled(state) && state.is_admin).await;
        assert_eq!(state.phase, ResolverPhase::ResolvedAdmin);

        resolver.sign_out().await;

        let state = wait_for(&mut states, |state| {
            settled(state) && state.user.is_none()
        })
        .await;
        assert_eq!(state.phase, ResolverPhase::ResolvedAnonymous);
        assert!(!state.is_admin);
    }

    #[tokio::test]
    async fn sign_out_without_session_is_a_no_op_transition() {
        let (user_db, _user_id) = user_db_with_user().await;
        let resolver = SessionResolver::start(user_db, non_admin_checker(), None).await;

        let mut states = resolver.subscribe();
        wait_for(&mut states, settled).await;

        resolver.sign_out().await;

        let state = wait_for(&mut states, settled).await;
        assert_eq!(state.phase, ResolverPhase::ResolvedAnonymous);
    }

    struct ScriptedRoleChecker {
        // per-user lookup delay and outcome; `None` simulates a provider error
        script: HashMap<UserId, (Duration, Option<bool>)>,
    }

    #[async_trait]
    impl RoleChecker for ScriptedRoleChecker {
        async fn is_admin(&self, user: UserId) -> crate::error::Result<bool> {
            let (delay, outcome) = self
                .script
                .get(&user)
                .copied()
                .unwrap_or((Duration::ZERO, Some(false)));
            tokio::time::sleep(delay).await;
            outcome.ok_or(Error::RoleLookupFailed { user })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_role_lookup_is_discarded() {
        let user_db: Db<HashMapUserDb> = Arc::new(RwLock::new(HashMapUserDb::default()));
        let admin_id = user_db
            .write()
            .await
            .register(
                UserRegistration {
                    email: "admin@agency.example".into(),
                    password: PASSWORD.into(),
                }
                .validated()
                .unwrap(),
            )
            .await
            .unwrap();
        let visitor_id = user_db
            .write()
            .await
            .register(
                UserRegistration {
                    email: "visitor@agency.example".into(),
                    password: PASSWORD.into(),
                }
                .validated()
                .unwrap(),
            )
            .await
            .unwrap();

        // the admin's lookup is slow but below the configured timeout
        let checker = Arc::new(ScriptedRoleChecker {
            script: HashMap::from([
                (admin_id, (Duration::from_millis(500), Some(true))),
                (visitor_id, (Duration::ZERO, Some(false))),
            ]),
        });

        let resolver = SessionResolver::start(user_db.clone(), checker, None).await;
        let mut states = resolver.subscribe();
        wait_for(&mut states, settled).await;

        resolver
            .sign_in(UserCredentials {
                email: "admin@agency.example".into(),
                password: PASSWORD.into(),
            })
            .await
            .unwrap();

        wait_for(&mut states, |state| {
            state.phase == ResolverPhase::ResolvingRole
        })
        .await;

        // a second sign-in supersedes the admin's in-flight lookup
        resolver
            .sign_in(UserCredentials {
                email: "visitor@agency.example".into(),
                password: PASSWORD.into(),
            })
            .await
            .unwrap();

        let state = wait_for(&mut states, |state| {
            settled(state) && state.user.is_some()
        })
        .await;
        assert_eq!(state.phase, ResolverPhase::ResolvedNonAdmin);
        assert_eq!(state.user.as_ref().unwrap().id, visitor_id);

        // let the admin's lookup response land; it must not overwrite
        tokio::time::sleep(Duration::from_secs(2)).await;

        let state = resolver.current_state();
        assert_eq!(state.phase, ResolverPhase::ResolvedNonAdmin);
        assert_eq!(state.user.unwrap().id, visitor_id);
        assert!(!state.is_admin);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_timeout_resolves_non_admin() {
        let (user_db, user_id) = user_db_with_user().await;

        // longer than the one-second lookup timeout of the test settings
        let checker = Arc::new(ScriptedRoleChecker {
            script: HashMap::from([(user_id, (Duration::from_secs(60), Some(true)))]),
        });

        let resolver = SessionResolver::start(user_db, checker, None).await;
        let mut states = resolver.subscribe();
        wait_for(&mut states, settled).await;

        resolver.sign_in(credentials()).await.unwrap();

        let state = wait_for(&mut states, |state| {
            settled(state) && state.user.is_some()
        })
        .await;

        assert_eq!(state.phase, ResolverPhase::ResolvedNonAdmin);
        assert!(!state.is_admin);
    }

    #[tokio::test]
    async fn lookup_failure_resolves_non_admin() {
        let (user_db, user_id) = user_db_with_user().await;

        let checker = Arc::new(ScriptedRoleChecker {
            script: HashMap::from([(user_id, (Duration::ZERO, None))]),
        });

        let resolver = SessionResolver::start(user_db, checker, None).await;
        let mut states = resolver.subscribe();
        wait_for(&mut states, settled).await;

        resolver.sign_in(credentials()).await.unwrap();

        let state = wait_for(&mut states, |state| {
            settled(state) && state.user.is_some()
        })
        .await;

        assert_eq!(state.phase, ResolverPhase::ResolvedNonAdmin);
        assert!(!state.is_admin);
    }
}
