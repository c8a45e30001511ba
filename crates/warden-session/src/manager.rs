//! The session manager: one lazily created session per connected actor.
//!
//! Sessions live in an expire-after-access cache, bypass permission checks
//! in a short-lived expire-after-write cache. Session creation is bound to
//! the thread the manager was built on; that thread is also where the host
//! is expected to call [`SessionManager::tick`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};
use warden_query::RegionQuery;
use warden_regions::{Authorizer, Subject, bypass_permission};
use warden_types::{ActorId, Location, MoveType};

use crate::cache::{Expiry, LoadingCache};
use crate::error::SessionError;
use crate::handler::{HandlerContext, HandlerFactory};
use crate::handlers::default_factories;
use crate::host::{ActorHost, ActorSnapshot};
use crate::session::{CrossingOutcome, Session};

/// Default idle time after which an unused session is dropped.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Default lifetime of a cached bypass answer.
///
/// The bypass cache expires after write, not after access: the lifetime
/// counts from when the answer was computed, so an actor checked on every
/// tick still sees a revoked bypass within this time.
pub const DEFAULT_BYPASS_TTL: Duration = Duration::from_secs(2);

/// Default bound on cached bypass answers.
pub const DEFAULT_BYPASS_MAX_ENTRIES: usize = 1000;

/// Cache tuning for a [`SessionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Drop a session after it has not been used for this long.
    pub session_idle_timeout: Duration,
    /// How long a bypass answer may be served before asking again.
    pub bypass_ttl: Duration,
    /// How many bypass answers are kept at most.
    pub bypass_max_entries: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            bypass_ttl: DEFAULT_BYPASS_TTL,
            bypass_max_entries: DEFAULT_BYPASS_MAX_ENTRIES,
        }
    }
}

/// What one [`SessionManager::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Actors whose session ticked.
    pub ticked: usize,
    /// Actors whose session could not be fetched or ticked.
    pub failed: usize,
    /// Individual handler failures inside ticked sessions.
    pub handler_failures: usize,
    /// Idle sessions dropped before ticking.
    pub evicted: usize,
}

/// A shared, lockable session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Owns every live [`Session`] and routes ticks and crossings to them.
pub struct SessionManager {
    host: Arc<dyn ActorHost>,
    authorizer: Arc<dyn Authorizer>,
    query: RegionQuery,
    factories: Vec<HandlerFactory>,
    sessions: LoadingCache<ActorId, SessionHandle>,
    bypass: LoadingCache<(String, ActorId), bool>,
    main_thread: ThreadId,
}

impl core::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionManager")
            .field("handlers", &self.factories.len())
            .field("sessions", &self.sessions)
            .field("bypass", &self.bypass)
            .field("main_thread", &self.main_thread)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// A manager with the built-in handlers, bound to the calling thread.
    pub fn new(
        host: Arc<dyn ActorHost>,
        authorizer: Arc<dyn Authorizer>,
        query: RegionQuery,
        settings: SessionSettings,
    ) -> Self {
        Self::with_factories(host, authorizer, query, settings, default_factories())
    }

    /// A manager with an explicit handler list, bound to the calling thread.
    pub fn with_factories(
        host: Arc<dyn ActorHost>,
        authorizer: Arc<dyn Authorizer>,
        query: RegionQuery,
        settings: SessionSettings,
        factories: Vec<HandlerFactory>,
    ) -> Self {
        Self {
            host,
            authorizer,
            query,
            factories,
            sessions: LoadingCache::new(Expiry::AfterAccess(settings.session_idle_timeout)),
            bypass: LoadingCache::new(Expiry::AfterWrite(settings.bypass_ttl))
                .with_max_entries(settings.bypass_max_entries),
            main_thread: thread::current().id(),
        }
    }

    /// Add a handler to every session created from now on.
    pub fn register_handler(&mut self, factory: HandlerFactory) {
        self.factories.push(factory);
    }

    /// The region query the sessions resolve flags with.
    pub const fn query(&self) -> &RegionQuery {
        &self.query
    }

    /// Number of cached sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// The actor's session, created and initialized if needed.
    ///
    /// Concurrent calls for the same actor create one session.
    pub fn get(&self, actor: ActorId) -> Result<SessionHandle, SessionError> {
        if thread::current().id() != self.main_thread {
            return Err(SessionError::OffMainThread);
        }
        self.sessions.get_or_try_insert_with(actor, Instant::now(), || {
            self.create_session(actor).map(|s| Arc::new(Mutex::new(s)))
        })
    }

    /// The actor's session if one is live. Never creates one.
    pub fn get_if_present(&self, actor: ActorId) -> Option<SessionHandle> {
        self.sessions.get_if_present(&actor, Instant::now())
    }

    /// Whether the actor may ignore region protection in `world`.
    ///
    /// Answers are cached briefly, so a revoked permission can be honored
    /// for up to the bypass TTL. A failing authorizer means no bypass and
    /// the failure is not cached.
    pub fn has_bypass(&self, actor: ActorId, world: &str) -> bool {
        let key = (world.to_ascii_lowercase(), actor);
        let permission = bypass_permission(world);
        let answer = self.bypass.get_or_try_insert_with(key, Instant::now(), || {
            self.authorizer.has_permission(actor, &permission)
        });
        match answer {
            Ok(bypass) => bypass,
            Err(error) => {
                warn!(actor = %actor, world, %error, "bypass check failed, denying");
                false
            }
        }
    }

    fn create_session(&self, actor: ActorId) -> Result<Session, SessionError> {
        let snapshot = self.host.actor(actor).ok_or(SessionError::ActorOffline(actor))?;
        let subject = subject_of(&snapshot);
        let bypass = self.has_bypass(actor, &snapshot.location.world);
        let handlers = self.factories.iter().map(|factory| factory()).collect();

        let mut session = Session::new(actor, handlers);
        session.initialize(&self.context(&snapshot, &subject, bypass), &self.query)?;
        info!(actor = %actor, name = %snapshot.name, "session created");
        Ok(session)
    }

    fn context<'a>(
        &'a self,
        snapshot: &'a ActorSnapshot,
        subject: &'a Subject,
        bypass: bool,
    ) -> HandlerContext<'a> {
        HandlerContext {
            host: self.host.as_ref(),
            authorizer: self.authorizer.as_ref(),
            actor: snapshot,
            subject,
            now: Utc::now(),
            bypass,
            invincible: false,
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Tick every connected actor's session once.
    ///
    /// A failure for one actor is logged and does not stop the others.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport {
            evicted: self.sessions.cleanup(Instant::now()),
            ..TickReport::default()
        };

        for actor in self.host.online_actors() {
            match self.tick_actor(actor) {
                Ok(failures) => {
                    report.ticked = report.ticked.saturating_add(1);
                    report.handler_failures = report.handler_failures.saturating_add(failures);
                }
                Err(error) => {
                    warn!(actor = %actor, %error, "session tick failed");
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }

        debug!(
            ticked = report.ticked,
            failed = report.failed,
            handler_failures = report.handler_failures,
            evicted = report.evicted,
            "session tick complete"
        );
        report
    }

    fn tick_actor(&self, actor: ActorId) -> Result<usize, SessionError> {
        let handle = self.get(actor)?;
        let snapshot = self.host.actor(actor).ok_or(SessionError::ActorOffline(actor))?;
        let subject = subject_of(&snapshot);
        let bypass = self.has_bypass(actor, &snapshot.location.world);
        let mut session = lock(&handle, actor)?;
        session.tick(&self.context(&snapshot, &subject, bypass), &self.query)
    }

    /// Decide whether an actor may move from `from` to `to`.
    ///
    /// The host calls this whenever a position update changes the block an
    /// actor stands in, and must enforce a [`CrossingOutcome::Denied`] by
    /// putting the actor back.
    pub fn on_cross_boundary(
        &self,
        actor: ActorId,
        from: &Location,
        to: &Location,
        move_type: MoveType,
    ) -> Result<CrossingOutcome, SessionError> {
        let handle = self.get(actor)?;
        let snapshot = self.host.actor(actor).ok_or(SessionError::ActorOffline(actor))?;
        let subject = subject_of(&snapshot);
        let bypass = self.has_bypass(actor, &to.world);
        let mut session = lock(&handle, actor)?;
        session.test_move_to(
            &self.context(&snapshot, &subject, bypass),
            &self.query,
            from,
            to,
            move_type,
        )
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Reset one actor's session and forget its bypass answers.
    ///
    /// Returns `false` if the actor has no live session.
    pub fn reset_state(&self, actor: ActorId) -> Result<bool, SessionError> {
        self.bypass.invalidate_where(|(_, id)| *id == actor);
        let Some(handle) = self.get_if_present(actor) else {
            return Ok(false);
        };
        lock(&handle, actor)?.reset_state();
        debug!(actor = %actor, "session state reset");
        Ok(true)
    }

    /// Reset every live session and clear the bypass cache.
    ///
    /// Returns the number of sessions reset.
    pub fn reset_all_states(&self) -> usize {
        self.bypass.invalidate_all();
        let mut reset = 0_usize;
        for handle in self.sessions.values() {
            match handle.lock() {
                Ok(mut session) => {
                    session.reset_state();
                    reset = reset.saturating_add(1);
                }
                Err(poisoned) => {
                    warn!(actor = %poisoned.get_ref().actor(), "skipping poisoned session");
                }
            }
        }
        info!(sessions = reset, "all session states reset");
        reset
    }

    /// Drop everything held for a disconnected actor.
    pub fn on_disconnect(&self, actor: ActorId) {
        self.sessions.invalidate(&actor);
        self.bypass.invalidate_where(|(_, id)| *id == actor);
        debug!(actor = %actor, "session dropped");
    }

    /// Drop idle sessions and stale bypass answers. Returns how many
    /// sessions went.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        self.bypass.cleanup(now);
        self.sessions.cleanup(now)
    }
}

fn subject_of(snapshot: &ActorSnapshot) -> Subject {
    Subject::Actor {
        id: snapshot.id,
        groups: snapshot.groups.clone(),
    }
}

fn lock(handle: &SessionHandle, actor: ActorId) -> Result<MutexGuard<'_, Session>, SessionError> {
    handle.lock().map_err(|_poisoned| SessionError::Poisoned(actor))
}
