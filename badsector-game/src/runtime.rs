//! Real-time host for a [`GameSession`] on tokio.
//!
//! Time-driven behaviour runs in one phase-scoped pump task that feeds
//! wall-clock elapsed time into [`GameSession::advance`]. Flavor prompts
//! are answered by detached tasks that lock the session only to record
//! their result.
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::constants::ESCAPE_TICK_PERIOD;
use crate::error::ActionError;
use crate::flavor::{EMPTY_LORE, FALLBACK_LORE, FlavorRequest};
use crate::session::{Action, ActionOutcome, GameSession, SessionSnapshot};
use crate::state::GamePhase;

/// Anything that can turn a prompt into prose.
#[async_trait]
pub trait FlavorTextSource: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Ask `source` for text, never failing: errors and timeouts yield the
/// fallback line and an empty reply yields the placeholder.
pub async fn generate_or_fallback(
    source: &dyn FlavorTextSource,
    prompt: &str,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, source.generate(prompt)).await {
        Ok(Ok(text)) if text.trim().is_empty() => EMPTY_LORE.to_string(),
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            log::warn!("flavor generation failed: {err:#}");
            FALLBACK_LORE.to_string()
        }
        Err(_) => {
            log::warn!("flavor generation timed out after {timeout:?}");
            FALLBACK_LORE.to_string()
        }
    }
}

/// Shared handle to a session driven in real time.
pub type SharedSession = Arc<Mutex<GameSession>>;

struct Pump {
    epoch: u64,
    handle: JoinHandle<()>,
}

/// A session plus the tasks that keep it ticking.
pub struct LiveSession {
    session: SharedSession,
    source: Arc<dyn FlavorTextSource>,
    flavor_timeout: Duration,
    pump: Option<Pump>,
}

impl LiveSession {
    #[must_use]
    pub fn new(
        session: GameSession,
        source: Arc<dyn FlavorTextSource>,
        flavor_timeout: Duration,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            source,
            flavor_timeout,
            pump: None,
        }
    }

    #[must_use]
    pub fn shared(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    /// Apply an action, then start or stop the pump to match the phase.
    /// Flavor prompts raised by the action are handed to detached tasks.
    ///
    /// # Errors
    ///
    /// Whatever [`GameSession::apply`] rejects.
    pub async fn apply(&mut self, action: Action) -> Result<ActionOutcome, ActionError> {
        let (result, phase, epoch, requests) = {
            let mut session = self.session.lock().await;
            let result = session.apply(action);
            (
                result,
                session.phase(),
                session.epoch(),
                session.take_flavor_requests(),
            )
        };
        self.request_flavor(requests);
        self.sync_pump(phase, epoch);
        result
    }

    /// Spawn one detached generator task per request.
    pub fn request_flavor(&self, requests: Vec<FlavorRequest>) {
        for request in requests {
            spawn_flavor(
                Arc::clone(&self.session),
                Arc::clone(&self.source),
                self.flavor_timeout,
                request,
            );
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn phase(&self) -> GamePhase {
        self.session.lock().await.phase()
    }

    /// Whether a pump task is currently running.
    #[must_use]
    pub fn is_pumping(&self) -> bool {
        self.pump
            .as_ref()
            .is_some_and(|pump| !pump.handle.is_finished())
    }

    /// Stop the pump and hand back the session.
    pub async fn shutdown(mut self) -> GameSession {
        self.stop_pump();
        let session = self.session.lock().await;
        session.clone()
    }

    fn sync_pump(&mut self, phase: GamePhase, epoch: u64) {
        if phase != GamePhase::Playing {
            self.stop_pump();
            return;
        }
        let current = self
            .pump
            .as_ref()
            .is_some_and(|pump| pump.epoch == epoch && !pump.handle.is_finished());
        if current {
            return;
        }
        self.stop_pump();
        log::debug!("starting pump for epoch {epoch}");
        let handle = tokio::spawn(pump_loop(
            Arc::clone(&self.session),
            Arc::clone(&self.source),
            self.flavor_timeout,
            epoch,
        ));
        self.pump = Some(Pump { epoch, handle });
    }

    fn stop_pump(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.handle.abort();
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop_pump();
    }
}

async fn pump_loop(
    session: SharedSession,
    source: Arc<dyn FlavorTextSource>,
    flavor_timeout: Duration,
    epoch: u64,
) {
    let mut interval = tokio::time::interval(ESCAPE_TICK_PERIOD);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        interval.tick().await;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(last);
        last = now;

        let requests = {
            let mut guard = session.lock().await;
            if guard.epoch() != epoch || guard.phase() != GamePhase::Playing {
                break;
            }
            guard.advance(elapsed);
            if guard.phase() != GamePhase::Playing {
                log::info!("pump for epoch {epoch} stopping: {}", guard.phase());
                break;
            }
            guard.take_flavor_requests()
        };
        for request in requests {
            spawn_flavor(
                Arc::clone(&session),
                Arc::clone(&source),
                flavor_timeout,
                request,
            );
        }
    }
}

fn spawn_flavor(
    session: SharedSession,
    source: Arc<dyn FlavorTextSource>,
    timeout: Duration,
    request: FlavorRequest,
) {
    tokio::spawn(async move {
        let text = generate_or_fallback(source.as_ref(), &request.prompt, timeout).await;
        session.lock().await.record_flavor(request.answer(text));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Fixed(&'static str);

    #[async_trait]
    impl FlavorTextSource for Fixed {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl FlavorTextSource for Broken {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow!("backend offline"))
        }
    }

    struct Slow;

    #[async_trait]
    impl FlavorTextSource for Slow {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".into())
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn fallback_covers_every_failure() {
        assert_eq!(generate_or_fallback(&Fixed("ichor"), "p", TIMEOUT).await, "ichor");
        assert_eq!(generate_or_fallback(&Fixed(""), "p", TIMEOUT).await, EMPTY_LORE);
        assert_eq!(generate_or_fallback(&Broken, "p", TIMEOUT).await, FALLBACK_LORE);
        assert_eq!(generate_or_fallback(&Slow, "p", TIMEOUT).await, FALLBACK_LORE);
    }

    #[tokio::test(start_paused = true)]
    async fn pump_follows_the_phase() {
        let mut live = LiveSession::new(GameSession::new(9), Arc::new(Fixed("x")), TIMEOUT);
        assert!(!live.is_pumping());
        live.apply(Action::Connect).await.unwrap();
        assert!(live.is_pumping());

        tokio::time::sleep(Duration::from_millis(2_050)).await;
        let snapshot = live.snapshot().await;
        assert!(snapshot.clock_ms >= 2_000, "clock {}", snapshot.clock_ms);

        let session = live.shutdown().await;
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn stamina_regenerates_in_real_time() {
        let mut live = LiveSession::new(GameSession::new(13), Arc::new(Fixed("x")), TIMEOUT);
        live.apply(Action::Connect).await.unwrap();
        let before = live.snapshot().await;
        let outcome = live.apply(Action::salvage("main-office")).await.unwrap();
        let after_salvage = live.snapshot().await;
        assert!((after_salvage.stamina - (before.stamina - 15.0)).abs() < f32::EPSILON);
        if matches!(outcome, ActionOutcome::Salvaged(ref s) if s.is_encounter()) {
            live.apply(Action::Hide).await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        let later = live.snapshot().await;
        assert!(later.stamina > after_salvage.stamina);
    }

    #[tokio::test(start_paused = true)]
    async fn flavor_lands_without_blocking() {
        let mut live = LiveSession::new(GameSession::new(2), Arc::new(Broken), TIMEOUT);
        live.apply(Action::Connect).await.unwrap();
        let epoch = live.snapshot().await.epoch;
        live.request_flavor(vec![FlavorRequest::purge(epoch)]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let lore = live.snapshot().await.lore;
        assert_eq!(lore.len(), 1);
        assert_eq!(lore[0].content, FALLBACK_LORE);
        assert_eq!(lore[0].title, "COMBAT LOG: PURGE");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_flavor_after_restart_is_dropped() {
        let mut live = LiveSession::new(GameSession::new(4), Arc::new(Slow), TIMEOUT);
        live.apply(Action::Connect).await.unwrap();
        let epoch = live.snapshot().await.epoch;
        live.request_flavor(vec![FlavorRequest::purge(epoch)]);

        {
            let shared = live.shared();
            let mut session = shared.lock().await;
            session.state_mut().stats.hp = 0.0;
            assert!(session.fire_timer(crate::timers::TimerKind::Vitals));
            assert_eq!(session.phase(), GamePhase::GameOver);
        }
        live.apply(Action::Restart).await.unwrap();
        assert!(live.is_pumping());

        tokio::time::sleep(TIMEOUT + Duration::from_secs(1)).await;
        let session = live.shutdown().await;
        assert_eq!(session.epoch(), epoch + 1);
        assert!(session.lore().is_empty());
    }
}
