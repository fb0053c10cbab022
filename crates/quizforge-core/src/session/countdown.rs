//! Cancellable countdown driving a shared [`TestSession`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{AttemptResult, TestSession, Tick};
use crate::error::SessionError;

/// A session shared between its owner and the countdown task.
pub type SharedSession = Arc<Mutex<TestSession>>;

fn lock(session: &SharedSession) -> MutexGuard<'_, TestSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A tokio task that ticks a session once per interval.
///
/// The task ends on its own once a tick finds the session no longer in
/// progress. Cancelling (or dropping) the handle aborts it immediately.
pub struct Countdown {
    handle: JoinHandle<()>,
    updates: watch::Receiver<Tick>,
}

impl Countdown {
    /// Start ticking `session` every `interval`, first tick one interval from now.
    pub fn spawn(session: SharedSession, interval: Duration) -> Self {
        let initial = match lock(&session).remaining_seconds() {
            Some(remaining_seconds) => Tick::Running { remaining_seconds },
            None => Tick::Inactive,
        };
        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let tick = lock(&session).tick();
                let _ = tx.send(tick);
                if !matches!(tick, Tick::Running { .. }) {
                    break;
                }
            }
        });

        Self {
            handle,
            updates: rx,
        }
    }

    /// Stop ticking. Safe to call more than once.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Receiver of every tick outcome, starting from the state at spawn time.
    pub fn subscribe(&self) -> watch::Receiver<Tick> {
        self.updates.clone()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A session together with the countdown that owns its clock.
///
/// Every transition into `Submitted` made through this type cancels the
/// countdown while still holding the session lock, so no tick can land after.
pub struct TimedSession {
    session: SharedSession,
    countdown: Countdown,
}

impl TimedSession {
    /// Start the clock on an in-progress session, ticking once per second.
    pub fn start(session: TestSession) -> Self {
        Self::start_with_interval(session, Duration::from_secs(1))
    }

    pub fn start_with_interval(session: TestSession, interval: Duration) -> Self {
        let session = Arc::new(Mutex::new(session));
        let countdown = Countdown::spawn(Arc::clone(&session), interval);
        Self { session, countdown }
    }

    pub fn answer(&self, question_index: usize, option_index: usize) -> Result<(), SessionError> {
        lock(&self.session).answer(question_index, option_index)
    }

    pub fn answer_current(&self, option_index: usize) -> Result<(), SessionError> {
        lock(&self.session).answer_current(option_index)
    }

    pub fn navigate(&self, to_index: usize) -> Result<usize, SessionError> {
        lock(&self.session).navigate(to_index)
    }

    pub fn next(&self) -> Result<usize, SessionError> {
        lock(&self.session).next()
    }

    pub fn previous(&self) -> Result<usize, SessionError> {
        lock(&self.session).previous()
    }

    /// Submit manually and stop the clock.
    pub fn submit(&self) -> Result<AttemptResult, SessionError> {
        let mut session = lock(&self.session);
        self.countdown.cancel();
        session.submit().cloned()
    }

    /// Run `f` against the current session state.
    pub fn inspect<R>(&self, f: impl FnOnce(&TestSession) -> R) -> R {
        f(&lock(&self.session))
    }

    pub fn result(&self) -> Option<AttemptResult> {
        lock(&self.session).result().cloned()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::sample_test;
    use crate::session::{SessionState, SubmitReason};

    #[tokio::test(start_paused = true)]
    async fn expiry_submits_and_stops_ticking() {
        let session = TestSession::start_with_time_limit(sample_test(1, 4), 5);
        let timed = TimedSession::start(session);
        timed.answer(0, 0).unwrap();

        time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(timed.inspect(|s| s.remaining_seconds()), Some(1));
        assert_eq!(timed.inspect(|s| s.state()), SessionState::InProgress);

        time::sleep(Duration::from_secs(1)).await;
        let result = timed.result().expect("submitted by the clock");
        assert_eq!(result.reason, SubmitReason::TimeExpired);
        assert_eq!(result.score_percent, 25);

        time::sleep(Duration::from_secs(10)).await;
        assert!(timed.countdown().is_finished());
        assert_eq!(timed.inspect(|s| s.final_score_percent()), Some(25));
        assert_eq!(timed.inspect(|s| s.remaining_seconds()), Some(0));
        assert!(timed.answer(1, 1).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_cancels_countdown() {
        let session = TestSession::start_with_time_limit(sample_test(1, 2), 10);
        let timed = TimedSession::start(session);
        timed.answer(0, 0).unwrap();
        timed.answer(1, 1).unwrap();

        time::sleep(Duration::from_millis(2500)).await;
        let result = timed.submit().unwrap();
        assert_eq!(result.score_percent, 100);
        assert_eq!(result.reason, SubmitReason::Manual);

        time::sleep(Duration::from_secs(20)).await;
        assert!(timed.countdown().is_finished());
        assert_eq!(timed.inspect(|s| s.remaining_seconds()), Some(8));
        assert_eq!(timed.result().unwrap(), result);
        assert!(timed.submit().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_each_tick() {
        let session = TestSession::start_with_time_limit(sample_test(1, 1), 2);
        let timed = TimedSession::start(session);
        let mut updates = timed.countdown().subscribe();
        assert_eq!(*updates.borrow(), Tick::Running { remaining_seconds: 2 });

        updates.changed().await.unwrap();
        assert_eq!(*updates.borrow_and_update(), Tick::Running { remaining_seconds: 1 });
        updates.changed().await.unwrap();
        assert_eq!(*updates.borrow_and_update(), Tick::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_session_never_ticks() {
        let shared: SharedSession = Arc::new(Mutex::new(TestSession::new(1)));
        let countdown = Countdown::spawn(Arc::clone(&shared), Duration::from_secs(1));
        assert_eq!(*countdown.subscribe().borrow(), Tick::Inactive);
        time::sleep(Duration::from_secs(3)).await;
        assert!(countdown.is_finished());
        assert_eq!(lock(&shared).state(), SessionState::Loading);
    }
}
