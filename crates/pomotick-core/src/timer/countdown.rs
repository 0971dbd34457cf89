//! Cancellable countdown driver.
//!
//! [`Timer`] wraps a [`TimerEngine`] and runs one tokio task per active
//! run. The task wakes once a second, emits a tick and decrements. A
//! pause flips the engine's running flag and signals the task, which
//! exits without decrementing again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::engine::{Second, TimerEngine};
use super::state::TimerState;
use crate::events::{Listeners, TimerListener};
use crate::notify::{self, LogNotifier, Notifier};

const TICK: Duration = Duration::from_secs(1);
/// Upper bound on how long reset/switch wait for the countdown to exit.
const JOIN_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_NOTIFY_TIMEOUT_SECS: u32 = 10;

struct Countdown {
    handle: JoinHandle<()>,
    stop: Arc<Notify>,
}

/// Handle to a timer and its countdown task.
///
/// All methods take `&self`; share the handle behind an `Arc`. Methods
/// that spawn need to be called from inside a tokio runtime.
pub struct Timer {
    engine: Arc<Mutex<TimerEngine>>,
    listeners: Arc<Listeners>,
    notifier: Arc<dyn Notifier>,
    notify_timeout_secs: u32,
    countdown: Mutex<Option<Countdown>>,
}

impl Timer {
    pub fn new(engine: TimerEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            listeners: Arc::new(Listeners::default()),
            notifier: Arc::new(LogNotifier),
            notify_timeout_secs: DEFAULT_NOTIFY_TIMEOUT_SECS,
            countdown: Mutex::new(None),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, timeout_secs: u32) -> Self {
        self.notifier = notifier;
        self.notify_timeout_secs = timeout_secs;
        self
    }

    pub fn add_listener(&self, listener: impl TimerListener + 'static) {
        self.listeners.add(Arc::new(listener));
    }

    pub fn snapshot(&self) -> TimerState {
        self.engine().state().clone()
    }

    pub fn is_running(&self) -> bool {
        self.engine().is_running()
    }

    /// Start counting down. Returns false if already running or if there
    /// is no tokio runtime to run the countdown on.
    pub fn start(&self) -> bool {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("Cannot start countdown outside a tokio runtime: {e}");
                return false;
            }
        };

        let run = {
            let mut engine = self.engine();
            if !engine.start() {
                return false;
            }
            engine.run()
        };

        let stop = Arc::new(Notify::new());
        let handle = runtime.spawn(run_countdown(
            self.engine.clone(),
            self.listeners.clone(),
            self.notifier.clone(),
            self.notify_timeout_secs,
            run,
            stop.clone(),
        ));

        if let Some(previous) = self.countdown().replace(Countdown { handle, stop }) {
            // A paused run whose task has not noticed yet.
            previous.stop.notify_one();
        }
        true
    }

    /// Stop counting down. Returns false if already stopped. Does not wait
    /// for the countdown task to exit.
    pub fn pause(&self) -> bool {
        let paused = self.engine().pause();
        if paused {
            if let Some(countdown) = self.countdown().as_ref() {
                countdown.stop.notify_one();
            }
        }
        paused
    }

    /// Stop, wait briefly for the countdown to exit, and restore the full
    /// duration of the current mode.
    pub async fn reset(&self) {
        self.stop_and_join().await;
        let tick = self.engine().reset();
        self.listeners.emit(&tick);
    }

    pub fn set_duration(&self, focus_secs: u64, break_secs: u64) {
        self.engine().set_duration(focus_secs, break_secs);
    }

    /// Stop, wait briefly for the countdown to exit, and flip to the
    /// other mode at its full duration.
    pub async fn switch_mode(&self) {
        self.stop_and_join().await;
        let tick = self.engine().switch_mode();
        self.listeners.emit(&tick);
    }

    /// Flush the current state to storage.
    pub fn save(&self) -> bool {
        self.engine().save()
    }

    /// Stop any countdown and flush state. Used on exit.
    pub async fn shutdown(&self) {
        self.stop_and_join().await;
        self.save();
    }

    async fn stop_and_join(&self) {
        {
            let mut engine = self.engine();
            if engine.is_running() {
                engine.pause();
            }
        }

        let countdown = self.countdown().take();
        if let Some(Countdown { handle, stop }) = countdown {
            stop.notify_one();
            debug!("Waiting for countdown to stop");
            match tokio::time::timeout(JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Countdown task failed: {e}"),
                Err(_) => warn!("Countdown did not stop within {JOIN_TIMEOUT:?}"),
            }
        }
    }

    fn engine(&self) -> MutexGuard<'_, TimerEngine> {
        lock(&self.engine)
    }

    fn countdown(&self) -> MutexGuard<'_, Option<Countdown>> {
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(engine: &Mutex<TimerEngine>) -> MutexGuard<'_, TimerEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_countdown(
    engine: Arc<Mutex<TimerEngine>>,
    listeners: Arc<Listeners>,
    notifier: Arc<dyn Notifier>,
    notify_timeout_secs: u32,
    run: u64,
    stop: Arc<Notify>,
) {
    debug!(run, "Countdown started");

    let completion = loop {
        let second = lock(&engine).begin_second(run);
        match second {
            Second::Tick(tick) => listeners.emit(&tick),
            Second::Stopped => break None,
            Second::Completed(completion) => break Some(completion),
        }

        tokio::select! {
            _ = tokio::time::sleep(TICK) => {}
            _ = stop.notified() => break None,
        }

        if !lock(&engine).end_second(run) {
            break None;
        }
    };

    if let Some(completion) = completion {
        listeners.emit(&completion.event);
        notify::dispatch(
            notifier.as_ref(),
            completion.title,
            completion.message,
            notify_timeout_secs,
        );
    }
    debug!(run, "Countdown ending");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::events::Event;
    use crate::timer::TimerMode;

    fn recording_timer(focus: u64, brk: u64) -> (Timer, Arc<Mutex<Vec<Event>>>) {
        let timer = Timer::new(TimerEngine::new(TimerState::new(focus, brk)));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        timer.add_listener(move |e: &Event| sink.lock().unwrap().push(e.clone()));
        (timer, events)
    }

    fn ticks(events: &Mutex<Vec<Event>>) -> Vec<u64> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Tick { remaining_secs, .. } => Some(*remaining_secs),
                _ => None,
            })
            .collect()
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String, u32)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, message: &str, timeout_secs: u32) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap()
                .push((title.into(), message.into(), timeout_secs));
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_focus_countdown_switches_to_break() {
        let (timer, events) = recording_timer(3, 2);
        assert!(timer.start());

        tokio::time::sleep(Duration::from_millis(3500)).await;

        let state = timer.snapshot();
        assert_eq!(state.mode, TimerMode::Break);
        assert_eq!(state.remaining_seconds, 2);
        assert_eq!(state.completed_focus_count, 1);
        assert!(!state.running);
        assert_eq!(ticks(&events), vec![3, 2, 1]);
        assert!(matches!(
            events.lock().unwrap().last(),
            Some(Event::FocusCompleted { count: 1, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_dispatches_notification() {
        let notifier = Arc::new(RecordingNotifier::default());
        let timer = Timer::new(TimerEngine::new(TimerState::new(1, 1)))
            .with_notifier(notifier.clone(), 7);
        timer.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        timer.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![
                ("Pomodoro Completed! 🎉".to_string(), "Time for a break!".to_string(), 7),
                ("Break Finished!".to_string(), "Ready to focus again?".to_string(), 7),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_remaining_time() {
        let (timer, events) = recording_timer(3, 2);
        timer.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(timer.pause());
        assert!(!timer.pause());
        tokio::time::sleep(Duration::from_secs(5)).await;

        let state = timer.snapshot();
        assert_eq!(state.remaining_seconds, 2);
        assert_eq!(state.mode, TimerMode::Focus);
        assert_eq!(ticks(&events), vec![3, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_does_not_spawn_another_countdown() {
        let (timer, _events) = recording_timer(60, 30);
        assert!(timer.start());
        assert!(!timer.start());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(timer.snapshot().remaining_seconds, 59);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_restart_counts_once_per_second() {
        let (timer, _events) = recording_timer(60, 30);
        timer.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        timer.pause();
        timer.start();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(timer.snapshot().remaining_seconds, 58);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_and_restores_duration() {
        let (timer, events) = recording_timer(3, 2);
        timer.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        timer.reset().await;
        assert!(!timer.is_running());
        assert_eq!(timer.snapshot().remaining_seconds, 3);
        assert_eq!(
            events.lock().unwrap().last(),
            Some(&Event::Tick {
                remaining_secs: 3,
                mode: TimerMode::Focus
            })
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(timer.snapshot().remaining_seconds, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn switch_mode_while_running() {
        let (timer, _events) = recording_timer(3, 2);
        timer.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        timer.switch_mode().await;
        let state = timer.snapshot();
        assert_eq!(state.mode, TimerMode::Break);
        assert_eq!(state.remaining_seconds, 2);
        assert!(!state.running);
        assert_eq!(state.completed_focus_count, 0);
    }

    #[test]
    fn start_without_runtime_is_refused() {
        let (timer, _events) = recording_timer(3, 2);
        assert!(!timer.start());
        assert!(!timer.is_running());
    }
}
