use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{Effect, PlaybackConfig, PlaybackEvent, PlaybackMachine, PlaybackSnapshot, TimerId};
use crate::models::Subject;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("playback session {0} is closed")]
    Closed(Uuid),
}

/// Handle to a running playback session.
///
/// The machine lives on its own task and sees events one at a time, so
/// timer expiries and user actions never interleave inside a transition.
/// Dropping every handle ends the session the same way `teardown` does.
pub struct PlaybackHandle {
    id: Uuid,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
}

impl PlaybackHandle {
    /// Start a session for `subject` on the current tokio runtime
    pub fn spawn(subject: Subject, config: PlaybackConfig) -> Self {
        let id = Uuid::new_v4();
        let machine = PlaybackMachine::new(subject, config);
        let (events, inbox) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(machine.snapshot());

        let driver = Driver {
            id,
            machine,
            timers: HashMap::new(),
            timer_events: events.downgrade(),
            root: CancellationToken::new(),
            publisher,
        };
        tokio::spawn(driver.run(inbox));

        Self {
            id,
            events,
            snapshots,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn send(&self, event: PlaybackEvent) -> Result<(), PlaybackError> {
        self.events
            .send(event)
            .map_err(|_| PlaybackError::Closed(self.id))
    }

    pub fn play(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::Play)
    }

    pub fn select_episode(&self, episode: u32) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::SelectEpisode(episode))
    }

    pub fn select_season(&self, season: u32) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::SelectSeason(season))
    }

    pub fn next_episode(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::NextEpisode)
    }

    pub fn previous_episode(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::PreviousEpisode)
    }

    pub fn embed_ready(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::EmbedReady)
    }

    pub fn embed_failed(&self, message: impl Into<String>) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::EmbedFailed(message.into()))
    }

    pub fn cancel_autoplay(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::CancelAutoplay)
    }

    pub fn teardown(&self) -> Result<(), PlaybackError> {
        self.send(PlaybackEvent::Teardown)
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }
}

#[derive(Debug, Clone, Copy)]
enum TimerSchedule {
    Once(Duration),
    Every(Duration),
}

struct ArmedTimer {
    token: CancellationToken,
    repeating: bool,
}

struct Driver {
    id: Uuid,
    machine: PlaybackMachine,
    timers: HashMap<TimerId, ArmedTimer>,
    /// Weak so that timers alone do not keep the session alive
    timer_events: mpsc::WeakUnboundedSender<PlaybackEvent>,
    /// Parent of every timer token
    root: CancellationToken,
    publisher: watch::Sender<PlaybackSnapshot>,
}

impl Driver {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<PlaybackEvent>) {
        tracing::debug!(session = %self.id, "Playback session started");

        while let Some(event) = inbox.recv().await {
            if let PlaybackEvent::TimerFired(id) = &event {
                if self.timers.get(id).is_some_and(|t| !t.repeating) {
                    self.timers.remove(id);
                }
            }

            for effect in self.machine.handle(event) {
                self.apply(effect);
            }
            self.publisher.send_replace(self.machine.snapshot());

            if self.machine.is_closed() {
                break;
            }
        }

        self.root.cancel();
        tracing::debug!(session = %self.id, "Playback session ended");
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Schedule { id, after } => self.arm(id, TimerSchedule::Once(after)),
            Effect::StartTicker { id, every } => self.arm(id, TimerSchedule::Every(every)),
            Effect::Cancel(id) => {
                if let Some(timer) = self.timers.remove(&id) {
                    timer.token.cancel();
                }
            }
            Effect::LoadEmbed(reference) => {
                tracing::info!(session = %self.id, "Loading embed {}", reference);
            }
            Effect::ShowError(message) => {
                tracing::warn!(session = %self.id, "Playback error: {}", message);
            }
        }
    }

    fn arm(&mut self, id: TimerId, schedule: TimerSchedule) {
        let token = self.root.child_token();
        tokio::spawn(run_timer(
            id,
            schedule,
            token.clone(),
            self.timer_events.clone(),
        ));
        self.timers.insert(
            id,
            ArmedTimer {
                token,
                repeating: matches!(schedule, TimerSchedule::Every(_)),
            },
        );
    }
}

async fn run_timer(
    id: TimerId,
    schedule: TimerSchedule,
    token: CancellationToken,
    events: mpsc::WeakUnboundedSender<PlaybackEvent>,
) {
    let (first, period) = match schedule {
        TimerSchedule::Once(after) => (after, None),
        TimerSchedule::Every(every) => (every, Some(every)),
    };
    let mut deadline = tokio::time::Instant::now() + first;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep_until(deadline) => {
                let Some(events) = events.upgrade() else { break };
                if events.send(PlaybackEvent::TimerFired(id)).is_err() {
                    break;
                }
                match period {
                    Some(period) => deadline += period,
                    None => break,
                }
            }
        }
    }
}
