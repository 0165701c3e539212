//! Playback sequencing
//!
//! The player's episode selection and autoplay-to-next logic, as a pure state
//! machine ([`PlaybackMachine`]) plus a tokio driver ([`PlaybackHandle`]) that
//! owns its timers. The machine never touches a clock: it asks for timers
//! through [`Effect`]s and is told when they fire, which keeps every
//! transition testable without waiting.

mod driver;
mod embed;
mod machine;

pub use driver::{PlaybackError, PlaybackHandle};
pub use embed::EmbedReference;
pub use machine::{
    Effect, PlaybackEvent, PlaybackMachine, PlaybackSession, PlaybackSnapshot, PlaybackState,
    TimerId,
};

use std::time::Duration;

/// Timing and surface settings for a playback session
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// How long an episode is assumed to play before autoplay kicks in
    pub episode_window: Duration,
    /// The countdown starts this long before the window ends
    pub countdown_lead: Duration,
    /// Countdown length in ticks
    pub countdown_secs: u32,
    /// Countdown tick period
    pub tick: Duration,
    /// Playback surface the resolver query is appended to
    pub player_path: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            episode_window: Duration::from_secs(300),
            countdown_lead: Duration::from_secs(10),
            countdown_secs: 10,
            tick: Duration::from_secs(1),
            player_path: "/video.html".to_string(),
        }
    }
}

impl PlaybackConfig {
    /// Delay between an embed becoming ready and the countdown starting
    pub fn duration_timer_delay(&self) -> Duration {
        self.episode_window.saturating_sub(self.countdown_lead)
    }
}
