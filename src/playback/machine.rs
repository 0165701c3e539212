use std::time::Duration;

use super::{EmbedReference, PlaybackConfig};
use crate::models::{Season, Subject};

/// Identifies one armed timer. Ids are never reused within a machine, so a
/// timer that fires after being superseded is recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    AutoplayCountdown,
}

/// Inputs to the machine: user actions, embed outcomes and timer expiries
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Play,
    SelectEpisode(u32),
    SelectSeason(u32),
    NextEpisode,
    PreviousEpisode,
    EmbedReady,
    EmbedFailed(String),
    CancelAutoplay,
    TimerFired(TimerId),
    Teardown,
}

/// Work the machine asks its driver to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Arm a one-shot timer
    Schedule { id: TimerId, after: Duration },
    /// Arm a repeating timer
    StartTicker { id: TimerId, every: Duration },
    Cancel(TimerId),
    LoadEmbed(EmbedReference),
    ShowError(String),
}

/// Selection and timer bookkeeping for one viewing session
#[derive(Debug, Clone, Default)]
pub struct PlaybackSession {
    pub selected_season: Option<u32>,
    pub selected_episode: Option<u32>,
    pub embed_reference: Option<EmbedReference>,
    pub autoplay_armed: bool,
    /// Seconds left on the autoplay countdown, 0 when disarmed
    pub countdown_remaining: u32,
    duration_timer: Option<TimerId>,
    countdown_ticker: Option<TimerId>,
}

impl PlaybackSession {
    pub fn active_timers(&self) -> usize {
        self.duration_timer.iter().count() + self.countdown_ticker.iter().count()
    }
}

/// Observable state published to the player
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub selected_season: Option<u32>,
    pub selected_episode: Option<u32>,
    pub embed_reference: Option<EmbedReference>,
    pub autoplay_armed: bool,
    pub countdown_remaining: u32,
    pub last_error: Option<String>,
    pub closed: bool,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Next,
    Previous,
}

/// Episode sequencing state machine for one subject.
///
/// At most one timer (episode duration or countdown ticker) is armed at any
/// time. Every transition that selects a new item cancels the armed timer
/// before anything else is scheduled.
pub struct PlaybackMachine {
    subject: Subject,
    config: PlaybackConfig,
    state: PlaybackState,
    session: Option<PlaybackSession>,
    last_error: Option<String>,
    next_timer: u64,
    closed: bool,
}

impl PlaybackMachine {
    pub fn new(subject: Subject, config: PlaybackConfig) -> Self {
        Self {
            subject,
            config,
            state: PlaybackState::Idle,
            session: None,
            last_error: None,
            next_timer: 0,
            closed: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// `None` until the first selection or play action
    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn active_timer_count(&self) -> usize {
        self.session
            .as_ref()
            .map(PlaybackSession::active_timers)
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let session = self.session.clone().unwrap_or_default();
        PlaybackSnapshot {
            state: self.state,
            selected_season: session.selected_season,
            selected_episode: session.selected_episode,
            embed_reference: session.embed_reference,
            autoplay_armed: session.autoplay_armed,
            countdown_remaining: session.countdown_remaining,
            last_error: self.last_error.clone(),
            closed: self.closed,
        }
    }

    /// Apply one event and return the effects it requires
    pub fn handle(&mut self, event: PlaybackEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.closed {
            tracing::debug!("Ignoring {:?} on a closed playback session", event);
            return effects;
        }

        match event {
            PlaybackEvent::Play => self.on_play(&mut effects),
            PlaybackEvent::SelectEpisode(n) => self.on_select_episode(n, &mut effects),
            PlaybackEvent::SelectSeason(n) => self.on_select_season(n, &mut effects),
            PlaybackEvent::NextEpisode => self.on_step(Direction::Next, &mut effects),
            PlaybackEvent::PreviousEpisode => self.on_step(Direction::Previous, &mut effects),
            PlaybackEvent::EmbedReady => self.on_embed_ready(&mut effects),
            PlaybackEvent::EmbedFailed(message) => self.on_embed_failed(message, &mut effects),
            PlaybackEvent::CancelAutoplay => self.on_cancel_autoplay(&mut effects),
            PlaybackEvent::TimerFired(id) => self.on_timer(id, &mut effects),
            PlaybackEvent::Teardown => self.on_teardown(&mut effects),
        }

        debug_assert!(self.active_timer_count() <= 1);
        effects
    }

    // ------------------------------------------------------------------
    // Event handlers
    // ------------------------------------------------------------------

    fn on_play(&mut self, effects: &mut Vec<Effect>) {
        if self.state != PlaybackState::Idle {
            return;
        }

        if self.subject.is_movie() {
            self.load(None, None, effects);
            return;
        }

        let target = {
            let season = self
                .selected_season()
                .or_else(|| self.subject.first_season());
            season.and_then(|season| {
                let remembered = self
                    .session
                    .as_ref()
                    .and_then(|s| s.selected_episode)
                    .and_then(|n| season.episode(n));
                remembered
                    .or_else(|| season.first_episode())
                    .map(|e| (season.season_number, e.episode_number))
            })
        };

        match target {
            Some((season, episode)) => self.load(Some(season), Some(episode), effects),
            None => self.fail("No episodes available".to_string(), effects),
        }
    }

    fn on_select_episode(&mut self, episode: u32, effects: &mut Vec<Effect>) {
        if self.subject.is_movie() {
            return;
        }

        let season = match self
            .selected_season()
            .or_else(|| self.subject.first_season())
        {
            Some(season) if season.episode(episode).is_some() => season.season_number,
            _ => {
                tracing::debug!("Episode {} not in the selected season", episode);
                return;
            }
        };

        self.load(Some(season), Some(episode), effects);
    }

    fn on_select_season(&mut self, season_number: u32, effects: &mut Vec<Effect>) {
        if self.subject.is_movie() {
            return;
        }

        let first = match self.subject.season(season_number) {
            Some(season) => season.first_episode().map(|e| e.episode_number),
            None => {
                tracing::debug!("Season {} not found", season_number);
                return;
            }
        };

        match (self.state, first) {
            (_, None) => {
                // Nothing to play: keep whatever is on screen, stop autoplay
                self.cancel_timers(effects);
                if self.state == PlaybackState::AutoplayCountdown {
                    self.state = PlaybackState::Playing;
                }
                let session = self.session.get_or_insert_with(PlaybackSession::default);
                session.selected_season = Some(season_number);
                session.selected_episode = None;
            }
            (PlaybackState::Idle, Some(episode)) => {
                let session = self.session.get_or_insert_with(PlaybackSession::default);
                session.selected_season = Some(season_number);
                session.selected_episode = Some(episode);
            }
            (_, Some(episode)) => self.load(Some(season_number), Some(episode), effects),
        }
    }

    fn on_step(&mut self, direction: Direction, effects: &mut Vec<Effect>) {
        if let Some((season, episode)) = self.neighbour(direction) {
            self.load(Some(season), Some(episode), effects);
        }
    }

    fn on_embed_ready(&mut self, effects: &mut Vec<Effect>) {
        if self.state != PlaybackState::Loading {
            return;
        }

        let id = self.next_timer_id();
        let after = self.config.duration_timer_delay();
        if let Some(session) = self.session.as_mut() {
            session.duration_timer = Some(id);
            session.autoplay_armed = true;
            effects.push(Effect::Schedule { id, after });
        }
        self.state = PlaybackState::Playing;
    }

    fn on_embed_failed(&mut self, message: String, effects: &mut Vec<Effect>) {
        if self.state != PlaybackState::Loading {
            return;
        }

        self.cancel_timers(effects);
        self.state = PlaybackState::Idle;
        self.fail(message, effects);
    }

    fn on_cancel_autoplay(&mut self, effects: &mut Vec<Effect>) {
        if self.state != PlaybackState::AutoplayCountdown {
            return;
        }

        self.cancel_timers(effects);
        self.state = PlaybackState::Playing;
    }

    fn on_timer(&mut self, id: TimerId, effects: &mut Vec<Effect>) {
        let (duration, ticker) = match self.session.as_ref() {
            Some(s) => (s.duration_timer, s.countdown_ticker),
            None => return,
        };

        if duration == Some(id) && self.state == PlaybackState::Playing {
            self.on_duration_elapsed(effects);
        } else if ticker == Some(id) && self.state == PlaybackState::AutoplayCountdown {
            self.on_countdown_tick(effects);
        } else {
            tracing::debug!("Ignoring superseded timer {:?}", id);
        }
    }

    fn on_duration_elapsed(&mut self, effects: &mut Vec<Effect>) {
        let has_next = self.neighbour(Direction::Next).is_some();
        let ticker = self.next_timer_id();
        let countdown = self.config.countdown_secs;
        let every = self.config.tick;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.duration_timer = None;

        if !has_next {
            session.autoplay_armed = false;
            tracing::debug!("Episode window elapsed with no next episode");
            return;
        }

        session.countdown_ticker = Some(ticker);
        session.countdown_remaining = countdown;
        effects.push(Effect::StartTicker { id: ticker, every });
        self.state = PlaybackState::AutoplayCountdown;
    }

    fn on_countdown_tick(&mut self, effects: &mut Vec<Effect>) {
        let remaining = self
            .session
            .as_ref()
            .map(|s| s.countdown_remaining)
            .unwrap_or(0);

        if remaining > 1 {
            if let Some(session) = self.session.as_mut() {
                session.countdown_remaining = remaining - 1;
            }
            return;
        }

        match self.neighbour(Direction::Next) {
            Some((season, episode)) => {
                tracing::info!("Autoplay advancing to S{}E{}", season, episode);
                self.load(Some(season), Some(episode), effects);
            }
            None => {
                self.cancel_timers(effects);
                self.state = PlaybackState::Playing;
            }
        }
    }

    fn on_teardown(&mut self, effects: &mut Vec<Effect>) {
        self.cancel_timers(effects);
        self.state = PlaybackState::Idle;
        self.closed = true;
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn selected_season(&self) -> Option<&Season> {
        self.session
            .as_ref()
            .and_then(|s| s.selected_season)
            .and_then(|n| self.subject.season(n))
    }

    fn neighbour(&self, direction: Direction) -> Option<(u32, u32)> {
        if self.subject.is_movie() {
            return None;
        }
        let season = self.selected_season()?;
        let current = self.session.as_ref()?.selected_episode?;
        let episode = match direction {
            Direction::Next => season.next_after(current),
            Direction::Previous => season.previous_before(current),
        }?;
        Some((season.season_number, episode.episode_number))
    }

    fn next_timer_id(&mut self) -> TimerId {
        self.next_timer += 1;
        TimerId(self.next_timer)
    }

    fn cancel_timers(&mut self, effects: &mut Vec<Effect>) {
        if let Some(session) = self.session.as_mut() {
            if let Some(id) = session.duration_timer.take() {
                effects.push(Effect::Cancel(id));
            }
            if let Some(id) = session.countdown_ticker.take() {
                effects.push(Effect::Cancel(id));
            }
            session.autoplay_armed = false;
            session.countdown_remaining = 0;
        }
    }

    /// Select an item and enter `Loading`
    fn load(&mut self, season: Option<u32>, episode: Option<u32>, effects: &mut Vec<Effect>) {
        self.cancel_timers(effects);

        let embed = {
            let season_ref = season.and_then(|n| self.subject.season(n));
            let episode_ref = season_ref.and_then(|s| episode.and_then(|n| s.episode(n)));
            EmbedReference::for_selection(
                &self.subject,
                season_ref,
                episode_ref,
                &self.config.player_path,
            )
        };

        let session = self.session.get_or_insert_with(PlaybackSession::default);
        session.selected_season = season;
        session.selected_episode = episode;
        session.embed_reference = Some(embed.clone());

        self.last_error = None;
        self.state = PlaybackState::Loading;
        effects.push(Effect::LoadEmbed(embed));
    }

    fn fail(&mut self, message: String, effects: &mut Vec<Effect>) {
        tracing::warn!("Playback failed for {}: {}", self.subject.subject_id, message);
        self.last_error = Some(message.clone());
        effects.push(Effect::ShowError(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectType;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn series() -> Subject {
        Subject {
            subject_id: "1001".to_string(),
            detail_path: "some-show".to_string(),
            title: "Some Show".to_string(),
            kind: SubjectType::Series,
            seasons: vec![
                Season::from_listing(1, 3, None),
                Season::from_listing(2, 2, None),
                Season::from_listing(3, 0, None),
                Season::from_listing(4, 1, None),
            ],
        }
    }

    fn movie() -> Subject {
        Subject {
            subject_id: "2002".to_string(),
            detail_path: "some-film".to_string(),
            title: "Some Film".to_string(),
            kind: SubjectType::Movie,
            seasons: Vec::new(),
        }
    }

    fn machine() -> PlaybackMachine {
        PlaybackMachine::new(series(), PlaybackConfig::default())
    }

    fn duration_timer(m: &PlaybackMachine) -> TimerId {
        m.session().and_then(|s| s.duration_timer).unwrap()
    }

    fn countdown_ticker(m: &PlaybackMachine) -> TimerId {
        m.session().and_then(|s| s.countdown_ticker).unwrap()
    }

    /// Select an episode and let its embed load
    fn playing(m: &mut PlaybackMachine, episode: u32) {
        m.handle(PlaybackEvent::SelectEpisode(episode));
        m.handle(PlaybackEvent::EmbedReady);
        assert_eq!(m.state(), PlaybackState::Playing);
    }

    fn run_countdown(m: &mut PlaybackMachine) -> Vec<Effect> {
        let ticker = countdown_ticker(m);
        let mut last = Vec::new();
        for _ in 0..PlaybackConfig::default().countdown_secs {
            last = m.handle(PlaybackEvent::TimerFired(ticker));
        }
        last
    }

    #[test]
    fn test_play_selects_first_episode() {
        let mut m = machine();
        let effects = m.handle(PlaybackEvent::Play);

        assert_eq!(m.state(), PlaybackState::Loading);
        let snap = m.snapshot();
        assert_eq!(snap.selected_season, Some(1));
        assert_eq!(snap.selected_episode, Some(1));
        assert!(matches!(effects.as_slice(), [Effect::LoadEmbed(EmbedReference::Resolver(_))]));
    }

    #[test]
    fn test_embed_ready_arms_duration_timer_before_window_ends() {
        let mut m = machine();
        m.handle(PlaybackEvent::Play);
        let effects = m.handle(PlaybackEvent::EmbedReady);

        assert_eq!(
            effects,
            vec![Effect::Schedule {
                id: duration_timer(&m),
                after: Duration::from_secs(290),
            }]
        );
        assert!(m.snapshot().autoplay_armed);
    }

    #[test]
    fn test_autoplay_advances_from_second_to_third_episode() {
        let mut m = machine();
        playing(&mut m, 2);

        let effects = m.handle(PlaybackEvent::TimerFired(duration_timer(&m)));
        assert_eq!(m.state(), PlaybackState::AutoplayCountdown);
        assert_eq!(m.snapshot().countdown_remaining, 10);
        assert!(matches!(effects.as_slice(), [Effect::StartTicker { .. }]));

        let ticker = countdown_ticker(&m);
        let effects = run_countdown(&mut m);

        assert_eq!(m.state(), PlaybackState::Loading);
        assert_eq!(m.snapshot().selected_episode, Some(3));
        assert_eq!(effects[0], Effect::Cancel(ticker));
        assert!(matches!(effects[1], Effect::LoadEmbed(_)));
        assert_eq!(m.active_timer_count(), 0);
    }

    #[test]
    fn test_countdown_ticks_down_once_per_tick() {
        let mut m = machine();
        playing(&mut m, 1);
        m.handle(PlaybackEvent::TimerFired(duration_timer(&m)));

        let ticker = countdown_ticker(&m);
        m.handle(PlaybackEvent::TimerFired(ticker));
        m.handle(PlaybackEvent::TimerFired(ticker));
        assert_eq!(m.snapshot().countdown_remaining, 8);
        assert_eq!(m.state(), PlaybackState::AutoplayCountdown);
    }

    #[test]
    fn test_last_episode_window_elapsing_stays_playing() {
        let mut m = machine();
        playing(&mut m, 3);

        let effects = m.handle(PlaybackEvent::TimerFired(duration_timer(&m)));
        assert!(effects.is_empty());
        assert_eq!(m.state(), PlaybackState::Playing);
        assert_eq!(m.active_timer_count(), 0);
        assert!(!m.snapshot().autoplay_armed);
    }

    #[test]
    fn test_single_episode_season_has_no_countdown() {
        let mut m = machine();
        m.handle(PlaybackEvent::SelectSeason(4));
        assert_eq!(m.state(), PlaybackState::Idle);

        m.handle(PlaybackEvent::Play);
        assert_eq!(m.snapshot().selected_season, Some(4));
        m.handle(PlaybackEvent::EmbedReady);
        m.handle(PlaybackEvent::TimerFired(duration_timer(&m)));

        assert_eq!(m.state(), PlaybackState::Playing);
        assert_eq!(m.snapshot().countdown_remaining, 0);
    }

    #[test]
    fn test_cancel_autoplay_keeps_episode() {
        let mut m = machine();
        playing(&mut m, 2);
        m.handle(PlaybackEvent::TimerFired(duration_timer(&m)));
        let ticker = countdown_ticker(&m);
        m.handle(PlaybackEvent::TimerFired(ticker));

        let effects = m.handle(PlaybackEvent::CancelAutoplay);
        assert_eq!(effects, vec![Effect::Cancel(ticker)]);

        let snap = m.snapshot();
        assert_eq!(snap.state, PlaybackState::Playing);
        assert_eq!(snap.countdown_remaining, 0);
        assert_eq!(snap.selected_episode, Some(2));
        assert!(!snap.autoplay_armed);

        // A tick already in flight changes nothing
        assert!(m.handle(PlaybackEvent::TimerFired(ticker)).is_empty());
        assert_eq!(m.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_cancel_outside_countdown_is_noop() {
        let mut m = machine();
        playing(&mut m, 1);
        assert!(m.handle(PlaybackEvent::CancelAutoplay).is_empty());
        assert_eq!(m.active_timer_count(), 1);
    }

    #[test]
    fn test_superseded_duration_timer_is_ignored() {
        let mut m = machine();
        playing(&mut m, 1);
        let stale = duration_timer(&m);

        let effects = m.handle(PlaybackEvent::SelectEpisode(3));
        assert_eq!(effects[0], Effect::Cancel(stale));
        assert_eq!(m.state(), PlaybackState::Loading);

        assert!(m.handle(PlaybackEvent::TimerFired(stale)).is_empty());
        assert_eq!(m.state(), PlaybackState::Loading);
        assert_eq!(m.snapshot().selected_episode, Some(3));
    }

    #[test]
    fn test_season_change_while_playing_loads_first_episode() {
        let mut m = machine();
        playing(&mut m, 2);
        let timer = duration_timer(&m);

        let effects = m.handle(PlaybackEvent::SelectSeason(2));
        assert_eq!(effects[0], Effect::Cancel(timer));
        assert_eq!(m.state(), PlaybackState::Loading);
        assert_eq!(m.snapshot().selected_season, Some(2));
        assert_eq!(m.snapshot().selected_episode, Some(1));
    }

    #[test]
    fn test_season_change_during_countdown_loads_first_episode() {
        let mut m = machine();
        playing(&mut m, 1);
        m.handle(PlaybackEvent::TimerFired(duration_timer(&m)));

        m.handle(PlaybackEvent::SelectSeason(2));
        assert_eq!(m.state(), PlaybackState::Loading);
        assert_eq!(m.active_timer_count(), 0);
        assert_eq!(m.snapshot().countdown_remaining, 0);
    }

    #[test]
    fn test_season_change_while_idle_only_selects() {
        let mut m = machine();
        let effects = m.handle(PlaybackEvent::SelectSeason(2));

        assert!(effects.is_empty());
        assert_eq!(m.state(), PlaybackState::Idle);
        assert_eq!(m.snapshot().selected_season, Some(2));
    }

    #[test]
    fn test_empty_season_stops_autoplay_and_clears_episode() {
        let mut m = machine();
        playing(&mut m, 1);
        m.handle(PlaybackEvent::TimerFired(duration_timer(&m)));
        assert_eq!(m.state(), PlaybackState::AutoplayCountdown);

        m.handle(PlaybackEvent::SelectSeason(3));
        let snap = m.snapshot();
        assert_eq!(snap.state, PlaybackState::Playing);
        assert_eq!(snap.selected_season, Some(3));
        assert_eq!(snap.selected_episode, None);
        assert_eq!(m.active_timer_count(), 0);
    }

    #[test]
    fn test_embed_failure_returns_to_idle_with_message() {
        let mut m = machine();
        m.handle(PlaybackEvent::SelectEpisode(2));
        let effects = m.handle(PlaybackEvent::EmbedFailed("No streams available".into()));

        assert_eq!(effects, vec![Effect::ShowError("No streams available".into())]);
        let snap = m.snapshot();
        assert_eq!(snap.state, PlaybackState::Idle);
        assert_eq!(snap.last_error.as_deref(), Some("No streams available"));
        assert_eq!(snap.selected_episode, Some(2));

        // Retrying clears the message
        m.handle(PlaybackEvent::Play);
        assert_eq!(m.snapshot().last_error, None);
        assert_eq!(m.snapshot().selected_episode, Some(2));
    }

    #[test]
    fn test_next_and_previous_episode() {
        let mut m = machine();
        playing(&mut m, 2);

        m.handle(PlaybackEvent::NextEpisode);
        assert_eq!(m.snapshot().selected_episode, Some(3));
        m.handle(PlaybackEvent::EmbedReady);

        // No episode after the last one
        assert!(m.handle(PlaybackEvent::NextEpisode).is_empty());

        m.handle(PlaybackEvent::PreviousEpisode);
        m.handle(PlaybackEvent::PreviousEpisode);
        assert_eq!(m.snapshot().selected_episode, Some(1));
        assert!(m.handle(PlaybackEvent::PreviousEpisode).is_empty());
    }

    #[test]
    fn test_teardown_cancels_and_closes() {
        let mut m = machine();
        playing(&mut m, 1);
        let timer = duration_timer(&m);

        let effects = m.handle(PlaybackEvent::Teardown);
        assert_eq!(effects, vec![Effect::Cancel(timer)]);
        assert!(m.is_closed());

        assert!(m.handle(PlaybackEvent::TimerFired(timer)).is_empty());
        assert!(m.handle(PlaybackEvent::Play).is_empty());
        assert_eq!(m.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_movie_plays_without_episodes() {
        let mut m = PlaybackMachine::new(movie(), PlaybackConfig::default());
        let effects = m.handle(PlaybackEvent::Play);

        match effects.as_slice() {
            [Effect::LoadEmbed(reference)] => {
                assert!(reference.as_str().contains("se=0&ep=0"))
            }
            other => panic!("unexpected effects {:?}", other),
        }
        assert!(m.handle(PlaybackEvent::SelectEpisode(1)).is_empty());
        assert!(m.handle(PlaybackEvent::NextEpisode).is_empty());
    }

    #[derive(Debug, Clone)]
    enum Step {
        Event(PlaybackEvent),
        FireDuration,
        FireTicker,
        FireStale(u64),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => Just(Step::Event(PlaybackEvent::Play)),
            3 => (0u32..5).prop_map(|n| Step::Event(PlaybackEvent::SelectEpisode(n))),
            2 => (0u32..6).prop_map(|n| Step::Event(PlaybackEvent::SelectSeason(n))),
            2 => Just(Step::Event(PlaybackEvent::NextEpisode)),
            1 => Just(Step::Event(PlaybackEvent::PreviousEpisode)),
            4 => Just(Step::Event(PlaybackEvent::EmbedReady)),
            1 => Just(Step::Event(PlaybackEvent::EmbedFailed("failed".into()))),
            2 => Just(Step::Event(PlaybackEvent::CancelAutoplay)),
            1 => Just(Step::Event(PlaybackEvent::Teardown)),
            4 => Just(Step::FireDuration),
            8 => Just(Step::FireTicker),
            1 => (0u64..50).prop_map(Step::FireStale),
        ]
    }

    proptest! {
        #[test]
        fn prop_at_most_one_timer_armed(steps in prop::collection::vec(step_strategy(), 0..120)) {
            let mut m = machine();
            let mut live: HashSet<TimerId> = HashSet::new();

            for step in steps {
                let event = match step {
                    Step::Event(event) => event,
                    Step::FireDuration => match m.session().and_then(|s| s.duration_timer) {
                        Some(id) => {
                            live.remove(&id);
                            PlaybackEvent::TimerFired(id)
                        }
                        None => continue,
                    },
                    Step::FireTicker => match m.session().and_then(|s| s.countdown_ticker) {
                        Some(id) => PlaybackEvent::TimerFired(id),
                        None => continue,
                    },
                    Step::FireStale(n) => PlaybackEvent::TimerFired(TimerId(1_000_000 + n)),
                };

                for effect in m.handle(event) {
                    match effect {
                        Effect::Schedule { id, .. } | Effect::StartTicker { id, .. } => {
                            live.insert(id);
                        }
                        Effect::Cancel(id) => {
                            live.remove(&id);
                        }
                        _ => {}
                    }
                }

                prop_assert!(m.active_timer_count() <= 1);
                prop_assert_eq!(live.len(), m.active_timer_count());
                if m.state() != PlaybackState::AutoplayCountdown {
                    prop_assert_eq!(m.snapshot().countdown_remaining, 0);
                }
            }
        }
    }
}
