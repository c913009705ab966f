// Viewing session state machine: one configurable, independently timed unit of work.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{EngineError, EngineResult};
use crate::config::{MAX_RESULT_RANK, MIN_RESULT_RANK};
use crate::source::traits::Suggestion;

/// Stable identity of a session, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which input drives target selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    BySearch,
    ByDirectLink,
}

/// Search result position, always within 1..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ResultRank(u8);

impl ResultRank {
    pub fn new(rank: u8) -> EngineResult<Self> {
        if (MIN_RESULT_RANK..=MAX_RESULT_RANK).contains(&rank) {
            Ok(Self(rank))
        } else {
            Err(EngineError::Validation(format!(
                "result rank must be in {}..={}, got {}",
                MIN_RESULT_RANK, MAX_RESULT_RANK, rank
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for ResultRank {
    fn default() -> Self {
        Self(MIN_RESULT_RANK)
    }
}

impl TryFrom<u8> for ResultRank {
    type Error = EngineError;

    fn try_from(value: u8) -> EngineResult<Self> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "144p")]
    P144,
    #[serde(rename = "360p")]
    P360,
    #[default]
    #[serde(rename = "720p")]
    P720,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::P144 => "144p",
            Resolution::P360 => "360p",
            Resolution::P720 => "720p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim() {
            "144p" => Ok(Resolution::P144),
            "360p" => Ok(Resolution::P360),
            "720p" => Ok(Resolution::P720),
            other => Err(EngineError::Validation(format!(
                "unsupported resolution: {:?}",
                other
            ))),
        }
    }
}

/// Watch duration, restricted to the fixed menu of 5, 6, 8 or 10 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DurationMinutes {
    #[default]
    Five,
    Six,
    Eight,
    Ten,
}

impl DurationMinutes {
    pub fn minutes(self) -> u32 {
        match self {
            DurationMinutes::Five => 5,
            DurationMinutes::Six => 6,
            DurationMinutes::Eight => 8,
            DurationMinutes::Ten => 10,
        }
    }

    /// Countdown length in simulated seconds.
    pub fn seconds(self) -> u32 {
        self.minutes() * 60
    }
}

impl TryFrom<u32> for DurationMinutes {
    type Error = EngineError;

    fn try_from(minutes: u32) -> EngineResult<Self> {
        match minutes {
            5 => Ok(DurationMinutes::Five),
            6 => Ok(DurationMinutes::Six),
            8 => Ok(DurationMinutes::Eight),
            10 => Ok(DurationMinutes::Ten),
            other => Err(EngineError::Validation(format!(
                "duration must be one of 5, 6, 8, 10 minutes, got {}",
                other
            ))),
        }
    }
}

impl From<DurationMinutes> for u32 {
    fn from(d: DurationMinutes) -> u32 {
        d.minutes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Watching,
    Done,
}

impl SessionStatus {
    /// Upper-case badge text.
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Idle => "IDLE",
            SessionStatus::Watching => "WATCHING",
            SessionStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => f.write_str("idle"),
            SessionStatus::Watching => f.write_str("watching"),
            SessionStatus::Done => f.write_str("done"),
        }
    }
}

/// Result of advancing one session by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session was not watching; nothing changed.
    Skipped,
    /// One second elapsed and the countdown is still running.
    Advanced,
    /// The last second elapsed and the session is now done.
    Completed,
}

/// Partial set of field changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub mode: Option<InputMode>,
    pub keyword: Option<String>,
    pub result_rank: Option<ResultRank>,
    pub target_url: Option<String>,
    pub resolution: Option<Resolution>,
    pub duration: Option<DurationMinutes>,
    /// `Some(None)` clears the proxy.
    pub proxy: Option<Option<String>>,
    pub user_agent: Option<String>,
    pub suggestion: Option<Suggestion>,
}

impl SessionUpdate {
    pub fn mode(mut self, mode: InputMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn result_rank(mut self, rank: ResultRank) -> Self {
        self.result_rank = Some(rank);
        self
    }

    pub fn target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }

    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn duration(mut self, duration: DurationMinutes) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == SessionUpdate::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) mode: InputMode,
    pub(crate) keyword: String,
    pub(crate) result_rank: ResultRank,
    pub(crate) target_url: String,
    pub(crate) resolution: Resolution,
    pub(crate) duration: DurationMinutes,
    pub(crate) proxy: Option<String>,
    pub(crate) user_agent: String,
    pub(crate) status: SessionStatus,
    pub(crate) seconds_remaining: u32,
    /// Countdown length captured at the last start; 0 while idle.
    pub(crate) countdown_total: u32,
    pub(crate) suggested_title: Option<String>,
    pub(crate) suggested_thumbnail: Option<String>,
}

impl Session {
    pub fn new(
        id: SessionId,
        user_agent: String,
        resolution: Resolution,
        duration: DurationMinutes,
    ) -> Self {
        Self {
            id,
            mode: InputMode::BySearch,
            keyword: String::new(),
            result_rank: ResultRank::default(),
            target_url: String::new(),
            resolution,
            duration,
            proxy: None,
            user_agent,
            status: SessionStatus::Idle,
            seconds_remaining: 0,
            countdown_total: 0,
            suggested_title: None,
            suggested_thumbnail: None,
        }
    }

    /// Idle -> Watching. Requires the input for the active mode to be non-blank.
    pub fn start(&mut self) -> EngineResult<()> {
        match self.status {
            SessionStatus::Idle => {}
            status => {
                return Err(EngineError::InvalidTransition {
                    id: self.id,
                    status,
                    action: "start",
                })
            }
        }

        match self.mode {
            InputMode::BySearch if self.keyword.trim().is_empty() => {
                return Err(EngineError::Validation(
                    "a search keyword is required".to_string(),
                ));
            }
            InputMode::ByDirectLink if self.target_url.trim().is_empty() => {
                return Err(EngineError::Validation(
                    "a video URL is required".to_string(),
                ));
            }
            _ => {}
        }

        let total = self.duration.seconds();
        self.status = SessionStatus::Watching;
        self.seconds_remaining = total;
        self.countdown_total = total;
        Ok(())
    }

    /// Watching -> Idle. Returns whether a transition happened; idle and done
    /// sessions are left as they are.
    pub fn stop(&mut self) -> bool {
        if self.status != SessionStatus::Watching {
            return false;
        }
        self.status = SessionStatus::Idle;
        self.seconds_remaining = 0;
        self.countdown_total = 0;
        true
    }

    /// Advance the countdown by one simulated second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SessionStatus::Watching {
            return TickOutcome::Skipped;
        }
        // Watching always carries a positive countdown; decrement and
        // complete in the same step so 0 is never observed while watching.
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.status = SessionStatus::Done;
            TickOutcome::Completed
        } else {
            TickOutcome::Advanced
        }
    }

    /// Merge the supplied fields. Never touches status or the running countdown.
    pub fn apply(&mut self, update: &SessionUpdate) -> EngineResult<()> {
        if let Some(ua) = &update.user_agent {
            if ua.trim().is_empty() {
                return Err(EngineError::Validation(
                    "user agent must not be empty".to_string(),
                ));
            }
        }

        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(keyword) = &update.keyword {
            self.keyword = keyword.clone();
        }
        if let Some(rank) = update.result_rank {
            self.result_rank = rank;
        }
        if let Some(url) = &update.target_url {
            self.target_url = url.clone();
        }
        if let Some(resolution) = update.resolution {
            self.resolution = resolution;
        }
        if let Some(duration) = update.duration {
            self.duration = duration;
        }
        if let Some(proxy) = &update.proxy {
            self.proxy = proxy.clone();
        }
        if let Some(ua) = &update.user_agent {
            self.user_agent = ua.clone();
        }
        if let Some(suggestion) = &update.suggestion {
            self.suggested_title = Some(suggestion.title.clone());
            self.suggested_thumbnail = Some(suggestion.thumbnail.clone());
        }
        debug!("session {} fields updated", self.id);
        Ok(())
    }

    /// Whether status and countdown agree.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            SessionStatus::Idle => self.seconds_remaining == 0,
            SessionStatus::Watching => self.seconds_remaining > 0,
            SessionStatus::Done => self.seconds_remaining == 0,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn result_rank(&self) -> ResultRank {
        self.result_rank
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn duration(&self) -> DurationMinutes {
        self.duration
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn countdown_total(&self) -> u32 {
        self.countdown_total
    }

    pub fn suggested_title(&self) -> Option<&str> {
        self.suggested_title.as_deref()
    }

    pub fn suggested_thumbnail(&self) -> Option<&str> {
        self.suggested_thumbnail.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_session() -> Session {
        Session::new(
            SessionId(1),
            "agent/1.0".to_string(),
            Resolution::P720,
            DurationMinutes::Five,
        )
    }

    #[test]
    fn test_new_session_defaults() {
        let s = idle_session();
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.seconds_remaining(), 0);
        assert_eq!(s.mode(), InputMode::BySearch);
        assert_eq!(s.result_rank().get(), 1);
        assert!(s.proxy().is_none());
        assert!(s.is_consistent());
    }

    #[test]
    fn test_start_requires_keyword_in_search_mode() {
        let mut s = idle_session();
        s.keyword = "   ".to_string();
        assert!(matches!(s.start(), Err(EngineError::Validation(_))));
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.seconds_remaining(), 0);
    }

    #[test]
    fn test_start_requires_url_in_link_mode() {
        let mut s = idle_session();
        s.keyword = "lofi".to_string();
        s.mode = InputMode::ByDirectLink;
        assert!(matches!(s.start(), Err(EngineError::Validation(_))));

        s.target_url = "https://youtube.com/watch?v=abc".to_string();
        s.start().unwrap();
        assert_eq!(s.status(), SessionStatus::Watching);
    }

    #[test]
    fn test_countdown_completes_exactly() {
        let mut s = idle_session();
        s.keyword = "lofi".to_string();
        s.start().unwrap();
        assert_eq!(s.seconds_remaining(), 300);

        for _ in 0..299 {
            assert_eq!(s.tick(), TickOutcome::Advanced);
            assert!(s.is_consistent());
        }
        assert_eq!(s.seconds_remaining(), 1);
        assert_eq!(s.tick(), TickOutcome::Completed);
        assert_eq!(s.status(), SessionStatus::Done);
        assert_eq!(s.seconds_remaining(), 0);

        assert_eq!(s.tick(), TickOutcome::Skipped);
        assert_eq!(s.status(), SessionStatus::Done);
        assert_eq!(s.seconds_remaining(), 0);
    }

    #[test]
    fn test_done_rejects_start_and_ignores_stop() {
        let mut s = idle_session();
        s.keyword = "lofi".to_string();
        s.start().unwrap();
        s.seconds_remaining = 1;
        s.tick();

        assert!(matches!(
            s.start(),
            Err(EngineError::InvalidTransition {
                status: SessionStatus::Done,
                ..
            })
        ));
        assert!(!s.stop());
        assert_eq!(s.status(), SessionStatus::Done);
    }

    #[test]
    fn test_start_while_watching_keeps_countdown() {
        let mut s = idle_session();
        s.keyword = "lofi".to_string();
        s.start().unwrap();
        s.tick();
        assert!(s.start().is_err());
        assert_eq!(s.seconds_remaining(), 299);
    }

    #[test]
    fn test_duration_change_is_not_retroactive() {
        let mut s = idle_session();
        s.keyword = "lofi".to_string();
        s.start().unwrap();
        s.tick();
        s.apply(&SessionUpdate::default().duration(DurationMinutes::Ten))
            .unwrap();
        assert_eq!(s.seconds_remaining(), 299);

        s.stop();
        s.start().unwrap();
        assert_eq!(s.seconds_remaining(), 600);
    }

    #[test]
    fn test_apply_rejects_blank_user_agent() {
        let mut s = idle_session();
        let before = s.clone();
        let err = s.apply(&SessionUpdate::default().keyword("x").user_agent(""));
        assert!(err.is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn test_value_parsing() {
        assert_eq!("360p".parse::<Resolution>().unwrap(), Resolution::P360);
        assert!("1080p".parse::<Resolution>().is_err());
        assert_eq!(DurationMinutes::try_from(8).unwrap().seconds(), 480);
        assert!(DurationMinutes::try_from(7).is_err());
        assert!(ResultRank::new(0).is_err());
        assert!(ResultRank::new(11).is_err());
        assert_eq!(ResultRank::try_from(10).unwrap().get(), 10);
    }
}
