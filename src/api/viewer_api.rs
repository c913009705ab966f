use serde::Serialize;

use crate::config::FINAL_MINUTE_SECONDS;
use crate::engine::controller::ViewingEngine;
use crate::engine::session::{InputMode, Session, SessionStatus};

/// What the session's primary button does right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Start,
    Stop,
    /// Finished; no action available.
    Completed,
}

/// Flat, display-ready view of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub id: u32,
    pub status: &'static str,
    pub mode: InputMode,
    pub keyword: String,
    pub result_rank: u8,
    pub target_url: String,
    pub resolution: &'static str,
    pub duration_minutes: u32,
    pub proxy: Option<String>,
    pub user_agent: String,
    pub seconds_remaining: u32,
    pub time_remaining: String,
    pub progress_percent: f64,
    pub final_minute: bool,
    pub suggested_title: Option<String>,
    pub suggested_thumbnail: Option<String>,
    pub can_load_suggestion: bool,
    pub action: SessionAction,
}

/// Render seconds as `m:ss`.
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn progress_percent(session: &Session) -> f64 {
    match session.status() {
        SessionStatus::Idle => 0.0,
        SessionStatus::Done => 100.0,
        SessionStatus::Watching => {
            let total = session.countdown_total();
            if total == 0 {
                return 0.0;
            }
            let elapsed = total.saturating_sub(session.seconds_remaining());
            elapsed as f64 / total as f64 * 100.0
        }
    }
}

impl From<&Session> for SessionView {
    fn from(s: &Session) -> Self {
        let status = s.status();
        let action = match status {
            SessionStatus::Idle => SessionAction::Start,
            SessionStatus::Watching => SessionAction::Stop,
            SessionStatus::Done => SessionAction::Completed,
        };
        Self {
            id: s.id().0,
            status: status.label(),
            mode: s.mode(),
            keyword: s.keyword().to_string(),
            result_rank: s.result_rank().get(),
            target_url: s.target_url().to_string(),
            resolution: s.resolution().as_str(),
            duration_minutes: s.duration().minutes(),
            proxy: s.proxy().map(str::to_string),
            user_agent: s.user_agent().to_string(),
            seconds_remaining: s.seconds_remaining(),
            time_remaining: format_time(s.seconds_remaining()),
            progress_percent: progress_percent(s),
            final_minute: status == SessionStatus::Watching
                && s.seconds_remaining() <= FINAL_MINUTE_SECONDS,
            suggested_title: s.suggested_title().map(str::to_string),
            suggested_thumbnail: s.suggested_thumbnail().map(str::to_string),
            can_load_suggestion: s.mode() == InputMode::BySearch && !s.keyword().trim().is_empty(),
            action,
        }
    }
}

/// One view per session, in id order.
pub fn render_sessions(sessions: &[Session]) -> Vec<SessionView> {
    sessions.iter().map(SessionView::from).collect()
}

pub fn render_snapshot(engine: &ViewingEngine) -> Vec<SessionView> {
    render_sessions(&engine.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::session::{DurationMinutes, Resolution, SessionId, SessionUpdate};

    fn session() -> Session {
        Session::new(
            SessionId(1),
            "agent/1.0".to_string(),
            Resolution::P360,
            DurationMinutes::Five,
        )
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(137), "2:17");
        assert_eq!(format_time(600), "10:00");
        assert_eq!(format_time(59), "0:59");
    }

    #[test]
    fn test_idle_view() {
        let view = SessionView::from(&session());
        assert_eq!(view.status, "IDLE");
        assert_eq!(view.resolution, "360p");
        assert_eq!(view.time_remaining, "0:00");
        assert_eq!(view.progress_percent, 0.0);
        assert_eq!(view.action, SessionAction::Start);
        assert!(!view.can_load_suggestion);
        assert!(!view.final_minute);
    }

    #[test]
    fn test_watching_view_progress() {
        let mut s = session();
        s.apply(&SessionUpdate::default().keyword("lofi")).unwrap();
        s.start().unwrap();
        for _ in 0..150 {
            s.tick();
        }
        let view = SessionView::from(&s);
        assert_eq!(view.status, "WATCHING");
        assert_eq!(view.time_remaining, "2:30");
        assert!((view.progress_percent - 50.0).abs() < 1e-9);
        assert_eq!(view.action, SessionAction::Stop);
        assert!(view.can_load_suggestion);
        assert!(!view.final_minute);

        for _ in 0..90 {
            s.tick();
        }
        assert!(SessionView::from(&s).final_minute);
    }

    #[test]
    fn test_done_view() {
        let mut s = session();
        s.apply(&SessionUpdate::default().keyword("lofi")).unwrap();
        s.start().unwrap();
        while s.status() == SessionStatus::Watching {
            s.tick();
        }
        let view = SessionView::from(&s);
        assert_eq!(view.status, "DONE");
        assert_eq!(view.progress_percent, 100.0);
        assert_eq!(view.action, SessionAction::Completed);
        assert!(!view.final_minute);
    }
}
