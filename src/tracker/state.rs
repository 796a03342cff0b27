//! Tracker state and the pure transition decisions behind the polling
//! loop: which window event a pair of consecutive snapshots produces, and
//! which flag flips a completed classification emits.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::bridge::WindowSnapshot;
use crate::events::AppEvent;

/// Semantic screen state, owned exclusively by the tracking loop. Mutated
/// only after a completed classification; never reset once constructed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub career_profile_active: bool,
    pub menu_blurred: bool,
    pub last_check_at: Option<DateTime<Utc>>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self {
            career_profile_active: false,
            menu_blurred: false,
            last_check_at: None,
        }
    }

    /// Rate limit for the classification sub-check.
    pub fn due_for_check(&self, now: DateTime<Utc>, min_interval_ms: i64) -> bool {
        match self.last_check_at {
            None => true,
            Some(last) => (now - last).num_milliseconds() >= min_interval_ms,
        }
    }

    /// Fold in one completed classification. The state always takes the new
    /// values and timestamp; events come back only for genuine flips.
    pub fn apply_classification(
        &mut self,
        active: bool,
        blurred: bool,
        now: DateTime<Utc>,
    ) -> Vec<AppEvent> {
        let mut flips = Vec::new();
        if active != self.career_profile_active {
            flips.push(AppEvent::CareerProfile { active });
        }
        if blurred != self.menu_blurred {
            flips.push(AppEvent::Menu { blur: blurred });
        }

        self.career_profile_active = active;
        self.menu_blurred = blurred;
        self.last_check_at = Some(now);
        flips
    }
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Window event derived from two consecutive poll results.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowTransition {
    Found(WindowSnapshot),
    Moved(WindowSnapshot),
    Hidden,
}

/// Compare the previous poll result against the current one.
///
/// `Hidden` fires only when a previously visible window disappears, so a
/// window that was last seen minimized vanishes silently.
pub fn window_transition(
    previous: Option<&WindowSnapshot>,
    current: Option<&WindowSnapshot>,
) -> Option<WindowTransition> {
    match (previous, current) {
        (None, Some(cur)) => Some(WindowTransition::Found(cur.clone())),
        (Some(prev), Some(cur)) if cur.geometry_differs(prev) => {
            Some(WindowTransition::Moved(cur.clone()))
        }
        (Some(prev), None) if prev.visible => Some(WindowTransition::Hidden),
        _ => None,
    }
}
