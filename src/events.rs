//! Typed event channel between the core and the UI/orchestration layer.
//!
//! Every notification leaving the core is one tagged [`AppEvent`] variant
//! on a broadcast channel; consumers subscribe and match on the variant
//! instead of string event names.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::bridge::WindowSnapshot;
use crate::catalog::Choice;
use crate::zones::CaptureZone;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppEvent {
    /// Target window appeared after being absent. Carries the zone table
    /// resolved against the new snapshot.
    WindowFound {
        snapshot: WindowSnapshot,
        zones: Vec<CaptureZone>,
    },
    /// Position, size or visibility changed since the previous tick.
    WindowMoved {
        snapshot: WindowSnapshot,
        zones: Vec<CaptureZone>,
    },
    /// Target window is gone.
    WindowHidden,
    /// Career-profile screen became active or inactive.
    CareerProfile { active: bool },
    /// A menu overlay started or stopped blurring the view.
    Menu { blur: bool },
    AnalysisStarted,
    AnalysisComplete { choices: Vec<Choice> },
    AnalysisError { message: String },
    UmamusumeDetected { name: String },
    UmamusumeDetectionError { message: String },
}

impl AppEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AppEvent::WindowFound { .. } => "windowFound",
            AppEvent::WindowMoved { .. } => "windowMoved",
            AppEvent::WindowHidden => "windowHidden",
            AppEvent::CareerProfile { .. } => "careerProfile",
            AppEvent::Menu { .. } => "menu",
            AppEvent::AnalysisStarted => "analysisStarted",
            AppEvent::AnalysisComplete { .. } => "analysisComplete",
            AppEvent::AnalysisError { .. } => "analysisError",
            AppEvent::UmamusumeDetected { .. } => "umamusumeDetected",
            AppEvent::UmamusumeDetectionError { .. } => "umamusumeDetectionError",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget; a bus with no subscribers drops the event.
    pub fn emit(&self, event: AppEvent) {
        log::debug!("event: {}", event.kind());
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
