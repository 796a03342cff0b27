//! Screen-state tracking and event resolution for an Umamusume career
//! companion.
//!
//! The core polls the game window at ~30 Hz for geometry and semantic
//! transitions ([`tracker`]) and resolves the on-screen decision prompt by
//! OCR against a persisted catalog, fetching the remote archive page when a
//! record's choices are uncached ([`resolver`]). The host supplies window
//! capture and OCR through the [`bridge`] traits and consumes typed events
//! from the [`events::EventBus`].

pub mod bridge;
pub mod catalog;
pub mod events;
pub mod resolver;
pub mod settings;
pub mod similarity;
pub mod tracker;
pub mod utils;
pub mod zones;

pub use bridge::{OcrEngine, WindowBackend, WindowSnapshot};
pub use catalog::{CatalogRecord, CatalogStore, Choice, EventKind, RosterStore};
pub use events::{AppEvent, EventBus};
pub use resolver::{ArchiveClient, ArchiveSource, ResolutionPipeline, ResolveError};
pub use settings::{RuntimeConfig, SettingsStore};
pub use tracker::{IconTemplates, TrackerContext, TrackerController};
pub use zones::{CaptureZone, Padding, PixelRect, ZoneDef};

/// Initialize logging from the environment (reads RUST_LOG). Hosts call
/// this once at startup; tests and embedders that configure their own
/// logger skip it.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
