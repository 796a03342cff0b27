use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use image::RgbaImage;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::bridge::{WindowBackend, WindowSnapshot};
use crate::events::{AppEvent, EventBus};
use crate::settings::SettingsStore;
use crate::similarity::{images_match, DEFAULT_MATCH_THRESHOLD};
use crate::zones::{compute_zones, crop_zone, zone_rect, ZoneDef, ZONE_CAREER_PROFILE_ICON};

use super::state::{window_transition, TrackerState, WindowTransition};
use super::templates::IconTemplates;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const POLL_INTERVAL_MS: u64 = 33;
const CLASSIFY_MIN_INTERVAL_MS: i64 = 100;

/// Everything the polling loop needs, bundled so the controller can hand it
/// to the spawned task in one move.
pub struct TrackerContext<W> {
    pub backend: Arc<W>,
    pub settings: Arc<SettingsStore>,
    pub templates: Arc<IconTemplates>,
    pub zones: Vec<ZoneDef>,
    pub bus: EventBus,
}

/// Fixed-period polling loop: window geometry every tick, icon
/// classification at most every 100 ms. Runs until cancelled; per-tick
/// failures are logged and absorbed.
pub async fn tracking_loop<W: WindowBackend + 'static>(
    ctx: TrackerContext<W>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut previous: Option<WindowSnapshot> = None;
    let mut state = TrackerState::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                perform_tick(&ctx, &mut previous, &mut state).await;
            }
            _ = cancel_token.cancelled() => {
                log_info!("tracking loop shutting down");
                break;
            }
        }
    }
}

async fn perform_tick<W: WindowBackend + 'static>(
    ctx: &TrackerContext<W>,
    previous: &mut Option<WindowSnapshot>,
    state: &mut TrackerState,
) {
    // A lookup failure degrades to "window absent" and retries next tick.
    let located = match ctx.backend.locate_window() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            log_warn!("window lookup failed: {err:#}");
            None
        }
    };

    let padding = ctx.settings.padding();
    match window_transition(previous.as_ref(), located.as_ref()) {
        Some(WindowTransition::Found(snapshot)) => {
            log_info!(
                "window found: {}x{} at ({}, {})",
                snapshot.width,
                snapshot.height,
                snapshot.x,
                snapshot.y
            );
            let zones = compute_zones(&ctx.zones, &snapshot, padding);
            ctx.bus.emit(AppEvent::WindowFound { snapshot, zones });
        }
        Some(WindowTransition::Moved(snapshot)) => {
            let zones = compute_zones(&ctx.zones, &snapshot, padding);
            ctx.bus.emit(AppEvent::WindowMoved { snapshot, zones });
        }
        Some(WindowTransition::Hidden) => {
            log_info!("window hidden");
            ctx.bus.emit(AppEvent::WindowHidden);
        }
        None => {}
    }
    *previous = located.clone();

    // Classification needs a window and respects its own rate limit.
    let Some(snapshot) = located else {
        return;
    };
    let now = Utc::now();
    if !state.due_for_check(now, CLASSIFY_MIN_INTERVAL_MS) {
        return;
    }

    match classify_profile_icon(ctx, &snapshot).await {
        Ok((active, blurred)) => {
            for event in state.apply_classification(active, blurred, now) {
                log_info!("screen state flip: {}", event.kind());
                ctx.bus.emit(event);
            }
        }
        // Prior state is assumed still valid; nothing is mutated or emitted.
        Err(err) => log_warn!("classification failed: {err:#}"),
    }
}

/// Capture, crop the profile-icon zone and compare against both templates.
/// Returns `(career_profile_active, menu_blurred)`.
async fn classify_profile_icon<W: WindowBackend + 'static>(
    ctx: &TrackerContext<W>,
    snapshot: &WindowSnapshot,
) -> Result<(bool, bool)> {
    let backend = Arc::clone(&ctx.backend);
    let image = tokio::task::spawn_blocking(move || backend.capture_window())
        .await
        .context("capture worker join failed")??;

    let def = ctx
        .zones
        .iter()
        .find(|z| z.name == ZONE_CAREER_PROFILE_ICON)
        .context("career_profile_icon zone is not configured")?;
    let zone = zone_rect(def, snapshot, ctx.settings.padding());
    let icon = crop_zone(&image, zone.local)?;

    if ctx.settings.debug() {
        dump_debug_crop(&icon);
    }

    let templates = Arc::clone(&ctx.templates);
    let result = tokio::task::spawn_blocking(move || {
        let blur_match = images_match(&templates.blurred, &icon, DEFAULT_MATCH_THRESHOLD);
        let icon_match = images_match(&templates.active, &icon, DEFAULT_MATCH_THRESHOLD);
        (blur_match || icon_match, blur_match)
    })
    .await
    .context("classification worker join failed")?;

    Ok(result)
}

fn dump_debug_crop(icon: &RgbaImage) {
    let path = std::env::temp_dir().join("umascope-profile-icon.png");
    if let Err(err) = icon.save(&path) {
        log_warn!("failed to write debug crop to {}: {err}", path.display());
    }
}
