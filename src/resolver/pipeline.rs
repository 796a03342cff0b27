//! Single-flight resolution of on-screen state into structured data.
//!
//! Two flows share one busy flag: character detection (OCR the name banner
//! against the roster) and choice resolution (OCR the prompt title/type,
//! match the catalog, fetch + parse the archive page when uncached). A
//! request arriving while either flow runs is dropped, not queued. Neither
//! flow imposes timeouts; a stalled collaborator stalls that flow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use tokio_util::sync::CancellationToken;

use crate::bridge::{OcrEngine, WindowBackend, WindowSnapshot};
use crate::catalog::{CatalogStore, Choice, EventKind, RosterStore};
use crate::events::{AppEvent, EventBus};
use crate::settings::SettingsStore;
use crate::zones::{self, ZoneDef, ZONE_EVENT_TITLE, ZONE_EVENT_TYPE, ZONE_UMAMUSUME};

use super::{parse_choice_table, ArchiveSource, ResolveError};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const OCR_LANGUAGE: &str = "eng";

pub struct ResolutionPipeline<W, O, A> {
    window: Arc<W>,
    ocr: Arc<O>,
    archive: A,
    settings: Arc<SettingsStore>,
    catalog: Arc<CatalogStore>,
    roster: Arc<RosterStore>,
    zones: Vec<ZoneDef>,
    bus: EventBus,
    busy: AtomicBool,
}

/// Releases the busy flag when a flow ends, on every path.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<W, O, A> ResolutionPipeline<W, O, A>
where
    W: WindowBackend + 'static,
    O: OcrEngine + 'static,
    A: ArchiveSource,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        window: Arc<W>,
        ocr: Arc<O>,
        archive: A,
        settings: Arc<SettingsStore>,
        catalog: Arc<CatalogStore>,
        roster: Arc<RosterStore>,
        zones: Vec<ZoneDef>,
        bus: EventBus,
    ) -> Self {
        Self {
            window,
            ocr,
            archive,
            settings,
            catalog,
            roster,
            zones,
            bus,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(&self.busy))
    }

    /// Read the name banner until it matches a roster entry, then store it
    /// as the active character. A non-roster reading is OCR noise and
    /// retries immediately; only capture/OCR failures abort.
    pub async fn detect_character(
        &self,
        cancel: &CancellationToken,
    ) -> Result<String, ResolveError> {
        let Some(_guard) = self.try_begin() else {
            log_warn!("character detection requested while a resolution is in flight; dropping");
            return Err(ResolveError::Busy);
        };

        log_info!("character detection started");
        loop {
            if cancel.is_cancelled() {
                log_info!("character detection cancelled");
                return Err(ResolveError::Cancelled);
            }

            let name = match self.read_name_banner().await {
                Ok(name) => name,
                Err(err) => return Err(self.fail_detection(err)),
            };

            if name.is_empty() {
                let err = ResolveError::Extraction("name banner produced no text".into());
                return Err(self.fail_detection(err));
            }

            if !self.roster.contains(&name) {
                log_info!("'{name}' is not in the roster, assuming OCR noise; retrying");
                tokio::task::yield_now().await;
                continue;
            }

            if let Err(err) = self.settings.set_active_character(&name) {
                return Err(self.fail_detection(ResolveError::Persistence(err)));
            }

            log_info!("active character detected: {name}");
            self.bus.emit(AppEvent::UmamusumeDetected { name: name.clone() });
            return Ok(name);
        }
    }

    /// Resolve the currently displayed decision prompt into its choices.
    pub async fn resolve_event(&self) -> Result<Vec<Choice>, ResolveError> {
        let Some(_guard) = self.try_begin() else {
            log_warn!("event resolution requested while a resolution is in flight; dropping");
            return Err(ResolveError::Busy);
        };

        self.bus.emit(AppEvent::AnalysisStarted);
        match self.resolve_event_inner().await {
            Ok(choices) => {
                self.bus.emit(AppEvent::AnalysisComplete {
                    choices: choices.clone(),
                });
                Ok(choices)
            }
            Err(err) => {
                log_warn!("event resolution failed: {err}");
                self.bus.emit(AppEvent::AnalysisError {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn resolve_event_inner(&self) -> Result<Vec<Choice>, ResolveError> {
        let (snapshot, image) = self.capture_window().await?;

        let title = self
            .read_zone_text(&snapshot, &image, ZONE_EVENT_TITLE)
            .await?;
        if title.is_empty() {
            return Err(ResolveError::Extraction(
                "event title zone produced no text".into(),
            ));
        }

        let type_text = self
            .read_zone_text(&snapshot, &image, ZONE_EVENT_TYPE)
            .await?;
        let kind = EventKind::parse(&type_text);
        log_info!("resolving {} event titled {title:?}", kind.as_str());

        let record = self
            .catalog
            .find_match(kind, &self.settings.active_character(), &title)
            .ok_or_else(|| ResolveError::NotFound {
                kind: kind.as_str(),
                title: title.clone(),
            })?;

        if let Some(choices) = record.choices.as_ref().filter(|c| !c.is_empty()) {
            log_info!("cache hit for record {} ({})", record.archive_id, record.title);
            return Ok(choices.clone());
        }

        let html = self
            .archive
            .fetch_archive(record.archive_id)
            .await
            .map_err(ResolveError::Remote)?;

        let choices = parse_choice_table(&html);
        if choices.is_empty() {
            return Err(ResolveError::Parse {
                archive_id: record.archive_id,
            });
        }

        self.catalog
            .set_choices(record.archive_id, choices.clone())
            .map_err(ResolveError::Persistence)?;

        log_info!(
            "resolved {} choices for record {} ({})",
            choices.len(),
            record.archive_id,
            record.title
        );
        Ok(choices)
    }

    async fn read_name_banner(&self) -> Result<String, ResolveError> {
        let (snapshot, image) = self.capture_window().await?;
        self.read_zone_text(&snapshot, &image, ZONE_UMAMUSUME).await
    }

    async fn capture_window(&self) -> Result<(WindowSnapshot, Arc<RgbaImage>), ResolveError> {
        let backend = Arc::clone(&self.window);
        let located = tokio::task::spawn_blocking(move || backend.locate_window())
            .await
            .map_err(|err| ResolveError::Extraction(format!("window lookup join failed: {err}")))?
            .map_err(|err| ResolveError::Extraction(format!("window lookup failed: {err:#}")))?;

        let snapshot = located
            .ok_or_else(|| ResolveError::Extraction("target window not found".into()))?;

        let backend = Arc::clone(&self.window);
        let image = tokio::task::spawn_blocking(move || backend.capture_window())
            .await
            .map_err(|err| ResolveError::Extraction(format!("capture join failed: {err}")))?
            .map_err(|err| ResolveError::Extraction(format!("capture failed: {err:#}")))?;

        Ok((snapshot, Arc::new(image)))
    }

    async fn read_zone_text(
        &self,
        snapshot: &WindowSnapshot,
        image: &Arc<RgbaImage>,
        zone_name: &str,
    ) -> Result<String, ResolveError> {
        let def = self
            .zones
            .iter()
            .find(|z| z.name == zone_name)
            .ok_or_else(|| {
                ResolveError::Extraction(format!("zone '{zone_name}' is not configured"))
            })?;

        let zone = zones::zone_rect(def, snapshot, self.settings.padding());
        let crop = zones::crop_zone(image, zone.local)
            .map_err(|err| ResolveError::Extraction(format!("crop of '{zone_name}' failed: {err:#}")))?;

        let ocr = Arc::clone(&self.ocr);
        let text = tokio::task::spawn_blocking(move || ocr.recognize_text(&crop, OCR_LANGUAGE))
            .await
            .map_err(|err| ResolveError::Extraction(format!("ocr join failed: {err}")))?
            .map_err(|err| ResolveError::Extraction(format!("ocr failed: {err:#}")))?;

        Ok(text.trim().to_string())
    }

    fn fail_detection(&self, err: ResolveError) -> ResolveError {
        log_warn!("character detection failed: {err}");
        self.bus.emit(AppEvent::UmamusumeDetectionError {
            message: err.to_string(),
        });
        err
    }
}
