//! Overview controller: the spot list and the creation form.
//!
//! Key properties:
//! - Coordinates land in the draft synchronously; the address follows from a
//!   debounced reverse-geocoding lookup.
//! - Identical consecutive points issue at most one lookup.
//! - A lookup answer is applied only if the draft still holds the point it
//!   was issued for.
//! - Upload and store results are tagged with the draft epoch; results for a
//!   draft that was submitted or reset are dropped.

use std::sync::Arc;

use foundation::{GeoPoint, SpotId};
use runtime::{Debouncer, Distinct, EventBus, TaskSet};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::{ServiceResult, SubmitError};
use crate::layout::{Interaction, InteractionKind};
use crate::model::{GeocodeResult, MediaFile, MediaKind, NewSpot, SpotDraft, SpotRecord};
use crate::services::{Geocoder, MediaUploader, Services, SpotStore};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Browse,
    Create,
}

/// User-facing notices; `key()` is the translation key the host displays.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Notice {
    SpotCreated,
    SpotCreationFailed,
    UploadFailed,
}

impl Notice {
    pub fn key(self) -> &'static str {
        match self {
            Notice::SpotCreated => "spot.created",
            Notice::SpotCreationFailed => "spot.creation_failed",
            Notice::UploadFailed => "media.upload_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverviewEvent {
    LookupIssued(GeoPoint),
    AddressFilled(GeoPoint),
    RemovePendingMarker,
    FlyToRequested(GeoPoint),
    ScrolledTo(SpotId),
    Scrolled(Interaction),
    RefreshRequested,
    Notify(Notice),
}

/// Completion of timers and async work started by the controller.
#[derive(Debug)]
pub enum OverviewMessage {
    LookupDue(GeoPoint),
    LookupResolved {
        point: GeoPoint,
        outcome: ServiceResult<Vec<GeocodeResult>>,
    },
    MediaUploaded {
        epoch: u64,
        kind: MediaKind,
        outcome: ServiceResult<String>,
    },
    SpotStored(ServiceResult<SpotId>),
}

pub struct OverviewController {
    store: Arc<dyn SpotStore>,
    geocoder: Arc<dyn Geocoder>,
    uploader: Arc<dyn MediaUploader>,
    draft: SpotDraft,
    epoch: u64,
    tab: Tab,
    spots: Vec<SpotRecord>,
    focused: Option<SpotId>,
    scroll_seq: u64,
    last_point: Distinct<GeoPoint>,
    lookup: Debouncer<OverviewMessage>,
    events: EventBus<OverviewEvent>,
    tasks: TaskSet,
    tx: UnboundedSender<OverviewMessage>,
    rx: UnboundedReceiver<OverviewMessage>,
}

impl OverviewController {
    pub fn new(config: &DashboardConfig, services: &Services) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store: services.store.clone(),
            geocoder: services.geocoder.clone(),
            uploader: services.uploader.clone(),
            draft: SpotDraft::default(),
            epoch: 0,
            tab: Tab::default(),
            spots: Vec::new(),
            focused: None,
            scroll_seq: 0,
            last_point: Distinct::new(),
            lookup: Debouncer::new(config.http_debounce, tx.clone()),
            events: EventBus::new(),
            tasks: TaskSet::new(),
            tx,
            rx,
        }
    }

    /// Writes the coordinates into the draft and schedules an address lookup.
    pub fn fill_from_point(&mut self, point: GeoPoint) {
        self.draft.set_point(point);
        if !self.last_point.admit(&point) {
            debug!("point unchanged, no new lookup");
            return;
        }
        self.lookup.push(OverviewMessage::LookupDue(point));
    }

    pub async fn recv(&mut self) -> Option<OverviewMessage> {
        self.rx.recv().await
    }

    pub fn handle(&mut self, message: OverviewMessage) {
        match message {
            OverviewMessage::LookupDue(point) => self.issue_lookup(point),
            OverviewMessage::LookupResolved { point, outcome } => {
                self.apply_lookup(point, outcome)
            }
            OverviewMessage::MediaUploaded {
                epoch,
                kind,
                outcome,
            } => self.apply_upload(epoch, kind, outcome),
            OverviewMessage::SpotStored(Ok(id)) => {
                info!("spot {id} stored");
                self.events.emit(OverviewEvent::Notify(Notice::SpotCreated));
            }
            OverviewMessage::SpotStored(Err(err)) => {
                warn!("storing spot failed: {err}");
                self.events
                    .emit(OverviewEvent::Notify(Notice::SpotCreationFailed));
            }
        }
    }

    fn issue_lookup(&mut self, point: GeoPoint) {
        // The timer may have fired before a reset, submit or teardown.
        if self.draft.point() != Some(point) || self.last_point.last() != Some(&point) {
            debug!("dropping queued lookup for {point:?}");
            return;
        }
        debug!(
            "reverse geocoding {:.6},{:.6}",
            point.latitude, point.longitude
        );
        self.events.emit(OverviewEvent::LookupIssued(point));

        let geocoder = self.geocoder.clone();
        let tx = self.tx.clone();
        self.tasks.spawn(async move {
            let outcome = geocoder.search(point).await;
            let _ = tx.send(OverviewMessage::LookupResolved { point, outcome });
        });
    }

    fn apply_lookup(&mut self, point: GeoPoint, outcome: ServiceResult<Vec<GeocodeResult>>) {
        if self.draft.point() != Some(point) {
            debug!("discarding stale lookup for {point:?}");
            return;
        }
        match outcome {
            Ok(results) => match results.into_iter().next() {
                Some(nearest) => {
                    self.draft.location.address = nearest.formatted_address;
                    self.draft.location.place_id = nearest.place_id;
                    self.events.emit(OverviewEvent::AddressFilled(point));
                }
                None => warn!("no address found for {point:?}"),
            },
            Err(err) => warn!("reverse geocoding failed: {err}"),
        }
    }

    /// Validates the draft and hands it to the store.
    ///
    /// An invalid draft is left untouched and nothing is emitted.
    pub fn submit(&mut self) -> Result<NewSpot, SubmitError> {
        let spot = self.draft.validate().inspect_err(|err| {
            debug!("submit rejected: {err}");
        })?;

        let store = self.store.clone();
        let tx = self.tx.clone();
        let stored = spot.clone();
        self.tasks.spawn(async move {
            let outcome = store.add(stored).await;
            let _ = tx.send(OverviewMessage::SpotStored(outcome));
        });

        info!("submitting spot at {:?}", spot.location.point());
        self.clear_draft();
        Ok(spot)
    }

    /// Abandons the draft; the pending marker goes with it.
    pub fn reset(&mut self) {
        self.clear_draft();
    }

    fn clear_draft(&mut self) {
        self.lookup.cancel();
        self.last_point.reset();
        self.draft = SpotDraft::default();
        self.epoch += 1;
        self.events.emit(OverviewEvent::RemovePendingMarker);
    }

    /// Uploads a file; its storage path is appended to the draft on success.
    pub fn attach_media(&mut self, file: MediaFile, kind: MediaKind) {
        debug!("uploading {} ({} bytes)", file.name, file.bytes.len());
        let uploader = self.uploader.clone();
        let tx = self.tx.clone();
        let epoch = self.epoch;
        self.tasks.spawn(async move {
            let outcome = uploader.file(file).await;
            let _ = tx.send(OverviewMessage::MediaUploaded {
                epoch,
                kind,
                outcome,
            });
        });
    }

    fn apply_upload(&mut self, epoch: u64, kind: MediaKind, outcome: ServiceResult<String>) {
        if epoch != self.epoch {
            debug!("dropping upload for a previous draft");
            return;
        }
        match outcome {
            Ok(path) => {
                match kind {
                    MediaKind::Picture => self.draft.media.pictures.push(path),
                    MediaKind::Video => self.draft.media.videos.push(path),
                }
                self.events.emit(OverviewEvent::RefreshRequested);
            }
            Err(err) => {
                warn!("upload failed: {err}");
                self.events.emit(OverviewEvent::Notify(Notice::UploadFailed));
            }
        }
    }

    /// Asks the map to show the spot and scrolls the list to it.
    pub fn select_spot(&mut self, id: &SpotId) -> Option<GeoPoint> {
        let point = self.spots.iter().find(|r| &r.id == id)?.point();
        self.events.emit(OverviewEvent::FlyToRequested(point));
        self.scroll_to(id);
        Some(point)
    }

    /// Scrolls the list to the spot; unknown ids are ignored.
    pub fn scroll_to(&mut self, id: &SpotId) -> bool {
        if !self.spots.iter().any(|r| &r.id == id) {
            return false;
        }
        self.focused = Some(id.clone());
        self.events.emit(OverviewEvent::ScrolledTo(id.clone()));
        true
    }

    pub fn on_list_scrolled(&mut self) {
        self.scroll_seq += 1;
        self.events.emit(OverviewEvent::Scrolled(Interaction {
            seq: self.scroll_seq,
            kind: InteractionKind::Scroll,
        }));
    }

    pub fn description_complete(&self) -> bool {
        self.draft.description_complete()
    }

    pub fn set_spots(&mut self, spots: Vec<SpotRecord>) {
        let still_listed = |id: &SpotId| spots.iter().any(|r| &r.id == id);
        if !self.focused.as_ref().is_some_and(still_listed) {
            self.focused = None;
        }
        self.spots = spots;
    }

    pub fn spots(&self) -> &[SpotRecord] {
        &self.spots
    }

    pub fn focused(&self) -> Option<&SpotId> {
        self.focused.as_ref()
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn draft(&self) -> &SpotDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut SpotDraft {
        &mut self.draft
    }

    pub fn drain_events(&mut self) -> Vec<OverviewEvent> {
        self.events.drain()
    }

    pub fn teardown(&mut self) {
        self.lookup.cancel();
        self.last_point.reset();
        self.tasks.abort_all();
    }
}
