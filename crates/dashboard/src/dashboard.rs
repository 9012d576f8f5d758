//! Dashboard coordinator.
//!
//! Owns both leaf controllers and the layout state machine, and is the only
//! place where one component's output becomes another component's input.
//! Everything runs on one logical loop:
//!
//! 1. Host input methods call into a leaf, then [`Dashboard::route`] drains
//!    the leaves' outboxes and applies the cross-wiring.
//! 2. [`Dashboard::step`] waits for the next completion (geolocation, lookup,
//!    upload, store write, debounce timer, store update), hands it to its
//!    owner and routes again.
//!
//! Leaves never call each other and never see each other's types.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use foundation::{GeoPoint, MarkerId, ScreenPoint, SpotId};
use futures_util::StreamExt;
use runtime::{EventBus, Metrics, MetricsSnapshot};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::error::SubmitError;
use crate::layout::{InteractionKind, LayoutMachine, LayoutSignal, LayoutState};
use crate::map::{MapController, MapEvent, MapSurface, SpotPin};
use crate::model::{MediaFile, MediaKind, NewSpot, SpotDraft, SpotRecord};
use crate::overview::{Notice, OverviewController, OverviewEvent, Tab};
use crate::services::{BoxStream, Services};

/// What the host shell should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// Bootstrap finished; `located` is the device position if one was used.
    ViewportReady { located: Option<GeoPoint> },
    LayoutChanged(LayoutState),
    Notification(Notice),
    RenderRequested,
    SpotsUpdated(usize),
}

pub struct Dashboard<S> {
    config: Arc<DashboardConfig>,
    services: Services,
    map: MapController<S>,
    overview: OverviewController,
    layout: LayoutMachine,
    layout_rx: UnboundedReceiver<LayoutSignal>,
    spots: Option<SpotFeed>,
    events: EventBus<DashboardEvent>,
    metrics: Metrics,
}

impl<S: MapSurface> Dashboard<S> {
    pub fn new(config: DashboardConfig, services: Services, surface: S) -> Self {
        let config = Arc::new(config);
        let (layout_tx, layout_rx) = mpsc::unbounded_channel();
        let layout = LayoutMachine::new(
            services.device.clone(),
            config.interaction_debounce,
            layout_tx,
        );
        Self {
            map: MapController::new(surface, config.clone()),
            overview: OverviewController::new(&config, &services),
            layout,
            layout_rx,
            spots: None,
            events: EventBus::new(),
            metrics: Metrics::new(),
            config,
            services,
        }
    }

    /// Bootstraps the viewport and subscribes to the spot collection.
    pub fn mount(&mut self) {
        info!(
            "mounting dashboard (mobile={})",
            self.services.device.detect_mobile()
        );
        self.map.initialize(self.services.geolocation.clone());
        self.spots = Some(self.services.store.stream_all());
        self.events
            .emit(DashboardEvent::LayoutChanged(self.layout.state()));
        self.route();
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn map(&self) -> &MapController<S> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapController<S> {
        &mut self.map
    }

    pub fn overview(&self) -> &OverviewController {
        &self.overview
    }

    pub fn layout(&self) -> LayoutState {
        self.layout.state()
    }

    pub fn map_clicked(&mut self, at: ScreenPoint) {
        self.map.on_surface_click(at);
        self.route();
    }

    /// Pan or zoom gesture reported by the surface.
    pub fn map_moved(&mut self, kind: InteractionKind) {
        self.map.on_surface_interaction(kind);
        self.route();
    }

    pub fn confirm_point(&mut self) -> Option<GeoPoint> {
        let point = self.map.confirm_pending_point();
        self.route();
        point
    }

    pub fn dismiss_menu(&mut self) {
        self.map.dismiss_menu();
        self.route();
    }

    pub fn marker_clicked(&mut self, marker: MarkerId) {
        self.map.on_marker_click(marker);
        self.route();
    }

    pub fn list_scrolled(&mut self) {
        self.overview.on_list_scrolled();
        self.route();
    }

    pub fn select_spot(&mut self, id: &SpotId) -> Option<GeoPoint> {
        let point = self.overview.select_spot(id);
        self.route();
        point
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.overview.set_tab(tab);
        self.events.emit(DashboardEvent::RenderRequested);
    }

    /// Applies a form edit made by the host.
    pub fn edit_draft(&mut self, edit: impl FnOnce(&mut SpotDraft)) {
        edit(self.overview.draft_mut());
        self.events.emit(DashboardEvent::RenderRequested);
    }

    pub fn submit(&mut self) -> Result<NewSpot, SubmitError> {
        let outcome = self.overview.submit();
        match &outcome {
            Ok(_) => self.metrics.inc("submit.accepted"),
            Err(_) => self.metrics.inc("submit.rejected"),
        }
        self.route();
        outcome
    }

    pub fn reset_draft(&mut self) {
        self.overview.reset();
        self.route();
    }

    pub fn attach_media(&mut self, file: MediaFile, kind: MediaKind) {
        self.metrics.inc("media.uploads");
        self.overview.attach_media(file, kind);
    }

    pub fn toggle_expand(&mut self, explicit: Option<bool>) -> LayoutState {
        let before = self.layout.state();
        let after = self.layout.toggle_expand(explicit);
        if after.map_height_percent != before.map_height_percent {
            self.metrics.inc("layout.transitions");
            self.map.invalidate_size();
        }
        self.events.emit(DashboardEvent::LayoutChanged(after));
        after
    }

    /// Waits for the next completion, applies it, and routes the results.
    pub async fn step(&mut self) {
        tokio::select! {
            Some(message) = self.map.recv() => self.map.handle(message),
            Some(message) = self.overview.recv() => self.overview.handle(message),
            Some(signal) = self.layout_rx.recv() => self.on_layout_signal(signal),
            batch = next_batch(&mut self.spots) => match batch {
                Some(spots) => self.apply_spots(spots),
                None => {
                    debug!("spot feed closed");
                    self.spots = None;
                }
            },
        }
        self.route();
    }

    /// Drives the loop until `duration` has elapsed.
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                _ = self.step() => {}
            }
        }
    }

    /// Drives the loop until `shutdown` completes.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.step() => {}
            }
        }
    }

    fn on_layout_signal(&mut self, signal: LayoutSignal) {
        if !self.layout.is_active() {
            debug!("dropping {signal:?} queued before teardown");
            return;
        }
        debug!("layout signal settled: {signal:?}");
        match signal {
            LayoutSignal::MapInteracted => self.toggle_expand(Some(true)),
            LayoutSignal::ListScrolled => self.toggle_expand(Some(false)),
        };
    }

    fn apply_spots(&mut self, spots: Vec<SpotRecord>) {
        let pins: Vec<SpotPin> = spots
            .iter()
            .map(|r| SpotPin {
                id: r.id.clone(),
                point: r.point(),
            })
            .collect();
        let added = self.map.render_existing_spots(&pins);
        self.metrics.inc("spots.updates");
        self.metrics
            .set_gauge("map.spot_markers", self.map.spot_marker_count() as i64);
        debug!("spot feed: {} spots, {added} new markers", spots.len());

        let count = spots.len();
        self.overview.set_spots(spots);
        self.events.emit(DashboardEvent::SpotsUpdated(count));
    }

    /// Applies the cross-wiring until both leaves are quiet.
    pub fn route(&mut self) {
        loop {
            let map_events = self.map.drain_events();
            let overview_events = self.overview.drain_events();
            if map_events.is_empty() && overview_events.is_empty() {
                break;
            }
            for event in map_events {
                self.route_map(event);
            }
            for event in overview_events {
                self.route_overview(event);
            }
        }
    }

    fn route_map(&mut self, event: MapEvent) {
        match event {
            MapEvent::Located(point) => {
                self.events.emit(DashboardEvent::ViewportReady {
                    located: Some(point),
                });
            }
            MapEvent::LocationUnavailable(_) => {
                self.events
                    .emit(DashboardEvent::ViewportReady { located: None });
            }
            MapEvent::PointConfirmed(point) => {
                self.overview.set_tab(Tab::Create);
                self.overview.fill_from_point(point);
                self.events.emit(DashboardEvent::RenderRequested);
            }
            MapEvent::Interacted(interaction) => {
                self.layout.on_map_interaction(interaction);
            }
            MapEvent::SpotClicked(id) => {
                self.overview.scroll_to(&id);
            }
        }
    }

    fn route_overview(&mut self, event: OverviewEvent) {
        match event {
            OverviewEvent::RemovePendingMarker => {
                self.map.remove_pending_marker();
            }
            OverviewEvent::FlyToRequested(point) => {
                self.map.fly_to(point, Some(self.config.spot_zoom));
            }
            OverviewEvent::Scrolled(interaction) => {
                self.layout.on_list_scroll(interaction);
            }
            OverviewEvent::Notify(notice) => {
                self.events.emit(DashboardEvent::Notification(notice));
            }
            OverviewEvent::RefreshRequested | OverviewEvent::AddressFilled(_) => {
                self.events.emit(DashboardEvent::RenderRequested);
            }
            OverviewEvent::LookupIssued(_) => self.metrics.inc("geocode.lookups"),
            OverviewEvent::ScrolledTo(_) => {}
        }
    }

    pub fn drain_events(&mut self) -> Vec<DashboardEvent> {
        self.events.drain()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Cancels timers and in-flight work and drops the store subscription.
    pub fn teardown(&mut self) {
        self.map.teardown();
        self.overview.teardown();
        self.layout.teardown();
        self.spots = None;
        info!("dashboard torn down ({})", self.metrics.snapshot());
    }
}

type SpotFeed = BoxStream<'static, Vec<SpotRecord>>;

/// Pends forever once the feed has been dropped.
async fn next_batch(spots: &mut Option<SpotFeed>) -> Option<Vec<SpotRecord>> {
    match spots {
        Some(feed) => feed.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeolocationError;
    use crate::map::{HeadlessSurface, MarkerKind};
    use crate::model::{Difficulty, Discipline, SpotType};
    use crate::services::GeolocationProvider;
    use crate::services::geolocation::FixedGeolocation;
    use crate::testing::{Fakes, record};
    use pretty_assertions::assert_eq;

    fn dashboard(
        fakes: &Fakes,
        geolocation: Option<Arc<dyn GeolocationProvider>>,
    ) -> Dashboard<HeadlessSurface> {
        let config = DashboardConfig::default();
        let surface = HeadlessSurface::new(config.viewport_width, config.viewport_height);
        let mut dashboard = Dashboard::new(config, fakes.services(geolocation), surface);
        dashboard.mount();
        dashboard
    }

    fn denied() -> Option<Arc<dyn GeolocationProvider>> {
        Some(Arc::new(FixedGeolocation::failing(GeolocationError::Denied)))
    }

    fn describe(draft: &mut SpotDraft) {
        draft.difficulty = Some(Difficulty::Hammer);
        draft.spot_type = Some(SpotType::Dirt);
        draft.disciplines.insert(Discipline::Bmx);
        draft.media.pictures.push("media/jump.jpg".into());
    }

    #[tokio::test(start_paused = true)]
    async fn mobile_map_interaction_expands_with_one_resize() {
        let fakes = Fakes::new(true);
        let mut d = dashboard(&fakes, denied());
        d.run_for(Duration::from_millis(10)).await;
        assert_eq!(
            d.layout(),
            LayoutState {
                expanded: false,
                map_height_percent: 20
            }
        );
        let resizes = d.map().surface().invalidations();

        d.map_moved(InteractionKind::Pan);
        d.run_for(Duration::from_millis(200)).await;

        assert_eq!(
            d.layout(),
            LayoutState {
                expanded: true,
                map_height_percent: 80
            }
        );
        assert_eq!(d.map().surface().invalidations(), resizes + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pan_burst_settles_once_and_scroll_collapses() {
        let fakes = Fakes::new(true);
        let mut d = dashboard(&fakes, denied());

        for kind in [InteractionKind::Pan, InteractionKind::Zoom, InteractionKind::Pan] {
            d.map_moved(kind);
            d.run_for(Duration::from_millis(30)).await;
        }
        d.run_for(Duration::from_millis(200)).await;
        assert_eq!(d.map().surface().invalidations(), 1);
        assert!(d.layout().expanded);

        d.list_scrolled();
        d.run_for(Duration::from_millis(200)).await;
        assert_eq!(d.layout().map_height_percent, 20);
        assert_eq!(d.map().surface().invalidations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn desktop_stays_full_height() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());

        d.map_moved(InteractionKind::Zoom);
        d.list_scrolled();
        d.run_for(Duration::from_millis(500)).await;

        assert_eq!(d.layout().map_height_percent, 100);
        assert_eq!(d.map().surface().invalidations(), 0);
        assert_eq!(d.metrics().counters.iter().find(|(k, _)| *k == "layout.transitions"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn denied_geolocation_keeps_fallback_view() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());
        d.run_for(Duration::from_millis(50)).await;

        assert_eq!(d.map().surface().center(), GeoPoint::new(46.879966, -121.726909));
        assert_eq!(d.map().surface().zoom(), 13.0);
        assert_eq!(d.map().surface().marker_count(MarkerKind::Pending), 0);
        assert_eq!(d.map().surface().marker_count(MarkerKind::Spot), 0);
        assert!(
            d.drain_events()
                .contains(&DashboardEvent::ViewportReady { located: None })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_geolocation_is_reported_at_mount() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, None);
        assert!(
            d.drain_events()
                .contains(&DashboardEvent::ViewportReady { located: None })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn located_device_is_flown_to_in_one_second() {
        let fakes = Fakes::new(false);
        let here = GeoPoint::new(40.4168, -3.7038);
        let mut d = dashboard(&fakes, Some(Arc::new(FixedGeolocation::at(here))));
        d.run_for(Duration::from_millis(50)).await;

        let flight = d.map().surface().flights().last().copied().unwrap();
        assert_eq!(flight.to, here);
        assert_eq!(flight.zoom, 13.0);
        assert_eq!(flight.duration, Duration::from_secs(1));
        assert!(
            d.drain_events()
                .contains(&DashboardEvent::ViewportReady { located: Some(here) })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn existing_spots_render_once_per_identity() {
        let fakes = Fakes::with_spots(false, vec![record("a", 1.0, 1.0), record("b", 1.0, 1.0)]);
        let mut d = dashboard(&fakes, denied());
        d.run_for(Duration::from_millis(50)).await;
        assert_eq!(d.map().surface().marker_count(MarkerKind::Spot), 2);
        assert_eq!(d.overview().spots().len(), 2);
        assert!(d.drain_events().contains(&DashboardEvent::SpotsUpdated(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_point_fills_the_form() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());
        d.run_for(Duration::from_millis(50)).await;

        d.map_clicked(ScreenPoint::new(640.0, 360.0));
        assert_eq!(d.overview().draft().point(), None);
        let point = d.confirm_point().unwrap();

        assert_eq!(d.overview().tab(), Tab::Create);
        assert_eq!(d.overview().draft().point(), Some(point));
        d.run_for(Duration::from_secs(1)).await;
        assert!(!d.overview().draft().location.address.is_empty());
        assert_eq!(fakes.geocoder.calls(), vec![point]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_submit_keeps_marker_and_skips_store() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());
        d.map_clicked(ScreenPoint::new(100.0, 100.0));
        d.confirm_point();
        d.run_for(Duration::from_secs(1)).await;

        assert!(d.submit().is_err());
        d.run_for(Duration::from_secs(1)).await;

        assert_eq!(fakes.store.adds(), 0);
        assert_eq!(d.map().surface().marker_count(MarkerKind::Pending), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn valid_submit_stores_once_and_clears_marker() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());
        d.map_clicked(ScreenPoint::new(100.0, 100.0));
        d.confirm_point();
        d.run_for(Duration::from_secs(1)).await;
        d.edit_draft(describe);
        d.drain_events();

        let spot = d.submit().unwrap();
        d.run_for(Duration::from_secs(1)).await;

        assert_eq!(fakes.store.adds(), 1);
        assert_eq!(d.map().surface().marker_count(MarkerKind::Pending), 0);
        assert_eq!(d.overview().draft(), &SpotDraft::default());
        assert_eq!(d.map().surface().marker_count(MarkerKind::Spot), 1);
        assert_eq!(
            fakes.store.inner().snapshot()[0].spot.location.point(),
            spot.location.point()
        );
        let events = d.drain_events();
        assert!(events.contains(&DashboardEvent::Notification(Notice::SpotCreated)));
        assert!(events.contains(&DashboardEvent::SpotsUpdated(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_draft_keeps_pending_marker_until_reset() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());
        d.map_clicked(ScreenPoint::new(300.0, 200.0));
        d.confirm_point();
        d.set_tab(Tab::Browse);
        d.run_for(Duration::from_secs(2)).await;
        assert_eq!(d.map().surface().marker_count(MarkerKind::Pending), 1);

        d.reset_draft();
        assert_eq!(d.map().surface().marker_count(MarkerKind::Pending), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_a_spot_flies_at_spot_zoom() {
        let fakes = Fakes::with_spots(false, vec![record("a", 43.3, 5.4)]);
        let mut d = dashboard(&fakes, denied());
        d.run_for(Duration::from_millis(50)).await;

        assert_eq!(d.select_spot(&SpotId::new("a")), Some(GeoPoint::new(43.3, 5.4)));
        let flight = d.map().surface().flights().last().copied().unwrap();
        assert_eq!(flight.to, GeoPoint::new(43.3, 5.4));
        assert_eq!(flight.zoom, 18.0);
        assert_eq!(d.overview().focused(), Some(&SpotId::new("a")));
    }

    #[tokio::test(start_paused = true)]
    async fn marker_click_scrolls_the_list() {
        let fakes = Fakes::with_spots(false, vec![record("a", 1.0, 1.0), record("b", 2.0, 2.0)]);
        let mut d = dashboard(&fakes, denied());
        d.run_for(Duration::from_millis(50)).await;

        let marker = d.map().spot_marker(&SpotId::new("b")).unwrap();
        d.marker_clicked(marker);
        assert_eq!(d.overview().focused(), Some(&SpotId::new("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_lookup() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());
        d.map_clicked(ScreenPoint::new(10.0, 10.0));
        d.confirm_point();
        d.teardown();
        d.run_for(Duration::from_secs(1)).await;

        assert!(fakes.geocoder.calls().is_empty());
        assert_eq!(d.map().surface().menu(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_drops_settled_layout_signal() {
        let fakes = Fakes::new(true);
        let mut d = dashboard(&fakes, denied());
        d.run_for(Duration::from_millis(10)).await;

        d.map_moved(InteractionKind::Pan);
        tokio::time::sleep(Duration::from_millis(100)).await;
        d.teardown();
        d.run_for(Duration::from_millis(200)).await;

        assert_eq!(d.layout().map_height_percent, 20);
        assert_eq!(d.map().surface().invalidations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dismissing_the_menu_forgets_the_click() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());
        d.map_clicked(ScreenPoint::new(50.0, 50.0));
        d.dismiss_menu();

        assert_eq!(d.map().surface().menu(), None);
        assert_eq!(d.confirm_point(), None);
        assert!(d.overview().draft().point().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn run_until_stops_on_shutdown() {
        let fakes = Fakes::new(false);
        let mut d = dashboard(&fakes, denied());
        d.run_until(tokio::time::sleep(Duration::from_millis(20))).await;
        assert!(
            d.drain_events()
                .contains(&DashboardEvent::ViewportReady { located: None })
        );
    }
}
