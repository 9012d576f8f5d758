//! Map controller: markers, click-to-create, fly-to and viewport bootstrap.
//!
//! The controller owns the [`MapSurface`] and every marker on it. It talks to
//! the rest of the dashboard only through [`MapEvent`]s and plain
//! [`GeoPoint`] values.

pub mod surface;

pub use surface::*;

use std::collections::HashMap;
use std::sync::Arc;

use foundation::{GeoPoint, MarkerId, ScreenPoint, SpotId};
use runtime::{EventBus, TaskSet};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::error::GeolocationError;
use crate::layout::{Interaction, InteractionKind};
use crate::services::GeolocationProvider;

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The view was centred on the device position.
    Located(GeoPoint),
    /// The view stays on the fallback center.
    LocationUnavailable(GeolocationError),
    /// The user confirmed "add a spot here".
    PointConfirmed(GeoPoint),
    Interacted(Interaction),
    SpotClicked(SpotId),
}

/// Completion of async work started by the controller.
#[derive(Debug)]
pub enum MapMessage {
    Geolocated(Result<GeoPoint, GeolocationError>),
}

/// A persisted spot as the map sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotPin {
    pub id: SpotId,
    pub point: GeoPoint,
}

pub struct MapController<S> {
    surface: S,
    config: Arc<DashboardConfig>,
    spot_markers: HashMap<SpotId, (MarkerId, GeoPoint)>,
    marker_spots: HashMap<MarkerId, SpotId>,
    pending_marker: Option<(MarkerId, GeoPoint)>,
    pending_click: Option<ScreenPoint>,
    next_marker: u64,
    interaction_seq: u64,
    events: EventBus<MapEvent>,
    tasks: TaskSet,
    tx: UnboundedSender<MapMessage>,
    rx: UnboundedReceiver<MapMessage>,
}

impl<S: MapSurface> MapController<S> {
    pub fn new(surface: S, config: Arc<DashboardConfig>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            surface,
            config,
            spot_markers: HashMap::new(),
            marker_spots: HashMap::new(),
            pending_marker: None,
            pending_click: None,
            next_marker: 0,
            interaction_seq: 0,
            events: EventBus::new(),
            tasks: TaskSet::new(),
            tx,
            rx,
        }
    }

    /// Shows the fallback view, then asks for the device position.
    ///
    /// The outcome arrives later as [`MapMessage::Geolocated`]; without a
    /// provider the fallback is reported immediately.
    pub fn initialize(&mut self, geolocation: Option<Arc<dyn GeolocationProvider>>) {
        self.surface
            .set_view(self.config.fallback_center, self.config.fallback_zoom);

        let Some(provider) = geolocation else {
            info!("geolocation unsupported, staying on fallback center");
            self.events
                .emit(MapEvent::LocationUnavailable(GeolocationError::Unsupported));
            return;
        };

        let timeout = self.config.geolocation_timeout;
        let tx = self.tx.clone();
        self.tasks.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, provider.current_position()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(GeolocationError::Timeout),
            };
            let _ = tx.send(MapMessage::Geolocated(outcome));
        });
    }

    pub async fn recv(&mut self) -> Option<MapMessage> {
        self.rx.recv().await
    }

    pub fn handle(&mut self, message: MapMessage) {
        match message {
            MapMessage::Geolocated(Ok(point)) => {
                info!(
                    "centering on device position {:.5},{:.5}",
                    point.latitude, point.longitude
                );
                self.fly_to(point, None);
                self.events.emit(MapEvent::Located(point));
            }
            MapMessage::Geolocated(Err(reason)) => {
                info!("geolocation failed ({reason}), staying on fallback center");
                self.events.emit(MapEvent::LocationUnavailable(reason));
            }
        }
    }

    /// Places one marker per spot identity. Returns how many were added.
    ///
    /// Spots already on the map are not duplicated; a spot whose coordinates
    /// changed has its marker moved.
    pub fn render_existing_spots(&mut self, spots: &[SpotPin]) -> usize {
        let mut added = 0;
        for pin in spots {
            if let Some((marker, at)) = self.spot_markers.get_mut(&pin.id) {
                if *at != pin.point {
                    *at = pin.point;
                    self.surface.move_marker(*marker, pin.point);
                }
                continue;
            }
            let marker = self.allocate_marker();
            self.surface.add_marker(marker, pin.point, MarkerKind::Spot);
            self.spot_markers.insert(pin.id.clone(), (marker, pin.point));
            self.marker_spots.insert(marker, pin.id.clone());
            added += 1;
        }
        if added > 0 {
            debug!("rendered {added} new spot marker(s)");
        }
        added
    }

    /// Tracks the click and opens the confirmation menu there.
    ///
    /// A newer click replaces the tracked one and closes the open menu first.
    pub fn on_surface_click(&mut self, at: ScreenPoint) {
        if self.pending_click.replace(at).is_some() {
            self.surface.close_menu();
        }
        self.surface.open_menu(at);
        self.on_surface_interaction(InteractionKind::Click);
    }

    /// Closes the menu and forgets the tracked click.
    pub fn dismiss_menu(&mut self) {
        if self.pending_click.take().is_some() {
            self.surface.close_menu();
        }
    }

    /// Turns the tracked click into the pending marker.
    ///
    /// Returns `None` (and does nothing) when no click is tracked.
    pub fn confirm_pending_point(&mut self) -> Option<GeoPoint> {
        let at = self.pending_click.take()?;
        self.surface.close_menu();

        let point = self.surface.container_point_to_geo(at);
        self.remove_pending_marker();
        let marker = self.allocate_marker();
        self.surface.add_marker(marker, point, MarkerKind::Pending);
        self.pending_marker = Some((marker, point));

        self.events.emit(MapEvent::PointConfirmed(point));
        self.fly_to(point, None);
        Some(point)
    }

    /// Returns `true` if a pending marker was removed.
    pub fn remove_pending_marker(&mut self) -> bool {
        match self.pending_marker.take() {
            Some((marker, _)) => {
                self.surface.remove_marker(marker);
                true
            }
            None => false,
        }
    }

    /// Animated recenter; `zoom` defaults to the current zoom.
    pub fn fly_to(&mut self, point: GeoPoint, zoom: Option<f64>) {
        let zoom = zoom
            .unwrap_or_else(|| self.surface.zoom())
            .min(self.config.max_zoom);
        self.surface.fly_to(point, zoom, self.config.fly_duration);
    }

    pub fn on_surface_interaction(&mut self, kind: InteractionKind) {
        self.interaction_seq += 1;
        self.events.emit(MapEvent::Interacted(Interaction {
            seq: self.interaction_seq,
            kind,
        }));
    }

    pub fn on_marker_click(&mut self, marker: MarkerId) {
        if let Some(spot) = self.marker_spots.get(&marker) {
            self.events.emit(MapEvent::SpotClicked(spot.clone()));
        }
    }

    pub fn invalidate_size(&mut self) {
        self.surface.invalidate_size();
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn pending_marker(&self) -> Option<GeoPoint> {
        self.pending_marker.map(|(_, at)| at)
    }

    pub fn pending_click(&self) -> Option<ScreenPoint> {
        self.pending_click
    }

    pub fn spot_marker(&self, spot: &SpotId) -> Option<MarkerId> {
        self.spot_markers.get(spot).map(|(marker, _)| *marker)
    }

    pub fn spot_marker_count(&self) -> usize {
        self.spot_markers.len()
    }

    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        self.events.drain()
    }

    /// Cancels the geolocation query and closes the menu.
    pub fn teardown(&mut self) {
        self.tasks.abort_all();
        self.dismiss_menu();
    }

    fn allocate_marker(&mut self) -> MarkerId {
        let id = MarkerId::new(self.next_marker);
        self.next_marker += 1;
        id
    }
}
