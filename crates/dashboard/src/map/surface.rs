use std::collections::BTreeMap;
use std::time::Duration;

use foundation::math::container_point_to_geo;
use foundation::{GeoPoint, MarkerId, ScreenPoint};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// A persisted spot.
    Spot,
    /// The temporary marker of the draft being created.
    Pending,
}

/// The interactive map widget the controller drives.
///
/// Rendering, tiles and animation belong to the implementation; the
/// controller only issues commands and reads back the view.
pub trait MapSurface {
    fn center(&self) -> GeoPoint;

    fn zoom(&self) -> f64;

    /// Jumps without animation.
    fn set_view(&mut self, center: GeoPoint, zoom: f64);

    /// Animated recenter.
    fn fly_to(&mut self, center: GeoPoint, zoom: f64, duration: Duration);

    fn container_point_to_geo(&self, point: ScreenPoint) -> GeoPoint;

    fn add_marker(&mut self, id: MarkerId, at: GeoPoint, kind: MarkerKind);

    fn move_marker(&mut self, id: MarkerId, to: GeoPoint);

    fn remove_marker(&mut self, id: MarkerId);

    /// Opens the "add a spot here?" menu anchored at a container pixel.
    fn open_menu(&mut self, at: ScreenPoint);

    fn close_menu(&mut self);

    /// The widget does not watch its container; call after every resize.
    fn invalidate_size(&mut self);
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Flight {
    pub to: GeoPoint,
    pub zoom: f64,
    pub duration: Duration,
}

/// Web-Mercator map surface without a renderer.
///
/// Fly-to lands immediately; every flight is recorded for inspection. Used by
/// the headless app and in tests.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    center: GeoPoint,
    zoom: f64,
    size: [f64; 2],
    markers: BTreeMap<MarkerId, (GeoPoint, MarkerKind)>,
    menu: Option<ScreenPoint>,
    flights: Vec<Flight>,
    invalidations: u32,
}

impl HeadlessSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            center: GeoPoint::new(0.0, 0.0),
            zoom: 0.0,
            size: [width.max(1.0), height.max(1.0)],
            markers: BTreeMap::new(),
            menu: None,
            flights: Vec::new(),
            invalidations: 0,
        }
    }

    pub fn size(&self) -> [f64; 2] {
        self.size
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.size = [width.max(1.0), height.max(1.0)];
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, GeoPoint, MarkerKind)> + '_ {
        self.markers.iter().map(|(id, (at, kind))| (*id, *at, *kind))
    }

    pub fn marker_count(&self, kind: MarkerKind) -> usize {
        self.markers.values().filter(|(_, k)| *k == kind).count()
    }

    pub fn marker(&self, id: MarkerId) -> Option<(GeoPoint, MarkerKind)> {
        self.markers.get(&id).copied()
    }

    pub fn menu(&self) -> Option<ScreenPoint> {
        self.menu
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn invalidations(&self) -> u32 {
        self.invalidations
    }
}

impl MapSurface for HeadlessSurface {
    fn center(&self) -> GeoPoint {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_view(&mut self, center: GeoPoint, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
    }

    fn fly_to(&mut self, center: GeoPoint, zoom: f64, duration: Duration) {
        self.flights.push(Flight {
            to: center,
            zoom,
            duration,
        });
        self.set_view(center, zoom);
    }

    fn container_point_to_geo(&self, point: ScreenPoint) -> GeoPoint {
        container_point_to_geo(point, self.center, self.zoom, self.size)
    }

    fn add_marker(&mut self, id: MarkerId, at: GeoPoint, kind: MarkerKind) {
        self.markers.insert(id, (at, kind));
    }

    fn move_marker(&mut self, id: MarkerId, to: GeoPoint) {
        if let Some((at, _)) = self.markers.get_mut(&id) {
            *at = to;
        }
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn open_menu(&mut self, at: ScreenPoint) {
        self.menu = Some(at);
    }

    fn close_menu(&mut self) {
        self.menu = None;
    }

    fn invalidate_size(&mut self) {
        self.invalidations += 1;
    }
}
