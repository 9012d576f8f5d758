use std::f64::consts::PI;

use crate::geo::{GeoPoint, ScreenPoint};

/// Square tile edge in pixels at integer zoom levels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude where spherical Web Mercator maps to a square world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Edge length of the whole world in pixels at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Projects a geographic point to global pixel coordinates at `zoom`.
///
/// Latitudes beyond [`MAX_LATITUDE`] are clamped.
pub fn project(point: GeoPoint, zoom: f64) -> [f64; 2] {
    let size = world_size(zoom);
    let lat = point.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (point.longitude + 180.0) / 360.0 * size;
    let y = (1.0 - lat.tan().asinh() / PI) / 2.0 * size;
    [x, y]
}

/// Inverse of [`project`].
pub fn unproject(pixel: [f64; 2], zoom: f64) -> GeoPoint {
    let size = world_size(zoom);
    let longitude = pixel[0] / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * pixel[1] / size;
    let latitude = n.sinh().atan().to_degrees();
    GeoPoint::new(latitude, longitude)
}

/// Converts a container-relative pixel into a geographic point for a view
/// centred on `center` with a container of `size` pixels `[width, height]`.
pub fn container_point_to_geo(
    point: ScreenPoint,
    center: GeoPoint,
    zoom: f64,
    size: [f64; 2],
) -> GeoPoint {
    let c = project(center, zoom);
    let pixel = [
        c[0] - size[0] / 2.0 + point.x,
        c[1] - size[1] / 2.0 + point.y,
    ];
    unproject(pixel, zoom)
}

/// Inverse of [`container_point_to_geo`].
pub fn geo_to_container_point(
    point: GeoPoint,
    center: GeoPoint,
    zoom: f64,
    size: [f64; 2],
) -> ScreenPoint {
    let c = project(center, zoom);
    let p = project(point, zoom);
    ScreenPoint::new(
        p[0] - c[0] + size[0] / 2.0,
        p[1] - c[1] + size[1] / 2.0,
    )
}
