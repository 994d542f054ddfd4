//! Inverse-distance-weighted pressure surface.
//!
//! Distances are planar Euclidean in the projected coordinates of the
//! inputs. A target sitting exactly on an observation takes that
//! observation's value.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Default IDW power parameter.
pub const DEFAULT_POWER: f64 = 2.0;

/// A station location and its (possibly missing) pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservedPoint {
    pub x: f64,
    pub y: f64,
    pub value: Option<f64>,
}

/// A target location of the estimation grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub id: i64,
    pub x: f64,
    pub y: f64,
}

/// A grid point with its estimate; `None` when there was nothing to estimate from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimatedPoint {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Site {
    x: f64,
    y: f64,
    value: f64,
}

fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (ax - bx).hypot(ay - by)
}

fn valid_sites(observed: &[ObservedPoint]) -> Vec<Site> {
    observed
        .iter()
        .filter_map(|p| match p.value {
            Some(value) if value.is_finite() => Some(Site { x: p.x, y: p.y, value }),
            _ => None,
        })
        .collect()
}

fn exact_hit(len: usize, hit: usize) -> Vec<f64> {
    let mut weights = vec![0.0; len];
    weights[hit] = 1.0;
    weights
}

fn site_weights(x: f64, y: f64, sites: &[Site], power: f64) -> Vec<f64> {
    if let Some(hit) = sites.iter().position(|s| distance(x, y, s.x, s.y) == 0.0) {
        return exact_hit(sites.len(), hit);
    }
    let raw: Vec<f64> = sites
        .iter()
        .map(|s| 1.0 / distance(x, y, s.x, s.y).powf(power))
        .collect();
    // d^power underflowed to zero
    if let Some(hit) = raw.iter().position(|w| w.is_infinite()) {
        return exact_hit(sites.len(), hit);
    }
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Normalised weights of every valid observation for one target.
///
/// Observations with a missing value are left out, so the result has one
/// entry per valid observation in input order. When the target coincides
/// with an observation, that observation (the first one, if several) gets
/// weight 1 and all others 0.
pub fn idw_weights(target: &GridPoint, observed: &[ObservedPoint], power: f64) -> Vec<f64> {
    site_weights(target.x, target.y, &valid_sites(observed), power)
}

fn estimate(target: &GridPoint, sites: &[Site], power: f64) -> Option<f64> {
    if sites.is_empty() {
        return None;
    }
    let weights = site_weights(target.x, target.y, sites, power);
    Some(weights.iter().zip(sites).map(|(w, s)| w * s.value).sum())
}

/// Estimate pressure at every target point.
///
/// Output order matches `targets`.
pub fn interpolate(observed: &[ObservedPoint], targets: &[GridPoint], power: f64) -> Vec<EstimatedPoint> {
    let sites = valid_sites(observed);
    let dropped = observed.len() - sites.len();
    if dropped > 0 {
        log::info!(
            "[WPS] idw: dropped {} of {} observations without a value",
            dropped,
            observed.len()
        );
    }
    if sites.is_empty() {
        log::warn!("[WPS] idw: no observations to interpolate from");
    }
    targets
        .par_iter()
        .map(|target| EstimatedPoint {
            id: target.id,
            x: target.x,
            y: target.y,
            value: estimate(target, &sites, power),
        })
        .collect()
}
