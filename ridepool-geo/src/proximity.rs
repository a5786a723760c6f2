use crate::coordinate::{haversine_distance_km, Coordinate};
use serde::Serialize;

/// Filters applied while ranking candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityOptions {
    pub max_distance_km: Option<f64>,
    pub limit: Option<usize>,
}

/// A candidate decorated with its computed distance from the reference point.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked<T> {
    pub distance_km: f64,
    #[serde(flatten)]
    pub item: T,
}

/// Rank candidates by great-circle distance from a reference point.
///
/// Candidates beyond `max_distance_km` are dropped, the rest are sorted
/// ascending by distance (ties keep input order), and the list is cut to
/// `limit`. An empty candidate list yields an empty result.
pub fn rank_by_proximity<T>(
    reference: Coordinate,
    candidates: impl IntoIterator<Item = (Coordinate, T)>,
    options: ProximityOptions,
) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = candidates
        .into_iter()
        .map(|(position, item)| Ranked {
            distance_km: haversine_distance_km(reference, position),
            item,
        })
        .filter(|r| match options.max_distance_km {
            Some(max) => r.distance_km <= max,
            None => true,
        })
        .collect();

    // sort_by is stable, so equidistant candidates keep their input order.
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    if let Some(limit) = options.limit {
        ranked.truncate(limit);
    }

    ranked
}
