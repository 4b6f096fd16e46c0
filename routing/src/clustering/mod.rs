pub mod capacity;
pub mod k_means;

use common::types::{Coordinates, StopId, VehicleId};
use itertools::Itertools;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fmt::Display;

/// Purely geometric grouping: given points, return one label in `0..k` per point.
/// Implementations must be deterministic for the same input.
pub trait StopClusterer: Send + Sync {
    fn cluster(&self, points: &[Coordinates], k: usize) -> Result<Vec<usize>, ClusteringError>;
}

/// A stop with at least one waiting passenger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandStop {
    pub id: StopId,
    pub location: Coordinates,
    pub demand: u32,
}

/// Which vehicle picks up which stop, and how many passengers each vehicle carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clustering {
    assignment: BTreeMap<StopId, VehicleId>,
    demand: BTreeMap<StopId, u32>,
    loads: BTreeMap<VehicleId, u32>,
}

impl Clustering {
    fn assign(&mut self, stop: &DemandStop, vehicle: VehicleId) {
        self.assignment.insert(stop.id, vehicle);
        self.demand.insert(stop.id, stop.demand);
        *self.loads.entry(vehicle).or_default() += stop.demand;
    }

    fn reassign(&mut self, stop: StopId, vehicle: VehicleId) {
        let demand = self.demand.get(&stop).copied().unwrap_or_default();
        if let Some(previous) = self.assignment.insert(stop, vehicle) {
            if let Some(load) = self.loads.get_mut(&previous) {
                *load -= demand;
            }
        }
        *self.loads.entry(vehicle).or_default() += demand;
    }

    pub fn assignment(&self) -> &BTreeMap<StopId, VehicleId> {
        &self.assignment
    }

    pub fn vehicle_of(&self, stop: &StopId) -> Option<VehicleId> {
        self.assignment.get(stop).copied()
    }

    /// Vehicles that have at least one stop, in ascending order
    pub fn vehicles(&self) -> Vec<VehicleId> {
        self.assignment.values().copied().collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Stops of a vehicle in ascending id order
    pub fn members(&self, vehicle: VehicleId) -> Vec<StopId> {
        self.assignment.iter()
            .filter(|(_, assigned)| **assigned == vehicle)
            .map(|(stop, _)| *stop)
            .collect()
    }

    pub fn load(&self, vehicle: VehicleId) -> u32 {
        self.loads.get(&vehicle).copied().unwrap_or_default()
    }

    pub(crate) fn loads(&self) -> &BTreeMap<VehicleId, u32> {
        &self.loads
    }

    fn max_vehicle(&self) -> Option<VehicleId> {
        self.assignment.values().max().copied()
    }
}

/// Fewest vehicles that could carry everybody, but never less than one
pub fn min_vehicles(total_demand: u64, capacity: u32) -> u32 {
    let capacity = capacity as u64;
    total_demand.div_ceil(capacity).max(1) as u32
}

/// Group stops so that no vehicle has to pick up more passengers than it can carry.
///
/// Starts with as few vehicles as the total demand allows. If there are at least as many vehicles
/// as stops, every stop gets its own vehicle. Otherwise the stops are grouped geometrically and
/// overfilled groups are repaired afterwards, see [capacity::repair].
/// A single stop with more passengers than `capacity` is never split.
pub fn cluster_by_capacity(
    stops: &[DemandStop],
    capacity: u32,
    clusterer: &dyn StopClusterer,
) -> Result<Clustering, ClusteringError> {
    if stops.is_empty() {
        return Err(ClusteringError::NoStops);
    }
    if capacity == 0 {
        return Err(ClusteringError::ZeroCapacity);
    }

    let stops = sorted_by_id(stops);
    let total_demand: u64 = stops.iter().map(|stop| stop.demand as u64).sum();
    let min_vehicles = min_vehicles(total_demand, capacity);
    info!(target: "clustering", "{total_demand} passengers at {} stops need at least {min_vehicles} vehicle(s)", stops.len());

    if stops.len() <= min_vehicles as usize {
        return Ok(singletons(&stops));
    }

    let mut clustering = geometric(&stops, min_vehicles as usize, clusterer)?;
    capacity::repair(&mut clustering, capacity, VehicleId(min_vehicles));

    info!(target: "clustering", "Using {} vehicle(s)", clustering.vehicles().len());
    Ok(clustering)
}

/// Group stops into a fixed number of vehicles without looking at demand
pub fn cluster_fixed(
    stops: &[DemandStop],
    vehicles: u32,
    clusterer: &dyn StopClusterer,
) -> Result<Clustering, ClusteringError> {
    if stops.is_empty() {
        return Err(ClusteringError::NoStops);
    }
    if vehicles == 0 {
        return Err(ClusteringError::InvalidClusterCount { k: 0, points: stops.len() });
    }

    let stops = sorted_by_id(stops);
    let k = (vehicles as usize).min(stops.len());
    if k == stops.len() {
        return Ok(singletons(&stops));
    }

    geometric(&stops, k, clusterer)
}

fn sorted_by_id(stops: &[DemandStop]) -> Vec<DemandStop> {
    stops.iter()
        .copied()
        .sorted_by_key(|stop| stop.id)
        .collect()
}

fn singletons(stops: &[DemandStop]) -> Clustering {
    let mut clustering = Clustering::default();
    for (vehicle, stop) in stops.iter().enumerate() {
        clustering.assign(stop, VehicleId(vehicle as u32));
    }
    debug!(target: "clustering", "One vehicle per stop ({} stops)", stops.len());
    clustering
}

fn geometric(
    stops: &[DemandStop],
    k: usize,
    clusterer: &dyn StopClusterer,
) -> Result<Clustering, ClusteringError> {
    let points = stops.iter().map(|stop| stop.location).collect_vec();
    let labels = clusterer.cluster(&points, k)?;
    if labels.len() != stops.len() {
        return Err(ClusteringError::LabelCount { expected: stops.len(), got: labels.len() });
    }

    let mut clustering = Clustering::default();
    for (stop, label) in stops.iter().zip(labels) {
        clustering.assign(stop, VehicleId(label as u32));
    }
    debug!(target: "clustering", "Geometric clusters: {:?}", clustering.loads());

    Ok(clustering)
}

#[derive(thiserror::Error, Debug)]
pub enum ClusteringError {
    NoStops,
    ZeroCapacity,
    InvalidClusterCount { k: usize, points: usize },
    LabelCount { expected: usize, got: usize },
    Shape(#[from] ndarray::ShapeError),
    KMeans(#[from] linfa_clustering::KMeansError),
}

impl Display for ClusteringError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClusteringError::NoStops => write!(f, "No stops to cluster"),
            ClusteringError::ZeroCapacity => write!(f, "Vehicle capacity must be at least 1"),
            ClusteringError::InvalidClusterCount { k, points } => {
                write!(f, "Cannot split {points} stops into {k} clusters")
            }
            ClusteringError::LabelCount { expected, got } => {
                write!(f, "Clustering returned {got} labels for {expected} stops")
            }
            ClusteringError::Shape(err) => write!(f, "{}", err),
            ClusteringError::KMeans(err) => write!(f, "{}", err),
        }
    }
}
