use crate::catalog::StopCatalog;
use crate::clustering::k_means::KMeansClusterer;
use crate::clustering::{cluster_by_capacity, cluster_fixed, ClusteringError, DemandStop, StopClusterer};
use crate::demand::{aggregate, Demand, DemandError, DemandSource};
use crate::eta::{EtaPropagator, ETA_FORMAT};
use crate::sequencing::double_tree::DoubleTreeSolver;
use crate::sequencing::{sequence, PathSolver, SequencingError};
use crate::travel_time::crow_fly::CrowFlyEstimator;
use crate::travel_time::TravelTimeProvider;
use chrono::NaiveDateTime;
use common::types::config::Settings;
use common::types::errors::UnknownStopError;
use common::types::{StopKey, VehicleId};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub capacity: u32,
    /// Only used when `capacity_aware` is off
    pub vehicles: u32,
    pub capacity_aware: bool,
    pub compute_eta: bool,
    pub departure: NaiveDateTime,
}

impl EngineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            capacity: settings.fleet.capacity,
            vehicles: settings.fleet.vehicles,
            capacity_aware: settings.features.capacity_aware,
            compute_eta: settings.features.compute_eta,
            departure: settings.trip.departure(),
        }
    }
}

/// One visit as handed out to clients
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteStop {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub students: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}

/// Result of a run: the visits of every vehicle, keyed by vehicle
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct RoutePlan(pub BTreeMap<VehicleId, Vec<RouteStop>>);

impl RoutePlan {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Demand in, routes out. Holds no state between runs: everything a run computes lives on its
/// own stack, so one engine can serve overlapping requests.
pub struct RouteEngine {
    catalog: StopCatalog,
    options: EngineOptions,
    clusterer: Box<dyn StopClusterer>,
    solver: Box<dyn PathSolver>,
    eta: EtaPropagator,
}

impl RouteEngine {
    pub fn new(catalog: StopCatalog, options: EngineOptions, eta: EtaPropagator) -> Self {
        Self {
            catalog,
            options,
            clusterer: Box::new(KMeansClusterer::default()),
            solver: Box::new(DoubleTreeSolver::default()),
            eta,
        }
    }

    pub fn from_settings(settings: &Settings, live: Option<Box<dyn TravelTimeProvider>>) -> Self {
        let eta = EtaPropagator::new(
            live,
            CrowFlyEstimator::new(settings.travel_time.fallback_speed),
            settings.travel_time.timeout(),
        );
        Self::new(StopCatalog::from_settings(settings), EngineOptions::from_settings(settings), eta)
    }

    pub fn with_clusterer(mut self, clusterer: impl StopClusterer + 'static) -> Self {
        self.clusterer = Box::new(clusterer);
        self
    }

    pub fn with_solver(mut self, solver: impl PathSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn catalog(&self) -> &StopCatalog {
        &self.catalog
    }

    /// Take one snapshot of the sign-ups and plan with it
    pub async fn generate(&self, source: &dyn DemandSource) -> Result<RoutePlan, PlanError> {
        let records = source.snapshot().await?;
        let demand = aggregate(&records)?;
        self.plan(&demand).await
    }

    pub async fn plan(&self, demand: &Demand) -> Result<RoutePlan, PlanError> {
        if demand.values().all(|passengers| *passengers == 0) {
            info!(target: "main", "Nobody signed up, no routes to plan");
            return Ok(RoutePlan::default());
        }

        let stops: Vec<DemandStop> = demand.iter()
            .filter(|(_, passengers)| **passengers > 0)
            .filter_map(|(id, passengers)| match self.catalog.coordinates(StopKey::Stop(*id)) {
                Ok(location) => Some(DemandStop { id: *id, location, demand: *passengers }),
                Err(err) => {
                    warn!(target: "main", "Ignoring {passengers} passenger(s): {err}");
                    None
                }
            })
            .collect();

        if stops.is_empty() {
            warn!(target: "main", "No passengers at any known stop, planning an empty trip to the depot");
            let records = self.records(&[StopKey::Depot], demand).await?;
            return Ok(RoutePlan(BTreeMap::from([(VehicleId(0), records)])));
        }

        let clustering = if self.options.capacity_aware {
            cluster_by_capacity(&stops, self.options.capacity, self.clusterer.as_ref())?
        } else {
            cluster_fixed(&stops, self.options.vehicles, self.clusterer.as_ref())?
        };

        let mut plan = BTreeMap::new();
        for vehicle in clustering.vehicles() {
            let members = clustering.members(vehicle);
            let route = sequence(&self.catalog, &members, self.solver.as_ref())?;
            info!(
                target: "sequencing",
                "Vehicle {vehicle} picks up {} passenger(s) at {} stop(s)",
                clustering.load(vehicle), members.len()
            );

            plan.insert(vehicle, self.records(&route, demand).await?);
        }

        Ok(RoutePlan(plan))
    }

    async fn records(&self, route: &[StopKey], demand: &Demand) -> Result<Vec<RouteStop>, PlanError> {
        let etas: Vec<Option<String>> = if self.options.compute_eta {
            self.eta.propagate(&self.catalog, route, self.options.departure).await?
                .into_iter()
                .map(|(_, arrival)| Some(arrival.format(ETA_FORMAT).to_string()))
                .collect()
        } else {
            vec![None; route.len()]
        };

        route.iter()
            .zip(etas)
            .map(|(key, eta)| {
                let position = self.catalog.coordinates(*key)?;
                let students = match key {
                    StopKey::Depot => 0,
                    StopKey::Stop(id) => demand.get(id).copied().unwrap_or_default(),
                };
                Ok(RouteStop {
                    name: self.catalog.label(*key),
                    lat: position.lat,
                    lng: position.lng,
                    students,
                    eta,
                })
            })
            .collect()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    Demand(#[from] DemandError),
    Clustering(#[from] ClusteringError),
    Sequencing(#[from] SequencingError),
    UnknownStop(#[from] UnknownStopError),
}

impl Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            PlanError::Demand(err) => err,
            PlanError::Clustering(err) => err,
            PlanError::Sequencing(err) => err,
            PlanError::UnknownStop(err) => err,
        };
        let prefix = match self {
            PlanError::Demand(_) => "Reading demand",
            PlanError::Clustering(_) => "Clustering stops",
            PlanError::Sequencing(_) => "Ordering stops",
            PlanError::UnknownStop(_) => "Estimating arrival times",
        };
        write!(f, "{}: {}", prefix, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::{AttendanceRecord, StaticDemandSource};
    use crate::tests::{case_1, case_2, options, FailingProvider, FixedLabels};
    use common::types::StopId;
    use itertools::Itertools;

    fn offline_engine(catalog: StopCatalog, options: EngineOptions) -> RouteEngine {
        RouteEngine::new(catalog, options, EtaPropagator::offline(CrowFlyEstimator::default()))
    }

    fn visited_stops(plan: &RoutePlan) -> Vec<String> {
        plan.0.values()
            .flat_map(|route| route.iter().map(|stop| stop.name.clone()))
            .filter(|name| name != "College")
            .sorted()
            .collect()
    }

    #[tokio::test]
    async fn test_everybody_in_one_vehicle() {
        let engine = offline_engine(case_1::catalog(), options(50));
        let plan = engine.plan(&case_1::demand()).await.unwrap();

        assert_eq!(plan.0.len(), 1);
        let route = &plan.0[&VehicleId(0)];
        assert_eq!(route.len(), 4);
        assert_eq!(route[3].name, "College");
        assert_eq!(route[3].students, 0);
        assert_eq!(route.iter().map(|stop| stop.students).sum::<u32>(), 45);
        assert_eq!(visited_stops(&plan), vec!["Stop 0", "Stop 1", "Stop 2"]);
        assert_eq!(route[0].eta.as_deref(), Some("17:30"));
        assert!(route.windows(2).all(|w| w[0].eta <= w[1].eta));
    }

    #[tokio::test]
    async fn test_single_stop_over_capacity() {
        let engine = offline_engine(case_1::catalog(), options(10));
        let plan = engine.plan(&Demand::from([(StopId(4), 12)])).await.unwrap();

        assert_eq!(plan.0.len(), 1);
        let route = &plan.0[&VehicleId(0)];
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].name, "Stop 4");
        assert_eq!(route[0].students, 12);
        assert_eq!(route[1].name, "College");
    }

    #[tokio::test]
    async fn test_capacity_respected() {
        let engine = offline_engine(case_1::catalog(), options(50));
        let plan = engine.plan(&case_2::demand()).await.unwrap();

        for route in plan.0.values() {
            let load: u32 = route.iter().map(|stop| stop.students).sum();
            let stops = route.len() - 1;
            assert!(load <= 50 || stops == 1, "{route:?}");
            assert_eq!(route.last().map(|stop| stop.name.as_str()), Some("College"));
        }
        assert_eq!(visited_stops(&plan), (0..6).map(|i| format!("Stop {i}")).sorted().collect_vec());
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let engine = offline_engine(case_1::catalog(), options(50));
        assert_eq!(
            engine.plan(&case_2::demand()).await.unwrap(),
            engine.plan(&case_2::demand()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_independent() {
        let engine = offline_engine(case_1::catalog(), options(50));
        let (small_demand, large_demand) = (case_1::demand(), case_2::demand());
        let (small, large) = tokio::join!(engine.plan(&small_demand), engine.plan(&large_demand));

        assert_eq!(small.unwrap(), engine.plan(&small_demand).await.unwrap());
        assert_eq!(large.unwrap(), engine.plan(&large_demand).await.unwrap());
    }

    #[tokio::test]
    async fn test_nobody_signed_up() {
        let engine = offline_engine(case_1::catalog(), options(50));
        let plan = engine.plan(&Demand::new()).await.unwrap();

        assert!(plan.is_empty());
        assert_eq!(serde_json::to_string(&plan).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_passengers_only_at_unknown_stops() {
        let engine = offline_engine(case_1::catalog(), options(50));
        let plan = engine.plan(&Demand::from([(StopId(17), 3)])).await.unwrap();

        let route = &plan.0[&VehicleId(0)];
        assert_eq!(route.len(), 1);
        assert_eq!(route[0].name, "College");
        assert_eq!(route[0].students, 0);
        assert_eq!(route[0].eta.as_deref(), Some("17:30"));
    }

    #[tokio::test]
    async fn test_without_eta() {
        let engine = offline_engine(case_1::catalog(), EngineOptions { compute_eta: false, ..options(50) });
        let plan = engine.plan(&case_1::demand()).await.unwrap();

        assert!(plan.0.values().flatten().all(|stop| stop.eta.is_none()));
        let json = serde_json::to_value(&plan).unwrap();
        assert!(json["0"][0].get("eta").is_none());
        assert!(json["0"][0].get("lat").is_some());
    }

    #[tokio::test]
    async fn test_fixed_fleet() {
        let engine = offline_engine(case_1::catalog(), EngineOptions { capacity_aware: false, vehicles: 3, ..options(50) });
        let plan = engine.plan(&case_2::demand()).await.unwrap();

        assert!((1..=3).contains(&plan.0.len()));
        assert_eq!(visited_stops(&plan).len(), 6);
    }

    #[tokio::test]
    async fn test_failing_travel_times() {
        let live = RouteEngine::new(
            case_1::catalog(),
            options(50),
            EtaPropagator::new(Some(Box::new(FailingProvider)), CrowFlyEstimator::default(), std::time::Duration::from_secs(1)),
        );
        let offline = offline_engine(case_1::catalog(), options(50));

        assert_eq!(
            live.plan(&case_1::demand()).await.unwrap(),
            offline.plan(&case_1::demand()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_clustering_failure_yields_no_plan() {
        // Labels for fewer stops than there are
        let engine = offline_engine(case_1::catalog(), options(50))
            .with_clusterer(FixedLabels(vec![0]));
        let result = engine.plan(&case_2::demand()).await;

        assert!(matches!(result, Err(PlanError::Clustering(ClusteringError::LabelCount { .. }))));
    }

    #[tokio::test]
    async fn test_generate_from_source() {
        let engine = offline_engine(case_1::catalog(), options(50));
        let source = StaticDemandSource(vec![
            AttendanceRecord::new(1u32, true),
            AttendanceRecord::new("1", true),
            AttendanceRecord::new(5u32, true),
            AttendanceRecord::new(3u32, false),
        ]);

        let plan = engine.generate(&source).await.unwrap();
        assert_eq!(visited_stops(&plan), vec!["Stop 1", "Stop 5"]);
        let students: u32 = plan.0.values().flatten().map(|stop| stop.students).sum();
        assert_eq!(students, 3);
    }

    #[tokio::test]
    async fn test_output_format() {
        let engine = offline_engine(case_1::catalog(), options(50));
        let plan = engine.plan(&Demand::from([(StopId(0), 2)])).await.unwrap();
        let json = serde_json::to_value(&plan).unwrap();

        assert_eq!(json["0"][0]["name"], "Stop 0");
        assert_eq!(json["0"][0]["lng"], 4.0060);
        assert_eq!(json["0"][0]["lat"], 9.7600);
        assert_eq!(json["0"][0]["students"], 2);
        assert_eq!(json["0"][0]["eta"], "17:30");
        assert_eq!(json["0"][1]["name"], "College");
    }
}
