use crate::clustering::Clustering;
use common::types::VehicleId;
use log::{debug, warn};
use std::cmp::Reverse;

/// Greedy capacity repair.
///
/// As long as some vehicle carries more than `capacity`, the most overfilled one gives up its
/// first stop (lowest stop id), which becomes the only stop of a new vehicle. New vehicles are
/// numbered upwards from `first_free`. Underfilled vehicles are never merged, so this may use
/// more vehicles than strictly necessary.
///
/// A vehicle whose only stop exceeds the capacity cannot be repaired and stays as it is.
pub fn repair(clustering: &mut Clustering, capacity: u32, first_free: VehicleId) {
    let mut next_vehicle = clustering.max_vehicle()
        .map(|max| max.0 + 1)
        .unwrap_or_default()
        .max(first_free.0);

    while let Some(overfilled) = most_overfilled(clustering, capacity) {
        let Some(&stop) = clustering.members(overfilled).first() else { break; };
        let new_vehicle = VehicleId(next_vehicle);
        clustering.reassign(stop, new_vehicle);
        next_vehicle += 1;

        debug!(
            target: "clustering",
            "Moved stop {stop} from vehicle {overfilled} ({} left) to new vehicle {new_vehicle} ({})",
            clustering.load(overfilled), clustering.load(new_vehicle)
        );
    }

    for vehicle in clustering.vehicles() {
        let load = clustering.load(vehicle);
        if load > capacity {
            warn!(target: "clustering", "Vehicle {vehicle} serves a single stop with {load} passengers, more than its capacity of {capacity}");
        }
    }
}

/// Vehicle with the highest load above capacity that still has more than one stop.
/// Ties go to the lower vehicle id.
fn most_overfilled(clustering: &Clustering, capacity: u32) -> Option<VehicleId> {
    clustering.loads().iter()
        .filter(|(_, load)| **load > capacity)
        .filter(|(vehicle, _)| clustering.members(**vehicle).len() > 1)
        .max_by_key(|(vehicle, load)| (**load, Reverse(**vehicle)))
        .map(|(vehicle, _)| *vehicle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::DemandStop;
    use common::types::{Coordinates, StopId};

    fn clustering(stops: &[(u32, u32, u32)]) -> Clustering {
        let mut clustering = Clustering::default();
        for (id, demand, vehicle) in stops {
            let stop = DemandStop { id: StopId(*id), location: Coordinates::new(0.0, 0.0), demand: *demand };
            clustering.assign(&stop, VehicleId(*vehicle));
        }
        clustering
    }

    #[test]
    fn test_picks_most_overfilled_first() {
        // vehicle 1 is worse than vehicle 0
        let mut clustering = clustering(&[(0, 6, 0), (1, 6, 0), (2, 9, 1), (3, 9, 1)]);
        assert_eq!(most_overfilled(&clustering, 10), Some(VehicleId(1)));

        repair(&mut clustering, 10, VehicleId(2));
        assert_eq!(clustering.vehicle_of(&StopId(2)), Some(VehicleId(2)));
        assert_eq!(clustering.vehicle_of(&StopId(0)), Some(VehicleId(3)));
        assert!(clustering.vehicles().iter().all(|v| clustering.load(*v) <= 10));
    }

    #[test]
    fn test_ties_go_to_lower_vehicle() {
        let clustering = clustering(&[(0, 6, 1), (1, 6, 1), (2, 6, 0), (3, 6, 0)]);
        assert_eq!(most_overfilled(&clustering, 10), Some(VehicleId(0)));
    }

    #[test]
    fn test_nothing_to_repair() {
        let mut clustering = clustering(&[(0, 4, 0), (1, 5, 0), (2, 11, 1)]);
        let before = clustering.clone();

        repair(&mut clustering, 10, VehicleId(2));
        assert_eq!(clustering, before);
    }

    #[test]
    fn test_new_vehicles_skip_used_ids() {
        // Labels don't have to be dense, new vehicles must not collide with vehicle 5
        let mut clustering = clustering(&[(0, 8, 0), (1, 8, 0), (2, 1, 5)]);
        repair(&mut clustering, 10, VehicleId(2));

        assert_eq!(clustering.vehicle_of(&StopId(0)), Some(VehicleId(6)));
    }
}
