use common::types::config::Settings;
use common::types::errors::UnknownStopError;
use common::types::{Coordinates, StopId, StopKey};
use std::collections::BTreeMap;

/// Fixed reference data for a run: where the stops are and where every route ends.
#[derive(Debug, Clone)]
pub struct StopCatalog {
    stops: BTreeMap<StopId, Coordinates>,
    depot: Coordinates,
    depot_label: String,
}

impl StopCatalog {
    pub fn new(stops: BTreeMap<StopId, Coordinates>, depot: Coordinates, depot_label: impl Into<String>) -> Self {
        Self { stops, depot, depot_label: depot_label.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.stops.clone(), settings.depot.location, settings.depot.label.clone())
    }

    pub fn coordinates(&self, key: StopKey) -> Result<Coordinates, UnknownStopError> {
        match key {
            StopKey::Depot => Ok(self.depot),
            StopKey::Stop(id) => self.stops.get(&id).copied().ok_or(UnknownStopError(key)),
        }
    }

    /// Name shown to passengers and drivers
    pub fn label(&self, key: StopKey) -> String {
        match key {
            StopKey::Depot => self.depot_label.clone(),
            StopKey::Stop(id) => format!("Stop {id}"),
        }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_labels() {
        let catalog = StopCatalog::new(
            BTreeMap::from([(StopId(4), Coordinates::new(1.0, 2.0))]),
            Coordinates::new(3.0, 4.0),
            "College",
        );

        assert_eq!(catalog.coordinates(StopKey::Stop(StopId(4))).unwrap(), Coordinates::new(1.0, 2.0));
        assert_eq!(catalog.coordinates(StopKey::Depot).unwrap(), Coordinates::new(3.0, 4.0));
        assert!(catalog.coordinates(StopKey::Stop(StopId(5))).is_err());
        assert_eq!(catalog.label(StopKey::Stop(StopId(4))), "Stop 4");
        assert_eq!(catalog.label(StopKey::Depot), "College");
    }
}
