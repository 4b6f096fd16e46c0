use crate::clustering::{ClusteringError, StopClusterer};
use common::types::Coordinates;
use linfa::prelude::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// Lloyd's k-means on raw (lng, lat) pairs. The generator is seeded, so the same stops always
/// end up in the same groups; of all runs the one with the lowest inertia is kept.
#[derive(Debug, Clone)]
pub struct KMeansClusterer {
    pub seed: u64,
    pub n_runs: usize,
    pub max_iterations: u64,
    pub tolerance: f64,
}

impl Default for KMeansClusterer {
    fn default() -> Self {
        Self {
            seed: 42,
            n_runs: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

impl StopClusterer for KMeansClusterer {
    fn cluster(&self, points: &[Coordinates], k: usize) -> Result<Vec<usize>, ClusteringError> {
        if points.is_empty() {
            return Err(ClusteringError::NoStops);
        }
        if k == 0 || k > points.len() {
            return Err(ClusteringError::InvalidClusterCount { k, points: points.len() });
        }

        let records = Array2::from_shape_vec(
            (points.len(), 2),
            points.iter().flat_map(|point| [point.lng, point.lat]).collect(),
        )?;
        let dataset = DatasetBase::from(records.clone());

        let k_means_model = KMeans::params_with_rng(k, Xoshiro256Plus::seed_from_u64(self.seed))
            .n_runs(self.n_runs)
            .max_n_iterations(self.max_iterations)
            .tolerance(self.tolerance)
            .fit(&dataset)?;
        let labels: Array1<usize> = k_means_model.predict(&records);

        Ok(labels.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> Vec<Coordinates> {
        vec![
            Coordinates::new(0.0, 0.0),
            Coordinates::new(10.0, 10.0),
            Coordinates::new(0.1, 0.0),
            Coordinates::new(10.1, 10.0),
            Coordinates::new(0.0, 0.1),
        ]
    }

    #[test]
    fn test_separates_distant_groups() {
        let labels = KMeansClusterer::default().cluster(&two_groups(), 2).unwrap();

        assert_eq!(labels.len(), 5);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[0], labels[4]);
        assert_eq!(labels[1], labels[3]);
        assert_ne!(labels[0], labels[1]);
    }

    #[test]
    fn test_deterministic() {
        let clusterer = KMeansClusterer::default();
        assert_eq!(
            clusterer.cluster(&two_groups(), 2).unwrap(),
            clusterer.cluster(&two_groups(), 2).unwrap()
        );
    }

    #[test]
    fn test_rejects_more_clusters_than_points() {
        let result = KMeansClusterer::default().cluster(&two_groups()[..1], 2);
        assert!(matches!(result, Err(ClusteringError::InvalidClusterCount { k: 2, points: 1 })));
    }
}
