//! Device scoring and recommendation ordering

use gpupolicy_core::{Device, Requirements, ScoringConfig};
use std::sync::Arc;
use tracing::debug;

use crate::evaluator::Evaluator;

/// Strategy for scoring an eligible device; higher is more suitable
pub trait DeviceScorer: Send + Sync {
    fn score(&self, device: &Device) -> f64;
}

/// Default scorer: a base score adjusted for availability, memory and temperature.
///
/// With default weights: 1.0, +0.5 online, +0.3 for >= 16 GB, and either
/// +0.2 below 60 °C or -0.3 above 80 °C (60-80 °C inclusive adds nothing).
#[derive(Debug, Clone, Default)]
pub struct WeightedScorer {
    weights: ScoringConfig,
}

impl WeightedScorer {
    pub fn new(weights: ScoringConfig) -> Self {
        Self { weights }
    }
}

impl DeviceScorer for WeightedScorer {
    fn score(&self, device: &Device) -> f64 {
        let w = &self.weights;
        let mut score = w.base;

        if device.is_online() {
            score += w.online_bonus;
        }

        if device.memory_gb() >= w.high_memory_gb {
            score += w.high_memory_bonus;
        }

        if device.temperature_c() < w.cool_below_c {
            score += w.cool_bonus;
        } else if device.temperature_c() > w.hot_above_c {
            score -= w.hot_penalty;
        }

        score
    }
}

/// An eligible device and its score
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub device: Device,
    pub score: f64,
}

/// Filters devices through the evaluator and orders survivors by score
#[derive(Clone)]
pub struct Ranker {
    evaluator: Evaluator,
    scorer: Arc<dyn DeviceScorer>,
}

impl Ranker {
    /// Create a ranker using the default weighted scorer
    pub fn new(evaluator: Evaluator, weights: ScoringConfig) -> Self {
        Self::with_scorer(evaluator, Arc::new(WeightedScorer::new(weights)))
    }

    pub fn with_scorer(evaluator: Evaluator, scorer: Arc<dyn DeviceScorer>) -> Self {
        Self { evaluator, scorer }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn score(&self, device: &Device) -> f64 {
        self.scorer.score(device)
    }

    /// Eligible devices with their scores, highest first.
    ///
    /// Every device is judged against the same registry snapshot. Equal
    /// scores keep their input order.
    pub fn rank(&self, devices: &[Device], requirements: &Requirements) -> Vec<Recommendation> {
        let pools = self.evaluator.registry().list_pools();

        let mut ranked: Vec<Recommendation> = devices
            .iter()
            .filter(|d| self.evaluator.evaluate_in(&pools, d, requirements))
            .map(|d| {
                let score = self.scorer.score(d);
                debug!(device = d.id(), score, "Scored device");
                Recommendation {
                    device: d.clone(),
                    score,
                }
            })
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            candidates = devices.len(),
            eligible = ranked.len(),
            "Ranked devices"
        );

        ranked
    }

    /// Eligible devices, most suitable first
    pub fn recommend(&self, devices: &[Device], requirements: &Requirements) -> Vec<Device> {
        self.rank(devices, requirements)
            .into_iter()
            .map(|r| r.device)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use gpupolicy_core::Pool;

    fn device(id: u32, memory_gb: f64, temperature_c: f64, online: bool) -> Device {
        Device::builder(id, format!("GPU {}", id), format!("GPU-{:08x}", id))
            .memory_gb(memory_gb)
            .temperature_c(temperature_c)
            .online(online)
            .build()
            .unwrap()
    }

    fn open_ranker() -> Ranker {
        let registry = Arc::new(Registry::new());
        registry.register_pool(Pool::builder("any").build().unwrap());
        Ranker::new(Evaluator::new(registry), ScoringConfig::default())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_score_components() {
        let scorer = WeightedScorer::default();
        assert!(approx(scorer.score(&device(0, 8.0, 70.0, false)), 1.0));
        assert!(approx(scorer.score(&device(0, 8.0, 70.0, true)), 1.5));
        assert!(approx(scorer.score(&device(0, 16.0, 70.0, false)), 1.3));
        assert!(approx(scorer.score(&device(0, 8.0, 59.9, false)), 1.2));
        assert!(approx(scorer.score(&device(0, 8.0, 80.5, false)), 0.7));
    }

    #[test]
    fn test_neutral_temperature_band() {
        let scorer = WeightedScorer::default();
        assert!(approx(scorer.score(&device(0, 8.0, 60.0, false)), 1.0));
        assert!(approx(scorer.score(&device(0, 8.0, 80.0, false)), 1.0));
    }

    #[test]
    fn test_custom_weights() {
        let scorer = WeightedScorer::new(ScoringConfig {
            online_bonus: 2.0,
            ..ScoringConfig::default()
        });
        assert!(approx(scorer.score(&device(0, 8.0, 70.0, true)), 3.0));
    }

    #[test]
    fn test_recommend_orders_by_score() {
        let ranker = open_ranker();
        let devices = vec![
            device(0, 8.0, 85.0, false),
            device(1, 24.0, 35.0, true),
            device(2, 8.0, 70.0, true),
        ];

        let ranked = ranker.rank(&devices, &Requirements::default());
        let ids: Vec<u32> = ranked.iter().map(|r| r.device.id()).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_recommend_filters_ineligible() {
        let ranker = open_ranker();
        let devices = vec![device(0, 8.0, 40.0, true), device(1, 32.0, 40.0, true)];

        let needs_16gb = Requirements::builder().min_memory(16.0).build().unwrap();

        let recommended = ranker.recommend(&devices, &needs_16gb);
        assert_eq!(recommended.len(), 1);
        assert_eq!(recommended[0].id(), 1);
        assert!(recommended
            .iter()
            .all(|d| ranker.evaluator().evaluate(d, &needs_16gb)));
    }

    #[test]
    fn test_recommend_without_pools_is_empty() {
        let ranker = Ranker::new(
            Evaluator::new(Arc::new(Registry::new())),
            ScoringConfig::default(),
        );
        assert!(ranker
            .recommend(&[device(0, 80.0, 30.0, true)], &Requirements::default())
            .is_empty());
    }

    struct MemoryOnly;

    impl DeviceScorer for MemoryOnly {
        fn score(&self, device: &Device) -> f64 {
            device.memory_gb()
        }
    }

    #[test]
    fn test_custom_scorer() {
        let registry = Arc::new(Registry::new());
        registry.register_pool(Pool::builder("any").build().unwrap());
        let ranker = Ranker::with_scorer(Evaluator::new(registry), Arc::new(MemoryOnly));

        let devices = vec![device(0, 8.0, 40.0, true), device(1, 48.0, 85.0, false)];
        let ids: Vec<u32> = ranker
            .recommend(&devices, &Requirements::default())
            .iter()
            .map(Device::id)
            .collect();
        assert_eq!(ids, vec![1, 0]);
    }

    /// Re-registers the only pool with a high memory floor while scoring
    struct TighteningScorer {
        registry: Arc<Registry>,
    }

    impl DeviceScorer for TighteningScorer {
        fn score(&self, device: &Device) -> f64 {
            self.registry
                .register_pool(Pool::builder("p").min_memory_gb(64.0).build().unwrap());
            device.memory_gb()
        }
    }

    #[test]
    fn test_rank_uses_one_registry_snapshot() {
        let registry = Arc::new(Registry::new());
        registry.register_pool(Pool::builder("p").build().unwrap());
        let scorer = Arc::new(TighteningScorer {
            registry: Arc::clone(&registry),
        });
        let ranker = Ranker::with_scorer(Evaluator::new(Arc::clone(&registry)), scorer);

        let devices = vec![device(0, 8.0, 40.0, true), device(1, 8.0, 40.0, true)];
        let ids: Vec<u32> = ranker
            .rank(&devices, &Requirements::default())
            .iter()
            .map(|r| r.device.id())
            .collect();
        assert_eq!(ids, vec![0, 1]);

        // The next call sees the tightened pool
        assert!(ranker
            .recommend(&devices, &Requirements::default())
            .is_empty());
    }
}
