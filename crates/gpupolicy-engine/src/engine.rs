//! Engine facade assembling the registry, evaluator and ranker

use gpupolicy_core::{Device, EngineConfig, Policy, Pool, Requirements, Ruleset, ScoringConfig};
use std::sync::Arc;
use tracing::info;

use crate::evaluator::Evaluator;
use crate::ranker::{DeviceScorer, Ranker, Recommendation};
use crate::registry::Registry;

/// Policy engine: owns the registry and answers allocation queries against it
pub struct PolicyEngine {
    registry: Arc<Registry>,
    ranker: Ranker,
}

impl PolicyEngine {
    /// Create an engine with an empty registry
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_registry(Arc::new(Registry::new()), config.scoring.clone())
    }

    /// Create an engine over an existing (possibly shared) registry
    pub fn with_registry(registry: Arc<Registry>, scoring: ScoringConfig) -> Self {
        info!(
            pools = registry.pool_count(),
            schedules = registry.schedule_count(),
            "Policy engine initialized"
        );

        let ranker = Ranker::new(Evaluator::new(Arc::clone(&registry)), scoring);
        Self { registry, ranker }
    }

    /// Replace the scoring strategy
    pub fn with_scorer(mut self, scorer: Arc<dyn DeviceScorer>) -> Self {
        self.ranker = Ranker::with_scorer(self.ranker.evaluator().clone(), scorer);
        self
    }

    /// Shared registry backing this engine
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Register every pool and schedule in a policy document
    pub fn load_policy(&self, policy: &Policy) {
        self.registry.load_policy(policy);
    }

    /// Register a pool, replacing any pool with the same name
    pub fn register_pool(&self, pool: Pool) {
        self.registry.register_pool(pool);
    }

    /// Register a ruleset, replacing any ruleset with the same name
    pub fn register_schedule(&self, ruleset: Ruleset) {
        self.registry.register_schedule(ruleset);
    }

    /// Look up a pool by name
    pub fn get_pool(&self, name: &str) -> Option<Arc<Pool>> {
        self.registry.get_pool(name)
    }

    /// Look up a ruleset by name
    pub fn get_schedule(&self, name: &str) -> Option<Arc<Ruleset>> {
        self.registry.get_schedule(name)
    }

    /// All pools in registration order
    pub fn list_pools(&self) -> Vec<Arc<Pool>> {
        self.registry.list_pools()
    }

    /// All rulesets in registration order
    pub fn list_schedules(&self) -> Vec<Arc<Ruleset>> {
        self.registry.list_schedules()
    }

    /// True iff some pool admits the device and it meets the requirements
    pub fn evaluate(&self, device: &Device, requirements: &Requirements) -> bool {
        self.ranker.evaluator().evaluate(device, requirements)
    }

    /// Suitability score of a device; higher is better
    pub fn score(&self, device: &Device) -> f64 {
        self.ranker.score(device)
    }

    /// Eligible devices with their scores, highest first
    pub fn rank(&self, devices: &[Device], requirements: &Requirements) -> Vec<Recommendation> {
        self.ranker.rank(devices, requirements)
    }

    /// Eligible devices, most suitable first
    pub fn recommend(&self, devices: &[Device], requirements: &Requirements) -> Vec<Device> {
        self.ranker.recommend(devices, requirements)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpupolicy_core::Rule;

    fn high_mem_engine() -> PolicyEngine {
        let engine = PolicyEngine::default();
        engine.register_pool(
            Pool::builder("high-mem")
                .min_memory_gb(16.0)
                .max_temp_c(80.0)
                .build()
                .unwrap(),
        );
        engine
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_cool_high_memory_device_is_admitted() {
        let engine = high_mem_engine();
        let device = Device::builder(0, "X", "GPU-00000000")
            .memory_gb(24.0)
            .temperature_c(35.0)
            .online(true)
            .build()
            .unwrap();

        let needs_16gb = Requirements::builder().min_memory(16.0).build().unwrap();
        assert!(engine.evaluate(&device, &needs_16gb));
        assert!(approx(engine.score(&device), 2.0));
    }

    #[test]
    fn test_memory_floor_rejects_regardless_of_requirements() {
        let engine = high_mem_engine();
        let device = Device::builder(1, "X", "GPU-00000001")
            .memory_gb(8.0)
            .temperature_c(35.0)
            .build()
            .unwrap();

        assert!(!engine.evaluate(&device, &Requirements::default()));
        let needs_4gb = Requirements::builder().min_memory(4.0).build().unwrap();
        assert!(!engine.evaluate(&device, &needs_4gb));
    }

    #[test]
    fn test_hot_penalty_excludes_cool_bonus() {
        let engine = PolicyEngine::default();
        engine.register_pool(Pool::builder("hot-ok").max_temp_c(95.0).build().unwrap());
        let device = Device::builder(2, "X", "GPU-00000002")
            .memory_gb(20.0)
            .temperature_c(85.0)
            .online(true)
            .build()
            .unwrap();

        assert!(engine.evaluate(&device, &Requirements::default()));
        assert!(approx(engine.score(&device), 1.5));
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let engine = PolicyEngine::default();
        engine.register_pool(Pool::builder("any").build().unwrap());

        let devices: Vec<Device> = ["first", "second", "third"]
            .iter()
            .enumerate()
            .map(|(i, uuid)| {
                Device::builder(i as u32, "GPU", *uuid)
                    .memory_gb(24.0)
                    .temperature_c(40.0)
                    .build()
                    .unwrap()
            })
            .collect();

        let uuids: Vec<String> = engine
            .recommend(&devices, &Requirements::default())
            .iter()
            .map(|d| d.uuid().to_string())
            .collect();
        assert_eq!(uuids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_load_policy_document_and_recommend() {
        let policy = Policy::from_toml_str(
            r#"
name = "cluster"

[[pools]]
name = "rtx"
gpu_types = ["RTX"]
min_memory_gb = 12.0
max_temp_c = 85.0

[[schedules]]
name = "default"

[[schedules.rules]]
kind = "priority"
metric = "temperature"
"#,
        )
        .unwrap();

        let engine = PolicyEngine::default();
        engine.load_policy(&policy);
        assert_eq!(engine.list_pools().len(), 1);
        assert_eq!(
            engine.get_schedule("default").unwrap().rules()[0],
            Rule::priority("temperature")
        );

        let devices = vec![
            Device::builder(0, "NVIDIA A100", "GPU-a").memory_gb(40.0).build().unwrap(),
            Device::builder(1, "NVIDIA GeForce RTX 4080", "GPU-b")
                .memory_gb(16.0)
                .temperature_c(70.0)
                .build()
                .unwrap(),
            Device::builder(2, "NVIDIA GeForce RTX 5070 Ti", "GPU-c")
                .memory_gb(16.0)
                .temperature_c(35.0)
                .tag("spare")
                .build()
                .unwrap(),
        ];

        let ranked = engine.rank(&devices, &Requirements::default());
        let ids: Vec<u32> = ranked.iter().map(|r| r.device.id()).collect();
        assert_eq!(ids, vec![2, 1]);

        let spare = Requirements::builder().tag("spare").build().unwrap();
        let tagged = engine.recommend(&devices, &spare);
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].uuid(), "GPU-c");
    }

    #[test]
    fn test_requirements_from_open_mapping() {
        let engine = high_mem_engine();
        let device = Device::builder(0, "X", "GPU-0")
            .memory_gb(24.0)
            .temperature_c(70.0)
            .build()
            .unwrap();

        let strict: Requirements =
            serde_json::from_str(r#"{"max_temp": 65, "deadline": "soon"}"#).unwrap();
        let loose: Requirements = serde_json::from_str(r#"{"max_temp": 75}"#).unwrap();

        assert!(!engine.evaluate(&device, &strict));
        assert!(engine.evaluate(&device, &loose));
    }

    #[test]
    fn test_shared_registry() {
        let registry = Arc::new(Registry::new());
        let engine = PolicyEngine::with_registry(Arc::clone(&registry), ScoringConfig::default());
        let device = Device::builder(0, "X", "GPU-0").memory_gb(8.0).build().unwrap();

        assert!(!engine.evaluate(&device, &Requirements::default()));
        registry.register_pool(Pool::builder("late").build().unwrap());
        assert!(engine.evaluate(&device, &Requirements::default()));
        assert!(engine.get_pool("late").is_some());
    }
}
