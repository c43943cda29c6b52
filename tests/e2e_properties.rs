//! Property tests over randomly generated evidence.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use semantic_map::partition::{ColexClass, LanguageSample};
use semantic_map::{
    CandidateGraph, ConceptRegistry, IndependenceOracle, OrientationConfig, SampleSet,
    SkeletonConfig, ThresholdMatrix, UnitFlowOracle, infer_skeleton, orient,
};

const N: usize = 5;

// ============================================================================
// Strategies
// ============================================================================

/// (language, concepts) classes over `N` variables.
fn classes() -> impl Strategy<Value = Vec<(usize, BTreeSet<usize>)>> {
    prop::collection::vec((0..4usize, prop::collection::btree_set(0..N, 1..4)), 0..14)
}

fn sample_set(classes: &[(usize, BTreeSet<usize>)]) -> SampleSet {
    let mut by_language: BTreeMap<usize, Vec<ColexClass>> = BTreeMap::new();
    for (idx, (language, concepts)) in classes.iter().enumerate() {
        by_language
            .entry(*language)
            .or_default()
            .push(ColexClass::new(format!("w{idx}"), concepts.iter().copied()));
    }
    SampleSet::new(
        by_language
            .into_iter()
            .map(|(language, classes)| LanguageSample { language: format!("l{language}"), classes })
            .collect(),
    )
}

fn registry() -> Arc<ConceptRegistry> {
    Arc::new(ConceptRegistry::new((0..N).map(|i| format!("C{i}"))))
}

/// Graph over `N` variables with the links chosen by `mask` (10 pairs).
fn masked_graph(mask: &[bool]) -> CandidateGraph {
    let mut graph = CandidateGraph::empty(registry());
    let mut bit = 0;
    for i in 0..N {
        for j in (i + 1)..N {
            if mask[bit] {
                graph.add_link(i, j);
            }
            bit += 1;
        }
    }
    graph
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_oracle_is_symmetric(
        classes in classes(),
        mask in prop::collection::vec(any::<bool>(), 10),
        x in 0..N,
        y in 0..N,
        conditioning in prop::collection::btree_set(0..N, 0..3),
        threshold in 0u8..3,
    ) {
        prop_assume!(x != y);
        let conditioning: Vec<usize> = conditioning.into_iter().filter(|&v| v != x && v != y).collect();
        let samples = sample_set(&classes);
        let thresholds = ThresholdMatrix::uniform(N, f64::from(threshold)).unwrap();
        let oracle = UnitFlowOracle::new(&samples, &thresholds, N).unwrap();
        let graph = masked_graph(&mask);

        prop_assert_eq!(oracle.test(&graph, x, y, &conditioning), oracle.test(&graph, y, x, &conditioning));
    }

    #[test]
    fn prop_higher_threshold_keeps_independence(
        classes in classes(),
        mask in prop::collection::vec(any::<bool>(), 10),
        x in 0..N,
        y in 0..N,
        conditioning in prop::collection::btree_set(0..N, 0..3),
        threshold in 0u8..3,
        raise in 1u8..3,
    ) {
        prop_assume!(x != y);
        let conditioning: Vec<usize> = conditioning.into_iter().filter(|&v| v != x && v != y).collect();
        let samples = sample_set(&classes);
        let low = ThresholdMatrix::uniform(N, f64::from(threshold)).unwrap();
        let high = ThresholdMatrix::uniform(N, f64::from(threshold + raise)).unwrap();
        let graph = masked_graph(&mask);

        let at_low = UnitFlowOracle::new(&samples, &low, N).unwrap().test(&graph, x, y, &conditioning);
        let at_high = UnitFlowOracle::new(&samples, &high, N).unwrap().test(&graph, x, y, &conditioning);
        if at_low.is_independent() {
            prop_assert!(at_high.is_independent());
        }
    }

    #[test]
    fn prop_conditioning_never_increases_flow(
        classes in classes(),
        mask in prop::collection::vec(any::<bool>(), 10),
        x in 0..N,
        y in 0..N,
        conditioning in prop::collection::btree_set(0..N, 0..3),
        extra in 0..N,
    ) {
        prop_assume!(x != y && extra != x && extra != y);
        let base: Vec<usize> = conditioning.into_iter().filter(|&v| v != x && v != y).collect();
        let mut grown = base.clone();
        if !grown.contains(&extra) {
            grown.push(extra);
        }
        let samples = sample_set(&classes);
        let thresholds = ThresholdMatrix::uniform(N, 0.0).unwrap();
        let oracle = UnitFlowOracle::new(&samples, &thresholds, N).unwrap();
        let graph = masked_graph(&mask);

        prop_assert!(oracle.flow(&graph, x, y, &grown) <= oracle.flow(&graph, x, y, &base));
    }

    #[test]
    fn prop_skeleton_links_are_symmetric(classes in classes(), seed in any::<u64>(), stable in any::<bool>()) {
        let samples = sample_set(&classes);
        let thresholds = ThresholdMatrix::uniform(N, 0.0).unwrap();
        let oracle = UnitFlowOracle::new(&samples, &thresholds, N).unwrap();
        let mut graph = CandidateGraph::complete(registry());
        let config = SkeletonConfig { stable, ..Default::default() };
        infer_skeleton(&mut graph, &oracle, &config, &mut ChaCha8Rng::seed_from_u64(seed));

        for i in 0..N {
            for j in 0..N {
                prop_assert_eq!(graph.has_link(i, j), graph.has_link(j, i));
                prop_assert_eq!(graph.has_link(i, j), graph.neighbors(i).contains(&j));
            }
        }
    }

    #[test]
    fn prop_orientation_is_idempotent(classes in classes()) {
        let samples = sample_set(&classes);
        let thresholds = ThresholdMatrix::uniform(N, 0.0).unwrap();
        let oracle = UnitFlowOracle::new(&samples, &thresholds, N).unwrap();
        let mut graph = CandidateGraph::complete(registry());
        let stats = infer_skeleton(&mut graph, &oracle, &SkeletonConfig::default(), &mut ChaCha8Rng::seed_from_u64(0));
        let config = OrientationConfig { max_conditioning_size: Some(stats.max_level), ..Default::default() };

        orient(&mut graph, &oracle, &config);
        let once = graph.clone();
        orient(&mut graph, &oracle, &config);
        prop_assert_eq!(graph, once);
    }

    #[test]
    fn prop_undirected_fallback_removes_circles_only(mask in prop::collection::vec(any::<bool>(), 10)) {
        let mut graph = masked_graph(&mask);
        let before = graph.pairs();
        graph.convert_undetermined_to_plain();
        prop_assert_eq!(graph.pairs(), before);
        prop_assert_eq!(graph.circle_count(), 0);
    }

    #[test]
    fn prop_bootstrap_draws_from_sample(classes in classes(), seed in any::<u64>()) {
        let samples = sample_set(&classes);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let resampled = samples.resample(&mut rng);
        prop_assert_eq!(resampled.len(), samples.len());
        for language in resampled.iter() {
            prop_assert!(samples.shares(language));
        }
    }
}
