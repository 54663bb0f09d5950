// End-to-end extraction, alignment and comparison through the library API
//
// Each test renders a synthetic gem5 dump, runs it through the pipeline and
// checks the aligned series and scalars.

mod utils;

use simseries::align::{reconcile, synchronize, SeriesRequest};
use simseries::config::Config;
use simseries::pipeline::{Pipeline, Selection};
use simseries::{EntityPath, EntityScope, Family, MetricKey, SeriesError, Warning};
use utils::{Epoch, StatsDump};

fn key(family: Family, core: u32) -> MetricKey {
    MetricKey::new(family, EntityPath::core(core))
}

fn pipeline() -> Pipeline {
    Pipeline::new(Config::default()).unwrap()
}

// ============================================================================
// Extraction
// ============================================================================

#[test]
fn test_uniform_dump_extracts_every_family() {
    let text = StatsDump::uniform(4, 10, 0.001).render();
    let source = pipeline().ingest_str("uniform", &text);
    let run = &source.ingested.run;

    assert_eq!(run.keys_of(Family::Ipc, EntityScope::Cores).len(), 4);
    assert_eq!(run.keys_of(Family::DynamicPower, EntityScope::Cores).len(), 4);
    assert_eq!(run.keys_of(Family::StaticPower, EntityScope::Cores).len(), 4);
    assert_eq!(run.get(&key(Family::Ipc, 3)).unwrap().len(), 10);
    assert_eq!(run.get(&MetricKey::ELAPSED).unwrap().len(), 10);
    assert_eq!(run.elapsed_time(), Some(0.001));
    assert!(source.ingested.warnings.is_empty());
    assert_eq!(source.ingested.stats.metric_samples, 4 * 3 * 10);
    assert_eq!(source.ingested.stats.time_samples, 10);
}

#[test]
fn test_ten_cores_do_not_leak_into_core_one() {
    let text = StatsDump::new()
        .epoch(Epoch {
            sim_seconds: Some(0.001),
            ipc: vec![(1, 0.11), (10, 0.99), (11, 0.88)],
            ..Epoch::default()
        })
        .render();
    let run = pipeline().ingest_str("cpus10", &text).ingested.run;

    assert_eq!(run.get(&key(Family::Ipc, 1)), Some(&[0.11][..]));
    assert_eq!(run.get(&key(Family::Ipc, 10)), Some(&[0.99][..]));
    assert_eq!(run.get(&key(Family::Ipc, 11)), Some(&[0.88][..]));
}

#[test]
fn test_per_thread_ipc_is_separate_from_core_ipc() {
    let text = StatsDump::new()
        .epoch(Epoch {
            sim_seconds: Some(0.001),
            ipc: vec![(0, 1.2)],
            thread_ipc: vec![(0, 0, 0.7), (0, 1, 0.5)],
            ..Epoch::default()
        })
        .render();
    let run = pipeline().ingest_str("threads", &text).ingested.run;

    assert_eq!(run.get(&key(Family::Ipc, 0)), Some(&[1.2][..]));
    let t1 = MetricKey::new(Family::Ipc, EntityPath::thread(0, 1));
    assert_eq!(run.get(&t1), Some(&[0.5][..]));
    assert_eq!(run.keys_of(Family::Ipc, EntityScope::Threads).len(), 2);
    assert_eq!(run.keys_of(Family::Ipc, EntityScope::All).len(), 3);
}

#[test]
fn test_malformed_values_are_dropped_with_warning() {
    let text = StatsDump::new()
        .epoch(Epoch {
            sim_seconds: Some(0.001),
            dynamic_power: vec![(0, 1.0)],
            extra: vec![
                "system.cpu_cluster.cpus1.power_model.dynamicPower nan # Dynamic power".to_string(),
                "system.cpu_cluster.cpus2.power_model.dynamicPower".to_string(),
            ],
            ..Epoch::default()
        })
        .render();
    let ingested = pipeline().ingest_str("malformed", &text).ingested;

    assert_eq!(ingested.stats.malformed, 2);
    assert_eq!(ingested.warnings.len(), 2);
    assert!(ingested
        .warnings
        .iter()
        .all(|w| matches!(w, Warning::MalformedSample { .. })));
    assert!(!ingested.run.contains(&key(Family::DynamicPower, 1)));
    assert!(!ingested.run.contains(&key(Family::DynamicPower, 2)));
}

#[test]
fn test_max_cores_filters_entities() {
    let config = Config::from_toml_str("[extract]\nmax_cores = 2\n").unwrap();
    let pipeline = Pipeline::new(config).unwrap();
    let text = StatsDump::uniform(4, 3, 0.001).render();
    let ingested = pipeline.ingest_str("limited", &text).ingested;

    assert_eq!(
        ingested.run.keys_of(Family::Ipc, EntityScope::Cores),
        vec![key(Family::Ipc, 0), key(Family::Ipc, 1)]
    );
    assert_eq!(ingested.stats.filtered, 2 * 3 * 3);
    assert!(ingested.warnings.is_empty());
}

#[test]
fn test_bare_cluster_core_attribution() {
    let text = "simSeconds 0.001\nsystem.cpu_cluster.cpus.power_model.dynamicPower 0.75\n";

    let default = pipeline().ingest_str("bare", text).ingested;
    assert_eq!(default.stats.unrecognized, 1);

    let config = Config::from_toml_str("[extract]\nbare_cluster_core = 0\n").unwrap();
    let ingested = Pipeline::new(config).unwrap().ingest_str("bare", text).ingested;
    assert_eq!(
        ingested.run.get(&key(Family::DynamicPower, 0)),
        Some(&[0.75][..])
    );
}

// ============================================================================
// Alignment
// ============================================================================

#[test]
fn test_reconcile_truncates_to_shortest() {
    let text = StatsDump::new()
        .epoch(Epoch {
            sim_seconds: Some(0.001),
            ipc: vec![(0, 0.5), (1, 0.4)],
            ..Epoch::default()
        })
        .epoch(Epoch {
            sim_seconds: Some(0.002),
            ipc: vec![(0, 0.7), (1, 0.4)],
            ..Epoch::default()
        })
        .epoch(Epoch {
            sim_seconds: Some(0.003),
            ipc: vec![(0, 0.9)],
            ..Epoch::default()
        })
        .render();
    let run = pipeline().ingest_str("ragged", &text).ingested.run;
    let request = SeriesRequest::new([key(Family::Ipc, 0), key(Family::Ipc, 1)]);
    let reconciled = reconcile(&run, &request).unwrap();

    assert_eq!(reconciled.reconciled_len(), Some(2));
    assert_eq!(reconciled.get(&key(Family::Ipc, 0)), Some(&[0.5, 0.7][..]));
    assert_eq!(reconciled.get(&key(Family::Ipc, 1)), Some(&[0.4, 0.4][..]));
    assert_eq!(reconcile(&reconciled, &request).unwrap(), reconciled);
}

#[test]
fn test_reconcile_missing_key_is_empty_intersection() {
    let run = pipeline()
        .ingest_str("a", &StatsDump::uniform(2, 3, 0.001).render())
        .ingested
        .run;
    let request = SeriesRequest::new([key(Family::Ipc, 7)]);
    match reconcile(&run, &request) {
        Err(SeriesError::EmptyIntersection { missing }) => {
            assert_eq!(missing, vec![key(Family::Ipc, 7)]);
        }
        other => panic!("expected EmptyIntersection, got {:?}", other),
    }
}

#[test]
fn test_synchronize_three_cores_against_two() {
    let pipeline = pipeline();
    let a = pipeline
        .ingest_str("a", &StatsDump::uniform(3, 100, 0.001).render())
        .ingested
        .run;
    let b = pipeline
        .ingest_str("b", &StatsDump::uniform(2, 80, 0.001).render())
        .ingested
        .run;
    let request =
        SeriesRequest::for_families(&[&a, &b], &[Family::DynamicPower], EntityScope::Cores);
    let sync = synchronize(&a, &b, &request).unwrap();

    assert_eq!(sync.steps, 80);
    assert_eq!(
        sync.keys,
        vec![key(Family::DynamicPower, 0), key(Family::DynamicPower, 1)]
    );
    assert_eq!(sync.a.get(&key(Family::DynamicPower, 0)).unwrap().len(), 80);
    assert_eq!(sync.b.get(&key(Family::DynamicPower, 1)).unwrap().len(), 80);
    assert_eq!(sync.warnings.len(), 1);
    assert!(matches!(
        &sync.warnings[0],
        Warning::SkippedEntity { key: k, .. } if *k == key(Family::DynamicPower, 2)
    ));
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_total_average_power() {
    let text = StatsDump::new()
        .epoch(Epoch {
            sim_seconds: Some(0.001),
            dynamic_power: vec![(0, 1.0), (1, 0.5)],
            ..Epoch::default()
        })
        .epoch(Epoch {
            sim_seconds: Some(0.002),
            dynamic_power: vec![(0, 2.0), (1, 0.5)],
            ..Epoch::default()
        })
        .render();
    let pipeline = pipeline();
    let source = pipeline.ingest_str("power", &text);
    let selection = Selection {
        families: vec![Family::DynamicPower],
        ..Selection::default()
    };
    let report = pipeline.analyze(&source, &selection).unwrap();

    assert_eq!(report.totals.len(), 1);
    assert_eq!(report.totals[0].cores, 2);
    assert_eq!(report.totals[0].sum_per_step, vec![1.5, 2.5]);
    assert_eq!(report.totals[0].mean_of_sum, 2.0);
    assert_eq!(report.series[0].mean, 1.5);
}

#[test]
fn test_compare_dvfs_runs() {
    let pipeline = pipeline();
    let baseline = pipeline.ingest_str("baseline", &StatsDump::uniform(2, 20, 0.001).render());

    let mut dvfs = StatsDump::new();
    for i in 0..25 {
        dvfs = dvfs.epoch(Epoch {
            sim_seconds: Some(0.001 * (i + 1) as f64),
            dynamic_power: vec![(0, 0.5 + 0.001 * i as f64), (1, 0.6 + 0.002 * i as f64)],
            ..Epoch::default()
        });
    }
    let dvfs = pipeline.ingest_str("dvfs", &dvfs.render());

    let selection = Selection {
        families: vec![Family::DynamicPower],
        ..Selection::default()
    };
    let report = pipeline.compare(&baseline, &dvfs, &selection).unwrap();
    let cmp = &report.comparison;

    assert_eq!(cmp.steps, 20);
    assert_eq!(cmp.keys.len(), 2);
    assert!(cmp.keys.iter().all(|k| k.delta < 0.0));
    assert!(cmp.totals[0].total_b < cmp.totals[0].total_a);
    assert!(cmp.warnings.is_empty());
}

#[test]
fn test_compare_disjoint_runs_has_no_comparable_data() {
    let pipeline = pipeline();
    let a = pipeline.ingest_str(
        "a",
        &StatsDump::new()
            .epoch(Epoch {
                sim_seconds: Some(0.001),
                ipc: vec![(0, 1.0)],
                ..Epoch::default()
            })
            .render(),
    );
    let b = pipeline.ingest_str(
        "b",
        &StatsDump::new()
            .epoch(Epoch {
                sim_seconds: Some(0.001),
                ipc: vec![(5, 1.0)],
                ..Epoch::default()
            })
            .render(),
    );
    let selection = Selection {
        families: vec![Family::Ipc],
        ..Selection::default()
    };
    let err = pipeline.compare(&a, &b, &selection).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SeriesError>(),
        Some(SeriesError::NoComparableData(_))
    ));
}
