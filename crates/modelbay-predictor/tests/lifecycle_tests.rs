//! Predictor lifecycle integration tests
//!
//! Exercises the full load/predict/close progression against a scripted
//! engine and an in-memory transport.

mod common;

use common::*;
use modelbay_core::error::Error;
use modelbay_core::manifest::ModelManifest;
use modelbay_predictor::{ImagePredictor, LifecycleState, PredictorConfig};
use modelbay_telemetry::{RecordingSink, TracePhase};
use std::sync::atomic::Ordering;

fn predictor(work_dir: &std::path::Path) -> ImagePredictor {
    let manifest = ModelManifest::from_yaml(&scenario_manifest_yaml()).unwrap();
    ImagePredictor::new(manifest, PredictorConfig::default().with_work_dir(work_dir)).unwrap()
}

#[test]
fn construction_never_touches_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().join("model");

    let manifest = ModelManifest::from_yaml(&scenario_manifest_yaml()).unwrap();
    let bad = ModelManifest::from_yaml(
        r#"
name: texty
framework: { name: CNTK, version: "2.3" }
inputs:
  - type: text
"#,
    )
    .unwrap();

    assert!(matches!(
        ImagePredictor::new(bad, PredictorConfig::default().with_work_dir(&work_dir)),
        Err(Error::UnsupportedInput(_))
    ));
    let _ok = ImagePredictor::new(manifest, PredictorConfig::default().with_work_dir(&work_dir))
        .unwrap();

    assert!(!work_dir.exists());
}

#[tokio::test]
async fn load_predict_close_happy_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let engine = MockEngine::new(EngineScript::default());
    let transport = scenario_transport();
    let sink = RecordingSink::new();

    assert_eq!(p.state(), LifecycleState::Unloaded);
    p.load(&engine, &transport, &sink).await.unwrap();
    assert_eq!(p.state(), LifecycleState::Idle);
    assert_eq!(p.labels(), ["cat", "dog", "bird"]);

    let batch = vec![sample(0.0), sample(1.0)];
    let decoded = p.predict(&batch, &sink).await.unwrap();

    assert_eq!(decoded.len(), 2);
    for (i, features) in decoded.iter().enumerate() {
        assert_eq!(features.len(), 3);
        for (j, (feature, label)) in features.iter().zip(["cat", "dog", "bird"]).enumerate() {
            assert_eq!(feature.index, j as i64);
            assert_eq!(feature.name, label);
            assert_eq!(feature.probability, (i * 100 + j) as f32);
        }
    }

    p.close().unwrap();
    assert_eq!(p.state(), LifecycleState::Closed);
    assert_eq!(engine.calls.close.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn close_is_idempotent_and_releases_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let engine = MockEngine::new(EngineScript::default());
    let sink = RecordingSink::new();

    p.load(&engine, &scenario_transport(), &sink).await.unwrap();
    p.close().unwrap();
    p.close().unwrap();
    p.close().unwrap();

    assert_eq!(engine.calls.close.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn predict_before_load_never_reaches_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let sink = RecordingSink::new();

    let err = p.predict(&[sample(0.0)], &sink).await.unwrap_err();
    assert!(matches!(err, Error::NotLoaded));
    // No engine was ever constructed, and nothing was traced.
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn predict_after_close_is_a_contract_violation() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let engine = MockEngine::new(EngineScript::default());
    let sink = RecordingSink::new();

    p.load(&engine, &scenario_transport(), &sink).await.unwrap();
    p.close().unwrap();

    let err = p.predict(&[sample(0.0)], &sink).await.unwrap_err();
    assert!(matches!(err, Error::Closed));
    assert_eq!(engine.calls.predict.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_load_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let engine = MockEngine::new(EngineScript::default());
    let sink = RecordingSink::new();

    p.load(&engine, &scenario_transport(), &sink).await.unwrap();
    let err = p
        .load(&engine, &scenario_transport(), &sink)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyLoaded));
    assert_eq!(engine.calls.open.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_engine_open_leaves_predictor_unloaded() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let engine = MockEngine::new(EngineScript {
        fail_open: true,
        ..EngineScript::default()
    });
    let sink = RecordingSink::new();

    let err = p.load(&engine, &scenario_transport(), &sink).await.unwrap_err();
    assert!(matches!(err, Error::EngineOpen(_)));
    assert_eq!(p.state(), LifecycleState::Unloaded);
    assert_eq!(engine.calls.close.load(Ordering::SeqCst), 0);

    // Artifacts stay on disk for a retry.
    assert!(dir.path().join("g.bin").exists());
    assert!(dir.path().join("f.txt").exists());
}

#[tokio::test]
async fn failed_predict_leaves_predictor_idle_and_reusable() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let engine = MockEngine::new(EngineScript {
        fail_predicts: 1,
        ..EngineScript::default()
    });
    let sink = RecordingSink::new();

    p.load(&engine, &scenario_transport(), &sink).await.unwrap();

    let err = p.predict(&[sample(0.0)], &sink).await.unwrap_err();
    assert!(matches!(err, Error::Prediction(_)));
    assert_eq!(p.state(), LifecycleState::Idle);

    // The retry succeeds without reloading.
    let decoded = p.predict(&[sample(0.0)], &sink).await.unwrap();
    assert_eq!(decoded.len(), 1);
}

#[tokio::test]
async fn load_and_predict_emit_bracketing_trace_events() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let engine = MockEngine::new(EngineScript::default());
    let sink = RecordingSink::new();

    p.load(&engine, &scenario_transport(), &sink).await.unwrap();
    p.predict(&[sample(0.0)], &sink).await.unwrap();

    let names: Vec<(String, TracePhase)> = sink
        .events()
        .into_iter()
        .map(|e| (e.name, e.phase))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Download".to_string(), TracePhase::Start),
            ("Download".to_string(), TracePhase::End),
            ("LoadPredictor".to_string(), TracePhase::Start),
            ("LoadPredictor".to_string(), TracePhase::End),
            ("Predict".to_string(), TracePhase::Start),
            ("Predict".to_string(), TracePhase::End),
        ]
    );
}

#[tokio::test]
async fn metrics_count_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = predictor(dir.path());
    let engine = MockEngine::new(EngineScript::default());
    let sink = RecordingSink::new();

    p.load(&engine, &scenario_transport(), &sink).await.unwrap();
    p.predict(&[sample(0.0)], &sink).await.unwrap();
    p.predict(&[sample(0.0), sample(1.0)], &sink).await.unwrap();

    let snapshot = p.metrics().snapshot();
    assert_eq!(snapshot.predictions, 2);
    assert_eq!(snapshot.downloads, 2);
}
