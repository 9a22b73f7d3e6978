//! Recognition pipeline scenarios: tier ordering, fallback behavior and
//! demo mode determinism.

use std::sync::Arc;

use iris_core::config::IrisConfig;
use iris_core::heuristic::{DemoConfig, DemoHeuristic};
use iris_core::knowledge::KnowledgeBase;
use iris_core::orchestrator::{
    RecognitionEngine, RecognitionOutcome, RecognitionState, NOT_RECOGNIZED,
};
use iris_core::provider::{
    LabelAnnotation, ObjectAnnotation, OfflineProvider, ProviderResponse, StaticProvider,
    VisionProvider,
};

fn quiet_config() -> IrisConfig {
    let mut config = IrisConfig::default();
    config.demo.delay_ms = 0;
    config
}

fn engine<P: VisionProvider>(provider: P) -> RecognitionEngine<P> {
    RecognitionEngine::new(provider, Arc::new(KnowledgeBase::builtin()), &quiet_config())
}

#[tokio::test]
async fn confident_match_short_circuits_the_tiers() {
    let provider = StaticProvider::with_labels(&[("power drill", 0.95), ("tool", 0.9)]);
    let report = engine(provider).identify(b"image").await;

    assert_eq!(report.state, RecognitionState::Succeeded);
    match report.outcome {
        RecognitionOutcome::Matched(result) => {
            assert_eq!(result.entry.name, "Power Drill");
            assert!(result.confidence > 70);
            assert_eq!(result.detected_as, "power drill");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn object_annotations_feed_matching_too() {
    let provider = StaticProvider::returning(ProviderResponse {
        labels: vec![LabelAnnotation {
            description: "gadget".to_string(),
            score: 0.8,
        }],
        objects: vec![ObjectAnnotation {
            name: "power drill".to_string(),
            score: 0.9,
        }],
    });
    let report = engine(provider).identify(b"image").await;

    assert_eq!(report.state, RecognitionState::Succeeded);
    match report.outcome {
        RecognitionOutcome::Matched(result) => assert_eq!(result.entry.name, "Power Drill"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn strong_unknown_detection_is_synthesized() {
    let provider = StaticProvider::with_labels(&[("xyz-unknown-123", 0.6)]);
    let report = engine(provider).identify(b"image").await;

    assert_eq!(report.state, RecognitionState::FellBackToSynthesis);
    match report.outcome {
        RecognitionOutcome::Synthesized(entry) => {
            assert_eq!(entry.entry.category, "General Items");
            assert_eq!(entry.confidence, 60);
            assert_eq!(entry.detected_as, "xyz-unknown-123");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn weak_detections_drop_to_demo() {
    // Strong enough to survive the relevance floor, too weak for matching
    // or synthesis; the payload size then picks the first appliance.
    let provider = StaticProvider::with_labels(&[("xyz-unknown-123", 0.45)]);
    let payload = vec![0u8; 60_000];
    let report = engine(provider).identify(&payload).await;

    assert_eq!(report.state, RecognitionState::FellBackToDemo);
    match report.outcome {
        RecognitionOutcome::DemoGuess {
            entry, confidence, ..
        } => {
            assert_eq!(entry.name, "Blender");
            assert_eq!(confidence, 65);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn provider_failure_never_propagates() {
    let payload = vec![0u8; 40_000];
    let report = engine(OfflineProvider).identify(&payload).await;

    assert_eq!(report.state, RecognitionState::FellBackToDemo);
    match report.outcome {
        RecognitionOutcome::DemoGuess {
            entry, confidence, ..
        } => {
            assert_eq!(entry.name, "Claw Hammer");
            assert_eq!(confidence, 60);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn small_payload_demo_covers_both_branches() {
    // The random branch is seed-dependent; scanning a seed range must show
    // both a random guess (confidence within the demo band) and a decline.
    let kb = Arc::new(KnowledgeBase::builtin());
    let config = quiet_config();
    let demo = DemoConfig {
        delay_ms: 0,
        ..DemoConfig::default()
    };

    let mut guessed = 0;
    let mut declined = 0;
    for seed in 0..64 {
        let engine = RecognitionEngine::new(OfflineProvider, kb.clone(), &config)
            .with_heuristic(DemoHeuristic::seeded(demo.clone(), seed));
        let report = engine.identify(b"tiny").await;
        match report.outcome {
            RecognitionOutcome::DemoGuess { confidence, .. } => {
                assert_eq!(report.state, RecognitionState::FellBackToDemo);
                assert!((40..=70).contains(&confidence));
                guessed += 1;
            }
            RecognitionOutcome::Failed { message } => {
                assert_eq!(report.state, RecognitionState::Failed);
                assert_eq!(message, NOT_RECOGNIZED);
                declined += 1;
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert!(guessed > 0, "no seed hit the random branch");
    assert!(declined > 0, "no seed declined");
}

#[tokio::test]
async fn demo_tier_waits_out_the_configured_delay() {
    let mut config = quiet_config();
    config.demo.delay_ms = 80;
    let engine = RecognitionEngine::new(
        OfflineProvider,
        Arc::new(KnowledgeBase::from_entries(vec![])),
        &config,
    );
    let report = engine.identify(b"image").await;

    assert_eq!(report.state, RecognitionState::Failed);
    assert!(
        report.elapsed_ms >= 80,
        "elapsed {}ms, expected at least the 80ms demo delay",
        report.elapsed_ms
    );
}

#[tokio::test]
async fn concurrent_requests_share_one_engine() {
    let engine = Arc::new(engine(StaticProvider::with_labels(&[("power drill", 0.95)])));
    let a = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.identify(b"one").await })
    };
    let b = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.identify(b"two").await })
    };
    let (a, b) = (a.await.expect("join"), b.await.expect("join"));
    assert_eq!(a.state, RecognitionState::Succeeded);
    assert_eq!(b.state, RecognitionState::Succeeded);
}
