//! End-to-end contrastive training behavior: pair construction, loss, and
//! iterated gradient descent on the query embedding.

use trajectory_enhance::config::TrainingConfig;
use trajectory_enhance::training::{ContrastiveTrainer, TrajectorySample};

fn trainer() -> ContrastiveTrainer {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    ContrastiveTrainer::new(TrainingConfig::default()).unwrap()
}

fn sample(embedding: Vec<f32>, quality: f32) -> TrajectorySample {
    TrajectorySample::new(embedding, quality)
}

#[test]
fn pairs_to_loss_end_to_end() {
    let trainer = trainer();
    let samples = vec![
        sample(vec![1.0, 0.0, 0.0, 0.0], 0.95),
        sample(vec![0.9, 0.1, 0.0, 0.0], 0.85),
        sample(vec![0.0, 0.0, 1.0, 0.0], 0.6), // dead band
        sample(vec![0.0, 1.0, 0.0, 0.0], 0.3),
        sample(vec![0.0, 0.0, 0.0, 1.0], 0.1),
    ];
    let query = vec![0.8, 0.1, 0.1, 0.0];

    let pairs = trainer.create_pairs(&samples, &query);
    assert_eq!(pairs.len(), 4); // 2 positives x 2 negatives

    let loss = trainer.compute(&pairs);
    assert!(loss >= 0.0);
    assert!(loss.is_finite());
}

#[test]
fn well_separated_batch_has_zero_loss() {
    // Positives sit on the query; negatives are far beyond the margin.
    let trainer = trainer();
    let samples = vec![
        sample(vec![0.0, 0.0], 0.9),
        sample(vec![10.0, 0.0], 0.1),
        sample(vec![0.0, 10.0], 0.2),
    ];
    let pairs = trainer.create_pairs(&samples, &[0.0, 0.0]);
    assert_eq!(pairs.len(), 2);
    assert_eq!(trainer.compute(&pairs), 0.0);

    let batch = trainer.backward(&pairs);
    assert_eq!(batch.active_count, 0);
    assert!(batch.query_gradient.iter().all(|&g| g == 0.0));
}

#[test]
fn iterated_descent_drives_loss_down() {
    // The query starts near the negative; repeated gradient steps on the
    // query embedding must monotonically shrink a positive loss toward the
    // margin-satisfied regime.
    let trainer = trainer();
    let positive = vec![1.0, 0.0];
    let negative = vec![0.0, 0.1];
    let mut query = vec![0.05, 0.05];

    let samples = vec![sample(positive, 0.9), sample(negative, 0.1)];
    let initial = trainer.compute(&trainer.create_pairs(&samples, &query));
    assert!(initial > 0.0);

    let mut last = initial;
    for _ in 0..50 {
        let pairs = trainer.create_pairs(&samples, &query);
        let batch = trainer.backward(&pairs);
        if batch.active_count == 0 {
            break;
        }
        for (q, g) in query.iter_mut().zip(&batch.query_gradient) {
            *q -= 0.05 * g;
        }
        last = trainer.compute(&trainer.create_pairs(&samples, &query));
    }
    assert!(
        last < initial,
        "loss should fall from {initial} but ended at {last}"
    );
}

#[test]
fn diagnostics_cover_every_triplet() {
    let trainer = trainer();
    let samples = vec![
        sample(vec![0.0, 0.0], 0.9),  // on the query: inactive triplet
        sample(vec![5.0, 0.0], 0.95), // far positive: active triplet
        sample(vec![1.0, 0.0], 0.1),
    ];
    let pairs = trainer.create_pairs(&samples, &[0.0, 0.0]);
    let batch = trainer.backward(&pairs);

    assert_eq!(batch.triplets.len(), pairs.len());
    assert_eq!(
        batch.triplets.iter().filter(|t| t.active).count(),
        batch.active_count
    );
    for diag in &batch.triplets {
        assert!(diag.loss >= 0.0);
        assert!(diag.positive_distance >= 0.0);
        assert!(diag.negative_distance >= 0.0);
    }
}

#[test]
fn semi_hard_selection_composes_with_pair_creation() {
    let trainer = trainer(); // margin 0.5
    let samples = vec![
        sample(vec![1.0, 0.0], 0.9), // d(Q,P) = 1.0
        sample(vec![0.5, 0.0], 0.1), // d = 0.5: harder than the positive
        sample(vec![1.3, 0.0], 0.2), // d = 1.3: semi-hard band (1.0, 1.5)
        sample(vec![4.0, 0.0], 0.3), // d = 4.0: easy
    ];
    let pairs = trainer.create_pairs(&samples, &[0.0, 0.0]);
    assert_eq!(pairs.len(), 3);

    let kept = trainer.semi_hard_pairs(pairs);
    assert_eq!(kept.len(), 1);
    assert!((kept[0].negative[0] - 1.3).abs() < 1e-6);
}

#[test]
fn mining_order_matches_distance_ranking() {
    let trainer = trainer();
    let samples = vec![
        sample(vec![3.0, 0.0], 0.1),
        sample(vec![1.0, 0.0], 0.2),
        sample(vec![2.0, 0.0], 0.8),
        sample(vec![5.0, 0.0], 0.9),
    ];
    let query = [0.0, 0.0];

    let negatives = trainer.hard_negatives(&samples, &query);
    let negative_xs: Vec<f32> = negatives.iter().map(|s| s.embedding[0]).collect();
    assert_eq!(negative_xs, vec![1.0, 3.0]);

    let positives = trainer.hard_positives(&samples, &query);
    let positive_xs: Vec<f32> = positives.iter().map(|s| s.embedding[0]).collect();
    assert_eq!(positive_xs, vec![5.0, 2.0]);
}

#[test]
fn invalid_configuration_is_rejected() {
    let bad = TrainingConfig {
        positive_threshold: 0.4,
        negative_threshold: 0.6, // inverted
        ..TrainingConfig::default()
    };
    assert!(ContrastiveTrainer::new(bad).is_err());

    let bad_margin = TrainingConfig {
        margin: 0.0,
        ..TrainingConfig::default()
    };
    assert!(ContrastiveTrainer::new(bad_margin).is_err());
}
