//! Per-sample SGD training.
//!
//! Each epoch shuffles the corpus, then for every sample: load → forward →
//! loss and correctness → zero gradients → backward → SGD update. Samples that
//! cannot be read are skipped and counted; loss and accuracy are averaged over
//! the samples that were actually processed.

use crate::config::TrainingConfig;
use crate::dataset::Corpus;
use crate::error::{OcrError, Result};
use crate::image::Image;
use crate::network::Network;
use crate::optimizers::{Optimizer, SGD};
use crate::tensor::Tensor;
use crate::utils::SimpleRng;
use log::{debug, info, warn};
use std::time::Instant;

/// Result of a single training step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Loss before the update
    pub loss: f32,
    /// Prediction before the update
    pub predicted: usize,
    pub correct: bool,
}

/// Totals for one pass over the corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    /// 1-based epoch number
    pub epoch: usize,
    pub attempted: usize,
    pub processed: usize,
    pub skipped: usize,
    /// Mean loss over processed samples (0 when nothing was processed)
    pub average_loss: f32,
    /// Fraction of processed samples predicted correctly, in `[0, 1]`
    pub accuracy: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub epochs: Vec<EpochStats>,
}

impl TrainingReport {
    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }
}

/// Forward, backward and update on one sample.
pub fn train_step(
    network: &mut Network,
    input: &Tensor,
    label: usize,
    optimizer: &mut dyn Optimizer,
) -> StepOutcome {
    let cache = network.forward(input);
    let loss = cache.loss(label);
    let predicted = cache.predicted();

    let mut grads = network.zero_gradients();
    network.accumulate_gradients(&cache, label, &mut grads);
    network.apply_gradients(&grads, optimizer);

    StepOutcome {
        loss,
        predicted,
        correct: predicted == label,
    }
}

fn load_sample(path: &std::path::Path, network: &Network) -> Result<Tensor> {
    if !path.exists() {
        return Err(OcrError::SampleMissing {
            path: path.to_path_buf(),
        });
    }
    let shape = network.input_shape();
    Ok(Image::load_with_size(path, shape.rows, shape.cols)?.to_tensor())
}

/// Train `network` on `corpus` for `config.epochs` epochs.
///
/// `rng` drives the per-epoch shuffle. Unreadable samples never abort an epoch.
pub fn train(
    network: &mut Network,
    corpus: &Corpus,
    config: &TrainingConfig,
    rng: &mut SimpleRng,
) -> Result<TrainingReport> {
    config.validate()?;
    let classes = network.num_classes();
    if let Some(sample) = corpus.samples().iter().find(|s| s.label >= classes) {
        return Err(OcrError::Config(format!(
            "sample {} has label {} but the network has {} classes",
            sample.path.display(),
            sample.label,
            classes
        )));
    }
    let mut optimizer = SGD::new(config.learning_rate);
    let mut order: Vec<usize> = (0..corpus.len()).collect();
    let mut report = TrainingReport::default();

    info!(
        "Training on {} samples for {} epochs (learning rate {})",
        corpus.len(),
        config.epochs,
        optimizer.learning_rate()
    );

    for epoch in 1..=config.epochs {
        let start = Instant::now();
        rng.shuffle_usize(&mut order);

        let mut total_loss = 0.0f64;
        let mut correct = 0usize;
        let mut processed = 0usize;
        let mut skipped = 0usize;

        for &idx in &order {
            let sample = &corpus.samples()[idx];
            let input = match load_sample(&sample.path, network) {
                Ok(input) => input,
                Err(err) => {
                    warn!("Skipping sample: {}", err);
                    skipped += 1;
                    continue;
                }
            };

            let outcome = train_step(network, &input, sample.label, &mut optimizer);
            total_loss += outcome.loss as f64;
            if outcome.correct {
                correct += 1;
            }
            processed += 1;

            if processed % config.progress_every == 0 {
                debug!(
                    "Epoch {}/{}: {}/{} samples processed",
                    epoch,
                    config.epochs,
                    processed,
                    corpus.len()
                );
            }
        }

        let stats = EpochStats {
            epoch,
            attempted: order.len(),
            processed,
            skipped,
            average_loss: if processed > 0 {
                (total_loss / processed as f64) as f32
            } else {
                0.0
            },
            accuracy: if processed > 0 {
                correct as f32 / processed as f32
            } else {
                0.0
            },
        };
        info!(
            "Epoch {}/{}: loss = {:.4}, accuracy = {:.2}% ({} processed, {} skipped) in {:.2}s",
            epoch,
            config.epochs,
            stats.average_loss,
            stats.accuracy * 100.0,
            processed,
            skipped,
            start.elapsed().as_secs_f32()
        );
        report.epochs.push(stats);
    }

    Ok(report)
}
