// Letter classifier command line.
//
// train      train on <corpus>/<L>/<L>_NNN.pbm and save the model
// predict    classify one 50x50 PBM/PGM image and print the top letters
// recognize  read a segmented grid and word list, write grid.txt and word.txt

use clap::{Parser, Subcommand};
use letter_cnn::architecture::load_architecture;
use letter_cnn::config::{load_config, ModelFormat, TrainingConfig};
use letter_cnn::image::Image;
use letter_cnn::recognition::recognize_layout;
use letter_cnn::utils::SimpleRng;
use letter_cnn::{LetterClassifier, Network};
use log::info;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(version, about = "Convolutional letter classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new model
    Train {
        /// Folder holding one sub-folder per letter
        #[arg(default_value = "letters_50x50_fonts")]
        corpus: PathBuf,
        /// JSON training configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// JSON architecture configuration
        #[arg(long)]
        architecture: Option<PathBuf>,
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        learning_rate: Option<f32>,
        /// Output model path
        #[arg(long)]
        model: Option<PathBuf>,
        /// Write the binary model format
        #[arg(long)]
        binary: bool,
    },
    /// Classify a single image
    Predict {
        image: PathBuf,
        #[arg(long, default_value = "model.txt")]
        model: PathBuf,
        /// JSON architecture the model was trained with
        #[arg(long)]
        architecture: Option<PathBuf>,
        /// Number of letters to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Recognize a segmented grid and word list
    Recognize {
        /// Folder containing 2_cells/ and 3_words/
        base: PathBuf,
        #[arg(long, default_value = "output")]
        out: PathBuf,
        #[arg(long, default_value = "model.txt")]
        model: PathBuf,
        /// JSON architecture the model was trained with
        #[arg(long)]
        architecture: Option<PathBuf>,
    },
}

/// Letter network from `architecture`, or the default one.
fn build_classifier(
    cfg: TrainingConfig,
    architecture: Option<&Path>,
) -> letter_cnn::Result<LetterClassifier> {
    match architecture {
        Some(path) => {
            let arch = load_architecture(path)?;
            let mut rng = SimpleRng::new(cfg.seed);
            let network = Network::new(&arch, &mut rng)?;
            LetterClassifier::with_network(network, cfg)
        }
        None => Ok(LetterClassifier::new(cfg)),
    }
}

fn load_classifier(
    model: &Path,
    architecture: Option<&Path>,
) -> letter_cnn::Result<LetterClassifier> {
    let mut classifier = build_classifier(TrainingConfig::default(), architecture)?;
    classifier.try_load_model(model)?;
    Ok(classifier)
}

fn run(cli: Cli) -> letter_cnn::Result<()> {
    match cli.command {
        Commands::Train {
            corpus,
            config,
            architecture,
            epochs,
            learning_rate,
            model,
            binary,
        } => {
            let mut cfg = match config {
                Some(path) => load_config(path)?,
                None => TrainingConfig::default(),
            };
            if let Some(epochs) = epochs {
                cfg.epochs = epochs;
            }
            if let Some(lr) = learning_rate {
                cfg.learning_rate = lr;
            }
            if let Some(model) = model {
                cfg.model_path = model;
            }
            if binary {
                cfg.model_format = ModelFormat::Binary;
            }
            cfg.validate()?;

            let mut classifier = build_classifier(cfg.clone(), architecture.as_deref())?;

            info!(
                "Network has {} parameters",
                classifier.network().parameter_count()
            );
            let report = classifier.train(&corpus)?;
            if let Some(last) = report.last() {
                println!(
                    "Final epoch: loss = {:.4}, accuracy = {:.2}%",
                    last.average_loss,
                    last.accuracy * 100.0
                );
            }
            classifier.save_model(&cfg.model_path)?;
            println!("Model saved to {}", cfg.model_path.display());
        }
        Commands::Predict {
            image,
            model,
            architecture,
            top,
        } => {
            let classifier = load_classifier(&model, architecture.as_deref())?;
            let shape = classifier.network().input_shape();
            let img = Image::load_with_size(&image, shape.rows, shape.cols)?;
            let letter = classifier.recognize(&img)?;

            println!("Image: {}", image.display());
            println!("Predicted letter: {}", letter);
            println!("Probabilities (top {}):", top);
            for (letter, p) in classifier.top_k(&img, top)? {
                println!("  {}: {:.2}%", letter, p * 100.0);
            }
        }
        Commands::Recognize {
            base,
            out,
            model,
            architecture,
        } => {
            let classifier = load_classifier(&model, architecture.as_deref())?;
            let summary = recognize_layout(&classifier, &base, &out)?;
            println!(
                "Wrote {} grid rows and {} words to {} ({} unreadable)",
                summary.grid_rows,
                summary.words,
                out.display(),
                summary.unreadable
            );
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
