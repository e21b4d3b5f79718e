use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use toxic_classifier::{
    process_csv, shared_pipeline_with, ClassificationPipeline, ClassifierError, ModelLoader,
    PredictionResult, ResultFilter, RuntimeConfig,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding tfidf_vectorizer.json and xgboost_toxic_classifier.onnx
    #[arg(short, long, global = true)]
    models_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0, global = true)]
    intra_threads: usize,

    /// ONNX Runtime inter-op threads (0 lets the runtime decide)
    #[arg(long, default_value_t = 0, global = true)]
    inter_threads: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a single message
    Predict {
        text: String,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify every row of a CSV file
    Batch {
        /// CSV with a Content/content/text/Text/cleaned_content column
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the results (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep all rows, only toxic rows, or only normal rows
        #[arg(short, long, default_value = "all")]
        filter: ResultFilter,
    },
}

fn load_pipeline(args: &Args) -> Result<&'static ClassificationPipeline> {
    let loader = match &args.models_dir {
        Some(dir) => ModelLoader::new(dir),
        None => ModelLoader::from_env(),
    }
    .with_runtime_config(RuntimeConfig {
        inter_threads: args.inter_threads,
        intra_threads: args.intra_threads,
        ..RuntimeConfig::default()
    });

    if !loader.is_model_available() {
        bail!(
            "Model files not found; expected {:?} and {:?}",
            loader.get_vectorizer_path(),
            loader.get_classifier_path()
        );
    }

    let start_time = Instant::now();
    info!("Loading models from {:?}...", loader.models_dir());
    let pipeline = shared_pipeline_with(&loader).with_context(|| {
        format!(
            "Could not load models; make sure the model files are in {:?}",
            loader.models_dir()
        )
    })?;
    info!("=== Models loaded (took {:.2?}) ===", start_time.elapsed());
    Ok(pipeline)
}

fn print_result(result: &PredictionResult) {
    println!("\nResults:");
    if result.is_toxic {
        println!("  Verdict: TOXIC");
    } else {
        println!("  Verdict: NORMAL");
    }
    println!(
        "  Confidence: {:.1}% ({} / {})",
        result.confidence * 100.0,
        result.confidence_level,
        result.confidence_level.english_label()
    );
    println!("  Toxic probability: {:.1}%", result.toxic_probability * 100.0);
    println!("  Normal probability: {:.1}%", result.normal_probability * 100.0);
    println!("  Original text: {}", result.original_text);
    println!("  Cleaned text: {}", result.cleaned_text);
}

fn run_predict(pipeline: &ClassificationPipeline, text: &str, json: bool) -> Result<()> {
    match pipeline.predict(text) {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            Ok(())
        }
        Err(ClassifierError::ValidationError(reason)) => {
            eprintln!("\nCannot classify this text: {}", reason.tag());
            eprintln!("Consider:");
            eprintln!("  - Checking that the message is not empty");
            eprintln!("  - Including some words, not only links, mentions or symbols");
            Err(ClassifierError::ValidationError(reason).into())
        }
        Err(e) => Err(e.into()),
    }
}

fn run_batch(
    pipeline: &ClassificationPipeline,
    input: &Path,
    output: Option<&Path>,
    filter: ResultFilter,
) -> Result<()> {
    let start_time = Instant::now();
    let file = File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let outcome = process_csv(pipeline, BufReader::new(file))
        .with_context(|| format!("Failed to process {:?}", input))?;

    let written = match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            outcome.write_csv(BufWriter::new(file), filter)?
        }
        None => outcome.write_csv(io::stdout().lock(), filter)?,
    };

    let summary = &outcome.summary;
    info!("=== Batch Complete ===");
    info!("Text column: {}", outcome.text_column);
    info!("Total: {}", summary.total);
    info!("Toxic: {} ({:.1}%)", summary.toxic_count, summary.toxic_percentage());
    info!("Normal: {} ({:.1}%)", summary.normal_count, summary.normal_percentage());
    info!("Rejected: {}", summary.rejected_count);
    info!("Average confidence: {:.1}%", summary.average_confidence * 100.0);
    info!("Rows written: {}", written);
    info!("Elapsed: {:.2?}", start_time.elapsed());
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let pipeline = load_pipeline(&args)?;
    match &args.command {
        Command::Predict { text, json } => run_predict(pipeline, text, *json),
        Command::Batch {
            input,
            output,
            filter,
        } => run_batch(pipeline, input, output.as_deref(), *filter),
    }
}

fn main() -> ExitCode {
    toxic_classifier::init_logger();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
