//! CLI entry point for the cross-sell preprocessing tools.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use xsell_processing::utils::series_as_f64;
use xsell_processing::{
    ClassificationMetric, Configuration, EncodingScheme, LogisticModel, PredictionResponse,
    PredictionService, SchemaVersion, find_best_threshold, get_config, initial_check,
    preprocess_with_scheme,
};

/// Environment variable naming an alternative config file.
const CONFIG_ENV_VAR: &str = "XSELL_CONFIG";

/// CLI-compatible metric enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMetric {
    /// Harmonic mean of precision and recall
    F1,
    /// Share of predicted positives that are positive
    Precision,
    /// Share of positives that are predicted positive
    Recall,
    /// Share of correct predictions
    Accuracy,
}

impl From<CliMetric> for ClassificationMetric {
    fn from(cli: CliMetric) -> Self {
        match cli {
            CliMetric::F1 => ClassificationMetric::F1,
            CliMetric::Precision => ClassificationMetric::Precision,
            CliMetric::Recall => ClassificationMetric::Recall,
            CliMetric::Accuracy => ClassificationMetric::Accuracy,
        }
    }
}

/// CLI-compatible serving schema enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSchema {
    /// Gender, Age, Driving_License, Previously_Insured, Vehicle_Age, Vehicle_Damage
    Reduced,
    /// Reduced plus Region_Code, Annual_Premium, Policy_Sales_Channel, Vintage
    Full,
}

impl From<CliSchema> for SchemaVersion {
    fn from(cli: CliSchema) -> Self {
        match cli {
            CliSchema::Reduced => SchemaVersion::Reduced,
            CliSchema::Full => SchemaVersion::Full,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Insurance cross-sell preprocessing and prediction",
    long_about = "Feature preprocessing, threshold search and single-record prediction \
                  for vehicle-insurance cross-sell models.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  XSELL_CONFIG    Path to the YAML config (default: config/config.yaml)\n  \
                  RUST_LOG        Log filter, overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Inspect a raw dataset\n  \
                  xsell profile -i train.csv\n\n  \
                  # Build the training matrix and keep the fitted encoding\n  \
                  xsell preprocess -i train.csv -o features.csv --scheme-out scheme.json\n\n  \
                  # Pick the decision threshold from validation scores\n  \
                  xsell threshold -i scores.csv --label-col Response --prob-col proba\n\n  \
                  # Score one customer\n  \
                  xsell predict --scheme scheme.json --model model.json --record '{...}'"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs so stdout can be piped to other tools.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the per-column profile of a CSV file
    Profile {
        /// Path to the CSV file to inspect
        #[arg(short, long)]
        input: String,
    },

    /// Encode and narrow a raw CSV file into a feature matrix
    Preprocess {
        /// Path to the raw CSV file
        #[arg(short, long)]
        input: String,

        /// YAML config file (falls back to $XSELL_CONFIG, then config/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to write the feature matrix
        #[arg(short, long, default_value = "./outputs/features.csv")]
        output: PathBuf,

        /// Where to write the fitted encoding scheme (JSON)
        #[arg(long)]
        scheme_out: Option<PathBuf>,
    },

    /// Search the decision threshold that maximizes a metric
    Threshold {
        /// CSV file with true labels and predicted probabilities
        #[arg(short, long)]
        input: String,

        /// Column holding the 0/1 labels
        #[arg(long, default_value = "Response")]
        label_col: String,

        /// Column holding the positive-class probabilities
        #[arg(long, default_value = "probability")]
        prob_col: String,

        /// Metric to maximize
        #[arg(long, value_enum, default_value = "f1")]
        metric: CliMetric,
    },

    /// Predict whether one customer is interested
    Predict {
        /// Fitted encoding scheme written by `preprocess --scheme-out`
        #[arg(long)]
        scheme: PathBuf,

        /// Logistic model weights (JSON)
        #[arg(long)]
        model: PathBuf,

        /// Field set the model was trained on
        #[arg(long, value_enum, default_value = "reduced")]
        schema: CliSchema,

        /// The customer record as a JSON object
        #[arg(long)]
        record: String,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    match &args.command {
        Command::Profile { input } => run_profile(input, args.json),
        Command::Preprocess {
            input,
            config,
            output,
            scheme_out,
        } => run_preprocess(input, config.as_deref(), output, scheme_out.as_deref(), args.json),
        Command::Threshold {
            input,
            label_col,
            prob_col,
            metric,
        } => run_threshold(input, label_col, prob_col, (*metric).into(), args.json),
        Command::Predict {
            scheme,
            model,
            schema,
            record,
        } => run_predict(scheme, model, (*schema).into(), record),
    }
}

/// Print the column profile.
///
/// Uses `println!` for the table itself: it is the command's output, not a log.
fn run_profile(input: &str, json: bool) -> Result<()> {
    let data = load_csv(input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let table = initial_check(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("COLUMN PROFILE: {}", input);
    println!("  Rows: {}  Columns: {}", data.height(), data.width());
    println!("{}", "=".repeat(80));
    println!("{}", table.to_dataframe()?);
    Ok(())
}

fn run_preprocess(
    input: &str,
    config_path: Option<&Path>,
    output: &Path,
    scheme_out: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    debug!("Using configuration: {:?}", config);

    let data = load_csv(input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let (matrix, scheme) = preprocess_with_scheme(data, &config)?;

    let mut frame = matrix.to_frame_with_index()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output)
        .with_context(|| format!("Creating output file {}", output.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut frame)?;
    info!("Feature matrix saved: {}", output.display());

    if let Some(path) = scheme_out {
        scheme.save(path)?;
        info!("Encoding scheme saved: {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&scheme)?);
    } else {
        println!("\n{}", "=".repeat(80));
        println!("PREPROCESSING COMPLETE");
        println!("{}", "=".repeat(80));
        println!("  Rows: {}", matrix.height());
        println!("  Features: {}", scheme.feature_count());
        println!("  Binary columns: {}", scheme.binary().count());
        println!("  One-hot columns: {}", scheme.one_hot().count());
        if let Some(target) = &matrix.target_column {
            println!("  Target column: {} (last)", target);
        }
        println!("  Output: {}", output.display());
    }
    Ok(())
}

fn run_threshold(
    input: &str,
    label_col: &str,
    prob_col: &str,
    metric: ClassificationMetric,
    json: bool,
) -> Result<()> {
    let data = load_csv(input)?;

    let labels = label_vector(&data, label_col)?;
    let probabilities: Vec<f64> = series_as_f64(data.column(prob_col)?.as_materialized_series())?
        .into_iter()
        .enumerate()
        .map(|(row, p)| p.ok_or_else(|| anyhow!("Null probability in row {}", row)))
        .collect::<Result<_>>()?;

    let best = find_best_threshold(&labels, &probabilities, |t, p| metric.score(t, p))?;

    if json {
        let body = serde_json::json!({
            "metric": metric,
            "threshold": best.threshold,
            "score": best.score,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("Best threshold: {:.2} ({} = {:.4})", best.threshold, metric, best.score);
    }
    Ok(())
}

fn run_predict(
    scheme_path: &Path,
    model_path: &Path,
    schema: SchemaVersion,
    record: &str,
) -> Result<()> {
    let scheme = Arc::new(EncodingScheme::load(scheme_path)?);
    let model = Arc::new(LogisticModel::load(model_path)?);
    let service = PredictionService::new(schema, scheme, model)?;

    let response = service.respond_json(record);
    println!("{}", serde_json::to_string(&response)?);

    match response {
        PredictionResponse::Prediction { .. } => Ok(()),
        PredictionResponse::Error { code, .. } => {
            error!("Prediction failed with code {}", code);
            Err(anyhow!("Prediction failed ({})", code))
        }
    }
}

/// Config from `--config`, then `$XSELL_CONFIG`, then the crate default.
fn resolve_config(explicit: Option<&Path>) -> Result<Configuration> {
    if let Some(path) = explicit {
        return Ok(Configuration::from_path(path)?);
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        info!("Using config from {}: {}", CONFIG_ENV_VAR, path);
        return Ok(Configuration::from_path(path)?);
    }
    Ok(get_config()?)
}

/// 0/1 labels of `column`.
fn label_vector(data: &DataFrame, column: &str) -> Result<Vec<u8>> {
    let series = data
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    series
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(0) => Ok(0),
            Some(1) => Ok(1),
            other => Err(anyhow!("Label in row {} is not 0/1: {:?}", row, other)),
        })
        .collect()
}

fn load_csv(path: &str) -> Result<DataFrame> {
    if !Path::new(path).exists() {
        return Err(anyhow!("Input file not found: {}", path));
    }
    info!("Loading dataset from: {}", path);
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()?;
    Ok(df)
}
