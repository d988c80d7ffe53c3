use crate::infra::build_queries;
use clap::Args;
use paygrid::config::{AppConfig, ScorerChoice};
use paygrid::error::AppError;
use paygrid::estimation::{
    default_grid_base, Categorical, GridResponse, InverseSearchResponse, ModelInfoResponse,
    PredictResponse, QueryOptions, ResponseStatus, SalaryQueries,
};
use paygrid::telemetry;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ScorerArgs {
    /// Score with the closed-form heuristic even when a trained model is configured
    #[arg(long, conflicts_with = "model_dir")]
    pub(crate) mock: bool,
    /// Score with the trained model stored in this directory
    #[arg(long)]
    pub(crate) model_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OutputArgs {
    /// Print the JSON response instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Job attributes as a JSON object
    #[arg(long, conflicts_with = "payload_file")]
    pub(crate) payload: Option<String>,
    /// File containing the job attributes as a JSON object
    #[arg(long)]
    pub(crate) payload_file: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) scorer: ScorerArgs,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug)]
pub(crate) struct InverseArgs {
    /// Salary to approximate, in USD
    #[arg(long)]
    pub(crate) target: f64,
    /// Restrict the search to these job titles (repeatable)
    #[arg(long)]
    pub(crate) job_title: Vec<String>,
    /// Restrict the search to these experience levels (repeatable)
    #[arg(long)]
    pub(crate) experience_level: Vec<String>,
    /// Restrict the search to these company sizes (repeatable)
    #[arg(long)]
    pub(crate) company_size: Vec<String>,
    /// Restrict the search to these remote percentages (repeatable)
    #[arg(long)]
    pub(crate) remote_ratio: Vec<f64>,
    /// Number of closest configurations to report
    #[arg(long)]
    pub(crate) top_n: Option<usize>,
    /// Report the rows scored so far when the search deadline passes
    #[arg(long)]
    pub(crate) allow_partial: bool,
    #[command(flatten)]
    pub(crate) scorer: ScorerArgs,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug)]
pub(crate) struct GridArgs {
    /// Field-to-values mapping as a JSON object, e.g. '{"company_size":["S","XL"]}'
    #[arg(long, conflicts_with = "spec_file", required_unless_present = "spec_file")]
    pub(crate) spec: Option<String>,
    /// File containing the field-to-values mapping
    #[arg(long)]
    pub(crate) spec_file: Option<PathBuf>,
    /// Attributes shared by every combination (defaults to FT, Master, US)
    #[arg(long)]
    pub(crate) base: Option<String>,
    /// Report the rows scored so far when the search deadline passes
    #[arg(long)]
    pub(crate) allow_partial: bool,
    #[command(flatten)]
    pub(crate) scorer: ScorerArgs,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ModelArgs {
    /// Inspect the model stored in this directory instead of the configured one
    #[arg(long)]
    pub(crate) model_dir: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

struct CommandContext {
    queries: Arc<SalaryQueries>,
    use_mock: bool,
}

fn prepare(scorer: &ScorerArgs) -> Result<CommandContext, AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Some(dir) = &scorer.model_dir {
        config.estimation.scorer = ScorerChoice::TrainedModel;
        config.estimation.model_dir = dir.clone();
    }

    let queries = build_queries(&config.estimation);
    let use_mock = scorer.mock || queries.default_use_mock();
    Ok(CommandContext { queries, use_mock })
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let payload = read_object(args.payload, args.payload_file)?.unwrap_or_default();
    let context = prepare(&args.scorer)?;

    let response = context.queries.predict_salary(&payload, context.use_mock);
    emit(&args.output, &response, render_prediction)
}

pub(crate) fn run_inverse(args: InverseArgs) -> Result<(), AppError> {
    let context = prepare(&args.scorer)?;
    let constraints = inverse_constraints(&args);
    let options = QueryOptions {
        allow_partial: args.allow_partial,
        ..QueryOptions::default()
    };

    let response = context.queries.inverse_salary_search_with(
        args.target,
        Some(&constraints),
        context.use_mock,
        args.top_n,
        &options,
    );
    emit(&args.output, &response, render_search)
}

pub(crate) fn run_grid(args: GridArgs) -> Result<(), AppError> {
    let spec = read_object(args.spec, args.spec_file)?.unwrap_or_default();
    let base = match args.base {
        Some(raw) => serde_json::from_str::<Map<String, Value>>(&raw)?,
        None => default_grid_base(),
    };
    let context = prepare(&args.scorer)?;
    let options = QueryOptions {
        allow_partial: args.allow_partial,
        ..QueryOptions::default()
    };

    let response =
        context
            .queries
            .salary_grid_with(&Value::Object(spec), &base, context.use_mock, &options);
    emit(&args.output, &response, render_grid)
}

pub(crate) fn run_model(args: ModelArgs) -> Result<(), AppError> {
    let scorer = ScorerArgs {
        mock: false,
        model_dir: args.model_dir,
    };
    let context = prepare(&scorer)?;

    let response = context.queries.model_info();
    emit(&args.output, &response, render_model)
}

fn read_object(
    inline: Option<String>,
    file: Option<PathBuf>,
) -> Result<Option<Map<String, Value>>, AppError> {
    let raw = match (inline, file) {
        (Some(raw), _) => raw,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Ok(None),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

fn inverse_constraints(args: &InverseArgs) -> Value {
    json!({
        "job_title": args.job_title,
        "experience_level": args.experience_level,
        "company_size": args.company_size,
        "remote_ratio": args.remote_ratio,
    })
}

fn emit<T, F>(output: &OutputArgs, response: &T, render: F) -> Result<(), AppError>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    if output.json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        print!("{}", render(response));
    }
    Ok(())
}

fn render_prediction(response: &PredictResponse) -> String {
    match (&response.prediction, &response.error) {
        (Some(prediction), _) => format!(
            "Estimated salary: {} (source: {})\n",
            format_usd(prediction.salary_usd),
            response.meta.source
        ),
        (None, error) => failure_line(error.as_deref(), &response.meta.source),
    }
}

fn render_search(response: &InverseSearchResponse) -> String {
    if response.status == ResponseStatus::Error {
        return failure_line(response.error.as_deref(), &response.meta.source);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Closest configurations to {} ({} candidates, source: {})",
        format_usd(response.meta.target_salary),
        response.meta.candidate_count,
        response.meta.source
    );
    if response.meta.partial {
        let _ = writeln!(out, "Search stopped early; results are partial.");
    }
    for (rank, row) in response.solutions.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {:<26} {:<9} {:<2} remote {:>3}%  {:>10}  (off by {})",
            rank + 1,
            row.job_title.label(),
            row.experience_level.label(),
            row.company_size.label(),
            row.remote_ratio,
            format_usd(row.salary_usd),
            format_usd(row.diff_from_target)
        );
    }
    out
}

fn render_grid(response: &GridResponse) -> String {
    if response.status == ResponseStatus::Error {
        return failure_line(response.error.as_deref(), &response.meta.source);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} combinations (source: {})",
        response.meta.grid_size, response.meta.source
    );
    if response.meta.partial {
        let _ = writeln!(out, "Grid stopped early; results are partial.");
    }
    for row in &response.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|(key, value)| match (key.as_str(), value.as_f64()) {
                ("salary_usd", Some(salary)) => format!("{key}={}", format_usd(salary)),
                (_, _) => format!("{key}={}", plain(value)),
            })
            .collect();
        let _ = writeln!(out, "  {}", cells.join("  "));
    }
    out
}

fn render_model(response: &ModelInfoResponse) -> String {
    if response.status == ResponseStatus::Error {
        return failure_line(response.error.as_deref(), &response.default_source);
    }

    let Some(model) = &response.model else {
        return format!(
            "No trained model configured; requests are scored by '{}'.\n",
            response.default_source
        );
    };

    let mut out = String::new();
    let _ = writeln!(out, "Model: {} (predicts {})", model.name, model.label);
    let _ = writeln!(out, "Artifacts: {}", model.artifact_dir.display());
    if let Some(trained_at) = model.trained_at {
        let _ = writeln!(out, "Trained at: {}", trained_at.to_rfc3339());
    }
    if model.leaderboard.is_empty() {
        let _ = writeln!(out, "Leaderboard: not available");
    } else {
        let _ = writeln!(out, "Leaderboard:");
        for entry in &model.leaderboard {
            let score = entry
                .score_val
                .map(|score| format!("{score:.2}"))
                .unwrap_or_else(|| "-".to_string());
            let metric = entry.eval_metric.as_deref().unwrap_or("score");
            let _ = writeln!(out, "  {:<28} {metric} {score}", entry.model);
        }
    }
    out
}

fn failure_line(error: Option<&str>, source: &str) -> String {
    format!(
        "Request failed ({source}): {}\n",
        error.unwrap_or("unknown error")
    )
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Whole dollars with thousands separators, e.g. `$226,500`.
fn format_usd(amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (index, digit) in rounded.chars().enumerate() {
        if index > 0 && (rounded.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if amount < 0.0 && rounded != "0" {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
