use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
#[cfg(feature = "debug-observer")]
use std::sync::Arc;
use target_ranker::config::AppConfig;
use target_ranker::error::AppError;
#[cfg(feature = "debug-observer")]
use target_ranker::ranking::{CapturingObserver, ScoreBreakdown};
use target_ranker::ranking::{
    EngineConfig, RankedCandidate, RankingEngine, ScorerHandle, WeightCurve, Weighted,
};
use target_ranker::replay::ScoreTable;
use target_ranker::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "target-ranker",
    about = "Filter and rank interaction candidates through an ordered scorer pipeline",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded score table through the ranking engine
    Rank(RankArgs),
}

#[derive(Args, Debug, Default)]
struct RankArgs {
    /// CSV score table: a `candidate` column followed by one column per scorer
    #[arg(long)]
    scores: PathBuf,
    /// Actor the ranking is computed for
    #[arg(long, default_value = "actor")]
    actor: String,
    /// Scorer evaluation order; unlisted scorers keep their relative order after these
    #[arg(long, value_delimiter = ',')]
    order: Vec<String>,
    /// Disable a scorer by name (repeatable)
    #[arg(long)]
    disable: Vec<String>,
    /// Map a scorer through a weight curve, as NAME=x:y,x:y,... (repeatable)
    #[arg(long, value_parser = parse_curve_override)]
    curve: Vec<CurveOverride>,
    /// Print the ranking as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct CurveOverride {
    scorer: String,
    curve: WeightCurve,
}

#[derive(Debug, Serialize)]
struct ScorerView {
    position: usize,
    handle: ScorerHandle,
    name: String,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct RankReport<'a> {
    actor: &'a str,
    scorers: Vec<ScorerView>,
    ranked: &'a [RankedCandidate<String>],
    filtered: Vec<&'a str>,
    #[cfg(feature = "debug-observer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<ScoreBreakdown<String, String>>,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Rank(args) => run_rank(args),
    }
}

fn parse_curve_override(raw: &str) -> Result<CurveOverride, String> {
    let (scorer, keys) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=x:y,x:y,... but got '{raw}'"))?;
    let scorer = scorer.trim();
    if scorer.is_empty() {
        return Err(format!("missing scorer name in '{raw}'"));
    }
    let curve = keys.parse::<WeightCurve>().map_err(|err| err.to_string())?;
    Ok(CurveOverride {
        scorer: scorer.to_string(),
        curve,
    })
}

fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let table = ScoreTable::from_path(&args.scores)?;
    info!(
        ?config.environment,
        path = %args.scores.display(),
        candidates = table.candidates().len(),
        scorers = table.scorer_names().len(),
        "score table loaded"
    );

    let pipeline = ReplayPipeline::build(&table, &args, &config.engine)?;

    #[cfg(feature = "debug-observer")]
    let observer = args.json.then(|| {
        let observer = Arc::new(CapturingObserver::<String, String>::new());
        pipeline.engine.set_observer(Some(observer.clone()));
        observer
    });

    pipeline.engine.link(args.actor.clone());
    let ranked = pipeline.engine.rank(&args.actor, table.candidates())?;

    let report = RankReport {
        actor: &args.actor,
        scorers: pipeline.scorer_views(),
        ranked: &ranked,
        filtered: filtered_candidates(table.candidates(), &ranked),
        #[cfg(feature = "debug-observer")]
        breakdown: observer.and_then(|observer| observer.last()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_ranking(&report);
    }

    Ok(())
}

/// Engine loaded with one recorded scorer per score table column.
struct ReplayPipeline {
    engine: RankingEngine<String, String>,
    columns: Vec<(String, ScorerHandle)>,
}

impl ReplayPipeline {
    fn build(
        table: &ScoreTable,
        args: &RankArgs,
        engine_config: &EngineConfig,
    ) -> Result<Self, AppError> {
        let engine = RankingEngine::with_config("replay", engine_config);
        if !engine.is_active() {
            engine.set_active(true);
        }

        for unknown in args
            .curve
            .iter()
            .map(|curve| &curve.scorer)
            .chain(&args.disable)
            .chain(&args.order)
        {
            if !table.scorer_names().contains(unknown) {
                return Err(AppError::Usage(format!(
                    "score table has no scorer named '{unknown}'"
                )));
            }
        }

        let mut columns = Vec::with_capacity(table.scorer_names().len());
        for (name, recorded) in table.scorer_names().iter().zip(table.recorded_scorers()) {
            let curve = args
                .curve
                .iter()
                .rev()
                .find(|curve| &curve.scorer == name)
                .map(|curve| curve.curve.clone());
            let handle = match curve {
                Some(curve) => engine.add_scorer(Weighted::new(recorded, curve)),
                None => engine.add_scorer(recorded),
            };
            columns.push((name.clone(), handle));
        }

        let pipeline = Self { engine, columns };

        let mut position = 0;
        for name in &args.order {
            let handle = pipeline.handle(name)?;
            let current = pipeline
                .engine
                .scorer_handles()
                .iter()
                .position(|existing| *existing == handle)
                .unwrap_or(position);
            if current < position {
                continue;
            }
            pipeline.engine.move_scorer_to(handle, position)?;
            position += 1;
        }

        for name in &args.disable {
            pipeline
                .engine
                .set_scorer_enabled(pipeline.handle(name)?, false)?;
        }

        Ok(pipeline)
    }

    fn handle(&self, name: &str) -> Result<ScorerHandle, AppError> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, handle)| *handle)
            .ok_or_else(|| AppError::Usage(format!("score table has no scorer named '{name}'")))
    }

    fn scorer_views(&self) -> Vec<ScorerView> {
        self.engine
            .scorer_handles()
            .into_iter()
            .enumerate()
            .map(|(position, handle)| ScorerView {
                position,
                handle,
                name: self.engine.scorer_name(handle).unwrap_or_default(),
                enabled: self.engine.is_scorer_enabled(handle).unwrap_or(false),
            })
            .collect()
    }
}

fn filtered_candidates<'a>(
    candidates: &'a [String],
    ranked: &[RankedCandidate<String>],
) -> Vec<&'a str> {
    candidates
        .iter()
        .filter(|candidate| !ranked.iter().any(|entry| &entry.candidate == *candidate))
        .map(String::as_str)
        .collect()
}

fn render_ranking(report: &RankReport<'_>) {
    println!("Ranking for actor {}", report.actor);

    println!("\nScorer pipeline");
    for scorer in &report.scorers {
        let state = if scorer.enabled { "enabled" } else { "disabled" };
        println!(
            "- {}. {} ({}, {})",
            scorer.position + 1,
            scorer.name,
            scorer.handle,
            state
        );
    }

    if report.ranked.is_empty() {
        println!("\nRanked candidates: none");
    } else {
        println!("\nRanked candidates");
        for (rank, entry) in report.ranked.iter().enumerate() {
            println!("- {}. {} score {:.4}", rank + 1, entry.candidate, entry.score);
        }
    }

    if report.filtered.is_empty() {
        println!("\nFiltered out: none");
    } else {
        println!("\nFiltered out: {}", report.filtered.join(", "));
    }
}
