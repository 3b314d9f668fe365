use std::env;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reforma_contracts::chat::{parse_intent, SESSION_HELP_COMMANDS};
use reforma_contracts::events::AnalysisEventLog;
use reforma_contracts::report::export::{costs_table, export_report, rooms_table};
use reforma_contracts::report::{AnalysisReport, ReportOrigin};
use reforma_engine::{
    fallback_report, midpoint_estimate, ListingSummary, NoThrottle, PipelineConfig,
    PropertyAnalysis, RenovationPipeline,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "reforma",
    version,
    about = "Renovation cost estimates for idealista listings"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze one listing and export the report.
    Analyze(AnalyzeArgs),
    /// Line-oriented session; type /help for commands.
    Interactive(InteractiveArgs),
    /// Area-only estimate, no network.
    Estimate(EstimateArgs),
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    /// Property id or listing URL.
    #[arg(long)]
    property: String,
    #[arg(long, default_value = ".")]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    no_throttle: bool,
}

#[derive(Debug, Parser)]
struct InteractiveArgs {
    #[arg(long, default_value = ".")]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct EstimateArgs {
    /// Floor area in m².
    #[arg(long)]
    area: f64,
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("reforma error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    load_dotenv();
    init_tracing()?;
    match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Interactive(args) => {
            run_interactive(args)?;
            Ok(0)
        }
        Command::Estimate(args) => run_estimate(args),
    }
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(err) if err.not_found() => {}
        Err(err) => eprintln!("reforma: ignoring unreadable .env ({err})"),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))
}

fn run_analyze(args: AnalyzeArgs) -> Result<i32> {
    let mut pipeline = build_pipeline(args.events.as_deref(), args.no_throttle)?;
    let analysis = pipeline
        .analyze_property(&args.property)
        .with_context(|| format!("could not analyze {}", args.property.trim()))?;
    print_analysis(&analysis);
    export_to(&args.out, &analysis.report)?;
    Ok(0)
}

fn run_estimate(args: EstimateArgs) -> Result<i32> {
    if !args.area.is_finite() || args.area < 0.0 {
        bail!("--area must be a non-negative number of m², got {}", args.area);
    }
    let report = fallback_report(args.area);
    print_report(&report, args.area);
    export_to(&args.out, &report)?;
    Ok(0)
}

fn run_interactive(args: InteractiveArgs) -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    let mut pipeline: Option<RenovationPipeline> = None;
    let mut last: Option<(AnalysisReport, f64)> = None;

    println!("Reforma session started. Type /help for commands.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);
        if intent.action == "noop" {
            continue;
        }

        match intent.action.as_str() {
            "help" => {
                println!("Commands: {}", SESSION_HELP_COMMANDS.join(" "));
                println!("Any other line is treated as a property id or listing URL.");
            }
            "quit" => break,
            "analyze" => {
                let Some(property) = intent.arg_str("property") else {
                    println!("/analyze requires a property id or listing URL");
                    continue;
                };
                if pipeline.is_none() {
                    match build_pipeline(args.events.as_deref(), false) {
                        Ok(built) => pipeline = Some(built),
                        Err(err) => {
                            println!("Analysis unavailable: {err:#}");
                            continue;
                        }
                    }
                }
                let Some(active) = pipeline.as_mut() else {
                    continue;
                };
                match active.analyze_property(property) {
                    Ok(analysis) => {
                        print_analysis(&analysis);
                        last = Some((analysis.report, analysis.listing.area_m2));
                    }
                    Err(err) => println!("Analysis failed: {err}"),
                }
            }
            "estimate" => {
                let Some(area) = intent.arg_f64("area") else {
                    println!("/estimate requires a floor area in m², e.g. /estimate 85");
                    continue;
                };
                let report = fallback_report(area);
                print_report(&report, area);
                last = Some((report, area));
            }
            "show" => match &last {
                Some((report, area)) => print_report(report, *area),
                None => println!("Nothing analyzed yet."),
            },
            "export" => {
                let Some((report, _)) = &last else {
                    println!("Nothing to export yet.");
                    continue;
                };
                let dir = intent
                    .arg_str("path")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| args.out.clone());
                if let Err(err) = export_to(&dir, report) {
                    println!("Export failed: {err:#}");
                }
            }
            "unknown" => {
                let command = intent.arg_str("command").unwrap_or_default();
                println!("Unknown command /{command}. Type /help for commands.");
            }
            other => println!("Unhandled action {other}"),
        }
    }

    Ok(())
}

fn build_pipeline(events: Option<&Path>, no_throttle: bool) -> Result<RenovationPipeline> {
    let config = pipeline_config(|key| env::var(key).ok())?;
    let mut pipeline = RenovationPipeline::from_config(&config)?;
    if !pipeline.has_classifier() {
        warn!("OPENAI_API_KEY not set; reports will use the area-based estimate");
    }
    if no_throttle {
        pipeline = pipeline.with_throttle(Box::new(NoThrottle));
    }
    if let Some(path) = events {
        let log = AnalysisEventLog::with_random_run_id(path);
        info!(path = %log.path().display(), run_id = log.run_id(), "writing events");
        pipeline = pipeline.with_event_log(log);
    }
    Ok(pipeline)
}

/// Builds the pipeline config from environment-style lookups.
fn pipeline_config<F>(lookup: F) -> Result<PipelineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = PipelineConfig::default();
    let Some(rapidapi_key) = first_non_empty(&lookup, &["RAPIDAPI_KEY"]) else {
        bail!("RAPIDAPI_KEY is not set; add it to the environment or a .env file");
    };
    config.rapidapi_key = rapidapi_key;
    config.openai_api_key = first_non_empty(&lookup, &["OPENAI_API_KEY"]);
    if let Some(base) = first_non_empty(&lookup, &["OPENAI_API_BASE", "OPENAI_BASE_URL"]) {
        config.openai_api_base = base;
    }
    if let Some(base) = first_non_empty(&lookup, &["IDEALISTA_API_BASE"]) {
        config.listing_api_base = base;
    }
    Ok(config)
}

fn first_non_empty<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    for key in keys {
        if let Some(value) = lookup(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn export_to(dir: &Path, report: &AnalysisReport) -> Result<()> {
    let written = export_report(dir, report)
        .with_context(|| format!("failed to export report to {}", dir.display()))?;
    for path in written.all() {
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn print_analysis(analysis: &PropertyAnalysis) {
    print_listing(&analysis.listing);
    print_report(&analysis.report, analysis.listing.area_m2);
}

fn print_listing(listing: &ListingSummary) {
    println!();
    println!("Inmueble {}", listing.property_id);
    println!(
        "Superficie: {} m² | Habitaciones: {} | Baños: {} | Imágenes: {}",
        format_area(listing.area_m2),
        listing.rooms,
        listing.bathrooms,
        listing.images.len()
    );
}

fn print_report(report: &AnalysisReport, area_m2: f64) {
    println!();
    println!("ANÁLISIS POR HABITACIÓN");
    let rooms: Vec<Vec<String>> = rooms_table(report).into_iter().map(Vec::from).collect();
    println!(
        "{}",
        render_table(
            &["Habitación", "Necesita reforma", "Justificación", "Elementos a reformar"],
            &rooms,
        )
    );

    if !report.auxiliary().is_empty() {
        println!();
        println!("OTRAS IMÁGENES (no incluidas en el total)");
        let auxiliary: Vec<Vec<String>> = report
            .auxiliary()
            .iter()
            .map(|(room, verdict)| {
                vec![
                    room.display_name(),
                    verdict.needs_renovation.as_str().to_string(),
                    verdict.justification.clone(),
                    verdict.estimated_cost.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            render_table(
                &["Imagen", "Necesita reforma", "Justificación", "Estimación"],
                &auxiliary,
            )
        );
    }

    println!();
    println!("ESTIMACIÓN DE COSTES");
    let costs: Vec<Vec<String>> = costs_table(report).into_iter().map(Vec::from).collect();
    println!("{}", render_table(&["Concepto", "Estimación"], &costs));

    println!();
    println!("Nivel de confianza: {}", report.confidence().as_str());
    println!("Comentarios: {}", report.comments());

    if report.origin() == ReportOrigin::AreaHeuristic {
        println!(
            "Superficie: {} m² | Estimación media: {} € (±20%)",
            format_area(area_m2),
            midpoint_estimate(area_m2)
        );
    }
}

fn format_area(area_m2: f64) -> String {
    if area_m2.fract() == 0.0 {
        format!("{area_m2:.0}")
    } else {
        format!("{area_m2:.1}")
    }
}

/// Plain-text table with a header rule. Cells longer than the column cap are clipped.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    const MAX_CELL: usize = 60;
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count().min(MAX_CELL));
        }
    }

    let format_row = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let clipped = clip_cell(cell, MAX_CELL);
                let pad = width.saturating_sub(clipped.chars().count());
                format!("{clipped}{}", " ".repeat(pad))
            })
            .collect::<Vec<String>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(headers.iter().map(|h| h.to_string()).collect())];
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<String>>()
            .join("-+-"),
    );
    for row in rows {
        lines.push(format_row(row.clone()));
    }
    lines.join("\n")
}

fn clip_cell(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<&str>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let mut clipped: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{clip_cell, format_area, pipeline_config, render_table};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn config_requires_rapidapi_key() {
        let err = pipeline_config(lookup(&[("OPENAI_API_KEY", "sk-1")])).unwrap_err();
        assert!(err.to_string().contains("RAPIDAPI_KEY"));

        let blank = pipeline_config(lookup(&[("RAPIDAPI_KEY", "   ")]));
        assert!(blank.is_err());
    }

    #[test]
    fn config_reads_keys_and_overrides() {
        let config = pipeline_config(lookup(&[
            ("RAPIDAPI_KEY", " rapid "),
            ("OPENAI_API_KEY", "sk-1"),
            ("IDEALISTA_API_BASE", "http://127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.rapidapi_key, "rapid");
        assert!(config.has_vision_credentials());
        assert_eq!(config.listing_api_base, "http://127.0.0.1:9000");
        assert_eq!(config.openai_api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn missing_openai_key_leaves_vision_disabled() {
        let config = pipeline_config(lookup(&[("RAPIDAPI_KEY", "rapid")])).unwrap();
        assert!(!config.has_vision_credentials());
    }

    #[test]
    fn table_pads_columns_to_widest_cell() {
        let table = render_table(
            &["Concepto", "Estimación"],
            &[
                vec!["Total".to_string(), "1000 - 1500 €".to_string()],
                vec!["Baños".to_string(), "1000 - 1500 €".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Concepto | Estimación");
        assert_eq!(lines[1], "---------+--------------");
        assert_eq!(lines[2], "Total    | 1000 - 1500 €");
    }

    #[test]
    fn long_cells_are_clipped_to_one_line() {
        let clipped = clip_cell(&"palabra ".repeat(20), 20);
        assert_eq!(clipped.chars().count(), 20);
        assert!(clipped.ends_with('…'));
        assert_eq!(clip_cell("dos\nlíneas", 20), "dos líneas");
    }

    #[test]
    fn area_formatting_drops_integral_decimals() {
        assert_eq!(format_area(80.0), "80");
        assert_eq!(format_area(85.5), "85.5");
    }
}
