use std::path::PathBuf;

use clap::Parser;

use award_etl::config::SourceKind;
use award_etl::core::reducer::format_points;
use award_etl::utils::error::ErrorSeverity;
use award_etl::utils::{logger, validation::Validate};
use award_etl::{
    AwardPipeline, AwardsConfig, CalendarSource, EtlEngine, FixtureCalendarSource,
    HttpCalendarSource, LocalStorage,
};

#[derive(Parser)]
#[command(name = "award-etl")]
#[command(about = "Scans award calendars and exports the cheapest consistent points per route")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "awards.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override output directory from config
    #[arg(long)]
    output: Option<String>,

    /// Dry run - show the scan plan without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting award calendar scan");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = match AwardsConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Some(output) = args.output.clone() {
        tracing::info!("🔧 Output path overridden to: {}", output);
        config.load.output_path = output;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated");

    display_scan_plan(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be fetched");
        display_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path().to_string());

    match config.source_kind() {
        SourceKind::Http => {
            let source = HttpCalendarSource::new(
                config.endpoint(),
                config.user_agent(),
                config.timeout(),
                config.debug_capture().map(PathBuf::from),
            )?;
            run_scan(source, storage, config, monitor_enabled).await
        }
        SourceKind::Fixture => {
            // Validation guarantees the directory is configured
            let fixture_dir = config.fixture_dir().unwrap_or_default().to_string();
            let source = FixtureCalendarSource::new(LocalStorage::new(fixture_dir));
            run_scan(source, storage, config, monitor_enabled).await
        }
    }
}

async fn run_scan<C: CalendarSource>(
    source: C,
    storage: LocalStorage,
    config: AwardsConfig,
    monitor_enabled: bool,
) -> anyhow::Result<()> {
    let pipeline = AwardPipeline::new(source, storage, config);
    let mut engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Award scan completed successfully!");
            println!("✅ Award scan completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Award scan failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_scan_plan(config: &AwardsConfig, args: &Args) {
    println!("📋 Scan Plan:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Destination: {}", config.destination());
    println!(
        "  Airports: {} ({} route directions)",
        config.airports().len(),
        config.airports().len() * 2
    );

    if let Ok(window) = config.scan_window() {
        let labels: Vec<String> = window.slots().iter().map(|s| s.label()).collect();
        if let (Some(first), Some(last)) = (labels.first(), labels.last()) {
            println!("  Window: {} → {} ({} months)", first, last, window.len());
        }
    }

    match config.source_kind() {
        SourceKind::Http => println!("  Source: HTTP ({})", config.endpoint()),
        SourceKind::Fixture => println!(
            "  Source: fixtures ({})",
            config.fixture_dir().unwrap_or_default()
        ),
    }

    println!(
        "  Output: {}/{}",
        config.output_path(),
        config.output_filename()
    );
    if let Some(bundle) = config.compression_filename() {
        println!("  Bundle: {}", bundle);
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}

fn display_dry_run(config: &AwardsConfig) {
    println!("🔍 Thresholds per route:");
    for airport in config.airports() {
        println!(
            "  {} ↔ {}  ≤ {}",
            airport.code,
            config.destination(),
            format_points(airport.max_points)
        );
    }
    println!();
    println!("✅ Dry run complete. Re-run without --dry-run to fetch.");
}
