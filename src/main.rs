//! EcoGuard CLI
//!
//! Drives the dashboard controller from the command line:
//! - Refresh and render the dashboard
//! - Export data and charts
//! - Run voice commands
//! - Check air quality
//! - Share achievements

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ecoguard::air_quality::{OpenWeatherClient, StaticGeolocator};
use ecoguard::config::{generate_default_config, Config, LoggingConfig};
use ecoguard::dashboard::{
    ChartType, DashboardController, LineRecognizer, RefreshOutcome, Series, ShareOutcome,
    SystemClipboard, TimeFilter,
};
use ecoguard::export::{ChartFormat, DataFormat};
use ecoguard::preferences::FilePreferenceStore;
use ecoguard::render::ChartTarget;
use ecoguard::source::HttpDataSource;
use ecoguard::surface::{HeadlessSurface, ToastKind};

#[derive(Parser)]
#[command(name = "ecoguard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Carbon footprint dashboard")]
#[command(long_about = "EcoGuard fetches your emission data, renders the dashboard charts,\nexports data and charts, and checks local air quality.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Dashboard data endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Directory exported files are written into
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Time range (day, week, month, quarter, year, all)
    #[arg(short, long, global = true)]
    pub filter: Option<TimeFilter>,

    /// Main chart type (line, bar, pie, heatmap)
    #[arg(long, global = true)]
    pub chart_type: Option<ChartType>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and render the dashboard
    Refresh {
        /// Also write every rendered chart as SVG
        #[arg(long)]
        svg: bool,
    },

    /// Export the dashboard data
    ExportData {
        /// Format (csv, json)
        #[arg(long, default_value = "csv")]
        format: DataFormat,
    },

    /// Export the main chart
    ExportChart {
        /// Format (png, pdf)
        #[arg(long, default_value = "png")]
        format: ChartFormat,
    },

    /// Detailed chart of one series
    DrillDown {
        /// Series (emissions, transport, electricity, food, plastic)
        series: Series,
    },

    /// Run a voice command (reads one line from stdin without TEXT)
    Voice {
        text: Option<String>,
    },

    /// Keep the dashboard refreshing until interrupted
    Watch,

    /// Toggle dark mode
    DarkMode,

    /// Check air quality for a city or the configured position
    AirQuality {
        #[arg(long)]
        city: Option<String>,
    },

    /// Share an achievement
    Share {
        title: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Config written to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    apply_cli_overrides(&mut config, &cli);
    init_logging(&config.logging)?;

    tracing::info!("EcoGuard v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(endpoint = %config.dashboard.endpoint, "Configuration loaded");

    let surface = Arc::new(HeadlessSurface::with_output_dir(&config.export.output_dir));
    let dashboard = build_dashboard(&config, surface.clone())?;

    let result = run(cli.command, &dashboard, &surface).await;
    print_notifications(&surface);
    result
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(endpoint) = &cli.endpoint {
        config.dashboard.endpoint = endpoint.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.export.output_dir = dir.to_string_lossy().to_string();
    }
    if let Some(filter) = cli.filter {
        config.dashboard.default_filter = filter;
    }
    if let Some(chart_type) = cli.chart_type {
        config.dashboard.default_chart_type = chart_type;
    }
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ecoguard={}", config.level).into());

    let json = config.format == "json";
    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let pretty_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr));

    let file_layer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_layer)
        .init();

    Ok(())
}

fn build_dashboard(
    config: &Config,
    surface: Arc<HeadlessSurface>,
) -> anyhow::Result<Arc<DashboardController>> {
    let source = HttpDataSource::new(config.dashboard.source_config())
        .context("Failed to create data source")?;
    let preferences = FilePreferenceStore::new(&config.preferences.path);

    let mut builder = DashboardController::builder(Arc::new(source), surface)
        .preferences(Arc::new(preferences))
        .recognizer(Arc::new(LineRecognizer))
        .clipboard(Arc::new(SystemClipboard::new()))
        .settings(config.dashboard.settings());

    if config.air_quality.is_usable() {
        let client = OpenWeatherClient::new(
            config
                .air_quality
                .client_config(config.dashboard.request_timeout_secs),
        )
        .context("Failed to create air quality client")?;
        builder = builder.air_quality(Arc::new(client));
    } else {
        tracing::debug!("Air quality lookups disabled (no API key)");
    }

    if let Some((lat, lon)) = config.air_quality.position() {
        builder = builder.geolocator(Arc::new(StaticGeolocator::new(lat, lon)));
    }

    Ok(builder.build())
}

async fn run(
    command: Commands,
    dashboard: &Arc<DashboardController>,
    surface: &HeadlessSurface,
) -> anyhow::Result<()> {
    match command {
        Commands::Refresh { svg } => {
            refresh(dashboard).await?;
            print_summary(dashboard, surface).await;
            if svg {
                write_charts(surface)?;
            }
        }

        Commands::ExportData { format } => {
            refresh(dashboard).await?;
            if !dashboard.export_data(format).await {
                anyhow::bail!("Nothing exported");
            }
            print_saved(surface);
        }

        Commands::ExportChart { format } => {
            refresh(dashboard).await?;
            if !dashboard.export_chart(format).await {
                anyhow::bail!("Nothing exported");
            }
            print_saved(surface);
        }

        Commands::DrillDown { series } => {
            refresh(dashboard).await?;
            dashboard.drill_down(series).await;
            let chart = surface
                .chart(ChartTarget::DrillDown)
                .context("Drill-down chart was not rendered")?;
            let path = write_svg(surface, &format!("ecoguard_{}.svg", series), &chart.svg)?;
            println!("{}: {}", chart.spec.title, path.display());
        }

        Commands::Voice { text } => {
            let action = match text {
                Some(text) => dashboard.process_voice_command(&text).await,
                None => {
                    eprintln!("Listening... type a command and press Enter");
                    dashboard.start_voice_command().await
                }
            };
            match action {
                Some(action) => println!("Action: {:?}", action),
                None => anyhow::bail!("No command executed"),
            }
        }

        Commands::Watch => {
            refresh(dashboard).await?;
            print_summary(dashboard, surface).await;

            dashboard.toggle_auto_refresh().await;
            println!(
                "Refreshing every {}s, press Ctrl+C to stop",
                dashboard.settings().auto_refresh_interval.as_secs()
            );

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            dashboard.toggle_auto_refresh().await;
            tracing::info!("Auto-refresh stopped");
        }

        Commands::DarkMode => {
            let enabled = dashboard.toggle_dark_mode().await;
            println!("Dark mode {}", if enabled { "enabled" } else { "disabled" });
        }

        Commands::AirQuality { city } => {
            let report = match city {
                Some(city) => dashboard.check_city_air_quality(&city).await,
                None => dashboard.check_local_air_quality().await,
            };
            match report {
                Some(report) => println!("{}", report.summary()),
                None => anyhow::bail!("Air quality lookup failed"),
            }
        }

        Commands::Share { title } => match dashboard.share_achievement(&title).await {
            ShareOutcome::Shared | ShareOutcome::Copied => {}
            ShareOutcome::Unsupported => anyhow::bail!("Sharing not supported"),
            ShareOutcome::Failed(e) => anyhow::bail!("Sharing failed: {}", e),
        },

        // Handled before the dashboard is built
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn refresh(dashboard: &DashboardController) -> anyhow::Result<()> {
    match dashboard.refresh().await {
        RefreshOutcome::Applied | RefreshOutcome::Stale => Ok(()),
        RefreshOutcome::Failed => anyhow::bail!("Failed to load dashboard data"),
    }
}

async fn print_summary(dashboard: &DashboardController, surface: &HeadlessSurface) {
    let Some(snapshot) = dashboard.snapshot().await else {
        return;
    };
    let ui = dashboard.ui_state().await;

    let total: f64 = snapshot.emissions.iter().sum();
    println!(
        "{} days ({}), {:.1} kg CO₂ total",
        snapshot.len(),
        ui.time_filter,
        total
    );

    let achievements = surface.achievements();
    let unlocked = achievements.iter().filter(|a| a.unlocked).count();
    println!("Achievements: {}/{} unlocked", unlocked, achievements.len());
    for achievement in achievements.iter().filter(|a| a.unlocked) {
        println!("  {} {}", achievement.icon, achievement.title);
    }

    for insight in surface.insights() {
        println!("{} {}: {}", insight.icon, insight.title, insight.text);
    }

    if let Some(streak) = &snapshot.streak_data {
        println!(
            "Streak: {} days (best {})",
            streak.current_streak, streak.best_streak
        );
    }
}

fn write_charts(surface: &HeadlessSurface) -> anyhow::Result<()> {
    let targets = [
        ChartTarget::Main,
        ChartTarget::Radar,
        ChartTarget::Category,
        ChartTarget::Waterfall,
        ChartTarget::Streak,
    ];
    for target in targets {
        if let Some(chart) = surface.chart(target) {
            let path = write_svg(surface, &format!("{}.svg", target.element_id()), &chart.svg)?;
            println!("{}: {}", chart.spec.title, path.display());
        }
    }
    Ok(())
}

fn write_svg(surface: &HeadlessSurface, filename: &str, markup: &str) -> anyhow::Result<PathBuf> {
    let dir = surface.output_dir().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, markup).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn print_saved(surface: &HeadlessSurface) {
    let dir = surface.output_dir().unwrap_or(Path::new("."));
    for file in surface.downloads() {
        println!(
            "Saved {} ({} bytes)",
            dir.join(&file.filename).display(),
            file.bytes.len()
        );
    }
}

fn print_notifications(surface: &HeadlessSurface) {
    for notification in surface.notifications() {
        match notification.kind {
            ToastKind::Error => eprintln!("✗ {}", notification.message),
            ToastKind::Success => println!("✓ {}", notification.message),
            ToastKind::Info => println!("• {}", notification.message),
        }
    }
}
