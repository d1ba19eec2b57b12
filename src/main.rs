use anyhow::Result;
use clap::Parser;
use pipcam::capture::{CaptureBackend, MockCaptureBackend};
use pipcam::sync::enumerate_devices;
use pipcam::{JsonSettingsStore, LoggingSurface, PipConfig, PipOrchestrator};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "pipcam")]
#[command(about = "Picture-in-picture webcam overlay")]
#[command(version)]
#[command(long_about = "A picture-in-picture webcam overlay: one live camera preview whose \
device, resolution, frame rate, zoom, pan offset and mirroring can be changed live. \
Mirroring can follow the window's position on screen.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "pipcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// List video input devices and exit
    #[arg(long, help = "List available cameras and exit")]
    list_devices: bool,

    /// Disable the terminal keyboard controls
    #[arg(long, help = "Run without keyboard controls")]
    no_keyboard: bool,

    /// Dry run mode - initialize but don't start components
    #[arg(long, help = "Perform dry run - initialize components but don't start them")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting pipcam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match PipConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let backend = create_backend();

    if args.list_devices {
        match enumerate_devices(backend.as_ref(), config.capture.retry_delay()).await {
            Some(devices) if devices.is_empty() => println!("No cameras found"),
            Some(devices) => {
                for device in devices {
                    println!("{}\t{}", device.device_id, device.label);
                }
            }
            None => {
                eprintln!("✗ Could not enumerate cameras");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let store = Arc::new(JsonSettingsStore::new(&config.storage.settings_path));
    let surface = Arc::new(LoggingSurface::new());
    let mut orchestrator = PipOrchestrator::new(config, backend, surface, store);
    if args.no_keyboard {
        orchestrator.set_keyboard_enabled(false);
    }

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize: {}", e);
        e
    })?;

    if args.dry_run {
        info!("Dry run mode - components initialized but not started");
        println!("✓ Dry run completed successfully - all components initialized");
        return Ok(());
    }

    orchestrator.start().await.map_err(|e| {
        error!("Failed to start: {}", e);
        e
    })?;

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("Error during execution: {}", e);
        e
    })?;

    info!("pipcam exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

#[cfg(all(feature = "gstreamer", target_os = "linux"))]
fn create_backend() -> Arc<dyn CaptureBackend> {
    match pipcam::GstCaptureBackend::new() {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            warn!("GStreamer unavailable ({}), using mock camera", e);
            Arc::new(MockCaptureBackend::new())
        }
    }
}

#[cfg(not(all(feature = "gstreamer", target_os = "linux")))]
fn create_backend() -> Arc<dyn CaptureBackend> {
    warn!("Built without camera support, using mock camera");
    Arc::new(MockCaptureBackend::new())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pipcam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .with_writer(std::io::stderr)
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .with_writer(std::io::stderr)
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

fn print_default_config() -> Result<()> {
    println!("# pipcam configuration file");
    println!("# Every key is optional; environment variables override file values,");
    println!("# e.g. PIPCAM_AUTO_FLIP__DEBOUNCE_MS=750");
    println!();
    println!("{}", toml::to_string_pretty(&PipConfig::default())?);
    Ok(())
}
