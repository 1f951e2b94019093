//! Fleet status display binary.
//!
//! Polls the fleet's status endpoints and drives a 53x11 RGB LED matrix in
//! one of two modes:
//! - **grid**: one metric per pixel, the full 583-cell table
//! - **bubbles**: floating particles glowing with coarse component status
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/status-matrix-rs --mode grid --lens-token $TOKEN
//! ```

#[cfg(not(feature = "hardware"))]
fn main() {
    eprintln!("This binary requires the 'hardware' feature (rpi-led-matrix).");
    eprintln!("Build with: cargo build --release");
    eprintln!("Tests can run without it: cargo test --no-default-features");
    std::process::exit(1);
}

#[cfg(feature = "hardware")]
fn main() {
    hardware_main();
}

#[cfg(feature = "hardware")]
#[tokio::main(flavor = "current_thread")]
async fn hardware_main() {
    use clap::{Parser, ValueEnum};
    use status_matrix_rs::fetch::{Endpoints, Fetcher, GridSource, OverviewSource};
    use status_matrix_rs::map::MetricMap;
    use status_matrix_rs::scheduler::{self, NoInput};
    use status_matrix_rs::store::StatusStore;
    use status_matrix_rs::surface::MatrixSurface;
    use status_matrix_rs::{GridConfig, Palette, bubbles, grid, setup_signal_handler};
    use std::time::Duration;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
    enum Mode {
        /// One metric per pixel across the full 53x11 table
        Grid,
        /// Floating status bubbles with coarse component status
        Bubbles,
    }

    /// Fleet status display for a 53x11 RGB LED matrix
    #[derive(Parser)]
    #[command(name = "status-matrix-rs")]
    #[command(about = "LED matrix status display for a multi-region service fleet")]
    #[command(version)]
    struct Args {
        /// Display mode
        #[arg(long, value_enum, default_value = "grid")]
        mode: Mode,

        /// Billing service base URL, US region
        #[arg(long, default_value = "https://billing1.ciris-services-1.ai")]
        billing_us_url: String,

        /// Billing service base URL, EU region
        #[arg(long, default_value = "https://billing1.ciris-services-2.ai")]
        billing_eu_url: String,

        /// Proxy service base URL, US region
        #[arg(long, default_value = "https://proxy1.ciris-services-1.ai")]
        proxy_us_url: String,

        /// Proxy service base URL, EU region
        #[arg(long, default_value = "https://proxy1.ciris-services-2.ai")]
        proxy_eu_url: String,

        /// Lens API base URL (health probe and consolidated stats)
        #[arg(long, default_value = "https://lens.ciris-services-1.ai")]
        lens_url: String,

        /// Bearer token for the lens stats endpoint
        #[arg(long, default_value = "")]
        lens_token: String,

        /// Full URL of the coarse status document (bubbles mode)
        #[arg(long, default_value = "https://lens.ciris-services-1.ai/v1/status")]
        status_url: String,

        /// Milliseconds between refreshes
        #[arg(long, default_value = "30000")]
        refresh_interval_ms: u64,

        /// Initial brightness (0.0 to 1.0)
        #[arg(long, default_value = "0.5")]
        brightness: f32,

        /// Seconds to wait for network bring-up at startup
        #[arg(long, default_value = "30")]
        network_timeout_s: u64,
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let panel = GridConfig::default();

    tracing::info!("Fleet status display v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Panel: {}x{} = {} LEDs",
        panel.cols,
        panel.rows,
        panel.pixel_count()
    );

    let fetcher = Fetcher::new(Endpoints {
        billing_us: args.billing_us_url,
        billing_eu: args.billing_eu_url,
        proxy_us: args.proxy_us_url,
        proxy_eu: args.proxy_eu_url,
        lens: args.lens_url,
        lens_token: args.lens_token,
        status_url: args.status_url,
    });

    let palette = Palette::default();
    let mut store = StatusStore::new();
    let running = setup_signal_handler();
    let refresh_interval = Duration::from_millis(args.refresh_interval_ms);
    let network_timeout = Duration::from_secs(args.network_timeout_s);

    let mut surface = match MatrixSurface::new(panel, args.brightness) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to initialize LED matrix: {e}");
            std::process::exit(1);
        }
    };
    let mut input = NoInput;

    grid::startup_animation(&mut surface, &palette).await;

    match args.mode {
        Mode::Grid => {
            // Grid mode needs the network before the loop starts.
            if !fetcher.wait_for_network(network_timeout).await {
                grid::error_pattern(&mut surface, &palette);
                std::process::exit(1);
            }

            let map = MetricMap::build();
            let mut source = GridSource(&fetcher);
            scheduler::run_grid(
                &mut source,
                &map,
                &mut store,
                &palette,
                &mut surface,
                &mut input,
                refresh_interval,
                &running,
            )
            .await;
        }
        Mode::Bubbles => {
            // Bubble mode starts regardless; an unreachable network just
            // means an all-unknown field until a fetch succeeds.
            if !fetcher.wait_for_network(network_timeout).await {
                tracing::warn!("starting degraded: status endpoint unreachable");
            }

            let mut field = bubbles::BubbleField::new(panel);
            let mut source = OverviewSource(&fetcher);
            scheduler::run_bubbles(
                &mut source,
                &mut field,
                &mut store,
                &mut surface,
                &mut input,
                refresh_interval,
                &running,
            )
            .await;
        }
    }

    tracing::info!("Shutting down cleanly");
}
