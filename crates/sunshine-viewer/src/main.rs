//! Sunshine - desktop entry point
//!
//! Runs the viewer in a native window, configured from a TOML file with
//! optional command-line overrides.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::main()
}

// The browser build starts from the library's wasm entry point
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use anyhow::{bail, Context, Result};
    use bevy::app::AppExit;
    use clap::Parser;
    use std::path::PathBuf;
    use sunshine_core::{load_config, LoopHandle};
    use tracing::info;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[derive(Parser, Debug)]
    #[command(name = "sunshine")]
    #[command(about = "Solar building viewer")]
    #[command(version)]
    struct Args {
        /// Path to configuration file
        #[arg(short, long, default_value = "sunshine.toml")]
        config: PathBuf,

        /// Model to load, overriding `model.url`
        #[arg(short, long)]
        model: Option<String>,

        /// Model scale, overriding `model.scale`
        #[arg(short, long)]
        scale: Option<String>,
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();

        let mut config = load_config(&args.config)
            .with_context(|| format!("Failed to load {}", args.config.display()))?;

        let overrides = [("model", args.model), ("scale", args.scale)]
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)));
        config.apply_query_pairs(overrides)?;

        // RUST_LOG takes precedence over the configured filter
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log.filter))
            .context("Invalid log filter")?;
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;

        info!(config = %args.config.display(), "Configuration loaded");

        match sunshine_viewer::run(config, LoopHandle::new(), None) {
            AppExit::Success => Ok(()),
            AppExit::Error(code) => bail!("Viewer exited with code {}", code),
        }
    }
}
