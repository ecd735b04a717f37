//! Tracing setup for ledgervm binaries and tests.
//!
//! A [`LedgerTracer`] is assembled from layer descriptions (stdout, an optional rolling log
//! file, an optional journald sink) and installed as the global subscriber with
//! [`Tracer::init`]. Tests use [`init_test_tracing`], which writes through the libtest capture.
// Layer plumbing follows [reth](https://github.com/paradigmxyz/reth)

pub use tracing_subscriber;

mod formatter;
mod layers;

pub use formatter::LogFormat;
pub use layers::{FileInfo, FileWorkerGuard};

use layers::Layers;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Directive, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Describes how a single layer formats and filters its output.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    format: LogFormat,
    default_directive: String,
    filters: String,
    color: Option<String>,
}

impl LayerInfo {
    /// Creates a new [LayerInfo].
    ///
    /// `default_directive` applies when `RUST_LOG` is unset, `filters` is a comma separated
    /// list of extra directives, and `color` is one of `always`, `auto` or `never`.
    pub fn new(
        format: LogFormat,
        default_directive: String,
        filters: String,
        color: Option<String>,
    ) -> Self {
        Self { format, default_directive, filters, color }
    }
}

impl Default for LayerInfo {
    fn default() -> Self {
        Self {
            format: LogFormat::Terminal,
            default_directive: LevelFilter::INFO.to_string(),
            filters: String::new(),
            color: Some("always".to_string()),
        }
    }
}

/// Installs a configured tracing subscriber.
pub trait Tracer {
    /// Initializes the global subscriber. The returned guard, if any, must be held for as long
    /// as file logging should keep flushing.
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>>;
}

/// The tracer used by the `ledgervm` binary.
#[derive(Debug, Clone, Default)]
pub struct LedgerTracer {
    stdout: LayerInfo,
    journald: Option<String>,
    file: Option<(LayerInfo, FileInfo)>,
}

impl LedgerTracer {
    /// Creates a tracer with the default stdout layer and no other sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stdout layer configuration.
    pub fn with_stdout(mut self, config: LayerInfo) -> Self {
        self.stdout = config;
        self
    }

    /// Enables journald output with the given filter.
    pub fn with_journald(mut self, filter: String) -> Self {
        self.journald = Some(filter);
        self
    }

    /// Enables rolling file output.
    pub fn with_file(mut self, config: LayerInfo, file: FileInfo) -> Self {
        self.file = Some((config, file));
        self
    }
}

impl Tracer for LedgerTracer {
    fn init(self) -> eyre::Result<Option<FileWorkerGuard>> {
        let mut layers = Layers::new();

        layers.stdout(
            self.stdout.format,
            self.stdout.default_directive.parse::<Directive>()?,
            &self.stdout.filters,
            self.stdout.color,
        )?;

        if let Some(filter) = self.journald {
            layers.journald(&filter)?;
        }

        let guard = match self.file {
            Some((config, file)) => Some(layers.file(config.format, &config.filters, file)?),
            None => None,
        };

        // a subscriber may already be installed, e.g. by a test harness
        let _ = tracing_subscriber::registry().with(layers.into_inner()).try_init();

        Ok(guard)
    }
}

/// Installs a subscriber that routes events through the test output capture. Safe to call from
/// every test; only the first call has any effect.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
        )
        .with_test_writer()
        .try_init();
}
