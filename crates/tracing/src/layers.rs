use std::path::PathBuf;

use tracing_subscriber::{filter::Directive, EnvFilter, Layer, Registry};

use crate::formatter::LogFormat;

/// Keeps the non-blocking file writer flushing. Dropping it stops file logging.
pub type FileWorkerGuard = tracing_appender::non_blocking::WorkerGuard;

pub(crate) type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Where rolling log files are written.
#[derive(Debug, Clone)]
pub struct FileInfo {
    dir: PathBuf,
    file_name: String,
}

impl FileInfo {
    /// Creates a new [FileInfo]. Files roll daily and are suffixed with the date.
    pub fn new(dir: PathBuf, file_name: impl Into<String>) -> Self {
        Self { dir, file_name: file_name.into() }
    }
}

/// The set of layers that will be installed on the registry.
pub(crate) struct Layers {
    inner: Vec<BoxedLayer<Registry>>,
}

impl Layers {
    pub(crate) fn new() -> Self {
        Self { inner: vec![] }
    }

    pub(crate) fn into_inner(self) -> Vec<BoxedLayer<Registry>> {
        self.inner
    }

    pub(crate) fn stdout(
        &mut self,
        format: LogFormat,
        default_directive: Directive,
        filters: &str,
        color: Option<String>,
    ) -> eyre::Result<()> {
        let filter = build_env_filter(Some(default_directive), filters)?;
        let layer = format.apply(filter, color, None);
        self.inner.push(layer);
        Ok(())
    }

    pub(crate) fn journald(&mut self, filter: &str) -> eyre::Result<()> {
        let journald_filter = build_env_filter(None, filter)?;
        let layer = tracing_journald::layer()?.with_filter(journald_filter).boxed();
        self.inner.push(layer);
        Ok(())
    }

    pub(crate) fn file(
        &mut self,
        format: LogFormat,
        filter: &str,
        file_info: FileInfo,
    ) -> eyre::Result<FileWorkerGuard> {
        std::fs::create_dir_all(&file_info.dir)?;
        let appender = tracing_appender::rolling::daily(&file_info.dir, &file_info.file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let file_filter = build_env_filter(None, filter)?;
        let layer = format.apply(file_filter, None, Some(writer));
        self.inner.push(layer);
        Ok(guard)
    }
}

fn build_env_filter(
    default_directive: Option<Directive>,
    directives: &str,
) -> eyre::Result<EnvFilter> {
    let env_filter = match default_directive {
        Some(directive) => EnvFilter::builder().with_default_directive(directive).from_env_lossy(),
        None => EnvFilter::builder().from_env_lossy(),
    };

    directives
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .try_fold(env_filter, |env_filter, directive| {
            Ok(env_filter.add_directive(directive.parse::<Directive>()?))
        })
}
