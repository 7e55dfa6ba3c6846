//! Shared tracing setup for the uniform workspace.
//!
//! Binaries, benches and integration tests install their `tracing`
//! subscriber through this crate so every entry point filters and formats
//! events the same way.

use std::env;
pub use tracing::{debug, error, info, trace, warn};

use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Registry};

/// Selects a preset: `local` (default) or `ci`
pub const PROFILE_ENV: &str = "UNIFORM_TRACING_PROFILE";
/// Overrides the filter directives
pub const DIRECTIVES_ENV: &str = "UNIFORM_TRACING_DIRECTIVES";
/// Overrides the output format: `pretty`, `compact` or `json`
pub const FORMAT_ENV: &str = "UNIFORM_TRACING_FORMAT";

/// How the shared subscriber filters and formats events.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Filter directives (e.g. `uniform_core=debug,info`). When absent,
    /// `RUST_LOG` is tried and then [`TracingConfig::default_directive`].
    pub directives: Option<String>,
    /// Directive used when nothing else resolves to a filter.
    pub default_directive: String,
    /// Show event targets (module paths).
    pub include_targets: bool,
    /// ANSI colours. Always off for JSON.
    pub ansi: bool,
    /// Span lifecycle events to emit.
    pub span_events: FmtSpan,
    /// Formatter output.
    pub output: TracingOutput,
    /// Write through libtest's capture instead of stdout.
    pub test_writer: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_local()
    }
}

impl TracingConfig {
    /// Pretty, coloured output for a terminal.
    pub fn for_local() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: true,
            span_events: FmtSpan::NONE,
            output: TracingOutput::Pretty,
            test_writer: false,
        }
    }

    /// JSON lines without colour, for log collection.
    pub fn for_ci() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: false,
            span_events: FmtSpan::NONE,
            output: TracingOutput::Json,
            test_writer: false,
        }
    }

    /// Compact, captured output for `cargo test`; span closes carry
    /// timings so slow kernels show up in failing-test logs.
    pub fn for_tests() -> Self {
        Self {
            directives: None,
            default_directive: "warn".to_string(),
            include_targets: true,
            ansi: false,
            span_events: FmtSpan::CLOSE,
            output: TracingOutput::Compact,
            test_writer: true,
        }
    }

    /// Build a configuration from `UNIFORM_TRACING_*` variables.
    ///
    /// Unknown profiles fall back to `local`; unknown formats are ignored.
    pub fn from_env() -> Self {
        let profile = env::var(PROFILE_ENV)
            .unwrap_or_else(|_| "local".to_string())
            .to_ascii_lowercase();

        let mut config = match profile.as_str() {
            "ci" => Self::for_ci(),
            _ => Self::for_local(),
        };

        if let Ok(directives) = env::var(DIRECTIVES_ENV) {
            if !directives.trim().is_empty() {
                config.directives = Some(directives);
            }
        }

        if let Ok(format) = env::var(FORMAT_ENV) {
            if let Some(parsed) = TracingOutput::from_env_value(&format) {
                config.output = parsed;
                if matches!(config.output, TracingOutput::Json) {
                    config.ansi = false;
                }
            }
        }

        config
    }

    fn resolve_filter(&self) -> Result<EnvFilter, TracingSetupError> {
        if let Some(directives) = &self.directives {
            EnvFilter::try_new(directives).map_err(|err| TracingSetupError::InvalidFilter(err.to_string()))
        } else {
            match EnvFilter::try_from_default_env() {
                Ok(filter) => Ok(filter),
                Err(_) => Ok(EnvFilter::new(self.default_directive.clone())),
            }
        }
    }
}

/// Failures while installing the shared subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    /// The directive string could not be parsed.
    #[error("invalid tracing directive: {0}")]
    InvalidFilter(String),
    /// A global subscriber is usually already set.
    #[error("failed to install global tracing subscriber: {0}")]
    SubscriberInit(#[source] tracing_subscriber::util::TryInitError),
}

/// Build a subscriber from `config`.
pub fn build_subscriber(config: &TracingConfig) -> Result<impl Subscriber + Send + Sync, TracingSetupError> {
    let (filter, fmt_layer) = subscriber_layers(config)?;
    Ok(Registry::default().with(fmt_layer).with(filter))
}

/// Filter and formatting layers, for callers composing their own registry.
pub fn subscriber_layers(
    config: &TracingConfig,
) -> Result<(EnvFilter, Box<dyn Layer<Registry> + Send + Sync>), TracingSetupError> {
    let filter = config.resolve_filter()?;
    let span_events = config.span_events.clone();
    let include_targets = config.include_targets;
    let ansi = config.ansi;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (config.output.clone(), config.test_writer) {
        (TracingOutput::Compact, false) => Box::new(
            tracing_fmt::layer()
                .compact()
                .with_target(include_targets)
                .with_ansi(ansi)
                .with_span_events(span_events),
        ),
        (TracingOutput::Compact, true) => Box::new(
            tracing_fmt::layer()
                .compact()
                .with_target(include_targets)
                .with_ansi(ansi)
                .with_span_events(span_events)
                .with_test_writer(),
        ),
        (TracingOutput::Pretty, false) => Box::new(
            tracing_fmt::layer()
                .pretty()
                .with_target(include_targets)
                .with_ansi(ansi)
                .with_span_events(span_events),
        ),
        (TracingOutput::Pretty, true) => Box::new(
            tracing_fmt::layer()
                .pretty()
                .with_target(include_targets)
                .with_ansi(ansi)
                .with_span_events(span_events)
                .with_test_writer(),
        ),
        (TracingOutput::Json, false) => Box::new(
            tracing_fmt::layer()
                .json()
                .with_target(include_targets)
                .with_span_events(span_events)
                .with_ansi(false),
        ),
        (TracingOutput::Json, true) => Box::new(
            tracing_fmt::layer()
                .json()
                .with_target(include_targets)
                .with_span_events(span_events)
                .with_ansi(false)
                .with_test_writer(),
        ),
    };

    Ok((filter, layer))
}

/// Install the configured subscriber as the process-wide default.
pub fn init_global_tracing(config: &TracingConfig) -> Result<(), TracingSetupError> {
    build_subscriber(config)?
        .try_init()
        .map_err(TracingSetupError::SubscriberInit)
}

/// Install [`TracingConfig::for_tests`] once per test binary.
///
/// Later calls, and calls after another subscriber was installed, do nothing.
pub fn init_test_tracing() {
    let mut config = TracingConfig::for_tests();
    if let Ok(directives) = env::var(DIRECTIVES_ENV) {
        if !directives.trim().is_empty() {
            config.directives = Some(directives);
        }
    }
    let _ = init_global_tracing(&config);
}

/// Output format of the formatter layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TracingOutput {
    Compact,
    Pretty,
    Json,
}

impl TracingOutput {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}
