use std::path::Path;
use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{MetricExporter, SpanExporter};
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_opentelemetry::MetricsLayer;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Layer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const SERVICE_NAME: &str = "devopsdays-harvest";

/// Enables OTLP export when set
pub const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

const LOG_FILE: &str = "harvest.log";

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| Resource::builder().with_service_name(SERVICE_NAME).build())
        .clone()
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder().with_http().build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn init_metrics() -> anyhow::Result<SdkMeterProvider> {
    let exporter = MetricExporter::builder().with_http().build()?;

    Ok(SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing-subscriber and return the guard flushing OpenTelemetry on drop
///
/// Console output goes to stderr. `log_dir` adds a plain-text log file, and
/// OTLP export is only set up when `OTEL_EXPORTER_OTLP_ENDPOINT` is present.
pub fn init_tracing_subscriber(log_dir: Option<&Path>) -> anyhow::Result<OtelGuard> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::new(Rotation::NEVER, dir, LOG_FILE);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(env_filter()),
            )
        }
        None => None,
    };

    let (tracer_provider, meter_provider) = if std::env::var_os(OTLP_ENDPOINT_VAR).is_some() {
        (Some(init_traces()?), Some(init_metrics()?))
    } else {
        (None, None)
    };

    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME)));
    let metrics_layer = meter_provider
        .as_ref()
        .map(|provider| MetricsLayer::new(provider.clone()));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(metrics_layer)
        .with(otel_layer)
        .init();

    Ok(OtelGuard {
        tracer_provider,
        meter_provider,
    })
}

pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.tracer_provider.take() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
        if let Some(meter_provider) = self.meter_provider.take() {
            if let Err(err) = meter_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
