use opentelemetry::{global, trace::TracerProvider, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{logs::SdkLoggerProvider, trace::SdkTracerProvider, Resource};
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// keeps the otlp providers alive, flushing them when dropped.
#[derive(Default)]
pub struct TelemetryGuard {
    providers: Option<(SdkTracerProvider, SdkLoggerProvider)>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some((tracer_provider, log_provider)) = self.providers.take() {
            if let Err(e) = tracer_provider.shutdown() {
                eprintln!("failed to flush traces: {e}");
            }
            if let Err(e) = log_provider.shutdown() {
                eprintln!("failed to flush logs: {e}");
            }
        }
    }
}

fn init_providers(
    otlp_endpoint: &str,
) -> Result<(SdkTracerProvider, SdkLoggerProvider), Box<dyn std::error::Error + Send + Sync>> {
    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "quotebox".to_string());

    let service_version =
        env::var("OTEL_SERVICE_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    let resource = Resource::builder()
        .with_service_name(service_name)
        .with_attribute(KeyValue::new("service.version", service_version))
        .build();

    let span_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_endpoint)
        .build()?;

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(otlp_endpoint)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_resource(resource.clone())
        .with_batch_exporter(span_exporter)
        .build();

    let log_provider = SdkLoggerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(log_exporter)
        .build();

    Ok((tracer_provider, log_provider))
}

/// installs the global subscriber. logs go to stderr so command output stays clean,
/// and are also exported over otlp when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
pub fn init_telemetry() -> Result<TelemetryGuard, Box<dyn std::error::Error + Send + Sync>> {
    let providers = match env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) if !endpoint.is_empty() => Some(init_providers(&endpoint)?),
        _ => None,
    };

    let (tracer_layer, logger_layer) = match &providers {
        Some((tracer_provider, log_provider)) => {
            global::set_tracer_provider(tracer_provider.clone());

            let tracer = tracer_provider.tracer("quotebox");
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(OpenTelemetryTracingBridge::new(log_provider)),
            )
        }
        None => (None, None),
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracer_layer)
        .with(logger_layer)
        .try_init()?;

    if providers.is_some() {
        tracing::info!("OpenTelemetry initialized successfully");
    }

    Ok(TelemetryGuard { providers })
}
