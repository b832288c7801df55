//! Log output and optional OTLP span export for the finance server.

use anyhow::{Context, Result, anyhow};
use base64ct::{Base64, Encoding};
use opentelemetry::{
    KeyValue, global, propagation::TextMapCompositePropagator, trace::TracerProvider as _,
};
use opentelemetry_otlp::{Compression, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::SdkTracerProvider,
};
use std::{env::var, str::FromStr, sync::OnceLock, time::Duration};
use tonic::{
    metadata::{
        AsciiMetadataKey, AsciiMetadataValue, BinaryMetadataKey, BinaryMetadataValue, MetadataMap,
    },
    transport::ClientTlsConfig,
};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt};
use ulid::Ulid;

const ENV_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const ENV_HEADERS: &str = "OTEL_EXPORTER_OTLP_HEADERS";
const ENV_INSTANCE_ID: &str = "OTEL_SERVICE_INSTANCE_ID";

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// How log lines are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(format: &str) -> Result<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(anyhow!(
                "unknown log format '{other}', expected pretty or json"
            )),
        }
    }
}

impl LogFormat {
    fn layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        match self {
            Self::Pretty => fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_target(false)
                .pretty()
                .boxed(),
            // One object per line with the enclosing request span attached.
            Self::Json => fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_target(false)
                .boxed(),
        }
    }
}

/// Where and how spans are shipped when an OTLP collector is configured.
#[derive(Debug)]
struct OtlpExport {
    endpoint: String,
    tls_domain: Option<String>,
    metadata: MetadataMap,
    instance_id: String,
}

impl OtlpExport {
    /// `Ok(None)` when no collector endpoint is configured.
    fn from_lookup<F>(lookup: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(endpoint) = lookup(ENV_ENDPOINT)
            .map(|endpoint| endpoint.trim().trim_end_matches('/').to_string())
            .filter(|endpoint| !endpoint.is_empty())
        else {
            return Ok(None);
        };

        let endpoint = with_scheme(endpoint);
        let tls_domain = endpoint
            .strip_prefix("https://")
            .and_then(|rest| rest.split(['/', ':']).next())
            .filter(|host| !host.is_empty())
            .map(str::to_string);

        let metadata = parse_metadata(&lookup(ENV_HEADERS).unwrap_or_default())
            .with_context(|| format!("Invalid {ENV_HEADERS}"))?;

        let instance_id = lookup(ENV_INSTANCE_ID)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Ulid::new().to_string());

        Ok(Some(Self {
            endpoint,
            tls_domain,
            metadata,
            instance_id,
        }))
    }

    fn install(self) -> Result<SdkTracerProvider> {
        let mut builder = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&self.endpoint)
            .with_compression(Compression::Gzip)
            .with_timeout(Duration::from_secs(3));

        if let Some(domain) = self.tls_domain {
            builder = builder
                .with_tls_config(ClientTlsConfig::new().domain_name(domain).with_native_roots());
        }

        if !self.metadata.is_empty() {
            builder = builder.with_metadata(self.metadata);
        }

        let exporter = builder
            .build()
            .with_context(|| format!("Failed to build OTLP exporter for {}", self.endpoint))?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(
                Resource::builder_empty()
                    .with_attributes(vec![
                        KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                        KeyValue::new("service.instance.id", self.instance_id),
                        KeyValue::new("vcs.revision", crate::GIT_COMMIT_HASH),
                    ])
                    .build(),
            )
            .build();

        // A second install keeps the first provider for shutdown.
        if TRACER_PROVIDER.set(provider.clone()).is_err() {
            debug!("tracer provider already installed");
        }

        global::set_tracer_provider(provider.clone());
        global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]));

        Ok(provider)
    }
}

// Collectors are reached over gRPC, which assumes TLS when no scheme is given.
fn with_scheme(endpoint: String) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint
    } else {
        format!("https://{endpoint}")
    }
}

/// Parse `key=value,key2=value2` into gRPC metadata.
///
/// Pairs without `=` or with an empty key are skipped. Keys ending in `-bin`
/// carry base64 values and become binary metadata.
fn parse_metadata(headers: &str) -> Result<MetadataMap> {
    let mut metadata = MetadataMap::new();

    for (key, value) in headers
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
    {
        if key.ends_with("-bin") {
            let bytes = Base64::decode_vec(value)
                .map_err(|e| anyhow!("header {key} is not valid base64: {e}"))?;
            let name = BinaryMetadataKey::from_bytes(key.as_bytes())
                .map_err(|e| anyhow!("invalid header name {key}: {e}"))?;
            metadata.insert_bin(name, BinaryMetadataValue::from_bytes(&bytes));
        } else {
            let name = AsciiMetadataKey::from_bytes(key.as_bytes())
                .map_err(|e| anyhow!("invalid header name {key}: {e}"))?;
            let value = value
                .parse::<AsciiMetadataValue>()
                .map_err(|e| anyhow!("invalid value for header {key}: {e}"))?;
            metadata.insert(name, value);
        }
    }

    Ok(metadata)
}

// `RUST_LOG` adds to the verbosity level; noisy dependencies stay quiet.
fn env_filter(level: Level) -> Result<EnvFilter> {
    Ok(EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("opentelemetry_sdk=warn".parse()?))
}

/// Install the global subscriber.
///
/// Spans are also exported when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// # Errors
///
/// Returns an error if the OTLP settings are invalid or a subscriber is already installed
pub fn init(verbosity_level: Option<Level>, format: LogFormat) -> Result<()> {
    let filter = env_filter(verbosity_level.unwrap_or(Level::ERROR))?;

    let otel_layer = match OtlpExport::from_lookup(|key| var(key).ok())? {
        Some(export) => {
            let provider = export.install()?;
            let tracer = provider.tracer(env!("CARGO_PKG_NAME"));
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    let subscriber = Registry::default()
        .with(format.layer())
        .with(otel_layer)
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Flush pending spans. Does nothing when no exporter was installed.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        debug!("shutting down tracer provider");
        if let Err(err) = provider.shutdown() {
            debug!("tracer provider shutdown failed: {err}");
        }
    }
}
