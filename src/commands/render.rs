//! Render command handler

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use vlmweave::cli::{OutputFormat, RenderArgs};
use vlmweave::config::{env, Config};
use vlmweave::provider::build_provider;
use vlmweave::{AnalysisSession, ContainerParser, EventSink, PlainTextWriter, WorkerPool, XhtmlWriter};

/// Apply render flags on top of the loaded configuration.
fn apply_args(config: &mut Config, args: &RenderArgs) {
    if let Some(kind) = args.provider {
        config.provider.kind = kind;
    }
    if let Some(model) = &args.model {
        config.provider.model = Some(model.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config.provider.endpoint = Some(endpoint.clone());
    }
    if let Some(threads) = args.threads {
        config.pool.threads = Some(threads);
    }
    if let Some(timeout) = args.timeout {
        config.injection.reference_timeout_secs = timeout;
    }
    if let Some(drain) = args.drain_timeout {
        config.injection.drain_timeout_secs = drain;
    }
    if args.no_inline {
        config.injection.inline = false;
    }
}

/// Render a document, writing output to stdout or `--output` and the
/// session summary to stderr.
#[cfg(not(tarpaulin_include))]
pub fn handle(args: &RenderArgs) -> Result<()> {
    if !args.file.is_file() {
        bail!("File not found: {}", args.file.display());
    }

    let mut config = Config::load()?;
    env::apply_process_env(&mut config);
    apply_args(&mut config, args);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid options: {}", e))?;

    let pool = Arc::new(
        WorkerPool::new(&config.worker_config()).context("Failed to start worker pool")?,
    );
    let provider = build_provider(&config.provider_settings())
        .context("Failed to create analysis provider")?;
    info!(
        provider = provider.name(),
        model = provider.model().unwrap_or("unknown"),
        workers = pool.size(),
        "starting render"
    );
    let session = AnalysisSession::new(pool, provider, config.session_options());
    let parser = ContainerParser::new(config.parser_options());

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut sink: Box<dyn EventSink> = match args.format {
        OutputFormat::Xhtml => Box::new(XhtmlWriter::new(out)),
        OutputFormat::Text => Box::new(PlainTextWriter::new(out)),
    };
    parser
        .parse(&args.file, &session, sink.as_mut())
        .with_context(|| format!("Failed to render {}", args.file.display()))?;

    eprintln!("{}", session.summary());
    Ok(())
}
