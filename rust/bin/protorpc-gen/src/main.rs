use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use protorpc_codegen::{CodeGeneratorRequest, GeneratorConfig, Variant};

mod output;

#[derive(Parser)]
#[command(name = "protorpc-gen")]
#[command(about = "Generate RPC and HTTP service stubs from a descriptor set")]
struct Args {
    /// Plugin request (JSON). Reads stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// TOML generator config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Variant to generate (rpc, message, http, proxy)
    #[arg(short, long)]
    variant: Option<Variant>,

    /// Write generated files under this directory instead of printing the
    /// JSON response
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Print generated files to stdout instead of the JSON response
    #[arg(long, conflicts_with = "out_dir")]
    print: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request from stdin")?;
            buf
        }
    };
    let mut request = CodeGeneratorRequest::from_json(&raw).context("invalid plugin request")?;
    debug!(
        files = request.file_to_generate.len(),
        descriptors = request.proto_file.len(),
        "read request"
    );

    let config = load_config(&args, &mut request)?;
    info!(variant = %config.variant, runtime = %config.runtime(), "generating");

    let response = protorpc_codegen::generate(&request, &config);

    if let Some(err) = &response.error {
        if args.out_dir.is_none() && !args.print {
            output::print_response(&response)?;
        }
        bail!("generation failed: {}", err);
    }

    match &args.out_dir {
        Some(dir) => output::write_files(dir, &response.file)?,
        None if args.print => output::print_files(&response.file)?,
        None => output::print_response(&response)?,
    }
    Ok(())
}

/// Defaults, then `--config`, then the request's parameter, then flags.
fn load_config(args: &Args, request: &mut CodeGeneratorRequest) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            GeneratorConfig::from_toml(&content)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(parameter) = request.parameter.take() {
        config
            .apply_parameter(&parameter)
            .with_context(|| format!("invalid parameter '{}'", parameter))?;
    }

    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    Ok(config)
}
