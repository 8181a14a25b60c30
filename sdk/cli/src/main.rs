use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fhevm::{
    methods, ClearEngine, Environment, ExecutionContext, ExecutionMode, FhevmParams, PublicKey,
};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fhevm-cli")]
#[command(about = "Inspect and exercise the fhEVM precompile dispatch table", long_about = None)]
struct Cli {
    /// JSON gas price table (defaults apply to missing fields)
    #[arg(long, env = "FHEVM_PARAMS_PATH")]
    params: Option<PathBuf>,

    /// FHE public key blob served by fhePubKey
    #[arg(long, env = "FHEVM_PKS_PATH")]
    pks: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every method with its signature and selector
    Selectors,
    /// Meter and run raw calls in order against one fresh context
    Call {
        #[arg(long, default_value = "commit")]
        mode: ExecutionMode,
        #[arg(long, default_value = "1")]
        depth: usize,
        #[arg(long, default_value = "30000000")]
        gas_limit: u64,
        /// Hex-encoded call data (selector followed by payload)
        #[arg(required = true)]
        calls: Vec<String>,
    },
}

fn load_params(path: Option<&PathBuf>) -> anyhow::Result<FhevmParams> {
    match path {
        Some(path) => FhevmParams::load_from_file(path)
            .with_context(|| format!("loading params from {}", path.display())),
        None => Ok(FhevmParams::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Selectors => {
            for method in methods() {
                println!("{:#010x}  {}", method.selector(), method.signature());
            }
        }
        Commands::Call {
            mode,
            depth,
            gas_limit,
            calls,
        } => {
            let params = Arc::new(load_params(cli.params.as_ref())?);
            let mut ctx = ExecutionContext::new(ClearEngine::new(), params, mode)
                .with_depth(depth)
                .with_gas_limit(gas_limit);
            if let Some(path) = cli.pks.as_ref() {
                let key = PublicKey::load_from_file(path)
                    .with_context(|| format!("loading public key from {}", path.display()))?;
                let stored = key.hash();
                ctx = ctx.with_public_key(Arc::new(key), Some(stored));
            }

            info!(%mode, depth, gas_limit, calls = calls.len(), "executing call sequence");
            for (index, call) in calls.iter().enumerate() {
                let input = hex::decode(call.trim_start_matches("0x"))
                    .with_context(|| format!("decoding call {call}"))?;
                let gas = fhevm::required_gas(&ctx, ctx.gas_limit(), &input);
                let line = match fhevm::run(&mut ctx, &input) {
                    Ok(output) => {
                        info!(index, gas, output_len = output.len(), "call executed");
                        json!({
                            "gas": gas,
                            "output": format!("0x{}", hex::encode(output)),
                        })
                    }
                    Err(err) => {
                        warn!(index, gas, %err, revert = err.is_revert(), "call failed");
                        json!({
                            "gas": gas,
                            "error": err.to_string(),
                            "revert": err.is_revert(),
                        })
                    }
                };
                println!("{line}");
            }
        }
    }
    Ok(())
}
