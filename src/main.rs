//! distributor CLI - build Merkle distributions from the command line
//!
//! Reads balance or metadata files, writes claim mappings, replays transfer
//! logs into balance snapshots, and checks claims against a published root.
//! Every command prints a JSON result on stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use merkle_distributor::logging::{self, LogLevel};
use merkle_distributor::paths::expand_path;
use merkle_distributor::{
    input, snapshot_balances, Address, ClaimFile, Distribution, DistributionConfig,
    EncodingPolicy, JsonLogSource,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "distributor")]
#[command(about = "Merkle distribution trees and claim proofs for airdrops")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json", global = true)]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Distribution config file (defaults to the user config dir if present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a token distribution from a JSON file of address to balance
    Build {
        /// JSON file of addresses to balances in wei
        #[arg(short, long)]
        balances: String,
        /// Where to write the claim mapping
        #[arg(short, long, default_value = "output/addr-to-claim.json")]
        output: String,
    },

    /// Build an NFT distribution from a JSON file of token id to metadata
    BuildNft {
        /// JSON file of token ids to metadata words
        #[arg(short, long)]
        metadata: String,
        /// Hex bytes placed before every leaf (at least one byte)
        #[arg(short, long)]
        prefix: String,
        /// Where to write the claim mapping
        #[arg(short, long, default_value = "output/id-to-claim.json")]
        output: String,
    },

    /// Replay Transfer logs into balances and total supply
    Snapshot {
        /// JSON array of logs as returned by eth_getLogs
        #[arg(short, long)]
        logs: String,
        /// Token contract address
        #[arg(short, long)]
        token: String,
        /// First block to replay
        #[arg(long)]
        start: u64,
        /// Last block to replay (inclusive)
        #[arg(long)]
        end: u64,
        /// Where to write balances and supply
        #[arg(short, long, default_value = "output/saved-balances-and-supply.json")]
        output: String,
    },

    /// Check one claim in a claim mapping against its root
    Verify {
        /// Claim mapping written by build or build-nft
        #[arg(long)]
        claims: String,
        /// Address or token id of the claim to check
        #[arg(short, long)]
        identity: String,
        /// NFT leaf prefix the claims were built with
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Show the effective distribution config
    Config {
        /// Also write it to this path
        #[arg(short, long)]
        write: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(LogLevel::from_verbosity(cli.verbose));

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Build { balances, output } => {
            let input_path = expand(&balances)?;
            let records = input::load_balances(&input_path)
                .with_context(|| format!("Could not read balances from {}", input_path.display()))?;
            let dist = Distribution::assemble(records, &config)
                .context("Could not create distribution tree")?;
            write_distribution(&cli.format, &dist, &expand(&output)?)?;
        }

        Commands::BuildNft {
            metadata,
            prefix,
            output,
        } => {
            let config = with_prefix(config, &prefix)?;
            let input_path = expand(&metadata)?;
            let records = input::load_metadata(&input_path)
                .with_context(|| format!("Could not read metadata from {}", input_path.display()))?;
            let dist = Distribution::assemble(records, &config)
                .context("Could not create distribution tree")?;
            write_distribution(&cli.format, &dist, &expand(&output)?)?;
        }

        Commands::Snapshot {
            logs,
            token,
            start,
            end,
            output,
        } => {
            let token = Address::parse(&token)?;
            let source = JsonLogSource::load(&expand(&logs)?).context("Could not read logs")?;
            let snapshot = snapshot_balances(&source, start, end, &token)?;
            let output_path = expand(&output)?;
            snapshot
                .write(&output_path)
                .with_context(|| format!("Could not write {}", output_path.display()))?;
            print_output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "holders": snapshot.balances.len(),
                    "totalSupply": snapshot.total_supply.to_string(),
                    "output": output_path.display().to_string()
                }),
            )?;
        }

        Commands::Verify {
            claims,
            identity,
            prefix,
        } => {
            let config = match prefix {
                Some(prefix) => with_prefix(config, &prefix)?,
                None => config,
            };
            let file = ClaimFile::load(&expand(&claims)?).context("Could not read claims")?;
            let key = claim_key(&file, &identity);
            let valid = file.verify_claim(&key, &config)?;
            print_output(
                &cli.format,
                &serde_json::json!({
                    "identity": key,
                    "root": file.root.to_hex(),
                    "valid": valid
                }),
            )?;
            if !valid {
                std::process::exit(1);
            }
        }

        Commands::Config { write } => {
            if let Some(path) = write {
                let path = expand(&path)?;
                config.save(&path)?;
                info!("Wrote config to {}", path.display());
            }
            print_output(&cli.format, &serde_json::to_value(&config)?)?;
        }
    }

    Ok(())
}

fn expand(path: &str) -> anyhow::Result<PathBuf> {
    expand_path(path).with_context(|| format!("Could not expand path: {}", path))
}

fn load_config(path: Option<&str>) -> anyhow::Result<DistributionConfig> {
    let path = path.map(expand).transpose()?;
    Ok(DistributionConfig::resolve(path.as_deref())?)
}

/// Switch `config` to prefixed NFT leaves
fn with_prefix(config: DistributionConfig, prefix: &str) -> anyhow::Result<DistributionConfig> {
    let prefix_bytes = hex::decode(prefix.trim_start_matches("0x"))
        .with_context(|| format!("Invalid prefix: {}", prefix))?;
    let encoding = EncodingPolicy::PrefixedIdMetadata {
        prefix: prefix_bytes,
    };
    encoding.validate()?;
    Ok(DistributionConfig { encoding, ..config })
}

/// Claim files key addresses by checksum; accept any casing on the command line
fn claim_key(file: &ClaimFile, identity: &str) -> String {
    let identity = identity.trim();
    if file.claims.contains_key(identity) {
        return identity.to_string();
    }
    match Address::parse(identity) {
        Ok(addr) => addr.to_checksum(),
        Err(_) => identity.to_string(),
    }
}

fn write_distribution(format: &OutputFormat, dist: &Distribution, path: &Path) -> anyhow::Result<()> {
    dist.write(path)
        .with_context(|| format!("Could not create file {}", path.display()))?;
    print_output(
        format,
        &serde_json::json!({
            "status": "ok",
            "root": dist.root().to_hex(),
            "claims": dist.len(),
            "total": dist.total().to_string(),
            "output": path.display().to_string()
        }),
    )
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
