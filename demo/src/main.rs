//! Collateral client walkthrough
//!
//! Submits one asset against an in-process store, reveals it, approves it and
//! reveals the adjusted value.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run -p collateral-demo -- --value 250 --game "Dragon Realm"
//!
//! # With a config file and environment overrides
//! COLLATERAL_CHAIN_ID=11155111 cargo run -p collateral-demo -- --config client.json
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use collateral_assets_primitives::AssetStatus;
use collateral_client::{
    ClientConfig, LocalSigner, MemoryStore, Registry, Session, Submission,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "GameFi collateral client demo")]
struct Args {
    /// JSON client config; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 250.0)]
    value: f64,
    #[arg(long, default_value = "Dragon Realm")]
    game: String,
    #[arg(long, default_value = "Weapon")]
    asset_type: String,
    #[arg(long, default_value = "0x5A1e0000000000000000000000000000000000A1")]
    owner: String,
    /// Store contract address shown in the reveal challenge.
    #[arg(long, default_value = "0xC011a7e2a1000000000000000000000000000001")]
    store: String,
    /// Reject the asset instead of approving it.
    #[arg(long)]
    reject: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    }
    .with_env_overrides()?;
    info!(?config, "starting collateral demo");

    let registry = Arc::new(Registry::new(MemoryStore::new(args.store.clone()), &config));
    let mut session = Session::new(registry.clone(), &config);
    session.connect(LocalSigner::new(args.owner.clone()));

    let asset = session
        .submit(Submission::new(args.game, args.asset_type, args.value))
        .await?;
    info!(id = %asset.id, token = %asset.encoded_value, "submitted");

    match session.reveal(&asset).await? {
        Some(value) => info!(id = %asset.id, value, "revealed before review"),
        None => warn!(id = %asset.id, "wallet declined to sign"),
    }

    let reviewed = if args.reject {
        session.reject(&asset.id).await?
    } else {
        session.approve(&asset.id).await?
    };
    info!(id = %reviewed.id, status = %reviewed.status, token = %reviewed.encoded_value, "reviewed");

    let value = session
        .reveal(&reviewed)
        .await?
        .context("wallet declined to sign")?;
    info!(id = %reviewed.id, value, "revealed after review");

    let stats = registry.stats().await;
    info!(
        total = stats.total,
        pending = stats.pending,
        approved = stats.approved,
        rejected = stats.rejected,
        "registry"
    );
    for asset in registry.assets().await {
        let marker = match asset.status {
            AssetStatus::Pending => "…",
            AssetStatus::Approved => "✓",
            AssetStatus::Rejected => "✗",
        };
        println!(
            "{marker} {} {} / {} ({})",
            asset.id, asset.game_name, asset.asset_type, asset.status
        );
    }
    Ok(())
}
