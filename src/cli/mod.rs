use crate::config::GiverConfig;
use crate::giver::{GiverContract, MineParams, mine_parallel};
use crate::protocol::Contract;
use crate::tvm::{Address, Cell, boc_to_base64, deserialize_boc};
use crate::utils::unix_now;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use num_bigint::BigUint;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// nft-giver CLI
#[derive(Parser, Debug)]
#[command(name = "nft-giver")]
#[command(about = "Proof-of-work NFT collection tools", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Collection deployment inputs shared by several commands
#[derive(clap::Args, Debug)]
pub struct DeployArgs {
    /// Collection config (JSON)
    #[arg(short = 'c', long)]
    pub config: PathBuf,
    /// Compiled collection code (BoC file)
    #[arg(long)]
    pub code: PathBuf,
    /// Compiled item code (BoC file)
    #[arg(long)]
    pub item_code: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every text form of an address
    Address {
        /// Raw (`wc:hex`) or user-friendly address
        address: String,
    },
    /// Print the address the collection deploys to
    GiverAddress {
        #[command(flatten)]
        deploy: DeployArgs,
    },
    /// Print the address of the item with the given index
    ItemAddress {
        #[command(flatten)]
        deploy: DeployArgs,
        /// Item index
        #[arg(short = 'i', long)]
        index: u64,
    },
    /// Search for a mine message against the configured threshold
    Mine {
        #[command(flatten)]
        deploy: DeployArgs,
        /// Recipient of the minted item
        #[arg(short = 'm', long)]
        mint_to: String,
        /// Number of hashing workers
        #[arg(short = 'w', long, default_value = "4")]
        workers: usize,
        /// Message lifetime in seconds
        #[arg(long, default_value = "600")]
        expire_in: u32,
        /// Attempts per worker before giving up
        #[arg(long, default_value = "100000000")]
        attempts: u64,
    },
}

fn read_code(path: &Path) -> Result<Arc<Cell>> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    deserialize_boc(&bytes).with_context(|| format!("failed to parse BoC {}", path.display()))
}

impl DeployArgs {
    fn load(&self) -> Result<GiverContract> {
        let config = GiverConfig::from_file(&self.config)?;
        let code = read_code(&self.code)?;
        let item_code = read_code(&self.item_code)?;
        let storage = config.to_storage(item_code)?;
        Ok(GiverContract::deploy(code, storage, config.workchain)?)
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Address { address } => self.execute_address(address),
            Commands::GiverAddress { deploy } => {
                let giver = deploy.load()?;
                log::info!("Collection address: {}", giver.address());
                log::info!("Raw: {}", giver.address().to_hex());
                Ok(())
            }
            Commands::ItemAddress { deploy, index } => {
                let giver = deploy.load()?;
                let address = giver.nft_address_by_index(*index)?;
                log::info!("Item #{} address: {}", index, address);
                log::info!("Raw: {}", address.to_hex());
                Ok(())
            }
            Commands::Mine {
                deploy,
                mint_to,
                workers,
                expire_in,
                attempts,
            } => {
                self.execute_mine(deploy, mint_to, *workers, *expire_in, *attempts)
                    .await
            }
        }
    }

    fn execute_address(&self, address: &str) -> Result<()> {
        let address = Address::from_str(address)?;
        log::info!("Raw: {}", address.to_hex());
        log::info!("Bounceable: {}", address.to_friendly_with(true, true, false));
        log::info!("Non-bounceable: {}", address.to_friendly_with(true, false, false));
        log::info!("Testnet bounceable: {}", address.to_friendly_with(true, true, true));
        log::info!("Testnet non-bounceable: {}", address.to_friendly_with(true, false, true));
        Ok(())
    }

    async fn execute_mine(
        &self,
        deploy: &DeployArgs,
        mint_to: &str,
        workers: usize,
        expire_in: u32,
        attempts: u64,
    ) -> Result<()> {
        let giver = deploy.load()?;
        let mining = giver.mining_data();
        let template = MineParams {
            expire: unix_now().saturating_add(expire_in),
            mint_to: Address::from_str(mint_to)?,
            data1: BigUint::from(rand::thread_rng().r#gen::<u64>()),
            seed: mining.seed,
            data2: None,
        };

        let started = Instant::now();
        let solution =
            mine_parallel(template, mining.pow_complexity.clone(), workers, attempts).await?;
        match solution {
            Some(solution) => {
                log::info!("⏱️  Mining: {:.3}s", started.elapsed().as_secs_f64());
                log::info!("Send to {}", giver.address());
                log::info!("Body (base64 BoC): {}", boc_to_base64(&solution.body, true)?);
            }
            None => log::warn!("No solution found, try again with more attempts"),
        }
        Ok(())
    }
}
