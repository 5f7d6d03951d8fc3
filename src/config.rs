use crate::notify::DEFAULT_EXPLORER_URL;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_url: String,
    pub token_address: Address,
    pub vault_address: Option<Address>,
    pub private_key: Option<String>,
    pub token_decimals: u8,
    pub share_decimals: u8,
    pub explorer_url: String,
    pub balance_poll_interval: Duration,
    pub confirmation_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let json_rpc_url = var("JSON_RPC_URL").context("JSON_RPC_URL must be set in .env")?;

        let token_address_str =
            var("TOKEN_ADDRESS").context("TOKEN_ADDRESS must be set in .env")?;
        let token_address = Address::from_str(token_address_str.trim())
            .context("Invalid TOKEN_ADDRESS format")?;

        let vault_address = var("VAULT_ADDRESS")
            .map(|value| Address::from_str(value.trim()))
            .transpose()
            .context("Invalid VAULT_ADDRESS format")?;

        let private_key = var("PRIVATE_KEY");

        let token_decimals = parse_or("TOKEN_DECIMALS", var("TOKEN_DECIMALS"), 6u8)?;
        let share_decimals = parse_or("SHARE_DECIMALS", var("SHARE_DECIMALS"), 6u8)?;

        let explorer_url = var("EXPLORER_URL").unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string());

        let poll_ms = parse_or(
            "BALANCE_POLL_INTERVAL_MS",
            var("BALANCE_POLL_INTERVAL_MS"),
            1000u64,
        )?;
        if poll_ms == 0 {
            anyhow::bail!("BALANCE_POLL_INTERVAL_MS must be greater than 0");
        }

        let timeout_secs = parse_or(
            "CONFIRMATION_TIMEOUT_SECS",
            var("CONFIRMATION_TIMEOUT_SECS"),
            120u64,
        )?;

        Ok(Config {
            json_rpc_url,
            token_address,
            vault_address,
            private_key,
            token_decimals,
            share_decimals,
            explorer_url,
            balance_poll_interval: Duration::from_millis(poll_ms),
            confirmation_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {} value: {}", key, value)),
        None => Ok(default),
    }
}
