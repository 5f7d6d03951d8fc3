use crate::actions::{Action, DepositReceipt};
use crate::amount::TokenAmount;
use crate::chain::TransactionOutcome;
use alloy_primitives::Address;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// Snapshot of the connected account's position.
#[derive(Debug, Clone, Serialize)]
pub struct AccountStatus {
    pub account: Option<Address>,
    pub token: Address,
    pub vault: Option<Address>,
    pub token_balance: Option<TokenAmount>,
    pub share_balance: Option<TokenAmount>,
    pub allowance: TokenAmount,
    pub token_decimals: u8,
    pub share_decimals: u8,
}

pub fn format_status(status: &AccountStatus, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_status_table(status),
        OutputFormat::Json => format_status_json(status),
    }
}

fn format_status_table(status: &AccountStatus) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Field", "Value", "Raw"]);

    table.add_row(vec![
        Cell::new("Account"),
        Cell::new(format_address(status.account)),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Token"),
        Cell::new(format!("{:#}", status.token)),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Vault"),
        Cell::new(
            status
                .vault
                .map(|vault| format!("{vault:#}"))
                .unwrap_or_else(|| "not configured".to_string()),
        ),
        Cell::new(""),
    ]);
    table.add_row(balance_row(
        "Your Balance",
        status.token_balance,
        status.token_decimals,
    ));
    table.add_row(balance_row(
        "Your Shares",
        status.share_balance,
        status.share_decimals,
    ));
    table.add_row(vec![
        Cell::new("Allowance"),
        Cell::new(format_allowance(status.allowance, status.token_decimals)),
        Cell::new(status.allowance.to_string()),
    ]);

    table.to_string()
}

fn balance_row(label: &str, balance: Option<TokenAmount>, decimals: u8) -> Vec<Cell> {
    match balance {
        Some(balance) => vec![
            Cell::new(label),
            Cell::new(balance.format_display(decimals)),
            Cell::new(balance.to_string()),
        ],
        None => vec![Cell::new(label), Cell::new("unknown"), Cell::new("")],
    }
}

fn format_status_json(status: &AccountStatus) -> String {
    let value = json!({
        "account": status.account.map(|a| format!("{a:?}")),
        "token": format!("{:?}", status.token),
        "vault": status.vault.map(|v| format!("{v:?}")),
        "token_balance": status.token_balance.map(|b| b.format(status.token_decimals)),
        "token_balance_raw": status.token_balance.map(|b| b.to_string()),
        "share_balance": status.share_balance.map(|b| b.format(status.share_decimals)),
        "share_balance_raw": status.share_balance.map(|b| b.to_string()),
        "allowance": format_allowance(status.allowance, status.token_decimals),
        "allowance_raw": status.allowance.to_string(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_outcome(
    action: Action,
    outcome: &TransactionOutcome,
    explorer_url: &str,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Action", "Status", "Block", "Tx Hash", "Explorer"]);
            add_outcome_row(&mut table, action, outcome, explorer_url);
            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&outcome_json(action, outcome, explorer_url))
            .unwrap_or_else(|_| "{}".to_string()),
    }
}

pub fn format_deposit_receipt(
    receipt: &DepositReceipt,
    explorer_url: &str,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Action", "Status", "Block", "Tx Hash", "Explorer"]);
            if let Some(approval) = &receipt.approval {
                add_outcome_row(&mut table, Action::Approve, approval, explorer_url);
            }
            add_outcome_row(&mut table, Action::Deposit, &receipt.deposit, explorer_url);
            table.to_string()
        }
        OutputFormat::Json => {
            let value = json!({
                "approval": receipt
                    .approval
                    .as_ref()
                    .map(|approval| outcome_json(Action::Approve, approval, explorer_url)),
                "deposit": outcome_json(Action::Deposit, &receipt.deposit, explorer_url),
            });
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

fn add_outcome_row(
    table: &mut Table,
    action: Action,
    outcome: &TransactionOutcome,
    explorer_url: &str,
) {
    table.add_row(vec![
        Cell::new(action),
        Cell::new(format!("{:?}", outcome.status)),
        Cell::new(
            outcome
                .block_number
                .map(|b| b.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        Cell::new(format_tx_hash(&format!("{:?}", outcome.hash))),
        Cell::new(tx_url(explorer_url, outcome)),
    ]);
}

fn outcome_json(
    action: Action,
    outcome: &TransactionOutcome,
    explorer_url: &str,
) -> serde_json::Value {
    json!({
        "action": action,
        "status": outcome.status,
        "block_number": outcome.block_number,
        "transaction_hash": format!("{:?}", outcome.hash),
        "explorer": tx_url(explorer_url, outcome),
    })
}

fn tx_url(explorer_url: &str, outcome: &TransactionOutcome) -> String {
    crate::notify::Explorer::new(explorer_url).tx_url(&outcome.hash)
}

fn format_address(address: Option<Address>) -> String {
    address
        .map(|a| format!("{a:#}"))
        .unwrap_or_else(|| "not connected".to_string())
}

fn format_allowance(allowance: TokenAmount, decimals: u8) -> String {
    if allowance == TokenAmount::MAX {
        "unlimited".to_string()
    } else {
        allowance.format(decimals)
    }
}

fn format_tx_hash(hash: &str) -> String {
    if hash.len() > 10 {
        format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
    } else {
        hash.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ConfirmationStatus;
    use alloy_primitives::TxHash;

    fn status() -> AccountStatus {
        AccountStatus {
            account: Some(Address::repeat_byte(0xaa)),
            token: Address::repeat_byte(0x10),
            vault: None,
            token_balance: Some(TokenAmount::from(9_900_000u64)),
            share_balance: None,
            allowance: TokenAmount::MAX,
            token_decimals: 6,
            share_decimals: 6,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("csv"), OutputFormat::Table);
    }

    #[test]
    fn test_status_table() {
        let output = format_status(&status(), OutputFormat::Table);
        assert!(output.contains("9.90"));
        assert!(output.contains("not configured"));
        assert!(output.contains("unknown"));
        assert!(output.contains("unlimited"));
    }

    #[test]
    fn test_status_json() {
        let output = format_status(&status(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["token_balance"], "9.900000");
        assert_eq!(value["token_balance_raw"], "9900000");
        assert_eq!(value["vault"], serde_json::Value::Null);
        assert_eq!(value["allowance"], "unlimited");
    }

    #[test]
    fn test_outcome_json() {
        let outcome = TransactionOutcome {
            hash: TxHash::repeat_byte(0x01),
            status: ConfirmationStatus::Success,
            block_number: Some(42),
        };
        let output = format_outcome(
            Action::Mint,
            &outcome,
            "https://sepolia.basescan.org",
            OutputFormat::Json,
        );
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["action"], "mint");
        assert_eq!(value["status"], "success");
        assert_eq!(value["block_number"], 42);
        assert!(
            value["explorer"]
                .as_str()
                .unwrap()
                .starts_with("https://sepolia.basescan.org/tx/0x0101")
        );
    }

    #[test]
    fn test_format_tx_hash() {
        assert_eq!(format_tx_hash("0x1234567890abcdef"), "0x1234...cdef");
        assert_eq!(format_tx_hash("0x12"), "0x12");
    }
}
