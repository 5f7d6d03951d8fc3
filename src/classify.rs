use crate::contracts::revert_name;
use crate::error::ChainError;
use alloy_primitives::hex;
use regex::Regex;
use std::error::Error;
use std::sync::LazyLock;

pub const FALLBACK_MESSAGE: &str =
    "An unexpected error occurred. Please check your inputs and try again.";

const ERROR_MESSAGES: [(&str, &str); 5] = [
    ("ERC20InsufficientAllowance", "Insufficient Allowance"),
    // Not "Invalid recipient address"; that message belongs to ERC20InvalidRecipient only.
    ("ERC20InsufficientBalance", "Insufficient Balance"),
    ("ERC20InvalidRecipient", "Invalid recipient address"),
    ("ERC4626ExceededMaxDeposit", "Deposit exceeds the vault limit"),
    ("ERC4626ExceededMaxWithdraw", "Withdraw exceeds your available shares"),
];

/// Lower-cased fragments checked after the known revert names, in order.
const MESSAGE_FRAGMENTS: [(&str, &str); 3] = [
    ("insufficient funds", "Insufficient funds for gas"),
    (
        "gas required exceeds allowance",
        "Transaction would fail - please check your inputs",
    ),
    ("user rejected", "Transaction was rejected by user"),
];

static CUSTOM_ERROR_SELECTOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)custom error (0x[0-9a-f]{8})").ok());

/// Map any error raised by the transaction pipeline to a short user-facing message.
pub fn parse_contract_error(error: &(dyn Error + 'static)) -> &'static str {
    if let Some(message) = structured_revert(error).and_then(message_for_name) {
        return message;
    }

    let text = describe(error);
    for (name, message) in ERROR_MESSAGES {
        if text.contains(name) {
            return message;
        }
    }

    let lower = text.to_lowercase();
    for (fragment, message) in MESSAGE_FRAGMENTS {
        if lower.contains(fragment) {
            return message;
        }
    }

    FALLBACK_MESSAGE
}

pub fn message_for_name(name: &str) -> Option<&'static str> {
    ERROR_MESSAGES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, message)| *message)
}

/// Walk the source chain looking for decodable revert data.
fn structured_revert(error: &(dyn Error + 'static)) -> Option<&'static str> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(chain_error) = err.downcast_ref::<ChainError>() {
            if let Some(name) = chain_error.revert_data().and_then(|data| revert_name(data)) {
                return Some(name);
            }
            if let ChainError::Reverted { message, .. } = chain_error {
                if let Some(name) = selector_in_text(message) {
                    return Some(name);
                }
            }
        }
        current = err.source();
    }
    None
}

fn selector_in_text(text: &str) -> Option<&'static str> {
    let re = CUSTOM_ERROR_SELECTOR.as_ref()?;
    let captures = re.captures(text)?;
    let selector = hex::decode(captures.get(1)?.as_str()).ok()?;
    revert_name(&selector)
}

fn describe(error: &(dyn Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut current = error.source();
    while let Some(err) = current {
        text.push_str(": ");
        text.push_str(&err.to_string());
        current = err.source();
    }
    text
}
