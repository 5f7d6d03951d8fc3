use alloy::sol;
use alloy::sol_types::SolError;
use alloy_primitives::U256;

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
        function mint(address to, uint256 amount) external;
    }

    interface IVault {
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function withdraw(uint256 assets, address receiver, address owner) external returns (uint256 shares);
    }

    error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
    error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
    error ERC20InvalidRecipient(address receiver);
    error ERC4626ExceededMaxDeposit(address receiver, uint256 assets, uint256 max);
    error ERC4626ExceededMaxWithdraw(address owner, uint256 assets, uint256 max);
}

pub const MAX_UINT256: U256 = U256::MAX;

/// Revert reasons the vault and token are known to raise, keyed by selector.
pub const KNOWN_REVERTS: [([u8; 4], &str); 5] = [
    (
        ERC20InsufficientAllowance::SELECTOR,
        ERC20InsufficientAllowance::SIGNATURE,
    ),
    (
        ERC20InsufficientBalance::SELECTOR,
        ERC20InsufficientBalance::SIGNATURE,
    ),
    (ERC20InvalidRecipient::SELECTOR, ERC20InvalidRecipient::SIGNATURE),
    (
        ERC4626ExceededMaxDeposit::SELECTOR,
        ERC4626ExceededMaxDeposit::SIGNATURE,
    ),
    (
        ERC4626ExceededMaxWithdraw::SELECTOR,
        ERC4626ExceededMaxWithdraw::SIGNATURE,
    ),
];

/// Resolve a revert payload to the error name, e.g. `ERC20InsufficientAllowance`.
pub fn revert_name(data: &[u8]) -> Option<&'static str> {
    let selector: [u8; 4] = data.get(..4)?.try_into().ok()?;
    KNOWN_REVERTS
        .iter()
        .find(|(known, _)| *known == selector)
        .map(|(_, signature)| error_name(signature))
}

fn error_name(signature: &'static str) -> &'static str {
    signature.split('(').next().unwrap_or(signature)
}
