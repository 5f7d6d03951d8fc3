pub mod allowance;
pub mod balance;
pub mod poller;

pub use allowance::{Allowance, AllowanceReader};
pub use balance::{BalanceReader, DEFAULT_POLL_INTERVAL};
pub use poller::Poller;
