/// Wallet Layer
///
/// Holds the signing capability as an explicit object that callers pass to
/// executors, instead of a process-wide connector.
pub mod connector;

pub use connector::{ConnectedWallet, WalletConnector};
