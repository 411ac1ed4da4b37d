use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use eyre::{Result, eyre};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// A signer that is currently able to authorise transactions
#[derive(Debug, Clone)]
pub struct ConnectedWallet {
    pub address: Address,
    pub chain_id: u64,
    pub wallet: EthereumWallet,
}

impl ConnectedWallet {
    pub fn from_signer(signer: PrivateKeySigner, chain_id: u64) -> Self {
        let address = signer.address();
        Self {
            address,
            chain_id,
            wallet: EthereumWallet::from(signer),
        }
    }
}

/// Signing capability handed to executors at construction.
///
/// Clones share the same connection, so a disconnect is seen by every executor
/// built from this connector.
#[derive(Debug, Clone, Default)]
pub struct WalletConnector {
    active: Arc<RwLock<Option<ConnectedWallet>>>,
}

impl WalletConnector {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn with_wallet(wallet: ConnectedWallet) -> Self {
        let connector = Self::default();
        connector.connect(wallet);
        connector
    }

    /// Connect a local key, e.g. one read from `PRIVATE_KEY`
    pub fn from_private_key(private_key: &str, chain_id: u64) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| eyre!("Invalid private key: {}", e))?;
        Ok(Self::with_wallet(ConnectedWallet::from_signer(signer, chain_id)))
    }

    pub fn connect(&self, wallet: ConnectedWallet) {
        info!("Wallet connected: {} on chain {}", wallet.address, wallet.chain_id);
        *self.active.write() = Some(wallet);
    }

    pub fn disconnect(&self) {
        if let Some(wallet) = self.active.write().take() {
            info!("Wallet disconnected: {}", wallet.address);
        }
    }

    /// Snapshot of the current connection
    pub fn current(&self) -> Option<ConnectedWallet> {
        self.active.read().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.active.read().is_some()
    }

    pub fn address(&self) -> Option<Address> {
        self.active.read().as_ref().map(|wallet| wallet.address)
    }
}
