use crate::balance::BalanceRefresher;
use crate::config::TransferConfig;
use crate::core::connection::SolConnection;
use crate::core::wallet::{SigningStrategy, WalletError, WalletProvider};
use crate::error::{Result, SnaxSdkError};
use crate::price::PriceOracle;
use crate::types::{SolPrice, TokenAccountView, WalletSession};
use log::{info, warn};
use solana_sdk::pubkey::Pubkey;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Last connected address, shared across views of the same process.
#[derive(Debug, Clone, Default)]
pub struct AddressCache {
    inner: Arc<RwLock<Option<String>>>,
}

impl AddressCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set(&self, address: &Pubkey) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(address.to_string());
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Balances and price fetched right after connecting
#[derive(Debug, Clone, PartialEq)]
pub struct SessionViews {
    pub native_lamports: u64,
    pub token: TokenAccountView,
    pub price: SolPrice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectedSession {
    pub session: WalletSession,
    pub views: SessionViews,
}

/// Establishes [`WalletSession`]s from an injected wallet provider.
pub struct ConnectionResolver<C, W, P> {
    wallet: Arc<W>,
    oracle: Arc<P>,
    refresher: BalanceRefresher<C>,
    retry_delay: Duration,
    cache: AddressCache,
}

impl<C, W, P> ConnectionResolver<C, W, P>
where
    C: SolConnection,
    W: WalletProvider,
    P: PriceOracle,
{
    pub fn new(connection: Arc<C>, wallet: Arc<W>, oracle: Arc<P>, config: &TransferConfig) -> Self {
        Self {
            wallet,
            oracle,
            refresher: BalanceRefresher::new(connection, config),
            retry_delay: config.connect_retry_delay,
            cache: AddressCache::new(),
        }
    }

    /// Share an existing cache instead of the resolver's own
    pub fn with_cache(mut self, cache: AddressCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn address_cache(&self) -> &AddressCache {
        &self.cache
    }

    /// Silent reconnect on startup. Never prompts; `None` without a prior grant.
    pub async fn restore(&self) -> Option<ConnectedSession> {
        let address = match self.wallet.connect(true).await {
            Ok(address) => address,
            Err(err) => {
                info!("no trusted wallet session to restore: {}", err);
                return None;
            },
        };
        match self.establish(address).await {
            Ok(connected) => Some(connected),
            Err(err) => {
                warn!("trusted connect succeeded but session setup failed: {}", err);
                None
            },
        }
    }

    /// User-initiated connect. Retries once after `connect_retry_delay`.
    pub async fn connect(&self) -> Result<ConnectedSession> {
        let address = match self.wallet.connect(false).await {
            Ok(address) => address,
            Err(first) => {
                warn!(
                    "wallet connect failed ({}), retrying in {:?}",
                    first, self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
                self.wallet
                    .connect(false)
                    .await
                    .map_err(|e| SnaxSdkError::ConnectFailed(e.to_string()))?
            },
        };
        self.establish(address).await
    }

    /// Tear down the session locally, then tell the provider.
    pub async fn disconnect(&self, session: &mut WalletSession) -> Result<()> {
        session.connected = false;
        self.cache.clear();
        info!("disconnected {}", session.address);
        self.wallet.disconnect().await.map_err(SnaxSdkError::from)
    }

    /// Native balance, token balance and price, fetched concurrently. Each
    /// failure degrades to zero on its own.
    pub async fn load_views(&self, owner: &Pubkey) -> SessionViews {
        let (native, token, price) = tokio::join!(
            self.refresher.native_balance(owner),
            self.refresher.token_balance(owner),
            self.oracle.fetch_price(),
        );

        let native_lamports = native.unwrap_or_else(|e| {
            warn!("native balance unavailable: {}", e);
            0
        });
        let token = token.unwrap_or_else(|e| {
            warn!("token balance unavailable: {}", e);
            TokenAccountView::empty(*owner, self.refresher.mint(), self.refresher.decimals())
        });
        let price = price.unwrap_or_else(|e| {
            warn!("price unavailable: {}", e);
            SolPrice::default()
        });

        SessionViews {
            native_lamports,
            token,
            price,
        }
    }

    async fn establish(&self, address: Pubkey) -> Result<ConnectedSession> {
        let strategy = SigningStrategy::negotiate(self.wallet.capabilities()).ok_or_else(|| {
            SnaxSdkError::ConnectFailed(
                WalletError::Unsupported("transaction signing").to_string(),
            )
        })?;
        info!("connected {} (signing: {:?})", address, strategy);

        self.cache.set(&address);
        let views = self.load_views(&address).await;

        Ok(ConnectedSession {
            session: WalletSession {
                connected: true,
                address,
                strategy,
            },
            views,
        })
    }
}
