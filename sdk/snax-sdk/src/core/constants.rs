use solana_sdk::native_token::LAMPORTS_PER_SOL;

pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

pub const DEFAULT_TOKEN_SYMBOL: &str = "SNAX";
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

/// Faucet request size (1 SOL)
pub const DEFAULT_AIRDROP_LAMPORTS: u64 = LAMPORTS_PER_SOL;

pub const DEFAULT_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_LOCKUP_API_URL: &str = "https://dh288s2n217f7.cloudfront.net";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
/// Delay before the post-transfer balance refresh
pub const DEFAULT_REFRESH_DELAY_MS: u64 = 2_000;
pub const DEFAULT_CONNECT_RETRY_DELAY_MS: u64 = 1_000;
