pub mod builder;
pub mod chain;
pub mod interface;
pub mod pow;
pub mod state;
pub mod storage;
pub mod validation;
pub mod verification;

// Re-exports principais
pub use builder::BlockBuilder;
pub use chain::{Chain, ChainStats};
pub use interface::{
    miner_channels, peer_channel, MinerChannels, NetworkChannels, PeerEndpoint, PeerHandle,
    PeerRequest, TX_FETCH_TIMEOUT,
};
pub use pow::{proof_of_work, validate_proof_of_work, TipSignal};
pub use storage::Storage;
pub use validation::{validate_block, validate_block_rollback};
pub use verification::{parameter_bounds_check, verify};

// Re-exports de tipos compartilhados
pub use shared::{ChainError, Hash256, Result};
