pub mod account;
pub mod block;
pub mod params;
pub mod transaction;
pub mod wire;

// Re-exports principais
pub use account::{Account, Address, ADDRESS_SIZE};
pub use block::{build_merkle_root, Block, BLOCK_HEADER_BYTE, PROOF_SIZE};
pub use params::{Parameters, MAX_MONEY};
pub use transaction::{AccTx, ConfigTx, FundsTx, Transaction};
pub use wire::TxInfo;

// Re-exports de tipos compartilhados
pub use shared::{ChainError, Hash256, Result};
