pub mod crypto;
pub mod error;
pub mod hash;
pub mod types;

pub use crypto::{
    sign_transaction_hash, verify_transaction_signature, KeyPair, PrivateKey, PublicKey,
    Signature, PUBLIC_KEY_SIZE, SIGNATURE_SIZE,
};
pub use error::ChainError;
pub use hash::Hash256;

pub type Result<T> = std::result::Result<T, ChainError>;
