//! Bloco do Vintém
//!
//! O hash do bloco é calculado em duas etapas: primeiro o `partial_hash`
//! sobre os campos fixos do cabeçalho, depois o hash final sobre o nonce
//! sem os zeros à esquerda concatenado ao parcial. O campo `state_copy`
//! existe só durante a montagem e a validação; nunca vai para o fio.

use crate::account::Account;
use shared::{ChainError, Hash256, Result};
use std::collections::HashMap;

/// Largura do campo de nonce no fio (alinhado à esquerda com zeros)
pub const PROOF_SIZE: usize = 9;

/// Byte de versão do cabeçalho de bloco
pub const BLOCK_HEADER_BYTE: u8 = 0x01;

/// Bytes fixos de um bloco serializado, antes das listas de hashes
pub const BLOCK_FIXED_SIZE: usize = 1 + 32 + 32 + PROOF_SIZE + 8 + 32 + 32 + 2 + 2 + 1;

/// Bloco candidato, aberto ou confirmado
#[derive(Debug, Clone)]
pub struct Block {
    pub header: u8,
    pub hash: Hash256,
    pub prev_hash: Hash256,
    /// Nonce de 9 bytes, alinhado à esquerda com zeros
    pub nonce: [u8; PROOF_SIZE],
    pub timestamp: i64,
    pub merkle_root: Hash256,
    /// Hash da conta creditada com taxas e recompensa
    pub beneficiary: Hash256,
    pub funds_tx_hashes: Vec<Hash256>,
    pub acc_tx_hashes: Vec<Hash256>,
    pub config_tx_hashes: Vec<Hash256>,
    pub n_funds: u16,
    pub n_acc: u16,
    pub n_config: u8,
    /// Sombra do estado usada na montagem; nunca serializada
    pub state_copy: HashMap<Hash256, Account>,
}

impl Block {
    /// Cria um bloco candidato vazio apontando para `prev_hash`
    #[must_use]
    pub fn new(prev_hash: Hash256) -> Self {
        Self {
            header: BLOCK_HEADER_BYTE,
            hash: Hash256::zero(),
            prev_hash,
            nonce: [0u8; PROOF_SIZE],
            timestamp: 0,
            merkle_root: Hash256::zero(),
            beneficiary: Hash256::zero(),
            funds_tx_hashes: Vec::new(),
            acc_tx_hashes: Vec::new(),
            config_tx_hashes: Vec::new(),
            n_funds: 0,
            n_acc: 0,
            n_config: 0,
            state_copy: HashMap::new(),
        }
    }

    /// Hash parcial sobre os campos fixos do cabeçalho (big-endian)
    #[must_use]
    pub fn partial_hash(&self) -> Hash256 {
        let mut buf = Vec::with_capacity(32 + 1 + 8 + 32 + 32);
        buf.extend_from_slice(self.prev_hash.as_bytes());
        buf.push(self.header);
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(self.merkle_root.as_bytes());
        buf.extend_from_slice(self.beneficiary.as_bytes());
        Hash256::sha3_256(&buf)
    }

    /// Nonce sem os zeros à esquerda, como entra no hash final
    #[must_use]
    pub fn unpadded_nonce(&self) -> &[u8] {
        let start = self
            .nonce
            .iter()
            .position(|&b| b != 0x00)
            .unwrap_or(PROOF_SIZE);
        &self.nonce[start..]
    }

    /// Serializa o bloco para o fio
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // contagens limitadas pelos campos de 16/8 bits
    pub fn encode(&self) -> Vec<u8> {
        let tx_hashes = self.funds_tx_hashes.len()
            + self.acc_tx_hashes.len()
            + self.config_tx_hashes.len();
        let mut buf = Vec::with_capacity(BLOCK_FIXED_SIZE + 32 * tx_hashes);

        buf.push(self.header);
        buf.extend_from_slice(self.hash.as_bytes());
        buf.extend_from_slice(self.prev_hash.as_bytes());
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(self.merkle_root.as_bytes());
        buf.extend_from_slice(self.beneficiary.as_bytes());
        buf.extend_from_slice(&(self.funds_tx_hashes.len() as u16).to_be_bytes());
        buf.extend_from_slice(&(self.acc_tx_hashes.len() as u16).to_be_bytes());
        buf.push(self.config_tx_hashes.len() as u8);

        for hash in &self.funds_tx_hashes {
            buf.extend_from_slice(hash.as_bytes());
        }
        for hash in &self.acc_tx_hashes {
            buf.extend_from_slice(hash.as_bytes());
        }
        for hash in &self.config_tx_hashes {
            buf.extend_from_slice(hash.as_bytes());
        }

        buf
    }

    /// Decodifica um bloco do fio
    ///
    /// # Errors
    ///
    /// Retorna erro se o tamanho não corresponder às contagens declaradas
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < BLOCK_FIXED_SIZE {
            return Err(ChainError::SerializationError(format!(
                "Bloco truncado: {} bytes (mínimo {BLOCK_FIXED_SIZE})",
                bytes.len()
            )));
        }

        let header = bytes[0];
        let hash = read_hash(&bytes[1..33]);
        let prev_hash = read_hash(&bytes[33..65]);
        let mut nonce = [0u8; PROOF_SIZE];
        nonce.copy_from_slice(&bytes[65..74]);
        let timestamp = read_i64(&bytes[74..82]);
        let merkle_root = read_hash(&bytes[82..114]);
        let beneficiary = read_hash(&bytes[114..146]);
        let n_funds = u16::from_be_bytes([bytes[146], bytes[147]]);
        let n_acc = u16::from_be_bytes([bytes[148], bytes[149]]);
        let n_config = bytes[150];

        let total = usize::from(n_funds) + usize::from(n_acc) + usize::from(n_config);
        let expected = BLOCK_FIXED_SIZE + 32 * total;
        if bytes.len() != expected {
            return Err(ChainError::SerializationError(format!(
                "Bloco com {} bytes, esperado {expected} para as contagens declaradas",
                bytes.len()
            )));
        }

        let mut offset = BLOCK_FIXED_SIZE;
        let mut next_hash = || {
            let hash = read_hash(&bytes[offset..offset + 32]);
            offset += 32;
            hash
        };

        let funds_tx_hashes = (0..n_funds).map(|_| next_hash()).collect();
        let acc_tx_hashes = (0..n_acc).map(|_| next_hash()).collect();
        let config_tx_hashes = (0..n_config).map(|_| next_hash()).collect();

        Ok(Self {
            header,
            hash,
            prev_hash,
            nonce,
            timestamp,
            merkle_root,
            beneficiary,
            funds_tx_hashes,
            acc_tx_hashes,
            config_tx_hashes,
            n_funds,
            n_acc,
            n_config,
            state_copy: HashMap::new(),
        })
    }
}

/// Merkle root sobre as folhas `funds ‖ acc ‖ config`
///
/// Níveis ímpares duplicam a última folha; sequência vazia produz o hash
/// todo-zero.
#[must_use]
pub fn build_merkle_root(
    funds_tx_hashes: &[Hash256],
    acc_tx_hashes: &[Hash256],
    config_tx_hashes: &[Hash256],
) -> Hash256 {
    let mut hashes: Vec<Hash256> = Vec::with_capacity(
        funds_tx_hashes.len() + acc_tx_hashes.len() + config_tx_hashes.len(),
    );
    hashes.extend_from_slice(funds_tx_hashes);
    hashes.extend_from_slice(acc_tx_hashes);
    hashes.extend_from_slice(config_tx_hashes);

    if hashes.is_empty() {
        return Hash256::zero();
    }

    while hashes.len() > 1 {
        let mut next_level = Vec::with_capacity(hashes.len().div_ceil(2));

        for chunk in hashes.chunks(2) {
            let mut data = Vec::with_capacity(64);
            data.extend_from_slice(chunk[0].as_bytes());
            if chunk.len() == 2 {
                data.extend_from_slice(chunk[1].as_bytes());
            } else {
                // Folha ímpar: combina consigo mesma
                data.extend_from_slice(chunk[0].as_bytes());
            }
            next_level.push(Hash256::sha3_256(&data));
        }

        hashes = next_level;
    }

    hashes[0]
}

fn read_hash(bytes: &[u8]) -> Hash256 {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(bytes);
    Hash256::from_bytes(buf)
}

fn read_i64(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    i64::from_be_bytes(buf)
}
