//! Transações do Vintém
//!
//! Três variantes compartilham as operações `hash`, `encode`, `fee` e
//! `size`. A verificação não mora aqui: ela depende do estado autoritativo
//! e é responsabilidade do minerador (`vintem-core`). Este módulo cuida
//! apenas da codificação big-endian e do hash sobre a forma sem assinatura.

use crate::account::Address;
use shared::{ChainError, Hash256, KeyPair, Result, SIGNATURE_SIZE};

/// Tamanho em bytes de uma FundsTx serializada
pub const FUNDS_TX_SIZE: u8 = 152;
/// Tamanho em bytes de uma AccTx serializada
pub const ACC_TX_SIZE: u8 = 136;
/// Tamanho em bytes de uma ConfigTx serializada
pub const CONFIG_TX_SIZE: u8 = 81;

/// Transferência de fundos entre duas contas
///
/// `from` e `to` carregam hashes de conta, não endereços completos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundsTx {
    pub amount: u64,
    pub fee: u64,
    pub tx_count: u64,
    pub from: Hash256,
    pub to: Hash256,
    pub sig: [u8; SIGNATURE_SIZE],
}

impl FundsTx {
    /// Cria uma FundsTx ainda sem assinatura
    #[must_use]
    pub const fn new(amount: u64, fee: u64, tx_count: u64, from: Hash256, to: Hash256) -> Self {
        Self {
            amount,
            fee,
            tx_count,
            from,
            to,
            sig: [0u8; SIGNATURE_SIZE],
        }
    }

    /// Hash da transação: SHA3-256 sobre a codificação sem a assinatura
    #[must_use]
    pub fn hash(&self) -> Hash256 {
        Hash256::sha3_256(&self.encode_unsigned())
    }

    /// Assina a transação com a chave do remetente
    ///
    /// # Errors
    ///
    /// Retorna erro se a assinatura falhar
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<()> {
        let signature = keypair.sign(&self.hash())?;
        self.sig = *signature.as_bytes();
        Ok(())
    }

    fn encode_unsigned(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(usize::from(FUNDS_TX_SIZE));
        buf.extend_from_slice(&self.amount.to_be_bytes());
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf.extend_from_slice(&self.tx_count.to_be_bytes());
        buf.extend_from_slice(self.from.as_bytes());
        buf.extend_from_slice(self.to.as_bytes());
        buf
    }

    /// Codificação completa para o fio (big-endian, assinatura ao final)
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.encode_unsigned();
        buf.extend_from_slice(&self.sig);
        buf
    }

    /// Decodifica uma FundsTx do fio
    ///
    /// # Errors
    ///
    /// Retorna erro se o tamanho não bater com o formato
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != usize::from(FUNDS_TX_SIZE) {
            return Err(ChainError::SerializationError(format!(
                "FundsTx deve ter {FUNDS_TX_SIZE} bytes, recebido {}",
                bytes.len()
            )));
        }
        let mut sig = [0u8; SIGNATURE_SIZE];
        sig.copy_from_slice(&bytes[88..152]);
        Ok(Self {
            amount: read_u64(&bytes[0..8]),
            fee: read_u64(&bytes[8..16]),
            tx_count: read_u64(&bytes[16..24]),
            from: read_hash(&bytes[24..56]),
            to: read_hash(&bytes[56..88]),
            sig,
        })
    }
}

/// Criação de conta, assinada por uma chave raiz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccTx {
    pub fee: u64,
    pub pub_key: Address,
    pub sig: [u8; SIGNATURE_SIZE],
}

impl AccTx {
    /// Cria uma AccTx ainda sem assinatura
    #[must_use]
    pub const fn new(fee: u64, pub_key: Address) -> Self {
        Self {
            fee,
            pub_key,
            sig: [0u8; SIGNATURE_SIZE],
        }
    }

    /// Hash da conta que esta transação cria
    #[must_use]
    pub fn account_id(&self) -> Hash256 {
        self.pub_key.hash()
    }

    /// Hash da transação: SHA3-256 sobre a codificação sem a assinatura
    #[must_use]
    pub fn hash(&self) -> Hash256 {
        Hash256::sha3_256(&self.encode_unsigned())
    }

    /// Assina a transação com uma chave raiz
    ///
    /// # Errors
    ///
    /// Retorna erro se a assinatura falhar
    pub fn sign(&mut self, root_keypair: &KeyPair) -> Result<()> {
        let signature = root_keypair.sign(&self.hash())?;
        self.sig = *signature.as_bytes();
        Ok(())
    }

    fn encode_unsigned(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(usize::from(ACC_TX_SIZE));
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf.extend_from_slice(self.pub_key.as_bytes());
        buf
    }

    /// Codificação completa para o fio
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.encode_unsigned();
        buf.extend_from_slice(&self.sig);
        buf
    }

    /// Decodifica uma AccTx do fio
    ///
    /// # Errors
    ///
    /// Retorna erro se o tamanho não bater com o formato
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != usize::from(ACC_TX_SIZE) {
            return Err(ChainError::SerializationError(format!(
                "AccTx deve ter {ACC_TX_SIZE} bytes, recebido {}",
                bytes.len()
            )));
        }
        let mut sig = [0u8; SIGNATURE_SIZE];
        sig.copy_from_slice(&bytes[72..136]);
        Ok(Self {
            fee: read_u64(&bytes[0..8]),
            pub_key: Address::from_slice(&bytes[8..72])?,
            sig,
        })
    }
}

/// Mudança de parâmetro de sistema, assinada por uma chave raiz
///
/// Os efeitos só entram em vigor no hash do bloco que a confirma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigTx {
    pub id: u8,
    pub payload: u64,
    pub fee: u64,
    pub sig: [u8; SIGNATURE_SIZE],
}

impl ConfigTx {
    /// Cria uma ConfigTx ainda sem assinatura
    #[must_use]
    pub const fn new(id: u8, payload: u64, fee: u64) -> Self {
        Self {
            id,
            payload,
            fee,
            sig: [0u8; SIGNATURE_SIZE],
        }
    }

    /// Hash da transação: SHA3-256 sobre a codificação sem a assinatura
    #[must_use]
    pub fn hash(&self) -> Hash256 {
        Hash256::sha3_256(&self.encode_unsigned())
    }

    /// Assina a transação com uma chave raiz
    ///
    /// # Errors
    ///
    /// Retorna erro se a assinatura falhar
    pub fn sign(&mut self, root_keypair: &KeyPair) -> Result<()> {
        let signature = root_keypair.sign(&self.hash())?;
        self.sig = *signature.as_bytes();
        Ok(())
    }

    fn encode_unsigned(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(usize::from(CONFIG_TX_SIZE));
        buf.push(self.id);
        buf.extend_from_slice(&self.payload.to_be_bytes());
        buf.extend_from_slice(&self.fee.to_be_bytes());
        buf
    }

    /// Codificação completa para o fio
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.encode_unsigned();
        buf.extend_from_slice(&self.sig);
        buf
    }

    /// Decodifica uma ConfigTx do fio
    ///
    /// # Errors
    ///
    /// Retorna erro se o tamanho não bater com o formato
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != usize::from(CONFIG_TX_SIZE) {
            return Err(ChainError::SerializationError(format!(
                "ConfigTx deve ter {CONFIG_TX_SIZE} bytes, recebido {}",
                bytes.len()
            )));
        }
        let mut sig = [0u8; SIGNATURE_SIZE];
        sig.copy_from_slice(&bytes[17..81]);
        Ok(Self {
            id: bytes[0],
            payload: read_u64(&bytes[1..9]),
            fee: read_u64(&bytes[9..17]),
            sig,
        })
    }
}

/// Soma das três variantes de transação
///
/// A verificação fica de fora de propósito: ela depende de propriedades
/// dinâmicas do estado e é despachada externamente por
/// `vintem_core::verification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Funds(FundsTx),
    Acc(AccTx),
    Config(ConfigTx),
}

impl Transaction {
    /// Hash da transação
    #[must_use]
    pub fn hash(&self) -> Hash256 {
        match self {
            Self::Funds(tx) => tx.hash(),
            Self::Acc(tx) => tx.hash(),
            Self::Config(tx) => tx.hash(),
        }
    }

    /// Codificação completa para o fio
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Funds(tx) => tx.encode(),
            Self::Acc(tx) => tx.encode(),
            Self::Config(tx) => tx.encode(),
        }
    }

    /// Taxa paga ao beneficiário do bloco
    #[must_use]
    pub const fn fee(&self) -> u64 {
        match self {
            Self::Funds(tx) => tx.fee,
            Self::Acc(tx) => tx.fee,
            Self::Config(tx) => tx.fee,
        }
    }

    /// Tamanho serializado em bytes
    #[must_use]
    pub const fn size(&self) -> u8 {
        match self {
            Self::Funds(_) => FUNDS_TX_SIZE,
            Self::Acc(_) => ACC_TX_SIZE,
            Self::Config(_) => CONFIG_TX_SIZE,
        }
    }

    /// Acesso checado à variante FundsTx
    #[must_use]
    pub const fn as_funds(&self) -> Option<&FundsTx> {
        match self {
            Self::Funds(tx) => Some(tx),
            _ => None,
        }
    }

    /// Acesso checado à variante AccTx
    #[must_use]
    pub const fn as_acc(&self) -> Option<&AccTx> {
        match self {
            Self::Acc(tx) => Some(tx),
            _ => None,
        }
    }

    /// Acesso checado à variante ConfigTx
    #[must_use]
    pub const fn as_config(&self) -> Option<&ConfigTx> {
        match self {
            Self::Config(tx) => Some(tx),
            _ => None,
        }
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_be_bytes(buf)
}

fn read_hash(bytes: &[u8]) -> Hash256 {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(bytes);
    Hash256::from_bytes(buf)
}
