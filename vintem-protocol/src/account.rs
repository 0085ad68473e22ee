use shared::{ChainError, Hash256, Result, PUBLIC_KEY_SIZE};
use std::fmt;

/// Tamanho do endereço de conta (coordenadas x || y da chave P-256)
pub const ADDRESS_SIZE: usize = PUBLIC_KEY_SIZE;

/// Endereço de conta: os 64 bytes brutos da chave pública
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Cria um endereço a partir dos 64 bytes das coordenadas
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Cria um endereço a partir de um slice
    ///
    /// # Errors
    ///
    /// Retorna erro se o tamanho não for exatamente 64 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ADDRESS_SIZE {
            return Err(ChainError::SerializationError(format!(
                "Endereço deve ter {ADDRESS_SIZE} bytes, recebido {}",
                bytes.len()
            )));
        }
        let mut data = [0u8; ADDRESS_SIZE];
        data.copy_from_slice(bytes);
        Ok(Self(data))
    }

    /// Returns the raw bytes of the address
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Hash de conta: SHA3-256 sobre as duas coordenadas concatenadas
    #[must_use]
    pub fn hash(&self) -> Hash256 {
        Hash256::sha3_256(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Conta no estado autoritativo
///
/// Contas são criadas por `AccTx` e nunca removidas. O `tx_count` registra
/// quantas `FundsTx` a conta já assinou com sucesso e cresce de forma
/// monotônica; o saldo fica sempre em `[0, MAX_MONEY]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    /// Endereço completo (chave pública de 64 bytes)
    pub address: Address,
    /// Saldo em vinténs
    pub balance: u64,
    /// Número de FundsTx já assinadas por esta conta
    pub tx_count: u64,
}

impl Account {
    /// Cria uma conta nova, zerada
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self {
            address,
            balance: 0,
            tx_count: 0,
        }
    }

    /// Identificador da conta no estado (hash do endereço)
    #[must_use]
    pub fn id(&self) -> Hash256 {
        self.address.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hash_is_deterministic() {
        let address = Address::from_bytes([7u8; ADDRESS_SIZE]);
        assert_eq!(address.hash(), address.hash());
        assert_ne!(address.hash(), Hash256::zero());
    }

    #[test]
    fn test_address_from_slice_rejects_wrong_length() {
        assert!(Address::from_slice(&[0u8; 63]).is_err());
        assert!(Address::from_slice(&[0u8; 64]).is_ok());
    }

    #[test]
    fn test_new_account_is_zeroed() {
        let account = Account::new(Address::from_bytes([1u8; ADDRESS_SIZE]));
        assert_eq!(account.balance, 0);
        assert_eq!(account.tx_count, 0);
        assert_eq!(account.id(), account.address.hash());
    }
}
