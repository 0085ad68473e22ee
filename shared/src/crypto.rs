//! Assinaturas ECDSA sobre NIST P-256 para o Vintém
//!
//! Chaves públicas circulam como os 64 bytes brutos das duas coordenadas
//! afins (x || y); assinaturas como os 64 bytes brutos (r || s). O conteúdo
//! assinado é sempre um digest SHA3-256 já calculado pelo chamador.

use crate::{ChainError, Hash256, Result};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use p256::{EncodedPoint, FieldBytes};
use rand::rngs::OsRng;
use zeroize::Zeroize;

/// Tamanho de uma chave pública serializada (coordenadas x || y)
pub const PUBLIC_KEY_SIZE: usize = 64;

/// Tamanho de uma assinatura serializada (r || s)
pub const SIGNATURE_SIZE: usize = 64;

/// Chave pública P-256 em forma de coordenadas brutas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    key_data: [u8; PUBLIC_KEY_SIZE],
}

/// Chave privada P-256 (escalar de 32 bytes)
#[derive(Debug, Clone)]
pub struct PrivateKey {
    key_data: Vec<u8>,
}

/// Par de chaves P-256
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

/// Assinatura ECDSA bruta (r || s)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    data: [u8; SIGNATURE_SIZE],
}

impl PublicKey {
    /// Cria uma chave pública a partir das coordenadas brutas
    ///
    /// # Errors
    ///
    /// Retorna erro se o tamanho não for exatamente 64 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(ChainError::CryptographicError(format!(
                "Chave pública deve ter {PUBLIC_KEY_SIZE} bytes, recebido {}",
                bytes.len()
            )));
        }
        let mut key_data = [0u8; PUBLIC_KEY_SIZE];
        key_data.copy_from_slice(bytes);
        Ok(Self { key_data })
    }

    /// Returns the raw coordinate bytes of the public key
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.key_data
    }

    /// Verifica uma assinatura sobre um digest já calculado
    ///
    /// # Errors
    ///
    /// Retorna erro se as coordenadas não formarem um ponto válido da curva
    pub fn verify(&self, digest: &Hash256, signature: &Signature) -> Result<bool> {
        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&self.key_data[..32]),
            FieldBytes::from_slice(&self.key_data[32..]),
            false,
        );
        let key = VerifyingKey::from_encoded_point(&point)
            .map_err(|e| ChainError::CryptographicError(e.to_string()))?;
        let sig = EcdsaSignature::from_slice(&signature.data)
            .map_err(|e| ChainError::CryptographicError(e.to_string()))?;
        Ok(key.verify_prehash(digest.as_bytes(), &sig).is_ok())
    }
}

impl PrivateKey {
    /// Creates a `PrivateKey` from raw scalar bytes
    ///
    /// # Errors
    ///
    /// Retorna erro se os bytes não formarem um escalar válido
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        // valida o escalar antes de guardar
        SigningKey::from_slice(bytes)
            .map_err(|e| ChainError::CryptographicError(e.to_string()))?;
        Ok(Self {
            key_data: bytes.to_vec(),
        })
    }

    /// Returns the raw bytes of the private key
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key_data
    }
}

impl KeyPair {
    /// Generates a new P-256 keypair
    ///
    /// # Errors
    ///
    /// Retorna erro se a chave gerada não puder ser serializada
    pub fn generate() -> Result<Self> {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        let point = verifying_key.to_encoded_point(false);

        let x = point.x().ok_or_else(|| {
            ChainError::CryptographicError("Ponto no infinito".to_string())
        })?;
        let y = point.y().ok_or_else(|| {
            ChainError::CryptographicError("Ponto sem coordenada y".to_string())
        })?;

        let mut key_data = [0u8; PUBLIC_KEY_SIZE];
        key_data[..32].copy_from_slice(x);
        key_data[32..].copy_from_slice(y);

        Ok(Self {
            public_key: PublicKey { key_data },
            private_key: PrivateKey {
                key_data: signing_key.to_bytes().to_vec(),
            },
        })
    }

    /// Assina um digest com a chave privada
    ///
    /// # Errors
    ///
    /// Retorna erro se a assinatura falhar
    pub fn sign(&self, digest: &Hash256) -> Result<Signature> {
        let key = SigningKey::from_slice(&self.private_key.key_data)
            .map_err(|e| ChainError::CryptographicError(e.to_string()))?;
        let sig: EcdsaSignature = key
            .sign_prehash(digest.as_bytes())
            .map_err(|e| ChainError::CryptographicError(e.to_string()))?;

        let mut data = [0u8; SIGNATURE_SIZE];
        data.copy_from_slice(&sig.to_bytes());
        Ok(Signature { data })
    }
}

impl Signature {
    /// Cria uma assinatura a partir dos 64 bytes brutos
    ///
    /// # Errors
    ///
    /// Retorna erro se o tamanho não for exatamente 64 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_SIZE {
            return Err(ChainError::CryptographicError(format!(
                "Assinatura deve ter {SIGNATURE_SIZE} bytes, recebido {}",
                bytes.len()
            )));
        }
        let mut data = [0u8; SIGNATURE_SIZE];
        data.copy_from_slice(bytes);
        Ok(Self { data })
    }

    /// Returns the raw bytes of the signature
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.data
    }
}

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        self.key_data.zeroize();
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Signs a transaction hash with the given keypair
///
/// # Errors
///
/// Returns error if signing fails
pub fn sign_transaction_hash(tx_hash: &Hash256, keypair: &KeyPair) -> Result<Signature> {
    keypair.sign(tx_hash)
}

/// Verifies a signature over a transaction hash
///
/// # Errors
///
/// Returns error if the public key is malformed
pub fn verify_transaction_signature(
    tx_hash: &Hash256,
    public_key: &PublicKey,
    signature: &Signature,
) -> Result<bool> {
    public_key.verify(tx_hash, signature)
}
