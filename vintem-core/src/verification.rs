//! Verificação de transações
//!
//! A verificação não mora nas transações de propósito: ela depende de
//! propriedades dinâmicas do estado (contas, chaves raiz), que são assunto
//! do minerador e não do protocolo. Daí o despacho por variante acontecer
//! aqui, com a codificação ficando em `vintem-protocol`.

use crate::storage::Storage;
use shared::{ChainError, Hash256, PublicKey, Result, Signature};
use vintem_protocol::params::{
    BLOCK_INTERVAL_ID, BLOCK_REWARD_ID, BLOCK_SIZE_ID, DIFF_INTERVAL_ID, FEE_MINIMUM_ID,
    MAX_BLOCK_INTERVAL, MAX_BLOCK_REWARD, MAX_BLOCK_SIZE, MAX_DIFF_INTERVAL, MAX_FEE_MINIMUM,
    MIN_BLOCK_INTERVAL, MIN_BLOCK_REWARD, MIN_BLOCK_SIZE, MIN_DIFF_INTERVAL, MIN_FEE_MINIMUM,
};
use vintem_protocol::{AccTx, ConfigTx, FundsTx, Transaction, MAX_MONEY};

/// Despacha a verificação pela variante da transação
///
/// # Errors
///
/// Retorna o erro da verificação específica da variante
pub fn verify(storage: &Storage, tx: &Transaction) -> Result<()> {
    match tx {
        Transaction::Funds(tx) => verify_funds_tx(storage, tx),
        Transaction::Acc(tx) => verify_acc_tx(storage, tx),
        Transaction::Config(tx) => verify_config_tx(storage, tx),
    }
}

/// Verifica uma transferência de fundos contra o estado autoritativo
///
/// O `from`/`to` da transação carregam hashes de conta; a assinatura é
/// conferida com o endereço completo do remetente guardado no estado,
/// re-hasheado para garantir que o índice está íntegro.
///
/// # Errors
///
/// Retorna erro se o valor for inválido, alguma conta não existir,
/// remetente e destinatário coincidirem ou a assinatura não conferir
pub fn verify_funds_tx(storage: &Storage, tx: &FundsTx) -> Result<()> {
    if tx.amount == 0 || tx.amount > MAX_MONEY {
        return Err(ChainError::AmountInvalid(tx.amount));
    }

    let sender = storage
        .get_account(tx.from)
        .ok_or_else(|| ChainError::AccountNotFound(tx.from.to_string()))?;
    let receiver = storage
        .get_account(tx.to)
        .ok_or_else(|| ChainError::AccountNotFound(tx.to.to_string()))?;

    // canonicaliza: o hash referenciado precisa bater com o re-hash do
    // endereço completo guardado no estado
    if sender.id() != tx.from || receiver.id() != tx.to {
        return Err(ChainError::InvalidTransaction(
            "hash de conta não corresponde ao endereço no estado".to_string(),
        ));
    }

    if tx.from == tx.to {
        return Err(ChainError::InvalidTransaction(
            "remetente igual ao destinatário".to_string(),
        ));
    }

    let public_key = PublicKey::from_bytes(sender.address.as_bytes())?;
    let signature = Signature::from_bytes(&tx.sig)
        .map_err(|e| ChainError::SignatureInvalid(e.to_string()))?;

    if !public_key.verify(&tx.hash(), &signature)? {
        return Err(ChainError::SignatureInvalid(format!(
            "FundsTx {} não assinada pelo remetente",
            tx.hash()
        )));
    }

    Ok(())
}

/// Verifica uma criação de conta: precisa de assinatura de chave raiz
///
/// # Errors
///
/// Retorna erro se nenhuma chave raiz assinou a transação
pub fn verify_acc_tx(storage: &Storage, tx: &AccTx) -> Result<()> {
    signed_by_root_key(storage, &tx.hash(), &tx.sig)
}

/// Verifica uma mudança de parâmetro: precisa de assinatura de chave raiz
///
/// # Errors
///
/// Retorna erro se nenhuma chave raiz assinou a transação
pub fn verify_config_tx(storage: &Storage, tx: &ConfigTx) -> Result<()> {
    signed_by_root_key(storage, &tx.hash(), &tx.sig)
}

fn signed_by_root_key(storage: &Storage, digest: &Hash256, sig: &[u8]) -> Result<()> {
    let signature = Signature::from_bytes(sig)
        .map_err(|e| ChainError::SignatureInvalid(e.to_string()))?;

    // aceita na primeira chave raiz que conferir
    for root in storage.root_accounts() {
        let public_key = PublicKey::from_bytes(root.address.as_bytes())?;
        if public_key.verify(digest, &signature)? {
            return Ok(());
        }
    }

    Err(ChainError::SignatureInvalid(
        "nenhuma chave raiz assinou a transação".to_string(),
    ))
}

/// Confere se o id de parâmetro é conhecido e o payload está na faixa
///
/// # Errors
///
/// Retorna `UnknownParameter` para ids desconhecidos e
/// `ParameterOutOfBounds` para payloads fora da faixa inclusiva
pub fn parameter_bounds_check(id: u8, payload: u64) -> Result<()> {
    let (min, max) = match id {
        BLOCK_SIZE_ID => (MIN_BLOCK_SIZE, MAX_BLOCK_SIZE),
        DIFF_INTERVAL_ID => (MIN_DIFF_INTERVAL, MAX_DIFF_INTERVAL),
        FEE_MINIMUM_ID => (MIN_FEE_MINIMUM, MAX_FEE_MINIMUM),
        BLOCK_INTERVAL_ID => (MIN_BLOCK_INTERVAL, MAX_BLOCK_INTERVAL),
        BLOCK_REWARD_ID => (MIN_BLOCK_REWARD, MAX_BLOCK_REWARD),
        _ => return Err(ChainError::UnknownParameter(id)),
    };

    if payload < min || payload > max {
        return Err(ChainError::ParameterOutOfBounds { id, payload });
    }

    Ok(())
}
