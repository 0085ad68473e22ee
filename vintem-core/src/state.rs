//! Mutações de estado por bloco e suas inversas
//!
//! Cada passo da validação de estado tem uma inversa emparelhada, aplicada
//! em ordem estritamente reversa quando um bloco falha no meio do caminho
//! ou é revertido numa reorganização: recompensa, taxas, criação de contas
//! e por fim as transferências de fundos.
//!
//! Remetentes raiz não passam pelo débito: o privilégio das chaves raiz é
//! justamente cunhar os fundos que distribuem. O `tx_count` delas avança
//! como o de qualquer conta.

use crate::storage::Storage;
use crate::verification::parameter_bounds_check;
use shared::{ChainError, Hash256, Result};
use tracing::{debug, warn};
use vintem_protocol::{AccTx, Account, ConfigTx, FundsTx, Parameters, MAX_MONEY};

/// Parâmetros ativos, dificuldade corrente e a pilha de conjuntos anteriores
///
/// Cada entrada da pilha guarda o conjunto que estava ativo antes do bloco
/// (identificado pelo hash) instalar o seu; reverter o bloco restaura a
/// entrada do topo.
#[derive(Debug, Clone)]
pub struct ParamState {
    pub active: Parameters,
    pub difficulty: u8,
    stack: Vec<(Hash256, Parameters)>,
}

impl ParamState {
    /// Cria o estado de parâmetros com o conjunto de gênese
    #[must_use]
    pub const fn new(active: Parameters, difficulty: u8) -> Self {
        Self {
            active,
            difficulty,
            stack: Vec::new(),
        }
    }

    /// Instala um conjunto novo, associado ao bloco que o confirmou
    pub fn install(&mut self, block_hash: Hash256, params: Parameters) {
        self.stack.push((block_hash, self.active));
        self.active = params;
        debug!(block = %block_hash, "Parâmetros de sistema novos em vigor");
    }

    /// Rebobina o conjunto instalado pelo bloco, se for o do topo da pilha
    pub fn rewind(&mut self, block_hash: Hash256) -> bool {
        match self.stack.last() {
            Some((installer, previous)) if *installer == block_hash => {
                self.active = *previous;
                self.stack.pop();
                true
            }
            _ => false,
        }
    }
}

/// Aplica as transferências de fundos de um bloco, em ordem
///
/// # Errors
///
/// Qualquer estouro ou saldo insuficiente desfaz as transferências já
/// aplicadas (em ordem reversa) e devolve o erro
pub fn funds_state_change(storage: &Storage, txs: &[FundsTx]) -> Result<()> {
    for (applied, tx) in txs.iter().enumerate() {
        if let Err(e) = apply_funds_tx(storage, tx) {
            funds_state_change_rollback(storage, &txs[..applied]);
            return Err(e);
        }
    }
    Ok(())
}

fn apply_funds_tx(storage: &Storage, tx: &FundsTx) -> Result<()> {
    let mut sender = storage
        .get_account(tx.from)
        .ok_or_else(|| ChainError::AccountNotFound(tx.from.to_string()))?;
    let mut receiver = storage
        .get_account(tx.to)
        .ok_or_else(|| ChainError::AccountNotFound(tx.to.to_string()))?;

    let cost = tx
        .amount
        .checked_add(tx.fee)
        .ok_or(ChainError::AmountInvalid(tx.amount))?;

    if !storage.is_root_key(tx.from) {
        sender.balance = sender
            .balance
            .checked_sub(cost)
            .ok_or(ChainError::InsufficientFunds {
                needed: cost,
                available: sender.balance,
            })?;
    }

    let credited = receiver
        .balance
        .checked_add(tx.amount)
        .filter(|balance| *balance <= MAX_MONEY)
        .ok_or_else(|| ChainError::OverflowAtReceiver(tx.to.to_string()))?;
    receiver.balance = credited;
    sender.tx_count += 1;

    storage.put_account(sender);
    storage.put_account(receiver);
    Ok(())
}

/// Inversa de `funds_state_change`: desfaz as transferências em ordem reversa
pub fn funds_state_change_rollback(storage: &Storage, txs: &[FundsTx]) {
    for tx in txs.iter().rev() {
        let sender = storage.get_account(tx.from);
        let receiver = storage.get_account(tx.to);
        let (Some(mut sender), Some(mut receiver)) = (sender, receiver) else {
            warn!(tx = %tx.hash(), "Conta ausente ao reverter transferência");
            continue;
        };

        if !storage.is_root_key(tx.from) {
            sender.balance = sender.balance.saturating_add(tx.amount.saturating_add(tx.fee));
        }
        receiver.balance = receiver.balance.saturating_sub(tx.amount);
        sender.tx_count = sender.tx_count.saturating_sub(1);

        storage.put_account(sender);
        storage.put_account(receiver);
    }
}

/// Cria as contas novas de um bloco
///
/// # Errors
///
/// Conta já existente desfaz as criações anteriores e devolve o erro
pub fn acc_state_change(storage: &Storage, txs: &[AccTx]) -> Result<()> {
    for (applied, tx) in txs.iter().enumerate() {
        let id = tx.account_id();
        if storage.account_exists(id) {
            acc_state_change_rollback(storage, &txs[..applied]);
            return Err(ChainError::AccountExists(id.to_string()));
        }
        storage.put_account(Account::new(tx.pub_key));
    }
    Ok(())
}

/// Inversa de `acc_state_change`: remove as contas criadas, em ordem reversa
pub fn acc_state_change_rollback(storage: &Storage, txs: &[AccTx]) {
    for tx in txs.iter().rev() {
        storage.delete_account(tx.account_id());
    }
}

/// Credita ao beneficiário a soma das taxas de todas as transações do bloco
///
/// # Errors
///
/// Retorna erro se o beneficiário não existir ou o crédito passar de
/// `MAX_MONEY`
pub fn collect_tx_fees(
    storage: &Storage,
    funds: &[FundsTx],
    accs: &[AccTx],
    configs: &[ConfigTx],
    beneficiary: Hash256,
) -> Result<()> {
    let total = total_fees(funds, accs, configs)?;
    credit_beneficiary(storage, beneficiary, total)
}

/// Inversa de `collect_tx_fees`
pub fn collect_tx_fees_rollback(
    storage: &Storage,
    funds: &[FundsTx],
    accs: &[AccTx],
    configs: &[ConfigTx],
    beneficiary: Hash256,
) {
    let Ok(total) = total_fees(funds, accs, configs) else {
        warn!(block_beneficiary = %beneficiary, "Soma de taxas inválida ao reverter");
        return;
    };
    debit_beneficiary(storage, beneficiary, total);
}

/// Credita a recompensa de bloco ao beneficiário
///
/// # Errors
///
/// Retorna erro se o beneficiário não existir ou o crédito passar de
/// `MAX_MONEY`
pub fn collect_block_reward(storage: &Storage, reward: u64, beneficiary: Hash256) -> Result<()> {
    credit_beneficiary(storage, beneficiary, reward)
}

/// Inversa de `collect_block_reward`
pub fn collect_block_reward_rollback(storage: &Storage, reward: u64, beneficiary: Hash256) {
    debit_beneficiary(storage, beneficiary, reward);
}

fn total_fees(funds: &[FundsTx], accs: &[AccTx], configs: &[ConfigTx]) -> Result<u64> {
    let mut total = 0u64;
    for fee in funds
        .iter()
        .map(|tx| tx.fee)
        .chain(accs.iter().map(|tx| tx.fee))
        .chain(configs.iter().map(|tx| tx.fee))
    {
        total = total
            .checked_add(fee)
            .ok_or_else(|| ChainError::InvalidBlock("soma de taxas estoura u64".to_string()))?;
    }
    Ok(total)
}

fn credit_beneficiary(storage: &Storage, beneficiary: Hash256, amount: u64) -> Result<()> {
    let mut account = storage
        .get_account(beneficiary)
        .ok_or_else(|| ChainError::BeneficiaryMissing(beneficiary.to_string()))?;

    account.balance = account
        .balance
        .checked_add(amount)
        .filter(|balance| *balance <= MAX_MONEY)
        .ok_or_else(|| ChainError::OverflowAtReceiver(beneficiary.to_string()))?;

    storage.put_account(account);
    Ok(())
}

fn debit_beneficiary(storage: &Storage, beneficiary: Hash256, amount: u64) {
    let Some(mut account) = storage.get_account(beneficiary) else {
        warn!(block_beneficiary = %beneficiary, "Beneficiário ausente ao reverter crédito");
        return;
    };
    account.balance = account.balance.saturating_sub(amount);
    storage.put_account(account);
}

/// Põe em vigor as mudanças de parâmetro confirmadas por um bloco
///
/// As mudanças já foram verificadas; um payload fora da faixa nesta altura
/// é registrado e ignorado em vez de derrubar o bloco.
pub fn config_state_change(params: &mut ParamState, configs: &[ConfigTx], block_hash: Hash256) {
    if configs.is_empty() {
        return;
    }

    let mut next = params.active;
    for tx in configs {
        match parameter_bounds_check(tx.id, tx.payload) {
            Ok(()) => {
                let _ = next.apply(tx.id, tx.payload);
            }
            Err(e) => {
                warn!(id = tx.id, payload = tx.payload, error = %e, "ConfigTx confirmada com parâmetro inválido; ignorada");
            }
        }
    }

    params.install(block_hash, next);
}

/// Inversa de `config_state_change`: rebobina o conjunto do bloco
pub fn config_state_change_rollback(params: &mut ParamState, configs: &[ConfigTx], block_hash: Hash256) {
    if configs.is_empty() {
        return;
    }
    if !params.rewind(block_hash) {
        warn!(block = %block_hash, "Pilha de parâmetros fora de ordem no rollback");
    }
}
