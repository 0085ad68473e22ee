//! Parâmetros de sistema do Vintém
//!
//! Cinco parâmetros podem ser alterados em tempo de execução via ConfigTx,
//! cada um com uma faixa inclusiva `[min, max]`. Um conjunto de parâmetros
//! fica associado ao hash do bloco que o instalou, para que reorganizações
//! possam rebobiná-lo junto com o estado.

use serde::{Deserialize, Serialize};
use shared::{ChainError, Result};

/// Limite superior de qualquer saldo ou valor de transação
pub const MAX_MONEY: u64 = 2_100_000_000_000_000;

/// Tamanho máximo de bloco em bytes
pub const BLOCK_SIZE_ID: u8 = 1;
/// Intervalo de recálculo de dificuldade, em blocos
pub const DIFF_INTERVAL_ID: u8 = 2;
/// Taxa mínima aceita por transação
pub const FEE_MINIMUM_ID: u8 = 3;
/// Intervalo alvo entre blocos, em segundos
pub const BLOCK_INTERVAL_ID: u8 = 4;
/// Recompensa por bloco minerado
pub const BLOCK_REWARD_ID: u8 = 5;

pub const MIN_BLOCK_SIZE: u64 = 1024;
pub const MAX_BLOCK_SIZE: u64 = 16_000_000;

pub const MIN_DIFF_INTERVAL: u64 = 1;
pub const MAX_DIFF_INTERVAL: u64 = 1_000_000;

pub const MIN_FEE_MINIMUM: u64 = 1;
pub const MAX_FEE_MINIMUM: u64 = 1_000_000;

pub const MIN_BLOCK_INTERVAL: u64 = 1;
pub const MAX_BLOCK_INTERVAL: u64 = 86_400;

pub const MIN_BLOCK_REWARD: u64 = 0;
pub const MAX_BLOCK_REWARD: u64 = 1_000_000_000;

/// Conjunto ativo de parâmetros de sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// Tamanho máximo de bloco (bytes)
    pub block_size: u64,
    /// Recálculo de dificuldade a cada N blocos
    pub diff_interval: u64,
    /// Taxa mínima por transação
    pub fee_minimum: u64,
    /// Intervalo alvo entre blocos (segundos)
    pub block_interval: u64,
    /// Recompensa por bloco
    pub block_reward: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            block_size: 1_000_000,
            diff_interval: 10,
            fee_minimum: 1,
            block_interval: 120,
            block_reward: 25,
        }
    }
}

impl Parameters {
    /// Aplica uma mudança de parâmetro já verificada
    ///
    /// # Errors
    ///
    /// Retorna erro se o id não for um dos cinco parâmetros conhecidos
    pub fn apply(&mut self, id: u8, payload: u64) -> Result<()> {
        match id {
            BLOCK_SIZE_ID => self.block_size = payload,
            DIFF_INTERVAL_ID => self.diff_interval = payload,
            FEE_MINIMUM_ID => self.fee_minimum = payload,
            BLOCK_INTERVAL_ID => self.block_interval = payload,
            BLOCK_REWARD_ID => self.block_reward = payload,
            _ => return Err(ChainError::UnknownParameter(id)),
        }
        Ok(())
    }
}
