//! Coordenação da cadeia
//!
//! O `Chain` reúne o armazenamento, a trava de validação, os parâmetros
//! ativos e o topo corrente. O posicionamento de um bloco recebido
//! (`get_block_sequences`) sobe pela cadeia nova até um ancestral
//! confirmado, buscando ancestrais desconhecidos em peers, e desce do topo
//! atual até o mesmo ancestral para montar a lista de rollback.

use crate::interface::PeerHandle;
use crate::pow::TipSignal;
use crate::state::ParamState;
use crate::storage::Storage;
use serde::Serialize;
use shared::{ChainError, Hash256, Result};
use std::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};
use vintem_protocol::{wire, Account, Block, ConfigTx, Parameters};

/// Estatísticas acumuladas da cadeia principal
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ChainStats {
    pub height: u64,
    pub funds_txs: u64,
    pub acc_txs: u64,
    pub config_txs: u64,
}

/// Estado compartilhado do minerador
pub struct Chain {
    storage: Storage,
    validation_lock: Mutex<()>,
    params: RwLock<ParamState>,
    tip: RwLock<Hash256>,
    tip_signal: TipSignal,
    stats: RwLock<ChainStats>,
    /// Timestamps do intervalo corrente de recálculo de dificuldade
    interval_timestamps: RwLock<Vec<i64>>,
}

impl Chain {
    /// Cria uma cadeia nova com o bloco gênese (hash todo-zero) confirmado
    #[must_use]
    pub fn new(params: Parameters, difficulty: u8) -> Self {
        let storage = Storage::new();

        // o gênese é um bloco vazio cujo hash é o hash zero
        let genesis = Block::new(Hash256::zero());
        storage.write_closed_block(&genesis);

        Self {
            storage,
            validation_lock: Mutex::new(()),
            params: RwLock::new(ParamState::new(params, difficulty)),
            tip: RwLock::new(Hash256::zero()),
            tip_signal: TipSignal::new(),
            stats: RwLock::new(ChainStats::default()),
            interval_timestamps: RwLock::new(Vec::new()),
        }
    }

    /// Acesso ao contrato de armazenamento
    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Trava global de validação de blocos (um escritor por vez)
    pub fn lock_validation(&self) -> MutexGuard<'_, ()> {
        self.validation_lock.lock().unwrap()
    }

    /// Conjunto de parâmetros ativo no momento
    #[must_use]
    pub fn active_params(&self) -> Parameters {
        self.params.read().unwrap().active
    }

    /// Dificuldade corrente em bits zero à esquerda
    #[must_use]
    pub fn difficulty(&self) -> u8 {
        self.params.read().unwrap().difficulty
    }

    /// Hash do topo da cadeia principal
    #[must_use]
    pub fn tip(&self) -> Hash256 {
        *self.tip.read().unwrap()
    }

    /// Sinal observado pelo motor de prova de trabalho
    #[must_use]
    pub const fn tip_signal(&self) -> &TipSignal {
        &self.tip_signal
    }

    /// Estatísticas correntes
    #[must_use]
    pub fn stats(&self) -> ChainStats {
        *self.stats.read().unwrap()
    }

    /// Registra uma conta de gênese diretamente no estado
    pub fn register_account(&self, account: Account) {
        self.storage.put_account(account);
    }

    /// Registra uma conta raiz (autorizada a criar contas e mudar parâmetros)
    pub fn register_root_account(&self, account: Account) {
        self.storage.put_root_account(account);
    }

    pub(crate) fn set_tip(&self, hash: Hash256) {
        *self.tip.write().unwrap() = hash;
        self.tip_signal.notify();
    }

    pub(crate) fn install_config(&self, configs: &[ConfigTx], block_hash: Hash256) {
        let mut params = self.params.write().unwrap();
        crate::state::config_state_change(&mut params, configs, block_hash);
    }

    pub(crate) fn rewind_config(&self, configs: &[ConfigTx], block_hash: Hash256) {
        let mut params = self.params.write().unwrap();
        crate::state::config_state_change_rollback(&mut params, configs, block_hash);
    }

    /// Contabiliza um bloco confirmado e recalcula a dificuldade no fim de
    /// cada intervalo
    pub(crate) fn record_block(&self, block: &Block) {
        {
            let mut stats = self.stats.write().unwrap();
            stats.height += 1;
            stats.funds_txs += block.funds_tx_hashes.len() as u64;
            stats.acc_txs += block.acc_tx_hashes.len() as u64;
            stats.config_txs += block.config_tx_hashes.len() as u64;
        }

        let params = self.active_params();
        let mut timestamps = self.interval_timestamps.write().unwrap();
        timestamps.push(block.timestamp);

        if params.diff_interval >= 2 && timestamps.len() as u64 >= params.diff_interval {
            let span = timestamps[timestamps.len() - 1] - timestamps[0];
            let expected = (params.block_interval * (params.diff_interval - 1)) as i64;

            let mut state = self.params.write().unwrap();
            let old = state.difficulty;
            if span * 2 < expected {
                // blocos saindo rápido demais: aperta um bit
                state.difficulty = state.difficulty.saturating_add(1).max(1);
            } else if span > expected * 2 {
                // blocos lentos demais: afrouxa um bit
                state.difficulty = state.difficulty.saturating_sub(1).max(1);
            }
            if state.difficulty != old {
                info!(old, new = state.difficulty, "Dificuldade recalculada");
            }
            timestamps.clear();
        }
    }

    /// Desfaz a contabilidade de um bloco revertido
    pub(crate) fn forget_block(&self, block: &Block) {
        let mut stats = self.stats.write().unwrap();
        stats.height = stats.height.saturating_sub(1);
        stats.funds_txs = stats.funds_txs.saturating_sub(block.funds_tx_hashes.len() as u64);
        stats.acc_txs = stats.acc_txs.saturating_sub(block.acc_tx_hashes.len() as u64);
        stats.config_txs = stats.config_txs.saturating_sub(block.config_tx_hashes.len() as u64);

        let mut timestamps = self.interval_timestamps.write().unwrap();
        if timestamps.last() == Some(&block.timestamp) {
            timestamps.pop();
        }
    }

    /// Posiciona um bloco novo em relação à cadeia principal
    ///
    /// Devolve `(rollback, apply)`: os blocos confirmados a reverter, do
    /// topo atual até o ancestral comum, e os blocos da cadeia nova a
    /// aplicar, do filho do ancestral até o bloco recebido. Ancestrais
    /// desconhecidos são buscados em peers com `BLOCK_REQ`.
    ///
    /// # Errors
    ///
    /// `NoCommonAncestor` se a cadeia nova não encostar na principal;
    /// `ChainNotLonger` se não for estritamente mais longa
    pub fn get_block_sequences(
        &self,
        new_block: &Block,
        peers: &PeerHandle,
    ) -> Result<(Vec<Block>, Vec<Block>)> {
        if self.storage.read_closed_block(new_block.hash).is_some() {
            return Err(ChainError::InvalidBlock(
                "bloco já confirmado na cadeia principal".to_string(),
            ));
        }

        // sobe pela cadeia nova até encostar num bloco confirmado
        let mut apply = vec![new_block.clone()];
        let mut cursor = new_block.prev_hash;
        let ancestor = loop {
            if self.storage.read_closed_block(cursor).is_some() {
                break cursor;
            }

            let block = match self.storage.read_open_block(cursor) {
                Some(block) => block,
                None => {
                    debug!(hash = %cursor, "Ancestral desconhecido; buscando em peers");
                    let bytes = peers
                        .tx_request(cursor, wire::BLOCK_REQ)
                        .map_err(|_| ChainError::NoCommonAncestor)?;
                    let block = Block::decode(&bytes)
                        .map_err(|_| ChainError::NoCommonAncestor)?;
                    if block.hash != cursor {
                        return Err(ChainError::NoCommonAncestor);
                    }
                    self.storage.write_open_block(&block);
                    block
                }
            };

            if block.prev_hash == cursor {
                // laço na cadeia recebida
                return Err(ChainError::NoCommonAncestor);
            }
            cursor = block.prev_hash;
            apply.push(block);
        };
        apply.reverse();

        // desce do topo atual até o ancestral, em ordem reversa de confirmação
        let mut rollback = Vec::new();
        let mut cursor = self.tip();
        while cursor != ancestor {
            let block = self
                .storage
                .read_closed_block(cursor)
                .ok_or(ChainError::NoCommonAncestor)?;
            if block.prev_hash == cursor {
                return Err(ChainError::NoCommonAncestor);
            }
            cursor = block.prev_hash;
            rollback.push(block);
        }

        if apply.len() <= rollback.len() {
            return Err(ChainError::ChainNotLonger);
        }

        Ok((rollback, apply))
    }
}
