//! Motor de prova de trabalho
//!
//! Enumera nonces a partir de zero até achar um candidato com `difficulty`
//! bits zero à esquerda. Cada tentativa hasheia os bytes big-endian do
//! nonce *sem* os zeros à esquerda, a mesma forma que o validador
//! reconstrói a partir do campo de 9 bytes do bloco.
//!
//! O aborto é cooperativo: um `TipSignal` é consultado a cada iteração e a
//! mineração devolve `MiningAborted` assim que outro bloco vira o topo da
//! cadeia. Entre tentativas há uma pausa curta; civilidade de CPU vale mais
//! que throughput aqui.

use shared::{ChainError, Hash256, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Pausa cooperativa entre tentativas de nonce
pub const POW_YIELD: Duration = Duration::from_millis(1);

/// Sinal barato de mudança de topo, observado pelo minerador
///
/// O validador chama `notify` ao instalar um topo novo; o motor compara a
/// época corrente com a observada no início da mineração. Leituras
/// desatualizadas só custam tentativas extras até a próxima checagem.
#[derive(Debug, Default)]
pub struct TipSignal {
    epoch: AtomicU64,
}

impl TipSignal {
    /// Cria um sinal novo
    #[must_use]
    pub const fn new() -> Self {
        Self {
            epoch: AtomicU64::new(0),
        }
    }

    /// Época corrente do topo
    #[must_use]
    pub fn observe(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Anuncia um topo novo para mineradores em andamento
    pub fn notify(&self) {
        self.epoch.fetch_add(1, Ordering::Release);
    }

    /// Verifica se o topo mudou desde a época observada
    #[must_use]
    pub fn changed_since(&self, observed: u64) -> bool {
        self.observe() != observed
    }
}

/// Hash candidato para um nonce: SHA3-256 do nonce sem zeros à esquerda
/// concatenado ao hash parcial
#[must_use]
pub fn pow_candidate(nonce: u64, partial_hash: &Hash256) -> Hash256 {
    let bytes = nonce.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0x00).unwrap_or(bytes.len());

    let mut buf = Vec::with_capacity(8 + 32);
    buf.extend_from_slice(&bytes[start..]);
    buf.extend_from_slice(partial_hash.as_bytes());
    Hash256::sha3_256(&buf)
}

/// Procura um nonce cujo candidato satisfaça a dificuldade
///
/// # Errors
///
/// Retorna `MiningAborted` se o topo da cadeia mudar durante a busca
pub fn proof_of_work(
    difficulty: u8,
    partial_hash: Hash256,
    tip: &TipSignal,
) -> Result<[u8; 8]> {
    info!(difficulty, "Iniciando mineração de um novo bloco");

    let started_at = tip.observe();
    let mut cnt: u64 = 0;

    loop {
        thread::sleep(POW_YIELD);

        if tip.changed_since(started_at) {
            return Err(ChainError::MiningAborted);
        }

        if pow_candidate(cnt, &partial_hash).meets_difficulty(difficulty) {
            return Ok(cnt.to_be_bytes());
        }

        cnt = cnt.wrapping_add(1);
    }
}

/// Espelho do validador: o hash final precisa dos mesmos bits zero
#[must_use]
pub fn validate_proof_of_work(difficulty: u8, hash: &Hash256) -> bool {
    hash.meets_difficulty(difficulty)
}
