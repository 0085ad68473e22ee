//! Armazenamento em memória do minerador
//!
//! Mapas planos atrás de `RwLock`: o estado autoritativo de contas, o
//! conjunto de chaves raiz e os índices de transações e blocos abertos e
//! fechados. Escritas acontecem somente sob a trava de validação de blocos;
//! leitores fora dela toleram inconsistência transitória durante uma
//! validação.

use shared::Hash256;
use std::collections::HashMap;
use std::sync::RwLock;
use vintem_protocol::{Account, Block, Transaction};

/// Contrato de armazenamento consumido pelo pipeline de validação
#[derive(Debug, Default)]
pub struct Storage {
    state: RwLock<HashMap<Hash256, Account>>,
    root_keys: RwLock<HashMap<Hash256, Account>>,
    open_txs: RwLock<HashMap<Hash256, Transaction>>,
    closed_txs: RwLock<HashMap<Hash256, Transaction>>,
    open_blocks: RwLock<HashMap<Hash256, Block>>,
    closed_blocks: RwLock<HashMap<Hash256, Block>>,
}

impl Storage {
    /// Cria um armazenamento vazio
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Estado autoritativo ---

    /// Lê uma conta pelo hash
    #[must_use]
    pub fn get_account(&self, id: Hash256) -> Option<Account> {
        self.state.read().unwrap().get(&id).copied()
    }

    /// Grava (ou sobrescreve) uma conta, indexada pelo hash do endereço
    pub fn put_account(&self, account: Account) {
        self.state.write().unwrap().insert(account.id(), account);
    }

    /// Remove uma conta do estado
    pub fn delete_account(&self, id: Hash256) -> Option<Account> {
        self.state.write().unwrap().remove(&id)
    }

    /// Verifica se uma conta existe no estado
    #[must_use]
    pub fn account_exists(&self, id: Hash256) -> bool {
        self.state.read().unwrap().contains_key(&id)
    }

    /// Cópia completa do estado de contas
    ///
    /// Usada para montar sombras e para comparações em teste; contas são
    /// pequenas e `Copy`, então a cópia é barata.
    #[must_use]
    pub fn state_snapshot(&self) -> HashMap<Hash256, Account> {
        self.state.read().unwrap().clone()
    }

    // --- Chaves raiz ---

    /// Registra uma conta raiz (entra também no estado autoritativo)
    pub fn put_root_account(&self, account: Account) {
        self.root_keys.write().unwrap().insert(account.id(), account);
        self.put_account(account);
    }

    /// Verifica se o hash pertence a uma conta raiz
    #[must_use]
    pub fn is_root_key(&self, id: Hash256) -> bool {
        self.root_keys.read().unwrap().contains_key(&id)
    }

    /// Todas as contas raiz registradas
    #[must_use]
    pub fn root_accounts(&self) -> Vec<Account> {
        self.root_keys.read().unwrap().values().copied().collect()
    }

    // --- Transações ---

    /// Lê uma transação do conjunto de abertas
    #[must_use]
    pub fn read_open_tx(&self, hash: Hash256) -> Option<Transaction> {
        self.open_txs.read().unwrap().get(&hash).copied()
    }

    /// Grava uma transação no conjunto de abertas
    pub fn write_open_tx(&self, tx: &Transaction) {
        self.open_txs.write().unwrap().insert(tx.hash(), *tx);
    }

    /// Remove uma transação do conjunto de abertas
    pub fn delete_open_tx(&self, hash: Hash256) -> Option<Transaction> {
        self.open_txs.write().unwrap().remove(&hash)
    }

    /// Todas as transações abertas no momento (o pool de pendentes)
    #[must_use]
    pub fn open_txs(&self) -> Vec<Transaction> {
        self.open_txs.read().unwrap().values().copied().collect()
    }

    /// Lê uma transação do índice de fechadas
    #[must_use]
    pub fn read_closed_tx(&self, hash: Hash256) -> Option<Transaction> {
        self.closed_txs.read().unwrap().get(&hash).copied()
    }

    /// Grava uma transação no índice de fechadas
    pub fn write_closed_tx(&self, tx: &Transaction) {
        self.closed_txs.write().unwrap().insert(tx.hash(), *tx);
    }

    /// Remove uma transação do índice de fechadas
    pub fn delete_closed_tx(&self, hash: Hash256) -> Option<Transaction> {
        self.closed_txs.write().unwrap().remove(&hash)
    }

    // --- Blocos ---

    /// Lê um bloco do conjunto de abertos
    #[must_use]
    pub fn read_open_block(&self, hash: Hash256) -> Option<Block> {
        self.open_blocks.read().unwrap().get(&hash).cloned()
    }

    /// Grava um bloco no conjunto de abertos
    pub fn write_open_block(&self, block: &Block) {
        self.open_blocks.write().unwrap().insert(block.hash, block.clone());
    }

    /// Remove um bloco do conjunto de abertos
    pub fn delete_open_block(&self, hash: Hash256) -> Option<Block> {
        self.open_blocks.write().unwrap().remove(&hash)
    }

    /// Lê um bloco confirmado
    #[must_use]
    pub fn read_closed_block(&self, hash: Hash256) -> Option<Block> {
        self.closed_blocks.read().unwrap().get(&hash).cloned()
    }

    /// Grava um bloco confirmado
    pub fn write_closed_block(&self, block: &Block) {
        self.closed_blocks.write().unwrap().insert(block.hash, block.clone());
    }

    /// Remove um bloco do conjunto de confirmados
    pub fn delete_closed_block(&self, hash: Hash256) -> Option<Block> {
        self.closed_blocks.write().unwrap().remove(&hash)
    }
}
