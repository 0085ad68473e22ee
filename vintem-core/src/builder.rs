//! Montagem de blocos candidatos
//!
//! As transações são admitidas contra uma sombra do estado guardada no
//! próprio bloco: assim a montagem aceita especulativamente enquanto a
//! mineração corre e, se um bloco de peer ganhar a corrida, a sombra é
//! simplesmente descartada sem tocar no estado autoritativo.

use crate::chain::Chain;
use crate::pow::{pow_candidate, proof_of_work};
use crate::verification::{parameter_bounds_check, verify};
use chrono::Utc;
use shared::{ChainError, Hash256, Result};
use tracing::{debug, info};
use vintem_protocol::{
    build_merkle_root, AccTx, Block, ConfigTx, FundsTx, Transaction, MAX_MONEY, PROOF_SIZE,
};

/// Montador de blocos: admite transações e fecha o candidato minerando
pub struct BlockBuilder<'a> {
    chain: &'a Chain,
    /// Conta creditada com taxas e recompensa dos blocos montados
    beneficiary: Hash256,
}

impl<'a> BlockBuilder<'a> {
    /// Cria um montador para a cadeia com o beneficiário dado
    #[must_use]
    pub const fn new(chain: &'a Chain, beneficiary: Hash256) -> Self {
        Self { chain, beneficiary }
    }

    /// Inicia um candidato vazio apontando para `prev_hash`
    #[must_use]
    pub fn new_block(&self, prev_hash: Hash256) -> Block {
        Block::new(prev_hash)
    }

    /// Valida uma transação contra a sombra e, aceitando, anexa o hash à
    /// lista da variante e marca a transação como aberta no armazenamento
    ///
    /// # Errors
    ///
    /// Devolve o motivo da rejeição; o bloco segue aceitando outras
    /// transações
    pub fn add_tx(&self, block: &mut Block, tx: Transaction) -> Result<()> {
        // taxa mínima é parâmetro de sistema, relido a cada bloco
        let fee_minimum = self.chain.active_params().fee_minimum;
        if tx.fee() < fee_minimum {
            return Err(ChainError::FeeTooLow {
                fee: tx.fee(),
                minimum: fee_minimum,
            });
        }

        verify(self.chain.storage(), &tx)?;

        let tx_hash = tx.hash();
        if self.chain.storage().read_closed_tx(tx_hash).is_some() {
            return Err(ChainError::DuplicateTx(tx_hash.to_string()));
        }

        let block_size = self.chain.active_params().block_size;
        let projected = block.encode().len() + 32 + usize::from(tx.size());
        if projected as u64 > block_size {
            return Err(ChainError::InvalidBlock(format!(
                "bloco cheio: {projected} bytes passariam do limite de {block_size}"
            )));
        }

        match &tx {
            Transaction::Funds(tx) => self.add_funds_tx(block, tx)?,
            Transaction::Acc(tx) => self.add_acc_tx(block, tx)?,
            Transaction::Config(tx) => self.add_config_tx(block, tx)?,
        }

        self.chain.storage().write_open_tx(&tx);
        debug!(tx = %tx_hash, "Transação admitida no bloco candidato");
        Ok(())
    }

    fn add_funds_tx(&self, block: &mut Block, tx: &FundsTx) -> Result<()> {
        // remetente e destinatário entram na sombra no primeiro toque
        self.stage_account(block, tx.from)?;
        self.stage_account(block, tx.to)?;

        let sender = block.state_copy[&tx.from];
        let receiver = block.state_copy[&tx.to];

        // igualdade estrita, sem janela
        if sender.tx_count != tx.tx_count {
            return Err(ChainError::TxCountMismatch {
                expected: sender.tx_count,
                got: tx.tx_count,
            });
        }

        let cost = tx
            .amount
            .checked_add(tx.fee)
            .ok_or(ChainError::AmountInvalid(tx.amount))?;

        let is_root = self.chain.storage().is_root_key(tx.from);
        if !is_root && sender.balance < cost {
            return Err(ChainError::InsufficientFunds {
                needed: cost,
                available: sender.balance,
            });
        }

        let credited = receiver
            .balance
            .checked_add(tx.amount)
            .filter(|balance| *balance <= MAX_MONEY)
            .ok_or_else(|| ChainError::OverflowAtReceiver(tx.to.to_string()))?;

        // aplica a mutação na sombra
        if let Some(sender) = block.state_copy.get_mut(&tx.from) {
            sender.tx_count += 1;
            if !is_root {
                sender.balance -= cost;
            }
        }
        if let Some(receiver) = block.state_copy.get_mut(&tx.to) {
            receiver.balance = credited;
        }

        block.funds_tx_hashes.push(tx.hash());
        Ok(())
    }

    fn add_acc_tx(&self, block: &mut Block, tx: &AccTx) -> Result<()> {
        let id = tx.account_id();
        if self.chain.storage().account_exists(id) {
            return Err(ChainError::AccountExists(id.to_string()));
        }
        block.acc_tx_hashes.push(tx.hash());
        Ok(())
    }

    fn add_config_tx(&self, block: &mut Block, tx: &ConfigTx) -> Result<()> {
        // efeitos ficam para a pós-validação; aqui só a faixa é conferida
        parameter_bounds_check(tx.id, tx.payload)?;
        block.config_tx_hashes.push(tx.hash());
        Ok(())
    }

    /// Copia uma conta do estado autoritativo para a sombra, conferindo a
    /// integridade do índice pelo re-hash do endereço
    fn stage_account(&self, block: &mut Block, id: Hash256) -> Result<()> {
        if block.state_copy.contains_key(&id) {
            return Ok(());
        }

        let account = self
            .chain
            .storage()
            .get_account(id)
            .ok_or_else(|| ChainError::AccountNotFound(id.to_string()))?;

        if account.id() != id {
            return Err(ChainError::InvalidTransaction(
                "hash de conta não corresponde ao endereço no estado".to_string(),
            ));
        }

        block.state_copy.insert(id, account);
        Ok(())
    }

    /// Fecha o candidato: merkle root, timestamp, hash parcial, prova de
    /// trabalho e contagens
    ///
    /// # Errors
    ///
    /// `MiningAborted` se outro bloco virar o topo durante a busca de nonce
    #[allow(clippy::cast_possible_truncation)] // contagens limitadas pelos campos de 16/8 bits
    pub fn finalize(&self, block: &mut Block) -> Result<()> {
        block.merkle_root = build_merkle_root(
            &block.funds_tx_hashes,
            &block.acc_tx_hashes,
            &block.config_tx_hashes,
        );
        block.timestamp = Utc::now().timestamp();
        block.beneficiary = self.beneficiary;

        let partial_hash = block.partial_hash();
        let difficulty = self.chain.difficulty();
        let nonce = proof_of_work(difficulty, partial_hash, self.chain.tip_signal())?;

        // o nonce de 8 bytes entra alinhado à direita no campo de 9
        block.nonce = [0u8; PROOF_SIZE];
        block.nonce[PROOF_SIZE - nonce.len()..].copy_from_slice(&nonce);
        block.hash = pow_candidate(u64::from_be_bytes(nonce), &partial_hash);

        block.n_funds = block.funds_tx_hashes.len() as u16;
        block.n_acc = block.acc_tx_hashes.len() as u16;
        block.n_config = block.config_tx_hashes.len() as u8;

        info!(hash = %block.hash, n_funds = block.n_funds, "Bloco candidato finalizado");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::validate_proof_of_work;
    use shared::KeyPair;
    use vintem_protocol::params::FEE_MINIMUM_ID;
    use vintem_protocol::{Account, Address, Parameters};

    fn chain_with_accounts() -> (Chain, KeyPair, Hash256, Hash256, Hash256) {
        let chain = Chain::new(Parameters::default(), 4);

        let alice = KeyPair::generate().unwrap();
        let mut alice_account = Account::new(Address::from_bytes(*alice.public_key.as_bytes()));
        alice_account.balance = 100;
        chain.register_account(alice_account);

        let bob = KeyPair::generate().unwrap();
        let bob_account = Account::new(Address::from_bytes(*bob.public_key.as_bytes()));
        chain.register_account(bob_account);

        let miner = KeyPair::generate().unwrap();
        let miner_account = Account::new(Address::from_bytes(*miner.public_key.as_bytes()));
        chain.register_account(miner_account);

        (
            chain,
            alice,
            alice_account.id(),
            bob_account.id(),
            miner_account.id(),
        )
    }

    fn signed_funds_tx(
        sender: &KeyPair,
        amount: u64,
        fee: u64,
        tx_count: u64,
        from: Hash256,
        to: Hash256,
    ) -> Transaction {
        let mut tx = FundsTx::new(amount, fee, tx_count, from, to);
        tx.sign(sender).unwrap();
        Transaction::Funds(tx)
    }

    #[test]
    fn test_add_tx_updates_shadow_not_state() {
        let (chain, alice, alice_id, bob_id, miner_id) = chain_with_accounts();
        let builder = BlockBuilder::new(&chain, miner_id);
        let mut block = builder.new_block(chain.tip());

        let tx = signed_funds_tx(&alice, 40, 1, 0, alice_id, bob_id);
        builder.add_tx(&mut block, tx).unwrap();

        // a sombra reflete a transferência
        assert_eq!(block.state_copy[&alice_id].balance, 59);
        assert_eq!(block.state_copy[&alice_id].tx_count, 1);
        assert_eq!(block.state_copy[&bob_id].balance, 40);
        assert_eq!(block.funds_tx_hashes.len(), 1);

        // o estado autoritativo fica intocado
        assert_eq!(chain.storage().get_account(alice_id).unwrap().balance, 100);
        assert_eq!(chain.storage().get_account(bob_id).unwrap().balance, 0);

        // e a transação está aberta no armazenamento
        assert!(chain.storage().read_open_tx(tx.hash()).is_some());
    }

    #[test]
    fn test_fee_below_minimum_rejected() {
        let (chain, alice, alice_id, bob_id, miner_id) = chain_with_accounts();
        let builder = BlockBuilder::new(&chain, miner_id);
        let mut block = builder.new_block(chain.tip());

        let tx = signed_funds_tx(&alice, 40, 0, 0, alice_id, bob_id);
        assert!(matches!(
            builder.add_tx(&mut block, tx),
            Err(ChainError::FeeTooLow { .. })
        ));
    }

    #[test]
    fn test_tx_count_gap_rejected() {
        // Cenário: tx_count 2 com a conta ainda em 0
        let (chain, alice, alice_id, bob_id, miner_id) = chain_with_accounts();
        let builder = BlockBuilder::new(&chain, miner_id);
        let mut block = builder.new_block(chain.tip());

        let tx = signed_funds_tx(&alice, 10, 1, 2, alice_id, bob_id);
        match builder.add_tx(&mut block, tx) {
            Err(ChainError::TxCountMismatch { expected: 0, got: 2 }) => (),
            other => panic!("esperava TxCountMismatch, obteve {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_funds_rejected() {
        let (chain, alice, alice_id, bob_id, miner_id) = chain_with_accounts();
        let builder = BlockBuilder::new(&chain, miner_id);
        let mut block = builder.new_block(chain.tip());

        let tx = signed_funds_tx(&alice, 100, 1, 0, alice_id, bob_id);
        assert!(matches!(
            builder.add_tx(&mut block, tx),
            Err(ChainError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_sequential_txs_share_the_shadow() {
        let (chain, alice, alice_id, bob_id, miner_id) = chain_with_accounts();
        let builder = BlockBuilder::new(&chain, miner_id);
        let mut block = builder.new_block(chain.tip());

        // segunda transação usa o tx_count já avançado na sombra
        builder
            .add_tx(&mut block, signed_funds_tx(&alice, 30, 1, 0, alice_id, bob_id))
            .unwrap();
        builder
            .add_tx(&mut block, signed_funds_tx(&alice, 30, 1, 1, alice_id, bob_id))
            .unwrap();

        assert_eq!(block.state_copy[&alice_id].balance, 100 - 31 - 31);
        assert_eq!(block.state_copy[&bob_id].balance, 60);
        assert_eq!(block.funds_tx_hashes.len(), 2);
    }

    #[test]
    fn test_acc_tx_for_existing_account_rejected() {
        let (chain, _alice, alice_id, _bob_id, miner_id) = chain_with_accounts();
        let root = KeyPair::generate().unwrap();
        chain.register_root_account(Account::new(Address::from_bytes(
            *root.public_key.as_bytes(),
        )));

        let builder = BlockBuilder::new(&chain, miner_id);
        let mut block = builder.new_block(chain.tip());

        // recria a conta da alice: o hash do pub_key já existe no estado
        let existing = chain.storage().get_account(alice_id).unwrap();
        let mut tx = AccTx::new(1, existing.address);
        tx.sign(&root).unwrap();

        assert!(matches!(
            builder.add_tx(&mut block, Transaction::Acc(tx)),
            Err(ChainError::AccountExists(_))
        ));
    }

    #[test]
    fn test_config_tx_out_of_bounds_rejected() {
        let (chain, _alice, _alice_id, _bob_id, miner_id) = chain_with_accounts();
        let root = KeyPair::generate().unwrap();
        chain.register_root_account(Account::new(Address::from_bytes(
            *root.public_key.as_bytes(),
        )));

        let builder = BlockBuilder::new(&chain, miner_id);
        let mut block = builder.new_block(chain.tip());

        let mut tx = ConfigTx::new(FEE_MINIMUM_ID, 0, 1);
        tx.sign(&root).unwrap();
        assert!(matches!(
            builder.add_tx(&mut block, Transaction::Config(tx)),
            Err(ChainError::ParameterOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_finalize_produces_valid_pow_and_counts() {
        let (chain, alice, alice_id, bob_id, miner_id) = chain_with_accounts();
        let builder = BlockBuilder::new(&chain, miner_id);
        let mut block = builder.new_block(chain.tip());

        builder
            .add_tx(&mut block, signed_funds_tx(&alice, 40, 1, 0, alice_id, bob_id))
            .unwrap();
        builder.finalize(&mut block).unwrap();

        assert_eq!(block.n_funds, 1);
        assert_eq!(block.beneficiary, miner_id);
        assert!(validate_proof_of_work(chain.difficulty(), &block.hash));

        // o hash final fecha com o nonce sem zeros + hash parcial
        let mut buf = Vec::new();
        buf.extend_from_slice(block.unpadded_nonce());
        buf.extend_from_slice(block.partial_hash().as_bytes());
        assert_eq!(block.hash, Hash256::sha3_256(&buf));
    }
}
