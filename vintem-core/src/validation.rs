//! Pipeline de validação de blocos
//!
//! A validação roda inteira sob a trava global de blocos e é dividida em
//! três estágios: pré-validação (sintaxe, assinaturas, PoW e merkle, sem
//! tocar no estado), validação de estado (fundos, contas, taxas e
//! recompensa, cada passo com inversa) e pós-validação (transações de
//! abertas para fechadas, efeitos de configuração, persistência e
//! estatísticas).
//!
//! A cadeia nova inteira é pré-validada antes de qualquer mudança de
//! estado: isso barra o ataque de uma cadeia longa falsa com só alguns
//! blocos válidos, e as transações buscadas ficam guardadas para a
//! validação de estado não re-buscar nada.

use crate::chain::Chain;
use crate::interface::PeerHandle;
use crate::pow::validate_proof_of_work;
use crate::state::{
    acc_state_change, acc_state_change_rollback, collect_block_reward,
    collect_block_reward_rollback, collect_tx_fees, collect_tx_fees_rollback,
    funds_state_change, funds_state_change_rollback,
};
use crate::verification::{verify_acc_tx, verify_config_tx, verify_funds_tx};
use shared::{ChainError, Hash256, Result};
use tracing::{info, warn};
use vintem_protocol::{
    build_merkle_root, wire, AccTx, Block, ConfigTx, FundsTx, Transaction,
};

/// Payloads de um bloco pré-validado, prontos para a validação de estado
struct BlockData {
    funds: Vec<FundsTx>,
    accs: Vec<AccTx>,
    configs: Vec<ConfigTx>,
    block: Block,
}

/// Valida um bloco recebido, reorganizando a cadeia se ele encabeçar uma
/// concorrente mais longa
///
/// # Errors
///
/// Erros de posicionamento (`NoCommonAncestor`, `ChainNotLonger`), de
/// pré-validação (PoW, merkle, busca de transações) ou de estado. Blocos
/// da lista de aplicação já confirmados antes de uma falha tardia
/// permanecem confirmados; a cadeia resultante continua válida.
pub fn validate_block(chain: &Chain, peers: &PeerHandle, block: Block) -> Result<()> {
    let _guard = chain.lock_validation();

    let (rollback, apply) = chain.get_block_sequences(&block, peers)?;

    let mut staged = Vec::with_capacity(apply.len());
    for candidate in apply {
        staged.push(pre_validation(chain, peers, candidate)?);
    }

    for confirmed in &rollback {
        validate_block_rollback_locked(chain, confirmed)?;
    }

    for data in staged {
        state_validation(chain, &data)?;
        post_validation(chain, data);
    }

    Ok(())
}

/// Reverte um bloco confirmado, devolvendo suas transações ao conjunto de
/// abertas e o bloco ao conjunto de abertos
///
/// # Errors
///
/// Retorna erro se alguma transação do bloco não estiver no índice de
/// fechadas
pub fn validate_block_rollback(chain: &Chain, block: &Block) -> Result<()> {
    let _guard = chain.lock_validation();
    validate_block_rollback_locked(chain, block)
}

fn pre_validation(chain: &Chain, peers: &PeerHandle, block: Block) -> Result<BlockData> {
    let storage = chain.storage();

    let mut funds = Vec::with_capacity(block.funds_tx_hashes.len());
    for tx_hash in &block.funds_tx_hashes {
        let tx = load_tx(chain, peers, *tx_hash, wire::FUNDSTX_REQ)?;
        let Some(tx) = tx.as_funds().copied() else {
            return Err(ChainError::InvalidTransaction(format!(
                "{tx_hash} não é uma FundsTx"
            )));
        };
        verify_funds_tx(storage, &tx)?;
        funds.push(tx);
    }

    let mut accs = Vec::with_capacity(block.acc_tx_hashes.len());
    for tx_hash in &block.acc_tx_hashes {
        let tx = load_tx(chain, peers, *tx_hash, wire::ACCTX_REQ)?;
        let Some(tx) = tx.as_acc().copied() else {
            return Err(ChainError::InvalidTransaction(format!(
                "{tx_hash} não é uma AccTx"
            )));
        };
        verify_acc_tx(storage, &tx)?;
        accs.push(tx);
    }

    let mut configs = Vec::with_capacity(block.config_tx_hashes.len());
    for tx_hash in &block.config_tx_hashes {
        let tx = load_tx(chain, peers, *tx_hash, wire::CONFIGTX_REQ)?;
        let Some(tx) = tx.as_config().copied() else {
            return Err(ChainError::InvalidTransaction(format!(
                "{tx_hash} não é uma ConfigTx"
            )));
        };
        verify_config_tx(storage, &tx)?;
        configs.push(tx);
    }

    if !storage.account_exists(block.beneficiary) {
        return Err(ChainError::BeneficiaryMissing(block.beneficiary.to_string()));
    }

    // prova de trabalho: nonce sem zeros à esquerda + hash parcial
    let partial_hash = block.partial_hash();
    let mut buf = Vec::with_capacity(block.unpadded_nonce().len() + 32);
    buf.extend_from_slice(block.unpadded_nonce());
    buf.extend_from_slice(partial_hash.as_bytes());

    if Hash256::sha3_256(&buf) != block.hash
        || !validate_proof_of_work(chain.difficulty(), &block.hash)
    {
        return Err(ChainError::PoWInvalid);
    }

    let merkle_root = build_merkle_root(
        &block.funds_tx_hashes,
        &block.acc_tx_hashes,
        &block.config_tx_hashes,
    );
    if merkle_root != block.merkle_root {
        return Err(ChainError::MerkleMismatch);
    }

    Ok(BlockData {
        funds,
        accs,
        configs,
        block,
    })
}

/// Carrega uma transação do índice de abertas ou a busca num peer
fn load_tx(chain: &Chain, peers: &PeerHandle, tx_hash: Hash256, kind: u8) -> Result<Transaction> {
    let storage = chain.storage();

    if storage.read_closed_tx(tx_hash).is_some() {
        return Err(ChainError::DuplicateTx(tx_hash.to_string()));
    }

    if let Some(tx) = storage.read_open_tx(tx_hash) {
        return Ok(tx);
    }

    let bytes = peers.tx_request(tx_hash, kind)?;
    let tx = match kind {
        wire::FUNDSTX_REQ => Transaction::Funds(FundsTx::decode(&bytes)?),
        wire::ACCTX_REQ => Transaction::Acc(AccTx::decode(&bytes)?),
        wire::CONFIGTX_REQ => Transaction::Config(ConfigTx::decode(&bytes)?),
        _ => {
            return Err(ChainError::TxFetchFailed(format!(
                "tipo de requisição desconhecido: {kind}"
            )))
        }
    };

    if tx.hash() != tx_hash {
        return Err(ChainError::TxFetchFailed(format!(
            "resposta do peer não corresponde ao hash pedido {tx_hash}"
        )));
    }

    Ok(tx)
}

/// Aplica as mudanças de estado do bloco na ordem fixa
/// {fundos, contas, taxas, recompensa}; qualquer falha desfaz os passos
/// anteriores em ordem reversa
fn state_validation(chain: &Chain, data: &BlockData) -> Result<()> {
    let storage = chain.storage();
    let beneficiary = data.block.beneficiary;

    funds_state_change(storage, &data.funds)?;

    if let Err(e) = acc_state_change(storage, &data.accs) {
        funds_state_change_rollback(storage, &data.funds);
        return Err(e);
    }

    if let Err(e) = collect_tx_fees(storage, &data.funds, &data.accs, &data.configs, beneficiary) {
        acc_state_change_rollback(storage, &data.accs);
        funds_state_change_rollback(storage, &data.funds);
        return Err(e);
    }

    let reward = chain.active_params().block_reward;
    if let Err(e) = collect_block_reward(storage, reward, beneficiary) {
        collect_tx_fees_rollback(storage, &data.funds, &data.accs, &data.configs, beneficiary);
        acc_state_change_rollback(storage, &data.accs);
        funds_state_change_rollback(storage, &data.funds);
        return Err(e);
    }

    Ok(())
}

/// Move as transações do bloco de abertas para fechadas, põe os parâmetros
/// novos em vigor, persiste o bloco e atualiza topo e estatísticas
fn post_validation(chain: &Chain, data: BlockData) {
    let storage = chain.storage();

    for tx in &data.funds {
        let tx = Transaction::Funds(*tx);
        storage.write_closed_tx(&tx);
        storage.delete_open_tx(tx.hash());
    }
    for tx in &data.accs {
        let tx = Transaction::Acc(*tx);
        storage.write_closed_tx(&tx);
        storage.delete_open_tx(tx.hash());
    }
    for tx in &data.configs {
        let tx = Transaction::Config(*tx);
        storage.write_closed_tx(&tx);
        storage.delete_open_tx(tx.hash());
    }

    // os parâmetros novos valem a partir do bloco validado
    chain.install_config(&data.configs, data.block.hash);
    chain.record_block(&data.block);

    let mut block = data.block;
    block.state_copy.clear();

    // o bloco pode nem estar no conjunto de abertos; não faz diferença
    storage.delete_open_block(block.hash);
    storage.write_closed_block(&block);
    chain.set_tip(block.hash);

    info!(hash = %block.hash, "Bloco validado e estado atualizado");
}

fn validate_block_rollback_locked(chain: &Chain, block: &Block) -> Result<()> {
    let storage = chain.storage();

    // relê as transações do bloco a partir do índice de fechadas
    let mut funds = Vec::with_capacity(block.funds_tx_hashes.len());
    for tx_hash in &block.funds_tx_hashes {
        match storage.read_closed_tx(*tx_hash) {
            Some(Transaction::Funds(tx)) => funds.push(tx),
            _ => return Err(missing_closed_tx(*tx_hash)),
        }
    }
    let mut accs = Vec::with_capacity(block.acc_tx_hashes.len());
    for tx_hash in &block.acc_tx_hashes {
        match storage.read_closed_tx(*tx_hash) {
            Some(Transaction::Acc(tx)) => accs.push(tx),
            _ => return Err(missing_closed_tx(*tx_hash)),
        }
    }
    let mut configs = Vec::with_capacity(block.config_tx_hashes.len());
    for tx_hash in &block.config_tx_hashes {
        match storage.read_closed_tx(*tx_hash) {
            Some(Transaction::Config(tx)) => configs.push(tx),
            _ => return Err(missing_closed_tx(*tx_hash)),
        }
    }

    // primeiro o conjunto de parâmetros do bloco sai de vigor, para que a
    // recompensa desfeita seja a mesma que foi creditada
    chain.rewind_config(&configs, block.hash);

    // inversas na ordem contrária à aplicação
    let reward = chain.active_params().block_reward;
    collect_block_reward_rollback(storage, reward, block.beneficiary);
    collect_tx_fees_rollback(storage, &funds, &accs, &configs, block.beneficiary);
    acc_state_change_rollback(storage, &accs);
    funds_state_change_rollback(storage, &funds);

    // transações fechadas voltam ao conjunto de abertas
    for tx in &funds {
        let tx = Transaction::Funds(*tx);
        storage.delete_closed_tx(tx.hash());
        storage.write_open_tx(&tx);
    }
    for tx in &accs {
        let tx = Transaction::Acc(*tx);
        storage.delete_closed_tx(tx.hash());
        storage.write_open_tx(&tx);
    }
    for tx in &configs {
        let tx = Transaction::Config(*tx);
        storage.delete_closed_tx(tx.hash());
        storage.write_open_tx(&tx);
    }

    // o bloco sai da cadeia principal e volta ao conjunto de abertos
    storage.delete_closed_block(block.hash);
    storage.write_open_block(block);
    chain.forget_block(block);
    chain.set_tip(block.prev_hash);

    info!(hash = %block.hash, "Bloco revertido");
    Ok(())
}

fn missing_closed_tx(tx_hash: Hash256) -> ChainError {
    warn!(tx = %tx_hash, "Transação fechada ausente durante rollback");
    ChainError::InvalidBlock(format!(
        "transação fechada ausente no rollback: {tx_hash}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BlockBuilder;
    use crate::interface::{peer_channel, PeerEndpoint, PeerHandle};
    use shared::KeyPair;
    use std::time::Duration;
    use vintem_protocol::{Account, Address, Parameters};

    const TEST_DIFFICULTY: u8 = 4;

    struct Harness {
        chain: Chain,
        peers: PeerHandle,
        endpoint: Option<PeerEndpoint>,
        alice: KeyPair,
        alice_id: Hash256,
        bob_id: Hash256,
        miner_id: Hash256,
    }

    fn harness() -> Harness {
        let chain = Chain::new(Parameters::default(), TEST_DIFFICULTY);
        let (peers, endpoint) = peer_channel(16, Duration::from_millis(50));

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

        Harness {
            chain,
            peers,
            endpoint: Some(endpoint),
            alice,
            alice_id: alice_account.id(),
            bob_id: bob_account.id(),
            miner_id: miner_account.id(),
        }
    }

    fn funds_tx(h: &Harness, amount: u64, tx_count: u64) -> Transaction {
        let mut tx = FundsTx::new(amount, 1, tx_count, h.alice_id, h.bob_id);
        tx.sign(&h.alice).unwrap();
        Transaction::Funds(tx)
    }

    fn mine_block(h: &Harness, prev_hash: Hash256, txs: &[Transaction]) -> Block {
        let builder = BlockBuilder::new(&h.chain, h.miner_id);
        let mut block = builder.new_block(prev_hash);
        for tx in txs {
            builder.add_tx(&mut block, *tx).unwrap();
        }
        builder.finalize(&mut block).unwrap();
        block
    }

    fn balance(h: &Harness, id: Hash256) -> u64 {
        h.chain.storage().get_account(id).unwrap().balance
    }

    #[test]
    fn test_scenario_a_happy_path_single_tx() {
        let h = harness();
        let reward = h.chain.active_params().block_reward;

        let tx = funds_tx(&h, 40, 0);
        let block = mine_block(&h, h.chain.tip(), &[tx]);
        validate_block(&h.chain, &h.peers, block.clone()).unwrap();

        let alice = h.chain.storage().get_account(h.alice_id).unwrap();
        assert_eq!(alice.balance, 59);
        assert_eq!(alice.tx_count, 1);
        assert_eq!(balance(&h, h.bob_id), 40);
        assert_eq!(balance(&h, h.miner_id), 1 + reward);

        // transação fechada, bloco confirmado, topo atualizado
        assert!(h.chain.storage().read_closed_tx(tx.hash()).is_some());
        assert!(h.chain.storage().read_open_tx(tx.hash()).is_none());
        assert_eq!(h.chain.tip(), block.hash);
        assert_eq!(h.chain.stats().height, 1);
    }

    #[test]
    fn test_scenario_b_duplicate_tx_rejected() {
        let h = harness();

        let tx = funds_tx(&h, 40, 0);
        let first = mine_block(&h, h.chain.tip(), &[tx]);
        validate_block(&h.chain, &h.peers, first.clone()).unwrap();

        // o mesmo hash num segundo bloco é barrado na pré-validação
        let mut second = Block::new(first.hash);
        second.hash = Hash256::sha3_256(b"segundo bloco");
        second.funds_tx_hashes.push(tx.hash());
        second.beneficiary = h.miner_id;
        second.merkle_root = build_merkle_root(&second.funds_tx_hashes, &[], &[]);

        match validate_block(&h.chain, &h.peers, second) {
            Err(ChainError::DuplicateTx(_)) => (),
            other => panic!("esperava DuplicateTx, obteve {other:?}"),
        }

        // e o montador também rejeita na admissão
        let builder = BlockBuilder::new(&h.chain, h.miner_id);
        let mut candidate = builder.new_block(h.chain.tip());
        assert!(matches!(
            builder.add_tx(&mut candidate, tx),
            Err(ChainError::DuplicateTx(_))
        ));
    }

    #[test]
    fn test_scenario_d_reorg_to_longer_chain() {
        let h = harness();
        let reward = h.chain.active_params().block_reward;
        let genesis = h.chain.tip();

        // cadeia 1: dois blocos confirmados, o primeiro movimenta fundos
        let tx = funds_tx(&h, 40, 0);
        let b1 = mine_block(&h, genesis, &[tx]);
        validate_block(&h.chain, &h.peers, b1.clone()).unwrap();
        let b2 = mine_block(&h, b1.hash, &[]);
        validate_block(&h.chain, &h.peers, b2.clone()).unwrap();

        assert_eq!(balance(&h, h.alice_id), 59);
        assert_eq!(balance(&h, h.miner_id), 1 + 2 * reward);

        // cadeia 2: três blocos vazios a partir do mesmo ancestral, com
        // outro beneficiário
        let rival = KeyPair::generate().unwrap();
        let rival_account = Account::new(Address::from_bytes(*rival.public_key.as_bytes()));
        h.chain.register_account(rival_account);
        let rival_builder = BlockBuilder::new(&h.chain, rival_account.id());

        let mut c1 = rival_builder.new_block(genesis);
        rival_builder.finalize(&mut c1).unwrap();
        let mut c2 = rival_builder.new_block(c1.hash);
        rival_builder.finalize(&mut c2).unwrap();
        let mut c3 = rival_builder.new_block(c2.hash);
        rival_builder.finalize(&mut c3).unwrap();

        // c1 e c2 já são conhecidos como blocos abertos; c3 chega por último
        h.chain.storage().write_open_block(&c1);
        h.chain.storage().write_open_block(&c2);
        validate_block(&h.chain, &h.peers, c3.clone()).unwrap();

        // os dois blocos da cadeia 1 foram revertidos em ordem reversa e os
        // três da cadeia 2 aplicados: o estado final é o da cadeia 2
        assert_eq!(h.chain.tip(), c3.hash);
        assert_eq!(balance(&h, h.alice_id), 100);
        assert_eq!(balance(&h, h.bob_id), 0);
        assert_eq!(balance(&h, h.miner_id), 0);
        assert_eq!(balance(&h, rival_account.id()), 3 * reward);
        assert_eq!(h.chain.stats().height, 3);

        // a transferência da cadeia 1 voltou para o conjunto de abertas
        assert!(h.chain.storage().read_open_tx(tx.hash()).is_some());
        assert!(h.chain.storage().read_closed_tx(tx.hash()).is_none());

        // blocos antigos agora são abertos; os novos, confirmados
        assert!(h.chain.storage().read_open_block(b1.hash).is_some());
        assert!(h.chain.storage().read_open_block(b2.hash).is_some());
        assert!(h.chain.storage().read_closed_block(c3.hash).is_some());
    }

    #[test]
    fn test_shorter_competing_chain_rejected() {
        let h = harness();
        let genesis = h.chain.tip();

        let b1 = mine_block(&h, genesis, &[]);
        validate_block(&h.chain, &h.peers, b1.clone()).unwrap();
        let b2 = mine_block(&h, b1.hash, &[]);
        validate_block(&h.chain, &h.peers, b2).unwrap();

        // concorrente de comprimento 1 a partir do gênese
        let c1 = mine_block(&h, genesis, &[]);
        assert!(matches!(
            validate_block(&h.chain, &h.peers, c1),
            Err(ChainError::ChainNotLonger)
        ));
    }

    #[test]
    fn test_validate_then_rollback_restores_state() {
        let h = harness();

        let before_state = h.chain.storage().state_snapshot();
        let before_tip = h.chain.tip();

        let block = mine_block(&h, h.chain.tip(), &[funds_tx(&h, 40, 0)]);
        validate_block(&h.chain, &h.peers, block.clone()).unwrap();
        assert_ne!(h.chain.storage().state_snapshot(), before_state);

        // a lei de ida e volta: rollback restaura o estado byte a byte
        validate_block_rollback(&h.chain, &block).unwrap();
        assert_eq!(h.chain.storage().state_snapshot(), before_state);
        assert_eq!(h.chain.tip(), before_tip);
        assert_eq!(h.chain.stats().height, 0);
    }

    #[test]
    fn test_money_conservation_across_blocks() {
        let h = harness();
        let reward = h.chain.active_params().block_reward;

        let total_before: u64 = h
            .chain
            .storage()
            .state_snapshot()
            .values()
            .map(|account| account.balance)
            .sum();

        let b1 = mine_block(&h, h.chain.tip(), &[funds_tx(&h, 40, 0)]);
        validate_block(&h.chain, &h.peers, b1.clone()).unwrap();
        let b2 = mine_block(&h, b1.hash, &[funds_tx(&h, 9, 1)]);
        validate_block(&h.chain, &h.peers, b2).unwrap();

        // taxas são redistribuídas, não destruídas: só as recompensas
        // entram de novo em circulação
        let total_after: u64 = h
            .chain
            .storage()
            .state_snapshot()
            .values()
            .map(|account| account.balance)
            .sum();
        assert_eq!(total_after, total_before + 2 * reward);
    }

    #[test]
    fn test_missing_tx_is_fetched_from_peers() {
        let mut h = harness();

        let tx = funds_tx(&h, 40, 0);
        let block = mine_block(&h, h.chain.tip(), &[tx]);

        // a transação some do conjunto de abertas antes da validação
        h.chain.storage().delete_open_tx(tx.hash());

        // peer de empréstimo: responde a única busca com os bytes da tx
        let encoded = tx.encode();
        let endpoint = h.endpoint.take().unwrap();
        let server = std::thread::spawn(move || {
            let request = endpoint.requests.recv().unwrap();
            assert_eq!(request.kind, wire::FUNDSTX_REQ);
            endpoint.responses.send(encoded).unwrap();
        });

        validate_block(&h.chain, &h.peers, block).unwrap();
        server.join().unwrap();

        assert_eq!(balance(&h, h.bob_id), 40);
        assert!(h.chain.storage().read_closed_tx(tx.hash()).is_some());
    }

    #[test]
    fn test_fetch_timeout_fails_the_block() {
        let h = harness();

        let tx = funds_tx(&h, 40, 0);
        let block = mine_block(&h, h.chain.tip(), &[tx]);
        h.chain.storage().delete_open_tx(tx.hash());

        // ninguém responde: o prazo expira e o bloco falha sem tocar o estado
        let before = h.chain.storage().state_snapshot();
        match validate_block(&h.chain, &h.peers, block) {
            Err(ChainError::TxFetchTimeout) => (),
            other => panic!("esperava TxFetchTimeout, obteve {other:?}"),
        }
        assert_eq!(h.chain.storage().state_snapshot(), before);
    }

    #[test]
    fn test_tampered_pow_rejected() {
        let h = harness();

        let mut block = mine_block(&h, h.chain.tip(), &[funds_tx(&h, 40, 0)]);
        let mut bytes = *block.hash.as_bytes();
        bytes[31] ^= 0x01;
        block.hash = Hash256::from_bytes(bytes);

        assert!(matches!(
            validate_block(&h.chain, &h.peers, block),
            Err(ChainError::PoWInvalid)
        ));
    }

    #[test]
    fn test_tampered_merkle_rejected() {
        let h = harness();

        let tx_a = funds_tx(&h, 30, 0);
        let block = mine_block(&h, h.chain.tip(), &[tx_a]);

        // troca a lista de hashes sem reminerar: o merkle deixa de conferir
        let mut tampered = block.clone();
        let tx_b = funds_tx(&h, 10, 1);
        h.chain.storage().write_open_tx(&tx_b);
        tampered.funds_tx_hashes.push(tx_b.hash());

        let result = validate_block(&h.chain, &h.peers, tampered);
        assert!(matches!(result, Err(ChainError::MerkleMismatch)));
    }

    #[test]
    fn test_missing_beneficiary_rejected() {
        let h = harness();

        let builder = BlockBuilder::new(&h.chain, Hash256::sha3_256(b"desconhecido"));
        let mut block = builder.new_block(h.chain.tip());
        builder.finalize(&mut block).unwrap();

        assert!(matches!(
            validate_block(&h.chain, &h.peers, block),
            Err(ChainError::BeneficiaryMissing(_))
        ));
    }

    #[test]
    fn test_config_block_changes_parameters_and_rewinds() {
        let h = harness();
        let root = KeyPair::generate().unwrap();
        h.chain.register_root_account(Account::new(Address::from_bytes(
            *root.public_key.as_bytes(),
        )));

        let mut config = ConfigTx::new(vintem_protocol::params::FEE_MINIMUM_ID, 5, 1);
        config.sign(&root).unwrap();

        let block = mine_block(&h, h.chain.tip(), &[Transaction::Config(config)]);
        validate_block(&h.chain, &h.peers, block.clone()).unwrap();
        assert_eq!(h.chain.active_params().fee_minimum, 5);

        // reverter o bloco rebobina o conjunto de parâmetros junto
        validate_block_rollback(&h.chain, &block).unwrap();
        assert_eq!(
            h.chain.active_params().fee_minimum,
            Parameters::default().fee_minimum
        );
    }

    #[test]
    fn test_acc_block_creates_account_and_rollback_deletes_it() {
        let h = harness();
        let root = KeyPair::generate().unwrap();
        h.chain.register_root_account(Account::new(Address::from_bytes(
            *root.public_key.as_bytes(),
        )));

        let fresh = KeyPair::generate().unwrap();
        let mut acc_tx = AccTx::new(1, Address::from_bytes(*fresh.public_key.as_bytes()));
        acc_tx.sign(&root).unwrap();
        let created_id = acc_tx.account_id();

        let block = mine_block(&h, h.chain.tip(), &[Transaction::Acc(acc_tx)]);
        validate_block(&h.chain, &h.peers, block.clone()).unwrap();
        assert!(h.chain.storage().account_exists(created_id));

        validate_block_rollback(&h.chain, &block).unwrap();
        assert!(!h.chain.storage().account_exists(created_id));
    }
}
