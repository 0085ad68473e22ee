//! Laço de eventos do nó minerador
//!
//! Liga o núcleo aos canais do contrato de rede: transações e blocos que
//! chegam são verificados e validados; os aceitos seguem para os canais de
//! difusão. O transporte em si fica fora daqui - um stub local drena os
//! canais de saída e deixa buscas expirarem, o suficiente para operar um
//! nó solitário.

use shared::types::NodeConfig;
use shared::{ChainError, Hash256, Result};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use vintem_core::{
    miner_channels, peer_channel, validate_block, BlockBuilder, Chain, MinerChannels,
    NetworkChannels, PeerHandle,
};
use vintem_protocol::{wire, AccTx, Block, ConfigTx, FundsTx, Transaction, TxInfo};

/// Nó minerador: núcleo + canais do contrato de rede
pub struct Node {
    chain: Arc<Chain>,
    peers: Arc<PeerHandle>,
    miner_channels: MinerChannels,
    beneficiary: Hash256,
}

impl Node {
    /// Monta o nó e devolve também o lado da rede dos canais
    #[must_use]
    pub fn new(chain: Chain, beneficiary: Hash256, config: &NodeConfig) -> (Self, NetworkChannels) {
        let (miner_side, network_side) = miner_channels(config.channel_capacity);
        let (peers, endpoint) = peer_channel(
            config.channel_capacity,
            Duration::from_secs(config.tx_fetch_timeout_secs),
        );

        // stub de transporte: registra pedidos sem atendê-los
        thread::spawn(move || {
            while let Ok(request) = endpoint.requests.recv() {
                warn!(hash = %request.hash, kind = request.kind, "No peer available to serve request");
            }
        });

        (
            Self {
                chain: Arc::new(chain),
                peers: Arc::new(peers),
                miner_channels: miner_side,
                beneficiary,
            },
            network_side,
        )
    }

    /// Roda o nó: minerador próprio + consumo dos canais de entrada
    ///
    /// Bloqueia até os canais de entrada fecharem.
    pub fn run(self, mine: bool) {
        let Self {
            chain,
            peers,
            miner_channels,
            beneficiary,
        } = self;

        if mine {
            let mining_chain = Arc::clone(&chain);
            let mining_peers = Arc::clone(&peers);
            let block_out = miner_channels.block_out.clone();
            thread::spawn(move || {
                mining_loop(&mining_chain, &mining_peers, beneficiary, &block_out);
            });
        }

        let block_chain = Arc::clone(&chain);
        let block_peers = Arc::clone(&peers);
        let block_in = miner_channels.block_in;
        let block_thread = thread::spawn(move || {
            while let Ok(bytes) = block_in.recv() {
                debug!("Received a block from the network");
                handle_block(&block_chain, &block_peers, &bytes);
            }
        });

        let txs_in = miner_channels.txs_in;
        let txs_out = miner_channels.txs_out;
        while let Ok(tx_info) = txs_in.recv() {
            debug!(tx_type = tx_info.tx_type, "Received a transaction from the network");
            if handle_tx(&chain, &tx_info).is_ok() {
                // repassa adiante só o que foi aceito localmente
                let _ = txs_out.try_send(tx_info);
            }
        }

        let _ = block_thread.join();
    }
}

fn handle_tx(chain: &Chain, tx_info: &TxInfo) -> Result<()> {
    let tx = decode_tx(tx_info)?;

    if let Err(e) = vintem_core::verify(chain.storage(), &tx) {
        warn!(tx = %tx.hash(), error = %e, "Transaction rejected");
        return Err(e);
    }

    chain.storage().write_open_tx(&tx);
    debug!(tx = %tx.hash(), "Transaction accepted into the open pool");
    Ok(())
}

fn decode_tx(tx_info: &TxInfo) -> Result<Transaction> {
    match tx_info.tx_type {
        wire::FUNDSTX_BRDCST => Ok(Transaction::Funds(FundsTx::decode(&tx_info.payload)?)),
        wire::ACCTX_BRDCST => Ok(Transaction::Acc(AccTx::decode(&tx_info.payload)?)),
        wire::CONFIGTX_BRDCST => Ok(Transaction::Config(ConfigTx::decode(&tx_info.payload)?)),
        other => Err(ChainError::SerializationError(format!(
            "tipo de difusão desconhecido: {other}"
        ))),
    }
}

fn handle_block(chain: &Chain, peers: &PeerHandle, bytes: &[u8]) {
    let block = match Block::decode(bytes) {
        Ok(block) => block,
        Err(e) => {
            warn!(error = %e, "Discarding undecodable block");
            return;
        }
    };

    let hash = block.hash;
    match validate_block(chain, peers, block) {
        Ok(()) => info!(block = %hash, "Block accepted"),
        Err(e) => warn!(block = %hash, error = %e, "Block rejected"),
    }
}

fn mining_loop(
    chain: &Chain,
    peers: &PeerHandle,
    beneficiary: Hash256,
    block_out: &std::sync::mpsc::SyncSender<Vec<u8>>,
) {
    let builder = BlockBuilder::new(chain, beneficiary);

    loop {
        let mut block = builder.new_block(chain.tip());

        // todo o pool de abertas concorre a entrar no candidato
        for tx in chain.storage().open_txs() {
            if let Err(e) = builder.add_tx(&mut block, tx) {
                debug!(tx = %tx.hash(), error = %e, "Transaction left out of the candidate");
            }
        }

        match builder.finalize(&mut block) {
            Ok(()) => {
                let encoded = block.encode();
                if let Err(e) = validate_block(chain, peers, block) {
                    warn!(error = %e, "Mined block failed local validation");
                    continue;
                }
                let _ = block_out.try_send(encoded);
            }
            Err(ChainError::MiningAborted) => {
                // outro bloco ganhou a corrida; recomeça do topo novo
                debug!("Mining aborted, restarting from the new tip");
            }
            Err(e) => {
                warn!(error = %e, "Mining failed");
                thread::sleep(Duration::from_secs(1));
            }
        }
    }
}
