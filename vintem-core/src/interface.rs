//! Contrato com a camada de peers
//!
//! O núcleo não conhece sockets: conversa com a rede por canais limitados.
//! `PeerHandle` é o lado do minerador (pedidos de objetos com prazo de
//! resposta); `MinerChannels`/`NetworkChannels` são os pares de canais
//! tipados para transações e blocos em trânsito.

use shared::{ChainError, Hash256, Result};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Mutex;
use std::time::Duration;
use vintem_protocol::TxInfo;

/// Prazo padrão para respostas de busca em peers
pub const TX_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Pedido de objeto a um peer: hash e tipo de requisição (`wire::*_REQ`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerRequest {
    pub hash: Hash256,
    pub kind: u8,
}

/// Lado do minerador do canal de busca de objetos
///
/// O canal de respostas tem consumidor único; como toda busca acontece sob
/// a trava de validação, o `Mutex` interno nunca disputa.
#[derive(Debug)]
pub struct PeerHandle {
    requests: SyncSender<PeerRequest>,
    responses: Mutex<Receiver<Vec<u8>>>,
    timeout: Duration,
}

impl PeerHandle {
    /// Pede um objeto a um peer e espera a resposta com prazo
    ///
    /// # Errors
    ///
    /// `TxFetchTimeout` se o prazo esgotar; `TxFetchFailed` se a camada de
    /// rede tiver fechado os canais ou o buffer de pedidos estiver cheio
    pub fn tx_request(&self, hash: Hash256, kind: u8) -> Result<Vec<u8>> {
        self.requests
            .try_send(PeerRequest { hash, kind })
            .map_err(|e| ChainError::TxFetchFailed(e.to_string()))?;

        match self.responses.lock().unwrap().recv_timeout(self.timeout) {
            Ok(bytes) => Ok(bytes),
            Err(RecvTimeoutError::Timeout) => Err(ChainError::TxFetchTimeout),
            Err(RecvTimeoutError::Disconnected) => Err(ChainError::TxFetchFailed(
                "canal de respostas fechado".to_string(),
            )),
        }
    }
}

/// Lado da rede do canal de busca: consome pedidos, produz respostas
#[derive(Debug)]
pub struct PeerEndpoint {
    pub requests: Receiver<PeerRequest>,
    pub responses: SyncSender<Vec<u8>>,
}

/// Cria o par de canais de busca com capacidade e prazo dados
#[must_use]
pub fn peer_channel(capacity: usize, timeout: Duration) -> (PeerHandle, PeerEndpoint) {
    let (req_tx, req_rx) = sync_channel(capacity);
    let (res_tx, res_rx) = sync_channel(capacity);
    (
        PeerHandle {
            requests: req_tx,
            responses: Mutex::new(res_rx),
            timeout,
        },
        PeerEndpoint {
            requests: req_rx,
            responses: res_tx,
        },
    )
}

/// Canais tipados do lado do minerador
#[derive(Debug)]
pub struct MinerChannels {
    /// Transações vindas da rede
    pub txs_in: Receiver<TxInfo>,
    /// Blocos crus vindos da rede
    pub block_in: Receiver<Vec<u8>>,
    /// Transações aceitas, para difusão
    pub txs_out: SyncSender<TxInfo>,
    /// Blocos finalizados, para difusão
    pub block_out: SyncSender<Vec<u8>>,
}

/// Canais tipados do lado da rede
#[derive(Debug)]
pub struct NetworkChannels {
    pub txs_in: SyncSender<TxInfo>,
    pub block_in: SyncSender<Vec<u8>>,
    pub txs_out: Receiver<TxInfo>,
    pub block_out: Receiver<Vec<u8>>,
}

/// Cria os dois lados dos canais minerador <-> rede
#[must_use]
pub fn miner_channels(capacity: usize) -> (MinerChannels, NetworkChannels) {
    let (txs_in_tx, txs_in_rx) = sync_channel(capacity);
    let (block_in_tx, block_in_rx) = sync_channel(capacity);
    let (txs_out_tx, txs_out_rx) = sync_channel(capacity);
    let (block_out_tx, block_out_rx) = sync_channel(capacity);
    (
        MinerChannels {
            txs_in: txs_in_rx,
            block_in: block_in_rx,
            txs_out: txs_out_tx,
            block_out: block_out_tx,
        },
        NetworkChannels {
            txs_in: txs_in_tx,
            block_in: block_in_tx,
            txs_out: txs_out_rx,
            block_out: block_out_rx,
        },
    )
}
