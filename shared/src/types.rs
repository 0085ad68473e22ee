//! Tipos compartilhados entre os módulos do Vintém

use serde::{Deserialize, Serialize};

/// Configurações do nó
///
/// O transporte em si fica fora do núcleo; o que o nó configura é o
/// contrato de canais com a camada de rede.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Capacidade dos canais de entrada/saída da rede
    pub channel_capacity: usize,
    /// Prazo em segundos para buscas de transações em peers
    pub tx_fetch_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            tx_fetch_timeout_secs: 30,
        }
    }
}
