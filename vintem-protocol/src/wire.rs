//! Enquadramento de pacotes e identificadores de mensagem
//!
//! Todo pacote começa com um preâmbulo de 5 bytes: comprimento do payload
//! em big-endian (4 bytes) seguido do tipo (1 byte).

use shared::{ChainError, Result};

/// Comprimento do preâmbulo de pacote
pub const HEADER_LEN: usize = 5;

pub const FUNDSTX_BRDCST: u8 = 1;
pub const ACCTX_BRDCST: u8 = 2;
pub const CONFIGTX_BRDCST: u8 = 3;
pub const BLOCK_BRDCST: u8 = 4;

pub const FUNDSTX_REQ: u8 = 10;
pub const ACCTX_REQ: u8 = 11;
pub const CONFIGTX_REQ: u8 = 12;
pub const BLOCK_REQ: u8 = 13;
pub const ACC_REQ: u8 = 14;

pub const FUNDSTX_RES: u8 = 20;
pub const ACCTX_RES: u8 = 21;
pub const CONFIGTX_RES: u8 = 22;
pub const BLOCK_RES: u8 = 23;
pub const ACC_RES: u8 = 24;

pub const NEIGHBOR_REQ: u8 = 30;
pub const NEIGHBOR_RES: u8 = 40;

pub const TIME_BRDCST: u8 = 50;

pub const MINER_PING: u8 = 100;
pub const MINER_PONG: u8 = 101;

/// Código de erro: objeto requisitado não encontrado
pub const NOT_FOUND: u8 = 110;

/// Transação tipada em trânsito entre a rede e o minerador
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInfo {
    pub tx_type: u8,
    pub payload: Vec<u8>,
}

/// Monta um pacote com preâmbulo de 5 bytes
#[must_use]
#[allow(clippy::cast_possible_truncation)] // payloads limitados pelo tamanho de bloco
pub fn build_packet(type_id: u8, payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(HEADER_LEN + payload.len());
    packet.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    packet.push(type_id);
    packet.extend_from_slice(payload);
    packet
}

/// Desmonta um pacote, devolvendo o tipo e o payload
///
/// # Errors
///
/// Retorna erro se o preâmbulo estiver truncado ou o comprimento não bater
pub fn parse_packet(packet: &[u8]) -> Result<(u8, &[u8])> {
    if packet.len() < HEADER_LEN {
        return Err(ChainError::SerializationError(format!(
            "Pacote truncado: {} bytes (preâmbulo tem {HEADER_LEN})",
            packet.len()
        )));
    }

    let declared = u32::from_be_bytes([packet[0], packet[1], packet[2], packet[3]]) as usize;
    let payload = &packet[HEADER_LEN..];
    if payload.len() != declared {
        return Err(ChainError::SerializationError(format!(
            "Payload com {} bytes, preâmbulo declara {declared}",
            payload.len()
        )));
    }

    Ok((packet[4], payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_roundtrip() {
        let payload = vec![0xDE, 0xAD, 0xBE, 0xEF];
        let packet = build_packet(BLOCK_BRDCST, &payload);
        assert_eq!(packet.len(), HEADER_LEN + payload.len());

        let (type_id, parsed) = parse_packet(&packet).unwrap();
        assert_eq!(type_id, BLOCK_BRDCST);
        assert_eq!(parsed, payload.as_slice());
    }

    #[test]
    fn test_empty_payload_packet() {
        let packet = build_packet(MINER_PING, &[]);
        let (type_id, parsed) = parse_packet(&packet).unwrap();
        assert_eq!(type_id, MINER_PING);
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        let mut packet = build_packet(FUNDSTX_BRDCST, &[1, 2, 3]);
        packet.pop();
        assert!(parse_packet(&packet).is_err());
        assert!(parse_packet(&[0, 0]).is_err());
    }
}
