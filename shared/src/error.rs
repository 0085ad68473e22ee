use thiserror::Error;

/// Erros do minerador e da validação de cadeia
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Taxa abaixo do mínimo: {fee} (mínimo: {minimum})")]
    FeeTooLow { fee: u64, minimum: u64 },

    #[error("Assinatura inválida: {0}")]
    SignatureInvalid(String),

    #[error("Valor de transação inválido: {0}")]
    AmountInvalid(u64),

    #[error("Crédito excede MAX_MONEY na conta {0}")]
    OverflowAtReceiver(String),

    #[error("Fundos insuficientes: necessário {needed}, disponível {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("TxCount divergente: {got} (tx) vs {expected} (estado)")]
    TxCountMismatch { expected: u64, got: u64 },

    #[error("Transação já confirmada em bloco anterior: {0}")]
    DuplicateTx(String),

    #[error("Conta já existe: {0}")]
    AccountExists(String),

    #[error("Conta não encontrada no estado: {0}")]
    AccountNotFound(String),

    #[error("Parâmetro de sistema desconhecido: id {0}")]
    UnknownParameter(u8),

    #[error("Parâmetro fora dos limites: id {id}, payload {payload}")]
    ParameterOutOfBounds { id: u8, payload: u64 },

    #[error("Merkle root não confere com as transações do bloco")]
    MerkleMismatch,

    #[error("Prova de trabalho inválida")]
    PoWInvalid,

    #[error("Beneficiário ausente do estado: {0}")]
    BeneficiaryMissing(String),

    #[error("Busca de transação em peers expirou")]
    TxFetchTimeout,

    #[error("Busca de transação em peers falhou: {0}")]
    TxFetchFailed(String),

    #[error("Ancestral comum não encontrado")]
    NoCommonAncestor,

    #[error("Nova cadeia não é mais longa que a atual")]
    ChainNotLonger,

    #[error("Mineração abortada: outro bloco foi validado")]
    MiningAborted,

    #[error("Transação inválida: {0}")]
    InvalidTransaction(String),

    #[error("Bloco inválido: {0}")]
    InvalidBlock(String),

    #[error("Erro criptográfico: {0}")]
    CryptographicError(String),

    #[error("Erro de serialização: {0}")]
    SerializationError(String),

    #[error("Erro de I/O: {0}")]
    IoError(String),
}
