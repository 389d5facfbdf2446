/// Erros de parsing do protocolo RESP.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame incompleto")]
    Incomplete,
    #[error("byte de tipo inválido: {0:#x}")]
    InvalidFrameType(u8),
    #[error("inteiro inválido: {0}")]
    InvalidInteger(String),
    #[error("comprimento de bulk inválido: {0}")]
    InvalidBulkLength(i64),
    #[error("frame excede tamanho máximo ({0} bytes)")]
    FrameTooLarge(usize),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
}

/// Erros do keyspace em memória.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("invalid range")]
    InvalidRange,
}

/// Erros da camada de persistência (AOF e snapshot).
/// Nunca propagam para o caminho de comandos: são logados e engolidos
/// na fronteira de persistência.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialização do snapshot: {0}")]
    Serialize(String),
}

/// Erros de conexão TCP.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("conexão resetada pelo peer")]
    ConnectionReset,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    /// Bytes que quebram o framing RESP. Diferente de `Io`: o handler
    /// ainda consegue responder antes de encerrar a conexão.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),
    #[error("servidor em shutdown")]
    Shutdown,
}

/// Erros de parsing/validação de comandos.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("número errado de argumentos para '{0}'")]
    WrongArity(String),
    #[error("argumento inválido: {0}")]
    InvalidArgument(String),
    // Mensagens fixadas pelo protocolo: clientes fazem match no texto.
    #[error("increment argument is not an integer or out of range")]
    NotAnInteger,
    #[error("invalid range")]
    InvalidRange,
}

/// Erro top-level do emberdb.
#[derive(Debug, thiserror::Error)]
pub enum EmberError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Result type alias.
pub type EmberResult<T> = Result<T, EmberError>;

// Conversão implícita de io::Error → EmberError (via ConnectionError)
impl From<std::io::Error> for EmberError {
    fn from(e: std::io::Error) -> Self {
        EmberError::Connection(ConnectionError::Io(e))
    }
}
