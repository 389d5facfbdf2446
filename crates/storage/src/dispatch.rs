use tokio::sync::mpsc;
use tracing::warn;

use emberdb_common::StorageError;
use emberdb_protocol::{Command, Frame};

use crate::Db;

/// Roteia comandos decodificados para o keyspace e decide durabilidade.
///
/// O dispatcher é a única autoridade sobre o que vai para o AOF: a
/// interseção de {comando mutante} ∩ {modo append-only ligado} ∩ {não é
/// replay}. Invocações de replay nunca re-entram no log, senão cada
/// restart duplicaria o arquivo inteiro.
#[derive(Clone)]
pub struct Dispatcher {
    db: Db,
    aof_tx: Option<mpsc::Sender<Command>>,
}

impl Dispatcher {
    pub fn new(db: Db, aof_tx: Option<mpsc::Sender<Command>>) -> Self {
        Self { db, aof_tx }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Executa o comando e retorna o frame de resposta. O append no AOF é
    /// fire-and-forget: o comando responde sem esperar a escrita durável.
    pub async fn dispatch(&self, cmd: &Command, replay: bool) -> Frame {
        let response = self.execute(cmd);

        if !replay
            && is_durable_command(cmd)
            && !matches!(response, Frame::Error(_))
            && let Some(tx) = &self.aof_tx
            && tx.send(cmd.clone()).await.is_err()
        {
            warn!("canal do AOF fechado, comando não persistido: {cmd:?}");
        }

        response
    }

    fn execute(&self, cmd: &Command) -> Frame {
        match cmd {
            Command::Ping(msg) => match msg {
                Some(m) => Frame::bulk(m),
                None => Frame::Simple("PONG".into()),
            },
            Command::Echo(msg) => Frame::bulk(msg),
            Command::Set { key, value } => {
                self.db.set(key, value);
                Frame::Simple("OK".into())
            }
            Command::Get(key) => match self.db.get(key) {
                Some(value) => Frame::bulk(&value),
                None => Frame::Null,
            },
            Command::Del(key) => Frame::Integer(i64::from(self.db.del(key))),
            Command::Expire { key, seconds } => {
                if self.db.expire(key, *seconds) {
                    Frame::Boolean(true)
                } else {
                    Frame::Null
                }
            }
            Command::Ttl(key) => match self.db.ttl(key) {
                Some(secs) => Frame::Integer(secs),
                None => Frame::Null,
            },
            Command::Incr { key, by } => match self.db.incr(key, *by) {
                Ok(n) => Frame::Integer(n),
                Err(e) => storage_error(e),
            },
            Command::Decr { key, by } => match self.db.decr(key, *by) {
                Ok(n) => Frame::Integer(n),
                Err(e) => storage_error(e),
            },
            Command::LPush { key, values } => match self.db.lpush(key, values) {
                Ok(len) => Frame::Integer(len as i64),
                Err(e) => storage_error(e),
            },
            Command::RPush { key, values } => match self.db.rpush(key, values) {
                Ok(len) => Frame::Integer(len as i64),
                Err(e) => storage_error(e),
            },
            Command::LPop(key) => match self.db.lpop(key) {
                Some(value) => Frame::bulk(&value),
                None => Frame::Null,
            },
            Command::RPop(key) => match self.db.rpop(key) {
                Some(value) => Frame::bulk(&value),
                None => Frame::Null,
            },
            Command::LRange { key, start, end } => {
                match self.db.lrange(key, *start, *end) {
                    Ok(Some(items)) => {
                        Frame::Array(items.iter().map(|v| Frame::bulk(v)).collect())
                    }
                    Ok(None) => Frame::Null,
                    Err(e) => storage_error(e),
                }
            }
            Command::Unknown(name) => Frame::Error(format!("ERR unknown command '{name}'")),
        }
    }
}

/// Allow-list estática de comandos duráveis: só mutações entram no AOF,
/// leituras nunca.
pub fn is_durable_command(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::Set { .. }
            | Command::Del(_)
            | Command::Expire { .. }
            | Command::Incr { .. }
            | Command::Decr { .. }
            | Command::LPush { .. }
            | Command::RPush { .. }
            | Command::LPop(_)
            | Command::RPop(_)
    )
}

fn storage_error(e: StorageError) -> Frame {
    match e {
        // WRONGTYPE já carrega o prefixo próprio
        StorageError::WrongType => Frame::Error(e.to_string()),
        other => Frame::Error(format!("ERR {other}")),
    }
}
