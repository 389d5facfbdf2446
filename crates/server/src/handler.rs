use tokio::sync::broadcast;
use tracing::debug;

use emberdb_common::ConnectionError;
use emberdb_protocol::{Command, Frame};
use emberdb_storage::Dispatcher;

use crate::Connection;

/// Loop de tratamento de uma conexão: decodifica → despacha → responde.
///
/// Input malformado que não vira um (comando, args) válido é respondido
/// como erro na própria conexão, nunca vira falha de processo.
pub async fn handle_connection(
    mut conn: Connection,
    dispatcher: Dispatcher,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        let frame = tokio::select! {
            result = conn.read_frame() => match result {
                Ok(frame) => frame,
                // Framing quebrado: responde uma vez e encerra, o stream
                // não tem mais sincronia recuperável.
                Err(ConnectionError::Protocol(e)) => {
                    let response = Frame::Error(format!("ERR {e}"));
                    conn.write_frame(&response).await?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let frame = match frame {
            Some(f) => f,
            None => return Ok(()), // EOF
        };

        let cmd = match Command::from_frame(frame) {
            Ok(cmd) => cmd,
            Err(e) => {
                let response = Frame::Error(format!("ERR {e}"));
                conn.write_frame(&response).await?;
                continue;
            }
        };

        debug!("comando recebido: {cmd:?}");

        let response = dispatcher.dispatch(&cmd, false).await;
        conn.write_frame(&response).await?;
    }
}
