use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{info, warn};

use emberdb_protocol::Command;

use crate::Dispatcher;

/// Writer que recebe comandos duráveis via channel e faz append no AOF.
///
/// Formato do arquivo: texto plano, uma linha `COMANDO arg1 arg2 ...\r\n`
/// por registro, append-only, nunca truncado nem compactado. Argumento com
/// espaço interno é ambíguo no replay (espaço é o separador); limitação
/// documentada do formato, não corrigida aqui.
pub struct AofWriter {
    rx: mpsc::Receiver<Command>,
    path: PathBuf,
}

impl AofWriter {
    pub fn new(rx: mpsc::Receiver<Command>, path: PathBuf) -> Self {
        Self { rx, path }
    }

    /// Loop principal: drena o channel e escreve no arquivo. Falha de
    /// append é logada e engolida: o comando de origem já respondeu ao
    /// cliente; durabilidade é melhor-esforço.
    pub async fn run(mut self) -> std::io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut writer = BufWriter::new(file);

        info!("AOF writer iniciado: {:?}", self.path);

        while let Some(cmd) = self.rx.recv().await {
            let line = format!("{}\r\n", cmd.to_tokens().join(" "));
            if let Err(e) = append_record(&mut writer, &line).await {
                warn!("falha no append ao AOF: {e}");
            }
        }

        // Channel fechado — flush final
        writer.flush().await?;
        info!("AOF writer encerrado");
        Ok(())
    }
}

async fn append_record(
    writer: &mut BufWriter<File>,
    line: &str,
) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Lê o AOF e re-despacha cada registro, em ordem de arquivo, com a flag
/// de replay ligada (replay nunca re-entra no log). Retorna quantos
/// registros foram aplicados.
pub async fn replay_aof(path: &Path, dispatcher: &Dispatcher) -> std::io::Result<usize> {
    if !path.exists() {
        info!("arquivo AOF não encontrado, iniciando sem dados");
        return Ok(0);
    }

    let mut file = File::open(path).await?;
    let mut data = String::new();
    file.read_to_string(&mut data).await?;

    let mut count = 0;
    for record in data.split("\r\n").filter(|line| !line.is_empty()) {
        let tokens: Vec<&str> = record.split_whitespace().collect();
        match Command::from_tokens(&tokens) {
            Ok(cmd) => {
                dispatcher.dispatch(&cmd, true).await;
                count += 1;
            }
            Err(e) => {
                warn!("AOF: registro inválido ignorado ({record:?}): {e}");
            }
        }
    }

    info!("AOF replay completo: {count} comandos restaurados");
    Ok(count)
}

/// Cria o par (sender, AofWriter) para uso no servidor.
pub fn create_aof(path: PathBuf, buffer_size: usize) -> (mpsc::Sender<Command>, AofWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let writer = AofWriter::new(rx, path);
    (tx, writer)
}
