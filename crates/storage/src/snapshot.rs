use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info};

use emberdb_common::PersistenceError;

use crate::{Db, Entry};

/// Serialização point-in-time dos dois mapas paralelos do keyspace.
/// O artefato em disco é JSON e é sobrescrito por inteiro a cada save.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotImage {
    pub store: HashMap<String, Entry>,
    #[serde(rename = "expirationTimes")]
    pub expiration_times: HashMap<String, i64>,
}

/// Serializa o keyspace inteiro para `path`, sobrescrevendo o artefato
/// anterior. Os mapas são clonados sob o lock; a serialização e o write
/// acontecem fora da seção crítica.
pub async fn save_snapshot(path: &Path, db: &Db) -> Result<(), PersistenceError> {
    let image = db.snapshot_image();
    let data =
        serde_json::to_vec(&image).map_err(|e| PersistenceError::Serialize(e.to_string()))?;
    tokio::fs::write(path, data).await?;
    info!("snapshot salvo em {path:?} ({} chaves)", image.store.len());
    Ok(())
}

/// Carrega o artefato, se existir, mesclando no keyspace em memória
/// (valores do snapshot vencem por chave). Roda no máximo uma vez, antes
/// de qualquer comando ao vivo. Retorna false se não havia artefato.
pub async fn load_snapshot(path: &Path, db: &Db) -> Result<bool, PersistenceError> {
    if !path.exists() {
        info!("snapshot não encontrado, iniciando sem dados");
        return Ok(false);
    }

    let data = tokio::fs::read(path).await?;
    let image: SnapshotImage =
        serde_json::from_slice(&data).map_err(|e| PersistenceError::Serialize(e.to_string()))?;
    let keys = image.store.len();
    db.load_image(image);
    info!("snapshot carregado de {path:?} ({keys} chaves)");
    Ok(true)
}

/// Task que salva o keyspace a cada `every`. Falha de save é logada e o
/// timer continua batendo; nada disso bloqueia o caminho de comandos.
pub fn spawn_snapshot_timer(path: PathBuf, db: Db, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(every);
        tick.tick().await; // primeiro tick é imediato; pula
        loop {
            tick.tick().await;
            if let Err(e) = save_snapshot(&path, &db).await {
                error!("falha ao salvar snapshot: {e}");
            }
        }
    })
}
