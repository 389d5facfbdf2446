use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use emberdb_common::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SNAPSHOT_INTERVAL_SECS, MAX_CONNECTIONS,
};
use emberdb_server::{Connection, handle_connection};
use emberdb_storage::{Db, Dispatcher, create_aof, load_snapshot, replay_aof, spawn_snapshot_timer};

#[derive(Parser, Debug)]
#[command(name = "emberdb-server", about = "emberdb — in-memory key-value store")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,

    /// Habilita o log append-only (exclusivo com --snapshot)
    #[arg(long, conflicts_with = "snapshot")]
    appendonly: bool,
    #[arg(long, value_name = "FILE", default_value = "data.aof")]
    aof_path: PathBuf,

    /// Habilita snapshots periódicos do keyspace
    #[arg(long)]
    snapshot: bool,
    #[arg(long, value_name = "FILE", default_value = "data.rdb")]
    snapshot_path: PathBuf,
    #[arg(long, default_value_t = DEFAULT_SNAPSHOT_INTERVAL_SECS)]
    snapshot_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emberdb_server=info,emberdb_storage=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let db = Db::new();

    // Exatamente um dos modos de persistência roda antes de qualquer
    // comando ao vivo: replay do AOF ou restore do snapshot, nunca ambos.
    let aof_tx = if args.appendonly {
        let replayer = Dispatcher::new(db.clone(), None);
        // Falha de leitura do log é serviço degradado, não fatal: o
        // servidor sobe com o keyspace vazio, como no modo snapshot.
        match replay_aof(&args.aof_path, &replayer).await {
            Ok(count) if count > 0 => info!("{count} comandos restaurados do AOF"),
            Ok(_) => {}
            Err(e) => error!("falha no replay do AOF: {e}"),
        }

        let (tx, writer) = create_aof(args.aof_path.clone(), 10_000);
        tokio::spawn(async move {
            if let Err(e) = writer.run().await {
                error!("AOF writer erro: {e}");
            }
        });
        Some(tx)
    } else {
        None
    };

    if args.snapshot {
        // Falha de load é serviço degradado, não fatal.
        if let Err(e) = load_snapshot(&args.snapshot_path, &db).await {
            error!("falha ao carregar snapshot: {e}");
        }
        spawn_snapshot_timer(
            args.snapshot_path.clone(),
            db.clone(),
            Duration::from_secs(args.snapshot_interval_secs),
        );
        info!(
            "modo snapshot: salvando a cada {}s em {:?}",
            args.snapshot_interval_secs, args.snapshot_path
        );
    }

    let dispatcher = Dispatcher::new(db, aof_tx.clone());

    let listener = TcpListener::bind(&addr).await?;
    info!("emberdb escutando em {addr}");

    let semaphore = std::sync::Arc::new(tokio::sync::Semaphore::new(args.max_connections));
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    loop {
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => permit.unwrap(),
            _ = signal::ctrl_c() => {
                info!("shutdown signal recebido");
                drop(shutdown_tx);
                break;
            }
        };

        let (socket, addr) = tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok(v) => v,
                    Err(e) => {
                        error!("erro ao aceitar conexão: {e}");
                        continue;
                    }
                }
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal recebido");
                drop(shutdown_tx);
                break;
            }
        };

        info!("nova conexão: {addr}");
        let dispatcher = dispatcher.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let conn = Connection::new(socket);
            if let Err(e) = handle_connection(conn, dispatcher, &mut shutdown_rx).await {
                error!("erro na conexão {addr}: {e}");
            }
            info!("conexão encerrada: {addr}");
            drop(permit);
        });
    }

    // Derruba os senders do AOF para o writer flushar e encerrar
    drop(dispatcher);
    drop(aof_tx);

    Ok(())
}
