#![forbid(unsafe_code)]

pub mod aof;
mod db;
mod dispatch;
mod entry;
pub mod snapshot;

pub use aof::{AofWriter, create_aof, replay_aof};
pub use db::Db;
pub use dispatch::{Dispatcher, is_durable_command};
pub use entry::Entry;
pub use snapshot::{SnapshotImage, load_snapshot, save_snapshot, spawn_snapshot_timer};
