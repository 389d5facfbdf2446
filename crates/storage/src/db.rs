use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use emberdb_common::StorageError;

use crate::entry::Entry;
use crate::snapshot::SnapshotImage;

/// Estado compartilhado: keyspace + índice de expiração.
///
/// Deadlines são millis de época Unix (sobrevivem a restart dentro do
/// snapshot, diferente de um Instant monotônico). Uma chave presente em
/// `expirations` sem entrada em `store` não pode ocorrer: toda remoção
/// limpa os dois mapas dentro da mesma seção crítica.
struct State {
    store: HashMap<String, Entry>,
    expirations: HashMap<String, i64>,
}

/// Handle para o keyspace in-memory.
///
/// Cada operação executa sob um único lock, então comando i+1 enxerga os
/// efeitos de comando i por inteiro ou não enxerga nada (linearizabilidade
/// estrita). Expiração é apenas lazy: uma chave vencida só é removida
/// quando algum comando a acessa; não existe sweep em background.
#[derive(Clone)]
pub struct Db {
    shared: Arc<Mutex<State>>,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl Db {
    pub fn new() -> Self {
        Db {
            shared: Arc::new(Mutex::new(State {
                store: HashMap::new(),
                expirations: HashMap::new(),
            })),
        }
    }

    // --- Operações de string ---

    pub fn set(&self, key: &str, value: &str) {
        let mut state = self.lock();
        state.store.insert(key.to_string(), Entry::String(value.to_string()));
        // SET limpa deadline pendente: chave sobrescrita não ressuscita
        // com TTL antigo ainda correndo.
        state.expirations.remove(key);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        match state.store.get(key) {
            Some(Entry::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn del(&self, key: &str) -> bool {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        let existed = state.store.remove(key).is_some();
        state.expirations.remove(key);
        existed
    }

    /// Agenda expiração em `now + seconds`. Retorna false se a chave não
    /// existe (ou já venceu).
    pub fn expire(&self, key: &str, seconds: i64) -> bool {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        if !state.store.contains_key(key) {
            return false;
        }
        let deadline = now_ms().saturating_add(seconds.saturating_mul(1000));
        state.expirations.insert(key.to_string(), deadline);
        true
    }

    /// Segundos inteiros restantes, se a chave existe com deadline futuro.
    /// None cobre: chave ausente, sem deadline, ou restante < 1s.
    pub fn ttl(&self, key: &str) -> Option<i64> {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        if !state.store.contains_key(key) {
            return None;
        }
        let deadline = *state.expirations.get(key)?;
        let secs = (deadline - now_ms()) / 1000;
        (secs > 0).then_some(secs)
    }

    pub fn incr(&self, key: &str, by: Option<i64>) -> Result<i64, StorageError> {
        self.incr_by(key, by.unwrap_or(1))
    }

    pub fn decr(&self, key: &str, by: Option<i64>) -> Result<i64, StorageError> {
        self.incr_by(key, by.unwrap_or(1).wrapping_neg())
    }

    /// Chave ausente semeia em 0 antes do delta; valor novo é gravado de
    /// volta como texto decimal.
    fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StorageError> {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        match state.store.get_mut(key) {
            None => {
                state
                    .store
                    .insert(key.to_string(), Entry::String(delta.to_string()));
                Ok(delta)
            }
            Some(Entry::String(value)) => {
                let n: i64 = value
                    .parse()
                    .map_err(|_| StorageError::NotAnInteger)?;
                let new_val = n.checked_add(delta).ok_or(StorageError::NotAnInteger)?;
                *value = new_val.to_string();
                Ok(new_val)
            }
            Some(Entry::List(_)) => Err(StorageError::WrongType),
        }
    }

    // --- Operações de lista ---

    /// Prepende os valores como bloco, na ordem dada:
    /// `LPUSH k v1 v2` sobre `[x]` resulta em `[v1, v2, x]`.
    pub fn lpush(&self, key: &str, values: &[String]) -> Result<usize, StorageError> {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        let entry = state
            .store
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        match entry {
            Entry::List(list) => {
                for v in values.iter().rev() {
                    list.push_front(v.clone());
                }
                Ok(list.len())
            }
            Entry::String(_) => Err(StorageError::WrongType),
        }
    }

    pub fn rpush(&self, key: &str, values: &[String]) -> Result<usize, StorageError> {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        let entry = state
            .store
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        match entry {
            Entry::List(list) => {
                for v in values {
                    list.push_back(v.clone());
                }
                Ok(list.len())
            }
            Entry::String(_) => Err(StorageError::WrongType),
        }
    }

    pub fn lpop(&self, key: &str) -> Option<String> {
        self.list_pop(key, true)
    }

    pub fn rpop(&self, key: &str) -> Option<String> {
        self.list_pop(key, false)
    }

    /// None cobre chave ausente, tipo errado e lista vazia.
    fn list_pop(&self, key: &str, from_left: bool) -> Option<String> {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        match state.store.get_mut(key) {
            Some(Entry::List(list)) => {
                if from_left {
                    list.pop_front()
                } else {
                    list.pop_back()
                }
            }
            _ => None,
        }
    }

    /// Faixa inclusiva `[start, end]`, zero-based, exigindo
    /// `0 <= start <= end < len`; violação é erro de range, nunca array
    /// parcial/vazio. Ok(None) é Nil: chave ausente/vencida ou tipo errado.
    pub fn lrange(
        &self,
        key: &str,
        start: i64,
        end: i64,
    ) -> Result<Option<Vec<String>>, StorageError> {
        let mut state = self.lock();
        check_expiry(&mut state, key);
        match state.store.get(key) {
            Some(Entry::List(list)) => {
                let len = list.len() as i64;
                if start < 0 || end < start || end >= len {
                    return Err(StorageError::InvalidRange);
                }
                let items = list
                    .range(start as usize..=end as usize)
                    .cloned()
                    .collect();
                Ok(Some(items))
            }
            _ => Ok(None),
        }
    }

    // --- Persistência ---

    /// Clona os dois mapas sob o lock (copy-then-serialize: a serialização
    /// longa acontece fora da seção crítica).
    pub fn snapshot_image(&self) -> SnapshotImage {
        let state = self.lock();
        SnapshotImage {
            store: state.store.clone(),
            expiration_times: state.expirations.clone(),
        }
    }

    /// Mesclagem campo-a-campo: chaves do snapshot vencem em colisão.
    pub fn load_image(&self, image: SnapshotImage) {
        let mut state = self.lock();
        state.store.extend(image.store);
        state.expirations.extend(image.expiration_times);
    }

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // Nenhum caminho segura o lock através de .await nem entra em
        // pânico com ele em mãos; poisoning aqui seria um bug fatal.
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

/// Expiração lazy: remove a chave dos dois mapas se o deadline já passou.
/// Roda no topo de toda operação, dentro da mesma seção crítica.
fn check_expiry(state: &mut State, key: &str) -> bool {
    if let Some(&deadline) = state.expirations.get(key)
        && deadline < now_ms()
    {
        state.store.remove(key);
        state.expirations.remove(key);
        debug!("chave expirada removida: {key}");
        return true;
    }
    false
}
