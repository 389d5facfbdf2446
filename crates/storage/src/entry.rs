use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Valor tipado armazenado sob uma chave.
///
/// Uma chave tem exatamente uma Entry ou nenhuma; comandos que esperam um
/// tipo falham com erro de tipo contra o outro. Os derives de serde existem
/// por causa do artefato de snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entry {
    String(String),
    List(VecDeque<String>),
}

impl Entry {
    pub fn is_string(&self) -> bool {
        matches!(self, Entry::String(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Entry::List(_))
    }
}
