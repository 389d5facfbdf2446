use emberdb_common::CommandError;

use crate::{Frame, Parse};

/// Enum fechado com todos os comandos suportados.
///
/// Valores são tokens de texto (o protocolo não promete payloads binários);
/// por isso os argumentos chegam como `String` e não como `Bytes`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping(Option<String>),
    Echo(String),
    Set {
        key: String,
        value: String,
    },
    Get(String),
    Del(String),
    Expire {
        key: String,
        seconds: i64,
    },
    Ttl(String),
    Incr {
        key: String,
        by: Option<i64>,
    },
    Decr {
        key: String,
        by: Option<i64>,
    },
    LPush {
        key: String,
        values: Vec<String>,
    },
    RPush {
        key: String,
        values: Vec<String>,
    },
    LPop(String),
    RPop(String),
    LRange {
        key: String,
        start: i64,
        end: i64,
    },
    Unknown(String),
}

impl Command {
    /// Faz o parse de um Frame em um Command, validando aridade.
    pub fn from_frame(frame: Frame) -> Result<Command, CommandError> {
        let mut parse = Parse::new(frame)?;
        let cmd_name = parse.next_string()?.to_uppercase();

        let cmd = match cmd_name.as_str() {
            "PING" => {
                let msg = if parse.has_remaining() {
                    Some(parse.next_string()?)
                } else {
                    None
                };
                parse.finish()?;
                Command::Ping(msg)
            }
            "ECHO" => {
                let msg = parse.next_string()?;
                parse.finish()?;
                Command::Echo(msg)
            }
            "SET" => {
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("SET".into()));
                }
                let key = parse.next_string()?;
                let value = parse
                    .next_string()
                    .map_err(|_| CommandError::WrongArity("SET".into()))?;
                parse.finish()?;
                Command::Set { key, value }
            }
            "GET" => {
                let key = arity(parse.next_string(), "GET")?;
                parse.finish()?;
                Command::Get(key)
            }
            "DEL" => {
                let key = arity(parse.next_string(), "DEL")?;
                parse.finish()?;
                Command::Del(key)
            }
            "EXPIRE" => {
                let key = arity(parse.next_string(), "EXPIRE")?;
                let seconds = arity(parse.next_int(), "EXPIRE")?;
                parse.finish()?;
                Command::Expire { key, seconds }
            }
            "TTL" => {
                let key = arity(parse.next_string(), "TTL")?;
                parse.finish()?;
                Command::Ttl(key)
            }
            "INCR" => {
                let key = arity(parse.next_string(), "INCR")?;
                let by = parse_delta(&mut parse)?;
                parse.finish()?;
                Command::Incr { key, by }
            }
            "DECR" => {
                let key = arity(parse.next_string(), "DECR")?;
                let by = parse_delta(&mut parse)?;
                parse.finish()?;
                Command::Decr { key, by }
            }
            "LPUSH" => {
                let key = arity(parse.next_string(), "LPUSH")?;
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("LPUSH".into()));
                }
                let mut values = Vec::new();
                while parse.has_remaining() {
                    values.push(parse.next_string()?);
                }
                Command::LPush { key, values }
            }
            "RPUSH" => {
                let key = arity(parse.next_string(), "RPUSH")?;
                if !parse.has_remaining() {
                    return Err(CommandError::WrongArity("RPUSH".into()));
                }
                let mut values = Vec::new();
                while parse.has_remaining() {
                    values.push(parse.next_string()?);
                }
                Command::RPush { key, values }
            }
            "LPOP" => {
                let key = arity(parse.next_string(), "LPOP")?;
                parse.finish()?;
                Command::LPop(key)
            }
            "RPOP" => {
                let key = arity(parse.next_string(), "RPOP")?;
                parse.finish()?;
                Command::RPop(key)
            }
            "LRANGE" => {
                let key = arity(parse.next_string(), "LRANGE")?;
                let start = parse_bound(&mut parse, "LRANGE")?;
                let end = parse_bound(&mut parse, "LRANGE")?;
                parse.finish()?;
                Command::LRange { key, start, end }
            }
            _ => Command::Unknown(cmd_name),
        };

        Ok(cmd)
    }

    /// Reconstrói um Command a partir de tokens de texto (formato do AOF:
    /// `COMANDO arg1 arg2 ...`; split por whitespace já feito pelo caller).
    pub fn from_tokens(tokens: &[&str]) -> Result<Command, CommandError> {
        if tokens.is_empty() {
            return Err(CommandError::Unknown(String::new()));
        }
        Command::from_frame(Frame::array_from_strs(tokens))
    }

    /// Renderiza o comando como lista de tokens `(nome, args...)`.
    /// É a forma gravada no AOF, uma linha por comando.
    pub fn to_tokens(&self) -> Vec<String> {
        match self {
            Command::Ping(None) => vec!["PING".into()],
            Command::Ping(Some(msg)) => vec!["PING".into(), msg.clone()],
            Command::Echo(msg) => vec!["ECHO".into(), msg.clone()],
            Command::Set { key, value } => vec!["SET".into(), key.clone(), value.clone()],
            Command::Get(key) => vec!["GET".into(), key.clone()],
            Command::Del(key) => vec!["DEL".into(), key.clone()],
            Command::Expire { key, seconds } => {
                vec!["EXPIRE".into(), key.clone(), seconds.to_string()]
            }
            Command::Ttl(key) => vec!["TTL".into(), key.clone()],
            Command::Incr { key, by } => {
                let mut tokens = vec!["INCR".into(), key.clone()];
                if let Some(by) = by {
                    tokens.push(by.to_string());
                }
                tokens
            }
            Command::Decr { key, by } => {
                let mut tokens = vec!["DECR".into(), key.clone()];
                if let Some(by) = by {
                    tokens.push(by.to_string());
                }
                tokens
            }
            Command::LPush { key, values } => {
                let mut tokens = vec!["LPUSH".into(), key.clone()];
                tokens.extend(values.iter().cloned());
                tokens
            }
            Command::RPush { key, values } => {
                let mut tokens = vec!["RPUSH".into(), key.clone()];
                tokens.extend(values.iter().cloned());
                tokens
            }
            Command::LPop(key) => vec!["LPOP".into(), key.clone()],
            Command::RPop(key) => vec!["RPOP".into(), key.clone()],
            Command::LRange { key, start, end } => vec![
                "LRANGE".into(),
                key.clone(),
                start.to_string(),
                end.to_string(),
            ],
            Command::Unknown(name) => vec![name.clone()],
        }
    }
}

/// Converte falta de argumento em erro de aridade do comando.
fn arity<T>(result: Result<T, CommandError>, cmd: &str) -> Result<T, CommandError> {
    result.map_err(|_| CommandError::WrongArity(cmd.into()))
}

/// Delta opcional de INCR/DECR. Falha de parse tem mensagem própria,
/// distinta do erro de valor-armazenado-não-inteiro.
fn parse_delta(parse: &mut Parse) -> Result<Option<i64>, CommandError> {
    if !parse.has_remaining() {
        return Ok(None);
    }
    let raw = parse.next_string()?;
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| CommandError::NotAnInteger)
}

/// Limite de LRANGE: não-numérico já é violação de range, não erro genérico.
fn parse_bound(parse: &mut Parse, cmd: &str) -> Result<i64, CommandError> {
    if !parse.has_remaining() {
        return Err(CommandError::WrongArity(cmd.into()));
    }
    let raw = parse.next_string()?;
    raw.parse::<i64>().map_err(|_| CommandError::InvalidRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ping() {
        let frame = Frame::array_from_strs(&["PING"]);
        let cmd = Command::from_frame(frame).unwrap();
        assert_eq!(cmd, Command::Ping(None));
    }

    #[test]
    fn parse_set() {
        let frame = Frame::array_from_strs(&["SET", "foo", "bar"]);
        let cmd = Command::from_frame(frame).unwrap();
        assert_eq!(
            cmd,
            Command::Set {
                key: "foo".into(),
                value: "bar".into(),
            }
        );
    }

    #[test]
    fn parse_get() {
        let frame = Frame::array_from_strs(&["GET", "mykey"]);
        let cmd = Command::from_frame(frame).unwrap();
        assert_eq!(cmd, Command::Get("mykey".into()));
    }

    #[test]
    fn parse_expire_ttl() {
        let frame = Frame::array_from_strs(&["EXPIRE", "k", "10"]);
        assert_eq!(
            Command::from_frame(frame).unwrap(),
            Command::Expire {
                key: "k".into(),
                seconds: 10,
            }
        );

        let frame = Frame::array_from_strs(&["TTL", "k"]);
        assert_eq!(Command::from_frame(frame).unwrap(), Command::Ttl("k".into()));
    }

    #[test]
    fn parse_incr_with_delta() {
        let frame = Frame::array_from_strs(&["INCR", "counter", "4"]);
        assert_eq!(
            Command::from_frame(frame).unwrap(),
            Command::Incr {
                key: "counter".into(),
                by: Some(4),
            }
        );
    }

    #[test]
    fn parse_incr_bad_delta() {
        let frame = Frame::array_from_strs(&["INCR", "counter", "quatro"]);
        assert!(matches!(
            Command::from_frame(frame),
            Err(CommandError::NotAnInteger)
        ));
    }

    #[test]
    fn parse_decr_default_delta() {
        let frame = Frame::array_from_strs(&["DECR", "counter"]);
        assert_eq!(
            Command::from_frame(frame).unwrap(),
            Command::Decr {
                key: "counter".into(),
                by: None,
            }
        );
    }

    #[test]
    fn parse_lpush_rpush() {
        let frame = Frame::array_from_strs(&["LPUSH", "list", "a", "b"]);
        let cmd = Command::from_frame(frame).unwrap();
        assert_eq!(
            cmd,
            Command::LPush {
                key: "list".into(),
                values: vec!["a".into(), "b".into()],
            }
        );

        let frame = Frame::array_from_strs(&["RPUSH", "list"]);
        assert!(matches!(
            Command::from_frame(frame),
            Err(CommandError::WrongArity(_))
        ));
    }

    #[test]
    fn parse_lrange() {
        let frame = Frame::array_from_strs(&["LRANGE", "list", "0", "1"]);
        assert_eq!(
            Command::from_frame(frame).unwrap(),
            Command::LRange {
                key: "list".into(),
                start: 0,
                end: 1,
            }
        );
    }

    #[test]
    fn parse_lrange_non_numeric_bound() {
        let frame = Frame::array_from_strs(&["LRANGE", "list", "zero", "1"]);
        assert!(matches!(
            Command::from_frame(frame),
            Err(CommandError::InvalidRange)
        ));
    }

    #[test]
    fn parse_unknown_command() {
        let frame = Frame::array_from_strs(&["FOOBAR"]);
        assert_eq!(
            Command::from_frame(frame).unwrap(),
            Command::Unknown("FOOBAR".into())
        );
    }

    #[test]
    fn case_insensitive_commands() {
        let frame = Frame::array_from_strs(&["set", "k", "v"]);
        assert_eq!(
            Command::from_frame(frame).unwrap(),
            Command::Set {
                key: "k".into(),
                value: "v".into(),
            }
        );
    }

    #[test]
    fn wrong_arity_set() {
        let frame = Frame::array_from_strs(&["SET", "k"]);
        assert!(matches!(
            Command::from_frame(frame),
            Err(CommandError::WrongArity(_))
        ));
    }

    #[test]
    fn wrong_arity_expire() {
        let frame = Frame::array_from_strs(&["EXPIRE", "k"]);
        assert!(matches!(
            Command::from_frame(frame),
            Err(CommandError::WrongArity(_))
        ));
    }

    #[test]
    fn tokens_roundtrip() {
        let cmd = Command::LPush {
            key: "list".into(),
            values: vec!["a".into(), "b".into()],
        };
        let tokens = cmd.to_tokens();
        assert_eq!(tokens, vec!["LPUSH", "list", "a", "b"]);

        let refs: Vec<&str> = tokens.iter().map(|s| s.as_str()).collect();
        assert_eq!(Command::from_tokens(&refs).unwrap(), cmd);
    }

    #[test]
    fn tokens_roundtrip_expire() {
        let cmd = Command::Expire {
            key: "k".into(),
            seconds: 30,
        };
        let tokens = cmd.to_tokens();
        let refs: Vec<&str> = tokens.iter().map(|s| s.as_str()).collect();
        assert_eq!(Command::from_tokens(&refs).unwrap(), cmd);
    }

    #[test]
    fn from_tokens_empty() {
        assert!(Command::from_tokens(&[]).is_err());
    }
}
