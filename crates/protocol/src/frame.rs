use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use emberdb_common::{MAX_FRAME_SIZE, ProtocolError};

/// Representação de um frame RESP.
///
/// `Null` (`$-1`) é o sentinela canônico de "sem valor"/"falso" em todas as
/// respostas; `Boolean` (`#t`/`#f`) existe para a confirmação de EXPIRE.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Boolean(bool),
    Array(Vec<Frame>),
}

impl Frame {
    /// Verifica se um frame completo está disponível no buffer sem alocar.
    /// Retorna Ok(()) se completo, Err(Incomplete) se precisa mais dados.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), ProtocolError> {
        match get_u8(src)? {
            b'+' | b'-' | b':' | b'#' => {
                get_line(src)?;
                Ok(())
            }
            b'$' => {
                let len = get_decimal(src)?;
                if len == -1 {
                    return Ok(());
                }
                if len < 0 {
                    return Err(ProtocolError::InvalidBulkLength(len));
                }
                let len = len as usize;
                if len > MAX_FRAME_SIZE {
                    return Err(ProtocolError::FrameTooLarge(len));
                }
                skip(src, len + 2)?; // dados + \r\n
                Ok(())
            }
            b'*' => {
                let count = get_decimal(src)?;
                if count == -1 {
                    return Ok(());
                }
                if count < 0 {
                    return Err(ProtocolError::InvalidBulkLength(count));
                }
                for _ in 0..count {
                    Frame::check(src)?;
                }
                Ok(())
            }
            byte => Err(ProtocolError::InvalidFrameType(byte)),
        }
    }

    /// Faz o parse de um frame completo a partir do cursor.
    /// Deve ser chamado apenas após `check()` retornar Ok.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, ProtocolError> {
        match get_u8(src)? {
            b'+' => {
                let line = get_line(src)?;
                let s = String::from_utf8(line.to_vec())
                    .map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))?;
                Ok(Frame::Simple(s))
            }
            b'-' => {
                let line = get_line(src)?;
                let s = String::from_utf8(line.to_vec())
                    .map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))?;
                Ok(Frame::Error(s))
            }
            b':' => {
                let n = get_decimal(src)?;
                Ok(Frame::Integer(n))
            }
            b'#' => match get_line(src)? {
                b"t" => Ok(Frame::Boolean(true)),
                b"f" => Ok(Frame::Boolean(false)),
                other => Err(ProtocolError::InvalidEncoding(format!(
                    "boolean inválido: {:?}",
                    String::from_utf8_lossy(other)
                ))),
            },
            b'$' => {
                let len = get_decimal(src)?;
                if len == -1 {
                    return Ok(Frame::Null);
                }
                let len = len as usize;
                if src.remaining() < len + 2 {
                    return Err(ProtocolError::Incomplete);
                }
                let data = Bytes::copy_from_slice(&src.get_ref()[src.position() as usize..][..len]);
                src.set_position(src.position() + len as u64 + 2);
                Ok(Frame::Bulk(data))
            }
            b'*' => {
                let count = get_decimal(src)?;
                if count == -1 {
                    return Ok(Frame::Null);
                }
                let count = count as usize;
                let mut frames = Vec::with_capacity(count);
                for _ in 0..count {
                    frames.push(Frame::parse(src)?);
                }
                Ok(Frame::Array(frames))
            }
            byte => Err(ProtocolError::InvalidFrameType(byte)),
        }
    }

    /// Encoda o frame no buffer de saída.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => {
                dst.put_u8(b'+');
                dst.put(s.as_bytes());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Error(s) => {
                dst.put_u8(b'-');
                dst.put(s.as_bytes());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Integer(n) => {
                dst.put_u8(b':');
                dst.put(n.to_string().as_bytes());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Bulk(data) => {
                dst.put_u8(b'$');
                dst.put(data.len().to_string().as_bytes());
                dst.put(&b"\r\n"[..]);
                dst.put(data.as_ref());
                dst.put(&b"\r\n"[..]);
            }
            Frame::Null => {
                dst.put(&b"$-1\r\n"[..]);
            }
            Frame::Boolean(true) => {
                dst.put(&b"#t\r\n"[..]);
            }
            Frame::Boolean(false) => {
                dst.put(&b"#f\r\n"[..]);
            }
            Frame::Array(frames) => {
                dst.put_u8(b'*');
                dst.put(frames.len().to_string().as_bytes());
                dst.put(&b"\r\n"[..]);
                for frame in frames {
                    frame.encode(dst);
                }
            }
        }
    }

    /// Helper: cria um Frame::Bulk a partir de &str.
    pub fn bulk(s: &str) -> Frame {
        Frame::Bulk(Bytes::from(s.to_string()))
    }

    /// Helper: cria um Array de Bulk strings a partir de &[&str].
    pub fn array_from_strs(strs: &[&str]) -> Frame {
        Frame::Array(strs.iter().map(|s| Frame::bulk(s)).collect())
    }
}

fn get_u8(src: &mut Cursor<&[u8]>) -> Result<u8, ProtocolError> {
    if !src.has_remaining() {
        return Err(ProtocolError::Incomplete);
    }
    Ok(src.get_u8())
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], ProtocolError> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    for i in start..end.saturating_sub(1) {
        if src.get_ref()[i] == b'\r' && src.get_ref()[i + 1] == b'\n' {
            src.set_position((i + 2) as u64);
            return Ok(&src.get_ref()[start..i]);
        }
    }

    Err(ProtocolError::Incomplete)
}

fn get_decimal(src: &mut Cursor<&[u8]>) -> Result<i64, ProtocolError> {
    let line = get_line(src)?;
    let s = std::str::from_utf8(line).map_err(|e| ProtocolError::InvalidInteger(e.to_string()))?;
    s.parse::<i64>()
        .map_err(|e| ProtocolError::InvalidInteger(e.to_string()))
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), ProtocolError> {
    if src.remaining() < n {
        return Err(ProtocolError::Incomplete);
    }
    src.set_position(src.position() + n as u64);
    Ok(())
}
