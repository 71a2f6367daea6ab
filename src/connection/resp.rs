//! RESP2 codec
//!
//! Encoding of commands and decoding of replies for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Command
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<name>\r\n
//! $<len>\r\n<arg1>\r\n
//! ...
//! ```
//!
//! ### Reply (first byte selects the type)
//! - `+` status line
//! - `-` error line
//! - `:` integer
//! - `$` bulk string (`$-1` is nil)
//! - `*` array (`*-1` is nil)

use std::io::{BufRead, Write};

use bytes::Bytes;

use crate::error::{PipeError, Result};

use super::Reply;

/// Maximum bulk string size accepted from the upstream (512 MB)
pub const MAX_BULK_SIZE: i64 = 512 * 1024 * 1024;

/// Maximum array length accepted from the upstream
pub const MAX_ARRAY_LEN: i64 = 1024 * 1024;

// =============================================================================
// Command Encoding
// =============================================================================

/// Write one command frame; the caller decides when to flush
pub fn write_command<W: Write>(writer: &mut W, name: &str, args: &[Bytes]) -> Result<()> {
    write!(writer, "*{}\r\n", args.len() + 1)?;
    write_bulk(writer, name.as_bytes())?;
    for arg in args {
        write_bulk(writer, arg)?;
    }
    Ok(())
}

fn write_bulk<W: Write>(writer: &mut W, data: &[u8]) -> Result<()> {
    write!(writer, "${}\r\n", data.len())?;
    writer.write_all(data)?;
    writer.write_all(b"\r\n")?;
    Ok(())
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Read one complete reply
///
/// Blocks until the reply is complete. End of stream before the first byte
/// is reported as `ConnectionClosed`.
pub fn read_reply<R: BufRead>(reader: &mut R, line_buf: &mut Vec<u8>) -> Result<Reply> {
    read_line(reader, line_buf)?;
    if line_buf.is_empty() {
        return Err(PipeError::Protocol("empty reply line".to_string()));
    }

    let body = &line_buf[1..];
    match line_buf[0] {
        b'+' => Ok(Reply::Status(String::from_utf8_lossy(body).into_owned())),
        b'-' => Ok(Reply::Error(String::from_utf8_lossy(body).into_owned())),
        b':' => Ok(Reply::Integer(parse_i64(body)?)),
        b'$' => {
            let len = parse_i64(body)?;
            read_bulk(reader, len)
        }
        b'*' => {
            let len = parse_i64(body)?;
            read_array(reader, len, line_buf)
        }
        other => Err(PipeError::Protocol(format!(
            "Unknown reply type: 0x{:02x}",
            other
        ))),
    }
}

fn read_bulk<R: BufRead>(reader: &mut R, len: i64) -> Result<Reply> {
    if len < 0 {
        return Ok(Reply::Nil);
    }
    if len > MAX_BULK_SIZE {
        return Err(PipeError::Protocol(format!(
            "Bulk string too large: {} bytes (max {})",
            len, MAX_BULK_SIZE
        )));
    }

    // Payload plus trailing CRLF in one read
    let mut data = vec![0u8; len as usize + 2];
    reader.read_exact(&mut data)?;
    if !data.ends_with(b"\r\n") {
        return Err(PipeError::Protocol(
            "Bulk string missing CRLF terminator".to_string(),
        ));
    }
    data.truncate(len as usize);

    Ok(Reply::Bulk(Bytes::from(data)))
}

fn read_array<R: BufRead>(reader: &mut R, len: i64, line_buf: &mut Vec<u8>) -> Result<Reply> {
    if len < 0 {
        return Ok(Reply::Nil);
    }
    if len > MAX_ARRAY_LEN {
        return Err(PipeError::Protocol(format!(
            "Array too long: {} elements (max {})",
            len, MAX_ARRAY_LEN
        )));
    }

    let mut items = Vec::with_capacity(len as usize);
    for _ in 0..len {
        items.push(read_reply(reader, line_buf)?);
    }
    Ok(Reply::Array(items))
}

fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<()> {
    buf.clear();
    let read = reader.read_until(b'\n', buf)?;
    if read == 0 {
        return Err(PipeError::ConnectionClosed);
    }
    if !buf.ends_with(b"\r\n") {
        return Err(PipeError::Protocol("Reply line missing CRLF".to_string()));
    }
    buf.truncate(buf.len() - 2);
    Ok(())
}

fn parse_i64(data: &[u8]) -> Result<i64> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| {
            PipeError::Protocol(format!(
                "Invalid integer: '{}'",
                String::from_utf8_lossy(data)
            ))
        })
}
