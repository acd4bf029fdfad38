//! Message framing on the stdio channel.
//!
//! Clients either send `Content-Length` framed messages or one JSON value per
//! line. Each reply goes back in the framing of the message it answers.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    ContentLength,
    Lines,
}

/// One message off the wire. `payload` is `Err` when the body was not JSON;
/// the server answers that with a parse error instead of giving up.
#[derive(Debug)]
pub(crate) struct Incoming {
    pub(crate) framing: Framing,
    pub(crate) payload: Result<Value, String>,
}

fn invalid_data(message: impl Into<String>) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message.into())
}

const PREVIEW_CHARS: usize = 80;

fn is_known_header(line: &str) -> bool {
    line.split_once(':').is_some_and(|(name, _)| {
        let name = name.trim();
        name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("content-type")
    })
}

fn preview(line: &str) -> String {
    line.chars().take(PREVIEW_CHARS).collect()
}

/// `Ok(None)` on clean EOF between messages.
pub(crate) async fn read_message<R>(reader: &mut R) -> Result<Option<Incoming>, std::io::Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            if !saw_header {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Unexpected EOF while reading MCP headers",
            ));
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if !saw_header {
            let body = trimmed.trim_start();
            if body.is_empty() {
                continue;
            }
            if body.starts_with('{') || body.starts_with('[') {
                return Ok(Some(Incoming {
                    framing: Framing::Lines,
                    payload: serde_json::from_str(body).map_err(|e| e.to_string()),
                }));
            }
            // A stray line is one bad message, not the start of a header block.
            if !is_known_header(body) {
                return Ok(Some(Incoming {
                    framing: Framing::Lines,
                    payload: Err(format!(
                        "expected a JSON message or MCP header, got '{}'",
                        preview(body)
                    )),
                }));
            }
        }

        if trimmed.is_empty() {
            break;
        }
        saw_header = true;

        let Some((name, raw_len)) = trimmed.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            let parsed = raw_len
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid_data("Invalid Content-Length header"))?;
            content_length = Some(parsed);
        }
    }

    let content_length =
        content_length.ok_or_else(|| invalid_data("Missing Content-Length header"))?;
    let mut payload = vec![0_u8; content_length];
    reader.read_exact(&mut payload).await?;

    Ok(Some(Incoming {
        framing: Framing::ContentLength,
        payload: serde_json::from_slice(&payload).map_err(|e| e.to_string()),
    }))
}

pub(crate) async fn write_message<W>(
    writer: &mut W,
    value: &Value,
    framing: Framing,
) -> Result<(), std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value)
        .map_err(|e| invalid_data(format!("Failed to serialize JSON: {e}")))?;
    match framing {
        Framing::ContentLength => {
            let header = format!(
                "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n",
                body.len()
            );
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(&body).await?;
        }
        Framing::Lines => {
            writer.write_all(&body).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await?;
    Ok(())
}
