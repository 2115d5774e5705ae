//! STOMP 1.2 frames.
//!
//! ```text
//! COMMAND
//! header1:value1
//! header2:value2
//!
//! body^@
//! ```
//!
//! Header values are escaped (`\\`, `\n`, `\r`, `\c`) in every frame except
//! `CONNECT` and `CONNECTED`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::BrokerError;

/// Largest frame body accepted from the broker.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

fn body_too_large(command: &str) -> BrokerError {
    BrokerError::Protocol(format!(
        "{} frame body exceeds {} bytes",
        command, MAX_BODY_BYTES
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn new(command: impl Into<String>) -> Self {
        Frame {
            command: command.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of `name`; repeated headers keep their first occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn escapes_headers(command: &str) -> bool {
        command != "CONNECT" && command != "CONNECTED"
    }

    pub fn encode(&self) -> Vec<u8> {
        let escape = Self::escapes_headers(&self.command);
        let mut out = Vec::with_capacity(self.command.len() + self.body.len() + 64);
        out.extend_from_slice(self.command.as_bytes());
        out.push(b'\n');
        for (name, value) in &self.headers {
            if escape {
                out.extend_from_slice(escape_header(name).as_bytes());
                out.push(b':');
                out.extend_from_slice(escape_header(value).as_bytes());
            } else {
                out.extend_from_slice(name.as_bytes());
                out.push(b':');
                out.extend_from_slice(value.as_bytes());
            }
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }

    /// Read the next frame, skipping heart-beat newlines.
    pub async fn read<R>(reader: &mut R) -> Result<Frame, BrokerError>
    where
        R: AsyncBufRead + Unpin,
    {
        let command = loop {
            let line = read_line(reader).await?.ok_or(BrokerError::ConnectionClosed)?;
            if !line.is_empty() {
                break line;
            }
        };
        let unescape = Self::escapes_headers(&command);

        let mut headers = Vec::new();
        loop {
            let line = read_line(reader).await?.ok_or(BrokerError::ConnectionClosed)?;
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').ok_or_else(|| {
                BrokerError::Protocol(format!("Malformed header line in {} frame: {}", command, line))
            })?;
            if unescape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let content_length = match headers.iter().find(|(k, _)| k == "content-length") {
            Some((_, value)) => Some(value.trim().parse::<usize>().map_err(|_| {
                BrokerError::Protocol(format!("Invalid content-length: {}", value))
            })?),
            None => None,
        };

        let body = match content_length {
            Some(length) if length > MAX_BODY_BYTES => return Err(body_too_large(&command)),
            Some(length) => {
                let mut body = vec![0u8; length];
                reader.read_exact(&mut body).await?;
                if reader.read_u8().await? != 0 {
                    return Err(BrokerError::Protocol(
                        "Frame body is not NUL terminated".to_string(),
                    ));
                }
                body
            }
            None => {
                let mut body = Vec::new();
                let n = (&mut *reader)
                    .take(MAX_BODY_BYTES as u64 + 1)
                    .read_until(0, &mut body)
                    .await?;
                if n == 0 {
                    return Err(BrokerError::ConnectionClosed);
                }
                if body.last() != Some(&0) {
                    if body.len() > MAX_BODY_BYTES {
                        return Err(body_too_large(&command));
                    }
                    return Err(BrokerError::ConnectionClosed);
                }
                body.pop();
                body
            }
        };

        Ok(Frame {
            command,
            headers,
            body,
        })
    }
}

/// One line without its `\n` / `\r\n` terminator; `None` at end of stream.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, BrokerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| BrokerError::Protocol("Frame header is not valid UTF-8".to_string()))
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, BrokerError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(BrokerError::Protocol(format!(
                    "Undefined escape sequence \\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn test_encode_escapes_headers() {
        let frame = Frame::new("SEND")
            .header("destination", "/queue/a:b")
            .body("hi");
        assert_eq!(frame.encode(), b"SEND\ndestination:/queue/a\\cb\n\nhi\0".to_vec());
    }

    #[test]
    fn test_connect_headers_are_not_escaped() {
        let frame = Frame::new("CONNECT").header("host", "localhost:61613");
        assert_eq!(frame.encode(), b"CONNECT\nhost:localhost:61613\n\n\0".to_vec());
    }

    #[tokio::test]
    async fn test_read_skips_heartbeats_and_unescapes() {
        let raw = b"\n\r\nMESSAGE\r\ndestination:/queue/a\\cb\nx:1\nx:2\n\nbody\0".to_vec();
        let mut reader = BufReader::new(raw.as_slice());
        let frame = Frame::read(&mut reader).await.unwrap();

        assert_eq!(frame.command, "MESSAGE");
        assert_eq!(frame.get("destination"), Some("/queue/a:b"));
        assert_eq!(frame.get("x"), Some("1"));
        assert_eq!(frame.body, b"body");
    }

    #[tokio::test]
    async fn test_read_content_length_body_may_contain_nul() {
        let raw = b"MESSAGE\ncontent-length:3\n\na\0b\0\n".to_vec();
        let mut reader = BufReader::new(raw.as_slice());
        let frame = Frame::read(&mut reader).await.unwrap();
        assert_eq!(frame.body, b"a\0b");
    }

    #[tokio::test]
    async fn test_read_consecutive_frames() {
        let mut raw = Frame::new("RECEIPT").header("receipt-id", "1").encode();
        raw.push(b'\n');
        raw.extend(Frame::new("RECEIPT").header("receipt-id", "2").encode());
        let mut reader = BufReader::new(raw.as_slice());

        let first = Frame::read(&mut reader).await.unwrap();
        let second = Frame::read(&mut reader).await.unwrap();
        assert_eq!(first.get("receipt-id"), Some("1"));
        assert_eq!(second.get("receipt-id"), Some("2"));
    }

    #[tokio::test]
    async fn test_read_rejects_oversized_content_length() {
        let raw = format!("MESSAGE\ncontent-length:{}\n\nabc\0", MAX_BODY_BYTES + 1).into_bytes();
        let mut reader = BufReader::new(raw.as_slice());
        assert!(matches!(
            Frame::read(&mut reader).await,
            Err(BrokerError::Protocol(ref m)) if m.contains("exceeds")
        ));
    }

    #[tokio::test]
    async fn test_read_rejects_unterminated_oversized_body() {
        let mut raw = b"MESSAGE\n\n".to_vec();
        raw.extend(std::iter::repeat(b'x').take(MAX_BODY_BYTES + 10));
        raw.push(0);
        let mut reader = BufReader::new(raw.as_slice());
        assert!(matches!(
            Frame::read(&mut reader).await,
            Err(BrokerError::Protocol(ref m)) if m.contains("exceeds")
        ));
    }

    #[tokio::test]
    async fn test_read_truncated_frame() {
        let raw = b"CONNECTED\nversion:1.2\n".to_vec();
        let mut reader = BufReader::new(raw.as_slice());
        assert!(matches!(
            Frame::read(&mut reader).await,
            Err(BrokerError::ConnectionClosed)
        ));
    }
}
