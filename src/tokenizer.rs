use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use std::io::{self, ErrorKind};
use tokio::io::{AsyncRead, AsyncReadExt};

static CRLF: &[u8; 2] = b"\r\n";

/// A single token scanned off the stream. `terminated` is false when the
/// stream ended before a full terminator match; whatever bytes were
/// accumulated up to that point are still returned.
#[derive(Debug, PartialEq, Eq)]
pub struct Token {
    pub bytes: Bytes,
    pub terminated: bool,
}

impl Token {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[async_trait]
pub trait Tokenize {
    fn terminator(&self) -> &[u8];

    async fn next_token<R>(&self, reader: &mut R) -> io::Result<Token>
    where
        R: AsyncRead + Unpin + Send;
}

/// Splits a raw byte stream into tokens delimited by a fixed terminator
/// sequence. The terminator may be any non-empty byte sequence; token content
/// may legitimately contain a strict prefix of it.
pub struct Tokenizer {
    terminator: Vec<u8>,
}

impl Tokenizer {
    pub fn new(terminator: impl Into<Vec<u8>>) -> Tokenizer {
        let terminator = terminator.into();
        assert!(!terminator.is_empty(), "terminator must not be empty");
        Tokenizer { terminator }
    }
}

impl Default for Tokenizer {
    fn default() -> Tokenizer {
        Tokenizer::new(&CRLF[..])
    }
}

#[async_trait]
impl Tokenize for Tokenizer {
    fn terminator(&self) -> &[u8] {
        &self.terminator
    }

    /// Reads bytes one at a time until the terminator has been matched in
    /// full. Bytes that match a prefix of the terminator are held back from
    /// the output; if a later byte breaks the match, the held bytes are
    /// flushed into the output and the breaking byte is re-examined, since it
    /// may itself start a new terminator match. The terminator is never part
    /// of the returned token.
    async fn next_token<R>(&self, reader: &mut R) -> io::Result<Token>
    where
        R: AsyncRead + Unpin + Send,
    {
        let terminator = self.terminator();
        let mut data = BytesMut::new();
        // Number of terminator bytes matched so far. The matched bytes are
        // exactly `terminator[..matched]`, so the count is all we keep.
        let mut matched = 0;
        let mut replay: Option<u8> = None;

        while matched < terminator.len() {
            let byte = match replay.take() {
                Some(byte) => byte,
                None => match reader.read_u8().await {
                    Ok(byte) => byte,
                    // A partial terminator match at end of stream is dropped,
                    // not returned as data.
                    Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                        return Ok(Token {
                            bytes: data.freeze(),
                            terminated: false,
                        });
                    }
                    Err(e) => return Err(e),
                },
            };

            if byte == terminator[matched] {
                matched += 1;
            } else {
                // False-positive partial match: flush it into the output.
                data.extend_from_slice(&terminator[..matched]);
                matched = 0;
                if byte == terminator[0] {
                    replay = Some(byte);
                } else {
                    data.put_u8(byte);
                }
            }
        }

        Ok(Token {
            bytes: data.freeze(),
            terminated: true,
        })
    }
}
