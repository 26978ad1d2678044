// https://redis.io/docs/reference/protocol-spec

use futures::future::BoxFuture;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;
use tokio::io::AsyncRead;

use crate::tokenizer::{Tokenize, Tokenizer};

/// Arrays nested deeper than this are rejected instead of recursing further.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("stream ended before a complete frame could be decoded")]
    Incomplete,
    #[error("frame metadata is empty")]
    MissingDataType,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("invalid array length: {0}")]
    InvalidArrayLength(String),
    #[error("frame exceeds maximum nesting depth of {0}")]
    DepthExceeded(usize),
    #[error("protocol error; invalid UTF-8 token")]
    InvalidUtf8(#[from] FromUtf8Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads frames off a stream and flattens them into their raw token
/// sequence: for every frame a metadata token (type tag plus auxiliary data),
/// and for every scalar frame one payload token. Array frames expand into
/// their elements depth-first, left to right.
pub struct FrameDecoder<T = Tokenizer> {
    tokenizer: T,
    max_depth: usize,
}

impl FrameDecoder {
    pub fn new() -> FrameDecoder {
        FrameDecoder {
            tokenizer: Tokenizer::default(),
            max_depth: MAX_DEPTH,
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> FrameDecoder {
        FrameDecoder::new()
    }
}

impl<T: Tokenize + Sync> FrameDecoder<T> {
    pub fn with_tokenizer(tokenizer: T, max_depth: usize) -> FrameDecoder<T> {
        FrameDecoder {
            tokenizer,
            max_depth,
        }
    }

    /// Decodes one complete frame into its flattened token sequence.
    /// Returns `None` when the stream ended cleanly before any frame data.
    pub async fn decode<R>(&self, reader: &mut R) -> Result<Option<Vec<String>>, Error>
    where
        R: AsyncRead + Unpin + Send,
    {
        let tokens = self.decode_frame(reader, 0).await?;
        if tokens.is_empty() {
            return Ok(None);
        }
        Ok(Some(tokens))
    }

    // The array branch recurses, so the future is boxed.
    fn decode_frame<'a, R>(
        &'a self,
        reader: &'a mut R,
        depth: usize,
    ) -> BoxFuture<'a, Result<Vec<String>, Error>>
    where
        R: AsyncRead + Unpin + Send,
    {
        Box::pin(async move {
            if depth > self.max_depth {
                return Err(Error::DepthExceeded(self.max_depth));
            }

            let metadata = self.tokenizer.next_token(reader).await?;
            if !metadata.terminated {
                // A clean close is only acceptable between frames; partial
                // metadata means the peer went away mid-frame.
                return if metadata.is_empty() && depth == 0 {
                    Ok(Vec::new())
                } else {
                    Err(Error::Incomplete)
                };
            }

            let tag = *metadata.bytes.first().ok_or(Error::MissingDataType)?;
            let data_type = DataType::try_from(tag)?;
            let metadata = String::from_utf8(metadata.bytes.to_vec())?;
            let mut tokens = vec![metadata];

            if let DataType::Array = data_type {
                let count = tokens[0][1..]
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidArrayLength(tokens[0][1..].to_string()))?;

                for _ in 0..count {
                    let element = self.decode_frame(reader, depth + 1).await?;
                    tokens.extend(element);
                }
                return Ok(tokens);
            }

            // Scalar frames carry exactly one payload token. End of stream
            // with zero payload bytes is a clean end of input; anything
            // in-between is a truncated frame.
            let payload = self.tokenizer.next_token(reader).await?;
            if !payload.terminated {
                return if payload.is_empty() {
                    Ok(tokens)
                } else {
                    Err(Error::Incomplete)
                };
            }

            tokens.push(String::from_utf8(payload.bytes.to_vec())?);
            Ok(tokens)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    SimpleString,   // '+'
    BulkString,     // '$'
    VerbatimString, // '='
    SimpleError,    // '-'
    BulkError,      // '!'
    Boolean,        // '#'
    Integer,        // ':'
    Double,         // ','
    BigNumber,      // '('
    Array,          // '*'
    Map,            // '%'
    Set,            // '~'
    Push,           // '>'
    // Due to historical reasons, RESP2 features two specially crafted values for representing null
    // values of bulk strings and arrays. This duality has always been a redundancy that added zero
    // semantical value to the protocol itself. The null type, introduced in RESP3, aims to fix
    // this wrong.
    Null, // '_'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'!' => Ok(Self::BulkError),
            b'*' => Ok(Self::Array),
            b'_' => Ok(Self::Null),
            b'#' => Ok(Self::Boolean),
            b',' => Ok(Self::Double),
            b'(' => Ok(Self::BigNumber),
            b'=' => Ok(Self::VerbatimString),
            b'%' => Ok(Self::Map),
            b'~' => Ok(Self::Set),
            b'>' => Ok(Self::Push),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::BulkError => b'!',
            DataType::Array => b'*',
            DataType::Null => b'_',
            DataType::Boolean => b'#',
            DataType::Double => b',',
            DataType::BigNumber => b'(',
            DataType::VerbatimString => b'=',
            DataType::Map => b'%',
            DataType::Set => b'~',
            DataType::Push => b'>',
        }
    }
}
