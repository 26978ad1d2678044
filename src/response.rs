use crate::executor::ExecuteError;
use crate::frame::DataType;
use crate::store::CacheItem;

static CRLF: &[u8; 2] = b"\r\n";

/// The reply sent back to the client: either a cache item or an error, never
/// both. The error slot takes precedence when serializing.
#[derive(Debug, PartialEq)]
pub struct Response {
    item: Option<CacheItem>,
    error: Option<ExecuteError>,
}

impl Response {
    pub fn ok() -> Response {
        Response::item(CacheItem::bulk("OK", "OK"))
    }

    pub fn item(item: CacheItem) -> Response {
        Response {
            item: Some(item),
            error: None,
        }
    }

    pub fn error(error: ExecuteError) -> Response {
        Response {
            item: None,
            error: Some(error),
        }
    }

    /// Replies are framed as a one-element array wrapping either the item or
    /// a simple error carrying the message.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![u8::from(DataType::Array), b'1'];
        bytes.extend_from_slice(CRLF);

        if let Some(error) = &self.error {
            bytes.push(u8::from(DataType::SimpleError));
            bytes.extend_from_slice(error.to_string().as_bytes());
            bytes.extend_from_slice(CRLF);
            return bytes;
        }

        match &self.item {
            Some(item) => bytes.extend(item.serialize()),
            // Neither slot filled; reply with an error rather than lying
            // about an empty array.
            None => {
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(b"empty response");
                bytes.extend_from_slice(CRLF);
            }
        }

        bytes
    }
}

impl From<Response> for Vec<u8> {
    fn from(response: Response) -> Self {
        response.serialize()
    }
}

impl CacheItem {
    /// Scalar wire framing. Simple errors and integers keep their one-line
    /// form; any other type is framed as a bulk string.
    pub fn serialize(&self) -> Vec<u8> {
        match self.data_type {
            DataType::SimpleError => {
                let mut bytes = Vec::with_capacity(1 + self.value.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(self.value.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            DataType::Integer => {
                let mut bytes = Vec::with_capacity(1 + self.value.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(self.value.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            _ => {
                let length = self.value.len().to_string();
                let mut bytes =
                    Vec::with_capacity(1 + length.len() + self.value.len() + 2 * CRLF.len());
                bytes.push(u8::from(DataType::BulkString));
                bytes.extend_from_slice(length.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes.extend_from_slice(self.value.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
        }
    }
}
