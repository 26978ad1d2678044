use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use uuid::Uuid;

use crate::frame::{self, FrameDecoder};
use crate::response::Response;

pub struct Connection {
    pub id: Uuid,
    // Reads go through a buffer so the byte-at-a-time scanner does not hit
    // the socket for every byte.
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    decoder: FrameDecoder,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        let (read_half, write_half) = stream.into_split();
        Connection {
            id: Uuid::new_v4(),
            reader: BufReader::new(read_half),
            writer: write_half,
            decoder: FrameDecoder::new(),
        }
    }

    /// Reads one complete request, flattened into its token sequence.
    /// Returns `None` when the client closed the stream cleanly.
    pub async fn read_request(&mut self) -> Result<Option<Vec<String>>, frame::Error> {
        self.decoder.decode(&mut self.reader).await
    }

    pub async fn write_response(&mut self, response: &Response) -> std::io::Result<()> {
        self.writer.write_all(&response.serialize()).await
    }
}
