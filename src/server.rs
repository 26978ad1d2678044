use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, instrument};

use crate::command::Command;
use crate::connection::Connection;
use crate::executor::{Execute, StoreExecutor};
use crate::store::Store;
use crate::Error;

pub async fn run(addr: impl ToSocketAddrs) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(addr).await?;
    let store = Store::new();

    info!("Key-value server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let executor = StoreExecutor::new(store.clone());
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, executor).await {
                error!("connection error: {}", e);
            }
        });
    }
}

/// Runs the decode-execute-reply loop for one client. Decode and I/O errors
/// end the loop and with it the connection; command-level failures are
/// written back as error responses and the loop continues.
#[instrument(
    name = "connection",
    skip(stream, executor),
    fields(connection_id, client_address)
)]
async fn handle_connection<E: Execute>(
    stream: TcpStream,
    client_address: SocketAddr,
    executor: E,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(tokens) = conn.read_request().await? {
        info!("Received request: {:?}", tokens);

        // The outer array's metadata token is positional noise from here on.
        let cmd = Command::from_tokens(&tokens[1..]);
        if cmd.is_exit() {
            continue;
        }

        let res = executor.execute(cmd);
        info!("Sending response: {:?}", res);

        conn.write_response(&res).await?;
    }

    info!("Connection closed");
    Ok(())
}
