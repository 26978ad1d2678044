use futures::future::join_all;
use rand::Rng;
use serial_test::serial;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};

use kvwire::server;

const ADDR: (&str, u16) = ("127.0.0.1", 6380);

/// Spawns the server and connects to it. The server task dies with the
/// test's runtime, so each `#[serial]` test gets a fresh server and store on
/// the same fixed port.
async fn connect() -> TcpStream {
    tokio::spawn(server::run(ADDR));
    sleep(Duration::from_millis(100)).await;

    TcpStream::connect(ADDR).await.unwrap()
}

async fn roundtrip(stream: &mut TcpStream, request: &[u8], expected: &[u8]) {
    stream.write_all(request).await.unwrap();

    let mut reply = vec![0; expected.len()];
    stream.read_exact(&mut reply).await.unwrap();

    assert_eq!(
        reply,
        expected,
        "reply was {:?}",
        String::from_utf8_lossy(&reply)
    );
}

#[tokio::test]
#[serial]
async fn ping() {
    let mut stream = connect().await;
    roundtrip(&mut stream, b"*1\r\n$4\r\nping\r\n", b"*1\r\n$4\r\nPONG\r\n").await;
}

#[tokio::test]
#[serial]
async fn set_then_get() {
    let mut stream = connect().await;

    roundtrip(
        &mut stream,
        b"*3\r\n$3\r\nset\r\n$8\r\nrt_key_1\r\n$3\r\nbar\r\n",
        b"*1\r\n$2\r\nOK\r\n",
    )
    .await;

    roundtrip(
        &mut stream,
        b"*2\r\n$3\r\nget\r\n$8\r\nrt_key_1\r\n",
        b"*1\r\n$3\r\nbar\r\n",
    )
    .await;
}

#[tokio::test]
#[serial]
async fn set_preserves_integer_framing() {
    let mut stream = connect().await;

    roundtrip(
        &mut stream,
        b"*3\r\n$3\r\nset\r\n$7\r\nint_key\r\n:\r\n42\r\n",
        b"*1\r\n$2\r\nOK\r\n",
    )
    .await;

    roundtrip(
        &mut stream,
        b"*2\r\n$3\r\nget\r\n$7\r\nint_key\r\n",
        b"*1\r\n:42\r\n",
    )
    .await;
}

#[tokio::test]
#[serial]
async fn get_missing_key() {
    let mut stream = connect().await;

    roundtrip(
        &mut stream,
        b"*2\r\n$3\r\nget\r\n$7\r\nmissing\r\n",
        b"*1\r\n-item not found, key=missing\r\n",
    )
    .await;
}

#[tokio::test]
#[serial]
async fn echo() {
    let mut stream = connect().await;

    roundtrip(
        &mut stream,
        b"*2\r\n$4\r\necho\r\n$5\r\nhello\r\n",
        b"*1\r\n$5\r\nhello\r\n",
    )
    .await;
}

#[tokio::test]
#[serial]
async fn unknown_command_keeps_connection_open() {
    let mut stream = connect().await;

    roundtrip(
        &mut stream,
        b"*1\r\n$5\r\nflush\r\n",
        b"*1\r\n-unknown command 'flush'\r\n",
    )
    .await;

    roundtrip(&mut stream, b"*1\r\n$4\r\nping\r\n", b"*1\r\n$4\r\nPONG\r\n").await;
}

#[tokio::test]
#[serial]
async fn invalid_set_keeps_connection_open() {
    let mut stream = connect().await;

    roundtrip(
        &mut stream,
        b"*2\r\n$3\r\nset\r\n$7\r\nonlykey\r\n",
        b"*1\r\n-invalid command received\r\n",
    )
    .await;

    roundtrip(&mut stream, b"*1\r\n$4\r\nping\r\n", b"*1\r\n$4\r\nPONG\r\n").await;
}

#[tokio::test]
#[serial]
async fn repeated_set_is_idempotent() {
    let mut stream = connect().await;

    for _ in 0..2 {
        roundtrip(
            &mut stream,
            b"*3\r\n$3\r\nset\r\n$8\r\nidem_key\r\n$3\r\nval\r\n",
            b"*1\r\n$2\r\nOK\r\n",
        )
        .await;
    }

    roundtrip(
        &mut stream,
        b"*2\r\n$3\r\nget\r\n$8\r\nidem_key\r\n",
        b"*1\r\n$3\r\nval\r\n",
    )
    .await;
}

#[tokio::test]
#[serial]
async fn quit_is_skipped_without_a_reply() {
    let mut stream = connect().await;

    // Both requests go out in one write; the first reply must be the PONG,
    // proving quit produced no reply of its own.
    roundtrip(
        &mut stream,
        b"*1\r\n$4\r\nquit\r\n*1\r\n$4\r\nping\r\n",
        b"*1\r\n$4\r\nPONG\r\n",
    )
    .await;
}

#[tokio::test]
#[serial]
async fn pipelined_requests_are_answered_in_order() {
    let mut stream = connect().await;

    roundtrip(
        &mut stream,
        b"*3\r\n$3\r\nset\r\n$8\r\npipe_key\r\n$1\r\nv\r\n*2\r\n$3\r\nget\r\n$8\r\npipe_key\r\n*1\r\n$4\r\nping\r\n",
        b"*1\r\n$2\r\nOK\r\n*1\r\n$1\r\nv\r\n*1\r\n$4\r\nPONG\r\n",
    )
    .await;
}

#[tokio::test]
#[serial]
async fn concurrent_writers_lose_no_writes() {
    let _ = connect().await;
    let run_id: u32 = rand::thread_rng().gen();

    let writers = (0..8).map(|i| {
        tokio::spawn(async move {
            let mut stream = TcpStream::connect(ADDR).await.unwrap();
            let key = format!("conc_{run_id}_{i}");
            let value = format!("value_{i}");

            let request = format!(
                "*3\r\n$3\r\nset\r\n${}\r\n{}\r\n${}\r\n{}\r\n",
                key.len(),
                key,
                value.len(),
                value
            );
            roundtrip(&mut stream, request.as_bytes(), b"*1\r\n$2\r\nOK\r\n").await;
        })
    });
    for result in join_all(writers).await {
        result.unwrap();
    }

    let mut stream = TcpStream::connect(ADDR).await.unwrap();
    for i in 0..8 {
        let key = format!("conc_{run_id}_{i}");
        let value = format!("value_{i}");

        let request = format!("*2\r\n$3\r\nget\r\n${}\r\n{}\r\n", key.len(), key);
        let expected = format!("*1\r\n${}\r\n{}\r\n", value.len(), value);
        roundtrip(&mut stream, request.as_bytes(), expected.as_bytes()).await;
    }
}
