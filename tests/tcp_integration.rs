// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests against a local NTCONTROL server.
//!
//! The server behaves like a projector: it greets every connection, reads
//! one command, replies and closes the socket.

use std::time::Duration;

use md5::{Digest, Md5};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use panaproj_lib::types::{Input, PowerState};
use panaproj_lib::{Projector, ProjectorConfig};

/// One scripted connection: the greeting to send and the reply to give.
struct Exchange {
    greeting: &'static str,
    reply: &'static str,
}

/// Serves `script` one connection at a time and reports every received
/// command (raw bytes, terminator included).
async fn spawn_projector(script: Vec<Exchange>) -> (u16, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for exchange in script {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            write.write_all(exchange.greeting.as_bytes()).await.unwrap();

            let mut reader = BufReader::new(read);
            let mut command = Vec::new();
            reader.read_until(b'\r', &mut command).await.unwrap();
            let _ = tx.send(command);

            write.write_all(exchange.reply.as_bytes()).await.unwrap();
            write.shutdown().await.unwrap();
        }
    });

    (port, rx)
}

async fn next_command(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<u8> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no command received")
        .expect("server stopped")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

fn projector(port: u16) -> Projector {
    let config = ProjectorConfig::tcp("127.0.0.1")
        .with_port(port)
        .with_credentials("admin", "pass");
    let projector = Projector::builder("lan-projector", config).build().unwrap();
    projector.initialize();
    projector
}

#[tokio::test]
async fn authenticated_power_query() {
    let (port, mut commands) = spawn_projector(vec![Exchange {
        greeting: "NTCONTROL 1 12345678\r",
        reply: "00001\r",
    }])
    .await;
    let projector = projector(port);

    projector.poll().unwrap();

    let token = String::from_utf8_lossy(&Md5::digest(b"admin:pass:12345678")).into_owned();
    let expected = format!("{token}00QPW\r").into_bytes();
    assert_eq!(next_command(&mut commands).await, expected);

    wait_until(|| projector.power_state() == PowerState::On).await;
    wait_until(|| !projector.is_connected()).await;
    assert!(projector.is_online());
    projector.shutdown().await.unwrap();
}

#[tokio::test]
async fn unauthenticated_commands_drain_across_connections() {
    let (port, mut commands) = spawn_projector(vec![
        Exchange {
            greeting: "NTCONTROL 0\r",
            reply: "00000\r",
        },
        Exchange {
            greeting: "NTCONTROL 0\r",
            reply: "00IIS:HD1\r",
        },
    ])
    .await;
    let projector = projector(port);

    projector.poll().unwrap();
    projector.set_input(Input::Hd1).unwrap();

    assert_eq!(next_command(&mut commands).await, b"00QPW\r");
    assert_eq!(next_command(&mut commands).await, b"00IIS:HD1\r");

    wait_until(|| projector.dispatcher().queued() == 0 && !projector.is_connected()).await;
    assert_eq!(projector.power_state(), PowerState::Off);
    assert_eq!(projector.current_input(), Input::Hd1);
    projector.shutdown().await.unwrap();
}

#[tokio::test]
async fn unreachable_projector_keeps_commands_queued() {
    // Bind then drop to get a port nothing listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let projector = projector(port);

    projector.poll().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(!projector.is_connected());
    assert_eq!(projector.dispatcher().queued(), 1);
    projector.shutdown().await.unwrap();
}
