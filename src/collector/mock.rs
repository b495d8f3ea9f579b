//! In-process NUT server for collector tests.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::protocol::quote;

/// Scripted server state.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockUps {
    devices: Vec<(String, Vec<(String, String)>)>,
    failing: HashSet<String>,
    garbled: HashSet<String>,
    valueless: HashSet<String>,
    silent: bool,
}

impl MockUps {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn device(mut self, name: &str, vars: &[(&str, &str)]) -> Self {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.devices.push((name.to_string(), vars));
        self
    }

    /// Answer `LIST VAR` for `name` with `ERR ACCESS-DENIED`.
    pub(crate) fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Answer `LIST VAR` for `name` with a frame that breaks the grammar.
    pub(crate) fn garbled(mut self, name: &str) -> Self {
        self.garbled.insert(name.to_string());
        self
    }

    /// Answer `LIST VAR` for `name` with a well-framed reply whose `VAR`
    /// lines carry no value.
    pub(crate) fn valueless(mut self, name: &str) -> Self {
        self.valueless.insert(name.to_string());
        self
    }

    /// Accept connections but never reply.
    pub(crate) fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Listen on an ephemeral loopback port.
    ///
    /// Returns `None` when the sandbox forbids binding.
    pub(crate) async fn start(self) -> Option<MockServer> {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return None,
            Err(e) => panic!("Failed to bind mock NUT server: {e}"),
        };
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let ups = self.clone();
                tokio::spawn(async move { ups.serve(stream).await });
            }
        });

        Some(MockServer { addr, handle })
    }

    async fn serve(self, stream: TcpStream) {
        let mut stream = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            match stream.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            if self.silent {
                continue;
            }

            let reply = self.reply(line.trim_end());
            if stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }

    fn reply(&self, command: &str) -> String {
        if command == "LIST UPS" {
            let mut out = String::from("BEGIN LIST UPS\n");
            for (name, _) in &self.devices {
                out.push_str(&format!("UPS {name} \"Mock device\"\n"));
            }
            out.push_str("END LIST UPS\n");
            return out;
        }

        let Some(device) = command.strip_prefix("LIST VAR ") else {
            return "ERR UNKNOWN-COMMAND\n".to_string();
        };
        if self.failing.contains(device) {
            return "ERR ACCESS-DENIED\n".to_string();
        }
        if self.garbled.contains(device) {
            return format!("BEGIN LIST VAR {device}\nGARBAGE\n");
        }
        let Some((_, vars)) = self.devices.iter().find(|(name, _)| name == device) else {
            return "ERR UNKNOWN-UPS\n".to_string();
        };

        let mut out = format!("BEGIN LIST VAR {device}\n");
        for (key, value) in vars {
            if self.valueless.contains(device) {
                out.push_str(&format!("VAR {device} {key}\n"));
            } else {
                out.push_str(&format!("VAR {device} {key} {}\n", quote(value)));
            }
        }
        out.push_str(&format!("END LIST VAR {device}\n"));
        out
    }
}

/// Running mock server; stops accepting when dropped.
pub(crate) struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub(crate) fn address(&self) -> String {
        self.addr.to_string()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An address nothing listens on.
pub(crate) async fn unreachable_address() -> Option<String> {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(l) => l,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => return None,
        Err(e) => panic!("Failed to bind test listener: {e}"),
    };
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Some(addr.to_string())
}
