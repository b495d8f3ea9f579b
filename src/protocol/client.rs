//! Line-oriented NUT client.
//!
//! Implements the two list commands needed for metric collection:
//!
//! ```text
//! C: LIST UPS
//! S: BEGIN LIST UPS
//! S: UPS ups1 "Rack UPS"
//! S: END LIST UPS
//! C: LIST VAR ups1
//! S: BEGIN LIST VAR ups1
//! S: VAR ups1 battery.charge "100"
//! S: END LIST VAR ups1
//! ```

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::error::ClientError;
use super::quote::unquote;
use super::VariableSet;

/// Port `upsd` listens on when the address does not name one.
pub const DEFAULT_PORT: u16 = 3493;

/// Default connect timeout (5 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default per-read/per-write deadline (10 seconds).
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest response line accepted, newline included.
const MAX_LINE_LEN: usize = 64 * 1024;

/// Deadlines applied to a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Time allowed for name resolution plus TCP connect.
    pub connect_timeout: Duration,
    /// Time allowed for each individual line read or command write.
    pub io_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl ClientOptions {
    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-operation I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }
}

/// Append [`DEFAULT_PORT`] to `address` unless it already carries a port.
///
/// Bare IPv6 literals are bracketed.
///
/// ```
/// use nut_exporter::protocol::with_default_port;
///
/// assert_eq!(with_default_port("localhost"), "localhost:3493");
/// assert_eq!(with_default_port("10.0.0.5:4000"), "10.0.0.5:4000");
/// assert_eq!(with_default_port("::1"), "[::1]:3493");
/// ```
pub fn with_default_port(address: &str) -> String {
    if let Some(rest) = address.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) if rest[end + 1..].is_empty() => format!("{address}:{DEFAULT_PORT}"),
            _ => address.to_string(),
        };
    }

    match address.matches(':').count() {
        0 => format!("{address}:{DEFAULT_PORT}"),
        1 => address.to_string(),
        _ => format!("[{address}]:{DEFAULT_PORT}"),
    }
}

/// A connection to a single NUT server.
///
/// The client is generic over the stream so that it can run over anything
/// duplex; [`Client::dial`] produces the TCP flavour.
pub struct Client<S = TcpStream> {
    stream: BufReader<S>,
    io_timeout: Duration,
}

impl Client<TcpStream> {
    /// Connect to a NUT server, defaulting the port to 3493.
    ///
    /// # Errors
    /// Returns `ClientError::Connection` if resolution or connect fails and
    /// `ClientError::Timeout` if `options.connect_timeout` elapses first.
    pub async fn dial(address: &str, options: &ClientOptions) -> Result<Self, ClientError> {
        let address = with_default_port(address);
        let stream = timeout(options.connect_timeout, TcpStream::connect(address.as_str()))
            .await
            .map_err(|_| ClientError::Timeout(options.connect_timeout))??;
        stream.set_nodelay(true)?;

        tracing::debug!(address = %address, "Connected to NUT server");
        Ok(Self::new(stream, options.io_timeout))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already established stream.
    pub fn new(stream: S, io_timeout: Duration) -> Self {
        Self {
            stream: BufReader::new(stream),
            io_timeout,
        }
    }

    /// Shut the connection down.
    pub async fn close(mut self) -> Result<(), ClientError> {
        let io_timeout = self.io_timeout;
        timeout(io_timeout, self.stream.get_mut().shutdown())
            .await
            .map_err(|_| ClientError::Timeout(io_timeout))??;
        Ok(())
    }

    /// List the names of all devices served by the server, in server order.
    pub async fn list_devices(&mut self) -> Result<Vec<String>, ClientError> {
        self.list("UPS")
            .await?
            .into_iter()
            .map(|payload| match payload.split_once(' ') {
                Some((name, _description)) => Ok(name.to_string()),
                None => Err(ClientError::MalformedItem(format!(
                    "malformed device line: {payload:?}"
                ))),
            })
            .collect()
    }

    /// Fetch every variable of `device` with its unquoted value.
    pub async fn list_variables(&mut self, device: &str) -> Result<VariableSet, ClientError> {
        if device.is_empty() || device.contains(|c: char| c.is_whitespace() || c.is_control()) {
            return Err(ClientError::InvalidDevice(device.to_string()));
        }

        let payloads = self.list(&format!("VAR {device}")).await?;
        let mut variables = VariableSet::new();
        for payload in payloads {
            let (name, raw) = payload.split_once(' ').ok_or_else(|| {
                ClientError::MalformedItem(format!("malformed variable line: {payload:?}"))
            })?;
            let value = unquote(raw).map_err(|source| ClientError::ValueDecode {
                variable: name.to_string(),
                source,
            })?;
            variables.insert(name.to_string(), value);
        }
        Ok(variables)
    }

    /// Run `LIST <kind>` and return the payload of every data line.
    ///
    /// The full frame is consumed before anything is returned.
    async fn list(&mut self, kind: &str) -> Result<Vec<String>, ClientError> {
        let command = format!("LIST {kind}");
        self.write_line(&command).await?;

        let begin = format!("BEGIN {command}");
        let first = self.read_line().await?;
        if first != begin {
            if let Some(code) = first.strip_prefix("ERR ") {
                return Err(ClientError::Server(code.to_string()));
            }
            return Err(ClientError::unexpected(&begin, &first));
        }

        let end = format!("END {command}");
        let prefix = format!("{kind} ");
        let mut payloads = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line == end {
                break;
            }
            let payload = line
                .strip_prefix(prefix.as_str())
                .ok_or_else(|| ClientError::unexpected(&prefix, &line))?;
            payloads.push(payload.to_string());
        }

        tracing::trace!(command = %command, items = payloads.len(), "List response read");
        Ok(payloads)
    }

    async fn write_line(&mut self, line: &str) -> Result<(), ClientError> {
        let io_timeout = self.io_timeout;
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let stream = self.stream.get_mut();
        timeout(io_timeout, async {
            stream.write_all(&buf).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| ClientError::Timeout(io_timeout))??;
        Ok(())
    }

    /// Read one `\n`-terminated line, without the terminator.
    async fn read_line(&mut self) -> Result<String, ClientError> {
        let io_timeout = self.io_timeout;
        let mut line = String::new();
        let mut limited = (&mut self.stream).take(MAX_LINE_LEN as u64);

        let read = timeout(io_timeout, limited.read_line(&mut line))
            .await
            .map_err(|_| ClientError::Timeout(io_timeout))?;
        let n = match read {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(ClientError::Protocol("response is not valid UTF-8".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !line.ends_with('\n') {
            if n >= MAX_LINE_LEN {
                return Err(ClientError::Protocol(format!(
                    "response line exceeds {MAX_LINE_LEN} bytes"
                )));
            }
            return Err(ClientError::Connection(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed before end of line",
            )));
        }
        line.pop();
        Ok(line)
    }
}

impl<S> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, duplex};
    use tokio::net::TcpListener;

    /// Client wired to an in-memory peer that has already queued `response`.
    async fn scripted(response: &str) -> (Client<DuplexStream>, DuplexStream) {
        let (client_end, mut server_end) = duplex(256 * 1024);
        server_end.write_all(response.as_bytes()).await.unwrap();
        (Client::new(client_end, Duration::from_secs(1)), server_end)
    }

    async fn sent_command(server_end: &mut DuplexStream, expected: &str) {
        let mut buf = vec![0u8; expected.len()];
        server_end.read_exact(&mut buf).await.unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), expected);
    }

    #[test]
    fn test_with_default_port() {
        assert_eq!(with_default_port("localhost"), "localhost:3493");
        assert_eq!(with_default_port("ups.lan:4000"), "ups.lan:4000");
        assert_eq!(with_default_port("192.168.1.10"), "192.168.1.10:3493");
        assert_eq!(with_default_port("fe80::1"), "[fe80::1]:3493");
        assert_eq!(with_default_port("[fe80::1]"), "[fe80::1]:3493");
        assert_eq!(with_default_port("[fe80::1]:3494"), "[fe80::1]:3494");
    }

    #[test]
    fn test_client_options_builder() {
        let options = ClientOptions::default()
            .with_connect_timeout(Duration::from_secs(1))
            .with_io_timeout(Duration::from_millis(250));
        assert_eq!(options.connect_timeout, Duration::from_secs(1));
        assert_eq!(options.io_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_list_devices() {
        let (mut client, mut server) = scripted(
            "BEGIN LIST UPS\nUPS rack \"Rack UPS in server room\"\nUPS desk \"Desk\"\nEND LIST UPS\n",
        )
        .await;

        let devices = client.list_devices().await.unwrap();
        assert_eq!(devices, vec!["rack", "desk"]);
        sent_command(&mut server, "LIST UPS\n").await;
    }

    #[tokio::test]
    async fn test_list_devices_empty() {
        let (mut client, _server) = scripted("BEGIN LIST UPS\nEND LIST UPS\n").await;
        assert!(client.list_devices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_devices_wrong_begin() {
        let (mut client, _server) = scripted("BEGIN LIST VAR\nEND LIST UPS\n").await;
        let err = client.list_devices().await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_list_devices_wrong_prefix() {
        let (mut client, _server) =
            scripted("BEGIN LIST UPS\nUPS rack \"Rack\"\nVAR rack x \"1\"\nEND LIST UPS\n").await;
        let err = client.list_devices().await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_list_devices_line_without_description() {
        let (mut client, _server) = scripted("BEGIN LIST UPS\nUPS rack\nEND LIST UPS\n").await;
        let err = client.list_devices().await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedItem(_)), "got {err:?}");
        assert!(err.to_string().contains("malformed device line"));
        assert!(err.is_in_sync());
    }

    #[tokio::test]
    async fn test_server_error_reply() {
        let (mut client, _server) = scripted("ERR ACCESS-DENIED\n").await;
        let err = client.list_devices().await.unwrap_err();
        assert!(matches!(&err, ClientError::Server(code) if code == "ACCESS-DENIED"));
        assert!(err.is_in_sync());
    }

    #[tokio::test]
    async fn test_list_variables() {
        let (mut client, mut server) = scripted(concat!(
            "BEGIN LIST VAR rack\n",
            "VAR rack battery.charge \"100\"\n",
            "VAR rack device.mfr \"APC \\\"Schneider\\\"\"\n",
            "VAR rack ups.status \"OL CHRG\"\n",
            "END LIST VAR rack\n",
        ))
        .await;

        let vars = client.list_variables("rack").await.unwrap();
        assert_eq!(vars.len(), 3);
        assert_eq!(vars["battery.charge"], "100");
        assert_eq!(vars["device.mfr"], "APC \"Schneider\"");
        assert_eq!(vars["ups.status"], "OL CHRG");
        sent_command(&mut server, "LIST VAR rack\n").await;
    }

    #[tokio::test]
    async fn test_list_variables_end_must_echo_device() {
        let (mut client, _server) = scripted(
            "BEGIN LIST VAR rack\nVAR rack battery.charge \"100\"\nEND LIST VAR desk\n",
        )
        .await;
        let err = client.list_variables("rack").await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_list_variables_other_device_prefix() {
        let (mut client, _server) = scripted(
            "BEGIN LIST VAR rack\nVAR desk battery.charge \"100\"\nEND LIST VAR rack\n",
        )
        .await;
        assert!(matches!(
            client.list_variables("rack").await,
            Err(ClientError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_list_variables_bad_value() {
        let (mut client, _server) = scripted(
            "BEGIN LIST VAR rack\nVAR rack battery.charge 100\nEND LIST VAR rack\n",
        )
        .await;
        let err = client.list_variables("rack").await.unwrap_err();
        assert!(
            matches!(&err, ClientError::ValueDecode { variable, .. } if variable == "battery.charge")
        );
    }

    #[tokio::test]
    async fn test_client_stays_usable_after_decode_error() {
        let (mut client, _server) = scripted(concat!(
            "BEGIN LIST VAR rack\nVAR rack ups.mfr \"bad\\q\"\nEND LIST VAR rack\n",
            "BEGIN LIST VAR desk\nVAR desk ups.load \"12\"\nEND LIST VAR desk\n",
        ))
        .await;

        assert!(client.list_variables("rack").await.unwrap_err().is_in_sync());
        let vars = client.list_variables("desk").await.unwrap();
        assert_eq!(vars["ups.load"], "12");
    }

    #[tokio::test]
    async fn test_client_stays_usable_after_malformed_item() {
        let (mut client, _server) = scripted(concat!(
            "BEGIN LIST VAR rack\nVAR rack battery.charge\nEND LIST VAR rack\n",
            "BEGIN LIST VAR desk\nVAR desk ups.load \"12\"\nEND LIST VAR desk\n",
        ))
        .await;

        let err = client.list_variables("rack").await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedItem(_)), "got {err:?}");
        assert!(err.is_in_sync());
        let vars = client.list_variables("desk").await.unwrap();
        assert_eq!(vars["ups.load"], "12");
    }

    #[tokio::test]
    async fn test_list_variables_rejects_injected_device() {
        let (mut client, _server) = scripted("").await;
        assert!(matches!(
            client.list_variables("rack\nLIST UPS").await,
            Err(ClientError::InvalidDevice(_))
        ));
        assert!(matches!(
            client.list_variables("").await,
            Err(ClientError::InvalidDevice(_))
        ));
    }

    #[tokio::test]
    async fn test_eof_mid_response() {
        let (mut client, server) = scripted("BEGIN LIST UPS\nUPS rack \"Ra").await;
        drop(server);
        let err = client.list_devices().await.unwrap_err();
        assert!(err.is_connection(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let (client_end, _server_end) = duplex(1024);
        let mut client = Client::new(client_end, Duration::from_millis(50));
        let err = client.list_devices().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_overlong_line() {
        let long = format!("BEGIN LIST UPS\nUPS rack \"{}\"\n", "x".repeat(MAX_LINE_LEN));
        let (mut client, _server) = scripted(&long).await;
        let err = client.list_devices().await.unwrap_err();
        assert!(err.to_string().contains("exceeds"), "got {err:?}");
    }

    #[tokio::test]
    async fn test_dial_connection_refused() {
        // Grab a free port, then release it so nothing is listening.
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return,
            Err(e) => panic!("Failed to bind test listener: {e}"),
        };
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = Client::dial(&addr.to_string(), &ClientOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_connection(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_dial_and_close() {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return,
            Err(e) => panic!("Failed to bind test listener: {e}"),
        };
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let client = Client::dial(&addr.to_string(), &ClientOptions::default())
            .await
            .unwrap();
        client.close().await.unwrap();
    }
}
