//! NUT server addresses.

use std::fmt;
use std::net::Ipv6Addr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::with_default_port;

/// Reasons a target address is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// Address is empty.
    #[error("target address is empty")]
    Empty,

    /// Address contains whitespace or control characters.
    #[error("target address '{0}' contains whitespace or control characters")]
    Whitespace(String),

    /// Port is not a number in 1..=65535.
    #[error("target '{target}' has invalid port '{port}'")]
    InvalidPort {
        /// Offending target.
        target: String,
        /// Port text as given.
        port: String,
    },

    /// Host part is empty or malformed.
    #[error("target '{0}' has an invalid host")]
    InvalidHost(String),
}

/// Address of one NUT server: `host`, `host:port`, `[v6]:port` or a bare
/// IPv6 literal. The port defaults to 3493.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address handed to the dialer, port included.
    pub fn dial_address(&self) -> String {
        with_default_port(&self.0)
    }

    /// Check that the address can be dialed.
    ///
    /// Host names are not resolved here.
    pub fn validate(&self) -> Result<(), TargetError> {
        let address = self.0.as_str();
        if address.is_empty() {
            return Err(TargetError::Empty);
        }
        if address
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(TargetError::Whitespace(address.to_string()));
        }

        if let Some(rest) = address.strip_prefix('[') {
            let Some((host, tail)) = rest.split_once(']') else {
                return Err(TargetError::InvalidHost(address.to_string()));
            };
            if host.parse::<Ipv6Addr>().is_err() {
                return Err(TargetError::InvalidHost(address.to_string()));
            }
            return match tail {
                "" => Ok(()),
                _ => match tail.strip_prefix(':') {
                    Some(port) => self.check_port(port),
                    None => Err(TargetError::InvalidHost(address.to_string())),
                },
            };
        }

        match address.matches(':').count() {
            0 => Ok(()),
            1 => {
                let (host, port) = address.split_once(':').unwrap_or((address, ""));
                if host.is_empty() {
                    return Err(TargetError::InvalidHost(address.to_string()));
                }
                self.check_port(port)
            }
            _ => address
                .parse::<Ipv6Addr>()
                .map(|_| ())
                .map_err(|_| TargetError::InvalidHost(address.to_string())),
        }
    }

    fn check_port(&self, port: &str) -> Result<(), TargetError> {
        match port.parse::<u16>() {
            Ok(p) if p != 0 => Ok(()),
            _ => Err(TargetError::InvalidPort {
                target: self.0.clone(),
                port: port.to_string(),
            }),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Target {
    fn from(address: String) -> Self {
        Self(address)
    }
}
