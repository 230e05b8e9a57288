use std::{fmt, path::PathBuf};

use log::{debug, info};
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisError};

use crate::{
    executor::{CommandSink, Invocation},
    kvfeed_error::Result,
    KvfeedError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
}

impl ConnectionTarget {
    /// Both or neither is a usage error.
    pub fn from_flags(host: Option<String>, port: u16, socket: Option<PathBuf>) -> Result<Self> {
        match (host, socket) {
            (Some(host), None) => Ok(ConnectionTarget::Tcp { host, port }),
            (None, Some(path)) => Ok(ConnectionTarget::Unix { path }),
            _ => Err(KvfeedError::Usage(
                "Must specify either host/port or unix socket".to_owned(),
            )),
        }
    }

    fn connection_info(&self) -> ConnectionInfo {
        let addr = match self {
            ConnectionTarget::Tcp { host, port } => ConnectionAddr::Tcp(host.clone(), *port),
            ConnectionTarget::Unix { path } => ConnectionAddr::Unix(path.clone()),
        };
        ConnectionInfo {
            addr,
            redis: RedisConnectionInfo::default(),
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionTarget::Tcp { host, port } => write!(f, "{}:{}", host, port),
            ConnectionTarget::Unix { path } => write!(f, "{}", path.display()),
        }
    }
}

pub struct StoreSession {
    target: ConnectionTarget,
    conn: redis::Connection,
}

impl StoreSession {
    pub fn connect(target: ConnectionTarget) -> Result<Self> {
        let conn = redis::Client::open(target.connection_info())
            .and_then(|client| client.get_connection());

        match conn {
            Ok(conn) => {
                info!("Connected to {}", target);
                Ok(Self { target, conn })
            }
            Err(source) => Err(KvfeedError::Connect { target, source }),
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn close(self) {
        info!("Disconnected from {}", self.target);
        drop(self.conn);
    }
}

impl CommandSink for StoreSession {
    fn send(&mut self, invocation: &Invocation<'_>) -> Result<()> {
        debug!(
            "{} {} <{} bytes>",
            invocation.command,
            invocation.key,
            invocation.value.len()
        );

        redis::cmd(invocation.command)
            .arg(invocation.key)
            .arg(invocation.value)
            .query::<redis::Value>(&mut self.conn)
            .map(|_| ())
            .map_err(classify)
    }
}

// A reply code means the store answered with an error reply.
fn classify(err: RedisError) -> KvfeedError {
    match (err.code(), err.detail()) {
        (Some(code), Some(detail)) => KvfeedError::ErrorReply(format!("{} {}", code, detail)),
        (Some(code), None) => KvfeedError::ErrorReply(code.to_owned()),
        _ => KvfeedError::RoundTrip(err.to_string()),
    }
}
