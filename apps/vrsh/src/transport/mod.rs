// Author: Lukas Bower

//! Transport backends for the vrsh console.

use std::io;

use thiserror::Error;

/// Default TCP port exposed by the controller console listener.
pub const VRSH_CONTROLLER_PORT: u16 = 31337;

pub mod tcp;

/// Connection lifecycle observed by the command loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    /// Requests may be issued.
    Connected,
    /// The connection failed or was closed by the controller; irreversible.
    Closed,
}

/// Errors surfaced by the connection client.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The initial connection could not be established.
    #[error("cannot find the controller on {address}: {source}")]
    Refused {
        /// Address that was dialled.
        address: String,
        /// Underlying socket failure.
        #[source]
        source: io::Error,
    },
    /// The connection was lost after it had been established.
    #[error("connection to the controller closed: {reason}")]
    Closed {
        /// Description of the failure or closure.
        reason: String,
    },
}

impl ConnectionError {
    /// Return true for the recoverable connection-closed condition.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

/// Line-oriented request/response channel to the controller.
pub trait Transport {
    /// Send a single request line.
    fn send_line(&mut self, line: &str) -> Result<(), ConnectionError>;

    /// Receive a single response line with the terminator stripped.
    fn receive_line(&mut self) -> Result<String, ConnectionError>;

    /// Return the current connection state.
    fn state(&self) -> ConnectionState;

    /// Send one request and wait for its response.
    fn request(&mut self, line: &str) -> Result<String, ConnectionError> {
        self.send_line(line)?;
        self.receive_line()
    }
}
