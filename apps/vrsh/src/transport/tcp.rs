// Author: Lukas Bower
//! TCP transport backend for the vrsh controller console.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};

use log::debug;

use super::{ConnectionError, ConnectionState, Transport};

/// TCP transport speaking the controller's line protocol.
///
/// Socket operations block without a timeout; a silent controller stalls the
/// console until it answers or drops the connection.
#[derive(Debug)]
pub struct TcpTransport {
    address: String,
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    state: ConnectionState,
}

impl TcpTransport {
    /// Connect to the controller at `address` (`host:port`).
    pub fn connect(address: impl Into<String>) -> Result<Self, ConnectionError> {
        let address = address.into();
        let stream = match TcpStream::connect(address.as_str()) {
            Ok(stream) => stream,
            Err(source) => return Err(ConnectionError::Refused { address, source }),
        };
        let reader_stream = split_reader(&stream)?;
        debug!("connected to controller at {address}");
        Ok(Self {
            address,
            stream,
            reader: BufReader::new(reader_stream),
            state: ConnectionState::Connected,
        })
    }

    /// Return the address this transport is connected to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    fn ensure_open(&self) -> Result<(), ConnectionError> {
        match self.state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Closed => Err(ConnectionError::Closed {
                reason: "connection already closed".to_owned(),
            }),
        }
    }

    fn close(&mut self, reason: String) -> ConnectionError {
        if self.state == ConnectionState::Connected {
            debug!("closing connection to {}: {reason}", self.address);
            let _ = self.stream.shutdown(Shutdown::Both);
            self.state = ConnectionState::Closed;
        }
        ConnectionError::Closed { reason }
    }
}

fn split_reader(stream: &TcpStream) -> Result<TcpStream, ConnectionError> {
    stream.try_clone().map_err(|err| {
        let _ = stream.shutdown(Shutdown::Both);
        reader_split_failed(&err)
    })
}

// Only reached after a successful connect.
fn reader_split_failed(err: &io::Error) -> ConnectionError {
    ConnectionError::Closed {
        reason: format!("failed to open response reader: {err}"),
    }
}

impl Transport for TcpTransport {
    fn send_line(&mut self, line: &str) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        let result = self
            .stream
            .write_all(line.as_bytes())
            .and_then(|()| self.stream.write_all(b"\n"))
            .and_then(|()| self.stream.flush());
        match result {
            Ok(()) => {
                debug!("-> {line}");
                Ok(())
            }
            Err(err) => Err(self.close(format!("failed to write request: {err}"))),
        }
    }

    fn receive_line(&mut self) -> Result<String, ConnectionError> {
        self.ensure_open()?;
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Err(self.close("connection closed by peer".to_owned())),
            Ok(_) => {
                let line = line.trim_end_matches(['\r', '\n']).to_owned();
                debug!("<- {line}");
                Ok(line)
            }
            Err(err) => Err(self.close(format!("failed to read response: {err}"))),
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn request_round_trip() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "get status\n");
            write!(stream, "running\r\n").unwrap();
        });

        let mut transport = TcpTransport::connect(format!("127.0.0.1:{port}")).unwrap();
        assert_eq!(transport.state(), ConnectionState::Connected);
        assert_eq!(transport.request("get status").unwrap(), "running");
        server.join().unwrap();
    }

    #[test]
    fn peer_close_is_reported_as_closed() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let mut transport = TcpTransport::connect(format!("127.0.0.1:{port}")).unwrap();
        server.join().unwrap();
        let err = transport.receive_line().unwrap_err();
        assert!(err.is_closed());
        assert_eq!(transport.state(), ConnectionState::Closed);

        let again = transport.send_line("status").unwrap_err();
        assert!(again.is_closed());
        assert!(again.to_string().contains("already closed"));
    }

    #[test]
    fn reader_split_failure_is_a_closure() {
        let err = reader_split_failed(&io::Error::new(io::ErrorKind::Other, "descriptor limit"));
        assert!(err.is_closed());
        assert!(!err.to_string().contains("cannot find the controller"));
        assert!(err.to_string().contains("descriptor limit"));
    }

    #[test]
    fn refused_connection_is_distinguished() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = TcpTransport::connect(format!("127.0.0.1:{port}")).unwrap_err();
        assert!(matches!(err, ConnectionError::Refused { .. }));
        assert!(!err.is_closed());
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    }
}
