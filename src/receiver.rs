use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info};

use crate::client::Session;
use crate::context::Shutdown;
use crate::error::Error;
use crate::message::Message;

/// Reads one line, failing if none arrives within `timeout`. Invalid UTF-8
/// is replaced rather than treated as an error.
pub(crate) async fn read_line<R: AsyncRead + Unpin>(reader: &mut BufReader<R>, timeout: Duration) -> io::Result<String> {
    let mut buf = Vec::new();

    match tokio::time::timeout(timeout, reader.read_until(b'\n', &mut buf)).await {
        Ok(Ok(0)) => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by server")),
        Ok(Ok(_)) => Ok(String::from_utf8_lossy(&buf).into_owned()),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "no data from server within the read timeout")),
    }
}

/// Reads and dispatches lines until the connection fails or the session is
/// shut down. The returned error is what ended the session.
pub(crate) async fn run<R: AsyncRead + Unpin>(session: &Session, mut reader: BufReader<R>, shutdown: Shutdown) -> Error {
    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.closed() => Err(io::Error::new(io::ErrorKind::ConnectionAborted, "disconnected")),
            line = read_line(&mut reader, session.options.read_timeout) => line,
        };

        match line {
            Ok(line) => {
                if session.options.debug {
                    debug!("> {}", line.trim_end());
                }
                session.dispatch(&Message::parse(&line));
            }
            Err(err) => {
                info!("receive loop stopped: {}", err);
                session.disconnect_session(&shutdown);
                return Error::Read(err);
            }
        }
    }
}
