use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::client::Session;
use crate::config::RateLimit;
use crate::context::Shutdown;

pub const WRITE_TIMEOUT: Duration = Duration::from_secs(60);

/// Token bucket for outbound lines.
///
/// Starts full. A deficit is paid for with a delay, never by rejecting the
/// line.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    per_second: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(limit: RateLimit, now: Instant) -> Self {
        let per = limit.per.as_secs_f64();
        Self {
            capacity: limit.capacity,
            per_second: if per > 0.0 { limit.capacity / per } else { f64::INFINITY },
            tokens: limit.capacity,
            last_refill: now,
        }
    }

    /// Spends one token, returning how long to wait before sending when the
    /// bucket was short.
    pub fn take(&mut self, now: Instant) -> Option<Duration> {
        if self.per_second.is_infinite() {
            return None;
        }

        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;

        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.per_second).min(self.capacity);
        }

        let delay = if self.tokens < 1.0 {
            Some(Duration::from_secs_f64(1.0 - self.tokens))
        } else {
            None
        };

        self.tokens -= 1.0;
        delay
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }
}

pub(crate) async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, data: &str) -> io::Result<()> {
    let write = async {
        writer.write_all(data.as_bytes()).await?;
        writer.flush().await
    };

    match tokio::time::timeout(WRITE_TIMEOUT, write).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write to server timed out")),
    }
}

/// Drains the outbound queue until shutdown or a failed write.
pub(crate) async fn run<W>(session: Arc<Session>, mut writer: W, mut queue: mpsc::Receiver<String>, shutdown: Shutdown)
where
    W: AsyncWrite + Unpin,
{
    let mut bucket = TokenBucket::new(session.options.rate_limit, Instant::now());

    loop {
        let mut line = tokio::select! {
            biased;
            _ = shutdown.closed() => break,
            line = queue.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        if !line.ends_with("\r\n") {
            line.push_str("\r\n");
        }

        if let Some(delay) = bucket.take(Instant::now()) {
            debug!("rate limited; holding message for {:?}", delay);
            tokio::select! {
                biased;
                _ = shutdown.closed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if session.options.debug {
            debug!("< {}", line.trim_end());
        }

        if let Err(err) = write_line(&mut writer, &line).await {
            error!("error sending: {}", err);
            session.disconnect_session(&shutdown);
            break;
        }
    }

    let _ = writer.shutdown().await;
}
