use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ServeError;
use crate::fs::FileSystem;
use crate::http::date::http_date;
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::ServerContext;

/// How long to keep reading after the response before closing.
const LINGER_TIMEOUT: Duration = Duration::from_millis(500);
/// Most bytes discarded while lingering.
const LINGER_MAX_BYTES: usize = 1024 * 1024;

/// Serves exactly one request on a client stream.
pub struct Connection<S, F: FileSystem> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    ctx: Arc<ServerContext<F>>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

/// What came off the wire before the handler ran.
enum Incoming {
    Request(Request),
    /// Client went away without sending a full request.
    Closed,
    /// Unusable request; answered with an error page.
    Rejected(ServeError),
}

impl<S, F> Connection<S, F>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FileSystem,
{
    pub fn new(stream: S, ctx: Arc<ServerContext<F>>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Reading,
            ctx,
        }
    }

    /// Drives the connection to completion.
    ///
    /// Returns an error only for transport failures; those abort the
    /// connection without a response.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_with_deadline().await? {
                        Incoming::Request(req) => ConnectionState::Processing(req),
                        Incoming::Closed => ConnectionState::Closed,
                        Incoming::Rejected(err) => {
                            tracing::warn!(error = %err, status = err.status().as_u16(), "Rejecting request");
                            ConnectionState::Writing(Self::writer_for(Response::from_error(&err)))
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    let mut response = self.ctx.handler.handle(&req).await;
                    if req.method == Method::HEAD {
                        response = response.into_head();
                    }

                    tracing::info!(
                        method = %req.method,
                        path = %req.path(),
                        status = response.status.as_u16(),
                        bytes = response.content_length(),
                        "Request served"
                    );

                    self.state = ConnectionState::Writing(Self::writer_for(response));
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    // Best effort: the peer may already be gone.
                    let _ = self.stream.shutdown().await;
                    self.linger().await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Discards whatever the client is still sending, until EOF, the byte
    /// cap or the timeout. Unread input at close turns into a TCP reset.
    async fn linger(&mut self) {
        let drain = async {
            let mut discarded = 0usize;
            let mut sink = [0u8; 4096];
            while discarded < LINGER_MAX_BYTES {
                match self.stream.read(&mut sink).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => discarded += n,
                }
            }
        };
        let _ = tokio::time::timeout(LINGER_TIMEOUT, drain).await;
    }

    fn writer_for(mut response: Response) -> ResponseWriter {
        response.headers.set("Date", http_date(SystemTime::now()));
        ResponseWriter::new(response)
    }

    async fn read_with_deadline(&mut self) -> anyhow::Result<Incoming> {
        match self.ctx.read_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.read_request()).await {
                Ok(result) => result,
                Err(_) => Ok(Incoming::Rejected(ServeError::Timeout)),
            },
            None => self.read_request().await,
        }
    }

    async fn read_request(&mut self) -> anyhow::Result<Incoming> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer, &self.ctx.limits) {
                Ok((request, consumed)) => {
                    // Remove consumed bytes
                    let _ = self.buffer.split_to(consumed);
                    return Ok(Incoming::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    return Ok(Incoming::Rejected(e.into()));
                }
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(Incoming::Closed);
                }
                tracing::debug!(buffered = self.buffer.len(), "Client closed mid-request");
                // Answered only once a full request line is buffered.
                if self.buffer.windows(2).any(|w| w == b"\r\n") {
                    return Ok(Incoming::Rejected(ParseError::Incomplete.into()));
                }
                return Ok(Incoming::Closed);
            }
        }
    }
}
