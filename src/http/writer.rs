use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes the status line and header block, including the blank line.
///
/// Header order is fixed: Content-Length, Content-Type, then the remaining
/// headers in insertion order.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    push_header(&mut buf, "Content-Length", &resp.content_length().to_string());
    if let Some(content_type) = resp.content_type() {
        push_header(&mut buf, "Content-Type", content_type);
    }

    for (k, v) in resp.headers.iter() {
        if k.eq_ignore_ascii_case("Content-Length") || k.eq_ignore_ascii_case("Content-Type") {
            continue;
        }
        push_header(&mut buf, k, v);
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

fn push_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}

/// Writes one response to a client. Consumes the response, so an open file
/// body is closed when writing finishes or fails.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Body,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        let head = serialize_head(&response);
        Self {
            head,
            body: response.body,
        }
    }

    /// Writes the head and body. Errors are returned as-is; nothing is
    /// retried.
    pub async fn write_to_stream<W>(self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let Self { mut head, body } = self;

        match body {
            Body::Empty | Body::Omitted(_) => {
                stream.write_all(&head).await.context("writing response head")?;
            }
            Body::Bytes(bytes) => {
                head.extend_from_slice(&bytes);
                stream.write_all(&head).await.context("writing response")?;
            }
            Body::File { reader, len } => {
                stream.write_all(&head).await.context("writing response head")?;

                let mut limited = reader.take(len);
                let copied = tokio::io::copy(&mut limited, stream)
                    .await
                    .context("streaming file body")?;

                if copied != len {
                    anyhow::bail!("file ended after {} of {} bytes", copied, len);
                }
            }
        }

        stream.flush().await.context("flushing response")?;
        Ok(())
    }
}
