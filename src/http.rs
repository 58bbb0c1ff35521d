use anyhow::Result;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, BufStream},
    net::TcpStream
};

use crate::addr::Addr;

/// Minimal HTTP/1.0 client for feed index endpoints
pub struct FeedClient {
    stream: BufStream<TcpStream>,
    host: String
}

impl FeedClient {
    /// Open a connection to an already resolved feed endpoint
    pub async fn connect(addr: Addr, host: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr.to_socket_addr()).await?;
        Ok(Self {
            // Use bufferer for socket to reduce syscalls we make
            stream: BufStream::new(stream),
            host: host.to_owned()
        })
    }

    /// Issue a GET and hand back a reader over the response
    pub async fn get(mut self, path: &str, agent: &str, http_max_len: usize) -> Result<ResponseReader> {
        self.stream.write_all(format!("GET {} HTTP/1.0\r\n\
Host: {}\r\n\
Connection: close\r\n\
User-Agent: {}\r\n\r\n",
            path,
            self.host,
            agent
        ).as_bytes()).await?;
        self.stream.flush().await?;

        Ok(ResponseReader {
            stream: self.stream,
            http_max_len
        })
    }
}

pub struct ResponseReader {
    stream: BufStream<TcpStream>,
    http_max_len: usize
}

impl ResponseReader {
    /// Read status line and headers only and return their buffer
    pub async fn read_headers(&mut self) -> Result<Vec<u8>> {
        let mut buf  = Vec::new();
        let mut byte = [0; 1];
        loop {
            if self.stream.read(&mut byte).await? == 0 {
                return Err(anyhow::Error::msg("connection closed inside headers"));
            }
            buf.extend_from_slice(&byte);
            // checking if double crlf is in header
            if buf.len() >= 4 && buf[buf.len() - 4..].eq(b"\r\n\r\n") {
                break;
            } else if buf.len() > self.http_max_len {
                // Stop any potential attack
                return Err(anyhow::Error::msg("long header"));
            }
        }

        Ok(buf)
    }

    /// Parse the status code out of a headers buffer. Header values
    /// themselves carry nothing we use and are discarded.
    pub fn status_code(headers_buf: &[u8]) -> Result<u16> {
        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut resp    = httparse::Response::new(&mut headers);

        match resp.parse(headers_buf) {
            Ok(httparse::Status::Complete(_)) => {},
            Ok(httparse::Status::Partial) => return Err(anyhow::Error::msg("Incomplete response")),
            Err(e) => return Err(e.into())
        };

        match resp.code {
            Some(code) => Ok(code),
            None => Err(anyhow::Error::msg("Received unexpected response"))
        }
    }

    /// Read the close-delimited body. Feeds routinely drop the line
    /// without a clean shutdown, so a transport error after any data
    /// has arrived counts as end of body.
    pub async fn read_body(&mut self) -> Result<String> {
        let mut body  = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match self.stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => body.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    if body.is_empty() {
                        return Err(e.into());
                    }
                    // end of body reached
                    break;
                }
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
