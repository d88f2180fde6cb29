//! Readiness probe for a restarted app.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::actor::error::DevServerError;
use crate::logger::Logger;

/// Query parameter marking probe requests, so access logs can dim them.
pub const ALIVE_CHECK_PARAM: &str = "_checking_alive";

pub const DEFAULT_PROBE_ATTEMPTS: u32 = 20;
pub const DEFAULT_PROBE_DELAY_MS: u64 = 100;

/// Polls the app until it answers any HTTP response.
pub struct ReadinessProbe {
    client: reqwest::Client,
    url: Url,
    attempts: u32,
    delay: Duration,
    logger: Logger,
}

impl ReadinessProbe {
    pub fn new(
        url: Url,
        attempts: u32,
        delay: Duration,
        logger: Logger,
    ) -> Result<Self, DevServerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(1))
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            url,
            attempts,
            delay,
            logger,
        })
    }

    /// `http://{host}:{port}/?_checking_alive=1`
    pub fn app_url(host: &str, port: u16) -> Result<Url, DevServerError> {
        let mut url = Url::parse(&format!("http://{host}:{port}/"))?;
        url.query_pairs_mut().append_pair(ALIVE_CHECK_PARAM, "1");
        Ok(url)
    }

    /// Wait until the app responds. `false` if it never did or `stop` fired.
    pub async fn wait_until_live(&self, stop: &CancellationToken) -> bool {
        for attempt in 0..self.attempts {
            tokio::select! {
                biased;
                _ = stop.cancelled() => return false,
                _ = tokio::time::sleep(self.delay) => {}
            }
            match self.client.get(self.url.clone()).send().await {
                Ok(response) => {
                    crate::debug!(self.logger; "try {} | app running ({}), reloading...",
                        attempt, response.status());
                    return true;
                }
                Err(e) => {
                    crate::debug!(self.logger; "try {} | {} app not running", attempt, e);
                }
            }
        }
        crate::debug!(self.logger; "app not running after {} attempts, not reloading", self.attempts);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Level;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn probe(port: u16, attempts: u32) -> (ReadinessProbe, crate::logger::LogCapture) {
        let (logger, capture) = Logger::capture("app");
        let url = ReadinessProbe::app_url("127.0.0.1", port).unwrap();
        (
            ReadinessProbe::new(url, attempts, Duration::from_millis(10), logger).unwrap(),
            capture,
        )
    }

    #[test]
    fn test_app_url_has_alive_param() {
        let url = ReadinessProbe::app_url("localhost", 8000).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/?_checking_alive=1");
    }

    #[tokio::test]
    async fn test_gives_up_when_nothing_listens() {
        let (probe, capture) = probe(free_port().await, 3);
        assert!(!probe.wait_until_live(&CancellationToken::new()).await);
        assert!(capture.contains(Level::Debug, "after 3 attempts"));
    }

    #[tokio::test]
    async fn test_any_response_counts_as_live() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                    .await;
            }
        });

        let (probe, _) = probe(port, 5);
        assert!(probe.wait_until_live(&CancellationToken::new()).await);
    }

    #[tokio::test]
    async fn test_cancel_stops_probing() {
        let (probe, _) = probe(free_port().await, 1000);
        let stop = CancellationToken::new();
        stop.cancel();
        assert!(!probe.wait_until_live(&stop).await);
    }
}
