/// Readiness probe: can we open a TCP connection to the RPC endpoint?
use std::time::Duration;
use tokio::net::TcpStream;
use url::Url;

#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl ReadinessProbe {
    pub fn new(host: String, port: u16, timeout: Duration) -> Self {
        Self {
            host,
            port,
            timeout,
        }
    }

    /// Probe the host of `endpoint`, on its explicit port or the scheme's default
    pub fn from_endpoint(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let url = Url::parse(endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid RPC endpoint value: {}", e))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("RPC endpoint has no host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| anyhow::anyhow!("RPC endpoint has no port and no default for its scheme"))?;
        Ok(Self::new(host, port, timeout))
    }

    pub fn target(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    pub async fn check(&self) -> anyhow::Result<()> {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Timed out connecting to {}:{} after {:?}",
                    self.host,
                    self.port,
                    self.timeout
                )
            })?
            .map_err(|e| anyhow::anyhow!("Failed to connect to {}:{}: {}", self.host, self.port, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_from_endpoint_default_ports() {
        let probe =
            ReadinessProbe::from_endpoint("https://mainnet.infura.io/v3/key", Duration::from_secs(1))
                .unwrap();
        assert_eq!(probe.target(), ("mainnet.infura.io", 443));

        let probe =
            ReadinessProbe::from_endpoint("http://node.local", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.target(), ("node.local", 80));
    }

    #[test]
    fn test_from_endpoint_explicit_port() {
        let probe =
            ReadinessProbe::from_endpoint("http://localhost:8545", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.target(), ("localhost", 8545));

        let probe =
            ReadinessProbe::from_endpoint("http://[::1]:8545", Duration::from_secs(1)).unwrap();
        assert_eq!(probe.target(), ("::1", 8545));
    }

    #[test]
    fn test_from_endpoint_invalid() {
        assert!(ReadinessProbe::from_endpoint("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_check_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = ReadinessProbe::new("127.0.0.1".to_string(), port, Duration::from_secs(1));
        assert!(probe.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_check_closed_port() {
        // grab a free port, then release it
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let probe = ReadinessProbe::new("127.0.0.1".to_string(), port, Duration::from_secs(1));
        assert!(probe.check().await.is_err());
    }
}
