use std::net::UdpSocket;

/// A `host:port` string failed to parse.
#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("expected host:port, got {0:?}")]
    MissingColon(String),
    #[error("invalid port in {0:?}")]
    InvalidPort(String),
}

/// Split a `host:port` string into its parts.
///
/// IPv6 hosts are not bracketed anywhere on Felund's wire; addresses are
/// always `host:port` with the rightmost colon taken as the port separator,
/// matching the reference implementation.
pub fn parse_host_port(addr: &str) -> Result<(String, u16), AddrError> {
    let (host, port_str) = addr
        .rsplit_once(':')
        .ok_or_else(|| AddrError::MissingColon(addr.to_string()))?;
    let port: u16 = port_str
        .parse()
        .map_err(|_| AddrError::InvalidPort(addr.to_string()))?;
    Ok((host.to_string(), port))
}

/// Join a host and port back into the canonical wire form.
pub fn canonical_peer_addr(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

/// Best-effort detection of the machine's outbound-facing local IP.
///
/// Opens a UDP socket "connected" to a well-known public address without
/// sending any traffic; the kernel picks the local address the OS would use
/// to route there. Falls back to the loopback address if the host has no
/// route at all (e.g. fully offline).
pub fn detect_local_ip() -> String {
    (|| -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip().to_string())
    })()
    .unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// The address a node should advertise to peers for its listener.
///
/// When `bind` is unset or the wildcard address, falls back to
/// [`detect_local_ip`] since `0.0.0.0` is not a useful value to hand to a
/// remote peer.
pub fn public_addr_hint(bind: &str, port: u16) -> String {
    let host = if bind.is_empty() || bind == "0.0.0.0" {
        detect_local_ip()
    } else {
        bind.to_string()
    };
    canonical_peer_addr(&host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port() {
        assert_eq!(
            parse_host_port("example.com:9999").unwrap(),
            ("example.com".to_string(), 9999)
        );
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(parse_host_port("example.com").is_err());
    }

    #[test]
    fn rejects_bad_port() {
        assert!(parse_host_port("example.com:notaport").is_err());
    }

    #[test]
    fn wildcard_bind_falls_back_to_detected_ip() {
        let hint = public_addr_hint("0.0.0.0", 9999);
        let (_, port) = parse_host_port(&hint).unwrap();
        assert_eq!(port, 9999);
    }
}
