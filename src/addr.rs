use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::lookup_host;

/// Ipv4 endpoint of a remote peer
///
/// The zero address doubles as "unresolved", resolution never fails
/// outright and callers check with is_valid() instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Addr {
    pub ip: u32,
    pub port: u16
}

impl Addr {
    pub fn new(ip: u32, port: u16) -> Self {
        Self { ip, port }
    }

    /// Resolve a hostname, picking the first Ipv4 result
    pub async fn from_name(hostname: &str, port: u16) -> Self {
        match lookup_host((hostname, port)).await {
            Ok(mut addrs) => {
                let v4 = addrs.find_map(|a| match a.ip() {
                    IpAddr::V4(v4) => Some(v4),
                    IpAddr::V6(_) => None
                });
                match v4 {
                    Some(v4) => Self { ip: u32::from(v4), port },
                    None => Self::default()
                }
            },
            Err(_) => Self::default()
        }
    }

    /// Parse a dotted quad, zero address when it is not one
    pub fn from_str_ip(s: &str, port: u16) -> Self {
        match s.parse::<Ipv4Addr>() {
            Ok(v4) => Self { ip: u32::from(v4), port },
            Err(_) => Self::default()
        }
    }

    fn octets(&self) -> [u8; 4] {
        self.ip.to_be_bytes()
    }

    pub fn is_valid(&self) -> bool {
        self.ip != 0
    }

    pub fn loopback_address(&self) -> bool {
        self.octets() == [127, 0, 0, 1]
    }

    pub fn private_address(&self) -> bool {
        let o = self.octets();
        o[0] == 10
            || (o[0] == 172 && (16..=31).contains(&o[1]))
            || (o[0] == 192 && o[1] == 168)
    }

    pub fn global_address(&self) -> bool {
        !self.loopback_address() && !self.private_address()
    }

    pub fn to_display_string(&self, with_port: bool) -> String {
        let o = self.octets();
        if with_port {
            format!("{}.{}.{}.{}:{}", o[0], o[1], o[2], o[3], self.port)
        } else {
            format!("{}.{}.{}.{}", o[0], o[1], o[2], o[3])
        }
    }

    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::from(self.ip), self.port))
    }
}

impl std::fmt::Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_display_string(true))
    }
}

#[cfg(test)]
mod tests {
    use super::Addr;

    #[test]
    fn parse_and_display() {
        let a = Addr::from_str_ip("192.0.2.7", 7144);
        assert!(a.is_valid());
        assert_eq!(a.to_display_string(true), "192.0.2.7:7144");
        assert_eq!(a.to_display_string(false), "192.0.2.7");
        assert_eq!(a.to_string(), "192.0.2.7:7144");

        assert!(!Addr::from_str_ip("not.an.ip", 80).is_valid());
        assert!(!Addr::from_str_ip("", 80).is_valid());
        assert!(!Addr::default().is_valid());
    }

    #[test]
    fn classification() {
        assert!(Addr::from_str_ip("127.0.0.1", 0).loopback_address());
        assert!(!Addr::from_str_ip("127.0.0.2", 0).loopback_address());

        assert!(Addr::from_str_ip("10.0.0.1", 0).private_address());
        assert!(Addr::from_str_ip("172.16.0.1", 0).private_address());
        assert!(Addr::from_str_ip("172.31.255.1", 0).private_address());
        assert!(!Addr::from_str_ip("172.15.0.1", 0).private_address());
        assert!(!Addr::from_str_ip("172.32.0.1", 0).private_address());
        assert!(Addr::from_str_ip("192.168.1.1", 0).private_address());
        assert!(!Addr::from_str_ip("192.169.1.1", 0).private_address());

        assert!(Addr::from_str_ip("8.8.8.8", 0).global_address());
        assert!(!Addr::from_str_ip("10.1.2.3", 0).global_address());
        assert!(!Addr::from_str_ip("127.0.0.1", 0).global_address());
    }

    #[test]
    fn ordering() {
        let mut addrs = [
            Addr::from_str_ip("192.0.2.1", 90),
            Addr::from_str_ip("192.0.2.1", 80),
            Addr::from_str_ip("10.0.0.1", 7144)
        ];
        addrs.sort();
        assert_eq!(addrs[0], Addr::from_str_ip("10.0.0.1", 7144));
        assert_eq!(addrs[1], Addr::from_str_ip("192.0.2.1", 80));
        assert_eq!(addrs[2], Addr::from_str_ip("192.0.2.1", 90));
    }

    #[tokio::test]
    async fn resolve_literal() {
        let a = Addr::from_name("127.0.0.1", 8080).await;
        assert!(a.is_valid());
        assert_eq!(a.to_display_string(true), "127.0.0.1:8080");
    }
}
