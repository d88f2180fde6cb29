//! Server lifecycle management.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpListener;

use crate::actor::DevServerError;
use crate::logger::Logger;

/// Interface both servers listen on.
pub const LISTEN_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Maximum number of port check attempts.
const PORT_CHECK_ATTEMPTS: u32 = 5;

/// Make sure the app port is free, waiting a little for a previous
/// process to let go of it.
pub async fn check_port_open(port: u16, delay: Duration, logger: &Logger) -> Result<(), DevServerError> {
    let addr = SocketAddr::new(LISTEN_HOST, port);
    for remaining in (1..=PORT_CHECK_ATTEMPTS).rev() {
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                drop(listener);
                return Ok(());
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                crate::warn!(logger; "port {} is already in use, waiting {}...", port, remaining);
                tokio::time::sleep(delay).await;
            }
            Err(source) => {
                return Err(DevServerError::Bind {
                    addr: addr.to_string(),
                    source,
                });
            }
        }
    }
    Err(DevServerError::PortInUse(port))
}

/// Bind the aux server listener.
pub async fn bind_aux(port: u16) -> Result<TcpListener, DevServerError> {
    let addr = SocketAddr::new(LISTEN_HOST, port);
    TcpListener::bind(addr).await.map_err(|source| match source.kind() {
        io::ErrorKind::AddrInUse => DevServerError::PortInUse(port),
        _ => DevServerError::Bind {
            addr: addr.to_string(),
            source,
        },
    })
}
