//! The connectionless datagram fabric that floor, scheduler, and car actors send
//! `Event`s over. Each component owns its own socket; there is no sharing between
//! tasks. Cancellation is cooperative: `recv_event` uses a read timeout so a
//! blocked receive never starves the caller's `done`-flag check.

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use crate::core::errors::{LiftError, Result};
use crate::wire::event::Event;

/// Maximum payload size on the wire. Receive buffers are sized to this.
pub const MAX_DATAGRAM_BYTES: usize = 100;

/// One component's end of the datagram fabric.
pub struct DatagramTransport {
    socket: UdpSocket,
    /// Name used in error/log context, e.g. `"scheduler"` or `"car-2"`.
    label: &'static str,
}

impl DatagramTransport {
    /// Bind a UDP socket on `addr` with a read timeout of `poll_interval`.
    ///
    /// The timeout is the chosen cooperative-shutdown mechanism:
    /// `recv_event` returns `Ok(None)` on timeout so the caller can re-check
    /// its shutdown flag at the same cadence.
    pub fn bind(addr: impl ToSocketAddrs, poll_interval: Duration, label: &'static str) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| LiftError::SocketBind {
            addr: label.to_string(),
            source,
        })?;
        socket
            .set_read_timeout(Some(poll_interval))
            .map_err(|source| LiftError::SocketBind {
                addr: label.to_string(),
                source,
            })?;
        Ok(Self { socket, label })
    }

    /// Clone the underlying socket so a second task can send on the same
    /// address without a second bind. Used to split a car's ingress into a
    /// receive-only subsystem task and a send-only actor task sharing one
    /// port — two tasks sharing a channel, not a parent/child object graph.
    pub fn try_clone(&self) -> Result<Self> {
        let socket = self.socket.try_clone().map_err(|source| LiftError::SocketBind {
            addr: self.label.to_string(),
            source,
        })?;
        Ok(Self {
            socket,
            label: self.label,
        })
    }

    /// Local address actually bound (useful when binding to port 0 in tests).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(|source| LiftError::SocketBind {
            addr: self.label.to_string(),
            source,
        })
    }

    /// Serialize and send `event` to `target`. Fire-and-forget: a transport error
    /// here is never fatal to the caller's loop, so callers typically log the
    /// `Err` and continue.
    pub fn send_event(&self, event: &Event, target: SocketAddr) -> Result<()> {
        let bytes = event.to_bytes();
        if bytes.len() > MAX_DATAGRAM_BYTES {
            return Err(LiftError::EventTooLarge {
                len: bytes.len(),
                max: MAX_DATAGRAM_BYTES,
            });
        }
        self.socket
            .send_to(&bytes, target)
            .map(|_| ())
            .map_err(|source| LiftError::SendFailure {
                addr: target.to_string(),
                source,
            })
    }

    /// Block for up to the configured poll interval waiting for a datagram.
    ///
    /// Returns `Ok(None)` on timeout (the normal case while idle — callers loop
    /// back to check their shutdown flag), `Ok(Some(event))` on a well-formed
    /// datagram, and `Err` for a real I/O failure or malformed payload.
    pub fn recv_event(&self) -> Result<Option<Event>> {
        let mut buf = [0u8; MAX_DATAGRAM_BYTES];
        match self.socket.recv(&mut buf) {
            Ok(n) => Event::from_bytes(&buf[..n]).map(Some),
            Err(e) if is_timeout(&e) => Ok(None),
            Err(source) => Err(LiftError::RecvFailure {
                component: self.label,
                source,
            }),
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::event::{Fault, HallDirection};
    use std::net::Ipv4Addr;

    fn loopback_transport(label: &'static str) -> DatagramTransport {
        DatagramTransport::bind(
            (Ipv4Addr::LOCALHOST, 0),
            Duration::from_millis(50),
            label,
        )
        .unwrap()
    }

    #[test]
    fn send_then_recv_round_trips() {
        let sender = loopback_transport("sender");
        let receiver = loopback_transport("receiver");
        let target = receiver.local_addr().unwrap();

        let event = Event::hall_call("t", 2, HallDirection::Up, 4, Fault::None);
        sender.send_event(&event, target).unwrap();

        let received = receiver.recv_event().unwrap().expect("datagram should arrive");
        assert_eq!(received, event);
    }

    #[test]
    fn recv_times_out_to_none_when_idle() {
        let receiver = loopback_transport("idle-receiver");
        assert_eq!(receiver.recv_event().unwrap(), None);
    }

    #[test]
    fn oversize_event_is_rejected_before_send() {
        let sender = loopback_transport("sender");
        let mut event = Event::hall_call("t", 2, HallDirection::Up, 4, Fault::None);
        event.time = "x".repeat(200);
        let target = SocketAddr::from((Ipv4Addr::LOCALHOST, 1));
        let err = sender.send_event(&event, target).unwrap_err();
        assert_eq!(err.code(), "LIFT-2003");
    }
}
