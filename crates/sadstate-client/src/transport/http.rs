//! Blocking HTTP transport on top of `ureq`.

use super::{Method, RawResponse, Request, Transport, TransportError, TransportErrorKind};
use std::time::Duration;

/// Production [`Transport`] backed by a shared `ureq::Agent`.
///
/// Non-2xx statuses are returned as normal responses so the caller can
/// classify them; only failures where no response arrived become errors.
pub struct HttpTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpTransport {
    /// Creates a transport with a global per-request timeout.
    #[must_use]
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            user_agent: user_agent.into(),
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let result = match request.method {
            Method::Get => {
                let mut req = self.agent.get(&request.url);
                req = req.header("User-Agent", &self.user_agent);
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.call()
            }
            Method::Delete => {
                let mut req = self.agent.delete(&request.url);
                req = req.header("User-Agent", &self.user_agent);
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.call()
            }
            Method::Post => {
                let mut req = self.agent.post(&request.url);
                req = req.header("User-Agent", &self.user_agent);
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => req.send(body.as_slice()),
                    None => req.send_empty(),
                }
            }
        };

        let mut resp = result.map_err(|e| classify_ureq_error(&e))?;
        let status = resp.status().as_u16();
        let body = resp
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::new(TransportErrorKind::Body, e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}

/// Maps a `ureq` failure onto a [`TransportErrorKind`].
///
/// Typed variants first, then the io error in the source chain, then
/// message heuristics.
pub(crate) fn classify_ureq_error(error: &ureq::Error) -> TransportError {
    let msg = error.to_string();

    match error {
        ureq::Error::Timeout(_) => return TransportError::new(TransportErrorKind::Timeout, msg),
        ureq::Error::HostNotFound => return TransportError::new(TransportErrorKind::Dns, msg),
        ureq::Error::BadUri(_) => return TransportError::new(TransportErrorKind::InvalidUrl, msg),
        ureq::Error::ConnectionFailed => {
            return TransportError::new(TransportErrorKind::ConnectionRefused, msg)
        }
        _ => {}
    }

    let io_err = {
        let mut source: Option<&dyn std::error::Error> = Some(error);
        let mut found = None;
        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<std::io::Error>() {
                found = Some(io);
                break;
            }
            source = err.source();
        }
        found
    };

    if let Some(io) = io_err {
        match io.kind() {
            std::io::ErrorKind::TimedOut => {
                return TransportError::new(TransportErrorKind::Timeout, msg)
            }
            std::io::ErrorKind::ConnectionRefused => {
                return TransportError::new(TransportErrorKind::ConnectionRefused, msg)
            }
            std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
                return TransportError::new(TransportErrorKind::ConnectionReset, msg)
            }
            _ => {}
        }
    }

    let lower = msg.to_lowercase();
    let kind = if lower.contains("timeout") || lower.contains("timed out") {
        TransportErrorKind::Timeout
    } else if lower.contains("dns")
        || lower.contains("resolve")
        || lower.contains("name resolution")
    {
        TransportErrorKind::Dns
    } else if lower.contains("connection refused") {
        TransportErrorKind::ConnectionRefused
    } else if lower.contains("tls") || lower.contains("ssl") || lower.contains("certificate") {
        TransportErrorKind::Tls
    } else {
        TransportErrorKind::Network
    };
    TransportError::new(kind, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_typed_variants() {
        assert_eq!(
            classify_ureq_error(&ureq::Error::HostNotFound).kind,
            TransportErrorKind::Dns
        );
        assert_eq!(
            classify_ureq_error(&ureq::Error::BadUri("::".into())).kind,
            TransportErrorKind::InvalidUrl
        );
        assert_eq!(
            classify_ureq_error(&ureq::Error::ConnectionFailed).kind,
            TransportErrorKind::ConnectionRefused
        );
    }

    #[test]
    fn classify_io_kinds() {
        let refused = ureq::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "nope",
        ));
        assert_eq!(
            classify_ureq_error(&refused).kind,
            TransportErrorKind::ConnectionRefused
        );

        let reset = ureq::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "peer hung up",
        ));
        assert_eq!(
            classify_ureq_error(&reset).kind,
            TransportErrorKind::ConnectionReset
        );
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        // Port 1 on loopback is closed on any sane test host.
        let transport = HttpTransport::new(Duration::from_secs(2), "sadstate-test");
        let err = transport
            .send(&Request::get("http://127.0.0.1:1/project/get?name=x"))
            .expect_err("nothing listens on port 1");
        assert!(
            matches!(
                err.kind,
                TransportErrorKind::ConnectionRefused
                    | TransportErrorKind::Network
                    | TransportErrorKind::Timeout
            ),
            "unexpected kind: {:?}",
            err.kind
        );
    }
}
