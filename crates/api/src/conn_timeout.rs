//! Connection Read Deadlines
//!
//! Applies the read and idle timeouts below TLS, on the accepted TCP stream.
//! A connection moves through three phases:
//!
//! - `Reading`: from accept (TLS handshake included) or from the first byte
//!   of a new request until the request is dispatched. Bounded by the read
//!   timeout.
//! - `Handling`: the request has reached the service. No read deadline; the
//!   router's write timeout bounds this phase.
//! - `Idle`: the response has been flushed and the connection waits for the
//!   next request. Bounded by the idle timeout.
//!
//! A deadline only runs while a read is pending. When it expires the read
//! fails with `TimedOut` and hyper drops the connection.

use axum_server::accept::Accept;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::{Instant, Sleep};
use tower::Service;

/// Connection phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reading = 0,
    Handling = 1,
    Idle = 2,
}

/// Phase shared between a connection's stream and its service
#[derive(Debug, Clone)]
pub struct ConnPhase(Arc<AtomicU8>);

impl ConnPhase {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(Phase::Reading as u8)))
    }

    pub fn get(&self) -> Phase {
        match self.0.load(Ordering::Acquire) {
            0 => Phase::Reading,
            1 => Phase::Handling,
            _ => Phase::Idle,
        }
    }

    pub fn set(&self, phase: Phase) {
        self.0.store(phase as u8, Ordering::Release);
    }
}

impl Default for ConnPhase {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and idle limits for a connection
#[derive(Debug, Clone, Copy)]
pub struct ConnTimeouts {
    pub read: Duration,
    pub idle: Duration,
}

/// Stream wrapper enforcing the per-phase read deadline
pub struct DeadlineStream<S> {
    inner: S,
    timeouts: ConnTimeouts,
    phase: ConnPhase,
    armed: Option<Phase>,
    deadline: Pin<Box<Sleep>>,
}

impl<S> DeadlineStream<S> {
    pub fn new(inner: S, timeouts: ConnTimeouts, phase: ConnPhase) -> Self {
        Self {
            inner,
            timeouts,
            phase,
            armed: None,
            deadline: Box::pin(tokio::time::sleep(timeouts.read)),
        }
    }

    fn poll_deadline(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let phase = self.phase.get();
        let limit = match phase {
            Phase::Reading => self.timeouts.read,
            Phase::Idle => self.timeouts.idle,
            Phase::Handling => {
                self.armed = None;
                return Poll::Pending;
            }
        };

        if self.armed != Some(phase) {
            self.deadline.as_mut().reset(Instant::now() + limit);
            self.armed = Some(phase);
        }

        match self.deadline.as_mut().poll(cx) {
            Poll::Ready(()) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connection {phase:?} timeout after {limit:?}"),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for DeadlineStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let before = buf.filled().len();

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                if result.is_ok() && buf.filled().len() > before && this.phase.get() == Phase::Idle {
                    this.phase.set(Phase::Reading);
                }
                Poll::Ready(result)
            }
            Poll::Pending => this.poll_deadline(cx),
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for DeadlineStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let result = Pin::new(&mut this.inner).poll_flush(cx);
        if matches!(result, Poll::Ready(Ok(()))) && this.phase.get() == Phase::Handling {
            this.phase.set(Phase::Idle);
        }
        result
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// Service wrapper that marks the connection as handling a request
#[derive(Clone)]
pub struct PhaseService<S> {
    inner: S,
    phase: ConnPhase,
}

impl<S> PhaseService<S> {
    pub fn new(inner: S, phase: ConnPhase) -> Self {
        Self { inner, phase }
    }
}

impl<S, R> Service<R> for PhaseService<S>
where
    S: Service<R>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: R) -> Self::Future {
        self.phase.set(Phase::Handling);
        self.inner.call(req)
    }
}

/// Acceptor wrapping every TCP connection in a [`DeadlineStream`]
#[derive(Debug, Clone, Copy)]
pub struct DeadlineAcceptor {
    timeouts: ConnTimeouts,
}

impl DeadlineAcceptor {
    pub fn new(timeouts: ConnTimeouts) -> Self {
        Self { timeouts }
    }
}

impl<S> Accept<TcpStream, S> for DeadlineAcceptor {
    type Stream = DeadlineStream<TcpStream>;
    type Service = PhaseService<S>;
    type Future = std::future::Ready<io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: TcpStream, service: S) -> Self::Future {
        let phase = ConnPhase::new();
        std::future::ready(Ok((
            DeadlineStream::new(stream, self.timeouts, phase.clone()),
            PhaseService::new(service, phase),
        )))
    }
}
