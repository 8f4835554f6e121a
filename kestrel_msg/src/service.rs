//! Sequenced request/response.
//!
//! A [`Service`] owns one request slot. Clients issue requests through
//! [`ServiceClient::call`]; each client numbers its requests with its own
//! [`SequenceCounter`]. Only one request is outstanding per channel at a time;
//! a second call before the first resolves fails with `Busy`.
//!
//! Handlers bind in one of two modes:
//!
//! - [`Service::bind`]: the handler runs inline in the caller's context. The
//!   handler is taken out of the slot while it runs, so no lock is held
//!   across it. A handler that overruns the caller's timeout still completes,
//!   but its response is discarded and the caller gets `Timeout`.
//! - [`Service::attach_server`]: a [`ServiceServer`] in another execution
//!   context receives a copy of the request and responds by sequence id. The
//!   caller blocks on a wait condition. A response whose id does not match
//!   the outstanding request faults the channel until [`Service::reset`].
//!   A response arriving after the caller timed out is discarded and the
//!   channel returns to `Idle`.
//!
//! A handler that never returns, or a server that never responds, hangs its
//! channel; `reset` recovers the server case.
//!
//! Sequence ids are per client, so two clients can hold the same id. The
//! slot therefore also stamps every request with a channel-wide ticket, and a
//! waiting caller only ever takes the outcome carrying its own ticket. A
//! caller whose request is dropped by `reset` or by a departing server is
//! woken and told so (`Cancelled` / `Unbound`) instead of waiting out its
//! timeout.

use crate::error::{ServiceError, ServiceResult};
use crate::sample::{ServiceRequest, ServiceResponse};
use crate::sequence::SequenceCounter;
use kestrel_sync::{Backend, Deadline, Lock, WaitCondition};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

type Handler<Req, Resp> = Box<dyn FnMut(&ServiceRequest<'_, Req>) -> Resp + Send>;

/// Channel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    /// Request posted, waiting for a server to take it.
    RequestIssued,
    HandlerRunning,
    ResponseReady,
    /// A correlation mismatch was detected; calls fail until `reset`.
    Faulted,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceState::Idle => "idle",
            ServiceState::RequestIssued => "request_issued",
            ServiceState::HandlerRunning => "handler_running",
            ServiceState::ResponseReady => "response_ready",
            ServiceState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// What happened to a server's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the waiting caller.
    Delivered,
    /// The caller had already timed out.
    Discarded,
}

enum Binding<Req, Resp> {
    Unbound,
    /// `None` while the handler is running.
    Inline(Option<Handler<Req, Resp>>),
    Server,
}

/// A request copied into the slot for a server.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest<Req> {
    pub sequence_id: u32,
    pub timestamp: u32,
    pub data: Req,
}

impl<Req> PendingRequest<Req> {
    /// Borrowed view handed to handler code.
    pub fn request(&self) -> ServiceRequest<'_, Req> {
        ServiceRequest {
            sequence_id: self.sequence_id,
            timestamp: self.timestamp,
            data: &self.data,
        }
    }
}

/// The request a caller is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    sequence_id: u32,
    /// Channel-wide, never reused.
    ticket: u64,
}

/// Mismatch that faulted the channel.
#[derive(Debug, Clone, Copy)]
struct Fault {
    ticket: u64,
    expected: u32,
    received: u32,
}

struct Slot<Req, Resp> {
    state: ServiceState,
    binding: Binding<Req, Resp>,
    next_ticket: u64,
    outstanding: Option<Outstanding>,
    request: Option<PendingRequest<Req>>,
    response: Option<ServiceResponse<Resp>>,
    /// Caller gave up; discard the response when it comes.
    abandoned: bool,
    fault: Option<Fault>,
}

impl<Req, Resp> Slot<Req, Resp> {
    fn issue(&mut self, sequence_id: u32) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.outstanding = Some(Outstanding {
            sequence_id,
            ticket,
        });
        self.abandoned = false;
        ticket
    }

    fn is_waiting_on(&self, ticket: u64) -> bool {
        self.outstanding.is_some_and(|o| o.ticket == ticket)
    }

    fn clear_request(&mut self) {
        self.outstanding = None;
        self.request = None;
        self.response = None;
        self.abandoned = false;
    }

    /// Drop a request a departing server will never answer. Returns whether
    /// a caller may be waiting on it.
    fn detach_server(&mut self) -> bool {
        let dropped = matches!(
            self.state,
            ServiceState::RequestIssued | ServiceState::HandlerRunning
        );
        if dropped {
            self.clear_request();
            self.state = ServiceState::Idle;
        }
        self.binding = Binding::Unbound;
        dropped
    }
}

struct ServiceInner<Req: Send + 'static, Resp: Send + 'static, B: Backend> {
    name: &'static str,
    slot: B::Lock<Slot<Req, Resp>>,
    request_ready: B::Signal,
    response_ready: B::Signal,
}

/// A request/response channel.
///
/// Cloning yields another handle to the same channel.
pub struct Service<Req: Send + 'static, Resp: Send + 'static, B: Backend> {
    inner: Arc<ServiceInner<Req, Resp, B>>,
}

impl<Req: Send + 'static, Resp: Send + 'static, B: Backend> Clone for Service<Req, Resp, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Req, Resp, B> Service<Req, Resp, B>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
    B: Backend,
{
    pub fn new(name: &'static str) -> Self {
        debug!("Created service '{}' ({} backend)", name, B::NAME);
        Self {
            inner: Arc::new(ServiceInner {
                name,
                slot: Lock::new(Slot {
                    state: ServiceState::Idle,
                    binding: Binding::Unbound,
                    next_ticket: 0,
                    outstanding: None,
                    request: None,
                    response: None,
                    abandoned: false,
                    fault: None,
                }),
                request_ready: B::Signal::default(),
                response_ready: B::Signal::default(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// A new client with its own sequence numbering.
    pub fn client(&self) -> ServiceClient<Req, Resp, B> {
        ServiceClient {
            inner: Arc::clone(&self.inner),
            sequence: SequenceCounter::new(),
        }
    }

    /// Bind an inline handler.
    ///
    /// # Errors
    ///
    /// `ServiceError::AlreadyBound` if a handler or server is attached.
    pub fn bind(
        &self,
        handler: impl FnMut(&ServiceRequest<'_, Req>) -> Resp + Send + 'static,
    ) -> ServiceResult<()> {
        self.inner.slot.lock(|slot| match slot.binding {
            Binding::Unbound => {
                slot.binding = Binding::Inline(Some(Box::new(handler)));
                Ok(())
            }
            _ => Err(ServiceError::AlreadyBound),
        })?;
        info!("Bound inline handler to '{}'", self.inner.name);
        Ok(())
    }

    /// Attach a server that handles requests from another context.
    ///
    /// # Errors
    ///
    /// `ServiceError::AlreadyBound` if a handler or server is attached.
    pub fn attach_server(&self) -> ServiceResult<ServiceServer<Req, Resp, B>> {
        self.inner.slot.lock(|slot| match slot.binding {
            Binding::Unbound => {
                slot.binding = Binding::Server;
                Ok(())
            }
            _ => Err(ServiceError::AlreadyBound),
        })?;
        info!("Attached server to '{}'", self.inner.name);
        Ok(ServiceServer {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Detach the handler or server. Idempotent.
    pub fn unbind(&self) {
        let dropped = self.inner.slot.lock(|slot| {
            let dropped = matches!(slot.binding, Binding::Server) && slot.detach_server();
            slot.binding = Binding::Unbound;
            dropped
        });
        // Wake a server blocked in `receive` so it sees the detach.
        self.inner.request_ready.signal();
        if dropped {
            self.inner.response_ready.signal();
        }
        debug!("Unbound '{}'", self.inner.name);
    }

    pub fn is_bound(&self) -> bool {
        self.inner
            .slot
            .lock(|slot| !matches!(slot.binding, Binding::Unbound))
    }

    pub fn state(&self) -> ServiceState {
        self.inner.slot.lock(|slot| slot.state)
    }

    /// Drop any outstanding request and clear a fault.
    ///
    /// A caller still waiting on the dropped request returns `Cancelled`.
    pub fn reset(&self) {
        let dropped = self.inner.slot.lock(|slot| {
            let dropped = slot.outstanding.is_some() || slot.state == ServiceState::Faulted;
            slot.clear_request();
            slot.fault = None;
            slot.state = ServiceState::Idle;
            dropped
        });
        self.inner.request_ready.clear();
        if dropped {
            // Release a caller still blocked on the dropped request.
            self.inner.response_ready.signal();
        } else {
            self.inner.response_ready.clear();
        }
        info!("Reset service '{}'", self.inner.name);
    }
}

enum Issued<Req, Resp> {
    Inline(Handler<Req, Resp>),
    Server,
}

/// Issues requests on a service.
pub struct ServiceClient<Req: Send + 'static, Resp: Send + 'static, B: Backend> {
    inner: Arc<ServiceInner<Req, Resp, B>>,
    sequence: SequenceCounter,
}

impl<Req, Resp, B> ServiceClient<Req, Resp, B>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
    B: Backend,
{
    /// Issue `request` and wait up to `timeout` for the response.
    ///
    /// # Errors
    ///
    /// - `Busy` if another request is outstanding
    /// - `Unbound` if nothing handles the service
    /// - `Faulted` if an earlier mismatch faulted the channel
    /// - `Timeout` if no response arrived in time
    /// - `CorrelationMismatch` if the server answered a different request
    /// - `Cancelled` if `reset` dropped the request while waiting
    /// - `Unbound` also if the server detached while the request was pending
    pub fn call(&mut self, request: &Req, timeout: Duration) -> ServiceResult<ServiceResponse<Resp>> {
        let deadline = Deadline::new(B::now(), timeout);
        let sequence_id = self.sequence.peek_next();
        let timestamp = B::now().raw();

        let (issued, ticket) = self.inner.slot.lock(|slot| {
            match slot.state {
                ServiceState::Idle => {}
                ServiceState::Faulted => return Err(ServiceError::Faulted),
                _ => return Err(ServiceError::Busy),
            }
            let issued = match &mut slot.binding {
                Binding::Unbound => return Err(ServiceError::Unbound),
                Binding::Inline(handler) => {
                    let handler = handler.take().ok_or(ServiceError::Busy)?;
                    slot.state = ServiceState::HandlerRunning;
                    Issued::Inline(handler)
                }
                Binding::Server => {
                    slot.request = Some(PendingRequest {
                        sequence_id,
                        timestamp,
                        data: request.clone(),
                    });
                    slot.state = ServiceState::RequestIssued;
                    Issued::Server
                }
            };
            let ticket = slot.issue(sequence_id);
            Ok((issued, ticket))
        })?;
        self.sequence.advance();
        trace!("'{}' issued request #{}", self.inner.name, sequence_id);

        match issued {
            Issued::Inline(handler) => {
                self.run_inline(handler, request, sequence_id, timestamp, deadline)
            }
            Issued::Server => {
                self.inner.request_ready.signal();
                self.wait_response(sequence_id, ticket, deadline)
            }
        }
    }

    fn run_inline(
        &self,
        mut handler: Handler<Req, Resp>,
        data: &Req,
        sequence_id: u32,
        timestamp: u32,
        deadline: Deadline,
    ) -> ServiceResult<ServiceResponse<Resp>> {
        let payload = handler(&ServiceRequest {
            sequence_id,
            timestamp,
            data,
        });
        let finished = B::now();

        self.inner.slot.lock(|slot| {
            // Restore unless the handler was unbound while running.
            if let Binding::Inline(empty @ None) = &mut slot.binding {
                *empty = Some(handler);
            }
            slot.clear_request();
            slot.state = ServiceState::Idle;
        });

        if deadline.overrun(finished) {
            warn!(
                "'{}' handler took {}ms for request #{}; response discarded",
                self.inner.name,
                deadline.elapsed(finished),
                sequence_id
            );
            return Err(ServiceError::Timeout);
        }
        Ok(ServiceResponse {
            sequence_id,
            timestamp: finished.raw(),
            payload,
        })
    }

    fn wait_response(
        &self,
        sequence_id: u32,
        ticket: u64,
        deadline: Deadline,
    ) -> ServiceResult<ServiceResponse<Resp>> {
        loop {
            let remaining = deadline.remaining(B::now());
            let outcome = self.inner.slot.lock(|slot| {
                if let Some(result) = take_result(slot, ticket) {
                    return Some(result);
                }
                if remaining.is_none() && slot.is_waiting_on(ticket) {
                    slot.abandoned = true;
                }
                None
            });
            if let Some(result) = outcome {
                if let Err(e @ (ServiceError::Cancelled | ServiceError::Unbound)) = &result {
                    debug!("'{}' request #{} dropped: {}", self.inner.name, sequence_id, e);
                }
                return result;
            }
            match remaining {
                Some(remaining) => {
                    self.inner.response_ready.wait(remaining);
                }
                None => {
                    debug!("'{}' request #{} timed out", self.inner.name, sequence_id);
                    return Err(ServiceError::Timeout);
                }
            }
        }
    }

    /// Sequence id of the last issued request (0 if none).
    pub fn last_sequence(&self) -> u32 {
        self.sequence.current()
    }

    pub fn service(&self) -> &'static str {
        self.inner.name
    }
}

/// Collect the outcome of request `ticket` if one is ready.
///
/// Only the caller holding `ticket` ever consumes its response.
fn take_result<Req, Resp>(
    slot: &mut Slot<Req, Resp>,
    ticket: u64,
) -> Option<ServiceResult<ServiceResponse<Resp>>> {
    if let Some(fault) = slot.fault.filter(|f| f.ticket == ticket) {
        return Some(Err(ServiceError::CorrelationMismatch {
            expected: fault.expected,
            received: fault.received,
        }));
    }
    if !slot.is_waiting_on(ticket) {
        // Dropped by reset or by a departing server.
        return Some(Err(match slot.binding {
            Binding::Unbound => ServiceError::Unbound,
            _ => ServiceError::Cancelled,
        }));
    }
    match slot.state {
        ServiceState::ResponseReady => {
            let response = slot.response.take();
            slot.clear_request();
            slot.state = ServiceState::Idle;
            response.map(Ok)
        }
        _ => None,
    }
}

/// Handles requests for a service from another execution context.
///
/// Dropping the server unbinds the service.
pub struct ServiceServer<Req: Send + 'static, Resp: Send + 'static, B: Backend> {
    inner: Arc<ServiceInner<Req, Resp, B>>,
}

impl<Req, Resp, B> ServiceServer<Req, Resp, B>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    B: Backend,
{
    fn is_attached(slot: &Slot<Req, Resp>) -> bool {
        matches!(slot.binding, Binding::Server)
    }

    /// Wait up to `timeout` for a request.
    ///
    /// # Errors
    ///
    /// - `Timeout` if no request arrived
    /// - `Unbound` if the service was unbound meanwhile
    pub fn receive(&self, timeout: Duration) -> ServiceResult<PendingRequest<Req>> {
        let deadline = Deadline::new(B::now(), timeout);
        loop {
            let taken = self.inner.slot.lock(|slot| {
                if !Self::is_attached(slot) {
                    return Err(ServiceError::Unbound);
                }
                if slot.state != ServiceState::RequestIssued {
                    return Ok(None);
                }
                let request = slot.request.take();
                if request.is_some() {
                    slot.state = ServiceState::HandlerRunning;
                }
                Ok(request)
            })?;
            if let Some(request) = taken {
                trace!("'{}' server took request #{}", self.inner.name, request.sequence_id);
                return Ok(request);
            }
            let Some(remaining) = deadline.remaining(B::now()) else {
                return Err(ServiceError::Timeout);
            };
            self.inner.request_ready.wait(remaining);
        }
    }

    /// Post the response for request `sequence_id`.
    ///
    /// # Errors
    ///
    /// - `Unbound` if this server was detached
    /// - `Faulted` if the channel is already faulted
    /// - `CorrelationMismatch` if `sequence_id` is not the outstanding
    ///   request; the channel faults
    ///
    /// A response whose caller gave up, or whose request was dropped by
    /// `reset`, returns `Ok(Delivery::Discarded)`.
    pub fn respond(&self, sequence_id: u32, payload: Resp) -> ServiceResult<Delivery> {
        let timestamp = B::now().raw();
        let delivery = self.inner.slot.lock(|slot| {
            if !Self::is_attached(slot) {
                return Err(ServiceError::Unbound);
            }
            if slot.state == ServiceState::Faulted {
                return Err(ServiceError::Faulted);
            }
            if slot.state == ServiceState::RequestIssued || slot.outstanding.is_none() {
                // Answers a request dropped by `reset`; the current one, if
                // any, has not been received yet.
                return Ok(Delivery::Discarded);
            }
            match slot.outstanding {
                Some(o) if o.sequence_id == sequence_id => {}
                outstanding => {
                    let expected = outstanding.map_or(0, |o| o.sequence_id);
                    slot.fault = outstanding.map(|o| Fault {
                        ticket: o.ticket,
                        expected,
                        received: sequence_id,
                    });
                    slot.clear_request();
                    slot.state = ServiceState::Faulted;
                    return Err(ServiceError::CorrelationMismatch {
                        expected,
                        received: sequence_id,
                    });
                }
            }
            if slot.abandoned {
                slot.clear_request();
                slot.state = ServiceState::Idle;
                return Ok(Delivery::Discarded);
            }
            slot.response = Some(ServiceResponse {
                sequence_id,
                timestamp,
                payload,
            });
            slot.state = ServiceState::ResponseReady;
            Ok(Delivery::Delivered)
        });

        match &delivery {
            Ok(Delivery::Delivered) => self.inner.response_ready.signal(),
            Ok(Delivery::Discarded) => debug!(
                "'{}' discarded stale response #{}",
                self.inner.name, sequence_id
            ),
            Err(ServiceError::CorrelationMismatch { expected, received }) => {
                warn!(
                    "'{}' faulted: response #{} for outstanding request #{}",
                    self.inner.name, received, expected
                );
                self.inner.response_ready.signal();
            }
            Err(_) => {}
        }
        delivery
    }

    /// Receive one request, run `handler` on it and respond.
    pub fn handle_next(
        &self,
        timeout: Duration,
        handler: impl FnOnce(&ServiceRequest<'_, Req>) -> Resp,
    ) -> ServiceResult<Delivery> {
        let pending = self.receive(timeout)?;
        let payload = handler(&pending.request());
        self.respond(pending.sequence_id, payload)
    }

    pub fn service(&self) -> &'static str {
        self.inner.name
    }
}

impl<Req: Send + 'static, Resp: Send + 'static, B: Backend> Drop for ServiceServer<Req, Resp, B> {
    fn drop(&mut self) {
        let detached = self.inner.slot.lock(|slot| {
            if Self::is_attached(slot) {
                Some(slot.detach_server())
            } else {
                None
            }
        });
        if let Some(dropped) = detached {
            if dropped {
                self.inner.response_ready.signal();
            }
            debug!("Server for '{}' detached", self.inner.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_sync::HostBackend;
    use std::thread;

    type Doubler = Service<u32, u32, HostBackend>;

    #[test]
    fn test_inline_call_correlates() {
        let service = Doubler::new("double");
        service.bind(|req| req.data * 2).unwrap();
        let mut client = service.client();

        let first = client.call(&21, Duration::from_millis(50)).unwrap();
        assert_eq!((first.sequence_id, first.payload), (1, 42));
        let second = client.call(&5, Duration::from_millis(50)).unwrap();
        assert_eq!((second.sequence_id, second.payload), (2, 10));
        assert_eq!(service.state(), ServiceState::Idle);
    }

    #[test]
    fn test_unbound_and_already_bound() {
        let service = Doubler::new("lonely");
        let mut client = service.client();
        assert_eq!(
            client.call(&1, Duration::from_millis(5)),
            Err(ServiceError::Unbound)
        );
        assert_eq!(client.last_sequence(), 0);

        service.bind(|req| *req.data).unwrap();
        assert!(service.is_bound());
        assert_eq!(service.bind(|_| 0), Err(ServiceError::AlreadyBound));
        assert!(matches!(
            service.attach_server(),
            Err(ServiceError::AlreadyBound)
        ));

        service.unbind();
        assert!(!service.is_bound());
        assert!(service.attach_server().is_ok());
    }

    #[test]
    fn test_reentrant_call_is_busy() {
        let service = Doubler::new("reentrant");
        let inner = service.clone();
        service
            .bind(move |req| {
                let mut nested = inner.client();
                match nested.call(req.data, Duration::from_millis(5)) {
                    Err(ServiceError::Busy) => 1,
                    _ => 0,
                }
            })
            .unwrap();
        let mut client = service.client();
        assert_eq!(client.call(&3, Duration::from_millis(50)).unwrap().payload, 1);
    }

    #[test]
    fn test_slow_inline_handler_times_out() {
        let service = Doubler::new("slow");
        service
            .bind(|req| {
                thread::sleep(Duration::from_millis(30));
                *req.data
            })
            .unwrap();
        let mut client = service.client();
        assert_eq!(
            client.call(&1, Duration::from_millis(5)),
            Err(ServiceError::Timeout)
        );
        assert_eq!(service.state(), ServiceState::Idle);
        assert!(client.call(&1, Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_server_round_trip() {
        let service = Doubler::new("remote");
        let server = service.attach_server().unwrap();
        let worker = thread::spawn(move || server.handle_next(Duration::from_secs(5), |req| req.data + 1));

        let mut client = service.client();
        let response = client.call(&9, Duration::from_secs(5)).unwrap();
        assert_eq!((response.sequence_id, response.payload), (1, 10));
        assert_eq!(worker.join().unwrap(), Ok(Delivery::Delivered));
        assert!(!service.is_bound());
    }

    #[test]
    fn test_server_receive_times_out() {
        let service = Doubler::new("quiet");
        let server = service.attach_server().unwrap();
        assert_eq!(
            server.receive(Duration::from_millis(5)),
            Err(ServiceError::Timeout)
        );
        service.unbind();
        assert_eq!(server.receive(Duration::ZERO), Err(ServiceError::Unbound));
    }
}
