use crate::config::RpcConfig;
use crate::request::RpcRequest;
use crate::response::RpcResponse;

/// Processing phases observers may watch.
///
/// The numeric codes identify the phase on the wire-facing side of an
/// observer (log lines, external notifications) and are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Init,
    BeforeRequest,
    AfterRequest,
    BeforeResponse,
    AfterResponse,
    Exception,
}

impl LifecyclePhase {
    pub fn code(&self) -> u32 {
        match self {
            LifecyclePhase::Init => 10,
            LifecyclePhase::BeforeRequest => 20,
            LifecyclePhase::AfterRequest => 30,
            LifecyclePhase::BeforeResponse => 40,
            LifecyclePhase::AfterResponse => 50,
            LifecyclePhase::Exception => 60,
        }
    }
}

/// Snapshot handed to observers: the phase plus whatever is in flight.
///
/// Borrowed views only; observers cannot mutate the call they are watching.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleEvent<'a> {
    pub phase: LifecyclePhase,
    pub config: Option<&'a RpcConfig>,
    pub request: Option<&'a RpcRequest>,
    pub response: Option<&'a RpcResponse>,
}

impl<'a> LifecycleEvent<'a> {
    pub fn new(phase: LifecyclePhase) -> Self {
        Self {
            phase,
            config: None,
            request: None,
            response: None,
        }
    }

    pub fn with_config(mut self, config: &'a RpcConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_request(mut self, request: &'a RpcRequest) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_response(mut self, response: &'a RpcResponse) -> Self {
        self.response = Some(response);
        self
    }

    pub fn code(&self) -> u32 {
        self.phase.code()
    }
}

/// Hook point collaborators implement to observe request processing.
///
/// Fired synchronously by the transport; implementations should return
/// quickly and must tolerate concurrent calls.
pub trait LifecycleObserver: Send + Sync {
    fn observe(&self, event: &LifecycleEvent<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_codes() {
        assert_eq!(LifecyclePhase::Init.code(), 10);
        assert_eq!(LifecyclePhase::BeforeRequest.code(), 20);
        assert_eq!(LifecyclePhase::AfterRequest.code(), 30);
        assert_eq!(LifecyclePhase::BeforeResponse.code(), 40);
        assert_eq!(LifecyclePhase::AfterResponse.code(), 50);
        assert_eq!(LifecyclePhase::Exception.code(), 60);
    }

    #[test]
    fn test_event_carries_payload() {
        let config = RpcConfig::default();
        let event = LifecycleEvent::new(LifecyclePhase::Init).with_config(&config);
        assert_eq!(event.code(), 10);
        assert!(event.config.is_some());
        assert!(event.request.is_none());
    }
}
