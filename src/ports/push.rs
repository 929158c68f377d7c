use crate::types::push::SubscriptionDescriptor;

use std::fmt;
use std::time::Duration;

/// Why a single delivery attempt did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The push service answered with a non-success status.
    Rejected { status: u16, reason: String },
    /// No usable answer: network trouble, bad descriptor, malformed response.
    Transport(String),
    TimedOut,
}

impl DeliveryError {
    /// 404 and 410 mean the endpoint will never accept messages again.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            DeliveryError::Rejected {
                status: 404 | 410,
                ..
            }
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Rejected { status, .. } => Some(*status),
            DeliveryError::Transport(_) | DeliveryError::TimedOut => None,
        }
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Rejected { status, reason } => {
                write!(f, "push service rejected message ({status}): {reason}")
            }
            DeliveryError::Transport(reason) => write!(f, "push transport error: {reason}"),
            DeliveryError::TimedOut => f.write_str("push delivery timed out"),
        }
    }
}

impl std::error::Error for DeliveryError {}

pub trait PushSender: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<(), DeliveryError>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(
        &'a self,
        subscription: &'a SubscriptionDescriptor,
        payload: &'a str,
        ttl: Duration,
    ) -> Self::Fut<'a>;
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> DeliveryError {
        DeliveryError::Rejected {
            status,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn is_permanent__should_only_match_not_found_and_gone() {
        assert!(rejected(404).is_permanent());
        assert!(rejected(410).is_permanent());
        assert!(!rejected(400).is_permanent());
        assert!(!rejected(429).is_permanent());
        assert!(!rejected(500).is_permanent());
        assert!(!DeliveryError::Transport("reset".to_string()).is_permanent());
        assert!(!DeliveryError::TimedOut.is_permanent());
    }
}
