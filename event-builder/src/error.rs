//! Errors surfaced by the action facade and the schedule editor.

use crate::gateway::GatewayError;
use crate::reducer::{GatewayOperation, RequestId};
use event_builder_runtime::StoreError;
use thiserror::Error;

/// Why an action did not complete
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The backend call failed; local state is unchanged
    #[error("{operation} failed: {source}")]
    Gateway {
        /// The call that failed
        operation: GatewayOperation,
        /// Gateway error
        source: GatewayError,
    },

    /// The store refused the action or the wait for its result failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A terminal event of the wrong kind answered the request
    #[error("Unexpected response to request {request_id}: {action}")]
    UnexpectedResponse {
        /// Correlation id of the request
        request_id: RequestId,
        /// Debug rendering of the action received
        action: String,
    },
}

impl ActionError {
    /// The gateway error, if that is what failed
    #[must_use]
    pub const fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Invalid start/end combination in the date editor
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// End precedes start; saving is blocked
    #[error("End date/time must be after start date/time")]
    EndBeforeStart,
}
