//! Request/response bridge between the script thread and the host.
//!
//! ```text
//! script thread                          turn loop (async)
//! ─────────────                          ─────────────────
//! stage.image.show{...}
//!   └─ HostBridge::call ──HostRequest──► requests.recv()
//!        (blocks)                          └─ Dispatcher::dispatch
//!   ◄───────────── oneshot reply ───────── HostRequest::respond
//! ```
//!
//! The script is suspended for the whole exchange, so calls from one script
//! never overlap. The channel is bounded; a script that outruns the host
//! blocks on send as well.

use stagehand_runtime::operation::OperationCall;
use stagehand_runtime::{DispatchError, DispatchOutput};
use tokio::sync::{mpsc, oneshot};

/// Default number of in-flight requests.
pub const DEFAULT_CAPACITY: usize = 16;

type Reply = Result<DispatchOutput, DispatchError>;

/// One script call waiting for the host.
#[derive(Debug)]
pub struct HostRequest {
    pub call: OperationCall,
    reply: oneshot::Sender<Reply>,
}

impl HostRequest {
    /// Resumes the script with `result`.
    pub fn respond(self, result: Reply) {
        if self.reply.send(result).is_err() {
            tracing::debug!("script went away before its reply arrived");
        }
    }
}

/// Script-side end of the bridge.
#[derive(Debug, Clone)]
pub struct HostBridge {
    tx: mpsc::Sender<HostRequest>,
}

impl HostBridge {
    /// Creates a bridge and the receiver the host serves.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<HostRequest>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Sends `call` and blocks until the host answers.
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Whatever the dispatcher returned, or
    /// [`DispatchError::HostOperation`] when the host side is gone.
    pub fn call(&self, call: OperationCall) -> Result<DispatchOutput, DispatchError> {
        let name = call.name();
        let (reply, response) = oneshot::channel();
        self.tx
            .blocking_send(HostRequest { call, reply })
            .map_err(|_| DispatchError::host(&name, "host disconnected"))?;
        response
            .blocking_recv()
            .map_err(|_| DispatchError::host(&name, "host dropped the call"))?
    }
}
