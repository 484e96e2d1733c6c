// Single-flight asynchronous commands
//
// A command runs at most one invocation at a time. Invoking it again while the
// previous run is pending is ignored. Different commands do not exclude each
// other.

use crate::metrics::Metrics;
use crate::state::{CommandKind, StateChange, StateManager};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Receives the error of a failed command run
pub type ErrorHandler = Arc<dyn Fn(CommandKind, &anyhow::Error) + Send + Sync>;

type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// A user command that executes its work on the tokio runtime.
///
/// State is Idle or Running, held in an `AtomicBool`. [`execute`](Self::execute)
/// moves Idle to Running with a compare-exchange and spawns the work; the
/// returned task owns a [`BusyGuard`] that moves back to Idle when the work
/// finishes, fails, panics or is dropped unpolled.
pub struct AsyncCommand {
    kind: CommandKind,
    busy: Arc<AtomicBool>,
    can_execute: Option<Predicate>,
    on_error: ErrorHandler,
    state: StateManager,
    metrics: Arc<Metrics>,
    runtime: Handle,
}

impl AsyncCommand {
    pub fn new(
        kind: CommandKind,
        state: StateManager,
        metrics: Arc<Metrics>,
        runtime: Handle,
        on_error: ErrorHandler,
    ) -> Self {
        Self {
            kind,
            busy: Arc::new(AtomicBool::new(false)),
            can_execute: None,
            on_error,
            state,
            metrics,
            runtime,
        }
    }

    /// Extra enablement condition checked before every run
    pub fn with_can_execute<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.can_execute = Some(Arc::new(predicate));
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Whether an invocation right now would run
    pub fn can_execute(&self) -> bool {
        !self.is_running() && self.can_execute.as_ref().is_none_or(|predicate| predicate())
    }

    /// Run `operation` unless this command is already running.
    ///
    /// Returns the spawned task, or `None` if the invocation was ignored. Errors
    /// from `operation` go to the error handler and never reach the caller.
    pub fn execute<Fut>(&self, operation: Fut) -> Option<JoinHandle<()>>
    where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.can_execute.as_ref().is_some_and(|predicate| !predicate()) {
            tracing::debug!("{} command is disabled, ignoring invocation", self.kind);
            return None;
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("{} command already running, ignoring invocation", self.kind);
            self.metrics.record_rejected_invocation();
            return None;
        }

        self.state.emit(StateChange::CommandStateChanged {
            command: self.kind,
            running: true,
        });

        let guard = BusyGuard {
            kind: self.kind,
            busy: Arc::clone(&self.busy),
            state: self.state.clone(),
        };
        let kind = self.kind;
        let on_error = Arc::clone(&self.on_error);

        Some(self.runtime.spawn(async move {
            let _guard = guard;
            if let Err(error) = operation.await {
                on_error(kind, &error);
            }
        }))
    }
}

impl std::fmt::Debug for AsyncCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncCommand")
            .field("kind", &self.kind)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Returns the command to Idle when dropped
struct BusyGuard {
    kind: CommandKind,
    busy: Arc<AtomicBool>,
    state: StateManager,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        self.state.emit(StateChange::CommandStateChanged {
            command: self.kind,
            running: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    fn command(kind: CommandKind, errors: Arc<Mutex<Vec<String>>>) -> (AsyncCommand, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let on_error: ErrorHandler = Arc::new(move |_: CommandKind, error: &anyhow::Error| {
            errors.lock().unwrap().push(error.to_string());
        });
        let command = AsyncCommand::new(
            kind,
            StateManager::new(),
            Arc::clone(&metrics),
            Handle::current(),
            on_error,
        );
        (command, metrics)
    }

    #[tokio::test]
    async fn test_reentrant_invocation_is_ignored() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let (command, metrics) = command(CommandKind::Open, errors);
        let runs = Arc::new(AtomicUsize::new(0));
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let runs_first = Arc::clone(&runs);
        let first = command
            .execute(async move {
                runs_first.fetch_add(1, Ordering::SeqCst);
                let _ = release_rx.await;
                Ok(())
            })
            .expect("first invocation should run");

        assert!(command.is_running());
        assert!(!command.can_execute());

        let runs_second = Arc::clone(&runs);
        let second = command.execute(async move {
            runs_second.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(second.is_none());
        assert_eq!(metrics.rejected_invocations.load(Ordering::Relaxed), 1);

        release_tx.send(()).unwrap();
        first.await.unwrap();

        assert!(!command.is_running());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_routed_to_handler_and_flag_reset() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let (command, _metrics) = command(CommandKind::Save, Arc::clone(&errors));

        let handle = command
            .execute(async { Err(anyhow::anyhow!("disk full")) })
            .unwrap();
        handle.await.unwrap();

        assert!(!command.is_running());
        assert_eq!(*errors.lock().unwrap(), vec!["disk full".to_string()]);

        // Runs again after a failure
        assert!(command.execute(async { Ok(()) }).is_some());
    }

    fn command_should_panic() -> bool {
        true
    }

    #[tokio::test]
    async fn test_panic_resets_flag() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let (command, _metrics) = command(CommandKind::SaveAs, errors);

        let handle = command
            .execute(async {
                if command_should_panic() {
                    panic!("boom");
                }
                Ok(())
            })
            .unwrap();

        assert!(handle.await.is_err());
        assert!(!command.is_running());
    }

    #[tokio::test]
    async fn test_predicate_disables_command() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let enabled = Arc::new(AtomicBool::new(false));
        let (command, metrics) = command(CommandKind::Save, errors);

        let flag = Arc::clone(&enabled);
        let command = command.with_can_execute(move || flag.load(Ordering::SeqCst));

        assert!(!command.can_execute());
        assert!(command.execute(async { Ok(()) }).is_none());
        assert_eq!(metrics.rejected_invocations.load(Ordering::Relaxed), 0);

        enabled.store(true, Ordering::SeqCst);
        assert!(command.can_execute());
        command.execute(async { Ok(()) }).unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn test_state_changes_emitted() {
        let state = StateManager::new();
        let mut rx = state.subscribe();
        let on_error: ErrorHandler = Arc::new(|_: CommandKind, _: &anyhow::Error| {});
        let command = AsyncCommand::new(
            CommandKind::Open,
            state,
            Arc::new(Metrics::new()),
            Handle::current(),
            on_error,
        );

        command.execute(async { Ok(()) }).unwrap().await.unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            StateChange::CommandStateChanged {
                command: CommandKind::Open,
                running: true
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StateChange::CommandStateChanged {
                command: CommandKind::Open,
                running: false
            }
        );
    }
}
