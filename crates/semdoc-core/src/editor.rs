use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::errors::EditorError;
use crate::state::{State, empty_state};
use crate::step::Step;
use crate::transaction::Transaction;

pub type DispatchListener = Arc<dyn Fn(&State, &[Step]) + Send + Sync>;

/// Owns the current state and the dispatch boundary. Listeners are scoped
/// to this instance, so multiple editors never cross-talk. Dispatching
/// consumes the transaction; state only swaps in when every step applied
/// cleanly, which is what keeps a failed command from corrupting the
/// visible document.
pub struct Editor {
    state: Arc<State>,
    dispatch_listeners: Vec<DispatchListener>,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_state(empty_state())
    }

    pub fn with_state(state: State) -> Self {
        Self {
            state: Arc::new(state),
            dispatch_listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_arc(&self) -> Arc<State> {
        Arc::clone(&self.state)
    }

    pub fn begin_transaction(&self) -> Transaction {
        Transaction::new(Arc::clone(&self.state))
    }

    pub fn add_dispatch_listener(&mut self, listener: DispatchListener) {
        self.dispatch_listeners.push(listener);
    }

    pub fn dispatch(&mut self, tx: Transaction) -> Result<(), EditorError> {
        let (state, steps, _should_focus) = tx.finish()?;
        let state = Arc::new(state);
        self.state = Arc::clone(&state);
        for listener in &self.dispatch_listeners {
            listener(&state, &steps);
        }
        Ok(())
    }

    pub fn can_execute_command(&self, name: &str, args: Option<&Value>) -> bool {
        self.state
            .commands
            .get(name)
            .is_some_and(|command| command.can_execute(&self.state, args))
    }

    pub fn execute_command(&mut self, name: &str, args: Option<Value>) -> Result<(), EditorError> {
        let command = self
            .state
            .commands
            .get(name)
            .ok_or_else(|| EditorError::IllegalArgument(format!("unknown command '{name}'")))?;
        debug!(command = name, "executing command");
        let mut tx = self.begin_transaction();
        command.execute(&mut tx, args)?;
        self.dispatch(tx)
    }

    /// Swap in the previous snapshot from the history chain. Returns
    /// whether there was anything to undo.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        if self.state.previous.is_none() {
            return Ok(false);
        }
        let mut tx = self.begin_transaction();
        tx.restore_snapshot(1);
        self.dispatch(tx)?;
        Ok(true)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
