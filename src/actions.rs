//! Registry for custom executable actions that can be invoked from the data model's script
//! language as ordinary functions, in addition to the standard SCXML executable content.
//!
//! A host application registers an [Action] under a name before the Fsm is started; the
//! datamodel then exposes a same-named function to scripts (see
//! [crate::ecma_script_datamodel::ECMAScriptDatamodel::add_functions]), which dispatches the
//! call back into the registered [Action] implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::datamodel::{Data, GlobalDataArc};

/// A custom action, callable from the data model.
pub trait Action: Send {
    /// Executes the action with the given (already evaluated) arguments.
    /// Returns the result value to hand back to the script, or an error message.
    fn execute(&mut self, args: &[Data], global: &GlobalDataArc) -> Result<Data, String>;
}

/// Maps action names to their implementation.
/// Wrapped in its own Mutex so actions can be invoked from inside a script callback without
/// re-entering the outer [crate::fsm::GlobalData] lock.
pub struct ActionMap {
    pub actions: Mutex<HashMap<String, Box<dyn Action>>>,
}

impl ActionMap {
    pub fn new() -> ActionMap {
        ActionMap {
            actions: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, name: &str, action: Box<dyn Action>) {
        self.actions.lock().unwrap().insert(name.to_string(), action);
    }

    /// Locks the map of registered actions.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Box<dyn Action>>> {
        self.actions.lock().unwrap()
    }
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap::new()
    }
}
