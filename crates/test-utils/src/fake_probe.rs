use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use buildgraph::vars::CommandProbe;

/// Probe with canned stdout per command; unknown commands "fail".
#[derive(Default)]
pub struct FakeProbe {
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, command: &str, stdout: &str) -> Self {
        self.outputs.insert(command.to_string(), stdout.to_string());
        self
    }

    /// Commands captured so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandProbe for FakeProbe {
    fn capture(&self, command: &str, _cwd: &Path) -> Option<String> {
        self.calls.lock().unwrap().push(command.to_string());
        self.outputs.get(command).cloned()
    }
}
