//! Fault-injecting host for tests.
//!
//! Records every capability call in order and fails the operations it was
//! told to fail. Clones share state, so a test keeps one handle to inspect
//! calls after the run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::capability::{AutomationHost, ContainerManager, HostError, HostOp};

#[derive(Debug, Clone, Copy)]
enum Failure {
    Times(usize),
    Always,
}

#[derive(Debug, Default)]
struct Script {
    failures: HashMap<HostOp, Failure>,
    failed: HashMap<HostOp, usize>,
    calls: Vec<HostOp>,
    entries: Vec<PathBuf>,
    identities: Vec<String>,
    open: Option<PathBuf>,
}

impl Script {
    fn call(&mut self, op: HostOp) -> Result<(), HostError> {
        self.calls.push(op);
        let fail = match self.failures.get_mut(&op) {
            Some(Failure::Always) => true,
            Some(Failure::Times(n)) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        };
        if !fail {
            return Ok(());
        }
        let count = self.failed.entry(op).or_default();
        *count += 1;
        Err(HostError::rejected(op, format!("scripted failure #{count}")))
    }
}

/// In-memory host whose failures are scripted per operation.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    script: Rc<RefCell<Script>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls of `op`.
    pub fn fail(self, op: HostOp, times: usize) -> Self {
        self.script
            .borrow_mut()
            .failures
            .insert(op, Failure::Times(times));
        self
    }

    /// Fail every call of `op`.
    pub fn fail_always(self, op: HostOp) -> Self {
        self.script.borrow_mut().failures.insert(op, Failure::Always);
        self
    }

    /// Entries the container reports as already present.
    pub fn with_entries(self, entries: Vec<PathBuf>) -> Self {
        self.script.borrow_mut().entries = entries;
        self
    }

    /// Identity tokens the container reports as already referenced.
    pub fn with_identities(self, identities: Vec<String>) -> Self {
        self.script.borrow_mut().identities = identities;
        self
    }

    pub fn calls(&self) -> Vec<HostOp> {
        self.script.borrow().calls.clone()
    }

    pub fn count(&self, op: HostOp) -> usize {
        self.script.borrow().calls.iter().filter(|c| **c == op).count()
    }

    pub fn entries(&self) -> Vec<PathBuf> {
        self.script.borrow().entries.clone()
    }

    /// Path of the container currently open, if any.
    pub fn open_container(&self) -> Option<PathBuf> {
        self.script.borrow().open.clone()
    }

    fn call(&self, op: HostOp) -> Result<(), HostError> {
        self.script.borrow_mut().call(op)
    }
}

#[derive(Debug)]
pub struct ScriptedSession;

#[derive(Debug)]
pub struct ScriptedManager {
    host: ScriptedHost,
}

impl AutomationHost for ScriptedHost {
    type Session = ScriptedSession;
    type Manager = ScriptedManager;

    fn start(&self) -> Result<ScriptedSession, HostError> {
        self.call(HostOp::Start)?;
        Ok(ScriptedSession)
    }

    fn stop(&self, _session: &mut ScriptedSession) -> Result<(), HostError> {
        self.call(HostOp::Stop)
    }

    fn container_manager(
        &self,
        _session: &mut ScriptedSession,
    ) -> Result<ScriptedManager, HostError> {
        self.call(HostOp::ContainerManager)?;
        Ok(ScriptedManager { host: self.clone() })
    }
}

impl ContainerManager for ScriptedManager {
    fn create(&mut self, dir: &Path, name: &str) -> Result<(), HostError> {
        self.host.call(HostOp::Create)?;
        self.host.script.borrow_mut().open = Some(dir.join(format!("{name}.sln")));
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<(), HostError> {
        self.host.call(HostOp::Open)?;
        self.host.script.borrow_mut().open = Some(path.to_path_buf());
        Ok(())
    }

    fn save(&mut self, _path: &Path) -> Result<(), HostError> {
        self.host.call(HostOp::Save)
    }

    fn close(&mut self) -> Result<(), HostError> {
        self.host.call(HostOp::Close)?;
        self.host.script.borrow_mut().open = None;
        Ok(())
    }

    fn list_entries(&mut self) -> Result<Vec<PathBuf>, HostError> {
        self.host.call(HostOp::ListEntries)?;
        Ok(self.host.entries())
    }

    fn contains_identity(&mut self, identity: &str) -> Result<bool, HostError> {
        self.host.call(HostOp::ContainsIdentity)?;
        Ok(self.host.script.borrow().identities.iter().any(|i| i == identity))
    }

    fn add_entry(&mut self, path: &Path) -> Result<(), HostError> {
        self.host.call(HostOp::AddEntry)?;
        self.host.script.borrow_mut().entries.push(path.to_path_buf());
        Ok(())
    }
}
