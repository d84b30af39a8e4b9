//! Session lifecycle driver.
//!
//! ```text
//! NotStarted → SessionStarted → ContainerAcquired → {Created | Opened}
//!            → Saved → Closed → SessionStopped → {Done | Failed}
//! ```
//!
//! Every host call goes through [`retry`]. Acquisitions are wrapped in guards
//! released in reverse order (container, then session) on every exit path:
//! explicitly on the normal path so failures land in the [`RunReport`], and
//! from `Drop` if the run unwinds before that. A session, once started, is
//! stopped exactly once.

use std::path::{Path, PathBuf};

use slnsync_core::descriptor::{self, DEFAULT_IDENTITY_ELEMENT};
use slnsync_core::{retry, MergeOutcome, RetryError, RetryPolicy, SkipReason};

use crate::capability::{AutomationHost, ContainerManager, HostError};

/// Aggregate failure of one host operation.
pub type OrchestrationError = RetryError<HostError>;

// ---------------------------------------------------------------------------
// Target + report
// ---------------------------------------------------------------------------

/// The container file to create or open: `<dir>/<name>.sln`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerTarget {
    pub dir: PathBuf,
    pub name: String,
}

impl ContainerTarget {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.sln", self.name))
    }
}

/// Lifecycle states, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    SessionStarted,
    ContainerAcquired,
    Created,
    Opened,
    Saved,
    Closed,
    SessionStopped,
    Done,
    Failed,
}

/// What happened during one orchestrated run.
#[derive(Debug)]
pub struct RunReport {
    /// Visited states, ending in `Done` or `Failed`.
    pub states: Vec<RunState>,
    pub merges: Vec<MergeOutcome>,
    /// First hard failure of the run.
    pub failure: Option<OrchestrationError>,
    /// Failures logged during teardown after `failure` was already set.
    pub teardown_failures: Vec<OrchestrationError>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            states: vec![RunState::NotStarted],
            merges: Vec::new(),
            failure: None,
            teardown_failures: Vec::new(),
        }
    }

    fn enter(&mut self, state: RunState) {
        tracing::debug!(state = ?state, "orchestrator state");
        self.states.push(state);
    }

    fn fail(&mut self, err: OrchestrationError) {
        err.log();
        if self.failure.is_none() {
            self.failure = Some(err);
        } else {
            self.teardown_failures.push(err);
        }
    }

    fn finish(mut self) -> Self {
        let last = if self.failure.is_none() {
            RunState::Done
        } else {
            RunState::Failed
        };
        self.enter(last);
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn reached(&self, state: RunState) -> bool {
        self.states.contains(&state)
    }

    pub fn into_result(self) -> Result<Vec<MergeOutcome>, OrchestrationError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.merges),
        }
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Owns a started session; stops it exactly once.
struct SessionGuard<'h, H: AutomationHost> {
    host: &'h H,
    policy: RetryPolicy,
    session: H::Session,
    released: bool,
}

impl<'h, H: AutomationHost> SessionGuard<'h, H> {
    fn new(host: &'h H, policy: RetryPolicy, session: H::Session) -> Self {
        Self {
            host,
            policy,
            session,
            released: false,
        }
    }

    fn session_mut(&mut self) -> &mut H::Session {
        &mut self.session
    }

    fn release(mut self) -> Result<(), OrchestrationError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), OrchestrationError> {
        self.released = true;
        tracing::info!("stopping automation host");
        let host = self.host;
        let session = &mut self.session;
        retry(&self.policy, "stop automation host", || host.stop(session))
    }
}

impl<H: AutomationHost> Drop for SessionGuard<'_, H> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(err) = self.stop() {
                err.log();
            }
        }
    }
}

/// Holds an open container; saves and closes it once.
struct ContainerGuard<'m, M: ContainerManager> {
    manager: &'m mut M,
    path: PathBuf,
    policy: RetryPolicy,
    released: bool,
}

type Teardown = (
    Result<(), OrchestrationError>,
    Result<(), OrchestrationError>,
);

impl<'m, M: ContainerManager> ContainerGuard<'m, M> {
    fn new(manager: &'m mut M, path: PathBuf, policy: RetryPolicy) -> Self {
        Self {
            manager,
            path,
            policy,
            released: false,
        }
    }

    fn manager(&mut self) -> &mut M {
        &mut *self.manager
    }

    /// Save, then close. A failed save does not prevent the close.
    fn release(mut self) -> Teardown {
        self.save_and_close()
    }

    fn save_and_close(&mut self) -> Teardown {
        self.released = true;
        let path = &self.path;

        tracing::info!(path = %path.display(), "saving solution file");
        let saved = retry(&self.policy, "save solution", || self.manager.save(path));

        tracing::info!("closing solution file");
        let closed = retry(&self.policy, "close solution", || self.manager.close());

        (saved, closed)
    }
}

impl<M: ContainerManager> Drop for ContainerGuard<'_, M> {
    fn drop(&mut self) {
        if !self.released {
            let (saved, closed) = self.save_and_close();
            for err in [saved.err(), closed.err()].into_iter().flatten() {
                err.log();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives an [`AutomationHost`] to create/open a solution and add projects.
pub struct Orchestrator<'h, H: AutomationHost> {
    host: &'h H,
    policy: RetryPolicy,
    identity_element: String,
}

impl<'h, H: AutomationHost> Orchestrator<'h, H> {
    pub fn new(host: &'h H, policy: RetryPolicy) -> Self {
        Self {
            host,
            policy,
            identity_element: DEFAULT_IDENTITY_ELEMENT.to_string(),
        }
    }

    /// Element holding the project identity in descriptor files.
    pub fn with_identity_element(mut self, element: impl Into<String>) -> Self {
        self.identity_element = element.into();
        self
    }

    /// Create the container if absent (or open it), save, close, stop.
    pub fn bootstrap(&self, target: &ContainerTarget) -> RunReport {
        self.run(target, &[])
    }

    /// Full run: create-or-open, merge every project, save, close, stop.
    pub fn run(&self, target: &ContainerTarget, projects: &[PathBuf]) -> RunReport {
        let mut report = RunReport::new();

        tracing::info!("starting automation host");
        let session = match retry(&self.policy, "start automation host", || self.host.start()) {
            Ok(session) => session,
            Err(err) => {
                report.fail(err);
                return report.finish();
            }
        };
        report.enter(RunState::SessionStarted);

        let mut session = SessionGuard::new(self.host, self.policy, session);
        self.drive(&mut session, target, projects, &mut report);

        match session.release() {
            Ok(()) => report.enter(RunState::SessionStopped),
            Err(err) => report.fail(err),
        }
        report.finish()
    }

    fn drive(
        &self,
        session: &mut SessionGuard<'_, H>,
        target: &ContainerTarget,
        projects: &[PathBuf],
        report: &mut RunReport,
    ) {
        let acquired = retry(&self.policy, "get solution interface", || {
            self.host.container_manager(session.session_mut())
        });
        let mut manager = match acquired {
            Ok(manager) => manager,
            Err(err) => return report.fail(err),
        };
        report.enter(RunState::ContainerAcquired);

        let path = target.path();
        let opened = if path.exists() {
            tracing::info!(path = %path.display(), "opening solution file");
            retry(&self.policy, "open solution", || manager.open(&path)).map(|()| RunState::Opened)
        } else {
            tracing::info!(
                name = %target.name,
                dir = %target.dir.display(),
                "creating solution file"
            );
            retry(&self.policy, "create solution", || {
                manager.create(&target.dir, &target.name)
            })
            .map(|()| RunState::Created)
        };
        match opened {
            Ok(state) => report.enter(state),
            Err(err) => return report.fail(err),
        }

        let mut container = ContainerGuard::new(&mut manager, path, self.policy);
        if let Err(err) = self.merge_all(container.manager(), projects, &mut report.merges) {
            report.fail(err);
        }

        let (saved, closed) = container.release();
        match saved {
            Ok(()) => report.enter(RunState::Saved),
            Err(err) => report.fail(err),
        }
        match closed {
            Ok(()) => report.enter(RunState::Closed),
            Err(err) => report.fail(err),
        }
    }

    /// Add each project not already referenced, by path or by identity.
    /// Unreadable identities are skipped; an exhausted host call stops the loop.
    fn merge_all(
        &self,
        manager: &mut H::Manager,
        projects: &[PathBuf],
        merges: &mut Vec<MergeOutcome>,
    ) -> Result<(), OrchestrationError> {
        for project in projects {
            if !project.exists() {
                tracing::warn!(path = %project.display(), "could not find project file");
                merges.push(MergeOutcome::skipped(project, SkipReason::Missing));
                continue;
            }

            let entry = match descriptor::read_entry(project, &self.identity_element) {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(
                        path = %project.display(),
                        error = %err,
                        "could not find project identity"
                    );
                    merges.push(MergeOutcome::skipped(
                        project,
                        SkipReason::NoIdentity(err.to_string()),
                    ));
                    continue;
                }
            };

            let entries = retry(&self.policy, "list solution projects", || manager.list_entries())?;
            let present = entries.iter().any(|e| same_path(e, project))
                || retry(&self.policy, "find project identity", || {
                    manager.contains_identity(&entry.identity)
                })?;
            if present {
                tracing::info!(
                    path = %project.display(),
                    identity = %entry.identity,
                    "already added project file"
                );
                merges.push(MergeOutcome::skipped(project, SkipReason::AlreadyPresent));
                continue;
            }

            let operation = format!("add project {}", project.display());
            retry(&self.policy, &operation, || manager.add_entry(project))?;
            tracing::info!(path = %project.display(), "added project file");
            merges.push(MergeOutcome::Added {
                path: project.clone(),
            });
        }
        Ok(())
    }
}

/// Case-insensitive path equality, as the host reports paths in its own casing.
fn same_path(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::capability::HostOp;
    use crate::scripted::ScriptedHost;

    fn policy() -> RetryPolicy {
        RetryPolicy::immediate(5)
    }

    fn target(dir: &TempDir) -> ContainerTarget {
        ContainerTarget::new(dir.path(), "App")
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(
            &path,
            format!("<Project><PropertyGroup><ProjectGuid>{{{name}}}</ProjectGuid></PropertyGroup></Project>"),
        )
        .unwrap();
        path
    }

    #[test]
    fn create_path_visits_every_state_in_order() {
        let dir = TempDir::new().unwrap();
        let host = ScriptedHost::new();
        let report = Orchestrator::new(&host, policy()).bootstrap(&target(&dir));

        assert!(report.is_success(), "{:?}", report.failure);
        assert_eq!(
            report.states,
            vec![
                RunState::NotStarted,
                RunState::SessionStarted,
                RunState::ContainerAcquired,
                RunState::Created,
                RunState::Saved,
                RunState::Closed,
                RunState::SessionStopped,
                RunState::Done,
            ]
        );
        assert_eq!(
            host.calls(),
            vec![
                HostOp::Start,
                HostOp::ContainerManager,
                HostOp::Create,
                HostOp::Save,
                HostOp::Close,
                HostOp::Stop,
            ]
        );
    }

    #[test]
    fn existing_container_is_opened_not_created() {
        let dir = TempDir::new().unwrap();
        fs::write(target(&dir).path(), "").unwrap();
        let host = ScriptedHost::new();
        let report = Orchestrator::new(&host, policy()).bootstrap(&target(&dir));

        assert!(report.reached(RunState::Opened));
        assert!(!report.reached(RunState::Created));
        assert_eq!(host.count(HostOp::Create), 0);
        assert_eq!(host.count(HostOp::Open), 1);
    }

    #[test]
    fn transient_start_failures_are_absorbed() {
        let dir = TempDir::new().unwrap();
        let host = ScriptedHost::new().fail(HostOp::Start, 2);
        let report = Orchestrator::new(&host, policy()).bootstrap(&target(&dir));

        assert!(report.is_success());
        assert_eq!(host.count(HostOp::Start), 3);
        assert_eq!(host.count(HostOp::Stop), 1);
    }

    #[test]
    fn start_exhaustion_fails_before_anything_else() {
        let dir = TempDir::new().unwrap();
        let host = ScriptedHost::new().fail_always(HostOp::Start);
        let report = Orchestrator::new(&host, policy()).bootstrap(&target(&dir));

        assert_eq!(report.states, vec![RunState::NotStarted, RunState::Failed]);
        assert_eq!(host.calls(), vec![HostOp::Start; 5]);
        let err = report.into_result().unwrap_err();
        assert_eq!(err.causes.len(), 5);
        assert_eq!(err.operation, "start automation host");
    }

    #[test]
    fn exhausted_causes_keep_attempt_order() {
        let dir = TempDir::new().unwrap();
        let host = ScriptedHost::new().fail_always(HostOp::ContainerManager);
        let err = Orchestrator::new(&host, policy())
            .bootstrap(&target(&dir))
            .into_result()
            .unwrap_err();

        let messages: Vec<String> = err.causes.iter().map(|c| c.to_string()).collect();
        assert_eq!(messages.len(), 5);
        for (i, msg) in messages.iter().enumerate() {
            assert!(msg.ends_with(&format!("#{}", i + 1)), "cause {i}: {msg}");
        }
    }

    #[test]
    fn create_failure_skips_save_and_close_but_stops_session() {
        let dir = TempDir::new().unwrap();
        let host = ScriptedHost::new().fail_always(HostOp::Create);
        let report = Orchestrator::new(&host, policy()).bootstrap(&target(&dir));

        assert!(!report.is_success());
        assert_eq!(host.count(HostOp::Save), 0);
        assert_eq!(host.count(HostOp::Close), 0);
        assert_eq!(host.count(HostOp::Stop), 1);
        assert_eq!(host.calls().last(), Some(&HostOp::Stop));
        assert!(report.reached(RunState::SessionStopped));
        assert_eq!(report.states.last(), Some(&RunState::Failed));
    }

    #[test]
    fn save_failure_still_closes_then_stops() {
        let dir = TempDir::new().unwrap();
        let host = ScriptedHost::new().fail_always(HostOp::Save);
        let report = Orchestrator::new(&host, policy()).bootstrap(&target(&dir));

        assert_eq!(host.count(HostOp::Save), 5);
        assert_eq!(host.count(HostOp::Close), 1);
        assert_eq!(host.count(HostOp::Stop), 1);
        assert!(report.reached(RunState::Closed));
        assert!(!report.reached(RunState::Saved));
        assert_eq!(report.failure.as_ref().unwrap().operation, "save solution");
        assert!(report.teardown_failures.is_empty());
    }

    #[test]
    fn stop_failure_is_primary_only_without_earlier_failure() {
        let dir = TempDir::new().unwrap();
        let host = ScriptedHost::new().fail_always(HostOp::Stop);
        let report = Orchestrator::new(&host, policy()).bootstrap(&target(&dir));
        assert_eq!(
            report.failure.as_ref().unwrap().operation,
            "stop automation host"
        );

        let host = ScriptedHost::new()
            .fail_always(HostOp::Create)
            .fail_always(HostOp::Stop);
        let report = Orchestrator::new(&host, policy()).bootstrap(&target(&dir));
        assert_eq!(report.failure.as_ref().unwrap().operation, "create solution");
        assert_eq!(report.teardown_failures.len(), 1);
        assert_eq!(host.count(HostOp::Stop), 5, "one retried stop, not two");
    }

    #[test]
    fn merge_skips_missing_and_present_and_adds_new() {
        let dir = TempDir::new().unwrap();
        let present = touch(&dir, "Present.csproj");
        let fresh = touch(&dir, "Fresh.csproj");
        let missing = dir.path().join("Missing.csproj");

        let listed_as = PathBuf::from(present.to_string_lossy().to_uppercase());
        let host = ScriptedHost::new().with_entries(vec![listed_as]);
        let report = Orchestrator::new(&host, policy()).run(
            &target(&dir),
            &[missing.clone(), present.clone(), fresh.clone()],
        );

        assert_eq!(
            report.into_result().unwrap(),
            vec![
                MergeOutcome::skipped(&missing, SkipReason::Missing),
                MergeOutcome::skipped(&present, SkipReason::AlreadyPresent),
                MergeOutcome::Added { path: fresh.clone() },
            ]
        );
        assert_eq!(host.count(HostOp::AddEntry), 1);
        assert!(host.entries().contains(&fresh));
    }

    #[test]
    fn add_exhaustion_aborts_loop_but_tears_down() {
        let dir = TempDir::new().unwrap();
        let first = touch(&dir, "First.csproj");
        let second = touch(&dir, "Second.csproj");
        let host = ScriptedHost::new().fail_always(HostOp::AddEntry);

        let report = Orchestrator::new(&host, policy()).run(&target(&dir), &[first, second]);

        assert_eq!(host.count(HostOp::AddEntry), 5, "second project never attempted");
        assert_eq!(host.count(HostOp::ListEntries), 1);
        assert!(report.merges.is_empty());
        assert!(report.reached(RunState::Saved));
        assert!(report.reached(RunState::Closed));
        assert!(report.reached(RunState::SessionStopped));
        assert_eq!(report.states.last(), Some(&RunState::Failed));
    }

    #[test]
    fn unreadable_identity_is_skipped_without_host_calls() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("Bad.csproj");
        fs::write(&bad, "<Project><PropertyGroup /></Project>").unwrap();
        let good = touch(&dir, "Good.csproj");
        let host = ScriptedHost::new();

        let report =
            Orchestrator::new(&host, policy()).run(&target(&dir), &[bad.clone(), good.clone()]);

        let merges = report.into_result().unwrap();
        assert!(matches!(
            &merges[0],
            MergeOutcome::Skipped { reason: SkipReason::NoIdentity(_), .. }
        ));
        assert_eq!(merges[1], MergeOutcome::Added { path: good.clone() });
        assert_eq!(host.count(HostOp::AddEntry), 1);
        assert_eq!(host.count(HostOp::ListEntries), 1);
        assert_eq!(host.entries(), vec![good]);
    }

    #[test]
    fn identity_known_to_host_is_already_present() {
        let dir = TempDir::new().unwrap();
        let project = touch(&dir, "Copy.csproj");
        let host = ScriptedHost::new().with_identities(vec!["{Copy.csproj}".to_string()]);

        let merges = Orchestrator::new(&host, policy())
            .run(&target(&dir), &[project.clone()])
            .into_result()
            .unwrap();

        assert_eq!(merges, vec![MergeOutcome::skipped(&project, SkipReason::AlreadyPresent)]);
        assert_eq!(host.count(HostOp::ContainsIdentity), 1);
        assert_eq!(host.count(HostOp::AddEntry), 0);
    }

    #[test]
    fn custom_identity_element_is_read() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("Custom.csproj");
        fs::write(&project, "<Project><ProjectId>{C}</ProjectId></Project>").unwrap();
        let host = ScriptedHost::new();

        let merges = Orchestrator::new(&host, policy())
            .with_identity_element("ProjectId")
            .run(&target(&dir), &[project.clone()])
            .into_result()
            .unwrap();
        assert_eq!(merges, vec![MergeOutcome::Added { path: project }]);
    }

    #[test]
    fn dropped_session_guard_stops_once() {
        let host = ScriptedHost::new();
        let session = host.start().unwrap();
        drop(SessionGuard::new(&host, policy(), session));
        assert_eq!(host.count(HostOp::Stop), 1);

        let session = host.start().unwrap();
        let guard = SessionGuard::new(&host, policy(), session);
        guard.release().unwrap();
        assert_eq!(host.count(HostOp::Stop), 2, "release then drop stops once");
    }

    #[test]
    fn dropped_container_guard_saves_and_closes() {
        let host = ScriptedHost::new();
        let mut session = host.start().unwrap();
        let mut manager = host.container_manager(&mut session).unwrap();
        drop(ContainerGuard::new(&mut manager, PathBuf::from("x.sln"), policy()));
        assert_eq!(host.count(HostOp::Save), 1);
        assert_eq!(host.count(HostOp::Close), 1);
    }

    #[test]
    fn same_path_ignores_case() {
        assert!(same_path(Path::new("C:/Src/App.csproj"), Path::new("c:/src/app.CSPROJ")));
        assert!(!same_path(Path::new("a.csproj"), Path::new("b.csproj")));
    }
}
