//! End-to-end scenarios for the daemon with an in-memory watcher and a
//! scripted generator.

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use tempfile::TempDir;

use cw_core::{Config, FxHashMap, ModuleRoot};
use cw_daemon::{App, Event};
use cw_generator::{CommandRunner, GenerateError, Invocation, MemorySink, ProcessOutput};
use cw_scanner::DiscoveryReport;
use cw_watcher::{FileEvent, ManualWatch, NotifyWatch};

/// Generator fake: succeeds unless an outcome was scripted for the input
/// file name, and records every invocation.
#[derive(Default)]
struct ScriptedRunner {
    outcomes: Mutex<FxHashMap<String, (i32, String)>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    fn fail(&self, file_name: &str, code: i32, stderr: &str) {
        self.outcomes
            .lock()
            .insert(file_name.to_owned(), (code, stderr.to_owned()));
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, GenerateError> {
        self.calls.lock().push(invocation.clone());

        // Yield so concurrent dispatches interleave
        tokio::task::yield_now().await;

        let input = invocation.args.first().cloned().unwrap_or_default();
        let name = Utf8Path::new(&input).file_name().unwrap_or_default().to_owned();
        let scripted = self.outcomes.lock().get(&name).cloned();

        Ok(match scripted {
            Some((code, stderr)) => ProcessOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr,
            },
            None => ProcessOutput {
                exit_code: Some(0),
                stdout: format!("wrote {name}\n"),
                stderr: String::new(),
            },
        })
    }
}

struct Harness {
    _dir: TempDir,
    root: Utf8PathBuf,
    watch: Arc<ManualWatch>,
    runner: Arc<ScriptedRunner>,
    sink: Arc<MemorySink>,
    app: App<ManualWatch, ScriptedRunner, MemorySink>,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().canonicalize().unwrap()).unwrap();

        let mut config = Config::default();
        config.discovery.workspace_root = root.clone();

        let watch = Arc::new(ManualWatch::new());
        let runner = Arc::new(ScriptedRunner::default());
        let sink = Arc::new(MemorySink::new());
        let app = App::new(config, Arc::clone(&watch), Arc::clone(&runner), Arc::clone(&sink));

        Self {
            _dir: dir,
            root,
            watch,
            runner,
            sink,
            app,
        }
    }

    /// Creates `<name>/go.mod`, and `<name>/config/` when asked.
    fn module(&self, name: &str, with_config: bool) -> ModuleRoot {
        let root = self.root.join(name);
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("go.mod"), "module example\n").unwrap();
        if with_config {
            std::fs::create_dir_all(root.join("config")).unwrap();
        }
        ModuleRoot::new(root)
    }

    async fn start(&mut self) {
        self.app.start().await.unwrap();
        self.settle().await;
    }

    /// Handles every queued event and waits for the generations it started.
    async fn settle(&mut self) {
        let handles = self.app.drain();
        for handle in handles {
            let _ = handle.await.unwrap();
        }
    }

    fn manifest_created(&self, module: &ModuleRoot) {
        self.watch.emit(FileEvent::created(module.as_path().join("go.mod")));
    }

    fn manifest_deleted(&self, module: &ModuleRoot) {
        self.watch.emit(FileEvent::removed(module.as_path().join("go.mod")));
    }

    fn config_written(&self, module: &ModuleRoot, file: &str) -> usize {
        self.watch
            .emit(FileEvent::created(module.as_path().join("config").join(file)))
    }
}

#[tokio::test]
async fn manifest_then_config_file_runs_generator() {
    let mut h = Harness::new();
    h.start().await;

    let proj = h.module("proj", true);
    h.manifest_created(&proj);
    h.settle().await;
    assert!(h.app.registry().contains(&proj));

    h.config_written(&proj, "settings.json");
    h.settle().await;

    let calls = h.runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "cfgo");
    assert_eq!(
        calls[0].args,
        vec![
            proj.as_path().join("config/settings.json").to_string(),
            proj.as_path().join("config/generated/settings.go").to_string(),
        ]
    );
    assert!(proj.as_path().join("config/generated").is_dir());

    insta::assert_snapshot!(h.sink.statuses()[0].to_string(), @"info: cfgo: Generated settings.go");
}

#[tokio::test]
async fn generator_failure_reports_stderr() {
    let mut h = Harness::new();
    let proj = h.module("proj", true);
    h.start().await;
    assert!(h.app.registry().contains(&proj));

    h.runner.fail("settings.json", 1, "invalid JSON");
    h.config_written(&proj, "settings.json");
    h.settle().await;

    let statuses = h.sink.statuses();
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].is_error());
    assert!(statuses[0].message.contains("invalid JSON"));
    insta::assert_snapshot!(statuses[0].to_string(), @"error: cfgo failed: invalid JSON");
}

#[tokio::test]
async fn deleted_manifest_stops_generation() {
    let mut h = Harness::new();
    let proj = h.module("proj", true);
    h.start().await;

    h.manifest_deleted(&proj);
    h.settle().await;
    assert!(!h.app.registry().contains(&proj));

    assert_eq!(h.config_written(&proj, "other.json"), 0);
    h.settle().await;

    assert!(h.runner.calls().is_empty());
    assert!(h.sink.is_empty());
}

#[tokio::test]
async fn modules_without_config_dir_are_never_registered() {
    let mut h = Harness::new();
    let bare = h.module("bare", false);
    h.start().await;
    h.manifest_created(&bare);
    h.settle().await;

    assert!(!h.app.registry().contains(&bare));
    // Only the manifest subscription exists
    assert_eq!(h.watch.active_subscriptions(), 1);
}

#[tokio::test]
async fn duplicate_manifest_events_keep_one_subscription() {
    let mut h = Harness::new();
    let proj = h.module("proj", true);
    h.start().await;

    h.manifest_created(&proj);
    h.manifest_created(&proj);
    h.watch.emit(FileEvent::modified(proj.as_path().join("go.mod")));
    h.settle().await;

    assert_eq!(h.app.registry().len(), 1);
    assert_eq!(h.watch.active_subscriptions(), 2);

    h.config_written(&proj, "a.json");
    h.settle().await;
    assert_eq!(h.runner.calls().len(), 1);
}

#[tokio::test]
async fn modules_are_handled_independently() {
    let mut h = Harness::new();
    let a = h.module("a", true);
    let b = h.module("b", true);
    h.start().await;

    h.runner.fail("broken.json", 2, "unexpected token at line 3");
    h.config_written(&a, "broken.json");
    h.config_written(&b, "fine.json");
    h.settle().await;

    let calls = h.runner.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().any(|c| c.working_dir == a.as_path()));
    assert!(calls.iter().any(|c| c.working_dir == b.as_path()));

    let mut messages = h.sink.messages();
    messages.sort();
    assert_eq!(
        messages,
        vec![
            "cfgo failed: unexpected token at line 3".to_owned(),
            "cfgo: Generated fine.go".to_owned(),
        ]
    );
    assert!(a.as_path().join("config/generated").is_dir());
    assert!(b.as_path().join("config/generated").is_dir());
}

#[tokio::test]
async fn events_queued_before_release_are_dropped() {
    let mut h = Harness::new();
    let proj = h.module("proj", true);
    h.start().await;

    // Both land in the queue before either is handled
    h.config_written(&proj, "a.json");
    h.manifest_deleted(&proj);

    // Handle the deletion first, then the stale change
    let mut queued = Vec::new();
    while let Ok(Some(event)) =
        tokio::time::timeout(std::time::Duration::from_millis(10), h.app.next_event()).await
    {
        queued.push(event);
    }
    assert_eq!(queued.len(), 2);
    let change = queued.remove(0);
    assert!(change.is_config_changed());

    for event in queued {
        assert!(h.app.handle_event(event).is_none());
    }
    assert!(h.app.handle_event(change).is_none());
    assert!(h.runner.calls().is_empty());
}

#[tokio::test]
async fn recreated_module_ignores_old_subscription_events() {
    let mut h = Harness::new();
    let proj = h.module("proj", true);
    h.start().await;

    h.config_written(&proj, "a.json");
    let stale = h.app.next_event().await.unwrap();

    h.manifest_deleted(&proj);
    h.manifest_created(&proj);
    h.settle().await;
    assert!(h.app.registry().contains(&proj));

    assert!(h.app.handle_event(stale).is_none());

    h.config_written(&proj, "a.json");
    h.settle().await;
    assert_eq!(h.runner.calls().len(), 1);
}

#[tokio::test]
async fn config_dir_created_later_needs_manifest_touch() {
    let mut h = Harness::new();
    let proj = h.module("proj", false);
    h.start().await;
    assert!(!h.app.registry().contains(&proj));

    std::fs::create_dir_all(proj.as_path().join("config")).unwrap();
    assert_eq!(h.config_written(&proj, "a.json"), 0);

    h.watch.emit(FileEvent::modified(proj.as_path().join("go.mod")));
    h.settle().await;
    assert!(h.app.registry().contains(&proj));

    h.config_written(&proj, "a.json");
    h.settle().await;
    assert_eq!(h.runner.calls().len(), 1);
}

#[tokio::test]
async fn removed_and_non_json_files_do_not_dispatch() {
    let mut h = Harness::new();
    let proj = h.module("proj", true);
    h.start().await;

    let config = proj.as_path().join("config");
    h.watch.emit(FileEvent::removed(config.join("a.json")));
    h.watch.emit(FileEvent::modified(config.join("README.md")));
    h.watch.emit(FileEvent::modified(config.join("generated/a.json")));
    h.settle().await;

    assert!(h.runner.calls().is_empty());
}

#[tokio::test]
async fn repeated_writes_dispatch_each_time() {
    let mut h = Harness::new();
    let proj = h.module("proj", true);
    h.start().await;

    h.config_written(&proj, "a.b.json");
    h.config_written(&proj, "a.b.json");
    h.settle().await;

    let calls = h.runner.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.args[1].ends_with("/config/generated/a.b.go")));
    assert_eq!(h.sink.len(), 2);
}

#[tokio::test]
async fn shutdown_releases_all_subscriptions() {
    let mut h = Harness::new();
    h.module("a", true);
    h.module("b", true);
    h.start().await;
    assert_eq!(h.watch.active_subscriptions(), 3);

    h.app.shutdown();
    assert_eq!(h.watch.active_subscriptions(), 0);
    assert!(h.app.registry().is_empty());

    h.app.shutdown();
    assert_eq!(h.watch.active_subscriptions(), 0);
}

#[tokio::test]
async fn discovery_report_skips_ignored_dirs() {
    let mut h = Harness::new();
    let kept = h.module("svc", true);
    h.module("node_modules/dep", true);
    h.start().await;

    assert_eq!(h.app.registry().roots(), vec![kept]);
}

#[tokio::test]
async fn manifest_deleted_before_discovery_is_applied() {
    let mut h = Harness::new();
    let proj = h.module("proj", true);

    // The walk saw the manifest, then it was deleted and that event won the race
    let report = DiscoveryReport {
        roots: vec![proj.clone()],
        ..DiscoveryReport::default()
    };
    std::fs::remove_file(proj.as_path().join("go.mod")).unwrap();

    assert!(h.app.handle_event(Event::ManifestDeleted(proj.clone())).is_none());
    assert!(h.app.handle_event(Event::Discovered(report)).is_none());

    assert!(!h.app.registry().contains(&proj));
    assert_eq!(h.watch.active_subscriptions(), 0);
}

#[tokio::test]
async fn native_watcher_drives_generation() {
    let dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().canonicalize().unwrap()).unwrap();
    let proj = root.join("proj");
    std::fs::create_dir_all(proj.join("config")).unwrap();
    std::fs::write(proj.join("go.mod"), "module example\n").unwrap();

    let mut config = Config::default();
    config.discovery.workspace_root = root;
    let runner = Arc::new(ScriptedRunner::default());
    let sink = Arc::new(MemorySink::new());
    let mut app = App::new(
        config,
        Arc::new(NotifyWatch::default()),
        Arc::clone(&runner),
        Arc::clone(&sink),
    );

    app.start().await.unwrap();
    assert!(app.drain().is_empty());
    assert!(app.registry().contains(&ModuleRoot::new(proj.clone())));

    std::fs::write(proj.join("config/settings.json"), "{}").unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let handle = loop {
        let event = tokio::time::timeout_at(deadline, app.next_event())
            .await
            .expect("no change reported for settings.json")
            .unwrap();
        if let Some(handle) = app.handle_event(event) {
            break handle;
        }
    };
    handle.await.unwrap().unwrap();

    let calls = runner.calls();
    assert_eq!(calls[0].args[0], proj.join("config/settings.json").as_str());
    assert_eq!(sink.messages()[0], "cfgo: Generated settings.go");
}
