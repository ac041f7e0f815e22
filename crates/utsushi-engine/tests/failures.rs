//! Failure handling across the surface and source.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{Fixture, PAGE, frame, rendered_page, target};
use utsushi_engine::{BusyPolicy, EngineConfig, EntryStatus};
use utsushi_source::{MemorySourceFiles, SourceFiles, SourceResult};
use utsushi_surface::MemorySurface;
use utsushi_types::{Action, EditStyleAction, ErrorKind};

fn color(name: &str, to: &str) -> Action {
    Action::EditStyle(EditStyleAction {
        targets: vec![target(name)],
        style_key: "color".into(),
        original_value: String::new(),
        new_value: to.into(),
    })
}

/// Refuses every write and takes the surface down with it, so the
/// compensating surface edit fails too.
struct FailingWrites {
    inner: Arc<MemorySourceFiles>,
    surface: Arc<MemorySurface>,
}

#[async_trait]
impl SourceFiles for FailingWrites {
    async fn get_file_content(&self, path: &str) -> SourceResult<Option<String>> {
        self.inner.get_file_content(path).await
    }

    async fn write_file_content(&self, _path: &str, _content: &str) -> SourceResult<bool> {
        self.surface.fail_next(100);
        Ok(false)
    }

    async fn list_source_files(&self) -> SourceResult<Vec<String>> {
        self.inner.list_source_files().await
    }
}

#[tokio::test]
async fn test_source_failure_rolls_back_surface() {
    let fx = Fixture::new().await;
    let before = fx.surface.snapshot().unwrap();
    fx.files.refuse_next_writes(1);

    let err = fx.editor.runner.run(color("b", "red")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceIo);
    assert_eq!(fx.surface.snapshot().unwrap(), before);
    assert_eq!(fx.source(), PAGE);
    assert!(!fx.editor.session().history().can_undo());

    // nothing is stuck: the next edit goes through
    fx.editor.runner.run(color("b", "red")).await.unwrap();
    assert!(fx.source().contains("color: 'red'"));
}

#[tokio::test]
async fn test_failed_rollback_marks_entry_inconsistent() {
    let files = Arc::new(MemorySourceFiles::with_files([(common::PATH, PAGE)]));
    let surface = Arc::new(MemorySurface::new(frame(), &rendered_page()).unwrap());
    let backend = Arc::new(FailingWrites {
        inner: files.clone(),
        surface: surface.clone(),
    });
    let fx = Fixture::assemble(EngineConfig::default(), backend, files, surface).await;

    let err = fx.editor.runner.run(color("b", "red")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RollbackFailed);
    assert!(!err.kind().is_recoverable());

    let history = fx.editor.session().history();
    assert!(!history.can_undo());
    assert_eq!(history.inconsistent().len(), 1);
    assert_eq!(history.inconsistent()[0].status, EntryStatus::Inconsistent);
    assert_eq!(history.inconsistent()[0].actions, vec![color("b", "red")]);
}

#[tokio::test]
async fn test_reject_policy_reports_busy_surface() {
    let config = EngineConfig::default().with_busy_policy(BusyPolicy::Reject);
    let fx = Fixture::with_config(config).await;
    fx.surface.set_latency(Some(Duration::from_millis(50)));

    let runner = &fx.editor.runner;
    let (first, second) = tokio::join!(runner.run(color("a", "red")), runner.run(color("b", "red")));
    first.unwrap();
    let err = second.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SurfaceBusy);
    assert!(err.kind().is_recoverable());
    assert_eq!(fx.editor.session().history().undo_len(), 1);
}

#[tokio::test]
async fn test_queue_policy_serializes_edits() {
    let fx = Fixture::new().await;
    fx.surface.set_latency(Some(Duration::from_millis(10)));

    let runner = &fx.editor.runner;
    let (first, second) = tokio::join!(runner.run(color("a", "red")), runner.run(color("b", "blue")));
    first.unwrap();
    second.unwrap();
    assert_eq!(fx.live("a").await.style("color"), Some("red"));
    assert_eq!(fx.live("b").await.style("color"), Some("blue"));
    assert_eq!(fx.editor.session().history().undo_len(), 2);
}

#[tokio::test]
async fn test_unresponsive_surface_times_out() {
    let config = EngineConfig::default().with_surface_timeout(Duration::from_millis(20));
    let fx = Fixture::with_config(config).await;
    fx.surface.set_latency(Some(Duration::from_millis(200)));

    let err = fx.editor.runner.run(color("a", "red")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SurfaceIo);
    assert_eq!(fx.source(), PAGE);
    assert!(!fx.editor.session().history().can_undo());
}

#[tokio::test]
async fn test_history_limit_from_config() {
    let fx = Fixture::with_config(EngineConfig::default().with_history_limit(2)).await;
    for value in ["red", "green", "blue"] {
        let mut action = color("a", value);
        if let Action::EditStyle(edit) = &mut action {
            edit.original_value = fx.live("a").await.style("color").unwrap_or_default().to_string();
        }
        fx.editor.runner.run(action).await.unwrap();
    }
    assert_eq!(fx.editor.session().history().undo_len(), 2);

    fx.editor.runner.undo().await.unwrap().unwrap();
    fx.editor.runner.undo().await.unwrap().unwrap();
    assert!(fx.editor.runner.undo().await.unwrap().is_none());
    assert_eq!(fx.live("a").await.style("color"), Some("red"));
}

#[tokio::test]
async fn test_unknown_frame_is_rejected() {
    let fx = Fixture::new().await;
    let mut action = color("a", "red");
    if let Action::EditStyle(edit) = &mut action {
        edit.targets[0].frame_id = "elsewhere".into();
    }
    let err = fx.editor.runner.run(action).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAction);
    assert_eq!(fx.source(), PAGE);
}

#[tokio::test]
async fn test_failed_drag_end_leaves_surface_clean() {
    let fx = Fixture::new().await;
    let before = fx.surface.snapshot().unwrap();
    let mut session = fx.editor.drag.start(&target("c")).await.unwrap();
    session.drag(0.0, -55.0, 10.0, 45.0).await.unwrap();

    fx.surface.fail_next(1);
    let err = fx.editor.drag.end(session).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SurfaceIo);
    assert_eq!(fx.surface.snapshot().unwrap(), before);
    assert_eq!(fx.source(), PAGE);
    assert!(!fx.editor.session().history().can_undo());

    // the same drag goes through afterwards
    let mut session = fx.editor.drag.start(&target("c")).await.unwrap();
    session.drag(0.0, -55.0, 10.0, 45.0).await.unwrap();
    assert_eq!(fx.editor.drag.end(session).await.unwrap().len(), 1);
    assert_eq!(fx.order().await, vec!["d-a", "d-c", "d-b", "d-d", "d-e"]);
    assert_eq!(fx.source_order(), vec!["a", "c", "b", "d", "e"]);
}
