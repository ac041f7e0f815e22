//! Offline replay and patching.
//!
//! ```text
//! snapshot.json ──► MemorySurface ─┐
//!                                  ├─► EditorSession ─► ActionRunner ◄── log.json
//! --root <dir>  ──► LocalSourceFiles┘
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use utsushi_engine::{ActionRunner, EditorSession, EngineConfig};
use utsushi_source::{DiffApplier, LocalSourceFiles, SourceSync};
use utsushi_surface::{MemorySurface, SurfaceSnapshot};
use utsushi_types::Action;

/// What a replay did.
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub applied: usize,
    /// `(position in the log, error)` for every action that failed.
    pub failed: Vec<(usize, String)>,
    pub undo_steps: usize,
}

/// Read a JSON array of actions.
pub async fn load_actions(path: &Path) -> Result<Vec<Action>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

/// Apply `actions` in order to a surface restored from `surface` and the
/// source tree under `root`. Stops at the first failure unless `keep_going`.
pub async fn replay(
    config: EngineConfig,
    surface: &Path,
    actions: Vec<Action>,
    root: &Path,
    keep_going: bool,
) -> Result<(ReplayReport, SurfaceSnapshot)> {
    let surface = Arc::new(
        MemorySurface::load(surface)
            .await
            .with_context(|| format!("loading surface {}", surface.display()))?,
    );
    let session = Arc::new(EditorSession::new(
        config,
        Arc::new(LocalSourceFiles::new(root)),
    ));
    let indexed = session.source().rebuild_index().await?;
    info!(root = %root.display(), nodes = indexed, "source indexed");
    session.add_surface(surface.clone());

    let runner = ActionRunner::new(session.clone());
    let mut report = ReplayReport::default();
    for (n, action) in actions.into_iter().enumerate() {
        match runner.run(action).await {
            Ok(_) => report.applied += 1,
            Err(e) if keep_going => {
                warn!(position = n, error = %e, "action failed, continuing");
                report.failed.push((n, e.to_string()));
            }
            Err(e) => return Err(e).with_context(|| format!("action {n} failed")),
        }
    }
    report.undo_steps = session.history().undo_len();
    Ok((report, surface.snapshot()?))
}

/// Run `patch` against `file` through the diff applier. With `dry_run` the
/// file is left alone and the result is only returned.
pub async fn apply_diff(file: &Path, patch: &Path, dry_run: bool) -> Result<String> {
    let proposed = tokio::fs::read_to_string(patch)
        .await
        .with_context(|| format!("reading {}", patch.display()))?;
    let name = file
        .file_name()
        .with_context(|| format!("{} is not a file", file.display()))?
        .to_string_lossy()
        .into_owned();

    if dry_run {
        let current = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        return Ok(DiffApplier::new().apply(&name, &current, &proposed)?);
    }

    let root = match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let sync = SourceSync::new(Arc::new(LocalSourceFiles::new(root)));
    Ok(sync.apply_patch(&name, &proposed).await?)
}
