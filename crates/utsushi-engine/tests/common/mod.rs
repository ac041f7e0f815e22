//! Shared fixture: one page in source, the same page rendered on a memory
//! surface, and an editor over both.

#![allow(dead_code)]

use std::sync::Arc;

use utsushi_engine::{EditorSession, Editor, EngineConfig, Selection};
use utsushi_source::{MemorySourceFiles, SourceFiles};
use utsushi_surface::{MemorySurface, RenderSurface};
use utsushi_types::{ActionElement, ActionTarget, DomId, FrameId, LiveElement, Oid, attrs};

pub const PATH: &str = "app/page.tsx";

pub const PAGE: &str = r#"export default function Page() {
    return (
        <main data-oid="main" className="flex flex-col">
            <div data-oid="a">A</div>
            <div data-oid="b">B</div>
            <div data-oid="c">C</div>
            <div data-oid="d">D</div>
            <div data-oid="e">E</div>
        </main>
    );
}
"#;

pub fn frame() -> FrameId {
    FrameId::from("f1")
}

pub fn node(dom: &str, oid: &str, tag: &str) -> ActionElement {
    ActionElement {
        dom_id: DomId::from(dom),
        oid: Oid::from(oid),
        ..ActionElement::new(tag)
    }
    .with_attribute(attrs::DATA_ONLOOK_DOM_ID, dom)
    .with_attribute(attrs::DATA_ONLOOK_ID, oid)
}

/// `main` holding five 40px rows `a`..`e`.
pub fn rendered_page() -> ActionElement {
    let mut main = node("d-main", "main", "main")
        .with_attribute("class", "flex flex-col")
        .with_style("display", "flex")
        .with_style("flex-direction", "column");
    for name in ["a", "b", "c", "d", "e"] {
        main = main.with_child(
            node(&format!("d-{name}"), name, "div")
                .with_style("height", "40px")
                .with_text(name.to_uppercase()),
        );
    }
    main
}

pub fn target(name: &str) -> ActionTarget {
    ActionTarget::new(frame(), DomId::from(format!("d-{name}")), Some(Oid::from(name)))
}

pub struct Fixture {
    pub editor: Editor,
    pub surface: Arc<MemorySurface>,
    pub files: Arc<MemorySourceFiles>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    pub async fn with_config(config: EngineConfig) -> Self {
        let files = Arc::new(MemorySourceFiles::with_files([(PATH, PAGE)]));
        let surface = Arc::new(MemorySurface::new(frame(), &rendered_page()).unwrap());
        Self::assemble(config, files.clone(), files, surface).await
    }

    /// Same wiring over a different page and its rendering.
    pub async fn with_page(page: &str, rendered: &ActionElement) -> Self {
        let files = Arc::new(MemorySourceFiles::with_files([(PATH, page)]));
        let surface = Arc::new(MemorySurface::new(frame(), rendered).unwrap());
        Self::assemble(EngineConfig::default(), files.clone(), files, surface).await
    }

    /// Build over a custom source backend; `files` stays the inspectable store.
    pub async fn assemble(
        config: EngineConfig,
        backend: Arc<dyn SourceFiles>,
        files: Arc<MemorySourceFiles>,
        surface: Arc<MemorySurface>,
    ) -> Self {
        let session = Arc::new(EditorSession::new(config, backend));
        session.source().rebuild_index().await.unwrap();
        session.add_surface(surface.clone());
        Self {
            editor: Editor::new(session),
            surface,
            files,
        }
    }

    pub fn source(&self) -> String {
        self.files.content(PATH).unwrap()
    }

    pub async fn live(&self, name: &str) -> LiveElement {
        self.surface
            .get_element(&DomId::from(format!("d-{name}")))
            .await
            .unwrap()
    }

    pub async fn select(&self, names: &[&str]) -> Selection {
        let mut elements = Vec::new();
        for name in names {
            elements.push(self.live(name).await);
        }
        Selection::new(elements)
    }

    /// Dom ids of `main`'s children, in order.
    pub async fn order(&self) -> Vec<String> {
        self.surface
            .children(&DomId::from("d-main"))
            .await
            .unwrap()
            .iter()
            .map(DomId::to_string)
            .collect()
    }

    /// Oids of `main`'s direct rows, in source order.
    pub fn source_order(&self) -> Vec<&'static str> {
        let text = self.source();
        let mut found: Vec<(usize, &'static str)> = ["a", "b", "c", "d", "e"]
            .into_iter()
            .filter_map(|oid| text.find(&format!("data-oid=\"{oid}\"")).map(|at| (at, oid)))
            .collect();
        found.sort();
        found.into_iter().map(|(_, oid)| oid).collect()
    }
}
