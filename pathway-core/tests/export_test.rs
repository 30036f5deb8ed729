use std::collections::BTreeMap;
use std::path::Path;

use pathway_core::config::ExportConfig;
use pathway_core::{
    ConvertError, ExportError, Exporter, Guide, MarkupConverter, MemoryStore, Page, RstConverter,
    Section,
};
use pretty_assertions::assert_eq;
use walkdir::WalkDir;

/// Returns the markdown untouched so tests can assert on exact input.
struct Echo;

impl MarkupConverter for Echo {
    async fn convert(&self, markdown: &str) -> Result<String, ConvertError> {
        Ok(markdown.to_string())
    }
}

/// Fails on any document mentioning "boom".
struct Fragile;

impl MarkupConverter for Fragile {
    async fn convert(&self, markdown: &str) -> Result<String, ConvertError> {
        if markdown.contains("boom") {
            return Err(ConvertError::Spawn {
                program: "fragile".to_string(),
                source: std::io::Error::other("boom"),
            });
        }
        Ok(markdown.to_string())
    }
}

fn guide(id: &str, title: &str, slug: &str) -> Guide {
    Guide {
        id: id.into(),
        title: title.to_string(),
        description: format!("{title} description"),
        slug: slug.to_string(),
    }
}

fn section(id: &str, guide: &str, title: &str, order: f64) -> Section {
    Section {
        id: id.into(),
        title: title.to_string(),
        description: format!("About {title}"),
        order: Some(order),
        guide: guide.into(),
    }
}

fn page(id: &str, section: &str, title: &str, order: f64) -> Page {
    Page {
        id: id.into(),
        title: title.to_string(),
        content: format!("{title} body"),
        order: Some(order),
        section: section.into(),
    }
}

fn config(root: &Path) -> ExportConfig {
    let mut config = ExportConfig::default();
    config.output.root = root.to_path_buf();
    config
}

/// Every file under `root`, keyed by its `/`-separated relative path.
fn snapshot(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            (relative, std::fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

fn intro_store() -> MemoryStore {
    MemoryStore::new()
        .add_guide(Guide {
            id: "g1".into(),
            title: "Intro".to_string(),
            description: "D".to_string(),
            slug: "intro".to_string(),
        })
        .add_section(Section {
            id: "s1".into(),
            title: "Basics".to_string(),
            description: String::new(),
            order: Some(0.0),
            guide: "g1".into(),
        })
        .add_page(Page {
            id: "p1".into(),
            title: "Start".to_string(),
            content: "Hi".to_string(),
            order: Some(0.0),
            section: "s1".into(),
        })
}

#[tokio::test]
async fn test_single_guide_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let store = intro_store();
    let config = config(tmp.path());

    let summary = Exporter::new(&store, &RstConverter, &config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.guides, 1);
    assert_eq!(summary.sections, 1);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.files, 4);

    let files = snapshot(tmp.path());
    let names: Vec<_> = files.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        ["index.rst", "intro/basics/index.rst", "intro/basics/start.rst", "intro/index.rst"]
    );

    let expected_page = RstConverter.convert("# Start\n\nHi").await.unwrap();
    assert_eq!(files["intro/basics/start.rst"], expected_page);
    assert_eq!(files["intro/basics/start.rst"], "Start\n=====\n\nHi\n");
    assert_eq!(files["intro/basics/index.rst"], "Basics\n======\n");

    assert_eq!(
        files["intro/index.rst"],
        "Intro\n=====\n\nD\n\n.. toctree::\n  :maxdepth: 2\n  :caption: Contents:\n\n  Basics<basics/index>\n    Start<basics/start>\n"
    );
    assert_eq!(
        files["index.rst"],
        "Learning Path\n=============\n\n.. toctree::\n  :maxdepth: 2\n  :caption: Contents:\n\n  Intro<intro/index>\n"
    );
}

#[tokio::test]
async fn test_guide_without_sections_has_empty_navigation() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MemoryStore::new().add_guide(guide("g1", "Lonely", "lonely"));

    Exporter::new(&store, &Echo, &config(tmp.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    let files = snapshot(tmp.path());
    assert_eq!(
        files["lonely/index.rst"],
        "# Lonely\n\nLonely description\n\n.. toctree::\n  :maxdepth: 2\n  :caption: Contents:\n\n"
    );
}

#[tokio::test]
async fn test_navigation_follows_order_with_stable_ties() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MemoryStore::new()
        .add_guide(guide("g1", "Guide", "guide"))
        .add_section(section("s2", "g1", "Second", 2.0))
        .add_section(section("s1", "g1", "First", 1.0))
        .add_page(page("p3", "s1", "Three", 3.0))
        .add_page(page("tie-a", "s1", "Tie A", 1.0))
        .add_page(page("p0", "s1", "Zero", 0.0))
        .add_page(page("tie-b", "s1", "Tie B", 1.0))
        .add_page(page("q1", "s2", "Only", 7.0));

    Exporter::new(&store, &Echo, &config(tmp.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    let files = snapshot(tmp.path());
    let nav: Vec<&str> = files["guide/index.rst"]
        .lines()
        .skip_while(|line| !line.starts_with(".. toctree::"))
        .filter(|line| line.contains('<'))
        .collect();
    assert_eq!(
        nav,
        [
            "  First<first/index>",
            "    Zero<first/zero>",
            "    Tie A<first/tie-a>",
            "    Tie B<first/tie-b>",
            "    Three<first/three>",
            "  Second<second/index>",
            "    Only<second/only>",
        ]
    );
}

#[tokio::test]
async fn test_root_index_lists_each_guide_once_in_store_order() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MemoryStore::new()
        .add_guide(guide("g2", "Zebra", "zebra"))
        .add_guide(guide("g1", "Apple", "apple"))
        .add_guide(guide("g3", "Mango", "mango"));

    Exporter::new(&store, &Echo, &config(tmp.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    let root = &snapshot(tmp.path())["index.rst"];
    let entries: Vec<&str> = root.lines().filter(|l| l.contains("/index>")).collect();
    assert_eq!(
        entries,
        ["  Zebra<zebra/index>", "  Apple<apple/index>", "  Mango<mango/index>"]
    );
}

#[tokio::test]
async fn test_orphans_are_skipped_silently() {
    let tmp = tempfile::tempdir().unwrap();
    let store = intro_store()
        .add_section(section("orphan-section", "no-such-guide", "Orphan Section", 0.0))
        .add_page(page("orphan-page", "no-such-section", "Orphan Page", 0.0))
        .add_page(page("stranded", "orphan-section", "Stranded", 0.0));

    let summary = Exporter::new(&store, &Echo, &config(tmp.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.sections, 1);
    assert_eq!(summary.pages, 1);
    let files = snapshot(tmp.path());
    assert_eq!(files.len(), 4);
    assert!(files.values().all(|content| !content.contains("Orphan") && !content.contains("Stranded")));
}

#[tokio::test]
async fn test_rerun_overwrites_deterministically() {
    let tmp = tempfile::tempdir().unwrap();
    let store = intro_store()
        .add_guide(guide("g2", "Advanced", "advanced"))
        .add_section(section("s9", "g2", "Deep Dive", 0.0))
        .add_page(page("p9", "s9", "Internals", 0.0));
    let config = config(tmp.path());
    let exporter = Exporter::new(&store, &RstConverter, &config).unwrap();

    exporter.run().await.unwrap();
    let first = snapshot(tmp.path());

    exporter.run().await.unwrap();
    let second = snapshot(tmp.path());

    assert_eq!(first, second);
    assert_eq!(first.len(), 7);
}

#[tokio::test]
async fn test_clean_drops_stale_output() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("old-guide")).unwrap();
    std::fs::write(tmp.path().join("old-guide/index.rst"), "stale").unwrap();

    let mut config = config(tmp.path());
    config.output.clean = true;
    Exporter::new(&intro_store(), &Echo, &config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(!tmp.path().join("old-guide").exists());
    assert!(tmp.path().join("intro/basics/start.rst").exists());
}

#[tokio::test]
async fn test_custom_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config(tmp.path());
    config.output.extension = ".txt".to_string();

    Exporter::new(&intro_store(), &Echo, &config)
        .unwrap()
        .run()
        .await
        .unwrap();

    let files = snapshot(tmp.path());
    assert!(files.contains_key("intro/basics/start.txt"));
    assert!(files.contains_key("index.txt"));
}

#[tokio::test]
async fn test_invalid_guide_slug_aborts() {
    let tmp = tempfile::tempdir().unwrap();
    let store = intro_store().add_guide(guide("g2", "Escape", "../outside"));

    let err = Exporter::new(&store, &Echo, &config(tmp.path()))
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Tree(_)));
    // the first guide was already written and stays behind
    assert!(tmp.path().join("intro/index.rst").exists());
    assert!(!tmp.path().join("index.rst").exists());
}

#[tokio::test]
async fn test_converter_failure_aborts_run() {
    let tmp = tempfile::tempdir().unwrap();
    let store = intro_store()
        .add_page(Page {
            id: "p2".into(),
            title: "Broken".to_string(),
            content: "boom".to_string(),
            order: Some(1.0),
            section: "s1".into(),
        });

    let err = Exporter::new(&store, &Fragile, &config(tmp.path()))
        .unwrap()
        .run()
        .await
        .unwrap_err();

    match err {
        ExportError::Convert { path, .. } => assert_eq!(path, "intro/basics/broken.rst"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(tmp.path().join("intro/basics/start.rst").exists());
    assert!(!tmp.path().join("intro/basics/index.rst").exists());
}

#[tokio::test]
async fn test_page_titled_index_keeps_its_body() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MemoryStore::new()
        .add_guide(guide("g1", "Guide", "guide"))
        .add_section(section("s1", "g1", "Sec", 0.0))
        .add_page(Page {
            id: "p1".into(),
            title: "Index".to_string(),
            content: "PAGE BODY".to_string(),
            order: Some(0.0),
            section: "s1".into(),
        });

    Exporter::new(&store, &Echo, &config(tmp.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    let files = snapshot(tmp.path());
    assert_eq!(files["guide/sec/index.rst"], "# Sec\n\nAbout Sec");
    assert_eq!(files["guide/sec/index-1.rst"], "# Index\n\nPAGE BODY");
    let nav: Vec<&str> = files["guide/index.rst"]
        .lines()
        .filter(|line| line.contains('<'))
        .collect();
    assert_eq!(nav, ["  Sec<sec/index>", "    Index<sec/index-1>"]);
}
