//! Depth-first export of the guide → section → page hierarchy.
//!
//! One query or write is in flight at a time, so the order of writes (and
//! every generated navigation block) is fully determined by the store's
//! contents.

use tracing::{debug, info};

use crate::config::{ExportConfig, NavigationConfig};
use crate::content::sort_by_order;
use crate::convert::{ConvertError, MarkupConverter};
use crate::navigation::{guide_navigation, root_navigation};
use crate::sink::{OutputDir, SinkError};
use crate::store::{ContentStore, StoreError};
use crate::template::{GuideIndex, RootIndex, TemplateError, TemplateRenderer};
use crate::tree::{ContentTree, GuideIdx, INDEX_STEM, SectionIdx, TreeError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to convert {path}")]
    Convert {
        path: String,
        #[source]
        source: ConvertError,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Counts of what a finished export wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub guides: usize,
    pub sections: usize,
    pub pages: usize,
    pub files: usize,
}

impl ExportSummary {
    fn from_tree(tree: &ContentTree) -> Self {
        let guides = tree.guide_count();
        let sections = tree.section_count();
        let pages = tree.page_count();
        Self {
            guides,
            sections,
            pages,
            // one index per guide and section, one file per page, plus the root index
            files: guides + sections + pages + 1,
        }
    }
}

pub struct Exporter<'a, S, C> {
    store: &'a S,
    converter: &'a C,
    output: OutputDir,
    extension: String,
    clean: bool,
    navigation: NavigationConfig,
    templates: TemplateRenderer,
}

impl<'a, S: ContentStore, C: MarkupConverter> Exporter<'a, S, C> {
    pub fn new(store: &'a S, converter: &'a C, config: &ExportConfig) -> Result<Self, ExportError> {
        let templates = TemplateRenderer::new(config.templates.as_deref())?;
        Ok(Self {
            store,
            converter,
            output: OutputDir::new(&config.output.root),
            extension: config.output.extension.trim_start_matches('.').to_string(),
            clean: config.output.clean,
            navigation: config.navigation.clone(),
            templates,
        })
    }

    pub async fn run(&self) -> Result<ExportSummary, ExportError> {
        info!(root = %self.output.root().display(), "starting export");
        self.output.prepare(self.clean).await?;

        let mut tree = ContentTree::new();
        for guide in self.store.guides().await? {
            let idx = tree.add_guide(guide)?;
            self.export_guide(&mut tree, idx).await?;
        }

        let index = RootIndex::new(
            &self.navigation.root_title,
            &self.navigation.caption,
            self.navigation.max_depth,
            root_navigation(&tree),
        );
        let rst = self.templates.render_root_index(&index)?;
        self.output.write(&self.file_name("", INDEX_STEM), &rst).await?;

        let summary = ExportSummary::from_tree(&tree);
        info!(
            guides = summary.guides,
            sections = summary.sections,
            pages = summary.pages,
            files = summary.files,
            "export finished"
        );
        Ok(summary)
    }

    async fn export_guide(&self, tree: &mut ContentTree, guide: GuideIdx) -> Result<(), ExportError> {
        let node = tree.guide(guide);
        let id = node.record.id.clone();
        let path = node.path().to_string();
        info!(guide = %path, title = %node.record.title, "exporting guide");
        self.output.create_dir(&path).await?;

        let mut sections = self.store.sections(&id).await?;
        sort_by_order(&mut sections);
        for section in sections {
            let idx = tree.add_section(guide, section);
            self.export_section(tree, idx).await?;
        }

        let node = tree.guide(guide);
        let file = self.file_name(&path, INDEX_STEM);
        let header = self
            .convert(&file, &node.record.title, &node.record.description)
            .await?;
        let index = GuideIndex {
            header: header.trim_end(),
            caption: &self.navigation.caption,
            max_depth: self.navigation.max_depth,
            sections: guide_navigation(tree, guide),
        };
        let rst = self.templates.render_guide_index(&index)?;
        self.output.write(&file, &rst).await?;
        Ok(())
    }

    async fn export_section(&self, tree: &mut ContentTree, section: SectionIdx) -> Result<(), ExportError> {
        let node = tree.section(section);
        let id = node.record.id.clone();
        let path = node.path.clone();
        debug!(section = %path, "exporting section");
        self.output.create_dir(&path).await?;

        let mut pages = self.store.pages(&id).await?;
        sort_by_order(&mut pages);
        for page in pages {
            let idx = tree.add_page(section, page);
            let node = tree.page(idx);
            let file = self.file_name(&path, &node.slug);
            let rst = self
                .convert(&file, &node.record.title, &node.record.content)
                .await?;
            self.output.write(&file, &rst).await?;
        }

        let node = tree.section(section);
        let file = self.file_name(&path, INDEX_STEM);
        let rst = self
            .convert(&file, &node.record.title, &node.record.description)
            .await?;
        self.output.write(&file, &rst).await?;
        Ok(())
    }

    async fn convert(&self, file: &str, title: &str, body: &str) -> Result<String, ExportError> {
        self.converter
            .convert(&titled_document(title, body))
            .await
            .map_err(|source| ExportError::Convert {
                path: file.to_string(),
                source,
            })
    }

    fn file_name(&self, dir: &str, stem: &str) -> String {
        if dir.is_empty() {
            format!("{stem}.{}", self.extension)
        } else {
            format!("{dir}/{stem}.{}", self.extension)
        }
    }
}

/// Markdown document with `title` as its top-level heading.
pub fn titled_document(title: &str, body: &str) -> String {
    format!("# {title}\n\n{body}")
}
