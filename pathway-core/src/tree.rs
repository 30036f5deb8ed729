//! In-memory guide → section → page hierarchy built during an export.
//!
//! Records fetched from the store stay immutable. Derived data (slugs and
//! output paths) lives in the arena nodes, which link to each other by index.

use tracing::warn;

use crate::content::{Guide, Page, RecordId, Section};
use crate::slug::slugify;

/// File stem of the index document every guide and section directory gets.
pub const INDEX_STEM: &str = "index";

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("guide {guide} has slug {slug:?}, which is not a single path component")]
    InvalidSlug { guide: RecordId, slug: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuideIdx(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionIdx(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageIdx(usize);

#[derive(Debug)]
pub struct GuideNode {
    pub record: Guide,
    pub slug: String,
    pub sections: Vec<SectionIdx>,
}

impl GuideNode {
    /// Directory of the guide relative to the output root.
    pub fn path(&self) -> &str {
        &self.slug
    }
}

#[derive(Debug)]
pub struct SectionNode {
    pub record: Section,
    pub guide: GuideIdx,
    pub slug: String,
    /// Directory of the section relative to the output root.
    pub path: String,
    pub pages: Vec<PageIdx>,
}

#[derive(Debug)]
pub struct PageNode {
    pub record: Page,
    pub section: SectionIdx,
    pub slug: String,
    /// Output path relative to the output root, without extension.
    pub path: String,
}

#[derive(Debug, Default)]
pub struct ContentTree {
    guides: Vec<GuideNode>,
    sections: Vec<SectionNode>,
    pages: Vec<PageNode>,
}

impl ContentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a guide named by its stored slug.
    ///
    /// An empty stored slug falls back to the slugified title. A stored slug
    /// that would escape or nest inside the output root is rejected.
    pub fn add_guide(&mut self, guide: Guide) -> Result<GuideIdx, TreeError> {
        let stored = guide.slug.trim();
        let slug = if stored.is_empty() {
            let derived = title_slug(&guide.title, &guide.id);
            warn!(guide = %guide.id, slug = %derived, "guide has no stored slug, deriving one from its title");
            derived
        } else if is_path_component(stored) {
            stored.to_string()
        } else {
            return Err(TreeError::InvalidSlug {
                guide: guide.id.clone(),
                slug: guide.slug.clone(),
            });
        };

        if self.guides.iter().any(|g| g.slug == slug) {
            warn!(guide = %guide.id, %slug, "another guide already uses this slug, its files will be overwritten");
        }

        let idx = GuideIdx(self.guides.len());
        self.guides.push(GuideNode {
            record: guide,
            slug,
            sections: Vec::new(),
        });
        Ok(idx)
    }

    pub fn add_section(&mut self, guide: GuideIdx, section: Section) -> SectionIdx {
        let slug = title_slug(&section.title, &section.id);
        let parent = &self.guides[guide.0];
        if parent
            .sections
            .iter()
            .any(|s| self.sections[s.0].slug == slug)
        {
            warn!(section = %section.id, %slug, guide = %parent.slug, "duplicate section slug");
        }
        let path = format!("{}/{}", parent.path(), slug);

        let idx = SectionIdx(self.sections.len());
        self.sections.push(SectionNode {
            record: section,
            guide,
            slug,
            path,
            pages: Vec::new(),
        });
        self.guides[guide.0].sections.push(idx);
        idx
    }

    /// Add a page to a section.
    ///
    /// A page may not take the section's own `index` file, so that slug gets
    /// the first free numeric suffix instead.
    pub fn add_page(&mut self, section: SectionIdx, page: Page) -> PageIdx {
        let parent = &self.sections[section.0];
        let taken = |slug: &str| parent.pages.iter().any(|p| self.pages[p.0].slug == slug);

        let mut slug = title_slug(&page.title, &page.id);
        if slug == INDEX_STEM {
            slug = (1..)
                .map(|n| format!("{INDEX_STEM}-{n}"))
                .find(|candidate| !taken(candidate))
                .unwrap_or_default();
            warn!(page = %page.id, %slug, section = %parent.path, "page slug clashes with the section index, renamed");
        } else if taken(&slug) {
            warn!(page = %page.id, %slug, section = %parent.path, "duplicate page slug");
        }
        let path = format!("{}/{}", parent.path, slug);

        let idx = PageIdx(self.pages.len());
        self.pages.push(PageNode {
            record: page,
            section,
            slug,
            path,
        });
        self.sections[section.0].pages.push(idx);
        idx
    }

    pub fn guide(&self, idx: GuideIdx) -> &GuideNode {
        &self.guides[idx.0]
    }

    pub fn section(&self, idx: SectionIdx) -> &SectionNode {
        &self.sections[idx.0]
    }

    pub fn page(&self, idx: PageIdx) -> &PageNode {
        &self.pages[idx.0]
    }

    /// Guides in insertion order.
    pub fn guides(&self) -> impl Iterator<Item = &GuideNode> {
        self.guides.iter()
    }

    pub fn sections_of(&self, guide: GuideIdx) -> impl Iterator<Item = &SectionNode> {
        self.guides[guide.0]
            .sections
            .iter()
            .map(|idx| &self.sections[idx.0])
    }

    pub fn pages_of(&self, section: SectionIdx) -> impl Iterator<Item = &PageNode> {
        self.sections[section.0]
            .pages
            .iter()
            .map(|idx| &self.pages[idx.0])
    }

    pub fn guide_count(&self) -> usize {
        self.guides.len()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// Titles that slugify to nothing fall back to the record identity.
fn title_slug(title: &str, id: &RecordId) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        slugify(id.as_str())
    } else {
        slug
    }
}

fn is_path_component(slug: &str) -> bool {
    slug != "." && slug != ".." && !slug.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guide(id: &str, slug: &str) -> Guide {
        Guide {
            id: id.into(),
            title: "My Guide".into(),
            description: String::new(),
            slug: slug.into(),
        }
    }

    fn section(id: &str, title: &str) -> Section {
        Section {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            order: None,
            guide: "g".into(),
        }
    }

    fn page(id: &str, title: &str) -> Page {
        Page {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            order: None,
            section: "s".into(),
        }
    }

    #[test]
    fn test_paths_follow_hierarchy() {
        let mut tree = ContentTree::new();
        let g = tree.add_guide(guide("g", "intro")).unwrap();
        let s = tree.add_section(g, section("s", "The Basics"));
        let p = tree.add_page(s, page("p", "First Steps"));

        assert_eq!(tree.guide(g).path(), "intro");
        assert_eq!(tree.section(s).path, "intro/the-basics");
        assert_eq!(tree.page(p).path, "intro/the-basics/first-steps");
        assert_eq!(tree.page(p).section, s);
        assert_eq!(tree.section(s).guide, g);
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = ContentTree::new();
        let g = tree.add_guide(guide("g", "intro")).unwrap();
        let s = tree.add_section(g, section("s", "Basics"));
        tree.add_page(s, page("p2", "Zeta"));
        tree.add_page(s, page("p1", "Alpha"));

        let slugs: Vec<_> = tree.pages_of(s).map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["zeta", "alpha"]);
        assert_eq!(tree.sections_of(g).count(), 1);
        assert_eq!(tree.page_count(), 2);
    }

    #[test]
    fn test_stored_slug_used_verbatim() {
        let mut tree = ContentTree::new();
        let g = tree.add_guide(guide("g", "Mixed_Case")).unwrap();
        assert_eq!(tree.guide(g).slug, "Mixed_Case");
    }

    #[test]
    fn test_empty_stored_slug_falls_back_to_title() {
        let mut tree = ContentTree::new();
        let g = tree.add_guide(guide("g", "  ")).unwrap();
        assert_eq!(tree.guide(g).slug, "my-guide");
    }

    #[test]
    fn test_invalid_stored_slug_rejected() {
        let mut tree = ContentTree::new();
        for bad in ["..", ".", "a/b", "a\\b"] {
            let err = tree.add_guide(guide("g", bad)).unwrap_err();
            assert!(matches!(err, TreeError::InvalidSlug { .. }), "{bad}");
        }
        assert_eq!(tree.guide_count(), 0);
    }

    #[test]
    fn test_page_cannot_take_section_index() {
        let mut tree = ContentTree::new();
        let g = tree.add_guide(guide("g", "intro")).unwrap();
        let s = tree.add_section(g, section("s", "Basics"));
        let first = tree.add_page(s, page("p1", "Index"));
        let second = tree.add_page(s, page("p2", "INDEX"));

        assert_eq!(tree.page(first).slug, "index-1");
        assert_eq!(tree.page(first).path, "intro/basics/index-1");
        assert_eq!(tree.page(second).slug, "index-2");
    }

    #[test]
    fn test_untitled_node_uses_identity() {
        let mut tree = ContentTree::new();
        let g = tree.add_guide(guide("g", "intro")).unwrap();
        let s = tree.add_section(g, section("5f2b9c", "???"));
        assert_eq!(tree.section(s).slug, "5f2b9c");
    }
}
