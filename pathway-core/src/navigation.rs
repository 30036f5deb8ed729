use serde::Serialize;

use crate::tree::{ContentTree, GuideIdx, INDEX_STEM};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavItem {
    pub text: String,
    pub link: String,
}

/// A section entry followed by its pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavSection {
    pub text: String,
    pub link: String,
    pub pages: Vec<NavItem>,
}

/// Navigation for a guide index, links relative to the guide directory.
pub fn guide_navigation(tree: &ContentTree, guide: GuideIdx) -> Vec<NavSection> {
    tree.guide(guide)
        .sections
        .iter()
        .map(|&idx| {
            let section = tree.section(idx);
            NavSection {
                text: section.record.title.clone(),
                link: format!("{}/{INDEX_STEM}", section.slug),
                pages: tree
                    .pages_of(idx)
                    .map(|page| NavItem {
                        text: page.record.title.clone(),
                        link: format!("{}/{}", section.slug, page.slug),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Navigation for the root index, one entry per guide.
pub fn root_navigation(tree: &ContentTree) -> Vec<NavItem> {
    tree.guides()
        .map(|guide| NavItem {
            text: guide.record.title.clone(),
            link: format!("{}/{INDEX_STEM}", guide.slug),
        })
        .collect()
}
