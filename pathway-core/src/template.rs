use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use crate::navigation::{NavItem, NavSection};

pub const GUIDE_INDEX: &str = "guide_index.rst";
pub const ROOT_INDEX: &str = "root_index.rst";

const GUIDE_INDEX_TEMPLATE: &str = "{{ header }}

.. toctree::
  :maxdepth: {{ max_depth }}
  :caption: {{ caption }}

{% for section in sections %}  {{ section.text }}<{{ section.link }}>
{% for page in section.pages %}    {{ page.text }}<{{ page.link }}>
{% endfor %}{% endfor %}";

const ROOT_INDEX_TEMPLATE: &str = "{{ title }}
{{ underline }}

.. toctree::
  :maxdepth: {{ max_depth }}
  :caption: {{ caption }}

{% for guide in guides %}  {{ guide.text }}<{{ guide.link }}>
{% endfor %}";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template error")]
    Tera(#[from] tera::Error),
    #[error("failed to read template {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Context for a guide's `index` file.
#[derive(Debug, Serialize)]
pub struct GuideIndex<'a> {
    /// Converted title and description of the guide
    pub header: &'a str,
    pub caption: &'a str,
    pub max_depth: u32,
    pub sections: Vec<NavSection>,
}

/// Context for the root `index` file.
#[derive(Debug, Serialize)]
pub struct RootIndex<'a> {
    pub title: &'a str,
    pub underline: String,
    pub caption: &'a str,
    pub max_depth: u32,
    pub guides: Vec<NavItem>,
}

impl<'a> RootIndex<'a> {
    pub fn new(title: &'a str, caption: &'a str, max_depth: u32, guides: Vec<NavItem>) -> Self {
        Self {
            title,
            underline: "=".repeat(title.chars().count()),
            caption,
            max_depth,
            guides,
        }
    }
}

pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Load the built-in navigation templates.
    ///
    /// When `overrides` is set, `guide_index.rst` and `root_index.rst` found in
    /// that directory replace the built-in ones.
    pub fn new(overrides: Option<&Path>) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (GUIDE_INDEX, GUIDE_INDEX_TEMPLATE),
            (ROOT_INDEX, ROOT_INDEX_TEMPLATE),
        ])?;

        if let Some(dir) = overrides {
            for name in [GUIDE_INDEX, ROOT_INDEX] {
                let path = dir.join(name);
                if !path.is_file() {
                    continue;
                }
                let source = std::fs::read_to_string(&path)
                    .map_err(|source| TemplateError::Io { path: path.clone(), source })?;
                tera.add_raw_template(name, &source)?;
                tracing::debug!(template = name, path = %path.display(), "using template override");
            }
        }

        Ok(Self { tera })
    }

    /// Render a template with a serializable context
    pub fn render<T: Serialize>(&self, template: &str, context: &T) -> Result<String, TemplateError> {
        let context = Context::from_serialize(context)?;
        Ok(self.tera.render(template, &context)?)
    }

    pub fn render_guide_index(&self, index: &GuideIndex<'_>) -> Result<String, TemplateError> {
        self.render(GUIDE_INDEX, index)
    }

    pub fn render_root_index(&self, index: &RootIndex<'_>) -> Result<String, TemplateError> {
        self.render(ROOT_INDEX, index)
    }
}
