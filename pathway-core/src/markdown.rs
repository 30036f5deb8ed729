use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

/// Title underline characters, indexed by heading level.
const ADORNMENTS: [char; 6] = ['=', '-', '~', '^', '"', '\''];

const INDENT: &str = "   ";

#[derive(Debug, Clone, PartialEq)]
pub enum PageElement {
    Heading { level: u32, content: Vec<InlineElement> },
    Paragraph { content: Vec<InlineElement> },
    CodeBlock { language: Option<String>, content: String },
    List { items: Vec<ListItem>, start: Option<u64> },
    BlockQuote { content: Vec<PageElement> },
    Table { headers: Vec<Vec<InlineElement>>, rows: Vec<Vec<Vec<InlineElement>>> },
    HorizontalRule,
    Html { content: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineElement {
    Text(String),
    Link { text: String, url: String },
    Image { alt: String, url: String, title: Option<String> },
    Emphasis { level: u8, content: Vec<InlineElement> }, // 1=italic, 2=bold
    Code(String),
    SoftBreak,
    HardBreak,
    Strikethrough { content: Vec<InlineElement> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub content: Vec<PageElement>,
    pub checked: Option<bool>, // For task lists
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Convert a markdown document to reStructuredText.
pub fn markdown_to_rst(markdown: &str) -> String {
    render_elements_to_rst(&parse_elements(markdown))
}

pub fn parse_elements(markdown: &str) -> Vec<PageElement> {
    let mut elements = Vec::new();
    let mut stack: Vec<ElementBuilder> = Vec::new();

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(tag) => {
                stack.push(ElementBuilder::from_tag(tag));
            }
            Event::End(_) => {
                if let Some(builder) = stack.pop() {
                    close_builder(builder, &mut stack, &mut elements);
                }
            }
            Event::Text(text) => {
                if let Some(builder) = stack.last_mut() {
                    if builder.collects_raw_text() {
                        builder.raw.push_str(&text);
                    } else {
                        builder.add_inline(InlineElement::Text(text.to_string()));
                    }
                }
            }
            Event::Code(code) => {
                if let Some(builder) = stack.last_mut() {
                    builder.add_inline(InlineElement::Code(code.to_string()));
                }
            }
            Event::SoftBreak => {
                if let Some(builder) = stack.last_mut() {
                    builder.add_inline(InlineElement::SoftBreak);
                }
            }
            Event::HardBreak => {
                if let Some(builder) = stack.last_mut() {
                    builder.add_inline(InlineElement::HardBreak);
                }
            }
            Event::Html(html) => {
                if let Some(builder) = stack.last_mut().filter(|b| b.collects_raw_text()) {
                    builder.raw.push_str(&html);
                } else {
                    push_block(PageElement::Html { content: html.to_string() }, &mut stack, &mut elements);
                }
            }
            Event::InlineHtml(html) => {
                if let Some(builder) = stack.last_mut() {
                    builder.add_inline(InlineElement::Text(html.to_string()));
                }
            }
            Event::Rule => {
                push_block(PageElement::HorizontalRule, &mut stack, &mut elements);
            }
            Event::TaskListMarker(checked) => {
                if let Some(item) = stack
                    .iter_mut()
                    .rev()
                    .find(|b| matches!(b.kind, BuilderKind::ListItem))
                {
                    item.checked = Some(checked);
                }
            }
            _ => {}
        }
    }

    elements
}

fn push_block(element: PageElement, stack: &mut [ElementBuilder], elements: &mut Vec<PageElement>) {
    match stack.last_mut() {
        Some(parent) => parent.add_child(element),
        None => elements.push(element),
    }
}

fn close_builder(
    mut builder: ElementBuilder,
    stack: &mut [ElementBuilder],
    elements: &mut Vec<PageElement>,
) {
    match builder.kind {
        BuilderKind::Emphasis(_)
        | BuilderKind::Strikethrough
        | BuilderKind::Link(_)
        | BuilderKind::Image(_, _) => {
            if let Some(parent) = stack.last_mut() {
                let inline = builder.into_inline();
                parent.add_inline(inline);
            }
        }
        BuilderKind::TableCell => {
            if let Some(parent) = stack.last_mut() {
                parent.table_data.current_row.push(builder.inline_content);
            }
        }
        BuilderKind::TableHead => {
            if let Some(parent) = stack.last_mut() {
                parent.table_data.headers = builder.table_data.current_row;
            }
        }
        BuilderKind::TableRow => {
            if let Some(parent) = stack.last_mut() {
                parent.table_data.rows.push(builder.table_data.current_row);
            }
        }
        BuilderKind::ListItem => {
            builder.flush_inline();
            if let Some(parent) = stack.last_mut() {
                parent.list_items.push(ListItem {
                    content: builder.block_content,
                    checked: builder.checked,
                });
            }
        }
        _ => {
            if let Some(element) = builder.build() {
                push_block(element, stack, elements);
            }
        }
    }
}

#[derive(Debug)]
struct ElementBuilder {
    kind: BuilderKind,
    inline_content: Vec<InlineElement>,
    block_content: Vec<PageElement>,
    list_items: Vec<ListItem>,
    table_data: TableBuilder,
    raw: String,
    checked: Option<bool>,
}

#[derive(Debug)]
enum BuilderKind {
    Heading(u32),
    Paragraph,
    CodeBlock(Option<String>),
    HtmlBlock,
    List(Option<u64>), // start number when ordered
    BlockQuote,
    ListItem,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Emphasis(u8),
    Strikethrough,
    Link(String),
    Image(String, Option<String>), // url, title
    Other,
}

#[derive(Debug, Default)]
struct TableBuilder {
    headers: Vec<Vec<InlineElement>>,
    rows: Vec<Vec<Vec<InlineElement>>>,
    current_row: Vec<Vec<InlineElement>>,
}

impl ElementBuilder {
    fn from_tag(tag: Tag) -> Self {
        let kind = match tag {
            Tag::Heading { level, .. } => BuilderKind::Heading(level as u32),
            Tag::Paragraph => BuilderKind::Paragraph,
            Tag::CodeBlock(CodeBlockKind::Fenced(lang)) => {
                let lang = lang.split_whitespace().next().unwrap_or_default();
                BuilderKind::CodeBlock(if lang.is_empty() { None } else { Some(lang.to_string()) })
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => BuilderKind::CodeBlock(None),
            Tag::HtmlBlock => BuilderKind::HtmlBlock,
            Tag::List(start) => BuilderKind::List(start),
            Tag::Item => BuilderKind::ListItem,
            Tag::BlockQuote(_) => BuilderKind::BlockQuote,
            Tag::Table(_) => BuilderKind::Table,
            Tag::TableHead => BuilderKind::TableHead,
            Tag::TableRow => BuilderKind::TableRow,
            Tag::TableCell => BuilderKind::TableCell,
            Tag::Emphasis => BuilderKind::Emphasis(1),
            Tag::Strong => BuilderKind::Emphasis(2),
            Tag::Strikethrough => BuilderKind::Strikethrough,
            Tag::Link { dest_url, .. } => BuilderKind::Link(dest_url.to_string()),
            Tag::Image { dest_url, title, .. } => {
                let title_str = if title.is_empty() { None } else { Some(title.to_string()) };
                BuilderKind::Image(dest_url.to_string(), title_str)
            }
            _ => BuilderKind::Other,
        };

        Self {
            kind,
            inline_content: Vec::new(),
            block_content: Vec::new(),
            list_items: Vec::new(),
            table_data: TableBuilder::default(),
            raw: String::new(),
            checked: None,
        }
    }

    fn collects_raw_text(&self) -> bool {
        matches!(self.kind, BuilderKind::CodeBlock(_) | BuilderKind::HtmlBlock)
    }

    fn add_inline(&mut self, elem: InlineElement) {
        self.inline_content.push(elem);
    }

    fn add_child(&mut self, child: PageElement) {
        match self.kind {
            BuilderKind::ListItem => {
                // Tight list items carry their text inline, ahead of any nested blocks
                self.flush_inline();
                self.block_content.push(child);
            }
            BuilderKind::BlockQuote | BuilderKind::Other => self.block_content.push(child),
            _ => {}
        }
    }

    fn flush_inline(&mut self) {
        if !self.inline_content.is_empty() {
            let content = std::mem::take(&mut self.inline_content);
            self.block_content.push(PageElement::Paragraph { content });
        }
    }

    fn into_inline(self) -> InlineElement {
        match self.kind {
            BuilderKind::Emphasis(level) => InlineElement::Emphasis {
                level,
                content: self.inline_content,
            },
            BuilderKind::Link(url) => InlineElement::Link {
                text: render_inline_elements_text(&self.inline_content),
                url,
            },
            BuilderKind::Image(url, title) => InlineElement::Image {
                alt: render_inline_elements_text(&self.inline_content),
                url,
                title,
            },
            _ => InlineElement::Strikethrough {
                content: self.inline_content,
            },
        }
    }

    fn build(self) -> Option<PageElement> {
        match self.kind {
            BuilderKind::Heading(level) => Some(PageElement::Heading {
                level,
                content: self.inline_content,
            }),
            BuilderKind::Paragraph => {
                if self.inline_content.is_empty() {
                    None
                } else {
                    Some(PageElement::Paragraph {
                        content: self.inline_content,
                    })
                }
            }
            BuilderKind::CodeBlock(language) => Some(PageElement::CodeBlock {
                language,
                content: self.raw,
            }),
            BuilderKind::HtmlBlock => Some(PageElement::Html { content: self.raw }),
            BuilderKind::List(start) => Some(PageElement::List {
                items: self.list_items,
                start,
            }),
            BuilderKind::BlockQuote => Some(PageElement::BlockQuote {
                content: self.block_content,
            }),
            BuilderKind::Table => Some(PageElement::Table {
                headers: self.table_data.headers,
                rows: self.table_data.rows,
            }),
            _ => None,
        }
    }
}

// reStructuredText rendering

pub fn render_elements_to_rst(elements: &[PageElement]) -> String {
    let blocks: Vec<String> = elements
        .iter()
        .map(render_element)
        .filter(|block| !block.is_empty())
        .collect();

    if blocks.is_empty() {
        return String::new();
    }

    let mut rst = blocks.join("\n\n");
    rst.push('\n');
    rst
}

fn render_element(element: &PageElement) -> String {
    match element {
        PageElement::Heading { level, content } => {
            let title = render_inline_elements(content).replace('\n', " ");
            let title = title.trim();
            if title.is_empty() {
                return String::new();
            }
            let index = (*level as usize).clamp(1, ADORNMENTS.len()) - 1;
            let underline = ADORNMENTS[index].to_string().repeat(title.chars().count());
            format!("{title}\n{underline}")
        }
        PageElement::Paragraph { content } => match content.as_slice() {
            [InlineElement::Image { alt, url, title }] => render_image(alt, url, title.as_deref()),
            _ => render_inline_elements(content).trim().to_string(),
        },
        PageElement::CodeBlock { language, content } => {
            let directive = match language {
                Some(lang) => format!(".. code-block:: {lang}"),
                None => "::".to_string(),
            };
            let body = indent(content.trim_end_matches('\n'), INDENT);
            if body.is_empty() {
                directive
            } else {
                format!("{directive}\n\n{body}")
            }
        }
        PageElement::List { items, start } => render_list(items, *start),
        PageElement::BlockQuote { content } => {
            indent(render_elements_to_rst(content).trim_end(), INDENT)
        }
        PageElement::Table { headers, rows } => render_table(headers, rows),
        PageElement::HorizontalRule => "----".to_string(),
        PageElement::Html { content } => {
            let body = indent(content.trim_end(), INDENT);
            format!(".. raw:: html\n\n{body}")
        }
    }
}

pub fn render_inline_elements_text(elements: &[InlineElement]) -> String {
    let mut text = String::new();

    for element in elements {
        match element {
            InlineElement::Text(s) => text.push_str(s),
            InlineElement::Link { text: link_text, .. } => text.push_str(link_text),
            InlineElement::Image { alt, .. } => text.push_str(alt),
            InlineElement::Emphasis { content, .. } => {
                text.push_str(&render_inline_elements_text(content));
            }
            InlineElement::Code(code) => text.push_str(code),
            InlineElement::SoftBreak | InlineElement::HardBreak => text.push(' '),
            InlineElement::Strikethrough { content } => {
                text.push_str(&render_inline_elements_text(content));
            }
        }
    }

    text
}

fn render_inline_elements(elements: &[InlineElement]) -> String {
    let mut rst = String::new();

    for element in elements {
        match element {
            InlineElement::Text(text) => rst.push_str(&escape(text)),
            InlineElement::Link { text, url } => rst.push_str(&render_link(text, url)),
            // Inline images have no RST equivalent without substitutions
            InlineElement::Image { alt, url, .. } => rst.push_str(&render_link(alt, url)),
            InlineElement::Emphasis { level, content } => {
                let inner = render_inline_elements(content);
                let inner = inner.trim();
                if inner.is_empty() {
                    continue;
                }
                match level {
                    1 => rst.push_str(&format!("*{inner}*")),
                    2 => rst.push_str(&format!("**{inner}**")),
                    _ => rst.push_str(inner),
                }
            }
            InlineElement::Code(code) => {
                if !code.is_empty() {
                    rst.push_str(&format!("``{code}``"));
                }
            }
            InlineElement::SoftBreak | InlineElement::HardBreak => rst.push('\n'),
            InlineElement::Strikethrough { content } => {
                rst.push_str(&render_inline_elements(content));
            }
        }
    }

    rst
}

fn render_link(text: &str, url: &str) -> String {
    let text = text.trim();
    if text.is_empty() || text == url {
        return format!("`<{url}>`__");
    }
    let text = text.replace('`', "\\`").replace('<', "\\<");
    format!("`{text} <{url}>`__")
}

fn render_image(alt: &str, url: &str, title: Option<&str>) -> String {
    let mut rst = format!(".. image:: {url}");
    if !alt.is_empty() {
        rst.push_str(&format!("\n   :alt: {alt}"));
    }
    if let Some(title) = title {
        rst.push_str(&format!("\n   :title: {title}"));
    }
    rst
}

fn render_list(items: &[ListItem], start: Option<u64>) -> String {
    let tight = items.iter().all(|item| item.content.len() <= 1);
    let mut rendered = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let marker = match start {
            Some(first) => format!("{}.", first + i as u64),
            None => "-".to_string(),
        };
        let mut body = render_elements_to_rst(&item.content).trim_end().to_string();
        if let Some(checked) = item.checked {
            let checkbox = if checked { "[x]" } else { "[ ]" };
            body = if body.is_empty() {
                checkbox.to_string()
            } else {
                format!("{checkbox} {body}")
            };
        }
        rendered.push(hanging_indent(&marker, &body));
    }

    rendered.join(if tight { "\n" } else { "\n\n" })
}

fn render_table(headers: &[Vec<InlineElement>], rows: &[Vec<Vec<InlineElement>>]) -> String {
    let mut rst = String::from(".. list-table::");
    if !headers.is_empty() {
        rst.push_str("\n   :header-rows: 1");
    }
    rst.push('\n');

    for row in std::iter::once(headers).filter(|h| !h.is_empty()).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            let marker = if i == 0 { "* -" } else { "  -" };
            let text = render_inline_elements(cell).replace('\n', " ");
            let text = text.trim();
            rst.push('\n');
            rst.push_str(INDENT);
            rst.push_str(marker);
            if !text.is_empty() {
                rst.push(' ');
                rst.push_str(text);
            }
        }
    }

    rst
}

/// Prefix the first line with `marker` and align the rest underneath it.
fn hanging_indent(marker: &str, body: &str) -> String {
    if body.is_empty() {
        return marker.to_string();
    }
    let padding = " ".repeat(marker.chars().count() + 1);
    let mut lines = body.lines();
    let mut rst = format!("{marker} {}", lines.next().unwrap_or_default());
    for line in lines {
        rst.push('\n');
        if !line.is_empty() {
            rst.push_str(&padding);
            rst.push_str(line);
        }
    }
    rst
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '`' | '_' | '|') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
