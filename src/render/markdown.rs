//! Markdown rendering for documents.
//!
//! Walks the root's children in order and renders each resolved node.
//! Groups render their members in place, pictures and tables are followed by
//! their captions, and references that resolve to nothing are skipped.

use crate::error::Result;
use crate::model::{Document, GroupItem, Node, PictureItem, Provenance, TableData, TableItem, TextItem, TextLabel};
use std::collections::HashSet;

use super::{ExtractionStats, RenderOptions, RenderResult, TableFallback};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(doc)
}

/// Convert a document to Markdown with statistics.
pub fn to_markdown_with_stats(doc: &Document, options: &RenderOptions) -> Result<RenderResult> {
    let mut options = options.clone();
    options.collect_stats = true;
    let renderer = MarkdownRenderer::new(options);
    renderer.render_with_stats(doc)
}

/// Render table data as a Markdown grid.
pub fn table_to_markdown(data: &TableData) -> String {
    let mut output = String::new();
    write_markdown_grid(&mut output, data);
    output.trim_end().to_string()
}

/// Position inside a list group.
#[derive(Debug, Clone, Copy)]
struct ListContext {
    depth: usize,
    ordered: bool,
    number: usize,
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
    stats: ExtractionStats,
    in_list: bool,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            stats: ExtractionStats::new(),
            in_list: false,
        }
    }

    /// Render a document to Markdown.
    pub fn render(mut self, doc: &Document) -> Result<String> {
        self.render_internal(doc)
    }

    /// Render a document to Markdown with extraction statistics.
    pub fn render_with_stats(mut self, doc: &Document) -> Result<RenderResult> {
        self.options.collect_stats = true;
        let content = self.render_internal(doc)?;
        self.stats.count_text(&content);

        Ok(RenderResult::new(content, doc.name.clone(), self.stats))
    }

    fn render_internal(&mut self, doc: &Document) -> Result<String> {
        let mut output = String::new();

        if self.options.include_frontmatter {
            output.push_str(&frontmatter(doc));
        }
        if self.options.collect_stats {
            self.stats.page_count = doc.page_count();
        }

        let mut expanded = HashSet::new();
        for id in doc.body_refs() {
            self.render_ref(&mut output, doc, id, None, &mut expanded);
        }

        Ok(output.trim().to_string())
    }

    fn render_ref<'d>(
        &mut self,
        output: &mut String,
        doc: &'d Document,
        id: &str,
        list: Option<ListContext>,
        expanded: &mut HashSet<&'d str>,
    ) {
        match doc.node(id) {
            Some(Node::Text(text)) => {
                if self.is_selected(&text.prov) {
                    self.render_text(output, text, list);
                }
            }
            Some(Node::Group(group)) => {
                if expanded.insert(group.self_ref.as_str()) {
                    self.render_group(output, doc, group, list, expanded);
                }
            }
            Some(Node::Picture(picture)) => {
                if self.is_selected(&picture.prov) {
                    self.render_picture(output, doc, picture);
                }
            }
            Some(Node::Table(table)) => {
                if self.is_selected(&table.prov) {
                    self.render_table(output, doc, table);
                }
            }
            None => {
                log::debug!("Skipping unresolved reference {}", id);
                if self.options.collect_stats {
                    self.stats.missing_count += 1;
                }
            }
        }
    }

    fn is_selected(&self, prov: &[Provenance]) -> bool {
        self.options.page_selection.is_all()
            || prov.is_empty()
            || prov
                .iter()
                .any(|p| self.options.page_selection.includes(p.page_no))
    }

    fn render_group<'d>(
        &mut self,
        output: &mut String,
        doc: &'d Document,
        group: &'d GroupItem,
        list: Option<ListContext>,
        expanded: &mut HashSet<&'d str>,
    ) {
        if !group.is_list() {
            for child in &group.children {
                self.render_ref(output, doc, child.id(), list, expanded);
            }
            return;
        }

        let depth = list.map_or(0, |l| l.depth + 1);
        let mut ctx = ListContext {
            depth,
            ordered: group.label == "ordered_list",
            number: 1,
        };
        for child in &group.children {
            let before = output.len();
            self.render_ref(output, doc, child.id(), Some(ctx), expanded);
            if output.len() > before && matches!(doc.node(child.id()), Some(Node::Text(_))) {
                ctx.number += 1;
            }
        }
    }

    fn render_text(&mut self, output: &mut String, item: &TextItem, list: Option<ListContext>) {
        let text = item.text.trim();
        if text.is_empty() {
            return;
        }
        if item.label.is_furniture() && !self.options.include_furniture {
            return;
        }

        match &item.label {
            TextLabel::Title => self.render_heading(output, 1, text),
            TextLabel::SectionHeader => {
                let level = item.level.unwrap_or(1).saturating_add(1);
                self.render_heading(output, level, text);
            }
            TextLabel::ListItem => self.render_list_item(output, item, text, list),
            TextLabel::Code => {
                let language = item
                    .extra
                    .get("code_language")
                    .and_then(|v| v.as_str())
                    .filter(|l| !l.eq_ignore_ascii_case("unknown"))
                    .unwrap_or("");
                self.begin_block(output);
                output.push_str(&format!("```{}\n{}\n```\n", language, text));
                self.count_paragraph();
            }
            TextLabel::Formula => {
                self.begin_block(output);
                output.push_str(&format!("$$\n{}\n$$\n", text));
                self.count_paragraph();
            }
            _ => {
                self.begin_block(output);
                output.push_str(&self.inline_text(text));
                output.push('\n');
                self.count_paragraph();
            }
        }
    }

    fn render_heading(&mut self, output: &mut String, level: u8, text: &str) {
        if self.options.collect_stats {
            self.stats.heading_count += 1;
        }
        let level = level.clamp(1, self.options.max_heading_level.max(1));
        self.begin_block(output);
        output.push_str(&"#".repeat(level as usize));
        output.push(' ');
        output.push_str(&self.inline_text(text));
        output.push('\n');
    }

    fn render_list_item(
        &mut self,
        output: &mut String,
        item: &TextItem,
        text: &str,
        list: Option<ListContext>,
    ) {
        if self.options.collect_stats {
            self.stats.list_item_count += 1;
        }
        let ctx = list.unwrap_or(ListContext {
            depth: 0,
            ordered: false,
            number: 1,
        });

        let explicit = item.marker.as_deref().map(str::trim).filter(|m| {
            m.ends_with(['.', ')']) && m[..m.len() - 1].chars().all(|c| c.is_ascii_alphanumeric())
        });
        let marker = if ctx.ordered || item.enumerated == Some(true) {
            explicit
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}.", ctx.number))
        } else {
            self.options.list_marker.to_string()
        };

        if self.in_list {
            if !output.ends_with('\n') {
                output.push('\n');
            }
        } else {
            self.begin_block(output);
        }
        self.in_list = true;
        output.push_str(&"  ".repeat(ctx.depth));
        output.push_str(&marker);
        output.push(' ');
        output.push_str(&self.inline_text(text));
        output.push('\n');
    }

    fn render_picture(&mut self, output: &mut String, doc: &Document, picture: &PictureItem) {
        if self.options.collect_stats {
            self.stats.picture_count += 1;
        }

        let embedded = picture
            .image
            .as_ref()
            .filter(|image| self.options.embed_images && !image.uri.is_empty());
        match embedded {
            Some(image) => {
                self.begin_block(output);
                output.push_str(&format!("![Image]({})\n", image.uri));
            }
            None if !self.options.image_placeholder.is_empty() => {
                self.begin_block(output);
                output.push_str(&self.options.image_placeholder);
                output.push('\n');
            }
            None => {}
        }

        self.render_captions(output, doc, picture.captions.iter().map(|c| c.id()));
    }

    fn render_table(&mut self, output: &mut String, doc: &Document, table: &TableItem) {
        if !table.data.is_empty() {
            if self.options.collect_stats {
                self.stats.table_count += 1;
            }
            self.begin_block(output);
            if has_spanning_cells(&table.data) && self.options.table_fallback == TableFallback::Html
            {
                write_html_table(output, &table.data);
            } else {
                write_markdown_grid(output, &table.data);
            }
        }

        self.render_captions(output, doc, table.captions.iter().map(|c| c.id()));
    }

    fn render_captions<'a>(
        &mut self,
        output: &mut String,
        doc: &Document,
        captions: impl Iterator<Item = &'a str>,
    ) {
        for id in captions {
            let Some(Node::Text(caption)) = doc.node(id) else {
                continue;
            };
            let text = caption.text.trim();
            if text.is_empty() {
                continue;
            }
            if self.options.collect_stats {
                self.stats.caption_count += 1;
            }
            self.begin_block(output);
            output.push_str(&self.inline_text(text));
            output.push('\n');
        }
    }

    fn begin_block(&mut self, output: &mut String) {
        self.in_list = false;
        start_block(output);
    }

    fn count_paragraph(&mut self) {
        if self.options.collect_stats {
            self.stats.paragraph_count += 1;
        }
    }

    fn inline_text(&self, text: &str) -> String {
        let separator = if self.options.preserve_line_breaks {
            "  \n"
        } else {
            " "
        };
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                if self.options.escape_special_chars {
                    escape_markdown(line)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Separate the next block from previous output by one blank line.
fn start_block(output: &mut String) {
    if output.is_empty() || output.ends_with("\n\n") {
        return;
    }
    if output.ends_with('\n') {
        output.push('\n');
    } else {
        output.push_str("\n\n");
    }
}

fn has_spanning_cells(data: &TableData) -> bool {
    data.table_cells
        .iter()
        .any(|c| c.row_span > 1 || c.col_span > 1)
}

fn write_markdown_grid(output: &mut String, data: &TableData) {
    let grid = data.text_grid();
    let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return;
    }

    for (i, row) in grid.iter().enumerate() {
        output.push('|');
        for c in 0..cols {
            let content = row.get(c).map(String::as_str).unwrap_or("");
            let content = content.replace('\n', " ").replace('|', "\\|");
            output.push_str(&format!(" {} |", content.trim()));
        }
        output.push('\n');

        // Markdown tables always need a header separator after the first row
        if i == 0 {
            output.push('|');
            for _ in 0..cols {
                output.push_str(" --- |");
            }
            output.push('\n');
        }
    }
}

fn write_html_table(output: &mut String, data: &TableData) {
    let header_rows = data.header_rows();
    let rows = data
        .num_rows
        .max(data.table_cells.iter().map(|c| c.start_row_offset_idx + 1).max().unwrap_or(0));

    output.push_str("<table>\n");
    for r in 0..rows {
        if r == 0 && header_rows > 0 {
            output.push_str("<thead>\n");
        }
        if r == header_rows {
            output.push_str("<tbody>\n");
        }

        let mut cells: Vec<_> = data
            .table_cells
            .iter()
            .filter(|c| c.start_row_offset_idx == r)
            .collect();
        cells.sort_by_key(|c| c.start_col_offset_idx);

        output.push_str("<tr>");
        for cell in cells {
            let tag = if cell.column_header || r < header_rows {
                "th"
            } else {
                "td"
            };
            let mut attrs = String::new();
            if cell.row_span > 1 {
                attrs.push_str(&format!(" rowspan=\"{}\"", cell.row_span));
            }
            if cell.col_span > 1 {
                attrs.push_str(&format!(" colspan=\"{}\"", cell.col_span));
            }
            output.push_str(&format!("<{}{}>{}</{}>", tag, attrs, cell.text.trim(), tag));
        }
        output.push_str("</tr>\n");

        if header_rows > 0 && r + 1 == header_rows {
            output.push_str("</thead>\n");
        }
    }
    if rows > header_rows {
        output.push_str("</tbody>\n");
    }
    output.push_str("</table>\n");
}

fn frontmatter(doc: &Document) -> String {
    let mut lines = vec!["---".to_string()];
    if !doc.name.is_empty() {
        lines.push(format!("title: \"{}\"", escape_yaml(&doc.name)));
    }
    lines.push(format!("pages: {}", doc.page_count()));
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(String::new());
    lines.join("\n")
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Escape special Markdown characters.
/// Only characters that could be misinterpreted as inline syntax are escaped.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
