//! mdast-based markup renderer.

use crate::component::Component;
use crate::markup::theme::MarkupTheme;
use crate::text::width::visible_width;
use crate::text::wrap::wrap_text_with_ansi;

use markdown::{mdast, to_mdast, ParseOptions};

/// Parse options with GFM plus dollar-delimited math enabled.
pub fn parse_options() -> ParseOptions {
    let mut options = ParseOptions::gfm();
    options.constructs.math_flow = true;
    options.constructs.math_text = true;
    options.math_text_single_dollar = true;
    options
}

#[derive(Clone, Copy)]
enum InlineStyleKind {
    Default,
    Quote,
}

struct InlineStyleContext {
    kind: InlineStyleKind,
    style_prefix: String,
}

/// Renders one chunk of markup text to styled lines.
///
/// Parsing never fails the render: input the parser rejects is emitted as
/// raw text, so every call returns the full visible content.
pub struct MarkupRenderer {
    text: String,
    theme: MarkupTheme,
    cached_text: Option<String>,
    cached_width: Option<usize>,
    cached_lines: Option<Vec<String>>,
}

impl MarkupRenderer {
    pub fn new(text: impl Into<String>, theme: MarkupTheme) -> Self {
        Self {
            text: expand_tabs(text.into()),
            theme,
            cached_text: None,
            cached_width: None,
            cached_lines: None,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = expand_tabs(text.into());
        self.invalidate();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn apply_inline_style(&self, text: &str, kind: InlineStyleKind) -> String {
        match kind {
            InlineStyleKind::Default => text.to_string(),
            InlineStyleKind::Quote => (self.theme.quote)(&(self.theme.italic)(text)),
        }
    }

    fn apply_inline_style_with_newlines(&self, text: &str, kind: InlineStyleKind) -> String {
        text.split('\n')
            .map(|segment| self.apply_inline_style(segment, kind))
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn get_style_prefix<F>(&self, style_fn: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let sentinel = "\u{0000}";
        let styled = style_fn(sentinel);
        styled
            .find(sentinel)
            .map(|idx| styled[..idx].to_string())
            .unwrap_or_default()
    }

    fn default_inline_context(&self) -> InlineStyleContext {
        InlineStyleContext {
            kind: InlineStyleKind::Default,
            style_prefix: String::new(),
        }
    }

    /// Inline math: typeset output collapses to a single line; a typeset
    /// failure keeps the raw dollar-delimited source in the error style.
    fn render_inline_math(&self, value: &str) -> String {
        match self.theme.typeset_math.as_ref() {
            Some(typeset) => match typeset(value, false) {
                Some(lines) => lines.join(" "),
                None => (self.theme.math_error)(&format!("${value}$")),
            },
            None => (self.theme.math)(value),
        }
    }

    /// Display math: one styled line per typeset line.
    fn render_math_block(&self, value: &str) -> Vec<String> {
        match self.theme.typeset_math.as_ref() {
            Some(typeset) => match typeset(value, true) {
                Some(lines) => lines,
                None => vec![(self.theme.math_error)(&format!("$${value}$$"))],
            },
            None => value
                .split('\n')
                .map(|line| (self.theme.math)(line))
                .collect(),
        }
    }

    fn double_dollar_delimited(&self, math: &mdast::InlineMath) -> bool {
        math.position
            .as_ref()
            .and_then(|position| self.text.get(position.start.offset..))
            .is_some_and(|raw| raw.starts_with("$$"))
    }

    fn render_inline_nodes(&self, nodes: &[mdast::Node], context: &InlineStyleContext) -> String {
        let style_prefix = context.style_prefix.as_str();
        let kind = context.kind;

        let mut result = String::new();

        for node in nodes {
            match node {
                mdast::Node::Text(text) => {
                    result.push_str(&self.apply_inline_style_with_newlines(&text.value, kind));
                }
                mdast::Node::Paragraph(paragraph) => {
                    let text = self.render_inline_nodes(&paragraph.children, context);
                    result.push_str(&text);
                }
                mdast::Node::Strong(strong) => {
                    let content = self.render_inline_nodes(&strong.children, context);
                    result.push_str(&(self.theme.bold)(&content));
                    result.push_str(style_prefix);
                }
                mdast::Node::Emphasis(emphasis) => {
                    let content = self.render_inline_nodes(&emphasis.children, context);
                    result.push_str(&(self.theme.italic)(&content));
                    result.push_str(style_prefix);
                }
                mdast::Node::Delete(delete) => {
                    let content = self.render_inline_nodes(&delete.children, context);
                    result.push_str(&(self.theme.strikethrough)(&content));
                    result.push_str(style_prefix);
                }
                mdast::Node::InlineCode(code) => {
                    result.push_str(&(self.theme.code)(&code.value));
                    result.push_str(style_prefix);
                }
                mdast::Node::InlineMath(math) => {
                    // `$$x$$` on one line parses as inline math; the doubled
                    // delimiter still selects display mode.
                    if self.double_dollar_delimited(math) {
                        result.push_str(&self.render_math_block(&math.value).join("\n"));
                    } else {
                        result.push_str(&self.render_inline_math(&math.value));
                    }
                    result.push_str(style_prefix);
                }
                mdast::Node::Math(math) => {
                    result.push_str(&self.render_math_block(&math.value).join("\n"));
                    result.push_str(style_prefix);
                }
                mdast::Node::Link(link) => {
                    let link_text = self.render_inline_nodes(&link.children, context);
                    let link_text_plain = plain_text_from_nodes(&link.children);
                    let href = link.url.as_str();
                    let href_cmp = href.strip_prefix("mailto:").unwrap_or(href);
                    let styled = (self.theme.link)(&(self.theme.underline)(&link_text));
                    result.push_str(&styled);
                    if link_text_plain != href && link_text_plain != href_cmp {
                        let url = (self.theme.link_url)(&format!(" ({href})"));
                        result.push_str(&url);
                    }
                    result.push_str(style_prefix);
                }
                mdast::Node::Break(_) => {
                    result.push('\n');
                }
                mdast::Node::Html(html) => {
                    result.push_str(&self.apply_inline_style_with_newlines(&html.value, kind));
                }
                mdast::Node::Image(image) => {
                    let alt = if image.alt.is_empty() {
                        image.url.as_str()
                    } else {
                        image.alt.as_str()
                    };
                    result.push_str(&self.apply_inline_style_with_newlines(alt, kind));
                }
                _ => {}
            }
        }

        result
    }

    fn render_code_block(&self, code: &mdast::Code) -> Vec<String> {
        let indent = self
            .theme
            .code_block_indent
            .clone()
            .unwrap_or_else(|| "  ".to_string());
        let mut lines = Vec::new();
        lines.push((self.theme.code_block_border)(&format!(
            "```{}",
            code.lang.clone().unwrap_or_default()
        )));
        if let Some(highlighter) = self.theme.highlight_code.as_ref() {
            let highlighted = highlighter(&code.value, code.lang.as_deref());
            for line in highlighted {
                lines.push(format!("{indent}{line}"));
            }
        } else {
            for line in code.value.split('\n') {
                lines.push(format!("{indent}{}", (self.theme.code_block)(line)));
            }
        }
        lines.push((self.theme.code_block_border)("```"));
        lines
    }

    fn render_list(&self, list: &mdast::List, depth: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let indent = "  ".repeat(depth);
        let start_number = list.start.unwrap_or(1);
        let bullet_prefix = self.get_style_prefix(|text| (self.theme.list_bullet)(text));

        for (i, node) in list.children.iter().enumerate() {
            let mdast::Node::ListItem(item) = node else {
                continue;
            };
            let bullet = if list.ordered {
                format!("{}.", start_number + i as u32) + " "
            } else {
                "- ".to_string()
            };

            let item_lines = self.render_list_item(item, depth);
            if item_lines.is_empty() {
                lines.push(format!("{indent}{}", (self.theme.list_bullet)(&bullet)));
                continue;
            }

            let first_line = &item_lines[0];
            if is_nested_list_line(first_line, &bullet_prefix) {
                lines.push(first_line.clone());
            } else {
                lines.push(format!(
                    "{indent}{}{}",
                    (self.theme.list_bullet)(&bullet),
                    first_line
                ));
            }

            for line in item_lines.iter().skip(1) {
                if is_nested_list_line(line, &bullet_prefix) {
                    lines.push(line.clone());
                } else {
                    lines.push(format!("{indent}  {line}"));
                }
            }
        }

        lines
    }

    fn render_list_item(&self, item: &mdast::ListItem, depth: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let context = self.default_inline_context();

        for node in item.children.iter() {
            match node {
                mdast::Node::List(list) => {
                    lines.extend(self.render_list(list, depth + 1));
                }
                mdast::Node::Paragraph(paragraph) => {
                    let text = self.render_inline_nodes(&paragraph.children, &context);
                    lines.extend(text.split('\n').map(|line| line.to_string()));
                }
                mdast::Node::Code(code) => {
                    lines.extend(self.render_code_block(code));
                }
                mdast::Node::Math(math) => {
                    lines.extend(self.render_math_block(&math.value));
                }
                _ => {
                    let text = self.render_inline_nodes(std::slice::from_ref(node), &context);
                    if !text.is_empty() {
                        lines.extend(text.split('\n').map(|line| line.to_string()));
                    }
                }
            }
        }

        lines
    }

    fn render_blockquote(&self, blockquote: &mdast::Blockquote, width: usize) -> Vec<String> {
        let style_prefix =
            self.get_style_prefix(|text| (self.theme.quote)(&(self.theme.italic)(text)));
        let context = InlineStyleContext {
            kind: InlineStyleKind::Quote,
            style_prefix,
        };

        let quote_text = self.render_inline_nodes(&blockquote.children, &context);

        let mut lines = Vec::new();
        let quote_content_width = width.saturating_sub(2).max(1);
        for line in quote_text.split('\n') {
            let wrapped = wrap_text_with_ansi(line, quote_content_width);
            for wrapped_line in wrapped {
                lines.push(format!(
                    "{}{}",
                    (self.theme.quote_border)("│ "),
                    wrapped_line
                ));
            }
        }

        lines
    }

    fn get_longest_word_width(&self, text: &str, max_width: Option<usize>) -> usize {
        let mut longest = 0usize;
        for word in text.split_whitespace().filter(|word| !word.is_empty()) {
            longest = longest.max(visible_width(word));
        }
        if let Some(max_width) = max_width {
            longest.min(max_width)
        } else {
            longest
        }
    }

    fn render_table(&self, table: &mdast::Table, width: usize, raw: Option<&str>) -> Vec<String> {
        let mut lines = Vec::new();
        let header_row = match table.children.first() {
            Some(mdast::Node::TableRow(row)) => row,
            _ => return lines,
        };
        let rows: Vec<&mdast::TableRow> = table
            .children
            .iter()
            .filter_map(|node| match node {
                mdast::Node::TableRow(row) => Some(row),
                _ => None,
            })
            .collect();

        let num_cols = header_row.children.len();
        if num_cols == 0 {
            return lines;
        }

        let border_overhead = 3 * num_cols + 1;
        let available_for_cells = width.saturating_sub(border_overhead);
        if available_for_cells < num_cols {
            if let Some(raw) = raw {
                let mut fallback = wrap_text_with_ansi(raw, width);
                fallback.push(String::new());
                return fallback;
            }
            return lines;
        }

        let max_unbroken_word_width = 30usize;

        let mut natural_widths = vec![0usize; num_cols];
        let mut min_word_widths = vec![1usize; num_cols];

        for row in rows.iter() {
            for (col_idx, cell) in row.children.iter().enumerate().take(num_cols) {
                let cell_text = self.render_cell_text(cell);
                natural_widths[col_idx] = natural_widths[col_idx].max(visible_width(&cell_text));
                min_word_widths[col_idx] = min_word_widths[col_idx].max(
                    self.get_longest_word_width(&cell_text, Some(max_unbroken_word_width))
                        .max(1),
                );
            }
        }

        let mut min_column_widths = min_word_widths.clone();
        let mut min_cells_width: usize = min_column_widths.iter().sum();

        if min_cells_width > available_for_cells {
            min_column_widths = vec![1usize; num_cols];
            let remaining = available_for_cells.saturating_sub(num_cols);

            if remaining > 0 {
                let total_weight: usize = min_word_widths
                    .iter()
                    .map(|width| width.saturating_sub(1))
                    .sum();

                let mut growth = vec![0usize; num_cols];
                for (idx, width) in min_word_widths.iter().enumerate() {
                    let weight = width.saturating_sub(1);
                    growth[idx] = if total_weight > 0 {
                        (weight * remaining) / total_weight
                    } else {
                        0
                    };
                    min_column_widths[idx] += growth[idx];
                }

                let allocated: usize = growth.iter().sum();
                let mut leftover = remaining.saturating_sub(allocated);
                for col_width in min_column_widths.iter_mut().take(num_cols) {
                    if leftover == 0 {
                        break;
                    }
                    *col_width += 1;
                    leftover -= 1;
                }
            }

            min_cells_width = min_column_widths.iter().sum();
        }

        let total_natural_width: usize = natural_widths.iter().sum::<usize>() + border_overhead;
        let column_widths = if total_natural_width <= width {
            natural_widths
                .iter()
                .zip(min_column_widths.iter())
                .map(|(natural, min)| (*natural).max(*min))
                .collect::<Vec<usize>>()
        } else {
            let total_grow_potential: usize = natural_widths
                .iter()
                .zip(min_column_widths.iter())
                .map(|(natural, min)| natural.saturating_sub(*min))
                .sum();
            let extra_width = available_for_cells.saturating_sub(min_cells_width);

            let mut widths = Vec::with_capacity(num_cols);
            for idx in 0..num_cols {
                let natural = natural_widths[idx];
                let min_width = min_column_widths[idx];
                let min_delta = natural.saturating_sub(min_width);
                let grow = if total_grow_potential > 0 {
                    (min_delta * extra_width) / total_grow_potential
                } else {
                    0
                };
                widths.push(min_width + grow);
            }

            let allocated: usize = widths.iter().sum();
            let mut remaining = available_for_cells.saturating_sub(allocated);
            while remaining > 0 {
                let mut grew = false;
                for idx in 0..num_cols {
                    if remaining == 0 {
                        break;
                    }
                    if widths[idx] < natural_widths[idx] {
                        widths[idx] += 1;
                        remaining -= 1;
                        grew = true;
                    }
                }
                if !grew {
                    break;
                }
            }

            widths
        };

        let top_border_cells: Vec<String> = column_widths.iter().map(|w| "─".repeat(*w)).collect();
        lines.push(format!("┌─{}─┐", top_border_cells.join("─┬─")));

        let mut header_lines: Vec<Vec<String>> = Vec::with_capacity(num_cols);
        for (idx, cell) in header_row.children.iter().enumerate() {
            let cell_text = self.render_cell_text(cell);
            header_lines.push(wrap_text_with_ansi(&cell_text, column_widths[idx].max(1)));
        }
        let header_line_count = header_lines
            .iter()
            .map(|lines| lines.len())
            .max()
            .unwrap_or(0);

        for line_idx in 0..header_line_count {
            let mut row_parts = Vec::with_capacity(num_cols);
            for (col_idx, col_width) in column_widths.iter().enumerate().take(num_cols) {
                let text = header_lines
                    .get(col_idx)
                    .and_then(|lines| lines.get(line_idx))
                    .cloned()
                    .unwrap_or_default();
                let padding = col_width.saturating_sub(visible_width(&text));
                let padded = format!("{text}{}", " ".repeat(padding));
                row_parts.push((self.theme.bold)(&padded));
            }
            lines.push(format!("│ {} │", row_parts.join(" │ ")));
        }

        let separator_cells: Vec<String> = column_widths.iter().map(|w| "─".repeat(*w)).collect();
        let separator_line = format!("├─{}─┤", separator_cells.join("─┼─"));
        lines.push(separator_line.clone());

        for (row_index, row) in rows.iter().enumerate().skip(1) {
            let mut row_lines: Vec<Vec<String>> = Vec::with_capacity(num_cols);
            for (idx, cell) in row.children.iter().enumerate().take(num_cols) {
                let cell_text = self.render_cell_text(cell);
                row_lines.push(wrap_text_with_ansi(&cell_text, column_widths[idx].max(1)));
            }
            let row_line_count = row_lines.iter().map(|lines| lines.len()).max().unwrap_or(0);

            for line_idx in 0..row_line_count {
                let mut row_parts = Vec::with_capacity(num_cols);
                for (col_idx, col_width) in column_widths.iter().enumerate().take(num_cols) {
                    let text = row_lines
                        .get(col_idx)
                        .and_then(|lines| lines.get(line_idx))
                        .cloned()
                        .unwrap_or_default();
                    let padding = col_width.saturating_sub(visible_width(&text));
                    row_parts.push(format!("{text}{}", " ".repeat(padding)));
                }
                lines.push(format!("│ {} │", row_parts.join(" │ ")));
            }

            if row_index < rows.len() - 1 {
                lines.push(separator_line.clone());
            }
        }

        let bottom_border_cells: Vec<String> =
            column_widths.iter().map(|w| "─".repeat(*w)).collect();
        lines.push(format!("└─{}─┘", bottom_border_cells.join("─┴─")));
        lines.push(String::new());
        lines
    }

    fn render_cell_text(&self, cell: &mdast::Node) -> String {
        let context = self.default_inline_context();
        match cell {
            mdast::Node::TableCell(table_cell) => {
                self.render_inline_nodes(&table_cell.children, &context)
            }
            _ => self.render_inline_nodes(std::slice::from_ref(cell), &context),
        }
    }

    fn render_node(
        &self,
        node: &mdast::Node,
        width: usize,
        next_is_list: bool,
        has_next: bool,
        space_after: bool,
        raw: Option<&str>,
    ) -> Vec<String> {
        match node {
            mdast::Node::Heading(heading) => {
                let context = self.default_inline_context();
                let heading_text = self.render_inline_nodes(&heading.children, &context);
                let styled = match heading.depth {
                    1 => (self.theme.heading)(&(self.theme.bold)(&(self.theme.underline)(
                        &heading_text,
                    ))),
                    2 => (self.theme.heading)(&(self.theme.bold)(&heading_text)),
                    _ => {
                        let prefix = "#".repeat(heading.depth as usize);
                        (self.theme.heading)(&(self.theme.bold)(&format!(
                            "{prefix} {heading_text}"
                        )))
                    }
                };
                let mut lines = vec![styled];
                if !space_after {
                    lines.push(String::new());
                }
                lines
            }
            mdast::Node::Paragraph(paragraph) => {
                let context = self.default_inline_context();
                let paragraph_text = self.render_inline_nodes(&paragraph.children, &context);
                let mut lines = vec![paragraph_text];
                if has_next && !next_is_list && !space_after {
                    lines.push(String::new());
                }
                lines
            }
            mdast::Node::Code(code) => {
                let mut lines = self.render_code_block(code);
                if !space_after {
                    lines.push(String::new());
                }
                lines
            }
            mdast::Node::Math(math) => {
                let mut lines = self.render_math_block(&math.value);
                if !space_after {
                    lines.push(String::new());
                }
                lines
            }
            mdast::Node::List(list) => self.render_list(list, 0),
            mdast::Node::Blockquote(blockquote) => {
                let mut lines = self.render_blockquote(blockquote, width);
                if !space_after {
                    lines.push(String::new());
                }
                lines
            }
            mdast::Node::ThematicBreak(_) => {
                let hr_text = "─".repeat(width.min(80));
                let mut lines = vec![(self.theme.hr)(&hr_text)];
                if !space_after {
                    lines.push(String::new());
                }
                lines
            }
            mdast::Node::Html(html) => {
                vec![html.value.trim().to_string()]
            }
            mdast::Node::Table(table) => self.render_table(table, width, raw),
            mdast::Node::Text(text) => vec![text.value.clone()],
            mdast::Node::Break(_) => vec![String::new()],
            _ => Vec::new(),
        }
    }
}

impl Component for MarkupRenderer {
    fn render(&mut self, width: usize) -> Vec<String> {
        if let Some(cached) = self.cached_lines.as_ref() {
            if self.cached_text.as_deref() == Some(self.text.as_str())
                && self.cached_width == Some(width)
            {
                return cached.clone();
            }
        }

        let content_width = width.max(1);

        if self.text.trim().is_empty() {
            self.cached_text = Some(self.text.clone());
            self.cached_width = Some(width);
            self.cached_lines = Some(vec![String::new()]);
            return vec![String::new()];
        }

        let root = match to_mdast(&self.text, &parse_options()) {
            Ok(node) => node,
            Err(_) => mdast::Node::Text(mdast::Text {
                value: self.text.clone(),
                position: None,
            }),
        };

        let nodes = match root {
            mdast::Node::Root(root) => root.children,
            other => vec![other],
        };

        let mut rendered_lines = Vec::new();
        for idx in 0..nodes.len() {
            let node = &nodes[idx];
            let next_node = nodes.get(idx + 1);
            let next_is_list = matches!(next_node, Some(mdast::Node::List(_)));
            let has_next = next_node.is_some();

            let space_after = match (node_position(node), next_node.and_then(node_position)) {
                (Some((end, _)), Some((_, next_start))) => {
                    has_blank_line_between(&self.text, end, next_start)
                }
                _ => false,
            };

            let raw = raw_slice_between(node, &self.text);
            let mut lines = self.render_node(
                node,
                content_width,
                next_is_list,
                has_next,
                space_after,
                raw.as_deref(),
            );
            rendered_lines.append(&mut lines);

            if space_after {
                rendered_lines.push(String::new());
            }
        }

        let mut wrapped_lines = Vec::new();
        for line in rendered_lines {
            wrapped_lines.extend(wrap_text_with_ansi(&line, content_width));
        }

        // Trailing spacer lines carry no content and would distort heights.
        while wrapped_lines.len() > 1 && wrapped_lines.last().is_some_and(|line| line.is_empty()) {
            wrapped_lines.pop();
        }

        self.cached_text = Some(self.text.clone());
        self.cached_width = Some(width);
        self.cached_lines = Some(wrapped_lines.clone());

        if wrapped_lines.is_empty() {
            vec![String::new()]
        } else {
            wrapped_lines
        }
    }

    fn invalidate(&mut self) {
        self.cached_text = None;
        self.cached_width = None;
        self.cached_lines = None;
    }
}

// Tabs are expanded before parsing so mdast offsets index straight into
// the stored text.
fn expand_tabs(text: String) -> String {
    if text.contains('\t') {
        text.replace('\t', "   ")
    } else {
        text
    }
}

fn plain_text_from_nodes(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            mdast::Node::Text(text) => out.push_str(&text.value),
            mdast::Node::InlineCode(code) => out.push_str(&code.value),
            mdast::Node::InlineMath(math) => out.push_str(&math.value),
            mdast::Node::Strong(strong) => out.push_str(&plain_text_from_nodes(&strong.children)),
            mdast::Node::Emphasis(emphasis) => {
                out.push_str(&plain_text_from_nodes(&emphasis.children))
            }
            mdast::Node::Delete(delete) => out.push_str(&plain_text_from_nodes(&delete.children)),
            mdast::Node::Link(link) => out.push_str(&plain_text_from_nodes(&link.children)),
            mdast::Node::Html(html) => out.push_str(&html.value),
            mdast::Node::Image(image) => out.push_str(&image.alt),
            mdast::Node::Paragraph(paragraph) => {
                out.push_str(&plain_text_from_nodes(&paragraph.children))
            }
            _ => {}
        }
    }
    out
}

fn node_position(node: &mdast::Node) -> Option<(usize, usize)> {
    let position = match node {
        mdast::Node::Heading(heading) => heading.position.as_ref(),
        mdast::Node::Paragraph(paragraph) => paragraph.position.as_ref(),
        mdast::Node::Code(code) => code.position.as_ref(),
        mdast::Node::Math(math) => math.position.as_ref(),
        mdast::Node::List(list) => list.position.as_ref(),
        mdast::Node::Blockquote(blockquote) => blockquote.position.as_ref(),
        mdast::Node::ThematicBreak(thematic) => thematic.position.as_ref(),
        mdast::Node::Html(html) => html.position.as_ref(),
        mdast::Node::Table(table) => table.position.as_ref(),
        mdast::Node::Text(text) => text.position.as_ref(),
        _ => None,
    };
    position.map(|pos| (pos.end.offset, pos.start.offset))
}

fn raw_slice_between(node: &mdast::Node, source: &str) -> Option<String> {
    let position = match node {
        mdast::Node::Table(table) => table.position.as_ref(),
        _ => None,
    }?;

    let start = position.start.offset.min(source.len());
    let end = position.end.offset.min(source.len());
    if start >= end {
        return None;
    }
    Some(source[start..end].to_string())
}

fn has_blank_line_between(source: &str, end: usize, start: usize) -> bool {
    if start <= end || end >= source.len() {
        return false;
    }
    let slice_end = start.min(source.len());
    let slice = &source[end..slice_end];
    let mut saw_newline = false;
    let mut only_whitespace = true;

    for ch in slice.chars() {
        if ch == '\n' || ch == '\r' {
            if saw_newline && only_whitespace {
                return true;
            }
            saw_newline = true;
            only_whitespace = true;
        } else if ch.is_whitespace() {
            if saw_newline {
                continue;
            }
        } else {
            saw_newline = false;
            only_whitespace = false;
        }
    }

    false
}

fn is_nested_list_line(line: &str, bullet_prefix: &str) -> bool {
    if bullet_prefix.is_empty() {
        return false;
    }
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix(bullet_prefix) {
        if let Some(ch) = rest.chars().next() {
            return ch == '-' || ch.is_ascii_digit();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::MarkupRenderer;
    use crate::component::Component;
    use crate::markup::theme::{MarkupStyleFn, MarkupTheme};

    fn tagged_theme() -> MarkupTheme {
        fn tag(open: &'static str, close: &'static str) -> MarkupStyleFn {
            Box::new(move |text: &str| format!("{open}{text}{close}"))
        }
        MarkupTheme {
            heading: tag("<h>", "</h>"),
            link: tag("<l>", "</l>"),
            link_url: tag("<u>", "</u>"),
            code: tag("`", "`"),
            code_block: tag("<code>", "</code>"),
            code_block_border: tag("<cb>", "</cb>"),
            quote: tag("<q>", "</q>"),
            quote_border: Box::new(|text| text.to_string()),
            hr: tag("<hr>", "</hr>"),
            list_bullet: tag("<b>", "</b>"),
            bold: tag("<b>", "</b>"),
            italic: tag("<i>", "</i>"),
            strikethrough: tag("<s>", "</s>"),
            underline: tag("<u>", "</u>"),
            math: tag("<m>", "</m>"),
            math_error: tag("<merr>", "</merr>"),
            highlight_code: None,
            typeset_math: None,
            code_block_indent: None,
        }
    }

    #[test]
    fn headings_apply_styles_and_spacing() {
        let mut renderer = MarkupRenderer::new("# Title\nParagraph", tagged_theme());
        let lines = renderer.render(40);
        assert_eq!(lines[0], "<h><b><u>Title</u></b></h>");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Paragraph");
    }

    #[test]
    fn inline_math_is_styled_without_delimiters() {
        let mut renderer = MarkupRenderer::new("энергия: $E = mc^2$ done", tagged_theme());
        let lines = renderer.render(80);
        assert!(lines[0].contains("<m>E = mc^2</m>"));
        assert!(!lines[0].contains('$'));
    }

    #[test]
    fn display_math_renders_as_block() {
        let mut renderer = MarkupRenderer::new("$$\nx^2\n$$", tagged_theme());
        let lines = renderer.render(80);
        assert!(lines.iter().any(|line| line.contains("<m>x^2</m>")));
    }

    #[test]
    fn math_body_is_protected_from_inline_transforms() {
        // Underscores inside math must not become emphasis.
        let mut renderer = MarkupRenderer::new("$a_1 + b_2$", tagged_theme());
        let lines = renderer.render(80);
        let joined = lines.join("\n");
        assert!(joined.contains("a_1 + b_2"));
        assert!(!joined.contains("<i>"));
    }

    #[test]
    fn failed_typeset_falls_back_to_raw_source() {
        let mut theme = tagged_theme();
        theme.typeset_math = Some(Box::new(|_, _| None));
        let mut renderer = MarkupRenderer::new("see $x+y$", theme);
        let lines = renderer.render(80);
        assert!(lines[0].contains("<merr>$x+y$</merr>"));
    }

    #[test]
    fn typeset_output_is_used_when_available() {
        let mut theme = tagged_theme();
        theme.typeset_math = Some(Box::new(|expr, display| {
            Some(vec![format!("[{}:{}]", if display { "D" } else { "I" }, expr)])
        }));
        let mut renderer = MarkupRenderer::new("inline $a$ and\n\n$$b$$", theme);
        let lines = renderer.render(80);
        let joined = lines.join("\n");
        assert!(joined.contains("[I:a]"));
        assert!(joined.contains("[D:b]"));
    }

    #[test]
    fn double_dollar_math_is_display_even_mid_paragraph() {
        let mut theme = tagged_theme();
        theme.typeset_math = Some(Box::new(|expr, display| {
            Some(vec![format!("[{}:{}]", if display { "D" } else { "I" }, expr)])
        }));
        let mut renderer = MarkupRenderer::new("sum $$E=mc^2$$ here, but $x$ stays", theme);
        let lines = renderer.render(80);
        let joined = lines.join("\n");
        assert!(joined.contains("[D:E=mc^2]"));
        assert!(joined.contains("[I:x]"));
    }

    #[test]
    fn code_fences_render_with_borders() {
        let mut renderer = MarkupRenderer::new("```rust\nlet x = 1;\n```", tagged_theme());
        let lines = renderer.render(80);
        assert_eq!(lines[0], "<cb>```rust</cb>");
        assert!(lines[1].contains("let x = 1;"));
        assert!(lines.iter().any(|line| line == "<cb>```</cb>"));
    }

    #[test]
    fn link_renders_url_only_when_needed() {
        let mut renderer = MarkupRenderer::new("[x](x)\n[y](z)", tagged_theme());
        let lines = renderer.render(80);
        assert_eq!(lines[0], "<l><u>x</u></l>");
        assert_eq!(lines[1], "<l><u>y</u></l><u> (z)</u>");
    }

    #[test]
    fn blockquote_wraps_and_prefixes() {
        let mut renderer = MarkupRenderer::new("> quote", tagged_theme());
        let lines = renderer.render(80);
        assert_eq!(lines[0], "│ <q><i>quote</i></q>");
    }

    #[test]
    fn table_renders_borders() {
        let input = "| a | b |\n| - | - |\n| c | d |";
        let mut renderer = MarkupRenderer::new(input, tagged_theme());
        let lines = renderer.render(80);
        assert!(lines.iter().any(|line| line.starts_with("┌")));
        assert!(lines.iter().any(|line| line.starts_with("└")));
    }

    #[test]
    fn unparseable_input_renders_raw() {
        let mut renderer = MarkupRenderer::new("plain text, no markup", tagged_theme());
        let lines = renderer.render(80);
        assert_eq!(lines[0], "plain text, no markup");
    }

    #[test]
    fn render_caches_by_text_and_width() {
        let mut renderer = MarkupRenderer::new("hello", tagged_theme());
        let first = renderer.render(40);
        let second = renderer.render(40);
        assert_eq!(first, second);
        renderer.set_text("changed");
        let third = renderer.render(40);
        assert_eq!(third[0], "changed");
    }
}
