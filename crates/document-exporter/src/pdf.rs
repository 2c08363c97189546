//! PDF rasterization using lopdf
//!
//! Lays the report tree out as A4 pages: text elements flow top to bottom
//! with naive word wrapping, and every `svg` carrying an explicit numeric
//! height is drawn as a framed graphic scaled from its `viewBox`. Graphics
//! without an explicit height have no printable size and are skipped, which
//! is why the print style rewrite must run first.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use report_core::{DocumentMeta, DocumentRasterizer, RenderedDocument, ReportError, ReportNode};
use tracing::debug;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 40.0;
const PX_TO_PT: f32 = 0.75;
const DEFAULT_TEXT_COLOR: Rgb = Rgb(0.12, 0.16, 0.22);
const FRAME_COLOR: Rgb = Rgb(0.9, 0.91, 0.92);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rgb(f32, f32, f32);

impl Rgb {
    /// `#rrggbb` or `#rgb`
    fn parse(value: &str) -> Option<Rgb> {
        let hex = value.trim().strip_prefix('#')?;
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| {
            u8::from_str_radix(expanded.get(i..i + 2)?, 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn operands(self) -> Vec<Object> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

#[derive(Debug, Clone)]
enum Mark {
    Rect { x: f32, y: f32, w: f32, h: f32, color: Rgb },
    Line { points: Vec<(f32, f32)>, color: Rgb },
}

#[derive(Debug, Clone)]
enum Block {
    Text {
        text: String,
        size: f32,
        bold: bool,
        color: Rgb,
        rule: Option<Rgb>,
    },
    Graphic {
        height: f32,
        view: (f32, f32),
        marks: Vec<Mark>,
    },
}

/// Rasterizes report trees to PDF bytes in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRasterizer;

impl PdfRasterizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentRasterizer for PdfRasterizer {
    async fn rasterize(
        &self,
        root: &ReportNode,
        meta: &DocumentMeta,
    ) -> Result<Option<RenderedDocument>, ReportError> {
        let root = root.clone();
        let meta = meta.clone();
        tokio::task::spawn_blocking(move || render_pdf(&root, &meta))
            .await
            .map_err(|e| ReportError::Rasterization(format!("rasterizer task failed: {}", e)))?
    }
}

fn render_pdf(root: &ReportNode, meta: &DocumentMeta) -> Result<Option<RenderedDocument>, ReportError> {
    let mut blocks = Vec::new();
    collect_blocks(root, &mut blocks);
    if blocks.is_empty() {
        debug!("Report tree has nothing printable");
        return Ok(None);
    }

    let pages = layout(&blocks, meta);
    let page_count = pages.len();
    let bytes = build_document(pages, &meta.title)?;
    debug!(page_count, size = bytes.len(), "Rasterized report");

    Ok(Some(RenderedDocument { bytes, page_count }))
}

fn collect_blocks(node: &ReportNode, blocks: &mut Vec<Block>) {
    if node.tag == "svg" {
        match graphic_block(node) {
            Some(block) => blocks.push(block),
            None => debug!("Skipping graphic without explicit height"),
        }
        return;
    }

    if let Some(text) = node.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let level = node.heading_level();
        let size = node
            .style_value("font-size")
            .and_then(parse_px)
            .map(|px| px * PX_TO_PT)
            .unwrap_or(match level {
                Some(1) => 20.0,
                Some(2) => 15.0,
                Some(3) => 12.0,
                _ => 10.0,
            });
        let bold = level.is_some()
            || node
                .style_value("font-weight")
                .and_then(|w| w.parse::<u32>().ok())
                .map_or(false, |w| w >= 600);
        let color = node
            .style_value("color")
            .and_then(Rgb::parse)
            .unwrap_or(DEFAULT_TEXT_COLOR);
        let rule = node
            .style_value("border-bottom")
            .and_then(|b| b.split_whitespace().find_map(Rgb::parse));

        blocks.push(Block::Text {
            text: to_win_ansi(text),
            size,
            bold,
            color,
            rule,
        });
    }

    for child in &node.children {
        collect_blocks(child, blocks);
    }
}

fn graphic_block(svg: &ReportNode) -> Option<Block> {
    let height_px = svg.attr("height").and_then(parse_px).filter(|h| *h > 0.0)?;
    let view = svg
        .attr("viewBox")
        .and_then(|v| {
            let nums: Vec<f32> = v.split_whitespace().filter_map(|n| n.parse().ok()).collect();
            match nums.as_slice() {
                [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((*w, *h)),
                _ => None,
            }
        })
        .unwrap_or((600.0, 300.0));

    let color_of = |node: &ReportNode, attr: &str| {
        node.attr(attr).and_then(Rgb::parse).unwrap_or(DEFAULT_TEXT_COLOR)
    };
    let num = |node: &ReportNode, attr: &str| node.attr(attr).and_then(|v| v.parse::<f32>().ok());

    let marks = svg
        .children
        .iter()
        .filter_map(|mark| match mark.tag.as_str() {
            "rect" => Some(Mark::Rect {
                x: num(mark, "x")?,
                y: num(mark, "y")?,
                w: num(mark, "width")?,
                h: num(mark, "height")?,
                color: color_of(mark, "fill"),
            }),
            "polyline" => Some(Mark::Line {
                points: mark
                    .attr("points")?
                    .split_whitespace()
                    .filter_map(|pair| {
                        let (x, y) = pair.split_once(',')?;
                        Some((x.parse().ok()?, y.parse().ok()?))
                    })
                    .collect(),
                color: color_of(mark, "stroke"),
            }),
            _ => None,
        })
        .collect();

    Some(Block::Graphic {
        height: height_px * PX_TO_PT,
        view,
        marks,
    })
}

fn parse_px(value: &str) -> Option<f32> {
    value.trim().trim_end_matches("px").trim().parse().ok()
}

/// Base-14 fonts only cover WinAnsi; map the common typographic characters
/// and replace anything else.
fn to_win_ansi(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct PageWriter {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < MARGIN && self.y < PAGE_HEIGHT - MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // pages always holds at least one page
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn text_line(&mut self, line: &str, size: f32, bold: bool, color: Rgb) {
        let leading = size * 1.4;
        self.ensure_room(leading);
        self.y -= leading;
        let font = if bold { "F2" } else { "F1" };
        let y = self.y;
        self.ops().extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", color.operands()),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![MARGIN.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(line)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn rule(&mut self, color: Rgb) {
        self.y -= 4.0;
        let y = self.y;
        self.ops().extend([
            Operation::new("RG", color.operands()),
            Operation::new("w", vec![1.5f32.into()]),
            Operation::new("m", vec![MARGIN.into(), y.into()]),
            Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
        self.y -= 6.0;
    }

    fn graphic(&mut self, height: f32, view: (f32, f32), marks: &[Mark]) {
        let width = PAGE_WIDTH - 2.0 * MARGIN;
        self.ensure_room(height + 8.0);
        self.y -= 4.0;
        let top = self.y;
        let sx = width / view.0;
        let sy = height / view.1;

        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new("RG", FRAME_COLOR.operands()),
            Operation::new("w", vec![0.5f32.into()]),
            Operation::new(
                "re",
                vec![MARGIN.into(), (top - height).into(), width.into(), height.into()],
            ),
            Operation::new("S", vec![]),
        ];
        for mark in marks {
            match mark {
                Mark::Rect { x, y, w, h, color } => {
                    ops.push(Operation::new("rg", color.operands()));
                    ops.push(Operation::new(
                        "re",
                        vec![
                            (MARGIN + x * sx).into(),
                            (top - (y + h) * sy).into(),
                            (w * sx).into(),
                            (h * sy).into(),
                        ],
                    ));
                    ops.push(Operation::new("f", vec![]));
                }
                Mark::Line { points, color } => {
                    let Some(((x0, y0), rest)) = points.split_first() else {
                        continue;
                    };
                    ops.push(Operation::new("RG", color.operands()));
                    ops.push(Operation::new("w", vec![1.5f32.into()]));
                    ops.push(Operation::new(
                        "m",
                        vec![(MARGIN + x0 * sx).into(), (top - y0 * sy).into()],
                    ));
                    for (x, y) in rest {
                        ops.push(Operation::new(
                            "l",
                            vec![(MARGIN + x * sx).into(), (top - y * sy).into()],
                        ));
                    }
                    ops.push(Operation::new("S", vec![]));
                }
            }
        }
        ops.push(Operation::new("Q", vec![]));

        self.ops().extend(ops);
        self.y = top - height - 8.0;
    }
}

fn layout(blocks: &[Block], meta: &DocumentMeta) -> Vec<Vec<Operation>> {
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    let mut writer = PageWriter::new();

    writer.text_line(&to_win_ansi(&meta.title), 18.0, true, DEFAULT_TEXT_COLOR);
    writer.text_line(&to_win_ansi(&meta.date), 10.0, false, DEFAULT_TEXT_COLOR);
    writer.y -= 10.0;

    for block in blocks {
        match block {
            Block::Text {
                text,
                size,
                bold,
                color,
                rule,
            } => {
                let max_chars = ((usable / (size * 0.5)) as usize).max(10);
                for line in wrap(text, max_chars) {
                    writer.text_line(&line, *size, *bold, *color);
                }
                if let Some(rule) = rule {
                    writer.rule(*rule);
                }
            }
            Block::Graphic {
                height,
                view,
                marks,
            } => writer.graphic(height.min(PAGE_HEIGHT - 2.0 * MARGIN), *view, marks),
        }
    }

    writer.pages
}

fn build_document(pages: Vec<Vec<Operation>>, title: &str) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| ReportError::Rasterization(format!("Failed to encode page: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(to_win_ansi(title)),
        "Producer" => Object::string_literal("document-exporter"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ReportError::Rasterization(format!("Failed to write PDF: {}", e)))?;
    Ok(bytes)
}
