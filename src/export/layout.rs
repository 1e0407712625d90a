//! Lays an [`InvoiceDocument`] onto A4 pages as plain draw operations.
//!
//! Coordinates are millimetres with the origin at the bottom-left, the way
//! printpdf expects them. Text is measured with the embedded font. Content
//! that runs past the bottom margin moves to a fresh page, blocks taller than
//! a page are split line by line, and the item table header is repeated.

use crate::document::InvoiceDocument;
use crate::export::fonts::FontMetrics;
use crate::model::PartyInfo;

pub const PAGE_W: f32 = 210.0;
pub const PAGE_H: f32 = 297.0;
pub const MARGIN_X: f32 = 15.0;
pub const MARGIN_TOP: f32 = 15.0;
pub const MARGIN_BOTTOM: f32 = 15.0;
const CONTENT_W: f32 = PAGE_W - 2.0 * MARGIN_X;

const PT_TO_MM: f32 = 25.4 / 72.0;
const LINE_SPACING: f32 = 1.45;

const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 10.0;
const SMALL_SIZE: f32 = 9.0;
const HEADER_SIZE: f32 = 8.0;

pub const LOGO_MAX_W: f32 = 32.0;
pub const LOGO_MAX_H: f32 = 16.0;

const PARTY_GAP: f32 = 6.0;
const CELL_PAD: f32 = 2.0;
const SECTION_GAP: f32 = 7.0;

const COL_DESC_X: f32 = MARGIN_X + CELL_PAD;
const COL_DESC_W: f32 = 92.0;
const COL_QTY_X: f32 = MARGIN_X + 100.0;
const COL_RATE_RIGHT: f32 = MARGIN_X + 145.0;
const COL_AMOUNT_RIGHT: f32 = PAGE_W - MARGIN_X - CELL_PAD;

const TOTALS_W: f32 = 72.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        thickness: f32,
    },
    Fill {
        x: f32,
        y_top: f32,
        w: f32,
        h: f32,
        gray: f32,
    },
    /// Logo fitted into the box whose bottom-right corner is (`right`, `bottom`).
    Logo {
        right: f32,
        bottom: f32,
        max_w: f32,
        max_h: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub ops: Vec<Op>,
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

fn table_header_height() -> f32 {
    line_height(HEADER_SIZE) + CELL_PAD
}

/// Greedy word wrap to `max_width` as measured by `measure`. Honours explicit
/// newlines and splits words that are wider than a line on their own.
pub fn wrap(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if measure(&current) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, ch.to_string()));
                }
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Control characters have no glyphs; tabs read as spaces.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

struct Layout<'f> {
    fonts: &'f FontMetrics,
    pages: Vec<Page>,
    /// Top of the free space on the current page.
    y: f32,
}

impl<'f> Layout<'f> {
    fn new(fonts: &'f FontMetrics) -> Self {
        Layout {
            fonts,
            pages: vec![Page::default()],
            y: PAGE_H - MARGIN_TOP,
        }
    }

    fn push(&mut self, op: Op) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn room(&self) -> f32 {
        self.y - MARGIN_BOTTOM
    }

    fn at_page_top(&self) -> bool {
        self.y >= PAGE_H - MARGIN_TOP
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = PAGE_H - MARGIN_TOP;
    }

    /// Starts a new page when `height` no longer fits. Returns true if it did.
    /// Callers with content taller than a page split it themselves.
    fn ensure(&mut self, height: f32) -> bool {
        if height <= self.room() || self.at_page_top() {
            return false;
        }
        self.new_page();
        true
    }

    fn width(&self, text: &str, size: f32, bold: bool) -> f32 {
        self.fonts.width(text, size, bold)
    }

    fn wrap(&self, text: &str, max_width: f32, size: f32, bold: bool) -> Vec<String> {
        wrap(text, max_width, |s| self.fonts.width(s, size, bold))
    }

    fn text(&mut self, x: f32, baseline: f32, size: f32, bold: bool, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push(Op::Text {
            x,
            y: baseline,
            size,
            bold,
            text: printable(text),
        });
    }

    fn text_right(&mut self, right: f32, baseline: f32, size: f32, bold: bool, text: &str) {
        let x = (right - self.width(text, size, bold)).max(MARGIN_X);
        self.text(x, baseline, size, bold, text);
    }

    /// Writes one line at the cursor and moves it down.
    fn line(&mut self, x: f32, size: f32, bold: bool, text: &str) {
        let h = line_height(size);
        self.ensure(h);
        self.text(x, self.y - size * PT_TO_MM, size, bold, text);
        self.y -= h;
    }

    /// How many lines of `line_h` fit above the bottom margin after `reserved`.
    /// Always at least one so a split block makes progress.
    fn lines_that_fit(&self, line_h: f32, reserved: f32) -> usize {
        (((self.room() - reserved) / line_h).floor().max(1.0)) as usize
    }

    fn gap(&mut self, h: f32) {
        self.y -= h;
    }

    fn finish(self) -> Vec<Page> {
        self.pages
    }
}

pub fn layout(doc: &InvoiceDocument, fonts: &FontMetrics) -> Vec<Page> {
    let mut l = Layout::new(fonts);
    header(&mut l, doc);
    l.gap(SECTION_GAP);
    parties(&mut l, &doc.from, &doc.bill_to);
    l.gap(SECTION_GAP);
    items(&mut l, doc);
    l.gap(SECTION_GAP / 2.0);
    totals(&mut l, doc);
    if let Some(notes) = &doc.notes {
        l.gap(SECTION_GAP);
        notes_block(&mut l, notes);
    }
    l.finish()
}

fn header(l: &mut Layout, doc: &InvoiceDocument) {
    let top = l.y;
    let text_w = if doc.logo.is_some() {
        CONTENT_W - LOGO_MAX_W - PARTY_GAP
    } else {
        CONTENT_W
    };
    if doc.logo.is_some() {
        l.push(Op::Logo {
            right: PAGE_W - MARGIN_X,
            bottom: top - LOGO_MAX_H,
            max_w: LOGO_MAX_W,
            max_h: LOGO_MAX_H,
        });
    }
    l.line(MARGIN_X, TITLE_SIZE, true, "INVOICE");
    l.gap(1.0);
    for text in [
        format!("Invoice Number: {}", doc.number),
        format!("Date: {}", doc.issue_date),
        format!("Due Date: {}", doc.due_date),
    ] {
        for line in l.wrap(&text, text_w, SMALL_SIZE, false) {
            l.line(MARGIN_X, SMALL_SIZE, false, &line);
        }
    }
    if doc.logo.is_some() && l.pages.len() == 1 {
        l.y = l.y.min(top - LOGO_MAX_H);
    }
}

fn party_lines(l: &Layout, heading: &str, party: &PartyInfo, width: f32) -> Vec<(String, bool)> {
    let mut lines = vec![(heading.to_string(), true)];
    for (field, bold) in [
        (&party.name, true),
        (&party.email, false),
        (&party.phone, false),
        (&party.address, false),
    ] {
        if field.trim().is_empty() {
            continue;
        }
        lines.extend(l.wrap(field, width, SMALL_SIZE, bold).into_iter().map(|s| (s, bold)));
    }
    lines
}

/// The two party blocks side by side. Rows advance in lockstep and the pair
/// is split across pages when it is taller than the remaining space.
fn parties(l: &mut Layout, from: &PartyInfo, bill_to: &PartyInfo) {
    let col_w = (CONTENT_W - PARTY_GAP) / 2.0;
    let text_w = col_w - 2.0 * CELL_PAD;
    let blocks = [
        party_lines(l, "From:", from, text_w),
        party_lines(l, "Bill To:", bill_to, text_w),
    ];
    let line_h = line_height(SMALL_SIZE);
    let rows = blocks.iter().map(Vec::len).max().unwrap_or(0);
    let full_h = rows as f32 * line_h + 2.0 * CELL_PAD;
    let page_h = PAGE_H - MARGIN_TOP - MARGIN_BOTTOM;
    if full_h > l.room() && (full_h <= page_h || l.room() < line_h + 2.0 * CELL_PAD) {
        l.ensure(full_h.min(page_h));
    }

    let mut start = 0;
    while start < rows {
        let count = l.lines_that_fit(line_h, 2.0 * CELL_PAD).min(rows - start);
        let h = count as f32 * line_h + 2.0 * CELL_PAD;
        let top = l.y;
        for (i, lines) in blocks.iter().enumerate() {
            let x = MARGIN_X + i as f32 * (col_w + PARTY_GAP);
            l.push(Op::Fill {
                x,
                y_top: top,
                w: col_w,
                h,
                gray: 0.96,
            });
            let first = top - CELL_PAD - SMALL_SIZE * PT_TO_MM;
            for (row, (text, bold)) in lines.iter().skip(start).take(count).enumerate() {
                l.text(x + CELL_PAD, first - row as f32 * line_h, SMALL_SIZE, *bold, text);
            }
        }
        l.y = top - h;
        start += count;
        if start < rows {
            l.new_page();
        }
    }
}

fn table_header(l: &mut Layout) {
    let h = table_header_height();
    l.ensure(h);
    let top = l.y;
    l.push(Op::Fill {
        x: MARGIN_X,
        y_top: top,
        w: CONTENT_W,
        h,
        gray: 0.92,
    });
    let baseline = top - CELL_PAD / 2.0 - HEADER_SIZE * PT_TO_MM;
    l.text(COL_DESC_X, baseline, HEADER_SIZE, true, "DESCRIPTION");
    l.text(COL_QTY_X, baseline, HEADER_SIZE, true, "QTY");
    l.text_right(COL_RATE_RIGHT, baseline, HEADER_SIZE, true, "RATE");
    l.text_right(COL_AMOUNT_RIGHT, baseline, HEADER_SIZE, true, "AMOUNT");
    l.y = top - h;
}

fn continue_table(l: &mut Layout) {
    l.new_page();
    table_header(l);
}

fn items(l: &mut Layout, doc: &InvoiceDocument) {
    l.line(MARGIN_X, BODY_SIZE, true, "Items");
    l.gap(1.0);
    let line_h = line_height(BODY_SIZE);
    // Keep the header with at least one row.
    l.ensure(table_header_height() + line_h + CELL_PAD);
    table_header(l);

    let page_rows_h = PAGE_H - MARGIN_TOP - MARGIN_BOTTOM - table_header_height();
    for row in &doc.rows {
        let lines = l.wrap(&row.description, COL_DESC_W, BODY_SIZE, false);
        let full_h = lines.len() as f32 * line_h + CELL_PAD;
        // Move the row whole when it fits a fresh page; otherwise split it here.
        if full_h > l.room() && (full_h <= page_rows_h || l.room() < line_h + CELL_PAD) {
            continue_table(l);
        }

        let mut rest = &lines[..];
        let mut first_part = true;
        while !rest.is_empty() {
            let count = l.lines_that_fit(line_h, CELL_PAD).min(rest.len());
            let (part, tail) = rest.split_at(count);
            let top = l.y;
            let first = top - CELL_PAD / 2.0 - BODY_SIZE * PT_TO_MM;
            for (i, line) in part.iter().enumerate() {
                l.text(COL_DESC_X, first - i as f32 * line_h, BODY_SIZE, false, line);
            }
            if first_part {
                l.text(COL_QTY_X, first, BODY_SIZE, false, &row.quantity);
                l.text_right(COL_RATE_RIGHT, first, BODY_SIZE, false, &row.rate);
                l.text_right(COL_AMOUNT_RIGHT, first, BODY_SIZE, false, &row.amount);
                first_part = false;
            }
            l.y = top - part.len() as f32 * line_h - CELL_PAD;
            rest = tail;
            if !rest.is_empty() {
                continue_table(l);
            }
        }
        l.push(Op::Rule {
            x1: MARGIN_X,
            x2: PAGE_W - MARGIN_X,
            y: l.y,
            thickness: 0.3,
        });
    }
}

fn totals(l: &mut Layout, doc: &InvoiceDocument) {
    let row_h = line_height(BODY_SIZE);
    l.ensure(3.0 * row_h + 2.0);
    let left = PAGE_W - MARGIN_X - TOTALS_W;
    let right = COL_AMOUNT_RIGHT;

    for (label, value) in [("Subtotal:", &doc.subtotal), (&doc.tax_label[..], &doc.tax_amount)] {
        let baseline = l.y - BODY_SIZE * PT_TO_MM;
        l.text(left, baseline, BODY_SIZE, false, label);
        l.text_right(right, baseline, BODY_SIZE, false, value);
        l.y -= row_h;
    }
    l.push(Op::Rule {
        x1: left,
        x2: PAGE_W - MARGIN_X,
        y: l.y,
        thickness: 0.5,
    });
    l.gap(1.0);
    let baseline = l.y - BODY_SIZE * PT_TO_MM;
    l.text(left, baseline, BODY_SIZE, true, "Total:");
    l.text_right(right, baseline, BODY_SIZE, true, &doc.total);
    l.y -= row_h;
}

fn notes_block(l: &mut Layout, notes: &str) {
    l.ensure(2.0 * line_height(SMALL_SIZE));
    l.line(MARGIN_X, SMALL_SIZE, true, "Notes");
    for line in l.wrap(notes, CONTENT_W, SMALL_SIZE, false) {
        l.line(MARGIN_X, SMALL_SIZE, false, &line);
    }
}
