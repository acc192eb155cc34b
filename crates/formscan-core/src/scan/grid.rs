//! Multi-column checkbox grid and header-row table detection.
//!
//! Both detectors work from checkbox character offsets, which survive OCR
//! far better than ruling lines do. Offsets are sampled over a bounded
//! window and clustered into column boundaries.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::FieldCandidate;
use super::context::ParseContext;
use super::patterns::{CHECKBOX, WIDE_GAP, checkbox_count, checkbox_offsets};
use super::recognizers::{Recognizer, RecognizerMatch};
use super::section::looks_like_heading;
use super::title::{clean_option, clean_title};
use crate::diagnostics::ParseEvent;
use crate::models::field::{Choice, Control, Section};
use crate::text::Line;

lazy_static! {
    static ref SLASH_PIPE: Regex = Regex::new(r"\s*[/|]\s*").unwrap();
}

/// Labels from annotation columns that bleed into option text when a row
/// has no checkbox under them.
const BLEED_LABELS: &[&str] = &["frequency", "comments", "how often", "date", "notes"];

/// An inferred grid shape, kept for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDescriptor {
    /// Column boundary offsets, ascending.
    pub boundaries: Vec<usize>,
    /// Number of data lines consumed.
    pub rows: usize,
    /// Category headers, when a header line preceded the grid.
    pub headers: Option<Vec<String>>,
    /// Section the grid was found in.
    pub section: Section,
}

/// Detects header-row tables and header-less checkbox grids inside
/// medical/dental-like sections. Runs ahead of the generic recognizers;
/// lines that fail its acceptance gates fall through to them untouched.
pub struct GridRecognizer;

impl Recognizer for GridRecognizer {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        if !ctx.section.is_medical_like() {
            return None;
        }

        try_header_table(lines, at, ctx).or_else(|| try_checkbox_grid(lines, at, ctx))
    }
}

/// Header-row table: capitalized column headers separated by wide
/// whitespace, with checkbox rows aligned under the header offsets.
fn try_header_table(
    lines: &[Line],
    at: usize,
    ctx: &mut ParseContext<'_>,
) -> Option<RecognizerMatch> {
    let header = &lines[at].text;
    if checkbox_count(header) > 0 {
        return None;
    }

    let tokens = split_with_offsets(header, &WIDE_GAP);
    if tokens.len() < 2
        || !tokens.iter().all(|(_, t)| starts_uppercase(t))
    {
        return None;
    }
    let header_offsets: Vec<usize> = tokens.iter().map(|(o, _)| *o).collect();
    let tolerance = ctx.config.grid.header_align_tolerance;

    // Collect contiguous data lines whose checkbox offsets align with the
    // header token start offsets.
    let mut rows = 0;
    for line in lines[at + 1..]
        .iter()
        .take(ctx.config.grid.lookahead)
    {
        if line.is_blank() || looks_like_heading(&line.text) {
            break;
        }
        let offsets = checkbox_offsets(&line.text);
        if offsets.len() < 2 {
            break;
        }
        let aligned = offsets
            .iter()
            .filter(|o| {
                header_offsets
                    .iter()
                    .any(|h| o.abs_diff(*h) <= tolerance)
            })
            .count();
        if aligned < 2 {
            break;
        }
        rows += 1;
    }

    if rows < ctx.config.grid.min_table_rows {
        return None;
    }

    // One option list per header column.
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); tokens.len()];
    for line in &lines[at + 1..at + 1 + rows] {
        for (start, end) in checkbox_spans(&line.text) {
            let col = nearest(&header_offsets, start);
            let next_box = CHECKBOX
                .find_at(&line.text, end)
                .map(|m| m.start())
                .unwrap_or(line.text.len());
            let label = clean_option(slice(&line.text, end, next_box));
            if !label.is_empty() {
                columns[col].push(label);
            }
        }
    }

    let candidates: Vec<FieldCandidate> = tokens
        .iter()
        .zip(&columns)
        .filter(|(_, options)| !options.is_empty())
        .map(|((_, token), options)| {
            let title = clean_title(token);
            let choices: Vec<Choice> =
                options.iter().cloned().map(Choice::tagged).collect();
            FieldCandidate::new(
                &title,
                Control::Radio {
                    options: choices,
                    multi: true,
                },
                ctx,
                lines[at].index,
            )
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }

    debug!(rows, columns = tokens.len(), "header-row table accepted");
    ctx.events.push(ParseEvent::GridAccepted {
        line: lines[at].index,
        rows,
        columns: tokens.len(),
    });

    Some(RecognizerMatch::new(candidates, 1 + rows))
}

/// Header-less checkbox grid, optionally preceded by a category header
/// line ("Aches / Pains / Swelling").
fn try_checkbox_grid(
    lines: &[Line],
    at: usize,
    ctx: &mut ParseContext<'_>,
) -> Option<RecognizerMatch> {
    let grid_cfg = &ctx.config.grid;

    let (headers, start) = if is_grid_entry(&lines[at].text, grid_cfg.min_checkboxes, grid_cfg.min_spacing) {
        (None, at)
    } else {
        let headers = category_headers(&lines[at].text)?;
        let next = lines.get(at + 1)?;
        if !is_grid_entry(&next.text, grid_cfg.min_checkboxes, grid_cfg.min_spacing) {
            return None;
        }
        (Some(headers), at + 1)
    };

    // Sample checkbox rows over the lookahead window.
    let mut sampled: Vec<&Line> = Vec::new();
    for line in lines[start..].iter().take(grid_cfg.lookahead) {
        if line.is_blank() || looks_like_heading(&line.text) || checkbox_count(&line.text) == 0 {
            break;
        }
        sampled.push(line);
    }

    if sampled.len() < grid_cfg.min_rows {
        ctx.events.push(ParseEvent::GridRejected {
            line: lines[at].index,
            reason: format!("{} data rows", sampled.len()),
        });
        return None;
    }

    let boundaries = cluster_columns(&sampled, grid_cfg.cluster_tolerance, grid_cfg.min_support, grid_cfg.relaxed_support)?;

    // Harvest option labels column by column.
    let mut options: Vec<String> = Vec::new();
    for line in &sampled {
        for (box_start, box_end) in checkbox_spans(&line.text) {
            let col = nearest(&boundaries, box_start);
            let next_box = CHECKBOX
                .find_at(&line.text, box_end)
                .map(|m| m.start())
                .unwrap_or(line.text.len());
            let next_boundary = boundaries
                .iter()
                .copied()
                .find(|b| *b > box_start + 1)
                .unwrap_or(line.text.len());
            let end = next_box.min(next_boundary.max(box_end)).max(box_end);

            let mut label = clean_option(slice(&line.text, box_end, end));
            trim_bleed(&mut label);
            if label.is_empty() {
                continue;
            }

            let name = match &headers {
                Some(h) if !h.is_empty() => {
                    let idx = col.min(h.len() - 1);
                    format!("{} - {}", h[idx], label)
                }
                _ => label,
            };
            options.push(name);
        }
    }

    let mut seen = std::collections::HashSet::new();
    options.retain(|o| seen.insert(o.to_lowercase()));

    if options.len() < grid_cfg.min_unique_options {
        ctx.events.push(ParseEvent::GridRejected {
            line: lines[at].index,
            reason: format!("{} unique options", options.len()),
        });
        return None;
    }

    let descriptor = GridDescriptor {
        boundaries,
        rows: sampled.len(),
        headers: headers.clone(),
        section: ctx.section,
    };
    debug!(?descriptor, "checkbox grid accepted");
    ctx.events.push(ParseEvent::GridAccepted {
        line: lines[at].index,
        rows: descriptor.rows,
        columns: descriptor.boundaries.len(),
    });

    let title = grid_title(ctx.section);
    let consumed = (start - at) + descriptor.rows;
    let choices: Vec<Choice> = options.into_iter().map(Choice::tagged).collect();
    let candidate = FieldCandidate::new(
        title,
        Control::Radio {
            options: choices,
            multi: true,
        },
        ctx,
        lines[at].index,
    );

    Some(RecognizerMatch::single(candidate, consumed))
}

/// Cluster checkbox offsets across sampled lines into column boundaries.
///
/// A cluster survives at the normal support level when at least three
/// columns do; two-column grids require the relaxed (higher) support.
fn cluster_columns(
    sampled: &[&Line],
    tolerance: usize,
    min_support: f32,
    relaxed_support: f32,
) -> Option<Vec<usize>> {
    let mut offsets: Vec<(usize, usize)> = Vec::new(); // (offset, line_idx)
    for (i, line) in sampled.iter().enumerate() {
        for o in checkbox_offsets(&line.text) {
            offsets.push((o, i));
        }
    }
    offsets.sort_unstable();

    struct Cluster {
        start: usize,
        lines: std::collections::HashSet<usize>,
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    for (offset, line_idx) in offsets {
        match clusters.last_mut() {
            Some(c) if offset - c.start <= tolerance => {
                c.lines.insert(line_idx);
            }
            _ => {
                let mut lines = std::collections::HashSet::new();
                lines.insert(line_idx);
                clusters.push(Cluster { start: offset, lines });
            }
        }
    }

    let total = sampled.len() as f32;
    let supported = |level: f32| -> Vec<usize> {
        clusters
            .iter()
            .filter(|c| c.lines.len() as f32 / total >= level)
            .map(|c| c.start)
            .collect()
    };

    let normal = supported(min_support);
    if normal.len() >= 3 {
        return Some(normal);
    }
    let relaxed = supported(relaxed_support);
    if relaxed.len() >= 2 {
        return Some(relaxed);
    }
    None
}

/// Split a category header line into its tokens ("A / B / C", "A | B",
/// or wide-whitespace-separated).
fn category_headers(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.len() > 80 || checkbox_count(trimmed) > 0 {
        return None;
    }

    let sep = if trimmed.contains('/') || trimmed.contains('|') {
        &*SLASH_PIPE
    } else {
        &*WIDE_GAP
    };

    let tokens: Vec<String> = split_with_offsets(trimmed, sep)
        .into_iter()
        .map(|(_, t)| clean_title(t))
        .filter(|t| !t.is_empty())
        .collect();

    (tokens.len() >= 2 && tokens.iter().all(|t| t.split_whitespace().count() <= 4))
        .then_some(tokens)
}

/// A line that can open a header-less grid: enough checkboxes, spaced
/// widely enough apart.
fn is_grid_entry(line: &str, min_checkboxes: usize, min_spacing: usize) -> bool {
    let offsets = checkbox_offsets(line);
    offsets.len() >= min_checkboxes
        && offsets.windows(2).all(|w| w[1] - w[0] >= min_spacing)
}

fn grid_title(section: Section) -> &'static str {
    match section {
        Section::DentalHistory => "Dental Conditions",
        Section::Medications => "Medications",
        _ => "Medical Conditions",
    }
}

fn trim_bleed(label: &mut String) {
    let lower = label.to_lowercase();
    for bleed in BLEED_LABELS {
        if lower.ends_with(bleed) && lower.len() > bleed.len() {
            let cut = label.len() - bleed.len();
            label.truncate(cut);
            while label.ends_with([' ', '-', ':']) {
                label.pop();
            }
            return;
        }
    }
}

fn split_with_offsets<'t>(line: &'t str, sep: &Regex) -> Vec<(usize, &'t str)> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in sep.find_iter(line) {
        if m.start() > last {
            out.push((last, &line[last..m.start()]));
        }
        last = m.end();
    }
    if last < line.len() {
        out.push((last, &line[last..]));
    }
    out.into_iter()
        .map(|(o, t)| (o + leading_ws(t), t.trim()))
        .filter(|(_, t)| !t.is_empty())
        .collect()
}

fn leading_ws(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn starts_uppercase(token: &str) -> bool {
    token
        .chars()
        .find(|c| c.is_alphabetic())
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
}

/// Index of the boundary nearest to `offset`.
fn nearest(boundaries: &[usize], offset: usize) -> usize {
    boundaries
        .iter()
        .enumerate()
        .min_by_key(|(_, b)| b.abs_diff(offset))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// (start, end) byte spans of each checkbox on a line.
fn checkbox_spans(line: &str) -> Vec<(usize, usize)> {
    CHECKBOX.find_iter(line).map(|m| (m.start(), m.end())).collect()
}

/// Byte-offset slice clamped to char boundaries.
fn slice(text: &str, start: usize, end: usize) -> &str {
    let mut start = start.min(text.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = end.clamp(start, text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[start..end]
}
