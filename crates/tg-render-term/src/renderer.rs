//! Cell-grid diagram renderer.

use rustc_hash::FxHashSet;
use serde::Serialize;
use tg_core::{DiagramRenderer, RasterImage, RenderError};
use tg_parser::{DiagramDescription, parse_description};
use tracing::debug;

use crate::config::TermRenderConfig;
use crate::glyphs::BoxGlyphs;
use crate::layout::{RankLayout, rank_layout};

const BOX_HEIGHT: usize = 3;
/// Box rows plus the row reserved above each box for a self loop.
const SLOT_HEIGHT: usize = BOX_HEIGHT + 1;

/// Counts reported alongside a rendered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub width: usize,
    pub height: usize,
    pub node_count: usize,
    pub relation_count: usize,
    pub rank_count: usize,
    /// Relations drawn through the lanes under the diagram.
    pub lane_count: usize,
}

#[derive(Debug, Clone)]
pub struct TermRender {
    pub image: RasterImage,
    pub stats: RenderStats,
}

#[derive(Debug, Clone, Copy)]
struct NodeBox {
    x: usize,
    y: usize,
    width: usize,
}

impl NodeBox {
    const fn right(&self) -> usize {
        self.x + self.width - 1
    }

    const fn middle(&self) -> usize {
        self.y + 1
    }

    const fn bottom(&self) -> usize {
        self.y + BOX_HEIGHT - 1
    }
}

/// Renders diagram descriptions to a character raster.
#[derive(Debug, Clone)]
pub struct TermDiagramRenderer {
    config: TermRenderConfig,
    glyphs: BoxGlyphs,
}

impl Default for TermDiagramRenderer {
    fn default() -> Self {
        Self::new(TermRenderConfig::default())
    }
}

impl TermDiagramRenderer {
    #[must_use]
    pub fn new(config: TermRenderConfig) -> Self {
        Self {
            glyphs: BoxGlyphs::for_mode(config.glyphs),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &TermRenderConfig {
        &self.config
    }

    /// Parse and draw `source`.
    pub fn render_source(&self, source: &str) -> Result<TermRender, RenderError> {
        let description = parse_description(source)?;
        self.render_description(&description)
    }

    /// Draw an already parsed description.
    pub fn render_description(
        &self,
        description: &DiagramDescription,
    ) -> Result<TermRender, RenderError> {
        let layout = rank_layout(description);
        let labels: Vec<String> = description
            .nodes
            .iter()
            .map(|node| self.truncate_label(&node.label))
            .collect();

        let gap = self.config.effective_column_gap();
        let padding = self.config.padding;
        let mut column_x = Vec::with_capacity(layout.rank_count());
        let mut column_width = Vec::with_capacity(layout.rank_count());
        let mut cursor = padding;
        for column in &layout.columns {
            let width = column
                .iter()
                .map(|&node| box_width(&labels[node]))
                .max()
                .unwrap_or(0);
            column_x.push(cursor);
            column_width.push(width);
            cursor += width + gap;
        }

        let boxes: Vec<NodeBox> = (0..description.nodes.len())
            .map(|node| {
                let rank = layout.ranks[node];
                let slot = layout.slot(node).unwrap_or(0);
                NodeBox {
                    x: column_x[rank],
                    y: padding + slot * (SLOT_HEIGHT + self.config.row_gap) + 1,
                    width: box_width(&labels[node]),
                }
            })
            .collect();

        let mut drawn = FxHashSet::default();
        let mut forward = Vec::new();
        let mut loops = Vec::new();
        let mut lanes = Vec::new();
        for relation in &description.relations {
            if !drawn.insert((relation.from, relation.to)) {
                continue;
            }
            let (from_rank, to_rank) = (layout.ranks[relation.from], layout.ranks[relation.to]);
            if relation.is_self_relation() {
                loops.push(relation.from);
            } else if from_rank < to_rank {
                forward.push((relation.from, relation.to));
            } else {
                lanes.push((relation.from, relation.to));
            }
        }

        let (width, height) = canvas_size(
            &layout,
            &column_width,
            gap,
            padding,
            self.config.row_gap,
            lanes.len(),
        );
        if width > self.config.max_width || height > self.config.max_height {
            return Err(RenderError::TooLarge {
                width,
                height,
                max_width: self.config.max_width,
                max_height: self.config.max_height,
            });
        }

        let mut image = RasterImage::new(width, height);
        for &(from, to) in &forward {
            let target_rank = layout.ranks[to];
            let bend_x = column_x[target_rank] - 1 - gap / 2;
            self.draw_forward(&mut image, boxes[from], boxes[to], bend_x);
        }
        let nodes_bottom = padding + nodes_height(&layout, self.config.row_gap);
        for (lane, &(from, to)) in lanes.iter().enumerate() {
            let lane_y = nodes_bottom + 1 + lane;
            self.draw_lane(&mut image, boxes[from], boxes[to], lane_y);
        }
        for (node_box, label) in boxes.iter().zip(&labels) {
            self.draw_box(&mut image, *node_box, label);
        }
        for &node in &loops {
            self.draw_self_loop(&mut image, boxes[node]);
        }

        let stats = RenderStats {
            width,
            height,
            node_count: description.nodes.len(),
            relation_count: description.relations.len(),
            rank_count: layout.rank_count(),
            lane_count: lanes.len(),
        };
        debug!(
            width,
            height,
            nodes = stats.node_count,
            relations = stats.relation_count,
            lanes = stats.lane_count,
            "rendered terminal diagram"
        );
        Ok(TermRender { image, stats })
    }

    fn truncate_label(&self, text: &str) -> String {
        let max_chars = self.config.label_limit();
        let sanitized: String = text
            .chars()
            .map(|ch| if ch.is_control() { ' ' } else { ch })
            .collect();
        if sanitized.chars().count() <= max_chars {
            return sanitized;
        }
        let mut truncated: String = sanitized.chars().take(max_chars - 1).collect();
        truncated.push(self.glyphs.ellipsis);
        truncated
    }

    fn draw_box(&self, image: &mut RasterImage, node: NodeBox, label: &str) {
        let g = &self.glyphs;
        let (left, right, bottom) = (node.x, node.right(), node.bottom());
        image.set(left, node.y, g.top_left);
        image.set(right, node.y, g.top_right);
        image.set(left, bottom, g.bottom_left);
        image.set(right, bottom, g.bottom_right);
        for x in left + 1..right {
            image.set(x, node.y, g.horizontal);
            image.set(x, bottom, g.horizontal);
        }
        for x in left + 1..right {
            image.set(x, node.middle(), ' ');
        }
        image.set(left, node.middle(), g.vertical);
        image.set(right, node.middle(), g.vertical);

        let label_len = label.chars().count();
        let label_x = left + (node.width - label_len) / 2;
        image.set_str(label_x, node.middle(), label);
    }

    fn draw_forward(&self, image: &mut RasterImage, from: NodeBox, to: NodeBox, bend_x: usize) {
        let g = &self.glyphs;
        let (start_x, start_y) = (from.right() + 1, from.middle());
        let (end_x, end_y) = (to.x - 1, to.middle());

        if start_y == end_y {
            self.hline(image, start_x, end_x, start_y);
        } else {
            self.hline(image, start_x, bend_x, start_y);
            let (first, second) = if start_y < end_y {
                (g.top_right, g.bottom_left)
            } else {
                (g.bottom_right, g.top_left)
            };
            self.corner(image, bend_x, start_y, first);
            self.vline(image, bend_x, start_y.min(end_y) + 1, start_y.max(end_y));
            self.corner(image, bend_x, end_y, second);
            self.hline(image, bend_x + 1, end_x, end_y);
        }
        image.set(end_x, end_y, g.arrow_right);
    }

    /// Route a backward or same-column relation under the diagram. The
    /// target never sits right of the source here.
    fn draw_lane(&self, image: &mut RasterImage, from: NodeBox, to: NodeBox, lane_y: usize) {
        let g = &self.glyphs;
        let start_x = from.right() - 1;
        let end_x = to.x + 1;

        self.vline(image, start_x, from.bottom() + 1, lane_y);
        self.vline(image, end_x, to.bottom() + 2, lane_y);
        self.hline(image, end_x + 1, start_x, lane_y);
        self.corner(image, start_x, lane_y, g.bottom_right);
        self.corner(image, end_x, lane_y, g.bottom_left);
        image.set(end_x, to.bottom() + 1, g.arrow_up);
    }

    fn draw_self_loop(&self, image: &mut RasterImage, node: NodeBox) {
        let g = &self.glyphs;
        let (left, right) = (node.x + 1, node.right() - 1);
        let above = node.y - 1;
        image.set(left, above, g.top_left);
        for x in left + 1..right {
            image.set(x, above, g.horizontal);
        }
        image.set(right, above, g.top_right);
        image.set(left, node.y, g.t_up);
        image.set(right, node.y, g.arrow_down);
    }

    /// Horizontal run over `[from, to)`.
    fn hline(&self, image: &mut RasterImage, from: usize, to: usize, y: usize) {
        for x in from..to {
            self.merge(image, x, y, self.glyphs.horizontal);
        }
    }

    /// Vertical run over `[from, to)`.
    fn vline(&self, image: &mut RasterImage, x: usize, from: usize, to: usize) {
        for y in from..to {
            self.merge(image, x, y, self.glyphs.vertical);
        }
    }

    fn corner(&self, image: &mut RasterImage, x: usize, y: usize, ch: char) {
        match image.get(x, y) {
            Some(' ') => image.set(x, y, ch),
            Some(existing) if self.glyphs.is_line(existing) => image.set(x, y, self.glyphs.cross),
            _ => {}
        }
    }

    fn merge(&self, image: &mut RasterImage, x: usize, y: usize, ch: char) {
        match image.get(x, y) {
            Some(' ') => image.set(x, y, ch),
            Some(existing) if existing != ch && self.glyphs.is_line(existing) => {
                image.set(x, y, self.glyphs.cross);
            }
            _ => {}
        }
    }
}

impl DiagramRenderer for TermDiagramRenderer {
    fn render(&self, source: &str) -> Result<RasterImage, RenderError> {
        self.render_source(source).map(|render| render.image)
    }

    fn name(&self) -> &'static str {
        "term"
    }
}

fn box_width(label: &str) -> usize {
    label.chars().count() + 4
}

fn nodes_height(layout: &RankLayout, row_gap: usize) -> usize {
    let slots = layout.max_column_len();
    if slots == 0 {
        return 0;
    }
    slots * SLOT_HEIGHT + (slots - 1) * row_gap
}

fn canvas_size(
    layout: &RankLayout,
    column_width: &[usize],
    gap: usize,
    padding: usize,
    row_gap: usize,
    lanes: usize,
) -> (usize, usize) {
    let columns: usize = column_width.iter().sum();
    let gaps = gap * layout.rank_count().saturating_sub(1);
    let lane_rows = if lanes == 0 { 0 } else { lanes + 1 };
    (
        padding * 2 + columns + gaps,
        padding * 2 + nodes_height(layout, row_gap) + lane_rows,
    )
}
