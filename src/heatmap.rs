//! Render a dissimilarity matrix as a color mapped image in a single page PDF document.
//!
//! Each matrix entry becomes one pixel of an embedded RGB image, colored on a continuous scale
//! between the minimum and maximum entries. Row 0 is drawn at the top of the image. A vertical
//! color scale bar with tick labels is drawn to the right of the image.

use std::{fs, io, path::Path};

use colorous::Gradient;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

use crate::distance::DissimilarityMatrix;

const FONT: Name<'static> = Name(b"F1");
const IMAGE: Name<'static> = Name(b"Im1");
const SCALE: Name<'static> = Name(b"Im2");
/// Number of color steps in the scale bar.
const SCALE_STEPS: usize = 256;
const SCALE_TICKS: usize = 5;

/// Renderer configuration; built once and shared by every render call.
#[derive(Clone)]
pub struct HeatmapStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Color map used for matrix values.
    pub gradient: Gradient,
    /// Page width and height in points.
    pub page_size: (f32, f32),
    pub font_size: f32,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            title: "Simpoint BBV Self-Similarity Matrix (Manhattan Distance)".to_string(),
            x_label: "BBV vector j".to_string(),
            y_label: "BBV vector i".to_string(),
            gradient: colorous::VIRIDIS,
            page_size: (612.0, 612.0),
            font_size: 12.0,
        }
    }
}

impl std::fmt::Debug for HeatmapStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeatmapStyle")
            .field("title", &self.title)
            .field("x_label", &self.x_label)
            .field("y_label", &self.y_label)
            .field("page_size", &self.page_size)
            .field("font_size", &self.font_size)
            .finish_non_exhaustive()
    }
}

/// Page placement of the matrix image and scale bar, in points.
struct Layout {
    image: Rect,
    scale: Rect,
}

impl Layout {
    fn new(style: &HeatmapStyle) -> Self {
        let (width, height) = style.page_size;
        let margin = style.font_size * 4.0;
        let scale_width = style.font_size * 1.5;
        let side = (width - margin * 3.0 - scale_width * 3.0).min(height - margin * 2.0);
        let image = Rect::new(margin, margin, margin + side, margin + side);
        let scale_x = image.x2 + margin * 0.5;
        let scale = Rect::new(scale_x, image.y1, scale_x + scale_width, image.y2);
        Self { image, scale }
    }
}

/// Map `value` in `[lo, hi]` to a position in `[0.0, 1.0]`. A flat range maps to 0.0.
fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Convert `matrix` into 8-bit RGB samples, row-major with row 0 first.
pub fn matrix_pixels(matrix: &DissimilarityMatrix, gradient: &Gradient) -> Vec<u8> {
    let (lo, hi) = matrix.range().unwrap_or((0.0, 0.0));
    matrix
        .rows()
        .flat_map(|row| row.iter())
        .flat_map(|d| {
            let c = gradient.eval_continuous(normalize(*d, lo, hi));
            [c.r, c.g, c.b]
        })
        .collect()
}

/// Pixels for a one pixel wide vertical scale, maximum at the top.
fn scale_pixels(gradient: &Gradient) -> Vec<u8> {
    (0..SCALE_STEPS)
        .rev()
        .flat_map(|i| {
            let c = gradient.eval_continuous(i as f64 / (SCALE_STEPS - 1) as f64);
            [c.r, c.g, c.b]
        })
        .collect()
}

/// Build the PDF document for `matrix` in memory.
pub fn heatmap_document(matrix: &DissimilarityMatrix, style: &HeatmapStyle) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let font_id = Ref::new(4);
    let image_id = Ref::new(5);
    let scale_id = Ref::new(6);
    let content_id = Ref::new(7);

    let layout = Layout::new(style);
    let (width, height) = style.page_size;

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, width, height));
    page.parent(page_tree_id);
    page.contents(content_id);
    let mut resources = page.resources();
    resources.fonts().pair(FONT, font_id);
    resources.x_objects().pair(IMAGE, image_id).pair(SCALE, scale_id);
    resources.finish();
    page.finish();

    pdf.type1_font(font_id).base_font(Name(b"Helvetica"));

    let n = matrix.len().max(1) as i32;
    let pixels = if matrix.is_empty() {
        vec![0, 0, 0]
    } else {
        matrix_pixels(matrix, &style.gradient)
    };
    let mut image = pdf.image_xobject(image_id, &pixels);
    image.width(n);
    image.height(n);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    image.finish();

    let scale = scale_pixels(&style.gradient);
    let mut scale_image = pdf.image_xobject(scale_id, &scale);
    scale_image.width(1);
    scale_image.height(SCALE_STEPS as i32);
    scale_image.color_space().device_rgb();
    scale_image.bits_per_component(8);
    scale_image.finish();

    let content = page_content(matrix, style, &layout);
    pdf.stream(content_id, &content);
    pdf.finish()
}

fn page_content(matrix: &DissimilarityMatrix, style: &HeatmapStyle, layout: &Layout) -> Vec<u8> {
    let mut content = Content::new();
    draw_image(&mut content, IMAGE, &layout.image);
    draw_image(&mut content, SCALE, &layout.scale);

    let size = style.font_size;
    let (_, height) = style.page_size;
    let image = &layout.image;
    // Title along the top, axis labels centered on their axes.
    draw_text(
        &mut content,
        size * 1.2,
        [1.0, 0.0, 0.0, 1.0],
        image.x1,
        height - size * 2.5,
        &style.title,
    );
    draw_text(
        &mut content,
        size,
        [1.0, 0.0, 0.0, 1.0],
        (image.x1 + image.x2) / 2.0 - size * 3.0,
        image.y1 - size * 2.5,
        &style.x_label,
    );
    draw_text(
        &mut content,
        size,
        [0.0, 1.0, -1.0, 0.0],
        image.x1 - size * 2.0,
        (image.y1 + image.y2) / 2.0 - size * 3.0,
        &style.y_label,
    );

    let (lo, hi) = matrix.range().unwrap_or((0.0, 0.0));
    let scale = &layout.scale;
    for t in 0..SCALE_TICKS {
        let frac = t as f64 / (SCALE_TICKS - 1) as f64;
        let y = scale.y1 + (scale.y2 - scale.y1) * frac as f32;
        content.set_stroke_rgb(0.0, 0.0, 0.0);
        content.set_line_width(0.5);
        content.move_to(scale.x2, y);
        content.line_to(scale.x2 + size * 0.3, y);
        content.stroke();
        let label = format!("{:.3}", lo + (hi - lo) * frac);
        draw_text(
            &mut content,
            size * 0.8,
            [1.0, 0.0, 0.0, 1.0],
            scale.x2 + size * 0.5,
            y - size * 0.3,
            &label,
        );
    }
    content.finish()
}

fn draw_image(content: &mut Content, name: Name, at: &Rect) {
    content.save_state();
    content.transform([at.x2 - at.x1, 0.0, 0.0, at.y2 - at.y1, at.x1, at.y1]);
    content.x_object(name);
    content.restore_state();
}

fn draw_text(content: &mut Content, size: f32, rotation: [f32; 4], x: f32, y: f32, text: &str) {
    content.begin_text();
    content.set_font(FONT, size);
    content.set_text_matrix([rotation[0], rotation[1], rotation[2], rotation[3], x, y]);
    content.show(Str(text.as_bytes()));
    content.end_text();
}

/// Render `matrix` as a heatmap and write it to `path`.
pub fn render_heatmap(
    matrix: &DissimilarityMatrix,
    path: impl AsRef<Path>,
    style: &HeatmapStyle,
) -> io::Result<()> {
    fs::write(path, heatmap_document(matrix, style))
}

/// Return the heatmap output path for `input`: the input path with `.pdf` appended.
pub fn heatmap_path(input: &Path) -> std::path::PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(".pdf");
    path.into()
}
