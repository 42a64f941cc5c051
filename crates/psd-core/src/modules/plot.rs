use super::features::detect_peaks;
use crate::common::PlotFormat;
use crate::domain::{ChannelKey, Dof, NodeId, PeakSet, PsdError, PsdResult, ResponseKind, Sample};
use crate::parser::ParsedResponses;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageResult, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

const NODE_PLOT_SIZE: (u32, u32) = (1200, 1000);
const ALL_NODES_PLOT_SIZE: (u32, u32) = (1400, 800);
const MARGIN: f32 = 60.0;
const GRID_DIVISIONS: u32 = 5;
const NODE_PEAK_RADIUS: i32 = 6;
const ALL_NODES_PEAK_RADIUS: i32 = 4;
const JPEG_QUALITY: u8 = 90;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID_COLOR: Rgb<u8> = Rgb([220, 220, 220]);
const AXIS_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
pub const PEAK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const ACCELERATION_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const DISPLACEMENT_COLOR: Rgb<u8> = Rgb([0, 128, 0]);

/// Matplotlib's `tab10` palette, cycled per node.
pub const TAB10: [Rgb<u8>; 10] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
    Rgb([188, 189, 34]),
    Rgb([23, 190, 207]),
];

pub fn node_plot_file(node: &NodeId, dof: Dof, format: PlotFormat) -> String {
    format!("node_{node}_dof_{dof}_comparison.{}", format.extension())
}

pub fn all_nodes_plot_file(kind: ResponseKind, dof: Dof, format: PlotFormat) -> String {
    let name = match kind {
        ResponseKind::Acceleration => "acceleration",
        ResponseKind::Displacement => "displacement",
    };
    format!("all_{name}_dof_{dof}.{}", format.extension())
}

/// Pixel rectangle of one panel and the data ranges it maps.
#[derive(Debug, Clone, Copy)]
struct PlotFrame {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl PlotFrame {
    fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            x_range: (0.0, 1.0),
            y_range: (0.0, 1.0),
        }
    }

    fn with_ranges(mut self, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        self.x_range = x_range;
        self.y_range = y_range;
        self
    }

    fn to_pixel(&self, frequency: f64, value: f64) -> (f32, f32) {
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let x = self.left + ((frequency - x0) / (x1 - x0)) as f32 * self.width;
        let y = self.top + self.height - ((value - y0) / (y1 - y0)) as f32 * self.height;
        (x, y)
    }

    fn draw_axes(&self, canvas: &mut RgbImage) {
        for step in 1..GRID_DIVISIONS {
            let fraction = step as f32 / GRID_DIVISIONS as f32;
            let x = self.left + fraction * self.width;
            let y = self.top + fraction * self.height;
            draw_line_segment_mut(canvas, (x, self.top), (x, self.top + self.height), GRID_COLOR);
            draw_line_segment_mut(canvas, (self.left, y), (self.left + self.width, y), GRID_COLOR);
        }
        let frame = Rect::at(self.left as i32, self.top as i32)
            .of_size(self.width as u32, self.height as u32);
        draw_hollow_rect_mut(canvas, frame, AXIS_COLOR);
    }

    fn draw_curve(&self, canvas: &mut RgbImage, samples: &[Sample], color: Rgb<u8>) {
        for pair in samples.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            if !(start.value.is_finite() && end.value.is_finite()) {
                continue;
            }
            let from = self.to_pixel(start.frequency, start.value);
            let to = self.to_pixel(end.frequency, end.value);
            draw_line_segment_mut(canvas, from, to, color);
            draw_line_segment_mut(canvas, (from.0, from.1 + 1.0), (to.0, to.1 + 1.0), color);
        }
    }

    fn mark_peaks(&self, canvas: &mut RgbImage, peaks: &PeakSet, radius: i32, color: Rgb<u8>) {
        for peak in peaks.slots().iter().flatten() {
            let (x, y) = self.to_pixel(peak.frequency, peak.value);
            draw_filled_circle_mut(canvas, (x.round() as i32, y.round() as i32), radius, color);
        }
    }
}

/// Smallest range covering every finite value, widened when degenerate.
fn padded_range(values: impl IntoIterator<Item = f64>, pad_fraction: f64) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
            (min.min(value), max.max(value))
        });
    if min > max {
        return (0.0, 1.0);
    }
    if min == max {
        let half = if min == 0.0 { 0.5 } else { min.abs() * 0.5 };
        return (min - half, max + half);
    }
    let pad = (max - min) * pad_fraction;
    (min - pad, max + pad)
}

fn sorted_samples(parsed: &ParsedResponses, key: &ChannelKey) -> Option<Vec<Sample>> {
    let series = parsed.channel(key)?;
    if series.is_empty() {
        return None;
    }
    let mut samples = series.samples().to_vec();
    samples.sort_by(|lhs, rhs| lhs.frequency.total_cmp(&rhs.frequency));
    Some(samples)
}

fn encode(canvas: &RgbImage, path: &Path, format: PlotFormat) -> ImageResult<()> {
    match format {
        PlotFormat::Png => canvas.save_with_format(path, ImageFormat::Png),
        PlotFormat::Jpeg => {
            let mut writer = BufWriter::new(File::create(path)?);
            JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY).encode_image(canvas)
        }
    }
}

fn save_plot(canvas: &RgbImage, path: &Path, format: PlotFormat) -> PsdResult<()> {
    encode(canvas, path, format).map_err(|source| {
        PsdError::io_system(
            "IO.PLOT_WRITE",
            format!("failed to write plot '{}': {}", path.display(), source),
        )
    })?;
    info!(path = %path.display(), "wrote response plot");
    Ok(())
}

/// Two stacked panels for one node: acceleration on top, displacement below,
/// sharing the frequency range. A missing channel leaves its panel empty.
pub fn plot_node_response(
    parsed: &ParsedResponses,
    node: &NodeId,
    dof: Dof,
    path: &Path,
    format: PlotFormat,
) -> PsdResult<()> {
    if !parsed.nodes.contains(node) {
        warn!(node = %node, "node not present in input; plotting empty panels");
    }
    let (width, height) = NODE_PLOT_SIZE;
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    let panel_width = width as f32 - 2.0 * MARGIN;
    let panel_height = (height as f32 - 3.0 * MARGIN) / 2.0;

    let channels = [
        (ResponseKind::Acceleration, ACCELERATION_COLOR, MARGIN),
        (ResponseKind::Displacement, DISPLACEMENT_COLOR, 2.0 * MARGIN + panel_height),
    ]
    .map(|(kind, color, top)| {
        let samples = sorted_samples(parsed, &ChannelKey::new(kind, node.clone(), dof));
        (kind, color, top, samples)
    });
    let x_range = padded_range(
        channels
            .iter()
            .flat_map(|(_, _, _, samples)| samples.iter().flatten())
            .map(|sample| sample.frequency),
        0.0,
    );

    for (kind, color, top, samples) in &channels {
        let frame = PlotFrame::new(MARGIN, *top, panel_width, panel_height);
        let Some(samples) = samples else {
            frame.draw_axes(&mut canvas);
            info!(node = %node, dof = %dof, kind = %kind, "no data for panel");
            continue;
        };
        let y_range = padded_range(samples.iter().map(|sample| sample.value), 0.05);
        let frame = frame.with_ranges(x_range, y_range);
        frame.draw_axes(&mut canvas);
        frame.draw_curve(&mut canvas, samples, *color);
        frame.mark_peaks(&mut canvas, &detect_peaks(samples), NODE_PEAK_RADIUS, PEAK_COLOR);
    }

    save_plot(&canvas, path, format)
}

/// Every node's channel of one response kind on a single panel, one `tab10`
/// color per node in node order.
pub fn plot_all_nodes(
    parsed: &ParsedResponses,
    kind: ResponseKind,
    dof: Dof,
    path: &Path,
    format: PlotFormat,
) -> PsdResult<()> {
    let (width, height) = ALL_NODES_PLOT_SIZE;
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    let curves: Vec<(Rgb<u8>, Vec<Sample>)> = parsed
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let samples = sorted_samples(parsed, &ChannelKey::new(kind, node.clone(), dof))?;
            Some((TAB10[index % TAB10.len()], samples))
        })
        .collect();
    let all_samples = || curves.iter().flat_map(|(_, samples)| samples.iter());
    let frame = PlotFrame::new(
        MARGIN,
        MARGIN,
        width as f32 - 2.0 * MARGIN,
        height as f32 - 2.0 * MARGIN,
    )
    .with_ranges(
        padded_range(all_samples().map(|sample| sample.frequency), 0.0),
        padded_range(all_samples().map(|sample| sample.value), 0.05),
    );

    frame.draw_axes(&mut canvas);
    for (color, samples) in &curves {
        frame.draw_curve(&mut canvas, samples, *color);
    }
    for (color, samples) in &curves {
        frame.mark_peaks(&mut canvas, &detect_peaks(samples), ALL_NODES_PEAK_RADIUS, *color);
    }
    if curves.is_empty() {
        info!(kind = %kind, dof = %dof, "no channels to plot");
    }

    save_plot(&canvas, path, format)
}
