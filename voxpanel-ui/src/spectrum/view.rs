//! Live bar-chart widget for the smoothed spectrum.

use std::time::{Duration, Instant};

use eframe::egui::{
    Align2, Color32, CornerRadius, FontId, Mesh, Response, Sense, Shape, Stroke, Ui, Widget, pos2,
};
use voxpanel_messages::Hertz;

use super::feed::SmoothedFrame;
use super::render::{BAR_HEIGHT_FRACTION, bar_color, normalized_heights, peak_frequency};

const BACKGROUND: Color32 = Color32::from_rgb(10, 10, 10);
const BAR_GAP: f32 = 1.0;
/// Fraction of a bar's height mirrored below the baseline.
const REFLECTION_FRACTION: f32 = 0.3;

/// Spectrum display widget. Frames are pushed in via `set_frame` as the
/// feed yields them; rendering only reads the most recent one. The
/// frame-rate counter counts delivered frames and resets every full
/// wall-clock second; it is purely observational.
pub struct SpectrumView {
    current: Option<SmoothedFrame>,
    peak: Option<Hertz>,
    fps: u32,
    frames_this_second: u32,
    last_fps_reset: Instant,
}

impl SpectrumView {
    pub fn new() -> Self {
        Self {
            current: None,
            peak: None,
            fps: 0,
            frames_this_second: 0,
            last_fps_reset: Instant::now(),
        }
    }

    /// Accept the next smoothed frame in arrival order.
    pub fn set_frame(&mut self, frame: SmoothedFrame) {
        self.peak = peak_frequency(&frame.magnitudes, &frame.frequencies);
        self.current = Some(frame);

        self.frames_this_second += 1;
        if self.last_fps_reset.elapsed() >= Duration::from_secs(1) {
            self.fps = self.frames_this_second;
            self.frames_this_second = 0;
            self.last_fps_reset = Instant::now();
        }
    }

    pub fn peak(&self) -> Option<Hertz> {
        self.peak
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Forget everything; used when the feed is torn down.
    pub fn clear(&mut self) {
        self.current = None;
        self.peak = None;
        self.fps = 0;
        self.frames_this_second = 0;
    }
}

impl Widget for &mut SpectrumView {
    fn ui(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, CornerRadius::ZERO, BACKGROUND);

        let Some(frame) = &self.current else {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Waiting for spectrum data...",
                FontId::proportional(14.0),
                Color32::GRAY,
            );
            return response;
        };

        let heights = normalized_heights(&frame.magnitudes);
        if !heights.is_empty() {
            let reflection_band = rect.height() * 0.12;
            let baseline = rect.bottom() - reflection_band;
            let drawable = (baseline - rect.top()) * BAR_HEIGHT_FRACTION;
            let bar_width = rect.width() / heights.len() as f32;

            let mut reflections = Mesh::default();
            let mut crest = Vec::with_capacity(heights.len());

            for (i, &normalized) in heights.iter().enumerate() {
                let height = normalized * drawable;
                let left = rect.left() + i as f32 * bar_width;
                let right = left + (bar_width - BAR_GAP).max(0.5);
                let color = bar_color(i, heights.len(), normalized);

                painter.rect_filled(
                    eframe::egui::Rect::from_min_max(
                        pos2(left, baseline - height),
                        pos2(right, baseline),
                    ),
                    CornerRadius::ZERO,
                    color,
                );

                // Mirrored reflection fading out below the baseline.
                let fade_top = color.gamma_multiply(REFLECTION_FRACTION);
                let fade_bottom = Color32::TRANSPARENT;
                let refl_bottom =
                    (baseline + height * REFLECTION_FRACTION).min(rect.bottom());
                let base = reflections.vertices.len() as u32;
                reflections.colored_vertex(pos2(left, baseline), fade_top);
                reflections.colored_vertex(pos2(right, baseline), fade_top);
                reflections.colored_vertex(pos2(right, refl_bottom), fade_bottom);
                reflections.colored_vertex(pos2(left, refl_bottom), fade_bottom);
                reflections.add_triangle(base, base + 1, base + 2);
                reflections.add_triangle(base, base + 2, base + 3);

                crest.push(pos2((left + right) / 2.0, baseline - height));
            }

            painter.add(Shape::mesh(reflections));
            painter.add(Shape::line(
                crest,
                Stroke::new(2.0, Color32::from_white_alpha(80)),
            ));
        }

        // Stats overlay, top right.
        let font = FontId::monospace(12.0);
        let anchor = rect.right_top() + eframe::egui::vec2(-8.0, 8.0);
        painter.text(
            anchor,
            Align2::RIGHT_TOP,
            format!("FPS: {}", self.fps),
            font.clone(),
            Color32::WHITE,
        );
        if let Some(peak) = self.peak {
            painter.text(
                anchor + eframe::egui::vec2(0.0, 16.0),
                Align2::RIGHT_TOP,
                format!("Peak: {}", peak),
                font,
                Color32::WHITE,
            );
        }

        response
    }
}
