use web_sys::CanvasRenderingContext2d;

use crate::error::{Error, Result};
use crate::layout::{ESTIMATED_HEIGHT, LabelMetrics, LabelSize};

pub const LABEL_FONT: &str = "600 11px sans-serif";
pub const LABEL_FONT_HOVER: &str = "600 13px sans-serif";

/// Measures labels with the canvas text API in the label font.
pub struct CanvasMetrics<'a> {
	ctx: &'a CanvasRenderingContext2d,
}

impl<'a> CanvasMetrics<'a> {
	pub fn new(ctx: &'a CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}
}

impl LabelMetrics for CanvasMetrics<'_> {
	fn measure(&self, text: &str) -> Result<LabelSize> {
		let failure = |reason: String| Error::MeasurementFailure {
			label: text.to_string(),
			reason,
		};
		self.ctx.set_font(LABEL_FONT);
		let metrics = self
			.ctx
			.measure_text(text)
			.map_err(|e| failure(format!("{e:?}")))?;
		let width = metrics.width();
		if !width.is_finite() || width <= 0.0 {
			return Err(failure(format!("width {width}")));
		}
		let height = metrics.actual_bounding_box_ascent() + metrics.actual_bounding_box_descent();
		Ok(LabelSize {
			width,
			height: if height.is_finite() && height > 0.0 {
				height
			} else {
				ESTIMATED_HEIGHT
			},
		})
	}
}
