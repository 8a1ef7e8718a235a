//! Brute-force label overlap resolver.
//!
//! O(n²) per pass; meant for graphs of tens to low hundreds of labels.

use super::config::ResolverConfig;

/// A label's axis-aligned box, by center and extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[allow(missing_docs)]
pub struct LabelBox {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl LabelBox {
	#[allow(missing_docs)]
	pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	/// Whether the two boxes, each grown by `padding`, intersect.
	pub fn overlaps(&self, other: &LabelBox, padding: f64) -> bool {
		let (ahw, ahh) = (self.width / 2.0, self.height / 2.0);
		let (bhw, bhh) = (other.width / 2.0, other.height / 2.0);
		!(self.x + ahw + padding < other.x - bhw
			|| self.x - ahw - padding > other.x + bhw
			|| self.y + ahh + padding < other.y - bhh
			|| self.y - ahh - padding > other.y + bhh)
	}
}

/// Outcome of [`resolve_overlaps`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveReport {
	/// Full passes over all pairs, including the final clean pass.
	pub passes: usize,
	/// Pair pushes performed.
	pub pushes: usize,
	/// Whether the last pass found no overlap.
	pub resolved: bool,
}

/// Number of overlapping pairs.
pub fn count_overlaps(boxes: &[LabelBox], padding: f64) -> usize {
	let mut count = 0;
	for (i, a) in boxes.iter().enumerate() {
		count += boxes[i + 1..].iter().filter(|b| a.overlaps(b, padding)).count();
	}
	count
}

/// Push overlapping boxes apart until a pass finds none or the pass cap is
/// reached.
pub fn resolve_overlaps(boxes: &mut [LabelBox], config: &ResolverConfig) -> ResolveReport {
	let mut report = ResolveReport::default();
	let step = config.push_step;
	for _ in 0..config.max_iterations {
		report.passes += 1;
		let mut overlapped = false;
		for i in 0..boxes.len() {
			for j in (i + 1)..boxes.len() {
				if !boxes[i].overlaps(&boxes[j], config.padding) {
					continue;
				}
				overlapped = true;
				report.pushes += 1;
				let (dx, dy) = (boxes[j].x - boxes[i].x, boxes[j].y - boxes[i].y);
				// Coincident centers push along +x.
				let angle = dy.atan2(dx);
				let (px, py) = (angle.cos() * step, angle.sin() * step);
				boxes[i].x -= px;
				boxes[i].y -= py;
				boxes[j].x += px;
				boxes[j].y += py;
			}
		}
		if !overlapped {
			report.resolved = true;
			break;
		}
	}
	report
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> ResolverConfig {
		ResolverConfig::default()
	}

	#[test]
	fn padding_counts_as_overlap() {
		let a = LabelBox::new(0.0, 0.0, 20.0, 10.0);
		let b = LabelBox::new(25.0, 0.0, 20.0, 10.0);
		assert!(!a.overlaps(&b, 0.0));
		assert!(a.overlaps(&b, 8.0));
		assert!(!a.overlaps(&LabelBox::new(29.0, 0.0, 20.0, 10.0), 8.0));
	}

	#[test]
	fn separated_layout_is_left_untouched() {
		let mut boxes = vec![
			LabelBox::new(0.0, 0.0, 60.0, 16.0),
			LabelBox::new(200.0, 0.0, 60.0, 16.0),
			LabelBox::new(0.0, 100.0, 60.0, 16.0),
		];
		let before = boxes.clone();
		let report = resolve_overlaps(&mut boxes, &config());
		assert_eq!(
			report,
			ResolveReport {
				passes: 1,
				pushes: 0,
				resolved: true
			}
		);
		assert_eq!(boxes, before);
	}

	#[test]
	fn resolves_a_crowded_row() {
		let mut boxes = vec![
			LabelBox::new(0.0, 0.0, 60.0, 16.0),
			LabelBox::new(10.0, 0.0, 60.0, 16.0),
			LabelBox::new(20.0, 0.0, 60.0, 16.0),
			LabelBox::new(15.0, 5.0, 40.0, 16.0),
		];
		let report = resolve_overlaps(&mut boxes, &config());
		assert!(report.resolved, "{report:?}");
		assert_eq!(count_overlaps(&boxes, config().padding), 0);

		// A second run has nothing to do.
		let again = resolve_overlaps(&mut boxes, &config());
		assert_eq!(again.passes, 1);
		assert_eq!(again.pushes, 0);
	}

	#[test]
	fn coincident_labels_separate() {
		let mut boxes = vec![
			LabelBox::new(50.0, 50.0, 80.0, 16.0),
			LabelBox::new(50.0, 50.0, 80.0, 16.0),
		];
		let report = resolve_overlaps(&mut boxes, &config());
		assert!(report.resolved);
		assert!(report.passes <= config().max_iterations);
		let gap = (boxes[1].x - boxes[0].x).hypot(boxes[1].y - boxes[0].y);
		assert!(gap.is_finite() && gap > 0.0);
		assert!(!boxes[0].overlaps(&boxes[1], config().padding));
	}

	#[test]
	fn gives_up_at_the_pass_cap() {
		let mut boxes = vec![
			LabelBox::new(0.0, 0.0, 500.0, 16.0),
			LabelBox::new(0.0, 0.0, 500.0, 16.0),
		];
		let cfg = ResolverConfig {
			max_iterations: 3,
			..ResolverConfig::default()
		};
		let report = resolve_overlaps(&mut boxes, &cfg);
		assert_eq!(report.passes, 3);
		assert_eq!(report.pushes, 3);
		assert!(!report.resolved);
	}

	#[test]
	fn empty_and_single_inputs() {
		assert!(resolve_overlaps(&mut [], &config()).resolved);
		let mut one = [LabelBox::new(1.0, 1.0, 10.0, 10.0)];
		assert_eq!(resolve_overlaps(&mut one, &config()).pushes, 0);
	}
}
