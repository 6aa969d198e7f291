//! Text progress in the style of GDAL command line tools: `0...10...20...30 ... 100 - done.`
//!
//! Every 2.5 % a tick is written, every 10 % a number. Output is append-only, so it
//! stays readable when stderr is redirected to a file.

use super::ProgressTrait;
use std::io::Write;

pub struct ProgressTicks {
	output: Box<dyn Write + Send>,
	max_value: u64,
	position: u64,
	/// Number of 2.5 % steps already written.
	written: u64,
	finished: bool,
}

impl ProgressTicks {
	pub fn new(output: Box<dyn Write + Send>) -> Self {
		ProgressTicks {
			output,
			max_value: 0,
			position: 0,
			written: 0,
			finished: false,
		}
	}

	fn steps_for(&self, position: u64) -> u64 {
		if self.max_value == 0 {
			return 40;
		}
		(position.min(self.max_value) * 40) / self.max_value
	}

	fn redraw(&mut self) {
		let target = self.steps_for(self.position);
		let mut text = String::new();
		while self.written < target {
			self.written += 1;
			if self.written % 4 == 0 {
				text.push_str(&(self.written / 4 * 10).to_string());
			} else {
				text.push('.');
			}
		}
		let _ = self.output.write_all(text.as_bytes());
		let _ = self.output.flush();
	}
}

impl ProgressTrait for ProgressTicks {
	fn init(&mut self, message: &str, max_value: u64) {
		self.max_value = max_value;
		self.position = 0;
		self.written = 0;
		self.finished = false;
		let _ = write!(self.output, "{message}: 0");
		let _ = self.output.flush();
	}

	fn set_position(&mut self, value: u64) {
		self.position = value;
		self.redraw();
	}

	fn inc(&mut self, value: u64) {
		self.position = self.position.saturating_add(value);
		self.redraw();
	}

	fn finish(&mut self) {
		if self.finished {
			return;
		}
		self.finished = true;
		self.position = self.max_value;
		self.redraw();
		let _ = writeln!(self.output, " - done.");
		let _ = self.output.flush();
	}
}
