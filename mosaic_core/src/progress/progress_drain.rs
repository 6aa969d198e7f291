use super::ProgressTrait;

/// A progress indicator that reports nothing.
#[derive(Debug, Default)]
pub struct ProgressDrain {}

impl ProgressDrain {
	pub fn new() -> Self {
		Self {}
	}
}

impl ProgressTrait for ProgressDrain {
	fn init(&mut self, _message: &str, _max_value: u64) {}
	fn set_position(&mut self, _value: u64) {}
	fn inc(&mut self, _value: u64) {}
	fn finish(&mut self) {}
}
