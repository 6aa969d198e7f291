/// Interface of progress indicators.
pub trait ProgressTrait: Send {
	/// Starts a task of `max_value` steps.
	fn init(&mut self, message: &str, max_value: u64);

	fn set_position(&mut self, value: u64);

	fn inc(&mut self, value: u64);

	/// Marks the task as complete, regardless of the current position.
	fn finish(&mut self);
}
