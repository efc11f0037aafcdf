/*!
# Find Offset: Kill Switch
*/

use std::sync::{
	Arc,
	atomic::{
		AtomicBool,
		Ordering::{
			Acquire,
			Release,
		},
	},
};



#[derive(Debug, Clone, Default)]
/// # Kill Switch.
///
/// This is a short-circuit for the offset search. The main program's CTRL-C
/// intercept flips it, and the calibrator checks it between trials so the
/// drive is never abandoned mid-read.
pub struct KillSwitch(Arc<AtomicBool>);

impl From<Arc<AtomicBool>> for KillSwitch {
	#[inline]
	fn from(src: Arc<AtomicBool>) -> Self { Self(src) }
}

impl KillSwitch {
	#[must_use]
	/// # Dead?
	pub fn killed(&self) -> bool { self.0.load(Acquire) }

	/// # Kill!
	pub fn kill(&self) { self.0.store(true, Release); }
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_killswitch() {
		let a = KillSwitch::default();
		let b = a.clone();
		assert!(! a.killed(), "New switches should be alive.");

		b.kill();
		assert!(a.killed(), "Clones should share state.");
	}
}
