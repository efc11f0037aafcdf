/*!
# Find Offset: Log
*/

use crate::{
	ReadOffset,
	TrialOutcome,
};
use dactyl::NiceElapsed;
use std::{
	io::Write,
	time::Instant,
};
use utc2k::FmtUtc2k;



#[derive(Debug)]
/// # Super Basic Log.
///
/// This holds the details of each trial so they can be written out en masse
/// after the final verdict rather than interleaved with the per-trial
/// progress lines. Anything still pending when the log is dropped, e.g. after
/// an aborted search, is printed to STDOUT.
///
/// Logs are only kept if enabled.
pub struct CalibrationLog {
	/// # Enabled?
	enabled: bool,

	/// # Start Time.
	start: Instant,

	/// # Header Lines.
	header: Vec<String>,

	/// # Entries.
	entries: Vec<(FmtUtc2k, ReadOffset, u8, String)>,
}

impl Default for CalibrationLog {
	fn default() -> Self { Self::new(false) }
}

impl Drop for CalibrationLog {
	/// # Final Print Maybe.
	fn drop(&mut self) { self.flush(); }
}

impl CalibrationLog {
	#[must_use]
	/// # New Instance.
	pub fn new(enabled: bool) -> Self {
		Self {
			enabled,
			start: Instant::now(),
			header: Vec::new(),
			entries: Vec::new(),
		}
	}

	#[must_use]
	/// # Enabled?
	pub const fn enabled(&self) -> bool { self.enabled }

	/// # Add Header Line.
	///
	/// Header lines are printed once, before the first entry.
	pub fn add_header(&mut self, line: String) {
		if self.enabled { self.header.push(line); }
	}

	/// # Add Trial.
	pub fn add(&mut self, offset: ReadOffset, track: u8, outcome: &TrialOutcome) {
		if self.enabled {
			let note = match outcome {
				TrialOutcome::Success(chk) => format!("AR {chk}"),
				TrialOutcome::Recoverable(e) => format!("SKIP {e}"),
				TrialOutcome::Fatal(e) => format!("FATAL {e}"),
			};
			self.entries.push((FmtUtc2k::now(), offset, track, note));
		}
	}

	/// # Add Match.
	pub fn add_match(&mut self, offset: ReadOffset, track: u8, record: usize) {
		if self.enabled {
			self.entries.push((
				FmtUtc2k::now(),
				offset,
				track,
				format!("MATCHED response #{}", record + 1),
			));
		}
	}

	/// # Write.
	///
	/// Write the log entries (if any) to the writer, and clear them.
	///
	/// ## Errors
	///
	/// This bubbles up any I/O errors.
	pub fn write_to<W: Write>(&mut self, mut out: W) -> std::io::Result<()> {
		if self.entries.is_empty() { return Ok(()); }

		for line in self.header.drain(..) {
			writeln!(out, "## {line}")?;
		}
		for (date, offset, track, note) in self.entries.drain(..) {
			writeln!(out, "{date}  {offset:>+5}  {track:02}  {note}")?;
		}
		writeln!(out, "## Elapsed: {}", NiceElapsed::from(self.start.elapsed()))?;
		out.flush()
	}

	/// # Flush.
	///
	/// Print anything pending to STDOUT.
	pub fn flush(&mut self) {
		if self.enabled && ! self.entries.is_empty() {
			let writer = std::io::stdout();
			let _res = self.write_to(writer.lock());
		}
	}
}
