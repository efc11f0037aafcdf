/*!
# Find Offset: Calibration
*/

use crate::{
	CalibrationLog,
	FindOffsetError,
	KillSwitch,
	ReadOffset,
	ReferenceRecord,
	TrialExtractor,
	TrialOutcome,
};
use std::io::Write;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Calibration Result.
pub enum CalibrationResult {
	/// # Found It!
	Found(ReadOffset),

	/// # No Match.
	NotFound,
}



/// # Calibrator.
///
/// This runs the actual offset search: rip the first track at each candidate
/// offset until its checksum matches one of the reference records, then
/// confirm the match by ripping the rest of the tracks at that offset too.
///
/// The last track is left out of the confirmation because many drives can't
/// read past the end of the disc, which a non-zero offset would require.
///
/// Progress is written to `out`, one line at a time.
pub struct Calibrator<'a, E, W> {
	/// # Extractor (i.e. the drive).
	extractor: &'a mut E,

	/// # Reference Records.
	records: &'a [ReferenceRecord],

	/// # Kill Switch.
	killed: KillSwitch,

	/// # Verbose Log.
	log: CalibrationLog,

	/// # Progress Output.
	out: W,
}

impl<E, W> std::fmt::Debug for Calibrator<'_, E, W> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Calibrator")
			.field("records", &self.records)
			.field("killed", &self.killed)
			.field("log", &self.log)
			.finish_non_exhaustive()
	}
}

impl<'a, E: TrialExtractor, W: Write> Calibrator<'a, E, W> {
	/// # New.
	pub fn new(
		extractor: &'a mut E,
		records: &'a [ReferenceRecord],
		killed: KillSwitch,
		out: W,
	) -> Self {
		Self {
			extractor,
			records,
			killed,
			log: CalibrationLog::default(),
			out,
		}
	}

	#[must_use]
	/// # With Log.
	pub fn with_log(self, log: CalibrationLog) -> Self {
		Self { log, ..self }
	}

	#[must_use]
	/// # Into Log.
	///
	/// Hand back the trial log so it can be written after the final report.
	pub fn into_log(self) -> CalibrationLog { self.log }

	/// # Search!
	///
	/// Try each offset in turn, returning the first one confirmed.
	///
	/// ## Errors
	///
	/// Fatal trial failures, user aborts, and output errors end the search
	/// immediately.
	pub fn search(&mut self, candidates: &[ReadOffset])
	-> Result<CalibrationResult, FindOffsetError> {
		let total = self.extractor.tracks();
		let records = self.records;

		for &offset in candidates {
			self.check_killed()?;
			self.say(format_args!("Trying read offset {offset} ..."))?;

			let chk = match self.trial(1, offset) {
				TrialOutcome::Success(chk) => chk,
				TrialOutcome::Recoverable(_) => {
					self.say(format_args!("WARNING: cannot rip with offset {offset}..."))?;
					continue;
				},
				TrialOutcome::Fatal(e) => return Err(e),
			};

			// Does it match anything?
			let Some(idx) = records.iter().position(|r| r.is_match(1, chk)) else { continue; };
			self.log.add_match(offset, 1, idx);
			self.say(format_args!("Offset of device is likely {offset}, confirming ..."))?;

			let matched = self.confirm(idx, offset, total)?;
			if usize::from(matched) + 1 == usize::from(total) {
				return Ok(CalibrationResult::Found(offset));
			}

			self.say(format_args!(
				"Only {matched} of {total} tracks matched, continuing ..."
			))?;
		}

		Ok(CalibrationResult::NotFound)
	}

	/// # Confirm.
	///
	/// Rip tracks `2..total` (i.e. all but the first and last) and count how
	/// many match the same record that matched the first track (`idx`). The
	/// first track is included in the count.
	///
	/// Tracks that can't be ripped at this offset are skipped, and so not
	/// counted.
	fn confirm(&mut self, idx: usize, offset: ReadOffset, total: u8)
	-> Result<u8, FindOffsetError> {
		let records = self.records;
		let record = records.get(idx).ok_or(FindOffsetError::Bug("missing record"))?;
		let mut matched = 1;
		for track in 2..total {
			self.check_killed()?;
			match self.trial(track, offset) {
				TrialOutcome::Success(chk) =>
					if record.is_match(track, chk) {
						matched += 1;
						self.log.add_match(offset, track, idx);
					},
				TrialOutcome::Recoverable(_) => {
					self.say(format_args!("WARNING: cannot rip with offset {offset}..."))?;
				},
				TrialOutcome::Fatal(e) => return Err(e),
			}
		}

		Ok(matched)
	}

	/// # Run a Trial.
	///
	/// Pass through to the extractor, logging the result.
	fn trial(&mut self, track: u8, offset: ReadOffset) -> TrialOutcome {
		let outcome = self.extractor.trial(track, offset);
		self.log.add(offset, track, &outcome);
		outcome
	}

	/// # Check Kill Switch.
	fn check_killed(&self) -> Result<(), FindOffsetError> {
		if self.killed.killed() { Err(FindOffsetError::Killed) }
		else { Ok(()) }
	}

	/// # Say Something.
	fn say(&mut self, msg: std::fmt::Arguments) -> Result<(), FindOffsetError> {
		writeln!(self.out, "{msg}")
			.and_then(|()| self.out.flush())
			.map_err(|_| FindOffsetError::Bug("unable to write progress"))
	}
}
