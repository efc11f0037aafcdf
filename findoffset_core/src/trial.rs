/*!
# Find Offset: Trials
*/

use crate::{
	ArChecksum,
	FindOffsetError,
	ReadOffset,
};



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Trial Outcome.
///
/// The result of ripping and checksumming one track at one offset.
pub enum TrialOutcome {
	/// # Success!
	Success(ArChecksum),

	/// # Failure, But Keep Going.
	///
	/// The drive couldn't produce this track at this offset, but other
	/// offsets may well work.
	Recoverable(FindOffsetError),

	/// # Failure, Stop Everything.
	Fatal(FindOffsetError),
}

impl From<Result<ArChecksum, FindOffsetError>> for TrialOutcome {
	#[inline]
	fn from(src: Result<ArChecksum, FindOffsetError>) -> Self {
		match src {
			Ok(chk) => Self::Success(chk),
			Err(e) =>
				if e.is_recoverable() { Self::Recoverable(e) }
				else { Self::Fatal(e) },
		}
	}
}



/// # Trial Extractor.
///
/// This is anything that can rip a track at a given offset and crunch its
/// AccurateRip checksum.
///
/// Implementations have exclusive access to the drive for the duration of
/// each call; `&mut self` ensures no two trials can ever overlap.
pub trait TrialExtractor {
	/// # Number of Audio Tracks.
	fn tracks(&self) -> u8;

	/// # Run a Trial.
	///
	/// Rip `track` (starting at one) with the read `offset` applied, and
	/// return its checksum. Overread is never used.
	fn trial(&mut self, track: u8, offset: ReadOffset) -> TrialOutcome;
}
