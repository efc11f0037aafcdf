/*!
# Find Offset: Disc
*/

use cdtoc::{
	Toc,
	TocKind,
	Track,
};
use crate::{
	ArChecksum,
	CD_DATA_SIZE,
	DiscId,
	DriveIdentity,
	FindOffsetError,
	LibcdioInstance,
	ReadOffset,
	SAMPLES_PER_SECTOR,
	TrialExtractor,
	TrialOutcome,
	WAVE_SPEC,
};
use std::{
	fmt,
	ops::Range,
	path::Path,
};
use tempfile::NamedTempFile;



#[derive(Debug)]
/// # Disc.
///
/// A loaded and parsed compact disc, and the drive it lives in.
pub struct Disc {
	/// # CDIO Instance.
	cdio: LibcdioInstance,

	/// # Disc Table of Contents.
	toc: Toc,

	/// # Drive Identity.
	drive: Option<DriveIdentity>,
}

impl fmt::Display for Disc {
	/// # Summarize the Disc.
	///
	/// This prints the disc identifiers and track layout in a nice little
	/// table.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		/// # Divider.
		const DIVIDER: &str = "\x1b[2m--------------------------\x1b[0m\n";

		let kv = [
			("CDTOC:", self.toc.to_string()),
			("AccurateRip:", self.toc.accuraterip_id().to_string()),
			("CDDB:", self.toc.cddb_id().to_string()),
		];
		let col_max: usize = kv.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
		for (k, v) in kv {
			writeln!(f, "\x1b[1;34m{k:col_max$}\x1b[0m {v}")?;
		}

		writeln!(f, "\n\x1b[2m##   FIRST    LAST  LENGTH\x1b[0m")?;
		f.write_str(DIVIDER)?;
		for t in self.toc.audio_tracks() {
			let rng = t.sector_range_normalized();
			writeln!(
				f,
				"{:02}  {:>6}  {:>6}  {:>6}",
				t.number(),
				rng.start,
				rng.end - 1,
				rng.end - rng.start,
			)?;
		}
		writeln!(f, "\x1b[2mAA  {:>6}          LEAD-OUT\x1b[0m", self.toc.leadout_normalized())?;
		f.write_str(DIVIDER)
	}
}

impl Disc {
	/// # New.
	///
	/// Load and parse the basic disc structure!
	///
	/// ## Errors
	///
	/// This will return an error if there's a problem communicating with the
	/// drive, the disc is unsupported, etc.
	pub fn new<P>(dev: Option<P>) -> Result<Self, FindOffsetError>
	where P: AsRef<Path> {
		let cdio = LibcdioInstance::new(dev)?;

		// Parse the table of contents into the pieces needed for `Toc`.
		let mut audio = Vec::new();
		let mut data = None;

		// The inclusive range to search.
		let from = cdio.first_track_num()?;
		let to = cdio.num_tracks()?;
		if to < from { return Err(FindOffsetError::NumTracks); }

		// Grab the position and type for each track.
		for idx in from..=to {
			let start = cdio.track_lba_start(idx)?;
			if cdio.track_format(idx)? {
				audio.push(start);
			}
			else {
				if data.is_some() || (idx != 1 && idx != to) {
					return Err(FindOffsetError::TrackFormat(idx));
				}
				data.replace(start);
			}
		}

		// Grab the leadout, then build the ToC.
		let leadout = cdio.leadout_lba()?;
		let toc = Toc::from_parts(audio, data, leadout)?;
		let drive = cdio.drive_identity();

		Ok(Self { cdio, toc, drive })
	}
}

impl Disc {
	#[must_use]
	/// # Disc ID.
	pub fn disc_id(&self) -> DiscId { DiscId::from(&self.toc) }

	#[must_use]
	/// # Drive Identity.
	pub const fn drive(&self) -> Option<&DriveIdentity> { self.drive.as_ref() }

	/// # Audio Track.
	///
	/// Return the `idx`th audio track, starting from one.
	fn track(&self, idx: u8) -> Result<Track, FindOffsetError> {
		usize::from(idx).checked_sub(1)
			.and_then(|idx| self.toc.audio_tracks().nth(idx))
			.ok_or(FindOffsetError::NoTrack(idx))
	}
}

impl Disc {
	/// # Extract.
	///
	/// Rip the track to a temporary WAV file with the offset applied. Overread
	/// is disabled, so any data that would fall before the first sector or
	/// after the leadout is treated as silence.
	///
	/// The temporary file is deleted as soon as it is dropped, whatever
	/// happens.
	fn extract(&self, track: Track, offset: ReadOffset) -> Result<NamedTempFile, FindOffsetError> {
		let rng = track.sector_range_normalized();
		let plan = ReadPlan::new(rng, offset, audio_range(&self.toc))?;

		let mut tmp = tempfile::Builder::new()
			.prefix("findoffset.")
			.suffix(&format!(".track{:02}.offset{offset}.wav", track.number()))
			.tempfile()
			.map_err(|_| FindOffsetError::TempFile)?;

		{
			let mut wav = hound::WavWriter::new(tmp.as_file_mut(), WAVE_SPEC)
				.map_err(|e| FindOffsetError::Wave(e.to_string()))?;

			let mut buf = [0_u8; CD_DATA_SIZE as usize];
			let mut skip = plan.skip;
			let mut remaining = plan.samples;
			for lsn in plan.sectors.clone() {
				if plan.readable.contains(&lsn) { self.cdio.read_cd(&mut buf, lsn)?; }
				else { buf.fill(0); }

				for chunk in buf.chunks_exact(4) {
					if skip != 0 { skip -= 1; continue; }
					if remaining == 0 { break; }
					remaining -= 1;
					wav.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))
						.and_then(|()| wav.write_sample(i16::from_le_bytes([chunk[2], chunk[3]])))
						.map_err(|e| FindOffsetError::Wave(e.to_string()))?;
				}
			}

			wav.finalize().map_err(|e| FindOffsetError::Wave(e.to_string()))?;
		}

		// Unreadable sectors are padded, so this should always match; it just
		// makes sure the file on disk is what we think we wrote.
		let actual = hound::WavReader::open(tmp.path())
			.map(|r| u64::from(r.duration()))
			.map_err(|e| FindOffsetError::Wave(e.to_string()))?;
		if actual == plan.samples { Ok(tmp) }
		else {
			Err(FindOffsetError::FileSize { expected: plan.samples, actual })
		}
	}
}

impl TrialExtractor for Disc {
	fn tracks(&self) -> u8 {
		u8::try_from(self.toc.audio_len()).unwrap_or(u8::MAX)
	}

	fn trial(&mut self, track: u8, offset: ReadOffset) -> TrialOutcome {
		let total = self.tracks();
		self.track(track)
			.and_then(|t| self.extract(t, offset))
			.and_then(|tmp| ArChecksum::from_wav(tmp.path(), track, total))
			.into()
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Read Plan.
///
/// The sectors to read to extract a track with a given offset applied, and
/// which samples to keep from them.
struct ReadPlan {
	/// # Sectors to Visit.
	sectors: Range<i32>,

	/// # Audio Sectors Safe to Read.
	readable: Range<i32>,

	/// # Leading Samples to Discard.
	skip: u64,

	/// # Samples to Keep.
	samples: u64,
}

impl ReadPlan {
	/// # New.
	///
	/// The correct data for sample `n` is found at `n + offset`, so the
	/// sample window is shifted accordingly, then widened to whole sectors.
	///
	/// Only sectors within `audio` are ever read; anything outside it is
	/// treated as silence.
	fn new(rng: Range<u32>, offset: ReadOffset, audio: Range<u32>)
	-> Result<Self, FindOffsetError> {
		let per = i64::from(SAMPLES_PER_SECTOR);
		let samples = i64::from(rng.end.saturating_sub(rng.start)) * per;
		if samples == 0 { return Err(FindOffsetError::Bug("empty track")); }

		let first = i64::from(rng.start) * per + i64::from(offset.samples());
		let last = first + samples;

		let start = first.div_euclid(per);
		let end = last.div_euclid(per) + i64::from(0 != last.rem_euclid(per));
		let skip = first - start * per;

		let start = i32::try_from(start).map_err(|_| FindOffsetError::Bug("sector overflow"))?;
		let end = i32::try_from(end).map_err(|_| FindOffsetError::Bug("sector overflow"))?;
		let leadin = i32::try_from(audio.start).map_err(|_| FindOffsetError::Bug("sector overflow"))?;
		let leadout = i32::try_from(audio.end).map_err(|_| FindOffsetError::Bug("sector overflow"))?;

		Ok(Self {
			sectors: start..end,
			readable: leadin..leadout,
			skip: skip.unsigned_abs(),
			samples: samples.unsigned_abs(),
		})
	}
}



/// # Audio Range.
///
/// Return the normalized sector range holding audio. Data sessions (before
/// or after) are excluded, but the HTOA region of an ordinary disc is fair
/// game.
fn audio_range(toc: &Toc) -> Range<u32> {
	let leadin =
		if matches!(toc.kind(), TocKind::DataFirst) { toc.audio_leadin_normalized() }
		else { 0 };
	leadin..toc.audio_leadout_normalized()
}



#[cfg(test)]
mod tests {
	use super::*;

	/// # Offset.
	fn offset(v: i16) -> ReadOffset {
		ReadOffset::try_from(v).expect("Offset failed.")
	}

	#[test]
	fn t_plan_zero() {
		let plan = ReadPlan::new(100..200, offset(0), 0..1000).expect("Plan failed.");
		assert_eq!(plan.sectors, 100..200, "Zero offsets read the track as-is.");
		assert_eq!(plan.skip, 0, "Nothing to skip.");
		assert_eq!(plan.samples, 100 * 588, "Sample count mismatch.");
	}

	#[test]
	fn t_plan_positive() {
		let plan = ReadPlan::new(100..200, offset(6), 0..1000).expect("Plan failed.");
		assert_eq!(plan.sectors, 100..201, "Positive offsets need the next sector.");
		assert_eq!(plan.skip, 6, "The first six samples should be skipped.");
		assert_eq!(plan.samples, 100 * 588, "Sample count mismatch.");

		let plan = ReadPlan::new(100..200, offset(1176), 0..1000).expect("Plan failed.");
		assert_eq!(plan.sectors, 102..202, "Whole-sector offsets shift whole sectors.");
		assert_eq!(plan.skip, 0, "Nothing to skip.");
	}

	#[test]
	fn t_plan_negative() {
		let plan = ReadPlan::new(100..200, offset(-472), 0..1000).expect("Plan failed.");
		assert_eq!(plan.sectors, 99..200, "Negative offsets need the previous sector.");
		assert_eq!(plan.skip, 588 - 472, "Skip mismatch.");

		// The first track can reach into negative territory.
		let plan = ReadPlan::new(0..50, offset(-24), 0..1000).expect("Plan failed.");
		assert_eq!(plan.sectors, -1..50, "Expected a negative start.");
		assert!(! plan.readable.contains(&-1), "Negative sectors aren't readable.");
		assert_eq!(plan.skip, 588 - 24, "Skip mismatch.");
	}

	#[test]
	fn t_plan_leadout() {
		let plan = ReadPlan::new(900..1000, offset(667), 0..1000).expect("Plan failed.");
		assert_eq!(plan.sectors, 901..1002, "Expected to cross the leadout.");
		assert!(plan.readable.contains(&999), "The last sector is readable.");
		assert!(! plan.readable.contains(&1000), "The leadout is not readable.");
	}

	#[test]
	fn t_plan_cd_extra() {
		// Audio ends at 48450; the data session begins well after that.
		let toc = Toc::from_parts(vec![150, 11563, 25174], Some(60000), 90000)
			.expect("Invalid TOC.");
		assert_eq!(toc.kind(), TocKind::CDExtra, "Expected CD-Extra.");
		let audio = audio_range(&toc);
		assert_eq!(audio, 0..48450, "Audio range mismatch.");

		let last = toc.audio_tracks().last().expect("Missing track.");
		let plan = ReadPlan::new(last.sector_range_normalized(), offset(667), audio)
			.expect("Plan failed.");
		assert_eq!(plan.sectors.end, 48452, "Expected to cross the audio leadout.");
		assert!(plan.readable.contains(&48449), "The last audio sector is readable.");
		assert!(! plan.readable.contains(&48450), "The gap is not readable.");
		assert!(! plan.readable.contains(&59850), "The data session is not readable.");
	}

	#[test]
	fn t_plan_data_first() {
		// The data track runs from 0 to 19850.
		let toc = Toc::from_parts(vec![20000, 30000], Some(150), 40000)
			.expect("Invalid TOC.");
		assert_eq!(toc.kind(), TocKind::DataFirst, "Expected data-first.");
		let audio = audio_range(&toc);
		assert_eq!(audio, 19850..39850, "Audio range mismatch.");

		let first = toc.audio_tracks().next().expect("Missing track.");
		let plan = ReadPlan::new(first.sector_range_normalized(), offset(-24), audio)
			.expect("Plan failed.");
		assert_eq!(plan.sectors.start, 19849, "Expected to reach back before the audio.");
		assert!(! plan.readable.contains(&19849), "The data track is not readable.");
		assert!(plan.readable.contains(&19850), "The first audio sector is readable.");
	}

	#[test]
	fn t_plan_audio_only() {
		let toc = Toc::from_parts(vec![150, 11563, 25174], None, 55000)
			.expect("Invalid TOC.");
		assert_eq!(audio_range(&toc), 0..54850, "Audio-only discs span everything.");
	}

	#[test]
	fn t_plan_empty() {
		assert!(ReadPlan::new(5..5, offset(0), 0..1000).is_err(), "Empty tracks are a bug.");
	}
}
