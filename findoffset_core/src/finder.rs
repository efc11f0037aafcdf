/*!
# Find Offset: Finder
*/

use crate::{
	CalibrationLog,
	CalibrationResult,
	Calibrator,
	DiscId,
	DriveIdentity,
	FindOffsetError,
	KillSwitch,
	ReadOffset,
	ReferenceDatabase,
	ReferenceRecord,
	ResultPublisher,
	TrialExtractor,
};
use fyi_msg::Msg;
use std::io::Write;



/// # Offset Finder.
///
/// This ties everything together: look the disc up in the reference
/// database, run the calibration search against the drive, and save the
/// result (if any) for next time.
///
/// ## Examples
///
/// ```no_run
/// use findoffset_core::{
///     AccurateRipClient,
///     Disc,
///     DriveConfig,
///     OffsetFinder,
///     OffsetList,
/// };
///
/// let mut disc = Disc::new(None::<&str>).unwrap();
/// let mut config = DriveConfig::load(DriveConfig::default_path().unwrap()).unwrap();
/// let db = AccurateRipClient::default();
///
/// let id = disc.disc_id();
/// let drive = disc.drive().cloned();
/// let _res = OffsetFinder::new(&db)
///     .with_publisher(&mut config)
///     .run(&id, drive.as_ref(), &mut disc, &OffsetList::defaults(), std::io::stdout())
///     .unwrap();
/// ```
pub struct OffsetFinder<'a, D> {
	/// # Reference Database.
	db: &'a D,

	/// # Where to Save the Result.
	publisher: Option<&'a mut dyn ResultPublisher>,

	/// # Kill Switch.
	killed: KillSwitch,

	/// # Verbose?
	verbose: bool,
}

impl<D> std::fmt::Debug for OffsetFinder<'_, D> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OffsetFinder")
			.field("publisher", &self.publisher.is_some())
			.field("killed", &self.killed)
			.field("verbose", &self.verbose)
			.finish_non_exhaustive()
	}
}

impl<'a, D: ReferenceDatabase> OffsetFinder<'a, D> {
	#[must_use]
	/// # New.
	pub fn new(db: &'a D) -> Self {
		Self {
			db,
			publisher: None,
			killed: KillSwitch::default(),
			verbose: false,
		}
	}

	#[must_use]
	/// # With Publisher.
	///
	/// Without one, confirmed offsets are reported but not saved anywhere.
	pub fn with_publisher(self, publisher: &'a mut dyn ResultPublisher) -> Self {
		Self { publisher: Some(publisher), ..self }
	}

	#[must_use]
	/// # With Kill Switch.
	pub fn with_kill_switch(self, killed: KillSwitch) -> Self {
		Self { killed, ..self }
	}

	#[must_use]
	/// # With Verbose Logging.
	pub fn with_verbose(self, verbose: bool) -> Self {
		Self { verbose, ..self }
	}

	/// # Run!
	///
	/// Find the drive's read offset using the disc `id` and `candidates`,
	/// writing progress to `out`.
	///
	/// A confirmed offset is saved to the publisher (if any) for the `drive`
	/// (if known). Save failures are reported, but the offset is still
	/// returned.
	///
	/// ## Errors
	///
	/// This will return an error if the database is unreachable, the search
	/// hits a fatal error, or the user aborts.
	pub fn run<E, W>(
		&mut self,
		id: &DiscId,
		drive: Option<&DriveIdentity>,
		extractor: &mut E,
		candidates: &[ReadOffset],
		mut out: W,
	) -> Result<CalibrationResult, FindOffsetError>
	where E: TrialExtractor, W: Write {
		let records = match self.db.fetch(id) {
			Ok(records) => records,
			Err(FindOffsetError::ReferenceNotFound) => Vec::new(),
			Err(e) => return Err(e),
		};
		if records.is_empty() {
			say(&mut out, format_args!("{}", FindOffsetError::ReferenceNotFound))?;
			not_found(&mut out)?;
			return Ok(CalibrationResult::NotFound);
		}

		// The first record is expected to be for this exact disc.
		if let Some(cddb) = records.first().map(ReferenceRecord::cddb) {
			if cddb != id.cddb() {
				Msg::warning(format!("AccurateRip response disc ID different: {cddb:08x}"))
					.eprint();
			}
		}

		let mut log = CalibrationLog::new(self.verbose);
		if log.enabled() {
			log.add_header(format!(
				"Drive: {}",
				drive.map_or_else(|| "unknown".to_owned(), ToString::to_string),
			));
			log.add_header(format!("AccurateRip: {id}"));
			log.add_header(format!("Responses: {}", records.len()));
		}

		let mut cal = Calibrator::new(extractor, &records, self.killed.clone(), &mut out)
			.with_log(log);
		let res = cal.search(candidates)?;
		let mut log = cal.into_log();

		match res {
			CalibrationResult::Found(offset) => self.found(offset, drive, &mut out)?,
			CalibrationResult::NotFound => not_found(&mut out)?,
		}

		// The trial log goes last, after the verdict.
		log.write_to(&mut out)
			.map_err(|_| FindOffsetError::Bug("unable to write log"))?;

		Ok(res)
	}

	/// # Found!
	///
	/// Report and save the offset.
	fn found<W: Write>(&mut self, offset: ReadOffset, drive: Option<&DriveIdentity>, out: &mut W)
	-> Result<(), FindOffsetError> {
		say(out, format_args!("\nRead offset of device is: {offset}."))?;

		let Some(publisher) = self.publisher.as_deref_mut() else { return Ok(()); };
		if let Some(drive) = drive {
			say(out, format_args!("Adding read offset to configuration file."))?;
			if let Err(e) = publisher.publish(drive, offset) {
				Msg::warning(format!("The offset was found but not saved: {e}")).eprint();
			}
		}
		else {
			say(out, format_args!("Offset not saved: could not get device info."))?;
		}

		Ok(())
	}
}



/// # Say Something.
fn say<W: Write>(out: &mut W, msg: std::fmt::Arguments) -> Result<(), FindOffsetError> {
	writeln!(out, "{msg}")
		.and_then(|()| out.flush())
		.map_err(|_| FindOffsetError::Bug("unable to write progress"))
}

/// # Not Found.
fn not_found<W: Write>(out: &mut W) -> Result<(), FindOffsetError> {
	say(out, format_args!("No matching offset found."))?;
	say(out, format_args!("Consider trying again with a different disc."))
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::tests::{
		MockExtractor,
		offsets,
		record,
	};
	use crate::TrialOutcome;
	use cdtoc::Toc;

	/// # Test Disc ID.
	fn disc_id() -> DiscId {
		let toc = Toc::from_cdtoc("4+96+2D2B+6256+B327+D84A").expect("Invalid CDTOC.");
		DiscId::from(&toc)
	}

	/// # Test Drive.
	fn drive() -> DriveIdentity {
		DriveIdentity::new("HL-DT-ST", "DVDRAM GH24NSC0", "LY00").expect("Drive failed.")
	}

	/// # Scripted Database.
	struct MockDb(Result<Vec<ReferenceRecord>, FindOffsetError>);

	impl ReferenceDatabase for MockDb {
		fn fetch(&self, _id: &DiscId) -> Result<Vec<ReferenceRecord>, FindOffsetError> {
			self.0.clone()
		}
	}

	/// # Recording Publisher.
	#[derive(Default)]
	struct MockPublisher {
		saved: Vec<(DriveIdentity, ReadOffset)>,
		fail: bool,
	}

	impl ResultPublisher for MockPublisher {
		fn publish(&mut self, drive: &DriveIdentity, offset: ReadOffset)
		-> Result<(), FindOffsetError> {
			if self.fail { Err(FindOffsetError::ConfigWrite("nope".to_owned())) }
			else {
				self.saved.push((drive.clone(), offset));
				Ok(())
			}
		}
	}

	/// # Run.
	fn run(
		db: &MockDb,
		publisher: Option<&mut MockPublisher>,
		drive: Option<&DriveIdentity>,
		ex: &mut MockExtractor,
		candidates: &[i16],
	) -> (Result<CalibrationResult, FindOffsetError>, String) {
		let mut finder = OffsetFinder::new(db);
		if let Some(p) = publisher { finder = finder.with_publisher(p); }

		let mut out = Vec::new();
		let res = finder.run(&disc_id(), drive, ex, &offsets(candidates), &mut out);
		(res, String::from_utf8(out).expect("Invalid UTF-8."))
	}

	/// # Offset.
	fn offset(v: i16) -> ReadOffset { ReadOffset::try_from(v).expect("Offset failed.") }

	#[test]
	fn t_album_not_found() {
		let expected = "Album not found in AccurateRip database.\n\
			No matching offset found.\n\
			Consider trying again with a different disc.\n";

		for db in [MockDb(Err(FindOffsetError::ReferenceNotFound)), MockDb(Ok(Vec::new()))] {
			let mut ex = MockExtractor::new(4);
			let (res, out) = run(&db, None, None, &mut ex, &[6, 48]);
			assert_eq!(res, Ok(CalibrationResult::NotFound), "Expected not found.");
			assert_eq!(out, expected, "Output mismatch.");
			assert!(ex.calls.is_empty(), "Nothing should have been ripped.");
		}
	}

	#[test]
	fn t_transport() {
		let db = MockDb(Err(FindOffsetError::ReferenceTransport("timeout".to_owned())));
		let mut ex = MockExtractor::new(4);
		let (res, out) = run(&db, None, None, &mut ex, &[6, 48]);
		assert_eq!(
			res,
			Err(FindOffsetError::ReferenceTransport("timeout".to_owned())),
			"Transport errors are fatal.",
		);
		assert!(out.is_empty(), "Nothing should be said.");
		assert!(ex.calls.is_empty(), "Nothing should have been ripped.");
	}

	#[test]
	fn t_found_saved() {
		let db = MockDb(Ok(vec![record(&[0xA, 0xB, 0xC])]));
		let mut ex = MockExtractor::new(3).ok(1, 48, 0xA).ok(2, 48, 0xB);
		let mut publisher = MockPublisher::default();
		let drive = drive();

		let (res, out) = run(&db, Some(&mut publisher), Some(&drive), &mut ex, &[6, 48]);
		assert_eq!(res, Ok(CalibrationResult::Found(offset(48))), "Expected 48.");
		assert_eq!(
			out,
			"Trying read offset 6 ...\n\
			Trying read offset 48 ...\n\
			Offset of device is likely 48, confirming ...\n\
			\n\
			Read offset of device is: 48.\n\
			Adding read offset to configuration file.\n",
			"Output mismatch.",
		);
		assert_eq!(publisher.saved, [(drive, offset(48))], "The offset should be saved.");
	}

	#[test]
	fn t_found_unsaved() {
		let db = MockDb(Ok(vec![record(&[0xA, 0xB])]));

		// No drive info.
		let mut ex = MockExtractor::new(2).ok(1, 6, 0xA);
		let mut publisher = MockPublisher::default();
		let (res, out) = run(&db, Some(&mut publisher), None, &mut ex, &[6]);
		assert_eq!(res, Ok(CalibrationResult::Found(offset(6))), "Expected 6.");
		assert!(out.ends_with("Offset not saved: could not get device info.\n"), "Output mismatch: {out}");
		assert!(publisher.saved.is_empty(), "Nothing should be saved.");

		// Save failure.
		let mut ex = MockExtractor::new(2).ok(1, 6, 0xA);
		let mut publisher = MockPublisher { fail: true, ..MockPublisher::default() };
		let (res, _) = run(&db, Some(&mut publisher), Some(&drive()), &mut ex, &[6]);
		assert_eq!(res, Ok(CalibrationResult::Found(offset(6))), "Save failures don't change the result.");

		// No publisher.
		let mut ex = MockExtractor::new(2).ok(1, 6, 0xA);
		let (res, out) = run(&db, None, Some(&drive()), &mut ex, &[6]);
		assert_eq!(res, Ok(CalibrationResult::Found(offset(6))), "Expected 6.");
		assert!(out.ends_with("Read offset of device is: 6.\n"), "Output mismatch: {out}");
	}

	#[test]
	fn t_not_found() {
		let db = MockDb(Ok(vec![record(&[0xA, 0xB, 0xC])]));
		let mut ex = MockExtractor::new(3);
		let mut publisher = MockPublisher::default();
		let (res, out) = run(&db, Some(&mut publisher), Some(&drive()), &mut ex, &[6, 48]);
		assert_eq!(res, Ok(CalibrationResult::NotFound), "Expected not found.");
		assert!(
			out.ends_with("No matching offset found.\nConsider trying again with a different disc.\n"),
			"Output mismatch: {out}",
		);
		assert!(publisher.saved.is_empty(), "Nothing should be saved.");
	}

	#[test]
	fn t_fatal() {
		let db = MockDb(Ok(vec![record(&[0xA, 0xB, 0xC])]));
		let mut ex = MockExtractor::new(3)
			.with(1, 6, TrialOutcome::Fatal(FindOffsetError::CdReadUnsupported));
		let mut publisher = MockPublisher::default();
		let (res, out) = run(&db, Some(&mut publisher), Some(&drive()), &mut ex, &[6, 48]);
		assert_eq!(res, Err(FindOffsetError::CdReadUnsupported), "Expected a fatal error.");
		assert_eq!(out, "Trying read offset 6 ...\n", "Output mismatch.");
		assert!(publisher.saved.is_empty(), "Nothing should be saved.");
	}

	#[test]
	fn t_verbose_log() {
		let db = MockDb(Ok(vec![record(&[0xA, 0xB, 0xC])]));
		let mut ex = MockExtractor::new(3).ok(1, 48, 0xA).ok(2, 48, 0xB);
		let drive = drive();

		let mut finder = OffsetFinder::new(&db).with_verbose(true);
		let mut out = Vec::new();
		let res = finder.run(&disc_id(), Some(&drive), &mut ex, &offsets(&[6, 48]), &mut out);
		let out = String::from_utf8(out).expect("Invalid UTF-8.");
		assert_eq!(res, Ok(CalibrationResult::Found(offset(48))), "Expected 48.");

		// The log comes after the verdict, not in the middle of it.
		let verdict = out.find("Read offset of device is: 48.").expect("Missing verdict.");
		let header = out.find("## Drive: ").expect("Missing log header.");
		assert!(verdict < header, "The log should follow the verdict: {out}");
		assert!(out.contains("MATCHED response #1"), "Missing match entry: {out}");
		assert!(
			out.lines().last().is_some_and(|l| l.starts_with("## Elapsed: ")),
			"The log should end the output: {out}",
		);
	}
}
