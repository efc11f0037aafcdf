/*!
# Find Offset: Errors
*/

use cdtoc::TocError;
use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r#"
    _____
   / ___ \     "#, "\x1b[38;5;199mFind Offset\x1b[0;38;5;69m v", env!("CARGO_PKG_VERSION"), "\x1b[0m", r#"
  | /   \ |    Empirically determine the
  | | o | |    sample read offset of your
  | \___/ |    optical drive.
   \_____/

USAGE:
    findoffset [OPTIONS]

Insert an audio CD known to the AccurateRip database, then let this program
rip the first track at each candidate offset until one matches. A match is
confirmed by ripping the remaining tracks (except the last) at that offset.

OPTIONS:
    -c, --config <PATH>
                      Save the discovered offset to this TOML file rather than
                      the default. [default: ./_findoffset/drives.toml]
    -d, --dev <PATH>  The device path for the optical drive containing the CD
                      of interest, like /dev/cdrom. [default: auto]
    -o, --offsets <LIST>
                      The candidate offsets to try, in order, separated by
                      commas. Inclusive ranges may be specified with a colon,
                      like -10:10. [default: the common drive offsets]

MISCELLANEOUS:
    -h, --help        Print help information to STDOUT and exit.
        --no-save     Print the discovered offset, but don't save it anywhere.
    -v, --verbose     Print a detailed log of every trial to STDOUT once the
                      search has finished.
    -V, --version     Print version information to STDOUT and exit.

EARLY EXIT:
    Press "#, "\x1b[38;5;208mCTRL\x1b[0m+\x1b[38;5;208mC\x1b[0m", r#" to stop the search early. The current trial will finish
    first so the drive isn't left mid-read.
"#);



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum FindOffsetError {
	/// # Bug!
	Bug(&'static str),

	/// # CDTOC passthrough.
	Cdtoc(TocError),

	/// # CD read error.
	CdRead(i32),

	/// # CD read operation terminal failure.
	CdReadUnsupported,

	/// # Unable to read the drive configuration.
	ConfigRead(String),

	/// # Unable to save the drive configuration.
	ConfigWrite(String),

	/// # Invalid device.
	Device(String),

	/// # Unable to open device.
	DeviceOpen(Option<String>),

	/// # Unsupported Disc.
	DiscMode,

	/// # Wrong number of samples.
	FileSize {
		/// # Expected sample count.
		expected: u64,

		/// # Actual sample count.
		actual: u64,
	},

	/// # Unable to get first track number.
	FirstTrackNum,

	/// # User Abort.
	Killed,

	/// # Unable to get leadout.
	Leadout,

	/// # Bad Offset List.
	MalformedOffsetSpec(String),

	/// # No Track.
	NoTrack(u8),

	/// # Unable to obtain the number of tracks.
	NumTracks,

	/// # Read Offset.
	ReadOffset,

	/// # Disc not in the database.
	ReferenceNotFound,

	/// # Database communication failure.
	ReferenceTransport(String),

	/// # Temporary file.
	TempFile,

	/// # Invalid/unsupported track format.
	TrackFormat(u8),

	/// # Invalid track LBA.
	TrackLba(u8),

	/// # Invalid track number.
	TrackNumber(u8),

	/// # WAV encoding/decoding.
	Wave(String),

	#[cfg(feature = "bin")]
	/// # Invalid CLI arg.
	CliArg(String),

	#[cfg(feature = "bin")]
	/// # CLI Parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # Print Help (Not an Error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print Version (Not an Error).
	PrintVersion,
}

impl Error for FindOffsetError {}

impl From<TocError> for FindOffsetError {
	#[inline]
	fn from(err: TocError) -> Self { Self::Cdtoc(err) }
}

impl From<FindOffsetError> for Msg {
	#[inline]
	fn from(src: FindOffsetError) -> Self { Self::error(src.to_string()) }
}

impl fmt::Display for FindOffsetError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bug(s) => write!(f, "Bug: {s}."),
			Self::Cdtoc(s) => write!(f, "{s}"),
			Self::CdRead(lsn) => write!(f, "Unable to read sector {lsn}."),
			Self::CdReadUnsupported => f.write_str("Unable to read CD; the drive does not support raw audio reads."),
			Self::ConfigRead(s) => write!(f, "Unable to parse the drive configuration at {s}."),
			Self::ConfigWrite(s) => write!(f, "Unable to save the drive configuration to {s}."),
			Self::Device(s) => write!(f, "Invalid device path {s}."),
			Self::DeviceOpen(s) =>
				if let Some(s) = s { write!(f, "Unable to open connection with {s}.") }
				else {
					f.write_str("Unable to open connection with default optical drive.")
				},
			Self::DiscMode => f.write_str("Missing or unsupported disc type."),
			Self::FileSize { expected, actual } => write!(
				f,
				"Extracted {actual} samples instead of {expected}.",
			),
			Self::FirstTrackNum => f.write_str("Unable to obtain the first track index."),
			Self::Killed => f.write_str("User abort."),
			Self::Leadout => f.write_str("Unable to obtain leadout."),
			Self::MalformedOffsetSpec(s) => write!(f, "Invalid offset specification: {s:?}."),
			Self::NoTrack(n) => write!(f, "There is no track #{n} on this disc."),
			Self::NumTracks => f.write_str("Unable to obtain the track total."),
			Self::ReadOffset => f.write_str("Invalid read offset."),
			Self::ReferenceNotFound => f.write_str("Album not found in AccurateRip database."),
			Self::ReferenceTransport(s) => write!(f, "Unable to reach the AccurateRip database: {s}."),
			Self::TempFile => f.write_str("Unable to create a temporary file."),
			Self::TrackFormat(n) => write!(f, "Unsupported track type ({n})."),
			Self::TrackLba(n) => write!(f, "Unable to obtain LBA ({n})."),
			Self::TrackNumber(n) => write!(f, "Invalid track number ({n})."),
			Self::Wave(s) => write!(f, "WAV error: {s}."),

			#[cfg(feature = "bin")]
			Self::CliArg(s) => write!(f, "Invalid CLI option: {s}"),

			#[cfg(feature = "bin")]
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("Find Offset v", env!("CARGO_PKG_VERSION"))),
		}
	}
}

impl FindOffsetError {
	#[must_use]
	/// # Recoverable?
	///
	/// Returns `true` for errors scoped to a single trial, i.e. the drive
	/// couldn't produce the data for _this_ track at _this_ offset. These
	/// should not stop the search as a whole.
	///
	/// Anything else would fail the same way at every offset, so is fatal.
	pub const fn is_recoverable(&self) -> bool {
		matches!(self, Self::CdRead(_) | Self::FileSize { .. })
	}
}
