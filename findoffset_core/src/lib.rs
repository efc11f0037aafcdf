/*!
# Find Offset: Library

This library finds the sample read offset of an optical drive by ripping the
first track of an AccurateRip-known disc at each of a list of candidate
offsets until its checksum matches one of the database's, and then confirming
the match against the rest of the tracks.

The heavy lifting is done by [`OffsetFinder`], which ties together a
[`ReferenceDatabase`] (normally [`AccurateRipClient`]), a [`TrialExtractor`]
(normally a [`Disc`]), and a [`ResultPublisher`] (normally a [`DriveConfig`]).
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::doc_markdown,
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod abort;
mod accuraterip;
mod cdio;
mod chk;
mod config;
mod disc;
mod engine;
mod error;
mod finder;
mod log;
mod offset;
mod offsets;
mod trial;

pub use abort::KillSwitch;
pub use accuraterip::{
	AccurateRipClient,
	DiscId,
	ReferenceDatabase,
	ReferenceRecord,
};
pub(crate) use cdio::LibcdioInstance;
pub use chk::ArChecksum;
pub use config::{
	DriveConfig,
	DriveIdentity,
	ResultPublisher,
};
pub use disc::Disc;
pub use engine::{
	CalibrationResult,
	Calibrator,
};
pub use error::FindOffsetError;
pub use finder::OffsetFinder;
pub use log::CalibrationLog;
pub use offset::ReadOffset;
pub use offsets::{
	DEFAULT_OFFSETS,
	OffsetList,
};
pub use trial::{
	TrialExtractor,
	TrialOutcome,
};



/// # 16-bit Stereo Sample (raw PCM bytes).
type Sample = [u8; 4];

/// # Config Base.
///
/// The default configuration root is `CWD/CONFIG_BASE`.
pub const CONFIG_BASE: &str = "_findoffset";

/// # Config File.
///
/// The drive configuration file name, e.g. `CWD/CONFIG_BASE/CONFIG_FILE`.
pub const CONFIG_FILE: &str = "drives.toml";

/// # Bytes Per Sample.
pub const BYTES_PER_SAMPLE: u16 = 4;

/// # Bytes Per Sector.
///
/// This is the number of bytes per sector of _audio_ data. Block sizes may
/// contain additional information.
pub const BYTES_PER_SECTOR: u16 = SAMPLES_PER_SECTOR * BYTES_PER_SAMPLE;

/// # Samples per sector.
pub const SAMPLES_PER_SECTOR: u16 = 588;

/// # Size of data block.
///
/// Data as in "audio data".
pub const CD_DATA_SIZE: u16 = BYTES_PER_SECTOR;

/// # Number of lead-in sectors.
///
/// All discs have a 2-second region at the start before any data. Different
/// contexts include or exclude this amount, so it's good to keep it handy.
pub const CD_LEADIN: u16 = 150;

/// # Wave Spec.
pub(crate) const WAVE_SPEC: hound::WavSpec = hound::WavSpec {
	channels: 2,
	sample_rate: 44100,
	bits_per_sample: 16,
	sample_format: hound::SampleFormat::Int,
};
