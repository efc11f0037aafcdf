/*!
# Find Offset: CLI
*/

use argyle::Argument;
use findoffset_core::{
	DriveConfig,
	FindOffsetError,
	OffsetList,
};
use std::path::PathBuf;



#[derive(Debug)]
/// # Parsed Settings.
pub(super) struct Settings {
	/// # Device Path.
	pub(super) dev: Option<PathBuf>,

	/// # Candidate Offsets.
	pub(super) offsets: OffsetList,

	/// # Config Path (if saving).
	pub(super) config: Option<PathBuf>,

	/// # Verbose?
	pub(super) verbose: bool,
}



/// # Parse Options.
///
/// The offsets are validated here, before the drive is ever touched.
pub(super) fn parse() -> Result<Settings, FindOffsetError> {
	let args = argyle::args()
		.with_keywords(include!(concat!(env!("OUT_DIR"), "/argyle.rs")));

	let mut dev = None;
	let mut offsets = None;
	let mut config = None;
	let mut save = true;
	let mut verbose = false;
	for arg in args {
		match arg {
			Argument::Key("-h" | "--help") => return Err(FindOffsetError::PrintHelp),
			Argument::Key("--no-save") => { save = false; },
			Argument::Key("-v" | "--verbose") => { verbose = true; },
			Argument::Key("-V" | "--version") => return Err(FindOffsetError::PrintVersion),

			Argument::KeyWithValue("-c" | "--config", s) => {
				let s = s.trim();
				if s.is_empty() { return Err(FindOffsetError::CliParse("-c/--config")); }
				config.replace(PathBuf::from(s));
			},
			Argument::KeyWithValue("-d" | "--dev", s) => { dev.replace(PathBuf::from(s)); },
			Argument::KeyWithValue("-o" | "--offset" | "--offsets", s) => {
				offsets.replace(OffsetList::try_from(s.as_str())?);
			},

			Argument::Other(s) => return Err(FindOffsetError::CliArg(s)),
			_ => {},
		}
	}

	let config =
		if save {
			match config {
				Some(c) => Some(c),
				None => Some(DriveConfig::default_path()?),
			}
		}
		else { None };

	Ok(Settings {
		dev,
		offsets: offsets.unwrap_or_else(OffsetList::defaults),
		config,
		verbose,
	})
}
