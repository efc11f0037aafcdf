/*!
# Find Offset: Drive Configuration
*/

use crate::{
	CONFIG_BASE,
	CONFIG_FILE,
	FindOffsetError,
	ReadOffset,
};
use serde::{
	Deserialize,
	Serialize,
};
use std::{
	fmt,
	path::{
		Path,
		PathBuf,
	},
};



#[derive(Debug, Clone, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
/// # Drive Identity.
///
/// The vendor, model, and firmware revision reported by the drive. The model
/// is required; the others may be empty.
pub struct DriveIdentity {
	/// # Vendor.
	#[serde(default)]
	vendor: String,

	/// # Model.
	model: String,

	/// # Firmware Revision.
	#[serde(default)]
	revision: String,
}

impl fmt::Display for DriveIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if ! self.vendor.is_empty() { write!(f, "[{}] ", self.vendor)?; }
		f.write_str(&self.model)?;
		if ! self.revision.is_empty() { write!(f, " ({})", self.revision)?; }
		Ok(())
	}
}

impl DriveIdentity {
	#[must_use]
	/// # New.
	///
	/// Values are trimmed; `None` is returned if the model is empty.
	pub fn new(vendor: &str, model: &str, revision: &str) -> Option<Self> {
		let model = model.trim();
		if model.is_empty() { None }
		else {
			Some(Self {
				vendor: vendor.trim().to_owned(),
				model: model.to_owned(),
				revision: revision.trim().to_owned(),
			})
		}
	}

	#[must_use]
	/// # Vendor.
	pub fn vendor(&self) -> &str { &self.vendor }

	#[must_use]
	/// # Model.
	pub fn model(&self) -> &str { &self.model }

	#[must_use]
	/// # Firmware Revision.
	pub fn revision(&self) -> &str { &self.revision }
}



/// # Result Publisher.
///
/// This is where a confirmed offset goes to live.
pub trait ResultPublisher {
	/// # Publish.
	///
	/// ## Errors
	///
	/// Return an error if the offset could not be saved.
	fn publish(&mut self, drive: &DriveIdentity, offset: ReadOffset)
	-> Result<(), FindOffsetError>;
}



#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
/// # Config File Contents.
struct DriveConfigFile {
	#[serde(default, rename = "drive")]
	/// # Drives.
	drives: Vec<DriveEntry>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
/// # Config Entry.
struct DriveEntry {
	#[serde(flatten)]
	/// # Drive.
	drive: DriveIdentity,

	/// # Offset (samples).
	read_offset: i16,
}



#[derive(Debug, Clone)]
/// # Drive Configuration.
///
/// This is a TOML file holding the read offsets for any number of drives,
/// keyed by vendor, model, and firmware revision:
///
/// ```toml
/// [[drive]]
/// vendor = "HL-DT-ST"
/// model = "DVDRAM GH24NSC0"
/// revision = "LY00"
/// read_offset = 6
/// ```
pub struct DriveConfig {
	/// # File Path.
	path: PathBuf,

	/// # Contents.
	data: DriveConfigFile,
}

impl DriveConfig {
	/// # Load.
	///
	/// Load the configuration from `path`, or start fresh if it doesn't exist
	/// yet.
	///
	/// ## Errors
	///
	/// Returns an error if the file exists but can't be read or parsed.
	pub fn load<P>(path: P) -> Result<Self, FindOffsetError>
	where P: AsRef<Path> {
		let path = path.as_ref().to_path_buf();
		let data =
			if path.exists() {
				std::fs::read_to_string(&path)
					.ok()
					.and_then(|raw| toml::from_str::<DriveConfigFile>(&raw).ok())
					.ok_or_else(|| FindOffsetError::ConfigRead(path.to_string_lossy().into_owned()))?
			}
			else { DriveConfigFile::default() };

		Ok(Self { path, data })
	}

	/// # Default Path.
	///
	/// Return `CWD/CONFIG_BASE/CONFIG_FILE`.
	///
	/// ## Errors
	///
	/// This will return an error if the current working directory is invalid.
	pub fn default_path() -> Result<PathBuf, FindOffsetError> {
		std::env::current_dir()
			.ok()
			.filter(|p| p.is_dir())
			.map(|p| p.join(CONFIG_BASE).join(CONFIG_FILE))
			.ok_or_else(|| FindOffsetError::ConfigRead(CONFIG_BASE.to_owned()))
	}

	#[must_use]
	/// # Path.
	pub fn path(&self) -> &Path { &self.path }

	#[must_use]
	/// # Read Offset.
	///
	/// Return the saved offset for the drive, if any.
	pub fn read_offset(&self, drive: &DriveIdentity) -> Option<ReadOffset> {
		self.data.drives.iter()
			.find(|e| e.drive.eq(drive))
			.and_then(|e| ReadOffset::try_from(e.read_offset).ok())
	}

	/// # Save.
	///
	/// Write the configuration to disk, replacing the original atomically.
	fn save(&self) -> Result<(), FindOffsetError> {
		let err = || FindOffsetError::ConfigWrite(self.path.to_string_lossy().into_owned());
		let out = toml::to_string_pretty(&self.data).map_err(|_| err())?;

		// Make sure the parent exists.
		let parent = self.path.parent()
			.filter(|p| ! p.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));
		if ! parent.is_dir() {
			std::fs::create_dir_all(parent).map_err(|_| err())?;
		}

		write_atomic::write_file(&self.path, out.as_bytes()).map_err(|_| err())
	}
}

impl ResultPublisher for DriveConfig {
	fn publish(&mut self, drive: &DriveIdentity, offset: ReadOffset)
	-> Result<(), FindOffsetError> {
		let read_offset = offset.samples();
		if let Some(entry) = self.data.drives.iter_mut().find(|e| e.drive.eq(drive)) {
			entry.read_offset = read_offset;
		}
		else {
			self.data.drives.push(DriveEntry { drive: drive.clone(), read_offset });
		}

		self.save()
	}
}
