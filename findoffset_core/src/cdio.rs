/*!
# Find Offset: `libcdio` Wrappers
*/

use crate::{
	CD_DATA_SIZE,
	CD_LEADIN,
	DriveIdentity,
	FindOffsetError,
};
use libcdio_sys::{
	cdio_hwinfo,
	cdio_track_enums_CDIO_CDROM_LEADOUT_TRACK,
	discmode_t_CDIO_DISC_MODE_CD_DA,
	discmode_t_CDIO_DISC_MODE_CD_MIXED,
	driver_id_t_DRIVER_DEVICE, // The equivalent of "use whatever's best".
	driver_return_code_t_DRIVER_OP_NOT_PERMITTED,
	driver_return_code_t_DRIVER_OP_SUCCESS,
	track_format_t_TRACK_FORMAT_AUDIO,
	track_format_t_TRACK_FORMAT_ERROR,
	track_format_t_TRACK_FORMAT_PSX,
};
use std::{
	ffi::{
		CStr,
		CString,
	},
	os::unix::ffi::OsStrExt,
	path::Path,
	sync::Once,
};



static LIBCDIO_INIT: Once = Once::new();



#[derive(Debug)]
#[allow(dead_code)] // We just want to make sure dev lives as long as the ptr.
/// # CDIO Instance.
pub(crate) struct LibcdioInstance {
	dev: Option<CString>,
	ptr: *mut libcdio_sys::CdIo_t,
}

impl Drop for LibcdioInstance {
	#[allow(unsafe_code)]
	fn drop(&mut self) {
		// Release the C memory!
		if ! self.ptr.is_null() {
			unsafe { libcdio_sys::cdio_destroy(self.ptr); }
		}
	}
}

impl LibcdioInstance {
	#[allow(unsafe_code)]
	/// # New!
	///
	/// Initialize a new instance, optionally connecting to a specific device.
	///
	/// ## Errors
	///
	/// This will return an error if initialization fails, or if the provided
	/// device path is obviously wrong.
	pub(crate) fn new<P>(dev: Option<P>) -> Result<Self, FindOffsetError>
	where P: AsRef<Path> {
		// Make sure the library has been initialized.
		init();

		// Take a look at the desired device.
		let dev = {
			if let Some(dev) = dev {
				let dev = dev.as_ref();
				let original: String = dev.to_string_lossy().into_owned();
				if ! dev.exists() {
					return Err(FindOffsetError::Device(original));
				}
				let dev = CString::new(dev.as_os_str().as_bytes())
					.map_err(|_| FindOffsetError::Device(original))?;
				Some(dev)
			}
			else { None }
		};

		// Connect to it.
		let ptr = unsafe {
			libcdio_sys::cdio_open(
				dev.as_ref().map_or_else(std::ptr::null, |v| v.as_ptr()),
				driver_id_t_DRIVER_DEVICE,
			)
		};

		// NULL is bad.
		if ptr.is_null() {
			Err(FindOffsetError::DeviceOpen(dev.map(|v| v.to_string_lossy().into_owned())))
		}
		// Otherwise maybe!
		else {
			let out = Self { dev, ptr };
			out.check_disc_mode()?;
			Ok(out)
		}
	}

	#[allow(unsafe_code)]
	#[allow(non_upper_case_globals)] // These aren't our globals.
	/// # Check Disc Mode.
	///
	/// This makes sure an audio CD is actually present in the drive.
	///
	/// ## Errors
	///
	/// Returns an error if the disc is missing or unsupported.
	fn check_disc_mode(&self) -> Result<(), FindOffsetError> {
		let discmode = unsafe {
			libcdio_sys::cdio_get_discmode(self.ptr)
		};
		if matches!(
			discmode,
			discmode_t_CDIO_DISC_MODE_CD_DA | discmode_t_CDIO_DISC_MODE_CD_MIXED
		) {
			Ok(())
		}
		else { Err(FindOffsetError::DiscMode) }
	}

	/// # As Ptr.
	const fn as_ptr(&self) -> *const libcdio_sys::CdIo_t { self.ptr.cast() }
}

impl LibcdioInstance {
	#[allow(unsafe_code)]
	/// # First Track Number.
	pub(crate) fn first_track_num(&self) -> Result<u8, FindOffsetError> {
		let raw = unsafe {
			libcdio_sys::cdio_get_first_track_num(self.as_ptr())
		};

		if raw == 0 { Err(FindOffsetError::FirstTrackNum) }
		else { Ok(raw) }
	}

	/// # Leadout.
	pub(crate) fn leadout_lba(&self) -> Result<u32, FindOffsetError> {
		let idx = u8::try_from(cdio_track_enums_CDIO_CDROM_LEADOUT_TRACK)
			.unwrap_or(170);
		self.track_lba_start(idx).map_err(|_| FindOffsetError::Leadout)
	}

	#[allow(unsafe_code)]
	/// # Get the Number of Tracks.
	pub(crate) fn num_tracks(&self) -> Result<u8, FindOffsetError> {
		let raw = unsafe {
			libcdio_sys::cdio_get_num_tracks(self.as_ptr())
		};

		if raw == 0 { Err(FindOffsetError::NumTracks) }
		else { Ok(raw) }
	}

	#[allow(unsafe_code)]
	#[allow(non_upper_case_globals)] // Not our globals.
	/// # Track Format.
	///
	/// Returns `true` for audio, `false` for data, and an error for anything
	/// else.
	pub(crate) fn track_format(&self, idx: u8) -> Result<bool, FindOffsetError> {
		let kind = unsafe {
			libcdio_sys::cdio_get_track_format(self.as_ptr(), idx)
		};

		match kind {
			track_format_t_TRACK_FORMAT_AUDIO => Ok(true),
			track_format_t_TRACK_FORMAT_PSX |
			track_format_t_TRACK_FORMAT_ERROR => Err(FindOffsetError::TrackFormat(idx)),
			_ => Ok(false),
		}
	}

	#[allow(unsafe_code)]
	/// # Track LBA Start.
	pub(crate) fn track_lba_start(&self, idx: u8) -> Result<u32, FindOffsetError> {
		if idx == 0 { Err(FindOffsetError::TrackNumber(0)) }
		else {
			let raw = unsafe {
				libcdio_sys::cdio_get_track_lsn(self.as_ptr(), idx)
			};
			if raw < 0 { Err(FindOffsetError::TrackLba(idx)) }
			else { Ok(raw.unsigned_abs() + u32::from(CD_LEADIN)) }
		}
	}
}

impl LibcdioInstance {
	#[allow(unsafe_code, clippy::cast_sign_loss)]
	/// # Drive Identity.
	///
	/// Fetch the drive vendor, model, and firmware revision, if possible.
	pub(crate) fn drive_identity(&self) -> Option<DriveIdentity> {
		let mut raw = cdio_hwinfo {
			psz_vendor: [0; 9],
			psz_model: [0; 17],
			psz_revision: [0; 5],
		};

		// The return code is a bool, true for good, instead of the usual
		// 0 for good.
		if 1 == unsafe { libcdio_sys::cdio_get_hwinfo(self.as_ptr(), &mut raw) } {
			// Rather than deal with the uncertainty of pointers, let's recast
			// the signs since we have everything right here.
			let vendor_u8 = raw.psz_vendor.map(|b| b as u8);
			let model_u8 = raw.psz_model.map(|b| b as u8);
			let revision_u8 = raw.psz_revision.map(|b| b as u8);
			let vendor = c_bytes_to_str(&vendor_u8);
			let model = c_bytes_to_str(&model_u8);
			let revision = c_bytes_to_str(&revision_u8);

			DriveIdentity::new(vendor, model, revision)
		}
		else { None }
	}
}

impl LibcdioInstance {
	#[allow(unsafe_code)]
	#[allow(non_upper_case_globals)] // Not our globals.
	/// # Read Raw.
	///
	/// This attempts to read a single audio sector to the provided buffer.
	///
	/// ## Errors
	///
	/// This will return an error if the read operation is unsupported, or the
	/// disc is too messed up to be read.
	pub(crate) fn read_cd(
		&self,
		buf: &mut [u8; CD_DATA_SIZE as usize],
		lsn: i32,
	) -> Result<(), FindOffsetError> {
		// Reset the buffer before beginning.
		buf.fill(0);

		let res = unsafe {
			libcdio_sys::mmc_read_cd(
				self.as_ptr(),
				buf.as_mut_ptr().cast(),
				lsn,
				1,      // Sector type: CDDA.
				0,      // No random data manipulation thank you kindly.
				0,      // No header syncing.
				0,      // No headers.
				1,      // YES audio block!
				0,      // No EDC.
				0,      // No C2.
				0,      // No subchannel.
				CD_DATA_SIZE,
				1,      // One block at a time.
			)
		};
		match res {
			driver_return_code_t_DRIVER_OP_NOT_PERMITTED => Err(FindOffsetError::CdReadUnsupported),
			driver_return_code_t_DRIVER_OP_SUCCESS => Ok(()),
			_ => Err(FindOffsetError::CdRead(lsn)),
		}
	}
}



#[allow(unsafe_code)]
/// # Initialize `libcdio`.
fn init() {
	LIBCDIO_INIT.call_once(|| unsafe { libcdio_sys::cdio_init(); });
}

/// # Fixed C String to Str.
///
/// Hardware info comes back in fixed-size, nul-terminated arrays. Empty or
/// invalid values are returned as empty strings.
fn c_bytes_to_str(src: &[u8]) -> &str {
	if src.first().map_or(true, |&b| b == 0) { "" }
	else {
		CStr::from_bytes_until_nul(src)
			.ok()
			.and_then(|v| v.to_str().ok())
			.unwrap_or_default()
	}
}
