/*!
# Find Offset
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(clippy::redundant_pub_crate)]



mod cli;

use findoffset_core::{
	AccurateRipClient,
	CalibrationResult,
	Disc,
	DriveConfig,
	DriveIdentity,
	FindOffsetError,
	KillSwitch,
	OffsetFinder,
};
use fyi_msg::Msg;
use std::process::ExitCode;



/// # A Divider Line.
///
/// This is used to encase the drive vendor/model during summary. We'll slice
/// it to match the length rather than `"-".repeat()` or whatever.
const DIVIDER: &str = "----------------------------------------------";



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() -> ExitCode {
	match main__() {
		Ok(CalibrationResult::Found(_)) => ExitCode::SUCCESS,
		Ok(CalibrationResult::NotFound) => ExitCode::FAILURE,
		Err(e @ (FindOffsetError::PrintHelp | FindOffsetError::PrintVersion)) => {
			println!("{e}");
			ExitCode::SUCCESS
		},
		Err(e) => {
			Msg::from(e).eprint();
			ExitCode::FAILURE
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff.
fn main__() -> Result<CalibrationResult, FindOffsetError> {
	let settings = cli::parse()?;

	// CTRL+C stops the search between trials.
	let killed = KillSwitch::default();
	let k2 = killed.clone();
	ctrlc::set_handler(move || { k2.kill(); })
		.map_err(|_| FindOffsetError::Bug("unable to intercept CTRL+C"))?;

	// Load the disc and summarize it.
	let mut disc = Disc::new(settings.dev.as_ref())?;
	let drive = disc.drive().cloned();
	drive_summary(drive.as_ref());
	eprintln!("{disc}");

	// Load the config, if we're saving.
	let mut config = match settings.config {
		Some(path) => Some(DriveConfig::load(path)?),
		None => None,
	};
	if let Some(c) = config.as_ref() {
		Msg::info(format!("A confirmed offset will be saved to {}.", c.path().display()))
			.eprint();
	}
	if let Some((c, d)) = config.as_ref().zip(drive.as_ref()) {
		if let Some(offset) = c.read_offset(d) {
			Msg::info(format!(
				"This drive's saved read offset is {offset}; it will be replaced if a different one is confirmed.",
			)).eprint();
		}
	}

	let id = disc.disc_id();
	Msg::info(format!(
		"Trying up to {} read offset(s) against AccurateRip disc {id}.",
		settings.offsets.len(),
	)).eprint();

	let db = AccurateRipClient::default();
	let mut finder = OffsetFinder::new(&db)
		.with_kill_switch(killed)
		.with_verbose(settings.verbose);
	if let Some(c) = config.as_mut() { finder = finder.with_publisher(c); }

	let writer = std::io::stdout();
	let res = finder.run(&id, drive.as_ref(), &mut disc, &settings.offsets, writer.lock())?;

	match res {
		CalibrationResult::Found(offset) => {
			Msg::success(format!("The drive's read offset is {offset}.")).eprint();
		},
		CalibrationResult::NotFound => {
			Msg::warning("The drive's read offset could not be determined.").eprint();
		},
	}

	Ok(res)
}

/// # Drive Summary.
///
/// Print the drive vendor/model (if known) in a little box.
fn drive_summary(drive: Option<&DriveIdentity>) {
	let Some(drive) = drive else { return; };
	let vm = drive.to_string();
	let line = &DIVIDER[..vm.len().min(DIVIDER.len())];
	eprintln!("\x1b[2;36m{line}\x1b[0m\n\x1b[1;36m{vm}\x1b[0m\n\x1b[2;36m{line}\x1b[0m\n");
}
