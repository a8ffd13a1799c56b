//! Process exit codes, taken from BSD `sysexits.h`.
//!
//! Each code corresponds to one family of `CliError`; see
//! [`CliError::exit_code`](crate::cli::CliError::exit_code).

pub const OK: i32 = 0;

/// Bad flag value, e.g. a `--file` that does not exist
pub const USAGE: i32 = 64;

/// Response or category payload could not be encoded or decoded
pub const DATAERR: i32 = 65;

/// Requested category or name is not in the forest
pub const NOINPUT: i32 = 66;

/// API answered with a non rate-limit failure
pub const UNAVAILABLE: i32 = 69;

pub const IOERR: i32 = 74;

/// Still rate limited after the last retry; try again later
pub const TEMPFAIL: i32 = 75;

/// Unusable settings: bad config file, retry values or base url
pub const CONFIG: i32 = 78;
