//! CLI Exit Code Registry
//!
//! Single source of truth for `parceljoin` exit codes. Scripts rely on
//! them, so existing values never change meaning.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success (row-level warnings do not change this)           |
//! | 1    | General error                                             |
//! | 2    | Usage error (bad arguments, conflicting sources)          |
//! | 3    | Required column missing from an input table               |
//! | 4    | Source acquisition failed (file, network, table decoding) |
//! | 5    | Invalid join config                                       |
//! | 6    | Output could not be written                               |

/// Success - join completed and output written.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// clap exits with this code on its own parse failures.
pub const EXIT_USAGE: u8 = 2;

/// No header in an input table matches any alias of a required field.
pub const EXIT_MISSING_COLUMN: u8 = 3;

/// Input file missing or unreadable, HTTP failure, or text that is not a
/// readable table.
pub const EXIT_SOURCE: u8 = 4;

/// `--config` file unreadable, not valid TOML, or fails validation.
pub const EXIT_CONFIG: u8 = 5;

/// Output CSV or summary JSON could not be written.
pub const EXIT_OUTPUT: u8 = 6;
