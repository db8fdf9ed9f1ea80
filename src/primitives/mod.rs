//! Low-level primitives shared by the codec and the file layer.

/// Little-endian integers and a bounds-checked read cursor.
pub mod bytes;

/// Whole-file reads and atomic whole-file writes.
pub mod io;
