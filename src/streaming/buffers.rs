//! Buffer size constants for streaming reads and writes.

/// Default input buffer size (256 KB).
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Low-memory input buffer size (64 KB).
pub const LOW_MEMORY_INPUT_BUFFER: usize = 64 * 1024;

/// Default output buffer size (2 MB) for the command line writer.
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Initial capacity of the physical line buffer.
/// Sufficient for most rows; grows for long or multiline records.
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Returns the input buffer size for the low_memory flag.
#[inline]
pub const fn input_buffer_size(low_memory: bool) -> usize {
    if low_memory {
        LOW_MEMORY_INPUT_BUFFER
    } else {
        DEFAULT_INPUT_BUFFER
    }
}
