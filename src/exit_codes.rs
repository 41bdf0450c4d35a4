pub const SUCCESS: i32 = 0;
/// Bad file, bad header, bad arguments.
pub const INPUT_ERROR: i32 = 1;
/// Anything else: I/O while writing output, serialization.
pub const EXECUTION_ERROR: i32 = 2;

/// Map an error chain to an exit code.
pub fn for_error(err: &anyhow::Error) -> i32 {
    let input = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<arena_edr::EdrError>())
        .any(|e| e.is_input_error());
    if input {
        INPUT_ERROR
    } else {
        EXECUTION_ERROR
    }
}
