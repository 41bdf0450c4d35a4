use std::io::Write;
use std::path::Path;

/// Write a string to stdout or a file.
pub fn write_output(text: &str, output_path: Option<&Path>) -> anyhow::Result<()> {
    match output_path {
        Some(path) => std::fs::write(path, text)
            .map_err(|e| anyhow::anyhow!("Failed to write output file '{}': {}", path.display(), e)),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .map_err(|e| anyhow::anyhow!("Failed to write to stdout: {}", e))
        }
    }
}

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> anyhow::Result<String> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}

/// Report a failed command on stderr and return its exit code.
pub fn report(err: anyhow::Error) -> i32 {
    eprintln!("Error: {err:#}");
    crate::exit_codes::for_error(&err)
}
