use geofacet_core::Error;
use std::io::ErrorKind;
use std::path::Path;

/// Map engine construction errors to user-friendly messages
/// Returns (title, message, details)
pub fn map_load_error(error: &Error, config: &Path, data: &Path) -> (String, String, String) {
    match error {
        Error::Io { path, source } => match source.kind() {
            ErrorKind::NotFound => (
                "File Not Found".to_string(),
                "The file could not be found.".to_string(),
                format!(
                    "Path: {}\n\nPlease verify the file exists and you have permission to read it.",
                    path.display()
                ),
            ),
            ErrorKind::PermissionDenied => (
                "Permission Denied".to_string(),
                "Permission denied.".to_string(),
                format!("You don't have permission to read this file:\n{}", path.display()),
            ),
            _ => (
                "Error Loading File".to_string(),
                "Failed to read input file.".to_string(),
                error.to_string(),
            ),
        },
        Error::Json { context, source } => {
            let path = if context == "configuration" { config } else { data };
            (
                "Invalid JSON".to_string(),
                format!("The {} file is not valid JSON.", context),
                format!("Path: {}\n\n{}", path.display(), source),
            )
        }
        Error::InvalidConfig(_) => (
            "Validation Error".to_string(),
            "The configuration file has validation errors.".to_string(),
            numbered(&error.details()),
        ),
        Error::InvalidDataset(_) => (
            "Validation Error".to_string(),
            "The dataset file has validation errors.".to_string(),
            numbered(&error.details()),
        ),
    }
}

fn numbered(errors: &[String]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, error)| format!("  {}. {}", i + 1, error))
        .collect::<Vec<_>>()
        .join("\n")
}
