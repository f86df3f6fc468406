use uuid::Uuid;

/// Generate a storage-safe, practically-unique artifact name.
///
/// The stem is 32 lowercase hex characters from 128 random bits, so two
/// concurrent calls cannot collide by sharing a clock tick. The extension is
/// appended in normalized form.
pub fn generate(extension: &str) -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        normalize_extension(extension)
    )
}

/// Normalize an extension for use in a storage name: lower-cased and
/// dot-prefixed, or an empty string when there is no extension. A leading dot
/// on the input is tolerated.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_ascii_lowercase())
    }
}

/// The substring after the last `.` of `filename`, empty when there is none.
pub fn file_extension(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| extension)
        .unwrap_or("")
}
