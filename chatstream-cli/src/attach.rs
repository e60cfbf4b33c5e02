use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chatstream_types::Attachment;

use crate::CliError;

/// Image MIME type for a file extension, if it is one the upstream accepts.
fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Read a file into an [`Attachment`].
///
/// Images become base64 data URLs. Anything else is read as text; a file
/// that is not UTF-8 is attached with empty content.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the file cannot be read.
pub fn load_attachment(path: &Path) -> Result<Attachment, CliError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::read(path)?;

    if let Some(mime) = image_mime(path) {
        let data_url = format!("data:{mime};base64,{}", STANDARD.encode(&bytes));
        return Ok(Attachment::Image { name, data_url });
    }

    let content = String::from_utf8(bytes).unwrap_or_else(|_| {
        tracing::debug!(file = %name, "attachment is not UTF-8, sending without content");
        String::new()
    });
    Ok(Attachment::Text { name, content })
}
