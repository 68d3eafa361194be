//! Result-download media type lookup. Exhaustive and literal, not a general-purpose
//! guesser, since the server only ever hands back the output of its own four
//! processors.

pub fn media_type_for_extension(ext: &str) -> &'static str {
    match ext {
        ".webp" => "image/webp",
        ".png" => "image/png",
        ".jpg" => "image/jpeg",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        ".tiff" => "image/tiff",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        ".webm" => "video/webm",
        ".avi" => "video/x-msvideo",
        ".mkv" => "video/x-matroska",
        ".zip" => "application/zip",
        ".mp3" => "audio/mpeg",
        ".aac" => "audio/aac",
        ".wav" => "audio/wav",
        ".flac" => "audio/flac",
        ".ogg" => "audio/ogg",
        ".m4a" => "audio/mp4",
        ".wma" => "audio/x-ms-wma",
        ".pdf" => "application/pdf",
        ".txt" => "text/plain",
        ".json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_extensions() {
        assert_eq!(media_type_for_extension(".pdf"), "application/pdf");
        assert_eq!(media_type_for_extension(".jpg"), "image/jpeg");
        assert_eq!(media_type_for_extension(".zip"), "application/zip");
    }

    #[test]
    fn falls_back_to_octet_stream() {
        assert_eq!(media_type_for_extension(".unknown"), "application/octet-stream");
        assert_eq!(media_type_for_extension(""), "application/octet-stream");
    }
}
