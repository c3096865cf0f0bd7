//! Extraction of a single frame from a `multipart/related` WADO-RS response

use bytes::Bytes;

use crate::error::FetchError;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// First body part of a multipart response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFrame {
    /// `Content-Type` of the part, if the part declared one
    pub content_type: Option<String>,
    pub data: Bytes,
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Split off the first part of a multipart body.
///
/// The boundary is taken from the part preamble rather than the response
/// header, so bodies from stores that omit the `boundary` parameter still parse.
pub fn extract_first_part(body: &Bytes) -> Result<MultipartFrame, FetchError> {
    let header_end = find(body, HEADER_TERMINATOR, 0)
        .ok_or_else(|| FetchError::InvalidMultipart("no multipart mime header".into()))?;

    let header = String::from_utf8_lossy(&body[..header_end]);
    let lines: Vec<&str> = header.split("\r\n").map(str::trim).collect();

    let boundary = lines
        .iter()
        .find(|line| line.starts_with("--"))
        .ok_or_else(|| FetchError::InvalidMultipart("no multipart boundary".into()))?;

    let content_type = lines.iter().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-type")
            .then(|| value.trim().to_string())
    });

    let offset = header_end + HEADER_TERMINATOR.len();
    let end = match find(body, boundary.as_bytes(), offset) {
        // the CRLF before the delimiter belongs to the delimiter
        Some(pos) if pos >= offset + 2 && &body[pos - 2..pos] == b"\r\n" => pos - 2,
        Some(pos) => pos,
        None => body.len(),
    };

    Ok(MultipartFrame {
        content_type,
        data: body.slice(offset..end),
    })
}
