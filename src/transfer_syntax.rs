//! Transfer syntax UIDs understood by the loader and resolution of the
//! transfer syntax announced in a WADO-RS `Content-Type` header.

/// Implicit VR Little Endian, assumed when the store announces nothing
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";

pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";
pub const JPEG_EXTENDED: &str = "1.2.840.10008.1.2.4.51";
pub const JPEG_LOSSLESS: &str = "1.2.840.10008.1.2.4.70";
pub const JPEG_LS_LOSSLESS: &str = "1.2.840.10008.1.2.4.80";
pub const JPEG_LS_NEAR_LOSSLESS: &str = "1.2.840.10008.1.2.4.81";
pub const JPEG_2000_LOSSLESS: &str = "1.2.840.10008.1.2.4.90";
pub const JPEG_2000: &str = "1.2.840.10008.1.2.4.91";

/// Static description of a transfer syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSyntaxInfo {
    pub uid: &'static str,
    pub name: &'static str,
    pub compressed: bool,
}

const KNOWN_TRANSFER_SYNTAXES: &[TransferSyntaxInfo] = &[
    TransferSyntaxInfo { uid: IMPLICIT_VR_LITTLE_ENDIAN, name: "Implicit VR Little Endian", compressed: false },
    TransferSyntaxInfo { uid: "1.2.840.10008.1.2.1", name: "Explicit VR Little Endian", compressed: false },
    TransferSyntaxInfo { uid: "1.2.840.10008.1.2.2", name: "Explicit VR Big Endian (Retired)", compressed: false },
    TransferSyntaxInfo { uid: JPEG_BASELINE, name: "JPEG Baseline (Process 1)", compressed: true },
    TransferSyntaxInfo { uid: JPEG_EXTENDED, name: "JPEG Extended (Process 2 & 4)", compressed: true },
    TransferSyntaxInfo { uid: JPEG_LOSSLESS, name: "JPEG Lossless, First-Order Prediction", compressed: true },
    TransferSyntaxInfo { uid: JPEG_LS_LOSSLESS, name: "JPEG-LS Lossless", compressed: true },
    TransferSyntaxInfo { uid: JPEG_LS_NEAR_LOSSLESS, name: "JPEG-LS Lossy (Near-Lossless)", compressed: true },
    TransferSyntaxInfo { uid: JPEG_2000_LOSSLESS, name: "JPEG 2000 (Lossless Only)", compressed: true },
    TransferSyntaxInfo { uid: JPEG_2000, name: "JPEG 2000", compressed: true },
];

/// Look up a transfer syntax by UID
pub fn lookup(uid: &str) -> Option<&'static TransferSyntaxInfo> {
    KNOWN_TRANSFER_SYNTAXES.iter().find(|ts| ts.uid == uid)
}

/// Whether pixel data in this transfer syntax is encapsulated/compressed.
/// Unknown UIDs are treated as compressed.
pub fn is_compressed(uid: &str) -> bool {
    lookup(uid).map_or(true, |ts| ts.compressed)
}

/// Extract the transfer syntax from a `Content-Type` header value.
///
/// Parameters are `;` separated `key=value` pairs. Malformed parameters are
/// skipped, and the last non-empty `transfer-syntax` parameter wins. Falls back
/// to Implicit VR Little Endian.
pub fn transfer_syntax_for_content_type(content_type: Option<&str>) -> String {
    let mut transfer_syntax = IMPLICIT_VR_LITTLE_ENDIAN;

    let Some(content_type) = content_type else {
        return transfer_syntax.to_string();
    };

    for parameter in content_type.split(';') {
        let mut parts = parameter.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };

        if key.trim() == "transfer-syntax" {
            let value = value.trim();
            if !value.is_empty() {
                transfer_syntax = value;
            }
        }
    }

    transfer_syntax.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_dicom_dictionary() {
        assert_eq!(
            IMPLICIT_VR_LITTLE_ENDIAN,
            dicom_dictionary_std::uids::IMPLICIT_VR_LITTLE_ENDIAN
        );
    }

    #[test]
    fn missing_header_yields_default() {
        assert_eq!(transfer_syntax_for_content_type(None), IMPLICIT_VR_LITTLE_ENDIAN);
        assert_eq!(transfer_syntax_for_content_type(Some("")), IMPLICIT_VR_LITTLE_ENDIAN);
        assert_eq!(
            transfer_syntax_for_content_type(Some("application/octet-stream")),
            IMPLICIT_VR_LITTLE_ENDIAN
        );
    }

    #[test]
    fn parses_transfer_syntax_parameter() {
        let ct = "application/octet-stream; transfer-syntax=1.2.3";
        assert_eq!(transfer_syntax_for_content_type(Some(ct)), "1.2.3");

        let ct = "image/jpeg;transfer-syntax = 1.2.840.10008.1.2.4.50 ";
        assert_eq!(transfer_syntax_for_content_type(Some(ct)), JPEG_BASELINE);
    }

    #[test]
    fn last_parameter_wins() {
        let ct = "transfer-syntax=A; transfer-syntax=B";
        assert_eq!(transfer_syntax_for_content_type(Some(ct)), "B");
    }

    #[test]
    fn empty_value_keeps_previous() {
        assert_eq!(
            transfer_syntax_for_content_type(Some("image/jp2; transfer-syntax=")),
            IMPLICIT_VR_LITTLE_ENDIAN
        );
        assert_eq!(
            transfer_syntax_for_content_type(Some("transfer-syntax=1.2.3; transfer-syntax=  ")),
            "1.2.3"
        );
    }

    #[test]
    fn malformed_parameters_are_ignored() {
        // two '=' signs and a case mismatch are both skipped
        let ct = "transfer-syntax=1.2=3; Transfer-Syntax=9.9; transfer-syntax";
        assert_eq!(transfer_syntax_for_content_type(Some(ct)), IMPLICIT_VR_LITTLE_ENDIAN);
    }

    #[test]
    fn lookup_known_syntaxes() {
        assert!(!is_compressed(IMPLICIT_VR_LITTLE_ENDIAN));
        assert!(is_compressed(JPEG_2000_LOSSLESS));
        assert!(is_compressed("1.2.3.4"));
        assert_eq!(lookup(JPEG_EXTENDED).map(|ts| ts.name), Some("JPEG Extended (Process 2 & 4)"));
    }
}
