use serde_json::Number;
use uuid::Uuid;

use crate::errors::AppError;

/// PDF, Word (OOXML) and the two common image formats.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/png",
    "image/jpeg",
];

/// 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub fn validate_content_type(content_type: &str) -> Result<(), AppError> {
    if ALLOWED_CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unsupported type {content_type}"
        )))
    }
}

/// Accepts whole numbers in `1..=MAX_UPLOAD_BYTES`. Negative, fractional and oversized
/// numbers all fail the same way.
pub fn validate_size(size: &Number) -> Result<u64, AppError> {
    match size.as_u64() {
        Some(s) if (1..=MAX_UPLOAD_BYTES).contains(&s) => Ok(s),
        _ => Err(AppError::Validation(format!(
            "Size must be between 1 and {MAX_UPLOAD_BYTES} bytes, got {size}"
        ))),
    }
}

/// Lower-cased text after the last `.`.
///
/// A name without any `.` yields the whole name, so `"resume"` becomes the extension
/// `"resume"`.
pub fn file_extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or(filename)
        .to_lowercase()
}

/// `<prefix>/<uuid>.<ext>`
pub fn generate_key(prefix: &str, filename: &str) -> String {
    format!("{prefix}/{}.{}", Uuid::new_v4(), file_extension(filename))
}

/// Final path segment of a storage key.
pub fn filename_from_key(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types_pass() {
        for ct in ALLOWED_CONTENT_TYPES {
            assert!(validate_content_type(ct).is_ok(), "{ct} should be allowed");
        }
    }

    #[test]
    fn test_unsupported_types_fail() {
        for ct in [
            "text/plain",
            "image/gif",
            "application/msword",
            "APPLICATION/PDF",
            "",
        ] {
            let err = validate_content_type(ct).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{ct} should fail");
        }
    }

    fn number(raw: &str) -> Number {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_size_bounds() {
        assert_eq!(validate_size(&number("1")).unwrap(), 1);
        assert_eq!(validate_size(&number("10485760")).unwrap(), 10_485_760);
        assert!(validate_size(&number("0")).is_err());
        assert!(validate_size(&number("-5")).is_err());
        assert!(validate_size(&number("10485761")).is_err());
        assert!(validate_size(&number("9223372036854775807")).is_err());
    }

    #[test]
    fn test_size_must_be_whole_and_representable() {
        for raw in ["1024.5", "1e3", "18446744073709551616"] {
            let err = validate_size(&number(raw)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{raw} should fail");
        }
    }

    #[test]
    fn test_extension_lowercased() {
        assert_eq!(file_extension("Resume.PDF"), "pdf");
        assert_eq!(file_extension("my.cv.final.docx"), "docx");
    }

    #[test]
    fn test_extension_without_dot_is_whole_name() {
        assert_eq!(file_extension("Resume"), "resume");
        assert_eq!(file_extension("trailing."), "");
    }

    #[test]
    fn test_generate_key_shape() {
        let key = generate_key("dev/resumes", "resume.pdf");
        let rest = key.strip_prefix("dev/resumes/").unwrap();
        let (id, ext) = rest.split_once('.').unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(ext, "pdf");
    }

    #[test]
    fn test_generate_key_is_fresh() {
        assert_ne!(
            generate_key("dev/resumes", "a.pdf"),
            generate_key("dev/resumes", "a.pdf")
        );
    }

    #[test]
    fn test_filename_from_key() {
        assert_eq!(filename_from_key("dev/resumes/abc.pdf"), "abc.pdf");
        assert_eq!(filename_from_key("bare.png"), "bare.png");
    }
}
