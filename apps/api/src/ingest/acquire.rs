//! Document acquirer — raw PDF bytes from a direct upload or a Google Drive
//! share link.

use bytes::Bytes;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use tracing::info;

use crate::errors::AppError;

const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Raw document bytes plus the filename they arrived under.
#[derive(Debug, Clone)]
pub struct AcquiredDocument {
    pub bytes: Bytes,
    pub filename: String,
}

/// Validates a direct upload. Rejects anything not named `*.pdf` before any
/// expensive work happens.
pub fn acquire_from_upload(bytes: Bytes, filename: &str) -> Result<AcquiredDocument, AppError> {
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(AppError::InvalidFormat(
            "Only PDF files are allowed".to_string(),
        ));
    }
    Ok(AcquiredDocument {
        bytes,
        filename: filename.to_string(),
    })
}

/// Extracts the file id from a Google Drive share URL.
/// Two URL shapes are recognized: `/d/<id>` and `?...id=<id>`.
pub fn extract_drive_file_id(drive_url: &str) -> Result<String, AppError> {
    static PATH_RE: OnceLock<Regex> = OnceLock::new();
    static QUERY_RE: OnceLock<Regex> = OnceLock::new();

    let path_re = PATH_RE.get_or_init(|| Regex::new(r"/d/([\w-]+)").expect("valid regex"));
    let query_re = QUERY_RE.get_or_init(|| Regex::new(r"id=([\w-]+)").expect("valid regex"));

    if let Some(caps) = path_re.captures(drive_url) {
        return Ok(caps[1].to_string());
    }
    if let Some(caps) = query_re.captures(drive_url) {
        return Ok(caps[1].to_string());
    }
    Err(AppError::InvalidFormat(
        "Invalid Google Drive URL".to_string(),
    ))
}

/// Downloads PDF bytes from the configured Drive download endpoint.
#[derive(Clone)]
pub struct DriveClient {
    client: Client,
    download_url: String,
}

impl DriveClient {
    pub fn new(download_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            download_url,
        }
    }

    /// Resolves a share URL and downloads the file. The filename comes from
    /// the Content-Disposition header when present, otherwise `<id>.pdf`; a
    /// `.pdf` suffix is forced either way. Network failures are not retried.
    pub async fn fetch(&self, drive_url: &str) -> Result<AcquiredDocument, AppError> {
        let file_id = extract_drive_file_id(drive_url)?;

        let response = self
            .client
            .get(&self.download_url)
            .query(&[("id", file_id.as_str())])
            .send()
            .await
            .map_err(|e| AppError::AcquisitionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::AcquisitionFailed(format!(
                "download endpoint returned {status}"
            )));
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| format!("{file_id}.pdf"));
        let filename = ensure_pdf_suffix(filename);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::AcquisitionFailed(e.to_string()))?;

        info!(
            "Downloaded {} ({} bytes) from Drive file {file_id}",
            filename,
            bytes.len()
        );
        Ok(AcquiredDocument { bytes, filename })
    }
}

/// Pulls the filename out of a Content-Disposition header value.
fn filename_from_disposition(header: &str) -> Option<String> {
    let (_, value) = header.split_once("filename=")?;
    let name = value.trim().trim_matches('"').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn ensure_pdf_suffix(filename: String) -> String {
    if filename.to_ascii_lowercase().ends_with(".pdf") {
        filename
    } else {
        format!("{filename}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_id_from_share_path() {
        let id = extract_drive_file_id("https://drive.google.com/file/d/ABC123/view").unwrap();
        assert_eq!(id, "ABC123");
    }

    #[test]
    fn test_extract_id_from_query_param() {
        let id = extract_drive_file_id("https://drive.google.com/uc?id=XYZ789").unwrap();
        assert_eq!(id, "XYZ789");
    }

    #[test]
    fn test_extract_id_allows_hyphens_and_underscores() {
        let id = extract_drive_file_id("https://drive.google.com/file/d/a-b_C1/view").unwrap();
        assert_eq!(id, "a-b_C1");
    }

    #[test]
    fn test_extract_id_rejects_unknown_shapes() {
        let err = extract_drive_file_id("https://example.com/not-a-drive-link").unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
    }

    #[test]
    fn test_upload_rejects_non_pdf_filename() {
        let err = acquire_from_upload(Bytes::from_static(b"%PDF"), "resume.docx").unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
    }

    #[test]
    fn test_upload_accepts_pdf_filename_case_insensitive() {
        let doc = acquire_from_upload(Bytes::from_static(b"%PDF"), "Resume.PDF").unwrap();
        assert_eq!(doc.filename, "Resume.PDF");
    }

    #[test]
    fn test_filename_from_disposition_quoted() {
        let name = filename_from_disposition(r#"attachment; filename="cv.pdf""#).unwrap();
        assert_eq!(name, "cv.pdf");
    }

    #[test]
    fn test_filename_from_disposition_unquoted() {
        let name = filename_from_disposition("attachment; filename=cv.pdf").unwrap();
        assert_eq!(name, "cv.pdf");
    }

    #[test]
    fn test_filename_from_disposition_missing() {
        assert!(filename_from_disposition("attachment").is_none());
    }

    #[test]
    fn test_pdf_suffix_forced() {
        assert_eq!(ensure_pdf_suffix("report".to_string()), "report.pdf");
        assert_eq!(ensure_pdf_suffix("report.pdf".to_string()), "report.pdf");
    }
}
