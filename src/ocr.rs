//! Image text extraction through the Tesseract CLI.
//!
//! The image arrives base64-encoded in the request body, is decoded here and
//! piped to `tesseract stdin stdout`, which prints the recognised text.

use std::process::Stdio;

use anyhow::{Context, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::OcrConfig;

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 image, tolerating a `data:<mime>;base64,` prefix and
/// embedded whitespace.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>> {
    let encoded = encoded.trim();
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .context("data URL has no payload")?,
        None => encoded,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = LENIENT_BASE64
        .decode(compact.as_bytes())
        .context("invalid base64 image data")?;

    anyhow::ensure!(!bytes.is_empty(), "image is empty");
    Ok(bytes)
}

/// Decode `encoded` and run it through Tesseract, returning the raw text.
pub async fn extract_text(config: &OcrConfig, encoded: &str) -> Result<String> {
    let image = decode_image(encoded)?;
    tracing::debug!(bytes = image.len(), command = %config.command, "running OCR");

    let mut cmd = Command::new(&config.command);
    cmd.arg("stdin").arg("stdout");
    if let Some(ref lang) = config.lang {
        cmd.arg("-l").arg(lang);
    }
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to start {}", config.command))?;

    let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
    let writer = tokio::spawn(async move {
        // Tesseract may exit before reading everything; its exit status tells us why.
        let _ = stdin.write_all(&image).await;
    });

    let output = tokio::time::timeout(config.timeout(), child.wait_with_output())
        .await
        .map_err(|_| {
            tracing::warn!("OCR timed out after {}s", config.timeout_secs);
            anyhow::anyhow!("tesseract timed out after {}s", config.timeout_secs)
        })?
        .context("failed to wait for tesseract")?;
    let _ = writer.await;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("tesseract exited with {}: {}", output.status, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain() {
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_without_padding() {
        assert_eq!(decode_image("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_data_url_and_whitespace() {
        let encoded = "data:image/png;base64,aGVs\nbG8=\n";
        assert_eq!(decode_image(encoded).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image("not base64 at all!!").unwrap_err();
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(decode_image("").is_err());
        assert!(decode_image("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_decode_rejects_data_url_without_comma() {
        assert!(decode_image("data:image/png;base64").is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let config = OcrConfig {
            command: "definitely-not-tesseract-xyz".into(),
            ..OcrConfig::default()
        };
        let err = extract_text(&config, "aGVsbG8=").await.unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipes_image_through_command() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-tesseract");
        std::fs::write(&script, "#!/bin/sh\n[ \"$1\" = stdin ] && [ \"$2\" = stdout ] || exit 3\ncat\n")
            .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = OcrConfig {
            command: script.to_string_lossy().into_owned(),
            ..OcrConfig::default()
        };
        // "due date: 5 May" in base64
        let text = extract_text(&config, "ZHVlIGRhdGU6IDUgTWF5").await.unwrap();
        assert_eq!(text, "due date: 5 May");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("broken-tesseract");
        std::fs::write(&script, "#!/bin/sh\necho 'Error in pixReadMem' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = OcrConfig {
            command: script.to_string_lossy().into_owned(),
            ..OcrConfig::default()
        };
        let err = extract_text(&config, "aGVsbG8=").await.unwrap_err();
        assert!(err.to_string().contains("pixReadMem"));
    }
}
