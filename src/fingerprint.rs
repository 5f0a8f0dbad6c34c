//! Fingerprint helpers
//!
//! The core never computes fingerprints itself. It abbreviates identifiers
//! for display and turns a stream of audio analyser frames into a bounded,
//! awaitable signature.

use std::time::Duration;
use tokio::sync::mpsc;

/// Number of audio frames collected before the signature is final
pub const AUDIO_SAMPLE_COUNT: usize = 5;

/// Length of the audio signature prefix kept for display
const AUDIO_SIGNATURE_CHARS: usize = 50;

/// Length of an identifier prefix kept for display
const DISPLAY_ID_CHARS: usize = 12;

/// Shorten an identifier to its first characters followed by "..."
pub fn abbreviate(id: &str) -> String {
    let prefix: String = id.chars().take(DISPLAY_ID_CHARS).collect();
    format!("{prefix}...")
}

/// Collect audio analyser frames until `sample_count` frames arrived, the
/// sender closed, or `timeout` expired, whichever comes first.
///
/// Returns the first frame's byte values joined by commas, truncated for
/// display, or "No audio data" if nothing arrived in time.
pub async fn collect_audio_signature(
    mut frames: mpsc::Receiver<Vec<u8>>,
    sample_count: usize,
    timeout: Duration,
) -> String {
    let mut collected: Vec<Vec<u8>> = Vec::with_capacity(sample_count);

    let gather = async {
        while collected.len() < sample_count {
            match frames.recv().await {
                Some(frame) => collected.push(frame),
                None => break,
            }
        }
    };

    if tokio::time::timeout(timeout, gather).await.is_err() {
        log::debug!("audio signature timed out after {:?}", timeout);
    }
    frames.close();

    match collected.first() {
        Some(frame) => {
            let joined = frame
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let prefix: String = joined.chars().take(AUDIO_SIGNATURE_CHARS).collect();
            format!("{prefix}...")
        }
        None => "No audio data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("a1b2c3d4e5f6a7b8c9"), "a1b2c3d4e5f6...");
        assert_eq!(abbreviate("short"), "short...");
    }

    #[tokio::test]
    async fn test_audio_signature_from_first_frame() {
        let (tx, rx) = mpsc::channel(8);
        for i in 0..AUDIO_SAMPLE_COUNT {
            tx.send(vec![i as u8; 40]).await.unwrap();
        }

        let signature =
            collect_audio_signature(rx, AUDIO_SAMPLE_COUNT, Duration::from_millis(500)).await;
        assert!(signature.starts_with("0,0,0,"));
        assert!(signature.ends_with("..."));
        assert_eq!(signature.len(), AUDIO_SIGNATURE_CHARS + 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_signature_times_out_without_frames() {
        let (_tx, rx) = mpsc::channel::<Vec<u8>>(8);
        let signature = collect_audio_signature(rx, AUDIO_SAMPLE_COUNT, Duration::from_secs(1)).await;
        assert_eq!(signature, "No audio data");
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_signature_keeps_partial_frames_on_timeout() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(vec![7, 8, 9]).await.unwrap();

        let signature = collect_audio_signature(rx, AUDIO_SAMPLE_COUNT, Duration::from_secs(1)).await;
        assert_eq!(signature, "7,8,9...");
        drop(tx);
    }

    #[tokio::test]
    async fn test_audio_signature_closed_sender() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(8);
        drop(tx);
        let signature = collect_audio_signature(rx, AUDIO_SAMPLE_COUNT, Duration::from_secs(5)).await;
        assert_eq!(signature, "No audio data");
    }
}
