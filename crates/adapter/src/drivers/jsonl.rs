use anyhow::{Context, Result};
use async_trait::async_trait;
use domain::protocol::{decode_line, SourceDefaults};
use domain::{Platform, StreamId};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::router::CommentRouter;
use crate::traits::StreamSource;

#[derive(Clone, Debug)]
pub struct JsonLinesConfig {
    pub stream_id: StreamId,
    pub title: String,
    pub platform: Platform,
    pub path: PathBuf,
    /// Keep polling for appended lines after EOF, like `tail -f`.
    pub follow: bool,
    pub poll_interval: Duration,
}

/// Reads pre-parsed chat events, one JSON object per line, from a file that
/// a chat scraper writes to.
pub struct JsonLinesSource {
    config: JsonLinesConfig,
}

impl JsonLinesSource {
    pub fn new(config: JsonLinesConfig) -> Self {
        Self { config }
    }

    fn route_line(&self, router: &CommentRouter, line: &str, line_no: usize) {
        let defaults = SourceDefaults {
            stream_id: &self.config.stream_id,
            platform: self.config.platform,
        };
        match decode_line(line, defaults) {
            Ok(Some(comment)) => {
                let outcome = router.process_comment(comment);
                debug!(line = line_no, ?outcome, "Comment routed");
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Skipping malformed line {} in {}: {}",
                line_no,
                self.config.path.display(),
                e
            ),
        }
    }
}

#[async_trait]
impl StreamSource for JsonLinesSource {
    fn stream_id(&self) -> &StreamId {
        &self.config.stream_id
    }

    fn title(&self) -> &str {
        &self.config.title
    }

    async fn run(&self, router: CommentRouter, cancel_token: CancellationToken) -> Result<()> {
        let file = File::open(&self.config.path)
            .await
            .with_context(|| format!("Failed to open chat log {}", self.config.path.display()))?;
        let mut reader = BufReader::new(file);

        info!(
            "Reading stream {} from {}",
            self.config.stream_id,
            self.config.path.display()
        );

        let mut buf = Vec::new();
        let mut line_no = 0usize;
        loop {
            let read = tokio::select! {
                r = reader.read_until(b'\n', &mut buf) => r?,
                _ = cancel_token.cancelled() => break,
            };

            if read == 0 {
                if !self.config.follow {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => continue,
                    _ = cancel_token.cancelled() => break,
                }
            }

            // a writer may be mid-line; wait for the rest
            if self.config.follow && buf.last() != Some(&b'\n') {
                continue;
            }

            line_no += 1;
            match std::str::from_utf8(&buf) {
                Ok(line) => self.route_line(&router, line, line_no),
                Err(e) => warn!(
                    "Skipping non UTF-8 line {} in {}: {}",
                    line_no,
                    self.config.path.display(),
                    e
                ),
            }
            buf.clear();
        }

        info!("Stream {} source finished", self.config.stream_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{PolicyStore, RequestQueue};
    use std::io::Write;

    fn config(path: PathBuf, follow: bool) -> JsonLinesConfig {
        JsonLinesConfig {
            stream_id: StreamId::new_unchecked("live".into()),
            title: "Live".into(),
            platform: Platform::Twitch,
            path,
            follow,
            poll_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn feeds_every_line_to_the_router() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"author":"a","author_id":"1","message":"お題 one"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"author":"b","author_id":"2","message":"お題 two"}}"#).unwrap();
        file.flush().unwrap();

        let (router, _rx) = CommentRouter::new(PolicyStore::default(), RequestQueue::new());
        let source = JsonLinesSource::new(config(file.path().to_path_buf(), false));
        router.register_stream(source.stream_id().clone(), source.title());

        source
            .run(router.clone(), CancellationToken::new())
            .await
            .unwrap();

        let contents: Vec<String> = router.requests().into_iter().map(|r| r.content).collect();
        assert_eq!(contents, vec!["one", "two"]);
        assert_eq!(router.requests()[0].platform, Platform::Twitch);
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"author\":\"a\",\"author_id\":\"1\",\"message\":\"\xff\xfe bad\"}\n")
            .unwrap();
        writeln!(file, r#"{{"author":"b","author_id":"2","message":"お題 two"}}"#).unwrap();
        file.flush().unwrap();

        let (router, _rx) = CommentRouter::new(PolicyStore::default(), RequestQueue::new());
        let source = JsonLinesSource::new(config(file.path().to_path_buf(), false));
        router.register_stream(source.stream_id().clone(), source.title());

        source
            .run(router.clone(), CancellationToken::new())
            .await
            .unwrap();

        let contents: Vec<String> = router.requests().into_iter().map(|r| r.content).collect();
        assert_eq!(contents, vec!["two"]);
        assert_eq!(router.stream(source.stream_id()).unwrap().counters.comments, 1);
    }

    #[tokio::test]
    async fn follow_mode_stops_on_cancel() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (router, _rx) = CommentRouter::new(PolicyStore::default(), RequestQueue::new());
        let source = JsonLinesSource::new(config(file.path().to_path_buf(), true));

        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            let router = router.clone();
            tokio::spawn(async move { source.run(router, cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let (router, _rx) = CommentRouter::new(PolicyStore::default(), RequestQueue::new());
        let source = JsonLinesSource::new(config(PathBuf::from("/nonexistent/chat.jsonl"), false));
        assert!(source.run(router, CancellationToken::new()).await.is_err());
    }
}
