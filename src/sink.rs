//! JSON output for scrape records and URL list input

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::Result;
use crate::record::ScrapeRecord;

fn to_json(records: &[ScrapeRecord], pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(records)?
    } else {
        serde_json::to_string(records)?
    })
}

/// Write every record into one JSON array file, creating parent directories
pub async fn write_json(records: &[ScrapeRecord], path: impl AsRef<Path>, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, to_json(records, pretty)?).await?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Write each record to `<dir>/<id>.json`; returns the written paths
pub async fn write_each(
    records: &[ScrapeRecord],
    dir: impl AsRef<Path>,
    pretty: bool,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::with_capacity(records.len());
    for record in records {
        let path = dir.join(format!("{}.json", record.id));
        let json = if pretty {
            serde_json::to_string_pretty(record)?
        } else {
            serde_json::to_string(record)?
        };
        tokio::fs::write(&path, json).await?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }
    info!("Wrote {} record files to {}", written.len(), dir.display());
    Ok(written)
}

/// Print records to stdout as a JSON array
pub async fn to_stdout(records: &[ScrapeRecord], pretty: bool) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(to_json(records, pretty)?.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

/// Read one URL per line, skipping blank lines and `#` comments
pub async fn load_urls(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use crate::pipeline::Scraper;

    fn records() -> Vec<ScrapeRecord> {
        let scraper = Scraper::new(ScrapeConfig::default()).unwrap();
        ["https://example.com/one", "https://example.com/two"]
            .iter()
            .map(|url| {
                let html = format!(
                    "<html><body><article><p>Content for {url} lives in this paragraph.</p></article></body></html>"
                );
                scraper.scrape(url, &html).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_write_json_round_trips() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("out").join("records.json");
            let records = records();

            write_json(&records, &path, true).await.unwrap();

            let raw = tokio::fs::read_to_string(&path).await.unwrap();
            let back: Vec<ScrapeRecord> = serde_json::from_str(&raw).unwrap();
            assert_eq!(back.len(), records.len());
            for (read, written) in back.iter().zip(&records) {
                assert_eq!(read.id, written.id);
                assert_eq!(read.source, written.source);
                assert_eq!(read.content, written.content);
                assert_eq!(read.processing.chunks, written.processing.chunks);
            }
        });
    }

    #[test]
    fn test_write_each_names_files_by_id() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let records = records();

            let paths = write_each(&records, dir.path(), false).await.unwrap();

            assert_eq!(paths.len(), 2);
            for (path, record) in paths.iter().zip(&records) {
                assert_eq!(
                    path.file_name().unwrap().to_string_lossy(),
                    format!("{}.json", record.id)
                );
                let raw = std::fs::read_to_string(path).unwrap();
                let back: ScrapeRecord = serde_json::from_str(&raw).unwrap();
                assert_eq!(back.id, record.id);
                assert_eq!(back.metadata, record.metadata);
            }
        });
    }

    #[test]
    fn test_load_urls_skips_comments_and_blanks() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("urls.txt");
            std::fs::write(
                &path,
                "# seed list\nhttps://example.com/a\n\n   \n  https://example.com/b  \n#https://skipped.example\n",
            )
            .unwrap();

            let urls = load_urls(&path).await.unwrap();
            assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
        });
    }

    #[test]
    fn test_load_urls_missing_file_is_io_error() {
        let result = tokio_test::block_on(load_urls("/nonexistent/urls.txt"));
        assert!(matches!(result, Err(crate::error::Error::Io(_))));
    }
}
