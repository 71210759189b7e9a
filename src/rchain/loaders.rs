use std::fs;
use std::path::Path;

use tracing::info;
use url::Url;

use crate::rchain::retrieval::RagError;

// html2text wraps at this column; wide enough to keep paragraphs on one line.
const HTML_TEXT_WIDTH: usize = 4_096;

/// A piece of source text and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    pub source: String,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// Loads a UTF-8 text file as a single document.
pub fn load_text_file(path: &Path) -> Result<Vec<Document>, RagError> {
    let source = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|err| RagError::Load {
        source_name: source.clone(),
        reason: err.to_string(),
    })?;
    if content.trim().is_empty() {
        return Err(RagError::EmptyCorpus(source));
    }
    Ok(vec![Document::new(content, source)])
}

/// Fetches a web page and keeps its readable text.
pub async fn load_web_page(http: &reqwest::Client, url: &str) -> Result<Vec<Document>, RagError> {
    let parsed = Url::parse(url).map_err(|err| RagError::Load {
        source_name: url.to_string(),
        reason: err.to_string(),
    })?;

    let response = http
        .get(parsed.clone())
        .send()
        .await
        .map_err(|err| RagError::Load {
            source_name: url.to_string(),
            reason: err.to_string(),
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(RagError::Load {
            source_name: url.to_string(),
            reason: format!("HTTP {status}"),
        });
    }

    let body = response.text().await.map_err(|err| RagError::Load {
        source_name: url.to_string(),
        reason: err.to_string(),
    })?;
    let text = html_to_text(&body);
    if text.trim().is_empty() {
        return Err(RagError::EmptyCorpus(url.to_string()));
    }

    info!(url = %parsed, chars = text.len(), "loaded web page");
    Ok(vec![Document::new(text, parsed.to_string())])
}

pub fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), HTML_TEXT_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn text_file_becomes_one_document() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "Course schedule: Rust basics starts Monday.").expect("write");

        let docs = load_text_file(file.path()).expect("file should load");
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.contains("Rust basics"));
        assert_eq!(docs[0].source, file.path().display().to_string());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_text_file(Path::new("/definitely/not/here.txt")).expect_err("missing");
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }

    #[test]
    fn blank_file_is_an_empty_corpus() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        assert!(matches!(
            load_text_file(file.path()),
            Err(RagError::EmptyCorpus(_))
        ));
    }

    #[test]
    fn html_markup_is_stripped() {
        let text = html_to_text("<html><body><h1>Upcoming</h1><p>Intro to SQL</p></body></html>");
        assert!(text.contains("Upcoming"));
        assert!(text.contains("Intro to SQL"));
        assert!(!text.contains("<p>"));
    }
}
