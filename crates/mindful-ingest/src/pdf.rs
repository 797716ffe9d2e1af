//! Per-page PDF text extraction via lopdf.

use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use mindful_core::{Error, Result};

/// Text of one page. `number` is 1-based, as lopdf numbers pages.
#[derive(Debug, Clone)]
pub struct PdfPage {
    pub number: u32,
    pub text: String,
}

/// A loaded PDF: its raw bytes (for content hashing) and page texts.
#[derive(Debug, Clone)]
pub struct PdfText {
    pub bytes: Vec<u8>,
    pub pages: Vec<PdfPage>,
}

impl PdfText {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let pages = extract_pages(&bytes)
            .map_err(|e| Error::Ingest(format!("{}: {}", path.display(), e)))?;
        debug!("Extracted {} pages from {}", pages.len(), path.display());
        Ok(Self { bytes, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Extract text page by page. A page whose content stream cannot be
/// decoded yields empty text rather than failing the whole document.
pub fn extract_pages(bytes: &[u8]) -> std::result::Result<Vec<PdfPage>, lopdf::Error> {
    let doc = Document::load_mem(bytes)?;
    let pages = doc
        .get_pages()
        .keys()
        .map(|&number| {
            let text = doc.extract_text(&[number]).unwrap_or_else(|e| {
                warn!("Page {} text extraction failed: {}", number, e);
                String::new()
            });
            PdfPage { number, text }
        })
        .collect();
    Ok(pages)
}

/// `*.pdf` files directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!("PDF folder {}", dir.display())));
    }
    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}
