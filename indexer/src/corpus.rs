use anyhow::{bail, Context, Result};
use lexsearch_core::{DocId, Document};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A crawler record. Scraped pages carry raw HTML under `main_content`;
/// pre-extracted records carry plain text under `body`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputDoc {
    Scraped {
        page_url: Option<String>,
        main_content: String,
    },
    Plain {
        body: String,
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub urls: BTreeMap<DocId, String>,
}

impl Corpus {
    fn push(&mut self, doc: InputDoc) {
        let id = self.documents.len() as DocId;
        let (text, url) = match doc {
            InputDoc::Scraped { page_url, main_content } => (html_to_text(&main_content), page_url),
            InputDoc::Plain { body, url } => (body, url),
        };
        if let Some(url) = url {
            self.urls.insert(id, url);
        }
        self.documents.push(Document::new(id, text));
    }
}

/// Read every `.json`/`.jsonl` file under `input` (or `input` itself) in path
/// order, numbering documents from zero as they are read.
pub fn load_corpus(input: &Path) -> Result<Corpus> {
    let files = collect_files(input)?;
    if files.is_empty() {
        bail!("no .json or .jsonl input found at {}", input.display());
    }
    let mut corpus = Corpus::default();
    for file in files {
        let before = corpus.documents.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut corpus)?;
        } else {
            read_json(&file, &mut corpus)?;
        }
        tracing::debug!(file = %file.display(), docs = corpus.documents.len() - before, "read input file");
    }
    Ok(corpus)
}

fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", input.display()))?;
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }
    Ok(files)
}

fn read_jsonl(file: &Path, corpus: &mut Corpus) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: unrecognized record", file.display(), n + 1))?;
        corpus.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, corpus: &mut Corpus) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value = serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                corpus.push(serde_json::from_value(v).with_context(|| format!("{}: unrecognized record", file.display()))?);
            }
        }
        serde_json::Value::Object(_) => {
            corpus.push(serde_json::from_value(json).with_context(|| format!("{}: unrecognized record", file.display()))?);
        }
        _ => bail!("{}: expected an object or an array of objects", file.display()),
    }
    Ok(())
}

/// Visible text of an HTML page or fragment. Text nodes are joined with
/// spaces so adjacent elements do not fuse into one word.
fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let text: Vec<&str> = match Selector::parse("body").ok().and_then(|sel| doc.select(&sel).next()) {
        Some(body) => body.text().collect(),
        None => doc.root_element().text().collect(),
    };
    text.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
