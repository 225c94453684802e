//! Document discovery for the extract command.

use crate::error::{CliError, Result};
use riskextract_domain::{Document, DocumentCategory};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Documents found under an input directory
#[derive(Debug, Default)]
pub struct LoadedCorpus {
    /// Documents in sorted path order
    pub documents: Vec<Document>,

    /// Text files whose category could not be determined
    pub skipped: Vec<PathBuf>,
}

/// Load every `.txt` document at most two levels below `root`
///
/// The category comes from the parent directory name, or failing that from
/// a token of the file stem. Files with neither are skipped with a warning.
pub fn load_documents(root: &Path) -> Result<LoadedCorpus> {
    if !root.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "Input is not a directory: {}",
            root.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).max_depth(2).follow_links(false) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_text_file(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
            Err(e) => tracing::warn!("Error accessing entry: {}", e),
        }
    }
    paths.sort();

    let mut corpus = LoadedCorpus::default();
    let mut seen = HashSet::new();
    for path in paths {
        let Some(category) = detect_category(&path) else {
            tracing::warn!("Skipping {}: cannot determine document category", path.display());
            corpus.skipped.push(path);
            continue;
        };
        let document = read_document(&path, category)?;
        if !seen.insert(document.id.clone()) {
            tracing::warn!(
                "Duplicate document id '{}' from {}",
                document.id,
                path.display()
            );
        }
        corpus.documents.push(document);
    }

    tracing::debug!(
        "Loaded {} document(s) from {}, skipped {}",
        corpus.documents.len(),
        root.display(),
        corpus.skipped.len()
    );
    Ok(corpus)
}

/// Load a single document, defaulting the category to `policy`
pub fn load_document(path: &Path) -> Result<Document> {
    let category = detect_category(path).unwrap_or(DocumentCategory::Policy);
    read_document(path, category)
}

/// Category from the parent directory name or a file stem token
pub fn detect_category(path: &Path) -> Option<DocumentCategory> {
    let from_parent = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|name| name.to_str())
        .and_then(DocumentCategory::parse);

    from_parent.or_else(|| {
        path.file_stem()
            .and_then(|stem| stem.to_str())?
            .split(|c: char| c == '_' || c == '-' || c == ' ' || c == '.')
            .find_map(DocumentCategory::parse)
    })
}

fn read_document(path: &Path, category: DocumentCategory) -> Result<Document> {
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| CliError::InvalidInput(format!("Invalid file name: {}", path.display())))?
        .to_string();

    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(Document::new(id, category, text))
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, text: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_category_from_parent_directory() {
        assert_eq!(
            detect_category(Path::new("data/policies/acme.txt")),
            Some(DocumentCategory::Policy)
        );
        assert_eq!(
            detect_category(Path::new("data/esg_reports/acme.txt")),
            Some(DocumentCategory::Esg)
        );
        assert_eq!(
            detect_category(Path::new("data/incident_reports/acme.txt")),
            Some(DocumentCategory::Incident)
        );
    }

    #[test]
    fn test_category_from_file_stem() {
        assert_eq!(
            detect_category(Path::new("data/auto_insurance_policy_synthetic.txt")),
            Some(DocumentCategory::Policy)
        );
        assert_eq!(
            detect_category(Path::new("misc/warehouse-fire-incident.txt")),
            Some(DocumentCategory::Incident)
        );
        assert_eq!(detect_category(Path::new("misc/notes.txt")), None);
    }

    #[test]
    fn test_load_documents() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "policies/b_marine.txt", "Marine cargo cover.");
        write(dir.path(), "esg/a_report.txt", "Scope 1 emissions.");
        write(dir.path(), "cyber_incident_2023.txt", "Ransomware attack.");
        write(dir.path(), "readme.txt", "Not a document.");
        write(dir.path(), "policies/summary.md", "ignored");
        write(dir.path(), "policies/deep/nested/c_policy.txt", "too deep");

        let corpus = load_documents(dir.path()).unwrap();
        let ids: Vec<&str> = corpus.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["cyber_incident_2023", "a_report", "b_marine"]);
        assert_eq!(corpus.documents[0].category, DocumentCategory::Incident);
        assert_eq!(corpus.documents[1].category, DocumentCategory::Esg);
        assert_eq!(corpus.documents[2].text, "Marine cargo cover.");
        assert_eq!(corpus.skipped.len(), 1);
        assert!(corpus.skipped[0].ends_with("readme.txt"));
    }

    #[test]
    fn test_input_must_be_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("policy.txt");
        fs::write(&file, "text").unwrap();
        assert!(matches!(load_documents(&file), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_load_single_document() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", "free text");
        let document = load_document(&dir.path().join("notes.txt")).unwrap();
        assert_eq!(document.id, "notes");
        assert_eq!(document.category, DocumentCategory::Policy);
    }
}
