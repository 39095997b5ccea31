// Local image folder as a candidate source
use crate::model::ProductCandidate;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Lists image files in `dir` whose extension is in `extensions`, sorted
/// case-insensitively by file name. Each file name becomes a candidate.
pub fn list_image_candidates(dir: &Path, extensions: &[String]) -> io::Result<Vec<ProductCandidate>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if !supported {
            debug!("Ignoring {}", path.display());
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        files.push((name.to_lowercase(), name.to_string(), path.display().to_string()));
    }
    files.sort();

    info!("Found {} product images in {}", files.len(), dir.display());
    Ok(files
        .into_iter()
        .map(|(_, name, path)| ProductCandidate::with_image(name, path))
        .collect())
}
