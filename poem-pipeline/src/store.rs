use crate::types::{PipelineError, RawPost, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{error, info, warn};

/// Read a post file. A single JSON object counts as a one-post file.
pub fn read_posts(path: &Path) -> Result<Vec<RawPost>> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        other => Err(PipelineError::General(format!(
            "expected an array or object of posts, found {}",
            json_kind(&other)
        ))),
    }
}

/// Like [`read_posts`], but a missing or unreadable file is logged and
/// treated as empty.
pub fn load_posts(path: &Path) -> Vec<RawPost> {
    if !path.exists() {
        warn!(path = %path.display(), "Input file not found");
        return Vec::new();
    }
    match read_posts(path) {
        Ok(posts) => {
            info!(path = %path.display(), count = posts.len(), "Loaded posts");
            posts
        }
        Err(e) => {
            error!(path = %path.display(), "Failed to load posts: {}", e);
            Vec::new()
        }
    }
}

/// Write `value` as UTF-8 JSON with four-space indentation.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!(path = %path.display(), "Wrote JSON file");
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_is_one_post() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.json");
        fs::write(&path, r#"{"content":"solo","published_at":"2024-05-01T10:00:00Z"}"#).unwrap();
        let posts = load_posts(&path);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "solo");
    }

    #[test]
    fn missing_and_invalid_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_posts(&dir.path().join("absent.json")).is_empty());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{not json").unwrap();
        assert!(load_posts(&bad).is_empty());

        let scalar = dir.path().join("scalar.json");
        fs::write(&scalar, "42").unwrap();
        assert!(matches!(read_posts(&scalar), Err(PipelineError::General(_))));
    }

    #[test]
    fn saved_file_is_indented_and_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let posts = vec![RawPost::new("perché la luna", "2024-05-01T10:00:00Z")];
        save_json(&path, &posts).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("perché la luna"));
        assert!(written.contains("\n        \"content\""));
        assert_eq!(read_posts(&path).unwrap(), posts);
    }
}
