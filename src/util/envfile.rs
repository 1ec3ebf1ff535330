use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

fn parse_env_content(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        if let Some((key, val)) = s.split_once('=') {
            let key = key.trim();
            let mut val = val.trim();
            // Remove surrounding quotes if present
            if val.len() >= 2
                && ((val.starts_with('"') && val.ends_with('"'))
                    || (val.starts_with('\'') && val.ends_with('\'')))
            {
                val = &val[1..val.len() - 1];
            }
            map.insert(key.to_string(), val.to_string());
        } else {
            log::warn!("ignoring .env line {} without '=': {}", idx + 1, line);
        }
    }
    map
}

/// Parse a .env file without touching the process environment.
/// A missing file yields an empty map.
pub fn parse_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    Ok(parse_env_content(&fs::read_to_string(path)?))
}

/// Load `.env` from the current directory into the process environment.
/// Existing variables are NOT overridden.
pub fn load_dotenv_if_present() -> Result<()> {
    for (k, v) in parse_env_file(Path::new(".env"))? {
        if std::env::var_os(&k).is_none() {
            // SAFETY: called from main before any worker threads exist
            unsafe {
                std::env::set_var(&k, &v);
            }
        }
    }
    Ok(())
}

/// Generate a .env.template file with placeholder values and comments.
pub fn write_env_template(path: &Path) -> Result<()> {
    let mut f = fs::File::create(path)?;
    let template = r#"# fuzzy_merge environment configuration template
# Copy this file to .env; command-line flags take precedence.

# Columns holding the organization names to compare
FUZZY_MERGE_QUERY_FIELD=companyname
FUZZY_MERGE_REFERENCE_FIELD=organization

# Matching (score is 0-100; a match needs score > threshold)
#FUZZY_MERGE_THRESHOLD=90
#FUZZY_MERGE_SCORER=ratio

# Batching and parallelism
#FUZZY_MERGE_BATCH_SIZE=100
#FUZZY_MERGE_WORKERS=10
#FUZZY_MERGE_IN_FLIGHT_BATCHES=40
#FUZZY_MERGE_SEGMENT_DIR=/dev/shm

# Output buffering
#FUZZY_MERGE_FLUSH_BYTES=10000000

# Logging: RUST_LOG filter; FUZZY_MERGE_TRACING=1 switches to the tracing subscriber
#RUST_LOG=info
#FUZZY_MERGE_TRACING=0
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quotes_comments_and_blanks() {
        let map = parse_env_content("# c\n\nA=1\nB = \"two words\"\nC='x'\nbroken\nD=\"\n");
        assert_eq!(map.get("A").map(String::as_str), Some("1"));
        assert_eq!(map.get("B").map(String::as_str), Some("two words"));
        assert_eq!(map.get("C").map(String::as_str), Some("x"));
        assert_eq!(map.get("D").map(String::as_str), Some("\""));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn template_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.template");
        write_env_template(&path).unwrap();
        let map = parse_env_file(&path).unwrap();
        assert_eq!(map.get("FUZZY_MERGE_QUERY_FIELD").map(String::as_str), Some("companyname"));
        assert!(parse_env_file(&dir.path().join("missing")).unwrap().is_empty());
    }
}
