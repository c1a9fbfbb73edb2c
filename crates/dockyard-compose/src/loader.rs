//! Document loading: read, substitute, parse.
//!
//! The translator only sees the [`DocumentLoader`] trait. [`FileLoader`] is
//! the stock implementation: it reads the compose file from disk, expands
//! `${name}` placeholders from a template context and parses every YAML
//! document of the stream.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;
use crate::value::{ComposeValue, Mapping};

/// Produces the parsed documents of a compose file.
pub trait DocumentLoader {
    /// Loads every document of the file at `path`, in stream order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, substituted or parsed.
    fn load(&self, path: &Path) -> Result<Vec<ComposeValue>, LoadError>;
}

/// Loads compose files from disk with `${name}` substitution.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    context: BTreeMap<String, String>,
}

impl FileLoader {
    /// Creates a loader with an empty template context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader that substitutes placeholders from `context`.
    #[must_use]
    pub const fn with_context(context: BTreeMap<String, String>) -> Self {
        Self { context }
    }
}

impl DocumentLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<Vec<ComposeValue>, LoadError> {
        tracing::debug!(path = %path.display(), "reading compose file");
        let raw = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                LoadError::NotFound
            } else {
                LoadError::from(err)
            }
        })?;
        let text = substitute(&raw, &self.context)?;
        parse_documents(&text)
    }
}

/// Expands `${name}` placeholders; `$$` yields a literal `$`.
///
/// Placeholders whose name is not in `context` are kept verbatim, so
/// variables meant for compose itself survive the translation.
///
/// # Errors
///
/// Returns an error for a placeholder that is never closed.
pub fn substitute(raw: &str, context: &BTreeMap<String, String>) -> Result<String, LoadError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut offset = 0;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("$$") {
            out.push('$');
            rest = &tail[2..];
            offset += pos + 2;
        } else if let Some(body) = tail.strip_prefix("${") {
            let end = body
                .find('}')
                .ok_or(LoadError::UnterminatedPlaceholder {
                    offset: offset + pos,
                })?;
            let name = body[..end].trim();
            match context.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    tracing::trace!(name, "leaving unknown placeholder in place");
                    out.push_str(&tail[..end + 3]);
                }
            }
            rest = &body[end + 1..];
            offset += pos + end + 3;
        } else {
            out.push('$');
            rest = &tail[1..];
            offset += pos + 1;
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Parses a YAML stream into compose values, skipping empty documents.
///
/// # Errors
///
/// Returns an error for invalid YAML or for mapping keys that are not
/// scalars.
pub fn parse_documents(text: &str) -> Result<Vec<ComposeValue>, LoadError> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        let value = convert(value)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

fn convert(value: serde_yaml::Value) -> Result<ComposeValue, LoadError> {
    use serde_yaml::Value;

    Ok(match value {
        Value::Null => ComposeValue::Null,
        Value::Bool(b) => ComposeValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ComposeValue::Integer(i),
            None => ComposeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => ComposeValue::String(s),
        Value::Sequence(items) => ComposeValue::Sequence(
            items
                .into_iter()
                .map(convert)
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(entries) => {
            let mut mapping = Mapping::new();
            for (key, value) in entries {
                mapping.insert(convert_key(key)?, convert(value)?);
            }
            ComposeValue::Mapping(mapping)
        }
        Value::Tagged(tagged) => convert(tagged.value)?,
    })
}

fn convert_key(key: serde_yaml::Value) -> Result<String, LoadError> {
    match convert(key)? {
        ComposeValue::Null => Ok("null".into()),
        scalar => scalar.scalar_text().ok_or_else(|| LoadError::Structure {
            message: format!("mapping key must be a scalar, found a {}", scalar.kind()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn context(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn substitute_replaces_placeholders() {
        let out = substitute("image: app:${ tag }\n", &context(&[("tag", "1.2")]))
            .expect("substituted");
        assert_eq!(out, "image: app:1.2\n");
    }

    #[test]
    fn substitute_unescapes_double_dollar() {
        let out = substitute("cmd: echo $${HOME} $PATH", &context(&[])).expect("substituted");
        assert_eq!(out, "cmd: echo ${HOME} $PATH");
    }

    #[test]
    fn substitute_keeps_unknown_placeholders() {
        let raw = "ports: ['${HOST_PORT}:80']\nimage: app:${ tag }\n";
        let out = substitute(raw, &context(&[("other", "x")])).expect("substituted");
        assert_eq!(out, raw);
    }

    #[test]
    fn substitute_mixes_known_and_unknown_placeholders() {
        let out = substitute("${tag}-${ unknown }-${tag}", &context(&[("tag", "1")]))
            .expect("substituted");
        assert_eq!(out, "1-${ unknown }-1");
    }

    #[test]
    fn substitute_reports_unterminated_placeholder() {
        let err = substitute("ab: ${oops", &context(&[])).expect_err("unterminated");
        assert!(matches!(err, LoadError::UnterminatedPlaceholder { offset: 4 }));
    }

    #[test]
    fn parse_documents_yields_each_document() {
        let docs = parse_documents("version: '2'\n---\nversion: '2'\n---\n").expect("parsed");
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn parse_documents_preserves_key_order() {
        let docs = parse_documents("services:\n  zeta: {}\n  alpha: {}\n").expect("parsed");
        let services = docs[0]
            .as_mapping()
            .and_then(|m| m.get("services"))
            .and_then(ComposeValue::as_mapping)
            .expect("services");
        assert_eq!(services.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn parse_documents_keeps_scalar_types() {
        let docs = parse_documents("a: 2\nb: 2.5\nc: true\nd: ~\ne: \"2\"\n").expect("parsed");
        let map = docs[0].as_mapping().expect("mapping");
        assert_eq!(map.get("a"), Some(&ComposeValue::Integer(2)));
        assert_eq!(map.get("b"), Some(&ComposeValue::Float(2.5)));
        assert_eq!(map.get("c"), Some(&ComposeValue::Bool(true)));
        assert_eq!(map.get("d"), Some(&ComposeValue::Null));
        assert_eq!(map.get("e"), Some(&ComposeValue::String("2".into())));
    }

    #[test]
    fn parse_documents_stringifies_scalar_keys() {
        let docs = parse_documents("80: http\n").expect("parsed");
        let map = docs[0].as_mapping().expect("mapping");
        assert_eq!(map.get("80"), Some(&ComposeValue::String("http".into())));
    }

    #[test]
    fn parse_documents_unwraps_tags() {
        let docs = parse_documents("image: !custom web\n").expect("parsed");
        let map = docs[0].as_mapping().expect("mapping");
        assert_eq!(map.get("image"), Some(&ComposeValue::String("web".into())));
    }

    #[test]
    fn parse_documents_rejects_invalid_yaml() {
        let err = parse_documents("services: [unclosed").expect_err("invalid");
        assert!(matches!(err, LoadError::Yaml { .. }));
    }

    #[test]
    fn file_loader_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FileLoader::new()
            .load(&dir.path().join("absent.yml"))
            .expect_err("missing");
        assert!(matches!(err, LoadError::NotFound));
    }

    #[test]
    fn file_loader_substitutes_before_parsing() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"version: '${compose.version}'\n").expect("write");
        let loader = FileLoader::with_context(context(&[("compose.version", "2")]));
        let docs = loader.load(file.path()).expect("loaded");
        let map = docs[0].as_mapping().expect("mapping");
        assert_eq!(map.get("version"), Some(&ComposeValue::String("2".into())));
    }
}
