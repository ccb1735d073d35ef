use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::config::GeneratorConfig;

pub use self::template::{has_marker, splice_template};
pub use self::writer::CodeWriter;

mod cpp;
mod template;
mod writer;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("failed to read template {path}: {source}")]
    Template {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Base indentation level, four spaces per level.
    pub indent: usize,
    /// Emit prototypes only.
    pub declarations_only: bool,
    /// Text placed before every function return type, usually `inline `.
    pub prefix: String,
    /// Name of the prepared statement local.
    pub statement: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            indent: 0,
            declarations_only: false,
            prefix: "inline ".to_string(),
            statement: "stmt".to_string(),
        }
    }
}

impl From<&GeneratorConfig> for GeneratorOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            indent: config.indent,
            declarations_only: false,
            prefix: config.prefix.clone(),
            statement: config.statement.clone(),
        }
    }
}

/// Renders every query of `catalog`, in catalog order, as C++ over the SQLite C API.
pub fn generate_core(catalog: &Catalog, options: &GeneratorOptions) -> String {
    let mut out = CodeWriter::new(options.indent);
    for query in catalog.iter() {
        debug!(query = %query.name, kind = %query.def.kind(), "generating query");
        cpp::emit_query(&mut out, query, options);
    }
    out.finish()
}

/// Generates the catalog and, when a template is given, splices the result into it.
pub fn render(
    catalog: &Catalog,
    options: &GeneratorOptions,
    template: Option<&Path>,
) -> Result<String, CodegenError> {
    catalog.check_statement_name(&options.statement)?;
    let generated = generate_core(catalog, options);
    let Some(template) = template else {
        return Ok(generated);
    };

    let content = std::fs::read_to_string(template).map_err(|source| CodegenError::Template {
        path: template.display().to_string(),
        source,
    })?;
    if !has_marker(&content) {
        warn!(
            template = %template.display(),
            "template has no %% marker, appending generated code"
        );
    }
    Ok(splice_template(&content, &generated))
}

/// Writes `contents` to `dir/file`, creating `dir` as needed.
pub fn write_output(
    dir: Option<&Path>,
    file: &Path,
    contents: &str,
) -> Result<PathBuf, CodegenError> {
    let path = match dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| CodegenError::Write {
                path: dir.display().to_string(),
                source,
            })?;
            dir.join(file)
        }
        None => file.to_path_buf(),
    };

    std::fs::write(&path, contents).map_err(|source| CodegenError::Write {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), bytes = contents.len(), "wrote generated code");
    Ok(path)
}
