//! A named template with its source text and lazily parsed tree

use templatekit::Ast;

use crate::error::Error;

/// One template owned by a resolution pass. The syntax tree is computed on
/// first use and cached; a template is immutable once parsed.
#[derive(Debug, Clone)]
pub struct Template {
    /// Registry-relative path, also the template's name in inclusion sites
    pub path: String,
    /// Raw source text as loaded
    pub source: String,
    tree: Option<Ast>,
}

impl Template {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Template {
            path: path.into(),
            source: source.into(),
            tree: None,
        }
    }

    /// The parsed syntax tree, parsing and caching on first call.
    pub fn tree(&mut self) -> Result<&Ast, Error> {
        let parsed = match self.tree.take() {
            Some(tree) => tree,
            None => templatekit::parse(&self.path, &self.source).map_err(|source| Error::Parse {
                template: self.path.clone(),
                source,
            })?,
        };
        Ok(self.tree.insert(parsed))
    }

    /// The cached tree, if `tree()` has already parsed it.
    pub fn parsed(&self) -> Option<&Ast> {
        self.tree.as_ref()
    }

    /// Names of templates this one includes, in first-seen order.
    pub fn include_names(&mut self) -> Result<Vec<String>, Error> {
        Ok(self.tree()?.include_names())
    }
}
