//! Dependency resolution across the inclusion graph
//!
//! Discovers, loads, and parses the transitive closure of included templates
//! before any schema walk. Edges are never materialized: each template's
//! parsed tree is scanned for inclusion names as it is processed, in
//! breadth-first discovery order. A visited-name set breaks cycles - a name
//! already seen is not reprocessed, so contributions that would only appear
//! on a second pass through a template are dropped.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use templatekit::{Ast, Schema, SchemaWalker, TemplateLookup};

use crate::error::Error;
use crate::registry::{Registry, normalize_name};
use crate::template::Template;

/// The set of templates involved in one resolution pass, fully parsed.
/// Built fresh per pass and discarded afterwards.
#[derive(Debug)]
pub struct ResolvedSet {
    order: Vec<String>,
    templates: HashMap<String, Template>,
}

impl ResolvedSet {
    /// Template names in discovery order, root first.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl TemplateLookup for ResolvedSet {
    fn lookup(&self, name: &str) -> Option<&Ast> {
        self.get(name).and_then(Template::parsed)
    }

    fn canonical(&self, name: &str) -> String {
        normalize_name(name)
    }
}

/// Load and parse the root template plus every transitively included
/// template, then walk the root for the combined schema.
///
/// Fatal failures: malformed syntax anywhere in the closure
/// ([`Error::Parse`], with the originating template name) and an inclusion
/// name the registry cannot locate ([`Error::DependencyNotFound`]).
pub fn resolve(root: &str, registry: &dyn Registry) -> Result<(ResolvedSet, Schema), Error> {
    let mut root_template = registry.find(root)?;
    root_template.tree()?;

    let mut visited: HashSet<String> = HashSet::from([root.to_string()]);
    let mut order = vec![root.to_string()];
    let mut templates = HashMap::from([(root.to_string(), root_template)]);
    let mut queue = VecDeque::from([root.to_string()]);

    while let Some(current) = queue.pop_front() {
        let includes = match templates.get_mut(&current) {
            Some(template) => template.include_names()?,
            None => Vec::new(),
        };
        debug!(template = %current, count = includes.len(), "scanned inclusions");
        for name in includes {
            let name = normalize_name(&name);
            if !visited.insert(name.clone()) {
                continue;
            }
            let mut template =
                registry
                    .find(&name)
                    .map_err(|source| Error::DependencyNotFound {
                        name: name.clone(),
                        source: Box::new(source),
                    })?;
            template.tree()?;
            order.push(name.clone());
            templates.insert(name.clone(), template);
            queue.push_back(name);
        }
    }

    let set = ResolvedSet { order, templates };
    let schema = match set.get(root).and_then(Template::parsed) {
        Some(ast) => {
            let mut walker = SchemaWalker::new(&set);
            walker.walk_template(root, ast)
        }
        // The root was parsed above; an empty schema here is unreachable in
        // practice but harmless.
        None => Schema::new(),
    };
    Ok((set, schema))
}
