use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::{IdentifierRules, ResourcePath};

/// Decides whether the first segment of a raw path names the project.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PathPolicy {
    /// Paths never embed the project; the client's project (or the explicit
    /// project argument) is always prepended.
    #[default]
    Inferred,
    /// The first segment of every path is the project id.
    Explicit,
    /// Paths with three or more segments are taken as project-qualified, shorter
    /// paths get the project prepended. `project/users` and `users/alice` cannot
    /// be told apart under this policy, so it is opt-in only.
    SegmentCount,
}

/// Turns raw slash separated strings into validated, project-qualified paths.
#[derive(Clone, Debug)]
pub struct PathResolver {
    default_project: String,
    policy: PathPolicy,
    rules: IdentifierRules,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Document,
    Collection,
}

impl PathResolver {
    pub fn new(default_project: impl Into<String>, policy: PathPolicy, rules: IdentifierRules) -> Self {
        Self {
            default_project: default_project.into(),
            policy,
            rules,
        }
    }

    pub fn default_project(&self) -> &str {
        &self.default_project
    }

    pub fn policy(&self) -> PathPolicy {
        self.policy
    }

    pub fn rules(&self) -> IdentifierRules {
        self.rules
    }

    /// Produces the canonical `project/...` path for `raw_path` without
    /// checking whether it addresses a document or a collection.
    pub fn resolve(&self, raw_path: &str, project: Option<&str>) -> FirestoreResult<ResourcePath> {
        let path = ResourcePath::parse(raw_path)?;
        let project = project.unwrap_or(&self.default_project);
        match self.policy {
            PathPolicy::Inferred => Ok(path.prepend(project)),
            PathPolicy::Explicit => {
                ensure_embedded_project(&path, project, raw_path)?;
                Ok(path)
            }
            PathPolicy::SegmentCount => {
                if path.len() >= 3 {
                    ensure_embedded_project(&path, project, raw_path)?;
                    Ok(path)
                } else {
                    Ok(path.prepend(project))
                }
            }
        }
    }

    /// Resolves a path that must address a document.
    pub fn resolve_document(&self, raw_path: &str, project: Option<&str>) -> FirestoreResult<ResourcePath> {
        let path = self.resolve(raw_path, project)?;
        self.validate_qualified(&path, Target::Document)?;
        Ok(path)
    }

    /// Resolves a path that must address a collection.
    pub fn resolve_collection(&self, raw_path: &str, project: Option<&str>) -> FirestoreResult<ResourcePath> {
        let path = self.resolve(raw_path, project)?;
        self.validate_qualified(&path, Target::Collection)?;
        Ok(path)
    }

    pub fn validate_document_path(&self, path: &ResourcePath) -> FirestoreResult<()> {
        self.validate_qualified(path, Target::Document)
    }

    pub fn validate_collection_path(&self, path: &ResourcePath) -> FirestoreResult<()> {
        self.validate_qualified(path, Target::Collection)
    }

    // Layout: project / collection / doc / collection / doc ...
    fn validate_qualified(&self, path: &ResourcePath, target: Target) -> FirestoreResult<()> {
        match target {
            Target::Document if path.len() < 3 || path.len() % 2 == 0 => {
                return Err(invalid_argument(format!(
                    "Path '{path}' does not point to a document (expected project/collection/document)"
                )));
            }
            Target::Collection if path.len() < 2 || path.len() % 2 != 0 => {
                return Err(invalid_argument(format!(
                    "Path '{path}' does not point to a collection (expected project/collection)"
                )));
            }
            _ => {}
        }

        for (index, segment) in path.iter().enumerate() {
            if index == 0 {
                self.rules.validate_project_id(segment)?;
            } else if index % 2 == 1 {
                self.rules.validate_collection_name(segment)?;
            } else {
                self.rules.validate_document_id(segment)?;
            }
        }
        Ok(())
    }
}

fn ensure_embedded_project(path: &ResourcePath, project: &str, raw_path: &str) -> FirestoreResult<()> {
    match path.first_segment() {
        Some(embedded) if embedded == project => Ok(()),
        Some(embedded) => Err(invalid_argument(format!(
            "Path '{raw_path}' names project '{embedded}' but '{project}' was requested"
        ))),
        None => Err(invalid_argument("Path must be a non-empty string")),
    }
}
