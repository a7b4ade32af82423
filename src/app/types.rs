use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirebaseOptions {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub app_id: Option<String>,
}

impl FirebaseOptions {
    pub(crate) fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.auth_domain.is_none() && self.project_id.is_none() && self.app_id.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirebaseAppSettings {
    pub name: Option<String>,
}

/// A named set of options. Cheap to clone; clones share the same app.
#[derive(Clone)]
pub struct FirebaseApp {
    inner: Arc<FirebaseAppInner>,
}

struct FirebaseAppInner {
    name: String,
    options: FirebaseOptions,
}

impl FirebaseApp {
    pub(crate) fn new(name: impl Into<String>, options: FirebaseOptions) -> Self {
        Self {
            inner: Arc::new(FirebaseAppInner {
                name: name.into(),
                options,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn options(&self) -> &FirebaseOptions {
        &self.inner.options
    }

    /// Whether both handles point at the same app instance.
    pub fn ptr_eq(&self, other: &FirebaseApp) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for FirebaseApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseApp")
            .field("name", &self.name())
            .field("project_id", &self.inner.options.project_id)
            .finish()
    }
}
