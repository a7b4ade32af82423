use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::app::constants::DEFAULT_ENTRY_NAME;
use crate::app::errors::{AppError, AppResult};
use crate::app::types::{FirebaseApp, FirebaseAppSettings, FirebaseOptions};

/// Holds initialized apps by name.
///
/// The registry is owned by the caller: nothing in the crate keeps a global
/// instance, so independent registries (one per test, for example) never see
/// each other's apps.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: RwLock<HashMap<String, FirebaseApp>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, FirebaseApp>> {
        self.apps.read().unwrap_or_else(|poison| poison.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, FirebaseApp>> {
        self.apps.write().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Registers a new app. Fails with `DuplicateApp` when the name is taken.
    pub fn initialize_app(
        &self,
        options: FirebaseOptions,
        settings: Option<FirebaseAppSettings>,
    ) -> AppResult<FirebaseApp> {
        let name = normalize_name(settings.unwrap_or_default())?;
        if options.is_empty() {
            return Err(AppError::NoOptions);
        }

        let mut apps = self.write();
        if apps.contains_key(&name) {
            return Err(AppError::DuplicateApp { app_name: name });
        }
        let app = FirebaseApp::new(name.clone(), options);
        apps.insert(name, app.clone());
        log::debug!("initialized app '{}'", app.name());
        Ok(app)
    }

    /// Returns the app registered under `name`, or the default app.
    pub fn get_app(&self, name: Option<&str>) -> AppResult<FirebaseApp> {
        let lookup = name.unwrap_or(DEFAULT_ENTRY_NAME);
        self.read().get(lookup).cloned().ok_or_else(|| AppError::NoApp {
            app_name: lookup.to_string(),
        })
    }

    /// Returns the existing app under the settings' name or registers one
    /// with `options`. The lookup and the insert happen under one lock.
    pub fn get_or_initialize_app(
        &self,
        options: FirebaseOptions,
        settings: Option<FirebaseAppSettings>,
    ) -> AppResult<FirebaseApp> {
        let name = normalize_name(settings.unwrap_or_default())?;
        let mut apps = self.write();
        if let Some(existing) = apps.get(&name) {
            return Ok(existing.clone());
        }
        if options.is_empty() {
            return Err(AppError::NoOptions);
        }
        let app = FirebaseApp::new(name.clone(), options);
        apps.insert(name, app.clone());
        Ok(app)
    }

    /// Removes `app` from the registry. Returns whether it was registered.
    pub fn delete_app(&self, app: &FirebaseApp) -> bool {
        let mut apps = self.write();
        match apps.get(app.name()) {
            Some(existing) if existing.ptr_eq(app) => {
                apps.remove(app.name());
                true
            }
            _ => false,
        }
    }

    pub fn apps(&self) -> Vec<FirebaseApp> {
        self.read().values().cloned().collect()
    }
}

fn normalize_name(settings: FirebaseAppSettings) -> AppResult<String> {
    let name = settings
        .name
        .unwrap_or_else(|| DEFAULT_ENTRY_NAME.to_string());
    if name.trim().is_empty() {
        return Err(AppError::BadAppName { app_name: name });
    }
    Ok(name)
}
