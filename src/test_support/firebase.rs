use crate::app::{AppRegistry, FirebaseApp, FirebaseAppSettings, FirebaseOptions};

/// Build a Firebase app for `project_id` in a throwaway registry.
///
/// Each call uses its own `AppRegistry`, so tests never collide on app names.
pub fn test_firebase_app(project_id: Option<&str>) -> FirebaseApp {
    let options = FirebaseOptions {
        api_key: Some("test-api-key".into()),
        project_id: project_id.map(str::to_string),
        ..Default::default()
    };
    let settings = FirebaseAppSettings {
        name: Some("test".into()),
    };
    AppRegistry::new()
        .initialize_app(options, Some(settings))
        .expect("fresh registry accepts the test app")
}
