//! Client-side data access for a Firestore-style document database.
//!
//! String paths resolve into validated, project-qualified references;
//! references read and write documents over the REST API; declarative
//! `where` / `order_by` / `limit` constraints run either as a server-side
//! structured query or client-side over a fetched collection.
//!
//! ```no_run
//! use firestore_lite::app::{AppRegistry, FirebaseOptions};
//! use firestore_lite::firestore::{FilterOperator, Firestore, FirestoreSettings, OrderDirection};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = AppRegistry::new();
//! let app = registry.initialize_app(
//!     FirebaseOptions {
//!         project_id: Some("demo-project".into()),
//!         ..Default::default()
//!     },
//!     None,
//! )?;
//! let firestore = Firestore::new(app, FirestoreSettings::default())?;
//!
//! let adults = firestore
//!     .collection("users")?
//!     .query()
//!     .where_field("age", FilterOperator::GreaterThanOrEqual, 18)?
//!     .order_by("age", OrderDirection::Descending)?
//!     .limit(10)?
//!     .get()
//!     .await?;
//! for user in &adults {
//!     println!("{} => {:?}", user.id(), user.data());
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;

pub mod firestore;

pub mod util;

#[cfg(test)]
pub mod test_support;
