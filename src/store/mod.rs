//! Query layer over the entity tables.
//!
//! One module per collection, plus [`crate::cascade`] for the structural
//! delete paths and edge maintenance that span several tables.

pub mod accounts;
pub mod channels;
pub mod comments;
pub mod tags;
pub mod videos;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
