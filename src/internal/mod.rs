//! Internal building blocks (object model, object database, staging
//! index) that power the repository facade.

pub mod index;
pub mod object;
pub mod odb;
