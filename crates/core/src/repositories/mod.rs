//! Record storage and the visit operation surface.
//!
//! [`store::CareStore`] keeps every record kind in memory behind a single lock.
//! [`visits::VisitService`] is the operation surface used by the API layers: it resolves the
//! acting staff member, runs the pure domain rules and commits the results to the store.

pub mod store;
pub mod visits;
