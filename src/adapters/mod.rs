// Adapters layer: concrete implementations for the external systems the
// domain ports abstract over (calendar fetching, storage).

pub mod fixture;
pub mod http;
pub mod storage;
