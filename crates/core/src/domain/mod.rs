pub mod asset;
pub mod cluster;
pub mod contract;
pub mod feedback;
pub mod profile;
pub mod recommendation;

#[cfg(test)]
pub(crate) mod fixtures;
