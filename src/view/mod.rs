pub mod layers;
pub mod selection;
#[allow(clippy::module_inception)]
pub mod view;
