//! Interactive session layer over `montage_core`: the stateful editor
//! controller, the collaborator seams it consumes (media listing, duration
//! probing, export), and the import selection flow.

pub mod editor;
pub mod export;
pub mod import;
pub mod media;
