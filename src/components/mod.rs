//! Canvas widgets.

pub mod mind_map;
