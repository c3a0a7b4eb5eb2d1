pub mod locator;
pub mod map;
pub mod order;
