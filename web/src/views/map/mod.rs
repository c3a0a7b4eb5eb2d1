pub mod locator_map;
