pub mod category_cache;
pub mod upstream;
