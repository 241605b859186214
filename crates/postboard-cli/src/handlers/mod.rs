pub mod browse;
pub mod posts;
