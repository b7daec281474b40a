pub mod age;

pub use age::humanize_age;
