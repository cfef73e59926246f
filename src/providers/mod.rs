pub mod okx;

pub use okx::OkxSource;
