pub mod export;
pub mod local;
pub mod repository;

pub use export::export_csv;
pub use local::LocalStorage;
pub use repository::JobRepository;
