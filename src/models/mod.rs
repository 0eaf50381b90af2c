pub mod loaders;
pub mod post;

pub use loaders::toml_loader::load_all_toml_files;
pub use post::PostTask;
