//! Go manifest parsing and Cargo manifest generation.

pub mod cargo;
pub mod gomod;

pub use cargo::{
    DependencyMap, MappedDependency, extract_crate_name, generate_cargo_toml, map_dependencies,
    module_path_to_github_url, resolve_crate_name,
};
pub use gomod::{Dependency, GoMod};
