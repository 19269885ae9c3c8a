pub mod extractor;
pub mod resolver;

pub use extractor::Tenant;
pub use resolver::{TenantKey, resolve};
