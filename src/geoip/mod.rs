//! IP geolocation: provider strategies, the fallback resolver and an
//! optional caching layer

pub mod cached;
pub mod http;
pub mod mmdb;
pub mod provider;
pub mod resolver;

pub use cached::CachedResolver;
pub use http::{build_http_client, IpApiComProvider, IpapiCoProvider};
pub use mmdb::MmdbProvider;
pub use provider::{GeoProvider, ProviderError, ProviderHit};
pub use resolver::{FallbackResolver, GeoResolver};
