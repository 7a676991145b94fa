//! Provider adapters for the forest-watch upstreams.
//!
//! One adapter per external data category: NASA FIRMS (fire), Global Forest
//! Watch (deforestation and region summaries), OpenWeather (weather), GBIF
//! (biodiversity), NASA GIBS (satellite imagery metadata). Each adapter
//! knows how to build a request for exactly one upstream and how to parse
//! that upstream's raw response into the canonical record shape.
//!
//! Adapters are generic over the [`HttpFetch`] transport so tests inject
//! canned responses instead of a network.

pub mod firms;
pub mod gbif;
pub mod gfw;
pub mod gibs;
pub mod http;
pub mod mock;
pub mod openweather;
pub mod params;
pub mod proxy;

pub use firms::FirmsAdapter;
pub use gbif::GbifAdapter;
pub use gfw::GfwAdapter;
pub use gibs::GibsAdapter;
pub use http::{HttpFetch, ReqwestFetch};
pub use mock::MockGenerator;
pub use openweather::OpenWeatherAdapter;
pub use params::{
    region_bounds, region_centroid, AlertQuery, BiodiversityQuery, ImageryQuery, RegionInfo,
    WeatherQuery, MONITORED_REGIONS, SPECIES_WATCHLIST,
};
pub use proxy::{Envelope, ProxyClient};
