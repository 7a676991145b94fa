//! The single entry point callers use for forest data.
//!
//! `ForestDataService` wires the capability manager, the per-category
//! caches, the provider adapters, and the chain executor together. It is
//! explicitly constructed and dependency-injected, with no process-wide
//! singletons, so tests build isolated instances.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use forest_common::{Alert, Category, Imagery, MonitorResult, ProviderError, Region, Route};
use forest_common::{FetchCause, Species, Weather};
use providers::{
    firms, gbif, gfw, gibs, mock, openweather, AlertQuery, BiodiversityQuery, FirmsAdapter,
    GbifAdapter, GfwAdapter, GibsAdapter, HttpFetch, ImageryQuery, MockGenerator,
    OpenWeatherAdapter, ProxyClient, WeatherQuery, SPECIES_WATCHLIST,
};

use crate::cache::{category_ttl, TtlCache, REGION_TTL};
use crate::capability::CapabilityManager;
use crate::chain::{build_chain, join_settled, run_chain};

/// Combined alert feed is truncated to this many entries.
const MAX_ALERTS: usize = 25;
/// Biodiversity/weather alerts appended when no live alerts were obtained.
const SUPPLEMENTAL_ALERTS: usize = 2;
/// Entry bound per cache; keys are few (category × region × window).
const CACHE_ENTRIES: usize = 256;

/// Per-request options. `no_mock` is the wire form of the live-only veto:
/// it removes the mock step for this request only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    pub no_mock: bool,
}

/// A resolved payload plus the provenance of the route that produced it.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub source: String,
}

pub struct ForestDataService {
    capability: Arc<CapabilityManager>,
    mock: MockGenerator,
    firms: FirmsAdapter,
    gfw: GfwAdapter,
    openweather: OpenWeatherAdapter,
    gbif: GbifAdapter,
    gibs: GibsAdapter,
    proxy: Option<ProxyClient>,
    fire_cache: TtlCache<Fetched<Vec<Alert>>>,
    deforestation_cache: TtlCache<Fetched<Vec<Alert>>>,
    merged_cache: TtlCache<Fetched<Vec<Alert>>>,
    region_cache: TtlCache<Fetched<Vec<Region>>>,
    species_cache: TtlCache<Fetched<Vec<Species>>>,
    weather_cache: TtlCache<Fetched<Weather>>,
    imagery_cache: TtlCache<Fetched<Vec<Imagery>>>,
    config_events: Mutex<broadcast::Receiver<()>>,
}

impl ForestDataService {
    pub fn new(capability: Arc<CapabilityManager>, http: Arc<dyn HttpFetch>) -> Self {
        let proxy = capability
            .context()
            .proxy_base
            .clone()
            .map(|base| ProxyClient::new(http.clone(), base));
        let config_events = Mutex::new(capability.subscribe());

        Self {
            firms: FirmsAdapter::new(http.clone()),
            gfw: GfwAdapter::new(http.clone()),
            openweather: OpenWeatherAdapter::new(http.clone()),
            gbif: GbifAdapter::new(http.clone()),
            gibs: GibsAdapter::new(http),
            proxy,
            mock: MockGenerator::new(),
            fire_cache: TtlCache::new(CACHE_ENTRIES),
            deforestation_cache: TtlCache::new(CACHE_ENTRIES),
            merged_cache: TtlCache::new(CACHE_ENTRIES),
            region_cache: TtlCache::new(CACHE_ENTRIES),
            species_cache: TtlCache::new(CACHE_ENTRIES),
            weather_cache: TtlCache::new(CACHE_ENTRIES),
            imagery_cache: TtlCache::new(CACHE_ENTRIES),
            capability,
            config_events,
        }
    }

    /// Combined alert feed: fire and deforestation chains resolved
    /// concurrently, merged by timestamp descending, truncated to
    /// [`MAX_ALERTS`].
    pub async fn get_alerts(
        &self,
        query: &AlertQuery,
        opts: RequestOptions,
    ) -> MonitorResult<Fetched<Vec<Alert>>> {
        self.drain_config_events().await;
        let live_only = self.live_only(opts);
        let key = format!("alerts:{}:{}:{}", query.region, query.days, live_only);

        if let Some(hit) = self.merged_cache.get(&key).await {
            return Ok(hit);
        }

        let (fire, deforestation) = tokio::join!(
            self.get_fire_alerts(query, opts),
            self.get_deforestation_alerts(query, opts)
        );

        let mut sources = Vec::new();
        let mut alerts = Vec::new();
        for outcome in [fire, deforestation] {
            match outcome {
                Ok(fetched) => {
                    if !fetched.data.is_empty() {
                        sources.push(fetched.source);
                    }
                    alerts.extend(fetched.data);
                }
                // In live-only mode a dead category contributes an empty
                // result; the caller still learns nothing was fabricated.
                Err(error) => warn!(error = %error, "alert category unavailable"),
            }
        }

        let live_count = alerts.iter().filter(|a| a.source != mock::SOURCE).count();
        if live_count == 0 && !live_only {
            for category in [Category::Biodiversity, Category::Weather] {
                alerts.extend(
                    self.mock
                        .alerts(category, &query.region, SUPPLEMENTAL_ALERTS),
                );
            }
            if !sources.contains(&mock::SOURCE.to_string()) {
                sources.push(mock::SOURCE.to_string());
            }
        }

        alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        alerts.truncate(MAX_ALERTS);

        let fetched = Fetched {
            data: alerts,
            source: if sources.is_empty() {
                "none".to_string()
            } else {
                sources.join("+")
            },
        };
        self.merged_cache
            .insert(key, fetched.clone(), category_ttl(Category::Fire))
            .await;
        Ok(fetched)
    }

    /// Fire alerts via FIRMS → proxy → mock.
    pub async fn get_fire_alerts(
        &self,
        query: &AlertQuery,
        opts: RequestOptions,
    ) -> MonitorResult<Fetched<Vec<Alert>>> {
        self.drain_config_events().await;
        let live_only = self.live_only(opts);
        let key = format!("fire:{}:{}:{}", query.region, query.days, live_only);

        if let Some(hit) = self.fire_cache.get(&key).await {
            debug!(key = %key, "fire alerts served from cache");
            return Ok(hit);
        }

        let mut capability = self.capability.capability(Category::Fire);
        capability.live_only = live_only;
        let attempts = build_chain(&capability);

        let resolution = run_chain(Category::Fire, &attempts, |route| {
            let this = self;
            async move {
                match route {
                    Route::Direct => {
                        let map_key = this.credential(Category::Fire, "firms_map_key")?;
                        let raw = this.firms.fetch(query, &map_key).await?;
                        Ok((firms::SOURCE.to_string(), this.firms.parse(&raw)))
                    }
                    Route::Proxy => this.proxy(Category::Fire)?.fire_alerts(query, live_only).await,
                    Route::Mock => Ok((
                        mock::SOURCE.to_string(),
                        this.mock
                            .alerts(Category::Fire, &query.region, mock::FALLBACK_ALERT_COUNT),
                    )),
                }
            }
        })
        .await?;

        let fetched = Fetched {
            data: resolution.records,
            source: resolution.source,
        };
        self.fire_cache
            .insert(key, fetched.clone(), category_ttl(Category::Fire))
            .await;
        Ok(fetched)
    }

    /// Deforestation alerts via GFW → proxy → mock.
    pub async fn get_deforestation_alerts(
        &self,
        query: &AlertQuery,
        opts: RequestOptions,
    ) -> MonitorResult<Fetched<Vec<Alert>>> {
        self.drain_config_events().await;
        let live_only = self.live_only(opts);
        let key = format!(
            "deforestation:{}:{}:{}:{}",
            query.region, query.days, query.limit, live_only
        );

        if let Some(hit) = self.deforestation_cache.get(&key).await {
            return Ok(hit);
        }

        let mut capability = self.capability.capability(Category::Deforestation);
        capability.live_only = live_only;
        let attempts = build_chain(&capability);

        let resolution = run_chain(Category::Deforestation, &attempts, |route| {
            let this = self;
            async move {
                match route {
                    Route::Direct => {
                        let api_key = this.capability.settings().gfw_api_key;
                        let raw = this.gfw.fetch(query, api_key.as_deref()).await?;
                        Ok((
                            gfw::SOURCE.to_string(),
                            this.gfw.parse_alerts(&raw, &query.region),
                        ))
                    }
                    Route::Proxy => {
                        this.proxy(Category::Deforestation)?
                            .deforestation_alerts(query, live_only)
                            .await
                    }
                    Route::Mock => Ok((
                        mock::SOURCE.to_string(),
                        this.mock.alerts(
                            Category::Deforestation,
                            &query.region,
                            mock::FALLBACK_ALERT_COUNT,
                        ),
                    )),
                }
            }
        })
        .await?;

        let fetched = Fetched {
            data: resolution.records,
            source: resolution.source,
        };
        self.deforestation_cache
            .insert(key, fetched.clone(), category_ttl(Category::Deforestation))
            .await;
        Ok(fetched)
    }

    /// Region summaries, 24 h TTL class.
    pub async fn get_regions(&self, opts: RequestOptions) -> MonitorResult<Fetched<Vec<Region>>> {
        self.drain_config_events().await;
        let live_only = self.live_only(opts);
        let key = format!("regions:{}", live_only);

        if let Some(hit) = self.region_cache.get(&key).await {
            return Ok(hit);
        }

        let mut capability = self.capability.capability(Category::Deforestation);
        capability.live_only = live_only;
        let attempts = build_chain(&capability);

        let world = AlertQuery {
            region: "world".to_string(),
            days: 7,
            limit: 1000,
        };

        let resolution = run_chain(Category::Deforestation, &attempts, |route| {
            let this = self;
            let world = &world;
            async move {
                match route {
                    Route::Direct => {
                        let api_key = this.capability.settings().gfw_api_key;
                        let raw = this.gfw.fetch(world, api_key.as_deref()).await?;
                        Ok((gfw::SOURCE.to_string(), this.gfw.parse_regions(&raw)))
                    }
                    Route::Proxy => {
                        this.proxy(Category::Deforestation)?
                            .forest_regions(live_only)
                            .await
                    }
                    Route::Mock => Ok((mock::SOURCE.to_string(), this.mock.regions())),
                }
            }
        })
        .await?;

        let fetched = Fetched {
            data: resolution.records,
            source: resolution.source,
        };
        self.region_cache
            .insert(key, fetched.clone(), REGION_TTL)
            .await;
        Ok(fetched)
    }

    /// Species observations. The direct route polls the watchlist names
    /// concurrently against GBIF; failed lookups are backfilled from the
    /// mock generator up to the shortfall, never beyond, and not at all
    /// in live-only mode.
    pub async fn get_species(
        &self,
        query: &BiodiversityQuery,
        opts: RequestOptions,
    ) -> MonitorResult<Fetched<Vec<Species>>> {
        self.drain_config_events().await;
        let live_only = self.live_only(opts);
        let key = format!("species:{}:{}:{}", query.region, query.limit, live_only);

        if let Some(hit) = self.species_cache.get(&key).await {
            return Ok(hit);
        }

        let mut capability = self.capability.capability(Category::Biodiversity);
        capability.live_only = live_only;
        let attempts = build_chain(&capability);

        let count = query.limit.min(SPECIES_WATCHLIST.len()).max(1);

        let resolution = run_chain(Category::Biodiversity, &attempts, |route| {
            let this = self;
            async move {
                match route {
                    Route::Direct => this.poll_watchlist(count, live_only).await,
                    Route::Proxy => {
                        this.proxy(Category::Biodiversity)?
                            .biodiversity(query, live_only)
                            .await
                    }
                    Route::Mock => Ok((mock::SOURCE.to_string(), this.mock.species(count))),
                }
            }
        })
        .await?;

        let fetched = Fetched {
            data: resolution.records,
            source: resolution.source,
        };
        self.species_cache
            .insert(key, fetched.clone(), category_ttl(Category::Biodiversity))
            .await;
        Ok(fetched)
    }

    /// Current weather at a point via OpenWeather → proxy → mock.
    pub async fn get_weather(
        &self,
        query: &WeatherQuery,
        opts: RequestOptions,
    ) -> MonitorResult<Fetched<Weather>> {
        self.drain_config_events().await;
        let live_only = self.live_only(opts);
        let key = format!("weather:{:.2}:{:.2}:{}", query.lat, query.lng, live_only);

        if let Some(hit) = self.weather_cache.get(&key).await {
            return Ok(hit);
        }

        let mut capability = self.capability.capability(Category::Weather);
        capability.live_only = live_only;
        let attempts = build_chain(&capability);

        let resolution = run_chain(Category::Weather, &attempts, |route| {
            let this = self;
            async move {
                match route {
                    Route::Direct => {
                        let api_key = this.credential(Category::Weather, "openweather_api_key")?;
                        let raw = this.openweather.fetch(query, &api_key).await?;
                        let observation =
                            this.openweather.parse(&raw).into_iter().next().ok_or_else(|| {
                                ProviderError::new(
                                    Category::Weather,
                                    Route::Direct,
                                    FetchCause::Network("payload held no observation".to_string()),
                                )
                            })?;
                        Ok((openweather::SOURCE.to_string(), observation))
                    }
                    Route::Proxy => this.proxy(Category::Weather)?.weather(query, live_only).await,
                    Route::Mock => Ok((
                        mock::SOURCE.to_string(),
                        this.mock.weather(query.lat, query.lng),
                    )),
                }
            }
        })
        .await?;

        let fetched = Fetched {
            data: resolution.records,
            source: resolution.source,
        };
        self.weather_cache
            .insert(key, fetched.clone(), category_ttl(Category::Weather))
            .await;
        Ok(fetched)
    }

    /// Satellite tile metadata via GIBS → proxy → mock.
    pub async fn get_satellite(
        &self,
        query: &ImageryQuery,
        opts: RequestOptions,
    ) -> MonitorResult<Fetched<Vec<Imagery>>> {
        self.drain_config_events().await;
        let live_only = self.live_only(opts);
        let key = format!(
            "satellite:{:.2}:{:.2}:{}:{}",
            query.lat, query.lng, query.layer, live_only
        );

        if let Some(hit) = self.imagery_cache.get(&key).await {
            return Ok(hit);
        }

        let mut capability = self.capability.capability(Category::Satellite);
        capability.live_only = live_only;
        let attempts = build_chain(&capability);

        let resolution = run_chain(Category::Satellite, &attempts, |route| {
            let this = self;
            async move {
                match route {
                    Route::Direct => {
                        let raw = this.gibs.fetch(query).await?;
                        let records = this.gibs.parse(&raw, query);
                        if records.is_empty() {
                            return Err(ProviderError::new(
                                Category::Satellite,
                                Route::Direct,
                                FetchCause::Network("empty layer metadata".to_string()),
                            ));
                        }
                        Ok((gibs::SOURCE.to_string(), records))
                    }
                    Route::Proxy => {
                        this.proxy(Category::Satellite)?
                            .satellite(query, live_only)
                            .await
                    }
                    Route::Mock => Ok((mock::SOURCE.to_string(), this.mock.imagery(query))),
                }
            }
        })
        .await?;

        let fetched = Fetched {
            data: resolution.records,
            source: resolution.source,
        };
        self.imagery_cache
            .insert(key, fetched.clone(), category_ttl(Category::Satellite))
            .await;
        Ok(fetched)
    }

    /// Drop every cached value. Exposed for the explicit user-initiated
    /// clear; also runs when a configuration-changed signal arrives.
    pub async fn invalidate_all(&self) {
        tokio::join!(
            self.fire_cache.clear(),
            self.deforestation_cache.clear(),
            self.merged_cache.clear(),
            self.region_cache.clear(),
            self.species_cache.clear(),
            self.weather_cache.clear(),
            self.imagery_cache.clear(),
        );
    }

    async fn poll_watchlist(
        &self,
        count: usize,
        live_only: bool,
    ) -> Result<(String, Vec<Species>), ProviderError> {
        let names: Vec<&'static str> = SPECIES_WATCHLIST.iter().copied().take(count).collect();

        let tasks: Vec<_> = names
            .iter()
            .map(|name| {
                let this = self;
                async move {
                    let raw = this.gbif.fetch(name).await?;
                    this.gbif.parse(&raw).into_iter().next().ok_or_else(|| {
                        ProviderError::new(
                            Category::Biodiversity,
                            Route::Direct,
                            FetchCause::Network(format!("no match for {}", name)),
                        )
                    })
                }
            })
            .collect();

        let outcomes = join_settled(tasks).await;
        let successes = outcomes.iter().filter(|o| o.is_some()).count();
        if successes == 0 {
            return Err(ProviderError::new(
                Category::Biodiversity,
                Route::Direct,
                FetchCause::Network("every watchlist lookup failed".to_string()),
            ));
        }

        let mut results = Vec::with_capacity(names.len());
        for (name, outcome) in names.iter().zip(outcomes) {
            match outcome {
                Some(species) => results.push(species),
                None if !live_only => results.push(self.mock.species_named(name)),
                None => {}
            }
        }

        debug!(
            requested = names.len(),
            live = successes,
            backfilled = results.len() - successes,
            "watchlist join settled"
        );
        Ok((gbif::SOURCE.to_string(), results))
    }

    fn live_only(&self, opts: RequestOptions) -> bool {
        self.capability.is_live_only() || opts.no_mock
    }

    fn credential(&self, category: Category, field: &str) -> Result<String, ProviderError> {
        let settings = self.capability.settings();
        let value = match category {
            Category::Fire => settings.firms_map_key,
            Category::Weather => settings.openweather_api_key,
            _ => None,
        };
        value.ok_or_else(|| {
            ProviderError::new(
                category,
                Route::Direct,
                FetchCause::Network(format!("{} not configured", field)),
            )
        })
    }

    fn proxy(&self, category: Category) -> Result<&ProxyClient, ProviderError> {
        self.proxy.as_ref().ok_or_else(|| {
            ProviderError::new(
                category,
                Route::Proxy,
                FetchCause::ProxyRejected("no proxy configured".to_string()),
            )
        })
    }

    async fn drain_config_events(&self) {
        let mut rx = self.config_events.lock().await;
        let mut changed = false;
        loop {
            match rx.try_recv() {
                Ok(()) => changed = true,
                Err(broadcast::error::TryRecvError::Lagged(_)) => changed = true,
                Err(_) => break,
            }
        }
        drop(rx);

        if changed {
            info!("configuration changed, invalidating caches");
            self.invalidate_all().await;
        }
    }
}
