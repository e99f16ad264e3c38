use crate::cache::{Cache, CacheDir};
use crate::conf::Conf;
use crate::feature::feature_id;
use crate::tile::{fetch_regions, BoundingBox};
use crate::upstream::Upstream;
use crate::{Error, Result};
use std::fmt::{Display, Formatter};
use tracing::{error, info, warn};

pub const DEFAULT_FUEL_TYPE: &str = "Diesel";

#[derive(Clone, Debug, PartialEq)]
pub enum Category {
    Parking,
    Fuel(String),
}

impl Category {
    pub fn dir(&self) -> CacheDir {
        match self {
            Category::Parking => CacheDir::Parkings,
            Category::Fuel(_) => CacheDir::Fuel,
        }
    }

    pub fn segments<'a>(&'a self, tile: &'a BoundingBox) -> Vec<&'a str> {
        match self {
            Category::Parking => vec!["poi", "parking", tile.from.as_str(), tile.to.as_str()],
            Category::Fuel(fuel_type) => {
                vec!["poi", "fuelstations", fuel_type.as_str(), tile.from.as_str(), tile.to.as_str()]
            }
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Parking => write!(f, "parkings"),
            Category::Fuel(fuel_type) => write!(f, "fuel stations ({fuel_type})"),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub tiles: usize,
    pub failed_tiles: usize,
    pub saved: usize,
    pub skipped: usize,
}

struct TileReport {
    saved: usize,
    skipped: usize,
}

pub async fn run(conf: &Conf, args: &[String]) -> Result<()> {
    if !conf.has_token() {
        Err(Error::Config("MAPTRIP_TOKEN missing in environment".into()))?
    }
    let fuel_type = args
        .first()
        .cloned()
        .unwrap_or(DEFAULT_FUEL_TYPE.into());
    let upstream = Upstream::new(&conf.upstream_url, &conf.token)?;
    let cache = Cache::new(&conf.data_dir);
    let tiles = fetch_regions(conf.tile_deg()?)?;
    info!(tiles = tiles.len(), data_dir = %conf.data_dir.display(), "Fetching POIs");
    for category in [Category::Parking, Category::Fuel(fuel_type)] {
        let summary = fetch_category(&upstream, &cache, &category, &tiles).await?;
        info!(
            category = %category,
            tiles = summary.tiles,
            failed_tiles = summary.failed_tiles,
            saved = summary.saved,
            skipped = summary.skipped,
            "Finished category",
        );
    }
    info!("Done");
    Ok(())
}

/// Fetches one category tile by tile. A failing tile is logged and the run
/// moves on to the next one.
pub async fn fetch_category(
    upstream: &Upstream,
    cache: &Cache,
    category: &Category,
    tiles: &[BoundingBox],
) -> Result<Summary> {
    cache.ensure_dirs()?;
    let mut summary = Summary::default();
    for tile in tiles {
        summary.tiles += 1;
        match fetch_tile(upstream, cache, category, tile).await {
            Ok(report) => {
                summary.saved += report.saved;
                summary.skipped += report.skipped;
            }
            Err(e) => {
                summary.failed_tiles += 1;
                error!(tile = tile.name.as_str(), category = %category, error = %e, "Failed to fetch tile");
            }
        }
    }
    Ok(summary)
}

async fn fetch_tile(
    upstream: &Upstream,
    cache: &Cache,
    category: &Category,
    tile: &BoundingBox,
) -> Result<TileReport> {
    let url = upstream.url(&category.segments(tile));
    info!(%url, "Fetching");
    let features = upstream.get_feature_collection(url).await?;
    info!(tile = tile.name.as_str(), "Got {} {}", features.len(), category);
    let mut report = TileReport {
        saved: 0,
        skipped: 0,
    };
    for feature in &features {
        match feature_id(feature) {
            Some(id) => {
                cache.save(category.dir(), &id, feature)?;
                report.saved += 1;
            }
            None => {
                warn!(tile = tile.name.as_str(), "Skipping feature without id and coordinates");
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod test {
    use super::{fetch_category, run, Category, Summary};
    use crate::cache::Cache;
    use crate::conf::Conf;
    use crate::test::{dead_upstream_url, fake_upstream};
    use crate::tile::BoundingBox;
    use crate::upstream::Upstream;
    use crate::{Error, Result};
    use actix_web::test;
    use serde_json::{json, Value};
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn read(path: impl AsRef<Path>) -> Result<Value> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn tiles() -> Vec<BoundingBox> {
        vec![
            BoundingBox::new("north", "50.0,10.0", "51.0,11.0"),
            BoundingBox::new("south", "40.0,10.0", "41.0,11.0"),
        ]
    }

    #[test]
    async fn category_segments() {
        let tile = BoundingBox::new("t", "34.0,-10.0", "72.0,40.0");
        assert_eq!(
            Category::Parking.segments(&tile),
            vec!["poi", "parking", "34.0,-10.0", "72.0,40.0"],
        );
        assert_eq!(
            Category::Fuel("Diesel".into()).segments(&tile),
            vec!["poi", "fuelstations", "Diesel", "34.0,-10.0", "72.0,40.0"],
        );
    }

    #[test]
    async fn saves_every_feature() -> Result<()> {
        let fake = fake_upstream(|_| {
            let body = json!({
                "type": "FeatureCollection",
                "features": [
                    { "type": "Feature", "properties": { "id": "p1" }, "geometry": { "type": "Point", "coordinates": [10.5, 50.5] } },
                    { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [10.25, 50.75] } },
                ],
            });
            (200, body.to_string())
        });
        let root = tempfile::tempdir()?;
        let upstream = Upstream::new(&fake.url, "secret")?;
        let cache = Cache::new(root.path());
        let summary = fetch_category(&upstream, &cache, &Category::Parking, &tiles()[..1]).await?;
        assert_eq!(
            summary,
            Summary {
                tiles: 1,
                failed_tiles: 0,
                saved: 2,
                skipped: 0,
            },
        );
        assert_eq!(read(root.path().join("parkings/p1.json"))?["properties"]["id"], "p1");
        assert_eq!(
            read(root.path().join("parkings/50.75_10.25.json"))?["geometry"]["coordinates"],
            json!([10.25, 50.75]),
        );
        assert_eq!(fake.seen_paths(), vec!["/v1/poi/parking/50.0,10.0/51.0,11.0"]);
        Ok(())
    }

    #[test]
    async fn continues_after_failed_tile() -> Result<()> {
        let fake = fake_upstream(|path| {
            if path.contains("50.0,10.0") {
                (503, "{}".into())
            } else {
                let body = json!({ "features": [{ "properties": { "id": 7 } }] });
                (200, body.to_string())
            }
        });
        let root = tempfile::tempdir()?;
        let upstream = Upstream::new(&fake.url, "secret")?;
        let cache = Cache::new(root.path());
        let category = Category::Fuel("Super E10".into());
        let summary = fetch_category(&upstream, &cache, &category, &tiles()).await?;
        assert_eq!(
            summary,
            Summary {
                tiles: 2,
                failed_tiles: 1,
                saved: 1,
                skipped: 0,
            },
        );
        assert!(root.path().join("fuel/7.json").is_file());
        assert_eq!(
            fake.seen_paths(),
            vec![
                "/v1/poi/fuelstations/Super%20E10/50.0,10.0/51.0,11.0",
                "/v1/poi/fuelstations/Super%20E10/40.0,10.0/41.0,11.0",
            ],
        );
        Ok(())
    }

    #[test]
    async fn continues_when_upstream_is_down() -> Result<()> {
        let root = tempfile::tempdir()?;
        let upstream = Upstream::new(&dead_upstream_url(), "secret")?;
        let cache = Cache::new(root.path());
        let summary = fetch_category(&upstream, &cache, &Category::Parking, &tiles()).await?;
        assert_eq!(summary.tiles, 2);
        assert_eq!(summary.failed_tiles, 2);
        assert!(root.path().join("parkings").is_dir());
        Ok(())
    }

    #[test]
    async fn continues_after_unparsable_body() -> Result<()> {
        let fake = fake_upstream(|path| {
            if path.contains("50.0,10.0") {
                (200, "not json".into())
            } else {
                let body = json!({ "features": [{ "properties": { "id": "p2" } }] });
                (200, body.to_string())
            }
        });
        let root = tempfile::tempdir()?;
        let upstream = Upstream::new(&fake.url, "secret")?;
        let cache = Cache::new(root.path());
        let summary = fetch_category(&upstream, &cache, &Category::Parking, &tiles()).await?;
        assert_eq!(
            summary,
            Summary {
                tiles: 2,
                failed_tiles: 1,
                saved: 1,
                skipped: 0,
            },
        );
        assert!(root.path().join("parkings/p2.json").is_file());
        Ok(())
    }

    #[test]
    async fn continues_after_failed_write() -> Result<()> {
        let fake = fake_upstream(|path| {
            let id = if path.contains("50.0,10.0") { "p1" } else { "p2" };
            let body = json!({ "features": [{ "properties": { "id": id } }] });
            (200, body.to_string())
        });
        let root = tempfile::tempdir()?;
        // a directory in place of the file makes the write fail
        fs::create_dir_all(root.path().join("parkings/p1.json"))?;
        let upstream = Upstream::new(&fake.url, "secret")?;
        let cache = Cache::new(root.path());
        let summary = fetch_category(&upstream, &cache, &Category::Parking, &tiles()).await?;
        assert_eq!(
            summary,
            Summary {
                tiles: 2,
                failed_tiles: 1,
                saved: 1,
                skipped: 0,
            },
        );
        assert!(root.path().join("parkings/p1.json").is_dir());
        assert!(root.path().join("parkings/p2.json").is_file());
        Ok(())
    }

    #[test]
    async fn skips_unidentifiable_features() -> Result<()> {
        let fake = fake_upstream(|_| {
            let body = json!({ "features": [{ "type": "Feature" }, { "properties": { "id": "ok" } }] });
            (200, body.to_string())
        });
        let root = tempfile::tempdir()?;
        let upstream = Upstream::new(&fake.url, "secret")?;
        let cache = Cache::new(root.path());
        let summary = fetch_category(&upstream, &cache, &Category::Parking, &tiles()[..1]).await?;
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(fs::read_dir(root.path().join("parkings"))?.count(), 1);
        Ok(())
    }

    #[test]
    async fn rerun_overwrites() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let fake = fake_upstream(move |_| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            let body = json!({ "features": [{ "properties": { "id": "p1", "call": call } }] });
            (200, body.to_string())
        });
        let root = tempfile::tempdir()?;
        let upstream = Upstream::new(&fake.url, "secret")?;
        let cache = Cache::new(root.path());
        fetch_category(&upstream, &cache, &Category::Parking, &tiles()[..1]).await?;
        fetch_category(&upstream, &cache, &Category::Parking, &tiles()[..1]).await?;
        assert_eq!(fs::read_dir(root.path().join("parkings"))?.count(), 1);
        assert_eq!(read(root.path().join("parkings/p1.json"))?["properties"]["call"], 1);
        Ok(())
    }

    #[test]
    async fn refuses_to_run_without_token() -> Result<()> {
        let conf = Conf::from_lookup(|_| None);
        assert!(matches!(run(&conf, &[]).await, Err(Error::Config(_))));
        Ok(())
    }

    #[test]
    async fn refuses_tiny_tiles() -> Result<()> {
        let fake = fake_upstream(|_| (200, json!({ "features": [] }).to_string()));
        let url = fake.url.clone();
        let conf = Conf::from_lookup(|key| match key {
            "MAPTRIP_TOKEN" => Some("secret".into()),
            "MAPTRIP_BASE" => Some(url.clone()),
            "FETCH_TILE_DEG" => Some("0.001".into()),
            _ => None,
        });
        assert!(matches!(run(&conf, &[]).await, Err(Error::Config(_))));
        assert!(fake.seen_paths().is_empty());
        Ok(())
    }

    #[test]
    async fn run_fetches_parkings_then_fuel() -> Result<()> {
        let fake = fake_upstream(|_| (200, json!({ "features": [] }).to_string()));
        let root = tempfile::tempdir()?;
        let data_dir = root.path().to_string_lossy().to_string();
        let url = fake.url.clone();
        let conf = Conf::from_lookup(|key| match key {
            "MAPTRIP_TOKEN" => Some("secret".into()),
            "MAPTRIP_BASE" => Some(url.clone()),
            "DATA_DIR" => Some(data_dir.clone()),
            // only the server reads it
            "PORT" => Some("http".into()),
            _ => None,
        });
        run(&conf, &["LPG".into()]).await?;
        assert_eq!(
            fake.seen_paths(),
            vec![
                "/v1/poi/parking/34.0,-10.0/72.0,40.0",
                "/v1/poi/fuelstations/LPG/34.0,-10.0/72.0,40.0",
            ],
        );
        Ok(())
    }
}
