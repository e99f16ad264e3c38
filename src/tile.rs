use crate::{Error, Result};
use geo::{coord, Rect};

/// Smallest tile edge in degrees, roughly a kilometer
pub const MIN_TILE_DEG: f64 = 0.01;

/// Upper bound for the number of tiles one region can be split into
pub const MAX_TILES: usize = 10_000;

/// Query region, `from` and `to` are "<lat>,<lon>" pairs in the upstream format
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub name: String,
    pub from: String,
    pub to: String,
}

impl BoundingBox {
    pub fn new(name: &str, from: &str, to: &str) -> BoundingBox {
        BoundingBox {
            name: name.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn rect(&self) -> Result<Rect<f64>> {
        let (from_lat, from_lon) = parse_point(&self.from)?;
        let (to_lat, to_lon) = parse_point(&self.to)?;
        Ok(Rect::new(
            coord! { x: from_lon, y: from_lat },
            coord! { x: to_lon, y: to_lat },
        ))
    }

    /// Splits the box into a grid of `tile_deg` sized tiles, row by row from
    /// the south-west corner. Tiles on the north and east edges are clipped.
    pub fn split(&self, tile_deg: f64) -> Result<Vec<BoundingBox>> {
        if !tile_deg.is_finite() || tile_deg < MIN_TILE_DEG {
            Err(Error::Config(format!("Invalid tile size: {tile_deg}")))?
        }
        let rect = self.rect()?;
        let (min, max) = (rect.min(), rect.max());
        let rows = ((rect.height() / tile_deg).ceil() as usize).max(1);
        let cols = ((rect.width() / tile_deg).ceil() as usize).max(1);
        if rows.saturating_mul(cols) > MAX_TILES {
            Err(Error::Config(format!(
                "Splitting {} into {tile_deg} degree tiles gives {rows}x{cols} tiles, the limit is {MAX_TILES}",
                self.name,
            )))?
        }
        let mut tiles = vec![];
        for row in 0..rows {
            let south = round(min.y + row as f64 * tile_deg);
            let north = round((min.y + (row + 1) as f64 * tile_deg).min(max.y));
            for col in 0..cols {
                let west = round(min.x + col as f64 * tile_deg);
                let east = round((min.x + (col + 1) as f64 * tile_deg).min(max.x));
                // float drift can produce an empty sliver past the edge
                if (south >= north && rows > 1) || (west >= east && cols > 1) {
                    continue;
                }
                tiles.push(BoundingBox {
                    name: format!("{}-{}-{}", self.name, row, col),
                    from: format!("{},{}", format_coord(south), format_coord(west)),
                    to: format!("{},{}", format_coord(north), format_coord(east)),
                });
            }
        }
        Ok(tiles)
    }
}

pub fn default_regions() -> Vec<BoundingBox> {
    vec![BoundingBox::new("europe-1", "34.0,-10.0", "72.0,40.0")]
}

/// Regions to fetch: the default ones as is, or split into tiles
pub fn fetch_regions(tile_deg: Option<f64>) -> Result<Vec<BoundingBox>> {
    let regions = default_regions();
    match tile_deg {
        None => Ok(regions),
        Some(tile_deg) => {
            let mut tiles = vec![];
            for region in &regions {
                tiles.extend(region.split(tile_deg)?);
            }
            Ok(tiles)
        }
    }
}

fn parse_point(point: &str) -> Result<(f64, f64)> {
    let invalid = || Error::Config(format!("Invalid coordinate pair: {point}"));
    let (lat, lon) = point.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        Err(invalid())?
    }
    Ok((lat, lon))
}

fn round(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn format_coord(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
