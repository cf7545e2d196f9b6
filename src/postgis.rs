/// OpenStreetMap features from a PostGIS database imported with osm2pgsql
///
/// The database is expected to use the default osm2pgsql schema in EPSG:3857
/// with all tags kept in an hstore column (`osm2pgsql --hstore-all`).
///
/// Further reading: https://osm2pgsql.org/doc/manual.html
use crate::feature::{Geometry, RawFeature, Tags};
use crate::{Error, FeatureSource, GeoBounds};

use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{query, PgPool, Row};
use tracing::debug;

// TODO: remove once async fn in traits become stable
use async_trait::async_trait;

/// osm2pgsql tables and the OSM element type of their rows. Polygon rows
/// with a negative id come from relations.
const TABLES: [(&str, &str); 3] = [
    ("planet_osm_point", "'node/' || osm_id"),
    ("planet_osm_line", "'way/' || osm_id"),
    (
        "planet_osm_polygon",
        "CASE WHEN osm_id < 0 THEN 'relation/' || -osm_id ELSE 'way/' || osm_id END",
    ),
];

#[derive(Clone, Debug)]
pub struct PostgisSource {
    pool: PgPool,
}

impl PostgisSource {
    pub fn new(pool: PgPool) -> PostgisSource {
        PostgisSource { pool }
    }

    pub async fn connect(url: &str) -> Result<PostgisSource, Error> {
        let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
        Ok(PostgisSource::new(pool))
    }
}

fn features_sql() -> String {
    let selects: Vec<String> = TABLES
        .iter()
        .map(|(table, id)| {
            format!(
                "SELECT {} AS id, ST_AsGeoJSON(ST_Transform(way, 4326)) AS geometry, hstore_to_json(tags)::text AS tags FROM {} WHERE way && !bbox!",
                id, table
            )
        })
        .collect();

    selects
        .join(" UNION ALL ")
        .replace("!bbox!", "ST_Transform(ST_MakeEnvelope($1, $2, $3, $4, 4326), 3857)")
}

/// Builds a feature from the text columns of one result row.
fn decode_feature(id: String, geometry: &str, tags: Option<&str>) -> Result<RawFeature, Error> {
    let geometry = Geometry::from_geojson(&serde_json::from_str::<Value>(geometry)?)?;
    let tags = match tags {
        Some(tags) => Tags::from_json(&serde_json::from_str::<Value>(tags)?),
        None => None,
    };

    Ok(RawFeature::new(geometry, tags).with_id(id))
}

#[async_trait]
impl FeatureSource for PostgisSource {
    async fn features(&self, bounds: GeoBounds) -> Result<Vec<RawFeature>, Error> {
        let sql = features_sql();

        let rows = query(&sql)
            .bind(bounds.west)
            .bind(bounds.south)
            .bind(bounds.east)
            .bind(bounds.north)
            .fetch_all(&self.pool)
            .await?;

        let features = rows
            .iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let geometry: String = row.try_get("geometry")?;
                let tags: Option<String> = row.try_get("tags")?;
                decode_feature(id, &geometry, tags.as_deref())
            })
            .collect::<Result<Vec<_>, Error>>()?;

        debug!(count = features.len(), "Fetched features from PostGIS");
        Ok(features)
    }
}
