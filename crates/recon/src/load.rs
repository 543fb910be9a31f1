//! Catalog loaders: CSV / JSON files → [`StreetRecord`]s through a
//! [`ColumnMapping`](crate::config::ColumnMapping).

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::Value;

use crate::config::{CatalogConfig, CatalogFormat, ReconConfig};
use crate::error::ReconError;
use crate::geo::GeoPoint;
use crate::model::{ReconInput, StreetRecord};

/// Read both catalogs of `config`, resolving files relative to `base_dir`.
pub fn load_input(config: &ReconConfig, base_dir: &Path) -> Result<ReconInput, ReconError> {
    Ok(ReconInput {
        a: read_catalog("a", &config.catalogs.a, base_dir)?,
        b: read_catalog("b", &config.catalogs.b, base_dir)?,
    })
}

/// Read and parse one catalog file. An absent file is fatal.
pub fn read_catalog(
    catalog: &str,
    cfg: &CatalogConfig,
    base_dir: &Path,
) -> Result<Vec<StreetRecord>, ReconError> {
    let path = base_dir.join(&cfg.file);
    if !path.is_file() {
        return Err(ReconError::MissingInput {
            catalog: catalog.into(),
            path,
        });
    }
    let data = std::fs::read_to_string(&path)
        .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;

    let records = match cfg.resolved_format() {
        CatalogFormat::Csv => load_csv_records(catalog, &data, cfg)?,
        CatalogFormat::Json => load_json_records(catalog, &data, cfg)?,
    };
    tracing::debug!(
        catalog,
        source = %cfg.source,
        path = %path.display(),
        records = records.len(),
        "catalog loaded"
    );
    Ok(records)
}

/// Load CSV rows, applying column mapping and filter.
///
/// Header problems are fatal. A row that cannot be read, or that has no
/// `street_id`, is skipped with a warning.
pub fn load_csv_records(
    catalog: &str,
    csv_data: &str,
    cfg: &CatalogConfig,
) -> Result<Vec<StreetRecord>, ReconError> {
    let csv_err = |e: csv::Error| ReconError::Csv {
        catalog: catalog.into(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: HashMap<String, usize> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    let mut required = cfg.columns.mapped();
    if let Some(ref filter) = cfg.filter {
        required.push(filter.column.as_str());
    }
    for column in required {
        if !headers.contains_key(column) {
            return Err(ReconError::MissingColumn {
                catalog: catalog.into(),
                column: column.into(),
            });
        }
    }

    let mut builder = RecordBuilder::new(catalog, cfg);
    for (i, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                builder.skip(i + 1, &e.to_string());
                continue;
            }
        };
        let field = |column: &str| {
            headers
                .get(column)
                .and_then(|&idx| record.get(idx))
                .map(Cow::Borrowed)
        };
        builder.push(i + 1, field)?;
    }
    Ok(builder.finish())
}

/// Load JSON records: a top-level array, or the array at `records_path`.
/// Scalars are read as strings; absent keys and `null` read as empty.
/// Items that are not objects are skipped with a warning.
pub fn load_json_records(
    catalog: &str,
    json_data: &str,
    cfg: &CatalogConfig,
) -> Result<Vec<StreetRecord>, ReconError> {
    let json_err = |message: String| ReconError::Json {
        catalog: catalog.into(),
        message,
    };

    let root: Value = serde_json::from_str(json_data).map_err(|e| json_err(e.to_string()))?;
    let items = match cfg.records_path.as_deref() {
        Some(pointer) => root
            .pointer(pointer)
            .ok_or_else(|| json_err(format!("records_path '{pointer}' not found")))?,
        None => &root,
    };
    let items = items.as_array().ok_or_else(|| {
        json_err(format!(
            "expected an array of records at '{}'",
            cfg.records_path.as_deref().unwrap_or("/")
        ))
    })?;

    let mut builder = RecordBuilder::new(catalog, cfg);
    for (i, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            builder.skip(i + 1, "record is not an object");
            continue;
        };
        builder.push(i + 1, |column: &str| object.get(column).and_then(scalar_text))?;
    }
    Ok(builder.finish())
}

fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Row → StreetRecord
// ---------------------------------------------------------------------------

/// Shared row handling for both formats.
struct RecordBuilder<'c> {
    catalog: &'c str,
    cfg: &'c CatalogConfig,
    seen: HashSet<String>,
    records: Vec<StreetRecord>,
    filtered: usize,
    skipped: usize,
    malformed_coords: usize,
}

impl<'c> RecordBuilder<'c> {
    fn new(catalog: &'c str, cfg: &'c CatalogConfig) -> Self {
        Self {
            catalog,
            cfg,
            seen: HashSet::new(),
            records: Vec::new(),
            filtered: 0,
            skipped: 0,
            malformed_coords: 0,
        }
    }

    fn push<'r>(
        &mut self,
        row: usize,
        field: impl Fn(&str) -> Option<Cow<'r, str>>,
    ) -> Result<(), ReconError> {
        let text = |column: &str| -> String {
            field(column).map(|v| v.trim().to_string()).unwrap_or_default()
        };
        let optional = |column: &Option<String>| -> String {
            match column {
                Some(c) => text(c),
                None => String::new(),
            }
        };
        let id = |column: &Option<String>| -> Option<String> {
            Some(optional(column)).filter(|v| !v.is_empty())
        };

        let cfg = self.cfg;
        if let Some(ref filter) = cfg.filter {
            let value = text(&filter.column);
            if !filter.values.iter().any(|v| v.trim() == value) {
                self.filtered += 1;
                return Ok(());
            }
        }

        let cols = &cfg.columns;
        let street_id = text(&cols.street_id);
        if street_id.is_empty() {
            self.skip(row, &format!("missing required field '{}'", cols.street_id));
            return Ok(());
        }
        if !self.seen.insert(street_id.clone()) {
            return Err(ReconError::DuplicateStreetId {
                catalog: self.catalog.into(),
                street_id,
            });
        }

        let latitude = optional(&cols.latitude);
        let longitude = optional(&cols.longitude);
        let coordinates = self.parse_coordinates(&street_id, &latitude, &longitude);

        self.records.push(StreetRecord {
            source: cfg.source.clone(),
            city_id: id(&cols.city_id),
            city_name: optional(&cols.city_name),
            district_id: id(&cols.district_id),
            district_name: optional(&cols.district_name),
            subdivision_id: id(&cols.subdivision_id),
            subdivision_name: optional(&cols.subdivision_name),
            street_id,
            display_name: text(&cols.display_name),
            coordinates,
        });
        Ok(())
    }

    fn skip(&mut self, row: usize, reason: &str) {
        self.skipped += 1;
        tracing::warn!(catalog = self.catalog, row, reason, "malformed record skipped");
    }

    /// Both blank is simply "no geometry". Anything else that does not yield
    /// a valid point is a malformed record.
    fn parse_coordinates(&mut self, street_id: &str, latitude: &str, longitude: &str) -> Option<GeoPoint> {
        if latitude.is_empty() && longitude.is_empty() {
            return None;
        }
        let point = match (latitude.parse::<f64>(), longitude.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => GeoPoint::new(lat, lon),
            _ => None,
        };
        if point.is_none() {
            self.malformed_coords += 1;
            tracing::warn!(
                catalog = self.catalog,
                street_id,
                latitude,
                longitude,
                "malformed coordinates, record kept without geometry"
            );
        }
        point
    }

    fn finish(self) -> Vec<StreetRecord> {
        if self.skipped > 0 {
            tracing::warn!(
                catalog = self.catalog,
                skipped = self.skipped,
                loaded = self.records.len(),
                "catalog loaded with skipped records"
            );
        }
        if self.filtered > 0 || self.malformed_coords > 0 {
            tracing::debug!(
                catalog = self.catalog,
                filtered = self.filtered,
                malformed_coords = self.malformed_coords,
                "rows adjusted during load"
            );
        }
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnMapping, RowFilter};

    fn myhome_config() -> CatalogConfig {
        CatalogConfig {
            source: "myhome".into(),
            file: "myhome.csv".into(),
            format: None,
            records_path: None,
            columns: ColumnMapping {
                street_id: "id".into(),
                display_name: "display_name".into(),
                city_id: Some("city_id".into()),
                district_name: Some("district_name".into()),
                subdivision_name: Some("urban_name".into()),
                latitude: Some("latitude".into()),
                longitude: Some("longitude".into()),
                ..ColumnMapping::default()
            },
            filter: None,
        }
    }

    fn ss_config() -> CatalogConfig {
        CatalogConfig {
            source: "ss".into(),
            file: "ss.json".into(),
            format: Some(CatalogFormat::Json),
            records_path: Some("/streets".into()),
            columns: ColumnMapping {
                street_id: "streetId".into(),
                display_name: "streetTitle".into(),
                city_id: Some("cityId".into()),
                district_name: Some("districtTitle".into()),
                latitude: Some("latitude".into()),
                longitude: Some("longitude".into()),
                ..ColumnMapping::default()
            },
            filter: None,
        }
    }

    const MYHOME_CSV: &str = "\
id,display_name,city_id,district_name,urban_name,latitude,longitude
101, ფანასკერტელ-ციციშვილის ქ. ,1,ვაკე,ვაკე,41.7000,44.8000
102,აღმაშენებლის ქ.,1,,,41.7100,44.8000
103,ქუჩა,1,ვაკე,,,
";

    #[test]
    fn load_csv_basic() {
        let rows = load_csv_records("a", MYHOME_CSV, &myhome_config()).unwrap();
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.source, "myhome");
        assert_eq!(first.street_id, "101");
        assert_eq!(first.display_name, "ფანასკერტელ-ციციშვილის ქ.");
        assert_eq!(first.city_id.as_deref(), Some("1"));
        assert_eq!(first.district_name, "ვაკე");
        assert_eq!(first.subdivision_name, "ვაკე");
        assert_eq!(first.district_id, None);
        assert_eq!(first.coordinates, GeoPoint::new(41.7, 44.8));

        assert_eq!(rows[1].district_name, "");
        assert!(rows[2].coordinates.is_none());
    }

    #[test]
    fn load_csv_missing_column() {
        let csv = "id,display_name\n1,x\n";
        let err = load_csv_records("a", csv, &myhome_config()).unwrap_err();
        match err {
            ReconError::MissingColumn { catalog, column } => {
                assert_eq!(catalog, "a");
                assert_eq!(column, "city_id");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn load_csv_with_filter() {
        let csv = "\
id,display_name,city_id,district_name,urban_name,latitude,longitude
1,Kostava St,1,,,,
2,Lenin St,2,,,,
3,Rustaveli Ave,1,,,,
";
        let mut cfg = myhome_config();
        cfg.filter = Some(RowFilter {
            column: "city_id".into(),
            values: vec!["1".into()],
        });
        let rows = load_csv_records("a", csv, &cfg).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.street_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn malformed_coordinates_drop_geometry_only() {
        let csv = "\
id,display_name,city_id,district_name,urban_name,latitude,longitude
1,A,1,,,41.7,
2,B,1,,,abc,44.8
3,C,1,,,95.0,44.8
4,D,1,,,41.7,44.8
";
        let rows = load_csv_records("a", csv, &myhome_config()).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[..3].iter().all(|r| r.coordinates.is_none()));
        assert!(rows[3].coordinates.is_some());
        assert_eq!(rows[1].display_name, "B");
    }

    #[test]
    fn duplicate_street_id_is_rejected() {
        let csv = "\
id,display_name,city_id,district_name,urban_name,latitude,longitude
7,A,1,,,,
7,B,1,,,,
";
        let err = load_csv_records("a", csv, &myhome_config()).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateStreetId { ref street_id, .. } if street_id == "7"));
    }

    #[test]
    fn blank_street_id_row_is_skipped() {
        let csv = "\
id,display_name,city_id,district_name,urban_name,latitude,longitude
1,Kostava St,1,,,41.7,44.8
 ,Rustaveli Ave,1,,,41.69,44.80
3,Tamar Mepe Ave,1,,,,
";
        let rows = load_csv_records("a", csv, &myhome_config()).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.street_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn ragged_rows_load_with_absent_fields() {
        let csv = "\
id,display_name,city_id,district_name,urban_name,latitude,longitude
1,Kostava St,1,,,41.7,44.8
2,Rustaveli Ave
3,Tamar Mepe Ave,1,,,41.71,44.78,extra
";
        let rows = load_csv_records("a", csv, &myhome_config()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].street_id, "2");
        assert_eq!(rows[1].display_name, "Rustaveli Ave");
        assert_eq!(rows[1].city_id, None);
        assert!(rows[1].coordinates.is_none());
        assert_eq!(rows[2].coordinates, GeoPoint::new(41.71, 44.78));
    }

    #[test]
    fn load_json_with_records_path() {
        let json = r#"{
            "streets": [
                {"streetId": 5001, "streetTitle": "ფანასკერტელ-ციციშვილის ქუჩა",
                 "cityId": 95, "districtTitle": "ვაკე",
                 "latitude": 41.7005, "longitude": 44.8005},
                {"streetId": "5002", "streetTitle": "ვაკის პარკი",
                 "cityId": null, "latitude": null, "longitude": null}
            ]
        }"#;
        let rows = load_json_records("b", json, &ss_config()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].street_id, "5001");
        assert_eq!(rows[0].city_id.as_deref(), Some("95"));
        assert_eq!(rows[0].coordinates, GeoPoint::new(41.7005, 44.8005));
        assert_eq!(rows[1].city_id, None);
        assert_eq!(rows[1].district_name, "");
        assert!(rows[1].coordinates.is_none());
    }

    #[test]
    fn load_json_top_level_array() {
        let mut cfg = ss_config();
        cfg.records_path = None;
        let json = r#"[{"streetId": "1", "streetTitle": "A", "latitude": "41.7", "longitude": "44.8"}]"#;
        let rows = load_json_records("b", json, &cfg).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].coordinates, GeoPoint::new(41.7, 44.8));
    }

    #[test]
    fn load_json_errors() {
        let cfg = ss_config();
        assert!(matches!(
            load_json_records("b", "{not json", &cfg),
            Err(ReconError::Json { .. })
        ));
        assert!(matches!(
            load_json_records("b", r#"{"other": []}"#, &cfg),
            Err(ReconError::Json { .. })
        ));
    }

    #[test]
    fn load_json_skips_malformed_items() {
        let json = r#"{"streets": [
            {"streetTitle": "no id"},
            "not an object",
            {"streetId": 5003, "streetTitle": "ვაკის პარკი"}
        ]}"#;
        let rows = load_json_records("b", json, &ss_config()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].street_id, "5003");
    }

    #[test]
    fn read_catalog_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_catalog("a", &myhome_config(), dir.path()).unwrap_err();
        match err {
            ReconError::MissingInput { catalog, path } => {
                assert_eq!(catalog, "a");
                assert!(path.ends_with("myhome.csv"));
            }
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }

    #[test]
    fn read_catalog_resolves_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("myhome.csv"), MYHOME_CSV).unwrap();
        let rows = read_catalog("a", &myhome_config(), dir.path()).unwrap();
        assert_eq!(rows.len(), 3);
    }
}
