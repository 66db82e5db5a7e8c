//! Transformer from emissions CSV records into graph entities.
//!
//! Converts [`EmissionRecord`]s into the [`Node`]s and [`Relationship`]s the
//! capture API accepts: one `Well` node per well key, an `Emissions` node
//! and four `EmissionType` nodes beneath it, and one measurement node per
//! (well, emission type, date) with volume/mass properties. Measurement
//! nodes for a given emission type are linked into a reverse-chronological
//! `NEXT_DATE` chain anchored by a `HAS_DATA` relationship.

use std::collections::HashMap;

use tracing::warn;

use crate::csv_handler::EmissionRecord;
use crate::graph::{
    date_string, external_id, Node, NodeRef, Property, PropertyMetadata, Relationship,
};

/// The four emission measurement groups present in the spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmissionType {
    Flaring,
    ColdVentilation,
    DieselFuel,
    FuelGas,
}

/// Column indices of one emission type's measurement group.
struct ColumnMap {
    volume: usize,
    volume_uom: usize,
    mass: usize,
    mass_uom: usize,
}

impl EmissionType {
    /// All emission types, in spreadsheet column order.
    pub const ALL: [EmissionType; 4] = [
        EmissionType::Flaring,
        EmissionType::ColdVentilation,
        EmissionType::DieselFuel,
        EmissionType::FuelGas,
    ];

    /// The type name used for node types and external ID derivation.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EmissionType::Flaring => "Flaring",
            EmissionType::ColdVentilation => "ColdVentilation",
            EmissionType::DieselFuel => "DieselFuel",
            EmissionType::FuelGas => "FuelGas",
        }
    }

    /// Column offsets of this type's volume/mass group in a data row.
    fn columns(self) -> ColumnMap {
        match self {
            EmissionType::Flaring => ColumnMap {
                volume: 5,
                volume_uom: 6,
                mass: 7,
                mass_uom: 8,
            },
            EmissionType::ColdVentilation => ColumnMap {
                volume: 9,
                volume_uom: 10,
                mass: 11,
                mass_uom: 12,
            },
            EmissionType::DieselFuel => ColumnMap {
                volume: 13,
                volume_uom: 14,
                mass: 15,
                mass_uom: 16,
            },
            EmissionType::FuelGas => ColumnMap {
                volume: 17,
                volume_uom: 18,
                mass: 19,
                mass_uom: 20,
            },
        }
    }
}

/// The complete set of graph entities produced from one CSV file.
#[derive(Debug, Default)]
pub struct GraphPayload {
    /// Nodes in emission order: wells, emissions containers, emission
    /// types, then measurement nodes.
    pub nodes: Vec<Node>,
    /// Relationships in emission order: containment first, then date chains.
    pub relationships: Vec<Relationship>,
}

/// One dated measurement extracted from a row.
struct DateEntry {
    well_key: String,
    emission_type: EmissionType,
    date: String,
    properties: Vec<Property>,
}

/// Per-well bookkeeping collected during the first pass.
struct WellInfo {
    name: String,
    emissions_id: String,
    /// External IDs of the four EmissionType nodes, keyed by type.
    type_ids: HashMap<EmissionType, String>,
}

/// Builds the graph payload from emission records.
///
/// `source_name` is the input file name, recorded as measurement metadata;
/// `verified_time` is the run timestamp in ISO 8601 format.
///
/// Rows with a blank well key or an incomplete date are skipped with a
/// warning; non-numeric volume/mass values are dropped individually. A row
/// contributes a measurement node only when at least one of volume or mass
/// parses.
#[must_use]
pub fn build_graph(
    records: &[EmissionRecord],
    source_name: &str,
    verified_time: &str,
) -> GraphPayload {
    // Group rows by well key, preserving first-seen well order.
    let mut well_order: Vec<String> = Vec::new();
    let mut wells: HashMap<String, Vec<&EmissionRecord>> = HashMap::new();
    for record in records {
        if record.well_key.is_empty() {
            warn!("skipping row with blank well key (name={:?})", record.name);
            continue;
        }
        if !wells.contains_key(&record.well_key) {
            well_order.push(record.well_key.clone());
        }
        wells.entry(record.well_key.clone()).or_default().push(record);
    }

    let mut well_info: Vec<(String, WellInfo)> = Vec::new();
    let mut date_entries: Vec<DateEntry> = Vec::new();

    for well_key in &well_order {
        let rows = &wells[well_key];
        let name = rows
            .first()
            .map(|r| r.name.clone())
            .unwrap_or_else(|| well_key.clone());

        let mut type_ids = HashMap::new();
        for emission_type in EmissionType::ALL {
            let type_id = external_id(
                well_key,
                &format!("emission_type_{}", emission_type.name()),
                "",
            );
            type_ids.insert(emission_type, type_id);

            for row in rows.iter().copied() {
                if let Some(entry) =
                    extract_entry(row, emission_type, source_name, verified_time)
                {
                    date_entries.push(entry);
                }
            }
        }

        well_info.push((
            well_key.clone(),
            WellInfo {
                name,
                emissions_id: external_id(well_key, "emissions", ""),
                type_ids,
            },
        ));
    }

    // Most recent measurement first within each (well, type) group.
    date_entries.sort_by(|a, b| {
        (&b.well_key, b.emission_type.name(), &b.date).cmp(&(
            &a.well_key,
            a.emission_type.name(),
            &a.date,
        ))
    });

    let mut payload = GraphPayload::default();
    build_nodes(&mut payload, &well_info, &date_entries);
    build_relationships(&mut payload, &well_info, &date_entries);
    payload
}

/// Extracts one measurement entry from a row, or `None` if the row has no
/// usable data for this emission type.
fn extract_entry(
    row: &EmissionRecord,
    emission_type: EmissionType,
    source_name: &str,
    verified_time: &str,
) -> Option<DateEntry> {
    let date = match date_string(&row.year, &row.month, &row.day) {
        Some(date) => date,
        None => {
            warn!(
                "skipping row for well {:?}: incomplete date ({:?}-{:?}-{:?})",
                row.well_key, row.year, row.month, row.day
            );
            return None;
        }
    };

    let columns = emission_type.columns();
    let volume = parse_measurement(row.column(columns.volume), "volume");
    let mass = parse_measurement(row.column(columns.mass), "mass");
    if volume.is_none() && mass.is_none() {
        return None;
    }

    let mut properties = vec![Property::string("date", &date)];
    if let Some(volume) = volume {
        let metadata = row
            .column(columns.volume_uom)
            .map(|uom| PropertyMetadata::for_units(uom, source_name, verified_time));
        properties.push(Property::number("volume", volume, metadata));
    }
    if let Some(mass) = mass {
        let metadata = row
            .column(columns.mass_uom)
            .map(|uom| PropertyMetadata::for_units(uom, source_name, verified_time));
        properties.push(Property::number("mass", mass, metadata));
    }

    Some(DateEntry {
        well_key: row.well_key.clone(),
        emission_type,
        date,
        properties,
    })
}

/// Parses a measurement column as f64, warning and dropping the value when
/// it is present but non-numeric.
fn parse_measurement(raw: Option<&str>, what: &str) -> Option<f64> {
    let raw = raw?;
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("could not convert {} {:?} to number, skipping", what, raw);
            None
        }
    }
}

fn build_nodes(
    payload: &mut GraphPayload,
    well_info: &[(String, WellInfo)],
    date_entries: &[DateEntry],
) {
    for (well_key, info) in well_info {
        payload.nodes.push(Node {
            external_id: well_key.clone(),
            kind: "Well".to_string(),
            labels: Vec::new(),
            properties: vec![Property::string("name", &info.name)],
        });
    }

    for (_, info) in well_info {
        payload.nodes.push(Node {
            external_id: info.emissions_id.clone(),
            kind: "Emissions".to_string(),
            labels: Vec::new(),
            properties: vec![Property::string("name", "Emissions")],
        });
    }

    for (_, info) in well_info {
        for emission_type in EmissionType::ALL {
            payload.nodes.push(Node {
                external_id: info.type_ids[&emission_type].clone(),
                kind: "EmissionType".to_string(),
                labels: Vec::new(),
                properties: vec![Property::string("name", emission_type.name())],
            });
        }
    }

    for entry in date_entries {
        payload.nodes.push(Node {
            external_id: external_id(&entry.well_key, entry.emission_type.name(), &entry.date),
            kind: entry.emission_type.name().to_string(),
            labels: vec!["Emission".to_string()],
            properties: entry.properties.clone(),
        });
    }
}

fn build_relationships(
    payload: &mut GraphPayload,
    well_info: &[(String, WellInfo)],
    date_entries: &[DateEntry],
) {
    for (well_key, info) in well_info {
        payload.relationships.push(Relationship::new(
            NodeRef::new("Well", well_key),
            NodeRef::new("Emissions", &info.emissions_id),
            "HAS_EMISSIONS",
        ));
    }

    for (_, info) in well_info {
        for emission_type in EmissionType::ALL {
            payload.relationships.push(Relationship::new(
                NodeRef::new("Emissions", &info.emissions_id),
                NodeRef::new("EmissionType", &info.type_ids[&emission_type]),
                "HAS_TYPE",
            ));
        }
    }

    // Chain measurement nodes per (well, type) group in sorted order: the
    // first node hangs off the EmissionType, each subsequent node off its
    // predecessor.
    let type_ids: HashMap<(&str, EmissionType), &str> = well_info
        .iter()
        .flat_map(|(well_key, info)| {
            info.type_ids
                .iter()
                .map(move |(t, id)| ((well_key.as_str(), *t), id.as_str()))
        })
        .collect();

    let mut chain_heads: HashMap<(String, EmissionType), String> = HashMap::new();
    for entry in date_entries {
        let node_id = external_id(&entry.well_key, entry.emission_type.name(), &entry.date);
        let key = (entry.well_key.clone(), entry.emission_type);
        let type_name = entry.emission_type.name();

        match chain_heads.get(&key) {
            None => {
                let type_id = type_ids[&(entry.well_key.as_str(), entry.emission_type)];
                payload.relationships.push(Relationship::new(
                    NodeRef::new("EmissionType", type_id),
                    NodeRef::new(type_name, &node_id),
                    "HAS_DATA",
                ));
            }
            Some(previous) => {
                payload.relationships.push(Relationship::new(
                    NodeRef::new(type_name, previous),
                    NodeRef::new(type_name, &node_id),
                    "NEXT_DATE",
                ));
            }
        }
        chain_heads.insert(key, node_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a 21-column row for one well/date with Flaring volume+mass
    /// and everything else blank.
    fn flaring_row(name: &str, key: &str, ymd: (&str, &str, &str), vol: &str, mass: &str) -> EmissionRecord {
        let mut row = vec![String::new(); 21];
        row[0] = name.to_string();
        row[1] = key.to_string();
        row[2] = ymd.0.to_string();
        row[3] = ymd.1.to_string();
        row[4] = ymd.2.to_string();
        row[5] = vol.to_string();
        row[6] = "m3".to_string();
        row[7] = mass.to_string();
        row[8] = "t".to_string();
        EmissionRecord::from_row(row)
    }

    #[test]
    fn builds_well_emissions_and_type_nodes() {
        let records = vec![flaring_row("Well A", "W-001", ("2024", "1", "15"), "1.5", "2.0")];
        let payload = build_graph(&records, "test.csv", "2024-01-01T00:00:00Z");

        // 1 Well + 1 Emissions + 4 EmissionType + 1 measurement
        assert_eq!(payload.nodes.len(), 7);
        assert_eq!(payload.nodes[0].kind, "Well");
        assert_eq!(payload.nodes[0].external_id, "W-001");
        assert_eq!(payload.nodes[1].kind, "Emissions");
        assert_eq!(
            payload.nodes.iter().filter(|n| n.kind == "EmissionType").count(),
            4
        );

        let measurement = payload.nodes.last().unwrap();
        assert_eq!(measurement.kind, "Flaring");
        assert_eq!(measurement.labels, vec!["Emission".to_string()]);
        assert_eq!(measurement.properties[0].kind, "date");
        assert_eq!(
            measurement.properties[0].value,
            serde_json::json!("2024-01-15")
        );
    }

    #[test]
    fn containment_relationships_present() {
        let records = vec![flaring_row("Well A", "W-001", ("2024", "1", "15"), "1.5", "2.0")];
        let payload = build_graph(&records, "test.csv", "2024-01-01T00:00:00Z");

        let kinds: Vec<&str> = payload
            .relationships
            .iter()
            .map(|r| r.kind.as_str())
            .collect();
        assert_eq!(kinds.iter().filter(|k| **k == "HAS_EMISSIONS").count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == "HAS_TYPE").count(), 4);
        assert_eq!(kinds.iter().filter(|k| **k == "HAS_DATA").count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == "NEXT_DATE").count(), 0);
    }

    #[test]
    fn date_chain_runs_most_recent_first() {
        let records = vec![
            flaring_row("Well A", "W-001", ("2024", "1", "15"), "1.0", ""),
            flaring_row("Well A", "W-001", ("2024", "2", "15"), "2.0", ""),
            flaring_row("Well A", "W-001", ("2024", "3", "15"), "3.0", ""),
        ];
        let payload = build_graph(&records, "test.csv", "2024-01-01T00:00:00Z");

        let chain: Vec<&Relationship> = payload
            .relationships
            .iter()
            .filter(|r| r.kind == "NEXT_DATE" || r.kind == "HAS_DATA")
            .collect();
        assert_eq!(chain.len(), 3);

        // HAS_DATA points at the most recent date
        let march = external_id("W-001", "Flaring", "2024-03-15");
        let feb = external_id("W-001", "Flaring", "2024-02-15");
        let jan = external_id("W-001", "Flaring", "2024-01-15");
        assert_eq!(chain[0].kind, "HAS_DATA");
        assert_eq!(chain[0].target.external_id, march);
        assert_eq!(chain[1].source.external_id, march);
        assert_eq!(chain[1].target.external_id, feb);
        assert_eq!(chain[2].source.external_id, feb);
        assert_eq!(chain[2].target.external_id, jan);
    }

    #[test]
    fn skips_blank_well_keys_and_unparsable_values() {
        let records = vec![
            flaring_row("No key", "", ("2024", "1", "15"), "1.0", "2.0"),
            flaring_row("Well A", "W-001", ("2024", "1", "15"), "abc", "2.0"),
        ];
        let payload = build_graph(&records, "test.csv", "2024-01-01T00:00:00Z");

        // Only W-001 contributes; its measurement keeps mass but drops the
        // non-numeric volume.
        assert_eq!(payload.nodes.iter().filter(|n| n.kind == "Well").count(), 1);
        let measurement = payload.nodes.last().unwrap();
        assert_eq!(measurement.kind, "Flaring");
        let prop_kinds: Vec<&str> = measurement
            .properties
            .iter()
            .map(|p| p.kind.as_str())
            .collect();
        assert_eq!(prop_kinds, vec!["date", "mass"]);
    }

    #[test]
    fn row_without_measurements_yields_no_node() {
        let records = vec![flaring_row("Well A", "W-001", ("2024", "1", "15"), "", "")];
        let payload = build_graph(&records, "test.csv", "2024-01-01T00:00:00Z");
        assert!(payload.nodes.iter().all(|n| n.kind != "Flaring"));
        assert!(payload.relationships.iter().all(|r| r.kind != "HAS_DATA"));
    }

    #[test]
    fn measurement_metadata_carries_units_and_source() {
        let records = vec![flaring_row("Well A", "W-001", ("2024", "1", "15"), "1.5", "")];
        let payload = build_graph(&records, "emissions.csv", "2024-06-01T12:00:00Z");

        let measurement = payload.nodes.last().unwrap();
        let volume = measurement
            .properties
            .iter()
            .find(|p| p.kind == "volume")
            .unwrap();
        let metadata = volume.metadata.as_ref().unwrap();
        assert_eq!(metadata.custom_metadata["units"], "m3");
        assert_eq!(metadata.source, "emissions.csv");
        assert_eq!(metadata.verified_time, "2024-06-01T12:00:00Z");
    }
}
