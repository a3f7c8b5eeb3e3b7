//! Junction rows and the vertices derived from them

use crate::error::{ExtractError, ExtractResult};
use crate::geometry::{format_point, parse_point};
use geo_types::Point;
use serde::Serialize;

/// A row read from the junction table
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionRow {
    /// Source-side junction identifier
    pub junction_id: String,
    /// Junction geometry as WKT
    pub geom: String,
}

impl JunctionRow {
    pub fn new(junction_id: impl Into<String>, geom: impl Into<String>) -> Self {
        Self {
            junction_id: junction_id.into(),
            geom: geom.into(),
        }
    }
}

/// A junction with its assigned vertex id and parsed coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub vertex_id: u64,
    pub junction_id: String,
    /// Geometry rewritten as `POINT (x y)`
    pub geom: String,
    pub point: Point<f64>,
}

impl Vertex {
    /// Build a vertex from a junction row, parsing its geometry
    pub fn from_junction(row: JunctionRow, vertex_id: u64) -> ExtractResult<Self> {
        let point =
            parse_point(&row.geom).map_err(|e| ExtractError::geometry(&row.junction_id, e))?;
        Ok(Self {
            vertex_id,
            junction_id: row.junction_id,
            geom: format_point(&point),
            point,
        })
    }

    pub fn mapping_record(&self) -> MappingRecord<'_> {
        MappingRecord {
            vertex_id: self.vertex_id,
            junction_id: &self.junction_id,
        }
    }

    pub fn compass_record(&self) -> CompassRecord {
        CompassRecord {
            vertex_id: self.vertex_id,
            x: self.point.x(),
            y: self.point.y(),
        }
    }

    pub fn lookup_record(&self) -> LookupRecord<'_> {
        LookupRecord {
            junction_id: &self.junction_id,
            geom: &self.geom,
            x: self.point.x(),
            y: self.point.y(),
            vertex_id: self.vertex_id,
        }
    }
}

/// Assign vertex ids `first_id..` to rows in order
pub fn assign_vertex_ids(rows: Vec<JunctionRow>, first_id: u64) -> ExtractResult<Vec<Vertex>> {
    rows.into_iter()
        .zip(first_id..)
        .map(|(row, vertex_id)| Vertex::from_junction(row, vertex_id))
        .collect()
}

/// `vertex_id,junction_id`
#[derive(Debug, Serialize)]
pub struct MappingRecord<'a> {
    pub vertex_id: u64,
    pub junction_id: &'a str,
}

/// `vertex_id,x,y`
#[derive(Debug, Serialize)]
pub struct CompassRecord {
    pub vertex_id: u64,
    pub x: f64,
    pub y: f64,
}

/// `junction_id,geom,x,y,vertex_id`: the source row followed by derived columns
#[derive(Debug, Serialize)]
pub struct LookupRecord<'a> {
    pub junction_id: &'a str,
    pub geom: &'a str,
    pub x: f64,
    pub y: f64,
    pub vertex_id: u64,
}
