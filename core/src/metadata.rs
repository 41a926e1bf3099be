use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a drug needs a prescription. Serialized with the catalog's literal
/// values, `"Ya"` and `"Tidak"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prescription {
    #[serde(rename = "Ya")]
    Required,
    #[serde(rename = "Tidak")]
    NotRequired,
}

impl Prescription {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prescription::Required => "Ya",
            Prescription::NotRequired => "Tidak",
        }
    }
}

impl std::str::FromStr for Prescription {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ya" | "yes" | "true" => Ok(Prescription::Required),
            "tidak" | "no" | "false" => Ok(Prescription::NotRequired),
            other => Err(format!("expected Ya or Tidak, got {other:?}")),
        }
    }
}

/// Free-form tags; catalogs store them either as one string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tags {
    List(Vec<String>),
    Text(String),
}

impl Default for Tags {
    fn default() -> Self { Tags::Text(String::new()) }
}

/// One drug in the catalog, keyed by the same id as its corpus document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugRecord {
    pub id: String,
    pub nama_obat: String,
    #[serde(default)]
    pub nama_generik: String,
    #[serde(default)]
    pub golongan: String,
    #[serde(default)]
    pub indikasi: String,
    #[serde(default)]
    pub komposisi: String,
    #[serde(default)]
    pub dosis: String,
    #[serde(default)]
    pub efek_samping: String,
    #[serde(default)]
    pub kontraindikasi: String,
    #[serde(default)]
    pub produsen: String,
    #[serde(default)]
    pub tags: Tags,
    pub harga_min: u64,
    pub harga_max: u64,
    pub perlu_resep: Prescription,
}

/// Drug records by document id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: HashMap<String, DrugRecord>,
}

impl Catalog {
    /// Rejects duplicate ids and inverted price ranges.
    pub fn from_records(records: Vec<DrugRecord>) -> Result<Self, String> {
        let mut map = HashMap::with_capacity(records.len());
        for record in records {
            if record.harga_min > record.harga_max {
                return Err(format!(
                    "record {} has harga_min {} above harga_max {}",
                    record.id, record.harga_min, record.harga_max
                ));
            }
            if let Some(dup) = map.insert(record.id.clone(), record) {
                return Err(format!("duplicate record id {}", dup.id));
            }
        }
        Ok(Self { records: map })
    }

    pub fn get(&self, id: &str) -> Option<&DrugRecord> { self.records.get(id) }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

/// Optional constraints applied to ranked results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub prescription: Option<Prescription>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
}

impl SearchFilter {
    /// Price filters test range overlap: a drug priced 5 000–20 000 passes
    /// `min_price = 10 000`. A document without a record never satisfies a
    /// prescription filter and counts as priced 0–0.
    pub fn admits(&self, record: Option<&DrugRecord>) -> bool {
        if let Some(wanted) = self.prescription {
            if record.map(|r| r.perlu_resep) != Some(wanted) {
                return false;
            }
        }
        let (lo, hi) = record.map_or((0, 0), |r| (r.harga_min, r.harga_max));
        if self.min_price.is_some_and(|min| hi < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| lo > max) {
            return false;
        }
        true
    }
}
