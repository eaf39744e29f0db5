use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::LimsError;

/// The LIMS entities. Stands in for a content-type lookup: bindings and
/// admin registrations name one of these instead of a runtime model class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Sample,
    SampleType,
    SampleLocation,
    Collaborator,
    Protocol,
    Apparatus,
    ApparatusSubdivision,
    Container,
    ContainerType,
    ExtractedCell,
    ExtractedDna,
    Qpcr,
    RtMda,
    SagPlate,
    SagPlateDilution,
    DnaLibrary,
    SequencingRun,
    Metagenome,
    Primer,
    Amplicon,
    Sag,
    DnaFromPureCulture,
    ReadFile,
}

impl RecordType {
    pub const ALL: [RecordType; 23] = [
        RecordType::Sample,
        RecordType::SampleType,
        RecordType::SampleLocation,
        RecordType::Collaborator,
        RecordType::Protocol,
        RecordType::Apparatus,
        RecordType::ApparatusSubdivision,
        RecordType::Container,
        RecordType::ContainerType,
        RecordType::ExtractedCell,
        RecordType::ExtractedDna,
        RecordType::Qpcr,
        RecordType::RtMda,
        RecordType::SagPlate,
        RecordType::SagPlateDilution,
        RecordType::DnaLibrary,
        RecordType::SequencingRun,
        RecordType::Metagenome,
        RecordType::Primer,
        RecordType::Amplicon,
        RecordType::Sag,
        RecordType::DnaFromPureCulture,
        RecordType::ReadFile,
    ];

    /// Key used in config files, record file names and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            RecordType::Sample => "sample",
            RecordType::SampleType => "sample_type",
            RecordType::SampleLocation => "sample_location",
            RecordType::Collaborator => "collaborator",
            RecordType::Protocol => "protocol",
            RecordType::Apparatus => "apparatus",
            RecordType::ApparatusSubdivision => "apparatus_subdivision",
            RecordType::Container => "container",
            RecordType::ContainerType => "container_type",
            RecordType::ExtractedCell => "extracted_cell",
            RecordType::ExtractedDna => "extracted_dna",
            RecordType::Qpcr => "qpcr",
            RecordType::RtMda => "rt_mda",
            RecordType::SagPlate => "sag_plate",
            RecordType::SagPlateDilution => "sag_plate_dilution",
            RecordType::DnaLibrary => "dna_library",
            RecordType::SequencingRun => "sequencing_run",
            RecordType::Metagenome => "metagenome",
            RecordType::Primer => "primer",
            RecordType::Amplicon => "amplicon",
            RecordType::Sag => "sag",
            RecordType::DnaFromPureCulture => "dna_from_pure_culture",
            RecordType::ReadFile => "read_file",
        }
    }

    pub fn verbose_name(self) -> &'static str {
        match self {
            RecordType::Sample => "Sample",
            RecordType::SampleType => "SampleType",
            RecordType::SampleLocation => "SampleLocation",
            RecordType::Collaborator => "Collaborator",
            RecordType::Protocol => "Protocol",
            RecordType::Apparatus => "Apparatus",
            RecordType::ApparatusSubdivision => "ApparatusSubdivision",
            RecordType::Container => "Container",
            RecordType::ContainerType => "ContainerType",
            RecordType::ExtractedCell => "ExtractedCell",
            RecordType::ExtractedDna => "ExtractedDNA",
            RecordType::Qpcr => "QPCR",
            RecordType::RtMda => "RTMDA",
            RecordType::SagPlate => "SAGPlate",
            RecordType::SagPlateDilution => "SAGPlateDilution",
            RecordType::DnaLibrary => "DNALibrary",
            RecordType::SequencingRun => "SequencingRun",
            RecordType::Metagenome => "Metagenome",
            RecordType::Primer => "Primer",
            RecordType::Amplicon => "Amplicon",
            RecordType::Sag => "SAG",
            RecordType::DnaFromPureCulture => "DNAFromPureCulture",
            RecordType::ReadFile => "ReadFile",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RecordType {
    type Err = LimsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .iter()
            .copied()
            .find(|t| t.key() == s)
            .ok_or_else(|| LimsError::UnknownRecordTypeError {
                name: s.to_string(),
            })
    }
}

/// A persisted LIMS row. Relations hold the related record's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub record_type: RecordType,
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Record {
    pub fn new(record_type: RecordType, id: u64) -> Self {
        Self {
            id,
            record_type,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Field lookup; `id` resolves to the primary key.
    pub fn get(&self, name: &str) -> Option<serde_json::Value> {
        if name == "id" {
            return Some(serde_json::Value::from(self.id));
        }
        self.fields.get(name).cloned()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// Id of a related record. Accepts numbers and numeric strings, since
    /// CSV-loaded records carry every cell as text.
    pub fn ref_id(&self, name: &str) -> Option<u64> {
        match self.fields.get(name)? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Short human label, the way an admin list shows an object.
    pub fn display_name(&self) -> String {
        ["barcode", "uid", "name"]
            .iter()
            .find_map(|f| self.get_str(f).filter(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!("{} object ({})", self.record_type.verbose_name(), self.id)
            })
    }
}

/// What a DNA library was prepared from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnaLibrarySource {
    Amplicon(u64),
    Sag(u64),
    PureCulture(u64),
}

impl DnaLibrarySource {
    /// Exactly one of `amplicon`, `sag` or `pure_culture` must be set.
    pub fn from_record(record: &Record) -> Option<Self> {
        if record.record_type != RecordType::DnaLibrary {
            return None;
        }
        let candidates = [
            record.ref_id("amplicon").map(DnaLibrarySource::Amplicon),
            record.ref_id("sag").map(DnaLibrarySource::Sag),
            record.ref_id("pure_culture").map(DnaLibrarySource::PureCulture),
        ];
        let mut set = candidates.into_iter().flatten();
        match (set.next(), set.next()) {
            (Some(source), None) => Some(source),
            _ => None,
        }
    }

    pub fn record_type(self) -> RecordType {
        match self {
            DnaLibrarySource::Amplicon(_) => RecordType::Amplicon,
            DnaLibrarySource::Sag(_) => RecordType::Sag,
            DnaLibrarySource::PureCulture(_) => RecordType::DnaFromPureCulture,
        }
    }

    pub fn id(self) -> u64 {
        match self {
            DnaLibrarySource::Amplicon(id)
            | DnaLibrarySource::Sag(id)
            | DnaLibrarySource::PureCulture(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTemplate {
    pub id: u64,
    pub name: String,
    pub template: String,
    pub nr_fields: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Printer {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterBinding {
    pub id: u64,
    pub record_type: RecordType,
    pub template: u64,
    pub printer: u64,
    /// Whitespace-separated record field names, in placeholder order.
    pub fields: String,
}

impl PrinterBinding {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.split_whitespace().collect()
    }
}

/// Templates, printers and bindings as loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub templates: Vec<LabelTemplate>,
    pub printers: Vec<Printer>,
    pub bindings: Vec<PrinterBinding>,
}

impl Catalog {
    pub fn template(&self, id: u64) -> Option<&LabelTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn printer(&self, id: u64) -> Option<&Printer> {
        self.printers.iter().find(|p| p.id == id)
    }

    pub fn bindings_for(&self, record_type: RecordType) -> Vec<&PrinterBinding> {
        let mut bindings: Vec<&PrinterBinding> = self
            .bindings
            .iter()
            .filter(|b| b.record_type == record_type)
            .collect();
        bindings.sort_by_key(|b| b.id);
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_keys_round_trip() {
        for t in RecordType::ALL {
            assert_eq!(t.key().parse::<RecordType>().unwrap(), t);
        }
        assert!("lims_sample".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_record_type_serde_matches_key() {
        let json = serde_json::to_string(&RecordType::DnaFromPureCulture).unwrap();
        assert_eq!(json, "\"dna_from_pure_culture\"");
    }

    #[test]
    fn test_ref_id_accepts_numeric_strings() {
        let record = Record::new(RecordType::Container, 3)
            .with_field("parent", "12")
            .with_field("apparatus", 4)
            .with_field("row", "A");
        assert_eq!(record.ref_id("parent"), Some(12));
        assert_eq!(record.ref_id("apparatus"), Some(4));
        assert_eq!(record.ref_id("row"), None);
        assert_eq!(record.ref_id("missing"), None);
    }

    #[test]
    fn test_display_name_prefers_barcode() {
        let labelled = Record::new(RecordType::Sample, 1).with_field("barcode", "S001");
        assert_eq!(labelled.display_name(), "S001");

        let bare = Record::new(RecordType::Qpcr, 9);
        assert_eq!(bare.display_name(), "QPCR object (9)");
    }

    #[test]
    fn test_dna_library_source_requires_exactly_one() {
        let from_sag = Record::new(RecordType::DnaLibrary, 1).with_field("sag", 5);
        assert_eq!(
            DnaLibrarySource::from_record(&from_sag),
            Some(DnaLibrarySource::Sag(5))
        );

        let ambiguous = from_sag.clone().with_field("amplicon", 2);
        assert_eq!(DnaLibrarySource::from_record(&ambiguous), None);

        let unset = Record::new(RecordType::DnaLibrary, 2);
        assert_eq!(DnaLibrarySource::from_record(&unset), None);
    }

    #[test]
    fn test_bindings_for_orders_by_id() {
        let binding = |id, record_type| PrinterBinding {
            id,
            record_type,
            template: 1,
            printer: 1,
            fields: "barcode".to_string(),
        };
        let catalog = Catalog {
            templates: vec![],
            printers: vec![],
            bindings: vec![
                binding(3, RecordType::Sample),
                binding(1, RecordType::Sample),
                binding(2, RecordType::Container),
            ],
        };
        let ids: Vec<u64> = catalog
            .bindings_for(RecordType::Sample)
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
