use crate::admin::containers::ContainerIndex;
use crate::admin::site::ModelAdmin;
use crate::core::actions::BarcodeAction;
use crate::domain::model::{DnaLibrarySource, Record, RecordType};
use crate::domain::ports::RecordStore;
use crate::utils::error::{LimsError, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

pub const PAGE_PARAM: &str = "p";
pub const EDIT_PARAM: &str = "e";

/// Query parameters of a change-list request.
#[derive(Debug, Clone, Default)]
pub struct ChangeListRequest {
    params: BTreeMap<String, String>,
}

impl ChangeListRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn page(self, page: usize) -> Self {
        self.param(PAGE_PARAM, &page.to_string())
    }

    pub fn editable(self) -> Self {
        self.param(EDIT_PARAM, "")
    }

    fn filter_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter(|(k, _)| k.as_str() != PAGE_PARAM && k.as_str() != EDIT_PARAM)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for ChangeListRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChoices {
    pub title: String,
    pub parameter: String,
    pub choices: Vec<(String, String)>,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u64,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ChangeList {
    pub record_type: RecordType,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    /// Matching records across all pages.
    pub total: usize,
    pub page: usize,
    pub num_pages: usize,
    pub editable: Vec<&'static str>,
    pub filters: Vec<FilterChoices>,
    /// `(name, description)` of the barcode actions.
    pub actions: Vec<(String, String)>,
}

fn plain(value: Option<serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn container_cell(
    index: &ContainerIndex,
    store_apparatus: &[Record],
    column: &str,
    record: &Record,
) -> Option<String> {
    let id = record.id;
    let name_of = |apparatus: Option<u64>| {
        apparatus
            .map(|a| {
                store_apparatus
                    .iter()
                    .find(|r| r.id == a)
                    .map(Record::display_name)
                    .unwrap_or_else(|| a.to_string())
            })
            .unwrap_or_default()
    };
    match column {
        "root_apparatus" => Some(name_of(index.root_apparatus(id))),
        "root_apparatus_subdivision" => Some(
            index
                .root_apparatus_subdivision(id)
                .map(|s| s.to_string())
                .unwrap_or_default(),
        ),
        "get_nr_children" => Some(index.nr_children(id).to_string()),
        "nr_objects_in_container" => Some(index.nr_objects_in_container(id).to_string()),
        "is_empty" => Some(if index.is_empty(id) { "True" } else { "False" }.to_string()),
        _ => None,
    }
}

/// `source` cells of a DNA library page, keyed by library id. A library
/// without exactly one source gets an empty cell.
async fn library_sources(
    records: &[Record],
    store: &dyn RecordStore,
) -> Result<HashMap<u64, String>> {
    let mut cells = HashMap::with_capacity(records.len());
    for record in records {
        let cell = match DnaLibrarySource::from_record(record) {
            Some(source) => {
                let kind = source.record_type();
                match store.get(kind, source.id()).await? {
                    Some(found) => format!("{}: {}", kind.verbose_name(), found.display_name()),
                    None => {
                        warn!(
                            id = record.id,
                            source = source.id(),
                            %kind,
                            "DNA library source not found"
                        );
                        format!("{}: {}", kind.verbose_name(), source.id())
                    }
                }
            }
            None => {
                warn!(
                    id = record.id,
                    "DNA library needs exactly one of amplicon, sag or pure_culture"
                );
                String::new()
            }
        };
        cells.insert(record.id, cell);
    }
    Ok(cells)
}

impl ChangeList {
    pub async fn build(
        admin: &ModelAdmin,
        request: &ChangeListRequest,
        store: &dyn RecordStore,
        actions: &[BarcodeAction],
    ) -> Result<Self> {
        let specs: Vec<_> = admin
            .list_filter
            .iter()
            .map(|spec| spec.build(admin.record_type))
            .collect();

        for (key, value) in request.filter_params() {
            if !specs.iter().any(|f| f.parameter_name() == key) {
                return Err(LimsError::InvalidConfigValueError {
                    field: "filter".to_string(),
                    value: format!("{}={}", key, value),
                    reason: format!("{} has no filter '{}'", admin.record_type, key),
                });
            }
        }

        let mut records = store.all(admin.record_type).await?;
        let mut filters = Vec::with_capacity(specs.len());
        for filter in &specs {
            let selected = request.params.get(filter.parameter_name()).cloned();
            if let Some(value) = selected.as_deref().filter(|v| !v.is_empty()) {
                records = filter.apply(value, records, store).await?;
            }
            filters.push(FilterChoices {
                title: filter.title().to_string(),
                parameter: filter.parameter_name().to_string(),
                choices: filter.lookups(store).await?,
                selected,
            });
        }
        records.sort_by_key(|r| r.id);

        let total = records.len();
        let per_page = admin.list_per_page.max(1);
        let num_pages = total.div_ceil(per_page).max(1);
        let page = match request.params.get(PAGE_PARAM) {
            Some(p) => p.parse::<usize>().map_err(|_| LimsError::InvalidConfigValueError {
                field: PAGE_PARAM.to_string(),
                value: p.clone(),
                reason: "Page must be a number".to_string(),
            })?,
            None => 0,
        };
        if page >= num_pages {
            return Err(LimsError::InvalidConfigValueError {
                field: PAGE_PARAM.to_string(),
                value: page.to_string(),
                reason: format!(
                    "Page out of range, {} has {} page(s)",
                    admin.record_type, num_pages
                ),
            });
        }
        let page_records: Vec<Record> = records
            .into_iter()
            .skip(page * per_page)
            .take(per_page)
            .collect();

        let sources = if admin.list_display.contains(&"source")
            && admin.record_type == RecordType::DnaLibrary
        {
            library_sources(&page_records, store).await?
        } else {
            HashMap::new()
        };

        let container_data = if admin.record_type == RecordType::Container {
            Some((
                ContainerIndex::load(store).await?,
                store.all(RecordType::Apparatus).await?,
            ))
        } else {
            None
        };

        let rows = page_records
            .iter()
            .map(|record| Row {
                id: record.id,
                cells: admin
                    .list_display
                    .iter()
                    .map(|column| {
                        if *column == "__str__" {
                            return record.display_name();
                        }
                        if *column == "source" {
                            if let Some(source) = sources.get(&record.id) {
                                return source.clone();
                            }
                        }
                        container_data
                            .as_ref()
                            .and_then(|(index, apparatus)| {
                                container_cell(index, apparatus, column, record)
                            })
                            .unwrap_or_else(|| plain(record.get(column)))
                    })
                    .collect(),
            })
            .collect();

        let editable = if request.params.contains_key(EDIT_PARAM) {
            admin.editable_fields.clone()
        } else {
            Vec::new()
        };

        Ok(ChangeList {
            record_type: admin.record_type,
            headers: admin
                .list_display
                .iter()
                .map(|c| admin.column_label(c))
                .collect(),
            rows,
            total,
            page,
            num_pages,
            editable,
            filters,
            actions: actions
                .iter()
                .map(|a| (a.name(), a.description()))
                .collect(),
        })
    }

    /// Tab-separated rendering: header line, then one line per row.
    pub fn to_tsv(&self) -> String {
        let mut lines = vec![self.headers.join("\t")];
        lines.extend(self.rows.iter().map(|r| r.cells.join("\t")));
        lines.join("\n")
    }
}
