use crate::admin::filters::FilterSpec;
use crate::domain::model::RecordType;

pub const DEFAULT_LIST_PER_PAGE: usize = 100;

/// Change-list configuration of one record type.
#[derive(Debug, Clone)]
pub struct ModelAdmin {
    pub record_type: RecordType,
    pub list_display: Vec<&'static str>,
    pub list_filter: Vec<FilterSpec>,
    pub readonly_fields: Vec<&'static str>,
    pub raw_id_fields: Vec<&'static str>,
    /// Editable only when the request asks for it.
    pub editable_fields: Vec<&'static str>,
    pub filter_horizontal: Vec<&'static str>,
    pub list_per_page: usize,
    /// Saving a record returns to the change list instead of the edit form.
    pub redirect_after_change: bool,
}

impl ModelAdmin {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            list_display: vec!["__str__"],
            list_filter: Vec::new(),
            readonly_fields: Vec::new(),
            raw_id_fields: Vec::new(),
            editable_fields: Vec::new(),
            filter_horizontal: Vec::new(),
            list_per_page: DEFAULT_LIST_PER_PAGE,
            redirect_after_change: false,
        }
    }

    pub fn list_display(mut self, columns: &[&'static str]) -> Self {
        self.list_display = columns.to_vec();
        self
    }

    pub fn list_filter(mut self, filters: &[FilterSpec]) -> Self {
        self.list_filter = filters.to_vec();
        self
    }

    pub fn readonly_fields(mut self, fields: &[&'static str]) -> Self {
        self.readonly_fields = fields.to_vec();
        self
    }

    pub fn raw_id_fields(mut self, fields: &[&'static str]) -> Self {
        self.raw_id_fields = fields.to_vec();
        self
    }

    pub fn editable_fields(mut self, fields: &[&'static str]) -> Self {
        self.editable_fields = fields.to_vec();
        self
    }

    pub fn filter_horizontal(mut self, fields: &[&'static str]) -> Self {
        self.filter_horizontal = fields.to_vec();
        self
    }

    pub fn list_per_page(mut self, n: usize) -> Self {
        self.list_per_page = n;
        self
    }

    pub fn redirect_after_change(mut self) -> Self {
        self.redirect_after_change = true;
        self
    }

    /// Column header shown above `column`.
    pub fn column_label(&self, column: &str) -> String {
        match column {
            "__str__" => self.record_type.verbose_name().to_string(),
            "get_nr_children" => "No of Children".to_string(),
            "source" => "Source".to_string(),
            other => other.to_string(),
        }
    }
}

const UID_READONLY: &[&str] = &["index_by_group", "uid"];

const SAMPLE_EDITABLES: &[&str] = &[
    "collaborator",
    "sample_type",
    "sample_location",
    "gps",
    "temperature",
    "ph",
    "salinity",
    "depth",
    "shipping_method",
    "container",
    "biosafety_level",
    "status",
];

#[derive(Debug, Clone)]
pub struct AdminSite {
    registry: Vec<ModelAdmin>,
}

impl AdminSite {
    pub fn new() -> Self {
        Self {
            registry: Vec::new(),
        }
    }

    pub fn register(&mut self, admin: ModelAdmin) {
        self.registry.retain(|a| a.record_type != admin.record_type);
        self.registry.push(admin);
    }

    pub fn get(&self, record_type: RecordType) -> Option<&ModelAdmin> {
        self.registry.iter().find(|a| a.record_type == record_type)
    }

    pub fn registered(&self) -> impl Iterator<Item = &ModelAdmin> {
        self.registry.iter()
    }

    /// Every LIMS record type with its list configuration.
    pub fn lims() -> Self {
        let mut site = AdminSite::new();

        for plain in [
            RecordType::Qpcr,
            RecordType::RtMda,
            RecordType::Apparatus,
            RecordType::ApparatusSubdivision,
            RecordType::ContainerType,
            RecordType::SampleType,
            RecordType::SampleLocation,
        ] {
            site.register(ModelAdmin::new(plain));
        }

        site.register(
            ModelAdmin::new(RecordType::Amplicon)
                .list_display(&[
                    "id",
                    "uid",
                    "sample",
                    "extracted_dna",
                    "index_by_group",
                    "diversity_report",
                    "container",
                    "buffer",
                    "notes",
                ])
                .readonly_fields(UID_READONLY),
        );

        site.register(
            ModelAdmin::new(RecordType::Container)
                .list_filter(&[
                    FilterSpec::Field("type"),
                    FilterSpec::ContainerApparatus,
                    FilterSpec::ContainerIsEmpty,
                ])
                .list_display(&[
                    "id",
                    "barcode",
                    "root_apparatus",
                    "root_apparatus_subdivision",
                    "type",
                    "row",
                    "column",
                    "parent",
                    "get_nr_children",
                    "nr_objects_in_container",
                    "is_empty",
                ])
                .raw_id_fields(&["parent"])
                .list_per_page(10),
        );

        let mut sample_columns = vec!["id", "uid", "barcode"];
        sample_columns.extend_from_slice(SAMPLE_EDITABLES);
        site.register(
            ModelAdmin::new(RecordType::Sample)
                .list_display(&sample_columns)
                .editable_fields(SAMPLE_EDITABLES)
                .raw_id_fields(&["container"])
                .redirect_after_change(),
        );

        site.register(ModelAdmin::new(RecordType::Collaborator).list_display(&[
            "id",
            "first_name",
            "last_name",
            "institution",
            "phone",
            "email",
        ]));

        site.register(
            ModelAdmin::new(RecordType::ExtractedCell)
                .list_display(&[
                    "id",
                    "uid",
                    "barcode",
                    "sample",
                    "protocol",
                    "index_by_group",
                    "container",
                    "notes",
                ])
                .readonly_fields(UID_READONLY),
        );

        site.register(
            ModelAdmin::new(RecordType::ExtractedDna)
                .list_display(&[
                    "id",
                    "uid",
                    "barcode",
                    "sample",
                    "protocol",
                    "index_by_group",
                    "container",
                    "concentration",
                    "buffer",
                    "notes",
                ])
                .readonly_fields(UID_READONLY),
        );

        site.register(
            ModelAdmin::new(RecordType::SagPlate)
                .list_display(&[
                    "id",
                    "uid",
                    "barcode",
                    "extracted_cell",
                    "apparatus_subdivision",
                    "protocol",
                    "report",
                    "qpcr",
                    "rt_mda",
                    "notes",
                ])
                .readonly_fields(UID_READONLY),
        );

        site.register(
            ModelAdmin::new(RecordType::SagPlateDilution)
                .list_display(&["id", "uid", "barcode", "sag_plate", "qpcr", "dilution"])
                .readonly_fields(UID_READONLY),
        );

        site.register(
            ModelAdmin::new(RecordType::DnaLibrary)
                .list_display(&[
                    "id",
                    "uid",
                    "amplicon",
                    "metagenome",
                    "sag",
                    "pure_culture",
                    "source",
                    "buffer",
                    "i7",
                    "i5",
                    "sample_name_on_platform",
                    "container",
                ])
                .readonly_fields(UID_READONLY),
        );

        site.register(ModelAdmin::new(RecordType::Primer).list_display(&[
            "id",
            "concentration",
            "tmelt",
            "container",
            "stock",
        ]));

        site.register(ModelAdmin::new(RecordType::Metagenome).list_display(&[
            "id",
            "uid",
            "extracted_dna",
            "diversity_report",
        ]));

        site.register(ModelAdmin::new(RecordType::Sag).list_display(&[
            "id",
            "uid",
            "sag_plate",
            "sag_plate_dilution",
            "well",
            "concentration",
        ]));

        site.register(ModelAdmin::new(RecordType::DnaFromPureCulture).list_display(&[
            "id",
            "uid",
            "extracted_dna",
            "concentration",
        ]));

        site.register(
            ModelAdmin::new(RecordType::SequencingRun)
                .list_display(&[
                    "id",
                    "uid",
                    "date",
                    "sequencing_center",
                    "machine",
                    "report",
                    "folder",
                    "notes",
                    "protocol",
                ])
                .filter_horizontal(&["dna_library"]),
        );

        site.register(ModelAdmin::new(RecordType::ReadFile).list_display(&[
            "id",
            "filename",
            "pair",
            "lane",
            "read_count",
            "dna_library",
            "sequencing_run",
        ]));

        site.register(ModelAdmin::new(RecordType::Protocol).list_display(&[
            "name", "revision", "link", "notes",
        ]));

        site
    }
}

impl Default for AdminSite {
    fn default() -> Self {
        Self::lims()
    }
}
