//! Schema verification and repair of loaded config.
//!
//! A plugin upgrade may add fields to a record kind, and hand-edited files
//! may hold values of the wrong type. Verification walks every record,
//! inserts missing template fields and resets mistyped ones to their
//! defaults. Identity fields are never rewritten: a mistyped key is reported
//! and left for the operator.

use std::fmt;

use serde_json::Value;

use crate::document::{Collection, Document};
use crate::logging::{info, warn};
use crate::schema::{CollectionKind, Record};

/// Fields that index a record. Their values are never repaired.
pub const IDENTITY_FIELDS: [&str; 2] = ["key", "dict_key"];

/// Field holding a keyed record's own key.
pub const KEY_FIELD: &str = "key";

pub fn is_identity_field(field: &str) -> bool {
    IDENTITY_FIELDS.contains(&field)
}

/// The type of a config value, as compared during verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Whether a value of kind `found` may stand where `self` is expected.
    ///
    /// List-valued fields such as cookie values are also stored as a
    /// name-to-value mapping.
    pub fn accepts(self, found: Self) -> bool {
        self == found || (self == Self::Array && found == Self::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// Where a finding was made: a collection, and the record key for keyed
/// collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub collection: CollectionKind,
    pub key: Option<String>,
}

impl Location {
    pub fn record(collection: CollectionKind, key: &str) -> Self {
        Self {
            collection,
            key: Some(key.to_string()),
        }
    }

    pub fn flat(collection: CollectionKind) -> Self {
        Self {
            collection,
            key: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}[{}]", self.collection, key),
            None => write!(f, "{}", self.collection),
        }
    }
}

/// One thing verification noticed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A template field was missing and has been set to its default.
    Inserted { location: Location, field: String },
    /// A field had the wrong type and has been reset to its default.
    Repaired {
        location: Location,
        field: String,
        expected: ValueKind,
        found: ValueKind,
    },
    /// An identity field has the wrong type. Left unchanged.
    IdentityMismatch {
        location: Location,
        field: String,
        expected: ValueKind,
        found: ValueKind,
    },
    /// A record's `key` differs from the index it is stored under. Left
    /// unchanged.
    MisplacedKey { location: Location, key: String },
}

impl Finding {
    /// Whether the finding modified the document.
    pub fn is_change(&self) -> bool {
        !matches!(
            self,
            Self::IdentityMismatch { .. } | Self::MisplacedKey { .. }
        )
    }

    pub fn location(&self) -> &Location {
        match self {
            Self::Inserted { location, .. }
            | Self::Repaired { location, .. }
            | Self::IdentityMismatch { location, .. }
            | Self::MisplacedKey { location, .. } => location,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Inserted { field, .. }
            | Self::Repaired { field, .. }
            | Self::IdentityMismatch { field, .. } => field,
            Self::MisplacedKey { .. } => KEY_FIELD,
        }
    }
}

/// Result of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    findings: Vec<Finding>,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Whether anything in the document was modified.
    pub fn changed(&self) -> bool {
        self.findings.iter().any(Finding::is_change)
    }

    /// Number of insertions and repairs.
    pub fn changes(&self) -> usize {
        self.findings.iter().filter(|f| f.is_change()).count()
    }

    /// Findings that need a manual fix.
    pub fn identity_mismatches(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_change())
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }
}

/// Bring a single record in line with its template.
///
/// Missing fields are inserted with the template default. Mistyped fields
/// are reset, except identity fields, which are only reported. Fields that
/// are not in the template are left alone.
pub fn verify_record(
    record: &mut Record,
    template: &Record,
    location: &Location,
    report: &mut VerificationReport,
) {
    for (field, default) in template {
        let expected = ValueKind::of(default);
        let Some(found) = record.get(field).map(ValueKind::of) else {
            info!(%location, field = %field, "inserting missing config field");
            record.insert(field.clone(), default.clone());
            report.push(Finding::Inserted {
                location: location.clone(),
                field: field.clone(),
            });
            continue;
        };

        if expected.accepts(found) {
            continue;
        }

        if is_identity_field(field) {
            warn!(
                %location, field = %field, %expected, %found,
                "identity field has the wrong type, must be fixed manually"
            );
            report.push(Finding::IdentityMismatch {
                location: location.clone(),
                field: field.clone(),
                expected,
                found,
            });
        } else {
            warn!(
                %location, field = %field, %expected, %found,
                "config value has the wrong type, inserting default"
            );
            record.insert(field.clone(), default.clone());
            report.push(Finding::Repaired {
                location: location.clone(),
                field: field.clone(),
                expected,
                found,
            });
        }
    }
}

/// Verify every record of a keyed collection, including its `key` field.
///
/// A record without a key gets the key it is stored under. A key that is
/// not a string, or that names a different index, is reported and left
/// unchanged.
pub fn verify_collection(
    collection: &mut Collection,
    kind: CollectionKind,
    report: &mut VerificationReport,
) {
    let template = kind.template();
    for (index, record) in collection.iter_mut() {
        let location = Location::record(kind, index);

        match record.get(KEY_FIELD).map(ValueKind::of) {
            None => {
                info!(%location, "record has no key, using its index");
                record.insert(KEY_FIELD.to_string(), Value::String(index.clone()));
                report.push(Finding::Inserted {
                    location: location.clone(),
                    field: KEY_FIELD.to_string(),
                });
            }
            Some(ValueKind::String) => {
                let key = record.get(KEY_FIELD).and_then(Value::as_str).unwrap_or(index);
                if key != index {
                    warn!(
                        %location, %key,
                        "record key differs from its index, must be fixed manually"
                    );
                    report.push(Finding::MisplacedKey {
                        location: location.clone(),
                        key: key.to_string(),
                    });
                }
            }
            Some(found) => {
                warn!(
                    %location, %found,
                    "record key is not a string, must be fixed manually"
                );
                report.push(Finding::IdentityMismatch {
                    location: location.clone(),
                    field: KEY_FIELD.to_string(),
                    expected: ValueKind::String,
                    found,
                });
            }
        }

        verify_record(record, &template, &location, report);
    }
}

/// Verify all five collections of a document.
pub fn verify_document(document: &mut Document) -> VerificationReport {
    let mut report = VerificationReport::new();
    for kind in CollectionKind::ALL {
        match document.collection_mut(kind) {
            Some(collection) => verify_collection(collection, kind, &mut report),
            None => verify_record(
                document.email_configurations_mut(),
                &kind.template(),
                &Location::flat(kind),
                &mut report,
            ),
        }
    }
    report
}
