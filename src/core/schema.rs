use crate::domain::model::{
    CanonicalRow, CanonicalTable, CreatedColumn, DetectedMapping, MappingReport, RawTable,
};
use crate::utils::error::{BatchError, Result};
use regex::Regex;
use serde_json::Value;

/// Hard cap on batch size; larger files must be split by the caller.
pub const MAX_BATCH_ROWS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CanonicalField {
    ProductName,
    Description,
    Material,
    IntendedUse,
    Origin,
    Quantity,
    UnitValue,
    CustomsValue,
}

impl CanonicalField {
    fn name(self) -> &'static str {
        match self {
            CanonicalField::ProductName => "product_name",
            CanonicalField::Description => "description",
            CanonicalField::Material => "material",
            CanonicalField::IntendedUse => "intended_use",
            CanonicalField::Origin => "origin",
            CanonicalField::Quantity => "quantity",
            CanonicalField::UnitValue => "unit_value",
            CanonicalField::CustomsValue => "customs_value",
        }
    }
}

/// Name-pattern heuristics per canonical field, tried in order. First match
/// wins and consumes the column.
const FIELD_PATTERNS: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::ProductName,
        &[
            r".*product.*name.*",
            r".*item.*name.*",
            r".*sku.*name.*",
            r"^name$",
            r"^product$",
            r"^item$",
            r"^sku$",
            r"^title$",
            r".*description.*1.*",
            r"^article$",
            r"^merchandise$",
            r"^goods$",
            r"^commodity$",
            r"^part.*number$",
        ],
    ),
    (
        CanonicalField::Description,
        &[
            r"^description$",
            r"^desc$",
            r".*detail.*",
            r".*specification.*",
            r".*description.*2.*",
            r".*long.*desc.*",
            r".*full.*desc.*",
            r"^spec$",
            r"^info$",
            r".*information$",
            r"^about$",
            r"^summary$",
            r"^overview$",
            r"^features$",
        ],
    ),
    (
        CanonicalField::Material,
        &[
            r".*material.*",
            r".*composition.*",
            r".*fabric.*",
            r".*made.*",
            r"^construction$",
            r".*component.*",
            r".*ingredient.*",
            r".*substance.*",
            r".*content$",
        ],
    ),
    (
        CanonicalField::IntendedUse,
        &[
            r".*use.*",
            r".*purpose.*",
            r".*application.*",
            r".*function.*",
            r".*usage$",
            r".*end.*use.*",
            r".*category$",
            r".*type$",
        ],
    ),
    (
        CanonicalField::Origin,
        &[
            r".*origin.*",
            r".*country.*",
            r".*coo$",
            r".*made.*in.*",
            r".*source.*",
            r".*from$",
            r".*manufactured.*",
            r".*location$",
        ],
    ),
    (
        CanonicalField::Quantity,
        &[
            r".*quantity.*",
            r".*qty.*",
            r".*units.*",
            r".*pieces.*",
            r".*count$",
            r".*amount$",
            r"^qty$",
            r"^q$",
        ],
    ),
    (
        CanonicalField::UnitValue,
        &[
            r".*unit.*price.*",
            r".*unit.*value.*",
            r".*price.*per.*",
            r"^price$",
            r"^cost$",
            r".*unit.*cost.*",
            r"^value$",
        ],
    ),
    (
        CanonicalField::CustomsValue,
        &[
            r".*customs.*value.*",
            r".*total.*value.*",
            r".*invoice.*",
            r".*declared.*",
            r"^total$",
            r".*extended.*",
            r".*amount$",
        ],
    ),
];

/// Infers the canonical product-record schema from an arbitrary table.
/// Best-effort by construction: mismatches are expected, and the mapping
/// report tells the caller what was inferred versus synthesized.
pub struct SchemaMapper {
    patterns: Vec<(CanonicalField, Vec<Regex>)>,
    non_word: Regex,
}

impl Default for SchemaMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaMapper {
    pub fn new() -> Self {
        let patterns = FIELD_PATTERNS
            .iter()
            .map(|(field, pats)| {
                let compiled = pats
                    .iter()
                    .map(|p| Regex::new(p).expect("hard-coded field pattern"))
                    .collect();
                (*field, compiled)
            })
            .collect();

        Self {
            patterns,
            non_word: Regex::new(r"[^\w\s]").expect("hard-coded pattern"),
        }
    }

    /// Map a raw table onto the canonical schema.
    ///
    /// Fails only on input-level validation (zero rows or over the batch
    /// cap); every per-column mismatch is absorbed by a fallback and
    /// reported.
    pub fn map(&self, table: &RawTable) -> Result<(CanonicalTable, MappingReport)> {
        if table.rows.is_empty() {
            return Err(BatchError::input("The file contains no data rows"));
        }
        if table.rows.len() > MAX_BATCH_ROWS {
            return Err(BatchError::input(format!(
                "File contains {} rows. Maximum {} products per batch. Please split your file.",
                table.rows.len(),
                MAX_BATCH_ROWS
            )));
        }

        let normalized: Vec<String> = table
            .headers
            .iter()
            .map(|h| self.normalize_header(h))
            .collect();

        let mut report = MappingReport {
            original_columns: table.headers.clone(),
            ..Default::default()
        };

        // First pass: pattern matching. Columns are scanned in table order
        // so an earlier column wins even against a lower-priority pattern;
        // consumed columns are never reconsidered for other fields.
        let mut consumed = vec![false; table.headers.len()];
        let mut mapped: Vec<(CanonicalField, usize)> = Vec::new();

        for (field, regexes) in &self.patterns {
            'columns: for (ci, header) in normalized.iter().enumerate() {
                if consumed[ci] {
                    continue;
                }
                for regex in regexes {
                    if regex.is_match(header) {
                        mapped.push((*field, ci));
                        consumed[ci] = true;
                        report.detected.push(DetectedMapping {
                            field: field.name().to_string(),
                            source_column: table.headers[ci].clone(),
                        });
                        break 'columns;
                    }
                }
            }
        }

        let column_of = |field: CanonicalField| -> Option<usize> {
            mapped.iter().find(|(f, _)| *f == field).map(|(_, ci)| *ci)
        };

        // Content-based fallbacks for the required text fields.
        let text_columns: Vec<usize> = (0..table.headers.len())
            .filter(|&ci| table.column(ci).any(is_text_cell))
            .collect();

        let name_source = match column_of(CanonicalField::ProductName) {
            Some(ci) => NameSource::Column(ci),
            None => match text_columns.first() {
                Some(&ci) => {
                    report.created.push(CreatedColumn {
                        field: "product_name".to_string(),
                        how: format!("Created from {}", table.headers[ci]),
                    });
                    NameSource::Column(ci)
                }
                None => {
                    report.created.push(CreatedColumn {
                        field: "product_name".to_string(),
                        how: "Auto-generated".to_string(),
                    });
                    NameSource::Placeholder
                }
            },
        };

        let desc_source = match column_of(CanonicalField::Description) {
            Some(ci) => DescriptionSource::Column(ci),
            None => {
                if text_columns.len() > 1 {
                    report.created.push(CreatedColumn {
                        field: "description".to_string(),
                        how: "Combined from text columns".to_string(),
                    });
                    DescriptionSource::CombineText
                } else if let Some(&ci) = text_columns.first() {
                    report.created.push(CreatedColumn {
                        field: "description".to_string(),
                        how: format!("Copied from {}", table.headers[ci]),
                    });
                    DescriptionSource::Column(ci)
                } else {
                    report.created.push(CreatedColumn {
                        field: "description".to_string(),
                        how: "Copied from product_name".to_string(),
                    });
                    DescriptionSource::ProductName
                }
            }
        };

        let mut rows = Vec::with_capacity(table.rows.len());
        for (ri, raw_row) in table.rows.iter().enumerate() {
            let mut product_name = match name_source {
                NameSource::Column(ci) => row_text(raw_row, ci),
                NameSource::Placeholder => String::new(),
            };
            if product_name.trim().is_empty() {
                product_name = format!("Product_{}", ri + 1);
            }

            let mut description = match desc_source {
                DescriptionSource::Column(ci) => row_text(raw_row, ci),
                DescriptionSource::CombineText => text_columns
                    .iter()
                    .map(|&ci| row_text(raw_row, ci))
                    .filter(|s| !s.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
                DescriptionSource::ProductName => product_name.clone(),
            };
            if description.trim().is_empty() {
                description = product_name.clone();
            }

            let text_field =
                |field: CanonicalField| column_of(field).map(|ci| row_text(raw_row, ci)).unwrap_or_default();
            let numeric_field =
                |field: CanonicalField| column_of(field).and_then(|ci| row_number(raw_row, ci));

            let extra: Vec<(String, Value)> = (0..table.headers.len())
                .filter(|&ci| !consumed[ci])
                .map(|ci| {
                    (
                        table.headers[ci].clone(),
                        raw_row.get(ci).cloned().unwrap_or(Value::Null),
                    )
                })
                .collect();

            rows.push(CanonicalRow {
                product_name,
                description,
                material: text_field(CanonicalField::Material),
                intended_use: text_field(CanonicalField::IntendedUse),
                origin: text_field(CanonicalField::Origin),
                quantity: numeric_field(CanonicalField::Quantity),
                unit_value: numeric_field(CanonicalField::UnitValue),
                customs_value: numeric_field(CanonicalField::CustomsValue),
                extra,
            });
        }

        Ok((CanonicalTable { rows }, report))
    }

    fn normalize_header(&self, header: &str) -> String {
        let lowered = header.trim().to_lowercase();
        self.non_word.replace_all(&lowered, "").trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameSource {
    Column(usize),
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescriptionSource {
    Column(usize),
    CombineText,
    ProductName,
}

/// A column counts as text-typed when it contains at least one non-blank
/// string cell.
fn is_text_cell(value: &Value) -> bool {
    matches!(value, Value::String(s) if !s.trim().is_empty())
}

fn row_text(row: &[Value], ci: usize) -> String {
    match row.get(ci) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn row_number(row: &[Value], ci: usize) -> Option<f64> {
    match row.get(ci) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(headers: &[&str], rows: &[&[Value]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }

    #[test]
    fn test_heuristic_mapping_of_common_headers() {
        let t = table(
            &["Item Name", "Details", "Origin Country"],
            &[&[json!("LED Desk Lamp"), json!("Adjustable lamp"), json!("China")]],
        );

        let mapper = SchemaMapper::new();
        let (canonical, report) = mapper.map(&t).unwrap();
        let row = &canonical.rows[0];

        assert_eq!(row.product_name, "LED Desk Lamp");
        assert_eq!(row.description, "Adjustable lamp");
        assert_eq!(row.origin, "China");
        assert_eq!(row.material, "");
        assert_eq!(row.intended_use, "");
        assert_eq!(report.detected.len(), 3);
        assert!(report.created.is_empty());
    }

    #[test]
    fn test_punctuation_in_headers_is_stripped() {
        let t = table(
            &["Product-Name:", "Desc."],
            &[&[json!("Bottle"), json!("Steel bottle")]],
        );

        let (canonical, _) = SchemaMapper::new().map(&t).unwrap();
        assert_eq!(canonical.rows[0].product_name, "Bottle");
        assert_eq!(canonical.rows[0].description, "Steel bottle");
    }

    #[test]
    fn test_unmapped_columns_are_preserved() {
        let t = table(
            &["Item", "Warehouse Bin"],
            &[&[json!("Yoga Mat"), json!("A-17")]],
        );

        let (canonical, _) = SchemaMapper::new().map(&t).unwrap();
        let row = &canonical.rows[0];
        assert!(row
            .extra
            .iter()
            .any(|(name, v)| name == "Warehouse Bin" && v == &json!("A-17")));
    }

    #[test]
    fn test_product_name_falls_back_to_first_text_column() {
        let t = table(
            &["notes", "ref"],
            &[&[json!("hand-blown glass vase"), json!(17)]],
        );

        let (canonical, report) = SchemaMapper::new().map(&t).unwrap();
        assert_eq!(canonical.rows[0].product_name, "hand-blown glass vase");
        assert!(report
            .created
            .iter()
            .any(|c| c.field == "product_name" && c.how.contains("notes")));
    }

    #[test]
    fn test_placeholder_names_when_no_text_columns() {
        let t = table(
            &["ref", "weight"],
            &[&[json!(1), json!(2.5)], &[json!(2), json!(3.0)]],
        );

        let (canonical, report) = SchemaMapper::new().map(&t).unwrap();
        assert_eq!(canonical.rows[0].product_name, "Product_1");
        assert_eq!(canonical.rows[1].product_name, "Product_2");
        // With no textual source, descriptions mirror the placeholder names.
        assert_eq!(canonical.rows[0].description, "Product_1");
        assert!(report
            .created
            .iter()
            .any(|c| c.field == "product_name" && c.how == "Auto-generated"));
    }

    #[test]
    fn test_description_combined_from_text_columns() {
        let t = table(
            &["Item", "color", "finish"],
            &[&[json!("Chair"), json!("walnut"), json!("matte")]],
        );

        let (canonical, report) = SchemaMapper::new().map(&t).unwrap();
        // "Item" maps to product_name; the remaining text columns are
        // space-joined into the synthesized description.
        assert_eq!(canonical.rows[0].product_name, "Chair");
        assert_eq!(canonical.rows[0].description, "Chair walnut matte");
        assert!(report
            .created
            .iter()
            .any(|c| c.field == "description" && c.how == "Combined from text columns"));
    }

    #[test]
    fn test_numeric_fields_absent_not_zero() {
        let t = table(&["Item"], &[&[json!("Chair")]]);

        let (canonical, _) = SchemaMapper::new().map(&t).unwrap();
        let row = &canonical.rows[0];
        assert_eq!(row.quantity, None);
        assert_eq!(row.unit_value, None);
        assert_eq!(row.customs_value, None);
    }

    #[test]
    fn test_numeric_fields_mapped_and_parsed() {
        let t = table(
            &["Item", "Qty", "Unit Price", "Customs Value"],
            &[&[json!("Chair"), json!(10), json!("25.5"), json!(255.0)]],
        );

        let (canonical, _) = SchemaMapper::new().map(&t).unwrap();
        let row = &canonical.rows[0];
        assert_eq!(row.quantity, Some(10.0));
        assert_eq!(row.unit_value, Some(25.5));
        assert_eq!(row.customs_value, Some(255.0));
    }

    #[test]
    fn test_empty_product_name_cell_gets_placeholder() {
        let t = table(
            &["Item", "Details"],
            &[
                &[json!("Lamp"), json!("LED lamp")],
                &[json!("   "), json!("mystery goods")],
            ],
        );

        let (canonical, _) = SchemaMapper::new().map(&t).unwrap();
        assert_eq!(canonical.rows[0].product_name, "Lamp");
        assert_eq!(canonical.rows[1].product_name, "Product_2");
    }

    #[test]
    fn test_zero_rows_rejected() {
        let t = table(&["Item"], &[]);
        let err = SchemaMapper::new().map(&t).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn test_row_cap_rejected_with_count() {
        let row: Vec<Value> = vec![json!("thing")];
        let rows: Vec<&[Value]> = (0..101).map(|_| row.as_slice()).collect();
        let t = table(&["Item"], &rows);

        let err = SchemaMapper::new().map(&t).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("101"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_consumed_column_not_reused() {
        // "Material Content" matches material first; intended_use must not
        // steal it even though ".*content$" style overlaps exist.
        let t = table(
            &["Item", "Material Content", "End Use"],
            &[&[json!("Shirt"), json!("100% cotton"), json!("casual wear")]],
        );

        let (canonical, _) = SchemaMapper::new().map(&t).unwrap();
        let row = &canonical.rows[0];
        assert_eq!(row.material, "100% cotton");
        assert_eq!(row.intended_use, "casual wear");
    }
}
