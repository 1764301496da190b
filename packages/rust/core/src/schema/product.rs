//! Product catalog entries.

use serde::{Deserialize, Serialize};

use salescope_shared::SectionKind;

use super::{Entity, EntitySchema, FieldKind, FieldSpec};

/// One product or service offering of the seller company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_name: String,
    /// Value-proposition text (2-4 sentences).
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

pub static PRODUCT_SCHEMA: EntitySchema = EntitySchema {
    entity: "Product",
    fields: &[
        FieldSpec::required(
            "product_name",
            FieldKind::Str {
                min_len: 2,
                max_len: None,
                trim: true,
            },
        ),
        FieldSpec::required(
            "description",
            FieldKind::Str {
                min_len: 50,
                max_len: None,
                trim: true,
            },
        ),
        // URL format is not checked.
        FieldSpec::optional(
            "source_url",
            FieldKind::Str {
                min_len: 0,
                max_len: None,
                trim: false,
            },
        ),
    ],
    rules: &[],
};

impl Entity for Product {
    const SECTION: SectionKind = SectionKind::Products;

    fn schema() -> &'static EntitySchema {
        &PRODUCT_SCHEMA
    }
}
