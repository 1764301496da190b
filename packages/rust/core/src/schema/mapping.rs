//! Pain-point to value-proposition mappings, grouped per persona.

use serde::{Deserialize, Serialize};

use salescope_shared::SectionKind;

use super::{Entity, EntitySchema, FieldKind, FieldSpec};

/// One pain point paired with a product-integrated value proposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainPointMapping {
    pub pain_point: String,
    pub value_proposition: String,
}

/// All mappings for one persona. `persona_name` must name an existing persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaWithMappings {
    pub persona_name: String,
    pub mappings: Vec<PainPointMapping>,
}

const STATEMENT: FieldKind = FieldKind::Str {
    min_len: 20,
    max_len: Some(300),
    trim: false,
};

pub static PAIN_POINT_SCHEMA: EntitySchema = EntitySchema {
    entity: "PainPointMapping",
    fields: &[
        FieldSpec::required("pain_point", STATEMENT),
        FieldSpec::required("value_proposition", STATEMENT),
    ],
    rules: &[],
};

pub static MAPPING_SCHEMA: EntitySchema = EntitySchema {
    entity: "PersonaWithMappings",
    fields: &[
        FieldSpec::required(
            "persona_name",
            FieldKind::Str {
                min_len: 0,
                max_len: None,
                trim: false,
            },
        ),
        FieldSpec::required(
            "mappings",
            FieldKind::ObjectList {
                item: &PAIN_POINT_SCHEMA,
                min_items: 3,
                max_items: 10,
            },
        ),
    ],
    rules: &[],
};

impl Entity for PersonaWithMappings {
    const SECTION: SectionKind = SectionKind::PersonasWithMappings;

    fn schema() -> &'static EntitySchema {
        &MAPPING_SCHEMA
    }
}
