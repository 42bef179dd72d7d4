//! Vehicle attribute schema.
//!
//! Declares the accepted input fields, in the order the model expects them,
//! together with their kinds and categorical domains. The validator in
//! [`crate::features`] and the encoder in [`crate::encoding`] both read
//! this table, so it is the single source of truth for field order.

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

pub const MILEAGE: &str = "mileage";
pub const ENGINE_POWER: &str = "engine_power";
pub const MODEL_KEY: &str = "model_key";
pub const FUEL: &str = "fuel";
pub const PAINT_COLOR: &str = "paint_color";
pub const CAR_TYPE: &str = "car_type";
pub const PRIVATE_PARKING_AVAILABLE: &str = "private_parking_available";
pub const HAS_GPS: &str = "has_gps";
pub const HAS_AIR_CONDITIONING: &str = "has_air_conditioning";
pub const AUTOMATIC_CAR: &str = "automatic_car";
pub const HAS_GETAROUND_CONNECT: &str = "has_getaround_connect";
pub const HAS_SPEED_REGULATOR: &str = "has_speed_regulator";
pub const WINTER_TIRES: &str = "winter_tires";

/// Bucket that out-of-domain values are mapped to for fields that allow it.
pub const OTHER_CATEGORY: &str = "other";

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

pub const FUEL_TYPES: &[&str] = &["diesel", "electro", "hybrid_petrol", "petrol"];

pub const CAR_TYPES: &[&str] = &[
    "convertible",
    "coupe",
    "estate",
    "hatchback",
    "sedan",
    "subcompact",
    "suv",
    "van",
];

pub const PAINT_COLORS: &[&str] = &[
    "beige", "black", "blue", "brown", "green", "grey", "orange", "red", "silver", "white",
];

/// Brands seen in the pricing dataset. Anything else becomes [`OTHER_CATEGORY`].
pub const MODEL_KEYS: &[&str] = &[
    "Alfa Romeo",
    "Audi",
    "BMW",
    "Citroën",
    "Ferrari",
    "Fiat",
    "Ford",
    "Honda",
    "KIA Motors",
    "Lamborghini",
    "Lexus",
    "Maserati",
    "Mazda",
    "Mercedes",
    "Mini",
    "Mitsubishi",
    "Nissan",
    "Opel",
    "PGO",
    "Peugeot",
    "Porsche",
    "Renault",
    "SEAT",
    "Subaru",
    "Suzuki",
    "Toyota",
    "Volkswagen",
    "Yamaha",
];

// ---------------------------------------------------------------------------
// Field table
// ---------------------------------------------------------------------------

/// A closed set of categorical values, optionally with a fallback bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoricalDomain {
    pub values: &'static [&'static str],
    /// When set, values outside `values` are mapped here instead of rejected.
    pub fallback: Option<&'static str>,
}

impl CategoricalDomain {
    pub const fn closed(values: &'static [&'static str]) -> Self {
        Self {
            values,
            fallback: None,
        }
    }

    pub const fn with_fallback(values: &'static [&'static str]) -> Self {
        Self {
            values,
            fallback: Some(OTHER_CATEGORY),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Finite number `>= 0`.
    NonNegative,
    /// Finite number `> 0`.
    Positive,
    Categorical(CategoricalDomain),
    Boolean,
}

impl FieldKind {
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::NonNegative | Self::Positive => "number",
            Self::Categorical(_) => "string",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// Every accepted field, in canonical order. All fields are required.
pub const FIELDS: &[FieldSpec] = &[
    field(MILEAGE, FieldKind::NonNegative),
    field(ENGINE_POWER, FieldKind::Positive),
    field(
        MODEL_KEY,
        FieldKind::Categorical(CategoricalDomain::with_fallback(MODEL_KEYS)),
    ),
    field(FUEL, FieldKind::Categorical(CategoricalDomain::closed(FUEL_TYPES))),
    field(
        PAINT_COLOR,
        FieldKind::Categorical(CategoricalDomain::with_fallback(PAINT_COLORS)),
    ),
    field(CAR_TYPE, FieldKind::Categorical(CategoricalDomain::closed(CAR_TYPES))),
    field(PRIVATE_PARKING_AVAILABLE, FieldKind::Boolean),
    field(HAS_GPS, FieldKind::Boolean),
    field(HAS_AIR_CONDITIONING, FieldKind::Boolean),
    field(AUTOMATIC_CAR, FieldKind::Boolean),
    field(HAS_GETAROUND_CONNECT, FieldKind::Boolean),
    field(HAS_SPEED_REGULATOR, FieldKind::Boolean),
    field(WINTER_TIRES, FieldKind::Boolean),
];

/// Canonical field names, in order.
pub fn field_names() -> Vec<String> {
    FIELDS.iter().map(|f| f.name.to_string()).collect()
}

pub fn find(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Names of the fields of a given shape, in canonical order.
pub fn numeric_fields() -> impl Iterator<Item = &'static str> {
    FIELDS
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::NonNegative | FieldKind::Positive))
        .map(|f| f.name)
}

pub fn categorical_fields() -> impl Iterator<Item = &'static str> {
    FIELDS
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::Categorical(_)))
        .map(|f| f.name)
}

pub fn boolean_fields() -> impl Iterator<Item = &'static str> {
    FIELDS
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::Boolean))
        .map(|f| f.name)
}
