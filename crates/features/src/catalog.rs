//! Auxiliary pollutant and environmental metric catalog.
//!
//! Each catalog token maps to a predicate over column names. The mapping is
//! resolved once per input table; tokens without a matching column are left
//! out of the feature schema.

/// Catalog tokens in schema order.
pub const AUXILIARY_CATALOG: [&str; 17] = [
    "PM25", "IAQ", "HCHO", "CO2", "TIN", "TOUT", "RHIN", "RHOUT", "P", "NO2", "NO", "SO2", "H2S",
    "CO", "HCN", "HCL", "NH3",
];

/// A catalog token bound to an input column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryColumn {
    /// Canonical feature name.
    pub token: &'static str,
    /// Index of the source column.
    pub column: usize,
}

fn matches(token: &str, column: &str, excluded: &[&str]) -> bool {
    column.contains(token)
        && !excluded.contains(&column)
        && !AUXILIARY_CATALOG
            .iter()
            .any(|&other| other != token && other == column)
}

/// Bind catalog tokens to columns.
///
/// An exact header match wins; otherwise the first header containing the
/// token is used, skipping `excluded` columns and headers that are exactly
/// another catalog token.
pub fn resolve_auxiliary(columns: &[String], excluded: &[&str]) -> Vec<AuxiliaryColumn> {
    AUXILIARY_CATALOG
        .iter()
        .filter_map(|&token| {
            columns
                .iter()
                .position(|c| c == token)
                .or_else(|| columns.iter().position(|c| matches(token, c, excluded)))
                .map(|column| AuxiliaryColumn { token, column })
        })
        .collect()
}
