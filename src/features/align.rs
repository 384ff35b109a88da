//! Project an encoded table onto a training schema.

use super::schema::Schema;
use super::table::NumericTable;
use super::FeatureMatrix;
use ndarray::Array2;
use std::collections::HashMap;
use tracing::debug;

/// Output columns equal the schema in order. Missing columns are zero-filled,
/// columns outside the schema are discarded.
pub fn align(table: &NumericTable, schema: &Schema) -> FeatureMatrix {
    let rows = table.rows();
    let index: HashMap<&str, usize> = table.names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
    let mut values = Array2::<f64>::zeros((rows, schema.len()));
    let mut missing = 0usize;
    for (j, name) in schema.columns().iter().enumerate() {
        match index.get(name.as_str()) {
            Some(&i) => {
                for (r, v) in table.columns[i].iter().enumerate() {
                    values[[r, j]] = *v;
                }
            }
            None => missing += 1,
        }
    }
    let extra = table.names.iter().filter(|n| !schema.columns().contains(n)).count();
    if missing > 0 || extra > 0 {
        debug!(missing, extra, "aligned to schema");
    }
    FeatureMatrix::from_parts(schema.columns().to_vec(), values)
}
